use std::collections::BTreeSet;

use crate::RUNTIME_NAMESPACE;
use crate::naming::include_guard;

const INDENT: &str = "    ";

/// Line-oriented C++ source builder.
#[derive(Debug, Default)]
pub struct SourceWriter {
    buf: String,
    level: usize,
}

impl SourceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.level {
                self.buf.push_str(INDENT);
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    /// Emit `text` and indent what follows.
    pub fn open(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.line(text);
        self.level += 1;
        self
    }

    /// Dedent and emit `text`.
    pub fn close(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.level = self.level.saturating_sub(1);
        self.line(text)
    }

    pub fn indent(&mut self) -> &mut Self {
        self.level += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.level = self.level.saturating_sub(1);
        self
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

/// Preamble and closing of one header file.
pub struct HeaderFile<'a> {
    pub include: &'a str,
    pub banner: &'a str,
    /// Runtime headers; emitted first, sorted.
    pub runtime_includes: BTreeSet<String>,
    /// Generated headers; emitted second, sorted.
    pub local_includes: BTreeSet<String>,
    pub namespace: &'a str,
}

impl HeaderFile<'_> {
    /// Write everything up to the opening of the target namespace.
    pub fn open(&self, out: &mut SourceWriter) {
        let guard = include_guard(self.include);
        out.line(format!("// {}", self.banner));
        out.blank();
        out.line(format!("#ifndef {guard}"));
        out.line(format!("#define {guard}"));
        out.blank();
        for include in &self.runtime_includes {
            out.line(format!("#include \"{include}\""));
        }
        if !self.runtime_includes.is_empty() && !self.local_includes.is_empty() {
            out.blank();
        }
        for include in &self.local_includes {
            out.line(format!("#include \"{include}\""));
        }
        out.blank();
        out.line(format!("using namespace {RUNTIME_NAMESPACE};"));
        out.blank();
        open_namespace(out, self.namespace);
    }

    pub fn close(&self, out: &mut SourceWriter) {
        close_namespace(out, self.namespace);
        out.line(format!("#endif /* {} */", include_guard(self.include)));
    }
}

/// `A::B` opens `namespace A {` then `namespace B {`.
pub fn open_namespace(out: &mut SourceWriter, namespace: &str) {
    for part in namespace.split("::") {
        out.line(format!("namespace {part} {{"));
    }
    out.blank();
}

pub fn close_namespace(out: &mut SourceWriter, namespace: &str) {
    for part in namespace.split("::").collect::<Vec<_>>().iter().rev() {
        out.line(format!("}} // namespace {part}"));
    }
    out.blank();
}
