//! Serialization method for the declared output format.

use synthforge_ast::{Argument, Component, ComponentKind, Resolved};
use synthforge_core::{CompileError, LiteralForm, Result};

use super::SequenceContext;
use crate::naming::accessor;
use crate::source::SourceWriter;
use crate::transform::{RenderEnv, render_literal};

/// Emit `write(OutputCollector&)`; no output format means no output.
pub fn render_writer(ctx: &SequenceContext<'_>, out: &mut SourceWriter) -> Result<()> {
    let csv = ctx
        .sequence
        .output_format
        .map(|id| ctx.spec.component(id))
        .filter(|format| format.kind == ComponentKind::CsvOutputFormat);
    out.line("void write(OutputCollector& out) const");
    out.open("{");
    if let Some(format) = csv {
        let delimiter = constant(format, "delimiter")?;
        let quoted = constant(format, "quoted")?;
        let fields = ctx.fields();
        let last = fields.len().saturating_sub(1);
        for (index, field) in fields.iter().enumerate() {
            let value = if field.field_type.is_enum() {
                format!("{}EnumValue()", accessor(field))
            } else {
                format!("{}()", accessor(field))
            };
            out.line(format!("out.write({value}, {quoted});"));
            if index != last {
                out.line(format!("out.write({delimiter});"));
            }
        }
        out.line("out.write('\\n');");
    }
    out.close("}");
    Ok(())
}

/// Format options are fixed when the record is compiled.
fn constant(format: &Component<Resolved>, key: &str) -> Result<String> {
    let literal = format
        .arguments
        .get(key)
        .and_then(Argument::as_literal)
        .ok_or_else(|| {
            CompileError::malformed(format!("{} has no argument '{key}'", format.describe()))
        })?;
    if !matches!(literal.form, LiteralForm::Plain { .. }) {
        return Err(CompileError::malformed(format!(
            "argument '{key}' of {} must be a constant, got '{}'",
            format.describe(),
            literal.raw
        )));
    }
    Ok(render_literal(literal, &RenderEnv { config: "config" }))
}
