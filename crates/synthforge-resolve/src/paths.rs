//! Path walking over record types.

use synthforge_ast::{Phase, ResolvedFieldRef, ResolvedReferenceRef, SequenceId, Specification};
use synthforge_core::{CompileError, FieldPath, ReferencePath, Result};

/// Resolve `root:inner*:field`.
///
/// `targets` maps every reference to the sequence it points at. A bare field
/// name resolves against `owner`.
pub fn resolve_field_path<P: Phase>(
    spec: &Specification<P>,
    targets: &[SequenceId],
    path: &str,
    owner: Option<SequenceId>,
    container: &str,
) -> Result<ResolvedFieldRef> {
    let parsed = FieldPath::parse(path)?;
    let root = root_sequence(spec, parsed.root.as_deref(), owner, "field", path, container)?;

    let mut current = root;
    let mut inner = Vec::with_capacity(parsed.inner.len());
    for segment in &parsed.inner {
        let reference = spec
            .find_reference(current, segment)
            .ok_or_else(|| CompileError::unresolved("field", path, segment, container))?;
        inner.push(reference.id);
        current = targets
            .get(reference.id.index())
            .copied()
            .ok_or_else(|| CompileError::unresolved("field", path, segment, container))?;
    }

    let field = spec
        .find_field(current, &parsed.field)
        .ok_or_else(|| CompileError::unresolved("field", path, &parsed.field, container))?;

    Ok(ResolvedFieldRef {
        path: path.to_string(),
        root,
        inner,
        field: field.id,
    })
}

/// Resolve `record:reference`; a bare name resolves against `owner`.
pub fn resolve_reference_path<P: Phase>(
    spec: &Specification<P>,
    path: &str,
    owner: Option<SequenceId>,
    container: &str,
) -> Result<ResolvedReferenceRef> {
    let parsed = ReferencePath::parse(path)?;
    let record = root_sequence(
        spec,
        parsed.record.as_deref(),
        owner,
        "reference",
        path,
        container,
    )?;
    let reference = spec
        .find_reference(record, &parsed.reference)
        .ok_or_else(|| {
            CompileError::unresolved("reference", path, &parsed.reference, container)
        })?;
    Ok(ResolvedReferenceRef {
        path: path.to_string(),
        record,
        reference: reference.id,
    })
}

fn root_sequence<P: Phase>(
    spec: &Specification<P>,
    root: Option<&str>,
    owner: Option<SequenceId>,
    kind: &str,
    path: &str,
    container: &str,
) -> Result<SequenceId> {
    match root {
        Some(root) => spec
            .sequence_by_key(root)
            .map(|sequence| sequence.id)
            .ok_or_else(|| CompileError::unresolved(kind, path, root, container)),
        None => owner.ok_or_else(|| CompileError::unresolved(kind, path, path, container)),
    }
}
