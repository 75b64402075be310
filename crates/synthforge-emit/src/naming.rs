//! Identifier conventions of the generated code.

use synthforge_ast::Field;
use synthforge_core::GEN_ID_FIELD;

/// `line_item` → `LineItem`.
pub fn upper_camel(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// `line_item` → `lineItem`.
pub fn lower_camel(name: &str) -> String {
    let upper = upper_camel(name);
    let mut chars = upper.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => upper,
    }
}

/// `shipDate` or `ship_date` → `SHIP_DATE`.
pub fn constant_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut previous_lower = false;
    for c in name.chars() {
        if !c.is_ascii_alphanumeric() {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            previous_lower = false;
            continue;
        }
        if c.is_ascii_uppercase() && previous_lower {
            out.push('_');
        }
        previous_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        out.push(c.to_ascii_uppercase());
    }
    out.trim_end_matches('_').to_string()
}

/// `record/base/BaseOrder.h` → `RECORD_BASE_BASEORDER_H_`.
pub fn include_guard(include: &str) -> String {
    let mut guard: String = include
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    guard.push('_');
    guard
}

/// Accessor method of a field; the implicit id maps onto the runtime's `genID`.
pub fn accessor(field: &Field) -> String {
    if field.implicit && field.name == GEN_ID_FIELD {
        "genID".to_string()
    } else {
        lower_camel(&field.name)
    }
}

/// Member variable backing an accessor.
pub fn member(name: &str) -> String {
    format!("_{}", lower_camel(name))
}
