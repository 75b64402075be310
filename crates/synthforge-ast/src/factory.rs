use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use synthforge_core::{CompileError, Result};

use crate::kinds::{Category, ComponentKind, TypeParam};
use crate::node::{AttributeValue, Attributes};

static KIND_PATTERNS: LazyLock<HashMap<ComponentKind, Regex>> = LazyLock::new(|| {
    Category::ALL
        .iter()
        .flat_map(|category| category.candidates())
        .map(|kind| {
            let re = Regex::new(&kind.spec().pattern())
                .expect("KIND_PATTERNS: invalid regex pattern");
            (*kind, re)
        })
        .collect()
});

/// Kind selected for a type string, with its initial attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindMatch {
    pub kind: ComponentKind,
    /// `type` plus one entry per captured type parameter.
    pub attributes: Attributes,
}

/// Select the component kind for `type_string` among the candidates of
/// `category`. The first matching candidate wins.
pub fn create_kind(category: Category, type_string: &str) -> Result<KindMatch> {
    let type_string = type_string.trim();
    for kind in category.candidates() {
        let spec = kind.spec();
        let Some(caps) = KIND_PATTERNS
            .get(kind)
            .and_then(|re| re.captures(type_string))
        else {
            continue;
        };

        let mut attributes = Attributes::default();
        attributes.set("type", AttributeValue::Text(type_string.to_string()));
        for (index, param) in spec.params.iter().enumerate() {
            let captured = caps.get(index + 1).map(|group| group.as_str()).unwrap_or("");
            let value = match param {
                TypeParam::Literal(_) => AttributeValue::Text(captured.to_string()),
                TypeParam::Size(_) => AttributeValue::Integer(captured.parse().map_err(|_| {
                    CompileError::malformed(format!(
                        "size parameter '{captured}' of '{type_string}' is out of range"
                    ))
                })?),
            };
            attributes.set(param.attribute(), value);
        }
        return Ok(KindMatch {
            kind: *kind,
            attributes,
        });
    }

    Err(CompileError::UnsupportedType {
        type_string: type_string.to_string(),
        context: category.to_string(),
        expected: category
            .candidates()
            .iter()
            .map(|kind| kind.spec().signature())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_provider_context_admits_exactly_six_kinds() {
        let names: Vec<_> = Category::ValueProvider
            .candidates()
            .iter()
            .map(|kind| kind.spec().name)
            .collect();
        assert_eq!(
            names,
            vec![
                "callback_value_provider",
                "clustered_value_provider",
                "const_value_provider",
                "context_field_value_provider",
                "element_wise_value_provider",
                "random_value_provider",
            ]
        );
    }

    #[test]
    fn captures_type_parameters_as_attributes() {
        let found = create_kind(Category::ValueProvider, "const_value_provider[I16u]").unwrap();
        assert_eq!(found.kind, ComponentKind::ConstValueProvider);
        assert_eq!(found.attributes.text("value_type"), Some("I16u"));
        assert_eq!(found.attributes.text("type"), Some("const_value_provider[I16u]"));

        let vector =
            create_kind(Category::ValueProvider, "element_wise_value_provider[Decimal;3]").unwrap();
        assert_eq!(vector.attributes.get("size"), Some(&AttributeValue::Integer(3)));

        let conditional = create_kind(
            Category::Function,
            "conditional_combined_probability[I64u;Enum]",
        )
        .unwrap();
        assert_eq!(conditional.attributes.text("value_type"), Some("I64u"));
        assert_eq!(conditional.attributes.text("condition_type"), Some("Enum"));
    }

    #[test]
    fn unknown_type_strings_list_the_candidates() {
        let err = create_kind(Category::ValueProvider, "const_value_provider[Float]").unwrap_err();
        match err {
            CompileError::UnsupportedType {
                type_string,
                context,
                expected,
            } => {
                assert_eq!(type_string, "const_value_provider[Float]");
                assert_eq!(context, "value_provider");
                assert_eq!(expected.len(), 6);
                assert!(expected.contains(&"const_value_provider[T]".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn every_candidate_has_a_cached_pattern() {
        for category in Category::ALL {
            for kind in category.candidates() {
                let re = KIND_PATTERNS.get(kind).expect("pattern cached");
                assert_eq!(re.as_str(), kind.spec().pattern());
            }
        }
    }

    #[test]
    fn kinds_do_not_leak_across_categories() {
        assert!(create_kind(Category::RangeProvider, "const_value_provider[I32]").is_err());
        assert!(
            create_kind(Category::ValueProvider, "element_wise_value_provider[I32;0]").is_err()
        );
        assert!(create_kind(Category::Setter, "field_setter").is_ok());
        assert!(create_kind(Category::OutputFormat, "csv").is_ok());
    }
}
