//! String-level grammar of the prototype language.
//!
//! Covers parametrized type strings (`name[P1;P2]`), colon-delimited field and
//! reference paths, and the three textual forms a literal value can take.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{CompileError, Result};
use crate::types::LiteralType;

/// Regex matching one parameter token: `%name%` or `%(Type)name%`.
pub const PARAMETER_TOKEN: &str = r"%(?:\((\w+)\))?([A-Za-z_][\w.\-]*)%";

static TYPE_STRING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z_][a-z0-9_]*)(?:\[([^\[\]]+)\])?$")
        .expect("TYPE_STRING_RE: invalid regex pattern")
});
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(PARAMETER_TOKEN).expect("TOKEN_RE: invalid regex pattern")
});
static ANCHORED_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{PARAMETER_TOKEN}$")).expect("ANCHORED_TOKEN_RE: invalid regex pattern")
});
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("DATE_RE: invalid regex pattern")
});
static DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(\d+\.?\d*|\.\d+)([eE][-+]?\d+)?$")
        .expect("DECIMAL_RE: invalid regex pattern")
});
static UNSIGNED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\d+$").expect("UNSIGNED_RE: invalid regex pattern"));
static SIGNED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?\d+$").expect("SIGNED_RE: invalid regex pattern"));

/// A type string split into its name and bracketed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeString {
    pub name: String,
    pub params: Vec<String>,
}

impl TypeString {
    pub fn parse(value: &str) -> Result<Self> {
        parse_type_string(value).ok_or_else(|| {
            CompileError::malformed(format!("'{value}' is not a well-formed type string"))
        })
    }

    /// Element type of a `collection[elementType]` wrapper.
    pub fn collection_element(&self) -> Option<&str> {
        if self.name == "collection" && self.params.len() == 1 {
            Some(self.params[0].as_str())
        } else {
            None
        }
    }
}

impl fmt::Display for TypeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}[{}]", self.name, self.params.join(";"))
        }
    }
}

fn parse_type_string(value: &str) -> Option<TypeString> {
    let caps = TYPE_STRING_RE.captures(value.trim())?;
    let params = caps
        .get(2)
        .map(|group| {
            group
                .as_str()
                .split(';')
                .map(|param| param.trim().to_string())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    if params.iter().any(|param| param.is_empty()) {
        return None;
    }
    Some(TypeString {
        name: caps[1].to_string(),
        params,
    })
}

/// Field path of the form `root:inner*:field`.
///
/// `root` is absent when the path is a bare field name; the resolver then
/// uses the record sequence owning the referring component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    pub root: Option<String>,
    pub inner: Vec<String>,
    pub field: String,
}

impl FieldPath {
    pub fn parse(value: &str) -> Result<Self> {
        let segments = split_path(value, "field")?;
        let (field, rest) = segments
            .split_last()
            .ok_or_else(|| CompileError::malformed("empty field path"))?;
        let (root, inner) = match rest.split_first() {
            Some((root, inner)) => (Some(root.clone()), inner.to_vec()),
            None => (None, Vec::new()),
        };
        Ok(Self {
            root,
            inner,
            field: field.clone(),
        })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(root) = &self.root {
            write!(f, "{root}:")?;
        }
        for inner in &self.inner {
            write!(f, "{inner}:")?;
        }
        f.write_str(&self.field)
    }
}

/// Reference path of the form `record:reference`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePath {
    pub record: Option<String>,
    pub reference: String,
}

impl ReferencePath {
    pub fn parse(value: &str) -> Result<Self> {
        let segments = split_path(value, "reference")?;
        match segments.as_slice() {
            [reference] => Ok(Self {
                record: None,
                reference: reference.clone(),
            }),
            [record, reference] => Ok(Self {
                record: Some(record.clone()),
                reference: reference.clone(),
            }),
            _ => Err(CompileError::malformed(format!(
                "reference path '{value}' must have the form record:reference"
            ))),
        }
    }
}

fn split_path(value: &str, kind: &str) -> Result<Vec<String>> {
    let segments: Vec<String> = value
        .split(':')
        .map(|segment| segment.trim().to_string())
        .collect();
    if value.trim().is_empty() || segments.iter().any(|segment| segment.is_empty()) {
        return Err(CompileError::malformed(format!(
            "{kind} path '{value}' contains an empty segment"
        )));
    }
    Ok(segments)
}

/// Textual form of a literal argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralForm {
    /// `%name%` or `%(Type)name%`.
    Parameter {
        name: String,
        cast: Option<LiteralType>,
    },
    /// `${...}` holding one or more parameter tokens.
    Expression(String),
    /// The `NULL` token.
    Null,
    /// A constant, optionally prefixed with a `(Type)` cast override.
    Plain {
        value: String,
        cast: Option<LiteralType>,
    },
}

impl LiteralForm {
    /// Parse and validate a literal of the declared type.
    ///
    /// Returns the validation failure as a message; callers add context.
    pub fn parse(value_type: LiteralType, raw: &str) -> std::result::Result<Self, String> {
        if raw == "NULL" {
            return Ok(LiteralForm::Null);
        }

        if let Some(caps) = ANCHORED_TOKEN_RE.captures(raw) {
            let cast = parse_cast(caps.get(1).map(|group| group.as_str()))?;
            return Ok(LiteralForm::Parameter {
                name: caps[2].to_string(),
                cast,
            });
        }

        if let Some(inner) = raw.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
            let tokens = parameter_tokens(inner)?;
            if tokens.is_empty() {
                return Err(format!(
                    "expression '{raw}' must contain at least one parameter token"
                ));
            }
            return Ok(LiteralForm::Expression(inner.to_string()));
        }

        let (cast, value) = split_cast(raw)?;
        validate_plain(cast.unwrap_or(value_type), value)?;
        Ok(LiteralForm::Plain {
            value: value.to_string(),
            cast,
        })
    }
}

/// A parameter token found inside an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterToken {
    pub name: String,
    pub cast: Option<LiteralType>,
}

/// List the parameter tokens of an expression in order of appearance.
pub fn parameter_tokens(expression: &str) -> std::result::Result<Vec<ParameterToken>, String> {
    TOKEN_RE
        .captures_iter(expression)
        .map(|caps| {
            Ok(ParameterToken {
                name: caps[2].to_string(),
                cast: parse_cast(caps.get(1).map(|group| group.as_str()))?,
            })
        })
        .collect()
}

/// Replace every parameter token of an expression with `render(token)`.
pub fn expand_parameter_tokens<F>(expression: &str, mut render: F) -> String
where
    F: FnMut(&ParameterToken) -> String,
{
    TOKEN_RE
        .replace_all(expression, |caps: &Captures<'_>| {
            let cast = caps
                .get(1)
                .and_then(|group| group.as_str().parse::<LiteralType>().ok());
            render(&ParameterToken {
                name: caps[2].to_string(),
                cast,
            })
        })
        .into_owned()
}

fn parse_cast(cast: Option<&str>) -> std::result::Result<Option<LiteralType>, String> {
    match cast {
        None => Ok(None),
        Some(value) => value
            .parse::<LiteralType>()
            .map(Some)
            .map_err(|_| format!("unknown cast type '{value}'")),
    }
}

fn split_cast(raw: &str) -> std::result::Result<(Option<LiteralType>, &str), String> {
    let Some(rest) = raw.strip_prefix('(') else {
        return Ok((None, raw));
    };
    let Some((cast, value)) = rest.split_once(')') else {
        return Ok((None, raw));
    };
    match cast.parse::<LiteralType>() {
        Ok(kind) => Ok((Some(kind), value)),
        Err(_) => Ok((None, raw)),
    }
}

fn validate_plain(value_type: LiteralType, value: &str) -> std::result::Result<(), String> {
    let valid = match value_type {
        LiteralType::String => true,
        LiteralType::Char => value.chars().count() == 1,
        LiteralType::Bool => matches!(value, "true" | "false" | "1" | "0"),
        LiteralType::Date => DATE_RE.is_match(value),
        LiteralType::Decimal => DECIMAL_RE.is_match(value),
        kind if kind.is_unsigned() => UNSIGNED_RE.is_match(value),
        _ => SIGNED_RE.is_match(value),
    };
    if valid {
        Ok(())
    } else {
        Err(format!("'{value}' is not a valid {value_type} literal"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_string_captures_params() {
        let parsed = TypeString::parse("conditional_combined_probability[I64u;Decimal]").unwrap();
        assert_eq!(parsed.name, "conditional_combined_probability");
        assert_eq!(parsed.params, vec!["I64u", "Decimal"]);
        assert_eq!(parsed.to_string(), "conditional_combined_probability[I64u;Decimal]");

        let bare = TypeString::parse("field_setter").unwrap();
        assert!(bare.params.is_empty());

        let collection = TypeString::parse("collection[binder]").unwrap();
        assert_eq!(collection.collection_element(), Some("binder"));

        assert!(TypeString::parse("Field Setter").is_err());
        assert!(TypeString::parse("const_value_provider[I32;]").is_err());
        assert!(TypeString::parse("x[[I32]]").is_err());
    }

    #[test]
    fn field_paths_split_root_inner_and_field() {
        let path = FieldPath::parse("order:customer:nation:name").unwrap();
        assert_eq!(path.root.as_deref(), Some("order"));
        assert_eq!(path.inner, vec!["customer", "nation"]);
        assert_eq!(path.field, "name");
        assert_eq!(path.to_string(), "order:customer:nation:name");

        let direct = FieldPath::parse("order:status").unwrap();
        assert!(direct.inner.is_empty());

        let bare = FieldPath::parse("status").unwrap();
        assert_eq!(bare.root, None);
        assert_eq!(bare.field, "status");

        assert!(FieldPath::parse("order::status").is_err());
        assert!(FieldPath::parse("").is_err());
    }

    #[test]
    fn reference_paths_accept_one_or_two_segments() {
        let path = ReferencePath::parse("order:customer").unwrap();
        assert_eq!(path.record.as_deref(), Some("order"));
        assert_eq!(path.reference, "customer");
        assert!(ReferencePath::parse("customer").unwrap().record.is_none());
        assert!(ReferencePath::parse("a:b:c").is_err());
    }

    #[test]
    fn literal_forms_are_recognized() {
        assert_eq!(
            LiteralForm::parse(LiteralType::Decimal, "%sf%").unwrap(),
            LiteralForm::Parameter {
                name: "sf".to_string(),
                cast: None
            }
        );
        assert_eq!(
            LiteralForm::parse(LiteralType::I64u, "%(I32)order.count%").unwrap(),
            LiteralForm::Parameter {
                name: "order.count".to_string(),
                cast: Some(LiteralType::I32)
            }
        );
        assert_eq!(
            LiteralForm::parse(LiteralType::I32, "${%x%+1}").unwrap(),
            LiteralForm::Expression("%x%+1".to_string())
        );
        assert_eq!(
            LiteralForm::parse(LiteralType::Date, "NULL").unwrap(),
            LiteralForm::Null
        );
        assert_eq!(
            LiteralForm::parse(LiteralType::I64, "(I16)42").unwrap(),
            LiteralForm::Plain {
                value: "42".to_string(),
                cast: Some(LiteralType::I16)
            }
        );
        assert_eq!(
            LiteralForm::parse(LiteralType::String, "(not a cast)").unwrap(),
            LiteralForm::Plain {
                value: "(not a cast)".to_string(),
                cast: None
            }
        );
    }

    #[test]
    fn plain_literals_are_validated_per_type() {
        assert!(LiteralForm::parse(LiteralType::I32, "-12").is_ok());
        assert!(LiteralForm::parse(LiteralType::I32u, "-12").is_err());
        assert!(LiteralForm::parse(LiteralType::Decimal, "0.25").is_ok());
        assert!(LiteralForm::parse(LiteralType::Decimal, "abc").is_err());
        assert!(LiteralForm::parse(LiteralType::Char, "ab").is_err());
        assert!(LiteralForm::parse(LiteralType::Bool, "true").is_ok());
        assert!(LiteralForm::parse(LiteralType::Date, "2024-01-31").is_ok());
        assert!(LiteralForm::parse(LiteralType::Date, "31/01/2024").is_err());
        assert!(LiteralForm::parse(LiteralType::I32, "${1+1}").is_err());
    }

    #[test]
    fn cast_prefixed_literals_are_validated_against_the_cast() {
        let err = LiteralForm::parse(LiteralType::String, "(I16)foo").unwrap_err();
        assert!(err.contains("I16"), "{err}");
        assert!(LiteralForm::parse(LiteralType::I64, "(I16)foo").is_err());
        assert!(LiteralForm::parse(LiteralType::I16, "(Decimal)0.5").is_ok());
        assert!(LiteralForm::parse(LiteralType::Decimal, "(I32u)-1").is_err());
    }

    #[test]
    fn expands_tokens_with_their_casts() {
        let expanded = expand_parameter_tokens("%a%*%(I64)b%", |token| {
            format!(
                "p<{}>({})",
                token.cast.map(|kind| kind.as_str()).unwrap_or("T"),
                token.name
            )
        });
        assert_eq!(expanded, "p<T>(a)*p<I64>(b)");
    }
}
