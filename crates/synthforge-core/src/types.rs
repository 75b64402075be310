use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CompileError;

static VECTOR_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)\[(\d+)\]$").expect("VECTOR_TYPE_RE: invalid regex pattern")
});

/// Scalar types accepted for literals and record fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LiteralType {
    Bool,
    Char,
    Date,
    Decimal,
    Enum,
    I16,
    I32,
    I64,
    I16u,
    I32u,
    I64u,
    String,
}

impl LiteralType {
    pub const ALL: [LiteralType; 12] = [
        LiteralType::Bool,
        LiteralType::Char,
        LiteralType::Date,
        LiteralType::Decimal,
        LiteralType::Enum,
        LiteralType::I16,
        LiteralType::I32,
        LiteralType::I64,
        LiteralType::I16u,
        LiteralType::I32u,
        LiteralType::I64u,
        LiteralType::String,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LiteralType::Bool => "Bool",
            LiteralType::Char => "Char",
            LiteralType::Date => "Date",
            LiteralType::Decimal => "Decimal",
            LiteralType::Enum => "Enum",
            LiteralType::I16 => "I16",
            LiteralType::I32 => "I32",
            LiteralType::I64 => "I64",
            LiteralType::I16u => "I16u",
            LiteralType::I32u => "I32u",
            LiteralType::I64u => "I64u",
            LiteralType::String => "String",
        }
    }

    /// Regex alternation matching exactly one literal type name.
    ///
    /// Longer names come first so `I16u` is never matched as `I16`.
    pub fn pattern() -> &'static str {
        "Bool|Char|Date|Decimal|Enum|I16u|I32u|I64u|I16|I32|I64|String"
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            LiteralType::I16
                | LiteralType::I32
                | LiteralType::I64
                | LiteralType::I16u
                | LiteralType::I32u
                | LiteralType::I64u
                | LiteralType::Enum
        )
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            LiteralType::I16u | LiteralType::I32u | LiteralType::I64u | LiteralType::Enum
        )
    }
}

impl fmt::Display for LiteralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LiteralType {
    type Err = CompileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        LiteralType::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str() == value)
            .ok_or_else(|| CompileError::UnsupportedType {
                type_string: value.to_string(),
                context: "literal".to_string(),
                expected: LiteralType::ALL
                    .iter()
                    .map(|kind| kind.as_str().to_string())
                    .collect(),
            })
    }
}

/// Declared type of a record field: a scalar or a fixed-size vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Scalar(LiteralType),
    Vector(LiteralType, usize),
}

impl FieldType {
    pub fn element(self) -> LiteralType {
        match self {
            FieldType::Scalar(inner) | FieldType::Vector(inner, _) => inner,
        }
    }

    pub fn is_enum(self) -> bool {
        matches!(self, FieldType::Scalar(LiteralType::Enum))
    }

    /// Type name as it appears in generated declarations.
    pub fn cpp_type(self) -> String {
        match self {
            FieldType::Scalar(inner) => inner.as_str().to_string(),
            FieldType::Vector(inner, _) => format!("vector<{inner}>"),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(inner) => write!(f, "{inner}"),
            FieldType::Vector(inner, size) => write!(f, "{inner}[{size}]"),
        }
    }
}

impl FromStr for FieldType {
    type Err = CompileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Some((inner, size)) = parse_vector_type(value) {
            let inner = inner.parse::<LiteralType>()?;
            if size == 0 {
                return Err(CompileError::malformed(format!(
                    "vector type '{value}' must have a positive size"
                )));
            }
            return Ok(FieldType::Vector(inner, size));
        }
        Ok(FieldType::Scalar(value.parse()?))
    }
}

fn parse_vector_type(value: &str) -> Option<(String, usize)> {
    let caps = VECTOR_TYPE_RE.captures(value)?;
    let size = caps[2].parse::<usize>().ok()?;
    Some((caps[1].to_string(), size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_literal_type() {
        for kind in LiteralType::ALL {
            assert_eq!(kind.as_str().parse::<LiteralType>().unwrap(), kind);
        }
        assert!("I128".parse::<LiteralType>().is_err());
        assert!("string".parse::<LiteralType>().is_err());
    }

    #[test]
    fn parses_vector_field_types() {
        assert_eq!(
            "Decimal[3]".parse::<FieldType>().unwrap(),
            FieldType::Vector(LiteralType::Decimal, 3)
        );
        assert_eq!(
            "I16u".parse::<FieldType>().unwrap(),
            FieldType::Scalar(LiteralType::I16u)
        );
        assert!("Decimal[0]".parse::<FieldType>().is_err());
        assert!("Foo[2]".parse::<FieldType>().is_err());
        assert_eq!(
            FieldType::Vector(LiteralType::I32, 2).cpp_type(),
            "vector<I32>"
        );
    }

    #[test]
    fn literal_type_pattern_prefers_unsigned_names() {
        let re = Regex::new(&format!("^({})$", LiteralType::pattern())).unwrap();
        for kind in LiteralType::ALL {
            assert!(re.is_match(kind.as_str()), "{kind} should match");
        }
        let prefix = Regex::new(&format!("^({})", LiteralType::pattern())).unwrap();
        assert_eq!(&prefix.captures("I64u").unwrap()[1], "I64u");
    }
}
