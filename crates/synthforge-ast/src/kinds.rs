//! Closed catalogue of component kinds.
//!
//! Every kind declares its type-string pattern, argument schema and the
//! constructor directives the emitter renders. Candidate order per category is
//! fixed so type dispatch is deterministic.

use std::fmt;
use std::str::FromStr;

use synthforge_core::{CompileError, LiteralType};

/// Dispatch context a component is created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Function,
    EnumSet,
    Setter,
    ValueProvider,
    RangeProvider,
    ReferenceProvider,
    PredicateProvider,
    Binder,
    CardinalityEstimator,
    SequenceIterator,
    OutputFormat,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Function,
        Category::EnumSet,
        Category::Setter,
        Category::ValueProvider,
        Category::RangeProvider,
        Category::ReferenceProvider,
        Category::PredicateProvider,
        Category::Binder,
        Category::CardinalityEstimator,
        Category::SequenceIterator,
        Category::OutputFormat,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Function => "function",
            Category::EnumSet => "enum_set",
            Category::Setter => "setter",
            Category::ValueProvider => "value_provider",
            Category::RangeProvider => "range_provider",
            Category::ReferenceProvider => "reference_provider",
            Category::PredicateProvider => "predicate_provider",
            Category::Binder => "binder",
            Category::CardinalityEstimator => "cardinality_estimator",
            Category::SequenceIterator => "sequence_iterator",
            Category::OutputFormat => "output_format",
        }
    }

    /// Kinds admitted in this context, in match order.
    pub fn candidates(self) -> &'static [ComponentKind] {
        use ComponentKind::*;
        match self {
            Category::Function => &[
                UniformProbability,
                NormalProbability,
                ParetoProbability,
                CombinedProbability,
                ConditionalCombinedProbability,
            ],
            Category::EnumSet => &[EnumSet],
            Category::Setter => &[FieldSetter, ReferenceSetter],
            Category::ValueProvider => &[
                CallbackValueProvider,
                ClusteredValueProvider,
                ConstValueProvider,
                ContextFieldValueProvider,
                ElementWiseValueProvider,
                RandomValueProvider,
            ],
            Category::RangeProvider => &[ConstRangeProvider, ContextFieldRangeProvider],
            Category::ReferenceProvider => {
                &[ClusteredReferenceProvider, RandomReferenceProvider]
            }
            Category::PredicateProvider => &[EqualityPredicateProvider],
            Category::Binder => &[FieldBinder],
            Category::CardinalityEstimator => &[ConstEstimator, LinearScaleEstimator],
            Category::SequenceIterator => &[PartitionedIterator],
            Category::OutputFormat => &[EmptyOutputFormat, CsvOutputFormat],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concrete component kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    UniformProbability,
    NormalProbability,
    ParetoProbability,
    CombinedProbability,
    ConditionalCombinedProbability,
    EnumSet,
    FieldSetter,
    ReferenceSetter,
    CallbackValueProvider,
    ClusteredValueProvider,
    ConstValueProvider,
    ContextFieldValueProvider,
    ElementWiseValueProvider,
    RandomValueProvider,
    ConstRangeProvider,
    ContextFieldRangeProvider,
    ClusteredReferenceProvider,
    RandomReferenceProvider,
    EqualityPredicateProvider,
    FieldBinder,
    ConstEstimator,
    LinearScaleEstimator,
    PartitionedIterator,
    EmptyOutputFormat,
    CsvOutputFormat,
}

impl ComponentKind {
    pub fn spec(self) -> &'static KindSpec {
        &CATALOGUE[self as usize]
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().name)
    }
}

/// Static description of one component kind.
#[derive(Debug)]
pub struct KindSpec {
    /// Type-string name, without parameters.
    pub name: &'static str,
    pub params: &'static [TypeParam],
    pub category: Category,
    /// Runtime class name, without template arguments.
    pub class_name: &'static str,
    /// Runtime header declaring `class_name`.
    pub include: &'static str,
    pub args: &'static [ArgSpec],
    pub directives: &'static [Directive],
}

impl KindSpec {
    /// Anchored regex matching the kind's type strings.
    pub fn pattern(&self) -> String {
        let name = regex::escape(self.name);
        if self.params.is_empty() {
            return format!("^{name}$");
        }
        let params = self
            .params
            .iter()
            .map(|param| match param {
                TypeParam::Literal(_) => format!("({})", LiteralType::pattern()),
                TypeParam::Size(_) => r"([1-9]\d*)".to_string(),
            })
            .collect::<Vec<_>>()
            .join(";");
        format!(r"^{name}\[{params}\]$")
    }

    /// Human-readable form used in `UnsupportedType` errors.
    pub fn signature(&self) -> String {
        if self.params.is_empty() {
            return self.name.to_string();
        }
        let params = self
            .params
            .iter()
            .map(|param| match param {
                TypeParam::Literal(_) => "T",
                TypeParam::Size(_) => "N",
            })
            .collect::<Vec<_>>()
            .join(";");
        format!("{}[{params}]", self.name)
    }

    pub fn arg(&self, key: &str) -> Option<&'static ArgSpec> {
        self.args.iter().find(|arg| arg.key == key)
    }
}

/// Type parameter captured from a type string into a named attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeParam {
    Literal(&'static str),
    Size(&'static str),
}

impl TypeParam {
    pub fn attribute(self) -> &'static str {
        match self {
            TypeParam::Literal(name) | TypeParam::Size(name) => name,
        }
    }
}

/// One entry of an argument schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    pub key: &'static str,
    pub kind: ArgKind,
    pub optional: bool,
    /// Literal used when the argument is absent.
    pub default: Option<(LiteralType, &'static str)>,
}

impl ArgSpec {
    const fn required(key: &'static str, kind: ArgKind) -> Self {
        Self {
            key,
            kind,
            optional: false,
            default: None,
        }
    }

    const fn defaulted(key: &'static str, value_type: LiteralType, value: &'static str) -> Self {
        Self {
            key,
            kind: ArgKind::Single(ElementKind::Literal),
            optional: true,
            default: Some((value_type, value)),
        }
    }
}

/// Cardinality and element kind of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Single(ElementKind),
    Collection(ElementKind),
}

impl ArgKind {
    pub fn element(self) -> ElementKind {
        match self {
            ArgKind::Single(element) | ArgKind::Collection(element) => element,
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgKind::Single(element) => write!(f, "{element}"),
            ArgKind::Collection(element) => write!(f, "collection[{element}]"),
        }
    }
}

impl FromStr for ArgKind {
    type Err = CompileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value
            .strip_prefix("collection[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            Some(inner) => Ok(ArgKind::Collection(inner.parse()?)),
            None => Ok(ArgKind::Single(value.parse()?)),
        }
    }
}

/// What a single argument element holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Literal,
    FieldRef,
    ReferenceRef,
    FunctionRef,
    ValueProvider,
    RangeProvider,
    ReferenceProvider,
    PredicateProvider,
    Binder,
}

impl ElementKind {
    const ALL: [ElementKind; 9] = [
        ElementKind::Literal,
        ElementKind::FieldRef,
        ElementKind::ReferenceRef,
        ElementKind::FunctionRef,
        ElementKind::ValueProvider,
        ElementKind::RangeProvider,
        ElementKind::ReferenceProvider,
        ElementKind::PredicateProvider,
        ElementKind::Binder,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Literal => "literal",
            ElementKind::FieldRef => "field_ref",
            ElementKind::ReferenceRef => "reference_ref",
            ElementKind::FunctionRef => "function_ref",
            ElementKind::ValueProvider => "value_provider",
            ElementKind::RangeProvider => "range_provider",
            ElementKind::ReferenceProvider => "reference_provider",
            ElementKind::PredicateProvider => "predicate_provider",
            ElementKind::Binder => "binder",
        }
    }

    /// Category of the nested component, if the element is one.
    pub fn category(self) -> Option<Category> {
        match self {
            ElementKind::ValueProvider => Some(Category::ValueProvider),
            ElementKind::RangeProvider => Some(Category::RangeProvider),
            ElementKind::ReferenceProvider => Some(Category::ReferenceProvider),
            ElementKind::PredicateProvider => Some(Category::PredicateProvider),
            ElementKind::Binder => Some(Category::Binder),
            _ => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = CompileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ElementKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| CompileError::UnsupportedType {
                type_string: value.to_string(),
                context: "argument kind".to_string(),
                expected: ElementKind::ALL
                    .iter()
                    .map(|kind| kind.as_str().to_string())
                    .collect(),
            })
    }
}

/// Constructor-argument directive, rendered to one C++ expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Typed value of a literal argument.
    Literal(&'static str),
    /// Emitted as written.
    Verbatim(&'static str),
    /// Name bound by the enclosing artifact (`config`).
    EnvVariable(&'static str),
    /// Variable of the setter bound to a directly attached field.
    FieldSetterRef(&'static str),
    /// Inspector of the generator targeted by the owning reference setter.
    SequenceInspector,
    /// Function registered in the generator config.
    FunctionRef(&'static str),
    /// Variable of a nested component, or of every collection member.
    RuntimeComponentRef(&'static str),
    /// Pointer to the abstract callback hook named by a literal argument.
    CallbackRef(&'static str),
    /// Lambda reading a field through its reference path.
    FieldAccessor(&'static str),
}

use ArgKind::{Collection, Single};
use ElementKind as E;

const VALUE_TYPE: TypeParam = TypeParam::Literal("value_type");

static CATALOGUE: [KindSpec; 25] = [
    KindSpec {
        name: "uniform_probability",
        params: &[VALUE_TYPE],
        category: Category::Function,
        class_name: "UniformPrFunction",
        include: "math/probability/Probability.h",
        args: &[
            ArgSpec::required("x_min", Single(E::Literal)),
            ArgSpec::required("x_max", Single(E::Literal)),
        ],
        directives: &[Directive::Literal("x_min"), Directive::Literal("x_max")],
    },
    KindSpec {
        name: "normal_probability",
        params: &[],
        category: Category::Function,
        class_name: "NormalPrFunction",
        include: "math/probability/Probability.h",
        args: &[
            ArgSpec::required("mean", Single(E::Literal)),
            ArgSpec::required("stddev", Single(E::Literal)),
        ],
        directives: &[Directive::Literal("mean"), Directive::Literal("stddev")],
    },
    KindSpec {
        name: "pareto_probability",
        params: &[],
        category: Category::Function,
        class_name: "ParetoPrFunction",
        include: "math/probability/Probability.h",
        args: &[
            ArgSpec::required("x_min", Single(E::Literal)),
            ArgSpec::required("alpha", Single(E::Literal)),
        ],
        directives: &[Directive::Literal("x_min"), Directive::Literal("alpha")],
    },
    KindSpec {
        name: "combined_probability",
        params: &[VALUE_TYPE],
        category: Category::Function,
        class_name: "CombinedPrFunction",
        include: "math/probability/Probability.h",
        args: &[ArgSpec::required("path", Single(E::Literal))],
        directives: &[Directive::Literal("path")],
    },
    KindSpec {
        name: "conditional_combined_probability",
        params: &[VALUE_TYPE, TypeParam::Literal("condition_type")],
        category: Category::Function,
        class_name: "ConditionalCombinedPrFunction",
        include: "math/probability/Probability.h",
        args: &[ArgSpec::required("path", Single(E::Literal))],
        directives: &[Directive::Literal("path")],
    },
    KindSpec {
        name: "enum_set",
        params: &[],
        category: Category::EnumSet,
        class_name: "EnumSet",
        include: "config/EnumSet.h",
        args: &[ArgSpec::required("path", Single(E::Literal))],
        directives: &[Directive::Literal("path")],
    },
    KindSpec {
        name: "field_setter",
        params: &[],
        category: Category::Setter,
        class_name: "FieldSetter",
        include: "runtime/setter/FieldSetter.h",
        args: &[
            ArgSpec::required("field", Single(E::FieldRef)),
            ArgSpec::required("value", Single(E::ValueProvider)),
        ],
        directives: &[Directive::RuntimeComponentRef("value")],
    },
    KindSpec {
        name: "reference_setter",
        params: &[],
        category: Category::Setter,
        class_name: "ReferenceSetter",
        include: "runtime/setter/ReferenceSetter.h",
        args: &[
            ArgSpec::required("reference", Single(E::ReferenceRef)),
            ArgSpec::required("value", Single(E::ReferenceProvider)),
        ],
        directives: &[Directive::RuntimeComponentRef("value")],
    },
    KindSpec {
        name: "callback_value_provider",
        params: &[VALUE_TYPE],
        category: Category::ValueProvider,
        class_name: "CallbackValueProvider",
        include: "runtime/provider/value/CallbackValueProvider.h",
        args: &[
            ArgSpec::required("name", Single(E::Literal)),
            ArgSpec::defaulted("arity", LiteralType::I16u, "0"),
        ],
        directives: &[
            Directive::Verbatim("*this"),
            Directive::CallbackRef("name"),
            Directive::Literal("arity"),
        ],
    },
    KindSpec {
        name: "clustered_value_provider",
        params: &[VALUE_TYPE],
        category: Category::ValueProvider,
        class_name: "ClusteredValueProvider",
        include: "runtime/provider/value/ClusteredValueProvider.h",
        args: &[
            ArgSpec::required("probability", Single(E::FunctionRef)),
            ArgSpec::required("cardinality", Single(E::RangeProvider)),
        ],
        directives: &[
            Directive::FunctionRef("probability"),
            Directive::RuntimeComponentRef("cardinality"),
        ],
    },
    KindSpec {
        name: "const_value_provider",
        params: &[VALUE_TYPE],
        category: Category::ValueProvider,
        class_name: "ConstValueProvider",
        include: "runtime/provider/value/ConstValueProvider.h",
        args: &[ArgSpec::required("value", Single(E::Literal))],
        directives: &[Directive::Literal("value")],
    },
    KindSpec {
        name: "context_field_value_provider",
        params: &[VALUE_TYPE],
        category: Category::ValueProvider,
        class_name: "ContextFieldValueProvider",
        include: "runtime/provider/value/ContextFieldValueProvider.h",
        args: &[ArgSpec::required("field", Single(E::FieldRef))],
        directives: &[Directive::FieldAccessor("field")],
    },
    KindSpec {
        name: "element_wise_value_provider",
        params: &[VALUE_TYPE, TypeParam::Size("size")],
        category: Category::ValueProvider,
        class_name: "ElementWiseValueProvider",
        include: "runtime/provider/value/ElementWiseValueProvider.h",
        args: &[ArgSpec::required(
            "element_value_provider",
            Collection(E::ValueProvider),
        )],
        directives: &[Directive::RuntimeComponentRef("element_value_provider")],
    },
    KindSpec {
        name: "random_value_provider",
        params: &[VALUE_TYPE],
        category: Category::ValueProvider,
        class_name: "RandomValueProvider",
        include: "runtime/provider/value/RandomValueProvider.h",
        args: &[ArgSpec::required("probability", Single(E::FunctionRef))],
        directives: &[Directive::FunctionRef("probability")],
    },
    KindSpec {
        name: "const_range_provider",
        params: &[VALUE_TYPE],
        category: Category::RangeProvider,
        class_name: "ConstRangeProvider",
        include: "runtime/provider/range/ConstRangeProvider.h",
        args: &[
            ArgSpec::required("min", Single(E::Literal)),
            ArgSpec::required("max", Single(E::Literal)),
        ],
        directives: &[Directive::Literal("min"), Directive::Literal("max")],
    },
    KindSpec {
        name: "context_field_range_provider",
        params: &[VALUE_TYPE],
        category: Category::RangeProvider,
        class_name: "ContextFieldRangeProvider",
        include: "runtime/provider/range/ContextFieldRangeProvider.h",
        args: &[ArgSpec::required("field", Single(E::FieldRef))],
        directives: &[Directive::FieldSetterRef("field")],
    },
    KindSpec {
        name: "clustered_reference_provider",
        params: &[],
        category: Category::ReferenceProvider,
        class_name: "ClusteredReferenceProvider",
        include: "runtime/provider/reference/ClusteredReferenceProvider.h",
        args: &[
            ArgSpec::required("children_count", Single(E::RangeProvider)),
            ArgSpec::required("children_count_max", Single(E::Literal)),
        ],
        directives: &[
            Directive::RuntimeComponentRef("children_count"),
            Directive::Literal("children_count_max"),
            Directive::SequenceInspector,
        ],
    },
    KindSpec {
        name: "random_reference_provider",
        params: &[],
        category: Category::ReferenceProvider,
        class_name: "RandomReferenceProvider",
        include: "runtime/provider/reference/RandomReferenceProvider.h",
        args: &[ArgSpec::required("predicate", Single(E::PredicateProvider))],
        directives: &[
            Directive::RuntimeComponentRef("predicate"),
            Directive::SequenceInspector,
        ],
    },
    KindSpec {
        name: "equality_predicate_provider",
        params: &[],
        category: Category::PredicateProvider,
        class_name: "EqualityPredicateProvider",
        include: "runtime/provider/predicate/EqualityPredicateProvider.h",
        args: &[ArgSpec::required("binder", Collection(E::Binder))],
        directives: &[Directive::RuntimeComponentRef("binder")],
    },
    KindSpec {
        name: "field_binder",
        params: &[],
        category: Category::Binder,
        class_name: "FieldBinder",
        include: "runtime/provider/predicate/FieldBinder.h",
        args: &[
            ArgSpec::required("field", Single(E::FieldRef)),
            ArgSpec::required("value", Single(E::ValueProvider)),
        ],
        directives: &[Directive::RuntimeComponentRef("value")],
    },
    KindSpec {
        name: "const_estimator",
        params: &[],
        category: Category::CardinalityEstimator,
        class_name: "ConstEstimator",
        include: "runtime/setter/CardinalityEstimator.h",
        args: &[ArgSpec::required("cardinality", Single(E::Literal))],
        directives: &[Directive::Literal("cardinality")],
    },
    KindSpec {
        name: "linear_scale_estimator",
        params: &[],
        category: Category::CardinalityEstimator,
        class_name: "LinearScaleEstimator",
        include: "runtime/setter/CardinalityEstimator.h",
        args: &[ArgSpec::required("base_cardinality", Single(E::Literal))],
        directives: &[
            Directive::EnvVariable("config"),
            Directive::Literal("base_cardinality"),
        ],
    },
    KindSpec {
        name: "partitioned_iterator",
        params: &[],
        category: Category::SequenceIterator,
        class_name: "PartitionedSequenceIteratorTask",
        include: "generator/PartitionedSequenceIterator.h",
        args: &[],
        directives: &[Directive::Verbatim("*this"), Directive::EnvVariable("config")],
    },
    KindSpec {
        name: "empty",
        params: &[],
        category: Category::OutputFormat,
        class_name: "EmptyOutputFormat",
        include: "io/OutputCollector.h",
        args: &[],
        directives: &[],
    },
    KindSpec {
        name: "csv",
        params: &[],
        category: Category::OutputFormat,
        class_name: "CsvOutputFormat",
        include: "io/OutputCollector.h",
        args: &[
            ArgSpec::defaulted("delimiter", LiteralType::Char, "|"),
            ArgSpec::defaulted("quoted", LiteralType::Bool, "false"),
        ],
        directives: &[],
    },
];
