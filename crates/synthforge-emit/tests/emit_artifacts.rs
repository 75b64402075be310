use std::path::Path;

use synthforge_core::CompileError;
use synthforge_emit::{ArtifactSink, MemorySink, OUTPUT_DIRECTORIES, compile_document};

const ORDER_SCENARIO: &str = r#"<generator_prototype xmlns="urn:synthforge:prototype:1.0">
  <enum_sets>
    <enum_set key="status"><argument key="path" type="String" value="status.csv"/></enum_set>
  </enum_sets>
  <record_sequences>
    <random_sequence key="order">
      <record_type>
        <field name="status" type="Enum" enumref="status"/>
      </record_type>
      <setter_chain>
        <setter key="set_status" type="field_setter">
          <argument key="field" ref="status"/>
          <argument key="value" type="const_value_provider[Enum]">
            <argument key="value" type="Enum" value="0"/>
          </argument>
        </setter>
      </setter_chain>
      <cardinality_estimator type="const_estimator">
        <argument key="cardinality" type="I64u" value="1000"/>
      </cardinality_estimator>
    </random_sequence>
  </record_sequences>
</generator_prototype>"#;

fn shop(order_setters: &str, extra_sequences: &str) -> String {
    format!(
        r#"<generator_prototype>
  <parameters>
    <parameter key="sf" value="1"/>
  </parameters>
  <functions>
    <function key="pr_priority" type="uniform_probability[I16]">
      <argument key="x_min" type="I16" value="1"/>
      <argument key="x_max" type="I16" value="5"/>
    </function>
  </functions>
  <enum_sets>
    <enum_set key="status"><argument key="path" type="String" value="status.csv"/></enum_set>
  </enum_sets>
  <record_sequences>
    <random_sequence key="customer">
      <record_type>
        <field name="status" type="Enum" enumref="status"/>
        <field name="discount" type="Decimal" derived="true"/>
      </record_type>
      <output_format type="csv">
        <argument key="delimiter" type="Char" value=","/>
      </output_format>
      <setter_chain>
        <setter key="set_status" type="field_setter">
          <argument key="field" ref="status"/>
          <argument key="value" type="const_value_provider[Enum]">
            <argument key="value" type="Enum" value="0"/>
          </argument>
        </setter>
      </setter_chain>
      <cardinality_estimator type="linear_scale_estimator">
        <argument key="base_cardinality" type="I64u" value="150"/>
      </cardinality_estimator>
      <sequence_iterator type="partitioned_iterator"/>
    </random_sequence>
    <random_sequence key="order">
      <record_type>
        <field name="priority" type="I16"/>
        <field name="status" type="Enum" enumref="status"/>
        <field name="comment" type="String"/>
        <reference name="customer" type="customer"/>
      </record_type>
      <setter_chain>{order_setters}</setter_chain>
      <cardinality_estimator type="const_estimator">
        <argument key="cardinality" type="I64u" value="${{%sf%*1000}}"/>
      </cardinality_estimator>
    </random_sequence>{extra_sequences}
  </record_sequences>
</generator_prototype>"#
    )
}

const ORDER_SETTERS: &str = r#"
  <setter key="set_customer" type="reference_setter">
    <argument key="reference" ref="order:customer"/>
    <argument key="value" type="random_reference_provider">
      <argument key="predicate" type="equality_predicate_provider">
        <argument key="binder" type="field_binder">
          <argument key="field" ref="customer:status"/>
          <argument key="value" type="const_value_provider[Enum]">
            <argument key="value" type="Enum" value="1"/>
          </argument>
        </argument>
      </argument>
    </argument>
  </setter>
  <setter key="set_priority" type="field_setter">
    <argument key="field" ref="order:priority"/>
    <argument key="value" type="random_value_provider[I16]">
      <argument key="probability" ref="pr_priority"/>
    </argument>
  </setter>
  <setter key="set_status" type="field_setter">
    <argument key="field" ref="order:status"/>
    <argument key="value" type="context_field_value_provider[Enum]">
      <argument key="field" ref="order:customer:status"/>
    </argument>
  </setter>
  <setter key="set_comment" type="field_setter">
    <argument key="field" ref="order:comment"/>
    <argument key="value" type="callback_value_provider[String]">
      <argument key="name" type="String" value="computeComment"/>
    </argument>
  </setter>
"#;

fn compile(document: &str, namespace: &str) -> (MemorySink, synthforge_emit::EmitReport) {
    let mut sink = MemorySink::new();
    let report = compile_document(document, namespace, &mut sink).expect("document compiles");
    (sink, report)
}

fn artifact<'a>(sink: &'a MemorySink, path: &str) -> &'a str {
    sink.get(path)
        .unwrap_or_else(|| panic!("missing artifact {path}"))
}

#[test]
fn order_scenario_emits_every_artifact() {
    let (sink, report) = compile(ORDER_SCENARIO, "Shop");

    for dir in OUTPUT_DIRECTORIES {
        assert!(sink.exists(Path::new(dir)), "missing directory {dir}");
    }
    assert_eq!(
        report.base_written,
        vec![
            "config/base/BaseGeneratorConfig.h",
            "record/base/BaseOrderMeta.h",
            "record/base/BaseOrder.h",
            "record/base/BaseOrderUtil.h",
            "runtime/setter/base/BaseOrderSetterChain.h",
            "generator/base/BaseOrderGenerator.h",
            "generator/base/BaseGeneratorSubsystem.h",
        ]
    );
    assert_eq!(report.leaf_created.len(), 7);
    assert!(report.leaf_skipped.is_empty());
    assert!(report.warnings.is_empty());

    let meta = artifact(&sink, "record/base/BaseOrderMeta.h");
    assert!(meta.contains("status(enumSets.get(\"status\").values())"));
    assert!(meta.contains("const vector<String>& status;"));

    let record = artifact(&sink, "record/base/BaseOrder.h");
    assert!(record.contains("class BaseOrder : public Record"));
    assert!(record.contains("const Enum& status() const"));
    assert!(record.contains("const String& statusEnumValue() const"));
    assert!(record.contains("return _meta.status[_status];"));

    let chain = artifact(&sink, "runtime/setter/base/BaseOrderSetterChain.h");
    assert!(chain.contains("typedef ConstValueProvider<Enum, Order> ConstValueProviderType01;"));
    assert!(chain.contains(
        "typedef FieldSetter<Order, RecordTraits<Order>::STATUS, ConstValueProviderType01> \
         FieldSetterType01;"
    ));
    assert!(chain.contains("_constValueProvider01(static_cast<Enum>(0)),"));
    assert!(chain.contains("_setStatus(_constValueProvider01)"));
    let apply = chain.find("_setStatus(recordPtr);").expect("setter applied");
    let filter = chain.find("Interval<I64u> filter").expect("filter emitted");
    assert!(apply < filter);

    let generator = artifact(&sink, "generator/base/BaseOrderGenerator.h");
    assert!(generator.contains("_cardinalityEstimator(static_cast<I64u>(1000))"));
    assert!(generator.contains("ConstEstimator _cardinalityEstimator;"));

    let config = artifact(&sink, "config/base/BaseGeneratorConfig.h");
    assert!(config.contains("enumSet(new EnumSet(\"status\", \"status.csv\"));"));

    let subsystem = artifact(&sink, "generator/base/BaseGeneratorSubsystem.h");
    assert!(subsystem.contains("registerGenerator<Shop::OrderGenerator>(\"order\");"));

    let leaf = artifact(&sink, "record/Order.h");
    assert!(leaf.contains("#include \"record/base/BaseOrder.h\""));
    assert!(leaf.contains("class Order : public BaseOrder"));
    assert!(leaf.starts_with("// Generated once by synthforge"));
}

#[test]
fn headers_are_guarded_and_namespaced() {
    let (sink, _) = compile(ORDER_SCENARIO, "Acme::Shop");
    let record = artifact(&sink, "record/base/BaseOrder.h");
    assert!(record.contains("#ifndef RECORD_BASE_BASEORDER_H_\n#define RECORD_BASE_BASEORDER_H_"));
    assert!(record.contains("using namespace Runtime;"));
    assert!(record.contains("namespace Acme {\nnamespace Shop {"));
    assert!(record.trim_end().ends_with("#endif /* RECORD_BASE_BASEORDER_H_ */"));

    let subsystem = artifact(&sink, "generator/base/BaseGeneratorSubsystem.h");
    assert!(subsystem.contains("registerGenerator<Acme::Shop::OrderGenerator>(\"order\");"));
}

#[test]
fn setter_chain_names_members_in_post_order() {
    let (sink, report) = compile(&shop(ORDER_SETTERS, ""), "Shop");
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    let chain = artifact(&sink, "runtime/setter/base/BaseOrderSetterChain.h");
    let typedefs = [
        "typedef ConstValueProvider<Enum, Order> ConstValueProviderType01;",
        "typedef FieldBinder<Customer, RecordTraits<Customer>::STATUS, ConstValueProviderType01> \
         FieldBinderType01;",
        "typedef EqualityPredicateProvider<Customer, Order> EqualityPredicateProviderType01;",
        "typedef RandomReferenceProvider<Customer, Order> RandomReferenceProviderType01;",
        "typedef ReferenceSetter<Order, RecordTraits<Order>::CUSTOMER, \
         RandomReferenceProviderType01> ReferenceSetterType01;",
        "typedef RandomValueProvider<I16, Order, UniformPrFunction<I16>> \
         RandomValueProviderType01;",
        "typedef FieldSetter<Order, RecordTraits<Order>::PRIORITY, RandomValueProviderType01> \
         FieldSetterType01;",
        "typedef ContextFieldValueProvider<Enum, Order> ContextFieldValueProviderType01;",
        "typedef FieldSetter<Order, RecordTraits<Order>::STATUS, \
         ContextFieldValueProviderType01> FieldSetterType02;",
        "typedef CallbackValueProvider<String, Order, BaseOrderSetterChain> \
         CallbackValueProviderType01;",
        "typedef FieldSetter<Order, RecordTraits<Order>::COMMENT, CallbackValueProviderType01> \
         FieldSetterType03;",
    ];
    let mut cursor = 0;
    for typedef in typedefs {
        let found = chain[cursor..]
            .find(typedef)
            .unwrap_or_else(|| panic!("typedef out of order or missing: {typedef}"));
        cursor += found + typedef.len();
    }

    assert!(chain.contains("_sequenceCardinality(config.cardinality(\"order\")),"));
    assert!(chain.contains("_equalityPredicateProvider01(_fieldBinder01),"));
    assert!(chain.contains(
        "_randomReferenceProvider01(_equalityPredicateProvider01, \
         config.generatorPool().get<CustomerGenerator>().inspector()),"
    ));
    assert!(chain.contains(
        "_randomValueProvider01(config.function<UniformPrFunction<I16>>(\"pr_priority\")),"
    ));
    assert!(chain.contains(
        "_contextFieldValueProvider01([](const AutoPtr<Order>& cxt) \
         { return cxt->customer()->status(); }),"
    ));
    assert!(chain.contains(
        "_callbackValueProvider01(*this, &BaseOrderSetterChain::computeComment, \
         static_cast<I16u>(0)),"
    ));
    assert!(chain.contains("_setComment(_callbackValueProvider01)\n"));
    assert!(chain.contains(
        "virtual String computeComment(const AutoPtr<Order>& cxt) const = 0;"
    ));

    let customer = chain.find("_setCustomer(recordPtr);").expect("reference setter applied");
    let priority = chain.find("_setPriority(recordPtr);").expect("priority setter applied");
    let comment = chain.find("_setComment(recordPtr);").expect("comment setter applied");
    assert!(customer < priority && priority < comment);
    assert!(chain.contains("_setPriority.filterRange(predicate, result);"));
    assert!(!chain.contains("_setCustomer.filterRange"));

    assert!(chain.contains("#include \"generator/CustomerGenerator.h\""));
    assert!(chain.contains("#include \"record/CustomerUtil.h\""));
    assert!(chain.contains("#include \"runtime/provider/value/CallbackValueProvider.h\""));

    let leaf = artifact(&sink, "runtime/setter/OrderSetterChain.h");
    assert!(leaf.contains("virtual String computeComment(const AutoPtr<Order>& cxt) const\n"));
    assert!(leaf.contains("return nullValue<String>();"));
}

#[test]
fn config_and_generators_render_literals_in_their_scope() {
    let (sink, _) = compile(&shop(ORDER_SETTERS, ""), "Shop");

    let config = artifact(&sink, "config/base/BaseGeneratorConfig.h");
    assert!(config.contains("setDefault(\"sf\", \"1\");"));
    assert!(config.contains(
        "function(new UniformPrFunction<I16>(\"pr_priority\", static_cast<I16>(1), \
         static_cast<I16>(5)));"
    ));
    assert!(config.contains("#include \"math/probability/Probability.h\""));

    let order = artifact(&sink, "generator/base/BaseOrderGenerator.h");
    assert!(order.contains(
        "_cardinalityEstimator(static_cast<I64u>(config.parameter<I64u>(\"sf\")*1000))"
    ));

    let customer = artifact(&sink, "generator/base/BaseCustomerGenerator.h");
    assert!(customer.contains("_cardinalityEstimator(config, static_cast<I64u>(150))"));
    assert!(customer.contains("LinearScaleEstimator _cardinalityEstimator;"));
    assert!(customer.contains(
        "registerTask(new PartitionedSequenceIteratorTask<Customer>(*this, _config));"
    ));
}

#[test]
fn derived_fields_are_abstract_in_the_base_record() {
    let (sink, _) = compile(&shop(ORDER_SETTERS, ""), "Shop");

    let base = artifact(&sink, "record/base/BaseCustomer.h");
    assert!(base.contains("virtual Decimal discount() const = 0;"));
    assert!(!base.contains("_discount"));

    let leaf = artifact(&sink, "record/Customer.h");
    assert!(leaf.contains("virtual Decimal discount() const\n"));
    assert!(leaf.contains("return nullValue<Decimal>();"));

    let util = artifact(&sink, "record/base/BaseCustomerUtil.h");
    assert!(util.contains(
        "struct RecordFieldTraits<Shop::Customer, RecordTraits<Shop::Customer>::DISCOUNT>"
    ));
    assert!(util.contains("static inline Decimal get(const AutoPtr<Shop::Customer>& record)"));
}

#[test]
fn record_traits_enumerate_fields_and_references() {
    let (sink, _) = compile(&shop(ORDER_SETTERS, ""), "Shop");
    let util = artifact(&sink, "record/base/BaseOrderUtil.h");

    let expected = ["UNKNOWN,", "GEN_ID,", "PRIORITY,", "STATUS,", "COMMENT,", "CUSTOMER,"];
    let mut cursor = 0;
    for constant in expected {
        let found = util[cursor..]
            .find(constant)
            .unwrap_or_else(|| panic!("constant out of order or missing: {constant}"));
        cursor += found + constant.len();
    }
    assert!(util.contains("typedef Shop::OrderGenerator GeneratorType;"));
    assert!(util.contains("typedef Shop::OrderSetterChain SetterChainType;"));
    assert!(util.contains("return record->genID();"));
    assert!(util.contains("typedef AutoPtr<Shop::Customer> FieldType;"));
    assert!(util.contains("record->customer(value);"));

    let record = artifact(&sink, "record/base/BaseOrder.h");
    assert!(record.contains("class Customer;"));
    assert!(record.contains("const AutoPtr<Customer>& customer() const"));
}

#[test]
fn csv_output_format_writes_fields_in_order() {
    let (sink, _) = compile(&shop(ORDER_SETTERS, ""), "Shop");
    let record = artifact(&sink, "record/base/BaseCustomer.h");
    assert!(record.contains(
        "        out.write(genID(), false);\n\
         \x20       out.write(',');\n\
         \x20       out.write(statusEnumValue(), false);\n\
         \x20       out.write(',');\n\
         \x20       out.write(discount(), false);\n\
         \x20       out.write('\\n');\n"
    ));

    let order = artifact(&sink, "record/base/BaseOrder.h");
    assert!(order.contains("void write(OutputCollector& out) const\n    {\n    }\n"));
}

#[test]
fn unsupported_sequences_are_skipped_and_reported() {
    let extra = r#"
    <hydrated_sequence key="lineitem">
      <record_type>
        <field name="quantity" type="I32"/>
      </record_type>
    </hydrated_sequence>"#;
    let (sink, report) = compile(&shop(ORDER_SETTERS, extra), "Shop");

    assert_eq!(report.skipped_sequences.len(), 1);
    let skipped = &report.skipped_sequences[0];
    assert_eq!(skipped.key, "lineitem");
    assert_eq!(skipped.kind, "hydrated_sequence");

    assert!(sink.get("record/base/BaseLineitem.h").is_none());
    let subsystem = artifact(&sink, "generator/base/BaseGeneratorSubsystem.h");
    assert!(subsystem.contains("registerGenerator<Shop::CustomerGenerator>(\"customer\");"));
    assert!(!subsystem.contains("Lineitem"));
}

#[test]
fn fields_without_setters_are_reported() {
    let setters = r#"
  <setter key="set_priority" type="field_setter">
    <argument key="field" ref="order:priority"/>
    <argument key="value" type="const_value_provider[I16]">
      <argument key="value" type="I16" value="3"/>
    </argument>
  </setter>
"#;
    let (_, report) = compile(&shop(setters, ""), "Shop");
    let fields: Vec<&str> = report
        .warnings
        .iter()
        .filter(|warning| warning.code == "field_without_setter")
        .map(|warning| warning.message.as_str())
        .collect();
    assert_eq!(fields.len(), 2, "{fields:?}");
    assert!(fields[0].contains("'status'"));
    assert!(fields[1].contains("'comment'"));
    assert!(report
        .warnings
        .iter()
        .all(|warning| warning.sequence.as_deref() == Some("order")));
}

#[test]
fn context_field_range_provider_points_at_the_bound_setter() {
    let setters = r#"
  <setter key="set_status" type="field_setter">
    <argument key="field" ref="order:status"/>
    <argument key="value" type="const_value_provider[Enum]">
      <argument key="value" type="Enum" value="2"/>
    </argument>
  </setter>
  <setter key="set_priority" type="field_setter">
    <argument key="field" ref="order:priority"/>
    <argument key="value" type="clustered_value_provider[I16]">
      <argument key="probability" ref="pr_priority"/>
      <argument key="cardinality" type="context_field_range_provider[Enum]">
        <argument key="field" ref="order:status"/>
      </argument>
    </argument>
  </setter>
  <setter key="set_comment" type="field_setter">
    <argument key="field" ref="order:comment"/>
    <argument key="value" type="const_value_provider[String]">
      <argument key="value" type="String" value="none"/>
    </argument>
  </setter>
"#;
    let (sink, _) = compile(&shop(setters, ""), "Shop");
    let chain = artifact(&sink, "runtime/setter/base/BaseOrderSetterChain.h");
    assert!(chain.contains(
        "typedef ContextFieldRangeProvider<Enum, Order, FieldSetterType01> \
         ContextFieldRangeProviderType01;"
    ));
    assert!(chain.contains("_contextFieldRangeProvider01(_setStatus),"));
    assert!(chain.contains(
        "typedef ClusteredValueProvider<I16, Order, UniformPrFunction<I16>, \
         ContextFieldRangeProviderType01> ClusteredValueProviderType01;"
    ));
    assert!(chain.contains("_constValueProvider02(\"none\"),"));
}

#[test]
fn context_field_range_provider_rejects_indirect_fields() {
    let setters = r#"
  <setter key="set_priority" type="field_setter">
    <argument key="field" ref="order:priority"/>
    <argument key="value" type="clustered_value_provider[I16]">
      <argument key="probability" ref="pr_priority"/>
      <argument key="cardinality" type="context_field_range_provider[Enum]">
        <argument key="field" ref="order:customer:status"/>
      </argument>
    </argument>
  </setter>
"#;
    let mut sink = MemorySink::new();
    let err = compile_document(&shop(setters, ""), "Shop", &mut sink)
        .expect_err("indirect field must be rejected");
    match err {
        CompileError::SetterTarget {
            container, field, ..
        } => {
            assert_eq!(container, "context_field_range_provider 'cardinality'");
            assert_eq!(field, "order:customer:status");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn context_field_range_provider_requires_a_bound_setter() {
    let setters = r#"
  <setter key="set_priority" type="field_setter">
    <argument key="field" ref="order:priority"/>
    <argument key="value" type="clustered_value_provider[I16]">
      <argument key="probability" ref="pr_priority"/>
      <argument key="cardinality" type="context_field_range_provider[I16]">
        <argument key="field" ref="order:comment"/>
      </argument>
    </argument>
  </setter>
"#;
    let mut sink = MemorySink::new();
    let err = compile_document(&shop(setters, ""), "Shop", &mut sink)
        .expect_err("unbound field must be rejected");
    assert!(
        matches!(err, CompileError::SetterTarget { ref field, .. } if field == "order:comment"),
        "{err}"
    );
}

#[test]
fn existing_leaf_files_are_left_untouched() {
    let mut sink = MemorySink::new();
    sink.write(Path::new("record/Order.h"), "// hand written\n")
        .expect("seed leaf");

    let report = compile_document(ORDER_SCENARIO, "Shop", &mut sink).expect("compiles");
    assert_eq!(sink.get("record/Order.h"), Some("// hand written\n"));
    assert_eq!(report.leaf_skipped, vec!["record/Order.h"]);
    assert_eq!(report.leaf_created.len(), 6);

    let second = compile_document(ORDER_SCENARIO, "Shop", &mut sink).expect("recompiles");
    assert!(second.leaf_created.is_empty());
    assert_eq!(second.leaf_skipped.len(), 7);
    assert_eq!(second.base_written.len(), 7);
}

#[test]
fn report_serializes_to_json() {
    let (_, report) = compile(ORDER_SCENARIO, "Shop");
    let json = report.to_json_pretty().expect("report serializes");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value["base_written"].as_array().map(Vec::len), Some(7));
    assert!(value["skipped_sequences"].as_array().is_some_and(Vec::is_empty));
}

#[test]
fn derived_enum_fields_expose_their_enum_value_in_csv_output() {
    let document = r#"<generator_prototype>
  <enum_sets>
    <enum_set key="status"><argument key="path" type="String" value="status.csv"/></enum_set>
  </enum_sets>
  <record_sequences>
    <random_sequence key="order">
      <record_type>
        <field name="status" type="Enum" enumref="status" derived="true"/>
      </record_type>
      <output_format type="csv"/>
      <cardinality_estimator type="const_estimator">
        <argument key="cardinality" type="I64u" value="10"/>
      </cardinality_estimator>
    </random_sequence>
  </record_sequences>
</generator_prototype>"#;
    let (sink, _) = compile(document, "Shop");
    let record = artifact(&sink, "record/base/BaseOrder.h");
    assert!(record.contains("virtual Enum status() const = 0;"));
    assert!(record.contains(
        "const String& statusEnumValue() const\n    {\n        return _meta.status[status()];"
    ));
    assert!(record.contains("out.write(statusEnumValue(), false);"));
    assert!(!record.contains("Enum _status;"));
}

#[test]
fn chain_member_variables_never_collide() {
    let document = r#"<generator_prototype>
  <record_sequences>
    <random_sequence key="order">
      <record_type>
        <field name="total" type="I32"/>
        <field name="count" type="I32"/>
      </record_type>
      <setter_chain>
        <setter key="const_value_provider01" type="field_setter">
          <argument key="field" ref="total"/>
          <argument key="value" type="const_value_provider[I32]">
            <argument key="value" type="I32" value="1"/>
          </argument>
        </setter>
        <setter key="constValueProvider01" type="field_setter">
          <argument key="field" ref="count"/>
          <argument key="value" type="const_value_provider[I32]">
            <argument key="value" type="I32" value="2"/>
          </argument>
        </setter>
      </setter_chain>
      <cardinality_estimator type="const_estimator">
        <argument key="cardinality" type="I64u" value="10"/>
      </cardinality_estimator>
    </random_sequence>
  </record_sequences>
</generator_prototype>"#;
    let (sink, _) = compile(document, "Shop");
    let chain = artifact(&sink, "runtime/setter/base/BaseOrderSetterChain.h");

    assert!(chain.contains("ConstValueProviderType02 _constValueProvider02;"), "{chain}");
    assert!(chain.contains("ConstValueProviderType03 _constValueProvider03;"), "{chain}");
    assert!(chain.contains("FieldSetterType01 _constValueProvider01;"), "{chain}");
    assert!(chain.contains("FieldSetterType02 _constValueProvider0102;"), "{chain}");
    assert!(chain.contains("_constValueProvider01(_constValueProvider02)"), "{chain}");
    assert!(chain.contains("_constValueProvider0102(_constValueProvider03)"), "{chain}");
}
