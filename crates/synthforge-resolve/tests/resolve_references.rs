use synthforge_ast::{Argument, ComponentKind, Resolved, Specification, parse_specification};
use synthforge_core::CompileError;
use synthforge_resolve::{Resolver, resolve, resolve_field_path};

fn prototype(order_setters: &str) -> String {
    format!(
        r#"<generator_prototype>
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
      <setter_chain>
        <setter key="set_status" type="field_setter">
          <argument key="field" ref="status"/>
          <argument key="value" type="const_value_provider[Enum]">
            <argument key="value" type="Enum" value="0"/>
          </argument>
        </setter>
      </setter_chain>
      <cardinality_estimator type="const_estimator">
        <argument key="cardinality" type="I64u" value="100"/>
      </cardinality_estimator>
    </random_sequence>
    <random_sequence key="order">
      <record_type>
        <field name="priority" type="I16"/>
        <field name="status" type="Enum" enumref="status"/>
        <reference name="customer" type="customer"/>
      </record_type>
      <setter_chain>{order_setters}</setter_chain>
      <cardinality_estimator type="const_estimator">
        <argument key="cardinality" type="I64u" value="1000"/>
      </cardinality_estimator>
    </random_sequence>
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
"#;

fn resolved(order_setters: &str) -> Specification<Resolved> {
    let raw = parse_specification(&prototype(order_setters)).expect("specification parses");
    resolve(raw).expect("specification resolves")
}

#[test]
fn field_paths_follow_references() {
    let spec = resolved(ORDER_SETTERS);
    let order = spec.sequence_by_key("order").expect("order");
    let customer = spec.sequence_by_key("customer").expect("customer");

    let accessor = spec
        .components
        .iter()
        .find(|component| component.kind == ComponentKind::ContextFieldValueProvider)
        .expect("context field provider");
    let field_ref = accessor
        .arguments
        .get("field")
        .and_then(Argument::as_field_ref)
        .expect("resolved field ref");

    assert_eq!(field_ref.path, "order:customer:status");
    assert_eq!(field_ref.root, order.id);
    assert_eq!(field_ref.inner.len(), 1);
    assert_eq!(spec.reference(field_ref.inner[0]).name, "customer");
    assert_eq!(spec.field(field_ref.field).owner, customer.id);
    assert_eq!(spec.field(field_ref.field).name, "status");
    assert!(!field_ref.is_direct());

    let reference = spec.reference(order.record_type.references[0]);
    assert_eq!(reference.target, customer.id);
}

#[test]
fn direct_paths_are_direct() {
    let spec = resolved(ORDER_SETTERS);
    let setter = spec
        .components
        .iter()
        .find(|component| component.key == "set_priority")
        .expect("priority setter");
    let field_ref = setter
        .arguments
        .get("field")
        .and_then(Argument::as_field_ref)
        .expect("resolved field ref");
    assert!(field_ref.is_direct());
    assert_eq!(spec.field(field_ref.field).setter, Some(setter.id));
}

#[test]
fn bare_names_resolve_against_the_owning_sequence() {
    let spec = resolved(ORDER_SETTERS);
    let customer = spec.sequence_by_key("customer").expect("customer");
    let status = spec.find_field(customer.id, "status").expect("status field");
    let setter = spec.component(status.setter.expect("status setter"));
    assert_eq!(setter.key, "set_status");
    assert_eq!(setter.owner, Some(customer.id));
}

#[test]
fn reference_and_function_refs_are_bound() {
    let spec = resolved(ORDER_SETTERS);
    let reference_setter = spec
        .components
        .iter()
        .find(|component| component.kind == ComponentKind::ReferenceSetter)
        .expect("reference setter");
    let reference_ref = reference_setter
        .arguments
        .get("reference")
        .and_then(Argument::as_reference_ref)
        .expect("reference ref");
    assert_eq!(spec.reference(reference_ref.reference).name, "customer");

    let random = spec
        .components
        .iter()
        .find(|component| component.kind == ComponentKind::RandomValueProvider)
        .expect("random provider");
    let function = random
        .arguments
        .get("probability")
        .and_then(Argument::as_function_ref)
        .copied()
        .expect("function ref");
    assert_eq!(function, spec.functions["pr_priority"]);
}

#[test]
fn missing_inner_segment_is_reported() {
    let setters = ORDER_SETTERS.replace("order:customer:status", "order:missing:status");
    let raw = parse_specification(&prototype(&setters)).expect("specification parses");
    match resolve(raw).unwrap_err() {
        CompileError::UnresolvedReference { path, segment, .. } => {
            assert_eq!(path, "order:missing:status");
            assert_eq!(segment, "missing");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn path_resolution_is_available_on_raw_trees() {
    let raw = parse_specification(&prototype(ORDER_SETTERS)).expect("specification parses");
    let order = raw.sequence_by_key("order").expect("order").id;
    let customer = raw.sequence_by_key("customer").expect("customer").id;
    let err = resolve_field_path(&raw, &[customer], "order:customer:nation", None, "test")
        .unwrap_err();
    assert!(matches!(
        err,
        CompileError::UnresolvedReference { ref segment, .. } if segment == "nation"
    ));

    let direct = resolve_field_path(&raw, &[customer], "priority", Some(order), "test")
        .expect("bare field resolves");
    assert!(direct.is_direct());
    assert!(resolve_field_path(&raw, &[customer], "priority", None, "test").is_err());
}

#[test]
fn unknown_function_is_reported() {
    let setters = ORDER_SETTERS.replace(r#"ref="pr_priority""#, r#"ref="pr_unknown""#);
    let raw = parse_specification(&prototype(&setters)).expect("specification parses");
    match resolve(raw).unwrap_err() {
        CompileError::UnresolvedReference { kind, segment, .. } => {
            assert_eq!(kind, "function");
            assert_eq!(segment, "pr_unknown");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_reference_target_is_reported() {
    let text = prototype(ORDER_SETTERS).replace(
        r#"<reference name="customer" type="customer"/>"#,
        r#"<reference name="customer" type="client"/>"#,
    );
    let raw = parse_specification(&text).expect("specification parses");
    match resolve(raw).unwrap_err() {
        CompileError::UnresolvedReference { kind, segment, .. } => {
            assert_eq!(kind, "record");
            assert_eq!(segment, "client");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_field_setters_keep_the_last_one() {
    let setters = format!(
        "{ORDER_SETTERS}{}",
        r#"
  <setter key="set_priority_again" type="field_setter">
    <argument key="field" ref="order:priority"/>
    <argument key="value" type="const_value_provider[I16]">
      <argument key="value" type="I16" value="3"/>
    </argument>
  </setter>"#
    );
    let spec = resolved(&setters);
    let order = spec.sequence_by_key("order").expect("order");
    let priority = spec.find_field(order.id, "priority").expect("priority");
    let setter = spec.component(priority.setter.expect("priority setter"));
    assert_eq!(setter.key, "set_priority_again");
}

#[test]
fn setters_cannot_target_other_records() {
    let setters = r#"
  <setter key="set_remote" type="field_setter">
    <argument key="field" ref="order:customer:status"/>
    <argument key="value" type="const_value_provider[Enum]">
      <argument key="value" type="Enum" value="0"/>
    </argument>
  </setter>"#;
    let raw = parse_specification(&prototype(setters)).expect("specification parses");
    assert!(matches!(resolve(raw), Err(CompileError::SetterTarget { .. })));

    let derived = r#"
  <setter key="set_discount" type="field_setter">
    <argument key="field" ref="customer:discount"/>
    <argument key="value" type="const_value_provider[Decimal]">
      <argument key="value" type="Decimal" value="0.1"/>
    </argument>
  </setter>"#;
    let raw = parse_specification(&prototype(derived)).expect("specification parses");
    assert!(matches!(resolve(raw), Err(CompileError::SetterTarget { .. })));
}

#[test]
fn order_keys_are_complete() {
    let spec = resolved(ORDER_SETTERS);
    for sequence in &spec.sequences {
        let mut fields: Vec<_> = sequence
            .record_type
            .fields
            .iter()
            .map(|id| spec.field(*id).order)
            .collect();
        fields.sort_unstable();
        assert_eq!(fields, (0..fields.len()).collect::<Vec<_>>());
        assert_eq!(spec.field(sequence.record_type.fields[0]).name, "gen_id");

        let references: Vec<_> = sequence
            .record_type
            .references
            .iter()
            .map(|id| spec.reference(*id).order)
            .collect();
        assert_eq!(references, (0..references.len()).collect::<Vec<_>>());

        let setters: Vec<_> = sequence
            .setter_chain
            .setters
            .iter()
            .map(|id| spec.component(*id).order)
            .collect();
        assert_eq!(setters, (0..setters.len()).collect::<Vec<_>>());
    }
}

#[test]
fn summary_counts_each_pass() {
    let raw = parse_specification(&prototype(ORDER_SETTERS)).expect("specification parses");
    let (_, summary) = Resolver::new(raw).run().expect("specification resolves");
    assert_eq!(summary.record_references, 1);
    assert_eq!(summary.field_refs, 5);
    assert_eq!(summary.reference_refs, 1);
    assert_eq!(summary.function_refs, 1);
    assert_eq!(summary.setter_links, 3);
}

#[test]
fn gaps_in_order_keys_are_rejected() {
    let mut raw = parse_specification(&prototype(ORDER_SETTERS)).expect("specification parses");
    let last = *raw.sequences[1]
        .record_type
        .fields
        .last()
        .expect("order has fields");
    raw.fields[last.index()].order += 1;

    let err = resolve(raw).expect_err("gap must be rejected");
    match err {
        CompileError::MalformedSpecification(message) => {
            assert!(message.contains("field order keys"), "{message}");
            assert!(message.contains("'order'"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn setter_order_keys_must_be_unique() {
    let mut raw = parse_specification(&prototype(ORDER_SETTERS)).expect("specification parses");
    let setters = raw.sequences[1].setter_chain.setters.clone();
    assert!(setters.len() > 1);
    raw.components[setters[1].index()].order = 0;

    let err = resolve(raw).expect_err("duplicate setter order must be rejected");
    assert!(
        matches!(&err, CompileError::MalformedSpecification(message) if message.contains("setter")),
        "{err}"
    );
}
