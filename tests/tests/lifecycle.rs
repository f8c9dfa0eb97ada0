//! Registration lifecycle: detach, recovery and render-pass cleanup.

use formwork_registry::CellSink;
use formwork_tests::prelude::*;
use pretty_assertions::assert_eq;

fn form() -> Form {
    init_test_tracing();
    Form::new(FormOptions::new(), Arc::new(SimpleEngine::new()))
}

#[test]
fn test_detach_then_reregister_restores_field_and_meta() {
    // GIVEN
    let form = form();
    let name = path("email");
    let rules = vec![Rule::of_type("email")];
    form.register(&name, FieldOptions::new().rules(rules.clone()).initial_value("a@b"))
        .unwrap();
    form.collect(&name, "onChange", json!("typed@example.com"));
    let before = form.get_field(&name);
    let meta_before = form.registry().lock().field_meta(&name).unwrap().clone();

    // WHEN
    form.detach(&name);
    assert!(!form.registry().lock().is_registered(&name));
    form.register(&name, FieldOptions::new().rules(rules)).unwrap();

    // THEN
    assert_eq!(form.get_field(&name), before);
    let registry = form.registry().lock();
    let meta = registry.field_meta(&name).unwrap();
    assert_eq!(meta.initial_value, meta_before.initial_value);
    assert_eq!(meta.rule_groups, meta_before.rule_groups);
}

#[test]
fn test_detach_then_attach_restores_field() {
    let form = form();
    let name = path("a");
    form.register(&name, FieldOptions::new()).unwrap();
    form.collect(&name, "onChange", json!(7));

    form.detach(&name);
    form.attach(&name, Arc::new(()));

    assert_eq!(form.get_field_value(&name), json!(7));
    assert!(form.instance(&name).is_some());
}

#[test]
fn test_cleared_cache_is_flushed_at_end_of_pass() {
    // GIVEN
    let form = form();
    let name = path("a");
    form.register(&name, FieldOptions::new()).unwrap();
    form.collect(&name, "onChange", json!(7));
    form.detach(&name);

    // WHEN
    form.end_render_pass();
    form.register(&name, FieldOptions::new()).unwrap();

    // THEN
    assert_eq!(form.get_field_value(&name), Value::Null);
    assert!(!form.is_field_touched(&name));
}

#[test]
fn test_preserved_field_survives_detach() {
    let form = form();
    let name = path("draft");
    form.register(&name, FieldOptions::new().preserve(true)).unwrap();
    form.collect(&name, "onChange", json!("keep"));

    form.detach(&name);
    form.end_render_pass();
    form.end_render_pass();

    assert_eq!(form.get_field_value(&name), json!("keep"));
}

#[test]
fn test_unrendered_fields_are_removed_at_end_of_pass() {
    // GIVEN
    let form = form();
    form.register(&path("a"), FieldOptions::new()).unwrap();
    form.register(&path("b"), FieldOptions::new()).unwrap();
    form.attach(&path("b"), Arc::new(()));
    assert!(form.end_render_pass().is_empty());

    // WHEN - the next pass renders neither, but b stays mounted
    let removed = form.end_render_pass();

    // THEN
    assert_eq!(removed, vec![path("a")]);
    assert_eq!(form.registry().lock().all_names(), vec![path("b")]);
}

#[test]
fn test_instance_sink_follows_attach_and_detach() {
    let form = form();
    let sink = Arc::new(CellSink::new());
    form.register(&path("a"), FieldOptions::new().instance_sink(sink.clone()))
        .unwrap();

    form.attach(&path("a"), Arc::new(42u32));
    let attached = sink.current().unwrap();
    assert_eq!(attached.downcast_ref::<u32>(), Some(&42));

    form.detach(&path("a"));
    assert!(sink.current().is_none());
}

#[test]
fn test_listener_sees_values_and_field_changes() {
    // GIVEN
    let listener = Arc::new(RecordingListener::new());
    let form = form().with_listener(listener.clone());
    form.register(&path("user.name"), FieldOptions::new()).unwrap();
    form.register(&path("user.age"), FieldOptions::new().initial_value(3)).unwrap();

    // WHEN
    form.collect(&path("user.name"), "onChange", json!("ada"));
    form.collect(&path("user.name"), "onChange", json!("ada"));

    // THEN - an unchanged value is not reported as a value change
    assert_eq!(
        listener.value_events(),
        vec![(
            json!({"user": {"name": "ada"}}),
            json!({"user": {"name": "ada", "age": 3}})
        )]
    );
    assert_eq!(listener.field_events().len(), 2);
}

#[test]
fn test_normalize_applies_on_collect() {
    let form = form();
    form.register(
        &path("code"),
        FieldOptions::new().normalize(|value, _, _| {
            Value::from(value.as_str().unwrap_or_default().to_uppercase())
        }),
    )
    .unwrap();

    form.collect(&path("code"), "onChange", json!("abc"));

    assert_eq!(form.get_field_value(&path("code")), json!("ABC"));
}

#[test]
fn test_fields_snapshot_includes_uncollected_fields() {
    let form = form();
    form.register(&path("a"), FieldOptions::new().initial_value(1)).unwrap();

    assert_eq!(
        form.fields_snapshot(),
        json!({"a": {"name": "a", "dirty": false, "touched": false, "validating": false, "value": 1}})
    );
}
