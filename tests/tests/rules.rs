//! Rule declarations and the events they bind.

use formwork_tests::prelude::*;
use pretty_assertions::assert_eq;

fn form() -> Form {
    Form::new(FormOptions::new(), Arc::new(SimpleEngine::new()))
}

#[test]
fn test_empty_rule_groups_bind_no_validation() {
    // GIVEN - declarations with triggers but without rules
    let form = form();
    let options = FieldOptions::new()
        .rules(vec![])
        .validate(RuleDecl::new(vec![]).on(vec!["onBlur", "onFocus"]));

    // WHEN
    let binding = form.register(&path("quiet"), options).unwrap();

    // THEN
    assert!(binding.validate_triggers.is_empty());
    assert_eq!(binding.handler("onBlur"), None);
    assert_eq!(binding.handler("onChange"), Some(Handler::Collect));
}

#[test]
fn test_validate_trigger_replaces_collect_trigger_binding() {
    let binding = form()
        .register(
            &path("a"),
            FieldOptions::new()
                .rules(vec![Rule::new().with_param("required", true)])
                .validate_trigger(vec!["onChange", "onBlur"]),
        )
        .unwrap();

    assert_eq!(binding.collect_trigger, None);
    assert_eq!(binding.events().len(), 2);
}

#[test]
fn test_form_default_trigger_applies_to_fields() {
    let form = Form::new(FormOptions::new().default_trigger("onInput"), Arc::new(SimpleEngine::new()));

    let binding = form.register(&path("a"), FieldOptions::new()).unwrap();

    assert_eq!(binding.collect_trigger.as_deref(), Some("onInput"));
}

#[test]
fn test_field_options_load_from_json() {
    // GIVEN
    let options: FieldOptions = serde_json::from_value(json!({
        "initialValue": ["x"],
        "rules": [{"type": "array", "min": 1, "message": "pick one"}],
        "validateTrigger": "onSelect"
    }))
    .unwrap();

    // WHEN
    let form = form();
    let binding = form.register(&path("tags"), options).unwrap();

    // THEN
    assert_eq!(binding.value, json!(["x"]));
    assert_eq!(binding.handler("onSelect"), Some(Handler::CollectAndValidate));
    let registry = form.registry().lock();
    assert!(registry.field_meta(&path("tags")).unwrap().has_array_rules());
}
