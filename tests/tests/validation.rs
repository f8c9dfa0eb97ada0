//! Validation passes driven through the form.

use formwork_rule::FirstFields;
use formwork_tests::prelude::*;
use pretty_assertions::assert_eq;

fn required() -> Rule {
    Rule::new().with_param("required", true)
}

#[tokio::test]
async fn test_overlapping_pass_result_expires() {
    // GIVEN - a field validated by a pass that is held at the engine
    init_test_tracing();
    let engine = GatedEngine::new(SimpleEngine::new());
    let form = Form::new(FormOptions::new(), engine.clone());
    let name = path("name");
    form.register(&name, FieldOptions::new().rules(vec![required()])).unwrap();
    form.collect(&name, "onChange", json!("old"));

    // WHEN - the value changes and a second pass starts before the first resolves
    let (first, second) = tokio::join!(form.validate_fields(None, ValidateOptions::new()), async {
        engine.entered().await;
        let (second, _) = tokio::join!(form.collect_and_validate(&name, "onChange", json!("new")), async {
            engine.entered().await;
            engine.release(2);
        });
        second
    });

    // THEN - the first pass reports the expiry instead of its rule outcome
    let failure = first.unwrap_err();
    let errors = &failure.as_failure().unwrap().errors;
    let entry = errors.get(&name).unwrap();
    assert!(entry.expired);
    assert_eq!(entry.messages(), vec!["name need to revalidate"]);

    // THEN - the second pass owns the committed state
    assert!(second.unwrap().is_valid());
    let field = form.get_field(&name);
    assert_eq!(field.value, Some(json!("new")));
    assert!(!field.validating);
    assert_eq!(field.errors, None);
    assert_eq!(engine.calls(), 2);
}

#[tokio::test]
async fn test_fields_are_validating_while_engine_runs() {
    let engine = GatedEngine::new(SimpleEngine::new());
    let form = Form::new(FormOptions::new(), engine.clone());
    form.register(&path("a"), FieldOptions::new().rules(vec![required()]).initial_value("x"))
        .unwrap();

    let (result, seen) = tokio::join!(form.validate_fields(None, ValidateOptions::new()), async {
        engine.entered().await;
        let seen = form.is_fields_validating(None);
        engine.release(1);
        seen
    });

    assert!(seen);
    assert!(result.is_ok());
    assert!(!form.is_field_validating(&path("a")));
}

#[tokio::test]
async fn test_array_violation_attributed_to_list() {
    // GIVEN
    let form = Form::new(FormOptions::new(), Arc::new(SimpleEngine::new()));
    let list = path("list");
    let array_rule = Rule::of_type("array").with_param("each", "required");
    form.register(&list, FieldOptions::new().rules(vec![array_rule]).initial_value(json!(["a", ""])))
        .unwrap();

    // WHEN
    let failure = form
        .validate_fields(None, ValidateOptions::new())
        .await
        .unwrap_err();

    // THEN
    let errors = &failure.as_failure().unwrap().errors;
    assert!(errors.contains(&list));
    assert!(!errors.contains(&path("list.1")));
    assert_eq!(errors.get(&list).unwrap().errors[0].field, path("list.1"));
    assert_eq!(form.get_field_error(&list), json!(["list.1 is required"]));
}

#[tokio::test]
async fn test_reset_restores_initial_value_of_named_field_only() {
    // GIVEN
    let form = Form::new(FormOptions::new(), Arc::new(SimpleEngine::new()));
    form.register(&path("x"), FieldOptions::new().initial_value("x0")).unwrap();
    form.register(&path("y"), FieldOptions::new().initial_value("y0")).unwrap();
    form.collect(&path("x"), "onChange", json!("x1"));
    form.collect(&path("y"), "onChange", json!("y1"));

    // WHEN
    form.reset_fields(Some(&[path("x")][..]));

    // THEN
    assert_eq!(form.get_field_value(&path("x")), json!("x0"));
    assert_eq!(form.get_field_value(&path("y")), json!("y1"));
    assert!(!form.is_field_touched(&path("x")));
    assert!(form.is_field_touched(&path("y")));
}

#[tokio::test]
async fn test_reset_field_is_validated_again() {
    // GIVEN - a field that passed and was then reset
    let engine = Arc::new(SimpleEngine::new());
    let form = Form::new(FormOptions::new(), engine.clone());
    form.register(&path("a"), FieldOptions::new().rules(vec![required()])).unwrap();
    form.collect_and_validate(&path("a"), "onChange", json!("ok")).await.unwrap();
    form.validate_fields(None, ValidateOptions::new()).await.unwrap();
    assert_eq!(engine.calls(), 1);

    // WHEN
    form.reset_fields(None);
    let result = form.validate_fields(None, ValidateOptions::new()).await;

    // THEN
    assert_eq!(engine.calls(), 2);
    assert!(result.is_err());
}

#[tokio::test]
async fn test_reset_during_pass_is_not_overwritten() {
    // GIVEN - the initial value is the value being validated
    let engine = GatedEngine::new(SimpleEngine::new());
    let form = Form::new(FormOptions::new(), engine.clone());
    let x = path("x");
    form.register(&x, FieldOptions::new().rules(vec![Rule::new().with_param("min", 5)]).initial_value("ab"))
        .unwrap();

    // WHEN - the field is reset while the pass waits for the engine
    let (result, _) = tokio::join!(form.validate_fields(None, ValidateOptions::new()), async {
        engine.entered().await;
        form.reset_fields(Some(&[x.clone()][..]));
        engine.release(1);
    });

    // THEN - the pass expires instead of committing "x is too short"
    let failure = result.unwrap_err();
    let entry = failure.as_failure().unwrap().errors.get(&x).unwrap().clone();
    assert!(entry.expired);
    assert_eq!(entry.messages(), vec!["x need to revalidate"]);

    // THEN - the reset stands
    let field = form.get_field(&x);
    assert_eq!(field.value, None);
    assert_eq!(field.errors, None);
    assert_eq!(form.get_field_value(&x), json!("ab"));
    assert!(form.registry().lock().reset_fields(None).is_empty());
}

#[tokio::test]
async fn test_clean_fields_keep_previous_errors_unless_forced() {
    // GIVEN
    let engine = Arc::new(SimpleEngine::new());
    let form = Form::new(FormOptions::new(), engine.clone());
    form.register(&path("a"), FieldOptions::new().rules(vec![required()])).unwrap();
    let _ = form.collect_and_validate(&path("a"), "onChange", json!("")).await;
    assert_eq!(engine.calls(), 1);

    // WHEN
    let carried = form.validate_fields(None, ValidateOptions::new()).await;

    // THEN
    assert_eq!(engine.calls(), 1);
    assert!(carried.is_err());

    // WHEN
    let forced = form.validate_fields(None, ValidateOptions::new().force(true)).await;

    // THEN
    assert_eq!(engine.calls(), 2);
    assert!(forced.is_err());
}

#[tokio::test]
async fn test_validate_first_fields_default_from_meta() {
    // GIVEN
    let engine = Arc::new(SimpleEngine::new());
    let form = Form::new(FormOptions::new(), engine.clone());
    let rules = vec![required(), Rule::new().with_param("min", 3)];
    form.register(&path("a"), FieldOptions::new().rules(rules.clone()).validate_first(true))
        .unwrap();
    form.register(&path("b"), FieldOptions::new().rules(rules)).unwrap();

    // WHEN
    let _ = form.validate_fields(None, ValidateOptions::new()).await;

    // THEN
    let requests = engine.requests();
    assert_eq!(requests[0].first_fields, FirstFields::Only(vec![path("a")]));
}

#[tokio::test]
async fn test_only_action_rules_run_on_collect_and_validate() {
    // GIVEN - required on blur, length on change
    let engine = Arc::new(SimpleEngine::new());
    let form = Form::new(FormOptions::new(), engine.clone());
    let binding = form
        .register(
            &path("code"),
            FieldOptions::new()
                .validate(RuleDecl::new(vec![required()]).on("onBlur"))
                .validate(RuleDecl::new(vec![Rule::new().with_param("min", 3)]).on("onChange")),
        )
        .unwrap();
    assert_eq!(binding.handler("onBlur"), Some(Handler::CollectAndValidate));
    assert_eq!(binding.handler("onChange"), Some(Handler::CollectAndValidate));

    // WHEN
    let outcome = form
        .collect_and_validate(&path("code"), "onChange", json!("ab"))
        .await
        .unwrap();

    // THEN
    assert_eq!(
        outcome.errors.unwrap().get(&path("code")).unwrap().messages(),
        vec!["code is too short"]
    );
    assert_eq!(engine.requests()[0].rules[&path("code")].len(), 1);
}

#[tokio::test]
async fn test_message_catalog_reaches_engine() {
    let catalog = MessageCatalog::new().with("required", "please fill in %s");
    let form = Form::new(
        FormOptions::new().validate_messages(catalog),
        Arc::new(SimpleEngine::new()),
    );
    form.register(&path("city"), FieldOptions::new().rules(vec![required()])).unwrap();

    let _ = form.validate_fields(None, ValidateOptions::new()).await;

    assert_eq!(form.get_field_error(&path("city")), json!(["please fill in city"]));
}

#[tokio::test]
async fn test_engine_fault_surfaces_as_error() {
    let form = Form::new(FormOptions::new(), Arc::new(FailingEngine::new("offline")));
    form.register(&path("a"), FieldOptions::new().rules(vec![required()])).unwrap();

    let result = form.validate_fields(None, ValidateOptions::new()).await;

    let err = result.unwrap_err();
    assert!(matches!(err, FormError::Validate(_)));
    assert!(err.to_string().contains("offline"));
}

#[tokio::test]
async fn test_hidden_fields_are_not_validated() {
    let engine = Arc::new(SimpleEngine::new());
    let form = Form::new(FormOptions::new(), engine.clone());
    form.register(&path("secret"), FieldOptions::new().rules(vec![required()]).hidden(true))
        .unwrap();

    let values = form.validate_fields(None, ValidateOptions::new()).await.unwrap();

    assert_eq!(values, json!({}));
    assert_eq!(engine.calls(), 0);
}
