//! Classes declared with `#[callable]`: hooks, protected methods and
//! constructor injection.

mod common;

use common::{Transport, app, codes, commands};
use domwire::{
    Container,
    prelude::*,
    serde_json::Value,
    testing::{CallRecorder, call_request},
};

fn audited_app(options: Value) -> (App, CallRecorder) {
    let app = app();
    let recorder = CallRecorder::new();
    app.container().bind(recorder.clone());
    app.register_class("Audited", &options).unwrap();
    (app, recorder)
}

#[test]
fn test_hooks_run_in_configured_order() {
    let (app, recorder) = audited_app(json!({
        "functions": {
            "save": {
                "__before": {"open": null, "lock": ["write"]},
                "__after": "close"
            }
        }
    }));

    app.handle(&call_request("Audited.save", ["N1"])).unwrap();
    assert_eq!(recorder.calls(), ["open", "lock:write", "save1", "close"]);

    recorder.clear();
    app.handle(&call_request("Audited.load", Vec::<String>::new())).unwrap();
    assert_eq!(recorder.calls(), ["load"]);
}

#[test]
fn test_wildcard_hooks_and_exact_override() {
    let (app, recorder) = audited_app(json!({
        "functions": {
            "*": {"__before": "open", "__after": "close"},
            "load": {"__before": []}
        }
    }));

    app.handle(&call_request("Audited.save", ["N2"])).unwrap();
    assert_eq!(recorder.calls(), ["open", "save2", "close"]);

    recorder.clear();
    app.handle(&call_request("Audited.load", Vec::<String>::new())).unwrap();
    assert_eq!(recorder.calls(), ["load", "close"]);
}

#[test]
fn test_protected_methods_are_not_callable() {
    let (app, recorder) = audited_app(json!({
        "functions": {"save": {"__before": "open"}}
    }));
    app.callbacks().invalid(|_, _| Ok(()));

    let output = app.handle(&call_request("Audited.open", Vec::<String>::new())).unwrap();
    assert_eq!(codes(&output), ["al"]);
    assert!(recorder.calls().is_empty());

    app.handle(&call_request("Audited.save", ["N3"])).unwrap();
    assert_eq!(recorder.calls(), ["open", "save3"]);
}

#[test]
fn test_options_protect_public_methods() {
    let (app, recorder) = audited_app(json!({"protected": ["load"]}));
    let err = app
        .handle(&call_request("Audited.load", Vec::<String>::new()))
        .unwrap_err()
        .error;
    assert!(matches!(err, Error::Request(RequestError::UnknownMethod { .. })));
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_failing_hook_stops_the_call() {
    let (app, recorder) = audited_app(json!({
        "functions": {"save": {"__before": {"lock": []}}}
    }));
    // `lock` needs its mode argument.
    let err = app
        .handle(&call_request("Audited.save", ["N4"]))
        .unwrap_err()
        .error;
    // Hook arguments come from the options, not from the browser.
    assert!(matches!(
        err,
        Error::Setup(SetupError::HookArguments { ref class, ref method, .. })
            if class == "Audited" && method == "lock"
    ));
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_instance_reused_within_request_only() {
    let app = app();
    let recorder = CallRecorder::new();
    app.container().bind(recorder.clone());
    app.register_class("Audited", &json!(null)).unwrap();
    let built = CallRecorder::new();
    let inner = built.clone();
    app.callbacks().init(move |_, _| {
        inner.record("init");
        Ok(())
    });

    app.handle(&call_request("Audited.load", Vec::<String>::new())).unwrap();
    app.handle(&call_request("Audited.load", Vec::<String>::new())).unwrap();
    assert_eq!(built.calls(), ["init", "init"]);
}

// ============================================================================
// Constructor injection
// ============================================================================

#[test]
fn test_constructor_params_by_type_and_name() {
    let app = app();
    app.container().bind(Transport("smtp"));
    app.container().set("$sender", "ada@example.com".to_string());
    app.register_class("Mailer", &json!(null)).unwrap();

    let output = app.handle(&call_request("Mailer.send", Vec::<String>::new())).unwrap();
    assert_eq!(commands(&output)[0]["data"], "ada@example.com via smtp at 0");
}

#[test]
fn test_typed_param_key_wins() {
    let app = app();
    app.container().bind(Transport("smtp"));
    app.container().set("$sender", "anyone@example.com".to_string());
    app.container().set(
        format!("{} $sender", Container::type_key::<String>()),
        "typed@example.com".to_string(),
    );
    app.register_class("Mailer", &json!(null)).unwrap();

    let output = app.handle(&call_request("Mailer.send", Vec::<String>::new())).unwrap();
    assert_eq!(commands(&output)[0]["data"], "typed@example.com via smtp at 0");
}

#[test]
fn test_missing_binding_fails_setup() {
    let app = app();
    app.container().bind(Transport("smtp"));
    app.register_class("Mailer", &json!(null)).unwrap();

    let err = app
        .handle(&call_request("Mailer.send", Vec::<String>::new()))
        .unwrap_err()
        .error;
    assert!(matches!(
        err,
        Error::Setup(SetupError::MissingBinding { ref param, .. }) if param == "sender"
    ));
}

#[test]
fn test_failing_constructor_reports_factory_error() {
    let app = app();
    app.container().bind(Transport("smtp"));
    app.container().set("$sender", String::new());
    app.register_class("Mailer", &json!(null)).unwrap();

    let err = app
        .handle(&call_request("Mailer.send", Vec::<String>::new()))
        .unwrap_err()
        .error;
    assert!(matches!(
        err,
        Error::Setup(SetupError::Factory { ref reason, .. }) if reason.contains("sender")
    ));
}

#[test]
fn test_method_injection() {
    let app = app();
    app.container().bind(Transport("smtp"));
    app.container().set("$sender", "ada@example.com".to_string());
    app.container().set("$clock", 1700u64);
    app.register_class(
        "Mailer",
        &json!({"functions": {"send": {"__di": {"clock": "$clock"}}}}),
    )
    .unwrap();

    let output = app.handle(&call_request("Mailer.send", Vec::<String>::new())).unwrap();
    assert_eq!(commands(&output)[0]["data"], "ada@example.com via smtp at 1700");
}

#[test]
fn test_method_injection_requires_binding() {
    let app = app();
    app.container().bind(Transport("smtp"));
    app.container().set("$sender", "ada@example.com".to_string());
    app.register_class(
        "Mailer",
        &json!({"functions": {"send": {"__di": {"clock": "$clock"}}}}),
    )
    .unwrap();

    let err = app
        .handle(&call_request("Mailer.send", Vec::<String>::new()))
        .unwrap_err()
        .error;
    assert!(matches!(err, Error::Setup(_)));
}
