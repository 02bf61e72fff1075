//! Classes found by scanning directories, namespaces and client export.

mod common;

use common::{app, app_with, codes, commands, fixtures};
use domwire::{
    Separator,
    prelude::*,
    request::BAGS_PARAM,
    testing::call_request,
};

#[test]
fn test_directory_classes_resolve_after_one_scan() {
    let app = app();
    app.register_directory(fixtures(), &json!(null)).unwrap();
    assert_eq!(app.registry().scan_count(), 0);

    let output = app.handle(&call_request("Greeter.greet", ["SAda"])).unwrap();
    assert_eq!(
        commands(&output),
        vec![json!({"cmd": "as", "id": "greeting", "prop": "innerHTML", "data": "Hi Ada"})]
    );
    assert_eq!(app.registry().scan_count(), 1);

    app.handle(&call_request("Admin.UserList.count", Vec::<String>::new()))
        .unwrap();
    app.handle(&call_request("Greeter.greet", ["SBob"])).unwrap();
    assert_eq!(app.registry().scan_count(), 1);

    // Registering the same directory again is a no-op.
    app.register_directory(fixtures(), &json!(null)).unwrap();
    app.handle(&call_request("Greeter.greet", ["SCy"])).unwrap();
    assert_eq!(app.registry().scan_count(), 1);
}

#[test]
fn test_unknown_file_is_unknown_class() {
    let app = app();
    app.register_directory(fixtures(), &json!(null)).unwrap();
    let err = app
        .handle(&call_request("Admin.Missing.count", Vec::<String>::new()))
        .unwrap_err()
        .error;
    assert!(matches!(
        err,
        Error::Setup(SetupError::UnknownClass(ref c)) if c == "Admin::Missing"
    ));
}

#[test]
fn test_underscore_separator() {
    let app = app_with(Config {
        separator: Separator::Underscore,
        ..Config::default()
    });
    app.register_directory(fixtures(), &json!(null)).unwrap();

    let output = app
        .handle(&call_request("Admin_UserList.count", Vec::<String>::new()))
        .unwrap();
    assert_eq!(codes(&output), ["as"]);

    let export = app.export().unwrap();
    let js_names: Vec<&str> = export.classes.iter().map(|c| c.js_name.as_str()).collect();
    assert_eq!(js_names, ["Admin_UserList", "Greeter"]);
}

#[test]
fn test_namespace_with_directory() {
    let app = app();
    app.register_namespace("Admin", Some(format!("{}/admin", fixtures())), &json!(null))
        .unwrap();

    let output = app
        .handle(&call_request("Admin.UserList.count", Vec::<String>::new()))
        .unwrap();
    assert_eq!(commands(&output)[0]["data"], 1);

    // Namespaces never trigger the directory scan.
    assert_eq!(app.registry().scan_count(), 0);

    let err = app
        .handle(&call_request("Admin.Greeter.greet", ["SAda"]))
        .unwrap_err()
        .error;
    assert!(matches!(err, Error::Setup(SetupError::UnknownClass(_))));
}

#[test]
fn test_data_bags_round_trip() {
    let app = app();
    app.register_directory(fixtures(), &json!(null)).unwrap();

    let request = call_request("Admin.UserList.count", Vec::<String>::new())
        .with_param(BAGS_PARAM, r#"{"users":{"seen":2}}"#);
    let output = app.handle(&request).unwrap();
    assert_eq!(
        commands(&output),
        vec![
            json!({"cmd": "as", "id": "count", "prop": "innerHTML", "data": 3}),
            json!({"cmd": "bags.set", "data": {"users": {"seen": 3}}}),
        ]
    );
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn test_export_lists_functions_and_classes() {
    let app = app();
    app.register_directory(
        fixtures(),
        &json!({"functions": {"*": {"mode": "async"}}}),
    )
    .unwrap();
    app.register_function("ping", |_: &Context, _: Args| (), &json!({"alias": "jsPing"}))
        .unwrap();

    let export = serde_json::to_value(app.export().unwrap()).unwrap();
    assert_eq!(export["separator"], ".");
    assert_eq!(
        export["functions"],
        json!([{"name": "ping", "js_name": "jsPing"}])
    );
    assert_eq!(
        export["classes"],
        json!([
            {
                "name": "Admin::UserList",
                "js_name": "Admin.UserList",
                "methods": [{"name": "count", "options": {"mode": "async"}}]
            },
            {
                "name": "Greeter",
                "js_name": "Greeter",
                "methods": [{"name": "greet", "options": {"mode": "async"}}]
            }
        ])
    );
}

#[test]
fn test_export_skips_excluded_classes() {
    let app = app();
    app.register_directory(fixtures(), &json!(null)).unwrap();
    app.register_class("Greeter", &json!({"excluded": true})).unwrap();
    // The first registration wins.
    app.register_class("Greeter", &json!(null)).unwrap();

    let export = app.export().unwrap();
    let names: Vec<&str> = export.classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Admin::UserList"]);

    // Excluded classes are still callable.
    let output = app.handle(&call_request("Greeter.greet", ["SAda"])).unwrap();
    assert_eq!(codes(&output), ["as"]);
}
