use pretty_assertions::assert_eq;
use toml_path_edit::{
    apply_all, get, set, Edit, EditError, Path, PathSegment, RewriteOptions, Rewriter, TomlTable,
    TomlValue,
};

const WORKER: &str = r#"
# Top-level configuration
name = "my-worker"
main = "src/index.js"
"compatibility_date" = "2022-07-12"

workers_dev = false

route = { pattern = "example.org/*", zone_name = "example.org" }

[limits]
cpu_ms = 100

kv_namespaces = [
  { binding = "<MY_NAMESPACE>", id = "<KV_ID>" } # some comment
]

[[d1_databases]]
binding = "<BINDING_NAME_1>" # first db
database_name = "<DATABASE_NAME_1>"
database_id = "<DATABASE_ID_1>"

[[d1_databases]]
binding = "<BINDING_NAME_2>" # second db
database_name = "<DATABASE_NAME_2>"
database_id = "<DATABASE_ID_3>"

[env.staging]
# Overrides above
name = "my-worker-staging"
route = { pattern = "staging.example.org/*", zone_name = "example.org" }

kv_namespaces = [
  { binding = "<MY_NAMESPACE>", id = "<STAGING_KV_ID>" }
]
"#;

fn path(dotted: &str) -> Path {
    dotted.parse().unwrap()
}

fn table(entries: &[(&str, TomlValue)]) -> TomlValue {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect::<TomlTable>()
        .into()
}

#[test]
fn test_targeted_scalar_replacements() {
    let edits = [
        Edit::set(path("name"), "my-new-worker"),
        Edit::set(path("compatibility_date"), "2025-04-25"),
        Edit::set(path("workers_dev"), true),
        Edit::set(path("route.pattern"), "example.com/*"),
        Edit::set(path("route.zone_name"), "example.com"),
        Edit::set(path("limits.cpu_ms"), 50),
        Edit::set(path("limits.kv_namespaces.0.id"), "new-kv-id"),
        Edit::set(path("d1_databases.1.database_name"), "new-db-name"),
        Edit::set(
            path("env.staging.route.pattern"),
            "api.staging.example.org/*",
        ),
        Edit::set(path("env.staging.kv_namespaces.0.id"), "new-staging-id"),
    ];

    let expected = r#"
# Top-level configuration
name = "my-new-worker"
main = "src/index.js"
"compatibility_date" = "2025-04-25"

workers_dev = true

route = { pattern = "example.com/*", zone_name = "example.com" }

[limits]
cpu_ms = 50

kv_namespaces = [
  { binding = "<MY_NAMESPACE>", id = "new-kv-id" } # some comment
]

[[d1_databases]]
binding = "<BINDING_NAME_1>" # first db
database_name = "<DATABASE_NAME_1>"
database_id = "<DATABASE_ID_1>"

[[d1_databases]]
binding = "<BINDING_NAME_2>" # second db
database_name = "new-db-name"
database_id = "<DATABASE_ID_3>"

[env.staging]
# Overrides above
name = "my-worker-staging"
route = { pattern = "api.staging.example.org/*", zone_name = "example.org" }

kv_namespaces = [
  { binding = "<MY_NAMESPACE>", id = "new-staging-id" }
]
"#;

    assert_eq!(apply_all(WORKER, &edits).unwrap(), expected);
}

#[test]
fn test_updated_values_read_back() {
    let updated = set(WORKER, &path("d1_databases.0.database_id"), &"abc".into()).unwrap();
    assert_eq!(
        get(&updated, &path("d1_databases.0.database_id")).unwrap(),
        Some("abc".into())
    );
    assert_eq!(
        get(&updated, &path("d1_databases.1.database_id")).unwrap(),
        Some("<DATABASE_ID_3>".into())
    );
}

#[test]
fn test_path_from_segments() {
    let segments: Path = vec![
        PathSegment::from("d1_databases"),
        PathSegment::from(1usize),
        PathSegment::from("binding"),
    ]
    .into();
    let updated = set(WORKER, &segments, &"DB".into()).unwrap();
    assert!(updated.contains("binding = \"DB\" # second db\n"));
    assert!(updated.contains("binding = \"<BINDING_NAME_1>\" # first db\n"));
}

#[test]
fn test_replacement_keeps_comment_and_spacing() {
    let text = "debug = true  # For now\nlevel = 3\n";
    assert_eq!(
        set(text, &path("debug"), &false.into()).unwrap(),
        "debug = false  # For now\nlevel = 3\n"
    );
}

#[test]
fn test_replace_dotted_key() {
    let text = "a.b = 1\na.c = 2\n";
    assert_eq!(
        set(text, &path("a.c"), &3.into()).unwrap(),
        "a.b = 1\na.c = 3\n"
    );
}

#[test]
fn test_replace_string_with_backslashes() {
    let text = "path = 'C:\\Users' # home\nx = 1\n";
    let updated = set(text, &path("path"), &"D:\\data".into()).unwrap();
    assert!(updated.ends_with(" # home\nx = 1\n"), "{}", updated);
    assert_eq!(get(&updated, &path("path")).unwrap(), Some("D:\\data".into()));
}

#[test]
fn test_replace_array_element() {
    assert_eq!(
        set("a = [1, 2, 3]\n", &path("a.1"), &20.into()).unwrap(),
        "a = [1, 20, 3]\n"
    );
}

#[test]
fn test_replace_scalar_with_table_goes_inline() {
    assert_eq!(
        set("name = \"a\"\n", &path("name"), &table(&[("x", 1.into())])).unwrap(),
        "name = { x = 1 }\n"
    );
}

#[test]
fn test_replace_inline_table_with_scalar() {
    let text = "route = { pattern = \"x\" }\nname = \"a\"\n";
    assert_eq!(
        set(text, &path("route"), &"x/*".into()).unwrap(),
        "route = \"x/*\"\nname = \"a\"\n"
    );
}

#[test]
fn test_replace_table_with_table() {
    let text = "[limits]\ncpu_ms = 100\nmemory = 5\n";
    assert_eq!(
        set(text, &path("limits"), &table(&[("cpu_ms", 1.into())])).unwrap(),
        "[limits]\ncpu_ms = 1\n"
    );
}

#[test]
fn test_replace_table_with_scalar() {
    let text = "a = 1\n\n[limits]\ncpu_ms = 100\n";
    assert_eq!(
        set(text, &path("limits"), &5.into()).unwrap(),
        "limits = 5\n\na = 1\n"
    );
}

#[test]
fn test_replace_table_array_element() {
    let text = "[[db]]\nid = 1\n\n[[db]]\nid = 2\n";
    let body = table(&[("id", 3.into()), ("name", "x".into())]);
    assert_eq!(
        set(text, &path("db.1"), &body).unwrap(),
        "[[db]]\nid = 1\n\n[[db]]\nid = 3\nname = \"x\"\n"
    );
}

#[test]
fn test_crlf_is_preserved() {
    assert_eq!(
        set("a = 1\r\nb = 2\r\n", &path("b"), &3.into()).unwrap(),
        "a = 1\r\nb = 3\r\n"
    );
}

#[test]
fn test_unicode_around_edit() {
    assert_eq!(
        set("name = \"héllo\" # ü\nx = 1\n", &path("name"), &"wörld".into()).unwrap(),
        "name = \"wörld\" # ü\nx = 1\n"
    );
}

#[test]
fn test_float_and_datetime_values() {
    let text = "ratio = 0.5\nwhen = 1979-05-27T07:32:00Z\n";
    let updated = set(text, &path("ratio"), &1.0.into()).unwrap();
    let updated = set(
        &updated,
        &path("when"),
        &TomlValue::Datetime("2024-01-01".into()),
    )
    .unwrap();
    assert_eq!(updated, "ratio = 1.0\nwhen = 2024-01-01\n");
}

#[test]
fn test_scalars_only_rejects_containers() {
    let rewriter = Rewriter::new(RewriteOptions::new().scalars_only(true));
    assert_eq!(
        rewriter.set(WORKER, &path("name"), &table(&[])),
        Err(EditError::NonScalarValue)
    );
    assert_eq!(
        rewriter.set(WORKER, &path("name"), &Vec::<TomlValue>::new().into()),
        Err(EditError::NonScalarValue)
    );
}

#[test]
fn test_invalid_document_is_rejected() {
    let result = set("[limits\ncpu_ms = 1\n", &path("limits.cpu_ms"), &2.into());
    assert!(matches!(result, Err(EditError::Parse(_))));
}

#[test]
fn test_empty_path_is_rejected() {
    assert_eq!(
        set(WORKER, &Path::new(), &1.into()),
        Err(EditError::EmptyPath)
    );
}

#[test]
fn test_values_from_json() {
    let value = TomlValue::try_from(serde_json::json!({
        "pattern": "example.com/*",
        "zone_name": "example.com",
        "custom_domain": null,
    }))
    .unwrap();
    let updated = set(WORKER, &path("route"), &value).unwrap();
    assert!(updated.contains("\nroute = { pattern = \"example.com/*\", zone_name = \"example.com\" }\n"));

    assert_eq!(
        TomlValue::try_from(serde_json::Value::Null),
        Err(EditError::NullValue)
    );
}
