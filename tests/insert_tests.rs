use pretty_assertions::assert_eq;
use toml_path_edit::{get, set, EditError, Path, TomlTable, TomlValue};

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

const DATABASES: &str = "[[db]]\nid = 1\n\n[[db]]\nid = 2\n\n[other]\nx = 1\n";

#[test]
fn test_table_into_empty_document() {
    assert_eq!(
        set("", &path("limits"), &table(&[("cpu_ms", 100.into())])).unwrap(),
        "[limits]\ncpu_ms = 100"
    );
}

#[test]
fn test_table_appended_after_content() {
    assert_eq!(
        set(
            "name = \"w\"\n",
            &path("limits"),
            &table(&[("cpu_ms", 1.into())])
        )
        .unwrap(),
        "name = \"w\"\n\n[limits]\ncpu_ms = 1\n"
    );
}

#[test]
fn test_table_appended_with_crlf() {
    assert_eq!(
        set(
            "name = \"w\"\r\n",
            &path("limits"),
            &table(&[("cpu_ms", 1.into())])
        )
        .unwrap(),
        "name = \"w\"\r\n\r\n[limits]\r\ncpu_ms = 1\r\n"
    );
}

#[test]
fn test_top_level_scalar_is_prepended() {
    assert_eq!(
        set("[limits]\ncpu_ms = 1\n", &path("name"), &"w".into()).unwrap(),
        "name = \"w\"\n\n[limits]\ncpu_ms = 1\n"
    );
}

#[test]
fn test_deep_scalar_without_ancestor_gets_a_table() {
    assert_eq!(
        set("name = \"w\"\n", &path("observability.enabled"), &true.into()).unwrap(),
        "name = \"w\"\n\n[observability]\nenabled = true\n"
    );
}

#[test]
fn test_new_array_of_tables() {
    let databases: TomlValue = vec![
        table(&[("binding", "A".into())]),
        table(&[("binding", "B".into())]),
    ]
    .into();
    assert_eq!(
        set("name = \"w\"\n", &path("d1"), &databases).unwrap(),
        "name = \"w\"\n\n[[d1]]\nbinding = \"A\"\n\n[[d1]]\nbinding = \"B\"\n"
    );
}

#[test]
fn test_key_joins_dotted_sibling() {
    assert_eq!(
        set("a.b = 1\n", &path("a.c"), &2.into()).unwrap(),
        "a.b = 1\na.c = 2\n"
    );
    assert_eq!(
        set("a.b = 1 # one\n\n[x]\ny = 1\n", &path("a.c.d"), &2.into()).unwrap(),
        "a.b = 1 # one\na.c.d = 2\n\n[x]\ny = 1\n"
    );
}

#[test]
fn test_key_goes_under_table_header() {
    assert_eq!(
        set("[limits]\ncpu_ms = 100\n", &path("limits.memory"), &128.into()).unwrap(),
        "[limits]\nmemory = 128\ncpu_ms = 100\n"
    );
}

#[test]
fn test_dotted_key_under_table_header() {
    assert_eq!(
        set(
            "[env.staging] # staging\nname = \"s\"\n",
            &path("env.staging.vars.KEY"),
            &"v".into()
        )
        .unwrap(),
        "[env.staging] # staging\nvars.KEY = \"v\"\nname = \"s\"\n"
    );
}

#[test]
fn test_key_under_header_with_crlf() {
    assert_eq!(
        set("[t]\r\na = 1\r\n", &path("t.b"), &2.into()).unwrap(),
        "[t]\r\nb = 2\r\na = 1\r\n"
    );
}

#[test]
fn test_key_into_inline_table() {
    assert_eq!(
        set(
            "route = { pattern = \"x\" }\n",
            &path("route.zone_name"),
            &"y".into()
        )
        .unwrap(),
        "route = { pattern = \"x\", zone_name = \"y\" }\n"
    );
}

#[test]
fn test_key_into_inline_table_inside_array() {
    let text = "kv = [\n  { binding = \"A\", id = \"1\" } # c\n]\n";
    assert_eq!(
        set(text, &path("kv.0.preview_id"), &"p".into()).unwrap(),
        "kv = [\n  { binding = \"A\", id = \"1\", preview_id = \"p\" } # c\n]\n"
    );
}

#[test]
fn test_append_to_inline_array() {
    assert_eq!(
        set("a = [1, 2]\n", &path("a.2"), &3.into()).unwrap(),
        "a = [1, 2, 3]\n"
    );
}

#[test]
fn test_append_copies_compact_separator() {
    assert_eq!(
        set("kv=[{a=1}]", &path("kv.1"), &table(&[("a", 2.into())])).unwrap(),
        "kv=[{a=1},{ a = 2 }]"
    );
}

#[test]
fn test_append_to_multiline_array() {
    let text = "a = [\n  1, # one\n  2, # two\n]\n";
    assert_eq!(
        set(text, &path("a.2"), &3.into()).unwrap(),
        "a = [\n  1, # one\n  2, # two\n  3\n]\n"
    );
}

#[test]
fn test_append_ignores_comma_inside_comment() {
    assert_eq!(
        set("a = [\n  1,\n  2 # x, y\n]\n", &path("a.2"), &3.into()).unwrap(),
        "a = [\n  1,\n  2, # x, y\n  3\n]\n"
    );
}

#[test]
fn test_append_to_empty_array() {
    assert_eq!(
        set("a = []\n", &path("a.0"), &"x".into()).unwrap(),
        "a = [ \"x\" ]\n"
    );
}

#[test]
fn test_append_to_nested_array() {
    assert_eq!(
        set("a = [[1], [2]]\n", &path("a.1.1"), &3.into()).unwrap(),
        "a = [[1], [2,3]]\n"
    );
}

#[test]
fn test_array_index_cannot_be_skipped() {
    assert_eq!(
        set("kv=[{a=1}]", &path("kv.2"), &table(&[("a", 2.into())])),
        Err(EditError::CannotSkipArrayIndex { index: 2, len: 1 })
    );
}

#[test]
fn test_key_into_array_makes_it_a_table() {
    assert_eq!(
        set("a = [1]\n", &path("a.key"), &1.into()).unwrap(),
        "a = { key = 1 }\n"
    );
}

#[test]
fn test_key_into_scalar_makes_it_a_table() {
    assert_eq!(
        set("a = 1\n", &path("a.b"), &2.into()).unwrap(),
        "a = { b = 2 }\n"
    );
}

#[test]
fn test_append_table_array_element() {
    assert_eq!(
        set(DATABASES, &path("db.2"), &table(&[("id", 3.into())])).unwrap(),
        "[[db]]\nid = 1\n\n[[db]]\nid = 2\n\n[[db]]\nid = 3\n\n[other]\nx = 1\n"
    );
}

#[test]
fn test_table_array_index_cannot_be_skipped() {
    assert_eq!(
        set(DATABASES, &path("db.5"), &table(&[("id", 3.into())])),
        Err(EditError::CannotSkipTableArrayIndex { index: 5 })
    );
}

#[test]
fn test_table_array_element_must_be_a_table() {
    assert_eq!(
        set(DATABASES, &path("db.2"), &5.into()),
        Err(EditError::TableArrayBodyMustBeObject)
    );
}

#[test]
fn test_key_into_table_array_element() {
    assert_eq!(
        set(DATABASES, &path("db.0.name"), &"x".into()).unwrap(),
        "[[db]]\nname = \"x\"\nid = 1\n\n[[db]]\nid = 2\n\n[other]\nx = 1\n"
    );
}

#[test]
fn test_key_into_new_table_array_element() {
    assert_eq!(
        set("[[db]]\nid = 1\n\n[[db]]\nid = 2\n", &path("db.2.name"), &"x".into()).unwrap(),
        "[[db]]\nid = 1\n\n[[db]]\nid = 2\n\n[[db]]\nname = \"x\"\n"
    );
}

#[test]
fn test_key_into_skipped_table_array_element() {
    assert_eq!(
        set(DATABASES, &path("db.5.name"), &"x".into()),
        Err(EditError::CannotSkipTableArrayIndex { index: 5 })
    );
}

#[test]
fn test_key_into_table_array_changes_its_type() {
    assert_eq!(
        set("[[db]]\nid = 1\n\n[[db]]\nid = 2\n", &path("db.name"), &"x".into()).unwrap(),
        "[db]\nname = \"x\""
    );
}

#[test]
fn test_inserted_values_read_back() {
    let text = "name = \"w\"\n\n[limits]\ncpu_ms = 1\n";
    for (dotted, value) in [
        ("limits.memory", TomlValue::from(128)),
        ("route.pattern", "example.org/*".into()),
        ("vars.list", vec![1, 2].into()),
    ] {
        let updated = set(text, &path(dotted), &value).unwrap();
        assert_eq!(get(&updated, &path(dotted)).unwrap(), Some(value), "{}", dotted);
    }
}
