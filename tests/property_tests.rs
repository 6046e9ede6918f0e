//! Properties checked over every leaf of a realistic document.

use pretty_assertions::assert_eq;
use std::str::FromStr;
use toml_path_edit::{get, remove, set, Document, EditError, Path, TomlValue};

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

fn collect_leaves(value: &TomlValue, prefix: &Path, out: &mut Vec<Path>) {
    match value {
        TomlValue::Table(table) => {
            for (key, child) in table {
                collect_leaves(child, &prefix.with(key.as_str()), out);
            }
        }
        TomlValue::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                collect_leaves(child, &prefix.with(index), out);
            }
        }
        _ => out.push(prefix.clone()),
    }
}

fn leaves() -> Vec<Path> {
    let doc = Document::from_str(WORKER).unwrap();
    let mut out = Vec::new();
    collect_leaves(&doc.to_value().unwrap(), &Path::new(), &mut out);
    out
}

#[test]
fn test_fixture_has_expected_leaves() {
    let leaves: Vec<String> = leaves().iter().map(Path::to_string).collect();
    assert_eq!(leaves.len(), 20);
    assert!(leaves.contains(&"limits.kv_namespaces.0.id".to_string()));
    assert!(leaves.contains(&"d1_databases.1.database_id".to_string()));
    assert!(leaves.contains(&"env.staging.route.zone_name".to_string()));
}

#[test]
fn test_set_then_get_round_trips() {
    for leaf in leaves() {
        let value = TomlValue::from(format!("new-{}", leaf));
        let updated = set(WORKER, &leaf, &value).unwrap();
        assert_eq!(get(&updated, &leaf).unwrap(), Some(value), "{}", leaf);
    }
}

#[test]
fn test_scalar_update_touches_one_line() {
    let original: Vec<&str> = WORKER.lines().collect();
    for leaf in leaves() {
        let updated = set(WORKER, &leaf, &TomlValue::from(7)).unwrap();
        let lines: Vec<&str> = updated.lines().collect();
        assert_eq!(lines.len(), original.len(), "{}", leaf);

        let changed = original
            .iter()
            .zip(&lines)
            .filter(|(before, after)| before != after)
            .count();
        assert_eq!(changed, 1, "{}", leaf);
    }
}

#[test]
fn test_other_values_survive_an_update() {
    let all = leaves();
    for leaf in &all {
        let updated = set(WORKER, leaf, &TomlValue::from(true)).unwrap();
        for other in all.iter().filter(|other| *other != leaf) {
            assert_eq!(
                get(&updated, other).unwrap(),
                get(WORKER, other).unwrap(),
                "setting {} changed {}",
                leaf,
                other
            );
        }
    }
}

#[test]
fn test_remove_is_idempotent() {
    for leaf in leaves() {
        let once = remove(WORKER, &leaf).unwrap();
        let twice = remove(&once, &leaf).unwrap();
        assert_eq!(once, twice, "{}", leaf);
        assert_eq!(get(&once, &leaf).unwrap(), None, "{}", leaf);
    }
}

#[test]
fn test_removing_missing_paths_is_noop() {
    for dotted in [
        "missing",
        "limits.missing",
        "d1_databases.7",
        "d1_databases.0.missing",
        "env.production.name",
        "route.missing",
    ] {
        let path: Path = dotted.parse().unwrap();
        assert_eq!(remove(WORKER, &path).unwrap(), WORKER, "{}", dotted);
    }
}

#[test]
fn test_indices_are_never_skipped() {
    for index in 2..5 {
        let path: Path = format!("limits.kv_namespaces.{}", index).parse().unwrap();
        assert_eq!(
            set(WORKER, &path, &TomlValue::from("x")),
            Err(EditError::CannotSkipArrayIndex { index, len: 1 })
        );
    }

    for index in 3..6 {
        let path: Path = format!("d1_databases.{}", index).parse().unwrap();
        let body = TomlValue::Table(Default::default());
        assert_eq!(
            set(WORKER, &path, &body),
            Err(EditError::CannotSkipTableArrayIndex { index })
        );
    }
}
