//! Formatters for the engine's observable log-line contract. Every line the
//! importer and preflight emit goes through one of these so the wording
//! stays exactly consistent (tests match these strings).

pub fn section(type_label: &str) -> String {
    format!("=== Importing {type_label} ===")
}

pub fn created(name: &str, id: i64) -> String {
    format!("  CREATED: {name} (ID {id})")
}

pub fn skip_exists(name: &str) -> String {
    format!("  SKIP (exists): {name}")
}

pub fn excluded(name: &str) -> String {
    format!("  EXCLUDED: {name} (user exclusion)")
}

pub fn fail(name: &str, err: &str) -> String {
    format!("  FAIL: {name}: {err}")
}

pub fn skip_reason(name: &str, reason: &str) -> String {
    format!("  SKIP: {name} ({reason})")
}
