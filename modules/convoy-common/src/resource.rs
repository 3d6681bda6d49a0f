//! `Resource` — a thin, mostly-opaque wrapper around a decoded JSON object.
//!
//! The remote APIs return heterogeneous objects with dozens of fields the
//! engine never needs to understand (timeout settings, verbosity flags,
//! playbook paths, ...). Rather than modeling every field as a typed struct
//! per resource kind, `Resource` keeps the decoded `serde_json::Value` and
//! exposes typed accessors only for the handful of fields the engine reads
//! by name. Everything else rides along opaque and is passed through
//! unchanged when the importer re-POSTs it.

use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resource(pub Value);

impl Resource {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The source-side numeric ID, if present and an integer.
    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    /// `name` field, for kinds keyed by name.
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// `username` field, for users.
    pub fn username(&self) -> Option<&str> {
        self.0.get("username").and_then(Value::as_str)
    }

    /// The natural key for this resource: `username` if present, else `name`.
    pub fn natural_key(&self) -> Option<&str> {
        self.username().or_else(|| self.name())
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.0.get(field).and_then(Value::as_bool)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.0.get(field).and_then(Value::as_i64)
    }

    /// `summary_fields.<path>`, a common nesting in these APIs (e.g.
    /// `summary_fields.unified_job_template.name`).
    pub fn summary_field(&self, path: &[&str]) -> Option<&Value> {
        let mut cur = self.0.get("summary_fields")?;
        for p in path {
            cur = cur.get(p)?;
        }
        Some(cur)
    }

    /// `summary_fields.credentials[]`, used when wiring JT credential
    /// associations by name.
    pub fn summary_credential_names(&self) -> Vec<String> {
        self.0
            .get("summary_fields")
            .and_then(|sf| sf.get("credentials"))
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|c| c.get("name").and_then(Value::as_str))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether this resource is an unmanaged (custom) credential type.
    pub fn is_managed(&self) -> bool {
        self.get_bool("managed").unwrap_or(false)
    }

    /// Whether surveys are enabled on this JT/WFJT.
    pub fn survey_enabled(&self) -> bool {
        self.get_bool("survey_enabled").unwrap_or(false)
    }

    /// The raw `serde_json::Value`, for building POST bodies that pass
    /// fields through unchanged.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Resource {
    fn from(v: Value) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn natural_key_prefers_username() {
        let r = Resource::new(json!({"username": "bob", "name": "Bob Smith"}));
        assert_eq!(r.natural_key(), Some("bob"));
    }

    #[test]
    fn natural_key_falls_back_to_name() {
        let r = Resource::new(json!({"name": "Acme"}));
        assert_eq!(r.natural_key(), Some("Acme"));
    }

    #[test]
    fn summary_field_walks_nested_path() {
        let r = Resource::new(json!({
            "summary_fields": {"unified_job_template": {"name": "Deploy"}}
        }));
        assert_eq!(
            r.summary_field(&["unified_job_template", "name"]),
            Some(&json!("Deploy"))
        );
        assert_eq!(r.summary_field(&["unified_job_template", "missing"]), None);
    }

    #[test]
    fn summary_credential_names_collects_names() {
        let r = Resource::new(json!({
            "summary_fields": {"credentials": [{"name": "aws"}, {"name": "vault"}]}
        }));
        assert_eq!(r.summary_credential_names(), vec!["aws", "vault"]);
    }
}
