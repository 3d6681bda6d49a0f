use serde::Deserialize;
use serde_json::Value;

/// The standard paginated REST envelope both flavors return:
/// `{count, next, results}`.
#[derive(Debug, Deserialize)]
pub struct Page {
    #[allow(dead_code)]
    pub count: i64,
    pub next: Option<String>,
    pub results: Vec<Value>,
}
