//! Arguments of one verification run

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::skip::SkipList;

/// Options controlling which tests run and how
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunArgs {
    /// Worker count; `0` lets the runner decide
    #[serde(default)]
    pub concurrency: u32,
    /// Explicit tests to run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_list: Option<Vec<String>>,
    /// Patterns (or expanded test ids) to skip, with reasons
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_list: Option<SkipList>,
    /// Tests expected to fail, with reasons
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xfail_list: Option<SkipList>,
    /// Re-run only the tests that failed last time
    #[serde(default)]
    pub failed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Verifier-specific options passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RunArgs {
    pub fn with_concurrency(mut self, concurrency: u32) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_load_list<I, S>(mut self, tests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.load_list = Some(tests.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_skip(mut self, pattern: impl Into<String>, reason: Option<&str>) -> Self {
        self.skip_list
            .get_or_insert_with(SkipList::new)
            .insert(pattern.into(), reason.map(str::to_string));
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn failed_only(mut self) -> Self {
        self.failed = true;
        self
    }

    pub fn has_skip_list(&self) -> bool {
        self.skip_list.as_ref().is_some_and(|skip| !skip.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_with_extra_options() {
        let args: RunArgs = serde_json::from_value(json!({
            "concurrency": 4,
            "skip_list": {"test_a": "broken", "test_b": null},
            "xml": true
        }))
        .unwrap();

        assert_eq!(args.concurrency, 4);
        assert!(args.has_skip_list());
        assert_eq!(args.skip_list.as_ref().unwrap()["test_b"], None);
        assert_eq!(args.extra["xml"], json!(true));
        assert!(!args.failed);
    }

    #[test]
    fn test_serialize_omits_unset_lists() {
        let value = serde_json::to_value(RunArgs::default().with_pattern("smoke")).unwrap();
        assert_eq!(
            value,
            json!({"concurrency": 0, "failed": false, "pattern": "smoke"})
        );
    }
}
