//! Skip-list expansion

use regex::Regex;
use std::collections::BTreeMap;

/// Test id, or pattern before expansion, mapped to an optional skip reason
pub type SkipList = BTreeMap<String, Option<String>>;

/// Expand regex patterns into the concrete tests of `load_list` they match
///
/// Every test a pattern finds anywhere in its id is mapped to the reason of
/// that pattern. A pattern that does not compile is kept as a literal test
/// id. Later patterns override the reason of earlier ones.
pub fn expand_skip_list(load_list: &[String], patterns: &SkipList) -> SkipList {
    let mut expanded = SkipList::new();

    for (pattern, reason) in patterns {
        match Regex::new(pattern) {
            Ok(regex) => {
                for test in load_list.iter().filter(|test| regex.is_match(test)) {
                    expanded.insert(test.clone(), reason.clone());
                }
            }
            Err(err) => {
                tracing::debug!(
                    target: "verification",
                    pattern = %pattern,
                    error = %err,
                    "Skip pattern is not a regex, using it as a test id"
                );
                expanded.insert(pattern.clone(), reason.clone());
            }
        }
    }

    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_list() -> Vec<String> {
        vec![
            "tempest.api.compute.servers.test_create".to_string(),
            "tempest.api.compute.servers.test_delete[id-1]".to_string(),
            "tempest.api.network.test_ports".to_string(),
        ]
    }

    #[test]
    fn test_empty_patterns() {
        assert!(expand_skip_list(&load_list(), &SkipList::new()).is_empty());
    }

    #[test]
    fn test_pattern_matches_anywhere() {
        let mut patterns = SkipList::new();
        patterns.insert("servers".to_string(), Some("flaky".to_string()));

        let expanded = expand_skip_list(&load_list(), &patterns);
        assert_eq!(expanded.len(), 2);
        assert_eq!(
            expanded["tempest.api.compute.servers.test_delete[id-1]"],
            Some("flaky".to_string())
        );
    }

    #[test]
    fn test_invalid_regex_kept_literally() {
        let mut patterns = SkipList::new();
        patterns.insert("tempest.api.compute.servers.test_delete[id-1".to_string(), None);

        let expanded = expand_skip_list(&load_list(), &patterns);
        assert_eq!(expanded.len(), 1);
        assert!(expanded.contains_key("tempest.api.compute.servers.test_delete[id-1"));
    }

    #[test]
    fn test_pattern_without_matches() {
        let mut patterns = SkipList::new();
        patterns.insert("identity".to_string(), Some("not deployed".to_string()));
        assert!(expand_skip_list(&load_list(), &patterns).is_empty());
    }
}
