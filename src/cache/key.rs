//! Cache keys: endpoint plus ordered query parameters.

use std::collections::BTreeMap;
use std::fmt;

/// Identity of a cached read. Parameters are kept sorted, so insertion order
/// never changes a key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    endpoint: String,
    params: BTreeMap<String, String>,
}

impl QueryKey {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), params: BTreeMap::new() }
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// True when the endpoint equals `prefix` or is nested below it.
    /// An empty prefix matches every key.
    #[must_use]
    pub fn is_under(&self, prefix: &str) -> bool {
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return true;
        }
        self.endpoint == prefix
            || self
                .endpoint
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.endpoint)?;
        for (i, (k, v)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{k}={v}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_order_does_not_change_identity() {
        let a = QueryKey::new("/api/lessons").with_param("subject", "s1").with_param("page", 2);
        let b = QueryKey::new("/api/lessons").with_param("page", 2).with_param("subject", "s1");
        assert_eq!(a, b);
    }

    #[test]
    fn different_params_are_different_keys() {
        let a = QueryKey::new("/api/lessons").with_param("page", 1);
        let b = QueryKey::new("/api/lessons").with_param("page", 2);
        assert_ne!(a, b);
    }

    #[test]
    fn display_sorted_query_string() {
        let key = QueryKey::new("/api/notes").with_param("z", "1").with_param("a", "2");
        assert_eq!(key.to_string(), "/api/notes?a=2&z=1");
        assert_eq!(QueryKey::new("/api/notes").to_string(), "/api/notes");
    }

    #[test]
    fn query_pairs_sorted() {
        let key = QueryKey::new("/api/notes").with_param("b", "2").with_param("a", "1");
        assert_eq!(key.query_pairs(), vec![("a".into(), "1".into()), ("b".into(), "2".into())]);
    }

    #[test]
    fn is_under_matches_exact_and_nested() {
        let key = QueryKey::new("/api/subjects/s1");
        assert!(key.is_under("/api/subjects"));
        assert!(key.is_under("/api/subjects/"));
        assert!(key.is_under("/api/subjects/s1"));
        assert!(key.is_under(""));
    }

    #[test]
    fn is_under_rejects_sibling_prefix() {
        let key = QueryKey::new("/api/subjects-archive");
        assert!(!key.is_under("/api/subjects"));
    }
}
