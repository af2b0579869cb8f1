//! Query string builder for the RPC-style NCloud actions
//!
//! Every server/VPC action is a GET with its arguments in the query string.
//! List arguments are flattened into indexed keys: `serverInstanceNoList.1`,
//! `serverInstanceNoList.2`, ...

/// Ordered set of query parameters for one API action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// Append a parameter only when a value is present
    pub fn push_opt(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    /// Append an indexed list parameter (`key.1`, `key.2`, ...)
    pub fn push_list<S: AsRef<str>>(&mut self, key: &str, values: &[S]) -> &mut Self {
        for (i, value) in values.iter().enumerate() {
            self.push(format!("{}.{}", key, i + 1), value.as_ref());
        }
        self
    }

    /// Look up the first value recorded for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether no parameters were added
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Render as an URL-encoded query string (without the leading `?`)
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
