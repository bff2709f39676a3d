//! Query-string construction.

use serde_json::Value;

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// Omitted from the output
    Absent,
    One(String),
    /// Repeats the key once per element
    Many(Vec<String>),
}

macro_rules! scalar_query_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for QueryValue {
                fn from(value: $ty) -> Self {
                    QueryValue::One(value.to_string())
                }
            }
        )*
    };
}

scalar_query_value!(&str, String, &String, bool, u8, u16, u32, u64, i32, i64, usize);

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(QueryValue::Absent, Into::into)
    }
}

impl<T: ToString> From<Vec<T>> for QueryValue {
    fn from(values: Vec<T>) -> Self {
        QueryValue::Many(values.iter().map(ToString::to_string).collect())
    }
}

impl<T: ToString> From<&[T]> for QueryValue {
    fn from(values: &[T]) -> Self {
        QueryValue::Many(values.iter().map(ToString::to_string).collect())
    }
}

/// Ordered set of query parameters.
///
/// ```ignore
/// let q = Query::new()
///     .param("page", 1)
///     .param("search", None::<&str>)
///     .param("tags", vec!["a", "b"]);
/// assert_eq!(q.to_query_string(), "?page=1&tags=a&tags=b");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, QueryValue)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter; `None` values are dropped when rendering.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Build from a JSON object, treating `null` as absent.
    ///
    /// Non-object values produce an empty query.
    pub fn from_json(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };

        let params = map
            .iter()
            .map(|(key, value)| (key.clone(), json_value(value)))
            .collect();

        Self { params }
    }

    pub fn is_empty(&self) -> bool {
        self.params
            .iter()
            .all(|(_, value)| matches!(value, QueryValue::Absent))
    }

    /// Render as `?k=v&...`, or an empty string when nothing is present.
    pub fn to_query_string(&self) -> String {
        let mut parts = Vec::new();

        for (key, value) in &self.params {
            match value {
                QueryValue::Absent => {}
                QueryValue::One(v) => parts.push(pair(key, v)),
                QueryValue::Many(values) => parts.extend(values.iter().map(|v| pair(key, v))),
            }
        }

        if parts.is_empty() {
            String::new()
        } else {
            format!("?{}", parts.join("&"))
        }
    }
}

fn json_value(value: &Value) -> QueryValue {
    match value {
        Value::Null => QueryValue::Absent,
        Value::String(s) => QueryValue::One(s.clone()),
        Value::Array(items) => QueryValue::Many(
            items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        other => QueryValue::One(other.to_string()),
    }
}

fn pair(key: &str, value: &str) -> String {
    format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
}

// URL encoding helper
mod urlencoding {
    pub fn encode(s: &str) -> String {
        url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parts(query: &str) -> Vec<&str> {
        let mut parts: Vec<_> = query.trim_start_matches('?').split('&').collect();
        parts.sort_unstable();
        parts
    }

    #[test]
    fn test_json_object_query() {
        let q = Query::from_json(&json!({
            "page": 1,
            "limit": 20,
            "search": null,
            "tags": ["a", "b"]
        }))
        .to_query_string();

        assert!(q.starts_with('?'));
        assert_eq!(parts(&q), ["limit=20", "page=1", "tags=a", "tags=b"]);
        assert!(!q.contains("search"));
    }

    #[test]
    fn test_builder_query() {
        let q = Query::new()
            .param("page", 2)
            .param("category", None::<String>)
            .param("sort", Some("title"))
            .param("ids", vec![3, 4])
            .to_query_string();

        assert_eq!(parts(&q), ["ids=3", "ids=4", "page=2", "sort=title"]);
    }

    #[test]
    fn test_empty_query() {
        assert_eq!(Query::new().to_query_string(), "");
        assert!(Query::new().param("search", None::<&str>).is_empty());
        assert_eq!(
            Query::new().param("search", None::<&str>).to_query_string(),
            ""
        );
        assert_eq!(Query::from_json(&json!("oops")).to_query_string(), "");
    }

    #[test]
    fn test_encoding() {
        let q = Query::new()
            .param("search", "war & peace")
            .param("a/b", "x=y")
            .to_query_string();

        assert!(q.contains("search=war+%26+peace"));
        assert!(q.contains("a%2Fb=x%3Dy"));
    }

    #[test]
    fn test_empty_array_renders_nothing() {
        let q = Query::new().param("tags", Vec::<String>::new());
        assert_eq!(q.to_query_string(), "");
    }
}
