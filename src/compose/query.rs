//! Query-string composition.
//!
//! # Responsibilities
//! - Render typed query values the way peer services parse them
//! - Merge new parameters into a URL without dropping the ones it already has
//!
//! # Encoding Rules
//! - Booleans render as `true` / `false`
//! - A list under key `k` expands into one `k[]=v` pair per element, in order
//! - Null values are dropped
//! - The fragment is removed once parameters are merged

use serde_json::Value;
use url::Url;

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<QueryValue>),
    Null,
}

impl QueryValue {
    /// Render a scalar. Lists and nulls have no single rendering.
    fn render_scalar(&self) -> Option<String> {
        match self {
            QueryValue::Str(s) => Some(s.clone()),
            QueryValue::Int(i) => Some(i.to_string()),
            QueryValue::Float(f) => Some(f.to_string()),
            QueryValue::Bool(b) => Some(if *b { "true" } else { "false" }.to_string()),
            QueryValue::List(_) | QueryValue::Null => None,
        }
    }

    fn flatten_into(&self, out: &mut Vec<String>) {
        match self {
            QueryValue::List(items) => items.iter().for_each(|item| item.flatten_into(out)),
            scalar => out.extend(scalar.render_scalar()),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        QueryValue::Str(v.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        QueryValue::Str(v)
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        QueryValue::Bool(v)
    }
}

impl From<i64> for QueryValue {
    fn from(v: i64) -> Self {
        QueryValue::Int(v)
    }
}

impl From<i32> for QueryValue {
    fn from(v: i32) -> Self {
        QueryValue::Int(v.into())
    }
}

impl From<u32> for QueryValue {
    fn from(v: u32) -> Self {
        QueryValue::Int(v.into())
    }
}

impl From<f64> for QueryValue {
    fn from(v: f64) -> Self {
        QueryValue::Float(v)
    }
}

impl<T: Into<QueryValue>> From<Vec<T>> for QueryValue {
    fn from(v: Vec<T>) -> Self {
        QueryValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(QueryValue::Null)
    }
}

impl From<Value> for QueryValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => QueryValue::Null,
            Value::Bool(b) => QueryValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => QueryValue::Int(i),
                None => QueryValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => QueryValue::Str(s),
            Value::Array(items) => QueryValue::List(items.into_iter().map(Into::into).collect()),
            obj @ Value::Object(_) => QueryValue::Str(obj.to_string()),
        }
    }
}

/// Ordered query parameters for one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    params: Vec<(String, QueryValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        self.params.push((key.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Build from a JSON object. Anything else yields no parameters.
    pub fn from_json(value: &Value) -> Self {
        let params = value
            .as_object()
            .map(|map| {
                map.iter()
                    .map(|(k, v)| (k.clone(), QueryValue::from(v.clone())))
                    .collect()
            })
            .unwrap_or_default();
        Self { params }
    }

    /// Encoded `(key, value)` pairs in input order.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (key, value) in &self.params {
            match value {
                QueryValue::Null => {}
                QueryValue::List(_) => {
                    let array_key = format!("{}[]", key);
                    let mut rendered = Vec::new();
                    value.flatten_into(&mut rendered);
                    pairs.extend(rendered.into_iter().map(|v| (array_key.clone(), v)));
                }
                scalar => pairs.extend(scalar.render_scalar().map(|v| (key.clone(), v))),
            }
        }
        pairs
    }
}

impl<K: Into<String>, V: Into<QueryValue>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Merge `params` into `url`, keeping any query the URL already carries.
pub fn apply_query(url: &mut Url, params: &QueryParams) {
    if params.is_empty() {
        return;
    }

    let pairs = params.pairs();
    if !pairs.is_empty() {
        let mut query = url.query_pairs_mut();
        for (key, value) in &pairs {
            query.append_pair(key, value);
        }
    }
    url.set_fragment(None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decoded(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_list_expands_to_array_keys() {
        let mut url = Url::parse("http://users/v1/search").unwrap();
        let params = QueryParams::new().with("ids", vec![3, 1, 2]);
        apply_query(&mut url, &params);

        let pairs = decoded(&url);
        assert_eq!(
            pairs,
            vec![
                ("ids[]".to_string(), "3".to_string()),
                ("ids[]".to_string(), "1".to_string()),
                ("ids[]".to_string(), "2".to_string()),
            ]
        );
        assert!(!pairs.iter().any(|(k, _)| k == "ids"));
    }

    #[test]
    fn test_booleans_render_lowercase() {
        let mut url = Url::parse("http://users/v1/list").unwrap();
        let params = QueryParams::new()
            .with("active", true)
            .with("deleted", false)
            .with("flags", vec![true, false]);
        apply_query(&mut url, &params);

        let pairs = decoded(&url);
        assert!(pairs.contains(&("active".into(), "true".into())));
        assert!(pairs.contains(&("deleted".into(), "false".into())));
        assert!(pairs.contains(&("flags[]".into(), "true".into())));
        assert!(pairs.contains(&("flags[]".into(), "false".into())));
        assert!(!url.as_str().contains("True"));
    }

    #[test]
    fn test_nulls_dropped() {
        let mut url = Url::parse("http://users/v1/list").unwrap();
        let params = QueryParams::new()
            .with("cursor", None::<String>)
            .with("limit", 20);
        apply_query(&mut url, &params);
        assert_eq!(decoded(&url), vec![("limit".to_string(), "20".to_string())]);
    }

    #[test]
    fn test_existing_query_preserved() {
        let mut url = Url::parse("http://users/v1/list?tenant=acme#section").unwrap();
        apply_query(&mut url, &QueryParams::new().with("page", 2));

        assert_eq!(
            decoded(&url),
            vec![
                ("tenant".to_string(), "acme".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_empty_params_leave_url_untouched() {
        let mut url = Url::parse("http://users/v1/list?x=1#frag").unwrap();
        apply_query(&mut url, &QueryParams::new());
        assert_eq!(url.as_str(), "http://users/v1/list?x=1#frag");
    }

    #[test]
    fn test_from_json() {
        let params = QueryParams::from_json(&json!({
            "q": "shoes",
            "in_stock": true,
            "sizes": [41, 42],
            "brand": null
        }));
        let pairs = params.pairs();
        assert!(pairs.contains(&("q".into(), "shoes".into())));
        assert!(pairs.contains(&("in_stock".into(), "true".into())));
        assert!(pairs.contains(&("sizes[]".into(), "41".into())));
        assert!(pairs.contains(&("sizes[]".into(), "42".into())));
        assert!(!pairs.iter().any(|(k, _)| k == "brand"));
    }
}
