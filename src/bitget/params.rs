use crate::core::errors::AdapterError;
use std::collections::BTreeMap;
use std::fmt::Display;

/// Request parameters in canonical form.
///
/// Backed by an ordered map so iteration is always sorted by key: equal
/// parameter sets produce byte-identical query strings and JSON bodies no
/// matter the insertion order, which the signature scheme depends on.
/// Values are stringified on insert; booleans become the literal strings
/// `true`/`false`.
#[derive(Debug, Clone, Default)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, key: &str, value: impl Display) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_opt(self, key: &str, value: Option<impl Display>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sorted `k=v&k=v` form. Values here are venue enumerations,
    /// symbols and integers, none of which require percent-escaping.
    pub fn query_string(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Sorted key/value pairs for the transport layer.
    pub fn as_pairs(&self) -> Vec<(&str, &str)> {
        self.0
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    /// Canonical JSON object body. The signed bytes and the transmitted
    /// bytes are this same string.
    pub fn to_json(&self) -> Result<String, AdapterError> {
        Ok(serde_json::to_string(&self.0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_is_irrelevant() {
        let a = Params::new()
            .with("symbol", "BTCUSDT_UMCBL")
            .with("marginCoin", "USDT")
            .with("limit", 100);
        let b = Params::new()
            .with("limit", 100)
            .with("marginCoin", "USDT")
            .with("symbol", "BTCUSDT_UMCBL");

        assert_eq!(a.query_string(), b.query_string());
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }

    #[test]
    fn keys_are_sorted() {
        let params = Params::new()
            .with("symbol", "ETHUSD_DMCBL")
            .with("granularity", 60)
            .with("startTime", 1_700_000_000_000_i64);

        assert_eq!(
            params.query_string(),
            "granularity=60&startTime=1700000000000&symbol=ETHUSD_DMCBL"
        );
    }

    #[test]
    fn bools_serialize_as_literals() {
        let params = Params::new().with("reduceOnly", true).with("hedged", false);
        assert_eq!(params.query_string(), "hedged=false&reduceOnly=true");
    }

    #[test]
    fn optional_values_are_skipped() {
        let params = Params::new()
            .with("symbol", "BTCUSDT_UMCBL")
            .with_opt("lastEndId", None::<i64>)
            .with_opt("startTime", Some(42));
        assert_eq!(params.query_string(), "startTime=42&symbol=BTCUSDT_UMCBL");
    }

    #[test]
    fn json_body_is_compact_and_sorted() {
        let params = Params::new().with("b", 2).with("a", "x");
        assert_eq!(params.to_json().unwrap(), r#"{"a":"x","b":"2"}"#);
    }
}
