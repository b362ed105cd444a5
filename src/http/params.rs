//! Query-string accessor.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::http::fault::Fault;

/// Query parameters of one request (`?key1=val&key2=val2`).
///
/// Repeated keys keep their first value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    /// Parse a raw query string (without the leading `?`).
    pub fn parse(query: &str) -> Self {
        let mut map = BTreeMap::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            map.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
        Self(map)
    }

    /// A required parameter. Missing keys are a 400 naming the key.
    pub fn get(&self, key: &str) -> Result<&str, Fault> {
        self.0
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| Fault::bad_request(format!("Parameter '{}' is required.", key)))
    }

    /// A required parameter parsed into `T`.
    pub fn get_as<T: FromStr>(&self, key: &str) -> Result<T, Fault> {
        self.get(key)?
            .parse()
            .map_err(|_| Fault::bad_request(format!("Parameter '{}' is invalid.", key)))
    }

    pub fn get_opt(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
