//! JSON body accessor.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::http::fault::Fault;

/// The JSON object sent as a request body.
///
/// Indexing a missing key is a 400 naming the key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Json(Map<String, Value>);

impl Json {
    /// Parse a request body. Empty or invalid bodies and non-object
    /// documents are rejected with 400.
    pub fn parse(body: &[u8]) -> Result<Self, Fault> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|_| Fault::bad_request("Json data required"))?;
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err(Fault::bad_request("Json data required")),
            _ => Err(Fault::bad_request("Json body required.")),
        }
    }

    /// A required key.
    pub fn get(&self, key: &str) -> Result<&Value, Fault> {
        self.0
            .get(key)
            .ok_or_else(|| Fault::bad_request(format!("Object key '{}' is required.", key)))
    }

    /// A required key holding a string.
    pub fn str(&self, key: &str) -> Result<&str, Fault> {
        self.get(key)?
            .as_str()
            .ok_or_else(|| Fault::bad_request(format!("Object key '{}' must be a string.", key)))
    }

    /// A required key deserialized into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, Fault> {
        serde_json::from_value(self.get(key)?.clone())
            .map_err(|e| Fault::bad_request(format!("Object key '{}' is invalid: {}", key, e)))
    }

    /// The whole body deserialized into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, Fault> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| Fault::bad_request(format!("Invalid json body: {}", e)))
    }

    pub fn get_opt(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl IntoIterator for Json {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
