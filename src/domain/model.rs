use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: HashMap<String, Value>,
}

impl From<Map<String, Value>> for Record {
    fn from(obj: Map<String, Value>) -> Self {
        Self {
            data: obj.into_iter().collect(),
        }
    }
}

/// Output shape of a marshalled object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarshalFormat {
    #[default]
    Dict,
    OrderedDict,
    Tuples,
    List,
}

/// One marshalled object (or collection of objects, for `Many`).
///
/// Uses IndexMap for the ordered variant so entries keep schema declaration
/// order; `Dict` is a plain key-sorted JSON map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Marshalled {
    Dict(Map<String, Value>),
    OrderedDict(IndexMap<String, Value>),
    Tuples(Vec<(String, Value)>),
    List(Vec<Value>),
    Many(Vec<Marshalled>),
}

impl Marshalled {
    pub fn into_value(self) -> Value {
        match self {
            Marshalled::Dict(map) => Value::Object(map),
            Marshalled::OrderedDict(map) => Value::Object(map.into_iter().collect()),
            Marshalled::Tuples(pairs) => Value::Object(pairs.into_iter().collect()),
            Marshalled::List(values) => Value::Array(values),
            Marshalled::Many(items) => {
                Value::Array(items.into_iter().map(Marshalled::into_value).collect())
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Marshalled::Dict(map) => map.get(key),
            Marshalled::OrderedDict(map) => map.get(key),
            Marshalled::Tuples(pairs) => pairs.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v),
            Marshalled::List(_) | Marshalled::Many(_) => None,
        }
    }
}

/// The result of marshalling a batch of records, with rendered outputs.
#[derive(Debug, Clone)]
pub struct MarshalBatch {
    pub records: Vec<Marshalled>,
    pub json_output: String,
    pub csv_output: Option<String>,
}
