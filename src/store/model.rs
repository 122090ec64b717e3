use std::collections::HashMap;

use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{ListValue, PointId, Struct, Value as QdrantValue};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Payload key holding the catalog id (Qdrant point ids are hashes of it).
pub const RECORD_ID_FIELD: &str = "game_id";

/// One catalog entry as stored.
///
/// Numeric fields keep whatever the store held (numbers, numeric strings, garbage, nothing);
/// [`crate::features`] does the coercion. Records are never mutated after retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    #[serde(alias = "_id", deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_name")]
    pub name: String,
    #[serde(default)]
    pub developer: Value,
    #[serde(default)]
    pub positive: Value,
    #[serde(default)]
    pub negative: Value,
    #[serde(default)]
    pub owners: Value,
    #[serde(default)]
    pub average_playtime: Value,
    #[serde(default)]
    pub median_playtime: Value,
    #[serde(default)]
    pub price: Value,
    /// Similarity score, present only on semantic search hits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl GameRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            developer: Value::Null,
            positive: Value::Null,
            negative: Value::Null,
            owners: Value::Null,
            average_playtime: Value::Null,
            median_playtime: Value::Null,
            price: Value::Null,
            score: None,
        }
    }

    pub fn with_developer(mut self, developer: impl Into<Value>) -> Self {
        self.developer = developer.into();
        self
    }

    pub fn with_reviews(mut self, positive: impl Into<Value>, negative: impl Into<Value>) -> Self {
        self.positive = positive.into();
        self.negative = negative.into();
        self
    }

    pub fn with_playtime(mut self, average: impl Into<Value>, median: impl Into<Value>) -> Self {
        self.average_playtime = average.into();
        self.median_playtime = median.into();
        self
    }

    pub fn with_price(mut self, price: impl Into<Value>) -> Self {
        self.price = price.into();
        self
    }

    pub fn with_owners(mut self, owners: impl Into<Value>) -> Self {
        self.owners = owners.into();
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// Raw value of a named field (`None` for unknown names).
    pub fn field(&self, name: &str) -> Option<&Value> {
        match name {
            "developer" => Some(&self.developer),
            "positive" => Some(&self.positive),
            "negative" => Some(&self.negative),
            "owners" => Some(&self.owners),
            "average_playtime" => Some(&self.average_playtime),
            "median_playtime" => Some(&self.median_playtime),
            "price" => Some(&self.price),
            _ => None,
        }
    }

    /// Builds a record from a Qdrant point payload.
    ///
    /// The id comes from the `game_id` payload field, falling back to the point id.
    /// Returns `None` when neither is usable.
    pub fn from_payload(
        point_id: Option<PointId>,
        payload: HashMap<String, QdrantValue>,
        score: Option<f32>,
    ) -> Option<Self> {
        let mut fields: serde_json::Map<String, Value> = payload
            .into_iter()
            .map(|(k, v)| (k, qdrant_to_json(v)))
            .collect();

        let id = match fields.remove(RECORD_ID_FIELD) {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => match point_id.and_then(|pid| pid.point_id_options) {
                Some(PointIdOptions::Num(n)) => n.to_string(),
                Some(PointIdOptions::Uuid(u)) => u,
                None => return None,
            },
        };

        let mut take = |key: &str| fields.remove(key).unwrap_or(Value::Null);

        Some(Self {
            id,
            name: name_from_value(take("name")),
            developer: take("developer"),
            positive: take("positive"),
            negative: take("negative"),
            owners: take("owners"),
            average_playtime: take("average_playtime"),
            median_playtime: take("median_playtime"),
            price: take("price"),
            score,
        })
    }

    /// Converts the record into a Qdrant payload (score is not stored).
    pub fn to_payload(&self) -> HashMap<String, QdrantValue> {
        let mut payload = HashMap::new();
        payload.insert(RECORD_ID_FIELD.to_string(), self.id.clone().into());
        payload.insert("name".to_string(), self.name.clone().into());

        for (key, value) in [
            ("developer", &self.developer),
            ("positive", &self.positive),
            ("negative", &self.negative),
            ("owners", &self.owners),
            ("average_playtime", &self.average_playtime),
            ("median_playtime", &self.median_playtime),
            ("price", &self.price),
        ] {
            if !value.is_null() {
                payload.insert(key.to_string(), json_to_qdrant(value));
            }
        }

        payload
    }
}

/// A record plus its optional embedding, ready to be written.
#[derive(Debug, Clone)]
pub struct CatalogPoint {
    pub id: u64,
    pub record: GameRecord,
    pub vector: Option<Vec<f32>>,
}

impl CatalogPoint {
    pub fn new(record: GameRecord, vector: Option<Vec<f32>>) -> Self {
        Self {
            id: crate::hashing::point_id_for(&record.id),
            record,
            vector,
        }
    }
}

/// Similarity query against a named vector index.
#[derive(Debug, Clone)]
pub struct VectorQuery {
    pub vector: Vec<f32>,
    /// Named vector (index) to search.
    pub index: String,
    pub limit: usize,
    /// Candidate pool considered by the index before truncation to `limit`.
    pub num_candidates: usize,
}

/// Case-insensitive substring test shared by every store implementation.
pub fn name_matches(name: &str, fragment: &str) -> bool {
    name.to_lowercase().contains(&fragment.to_lowercase())
}

fn name_from_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

pub(crate) fn qdrant_to_json(value: QdrantValue) -> Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::from(i),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(qdrant_to_json).collect())
        }
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, qdrant_to_json(v)))
                .collect(),
        ),
    }
}

pub(crate) fn json_to_qdrant(value: &Value) -> QdrantValue {
    let kind = match value {
        Value::Null => Kind::NullValue(0),
        Value::Bool(b) => Kind::BoolValue(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or(0.0)),
        },
        Value::String(s) => Kind::StringValue(s.clone()),
        Value::Array(items) => Kind::ListValue(ListValue {
            values: items.iter().map(json_to_qdrant).collect(),
        }),
        Value::Object(map) => Kind::StructValue(Struct {
            fields: map
                .iter()
                .map(|(k, v)| (k.clone(), json_to_qdrant(v)))
                .collect(),
        }),
    };

    QdrantValue { kind: Some(kind) }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        // Mongo extended JSON: {"$oid": "..."}
        Value::Object(map) => match map.get("$oid") {
            Some(Value::String(s)) => Ok(s.clone()),
            _ => Err(serde::de::Error::custom("unsupported id object")),
        },
        other => Err(serde::de::Error::custom(format!(
            "unsupported id value: {}",
            other
        ))),
    }
}

fn lenient_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(name_from_value(Value::deserialize(deserializer)?))
}
