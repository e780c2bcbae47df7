use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Occupancy value the root listing filters on.
pub const AVAILABLE: &str = "available";

/// One record of the upstream areas dataset.
///
/// Only the fields the service filters on are typed; everything else the
/// upstream sends is carried in `extra` and written back out unchanged.
/// A missing or null name or occupancy reads as an empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub area_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub area_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub occupancy: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Area {
    pub fn is_available(&self) -> bool {
        self.occupancy == AVAILABLE
    }

    /// The record as a JSON object, field order preserved.
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("area_id".to_string(), Value::from(self.area_id));
        object.insert("area_name".to_string(), Value::from(self.area_name.clone()));
        object.insert("occupancy".to_string(), Value::from(self.occupancy.clone()));
        for (key, value) in &self.extra {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }
}

/// The upstream payload: `{"data": [...]}`. Other top-level keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub data: Vec<Area>,
}

impl Dataset {
    pub fn new(data: Vec<Area>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn available_names(&self) -> Vec<String> {
        self.data
            .iter()
            .filter(|area| area.is_available())
            .map(|area| area.area_name.clone())
            .collect()
    }

    pub fn by_id(&self, area_id: i64) -> Vec<Area> {
        self.data
            .iter()
            .filter(|area| area.area_id == area_id)
            .cloned()
            .collect()
    }

    /// All records as JSON objects, the shape scripts see as `areas`.
    pub fn to_rows(&self) -> Value {
        Value::Array(self.data.iter().map(Area::to_value).collect())
    }
}
