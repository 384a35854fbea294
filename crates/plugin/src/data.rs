use serde_json::{Map, Value};

/// Attribute name under which the tracked identity travels in serialized state.
pub const ID_ATTRIBUTE: &str = "id";

/// Per-operation view of one resource or data source instance.
///
/// Holds the declared and observed attribute values plus the tracked
/// identity. A handler signals that the instance no longer exists by
/// clearing the identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: Option<String>,
    values: Map<String, Value>,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty instance already tracked under `id`.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            values: Map::new(),
        }
    }

    pub(crate) fn from_parts(id: Option<String>, values: Map<String, Value>) -> Self {
        Self { id, values }
    }

    /// The tracked identity, or `None` if the instance is absent.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Set the tracked identity. An empty string clears it.
    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.id = if id.is_empty() { None } else { Some(id) };
    }

    /// Mark the instance as no longer existing.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn is_present(&self) -> bool {
        self.id.is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Serialize into the wire state: an object carrying `id` and every
    /// attribute, or `null` when the instance is absent.
    pub fn into_state(self) -> Value {
        match self.id {
            Some(id) => {
                let mut state = self.values;
                state.insert(ID_ATTRIBUTE.to_owned(), Value::String(id));
                Value::Object(state)
            }
            None => Value::Null,
        }
    }
}
