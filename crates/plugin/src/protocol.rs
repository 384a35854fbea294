//! Line-delimited JSON messages exchanged with the host over stdio.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::diag::Diagnostics;
use crate::schema::ProviderSchema;

/// Prefix of the handshake line written before any response.
pub const HANDSHAKE_PREFIX: &str = "TFREDIS_PLUGIN";

/// Version of the line protocol.
pub const PROTOCOL_VERSION: u32 = 1;

/// The handshake line announcing the protocol to the host.
pub fn handshake() -> String {
    format!("{HANDSHAKE_PREFIX}|{PROTOCOL_VERSION}|stdio")
}

/// One request line. The `id` is echoed back in the matching [`Response`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Request {
    pub id: u64,
    #[serde(flatten)]
    pub op: Operation,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Schema,
    Configure {
        #[serde(default)]
        config: Map<String, Value>,
    },
    Create {
        type_name: String,
        #[serde(default)]
        config: Map<String, Value>,
    },
    Read {
        type_name: String,
        state: Map<String, Value>,
    },
    Update {
        type_name: String,
        prior: Map<String, Value>,
        #[serde(default)]
        planned: Map<String, Value>,
    },
    Delete {
        type_name: String,
        state: Map<String, Value>,
    },
    Import {
        type_name: String,
        import_id: String,
    },
    ReadDataSource {
        type_name: String,
        #[serde(default)]
        config: Map<String, Value>,
    },
    Stop,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Configure { .. } => "configure",
            Self::Create { .. } => "create",
            Self::Read { .. } => "read",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::Import { .. } => "import",
            Self::ReadDataSource { .. } => "read_data_source",
            Self::Stop => "stop",
        }
    }
}

/// One response line.
///
/// `state` is `Some(Value::Null)` when the instance no longer exists, and
/// absent for operations that return no state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<ProviderSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub states: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Diagnostics::is_empty")]
    pub diagnostics: Diagnostics,
}

impl Response {
    /// An empty success response.
    pub fn ok(id: u64) -> Self {
        Self {
            id,
            schema: None,
            state: None,
            states: None,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn failed(id: u64, diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            ..Self::ok(id)
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: ProviderSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }

    #[must_use]
    pub fn with_states(mut self, states: Vec<Value>) -> Self {
        self.states = Some(states);
        self
    }
}
