use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::data::{ID_ATTRIBUTE, ResourceData};
use crate::diag::{Diagnostic, Diagnostics};

/// Primitive type of a schema attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Int,
    Bool,
}

impl AttributeType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Int => value.is_i64() || value.is_u64(),
            Self::Bool => value.is_boolean(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Bool => "bool",
        }
    }
}

/// Declaration of one attribute of a provider, resource or data source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub ty: AttributeType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    /// Changing this attribute replaces the instance instead of updating it.
    pub force_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Attribute {
    fn base(ty: AttributeType) -> Self {
        Self {
            ty,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            default: None,
            description: None,
        }
    }

    pub fn required(ty: AttributeType) -> Self {
        Self {
            required: true,
            ..Self::base(ty)
        }
    }

    pub fn optional(ty: AttributeType) -> Self {
        Self {
            optional: true,
            ..Self::base(ty)
        }
    }

    /// An attribute only ever set by the handler, never by configuration.
    pub fn computed(ty: AttributeType) -> Self {
        Self {
            computed: true,
            ..Self::base(ty)
        }
    }

    pub fn required_string() -> Self {
        Self::required(AttributeType::String)
    }

    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    #[must_use]
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn is_configurable(&self) -> bool {
        self.required || self.optional
    }
}

/// The attribute set of a provider, resource type or data source type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    pub attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Decode user configuration into a fresh, untracked [`ResourceData`].
    ///
    /// Rejects unknown attributes, values for computed-only attributes, type
    /// mismatches and missing required attributes. Defaults are filled in for
    /// optional attributes left unset.
    pub fn decode_config(&self, config: &Map<String, Value>) -> Result<ResourceData, Diagnostics> {
        let mut diags = Diagnostics::new();
        let mut values = Map::new();

        for (name, value) in config {
            if value.is_null() {
                continue;
            }
            let Some(attribute) = self.attributes.get(name) else {
                diags.push(Diagnostic::error("unsupported attribute").with_attribute(name));
                continue;
            };
            if !attribute.is_configurable() {
                diags.push(
                    Diagnostic::error("attribute is computed and cannot be configured")
                        .with_attribute(name),
                );
                continue;
            }
            if let Some(diag) = check_type(name, attribute, value) {
                diags.push(diag);
                continue;
            }
            values.insert(name.clone(), value.clone());
        }

        for (name, attribute) in &self.attributes {
            if attribute.required && !values.contains_key(name) {
                diags.push(Diagnostic::error("missing required attribute").with_attribute(name));
            }
        }

        diags.into_result()?;
        self.fill_defaults(&mut values);
        Ok(ResourceData::from_parts(None, values))
    }

    /// Decode previously persisted state. The state must carry a non-empty
    /// `id`; computed attributes are accepted.
    pub fn decode_state(&self, state: &Map<String, Value>) -> Result<ResourceData, Diagnostics> {
        let mut diags = Diagnostics::new();
        let mut values = Map::new();
        let mut id = None;

        for (name, value) in state {
            if name == ID_ATTRIBUTE {
                match value.as_str() {
                    Some(s) if !s.is_empty() => id = Some(s.to_owned()),
                    _ => diags.push(
                        Diagnostic::error("state id must be a non-empty string")
                            .with_attribute(ID_ATTRIBUTE),
                    ),
                }
                continue;
            }
            if value.is_null() {
                continue;
            }
            let Some(attribute) = self.attributes.get(name) else {
                diags.push(Diagnostic::error("unsupported attribute").with_attribute(name));
                continue;
            };
            if let Some(diag) = check_type(name, attribute, value) {
                diags.push(diag);
                continue;
            }
            values.insert(name.clone(), value.clone());
        }

        if id.is_none() && !diags.has_errors() {
            diags.push(Diagnostic::error("state has no id").with_attribute(ID_ATTRIBUTE));
        }

        diags.into_result()?;
        self.fill_defaults(&mut values);
        Ok(ResourceData::from_parts(id, values))
    }

    /// A tracked instance holding nothing but its identity and defaults, as
    /// handed to an import handler.
    pub fn new_tracked(&self, id: impl Into<String>) -> ResourceData {
        let mut values = Map::new();
        self.fill_defaults(&mut values);
        let mut data = ResourceData::from_parts(None, values);
        data.set_id(id);
        data
    }

    /// Whether moving from `prior` to `planned` changes a force-new attribute.
    pub fn requires_replacement(&self, prior: &ResourceData, planned: &ResourceData) -> bool {
        self.attributes
            .iter()
            .filter(|(_, attribute)| attribute.force_new)
            .any(|(name, _)| prior.get(name) != planned.get(name))
    }

    fn fill_defaults(&self, values: &mut Map<String, Value>) {
        for (name, attribute) in &self.attributes {
            if let Some(default) = &attribute.default {
                values
                    .entry(name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
    }
}

fn check_type(name: &str, attribute: &Attribute, value: &Value) -> Option<Diagnostic> {
    if attribute.ty.accepts(value) {
        return None;
    }
    Some(
        Diagnostic::error(format!("expected a {} value", attribute.ty.name()))
            .with_attribute(name)
            .with_detail(format!("got {value}")),
    )
}

/// The full schema surface a provider exposes to the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProviderSchema {
    pub provider: Schema,
    pub resources: BTreeMap<String, Schema>,
    pub data_sources: BTreeMap<String, Schema>,
}
