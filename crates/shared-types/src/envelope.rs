//! # Bundle Envelope
//!
//! The universal wrapper for ATF messages.
//!
//! ## Structure
//!
//! - **Profile**: `meta.profile[0]` identifies the protocol family.
//! - **Entries**: ordered; each holds one resource and a `urn:uuid:` locator
//!   (`fullUrl`) used for cross-references inside the same bundle.
//! - **Header**: exactly one entry carries the `MessageHeader`.
//!
//! Resources are polymorphic on `resourceType`. Types this crate does not model
//! are kept verbatim in [`Resource::Other`] so that a bundle can be parsed,
//! inspected and re-serialized without loss.

use serde::{ser, Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::communication::Communication;
use crate::constants::{locator_id, uuid_locator};
use crate::entities::{Identifier, Meta};
use crate::errors::ResourceError;
use crate::header::MessageHeader;
use crate::outcome::OperationOutcome;

/// Bundle type (FHIR `bundle-type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundleType {
    Document,
    Message,
    Transaction,
    TransactionResponse,
    Batch,
    BatchResponse,
    History,
    Searchset,
    Collection,
}

/// Any resource that can sit in a bundle entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum Resource {
    MessageHeader(MessageHeader),
    OperationOutcome(OperationOutcome),
    Communication(Communication),
    /// A resource type without a typed model, kept as raw JSON.
    Other {
        resource_type: String,
        content: Value,
    },
}

impl Resource {
    pub fn resource_type(&self) -> &str {
        match self {
            Self::MessageHeader(_) => "MessageHeader",
            Self::OperationOutcome(_) => "OperationOutcome",
            Self::Communication(_) => "Communication",
            Self::Other { resource_type, .. } => resource_type,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::MessageHeader(r) => r.id.as_deref(),
            Self::OperationOutcome(r) => r.id.as_deref(),
            Self::Communication(r) => r.id.as_deref(),
            Self::Other { content, .. } => content.get("id").and_then(Value::as_str),
        }
    }

    pub fn as_message_header(&self) -> Option<&MessageHeader> {
        match self {
            Self::MessageHeader(header) => Some(header),
            _ => None,
        }
    }

    pub fn as_operation_outcome(&self) -> Option<&OperationOutcome> {
        match self {
            Self::OperationOutcome(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn as_communication(&self) -> Option<&Communication> {
        match self {
            Self::Communication(communication) => Some(communication),
            _ => None,
        }
    }
}

impl TryFrom<Value> for Resource {
    type Error = ResourceError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let resource_type = value
            .get("resourceType")
            .and_then(Value::as_str)
            .ok_or(ResourceError::MissingResourceType)?
            .to_string();

        let invalid = |e: serde_json::Error| ResourceError::InvalidResource {
            resource_type: resource_type.clone(),
            reason: e.to_string(),
        };

        match resource_type.as_str() {
            "MessageHeader" => serde_json::from_value(value)
                .map(Resource::MessageHeader)
                .map_err(invalid),
            "OperationOutcome" => serde_json::from_value(value)
                .map(Resource::OperationOutcome)
                .map_err(invalid),
            "Communication" => serde_json::from_value(value)
                .map(Resource::Communication)
                .map_err(invalid),
            _ => Ok(Resource::Other {
                resource_type: resource_type.clone(),
                content: value,
            }),
        }
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = match self {
            Self::MessageHeader(r) => tagged_value("MessageHeader", r),
            Self::OperationOutcome(r) => tagged_value("OperationOutcome", r),
            Self::Communication(r) => tagged_value("Communication", r),
            Self::Other { content, .. } => return content.serialize(serializer),
        };
        value
            .map_err(<S::Error as ser::Error>::custom)?
            .serialize(serializer)
    }
}

/// Serializes a typed resource and stamps its `resourceType`.
fn tagged_value<T: Serialize>(resource_type: &str, resource: &T) -> Result<Value, ResourceError> {
    let mut value = serde_json::to_value(resource)?;
    if let Value::Object(map) = &mut value {
        map.insert(
            "resourceType".to_string(),
            Value::String(resource_type.to_string()),
        );
    }
    Ok(value)
}

/// One entry of a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    /// Locator of the entry (`urn:uuid:<id>`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
}

impl BundleEntry {
    /// An entry whose locator is derived from the resource id.
    pub fn for_resource(resource: Resource) -> Self {
        Self {
            full_url: resource.id().map(uuid_locator),
            resource: Some(resource),
        }
    }
}

/// An ATF message bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub bundle_type: Option<BundleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub entry: Vec<BundleEntry>,
}

impl Bundle {
    pub const RESOURCE_TYPE: &'static str = "Bundle";

    /// Parses a bundle from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ResourceError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    /// Parses a bundle from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ResourceError> {
        Self::from_slice(json.as_bytes())
    }

    /// Parses a bundle from an already decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self, ResourceError> {
        let found = value
            .get("resourceType")
            .and_then(Value::as_str)
            .ok_or(ResourceError::MissingResourceType)?;
        if found != Self::RESOURCE_TYPE {
            return Err(ResourceError::UnexpectedResourceType {
                expected: Self::RESOURCE_TYPE.to_string(),
                found: found.to_string(),
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    /// The bundle as a JSON value, including `resourceType`.
    pub fn to_value(&self) -> Result<Value, ResourceError> {
        tagged_value(Self::RESOURCE_TYPE, self)
    }

    /// Pretty-printed JSON, as handed to a transport.
    pub fn to_json_pretty(&self) -> Result<String, ResourceError> {
        Ok(serde_json::to_string_pretty(&self.to_value()?)?)
    }

    /// The first declared profile.
    #[must_use]
    pub fn primary_profile(&self) -> Option<&str> {
        self.meta.as_ref().and_then(Meta::primary_profile)
    }

    /// All resources of the bundle, in entry order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.entry.iter().filter_map(|entry| entry.resource.as_ref())
    }

    /// All `MessageHeader` resources, in entry order.
    pub fn message_headers(&self) -> impl Iterator<Item = &MessageHeader> {
        self.resources().filter_map(Resource::as_message_header)
    }

    /// Resolves a locator against the entries of this bundle.
    ///
    /// An entry matches when its `fullUrl` equals the locator, or when its
    /// resource id equals the locator with the `urn:uuid:` prefix removed.
    #[must_use]
    pub fn resolve(&self, locator: &str) -> Option<&BundleEntry> {
        self.entry
            .iter()
            .find(|entry| entry.full_url.as_deref() == Some(locator))
            .or_else(|| {
                let id = locator_id(locator);
                self.entry.iter().find(|entry| {
                    entry
                        .resource
                        .as_ref()
                        .and_then(Resource::id)
                        .is_some_and(|resource_id| resource_id == id)
                })
            })
    }
}
