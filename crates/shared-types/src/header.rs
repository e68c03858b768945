//! # MessageHeader
//!
//! The routing header of an ATF message bundle. Its `id` doubles as the
//! correlation key that receipts echo back.

use serde::{Deserialize, Serialize};

use crate::entities::{Coding, Meta, Reference};

/// Where a message is sent to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDestination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Reference>,
}

/// Where a message originated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
}

impl MessageSource {
    pub fn endpoint(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: Some(endpoint_url.into()),
        }
    }
}

/// The header resource of a message bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    /// The use case this message requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_coding: Option<Coding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destination: Vec<MessageDestination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<MessageSource>,
    /// Locators of the entries that carry the operative payload.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub focus: Vec<Reference>,
}

impl MessageHeader {
    /// The endpoint the message was sent from.
    #[must_use]
    pub fn source_endpoint(&self) -> Option<&str> {
        self.source
            .as_ref()
            .and_then(|source| source.endpoint_url.as_deref())
            .filter(|url| !url.is_empty())
    }

    /// The sender's address (`sender.identifier.value`).
    #[must_use]
    pub fn sender_address(&self) -> Option<&str> {
        self.sender.as_ref().and_then(Reference::address)
    }

    /// Literal focus locators, in declaration order.
    pub fn focus_locators(&self) -> impl Iterator<Item = &str> {
        self.focus
            .iter()
            .filter_map(|reference| reference.reference.as_deref())
    }
}
