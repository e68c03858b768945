//! # Core Datatypes
//!
//! The small FHIR datatypes shared by every ATF resource.
//!
//! ## Clusters
//!
//! - **Identity**: `Identifier`, `Reference`
//! - **Terminology**: `Coding`, `CodeableConcept`
//! - **Metadata**: `Meta`, `Extension`
//! - **Content**: `Attachment`
//!
//! All fields use the FHIR JSON names (camelCase). Absent optional fields are
//! omitted on serialization so that documents round-trip without `null`s.

use serde::{Deserialize, Serialize};

use crate::constants::{uuid_locator, KIM_ADDRESS_SYSTEM};

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A business identifier (system + value).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Identifier {
    pub fn new(system: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            value: Some(value.into()),
        }
    }
}

/// A reference to another resource or participant.
///
/// ATF uses three shapes: a literal `reference` (a `urn:uuid:` locator for
/// focus entries), an `identifier` (the KIM address of a participant) and a
/// human-readable `display`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    /// A participant reference identified by its KIM address.
    pub fn participant(address: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            reference: None,
            identifier: Some(Identifier::new(KIM_ADDRESS_SYSTEM, address)),
            display: Some(display.into()),
        }
    }

    /// A literal reference to the entry with the given resource id.
    pub fn to_entry(resource_id: &str) -> Self {
        Self {
            reference: Some(uuid_locator(resource_id)),
            identifier: None,
            display: None,
        }
    }

    /// A display-only reference.
    pub fn display_only(display: impl Into<String>) -> Self {
        Self {
            reference: None,
            identifier: None,
            display: Some(display.into()),
        }
    }

    /// The participant address carried in `identifier.value`.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.identifier
            .as_ref()
            .and_then(|identifier| identifier.value.as_deref())
            .filter(|value| !value.is_empty())
    }
}

// =============================================================================
// CLUSTER B: TERMINOLOGY
// =============================================================================

/// A code from a code system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    pub fn new(
        system: impl Into<String>,
        code: impl Into<String>,
        display: impl Into<String>,
    ) -> Self {
        Self {
            system: Some(system.into()),
            code: Some(code.into()),
            display: Some(display.into()),
        }
    }
}

/// A concept expressed as one or more codings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,
}

// =============================================================================
// CLUSTER C: METADATA
// =============================================================================

/// Resource metadata. ATF only uses `profile`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profile: Vec<String>,
}

impl Meta {
    pub fn with_profile(profile: impl Into<String>) -> Self {
        Self {
            profile: vec![profile.into()],
        }
    }

    /// The first declared profile, which ATF treats as authoritative.
    #[must_use]
    pub fn primary_profile(&self) -> Option<&str> {
        self.profile.first().map(String::as_str)
    }
}

/// A string-valued extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,
}

impl Extension {
    pub fn string(url: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            value_string: Some(value.into()),
        }
    }
}

// =============================================================================
// CLUSTER D: CONTENT
// =============================================================================

/// Inline content with its media type. `data` is base64.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_address() {
        let sender = Reference::participant("sender@gematik.kim.de", "Sender");
        assert_eq!(sender.address(), Some("sender@gematik.kim.de"));
        assert_eq!(
            sender.identifier.as_ref().and_then(|i| i.system.as_deref()),
            Some(KIM_ADDRESS_SYSTEM)
        );
    }

    #[test]
    fn test_empty_address_is_absent() {
        let reference = Reference {
            identifier: Some(Identifier::new(KIM_ADDRESS_SYSTEM, "")),
            ..Default::default()
        };
        assert_eq!(reference.address(), None);
        assert_eq!(Reference::display_only("Max").address(), None);
    }

    #[test]
    fn test_entry_reference_uses_urn_uuid() {
        let reference = Reference::to_entry("abc");
        assert_eq!(reference.reference.as_deref(), Some("urn:uuid:abc"));
    }

    #[test]
    fn test_extension_serializes_camel_case() {
        let ext = Extension::string("http://example.org/ext", "42");
        let json = serde_json::to_value(&ext).unwrap();
        assert_eq!(json["valueString"], "42");
        assert_eq!(json["url"], "http://example.org/ext");
    }

    #[test]
    fn test_meta_primary_profile() {
        let meta = Meta {
            profile: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(meta.primary_profile(), Some("a"));
        assert_eq!(Meta::default().primary_profile(), None);
    }
}
