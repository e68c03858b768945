//! Envelope parsing and pre-dispatch validation.
//!
//! Checks, in order:
//! 1. the document decodes as a `Bundle`
//! 2. `meta.profile[0]` is the ATF bundle profile
//! 3. exactly one entry holds a `MessageHeader`
//! 4. that header has an id and a complete `eventCoding`

use shared_types::{Bundle, MessageHeader, BUNDLE_PROFILE};

use super::errors::EnvelopeError;
use super::value_objects::UseCaseCode;

/// A bundle that passed validation, with its header located.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEnvelope {
    bundle: Bundle,
    header: MessageHeader,
    use_case: UseCaseCode,
}

impl ValidatedEnvelope {
    #[must_use]
    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    #[must_use]
    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    /// The header id, used as correlation key.
    #[must_use]
    pub fn message_id(&self) -> &str {
        self.header().id.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn use_case(&self) -> &UseCaseCode {
        &self.use_case
    }

    pub fn into_bundle(self) -> Bundle {
        self.bundle
    }
}

/// Turns raw documents into [`ValidatedEnvelope`]s.
#[derive(Debug, Clone)]
pub struct EnvelopeValidator {
    expected_profile: String,
}

impl Default for EnvelopeValidator {
    fn default() -> Self {
        Self::new(BUNDLE_PROFILE)
    }
}

impl EnvelopeValidator {
    pub fn new(expected_profile: impl Into<String>) -> Self {
        Self {
            expected_profile: expected_profile.into(),
        }
    }

    #[must_use]
    pub fn expected_profile(&self) -> &str {
        &self.expected_profile
    }

    /// Parse and validate raw JSON bytes.
    pub fn parse_slice(&self, bytes: &[u8]) -> Result<ValidatedEnvelope, EnvelopeError> {
        let bundle = Bundle::from_slice(bytes)?;
        self.validate(bundle)
    }

    /// Parse and validate a JSON string.
    pub fn parse_str(&self, json: &str) -> Result<ValidatedEnvelope, EnvelopeError> {
        self.parse_slice(json.as_bytes())
    }

    /// Validate an already typed bundle.
    pub fn validate(&self, bundle: Bundle) -> Result<ValidatedEnvelope, EnvelopeError> {
        match bundle.primary_profile() {
            Some(profile) if profile == self.expected_profile => {}
            found => {
                return Err(EnvelopeError::UnsupportedProfile {
                    found: found.map(str::to_string),
                })
            }
        }

        let mut header_positions = bundle.entry.iter().enumerate().filter(|(_, entry)| {
            entry
                .resource
                .as_ref()
                .is_some_and(|resource| resource.as_message_header().is_some())
        });

        let (header_index, _) = header_positions.next().ok_or(EnvelopeError::MissingHeader)?;
        if header_positions.next().is_some() {
            return Err(EnvelopeError::malformed(
                "envelope contains more than one MessageHeader",
            ));
        }

        let header = bundle.entry[header_index]
            .resource
            .as_ref()
            .and_then(|resource| resource.as_message_header())
            .cloned()
            .ok_or(EnvelopeError::MissingHeader)?;

        if header.id.as_deref().map_or(true, str::is_empty) {
            return Err(EnvelopeError::malformed("MessageHeader has no id"));
        }

        let use_case = UseCaseCode::from_header(&header).ok_or_else(|| {
            EnvelopeError::malformed("MessageHeader.eventCoding needs a system and a code")
        })?;

        Ok(ValidatedEnvelope {
            bundle,
            header,
            use_case,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use shared_types::{SELF_TEST_DELIVERY_CODE, SERVICE_IDENTIFIER_CS};

    fn envelope() -> Value {
        json!({
            "resourceType": "Bundle",
            "id": "b-1",
            "meta": {"profile": [BUNDLE_PROFILE]},
            "type": "message",
            "entry": [
                {
                    "fullUrl": "urn:uuid:h-1",
                    "resource": {
                        "resourceType": "MessageHeader",
                        "id": "h-1",
                        "eventCoding": {"system": SERVICE_IDENTIFIER_CS, "code": SELF_TEST_DELIVERY_CODE},
                        "focus": [{"reference": "urn:uuid:c-1"}]
                    }
                },
                {
                    "fullUrl": "urn:uuid:c-1",
                    "resource": {"resourceType": "Communication", "id": "c-1"}
                }
            ]
        })
    }

    fn parse(value: &Value) -> Result<ValidatedEnvelope, EnvelopeError> {
        EnvelopeValidator::default().parse_str(&value.to_string())
    }

    #[test]
    fn test_valid_envelope() {
        let envelope = parse(&envelope()).unwrap();
        assert_eq!(envelope.message_id(), "h-1");
        assert_eq!(
            envelope.use_case(),
            &UseCaseCode::new(SERVICE_IDENTIFIER_CS, SELF_TEST_DELIVERY_CODE)
        );
        assert_eq!(envelope.bundle().entry.len(), 2);
    }

    #[test]
    fn test_header_need_not_be_first() {
        let mut value = envelope();
        let entries = value["entry"].as_array_mut().unwrap();
        entries.reverse();
        assert_eq!(parse(&value).unwrap().message_id(), "h-1");
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = EnvelopeValidator::default().parse_str("{\"resourceType\":").unwrap_err();
        assert_eq!(err.reason_label(), "malformed");
    }

    #[test]
    fn test_profile_must_match_exactly() {
        let mut value = envelope();
        value["meta"]["profile"] = json!([format!("{BUNDLE_PROFILE}|1.0")]);
        assert!(matches!(
            parse(&value),
            Err(EnvelopeError::UnsupportedProfile { found: Some(_) })
        ));

        value["meta"] = json!({});
        assert_eq!(
            parse(&value).unwrap_err(),
            EnvelopeError::UnsupportedProfile { found: None }
        );
    }

    #[test]
    fn test_only_first_profile_counts() {
        let mut value = envelope();
        value["meta"]["profile"] = json!(["http://example.org/other", BUNDLE_PROFILE]);
        assert!(matches!(
            parse(&value),
            Err(EnvelopeError::UnsupportedProfile { .. })
        ));
    }

    #[test]
    fn test_missing_header() {
        let mut value = envelope();
        value["entry"].as_array_mut().unwrap().remove(0);
        assert_eq!(parse(&value).unwrap_err(), EnvelopeError::MissingHeader);
    }

    #[test]
    fn test_duplicate_header_is_malformed() {
        let mut value = envelope();
        let header = value["entry"][0].clone();
        value["entry"].as_array_mut().unwrap().push(header);
        assert!(matches!(
            parse(&value),
            Err(EnvelopeError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn test_incomplete_event_coding_is_malformed() {
        let mut value = envelope();
        value["entry"][0]["resource"]["eventCoding"] = json!({"system": SERVICE_IDENTIFIER_CS});
        assert!(matches!(
            parse(&value),
            Err(EnvelopeError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn test_header_without_id_is_malformed() {
        let mut value = envelope();
        value["entry"][0]["resource"]
            .as_object_mut()
            .unwrap()
            .remove("id");
        assert!(matches!(
            parse(&value),
            Err(EnvelopeError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn test_custom_profile() {
        let validator = EnvelopeValidator::new("http://example.org/profile");
        assert_eq!(validator.expected_profile(), "http://example.org/profile");
        assert!(validator.parse_str(&envelope().to_string()).is_err());
    }
}
