//! # Protocol Constants
//!
//! Wire-format contracts shared with every ATF peer. These strings are
//! compared byte-for-byte by remote implementations and MUST NOT change.

// =============================================================================
// STRUCTURE DEFINITIONS (meta.profile)
// =============================================================================

/// Profile every ATF message bundle carries in `meta.profile`.
pub const BUNDLE_PROFILE: &str =
    "https://gematik.de/fhir/atf/StructureDefinition/bundle-app-transport-framework";

/// Profile of the ATF `MessageHeader`.
pub const MESSAGE_HEADER_PROFILE: &str =
    "https://gematik.de/fhir/atf/StructureDefinition/message-header-app-transport";

/// Profile of the ATF `OperationOutcome` used in receipts.
pub const OPERATION_OUTCOME_PROFILE: &str =
    "https://gematik.de/fhir/atf/StructureDefinition/atf-operation-outcome";

/// Extension carrying the id of the `MessageHeader` a receipt answers.
pub const MESSAGE_ID_EXTENSION: &str =
    "https://gematik.de/fhir/atf/StructureDefinition/atf-message-id-ex";

// =============================================================================
// CODE SYSTEMS AND USE CASES (MessageHeader.eventCoding)
// =============================================================================

/// Code system for transport-level operations.
pub const OPERATION_IDENTIFIER_CS: &str =
    "https://gematik.de/fhir/atf/CodeSystem/operation-identifier-cs";

/// Code system for application services.
pub const SERVICE_IDENTIFIER_CS: &str =
    "https://gematik.de/fhir/atf/CodeSystem/service-identifier-cs";

/// Receipt acknowledgment operation.
pub const RECEIPT_ACKNOWLEDGMENT_CODE: &str = "atf;Empfangsbestaetigung";

/// Display text for [`RECEIPT_ACKNOWLEDGMENT_CODE`].
pub const RECEIPT_ACKNOWLEDGMENT_DISPLAY: &str =
    "Empfangsbestätigung und Auskunft über FHIR Interpretierbarkeit der Nachricht";

/// Self-test delivery service.
pub const SELF_TEST_DELIVERY_CODE: &str = "Selbsttest;Lieferung";

/// Display text for [`SELF_TEST_DELIVERY_CODE`].
pub const SELF_TEST_DELIVERY_DISPLAY: &str = "Diese Dienstkennung dient ausschließlich der Einrichtung des Kontos innerhalb eines PVS und des Testes, ob Nachrichten versendet und empfangen werden können. Diese Dienstkennung wird im PVS bei der normalen Abholung von Nachrichten ignoriert.";

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier system for KIM mail addresses.
pub const KIM_ADDRESS_SYSTEM: &str = "http://gematik.de/fhir/sid/KIM-Adresse";

/// Identifier system for bundle identifiers.
pub const URI_IDENTIFIER_SYSTEM: &str = "urn:ietf:rfc:3986";

/// Prefix of every entry locator (`fullUrl`).
pub const URN_UUID_PREFIX: &str = "urn:uuid:";

/// LOINC code system.
pub const LOINC_SYSTEM: &str = "http://loinc.org";

/// Builds the `urn:uuid:` locator for a resource id.
pub fn uuid_locator(id: &str) -> String {
    format!("{URN_UUID_PREFIX}{id}")
}

/// Returns the id part of a locator, or the input when it has no `urn:uuid:` prefix.
pub fn locator_id(locator: &str) -> &str {
    locator.strip_prefix(URN_UUID_PREFIX).unwrap_or(locator)
}

/// Generates a fresh resource id.
pub fn new_resource_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_roundtrip() {
        let id = new_resource_id();
        let locator = uuid_locator(&id);
        assert!(locator.starts_with("urn:uuid:"));
        assert_eq!(locator_id(&locator), id);
    }

    #[test]
    fn test_locator_id_without_prefix() {
        assert_eq!(locator_id("Communication/123"), "Communication/123");
    }

    #[test]
    fn test_use_case_codes_are_exact() {
        assert_eq!(RECEIPT_ACKNOWLEDGMENT_CODE, "atf;Empfangsbestaetigung");
        assert_eq!(SELF_TEST_DELIVERY_CODE, "Selbsttest;Lieferung");
        assert!(OPERATION_IDENTIFIER_CS.ends_with("/operation-identifier-cs"));
        assert!(SERVICE_IDENTIFIER_CS.ends_with("/service-identifier-cs"));
    }
}
