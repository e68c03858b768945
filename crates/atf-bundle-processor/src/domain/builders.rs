//! Builders for outgoing headers and message bundles.

use shared_types::{
    new_resource_id, uuid_locator, Bundle, BundleEntry, BundleType, Coding, Identifier, Meta,
    MessageDestination, MessageHeader, MessageSource, Reference, Resource, BUNDLE_PROFILE,
    MESSAGE_HEADER_PROFILE, URI_IDENTIFIER_SYSTEM,
};

/// Builds an ATF `MessageHeader`.
#[derive(Debug, Clone)]
pub struct MessageHeaderBuilder {
    id: Option<String>,
    event: Coding,
    sender: Option<Reference>,
    source: Option<MessageSource>,
    destination: Vec<MessageDestination>,
    focus: Vec<Reference>,
}

impl MessageHeaderBuilder {
    pub fn new(event: Coding) -> Self {
        Self {
            id: None,
            event,
            sender: None,
            source: None,
            destination: Vec::new(),
            focus: Vec::new(),
        }
    }

    /// Use a fixed id instead of a fresh one.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn sender(mut self, sender: Reference) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn source(mut self, source: MessageSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn destination(mut self, endpoint_url: impl Into<String>, receiver: Reference) -> Self {
        self.destination.push(MessageDestination {
            endpoint_url: Some(endpoint_url.into()),
            receiver: Some(receiver),
        });
        self
    }

    /// Point the focus at the entry holding the resource with this id.
    pub fn focus(mut self, resource_id: &str) -> Self {
        self.focus.push(Reference::to_entry(resource_id));
        self
    }

    pub fn build(self) -> MessageHeader {
        MessageHeader {
            id: Some(self.id.unwrap_or_else(new_resource_id)),
            meta: Some(Meta::with_profile(MESSAGE_HEADER_PROFILE)),
            event_coding: Some(self.event),
            destination: self.destination,
            sender: self.sender,
            source: self.source,
            focus: self.focus,
        }
    }
}

/// Builds an ATF message bundle: header entry first, then the payload.
#[derive(Debug, Clone)]
pub struct MessageBundleBuilder {
    id: Option<String>,
    header: MessageHeader,
    payload: Vec<Resource>,
}

impl MessageBundleBuilder {
    pub fn new(header: MessageHeader) -> Self {
        Self {
            id: None,
            header,
            payload: Vec::new(),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn payload(mut self, resource: Resource) -> Self {
        self.payload.push(resource);
        self
    }

    pub fn build(self) -> Bundle {
        let id = self.id.unwrap_or_else(new_resource_id);

        let mut entry = Vec::with_capacity(self.payload.len() + 1);
        entry.push(BundleEntry::for_resource(Resource::MessageHeader(self.header)));
        entry.extend(self.payload.into_iter().map(BundleEntry::for_resource));

        Bundle {
            meta: Some(Meta::with_profile(BUNDLE_PROFILE)),
            bundle_type: Some(BundleType::Message),
            identifier: Some(Identifier::new(URI_IDENTIFIER_SYSTEM, uuid_locator(&id))),
            id: Some(id),
            timestamp: None,
            entry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Communication, SELF_TEST_DELIVERY_CODE, SERVICE_IDENTIFIER_CS};

    fn header() -> MessageHeader {
        MessageHeaderBuilder::new(Coding::new(SERVICE_IDENTIFIER_CS, SELF_TEST_DELIVERY_CODE, "x"))
            .sender(Reference::participant("a@kim.de", "A"))
            .source(MessageSource::endpoint("https://a.example.com"))
            .destination("https://b.example.com", Reference::participant("b@kim.de", "B"))
            .focus("c-1")
            .build()
    }

    #[test]
    fn test_header_builder() {
        let header = header();
        assert!(header.id.is_some());
        assert_eq!(
            header.meta.as_ref().and_then(Meta::primary_profile),
            Some(MESSAGE_HEADER_PROFILE)
        );
        assert_eq!(header.focus_locators().collect::<Vec<_>>(), vec!["urn:uuid:c-1"]);
        assert_eq!(header.destination[0].receiver.as_ref().and_then(Reference::address), Some("b@kim.de"));
    }

    #[test]
    fn test_bundle_header_first_then_payload() {
        let header = header();
        let header_id = header.id.clone().unwrap();
        let bundle = MessageBundleBuilder::new(header)
            .id("b-1")
            .payload(Resource::Communication(Communication {
                id: Some("c-1".into()),
                ..Default::default()
            }))
            .build();

        assert_eq!(bundle.primary_profile(), Some(BUNDLE_PROFILE));
        assert_eq!(bundle.bundle_type, Some(BundleType::Message));
        assert_eq!(
            bundle.identifier,
            Some(Identifier::new(URI_IDENTIFIER_SYSTEM, "urn:uuid:b-1"))
        );
        assert_eq!(bundle.entry[0].full_url, Some(uuid_locator(&header_id)));
        assert_eq!(bundle.entry[1].full_url.as_deref(), Some("urn:uuid:c-1"));
        assert!(bundle.resolve("urn:uuid:c-1").is_some());
    }

    #[test]
    fn test_fresh_ids() {
        let a = MessageBundleBuilder::new(header()).build();
        let b = MessageBundleBuilder::new(header()).build();
        assert_ne!(a.id, b.id);
    }
}
