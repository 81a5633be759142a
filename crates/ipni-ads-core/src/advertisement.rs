//! Advertisement: a signed announcement that content is (or is no longer)
//! retrievable from a set of providers.
//!
//! An advertisement is validated once when built and is immutable afterwards.
//! Chaining means building a new advertisement whose `previous` is the CID of
//! the last exported record.

use cid::Cid;
use ciborium::value::Value;

use crate::canonical::{decode_dag_cbor, link_value, map_get, value_to_link};
use crate::crypto::{
    signature_payload, EnvelopeSigner, AD_SIGNATURE_CODEC, EXTENDED_PROVIDER_SIGNATURE_CODEC,
};
use crate::error::{CodecError, Result, ValidationError};
use crate::provider::Provider;
use crate::types::{Block, EntriesLink};
use crate::validation::validate_advertisement;

/// Flags that change how an advertisement is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvertisementOptions {
    /// Withdraw the content under the advertisement's context.
    pub remove: bool,
    /// Replace, rather than extend, chain-level extended providers for the
    /// advertisement's context.
    pub override_extended: bool,
}

/// A validated, unsigned advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    previous: Option<Cid>,
    providers: Vec<Provider>,
    entries: EntriesLink,
    context: Vec<u8>,
    remove: bool,
    override_extended: bool,
}

impl Advertisement {
    /// Build an advertisement from fully-known inputs.
    ///
    /// `previous` has no default: the first advertisement of a chain passes
    /// `None` explicitly.
    pub fn new(
        providers: Vec<Provider>,
        entries: EntriesLink,
        context: Vec<u8>,
        previous: Option<Cid>,
        options: AdvertisementOptions,
    ) -> std::result::Result<Self, ValidationError> {
        validate_advertisement(
            &providers,
            &context,
            options.remove,
            options.override_extended,
        )?;
        Ok(Self {
            previous,
            providers,
            entries,
            context,
            remove: options.remove,
            override_extended: options.override_extended,
        })
    }

    /// Start building an advertisement.
    pub fn builder(previous: Option<Cid>, entries: EntriesLink) -> AdvertisementBuilder {
        AdvertisementBuilder::new(previous, entries)
    }

    /// Announce additional providers for all content of the root provider,
    /// past and future. Carries no entries.
    pub fn extended_providers(
        providers: Vec<Provider>,
        previous: Option<Cid>,
    ) -> std::result::Result<Self, ValidationError> {
        Self::extended_providers_for_context(providers, Vec::new(), false, previous)
    }

    /// Announce additional providers for one context id, optionally replacing
    /// the chain-level set for that context.
    pub fn extended_providers_for_context(
        providers: Vec<Provider>,
        context: Vec<u8>,
        override_extended: bool,
        previous: Option<Cid>,
    ) -> std::result::Result<Self, ValidationError> {
        if providers.len() < 2 {
            return Err(ValidationError::NotEnoughProviders {
                count: providers.len(),
            });
        }
        Self::new(
            providers,
            EntriesLink::NoEntries,
            context,
            previous,
            AdvertisementOptions {
                remove: false,
                override_extended,
            },
        )
    }

    pub fn previous(&self) -> Option<&Cid> {
        self.previous.as_ref()
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    /// The provider whose identity appears at the top level of the record.
    pub fn root(&self) -> &Provider {
        // Validation guarantees at least one provider.
        &self.providers[0]
    }

    pub fn entries(&self) -> &EntriesLink {
        &self.entries
    }

    pub fn context(&self) -> &[u8] {
        &self.context
    }

    pub fn is_remove(&self) -> bool {
        self.remove
    }

    pub fn is_override(&self) -> bool {
        self.override_extended
    }

    /// Whether the encoded record carries an `ExtendedProvider` section.
    pub fn has_extended_providers(&self) -> bool {
        self.providers.len() > 1
    }

    /// Bytes the root provider signs.
    ///
    /// Order: previous link, entries link, root id, root joined addresses,
    /// root metadata, remove flag.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let root = self.root();
        let mut buf = Vec::new();
        if let Some(prev) = &self.previous {
            buf.extend_from_slice(&prev.to_bytes());
        }
        buf.extend_from_slice(&self.entries.to_bytes());
        buf.extend_from_slice(root.id_string().as_bytes());
        buf.extend_from_slice(root.joined_addresses().as_bytes());
        buf.extend_from_slice(root.encode_metadata());
        buf.push(u8::from(self.remove));
        buf
    }

    /// Sign and assemble the wire record.
    ///
    /// The root signature is sealed first, then one extended-provider
    /// signature per provider in declared order. The first signing failure
    /// aborts the whole call.
    pub fn encode_and_sign<S: EnvelopeSigner + ?Sized>(
        &self,
        signer: &S,
    ) -> Result<AdvertisementRecord> {
        let root = self.root();

        let payload = signature_payload(&self.signable_bytes())?;
        let signature = signer.seal(root.peer_id(), AD_SIGNATURE_CODEC, &payload)?;

        let extended_provider = if self.has_extended_providers() {
            let mut providers = Vec::with_capacity(self.providers.len());
            for p in &self.providers {
                let payload = signature_payload(&p.signable_bytes(self))?;
                let signature =
                    signer.seal(p.peer_id(), EXTENDED_PROVIDER_SIGNATURE_CODEC, &payload)?;
                providers.push(ProviderRecord {
                    id: p.id_string(),
                    addresses: p.address_strings(),
                    metadata: p.encode_metadata().to_vec(),
                    signature,
                });
            }
            Some(ExtendedProviderRecord {
                providers,
                override_extended: self.override_extended,
            })
        } else {
            None
        };

        Ok(AdvertisementRecord {
            previous: self.previous,
            provider: root.id_string(),
            addresses: root.address_strings(),
            signature,
            entries: self.entries.cid(),
            context: self.context.clone(),
            metadata: root.encode_metadata().to_vec(),
            is_rm: self.remove,
            extended_provider,
        })
    }
}

/// Builder for advertisements.
pub struct AdvertisementBuilder {
    previous: Option<Cid>,
    entries: EntriesLink,
    providers: Vec<Provider>,
    context: Vec<u8>,
    options: AdvertisementOptions,
}

impl AdvertisementBuilder {
    /// Start building. Both links are required up front.
    pub fn new(previous: Option<Cid>, entries: EntriesLink) -> Self {
        Self {
            previous,
            entries,
            providers: Vec::new(),
            context: Vec::new(),
            options: AdvertisementOptions::default(),
        }
    }

    /// Add a provider. The first one added is the root.
    pub fn provider(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Add several providers in order.
    pub fn providers(mut self, providers: impl IntoIterator<Item = Provider>) -> Self {
        self.providers.extend(providers);
        self
    }

    /// Set the context id.
    pub fn context(mut self, context: impl Into<Vec<u8>>) -> Self {
        self.context = context.into();
        self
    }

    /// Mark the content as removed.
    pub fn remove(mut self, remove: bool) -> Self {
        self.options.remove = remove;
        self
    }

    /// Replace chain-level extended providers for this context.
    pub fn override_extended(mut self, override_extended: bool) -> Self {
        self.options.override_extended = override_extended;
        self
    }

    /// Validate and build.
    pub fn build(self) -> std::result::Result<Advertisement, ValidationError> {
        Advertisement::new(
            self.providers,
            self.entries,
            self.context,
            self.previous,
            self.options,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire records
// ─────────────────────────────────────────────────────────────────────────────

/// One signed entry of an `ExtendedProvider` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRecord {
    pub id: String,
    pub addresses: Vec<String>,
    pub metadata: Vec<u8>,
    pub signature: Vec<u8>,
}

impl ProviderRecord {
    fn to_cbor_value(&self) -> Value {
        Value::Map(vec![
            (text("ID"), Value::Text(self.id.clone())),
            (text("Addresses"), text_array(&self.addresses)),
            (text("Metadata"), Value::Bytes(self.metadata.clone())),
            (text("Signature"), Value::Bytes(self.signature.clone())),
        ])
    }

    fn from_cbor_value(value: &Value) -> std::result::Result<Self, CodecError> {
        let map = as_map(value, "extended provider")?;
        Ok(Self {
            id: get_text(map, "ID")?,
            addresses: get_text_array(map, "Addresses")?,
            metadata: get_bytes(map, "Metadata")?,
            signature: get_bytes(map, "Signature")?,
        })
    }
}

/// The `ExtendedProvider` section of an advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedProviderRecord {
    pub providers: Vec<ProviderRecord>,
    pub override_extended: bool,
}

impl ExtendedProviderRecord {
    fn to_cbor_value(&self) -> Value {
        Value::Map(vec![
            (
                text("Providers"),
                Value::Array(self.providers.iter().map(ProviderRecord::to_cbor_value).collect()),
            ),
            (text("Override"), Value::Bool(self.override_extended)),
        ])
    }

    fn from_cbor_value(value: &Value) -> std::result::Result<Self, CodecError> {
        let map = as_map(value, "ExtendedProvider")?;
        let providers = match map_get(map, "Providers") {
            Some(Value::Array(items)) => items
                .iter()
                .map(ProviderRecord::from_cbor_value)
                .collect::<std::result::Result<Vec<_>, _>>()?,
            _ => return Err(missing("Providers")),
        };
        Ok(Self {
            providers,
            override_extended: get_bool(map, "Override")?,
        })
    }
}

/// A signed advertisement, field for field as it goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisementRecord {
    pub previous: Option<Cid>,
    pub provider: String,
    pub addresses: Vec<String>,
    pub signature: Vec<u8>,
    pub entries: Cid,
    pub context: Vec<u8>,
    pub metadata: Vec<u8>,
    pub is_rm: bool,
    pub extended_provider: Option<ExtendedProviderRecord>,
}

impl AdvertisementRecord {
    /// The IPLD shape of this record. Optional fields are omitted, not null.
    pub fn to_cbor_value(&self) -> Value {
        let mut map = Vec::with_capacity(9);
        if let Some(prev) = &self.previous {
            map.push((text("PreviousID"), link_value(prev)));
        }
        map.push((text("Provider"), Value::Text(self.provider.clone())));
        map.push((text("Addresses"), text_array(&self.addresses)));
        map.push((text("Signature"), Value::Bytes(self.signature.clone())));
        map.push((text("Entries"), link_value(&self.entries)));
        map.push((text("ContextID"), Value::Bytes(self.context.clone())));
        map.push((text("Metadata"), Value::Bytes(self.metadata.clone())));
        map.push((text("IsRm"), Value::Bool(self.is_rm)));
        if let Some(ep) = &self.extended_provider {
            map.push((text("ExtendedProvider"), ep.to_cbor_value()));
        }
        Value::Map(map)
    }

    /// Encode as a DAG-CBOR block. Its CID is the `previous` link of the
    /// next advertisement in the chain.
    pub fn export(&self) -> std::result::Result<Block, CodecError> {
        Block::encode(&self.to_cbor_value())
    }

    /// Parse an exported advertisement.
    pub fn decode(bytes: &[u8]) -> std::result::Result<Self, CodecError> {
        let value = decode_dag_cbor(bytes)?;
        let map = as_map(&value, "advertisement")?;

        let previous = map_get(map, "PreviousID").map(value_to_link).transpose()?;
        let entries = value_to_link(map_get(map, "Entries").ok_or_else(|| missing("Entries"))?)?;
        let extended_provider = map_get(map, "ExtendedProvider")
            .map(ExtendedProviderRecord::from_cbor_value)
            .transpose()?;

        Ok(Self {
            previous,
            provider: get_text(map, "Provider")?,
            addresses: get_text_array(map, "Addresses")?,
            signature: get_bytes(map, "Signature")?,
            entries,
            context: get_bytes(map, "ContextID")?,
            metadata: get_bytes(map, "Metadata")?,
            is_rm: get_bool(map, "IsRm")?,
            extended_provider,
        })
    }
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn text_array(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::Text).collect())
}

fn missing(field: &str) -> CodecError {
    CodecError::Malformed(format!("missing or mistyped field {}", field))
}

fn as_map<'a>(
    value: &'a Value,
    what: &str,
) -> std::result::Result<&'a [(Value, Value)], CodecError> {
    match value {
        Value::Map(map) => Ok(map),
        _ => Err(CodecError::Malformed(format!("{} must be a map", what))),
    }
}

fn get_text(map: &[(Value, Value)], key: &str) -> std::result::Result<String, CodecError> {
    match map_get(map, key) {
        Some(Value::Text(t)) => Ok(t.clone()),
        _ => Err(missing(key)),
    }
}

fn get_bytes(map: &[(Value, Value)], key: &str) -> std::result::Result<Vec<u8>, CodecError> {
    match map_get(map, key) {
        Some(Value::Bytes(b)) => Ok(b.clone()),
        _ => Err(missing(key)),
    }
}

fn get_bool(map: &[(Value, Value)], key: &str) -> std::result::Result<bool, CodecError> {
    match map_get(map, key) {
        Some(Value::Bool(b)) => Ok(*b),
        _ => Err(missing(key)),
    }
}

fn get_text_array(
    map: &[(Value, Value)],
    key: &str,
) -> std::result::Result<Vec<String>, CodecError> {
    match map_get(map, key) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| match v {
                Value::Text(t) => Ok(t.clone()),
                _ => Err(missing(key)),
            })
            .collect(),
        _ => Err(missing(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Keyring, SIGNATURE_DOMAIN};
    use crate::error::{CoreError, SigningError};
    use crate::provider::{protocol_prefix, GraphsyncMetadata, HTTP_PROTOCOL_ID};
    use libp2p_core::SignedEnvelope;
    use libp2p_identity::Keypair;

    fn keypair(seed: u8) -> Keypair {
        Keypair::ed25519_from_bytes([seed; 32]).unwrap()
    }

    fn entries_cid() -> Cid {
        Cid::try_from("bafybeiczsscdsbs7ffqz55asqdf3smv6klcw3gofszvwlyarci47bgf354").unwrap()
    }

    fn http_provider(kp: &Keypair) -> Provider {
        Provider::parse(
            kp.public().to_peer_id(),
            &["/dns4/example.org/tcp/443/https"],
            "http",
            None,
        )
        .unwrap()
    }

    fn bitswap_provider(kp: &Keypair) -> Provider {
        Provider::parse(
            kp.public().to_peer_id(),
            &["/ip4/12.34.56.78/tcp/999/ws"],
            "bitswap",
            None,
        )
        .unwrap()
    }

    fn graphsync_provider(kp: &Keypair) -> Provider {
        let meta = GraphsyncMetadata {
            piece_cid: Cid::try_from("QmeUdoMyahuQUPHS2odrZEL6yk2HnNfBJ147BeLXsZuqLJ").unwrap(),
            verified_deal: true,
            fast_retrieval: true,
        };
        Provider::parse(
            kp.public().to_peer_id(),
            &["/ip4/120.0.0.1/tcp/999/ws"],
            "graphsync",
            Some(meta),
        )
        .unwrap()
    }

    fn open(sealed: &[u8], codec: &[u8]) -> (Vec<u8>, libp2p_identity::PeerId) {
        let envelope = SignedEnvelope::from_protobuf_encoding(sealed).unwrap();
        let (payload, key) = envelope
            .payload_and_signing_key(SIGNATURE_DOMAIN.to_string(), codec)
            .unwrap();
        (payload.to_vec(), key.to_peer_id())
    }

    #[test]
    fn test_one_provider_literal() {
        let kp = keypair(1);
        let provider = http_provider(&kp);
        let ad = Advertisement::new(
            vec![provider.clone()],
            EntriesLink::Chunk(entries_cid()),
            vec![99],
            None,
            AdvertisementOptions::default(),
        )
        .unwrap();

        let record = ad.encode_and_sign(&kp).unwrap();
        assert_eq!(record.provider, kp.public().to_peer_id().to_string());
        assert_eq!(record.addresses, vec!["/dns4/example.org/tcp/443/https"]);
        assert_eq!(record.entries, entries_cid());
        assert_eq!(record.context, vec![99]);
        assert_eq!(record.metadata, protocol_prefix(HTTP_PROTOCOL_ID));
        assert!(!record.is_rm);
        assert!(record.previous.is_none());
        assert!(record.extended_provider.is_none());

        let block = record.export().unwrap();
        let Value::Map(map) = decode_dag_cbor(&block.bytes).unwrap() else {
            panic!("expected map");
        };
        assert!(map_get(&map, "PreviousID").is_none());
        assert!(map_get(&map, "ExtendedProvider").is_none());

        // Ed25519 is deterministic, so re-signing reproduces the record
        let again = ad.encode_and_sign(&kp).unwrap();
        assert_eq!(again.metadata, record.metadata);
        assert_eq!(again.signature, record.signature);
    }

    #[test]
    fn test_root_signature_payload() {
        let kp = keypair(2);
        let ad = Advertisement::builder(Some(entries_cid()), EntriesLink::Chunk(entries_cid()))
            .provider(bitswap_provider(&kp))
            .build()
            .unwrap();

        let record = ad.encode_and_sign(&kp).unwrap();
        let (payload, signer) = open(&record.signature, AD_SIGNATURE_CODEC);

        assert_eq!(payload.len(), 34);
        assert_eq!(payload, signature_payload(&ad.signable_bytes()).unwrap());
        assert_eq!(signer, kp.public().to_peer_id());
        assert_eq!(record.previous, Some(entries_cid()));
    }

    #[test]
    fn test_signable_bytes_layout() {
        let kp = keypair(3);
        let provider = http_provider(&kp);
        let ad = Advertisement::builder(None, EntriesLink::NoEntries)
            .provider(provider.clone())
            .remove(true)
            .build()
            .unwrap();

        let mut expected = crate::types::no_entries_cid().to_bytes();
        expected.extend_from_slice(provider.id_string().as_bytes());
        expected.extend_from_slice(b"/dns4/example.org/tcp/443/https");
        expected.extend_from_slice(provider.encode_metadata());
        expected.push(1);

        assert_eq!(ad.signable_bytes(), expected);
    }

    #[test]
    fn test_extended_providers_in_order() {
        let keys = [keypair(10), keypair(11), keypair(12)];
        let ring: Keyring = keys.iter().cloned().collect();
        let providers = vec![
            bitswap_provider(&keys[0]),
            http_provider(&keys[1]),
            graphsync_provider(&keys[2]),
        ];

        let ad = Advertisement::builder(None, EntriesLink::Chunk(entries_cid()))
            .providers(providers.clone())
            .context(vec![99])
            .build()
            .unwrap();
        let record = ad.encode_and_sign(&ring).unwrap();

        assert_eq!(record.provider, providers[0].id_string());
        assert_eq!(record.metadata, providers[0].encode_metadata());

        let ep = record.extended_provider.expect("extended providers");
        assert!(!ep.override_extended);
        assert_eq!(ep.providers.len(), 3);
        for (rec, p) in ep.providers.iter().zip(&providers) {
            assert_eq!(rec.id, p.id_string());
            assert_eq!(rec.addresses, p.address_strings());
            assert_eq!(rec.metadata, p.encode_metadata());

            let (payload, signer) = open(&rec.signature, EXTENDED_PROVIDER_SIGNATURE_CODEC);
            assert_eq!(signer, *p.peer_id());
            assert_eq!(payload, signature_payload(&p.signable_bytes(&ad)).unwrap());
        }
    }

    #[test]
    fn test_override_flag_encoded() {
        let keys = [keypair(20), keypair(21)];
        let ring: Keyring = keys.iter().cloned().collect();
        let ad = Advertisement::builder(None, EntriesLink::NoEntries)
            .providers([http_provider(&keys[0]), bitswap_provider(&keys[1])])
            .context(b"ctx".to_vec())
            .override_extended(true)
            .build()
            .unwrap();

        let record = ad.encode_and_sign(&ring).unwrap();
        assert!(record.extended_provider.unwrap().override_extended);
    }

    #[test]
    fn test_remove_single_provider() {
        let kp = keypair(4);
        let ad = Advertisement::builder(None, EntriesLink::NoEntries)
            .provider(http_provider(&kp))
            .context(vec![1])
            .remove(true)
            .build()
            .unwrap();
        assert!(ad.encode_and_sign(&kp).unwrap().is_rm);
    }

    #[test]
    fn test_construction_errors() {
        let a = http_provider(&keypair(5));
        let b = bitswap_provider(&keypair(6));

        let err = Advertisement::builder(None, EntriesLink::NoEntries)
            .providers([a.clone(), b.clone()])
            .remove(true)
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::RemoveWithExtendedProviders { count: 2 });

        let err = Advertisement::builder(None, EntriesLink::NoEntries)
            .providers([a.clone(), b.clone()])
            .override_extended(true)
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::OverrideWithoutContext);

        let err = Advertisement::builder(None, EntriesLink::NoEntries)
            .provider(a.clone())
            .context(vec![1])
            .override_extended(true)
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::OverrideWithoutExtendedProviders { count: 1 });

        let err = Advertisement::builder(None, EntriesLink::NoEntries)
            .provider(a.clone())
            .context(vec![0; 65])
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::ContextTooLong { len: 65, max: 64 });

        assert!(Advertisement::builder(None, EntriesLink::NoEntries)
            .provider(a)
            .context(vec![0; 64])
            .build()
            .is_ok());

        let err = Advertisement::builder(None, EntriesLink::NoEntries)
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::NoProviders);
    }

    #[test]
    fn test_extended_providers_helper() {
        let a = http_provider(&keypair(7));
        let b = bitswap_provider(&keypair(8));

        let err = Advertisement::extended_providers(vec![a.clone()], None).unwrap_err();
        assert_eq!(err, ValidationError::NotEnoughProviders { count: 1 });

        let ad = Advertisement::extended_providers(vec![a.clone(), b.clone()], None).unwrap();
        assert!(ad.entries().is_no_entries());
        assert!(ad.context().is_empty());
        assert!(!ad.is_override());

        let ad = Advertisement::extended_providers_for_context(vec![a, b], vec![42], true, None)
            .unwrap();
        assert_eq!(ad.context(), &[42]);
        assert!(ad.is_override());
    }

    #[test]
    fn test_missing_key_aborts() {
        let keys = [keypair(30), keypair(31)];
        let ring = Keyring::new().with(keys[0].clone());
        let ad = Advertisement::extended_providers(
            vec![http_provider(&keys[0]), bitswap_provider(&keys[1])],
            None,
        )
        .unwrap();

        let err = ad.encode_and_sign(&ring).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Signing(SigningError::MissingKey(p)) if p == keys[1].public().to_peer_id()
        ));
    }

    #[test]
    fn test_record_export_decode() {
        let keys = [keypair(40), keypair(41)];
        let ring: Keyring = keys.iter().cloned().collect();
        let ad = Advertisement::builder(Some(entries_cid()), EntriesLink::Chunk(entries_cid()))
            .providers([http_provider(&keys[0]), graphsync_provider(&keys[1])])
            .context(vec![1, 2, 3])
            .build()
            .unwrap();

        let record = ad.encode_and_sign(&ring).unwrap();
        let block = record.export().unwrap();
        let decoded = AdvertisementRecord::decode(&block.bytes).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.export().unwrap().cid, block.cid);
    }
}
