//! The Publisher: builds a provider's advertisement chain.
//!
//! The publisher chunks multihashes into entry chunks, wraps each chunk chain
//! in an advertisement linked to the provider's previous one, signs it and
//! stores every block. The store remembers the chain head, so publishing
//! resumes where it left off across restarts.

use std::sync::Arc;

use bytes::Bytes;
use ipni_ads_core::{
    Advertisement, AdvertisementOptions, Cid, EntriesLink, EnvelopeSigner, Provider,
};
use ipni_ads_store::BlockStore;
use tokio::sync::Mutex;

use crate::chunker::chunk_entries;
use crate::config::PublisherConfig;
use crate::error::Result;

/// Which content an extended-provider announcement applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtendedScope {
    /// All past and future content of the root provider.
    Chain,
    /// Content published under one context id.
    Context {
        context: Vec<u8>,
        /// Replace the chain-level providers for this context instead of
        /// adding to them.
        override_extended: bool,
    },
}

/// Publishes advertisements for one root provider.
///
/// `K` must be able to sign for the root provider, and for every extra
/// provider passed to [`Publisher::announce_extended_providers`].
pub struct Publisher<S: BlockStore, K: EnvelopeSigner> {
    provider: Provider,
    signer: K,
    store: Arc<S>,
    config: PublisherConfig,
    /// Held from reading the head until the new head is written.
    chain_lock: Mutex<()>,
}

impl<S: BlockStore, K: EnvelopeSigner> Publisher<S, K> {
    /// Create a new publisher.
    pub fn new(provider: Provider, signer: K, store: S, config: PublisherConfig) -> Self {
        Self::with_shared_store(provider, signer, Arc::new(store), config)
    }

    /// Create a publisher over a store shared with other publishers.
    pub fn with_shared_store(
        provider: Provider,
        signer: K,
        store: Arc<S>,
        config: PublisherConfig,
    ) -> Self {
        Self {
            provider,
            signer,
            store,
            config,
            chain_lock: Mutex::new(()),
        }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// The latest advertisement of this provider's chain.
    pub async fn head(&self) -> Result<Option<Cid>> {
        Ok(self.store.get_head(self.provider.peer_id()).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Publishing
    // ─────────────────────────────────────────────────────────────────────────

    /// Advertise `entries` under `context`.
    ///
    /// One advertisement is published per chunk chain, so a long entry list
    /// yields several chained advertisements. Returns their CIDs in chain
    /// order; an empty entry list publishes nothing.
    pub async fn publish<I, E>(&self, context: &[u8], entries: I) -> Result<Vec<Cid>>
    where
        I: IntoIterator<Item = E>,
        E: Into<Bytes>,
    {
        let chains = chunk_entries(&self.config, entries)?;
        if chains.is_empty() {
            tracing::debug!(provider = %self.provider.peer_id(), "nothing to publish");
            return Ok(Vec::new());
        }

        let _guard = self.chain_lock.lock().await;
        let mut previous = self.head().await?;
        let mut published = Vec::with_capacity(chains.len());

        for chain in chains {
            let ad = Advertisement::new(
                vec![self.provider.clone()],
                EntriesLink::Chunk(chain.head),
                context.to_vec(),
                previous,
                AdvertisementOptions::default(),
            )?;

            let inserted = self.store.put_blocks(&chain.blocks).await?;
            tracing::debug!(
                head = %chain.head,
                chunks = chain.blocks.len(),
                inserted,
                entries = chain.entry_count,
                "stored entry chunk chain"
            );

            let cid = self.store_advertisement(&ad).await?;
            previous = Some(cid);
            published.push(cid);
        }

        Ok(published)
    }

    /// Withdraw all content published under `context`.
    pub async fn remove(&self, context: &[u8]) -> Result<Cid> {
        let _guard = self.chain_lock.lock().await;
        let previous = self.head().await?;

        let ad = Advertisement::new(
            vec![self.provider.clone()],
            EntriesLink::NoEntries,
            context.to_vec(),
            previous,
            AdvertisementOptions {
                remove: true,
                override_extended: false,
            },
        )?;
        self.store_advertisement(&ad).await
    }

    /// Announce that `extra` providers also serve this provider's content.
    ///
    /// The root provider is always listed first.
    pub async fn announce_extended_providers(
        &self,
        extra: Vec<Provider>,
        scope: ExtendedScope,
    ) -> Result<Cid> {
        let mut providers = Vec::with_capacity(extra.len() + 1);
        providers.push(self.provider.clone());
        providers.extend(extra);

        let _guard = self.chain_lock.lock().await;
        let previous = self.head().await?;

        let ad = match scope {
            ExtendedScope::Chain => Advertisement::extended_providers(providers, previous)?,
            ExtendedScope::Context {
                context,
                override_extended,
            } => Advertisement::extended_providers_for_context(
                providers,
                context,
                override_extended,
                previous,
            )?,
        };
        self.store_advertisement(&ad).await
    }

    /// Sign, store and advance the head. Callers hold `chain_lock`.
    async fn store_advertisement(&self, ad: &Advertisement) -> Result<Cid> {
        let record = ad.encode_and_sign(&self.signer)?;
        let block = record.export()?;
        let cid = block.cid;

        self.store.put_block(&block).await?;
        self.store.set_head(self.provider.peer_id(), &cid).await?;

        tracing::info!(
            %cid,
            entries = %record.entries,
            previous = ?record.previous.map(|c| c.to_string()),
            context_len = record.context.len(),
            providers = ad.providers().len(),
            remove = record.is_rm,
            "published advertisement"
        );
        Ok(cid)
    }
}
