//! End-to-end publishing against the on-disk store.

mod common;

use std::sync::Arc;

use ipni_ads::core::{AdvertisementRecord, EntryChunk};
use ipni_ads::store::{BlockStore, SqliteStore};
use ipni_ads::{Cid, ExtendedScope, ProviderConfig, Publisher, PublisherConfig};
use ipni_ads_testkit::generators::seeded_entries;
use ipni_ads_testkit::{keyring, multi_party_fixtures, ProviderFixture};

async fn load_record(store: &SqliteStore, cid: &Cid) -> AdvertisementRecord {
    let block = store.get_block(cid).await.unwrap().expect("stored advertisement");
    AdvertisementRecord::decode(&block.bytes).unwrap()
}

/// Walk a chunk chain from its head, returning the entry count.
async fn count_entries(store: &SqliteStore, head: &Cid) -> usize {
    let mut total = 0;
    let mut next = Some(*head);
    while let Some(cid) = next {
        let block = store.get_block(&cid).await.unwrap().expect("stored chunk");
        let chunk = EntryChunk::decode(&block.bytes).unwrap();
        total += chunk.len();
        next = chunk.next().copied();
    }
    total
}

#[tokio::test]
async fn test_publish_resumes_after_reopen() {
    common::init_logs();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ads.db");
    let fixture = ProviderFixture::with_seed([0x11; 32]);

    let first = {
        let store = SqliteStore::open(&path).unwrap();
        let publisher = Publisher::new(
            fixture.provider.clone(),
            fixture.keypair.clone(),
            store,
            PublisherConfig::default(),
        );
        publisher.publish(b"car-1", seeded_entries(1, 500)).await.unwrap()
    };
    assert_eq!(first.len(), 1);

    let store = SqliteStore::open(&path).unwrap();
    let publisher = Publisher::new(
        fixture.provider.clone(),
        fixture.keypair.clone(),
        store,
        PublisherConfig::default(),
    );
    assert_eq!(publisher.head().await.unwrap(), Some(first[0]));

    let second = publisher.publish(b"car-2", seeded_entries(2, 500)).await.unwrap();
    let record = load_record(publisher.store(), &second[0]).await;
    assert_eq!(record.previous, Some(first[0]));
    assert_eq!(record.provider, fixture.peer_id().to_string());
    assert_eq!(count_entries(publisher.store(), &record.entries).await, 500);
}

#[tokio::test]
async fn test_large_publish_chains_chunks_and_ads() {
    common::init_logs();
    let fixture = ProviderFixture::with_seed([0x12; 32]);
    let config = PublisherConfig {
        // about 100 sha2-256 entries per chunk
        max_block_bytes: 3_700,
        max_chain_length: 3,
    };
    let publisher = Publisher::new(
        fixture.provider.clone(),
        fixture.keypair.clone(),
        SqliteStore::open_memory().unwrap(),
        config,
    );

    let ads = publisher.publish(b"bulk", seeded_entries(3, 1_000)).await.unwrap();
    assert!(ads.len() > 1);

    let mut total = 0;
    let mut previous = None;
    for cid in &ads {
        let record = load_record(publisher.store(), cid).await;
        assert_eq!(record.previous, previous);
        assert_eq!(record.context, b"bulk");
        total += count_entries(publisher.store(), &record.entries).await;
        previous = Some(*cid);
    }
    assert_eq!(total, 1_000);
    assert_eq!(publisher.head().await.unwrap(), previous);
}

#[tokio::test]
async fn test_extended_providers_then_remove() {
    common::init_logs();
    let parties = multi_party_fixtures(3);
    let publisher = Publisher::new(
        parties[0].provider.clone(),
        keyring(&parties),
        SqliteStore::open_memory().unwrap(),
        PublisherConfig::default(),
    );

    let published = publisher.publish(b"ctx", seeded_entries(4, 10)).await.unwrap();
    let extended = publisher
        .announce_extended_providers(
            parties[1..].iter().map(|p| p.provider.clone()).collect(),
            ExtendedScope::Context {
                context: b"ctx".to_vec(),
                override_extended: true,
            },
        )
        .await
        .unwrap();
    let removed = publisher.remove(b"ctx").await.unwrap();

    let record = load_record(publisher.store(), &extended).await;
    assert_eq!(record.previous, Some(published[0]));
    let ep = record.extended_provider.expect("extended providers");
    let ids: Vec<_> = ep.providers.iter().map(|p| p.id.clone()).collect();
    let expected: Vec<_> = parties.iter().map(|p| p.peer_id().to_string()).collect();
    assert_eq!(ids, expected);
    assert!(ep.override_extended);

    let record = load_record(publisher.store(), &removed).await;
    assert!(record.is_rm);
    assert!(record.extended_provider.is_none());
    assert_eq!(record.previous, Some(extended));
}

#[tokio::test]
async fn test_publishers_share_store() {
    common::init_logs();
    let store = Arc::new(SqliteStore::open_memory().unwrap());
    let a = ProviderFixture::with_seed([0x21; 32]);
    let b = ProviderFixture::with_seed([0x22; 32]);

    let pa = Publisher::with_shared_store(
        a.provider.clone(),
        a.keypair.clone(),
        store.clone(),
        PublisherConfig::default(),
    );
    let pb = Publisher::with_shared_store(
        b.provider.clone(),
        b.keypair.clone(),
        store.clone(),
        PublisherConfig::default(),
    );

    // Same entries: the chunk block is shared, the advertisements are not.
    let (ra, rb) = tokio::join!(
        pa.publish(b"x", seeded_entries(5, 50)),
        pb.publish(b"x", seeded_entries(5, 50)),
    );
    let (ra, rb) = (ra.unwrap(), rb.unwrap());
    assert_ne!(ra[0], rb[0]);
    assert_eq!(store.block_count().await.unwrap(), 3);
    assert_eq!(store.get_head(&a.peer_id()).await.unwrap(), Some(ra[0]));
    assert_eq!(store.get_head(&b.peer_id()).await.unwrap(), Some(rb[0]));
}

#[tokio::test]
async fn test_concurrent_publishes_stay_linear() {
    common::init_logs();
    let fixture = ProviderFixture::with_seed([0x31; 32]);
    let publisher = Arc::new(Publisher::new(
        fixture.provider.clone(),
        fixture.keypair.clone(),
        SqliteStore::open_memory().unwrap(),
        PublisherConfig::default(),
    ));

    let mut handles = Vec::new();
    for i in 0..8u64 {
        let publisher = publisher.clone();
        handles.push(tokio::spawn(async move {
            publisher
                .publish(&i.to_be_bytes(), seeded_entries(100 + i, 5))
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Walk back from the head: all eight ads form one chain.
    let mut seen = 0;
    let mut cursor = publisher.head().await.unwrap();
    while let Some(cid) = cursor {
        cursor = load_record(publisher.store(), &cid).await.previous;
        seen += 1;
    }
    assert_eq!(seen, 8);
}

#[tokio::test]
async fn test_publisher_from_config_file() {
    common::init_logs();
    let dir = tempfile::tempdir().unwrap();
    let fixture = ProviderFixture::with_seed([0x41; 32]);

    let config = ProviderConfig::from_keypair(
        &fixture.keypair,
        vec!["/ip4/10.0.0.1/tcp/4001".into()],
        ipni_ads::core::ProtocolKind::Bitswap,
    )
    .unwrap();
    let path = dir.path().join("provider.json");
    std::fs::write(&path, config.to_json().unwrap()).unwrap();

    let (provider, keypair) = ProviderConfig::from_file(&path).unwrap().into_provider().unwrap();
    let publisher = Publisher::new(
        provider,
        keypair,
        SqliteStore::open(dir.path().join("ads.db")).unwrap(),
        PublisherConfig::from_json(r#"{"max_chain_length": 10}"#).unwrap(),
    );

    let ads = publisher.publish(&[], seeded_entries(6, 3)).await.unwrap();
    let record = load_record(publisher.store(), &ads[0]).await;
    assert_eq!(record.metadata, vec![0x80, 0x12]);
    assert_eq!(record.addresses, vec!["/ip4/10.0.0.1/tcp/4001".to_string()]);
}
