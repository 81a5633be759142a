//! # IPNI Ads Testkit
//!
//! Testing utilities for IPNI advertisement publishing.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known entry chunk sizes and advertisement inputs with
//!   expected outputs for cross-implementation verification
//! - **Generators**: Proptest strategies for multihashes, contexts and providers
//! - **Fixtures**: Seeded providers with a memory store
//!
//! ## Golden Vectors
//!
//! ```rust
//! use ipni_ads_testkit::vectors::{all_size_vectors, chunk_from_vector};
//!
//! for vector in all_size_vectors() {
//!     let chunk = chunk_from_vector(&vector);
//!     assert_eq!(chunk.calculate_encoded_size(), vector.expected_size);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use ipni_ads_testkit::generators::{advertisement_from_params, AdParams};
//!
//! proptest! {
//!     #[test]
//!     fn signable_bytes_are_deterministic(params: AdParams) {
//!         let a = advertisement_from_params(&params);
//!         let b = advertisement_from_params(&params);
//!         prop_assert_eq!(a.signable_bytes(), b.signable_bytes());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use ipni_ads_testkit::fixtures::ProviderFixture;
//!
//! let fixture = ProviderFixture::with_seed([7; 32]);
//! let ad = fixture.make_advertisement(b"ctx", None);
//! assert_eq!(ad.root().peer_id(), &fixture.peer_id());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{keyring, multi_party_fixtures, ProviderFixture};
pub use generators::{advertisement_from_params, AdParams};
pub use vectors::{
    all_ad_vectors, all_size_vectors, chunk_from_vector, record_from_vector,
    verify_size_vectors, AdVector, SizeVector,
};
