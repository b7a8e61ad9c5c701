//! Evidence-Source: fetch primitives behind the autofill evidence cache
//!
//! Detectives never talk to the network directly. They ask the per-run
//! evidence cache for a string key, and the cache asks an [`EvidenceSource`]
//! on a miss. This crate defines that contract, the key grammar, and the
//! concrete sources.
//!
//! ## Layer 1 - Evidence/Network
//!
//! Focus: bounded reads (timeout + max-byte cap) and a failure taxonomy the
//! cache can flatten into "no evidence".

pub mod error;
pub mod fakes;
pub mod key;
pub mod source;
pub mod web;

pub use error::FetchError;
pub use fakes::MemorySource;
pub use key::EvidenceKey;
pub use source::EvidenceSource;
pub use web::{WebSource, WebSourceConfig};

/// Result type for evidence fetches
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Default per-key read cap: 1 MiB.
pub const DEFAULT_MAX_READ_BYTES: usize = 1 << 20;
