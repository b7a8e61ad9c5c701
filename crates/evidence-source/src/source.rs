//! Evidence source contract.

use async_trait::async_trait;

use crate::FetchResult;

/// Anything that can turn an evidence key into bytes.
///
/// Implementations must bound their work: honour `max_bytes` (truncating
/// plain bodies, failing structured ones) and apply their own timeout.
/// Retries are not expected; a failed fetch means "no evidence this run".
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// Fetch the evidence addressed by `key`.
    async fn fetch(&self, key: &str, max_bytes: usize) -> FetchResult<Vec<u8>>;
}
