//! Offset-indexed reads of payloads larger than one BLE transaction

use std::future::Future;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::core::error::{AttError, AttResult};

/// Serves a buffered payload through repeated offset-indexed reads
///
/// A read at offset 0 establishes the payload from the owner's source; reads
/// at higher offsets slice that same payload until the next offset-0 read.
#[derive(Debug, Default)]
pub struct ChunkedRead {
    payload: Mutex<Option<Vec<u8>>>,
}

impl ChunkedRead {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer a read request
    ///
    /// `source` is only invoked for offset 0. A read past the end of the
    /// payload, or at a non-zero offset before any payload was established,
    /// fails with `InvalidOffset`.
    pub async fn read<F, Fut>(&self, offset: usize, max_size: usize, source: F) -> AttResult<Vec<u8>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Vec<u8>>,
    {
        if offset == 0 {
            let payload = source().await;
            let end = payload.len().min(max_size);
            let chunk = payload[..end].to_vec();
            debug!(
                "Chunked read established: total_size={}, chunk_size={}",
                payload.len(),
                chunk.len()
            );
            *self.payload.lock().await = Some(payload);
            return Ok(chunk);
        }

        let guard = self.payload.lock().await;
        let Some(payload) = guard.as_ref() else {
            warn!("Read at offset {} before offset 0", offset);
            return Err(AttError::InvalidOffset);
        };

        if offset > payload.len() {
            return Err(AttError::InvalidOffset);
        }
        Ok(payload[offset..].to_vec())
    }
}
