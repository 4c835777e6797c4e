//! An in-process store implementing the client traits.
//!
//! Used as the live stand-in for a remote store in tests and benchmarks.

mod key;
mod scanner;
mod session;
mod store;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

pub use scanner::{MemoryClient, MemoryScanner};
pub use session::{MemorySession, SessionOptions, DEFAULT_ERROR_BUFFER_CAPACITY};
pub use store::MemoryStore;

use crate::client::{ConnectionProvider, Session, StoreClient};
use crate::error::StoreResult;

/// Connection provider over a memory store.
///
/// The session is created on first use, inside the caller's runtime, and
/// shared by later calls.
pub struct MemoryConnection {
    client: Arc<MemoryClient>,
    options: SessionOptions,
    session: Mutex<Option<Arc<MemorySession>>>,
}

impl MemoryConnection {
    /// Creates a connection with default session options.
    pub fn new(client: MemoryClient) -> Self {
        Self::with_session_options(client, SessionOptions::default())
    }

    /// Creates a connection whose session uses the given options.
    pub fn with_session_options(client: MemoryClient, options: SessionOptions) -> Self {
        Self {
            client: Arc::new(client),
            options,
            session: Mutex::new(None),
        }
    }

    /// Returns the client.
    pub fn memory_client(&self) -> &Arc<MemoryClient> {
        &self.client
    }

    /// Returns the backing store.
    pub fn store(&self) -> &Arc<MemoryStore> {
        self.client.store()
    }
}

#[async_trait]
impl ConnectionProvider for MemoryConnection {
    fn client(&self) -> Arc<dyn StoreClient> {
        Arc::clone(&self.client) as Arc<dyn StoreClient>
    }

    async fn session(&self) -> StoreResult<Arc<dyn Session>> {
        let mut slot = self.session.lock();
        let session = slot.get_or_insert_with(|| {
            Arc::new(MemorySession::with_options(
                Arc::clone(self.client.store()),
                self.options.clone(),
            ))
        });
        Ok(Arc::clone(session) as Arc<dyn Session>)
    }
}
