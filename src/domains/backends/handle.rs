//! Lazily created, process-wide client handle.
//!
//! A [`ClientHandle`] owns at most one live client. The first caller builds
//! it while holding the write lock, so concurrent first use never creates two
//! clients. `take` resets the slot and the next use builds a fresh one.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::domains::tools::ToolResult;

pub struct ClientHandle<C: ?Sized> {
    label: &'static str,
    slot: RwLock<Option<Arc<C>>>,
}

impl<C: ?Sized> ClientHandle<C> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            slot: RwLock::new(None),
        }
    }

    /// Return the live client, building it with `init` if absent.
    pub async fn get_or_try_init<F, Fut>(&self, init: F) -> ToolResult<Arc<C>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ToolResult<Arc<C>>>,
    {
        if let Some(client) = self.slot.read().await.as_ref() {
            return Ok(client.clone());
        }

        let mut slot = self.slot.write().await;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        debug!("Creating {} client", self.label);
        let client = init().await?;
        *slot = Some(client.clone());
        Ok(client)
    }

    /// The live client, if any.
    pub async fn current(&self) -> Option<Arc<C>> {
        self.slot.read().await.clone()
    }

    /// Remove and return the live client. Idempotent.
    pub async fn take(&self) -> Option<Arc<C>> {
        let taken = self.slot.write().await.take();
        if taken.is_some() {
            debug!("Released {} client", self.label);
        }
        taken
    }
}
