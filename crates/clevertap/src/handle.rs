use std::sync::{Arc, OnceLock};

use crate::api::CleverTapApi;

/// Where the destination stands with its CleverTap client.
pub enum ClientState<'a> {
    Uninitialized,
    Ready(&'a Arc<dyn CleverTapApi>),
}

/// Client handle shared between the init path, the event hooks and queued
/// lifecycle operations. Written once; readers see either nothing or the
/// fully configured client.
#[derive(Clone, Default)]
pub struct ClientSlot {
    inner: Arc<OnceLock<Arc<dyn CleverTapApi>>>,
}

impl ClientSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ClientState<'_> {
        match self.inner.get() {
            Some(client) => ClientState::Ready(client),
            None => ClientState::Uninitialized,
        }
    }

    pub fn get(&self) -> Option<Arc<dyn CleverTapApi>> {
        self.inner.get().cloned()
    }

    /// Publish the client. Returns `false` if one was already published,
    /// in which case the slot keeps the first.
    pub(crate) fn publish(&self, client: Arc<dyn CleverTapApi>) -> bool {
        self.inner.set(client).is_ok()
    }
}
