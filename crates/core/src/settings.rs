use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::BridgeResult;
use crate::events::Properties;

/// Settings blob delivered by the host. Holds one sub-configuration per
/// enabled destination, keyed by the destination's name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub integrations: Properties,
}

/// Why the host is delivering settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    /// First delivery after the plugin is added.
    Initial,
    /// Any later settings refresh.
    Refresh,
}

impl Settings {
    pub fn new(integrations: Properties) -> Self {
        Self { integrations }
    }

    pub fn has_integration_settings(&self, key: &str) -> bool {
        self.integrations.contains_key(key)
    }

    /// Deserialize the entry for `key`. Returns `Ok(None)` when the entry is
    /// absent and an error when it is present but malformed.
    pub fn destination_settings<T: DeserializeOwned>(&self, key: &str) -> BridgeResult<Option<T>> {
        match self.integrations.get(key) {
            Some(raw) => Ok(Some(T::deserialize(raw)?)),
            None => Ok(None),
        }
    }
}
