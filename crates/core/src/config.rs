use serde::Deserialize;

use crate::error::BridgeResult;

/// Destination configuration. Loaded from environment variables with the
/// prefix `BRIDGE__`; every field falls back to a default.
#[derive(Debug, Clone, Deserialize)]
pub struct DestinationConfig {
    /// Key of this destination's entry inside the settings blob.
    #[serde(default = "default_integration_key")]
    pub integration_key: String,
    /// Library tag reported to the vendor client.
    #[serde(default = "default_library_name")]
    pub library_name: String,
    #[serde(default)]
    pub charged_details: ChargedDetailsPolicy,
}

/// How "Order Completed" properties are shaped into charged-event details.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargedDetailsPolicy {
    /// Copy every property except `products` into the details unchanged.
    #[default]
    PassThrough,
    /// Also lift the order id into `Charged ID` and the order total into
    /// `Amount`, dropping the source keys from the details.
    NamedFields,
}

fn default_integration_key() -> String {
    "CleverTap".to_string()
}
fn default_library_name() -> String {
    "CleverTap".to_string()
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            integration_key: default_integration_key(),
            library_name: default_library_name(),
            charged_details: ChargedDetailsPolicy::default(),
        }
    }
}

impl DestinationConfig {
    pub fn load() -> BridgeResult<Self> {
        let config = Self::from_builder(config::Config::builder().add_source(
            config::Environment::with_prefix("BRIDGE")
                .separator("__")
                .try_parsing(true),
        ))?;
        Ok(config)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        builder.build()?.try_deserialize()
    }
}
