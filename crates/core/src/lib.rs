//! Host-side contract for analytics destinations: event payloads, the
//! settings blob, the plugin and lifecycle traits, and shared configuration.

pub mod config;
pub mod error;
pub mod events;
pub mod plugin;
pub mod settings;

pub use config::{ChargedDetailsPolicy, DestinationConfig};
pub use error::{BridgeError, BridgeResult};
pub use events::{AliasEvent, BaseEvent, IdentifyEvent, Properties, ScreenEvent, TrackEvent};
pub use plugin::{Activity, DestinationPlugin, Intent, LifecycleObserver};
pub use settings::{Settings, UpdateType};
