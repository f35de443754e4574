//! Outbound contract of the CleverTap SDK.
//!
//! The SDK is split the way the vendor splits it: process-wide entry points
//! on [`CleverTapSdk`] and per-account calls on the [`CleverTapApi`] handle
//! returned by [`CleverTapSdk::default_instance`].

use std::sync::Arc;

use bridge_core::{Activity, Properties};
use thiserror::Error;

/// Code attached to every error this destination reports back to CleverTap.
pub const ERROR_CODE: i32 = 512;

/// Version reported alongside the library tag.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

pub type VendorResult = Result<(), VendorError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VendorError {
    /// The SDK rejected or failed the call.
    #[error("{0}")]
    Call(String),

    #[error("CleverTap instance unavailable")]
    Unavailable,
}

impl VendorError {
    pub fn call(message: impl Into<String>) -> Self {
        VendorError::Call(message.into())
    }
}

/// Process-wide SDK entry points.
pub trait CleverTapSdk: Send + Sync {
    fn change_credentials(&self, account_id: &str, account_token: &str, region: &str);

    /// The default client for the configured account, or `None` if the SDK
    /// could not create one.
    fn default_instance(&self) -> Option<Arc<dyn CleverTapApi>>;

    fn set_app_foreground(&self, foreground: bool) -> VendorResult;

    fn on_activity_resumed(&self, activity: &Activity) -> VendorResult;

    fn on_activity_paused(&self) -> VendorResult;
}

/// Per-account client handle.
pub trait CleverTapApi: Send + Sync {
    fn set_library(&self, name: &str) -> VendorResult;

    fn set_custom_sdk_version(&self, name: &str, version: &str) -> VendorResult;

    fn push_event(&self, name: &str, properties: &Properties) -> VendorResult;

    fn on_user_login(&self, profile: &Properties) -> VendorResult;

    fn push_profile(&self, profile: &Properties) -> VendorResult;

    fn push_charged_event(&self, details: &Properties, items: &[Properties]) -> VendorResult;

    fn record_screen(&self, name: &str) -> VendorResult;

    fn push_error(&self, message: &str, code: i32) -> VendorResult;

    fn push_notification_clicked_event(&self, extras: Option<&Properties>) -> VendorResult;

    fn push_deep_link(&self, uri: Option<&str>) -> VendorResult;
}
