//! In-memory CleverTap SDK that records every call, for tests and local
//! wiring without the vendor SDK.

use std::collections::HashMap;
use std::sync::Arc;

use bridge_core::{Activity, Properties};
use parking_lot::Mutex;

use crate::api::{CleverTapApi, CleverTapSdk, VendorError, VendorResult};

/// One recorded call against the SDK or a client.
#[derive(Debug, Clone, PartialEq)]
pub enum VendorCall {
    ChangeCredentials {
        account_id: String,
        account_token: String,
        region: String,
    },
    DefaultInstance,
    SetAppForeground(bool),
    ActivityResumed(String),
    ActivityPaused,
    SetLibrary(String),
    SetCustomSdkVersion {
        name: String,
        version: String,
    },
    PushEvent {
        name: String,
        properties: Properties,
    },
    OnUserLogin(Properties),
    PushProfile(Properties),
    PushChargedEvent {
        details: Properties,
        items: Vec<Properties>,
    },
    RecordScreen(String),
    PushError {
        message: String,
        code: i32,
    },
    PushNotificationClicked(Option<Properties>),
    PushDeepLink(Option<String>),
}

impl VendorCall {
    /// Name of the SDK method that produced this call.
    pub fn method(&self) -> &'static str {
        match self {
            VendorCall::ChangeCredentials { .. } => "change_credentials",
            VendorCall::DefaultInstance => "default_instance",
            VendorCall::SetAppForeground(_) => "set_app_foreground",
            VendorCall::ActivityResumed(_) => "on_activity_resumed",
            VendorCall::ActivityPaused => "on_activity_paused",
            VendorCall::SetLibrary(_) => "set_library",
            VendorCall::SetCustomSdkVersion { .. } => "set_custom_sdk_version",
            VendorCall::PushEvent { .. } => "push_event",
            VendorCall::OnUserLogin(_) => "on_user_login",
            VendorCall::PushProfile(_) => "push_profile",
            VendorCall::PushChargedEvent { .. } => "push_charged_event",
            VendorCall::RecordScreen(_) => "record_screen",
            VendorCall::PushError { .. } => "push_error",
            VendorCall::PushNotificationClicked(_) => "push_notification_clicked_event",
            VendorCall::PushDeepLink(_) => "push_deep_link",
        }
    }
}

/// Call log shared by an SDK and its client so their relative order is kept.
#[derive(Default)]
struct CallLog {
    calls: Mutex<Vec<VendorCall>>,
    failures: Mutex<HashMap<&'static str, String>>,
}

impl CallLog {
    /// Record the call; fails it when a failure is armed for its method.
    fn record(&self, call: VendorCall) -> VendorResult {
        let failure = self.failures.lock().get(call.method()).cloned();
        self.calls.lock().push(call);
        match failure {
            Some(message) => Err(VendorError::Call(message)),
            None => Ok(()),
        }
    }

    fn calls(&self) -> Vec<VendorCall> {
        self.calls.lock().clone()
    }

    fn count(&self, method: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.method() == method).count()
    }
}

/// Recording [`CleverTapApi`].
#[derive(Default)]
pub struct RecordingClient {
    log: Arc<CallLog>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<VendorCall> {
        self.log.calls()
    }

    pub fn count(&self, method: &str) -> usize {
        self.log.count(method)
    }

    /// Make every later call to `method` fail with `message`.
    pub fn fail_on(&self, method: &'static str, message: impl Into<String>) {
        self.log.failures.lock().insert(method, message.into());
    }

    pub fn clear(&self) {
        self.log.calls.lock().clear();
    }
}

impl CleverTapApi for RecordingClient {
    fn set_library(&self, name: &str) -> VendorResult {
        self.log.record(VendorCall::SetLibrary(name.to_string()))
    }

    fn set_custom_sdk_version(&self, name: &str, version: &str) -> VendorResult {
        self.log.record(VendorCall::SetCustomSdkVersion {
            name: name.to_string(),
            version: version.to_string(),
        })
    }

    fn push_event(&self, name: &str, properties: &Properties) -> VendorResult {
        self.log.record(VendorCall::PushEvent {
            name: name.to_string(),
            properties: properties.clone(),
        })
    }

    fn on_user_login(&self, profile: &Properties) -> VendorResult {
        self.log.record(VendorCall::OnUserLogin(profile.clone()))
    }

    fn push_profile(&self, profile: &Properties) -> VendorResult {
        self.log.record(VendorCall::PushProfile(profile.clone()))
    }

    fn push_charged_event(&self, details: &Properties, items: &[Properties]) -> VendorResult {
        self.log.record(VendorCall::PushChargedEvent {
            details: details.clone(),
            items: items.to_vec(),
        })
    }

    fn record_screen(&self, name: &str) -> VendorResult {
        self.log.record(VendorCall::RecordScreen(name.to_string()))
    }

    fn push_error(&self, message: &str, code: i32) -> VendorResult {
        self.log.record(VendorCall::PushError {
            message: message.to_string(),
            code,
        })
    }

    fn push_notification_clicked_event(&self, extras: Option<&Properties>) -> VendorResult {
        self.log
            .record(VendorCall::PushNotificationClicked(extras.cloned()))
    }

    fn push_deep_link(&self, uri: Option<&str>) -> VendorResult {
        self.log
            .record(VendorCall::PushDeepLink(uri.map(str::to_string)))
    }
}

/// Recording [`CleverTapSdk`]. Its default instance is a
/// [`RecordingClient`] sharing the same call log.
pub struct RecordingSdk {
    client: Option<Arc<RecordingClient>>,
    log: Arc<CallLog>,
}

impl RecordingSdk {
    pub fn new() -> Self {
        let log = Arc::new(CallLog::default());
        let client = RecordingClient {
            log: Arc::clone(&log),
        };
        Self {
            client: Some(Arc::new(client)),
            log,
        }
    }

    /// An SDK whose `default_instance` yields nothing.
    pub fn without_instance() -> Self {
        Self {
            client: None,
            log: Arc::new(CallLog::default()),
        }
    }

    pub fn client(&self) -> Option<Arc<RecordingClient>> {
        self.client.clone()
    }

    /// Every call made against the SDK and its client, in order.
    pub fn calls(&self) -> Vec<VendorCall> {
        self.log.calls()
    }

    pub fn count(&self, method: &str) -> usize {
        self.log.count(method)
    }

    pub fn fail_on(&self, method: &'static str, message: impl Into<String>) {
        self.log.failures.lock().insert(method, message.into());
    }

    pub fn clear(&self) {
        self.log.calls.lock().clear();
    }
}

impl Default for RecordingSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl CleverTapSdk for RecordingSdk {
    fn change_credentials(&self, account_id: &str, account_token: &str, region: &str) {
        let _ = self.log.record(VendorCall::ChangeCredentials {
            account_id: account_id.to_string(),
            account_token: account_token.to_string(),
            region: region.to_string(),
        });
    }

    fn default_instance(&self) -> Option<Arc<dyn CleverTapApi>> {
        let _ = self.log.record(VendorCall::DefaultInstance);
        self.client
            .clone()
            .map(|client| client as Arc<dyn CleverTapApi>)
    }

    fn set_app_foreground(&self, foreground: bool) -> VendorResult {
        self.log.record(VendorCall::SetAppForeground(foreground))
    }

    fn on_activity_resumed(&self, activity: &Activity) -> VendorResult {
        self.log
            .record(VendorCall::ActivityResumed(activity.name.clone()))
    }

    fn on_activity_paused(&self) -> VendorResult {
        self.log.record(VendorCall::ActivityPaused)
    }
}
