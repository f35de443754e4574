//! CleverTap destination plugin.
//!
//! Forwards identify, track, alias and screen calls to the CleverTap SDK and
//! relays activity lifecycle callbacks. The CleverTap client is created by
//! the first `Initial` settings update; lifecycle callbacks that arrive
//! before that are parked in [`PendingOperations`] and replayed once the
//! client exists. Event calls that arrive before it are passed through
//! without being forwarded.

use std::sync::{Arc, OnceLock};

use bridge_core::{
    Activity, AliasEvent, BridgeResult, DestinationConfig, DestinationPlugin, IdentifyEvent,
    LifecycleObserver, Properties, ScreenEvent, Settings, TrackEvent, UpdateType,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::api::{
    CleverTapApi, CleverTapSdk, VendorError, VendorResult, ERROR_CODE, SDK_VERSION,
};
use crate::charged::{build_charged_event, is_order_completed};
use crate::handle::{ClientSlot, ClientState};
use crate::profile::{build_profile, IDENTITY_KEY};
use crate::queue::{Dispatcher, InlineDispatcher, PendingOperation, PendingOperations};

/// This destination's entry in the settings blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleverTapSettings {
    #[serde(rename = "clevertap_account_id")]
    pub account_id: String,
    #[serde(rename = "clevertap_account_token")]
    pub account_token: String,
    pub region: String,
}

impl CleverTapSettings {
    /// Region with every `.` removed, as the SDK expects it.
    pub fn normalized_region(&self) -> String {
        self.region.replace('.', "")
    }

    fn missing_credentials(&self) -> Option<String> {
        if !self.account_id.is_empty() && !self.account_token.is_empty() {
            return None;
        }
        let state = |value: &str| if value.is_empty() { "empty" } else { "present" };
        Some(format!(
            "Missing credentials: accountID={}, accountToken={}",
            state(&self.account_id),
            state(&self.account_token)
        ))
    }
}

pub type InitCompletedCallback = Box<dyn Fn(Arc<dyn CleverTapApi>) + Send + Sync>;
pub type InitFailedCallback = Box<dyn Fn(&str) + Send + Sync>;

enum InitOutcome {
    Ready(Arc<dyn CleverTapApi>),
    AlreadyReady,
    Failed(String),
}

/// What to do when a forwarded call fails.
#[derive(Clone, Copy)]
enum OnError {
    /// Log only.
    Log,
    /// Log and report the error message to CleverTap.
    Report,
    /// Log and report the error message, prefixed, to CleverTap.
    ReportWithPrefix(&'static str),
}

pub struct CleverTapDestinationBuilder {
    sdk: Arc<dyn CleverTapSdk>,
    config: DestinationConfig,
    dispatcher: Arc<dyn Dispatcher>,
    on_init_completed: Option<InitCompletedCallback>,
    on_init_failed: Option<InitFailedCallback>,
}

impl CleverTapDestinationBuilder {
    pub fn config(mut self, config: DestinationConfig) -> Self {
        self.config = config;
        self
    }

    /// Where queued lifecycle operations are replayed. Defaults to the thread
    /// delivering the initial settings.
    pub fn dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Called with the client once initialization succeeds.
    pub fn on_init_completed<F>(mut self, callback: F) -> Self
    where
        F: Fn(Arc<dyn CleverTapApi>) + Send + Sync + 'static,
    {
        self.on_init_completed = Some(Box::new(callback));
        self
    }

    /// Called with a reason when initialization gives up.
    pub fn on_init_failed<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_init_failed = Some(Box::new(callback));
        self
    }

    pub fn build(self) -> CleverTapDestination {
        CleverTapDestination {
            sdk: self.sdk,
            config: self.config,
            dispatcher: self.dispatcher,
            on_init_completed: self.on_init_completed,
            on_init_failed: self.on_init_failed,
            client: ClientSlot::new(),
            pending: Arc::new(PendingOperations::new()),
            settings: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }
}

pub struct CleverTapDestination {
    sdk: Arc<dyn CleverTapSdk>,
    config: DestinationConfig,
    dispatcher: Arc<dyn Dispatcher>,
    on_init_completed: Option<InitCompletedCallback>,
    on_init_failed: Option<InitFailedCallback>,
    client: ClientSlot,
    pending: Arc<PendingOperations>,
    settings: OnceLock<CleverTapSettings>,
    init_lock: Mutex<()>,
}

impl CleverTapDestination {
    pub fn builder(sdk: Arc<dyn CleverTapSdk>) -> CleverTapDestinationBuilder {
        CleverTapDestinationBuilder {
            sdk,
            config: DestinationConfig::default(),
            dispatcher: Arc::new(InlineDispatcher),
            on_init_completed: None,
            on_init_failed: None,
        }
    }

    pub fn new(sdk: Arc<dyn CleverTapSdk>) -> Self {
        Self::builder(sdk).build()
    }

    /// Settings the client was configured with, once initialization succeeded.
    pub fn settings(&self) -> Option<&CleverTapSettings> {
        self.settings.get()
    }

    pub fn client(&self) -> Option<Arc<dyn CleverTapApi>> {
        self.client.get()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.client.state(), ClientState::Ready(_))
    }

    /// Number of lifecycle operations waiting for the client.
    pub fn pending_operations(&self) -> usize {
        self.pending.len()
    }

    fn init_failed(&self, reason: &str) {
        if let Some(callback) = &self.on_init_failed {
            callback(reason);
        }
    }

    /// Validate `settings` and acquire the client under the init lock.
    /// Nothing is stored unless the client is published, so a failed attempt
    /// leaves the next initial update free to retry with fresh settings.
    fn acquire_client(&self, settings: CleverTapSettings) -> InitOutcome {
        let _guard = self.init_lock.lock();
        if self.is_ready() {
            return InitOutcome::AlreadyReady;
        }

        if let Some(reason) = settings.missing_credentials() {
            warn!(reason = %reason, "CleverTap integration attempted without credentials");
            return InitOutcome::Failed(reason);
        }

        let region = settings.normalized_region();
        self.sdk
            .change_credentials(&settings.account_id, &settings.account_token, &region);

        let Some(client) = self.sdk.default_instance() else {
            let reason = VendorError::Unavailable.to_string();
            error!(region = %region, "{reason}");
            return InitOutcome::Failed(reason);
        };

        let library = self.config.library_name.as_str();
        log_failure("set_library", client.set_library(library));
        log_failure(
            "set_custom_sdk_version",
            client.set_custom_sdk_version(library, SDK_VERSION),
        );

        if !self.client.publish(Arc::clone(&client)) {
            warn!("CleverTap client already published, keeping the first");
            return InitOutcome::AlreadyReady;
        }
        let _ = self.settings.set(settings);

        info!(region = %region, "configured CleverTap destination");
        InitOutcome::Ready(client)
    }

    fn initialize(&self, settings: CleverTapSettings) {
        // Callbacks and the drain run after the init lock is released so they
        // may call back into the destination.
        let client = match self.acquire_client(settings) {
            InitOutcome::Ready(client) => client,
            InitOutcome::AlreadyReady => {
                debug!("CleverTap already initialized, ignoring initial settings");
                return;
            }
            InitOutcome::Failed(reason) => {
                self.init_failed(&reason);
                return;
            }
        };

        if self.pending.mark_ready() {
            info!(pending = self.pending.len(), "executing pending CleverTap operations");
            let pending = Arc::clone(&self.pending);
            self.dispatcher.dispatch(Box::new(move || {
                pending.drain();
            }));
        }

        if let Some(callback) = &self.on_init_completed {
            callback(client);
        }
    }

    /// Forward one call to the client. Skipped while uninitialized; failures
    /// are logged and handled per `on_error`, never returned.
    fn forward<F>(&self, action: &'static str, on_error: OnError, call: F)
    where
        F: FnOnce(&dyn CleverTapApi) -> VendorResult,
    {
        let client = match self.client.state() {
            ClientState::Ready(client) => client,
            ClientState::Uninitialized => {
                debug!(action, "CleverTap not initialized, dropping call");
                return;
            }
        };

        let Err(e) = call(client.as_ref()) else {
            return;
        };
        error!(action, error = %e, "CleverTap call failed");

        let message = match on_error {
            OnError::Log => return,
            OnError::Report => e.to_string(),
            OnError::ReportWithPrefix(prefix) => format!("{prefix}{e}"),
        };
        log_failure("push_error", client.push_error(&message, ERROR_CODE));
    }

    fn submit(&self, operation: PendingOperation) {
        self.pending.submit(operation);
    }
}

fn log_failure(action: &'static str, result: VendorResult) {
    if let Err(e) = result {
        error!(action, error = %e, "CleverTap call failed");
    }
}

impl DestinationPlugin for CleverTapDestination {
    fn key(&self) -> &str {
        &self.config.integration_key
    }

    fn update(&self, settings: &Settings, update_type: UpdateType) -> BridgeResult<()> {
        let key = self.key();
        if !settings.has_integration_settings(key) {
            debug!(key, "CleverTap integration settings not found");
            self.init_failed("CleverTap integration settings not found");
            return Ok(());
        }
        debug!(key, ?update_type, "CleverTap destination is enabled");

        let Some(parsed) = settings.destination_settings::<CleverTapSettings>(key)? else {
            return Ok(());
        };

        if update_type != UpdateType::Initial {
            return Ok(());
        }

        self.initialize(parsed);
        Ok(())
    }

    fn identify(&self, event: IdentifyEvent) -> Option<IdentifyEvent> {
        let profile = build_profile(&event.user_id, &event.traits);
        self.forward("on_user_login", OnError::Report, |client| {
            client.on_user_login(&profile)
        });
        Some(event)
    }

    fn track(&self, event: TrackEvent) -> Option<TrackEvent> {
        if event.event.trim().is_empty() {
            debug!("CleverTap: event name is blank, skipping");
            return Some(event);
        }

        if is_order_completed(&event.event) {
            let charged = build_charged_event(&event.properties, self.config.charged_details);
            self.forward(
                "push_charged_event",
                OnError::ReportWithPrefix("Error handling Order Completed: "),
                |client| client.push_charged_event(&charged.details, &charged.items),
            );
        } else {
            self.forward("push_event", OnError::Report, |client| {
                client.push_event(&event.event, &event.properties)
            });
        }
        Some(event)
    }

    fn alias(&self, event: AliasEvent) -> Option<AliasEvent> {
        if event.user_id.is_empty() {
            return Some(event);
        }

        let mut profile = Properties::new();
        profile.insert(IDENTITY_KEY.to_string(), Value::String(event.user_id.clone()));
        self.forward("push_profile", OnError::Report, |client| {
            client.push_profile(&profile)
        });
        Some(event)
    }

    fn screen(&self, event: ScreenEvent) -> Option<ScreenEvent> {
        self.forward("record_screen", OnError::Log, |client| {
            client.record_screen(&event.name)
        });
        Some(event)
    }
}

impl LifecycleObserver for CleverTapDestination {
    fn on_activity_created(&self, activity: Option<&Activity>, _saved_state: Option<&Properties>) {
        let Some(activity) = activity else {
            return;
        };
        let sdk = Arc::clone(&self.sdk);
        let client = self.client.clone();
        let intent = activity.intent.clone();

        self.submit(Box::new(move || -> VendorResult {
            debug!("executing onActivityCreated");
            sdk.set_app_foreground(true)?;
            if let (Some(intent), Some(client)) = (intent, client.get()) {
                client.push_notification_clicked_event(intent.extras.as_ref())?;
                client.push_deep_link(intent.data.as_deref())?;
            }
            Ok(())
        }));
    }

    fn on_activity_resumed(&self, activity: Option<&Activity>) {
        let Some(activity) = activity.cloned() else {
            return;
        };
        let sdk = Arc::clone(&self.sdk);

        self.submit(Box::new(move || {
            debug!(activity = %activity.name, "executing onActivityResumed");
            sdk.on_activity_resumed(&activity)
        }));
    }

    fn on_activity_paused(&self, _activity: Option<&Activity>) {
        let sdk = Arc::clone(&self.sdk);

        self.submit(Box::new(move || {
            debug!("executing onActivityPaused");
            sdk.on_activity_paused()
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingSdk, VendorCall};
    use serde_json::json;

    fn settings_with(account_id: &str, region: &str) -> Settings {
        serde_json::from_value(json!({
            "integrations": {
                "CleverTap": {
                    "clevertap_account_id": account_id,
                    "clevertap_account_token": "test-account-token",
                    "region": region
                }
            }
        }))
        .unwrap()
    }

    fn valid_settings(region: &str) -> Settings {
        settings_with("test-account-id", region)
    }

    fn credential_ids(sdk: &RecordingSdk) -> Vec<String> {
        sdk.calls()
            .into_iter()
            .filter_map(|call| match call {
                VendorCall::ChangeCredentials { account_id, .. } => Some(account_id),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_key_is_clevertap() {
        let destination = CleverTapDestination::new(Arc::new(RecordingSdk::new()));
        assert_eq!(destination.key(), "CleverTap");
    }

    #[test]
    fn test_credentials_helpers() {
        let settings = CleverTapSettings {
            account_id: String::new(),
            account_token: "token".into(),
            region: "in1.x".into(),
        };
        assert_eq!(settings.normalized_region(), "in1x");
        assert_eq!(
            settings.missing_credentials().as_deref(),
            Some("Missing credentials: accountID=empty, accountToken=present")
        );
    }

    #[test]
    fn test_initial_update_configures_the_client() {
        let sdk = Arc::new(RecordingSdk::new());
        let destination = CleverTapDestination::new(sdk.clone());

        destination
            .update(&valid_settings("in1.abc.xyz"), UpdateType::Initial)
            .unwrap();

        assert_eq!(
            sdk.calls(),
            vec![
                VendorCall::ChangeCredentials {
                    account_id: "test-account-id".into(),
                    account_token: "test-account-token".into(),
                    region: "in1abcxyz".into(),
                },
                VendorCall::DefaultInstance,
                VendorCall::SetLibrary("CleverTap".into()),
                VendorCall::SetCustomSdkVersion {
                    name: "CleverTap".into(),
                    version: SDK_VERSION.into(),
                },
            ]
        );
        assert!(destination.is_ready());
        let parsed = destination.settings().unwrap();
        assert_eq!(parsed.account_id, "test-account-id");
        assert_eq!(parsed.account_token, "test-account-token");
        assert_eq!(parsed.region, "in1.abc.xyz");
    }

    #[test]
    fn test_second_initial_update_is_ignored() {
        let sdk = Arc::new(RecordingSdk::new());
        let destination = CleverTapDestination::new(sdk.clone());

        destination.update(&valid_settings("in1"), UpdateType::Initial).unwrap();
        destination.update(&valid_settings("eu1"), UpdateType::Initial).unwrap();

        assert_eq!(sdk.count("default_instance"), 1);
        assert_eq!(sdk.count("change_credentials"), 1);
    }

    #[test]
    fn test_custom_library_name() {
        let sdk = Arc::new(RecordingSdk::new());
        let config = DestinationConfig {
            library_name: "CleverTap-Rust".into(),
            ..DestinationConfig::default()
        };
        let destination = CleverTapDestination::builder(sdk.clone()).config(config).build();

        destination.update(&valid_settings("in1"), UpdateType::Initial).unwrap();

        assert!(sdk
            .calls()
            .contains(&VendorCall::SetLibrary("CleverTap-Rust".into())));
    }

    #[test]
    fn test_failed_initial_update_can_be_retried_with_new_settings() {
        let sdk = Arc::new(RecordingSdk::new());
        let destination = CleverTapDestination::new(sdk.clone());

        destination.update(&settings_with("", "in1"), UpdateType::Initial).unwrap();
        assert!(!destination.is_ready());
        assert!(destination.settings().is_none());

        destination
            .update(&settings_with("good-id", "in1"), UpdateType::Initial)
            .unwrap();

        assert!(destination.is_ready());
        assert_eq!(credential_ids(&sdk), vec!["good-id"]);
        assert_eq!(destination.settings().unwrap().account_id, "good-id");
    }

    #[test]
    fn test_each_initial_attempt_uses_its_own_credentials() {
        let sdk = Arc::new(RecordingSdk::without_instance());
        let destination = CleverTapDestination::new(sdk.clone());

        destination.update(&settings_with("old-id", "in1"), UpdateType::Initial).unwrap();
        destination.update(&settings_with("new-id", "in1"), UpdateType::Initial).unwrap();

        assert_eq!(credential_ids(&sdk), vec!["old-id", "new-id"]);
        assert!(destination.settings().is_none());
    }

    #[test]
    fn test_init_completed_callback_may_reenter_update() {
        let sdk = Arc::new(RecordingSdk::new());
        let slot: Arc<OnceLock<Arc<CleverTapDestination>>> = Arc::new(OnceLock::new());
        let reentered = Arc::new(Mutex::new(false));

        let callback_slot = Arc::clone(&slot);
        let callback_flag = Arc::clone(&reentered);
        let destination = Arc::new(
            CleverTapDestination::builder(sdk.clone())
                .on_init_completed(move |_client| {
                    let destination = callback_slot.get().unwrap();
                    destination
                        .update(&valid_settings("eu1"), UpdateType::Initial)
                        .unwrap();
                    *callback_flag.lock() = true;
                })
                .build(),
        );
        assert!(slot.set(Arc::clone(&destination)).is_ok());

        destination.update(&valid_settings("in1"), UpdateType::Initial).unwrap();

        assert!(*reentered.lock());
        assert_eq!(sdk.count("change_credentials"), 1);
    }

    #[test]
    fn test_queued_operation_may_reenter_update() {
        let sdk = Arc::new(RecordingSdk::new());
        let destination = Arc::new(CleverTapDestination::new(sdk.clone()));

        let inner = Arc::clone(&destination);
        destination.submit(Box::new(move || -> VendorResult {
            inner.update(&valid_settings("eu1"), UpdateType::Initial)
                .map_err(|e| VendorError::call(e.to_string()))
        }));
        destination.update(&valid_settings("in1"), UpdateType::Initial).unwrap();

        assert!(destination.is_ready());
        assert_eq!(destination.pending_operations(), 0);
        assert_eq!(sdk.count("change_credentials"), 1);
    }

    #[test]
    fn test_refresh_before_initial_does_not_configure() {
        let sdk = Arc::new(RecordingSdk::new());
        let destination = CleverTapDestination::new(sdk.clone());

        destination.update(&valid_settings("in1"), UpdateType::Refresh).unwrap();

        assert!(sdk.calls().is_empty());
        assert!(!destination.is_ready());
    }
}
