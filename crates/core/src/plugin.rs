//! Plugin contract between the host pipeline and a destination.
//!
//! Hosts hold destinations as `Arc<dyn DestinationPlugin>` and route every
//! event through [`DestinationPlugin::execute`]. Hooks may be called from any
//! thread.

use serde::{Deserialize, Serialize};

use crate::error::BridgeResult;
use crate::events::{AliasEvent, BaseEvent, IdentifyEvent, Properties, ScreenEvent, TrackEvent};
use crate::settings::{Settings, UpdateType};

/// A destination that forwards events to one third-party system. Each hook
/// returns the event to pass down the chain, or `None` to drop it.
pub trait DestinationPlugin: Send + Sync {
    /// Name under which this destination's settings are keyed.
    fn key(&self) -> &str;

    fn update(&self, settings: &Settings, update_type: UpdateType) -> BridgeResult<()>;

    fn identify(&self, event: IdentifyEvent) -> Option<IdentifyEvent> {
        Some(event)
    }

    fn track(&self, event: TrackEvent) -> Option<TrackEvent> {
        Some(event)
    }

    fn alias(&self, event: AliasEvent) -> Option<AliasEvent> {
        Some(event)
    }

    fn screen(&self, event: ScreenEvent) -> Option<ScreenEvent> {
        Some(event)
    }

    fn execute(&self, event: BaseEvent) -> Option<BaseEvent> {
        match event {
            BaseEvent::Identify(e) => self.identify(e).map(BaseEvent::Identify),
            BaseEvent::Track(e) => self.track(e).map(BaseEvent::Track),
            BaseEvent::Alias(e) => self.alias(e).map(BaseEvent::Alias),
            BaseEvent::Screen(e) => self.screen(e).map(BaseEvent::Screen),
        }
    }
}

/// Snapshot of the intent that launched an activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub extras: Option<Properties>,
    /// Deep-link URI, if the activity was opened from one.
    pub data: Option<String>,
}

/// Snapshot of a foreground activity, captured when the host reports a
/// lifecycle transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    pub intent: Option<Intent>,
}

impl Activity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            intent: None,
        }
    }

    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intent = Some(intent);
        self
    }
}

/// Application lifecycle callbacks. All hooks default to no-ops.
pub trait LifecycleObserver: Send + Sync {
    fn on_activity_created(&self, _activity: Option<&Activity>, _saved_state: Option<&Properties>) {}

    fn on_activity_resumed(&self, _activity: Option<&Activity>) {}

    fn on_activity_paused(&self, _activity: Option<&Activity>) {}
}
