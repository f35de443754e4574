//! Analytics event payloads delivered by the host pipeline.
//!
//! Destinations receive these by value and hand them back unchanged so the
//! next plugin in the chain sees the original event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Free-form key/value map carried by traits and properties. Insertion order
/// is preserved.
pub type Properties = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyEvent {
    pub message_id: Uuid,
    #[serde(default)]
    pub anonymous_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub traits: Properties,
    pub timestamp: DateTime<Utc>,
}

impl IdentifyEvent {
    pub fn new(user_id: impl Into<String>, traits: Properties) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            anonymous_id: String::new(),
            user_id: user_id.into(),
            traits,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEvent {
    pub message_id: Uuid,
    #[serde(default)]
    pub anonymous_id: String,
    #[serde(default)]
    pub user_id: String,
    pub event: String,
    #[serde(default)]
    pub properties: Properties,
    pub timestamp: DateTime<Utc>,
}

impl TrackEvent {
    pub fn new(event: impl Into<String>, properties: Properties) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            anonymous_id: String::new(),
            user_id: String::new(),
            event: event.into(),
            properties,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasEvent {
    pub message_id: Uuid,
    #[serde(default)]
    pub anonymous_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub previous_id: String,
    pub timestamp: DateTime<Utc>,
}

impl AliasEvent {
    pub fn new(user_id: impl Into<String>, previous_id: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            anonymous_id: String::new(),
            user_id: user_id.into(),
            previous_id: previous_id.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenEvent {
    pub message_id: Uuid,
    #[serde(default)]
    pub anonymous_id: String,
    #[serde(default)]
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub properties: Properties,
    pub timestamp: DateTime<Utc>,
}

impl ScreenEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            anonymous_id: String::new(),
            user_id: String::new(),
            name: name.into(),
            category: String::new(),
            properties: Properties::new(),
            timestamp: Utc::now(),
        }
    }
}

/// Any event the pipeline can route to a destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BaseEvent {
    Identify(IdentifyEvent),
    Track(TrackEvent),
    Alias(AliasEvent),
    Screen(ScreenEvent),
}

impl BaseEvent {
    pub fn message_id(&self) -> Uuid {
        match self {
            BaseEvent::Identify(e) => e.message_id,
            BaseEvent::Track(e) => e.message_id,
            BaseEvent::Alias(e) => e.message_id,
            BaseEvent::Screen(e) => e.message_id,
        }
    }
}
