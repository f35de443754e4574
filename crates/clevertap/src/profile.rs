//! Identify traits → CleverTap profile.

use bridge_core::Properties;
use serde_json::Value;

pub const IDENTITY_KEY: &str = "Identity";
pub const GENDER_KEY: &str = "Gender";

/// Segment trait names that CleverTap stores under its own profile keys.
pub const KNOWN_PROFILE_FIELDS: [(&str, &str); 5] = [
    ("phone", "Phone"),
    ("name", "Name"),
    ("email", "Email"),
    ("birthday", "DOB"),
    ("gender", GENDER_KEY),
];

const MALE_TOKENS: [&str; 2] = ["M", "MALE"];
const FEMALE_TOKENS: [&str; 2] = ["F", "FEMALE"];

fn profile_key(trait_key: &str) -> &str {
    KNOWN_PROFILE_FIELDS
        .iter()
        .find(|(from, _)| *from == trait_key)
        .map(|(_, to)| *to)
        .unwrap_or(trait_key)
}

/// `Some("M")` / `Some("F")` for recognised tokens in any casing, `None`
/// for everything else.
pub fn normalize_gender(gender: &str) -> Option<&'static str> {
    let upper = gender.to_uppercase();
    if MALE_TOKENS.contains(&upper.as_str()) {
        Some("M")
    } else if FEMALE_TOKENS.contains(&upper.as_str()) {
        Some("F")
    } else {
        None
    }
}

/// Build the login profile for an identify call.
///
/// Known trait keys are renamed, other keys are kept as they are. A
/// non-blank `user_id` becomes `Identity`. Gender is normalised when it is a
/// recognised token; any other value stays exactly as the caller sent it.
pub fn build_profile(user_id: &str, traits: &Properties) -> Properties {
    let mut profile: Properties = traits
        .iter()
        .map(|(key, value)| (profile_key(key).to_string(), value.clone()))
        .collect();

    if !user_id.trim().is_empty() {
        profile.insert(IDENTITY_KEY.to_string(), Value::String(user_id.to_string()));
    }

    let normalized = profile
        .get(GENDER_KEY)
        .and_then(Value::as_str)
        .and_then(normalize_gender);
    if let Some(gender) = normalized {
        profile.insert(GENDER_KEY.to_string(), Value::String(gender.to_string()));
    }

    profile
}
