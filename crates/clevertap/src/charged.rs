//! "Order Completed" → CleverTap charged event.

use bridge_core::{ChargedDetailsPolicy, Properties};
use serde_json::Value;

pub const ORDER_COMPLETED_EVENT: &str = "Order Completed";

pub const CHARGED_ID_KEY: &str = "Charged ID";
pub const AMOUNT_KEY: &str = "Amount";

const PRODUCTS_KEY: &str = "products";

/// Product fields forwarded as item attributes, in item order.
pub const ITEM_FIELDS: [&str; 4] = ["id", "name", "sku", "price"];

const ORDER_ID_KEYS: [&str; 2] = ["order_id", "orderid"];
const AMOUNT_KEYS: [&str; 3] = ["total", "revenue", "value"];

/// Order-level details and line items for `push_charged_event`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargedEvent {
    pub details: Properties,
    pub items: Vec<Properties>,
}

pub fn is_order_completed(event: &str) -> bool {
    event.eq_ignore_ascii_case(ORDER_COMPLETED_EVENT)
}

fn is_excluded(key: &str, policy: ChargedDetailsPolicy) -> bool {
    let key = key.to_lowercase();
    if key == PRODUCTS_KEY {
        return true;
    }
    match policy {
        ChargedDetailsPolicy::PassThrough => false,
        ChargedDetailsPolicy::NamedFields => {
            ORDER_ID_KEYS.contains(&key.as_str()) || AMOUNT_KEYS.contains(&key.as_str())
        }
    }
}

fn lookup<'a>(properties: &'a Properties, candidates: &[&str]) -> Option<&'a Value> {
    properties
        .iter()
        .find(|(key, value)| !value.is_null() && candidates.contains(&key.to_lowercase().as_str()))
        .map(|(_, value)| value)
}

fn order_amount(properties: &Properties) -> f64 {
    AMOUNT_KEYS
        .iter()
        .filter_map(|key| lookup(properties, &[*key]).and_then(Value::as_f64))
        .next()
        .unwrap_or(0.0)
}

fn item(product: &Properties) -> Properties {
    ITEM_FIELDS
        .iter()
        .filter_map(|field| {
            product
                .get(*field)
                .filter(|value| !value.is_null())
                .map(|value| (field.to_string(), value.clone()))
        })
        .collect()
}

/// Reshape the properties of an "Order Completed" track call.
pub fn build_charged_event(properties: &Properties, policy: ChargedDetailsPolicy) -> ChargedEvent {
    let mut details: Properties = properties
        .iter()
        .filter(|(key, value)| !value.is_null() && !is_excluded(key, policy))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    if policy == ChargedDetailsPolicy::NamedFields {
        if let Some(order_id) = lookup(properties, &ORDER_ID_KEYS) {
            details.insert(CHARGED_ID_KEY.to_string(), order_id.clone());
        }
        details.insert(AMOUNT_KEY.to_string(), Value::from(order_amount(properties)));
    }

    let items = properties
        .iter()
        .find(|(key, _)| key.to_lowercase() == PRODUCTS_KEY)
        .and_then(|(_, value)| value.as_array())
        .map(|products| {
            products
                .iter()
                .filter_map(Value::as_object)
                .map(item)
                .collect()
        })
        .unwrap_or_default();

    ChargedEvent { details, items }
}
