//! Typed site settings.
//!
//! Settings form a flat key namespace; the group label is a display
//! attribute only. Each row carries a type tag deciding how its raw text
//! value is read back: `plain` values pass through as strings, `structured`
//! values parse as JSON. A structured value that fails to parse is treated
//! as absent and the caller's default is used, so a half-written setting can
//! never take the landing page down.

use serde_json::{json, Value};

use crate::db::models::Setting;

pub const TYPE_PLAIN: &str = "plain";
pub const TYPE_STRUCTURED: &str = "structured";

/// A setting value resolved through its stored type tag.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Plain(String),
    Structured(Value),
}

impl SettingValue {
    pub fn into_json(self) -> Value {
        match self {
            SettingValue::Plain(s) => Value::String(s),
            SettingValue::Structured(v) => v,
        }
    }
}

/// Resolve a stored row by its type tag. Returns None when a structured
/// value does not parse; the caller falls back to its default.
pub fn resolve(setting: &Setting) -> Option<SettingValue> {
    match setting.value_type.as_str() {
        TYPE_STRUCTURED => serde_json::from_str(&setting.value)
            .ok()
            .map(SettingValue::Structured),
        _ => Some(SettingValue::Plain(setting.value.clone())),
    }
}

/// Look up `key` in a fetched settings list, falling back to `default` when
/// the key is absent or its structured value is unparseable.
pub fn value_or(settings: &[Setting], key: &str, default: Value) -> Value {
    settings
        .iter()
        .find(|s| s.key == key)
        .and_then(resolve)
        .map(SettingValue::into_json)
        .unwrap_or(default)
}

/// Validate a type tag on write.
pub fn validate_type(value_type: &str) -> bool {
    value_type == TYPE_PLAIN || value_type == TYPE_STRUCTURED
}

/// The landing-page payload. Every field is independently defaulted; a
/// missing or corrupt setting affects only its own section.
pub fn landing_payload(settings: &[Setting]) -> Value {
    json!({
        "site_title": value_or(settings, "site_title", json!("International Research Conference")),
        "tagline": value_or(settings, "tagline", json!("Advancing knowledge together")),
        "hero": value_or(settings, "hero", json!({
            "heading": "Call for Papers",
            "subheading": "Submit your abstract today",
            "image_handle": "",
        })),
        "about": value_or(settings, "about", json!({
            "title": "About the Conference",
            "body": "",
        })),
        "important_dates": value_or(settings, "important_dates", json!([])),
        "venue": value_or(settings, "venue", json!({
            "name": "",
            "address": "",
            "map_url": "",
        })),
        "speakers": value_or(settings, "speakers", json!([])),
        "sponsors": value_or(settings, "sponsors", json!([])),
        "registration_fees": value_or(settings, "registration_fees", json!([])),
        "contact": value_or(settings, "contact", json!({
            "email": "",
            "phone": "",
        })),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn setting(key: &str, value_type: &str, value: &str) -> Setting {
        Setting {
            key: key.to_string(),
            group_label: "landing".to_string(),
            value_type: value_type.to_string(),
            value: value.to_string(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_missing_key_returns_default() {
        let default = json!({"a": 1});
        assert_eq!(value_or(&[], "nonexistent_key", default.clone()), default);
    }

    #[test]
    fn test_plain_value_passes_through() {
        let settings = vec![setting("site_title", TYPE_PLAIN, "RegCon 2026")];
        assert_eq!(
            value_or(&settings, "site_title", json!("fallback")),
            json!("RegCon 2026")
        );
    }

    #[test]
    fn test_structured_value_round_trips() {
        let original = json!({"heading": "Welcome", "nested": {"n": 3}});
        let settings = vec![setting("hero", TYPE_STRUCTURED, &original.to_string())];
        assert_eq!(value_or(&settings, "hero", json!({})), original);
    }

    #[test]
    fn test_unparseable_structured_value_falls_back() {
        let settings = vec![setting("hero", TYPE_STRUCTURED, "{not json")];
        let default = json!({"heading": "fallback"});
        assert_eq!(value_or(&settings, "hero", default.clone()), default);
    }

    #[test]
    fn test_landing_payload_renders_with_no_settings_at_all() {
        let payload = landing_payload(&[]);
        assert!(payload["site_title"].is_string());
        assert!(payload["hero"]["heading"].is_string());
        assert!(payload["speakers"].is_array());
    }

    #[test]
    fn test_corrupt_setting_only_affects_its_own_section() {
        let settings = vec![
            setting("site_title", TYPE_PLAIN, "RegCon 2026"),
            setting("speakers", TYPE_STRUCTURED, "oops"),
        ];
        let payload = landing_payload(&settings);
        assert_eq!(payload["site_title"], json!("RegCon 2026"));
        assert_eq!(payload["speakers"], json!([]));
    }

    #[test]
    fn test_validate_type() {
        assert!(validate_type(TYPE_PLAIN));
        assert!(validate_type(TYPE_STRUCTURED));
        assert!(!validate_type("yaml"));
    }
}
