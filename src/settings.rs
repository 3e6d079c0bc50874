//! Persisted configuration and the key-binding tables.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::Error;
use crate::store::StoreMap;

pub const DEFAULT_MAX_SPEED: f64 = 4.0;
pub const MAX_SPEED_LIMITS: (f64, f64) = (2.0, 10.0);
pub const MANUAL_SPEED_LIMITS: (f64, f64) = (0.25, 4.0);
/// Floor for `slower`; the rate never reaches zero.
pub const MIN_SPEED: f64 = 0.07;

const DEFAULT_BLACKLIST: &str = "imgur.com\nteams.microsoft.com\n";

/// Store key holding the persisted speed for `domain`.
pub fn speed_key(domain: &str) -> String {
    format!("speed_{domain}")
}

/// Rounds to two decimal places.
pub fn round_speed(speed: f64) -> f64 {
    (speed * 100.0).round() / 100.0
}

pub fn validate_max_speed(max_speed: f64) -> Result<f64, Error> {
    let (min, max) = MAX_SPEED_LIMITS;
    if max_speed.is_finite() && (min..=max).contains(&max_speed) {
        Ok(max_speed)
    } else {
        Err(Error::MaxSpeedOutOfRange(max_speed))
    }
}

pub fn validate_manual_speed(speed: f64) -> Result<f64, Error> {
    let (min, max) = MANUAL_SPEED_LIMITS;
    if speed.is_finite() && (min..=max).contains(&speed) {
        Ok(speed)
    } else {
        Err(Error::SpeedOutOfRange { speed, min, max })
    }
}

/// Actions reachable from the extended key table and widget buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Slower,
    Faster,
    Rewind,
    Forward,
    Fast,
    Reset,
    Display,
    Muted,
    Pause,
    Mark,
    Jump,
    Blink,
}

impl Action {
    /// Actions that go through the speed pipeline.
    pub fn changes_speed(self) -> bool {
        matches!(
            self,
            Action::Faster | Action::Slower | Action::Reset | Action::Fast
        )
    }
}

/// One legacy shortcut: a physical key code plus exact modifier state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutBinding {
    pub key: String,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl ShortcutBinding {
    fn shifted(key: &str) -> Self {
        Self {
            key: key.to_owned(),
            shift: true,
            ctrl: false,
            alt: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcuts {
    pub increase: ShortcutBinding,
    pub decrease: ShortcutBinding,
    pub reset: ShortcutBinding,
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            increase: ShortcutBinding::shifted("Period"),
            decrease: ShortcutBinding::shifted("Comma"),
            reset: ShortcutBinding::shifted("KeyR"),
        }
    }
}

/// Entry of the extended key table. Lookup is by `key`, first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub action: Action,
    pub key: u32,
    pub value: f64,
    #[serde(default, deserialize_with = "bool_or_string")]
    pub force: bool,
    #[serde(default)]
    pub predefined: bool,
}

impl KeyBinding {
    fn predefined(action: Action, key: u32, value: f64) -> Self {
        Self {
            action,
            key,
            value,
            force: false,
            predefined: true,
        }
    }
}

// Older option pages stored `force` as the string "true".
fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(flag) => flag,
        Flag::Text(text) => text == "true",
    })
}

pub fn default_key_bindings() -> Vec<KeyBinding> {
    let mut bindings = vec![
        KeyBinding::predefined(Action::Slower, 83, 0.25),
        KeyBinding::predefined(Action::Faster, 68, 0.25),
        KeyBinding::predefined(Action::Rewind, 90, 10.0),
        KeyBinding::predefined(Action::Forward, 88, 10.0),
        KeyBinding::predefined(Action::Fast, 71, 5.0),
        KeyBinding::predefined(Action::Reset, 82, 1.0),
        KeyBinding::predefined(Action::Display, 86, 0.0),
    ];
    bindings.push(KeyBinding {
        predefined: false,
        ..KeyBinding::predefined(Action::Muted, 77, 0.0)
    });
    bindings
}

/// Everything loaded from the settings store at startup.
///
/// Owned by the page controller and changed only through its methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub persistence_enabled: bool,
    pub global_enabled: bool,
    pub enabled: bool,
    pub max_speed: f64,
    pub shortcuts: Shortcuts,
    pub remember_speed: bool,
    pub audio_boolean: bool,
    pub start_hidden: bool,
    pub controller_opacity: f64,
    pub key_bindings: Vec<KeyBinding>,
    pub blacklist: String,
    pub last_speed: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            persistence_enabled: true,
            global_enabled: true,
            enabled: true,
            max_speed: DEFAULT_MAX_SPEED,
            shortcuts: Shortcuts::default(),
            remember_speed: false,
            audio_boolean: false,
            start_hidden: false,
            controller_opacity: 0.3,
            key_bindings: default_key_bindings(),
            blacklist: DEFAULT_BLACKLIST.to_owned(),
            last_speed: 1.0,
        }
    }
}

impl Settings {
    /// The store request: every setting key with its default, plus the
    /// per-domain speed key defaulting to `current_speed`.
    pub fn store_request(&self, domain: &str, current_speed: f64) -> StoreMap {
        let mut request = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => StoreMap::new(),
        };
        request.insert(speed_key(domain), Value::from(current_speed));
        request
    }

    /// Builds settings from a store response, key by key. Keys missing from
    /// `stored` keep the values of `self`; a malformed value is logged and
    /// leaves only its own key at the current value.
    pub fn merged_with(&self, stored: &StoreMap) -> Self {
        let mut merged = self.clone();
        for (key, value) in stored {
            match merged.apply(key, value.clone()) {
                Ok(()) | Err(Error::UnknownSetting(_)) => {}
                Err(err) => log::warn!("ignoring malformed stored setting {key:?}: {err}"),
            }
        }
        merged
    }

    /// Sets one key by its store name, e.g. `startHidden`.
    pub fn apply(&mut self, setting: &str, value: Value) -> Result<(), Error> {
        let Value::Object(mut map) = serde_json::to_value(&*self)? else {
            return Err(Error::UnknownSetting(setting.to_owned()));
        };
        if !map.contains_key(setting) {
            return Err(Error::UnknownSetting(setting.to_owned()));
        }
        map.insert(setting.to_owned(), value);
        *self = serde_json::from_value(Value::Object(map))?;
        Ok(())
    }

    /// The persisted speed for `domain` in a store response, when one exists
    /// and is usable.
    pub fn domain_speed(stored: &StoreMap, domain: &str) -> Option<f64> {
        stored
            .get(&speed_key(domain))
            .and_then(Value::as_f64)
            .filter(|speed| *speed > 0.0 && speed.is_finite())
    }

    /// Value configured for the first binding of `action`, with the
    /// historical fallbacks when the table has none.
    pub fn binding_value(&self, action: Action) -> f64 {
        self.key_bindings
            .iter()
            .find(|binding| binding.action == action)
            .map(|binding| binding.value)
            .unwrap_or(if action == Action::Fast { 1.8 } else { 1.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn request_contains_defaults_and_domain_key() {
        let request = Settings::default().store_request("example.com", 1.0);
        assert_eq!(request["maxSpeed"], json!(4.0));
        assert_eq!(request["audioBoolean"], json!(false));
        assert_eq!(request["speed_example.com"], json!(1.0));
        assert_eq!(request["keyBindings"].as_array().map(Vec::len), Some(8));
    }

    #[test]
    fn merge_keeps_defaults_for_missing_keys() {
        let stored = json!({
            "maxSpeed": 6.0,
            "startHidden": true,
            "unrelated": "ignored",
        });
        let Value::Object(stored) = stored else { unreachable!() };
        let merged = Settings::default().merged_with(&stored);

        assert_eq!(merged.max_speed, 6.0);
        assert!(merged.start_hidden);
        assert_eq!(merged.shortcuts, Shortcuts::default());
    }

    #[test]
    fn malformed_store_values_fall_back_to_current() {
        let Value::Object(stored) = json!({ "maxSpeed": "fast" }) else {
            unreachable!()
        };
        let merged = Settings::default().merged_with(&stored);
        assert_eq!(merged, Settings::default());
    }

    #[test]
    fn one_malformed_key_does_not_discard_the_others() {
        let Value::Object(stored) = json!({
            "blacklist": "example.com",
            "maxSpeed": 6.0,
            "startHidden": true,
            "keyBindings": [{ "action": "speedup", "key": 68, "value": 0.25 }],
        }) else {
            unreachable!()
        };
        let merged = Settings::default().merged_with(&stored);

        assert_eq!(merged.blacklist, "example.com");
        assert_eq!(merged.max_speed, 6.0);
        assert!(merged.start_hidden);
        assert_eq!(merged.key_bindings, default_key_bindings());
    }

    #[test]
    fn legacy_string_force_flag_is_accepted() {
        let binding: KeyBinding =
            serde_json::from_value(json!({ "action": "pause", "key": 80, "value": 0, "force": "true" }))
                .unwrap();
        assert!(binding.force);
        assert_eq!(binding.action, Action::Pause);

        let binding: KeyBinding =
            serde_json::from_value(json!({ "action": "mark", "key": 77, "value": 0 })).unwrap();
        assert!(!binding.force);
    }

    #[test]
    fn apply_rejects_unknown_and_mistyped_settings() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.apply("noSuchThing", json!(1)),
            Err(Error::UnknownSetting(_))
        ));
        assert!(settings.apply("startHidden", json!("yes")).is_err());
        assert!(!settings.start_hidden);

        settings.apply("startHidden", json!(true)).unwrap();
        assert!(settings.start_hidden);
    }

    #[test]
    fn domain_speed_ignores_zero_and_missing() {
        let Value::Object(stored) = json!({ "speed_a.test": 1.75, "speed_b.test": 0 }) else {
            unreachable!()
        };
        assert_eq!(Settings::domain_speed(&stored, "a.test"), Some(1.75));
        assert_eq!(Settings::domain_speed(&stored, "b.test"), None);
        assert_eq!(Settings::domain_speed(&stored, "c.test"), None);
    }

    #[test]
    fn range_validation() {
        assert!(validate_max_speed(2.0).is_ok());
        assert!(validate_max_speed(10.0).is_ok());
        assert!(validate_max_speed(1.5).is_err());
        assert!(validate_max_speed(f64::NAN).is_err());
        assert!(validate_manual_speed(0.25).is_ok());
        assert!(validate_manual_speed(4.5).is_err());
    }

    #[test]
    fn binding_value_fallbacks() {
        let mut settings = Settings::default();
        assert_eq!(settings.binding_value(Action::Rewind), 10.0);
        settings.key_bindings.clear();
        assert_eq!(settings.binding_value(Action::Fast), 1.8);
        assert_eq!(settings.binding_value(Action::Rewind), 1.0);
    }

    #[test]
    fn speeds_round_to_two_decimals() {
        assert_eq!(round_speed(1.23456), 1.23);
        assert_eq!(round_speed(0.1 + 0.2), 0.3);
    }
}
