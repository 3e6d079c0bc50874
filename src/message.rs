//! Request/response messages exchanged with the popup and background
//! contexts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;
use crate::badge::TabId;
use crate::controller::PageController;
use crate::page::Page;
use crate::platform::{Platform, PlatformConfig};
use crate::settings::{MIN_SPEED, Settings, Shortcuts, validate_max_speed};
use crate::store::StoreMap;

/// Every `action` a page controller answers to.
pub const ACTIONS: [&str; 10] = [
    "getSettings",
    "saveSettings",
    "setSpeed",
    "getStatus",
    "toggleEnabled",
    "updateMaxSpeed",
    "updateShortcuts",
    "applyEducationalSpeed",
    "updateEnhancedSetting",
    "updateBadge",
];

/// A decoded request, tagged by its `action` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    GetSettings,
    SaveSettings {
        settings: StoreMap,
    },
    SetSpeed {
        speed: f64,
    },
    GetStatus,
    ToggleEnabled {
        enabled: bool,
    },
    UpdateMaxSpeed {
        max_speed: f64,
    },
    UpdateShortcuts {
        shortcuts: Shortcuts,
    },
    ApplyEducationalSpeed {
        speed: f64,
    },
    UpdateEnhancedSetting {
        setting: String,
        value: Value,
    },
    UpdateBadge {
        speed: f64,
        #[serde(default)]
        tab_id: Option<TabId>,
    },
}

/// A flat response object. Absent fields are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<StoreMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub educational_platform: Option<Platform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_config: Option<&'static PlatformConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcuts: Option<Shortcuts>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

impl<P: Page> PageController<P> {
    /// Answers one request. Failures become `success: false` responses.
    pub fn handle_message(&mut self, command: Command) -> Response {
        log::debug!("[vsc-{}] message {command:?}", self.instance);
        match self.execute_command(command) {
            Ok(response) => response,
            Err(err) => {
                log::debug!("[vsc-{}] message failed: {err}", self.instance);
                Response::failure(err.to_string())
            }
        }
    }

    /// Decodes a raw request and encodes the response.
    pub fn handle_json(&mut self, request: Value) -> Value {
        let known = request
            .get("action")
            .and_then(Value::as_str)
            .is_some_and(|action| ACTIONS.contains(&action));
        let response = if !known {
            Response::failure("Unknown action")
        } else {
            match serde_json::from_value::<Command>(request) {
                Ok(command) => self.handle_message(command),
                Err(err) => Response::failure(Error::from(err).to_string()),
            }
        };
        serde_json::to_value(&response).unwrap_or_else(|err| {
            serde_json::json!({ "success": false, "error": err.to_string() })
        })
    }

    fn execute_command(&mut self, command: Command) -> Result<Response, Error> {
        match command {
            Command::GetSettings => {
                let request = self
                    .settings
                    .store_request(&self.state.domain, self.state.current_speed);
                let settings = self.store.get(&request)?;
                Ok(Response {
                    settings: Some(settings),
                    ..Response::ok()
                })
            }
            Command::SaveSettings { settings } => {
                if let Some(max_speed) = settings.get("maxSpeed") {
                    let max_speed = max_speed.as_f64().unwrap_or(f64::NAN);
                    validate_max_speed(max_speed)?;
                }
                self.store.set(settings)?;
                Ok(Response::ok())
            }
            Command::SetSpeed { speed } => {
                if !speed.is_finite() || speed <= 0.0 {
                    return Err(Error::SpeedOutOfRange {
                        speed,
                        min: MIN_SPEED,
                        max: self.state.max_speed,
                    });
                }
                let speed = self.set_speed(speed.clamp(MIN_SPEED, self.state.max_speed));
                Ok(Response {
                    current_speed: Some(speed),
                    ..Response::ok()
                })
            }
            Command::GetStatus => Ok(Response {
                current_speed: Some(self.state.current_speed),
                domain: Some(self.state.domain.clone()),
                video_count: Some(self.tracked_count()),
                controller_count: Some(self.tracked_count()),
                is_enabled: Some(self.state.is_enabled),
                educational_platform: self.platform,
                platform_config: self.platform_config(),
                ..Response::ok()
            }),
            Command::ToggleEnabled { enabled } => {
                self.set_enabled(enabled);
                Ok(Response {
                    is_enabled: Some(self.state.is_enabled),
                    ..Response::ok()
                })
            }
            Command::UpdateMaxSpeed { max_speed } => {
                let max_speed = validate_max_speed(max_speed)?;
                log::debug!(
                    "[vsc-{}] max speed {} -> {max_speed}",
                    self.instance,
                    self.state.max_speed
                );
                self.state.max_speed = max_speed;
                self.settings.max_speed = max_speed;
                Ok(Response {
                    max_speed: Some(max_speed),
                    ..Response::ok()
                })
            }
            Command::UpdateShortcuts { shortcuts } => {
                self.settings.shortcuts = shortcuts.clone();
                Ok(Response {
                    shortcuts: Some(shortcuts),
                    ..Response::ok()
                })
            }
            Command::ApplyEducationalSpeed { speed } => {
                match self.platform_config() {
                    Some(config) if config.recommends(speed) => {}
                    _ => return Err(Error::NotRecommended(speed)),
                }
                let speed = self.set_speed(speed);
                Ok(Response {
                    current_speed: Some(speed),
                    ..Response::ok()
                })
            }
            Command::UpdateEnhancedSetting { setting, value } => {
                self.update_setting(&setting, value)?;
                Ok(Response::ok())
            }
            Command::UpdateBadge { speed, tab_id } => {
                self.reporter.report(speed, tab_id)?;
                Ok(Response::ok())
            }
        }
    }

    /// Updates one setting in memory and applies its immediate side effect.
    /// Persisting it is the caller's job.
    pub fn update_setting(&mut self, setting: &str, value: Value) -> Result<(), Error> {
        if setting == "maxSpeed" {
            validate_max_speed(value.as_f64().unwrap_or(f64::NAN))?;
        }
        let mut updated: Settings = self.settings.clone();
        updated.apply(setting, value)?;
        self.settings = updated;
        log::debug!(
            "[vsc-{}] setting {setting} updated ({} tracked)",
            self.instance,
            self.tracked_count()
        );

        match setting {
            "startHidden" => self.set_widgets_hidden(self.settings.start_hidden),
            "controllerOpacity" => self.set_widget_opacity(self.settings.controller_opacity),
            "maxSpeed" => self.state.max_speed = self.settings.max_speed,
            "globalEnabled" => self.set_enabled(self.settings.global_enabled),
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn commands_decode_from_flat_objects() {
        let command: Command =
            serde_json::from_value(json!({ "action": "updateMaxSpeed", "maxSpeed": 6 })).unwrap();
        assert_eq!(command, Command::UpdateMaxSpeed { max_speed: 6.0 });

        let command: Command =
            serde_json::from_value(json!({ "action": "updateBadge", "speed": 1.5 })).unwrap();
        assert_eq!(
            command,
            Command::UpdateBadge {
                speed: 1.5,
                tab_id: None
            }
        );

        let command: Command = serde_json::from_value(json!({ "action": "getStatus" })).unwrap();
        assert_eq!(command, Command::GetStatus);
    }

    #[test]
    fn every_listed_action_is_a_command() {
        for action in ACTIONS {
            let err = serde_json::from_value::<Command>(json!({ "action": action }))
                .err()
                .map(|err| err.to_string())
                .unwrap_or_default();
            assert!(!err.contains("unknown variant"), "{action}: {err}");
        }
    }

    #[test]
    fn responses_omit_absent_fields() {
        let response = Response {
            current_speed: Some(1.5),
            ..Response::ok()
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "success": true, "currentSpeed": 1.5 })
        );
        assert_eq!(
            serde_json::to_value(Response::failure("Unknown action")).unwrap(),
            json!({ "success": false, "error": "Unknown action" })
        );
    }
}
