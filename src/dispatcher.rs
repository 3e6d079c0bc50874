//! Keyboard and button input mapped onto the fixed action vocabulary, and
//! the speed pipeline those actions feed.

use std::time::Duration;

use serde_json::Value;

use crate::controller::PageController;
use crate::media::MediaId;
use crate::page::{CANCELLED_CLASS, Page};
use crate::platform::{Feature, format_timestamp};
use crate::settings::{Action, KeyBinding, MIN_SPEED, ShortcutBinding, Shortcuts, round_speed, speed_key};
use crate::store::StoreMap;
use crate::widget::DEFAULT_BLINK;

/// Step used by the widget's faster/slower buttons, whatever the key table
/// says.
pub const BUTTON_STEP: f64 = 0.25;

/// A `keydown` event as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    /// Physical key, e.g. `KeyR` or `Period`.
    pub code: String,
    /// Legacy numeric key code, e.g. 82 for R.
    pub key_code: u32,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
    pub fn_key: bool,
    pub os: bool,
    pub hyper: bool,
    /// Focus is inside an input, textarea or contenteditable element.
    pub target_editable: bool,
}

impl KeyEvent {
    pub fn new(code: &str, key_code: u32) -> Self {
        Self {
            code: code.to_owned(),
            key_code,
            ..Self::default()
        }
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn editable(mut self) -> Self {
        self.target_editable = true;
        self
    }

    /// Any modifier other than Shift.
    pub fn has_blocking_modifier(&self) -> bool {
        self.alt || self.ctrl || self.meta || self.fn_key || self.os || self.hyper
    }
}

/// What the host should do with a key event after dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Handled {
        prevent_default: bool,
        stop_propagation: bool,
    },
}

impl KeyOutcome {
    const CONSUMED: KeyOutcome = KeyOutcome::Handled {
        prevent_default: true,
        stop_propagation: false,
    };

    pub fn is_handled(self) -> bool {
        matches!(self, KeyOutcome::Handled { .. })
    }
}

fn matches_shortcut(event: &KeyEvent, binding: &ShortcutBinding) -> bool {
    event.code == binding.key
        && event.shift == binding.shift
        && event.ctrl == binding.ctrl
        && event.alt == binding.alt
}

/// Matches the three legacy shortcuts, in increase/decrease/reset order.
pub fn match_shortcut(shortcuts: &Shortcuts, event: &KeyEvent) -> Option<(Action, f64)> {
    if matches_shortcut(event, &shortcuts.increase) {
        Some((Action::Faster, BUTTON_STEP))
    } else if matches_shortcut(event, &shortcuts.decrease) {
        Some((Action::Slower, BUTTON_STEP))
    } else if matches_shortcut(event, &shortcuts.reset) {
        Some((Action::Reset, 1.0))
    } else {
        None
    }
}

/// First binding for `key_code`.
pub fn match_binding(bindings: &[KeyBinding], key_code: u32) -> Option<&KeyBinding> {
    bindings.iter().find(|binding| binding.key == key_code)
}

fn live_or(live: f64, fallback: f64) -> f64 {
    if live.is_finite() && live > 0.0 {
        live
    } else {
        fallback
    }
}

/// `faster`: rates below 0.1 count as zero, the result is capped at
/// `max_speed`.
pub fn faster_speed(live: f64, fallback: f64, step: f64, max_speed: f64) -> f64 {
    let base = live_or(live, fallback);
    let base = if base < 0.1 { 0.0 } else { base };
    round_speed((base + step).min(max_speed).max(0.0))
}

/// `slower`: never below [`MIN_SPEED`].
pub fn slower_speed(live: f64, fallback: f64, step: f64) -> f64 {
    round_speed((live_or(live, fallback) - step).max(MIN_SPEED))
}

impl<P: Page> PageController<P> {
    /// Dispatches a `keydown` event.
    pub fn handle_key(&mut self, event: &KeyEvent) -> KeyOutcome {
        if event.has_blocking_modifier() {
            if let Some((action, value)) = match_shortcut(&self.settings.shortcuts, event) {
                log::debug!("[vsc-{}] shortcut {} -> {action:?}", self.instance, event.code);
                self.run_action(action, value, None);
                return KeyOutcome::CONSUMED;
            }
            if self.handle_platform_key(event) {
                return KeyOutcome::CONSUMED;
            }
            return KeyOutcome::Ignored;
        }

        if event.target_editable || self.registry.is_empty() {
            return KeyOutcome::Ignored;
        }

        let Some(binding) = match_binding(&self.settings.key_bindings, event.key_code).cloned() else {
            return KeyOutcome::Ignored;
        };
        log::debug!(
            "[vsc-{}] key {} -> {:?} {} (max {})",
            self.instance,
            event.key_code,
            binding.action,
            binding.value,
            self.state.max_speed
        );
        self.run_action(binding.action, binding.value, None);
        KeyOutcome::Handled {
            prevent_default: binding.force,
            stop_propagation: binding.force,
        }
    }

    fn handle_platform_key(&mut self, event: &KeyEvent) -> bool {
        let Some(config) = self.platform_config() else {
            return false;
        };
        if !event.ctrl || event.target_editable {
            return false;
        }
        match event.code.as_str() {
            "ArrowLeft" | "ArrowRight" if config.has(Feature::ChapterNavigation) => {
                let next = event.code == "ArrowRight";
                if let Some(lectures) = config.lectures {
                    let selector = if next { lectures.next } else { lectures.previous };
                    if self.page.click(selector, false) {
                        self.page
                            .show_toast(if next { "Next lecture" } else { "Previous lecture" });
                    }
                }
                true
            }
            "KeyN" if config.has(Feature::NoteTimestamps) => {
                self.add_timestamped_note();
                true
            }
            _ => false,
        }
    }

    fn add_timestamped_note(&mut self) {
        let Some(node) = self.registry.first().map(|entry| entry.node) else {
            return;
        };
        let timestamp = format_timestamp(self.page.current_time(node));
        let note = format!("[{timestamp}] Note: ");
        let message = match self.page.write_clipboard(&note) {
            Ok(()) => format!("Timestamp {timestamp} copied to clipboard"),
            Err(err) => {
                log::debug!("clipboard unavailable: {err}");
                format!("Timestamp: {timestamp}")
            }
        };
        self.page.show_toast(&message);
    }

    /// Runs `action` against every eligible element, or only the element
    /// owning widget `scope`.
    pub fn run_action(&mut self, action: Action, value: f64, scope: Option<MediaId>) {
        if action.changes_speed() {
            self.sync_current_speed();
        }

        let now = self.clock.now();
        let mut targets = Vec::new();
        for id in self.registry.ids() {
            if scope.is_some_and(|scope| scope != id) {
                continue;
            }
            let Some(entry) = self.registry.get_mut(id) else {
                continue;
            };
            entry.widget.flash(now);
            let node = entry.node;
            self.render_widget(id);
            if !self.page.has_class(node, CANCELLED_CLASS) {
                targets.push(id);
            }
        }

        if action.changes_speed() {
            let Some(first) = targets.first().and_then(|id| self.registry.get(*id)) else {
                return;
            };
            let live = self.page.playback_rate(first.node);
            let speed = match action {
                Action::Faster => {
                    self.state.current_speed = live_or(live, self.state.current_speed);
                    faster_speed(live, self.state.current_speed, value, self.state.max_speed)
                }
                Action::Slower => {
                    self.state.current_speed = live_or(live, self.state.current_speed);
                    slower_speed(live, self.state.current_speed, value)
                }
                Action::Reset => 1.0,
                _ => value,
            };
            self.apply_speed(speed, scope);
            return;
        }

        for id in targets {
            self.execute(action, value, id);
        }
    }

    fn execute(&mut self, action: Action, value: f64, id: MediaId) {
        let now = self.clock.now();
        let Some(entry) = self.registry.get_mut(id) else {
            return;
        };
        let node = entry.node;
        match action {
            Action::Rewind => {
                let time = self.page.current_time(node);
                self.page.set_current_time(node, time - value);
            }
            Action::Forward => {
                let time = self.page.current_time(node);
                self.page.set_current_time(node, time + value);
            }
            Action::Display => entry.widget.toggle(),
            Action::Pause => {
                if self.page.is_paused(node) {
                    self.page.play(node);
                } else {
                    self.page.pause(node);
                }
            }
            Action::Muted => {
                let muted = self.page.is_muted(node);
                self.page.set_muted(node, !muted);
            }
            Action::Mark => entry.mark = Some(self.page.current_time(node)),
            Action::Jump => {
                if let Some(mark) = entry.mark {
                    self.page.set_current_time(node, mark);
                }
            }
            Action::Blink => {
                let duration = if value > 0.0 {
                    Duration::try_from_secs_f64(value / 1000.0).unwrap_or(DEFAULT_BLINK)
                } else {
                    DEFAULT_BLINK
                };
                entry.widget.blink(now, duration);
            }
            Action::Faster | Action::Slower | Action::Reset | Action::Fast => {}
        }
        self.render_widget(id);
    }

    /// Pulls the current speed from the first tracked element when something
    /// outside the controller changed its rate.
    pub fn sync_current_speed(&mut self) {
        let Some(first) = self.registry.first() else {
            return;
        };
        let live = self.page.playback_rate(first.node);
        if live.is_finite() && live > 0.0 && (live - self.state.current_speed).abs() > 0.01 {
            log::debug!(
                "[vsc-{}] syncing speed {} -> {live}",
                self.instance,
                self.state.current_speed
            );
            self.state.current_speed = round_speed(live);
        }
    }

    /// The speed pipeline. Returns the applied (rounded) speed.
    pub fn set_speed(&mut self, speed: f64) -> f64 {
        self.apply_speed(speed, None)
    }

    // Order matters: elements, then visual feedback, then the store write,
    // then the badge.
    fn apply_speed(&mut self, speed: f64, scope: Option<MediaId>) -> f64 {
        let speed = round_speed(speed);
        self.state.current_speed = speed;

        for id in self.registry.ids() {
            if scope.is_some_and(|scope| scope != id) {
                continue;
            }
            let Some(entry) = self.registry.get_mut(id) else {
                continue;
            };
            if self.page.ready_state(entry.node) >= 1 {
                self.page.set_playback_rate(entry.node, speed);
                entry.speed = speed;
                entry.widget.set_speed(speed);
                self.render_widget(id);
            }
        }

        self.display.show(&mut self.page, self.clock.now(), speed);

        let mut items = StoreMap::new();
        items.insert(speed_key(&self.state.domain), Value::from(speed));
        if let Err(err) = self.store.set(items) {
            log::warn!("[vsc-{}] saving speed failed: {err}", self.instance);
        }

        self.report_speed();
        speed
    }
}
