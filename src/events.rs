//! Notifications a tracked element or its widget raises, forwarded by the
//! host.

use serde_json::Value;

use crate::controller::PageController;
use crate::dispatcher::BUTTON_STEP;
use crate::media::MediaId;
use crate::page::{DRAGGING_CLASS, Page};
use crate::settings::{Action, round_speed, speed_key};
use crate::store::StoreMap;
use crate::widget::{DEFAULT_BLINK, WidgetButton};

impl<P: Page> PageController<P> {
    /// The element started playing: re-applies the speed its source
    /// resolves to.
    pub fn on_play(&mut self, node: P::Node) {
        if !self.state.is_enabled || self.registry.find(node).is_none() {
            return;
        }
        let source = self.page.current_src(node);
        let speed = self.speeds.resolve(&source, self.settings.remember_speed);
        self.page.set_playback_rate(node, speed);
    }

    /// The element's rate changed, whoever changed it. The live rate becomes
    /// the current speed and is persisted.
    pub fn on_rate_change(&mut self, node: P::Node) {
        let Some(id) = self.registry.find(node) else {
            return;
        };
        if !self.state.is_enabled || self.page.ready_state(node) == 0 {
            return;
        }
        let speed = round_speed(self.page.playback_rate(node));
        let source = self.page.current_src(node);
        self.speeds.record(&source, speed);
        self.settings.last_speed = speed;
        self.state.current_speed = speed;

        let now = self.clock.now();
        if let Some(entry) = self.registry.get_mut(id) {
            entry.speed = speed;
            entry.widget.set_speed(speed);
            entry.widget.flash(now);
            entry.widget.blink(now, DEFAULT_BLINK);
        }

        let mut items = StoreMap::new();
        items.insert("lastSpeed".to_owned(), Value::from(speed));
        items.insert(speed_key(&self.state.domain), Value::from(speed));
        if let Err(err) = self.store.set(items) {
            log::warn!("[vsc-{}] saving speed failed: {err}", self.instance);
        }

        self.report_speed();
        self.display.show(&mut self.page, now, speed);
        self.render_widget(id);
    }

    /// The element's `src` changed. An element with no source hides its
    /// widget.
    pub fn on_source_change(&mut self, node: P::Node) {
        let Some(id) = self.registry.find(node) else {
            return;
        };
        let empty = self.page.current_src(node).is_empty();
        if let Some(entry) = self.registry.get_mut(id) {
            entry.widget.set_no_source(empty);
        }
        self.render_widget(id);
    }

    /// A button on widget `id` was clicked. Only the widget's own element is
    /// affected.
    pub fn click_widget(&mut self, id: MediaId, button: WidgetButton) {
        if self.registry.get(id).is_none() {
            return;
        }
        let action = button.action();
        let value = match action {
            Action::Faster | Action::Slower => BUTTON_STEP,
            other => self.settings.binding_value(other),
        };
        self.run_action(action, value, Some(id));
    }

    pub fn begin_drag(&mut self, id: MediaId, pointer: (f64, f64)) {
        let Some(entry) = self.registry.get_mut(id) else {
            return;
        };
        entry.widget.begin_drag(pointer);
        let node = entry.node;
        self.page.add_class(node, DRAGGING_CLASS);
        self.render_widget(id);
    }

    pub fn drag_to(&mut self, id: MediaId, pointer: (f64, f64)) {
        let moved = self
            .registry
            .get_mut(id)
            .is_some_and(|entry| entry.widget.drag_to(pointer));
        if moved {
            self.render_widget(id);
        }
    }

    /// Pointer-up or pointer-leave.
    pub fn end_drag(&mut self, id: MediaId) {
        let Some(entry) = self.registry.get_mut(id) else {
            return;
        };
        if entry.widget.end_drag() {
            let node = entry.node;
            self.page.remove_class(node, DRAGGING_CLASS);
            self.render_widget(id);
        }
    }
}
