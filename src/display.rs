use std::time::Duration;

use crate::clock::{Interval, Timer};
use crate::page::{DisplayHealth, Page};

/// How long the floating speed display stays up after a change.
pub const DISPLAY_DURATION: Duration = Duration::from_millis(2500);
/// Period of the display's self-check.
pub const HEAL_PERIOD: Duration = Duration::from_secs(5);

/// Page-wide floating speed readout.
#[derive(Debug)]
pub struct SpeedDisplay {
    text: String,
    visible: bool,
    hide_timer: Timer,
    heal: Interval,
}

impl SpeedDisplay {
    pub fn mount<P: Page>(page: &mut P, now: Duration) -> Self {
        page.mount_speed_display();
        Self {
            text: String::new(),
            visible: false,
            hide_timer: Timer::default(),
            heal: Interval::new(now, HEAL_PERIOD),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Shows `speed` and restarts the fade-out countdown.
    pub fn show<P: Page>(&mut self, page: &mut P, now: Duration, speed: f64) {
        if page.speed_display_health() == DisplayHealth::Detached {
            page.mount_speed_display();
        }
        self.text = format!("{speed}x");
        self.visible = true;
        page.render_speed_display(&self.text, true);
        self.hide_timer.arm(now, DISPLAY_DURATION);
    }

    pub fn tick<P: Page>(&mut self, page: &mut P, now: Duration) {
        if self.hide_timer.fire(now) {
            self.visible = false;
            page.render_speed_display(&self.text, false);
        }
        if self.heal.tick(now) {
            self.heal(page);
        }
    }

    /// Re-creates the display if the site removed or restyled it. Does
    /// nothing when it is intact.
    pub fn heal<P: Page>(&mut self, page: &mut P) -> bool {
        match page.speed_display_health() {
            DisplayHealth::Healthy => false,
            health => {
                log::debug!("repairing speed display ({health:?})");
                page.mount_speed_display();
                page.render_speed_display(&self.text, self.visible);
                true
            }
        }
    }
}
