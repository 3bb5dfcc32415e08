use std::time::{Duration, Instant};

/// Default inactivity period before transport controls hide
pub const DEFAULT_HIDE_AFTER: Duration = Duration::from_secs(3);

/// Auto-hide timer for the transport controls.
///
/// Controls start visible. Every interaction shows them and re-arms the
/// timer. They only hide once the timer has elapsed while playback is
/// running, and never while the control set holds focus.
#[derive(Debug, Clone)]
pub struct ControlsVisibility {
    visible: bool,
    focused: bool,
    hide_after: Duration,
    deadline: Option<Instant>,
}

impl ControlsVisibility {
    pub fn new(hide_after: Duration) -> Self {
        Self {
            visible: true,
            focused: false,
            hide_after,
            deadline: None,
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn focused(&self) -> bool {
        self.focused
    }

    /// Pending hide deadline, if armed
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Register a user interaction at `now`
    pub fn touch(&mut self, now: Instant) {
        self.visible = true;
        self.deadline = Some(now + self.hide_after);
    }

    /// Mark the control set as focused; focus holds the controls open
    pub fn set_focused(&mut self, focused: bool, now: Instant) {
        self.focused = focused;
        if focused {
            self.visible = true;
            self.deadline = None;
        } else {
            self.touch(now);
        }
    }

    /// Evaluate the timer; returns true when the controls just hid
    pub fn tick(&mut self, now: Instant, playing: bool) -> bool {
        if !self.visible || self.focused || !playing {
            return false;
        }
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.visible = false;
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop the pending deadline and show the controls
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.visible = true;
    }
}

impl Default for ControlsVisibility {
    fn default() -> Self {
        Self::new(DEFAULT_HIDE_AFTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hides_only_while_playing() {
        let start = Instant::now();
        let mut controls = ControlsVisibility::default();
        controls.touch(start);

        assert!(!controls.tick(start + Duration::from_secs(4), false));
        assert!(controls.visible());

        // Deadline stays armed until playback runs
        assert!(controls.tick(start + Duration::from_secs(5), true));
        assert!(!controls.visible());
    }

    #[test]
    fn test_interaction_resets_timer() {
        let start = Instant::now();
        let mut controls = ControlsVisibility::default();
        controls.touch(start);
        controls.touch(start + Duration::from_secs(2));

        assert!(!controls.tick(start + Duration::from_millis(3500), true));
        assert!(controls.tick(start + Duration::from_secs(5), true));
    }

    #[test]
    fn test_focus_holds_controls_open() {
        let start = Instant::now();
        let mut controls = ControlsVisibility::default();
        controls.touch(start);
        controls.set_focused(true, start + Duration::from_secs(1));

        assert!(!controls.tick(start + Duration::from_secs(10), true));
        assert!(controls.visible());

        controls.set_focused(false, start + Duration::from_secs(10));
        assert!(!controls.tick(start + Duration::from_secs(12), true));
        assert!(controls.tick(start + Duration::from_secs(13), true));
    }

    #[test]
    fn test_untouched_controls_never_hide() {
        let start = Instant::now();
        let mut controls = ControlsVisibility::default();
        assert!(!controls.tick(start + Duration::from_secs(60), true));
        assert!(controls.visible());
    }
}
