use crate::fsm::ButtonRenderer;
use std::time::{Duration, Instant};

pub const BUTTON_ALPHA: f64 = 0.6;
pub const DISABLED_ALPHA: f64 = 0.2;
pub const BUTTON_FADE: Duration = Duration::from_millis(500);
pub const RING_FADE: Duration = Duration::from_millis(300);

/// Opacity that eases from one target to the next over a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    from: f64,
    to: f64,
    started: Option<Instant>,
    duration: Duration,
}

impl Fade {
    pub fn new(value: f64, duration: Duration) -> Self {
        Self {
            from: value,
            to: value,
            started: None,
            duration,
        }
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    /// Starts easing toward `to` from wherever the fade currently is.
    pub fn retarget(&mut self, to: f64, now: Instant) {
        if (to - self.to).abs() < f64::EPSILON {
            return;
        }
        self.from = self.sample(now);
        self.to = to;
        self.started = if self.duration.is_zero() {
            None
        } else {
            Some(now)
        };
    }

    /// Jumps to `value` without animating.
    pub fn snap(&mut self, value: f64) {
        self.from = value;
        self.to = value;
        self.started = None;
    }

    pub fn sample(&self, now: Instant) -> f64 {
        let Some(started) = self.started else {
            return self.to;
        };
        let t = now.saturating_duration_since(started).as_secs_f64() / self.duration.as_secs_f64();
        if t >= 1.0 {
            return self.to;
        }
        // ease-out quad
        let eased = 1.0 - (1.0 - t) * (1.0 - t);
        self.from + (self.to - self.from) * eased
    }

    pub fn is_settled(&self, now: Instant) -> bool {
        match self.started {
            None => true,
            Some(started) => now.saturating_duration_since(started) >= self.duration,
        }
    }
}

/// Overlay images stacked on one button, each with its own fade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayFader {
    pub default: Fade,
    pub hover: Fade,
    pub selected: Fade,
    pub disabled: Fade,
}

impl OverlayFader {
    pub fn new(duration: Duration) -> Self {
        Self {
            default: Fade::new(BUTTON_ALPHA, duration),
            hover: Fade::new(0.0, duration),
            selected: Fade::new(0.0, duration),
            disabled: Fade::new(0.0, duration),
        }
    }

    pub fn set_duration(&mut self, duration: Duration) {
        for fade in self.fades_mut() {
            fade.set_duration(duration);
        }
    }

    fn fades_mut(&mut self) -> [&mut Fade; 4] {
        [
            &mut self.default,
            &mut self.hover,
            &mut self.selected,
            &mut self.disabled,
        ]
    }

    fn show(&mut self, default: f64, hover: f64, selected: f64, disabled: f64) {
        let now = Instant::now();
        self.default.retarget(default, now);
        self.hover.retarget(hover, now);
        self.selected.retarget(selected, now);
        self.disabled.retarget(disabled, now);
    }

    /// Drops any running fade and shows the resting default image.
    pub fn snap_default(&mut self) {
        self.default.snap(BUTTON_ALPHA);
        self.hover.snap(0.0);
        self.selected.snap(0.0);
        self.disabled.snap(0.0);
    }

    pub fn is_settled(&self, now: Instant) -> bool {
        [self.default, self.hover, self.selected, self.disabled]
            .iter()
            .all(|f| f.is_settled(now))
    }
}

impl ButtonRenderer for OverlayFader {
    fn render_default(&mut self) {
        self.show(BUTTON_ALPHA, 0.0, 0.0, 0.0);
    }

    fn render_hover(&mut self) {
        self.show(0.0, 1.0, 0.0, 0.0);
    }

    fn render_selected(&mut self) {
        self.show(0.0, 0.0, 1.0, 0.0);
    }

    fn render_disabled(&mut self) {
        self.show(0.0, 0.0, 0.0, DISABLED_ALPHA);
    }
}
