//! Typewriter reveal of an already complete response.
//!
//! The animator never touches the display directly. Its timer only posts
//! "tick N is due" through a notifier; the owner of the display state calls
//! [`RevealAnimator::on_tick`] when that message arrives.

use crate::transcript::ASSISTANT_MARKER;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const DEFAULT_PERIOD: Duration = Duration::from_millis(30);

/// Characters per tick and tick period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealRate {
    pub chars_per_tick: usize,
    pub period: Duration,
}

impl RevealRate {
    pub fn new(chars_per_tick: usize, period: Duration) -> Self {
        Self {
            chars_per_tick: chars_per_tick.max(1),
            period: period.max(Duration::from_millis(1)),
        }
    }

    /// Maps the 10-100 animation speed setting to a rate; higher is faster.
    pub fn from_speed(speed: f64) -> Self {
        let chars = (speed / 10.0).ceil();
        let chars = if chars.is_finite() && chars >= 1.0 {
            chars as usize
        } else {
            1
        };
        Self::new(chars, DEFAULT_PERIOD)
    }
}

impl Default for RevealRate {
    fn default() -> Self {
        Self::from_speed(20.0)
    }
}

/// Called from the timer task with the id of the reveal that is due a tick.
pub type TickNotifier = Arc<dyn Fn(u64) + Send + Sync>;

/// Periodic task owned by exactly one reveal; dropping it stops the ticks.
struct RevealTimer {
    handle: JoinHandle<()>,
}

impl RevealTimer {
    fn start(reveal_id: u64, period: Duration, notify: TickNotifier) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                notify(reveal_id);
            }
        });
        Self { handle }
    }
}

impl Drop for RevealTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct RevealAnimator {
    full_text: String,
    /// Byte length of the part shown without animation.
    prefix_len: usize,
    /// Characters of the animated part.
    total_chars: usize,
    revealed: usize,
    rate: RevealRate,
    active: bool,
    reveal_id: u64,
    timer: Option<RevealTimer>,
    notify: Option<TickNotifier>,
}

impl fmt::Debug for RevealAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevealAnimator")
            .field("revealed", &self.revealed)
            .field("total_chars", &self.total_chars)
            .field("rate", &self.rate)
            .field("active", &self.active)
            .field("reveal_id", &self.reveal_id)
            .finish()
    }
}

impl RevealAnimator {
    /// An animator that schedules ticks through `notify`. Must be used inside
    /// a tokio runtime.
    pub fn new(notify: TickNotifier) -> Self {
        Self::build(Some(notify))
    }

    /// An animator without a timer; ticks only happen when driven by hand.
    pub fn manual() -> Self {
        Self::build(None)
    }

    fn build(notify: Option<TickNotifier>) -> Self {
        Self {
            full_text: String::new(),
            prefix_len: 0,
            total_chars: 0,
            revealed: 0,
            rate: RevealRate::default(),
            active: false,
            reveal_id: 0,
            timer: None,
            notify,
        }
    }

    /// Supersedes any reveal in flight and starts over `full_text`.
    ///
    /// Text before the first assistant marker is shown at once; the rest is
    /// revealed `rate.chars_per_tick` characters per tick. Returns the new
    /// reveal id.
    pub fn reveal(&mut self, full_text: String, rate: RevealRate) -> u64 {
        self.timer = None;
        self.reveal_id += 1;

        self.prefix_len = full_text.find(ASSISTANT_MARKER).unwrap_or(0);
        self.total_chars = full_text[self.prefix_len..].chars().count();
        self.full_text = full_text;
        self.revealed = 0;
        self.rate = RevealRate::new(rate.chars_per_tick, rate.period);
        self.active = self.total_chars > 0;

        if self.active {
            self.start_timer();
        }
        self.reveal_id
    }

    fn start_timer(&mut self) {
        // Drop the old timer before the new one exists.
        self.timer = None;
        if let Some(notify) = &self.notify {
            self.timer = Some(RevealTimer::start(
                self.reveal_id,
                self.rate.period,
                Arc::clone(notify),
            ));
        }
    }

    /// Handles a tick posted by the timer. Stale ids are ignored.
    /// Returns whether the visible text changed.
    pub fn on_tick(&mut self, reveal_id: u64) -> bool {
        if reveal_id != self.reveal_id {
            return false;
        }
        self.tick()
    }

    /// Advances one batch, clamped to the text length.
    pub fn tick(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.revealed = (self.revealed + self.rate.chars_per_tick).min(self.total_chars);
        if self.revealed >= self.total_chars {
            self.finish();
        }
        true
    }

    /// Shows the complete text now and stops the timer.
    pub fn skip(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.finish();
        true
    }

    /// Changes speed without restarting progress. An active reveal gets a new
    /// timer with the new period.
    pub fn set_rate(&mut self, rate: RevealRate) {
        let period_changed = rate.period != self.rate.period;
        self.rate = RevealRate::new(rate.chars_per_tick, rate.period);
        if self.active && period_changed {
            self.start_timer();
        }
    }

    fn finish(&mut self) {
        self.revealed = self.total_chars;
        self.active = false;
        self.timer = None;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    pub fn rate(&self) -> RevealRate {
        self.rate
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn revealed_len(&self) -> usize {
        self.revealed
    }

    /// Unanimated prefix plus the revealed part of the rest.
    pub fn display(&self) -> &str {
        let animated = &self.full_text[self.prefix_len..];
        let end = animated
            .char_indices()
            .nth(self.revealed)
            .map_or(animated.len(), |(i, _)| i);
        &self.full_text[..self.prefix_len + end]
    }
}
