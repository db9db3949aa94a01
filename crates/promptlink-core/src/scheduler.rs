//! Typing playback as an explicit state machine.
//!
//! A [`PlaybackScheduler`] never sleeps. Each call to
//! [`PlaybackScheduler::advance`] performs exactly one transition and reports
//! how long the driver should wait before calling it again:
//!
//! ```text
//! Typing ──(all chars shown, +settle)──▶ AwaitingAction
//!        ──(+launch, action clicked)──▶ AwaitingLaunch
//!        ──(launch notice, navigate)──▶ Launched
//! ```
//!
//! Every scheduler carries a [`SessionId`]. Timer events are tagged with the
//! id they were scheduled for; once a scheduler is cancelled or replaced,
//! events for the old id are refused.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Characters that earn the long punctuation pause.
pub const PUNCTUATION: &[char] = &['.', ',', '!', '?', '\n'];

/// Identity of one playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

// ── Pacing ──────────────────────────────────────────────────────────────────

/// Cadence of the typing animation, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pacing {
    /// Minimum delay after each character.
    pub base_delay_ms: u64,
    /// Width of the uniform random spread added to the base delay.
    pub jitter_ms: u64,
    /// Extra delay after a space.
    pub space_pause_ms: u64,
    /// Extra delay after `. , ! ?` or a newline.
    pub punctuation_pause_ms: u64,
    /// Pause between the last character and the send button press.
    pub settle_pause_ms: u64,
    /// Pause between the button press and launching the deep link.
    pub launch_pause_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            base_delay_ms: 20,
            jitter_ms: 35,
            space_pause_ms: 25,
            punctuation_pause_ms: 90,
            settle_pause_ms: 380,
            launch_pause_ms: 420,
        }
    }
}

impl Pacing {
    /// Zero delays everywhere. Useful when only ordering matters.
    pub fn instant() -> Self {
        Self {
            base_delay_ms: 0,
            jitter_ms: 0,
            space_pause_ms: 0,
            punctuation_pause_ms: 0,
            settle_pause_ms: 0,
            launch_pause_ms: 0,
        }
    }

    /// Delay after revealing `ch`: `base + U[0, jitter)`, plus the space or
    /// punctuation pause.
    pub fn char_delay<R: Rng + ?Sized>(&self, ch: char, rng: &mut R) -> Duration {
        let mut millis = self.base_delay_ms as f64;
        if self.jitter_ms > 0 {
            millis += rng.gen_range(0.0..self.jitter_ms as f64);
        }
        if ch == ' ' {
            millis += self.space_pause_ms as f64;
        }
        if PUNCTUATION.contains(&ch) {
            millis += self.punctuation_pause_ms as f64;
        }
        Duration::from_secs_f64(millis / 1000.0)
    }

    pub fn settle_pause(&self) -> Duration {
        Duration::from_millis(self.settle_pause_ms)
    }

    pub fn launch_pause(&self) -> Duration {
        Duration::from_millis(self.launch_pause_ms)
    }
}

// ── State machine ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Typing,
    AwaitingAction,
    AwaitingLaunch,
    Launched,
}

/// Outcome of one [`PlaybackScheduler::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// One more character is visible; call again after `next`.
    Revealed { ch: char, next: Duration },
    /// Every character is visible; call again after the settle pause.
    Typed { next: Duration },
    /// The send action was pressed; call again after the launch pause.
    ActionClicked { next: Duration },
    /// Show the launch notice and navigate (subject to the caller's latch).
    Launch,
    /// Nothing left to do, or the scheduler was cancelled.
    Idle,
}

impl Step {
    /// How long until the next `advance`, if one is wanted.
    pub fn next_delay(&self) -> Option<Duration> {
        match *self {
            Self::Revealed { next, .. } | Self::Typed { next } | Self::ActionClicked { next } => {
                Some(next)
            }
            Self::Launch | Self::Idle => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackScheduler {
    id: SessionId,
    chars: Vec<char>,
    revealed: usize,
    phase: Phase,
    cancelled: bool,
}

impl PlaybackScheduler {
    pub fn new(id: SessionId, prompt: &str) -> Self {
        Self {
            id,
            chars: prompt.chars().collect(),
            revealed: 0,
            phase: Phase::Typing,
            cancelled: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of characters revealed so far.
    pub fn revealed(&self) -> usize {
        self.revealed
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Stop the session. Every later `advance` returns [`Step::Idle`].
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Whether a timer event tagged `id` may still drive this scheduler.
    pub fn accepts(&self, id: SessionId) -> bool {
        !self.cancelled && self.id == id
    }

    pub fn advance<R: Rng + ?Sized>(&mut self, pacing: &Pacing, rng: &mut R) -> Step {
        if self.cancelled {
            return Step::Idle;
        }

        match self.phase {
            Phase::Typing => match self.chars.get(self.revealed).copied() {
                Some(ch) => {
                    self.revealed += 1;
                    Step::Revealed {
                        ch,
                        next: pacing.char_delay(ch, rng),
                    }
                }
                None => {
                    self.phase = Phase::AwaitingAction;
                    Step::Typed {
                        next: pacing.settle_pause(),
                    }
                }
            },
            Phase::AwaitingAction => {
                self.phase = Phase::AwaitingLaunch;
                Step::ActionClicked {
                    next: pacing.launch_pause(),
                }
            }
            Phase::AwaitingLaunch => {
                self.phase = Phase::Launched;
                Step::Launch
            }
            Phase::Launched => Step::Idle,
        }
    }
}
