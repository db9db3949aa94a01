// ── promptlink core library ─────────────────────────────────────────────────
//
// Everything a promptlink front end needs: the prompt ↔ link codec, the
// typing playback scheduler, the page view state machine, the shell seams
// for clipboard and navigation, plus configuration and logging.

pub mod args;
pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod scheduler;
pub mod shell;
pub mod theme;
pub mod timers;
pub mod view;

pub use codec::{DeepLink, LinkTarget, PlaybackPayload, Protocol};
pub use config::Config;
pub use error::{Error, Result};
pub use scheduler::{Pacing, Phase, PlaybackScheduler, SessionId, Step};
pub use shell::{RecordingShell, Shell, SystemShell};
pub use timers::{Scheduled, TimerEvent, TimerQueue};
pub use view::{LinkBuilder, Mode, ViewState};
