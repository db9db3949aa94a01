//! Page state: edit mode, playback mode and the transitions between them.
//!
//! [`LinkBuilder`] owns everything the page shows. It never blocks; when it
//! wants to be called back later it queues a [`Scheduled`] timer that the
//! driver collects with [`LinkBuilder::take_scheduled`] and feeds back
//! through [`LinkBuilder::on_timer`].

use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use url::Url;

use crate::codec::{DeepLink, LinkTarget, PlaybackPayload, Protocol};
use crate::config::Config;
use crate::scheduler::{Pacing, Phase, PlaybackScheduler, SessionId, Step};
use crate::shell::Shell;
use crate::timers::{Scheduled, TimerEvent};

/// How long "copied" stays up after creating a share link.
pub const CREATE_COPIED_HOLD: Duration = Duration::from_millis(2000);
/// How long "copied" stays up after re-copying an existing share link.
pub const COPY_COPIED_HOLD: Duration = Duration::from_millis(1600);

pub const STATUS_TYPING: &str = "Typing prompt and opening VS Code...";
pub const STATUS_DONE: &str = "Done. Was that so hard?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Edit,
    Playback,
}

/// What the page renders besides the prompt itself.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ViewState {
    pub mode: Mode,
    pub typed_text: String,
    pub action_clicked: bool,
    pub launch_notice_shown: bool,
    /// One-shot latch: the deep link was opened automatically this session.
    pub auto_launch_fired: bool,
}

pub struct LinkBuilder<S, R> {
    target: LinkTarget,
    pacing: Pacing,
    shell: S,
    rng: R,
    location: Url,

    prompt: String,
    protocol: Protocol,
    agent: String,
    share_link: Option<Url>,
    copied: Option<u64>,
    copy_serial: u64,

    state: ViewState,
    session: Option<PlaybackScheduler>,
    last_session: SessionId,
    scheduled: Vec<Scheduled>,
}

impl<S: Shell, R: Rng> LinkBuilder<S, R> {
    /// Open the page at `location`.
    ///
    /// A query carrying a playback payload switches straight to playback
    /// mode and queues the first typing tick.
    pub fn new(target: LinkTarget, pacing: Pacing, location: Url, shell: S, rng: R) -> Self {
        let agent = target.default_agent.clone();
        let mut builder = Self {
            target,
            pacing,
            shell,
            rng,
            location,
            prompt: String::new(),
            protocol: Protocol::default(),
            agent,
            share_link: None,
            copied: None,
            copy_serial: 0,
            state: ViewState::default(),
            session: None,
            last_session: SessionId::new(0),
            scheduled: Vec::new(),
        };

        if let Some(payload) = builder.target.payload_from_url(&builder.location) {
            builder.enter_playback(payload);
        }
        builder
    }

    pub fn from_config(config: &Config, location: Url, shell: S, rng: R) -> Self {
        Self::new(
            config.target.clone(),
            config.pacing.clone(),
            location,
            shell,
            rng,
        )
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn target(&self) -> &LinkTarget {
        &self.target
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn share_link(&self) -> Option<&Url> {
        self.share_link.as_ref()
    }

    pub fn copied(&self) -> bool {
        self.copied.is_some()
    }

    /// Deep link for the current prompt, agent and protocol.
    pub fn deep_link(&self) -> DeepLink {
        self.target.deep_link(&self.prompt, &self.agent, self.protocol)
    }

    pub fn phase(&self) -> Option<Phase> {
        self.session.as_ref().map(PlaybackScheduler::phase)
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(PlaybackScheduler::id)
    }

    /// Playback status line; `None` in edit mode.
    pub fn status_line(&self) -> Option<&'static str> {
        match self.state.mode {
            Mode::Edit => None,
            Mode::Playback if self.state.launch_notice_shown => Some(STATUS_DONE),
            Mode::Playback => Some(STATUS_TYPING),
        }
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    pub fn shell_mut(&mut self) -> &mut S {
        &mut self.shell
    }

    /// Timers requested since the last call.
    pub fn take_scheduled(&mut self) -> Vec<Scheduled> {
        std::mem::take(&mut self.scheduled)
    }

    // ── Inputs ──────────────────────────────────────────────────────────

    /// Replace the prompt text. During playback this restarts the session.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        if self.prompt == prompt {
            return;
        }
        self.prompt = prompt;
        if self.state.mode == Mode::Playback {
            self.restart_playback();
        }
    }

    /// Switch protocol. During playback a change restarts the session.
    pub fn set_protocol(&mut self, protocol: Protocol) {
        if self.protocol == protocol {
            return;
        }
        self.protocol = protocol;
        if self.state.mode == Mode::Playback {
            self.restart_playback();
        }
    }

    // ── Edit mode actions ───────────────────────────────────────────────

    /// Build the share URL, keep it, and copy it to the clipboard.
    pub fn create_share_link(&mut self) {
        let Some(prompt) = self.normalize_prompt() else {
            return;
        };
        let link = self.target.share_url(&prompt, self.protocol, &self.location);
        self.share_link = Some(link.clone());
        self.copy(link.as_str(), CREATE_COPIED_HOLD);
    }

    /// Keep the share URL and open the deep link right away.
    pub fn submit_prompt(&mut self) {
        let Some(prompt) = self.normalize_prompt() else {
            return;
        };
        self.share_link = Some(self.target.share_url(&prompt, self.protocol, &self.location));
        let link = self.deep_link();
        self.navigate(link.as_str());
    }

    /// Open the share URL, i.e. see what a recipient would see.
    pub fn preview_typing_link(&mut self) {
        let Some(prompt) = self.normalize_prompt() else {
            return;
        };
        let link = self.target.share_url(&prompt, self.protocol, &self.location);
        self.navigate(link.as_str());
    }

    /// Copy the existing share URL again.
    pub fn copy_share_link(&mut self) {
        if self.state.mode != Mode::Edit {
            return;
        }
        let Some(link) = self.share_link.clone() else {
            return;
        };
        self.copy(link.as_str(), COPY_COPIED_HOLD);
    }

    // ── Playback mode actions ───────────────────────────────────────────

    /// Manually open the deep link.
    ///
    /// In playback mode this only works once the send action has fired.
    pub fn open_deep_link(&mut self) {
        if self.prompt.is_empty() {
            return;
        }
        if self.state.mode == Mode::Playback && !self.state.action_clicked {
            tracing::debug!("deep link not ready yet");
            return;
        }
        let link = self.deep_link();
        self.navigate(link.as_str());
    }

    /// Leave playback and return to a pristine edit mode.
    pub fn reset(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.cancel();
            tracing::debug!(session = session.id().get(), "playback cancelled");
        }
        self.state = ViewState::default();
        self.prompt.clear();
        self.agent = self.target.default_agent.clone();
        self.share_link = None;
        self.copied = None;

        self.location.set_query(None);
        self.location.set_fragment(None);
        if let Err(err) = self.shell.replace_location(&self.location) {
            tracing::warn!(error = %err, "could not rewrite location");
        }
    }

    /// Open the deep link automatically, at most once per session.
    ///
    /// Returns whether this call navigated.
    pub fn auto_launch(&mut self) -> bool {
        if self.state.auto_launch_fired {
            tracing::debug!("auto launch already fired");
            return false;
        }
        self.state.auto_launch_fired = true;
        let link = self.deep_link();
        self.navigate(link.as_str());
        true
    }

    // ── Timers ──────────────────────────────────────────────────────────

    pub fn on_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::Playback(id) => self.on_playback_tick(id),
            TimerEvent::ClearCopied(serial) => {
                if self.copied == Some(serial) {
                    self.copied = None;
                }
            }
        }
    }

    fn on_playback_tick(&mut self, id: SessionId) {
        let Some(session) = self.session.as_mut() else {
            tracing::trace!(session = id.get(), "tick without a session");
            return;
        };
        if !session.accepts(id) {
            tracing::trace!(session = id.get(), "stale tick dropped");
            return;
        }

        match session.advance(&self.pacing, &mut self.rng) {
            Step::Revealed { ch, next } => {
                self.state.typed_text.push(ch);
                self.schedule(next, TimerEvent::Playback(id));
            }
            Step::Typed { next } => {
                tracing::debug!(session = id.get(), "prompt fully typed");
                self.schedule(next, TimerEvent::Playback(id));
            }
            Step::ActionClicked { next } => {
                self.state.action_clicked = true;
                self.schedule(next, TimerEvent::Playback(id));
            }
            Step::Launch => {
                self.state.launch_notice_shown = true;
                self.auto_launch();
            }
            Step::Idle => {}
        }
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn enter_playback(&mut self, payload: PlaybackPayload) {
        tracing::info!(
            protocol = %payload.protocol,
            agent = %payload.agent,
            chars = payload.prompt.chars().count(),
            "playback payload found"
        );
        self.prompt = payload.prompt;
        self.agent = payload.agent;
        self.protocol = payload.protocol;
        self.state.mode = Mode::Playback;
        self.start_session();
    }

    /// Cancel the running session and start over with the current prompt.
    /// The auto-launch latch survives; only `reset` clears it.
    fn restart_playback(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.cancel();
        }
        self.start_session();
    }

    fn start_session(&mut self) {
        self.state.typed_text.clear();
        self.state.action_clicked = false;
        self.state.launch_notice_shown = false;
        if self.prompt.is_empty() {
            return;
        }

        self.last_session = self.last_session.next();
        let id = self.last_session;
        self.session = Some(PlaybackScheduler::new(id, &self.prompt));
        tracing::debug!(session = id.get(), "playback started");
        self.schedule(Duration::ZERO, TimerEvent::Playback(id));
    }

    /// Trim the prompt in place; `None` when nothing is left or the view
    /// is replaying a share link.
    fn normalize_prompt(&mut self) -> Option<String> {
        if self.state.mode != Mode::Edit {
            tracing::debug!("edit action ignored during playback");
            return None;
        }
        let trimmed = self.prompt.trim();
        if trimmed.is_empty() {
            return None;
        }
        let trimmed = trimmed.to_string();
        self.prompt.clone_from(&trimmed);
        Some(trimmed)
    }

    fn copy(&mut self, text: &str, hold: Duration) {
        match self.shell.write_clipboard(text) {
            Ok(()) => {
                self.copy_serial += 1;
                self.copied = Some(self.copy_serial);
                self.schedule(hold, TimerEvent::ClearCopied(self.copy_serial));
            }
            Err(err) => tracing::warn!(error = %err, "clipboard write failed"),
        }
    }

    fn navigate(&mut self, url: &str) {
        if let Err(err) = self.shell.navigate(url) {
            tracing::warn!(error = %err, "navigation failed");
        }
    }

    fn schedule(&mut self, after: Duration, event: TimerEvent) {
        self.scheduled.push(Scheduled { after, event });
    }
}
