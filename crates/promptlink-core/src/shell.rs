//! Side-effect seams: clipboard, navigation and the visible location.
//!
//! The view only talks to the outside world through [`Shell`]. The system
//! implementation shells out to platform tools; [`RecordingShell`] keeps
//! everything in memory.

use std::io::Write;
use std::process::{Command, Stdio};

use url::Url;

use crate::error::{Error, Result};

pub trait Shell {
    /// Put `text` on the system clipboard.
    fn write_clipboard(&mut self, text: &str) -> Result<()>;

    /// Leave the current page for `url` (a deep link or a share URL).
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Rewrite the visible location without navigating.
    fn replace_location(&mut self, url: &Url) -> Result<()> {
        tracing::debug!(%url, "location replaced");
        Ok(())
    }
}

impl<S: Shell + ?Sized> Shell for &mut S {
    fn write_clipboard(&mut self, text: &str) -> Result<()> {
        (**self).write_clipboard(text)
    }

    fn navigate(&mut self, url: &str) -> Result<()> {
        (**self).navigate(url)
    }

    fn replace_location(&mut self, url: &Url) -> Result<()> {
        (**self).replace_location(url)
    }
}

// ── System shell ────────────────────────────────────────────────────────────

/// Clipboard through `pbcopy` / `wl-copy` / `xclip` / `xsel` / `clip`, and
/// navigation through the platform URL opener.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShell;

impl SystemShell {
    pub fn new() -> Self {
        Self
    }
}

impl Shell for SystemShell {
    fn write_clipboard(&mut self, text: &str) -> Result<()> {
        let mut child = spawn_clipboard()?;
        if let Some(stdin) = child.stdin.as_mut() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|e| Error::Clipboard(e.to_string()))?;
        }
        let status = child.wait().map_err(|e| Error::Clipboard(e.to_string()))?;
        if !status.success() {
            return Err(Error::Clipboard(format!("clipboard tool exited with {status}")));
        }
        Ok(())
    }

    fn navigate(&mut self, url: &str) -> Result<()> {
        let navigation_error = |reason: String| Error::Navigation {
            url: url.to_string(),
            reason,
        };

        #[cfg(target_os = "macos")]
        let spawned = Command::new("open").arg(url).spawn();
        #[cfg(target_os = "windows")]
        let spawned = Command::new("cmd").args(["/C", "start", "", url]).spawn();
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        let spawned = Command::new("xdg-open").arg(url).spawn();

        spawned.map_err(|e| navigation_error(e.to_string()))?;
        tracing::info!(url, "opened");
        Ok(())
    }
}

fn spawn_clipboard() -> Result<std::process::Child> {
    let piped = |program: &str, args: &[&str]| {
        Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
    };

    #[cfg(target_os = "macos")]
    let child = piped("pbcopy", &[]);

    #[cfg(target_os = "windows")]
    let child = piped("clip", &[]);

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let child = piped("wl-copy", &[])
        .or_else(|_| piped("xclip", &["-selection", "clipboard"]))
        .or_else(|_| piped("xsel", &["--clipboard", "--input"]));

    child.map_err(|e| Error::Clipboard(format!("no clipboard tool found ({e})")))
}

// ── Recording shell ─────────────────────────────────────────────────────────

/// In-memory shell that records every side effect.
#[derive(Debug, Default, Clone)]
pub struct RecordingShell {
    pub clipboard: Vec<String>,
    pub navigations: Vec<String>,
    pub locations: Vec<Url>,
    /// Make every clipboard write fail.
    pub fail_clipboard: bool,
    /// Make every navigation fail (after recording the attempt).
    pub fail_navigation: bool,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_navigation(&self) -> Option<&str> {
        self.navigations.last().map(String::as_str)
    }

    pub fn last_clipboard(&self) -> Option<&str> {
        self.clipboard.last().map(String::as_str)
    }
}

impl Shell for RecordingShell {
    fn write_clipboard(&mut self, text: &str) -> Result<()> {
        if self.fail_clipboard {
            return Err(Error::Clipboard("clipboard write denied".to_string()));
        }
        self.clipboard.push(text.to_string());
        Ok(())
    }

    fn navigate(&mut self, url: &str) -> Result<()> {
        self.navigations.push(url.to_string());
        if self.fail_navigation {
            return Err(Error::Navigation {
                url: url.to_string(),
                reason: "navigation blocked".to_string(),
            });
        }
        Ok(())
    }

    fn replace_location(&mut self, url: &Url) -> Result<()> {
        self.locations.push(url.clone());
        Ok(())
    }
}
