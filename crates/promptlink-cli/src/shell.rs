use promptlink_core::Result;
use promptlink_core::shell::{Shell, SystemShell};
use promptlink_core::theme as t;

/// Terminal shell: the system clipboard and URL opener, or a dry run that
/// only prints what would have happened.
#[derive(Debug, Default)]
pub struct CliShell {
    system: SystemShell,
    dry_run: bool,
}

impl CliShell {
    pub fn new(dry_run: bool) -> Self {
        Self {
            system: SystemShell::new(),
            dry_run,
        }
    }
}

impl Shell for CliShell {
    fn write_clipboard(&mut self, text: &str) -> Result<()> {
        if self.dry_run {
            eprintln!("{}", t::label_value("Would copy", text));
            return Ok(());
        }
        self.system.write_clipboard(text)
    }

    fn navigate(&mut self, url: &str) -> Result<()> {
        if self.dry_run {
            eprintln!("{}", t::label_value("Would open", url));
            return Ok(());
        }
        self.system.navigate(url)?;
        eprintln!("{}", t::icon_ok(&format!("Opened {}", t::info(url))));
        Ok(())
    }
}
