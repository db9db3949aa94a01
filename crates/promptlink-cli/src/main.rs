mod shell;

use std::io::Write;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use promptlink_core::args::CommonArgs;
use promptlink_core::logging::{self, LogConfig};
use promptlink_core::theme as t;
use promptlink_core::{Config, LinkBuilder, Mode, Protocol, TimerQueue};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::shell::CliShell;

type Builder = LinkBuilder<CliShell, StdRng>;

// ── CLI ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "promptlink",
    version,
    about = "promptlink — turn a prompt into an editor deep link, or a share link that types it out"
)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the deep link for a prompt
    Link {
        #[command(flatten)]
        prompt: PromptArgs,
        /// Agent to address (default: the configured default agent)
        #[arg(long, value_name = "NAME", default_value = "")]
        agent: String,
    },
    /// Create a share link and copy it to the clipboard
    Share {
        #[command(flatten)]
        prompt: PromptArgs,
        /// Print instead of touching the clipboard
        #[arg(long)]
        dry_run: bool,
    },
    /// Open the deep link right away
    Submit {
        #[command(flatten)]
        prompt: PromptArgs,
        /// Print instead of opening anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Open the share link to see what a recipient sees
    Preview {
        #[command(flatten)]
        prompt: PromptArgs,
        /// Print instead of opening anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Replay a share link in the terminal, then open the deep link
    Play {
        /// Share link (or any URL carrying `q`/`p` parameters)
        #[arg(value_name = "URL")]
        url: String,
        /// Print the deep link instead of opening it
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the prompt, agent and protocol a share link carries
    Decode {
        #[arg(value_name = "URL")]
        url: String,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the resolved configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, clap::Args)]
struct PromptArgs {
    /// Prompt text; multiple words are joined with spaces
    #[arg(value_name = "PROMPT", required = true, num_args = 1..)]
    words: Vec<String>,
    /// Which editor build to target
    #[arg(long, short = 'p', value_enum, default_value_t = Protocol::Primary)]
    protocol: Protocol,
}

impl PromptArgs {
    fn text(&self) -> String {
        self.words.join(" ")
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    t::init_color(cli.common.no_color);
    if cli.common.verbose {
        logging::init(LogConfig::debug());
    } else {
        logging::init_from_env();
    }

    let mut config = Config::load(cli.common.config_path())?;
    cli.common.apply_overrides(&mut config);
    tracing::debug!(page_url = %config.page_url, "configuration resolved");

    match cli.command {
        Commands::Link { prompt, agent } => {
            let text = prompt.text();
            let text = text.trim();
            if text.is_empty() {
                return Ok(());
            }
            println!("{}", config.target.deep_link(text, &agent, prompt.protocol));
        }
        Commands::Share { prompt, dry_run } => {
            let mut view = edit_view(&config, &prompt, dry_run)?;
            view.create_share_link();
            let Some(link) = view.share_link() else {
                return Ok(());
            };
            println!("{link}");
            if view.copied() {
                eprintln!("{}", t::icon_ok("Copied!"));
            } else {
                eprintln!("{}", t::icon_warn("Could not reach the clipboard; copy the link above"));
            }
        }
        Commands::Submit { prompt, dry_run } => {
            let mut view = edit_view(&config, &prompt, dry_run)?;
            view.submit_prompt();
            if let Some(link) = view.share_link() {
                eprintln!("{}", t::label_value("Share link", link.as_str()));
            }
        }
        Commands::Preview { prompt, dry_run } => {
            let mut view = edit_view(&config, &prompt, dry_run)?;
            view.preview_typing_link();
        }
        Commands::Play { url, dry_run } => {
            let location =
                Url::parse(&url).with_context(|| format!("`{url}` is not a valid URL"))?;
            let mut view = LinkBuilder::from_config(
                &config,
                location,
                CliShell::new(dry_run),
                StdRng::from_entropy(),
            );
            if view.mode() != Mode::Playback {
                bail!("`{url}` carries no prompt to replay");
            }

            let cancel = CancellationToken::new();
            let cancel_for_signal = cancel.clone();
            tokio::spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                cancel_for_signal.cancel();
            });

            run_playback(&mut view, cancel).await?;
        }
        Commands::Decode { url, json } => {
            let location =
                Url::parse(&url).with_context(|| format!("`{url}` is not a valid URL"))?;
            let Some(payload) = config.target.payload_from_url(&location) else {
                bail!("`{url}` carries no prompt");
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                let deep_link =
                    config
                        .target
                        .deep_link(&payload.prompt, &payload.agent, payload.protocol);
                println!("{}", t::label_value("Prompt", &payload.prompt));
                println!("{}", t::label_value("Agent", &payload.agent));
                println!("{}", t::label_value("Protocol", payload.protocol.label()));
                println!("{}", t::label_value("Deep link", deep_link.as_str()));
            }
        }
        Commands::Init { force } => {
            let path = cli
                .common
                .config_path()
                .unwrap_or_else(|| config.settings_dir.join("config.toml"));
            if path.exists() && !force {
                bail!("{} already exists (pass --force to overwrite)", path.display());
            }
            config.save(Some(path.clone()))?;
            println!("{}", path.display());
            eprintln!("{}", t::icon_ok("Config written"));
        }
    }

    Ok(())
}

/// A fresh edit-mode view on the configured page, seeded with the prompt.
fn edit_view(config: &Config, prompt: &PromptArgs, dry_run: bool) -> Result<Builder> {
    let location = config.page_location().context("invalid page URL")?;
    let mut view = LinkBuilder::from_config(
        config,
        location,
        CliShell::new(dry_run),
        StdRng::from_entropy(),
    );
    view.set_protocol(prompt.protocol);
    view.set_prompt(prompt.text());
    Ok(view)
}

/// Drive the playback timers on the tokio clock, echoing typed text.
///
/// Ctrl-C resets the view, which cancels the pending chain.
async fn run_playback(view: &mut Builder, cancel: CancellationToken) -> Result<()> {
    let start = tokio::time::Instant::now();
    let mut queue = TimerQueue::new();
    let mut stdout = std::io::stdout();
    let mut shown = 0;

    if let Some(status) = view.status_line() {
        eprintln!("{}", t::muted(status));
    }

    queue.extend(view.take_scheduled());
    while let Some(due) = queue.next_due() {
        tokio::select! {
            _ = cancel.cancelled() => {
                view.reset();
                writeln!(stdout)?;
                eprintln!("{}", t::icon_warn("Playback cancelled"));
                return Ok(());
            }
            _ = tokio::time::sleep_until(start + due) => {}
        }

        let Some(event) = queue.pop() else {
            break;
        };
        view.on_timer(event);
        queue.extend(view.take_scheduled());

        let typed = &view.state().typed_text;
        if typed.len() > shown {
            write!(stdout, "{}", t::accent(&typed[shown..]))?;
            stdout.flush()?;
            shown = typed.len();
        }
    }
    writeln!(stdout)?;

    if let Some(status) = view.status_line() {
        eprintln!("{}", t::icon_ok(status));
    }
    eprintln!("{}", t::label_value("Open manually", view.deep_link().as_str()));
    Ok(())
}
