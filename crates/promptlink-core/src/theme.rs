//! Terminal colour helpers.
//!
//! Respects the `NO_COLOR` env-var and the `--no-color` CLI flag.
//!
//! | Token   | Hex       | Usage                              |
//! |---------|-----------|------------------------------------|
//! | accent  | `#3794FF` | the typed prompt                   |
//! | info    | `#75BEFF` | links and values                   |
//! | success | `#2FBF71` | copied / opened                    |
//! | warn    | `#FFB020` | soft failures                      |
//! | muted   | `#8B8B8B` | status lines, metadata             |

use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};

static COLOR_DISABLED: AtomicBool = AtomicBool::new(false);

/// Disable colour globally.
pub fn disable_color() {
    COLOR_DISABLED.store(true, Ordering::Relaxed);
    colored::control::set_override(false);
}

/// Initialise the colour system. Checks `NO_COLOR` and the `--no-color` flag.
pub fn init_color(no_color_flag: bool) {
    if no_color_flag
        || std::env::var("NO_COLOR")
            .map(|v| !v.is_empty())
            .unwrap_or(false)
    {
        disable_color();
    }
}

fn is_color() -> bool {
    !COLOR_DISABLED.load(Ordering::Relaxed)
}

pub mod palette {
    pub const ACCENT: (u8, u8, u8) = (0x37, 0x94, 0xFF);
    pub const INFO: (u8, u8, u8) = (0x75, 0xBE, 0xFF);
    pub const SUCCESS: (u8, u8, u8) = (0x2F, 0xBF, 0x71);
    pub const WARN: (u8, u8, u8) = (0xFF, 0xB0, 0x20);
    pub const MUTED: (u8, u8, u8) = (0x8B, 0x8B, 0x8B);
}

fn apply(text: &str, rgb: (u8, u8, u8)) -> String {
    if is_color() {
        text.truecolor(rgb.0, rgb.1, rgb.2).to_string()
    } else {
        text.to_string()
    }
}

pub fn accent(text: &str) -> String {
    apply(text, palette::ACCENT)
}

pub fn info(text: &str) -> String {
    apply(text, palette::INFO)
}

pub fn success(text: &str) -> String {
    apply(text, palette::SUCCESS)
}

pub fn warn(text: &str) -> String {
    apply(text, palette::WARN)
}

pub fn muted(text: &str) -> String {
    apply(text, palette::MUTED)
}

/// Green ✓
pub fn icon_ok(label: &str) -> String {
    format!("{} {}", success("✓"), label)
}

/// Yellow ⚠
pub fn icon_warn(label: &str) -> String {
    format!("{} {}", warn("⚠"), label)
}

/// Format "  Label : value" with the label dimmed and the value highlighted.
pub fn label_value(label: &str, value: &str) -> String {
    format!("  {} : {}", muted(label), info(value))
}
