//! Prompt ↔ link transforms.
//!
//! Two pure encodings live here:
//!
//! - **Deep link**: `<scheme>://<namespace>/chat?agent=<agent>&prompt=<prompt>`,
//!   the URI that launches the editor extension with the prompt pre-filled.
//!   The embedded prompt always starts with the mention token.
//! - **Share URL**: the page location with `?q=<prompt>[&proto=<scheme>]`,
//!   which a recipient opens to replay the prompt.
//!
//! Parsing goes the other way: a share URL query becomes a
//! [`PlaybackPayload`], including the legacy `p=<base64>` form.

use std::fmt;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};
use url::Url;

/// Agent used when a link does not name one.
pub const DEFAULT_AGENT: &str = "agent";
/// Mention token that routes the prompt inside the editor chat.
pub const DEFAULT_MENTION: &str = "@vscode";
/// Authority of the extension that receives the deep link.
pub const DEFAULT_NAMESPACE: &str = "GitHub.Copilot-Chat";
pub const DEFAULT_PRIMARY_SCHEME: &str = "vscode";
pub const DEFAULT_SECONDARY_SCHEME: &str = "vscode-insiders";

/// Plain-text prompt parameter.
pub const QUERY_PROMPT: &str = "q";
/// Legacy base64 prompt parameter.
pub const QUERY_LEGACY_PROMPT: &str = "p";
pub const QUERY_AGENT: &str = "a";
pub const QUERY_PROTOCOL: &str = "proto";

// Mirrors browser `atob`: padding optional, non-zero trailing bits accepted.
const LEGACY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

// ── Protocol ────────────────────────────────────────────────────────────────

/// Which flavour of the editor URI scheme a link targets.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Protocol {
    #[default]
    Primary,
    Secondary,
}

impl Protocol {
    /// Human-facing label shown next to the protocol toggle.
    pub fn label(self) -> &'static str {
        match self {
            Self::Primary => "VS Code",
            Self::Secondary => "Insiders",
        }
    }

    pub fn is_default(self) -> bool {
        self == Self::default()
    }
}

// ── Deep link ───────────────────────────────────────────────────────────────

/// A fully encoded editor deep link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DeepLink(String);

impl DeepLink {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeepLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeepLink {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ── Playback payload ────────────────────────────────────────────────────────

/// What a share URL asks the page to replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackPayload {
    pub prompt: String,
    pub agent: String,
    pub protocol: Protocol,
}

// ── Link target ─────────────────────────────────────────────────────────────

/// The application a link launches: mention token, namespace and the two
/// scheme variants. Kept as data so every encoding rule is testable
/// against arbitrary targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkTarget {
    pub mention: String,
    pub namespace: String,
    pub primary_scheme: String,
    pub secondary_scheme: String,
    pub default_agent: String,
}

impl Default for LinkTarget {
    fn default() -> Self {
        Self {
            mention: DEFAULT_MENTION.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            primary_scheme: DEFAULT_PRIMARY_SCHEME.to_string(),
            secondary_scheme: DEFAULT_SECONDARY_SCHEME.to_string(),
            default_agent: DEFAULT_AGENT.to_string(),
        }
    }
}

impl LinkTarget {
    pub fn scheme(&self, protocol: Protocol) -> &str {
        match protocol {
            Protocol::Primary => &self.primary_scheme,
            Protocol::Secondary => &self.secondary_scheme,
        }
    }

    pub fn ensure_mention(&self, prompt: &str) -> String {
        ensure_mention(prompt, &self.mention)
    }

    /// Blank agents fall back to the target's default agent.
    pub fn resolve_agent<'a>(&'a self, agent: &'a str) -> &'a str {
        if agent.trim().is_empty() {
            &self.default_agent
        } else {
            agent
        }
    }

    /// Build the deep link for `prompt`. Total: percent-encoding accepts any input.
    pub fn deep_link(&self, prompt: &str, agent: &str, protocol: Protocol) -> DeepLink {
        let agent = urlencoding::encode(self.resolve_agent(agent));
        let prompt = self.ensure_mention(prompt);
        let prompt = urlencoding::encode(&prompt);
        DeepLink(format!(
            "{}://{}/chat?agent={}&prompt={}",
            self.scheme(protocol),
            self.namespace,
            agent,
            prompt
        ))
    }

    /// Build the share URL for `prompt` on top of the current page location.
    ///
    /// Any existing query or fragment on `location` is dropped. `proto` is
    /// only written for the non-default protocol.
    pub fn share_url(&self, prompt: &str, protocol: Protocol, location: &Url) -> Url {
        let mut url = location.clone();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(QUERY_PROMPT, prompt);
            if !protocol.is_default() {
                pairs.append_pair(QUERY_PROTOCOL, self.scheme(protocol));
            }
        }
        url
    }

    /// Parse a raw query string (with or without the leading `?`).
    ///
    /// Only the first occurrence of each parameter counts. Returns `None`
    /// when neither `q` nor a decodable `p` yields a prompt.
    pub fn parse_payload(&self, query: &str) -> Option<PlaybackPayload> {
        let query = query.strip_prefix('?').unwrap_or(query);

        let mut prompt = None;
        let mut legacy = None;
        let mut agent = None;
        let mut proto = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*key {
                QUERY_PROMPT => &mut prompt,
                QUERY_LEGACY_PROMPT => &mut legacy,
                QUERY_AGENT => &mut agent,
                QUERY_PROTOCOL => &mut proto,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        let prompt = match prompt {
            Some(prompt) if !prompt.is_empty() => prompt,
            _ => legacy
                .map(|text| decode_legacy_payload(&text))
                .unwrap_or_default(),
        };
        if prompt.is_empty() {
            return None;
        }

        let agent = agent
            .filter(|agent| !agent.is_empty())
            .unwrap_or_else(|| self.default_agent.clone());
        let protocol = if proto.as_deref() == Some(self.secondary_scheme.as_str()) {
            Protocol::Secondary
        } else {
            Protocol::Primary
        };

        Some(PlaybackPayload {
            prompt,
            agent,
            protocol,
        })
    }

    pub fn payload_from_url(&self, url: &Url) -> Option<PlaybackPayload> {
        self.parse_payload(url.query().unwrap_or_default())
    }
}

// ── Free helpers ────────────────────────────────────────────────────────────

/// Prefix `prompt` with `token` and a space unless it already starts with
/// `token`. Idempotent.
pub fn ensure_mention(prompt: &str, token: &str) -> String {
    if prompt.starts_with(token) {
        prompt.to_string()
    } else {
        format!("{token} {prompt}")
    }
}

/// Decode a legacy `p` parameter: base64 → bytes → UTF-8.
///
/// Any failure yields an empty string, which callers treat as "no payload".
pub fn decode_legacy_payload(text: &str) -> String {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let Ok(bytes) = LEGACY_ENGINE.decode(compact.as_bytes()) else {
        tracing::debug!(len = text.len(), "legacy payload is not valid base64");
        return String::new();
    };
    String::from_utf8(bytes).unwrap_or_else(|_| {
        tracing::debug!("legacy payload is not valid UTF-8");
        String::new()
    })
}

/// Produce a legacy `p` parameter for `text`.
pub fn encode_legacy_payload(text: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_target() -> LinkTarget {
        LinkTarget {
            primary_scheme: "primary".to_string(),
            secondary_scheme: "secondary".to_string(),
            namespace: "example.namespace".to_string(),
            ..LinkTarget::default()
        }
    }

    fn page() -> Url {
        Url::parse("https://example.github.io/promptlink/").unwrap()
    }

    #[test]
    fn mention_is_prepended_once() {
        assert_eq!(ensure_mention("hello", "@vscode"), "@vscode hello");
        assert_eq!(ensure_mention("@vscode hello", "@vscode"), "@vscode hello");
        // Prefix match is literal, not word-based.
        assert_eq!(ensure_mention("@vscodex", "@vscode"), "@vscodex");
    }

    #[test]
    fn mention_is_idempotent() {
        for input in ["", " ", "why?", "@vscode", "@VSCode lower", "\n@vscode"] {
            let once = ensure_mention(input, DEFAULT_MENTION);
            assert_eq!(ensure_mention(&once, DEFAULT_MENTION), once, "input {input:?}");
        }
    }

    #[test]
    fn deep_link_matches_reference_scenario() {
        let link = test_target().deep_link("how do prompts work", "", Protocol::Primary);
        assert_eq!(
            link.as_str(),
            "primary://example.namespace/chat?agent=agent&prompt=%40vscode%20how%20do%20prompts%20work"
        );
    }

    #[test]
    fn deep_link_uses_default_target() {
        let link = LinkTarget::default().deep_link("@vscode hi", "agent", Protocol::Secondary);
        assert_eq!(
            link.to_string(),
            "vscode-insiders://GitHub.Copilot-Chat/chat?agent=agent&prompt=%40vscode%20hi"
        );
    }

    #[test]
    fn blank_agent_falls_back_to_default() {
        let target = test_target();
        let link = target.deep_link("x", "   ", Protocol::Primary);
        assert!(link.as_str().contains("agent=agent&"));

        let link = target.deep_link("x", "my agent", Protocol::Primary);
        assert!(link.as_str().contains("agent=my%20agent&"));
    }

    #[test]
    fn deep_link_encodes_reserved_characters() {
        let link = test_target().deep_link("a&b=c/d#e", "", Protocol::Primary);
        assert!(link.as_str().ends_with("prompt=%40vscode%20a%26b%3Dc%2Fd%23e"));
    }

    #[test]
    fn share_url_omits_default_protocol() {
        let url = test_target().share_url("test", Protocol::Primary, &page());
        assert_eq!(url.as_str(), "https://example.github.io/promptlink/?q=test");
        assert!(!url.as_str().contains("proto"));
    }

    #[test]
    fn share_url_marks_secondary_protocol() {
        let url = test_target().share_url("test", Protocol::Secondary, &page());
        assert_eq!(
            url.as_str(),
            "https://example.github.io/promptlink/?q=test&proto=secondary"
        );
    }

    #[test]
    fn share_url_replaces_existing_query_and_fragment() {
        let location = Url::parse("https://example.com/app/?q=old&p=zzz#frag").unwrap();
        let url = LinkTarget::default().share_url("new prompt", Protocol::Primary, &location);
        assert_eq!(url.as_str(), "https://example.com/app/?q=new+prompt");
    }

    #[test]
    fn share_url_round_trips() {
        let target = test_target();
        for protocol in [Protocol::Primary, Protocol::Secondary] {
            for prompt in ["test", "how do prompts work?", "ünïcødé & more", "a+b=c"] {
                let url = target.share_url(prompt, protocol, &page());
                let payload = target.payload_from_url(&url).expect("payload");
                assert_eq!(payload.prompt, prompt);
                assert_eq!(payload.protocol, protocol);
                assert_eq!(payload.agent, DEFAULT_AGENT);
            }
        }
    }

    #[test]
    fn payload_prefers_plain_prompt_over_legacy() {
        let target = LinkTarget::default();
        let legacy = encode_legacy_payload("legacy");
        let payload = target
            .parse_payload(&format!("?q=plain&p={legacy}"))
            .unwrap();
        assert_eq!(payload.prompt, "plain");
    }

    #[test]
    fn payload_falls_back_to_legacy_prompt() {
        let target = LinkTarget::default();
        let legacy = urlencoding::encode(&encode_legacy_payload("héllo wörld")).into_owned();
        let payload = target.parse_payload(&format!("q=&p={legacy}")).unwrap();
        assert_eq!(payload.prompt, "héllo wörld");
    }

    #[test]
    fn payload_is_absent_without_prompt() {
        let target = LinkTarget::default();
        assert_eq!(target.parse_payload(""), None);
        assert_eq!(target.parse_payload("a=bot&proto=vscode-insiders"), None);
        assert_eq!(target.parse_payload("q="), None);
        assert_eq!(target.parse_payload("p=%25%25%25"), None);
    }

    #[test]
    fn payload_reads_agent_and_protocol() {
        let target = LinkTarget::default();
        let payload = target
            .parse_payload("q=hi&a=reviewer&proto=vscode-insiders")
            .unwrap();
        assert_eq!(payload.agent, "reviewer");
        assert_eq!(payload.protocol, Protocol::Secondary);

        let payload = target.parse_payload("q=hi&a=&proto=nightly").unwrap();
        assert_eq!(payload.agent, DEFAULT_AGENT);
        assert_eq!(payload.protocol, Protocol::Primary);
    }

    #[test]
    fn payload_uses_first_occurrence() {
        let payload = LinkTarget::default().parse_payload("q=one&q=two").unwrap();
        assert_eq!(payload.prompt, "one");
    }

    #[test]
    fn legacy_decode_accepts_browser_forms() {
        assert_eq!(decode_legacy_payload("aGk="), "hi");
        assert_eq!(decode_legacy_payload("aGk"), "hi");
        assert_eq!(decode_legacy_payload(" aG\nk= "), "hi");
    }

    #[test]
    fn legacy_decode_swallows_garbage() {
        assert_eq!(decode_legacy_payload("!!!"), "");
        assert_eq!(decode_legacy_payload("a"), "");
        // 0xFF 0xFE is valid base64 but not UTF-8.
        assert_eq!(decode_legacy_payload("//4="), "");
    }

    #[test]
    fn protocol_parses_and_labels() {
        assert_eq!("secondary".parse::<Protocol>().unwrap(), Protocol::Secondary);
        assert_eq!("Primary".parse::<Protocol>().unwrap(), Protocol::Primary);
        assert_eq!(Protocol::Secondary.to_string(), "secondary");
        assert_eq!(Protocol::Secondary.label(), "Insiders");
        assert!(Protocol::default().is_default());
    }
}
