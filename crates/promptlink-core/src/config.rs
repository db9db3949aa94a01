use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::codec::LinkTarget;
use crate::error::{Error, Result};
use crate::scheduler::Pacing;

/// Page URL used when nothing else is configured (local dev server).
pub const DEFAULT_PAGE_URL: &str = "http://localhost:3000/";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings directory (holds `config.toml`)
    pub settings_dir: PathBuf,
    /// Public URL of the page share links point at
    pub page_url: String,
    /// Deep link target: mention token, namespace, schemes, default agent
    pub target: LinkTarget,
    /// Typing animation cadence
    pub pacing: Pacing,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings_dir: default_settings_dir(),
            page_url: DEFAULT_PAGE_URL.to_string(),
            target: LinkTarget::default(),
            pacing: Pacing::default(),
        }
    }
}

fn default_settings_dir() -> PathBuf {
    let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home_dir.join(".promptlink")
}

impl Config {
    /// Default location of the config file.
    pub fn default_path() -> PathBuf {
        default_settings_dir().join("config.toml")
    }

    /// Load configuration from file. A missing file yields the defaults.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = path.unwrap_or_else(Self::default_path);

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let content =
            std::fs::read_to_string(&config_path).map_err(|source| Error::ConfigRead {
                path: config_path.clone(),
                source,
            })?;
        let config: Config = toml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: config_path.clone(),
            source,
        })?;
        tracing::debug!(path = %config_path.display(), "config loaded");
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: Option<PathBuf>) -> Result<()> {
        let config_path = path.unwrap_or_else(|| self.settings_dir.join("config.toml"));

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| write_error(&config_path, source))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content).map_err(|source| write_error(&config_path, source))?;
        Ok(())
    }

    /// The page location share links are built on, honouring the static
    /// export base path of a CI build.
    pub fn page_location(&self) -> Result<Url> {
        let base_path = base_path_from(
            std::env::var("GITHUB_ACTIONS").ok().as_deref(),
            std::env::var("GITHUB_REPOSITORY").ok().as_deref(),
        );
        self.page_location_with(base_path.as_deref())
    }

    /// Like [`Config::page_location`] with an explicit base path
    /// (e.g. `/promptlink`).
    ///
    /// The base path is only applied to a root page URL. The result never
    /// carries a query or fragment and its path always ends with `/`.
    pub fn page_location_with(&self, base_path: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&self.page_url).map_err(|source| Error::InvalidPageUrl {
            url: self.page_url.clone(),
            source,
        })?;
        if url.cannot_be_a_base() {
            return Err(Error::OpaquePageUrl(self.page_url.clone()));
        }

        url.set_query(None);
        url.set_fragment(None);

        if let Some(base) = base_path.map(|b| b.trim_matches('/')).filter(|b| !b.is_empty()) {
            if url.path() == "/" {
                url.set_path(&format!("/{base}/"));
            }
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}

fn write_error(path: &Path, source: std::io::Error) -> Error {
    Error::ConfigWrite {
        path: path.to_path_buf(),
        source,
    }
}

/// Base path of a static export built on CI: `/<repo>` when running under
/// GitHub Actions with `GITHUB_REPOSITORY=<owner>/<repo>`.
pub fn base_path_from(github_actions: Option<&str>, repository: Option<&str>) -> Option<String> {
    if github_actions != Some("true") {
        return None;
    }
    let repo = repository?.rsplit('/').next()?;
    if repo.is_empty() {
        return None;
    }
    Some(format!("/{repo}"))
}
