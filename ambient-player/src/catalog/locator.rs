//! Track locator resolution
//!
//! Catalog locators are either absolute `http(s)://` URLs or paths relative
//! to the configured audio base, which may itself be a URL or a local
//! directory.

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Where relative locators are resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioBase {
    Url(String),
    Directory(PathBuf),
}

impl AudioBase {
    /// Parse a configured base; `http(s)://` prefixes select URL mode
    pub fn parse(base: &str) -> Self {
        let base = base.trim();
        if is_http_url(base) {
            AudioBase::Url(base.trim_end_matches('/').to_string())
        } else {
            AudioBase::Directory(PathBuf::from(base))
        }
    }
}

/// Concrete source of a track's audio bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    Url(String),
    File(PathBuf),
}

impl AudioSource {
    /// File extension hint for the decoder, if any
    pub fn extension(&self) -> Option<String> {
        let name = match self {
            AudioSource::Url(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                path.rsplit('/').next().unwrap_or(path).to_string()
            }
            AudioSource::File(path) => path.file_name()?.to_string_lossy().into_owned(),
        };
        let (_, ext) = name.rsplit_once('.')?;
        if ext.is_empty() {
            None
        } else {
            Some(ext.to_ascii_lowercase())
        }
    }
}

impl std::fmt::Display for AudioSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioSource::Url(url) => write!(f, "{}", url),
            AudioSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn is_http_url(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolve a catalog locator against `base`
///
/// Absolute URLs pass through untouched. Relative locators lose their
/// leading slashes and are joined to the base with exactly one separator.
/// Empty locators are rejected.
pub fn resolve_locator(locator: &str, base: &AudioBase) -> Result<AudioSource> {
    let locator = locator.trim();
    if locator.is_empty() {
        return Err(Error::InvalidInput("empty track locator".to_string()));
    }

    if is_http_url(locator) {
        return Ok(AudioSource::Url(locator.to_string()));
    }

    let relative = locator.trim_start_matches('/');
    if relative.is_empty() {
        return Err(Error::InvalidInput(format!("locator '{}' has no path", locator)));
    }

    match base {
        AudioBase::Url(url) => Ok(AudioSource::Url(format!("{}/{}", url, relative))),
        AudioBase::Directory(dir) => Ok(AudioSource::File(dir.join(relative))),
    }
}
