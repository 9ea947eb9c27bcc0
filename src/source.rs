//! Bot script source loading.
//!
//! A script identifier is either a local path or an `http(s)` URL.
//! Remote fetches require a 200-class response; anything else fails
//! the match for that script.

use std::fmt;
use std::path::Path;

/// A resolved bot script: its display label and source text.
#[derive(Debug, Clone)]
pub struct ScriptSource {
    /// Display label derived from the identifier.
    pub label: String,
    /// The script source text.
    pub code: String,
}

impl ScriptSource {
    /// Resolve an identifier into a loaded source.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the fetch does
    /// not return a 200-class response.
    pub fn resolve(identifier: &str) -> Result<Self, SourceError> {
        Ok(Self {
            label: bot_label(identifier),
            code: read_source(identifier)?,
        })
    }
}

/// Error loading a script source.
#[derive(Debug)]
pub enum SourceError {
    /// Local file read failed.
    Io {
        /// The identifier that failed.
        identifier: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Remote fetch failed or returned a non-2xx status.
    Fetch {
        /// The URL that failed.
        url: String,
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { identifier, source } => {
                write!(f, "failed to read {identifier}: {source}")
            }
            Self::Fetch { url, reason } => write!(f, "failed to fetch {url}: {reason}"),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Fetch { .. } => None,
        }
    }
}

/// Read a script source from a path or URL.
///
/// # Errors
///
/// Returns an error if reading or fetching fails.
pub fn read_source(identifier: &str) -> Result<String, SourceError> {
    if identifier.starts_with("http://") || identifier.starts_with("https://") {
        // ureq treats non-2xx statuses as errors, which is exactly the
        // contract here.
        let response = ureq::get(identifier)
            .call()
            .map_err(|e| SourceError::Fetch {
                url: identifier.to_string(),
                reason: e.to_string(),
            })?;
        response
            .into_string()
            .map_err(|e| SourceError::Fetch {
                url: identifier.to_string(),
                reason: e.to_string(),
            })
    } else {
        std::fs::read_to_string(identifier).map_err(|e| SourceError::Io {
            identifier: identifier.to_string(),
            source: e,
        })
    }
}

/// Derive a readable bot label from an identifier.
///
/// URLs in the `host/owner/repo/...` shape label as `repo/file`; local
/// paths label as `parent-dir/file`, both with the extension dropped.
#[must_use]
pub fn bot_label(identifier: &str) -> String {
    if identifier.starts_with("http://") || identifier.starts_with("https://") {
        let parts: Vec<&str> = identifier.split('/').collect();
        if parts.len() >= 5 {
            let repo = parts[4];
            let file = parts[parts.len() - 1];
            return format!("{repo}/{}", strip_extension(file));
        }
        return strip_extension(parts.last().unwrap_or(&identifier)).to_string();
    }

    let path = Path::new(identifier);
    let file = path
        .file_stem()
        .map_or_else(|| identifier.to_string(), |s| s.to_string_lossy().to_string());
    let dir = path
        .parent()
        .and_then(Path::file_name)
        .map(|s| s.to_string_lossy().to_string());
    match dir {
        Some(dir) if !dir.is_empty() => format!("{dir}/{file}"),
        _ => file,
    }
}

fn strip_extension(file: &str) -> &str {
    file.rsplit_once('.').map_or(file, |(stem, _)| stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_url() {
        let label =
            bot_label("https://raw.githubusercontent.com/alice/mybots/main/orbit.lua");
        assert_eq!(label, "mybots/orbit");
    }

    #[test]
    fn test_label_from_short_url() {
        let label = bot_label("https://example.com/bot.lua");
        // host/owner/repo shape not present; fall back to the file.
        assert_eq!(label, "bot");
    }

    #[test]
    fn test_label_from_path() {
        assert_eq!(bot_label("bots/orbit_evader.lua"), "bots/orbit_evader");
        assert_eq!(bot_label("orbit.lua"), "orbit");
    }

    #[test]
    fn test_read_source_local_file() {
        let path = std::env::temp_dir().join("skirmish_source_test.lua");
        std::fs::write(&path, "function run(state) end").unwrap();
        let code = read_source(path.to_str().unwrap()).unwrap();
        assert!(code.contains("function run"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_read_source_missing_file() {
        let err = read_source("no/such/bot.lua").unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
        assert!(format!("{err}").contains("no/such/bot.lua"));
    }

    #[test]
    fn test_resolve_sets_label() {
        let path = std::env::temp_dir().join("skirmish_resolve_test.lua");
        std::fs::write(&path, "function run(state) end").unwrap();
        let source = ScriptSource::resolve(path.to_str().unwrap()).unwrap();
        assert!(source.label.ends_with("skirmish_resolve_test"));
        std::fs::remove_file(&path).ok();
    }
}
