use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Marker replaced by the user's text when a prompt is rendered.
pub const TEXT_PLACEHOLDER: &str = "{{TEXT}}";

/// Prompt document loaded once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    source: String,
}

#[derive(Debug)]
pub enum PromptError {
    Io { path: PathBuf, source: std::io::Error },
    MissingPlaceholder,
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::Io { path, source } => {
                write!(f, "failed to read prompt template {}: {source}", path.display())
            }
            PromptError::MissingPlaceholder => {
                write!(f, "prompt template does not contain {TEXT_PLACEHOLDER}")
            }
        }
    }
}

impl std::error::Error for PromptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PromptError::Io { source, .. } => Some(source),
            PromptError::MissingPlaceholder => None,
        }
    }
}

impl PromptTemplate {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PromptError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| PromptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_string(source)
    }

    pub fn from_string(source: impl Into<String>) -> Result<Self, PromptError> {
        let source = source.into();
        if !source.contains(TEXT_PLACEHOLDER) {
            return Err(PromptError::MissingPlaceholder);
        }
        Ok(Self { source })
    }

    /// Renders the prompt for one request.
    ///
    /// Only the first placeholder is substituted and the text is inserted
    /// literally, so braces or `$` sequences in user input are never expanded.
    pub fn render(&self, text: &str) -> String {
        self.source.replacen(TEXT_PLACEHOLDER, sanitize(text), 1)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

fn sanitize(text: &str) -> &str {
    text.trim()
}
