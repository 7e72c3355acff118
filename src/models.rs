use crate::errors::RenderError;
use crate::naming::FilenameTemplate;
use serde_derive::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Raw data row as it appears in the input CSV.
#[derive(Debug, Deserialize, Clone)]
pub struct InputRecord {
    pub text: String,
    #[serde(rename = "fontSize")]
    pub font_size: String,
}

/// One card to render: the caption and its point size.
#[derive(Debug, PartialEq, Clone)]
pub struct CardSpec {
    pub text: String,
    pub font_size: f64,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Background {
    /// Flat colour as a hex string, e.g. `#ffffff`.
    Color(String),
    /// Image the caption is composited over.
    Image(PathBuf),
}

/// Card geometry and background shared by every render call of a run.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub padding: u32,
    pub background: Background,
}

impl RenderConfig {
    /// Width of the caption area once padding is taken off both sides.
    pub fn content_width(&self) -> u32 {
        self.width - 2 * self.padding
    }

    /// Height of the caption area once padding is taken off both sides.
    pub fn content_height(&self) -> u32 {
        self.height - 2 * self.padding
    }
}

/// Directory the cards are written to, plus how they are named.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct OutputTarget {
    directory: PathBuf,
    template: FilenameTemplate,
}

impl OutputTarget {
    pub fn new(directory: impl Into<PathBuf>, template: FilenameTemplate) -> Self {
        OutputTarget {
            directory: directory.into(),
            template,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn template(&self) -> &FilenameTemplate {
        &self.template
    }

    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.directory.join(filename)
    }
}

impl fmt::Display for OutputTarget {
    /// Shows the directory with exactly one trailing separator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = self.directory.display().to_string();
        if dir.ends_with(MAIN_SEPARATOR) || dir.ends_with('/') {
            write!(f, "{dir}")
        } else {
            write!(f, "{dir}{MAIN_SEPARATOR}")
        }
    }
}

/// Outcome of one render call, handed to the progress reporter.
#[derive(Debug)]
pub struct JobResult {
    pub index: usize,
    pub filename: String,
    pub outcome: Result<(), RenderError>,
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}
