// src/errors.rs
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for a card batch run.
#[derive(Error, Debug)]
pub enum CardError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not start the worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Bad or missing command-line arguments and inaccessible paths.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("You must supply the path to your input file via the --input parameter. Use --help for guidance.")]
    MissingInput,

    #[error("You must supply the path to your output directory via the --output parameter. Use --help for guidance.")]
    MissingOutput,

    #[error("You must supply the desired width of your card via the --width parameter. Use --help for guidance.")]
    MissingWidth,

    #[error("You must supply the desired height of your card via the --height parameter. Use --help for guidance.")]
    MissingHeight,

    #[error("The input file either doesn't exist or cannot be read: {}", .0.display())]
    InputUnreadable(PathBuf),

    #[error("The output directory either doesn't exist or cannot be written to: {}", .0.display())]
    OutputUnwritable(PathBuf),

    #[error("The output path must point to a directory, not a file: {}", .0.display())]
    OutputNotDirectory(PathBuf),

    #[error("The background image either doesn't exist or cannot be read: {}", .0.display())]
    BackgroundUnreadable(PathBuf),

    #[error("The {dimension} must be greater than twice the padding ({dimension} {size}, padding {padding}).")]
    PaddingTooLarge {
        dimension: &'static str,
        size: u32,
        padding: u32,
    },

    #[error("The background color must be a hex string such as '#ff0000', got '{0}'.")]
    InvalidColor(String),

    #[error("The --jobs parameter must be at least 1.")]
    NoWorkers,

    #[error("The --name-prefix parameter must be a non-empty file name without path separators, got '{0}'.")]
    InvalidPrefix(String),
}

/// Malformed or wrongly shaped input CSV.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Your CSV file could not be parsed: {0}")]
    Malformed(#[from] csv::Error),

    #[error("No data to process.")]
    NoData,

    #[error("Your CSV file is not in the correct format. You should have two columns: 'text' and 'fontSize', in that order.")]
    BadHeader,

    #[error("Row {row} has an invalid fontSize '{value}'. It must be a positive number.")]
    InvalidFontSize { row: usize, value: String },
}

/// Why a single card failed to render.
#[derive(Error, Debug)]
pub enum RenderFailure {
    #[error("could not launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("image tool exited with {}: {stderr}", exit_label(.code))]
    Exit { code: Option<i32>, stderr: String },

    #[error("image tool did not finish within {timeout:?}")]
    TimedOut { timeout: std::time::Duration },

    #[error("batch was cancelled before the card finished")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A render failure tied to the card it belongs to.
#[derive(Error, Debug)]
#[error("Card {index} ({filename}) failed: {cause}")]
pub struct RenderError {
    pub index: usize,
    pub filename: String,
    #[source]
    pub cause: RenderFailure,
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}
