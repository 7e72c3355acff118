use crate::errors::ValidationError;
use crate::models::{Background, OutputTarget, RenderConfig};
use crate::naming::FilenameTemplate;
use clap::Parser;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Renders one captioned card image per row of a `text,fontSize` CSV file.
///
/// Required parameters are checked by the program itself so each missing one
/// gets its own message.
#[derive(Parser, Debug, Default)]
#[command(name = "card_maker", version)]
pub struct CliArgs {
    /// The path to your input file.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// The path of the directory where your cards will be saved.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// The desired width of your card.
    #[arg(long)]
    pub width: Option<u32>,

    /// The desired height of your card.
    #[arg(long)]
    pub height: Option<u32>,

    /// The padding around your card. The width and height will not be affected.
    #[arg(long, default_value_t = 0)]
    pub padding: u32,

    /// The background color of the card as a hex string (e.g. '#ff0000').
    #[arg(long = "bkg-color", default_value = "#ffffff")]
    pub bkg_color: String,

    /// The background image to put the text over. If specified, --bkg-color is not used.
    #[arg(long = "bkg-img")]
    pub bkg_img: Option<PathBuf>,

    /// The image tool to run (ImageMagick `convert` or compatible).
    #[arg(long, env = "CARD_MAKER_CONVERT", default_value = "convert")]
    pub convert: PathBuf,

    /// How many cards to render at once. Defaults to the number of CPUs.
    #[arg(long, env = "CARD_MAKER_JOBS")]
    pub jobs: Option<usize>,

    /// Seconds a single card may take before it is abandoned. 0 disables the limit.
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,

    /// Seconds the whole batch may take; unfinished cards are cancelled after that.
    #[arg(long = "batch-timeout")]
    pub batch_timeout: Option<u64>,

    /// File name prefix of the numbered cards.
    #[arg(long = "name-prefix", default_value = "card")]
    pub name_prefix: String,

    /// Enable diagnostic logging.
    #[arg(long, default_value_t = false)]
    pub log: bool,
}

/// Validated, ready-to-run settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub input: PathBuf,
    pub target: OutputTarget,
    pub render: RenderConfig,
    pub program: PathBuf,
    pub jobs: usize,
    pub timeout: Option<Duration>,
    pub batch_timeout: Option<Duration>,
}

/// Checks the arguments in order and stops at the first problem.
pub fn validate(args: CliArgs) -> Result<Settings, ValidationError> {
    let input = args.input.ok_or(ValidationError::MissingInput)?;
    let output = args.output.ok_or(ValidationError::MissingOutput)?;
    let width = args.width.ok_or(ValidationError::MissingWidth)?;
    let height = args.height.ok_or(ValidationError::MissingHeight)?;

    // Make sure the input file can be read
    if !is_readable_file(&input) {
        return Err(ValidationError::InputUnreadable(input));
    }

    check_output_dir(&output)?;

    // Make sure the background image can be read (if it was set)
    if let Some(image) = &args.bkg_img {
        if !is_readable_file(image) {
            return Err(ValidationError::BackgroundUnreadable(image.clone()));
        }
    }

    check_dimension("width", width, args.padding)?;
    check_dimension("height", height, args.padding)?;

    let background = match args.bkg_img {
        Some(image) => Background::Image(image),
        None if is_hex_color(&args.bkg_color) => Background::Color(args.bkg_color),
        None => return Err(ValidationError::InvalidColor(args.bkg_color)),
    };

    let jobs = match args.jobs {
        Some(0) => return Err(ValidationError::NoWorkers),
        Some(jobs) => jobs,
        None => thread::available_parallelism().map_or(1, |n| n.get()),
    };

    if args.name_prefix.is_empty() || args.name_prefix.contains(['/', '\\']) {
        return Err(ValidationError::InvalidPrefix(args.name_prefix));
    }

    Ok(Settings {
        input,
        target: OutputTarget::new(output, FilenameTemplate::new(args.name_prefix)),
        render: RenderConfig {
            width,
            height,
            padding: args.padding,
            background,
        },
        program: args.convert,
        jobs,
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        batch_timeout: args.batch_timeout.map(Duration::from_secs),
    })
}

/// The output must be an existing, writable directory. Writability is probed
/// with an anonymous temp file that is gone again when this returns.
fn check_output_dir(output: &Path) -> Result<(), ValidationError> {
    let metadata =
        fs::metadata(output).map_err(|_| ValidationError::OutputUnwritable(output.to_path_buf()))?;
    if !metadata.is_dir() {
        return Err(ValidationError::OutputNotDirectory(output.to_path_buf()));
    }
    tempfile::tempfile_in(output)
        .map(drop)
        .map_err(|_| ValidationError::OutputUnwritable(output.to_path_buf()))
}

/// Opening succeeds on directories too, so the file type is checked as well.
fn is_readable_file(path: &Path) -> bool {
    File::open(path)
        .and_then(|file| file.metadata())
        .is_ok_and(|metadata| metadata.is_file())
}

fn check_dimension(dimension: &'static str, size: u32, padding: u32) -> Result<(), ValidationError> {
    if u64::from(size) > 2 * u64::from(padding) {
        Ok(())
    } else {
        Err(ValidationError::PaddingTooLarge {
            dimension,
            size,
            padding,
        })
    }
}

fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(digits) => {
            matches!(digits.len(), 3 | 4 | 6 | 8) && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}
