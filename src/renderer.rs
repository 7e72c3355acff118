use crate::engine::CancelToken;
use crate::errors::RenderFailure;
use crate::models::{Background, CardSpec, RenderConfig};
use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
/// How long to keep collecting stderr once the child is gone. Descendants of
/// the tool may still hold the pipe open.
const STDERR_GRACE: Duration = Duration::from_millis(500);

/// Something that can turn one card into an image file.
pub trait CardRenderer: Sync {
    fn render(
        &self,
        card: &CardSpec,
        destination: &Path,
        cancel: &CancelToken,
    ) -> Result<(), RenderFailure>;
}

/// Renders cards by running an ImageMagick-compatible `convert` program.
#[derive(Debug, Clone)]
pub struct ConvertRenderer {
    program: PathBuf,
    config: RenderConfig,
    timeout: Option<Duration>,
}

impl ConvertRenderer {
    pub fn new(program: impl Into<PathBuf>, config: RenderConfig, timeout: Option<Duration>) -> Self {
        ConvertRenderer {
            program: program.into(),
            config,
            timeout,
        }
    }

    /// Argument vector for one card. Both background modes lay the caption
    /// out in the content area and grow it back to full size with a border.
    pub fn arguments(&self, card: &CardSpec, destination: &Path) -> Vec<OsString> {
        let config = &self.config;
        let content_size = format!("{}x{}", config.content_width(), config.content_height());
        let border = format!("{0}x{0}", config.padding);
        let caption = format!("caption:{}", escape_caption(&card.text));
        let point_size = card.font_size.to_string();

        match &config.background {
            Background::Color(color) => vec![
                "-background".into(),
                color.into(),
                "-pointsize".into(),
                point_size.into(),
                "-gravity".into(),
                "Center".into(),
                "-size".into(),
                content_size.into(),
                caption.into(),
                "-bordercolor".into(),
                color.into(),
                "-border".into(),
                border.into(),
                destination.into(),
            ],
            Background::Image(image) => vec![
                image.into(),
                "-resize".into(),
                format!("{}x{}!", config.width, config.height).into(),
                "(".into(),
                "-background".into(),
                "none".into(),
                "-pointsize".into(),
                point_size.into(),
                "-gravity".into(),
                "Center".into(),
                "-size".into(),
                content_size.into(),
                caption.into(),
                "-bordercolor".into(),
                "none".into(),
                "-border".into(),
                border.into(),
                ")".into(),
                "-gravity".into(),
                "Center".into(),
                "-composite".into(),
                destination.into(),
            ],
        }
    }

    fn run(&self, args: Vec<OsString>, cancel: &CancelToken) -> Result<(), RenderFailure> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RenderFailure::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        // stderr is drained on its own thread while the child is polled.
        let (stderr_tx, stderr_rx) = mpsc::channel();
        if let Some(mut pipe) = child.stderr.take() {
            thread::spawn(move || {
                let mut buf = String::new();
                let _ = pipe.read_to_string(&mut buf);
                let _ = stderr_tx.send(buf);
            });
        }

        let waited = self.wait(&mut child, cancel);
        let stderr = stderr_rx.recv_timeout(STDERR_GRACE).unwrap_or_default();

        let status = waited?;
        if status.success() {
            Ok(())
        } else {
            Err(RenderFailure::Exit {
                code: status.code(),
                stderr: stderr.trim().to_string(),
            })
        }
    }

    fn wait(&self, child: &mut Child, cancel: &CancelToken) -> Result<ExitStatus, RenderFailure> {
        let started_at = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if cancel.is_cancelled() {
                kill(child);
                return Err(RenderFailure::Cancelled);
            }
            if let Some(timeout) = self.timeout {
                if started_at.elapsed() >= timeout {
                    kill(child);
                    return Err(RenderFailure::TimedOut { timeout });
                }
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl CardRenderer for ConvertRenderer {
    fn render(
        &self,
        card: &CardSpec,
        destination: &Path,
        cancel: &CancelToken,
    ) -> Result<(), RenderFailure> {
        if cancel.is_cancelled() {
            return Err(RenderFailure::Cancelled);
        }

        let args = self.arguments(card, destination);
        debug!(
            program = %self.program.display(),
            args = ?args,
            "Invoking image tool"
        );

        let started_at = Instant::now();
        let result = self.run(args, cancel);
        match &result {
            Ok(()) => debug!(
                destination = %destination.display(),
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                "Card rendered"
            ),
            Err(err) => {
                warn!(
                    destination = %destination.display(),
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    error = %err,
                    "Card render failed"
                );
                // The tool never ran, so whatever is there is not ours.
                if !matches!(err, RenderFailure::Spawn { .. }) {
                    remove_partial(destination);
                }
            }
        }
        result
    }
}

fn kill(child: &mut Child) {
    if let Err(err) = child.kill() {
        warn!(error = %err, "Failed to kill image tool");
    }
    let _ = child.wait();
}

fn remove_partial(destination: &Path) {
    match fs::remove_file(destination) {
        Ok(()) => debug!(destination = %destination.display(), "Removed partial output"),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => warn!(
            destination = %destination.display(),
            error = %err,
            "Failed to remove partial output"
        ),
    }
}

/// Escapes text the image tool would otherwise interpret: `%` escapes,
/// backslashes, and a leading `@` that reads the caption from a file.
pub fn escape_caption(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    if text.starts_with('@') {
        escaped.push('\\');
    }
    for c in text.chars() {
        match c {
            '%' => escaped.push_str("%%"),
            '\\' => escaped.push_str("\\\\"),
            _ => escaped.push(c),
        }
    }
    escaped
}
