//! Human-readable campaign progress on stdout.

use std::fmt::Display;
use std::io::IsTerminal;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::{Color, Style};

use crate::client::IterationResult;
use crate::params::TestParameters;

/// Console color theme.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Theme {
    /// Dark palette when stdout is a terminal, plain otherwise.
    Auto,
    /// Palette for light backgrounds.
    Light,
    /// Palette for dark backgrounds.
    Dark,
    /// No colors.
    Plain,
}

/// Which phase an iteration belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunPhase {
    /// Timing discarded.
    Warmup,
    /// Timing averaged into the report.
    Measured,
}

impl RunPhase {
    fn label(self) -> &'static str {
        match self {
            RunPhase::Warmup => "WARMUP",
            RunPhase::Measured => "TEST",
        }
    }
}

/// Nesting level of a sweep section heading.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Level {
    /// Transaction type.
    TxType,
    /// Data format.
    DataFormat,
    /// Operation.
    Operation,
    /// Datastore.
    Datastore,
}

/// Console writer shared by the sweep and the aggregator.
pub struct Ui {
    palette: Palette,
    paint: bool,
    quiet: bool,
    spinner_style: ProgressStyle,
}

impl Ui {
    /// Creates a console. `quiet` drops per-iteration lines and spinners.
    pub fn new(theme: Theme, quiet: bool) -> Self {
        let stdout_is_tty = std::io::stdout().is_terminal();
        let paint = match theme {
            Theme::Plain => false,
            Theme::Auto | Theme::Light | Theme::Dark => stdout_is_tty,
        };

        #[cfg(windows)]
        if paint {
            let _ = nu_ansi_term::enable_ansi_support();
        }

        let palette = match theme {
            Theme::Plain => Palette::plain(),
            Theme::Light => Palette::light(),
            Theme::Dark | Theme::Auto => Palette::dark(),
        };

        let spinner_style = ProgressStyle::with_template("{prefix} {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

        Self {
            palette,
            paint,
            quiet,
            spinner_style,
        }
    }

    /// Banner printed before each test matrix.
    pub fn banner(&self, title: &str) {
        let rule = "#".repeat(39);
        println!();
        self.styled(&self.palette.heading, &rule);
        self.styled(&self.palette.heading, title);
        self.styled(&self.palette.heading, &rule);
    }

    /// Heading for an entered sweep level.
    pub fn level(&self, level: Level, value: impl Display) {
        match level {
            Level::TxType => {
                let rule = "*".repeat(39);
                self.styled(&self.palette.heading, &rule);
                self.styled(&self.palette.heading, &format!("Transaction Type: {value}"));
                self.styled(&self.palette.heading, &rule);
            }
            Level::DataFormat => {
                let rule = "-".repeat(39);
                self.styled(&self.palette.key, &rule);
                self.styled(&self.palette.key, &format!("Data format: {value}"));
                self.styled(&self.palette.key, &rule);
            }
            Level::Operation => self.styled(&self.palette.key, &format!("Operation: {value}")),
            Level::Datastore => self.styled(&self.palette.key, &format!("Data Store: {value}")),
        }
    }

    /// Parameters of the combination about to run.
    pub fn combination(&self, params: &TestParameters) {
        self.styled(&self.palette.value, &params.to_string());
    }

    /// One warmup or measured iteration.
    pub fn iteration(&self, phase: RunPhase, index: u32, result: &IterationResult) {
        if !result.is_success() {
            self.warn(&format!(
                "Error {}, {}",
                result.http_status,
                result.error_body.as_deref().unwrap_or("")
            ));
        }
        if self.quiet {
            return;
        }
        println!(
            "{} #{index}: status: {}, listBuildTime {}, testExecTime {}, txOk {}, txError {}",
            phase.label(),
            result.status.as_deref().unwrap_or("-"),
            or_dash(result.list_build_micros),
            or_dash(result.exec_micros),
            or_dash(result.tx_ok),
            or_dash(result.tx_error),
        );
    }

    /// Derived throughput of one combination.
    pub fn rates(&self, tx_rate: Option<f64>, update_rate: Option<f64>) {
        let line = format!(
            "    tx_rate: {}, upd_rate: {}",
            format_rate(tx_rate),
            format_rate(update_rate)
        );
        self.styled(&self.palette.success, &line);
    }

    /// Neutral status line.
    pub fn info(&self, message: &str) {
        if self.paint {
            println!("{} {message}", self.palette.info.paint(INFO_ICON));
        } else {
            println!("{INFO_ICON} {message}");
        }
    }

    /// Warning line on stderr.
    pub fn warn(&self, message: &str) {
        if self.paint {
            eprintln!("{} {message}", self.palette.warn.paint(WARNING_ICON));
        } else {
            eprintln!("{WARNING_ICON} {message}");
        }
    }

    /// Starts a spinner that reports interruption if dropped unfinished.
    pub fn task(&self, label: impl Into<String>) -> TaskGuard<'_> {
        let label = label.into();
        let pb = if self.quiet || !self.paint {
            None
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(self.spinner_style.clone());
            pb.set_prefix(self.palette.info.paint(PROGRESS_ICON).to_string());
            pb.set_message(label.clone());
            pb.enable_steady_tick(Duration::from_millis(120));
            Some(pb)
        };
        TaskGuard {
            ui: self,
            label,
            start: Instant::now(),
            finished: false,
            pb,
        }
    }

    fn styled(&self, style: &Style, text: &str) {
        if self.paint {
            println!("{}", style.paint(text));
        } else {
            println!("{text}");
        }
    }
}

/// Spinner handle returned by [`Ui::task`].
pub struct TaskGuard<'a> {
    ui: &'a Ui,
    label: String,
    start: Instant,
    finished: bool,
    pb: Option<ProgressBar>,
}

impl TaskGuard<'_> {
    /// Stops the spinner and returns the elapsed time.
    pub fn finish(mut self) -> Duration {
        self.finished = true;
        let elapsed = self.start.elapsed();
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
        elapsed
    }
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let elapsed = format_duration(self.start.elapsed());
        if let Some(pb) = self.pb.take() {
            pb.abandon_with_message(format!("{} interrupted after {elapsed}", self.label));
        } else {
            self.ui
                .warn(&format!("{} interrupted after {elapsed}", self.label));
        }
    }
}

/// Rate for display; `n/a` marks an unusable divisor.
pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{rate:.0}"),
        None => "n/a".to_string(),
    }
}

/// Short human duration, e.g. `1.25s` or `340ms`.
pub fn format_duration(duration: Duration) -> String {
    if duration.as_secs_f64() >= 1.0 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{:.0}ms", duration.as_secs_f64() * 1_000.0)
    }
}

fn or_dash(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

struct Palette {
    heading: Style,
    key: Style,
    value: Style,
    info: Style,
    success: Style,
    warn: Style,
}

impl Palette {
    fn dark() -> Self {
        Self {
            heading: Style::new().fg(Color::Purple).bold(),
            key: Style::new().fg(Color::LightBlue).bold(),
            value: Style::new().fg(Color::White),
            info: Style::new().fg(Color::LightCyan),
            success: Style::new().fg(Color::LightGreen).bold(),
            warn: Style::new().fg(Color::Yellow).bold(),
        }
    }

    fn light() -> Self {
        Self {
            heading: Style::new().fg(Color::Blue).bold(),
            key: Style::new().fg(Color::Black).bold(),
            value: Style::new().fg(Color::Black),
            info: Style::new().fg(Color::Purple),
            success: Style::new().fg(Color::Green).bold(),
            warn: Style::new().fg(Color::Red).bold(),
        }
    }

    fn plain() -> Self {
        Self {
            heading: Style::new(),
            key: Style::new(),
            value: Style::new(),
            info: Style::new(),
            success: Style::new(),
            warn: Style::new(),
        }
    }
}

const WARNING_ICON: &str = "⚠";
const INFO_ICON: &str = "ℹ";
const PROGRESS_ICON: &str = "▶";
