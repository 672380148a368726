use std::io::{self, Stdout, Write};
use std::str::FromStr;

use chrono::SecondsFormat;
use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use serde::Deserialize;
use thiserror::Error;

use ekslogs_types::{LogEntry, LogType};

use crate::highlight::highlight_message;
use crate::theme::Theme;

/// Invalid `--color` or `--output` value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} '{value}' (expected one of: {expected})")]
pub struct ParseModeError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

/// When to emit ANSI colors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Resolve against a concrete output handle
    pub fn enabled(&self, out: &impl IsTty) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::env::var_os("NO_COLOR").is_none() && out.is_tty(),
        }
    }
}

impl FromStr for ColorMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorMode::Auto),
            "always" => Ok(ColorMode::Always),
            "never" => Ok(ColorMode::Never),
            _ => Err(ParseModeError {
                kind: "color mode",
                value: s.to_string(),
                expected: "auto, always, never",
            }),
        }
    }
}

/// Line format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(ParseModeError {
                kind: "output format",
                value: s.to_string(),
                expected: "text, json",
            }),
        }
    }
}

/// Writes one line per entry and flushes after each, so piped output
/// appears immediately.
pub struct Printer<W: Write = Stdout> {
    out: W,
    format: OutputFormat,
    message_only: bool,
    color: bool,
}

impl Printer<Stdout> {
    pub fn stdout(format: OutputFormat, message_only: bool, color: ColorMode) -> Self {
        let out = io::stdout();
        let color = color.enabled(&out);
        Self::new(out, format, message_only, color)
    }
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, format: OutputFormat, message_only: bool, color: bool) -> Self {
        Self {
            out,
            format,
            message_only,
            color,
        }
    }

    pub fn print(&mut self, entry: &LogEntry) -> io::Result<()> {
        let line = self.render(entry)?;
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }

    /// Render without the trailing newline
    pub fn render(&self, entry: &LogEntry) -> io::Result<String> {
        if self.format == OutputFormat::Json {
            return serde_json::to_string(entry).map_err(io::Error::other);
        }
        if self.message_only {
            return Ok(entry.message.clone());
        }

        let timestamp = entry
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let level = entry.level.map(|l| l.as_str()).unwrap_or_default();

        if !self.color {
            return Ok(format!(
                "{} [{}] [{}] {}",
                timestamp, level, entry.component, entry.message
            ));
        }

        let log_type = entry.log_type();
        let level = match entry.level {
            Some(l) => level.with(Theme::level(l)).to_string(),
            None => String::new(),
        };
        let message = if log_type == Some(LogType::Audit) {
            entry.message.clone()
        } else {
            highlight_message(&entry.message)
        };

        Ok(format!(
            "{} [{}] [{}] {}",
            timestamp.with(Theme::TIMESTAMP),
            level,
            entry.component.as_str().with(Theme::component(log_type)),
            message
        ))
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
