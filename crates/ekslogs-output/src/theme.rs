use crossterm::style::Color;

use ekslogs_types::{LogLevel, LogType};

/// Color theme for terminal output
pub struct Theme;

impl Theme {
    pub const TIMESTAMP: Color = Color::DarkGrey;

    // Log level colors
    pub const LOG_TRACE: Color = Color::DarkGrey;
    pub const LOG_DEBUG: Color = Color::Blue;
    pub const LOG_INFO: Color = Color::Green;
    pub const LOG_WARN: Color = Color::Yellow;
    pub const LOG_ERROR: Color = Color::Red;
    pub const LOG_FATAL: Color = Color::Magenta;

    // Message highlights
    pub const HL_FAILURE: Color = Color::Red;
    pub const HL_SUCCESS: Color = Color::Green;
    pub const HL_RESOURCE: Color = Color::Cyan;
    pub const HL_SOURCE: Color = Color::DarkGrey;

    // Preset listing
    pub const PRESET_BASIC: Color = Color::Cyan;
    pub const PRESET_ADVANCED: Color = Color::Magenta;

    pub fn level(level: LogLevel) -> Color {
        match level {
            LogLevel::Trace => Self::LOG_TRACE,
            LogLevel::Debug => Self::LOG_DEBUG,
            LogLevel::Info => Self::LOG_INFO,
            LogLevel::Warn => Self::LOG_WARN,
            LogLevel::Error => Self::LOG_ERROR,
            LogLevel::Fatal => Self::LOG_FATAL,
        }
    }

    /// Component color by log type; unclassified streams are grey
    pub fn component(log_type: Option<LogType>) -> Color {
        match log_type {
            Some(LogType::Api) => Color::Green,
            Some(LogType::Audit) => Color::Blue,
            Some(LogType::Authenticator) => Color::Magenta,
            Some(LogType::Kcm) => Color::Cyan,
            Some(LogType::Ccm) => Color::DarkCyan,
            Some(LogType::Scheduler) => Color::Yellow,
            None => Color::Grey,
        }
    }
}
