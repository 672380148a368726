//! Informational subcommands

use crossterm::style::Stylize;

use ekslogs_logs::{FilterPresets, LogType, Preset};
use ekslogs_output::Theme;

pub fn version() -> String {
    format!("ekslogs version {}\n", env!("CARGO_PKG_VERSION"))
}

pub fn log_types() -> String {
    let mut out = String::from("Available log types for EKS Control Plane logs:\n\n");
    for log_type in LogType::ALL {
        out.push_str(&format!(
            "  {:<13} - {} ({})\n",
            log_type.as_str(),
            log_type.title(),
            log_type.component()
        ));
        match log_type.aliases() {
            [] => {}
            [alias] => out.push_str(&format!("                  Alias: {}\n", alias)),
            aliases => out.push_str(&format!(
                "                  Aliases: {}\n",
                aliases.join(", ")
            )),
        }
    }
    out.push_str(
        "\nNote: Not all log types may be available for every cluster.
Control plane logging must be enabled in the EKS console for logs to be available.
If no log types are specified, all available log types will be retrieved.\n",
    );
    out
}

/// Which presets the listing shows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresetListing {
    Basic,
    Advanced,
    All,
}

impl PresetListing {
    pub fn from_flags(advanced: bool, all: bool) -> Self {
        match (advanced, all) {
            (_, true) => Self::All,
            (true, false) => Self::Advanced,
            _ => Self::Basic,
        }
    }
}

pub fn presets(listing: PresetListing, color: bool) -> String {
    let (heading, presets): (&str, Vec<&Preset>) = match listing {
        PresetListing::Basic => ("Available basic filter presets:", FilterPresets::basic()),
        PresetListing::Advanced => (
            "Available advanced filter presets:",
            FilterPresets::advanced(),
        ),
        PresetListing::All => (
            "Available filter presets (basic and advanced):",
            FilterPresets::all(),
        ),
    };
    let detailed = listing != PresetListing::Basic;

    let mut out = format!("{}\n\n", heading);
    for preset in presets {
        let name = format!("  {}", preset.name);
        if color {
            let tint = if preset.advanced {
                Theme::PRESET_ADVANCED
            } else {
                Theme::PRESET_BASIC
            };
            out.push_str(&format!("{}\n", name.with(tint).bold()));
        } else {
            out.push_str(&format!("{}\n", name));
        }
        out.push_str(&format!("    Description: {}\n", preset.description));
        out.push_str(&format!("    Log types: {}\n", preset.log_types.join(", ")));
        out.push_str(&format!("    Pattern: {}\n", preset.pattern));
        if detailed {
            out.push_str(&format!("    Pattern type: {}\n", preset.pattern_type));
        }
        out.push('\n');
    }

    out.push_str("Usage example:\n  ekslogs my-cluster -p api-errors\n  ekslogs my-cluster -p network-timeouts -f\n\n");
    if detailed {
        out.push_str(
            "Pattern types:
  - simple: Multiple terms (AND condition)
  - optional: Terms with '?' prefix (OR condition)
  - exclude: Terms with '-' prefix are excluded
  - json: JSON structure filtering
  - regex: Regular expression pattern (enclosed in %)\n\n",
        );
    } else {
        out.push_str(
            "To see advanced presets, run: ekslogs presets --advanced
To see all presets, run: ekslogs presets --all\n",
        );
    }
    out
}
