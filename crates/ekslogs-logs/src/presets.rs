//! Named filter presets for common troubleshooting tasks

use std::fmt;

/// Filter syntax a preset pattern uses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternType {
    /// Multiple terms (AND)
    Simple,
    /// Terms prefixed with `?` (OR)
    Optional,
    /// Terms prefixed with `-` are excluded
    Exclude,
    /// JSON property selectors
    Json,
    /// Regular expression enclosed in `%`
    Regex,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Optional => "optional",
            Self::Exclude => "exclude",
            Self::Json => "json",
            Self::Regex => "regex",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named filter preset
#[derive(Clone, Copy, Debug)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub log_types: &'static [&'static str],
    pub pattern: &'static str,
    pub pattern_type: PatternType,
    pub advanced: bool,
}

const PRESETS: &[Preset] = &[
    Preset {
        name: "auth-failures",
        description: "Authentication failures",
        log_types: &["authenticator", "api"],
        pattern: "unauthorized",
        pattern_type: PatternType::Simple,
        advanced: false,
    },
    Preset {
        name: "api-errors",
        description: "API server errors",
        log_types: &["api"],
        pattern: "ERROR",
        pattern_type: PatternType::Simple,
        advanced: false,
    },
    Preset {
        name: "audit-privileged",
        description: "Privileged operations in audit logs",
        log_types: &["audit"],
        pattern: "create",
        pattern_type: PatternType::Simple,
        advanced: false,
    },
    Preset {
        name: "scheduler-issues",
        description: "Scheduler issues",
        log_types: &["scheduler"],
        pattern: "error",
        pattern_type: PatternType::Simple,
        advanced: false,
    },
    Preset {
        name: "controller-issues",
        description: "Controller manager issues",
        log_types: &["kcm"],
        pattern: "error",
        pattern_type: PatternType::Simple,
        advanced: false,
    },
    Preset {
        name: "cloud-issues",
        description: "Cloud controller manager issues",
        log_types: &["ccm"],
        pattern: "error",
        pattern_type: PatternType::Simple,
        advanced: false,
    },
    Preset {
        name: "resource-issues",
        description: "Resource exhaustion or limits",
        log_types: &["api", "scheduler"],
        pattern: "limit",
        pattern_type: PatternType::Simple,
        advanced: false,
    },
    Preset {
        name: "network-issues",
        description: "Network related issues",
        log_types: &["api", "kcm", "ccm"],
        pattern: "network",
        pattern_type: PatternType::Simple,
        advanced: false,
    },
    Preset {
        name: "auth-issues-adv",
        description: "Authentication and authorization issues (advanced)",
        log_types: &["authenticator", "api"],
        pattern: "?unauthorized ?\"permission denied\" ?\"authentication failed\" ?\"access denied\" ?forbidden",
        pattern_type: PatternType::Optional,
        advanced: true,
    },
    Preset {
        name: "critical-api-errors",
        description: "Critical API server errors excluding common warnings",
        log_types: &["api"],
        pattern: "ERROR CRITICAL -warning -\"deadline exceeded\"",
        pattern_type: PatternType::Exclude,
        advanced: true,
    },
    Preset {
        name: "privileged-admin-actions",
        description: "Privileged admin actions in audit logs",
        log_types: &["audit"],
        pattern: "{ $.user.username = \"admin\" } { $.verb = \"delete\" }",
        pattern_type: PatternType::Json,
        advanced: true,
    },
    Preset {
        name: "pod-scheduling-failures",
        description: "Pod scheduling failures",
        log_types: &["scheduler"],
        pattern: "\"failed to schedule pod\" \"insufficient resources\"",
        pattern_type: PatternType::Simple,
        advanced: true,
    },
    Preset {
        name: "controller-reconcile-errors",
        description: "Controller reconciliation errors",
        log_types: &["kcm"],
        pattern: "%reconcile.*failed%",
        pattern_type: PatternType::Regex,
        advanced: true,
    },
    Preset {
        name: "memory-pressure",
        description: "Memory pressure and OOM events",
        log_types: &["api", "kcm"],
        pattern: "OOM killed memory",
        pattern_type: PatternType::Simple,
        advanced: true,
    },
    Preset {
        name: "security-events",
        description: "Security related events",
        log_types: &["api", "audit", "authenticator"],
        pattern: "?\"security breach\" ?\"unauthorized access\" ?\"suspicious activity\" ?\"token expired\" ?\"certificate expired\"",
        pattern_type: PatternType::Optional,
        advanced: true,
    },
    Preset {
        name: "network-timeouts",
        description: "Network timeout issues",
        log_types: &["api", "kcm", "ccm"],
        pattern: "%timeout.*network|network.*timeout%",
        pattern_type: PatternType::Regex,
        advanced: true,
    },
];

/// Preset lookup
pub struct FilterPresets;

impl FilterPresets {
    pub fn get(name: &str) -> Option<&'static Preset> {
        PRESETS.iter().find(|p| p.name == name)
    }

    /// All presets sorted by name
    pub fn all() -> Vec<&'static Preset> {
        Self::sorted(|_| true)
    }

    pub fn basic() -> Vec<&'static Preset> {
        Self::sorted(|p| !p.advanced)
    }

    pub fn advanced() -> Vec<&'static Preset> {
        Self::sorted(|p| p.advanced)
    }

    fn sorted(predicate: impl Fn(&Preset) -> bool) -> Vec<&'static Preset> {
        let mut presets: Vec<_> = PRESETS.iter().filter(|p| predicate(p)).collect();
        presets.sort_by_key(|p| p.name);
        presets
    }
}
