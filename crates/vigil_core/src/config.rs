//! Coordinator configuration.
//!
//! # Responsibility
//! - Hold the behavior switches of the coordinator with safe defaults.
//! - Parse overrides from `VIGIL_*` environment variables.
//! - Normalize caller-supplied category ids.
//!
//! # Invariants
//! - `CoordinatorConfig::default()` reproduces the classic behavior:
//!   background-only presentation, pinned title, detach after foreground.
//! - `default_category` always matches the category id grammar.

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Category used when callers do not name one.
pub const DEFAULT_CATEGORY: &str = "default";

pub const ENV_PRESENTATION_POLICY: &str = "VIGIL_PRESENTATION_POLICY";
pub const ENV_TITLE_POLICY: &str = "VIGIL_TITLE_POLICY";
pub const ENV_REATTACH_AFTER_FOREGROUND: &str = "VIGIL_REATTACH_AFTER_FOREGROUND";
pub const ENV_DEFAULT_CATEGORY: &str = "VIGIL_DEFAULT_CATEGORY";

static CATEGORY_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_.\-]{0,63}$").expect("valid category id regex"));

/// When the indicator may be presented relative to app visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationPolicy {
    /// Present only while the app is not in the foreground.
    #[default]
    BackgroundOnly,
    /// Present on the first start if the app is visible; otherwise wait for
    /// the next background transition.
    WhileVisible,
}

/// What happens to the descriptor when tasks stack on an active run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitlePolicy {
    /// Keep the descriptor of the task that opened the run.
    #[default]
    PinFirst,
    /// Replace the descriptor with the newest task and redraw if shown.
    FollowLatest,
}

impl FromStr for PresentationPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "background_only" => Ok(Self::BackgroundOnly),
            "while_visible" => Ok(Self::WhileVisible),
            other => Err(ConfigError::InvalidValue {
                key: ENV_PRESENTATION_POLICY,
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for TitlePolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pin_first" => Ok(Self::PinFirst),
            "follow_latest" => Ok(Self::FollowLatest),
            other => Err(ConfigError::InvalidValue {
                key: ENV_TITLE_POLICY,
                value: other.to_string(),
            }),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An override value could not be parsed.
    InvalidValue { key: &'static str, value: String },
    /// Category id does not match `[a-z0-9][a-z0-9_.-]*` (max 64 chars).
    InvalidCategory(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value for `{key}`: `{value}`")
            }
            Self::InvalidCategory(value) => write!(f, "invalid category id: `{value}`"),
        }
    }
}

impl Error for ConfigError {}

/// Behavior switches for one coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub presentation: PresentationPolicy,
    pub title: TitlePolicy,
    /// Keep observing visibility after the first foreground transition.
    pub reattach_after_foreground: bool,
    pub default_category: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            presentation: PresentationPolicy::default(),
            title: TitlePolicy::default(),
            reattach_after_foreground: false,
            default_category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

impl CoordinatorConfig {
    /// Builds defaults overridden by process environment variables.
    ///
    /// # Errors
    /// - Returns `InvalidValue` for unparsable overrides.
    /// - Returns `InvalidCategory` for a malformed default category.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides resolved by `lookup`; blank values are ignored.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        if let Some(raw) = read(ENV_PRESENTATION_POLICY) {
            self.presentation = raw.parse()?;
        }
        if let Some(raw) = read(ENV_TITLE_POLICY) {
            self.title = raw.parse()?;
        }
        if let Some(raw) = read(ENV_REATTACH_AFTER_FOREGROUND) {
            self.reattach_after_foreground = parse_flag(ENV_REATTACH_AFTER_FOREGROUND, &raw)?;
        }
        if let Some(raw) = read(ENV_DEFAULT_CATEGORY) {
            self.default_category = raw;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_category_id(&self.default_category) {
            return Err(ConfigError::InvalidCategory(self.default_category.clone()));
        }
        Ok(())
    }

    /// Normalizes a caller-supplied category.
    ///
    /// Missing or blank input maps to `default_category`. Malformed input is
    /// logged and also mapped to `default_category`, since task requests are
    /// fire-and-forget.
    pub fn resolve_category(&self, category: Option<&str>) -> String {
        let Some(raw) = category.map(str::trim).filter(|value| !value.is_empty()) else {
            return self.default_category.clone();
        };
        if is_valid_category_id(raw) {
            return raw.to_string();
        }
        warn!(
            "event=category_fallback module=config status=skip requested={} fallback={}",
            raw, self.default_category
        );
        self.default_category.clone()
    }
}

pub fn is_valid_category_id(value: &str) -> bool {
    CATEGORY_ID_RE.is_match(value)
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key,
            value: other.to_string(),
        }),
    }
}
