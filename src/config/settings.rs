//! Tracker settings.
//!
//! Loaded from `~/.daytrace/config.json`. Every field is optional in the file;
//! values present there are merged over the built-in defaults, and map-valued
//! fields merge key by key.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One of the five life directions trace events are grouped under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Direction {
    pub id: String,
    pub title: String,
}

/// A selectable theme for a year plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub theme_id: String,
    pub title: String,
    pub desc: String,
    /// Short phrase used in review titles.
    pub core: String,
}

/// Copy and limits used by the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// Refreshes allowed per daily set.
    pub refresh_limit: u32,

    /// Tasks generated per daily set.
    pub tasks_per_day: u8,

    /// Tag recorded when a completed task's template declares none.
    pub default_trace_tag: String,

    /// Verb phrases per trace tag, as in "You {label} 5 times".
    pub trace_tag_labels: BTreeMap<String, String>,

    /// Soft identity titles per trace tag.
    pub identity_labels: BTreeMap<String, String>,

    /// Completion feedback per trace tag. The `default` key is the fallback.
    pub feedback: BTreeMap<String, String>,

    pub default_identity: String,
    pub closing: String,
    pub night_feedback: String,
    pub directions: Vec<Direction>,
    pub themes: Vec<Theme>,

    /// Path prefix for generated poster URLs.
    pub poster_prefix: String,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            refresh_limit: 2,
            tasks_per_day: 3,
            default_trace_tag: "self_care".to_string(),
            trace_tag_labels: labels(&[
                ("self_care", "paused for yourself"),
                ("slow_down", "slowed down"),
                ("observe", "quietly observed"),
                ("reset", "reset and tidied up"),
                ("kind", "treated yourself gently"),
            ]),
            identity_labels: labels(&[
                ("self_care", "someone who looks after themselves"),
                ("slow_down", "someone learning to slow down"),
                ("observe", "a quiet observer"),
                ("reset", "someone who keeps starting again"),
                ("kind", "someone gentle with themselves"),
            ]),
            feedback: labels(&[
                ("self_care", "You made a little room for yourself."),
                ("slow_down", "You slowed down for a moment."),
                ("observe", "You noticed something today."),
                ("reset", "One small thing is back in order."),
                ("kind", "That was kind."),
                ("default", "Done. That counts."),
            ]),
            default_identity: "someone who makes room for themselves".to_string(),
            closing: "This year was not wasted.".to_string(),
            night_feedback: "You closed the day gently. Rest well.".to_string(),
            directions: vec![
                direction("emotion", "Emotion"),
                direction("body", "Body"),
                direction("order", "Order"),
                direction("mind", "Mind"),
                direction("connection", "Connection"),
            ],
            themes: vec![
                theme("self_care", "Take care of myself", "Put yourself back on the list.", "caring for yourself"),
                theme("slow_down", "Slow down", "Fewer things, more slowly.", "slowing down"),
                theme("steady", "Steady steps", "Small things, kept up.", "staying steady"),
            ],
            poster_prefix: "/posters".to_string(),
        }
    }
}

impl TrackerSettings {
    /// Label for a trace tag, or the tag itself.
    #[must_use]
    pub fn trace_label<'a>(&'a self, tag: &'a str) -> &'a str {
        self.trace_tag_labels.get(tag).map_or(tag, String::as_str)
    }

    /// Identity title for a tag: identity label, then trace label, then the tag.
    #[must_use]
    pub fn identity_label<'a>(&'a self, tag: &'a str) -> &'a str {
        self.identity_labels
            .get(tag)
            .map_or_else(|| self.trace_label(tag), String::as_str)
    }

    /// Feedback copy for a tag, falling back to the `default` entry.
    #[must_use]
    pub fn feedback_for(&self, tag: Option<&str>) -> String {
        tag.and_then(|t| self.feedback.get(t))
            .or_else(|| self.feedback.get("default"))
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn direction_title<'a>(&'a self, id: &'a str) -> &'a str {
        self.directions
            .iter()
            .find(|d| d.id == id)
            .map_or(id, |d| d.title.as_str())
    }

    #[must_use]
    pub fn theme(&self, theme_id: &str) -> Option<&Theme> {
        self.themes.iter().find(|t| t.theme_id == theme_id)
    }

    /// Load settings from a JSON file, merged over the defaults.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;
        let overrides: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))?;

        let mut merged = serde_json::to_value(Self::default())?;
        merge_json(&mut merged, overrides);

        let settings: Self = serde_json::from_value(merged)
            .map_err(|e| Error::Config(format!("Invalid config file: {e}")))?;
        settings.validate()?;

        tracing::debug!(path = %path.display(), "Loaded tracker settings");
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.tasks_per_day == 0 {
            return Err(Error::Config("tasks_per_day must be at least 1".into()));
        }
        if self.default_trace_tag.trim().is_empty() {
            return Err(Error::Config("default_trace_tag must not be empty".into()));
        }
        Ok(())
    }
}

/// Recursively merge `overlay` into `base`. Objects merge per key; anything
/// else replaces.
fn merge_json(base: &mut serde_json::Value, overlay: serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn direction(id: &str, title: &str) -> Direction {
    Direction {
        id: id.to_string(),
        title: title.to_string(),
    }
}

fn theme(theme_id: &str, title: &str, desc: &str, core: &str) -> Theme {
    Theme {
        theme_id: theme_id.to_string(),
        title: title.to_string(),
        desc: desc.to_string(),
        core: core.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let s = TrackerSettings::default();
        assert_eq!(s.refresh_limit, 2);
        assert_eq!(s.tasks_per_day, 3);
        assert_eq!(s.default_trace_tag, "self_care");
        assert_eq!(s.directions.len(), 5);
        assert!(s.theme("steady").is_some());
    }

    #[test]
    fn test_label_fallbacks() {
        let mut s = TrackerSettings::default();
        s.identity_labels.remove("observe");

        assert_eq!(s.identity_label("self_care"), "someone who looks after themselves");
        assert_eq!(s.identity_label("observe"), "quietly observed");
        assert_eq!(s.identity_label("unheard_of"), "unheard_of");
        assert_eq!(s.trace_label("unheard_of"), "unheard_of");
    }

    #[test]
    fn test_feedback_fallback() {
        let s = TrackerSettings::default();
        assert_eq!(s.feedback_for(Some("kind")), "That was kind.");
        assert_eq!(s.feedback_for(Some("nope")), "Done. That counts.");
        assert_eq!(s.feedback_for(None), "Done. That counts.");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let s = TrackerSettings::load(Path::new("/nonexistent/config.json")).unwrap();
        assert_eq!(s.refresh_limit, 2);
    }

    #[test]
    fn test_partial_file_merges_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"refresh_limit": 5, "trace_tag_labels": {{"kind": "was kind"}}}}"#
        )
        .unwrap();

        let s = TrackerSettings::load(file.path()).unwrap();
        assert_eq!(s.refresh_limit, 5);
        assert_eq!(s.tasks_per_day, 3);
        assert_eq!(s.trace_label("kind"), "was kind");
        // Untouched keys of a merged map survive.
        assert_eq!(s.trace_label("observe"), "quietly observed");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = TrackerSettings::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let mut zero = tempfile::NamedTempFile::new().unwrap();
        write!(zero, r#"{{"tasks_per_day": 0}}"#).unwrap();
        assert!(TrackerSettings::load(zero.path()).is_err());
    }
}
