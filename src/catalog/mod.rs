//! Catalog gateway.
//!
//! The catalog of task templates and night programs is reference data owned
//! elsewhere; the tracker only reads it. [`StaticCatalog`] serves the
//! built-in content or a JSON catalog file with the same shape.
//!
//! # Submodules
//!
//! - [`selection`] - Template selection strategies

pub mod selection;

pub use selection::{RandomPicker, SequentialPicker, TemplatePicker};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A task template users can be assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default = "default_template_type")]
    pub template_type: String,
    #[serde(default)]
    pub default_duration_sec: Option<u32>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub trace_tags: Vec<String>,
    #[serde(default)]
    pub direction_tags: Vec<String>,
    /// Moods this template suits; used to bias refresh replacements.
    #[serde(default)]
    pub moods: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A reflection question inside a night program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightQuestion {
    pub qid: String,
    pub text: String,
}

/// An evening program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightProgram {
    pub program_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub program_type: String,
    #[serde(default)]
    pub duration_sec: Option<u32>,
    #[serde(default)]
    pub trace_tags: Vec<String>,
    #[serde(default)]
    pub direction_tags: Vec<String>,
    #[serde(default)]
    pub questions: Vec<NightQuestion>,
}

fn default_template_type() -> String {
    "action".to_string()
}

const fn default_true() -> bool {
    true
}

/// Read-only access to templates and programs.
pub trait Catalog: Send + Sync {
    /// All templates eligible for assignment, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing source cannot be read.
    fn active_templates(&self) -> Result<Vec<TaskTemplate>>;

    /// Look up a template by id, active or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing source cannot be read.
    fn template(&self, id: &str) -> Result<Option<TaskTemplate>>;

    /// All night programs, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing source cannot be read.
    fn night_programs(&self) -> Result<Vec<NightProgram>>;

    /// Look up a night program by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing source cannot be read.
    fn night_program(&self, id: &str) -> Result<Option<NightProgram>> {
        Ok(self
            .night_programs()?
            .into_iter()
            .find(|p| p.program_id == id))
    }
}

/// In-memory catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticCatalog {
    #[serde(default)]
    pub templates: Vec<TaskTemplate>,
    #[serde(default)]
    pub programs: Vec<NightProgram>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new(templates: Vec<TaskTemplate>, programs: Vec<NightProgram>) -> Self {
        Self {
            templates,
            programs,
        }
    }

    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read catalog {}: {e}", path.display()))
        })?;
        let catalog: Self = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse catalog {}: {e}", path.display()))
        })?;
        tracing::debug!(
            templates = catalog.templates.len(),
            programs = catalog.programs.len(),
            "Loaded catalog file"
        );
        Ok(catalog)
    }

    /// The content shipped with daytrace.
    #[must_use]
    pub fn builtin() -> Self {
        let templates = vec![
            template("tpl_breath", "Three slow breaths", "Breathe in for four, out for six.", "breath", Some(60),
                &["self_care", "slow_down"], &["body"], &["anxious", "restless"]),
            template("tpl_water", "A glass of warm water", "Drink it slowly, with both hands.", "action", Some(120),
                &["self_care"], &["body"], &["tired", "low"]),
            template("tpl_window", "Look out of a window", "Name three things you can see.", "observe", Some(90),
                &["observe"], &["mind"], &["restless", "calm"]),
            template("tpl_desk", "Clear one small surface", "Only one. A corner of the desk is enough.", "action", Some(300),
                &["reset"], &["order"], &["restless"]),
            template("tpl_stretch", "Stretch your shoulders", "Roll them back five times.", "body", Some(60),
                &["self_care"], &["body"], &["tired"]),
            template("tpl_message", "Send a kind message", "To anyone, including yourself.", "action", None,
                &["kind"], &["connection"], &["low", "calm"]),
            template("tpl_feeling", "Name today's feeling", "One word is enough.", "observe", None,
                &["observe"], &["emotion"], &["anxious", "low"]),
            template("tpl_walk", "Walk without your phone", "Five minutes, any direction.", "body", Some(300),
                &["slow_down", "observe"], &["body", "mind"], &["restless", "tired"]),
            template("tpl_pause", "Pause before the next thing", "Stop for ten seconds between tasks.", "action", Some(10),
                &[], &["mind"], &["anxious"]),
        ];

        let programs = vec![
            NightProgram {
                program_id: "np1".to_string(),
                title: "One quiet minute".to_string(),
                program_type: "timer".to_string(),
                duration_sec: Some(60),
                trace_tags: vec!["slow_down".to_string()],
                direction_tags: vec!["emotion".to_string()],
                questions: Vec::new(),
            },
            NightProgram {
                program_id: "np2".to_string(),
                title: "Three gentle questions".to_string(),
                program_type: "questions".to_string(),
                duration_sec: None,
                trace_tags: vec!["self_care".to_string(), "observe".to_string()],
                direction_tags: vec!["emotion".to_string()],
                questions: vec![
                    question("q1", "Was there a small moment today worth remembering?"),
                    question("q2", "Is there something you are willing to let yourself off for?"),
                    question("q3", "What would you like to tell yourself tomorrow?"),
                ],
            },
        ];

        Self::new(templates, programs)
    }
}

impl Catalog for StaticCatalog {
    fn active_templates(&self) -> Result<Vec<TaskTemplate>> {
        Ok(self.templates.iter().filter(|t| t.is_active).cloned().collect())
    }

    fn template(&self, id: &str) -> Result<Option<TaskTemplate>> {
        Ok(self.templates.iter().find(|t| t.id == id).cloned())
    }

    fn night_programs(&self) -> Result<Vec<NightProgram>> {
        Ok(self.programs.clone())
    }
}

#[allow(clippy::too_many_arguments)]
fn template(
    id: &str,
    title: &str,
    description: &str,
    template_type: &str,
    duration: Option<u32>,
    trace_tags: &[&str],
    direction_tags: &[&str],
    moods: &[&str],
) -> TaskTemplate {
    let owned = |xs: &[&str]| xs.iter().map(ToString::to_string).collect::<Vec<_>>();
    TaskTemplate {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        template_type: template_type.to_string(),
        default_duration_sec: duration,
        steps: Vec::new(),
        trace_tags: owned(trace_tags),
        direction_tags: owned(direction_tags),
        moods: owned(moods),
        is_active: true,
    }
}

fn question(qid: &str, text: &str) -> NightQuestion {
    NightQuestion {
        qid: qid.to_string(),
        text: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_catalog_has_enough_templates() {
        let catalog = StaticCatalog::builtin();
        let active = catalog.active_templates().unwrap();
        assert!(active.len() >= 3);

        let ids: std::collections::HashSet<_> = active.iter().map(|t| &t.id).collect();
        assert_eq!(ids.len(), active.len(), "template ids must be unique");
    }

    #[test]
    fn test_inactive_templates_are_hidden_but_resolvable() {
        let mut catalog = StaticCatalog::builtin();
        catalog.templates[0].is_active = false;
        let hidden = catalog.templates[0].id.clone();

        let active = catalog.active_templates().unwrap();
        assert!(active.iter().all(|t| t.id != hidden));
        assert!(catalog.template(&hidden).unwrap().is_some());
    }

    #[test]
    fn test_night_program_lookup() {
        let catalog = StaticCatalog::builtin();
        assert!(catalog.night_program("np2").unwrap().is_some());
        assert!(catalog.night_program("np404").unwrap().is_none());
    }

    #[test]
    fn test_from_file_applies_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"templates": [{{"id": "t1", "title": "Tea"}}],
                "programs": [{{"program_id": "p1", "title": "Rest", "type": "timer"}}]}}"#
        )
        .unwrap();

        let catalog = StaticCatalog::from_file(file.path()).unwrap();
        let t = catalog.template("t1").unwrap().unwrap();
        assert!(t.is_active);
        assert_eq!(t.template_type, "action");
        assert!(t.trace_tags.is_empty());
        assert_eq!(catalog.night_programs().unwrap().len(), 1);
    }

    #[test]
    fn test_from_file_reports_config_error() {
        let err = StaticCatalog::from_file(Path::new("/nonexistent/catalog.json")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
