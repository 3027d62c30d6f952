//! Night session model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Night session status values. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NightStatus {
    Started,
    Finished,
}

impl NightStatus {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Finished => "finished",
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s {
            "finished" => Self::Finished,
            _ => Self::Started,
        }
    }
}

/// One answer to a reflection question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightAnswer {
    pub qid: String,
    pub answer: String,
}

impl NightAnswer {
    /// Parse a `qid=answer` pair.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the `=` separator or the qid is missing.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let (qid, answer) = raw.split_once('=').ok_or_else(|| {
            crate::Error::InvalidArgument(format!("answer must be qid=text, got '{raw}'"))
        })?;
        let qid = qid.trim();
        if qid.is_empty() {
            return Err(crate::Error::InvalidArgument(format!(
                "answer is missing a qid: '{raw}'"
            )));
        }
        Ok(Self {
            qid: qid.to_string(),
            answer: answer.trim().to_string(),
        })
    }
}

/// An evening reflection session. One per user per date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NightSession {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub program_id: String,
    pub status: NightStatus,
    pub started_at: i64,
    pub finished_at: Option<i64>,
    /// Only meaningful once finished.
    pub answers: Vec<NightAnswer>,
}

impl NightSession {
    pub fn new(user_id: &str, date: NaiveDate, program_id: &str) -> Self {
        Self {
            id: format!("night_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]),
            user_id: user_id.to_string(),
            date,
            program_id: program_id.to_string(),
            status: NightStatus::Started,
            started_at: chrono::Utc::now().timestamp_millis(),
            finished_at: None,
            answers: Vec::new(),
        }
    }
}
