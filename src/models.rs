use serde::{Deserialize, Serialize};

/// One drill: a base sentence, its gloss, the transformation to perform and
/// the expected answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrillItem {
    pub group_id: String,
    pub group_title: Option<String>,
    pub step_no: i64,
    pub prompt_primary: String,
    pub prompt_secondary: String,
    pub instruction: String,
    pub answer: String,
}

impl DrillItem {
    pub fn group_label(&self) -> String {
        match self.group_title.as_deref() {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!("Session {}", self.group_id),
        }
    }
}

// A session: every item sharing one group_id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub title: String,
}

/// Where the learner is. Stored as a single JSON blob whose field names match
/// the browser build of the app, so an exported blob can be imported as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressState {
    pub current_group_id: Option<String>,
    pub current_step_index: usize,
    #[serde(rename = "totalSessions")]
    pub total_sessions_completed: u64,
    pub has_seen_current_answer: bool,
}

impl ProgressState {
    /// Decode a persisted blob. Anything unreadable yields the default state.
    pub fn decode(blob: &str) -> Self {
        match serde_json::from_str::<ProgressState>(blob) {
            Ok(state) => state,
            Err(e) => {
                log::warn!("Invalid progress state, resetting: {}", e);
                ProgressState::default()
            }
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
