use std::collections::{HashMap, HashSet};

use crate::error::StoreError;
use crate::models::{DrillItem, Group};

/// One data row keyed by header name.
pub type Record = HashMap<String, String>;

const GROUP_ID: &[&str] = &["group_id"];
const GROUP_TITLE: &[&str] = &["group_title"];
const STEP_NO: &[&str] = &["step_no"];
const PROMPT_PRIMARY: &[&str] = &["base_en", "prompt_primary"];
const PROMPT_SECONDARY: &[&str] = &["base_ja", "prompt_secondary"];
const INSTRUCTION: &[&str] = &["instruction"];
const ANSWER: &[&str] = &["answer_en", "answer"];

/// Split comma-separated text into header-keyed records.
///
/// Quoting is not supported: a comma always ends a cell. Short rows get empty
/// strings for the missing trailing columns and blank lines are skipped. A
/// leading byte-order mark is ignored.
pub fn parse_records(text: &str) -> Vec<Record> {
    let mut lines = text.trim_start_matches('\u{feff}').trim().lines();
    let headers: Vec<String> = match lines.next() {
        Some(header) => header.split(',').map(|h| h.trim().to_string()).collect(),
        None => return Vec::new(),
    };

    lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let values: Vec<&str> = line.split(',').collect();
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    let value = values.get(i).map(|v| v.trim()).unwrap_or_default();
                    (h.clone(), value.to_string())
                })
                .collect()
        })
        .collect()
}

/// Leading-integer parse: optional sign, then digits up to the first
/// non-digit. `"12abc"` is 12, `"1.5"` is 1, `"abc"` is `None`.
pub fn parse_step_no(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse::<i64>().ok().map(|n| sign * n)
}

fn field(record: &Record, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| record.get(*k).cloned())
}

/// The full, ordered drill collection for one load of the data source.
#[derive(Debug, Clone)]
pub struct QuestionStore {
    items: Vec<DrillItem>,
}

impl QuestionStore {
    pub fn load(records: Vec<Record>) -> Result<Self, StoreError> {
        let items: Vec<DrillItem> = records
            .iter()
            .map(|record| {
                let group_id = field(record, GROUP_ID).unwrap_or_default();
                let raw_step = field(record, STEP_NO).unwrap_or_default();
                let step_no = parse_step_no(&raw_step).unwrap_or_else(|| {
                    // Unparsable steps sort as 0, which may reorder the session
                    log::warn!(
                        "Unparsable step_no '{}' in session '{}', treating as 0",
                        raw_step,
                        group_id
                    );
                    0
                });

                DrillItem {
                    group_title: field(record, GROUP_TITLE).filter(|t| !t.is_empty()),
                    step_no,
                    prompt_primary: field(record, PROMPT_PRIMARY).unwrap_or_default(),
                    prompt_secondary: field(record, PROMPT_SECONDARY).unwrap_or_default(),
                    instruction: field(record, INSTRUCTION).unwrap_or_default(),
                    answer: field(record, ANSWER).unwrap_or_default(),
                    group_id,
                }
            })
            .collect();

        Self::from_items(items)
    }

    pub fn from_text(text: &str) -> Result<Self, StoreError> {
        Self::load(parse_records(text))
    }

    pub fn from_items(items: Vec<DrillItem>) -> Result<Self, StoreError> {
        if items.is_empty() {
            return Err(StoreError::EmptyData);
        }
        Ok(Self { items })
    }

    // Load order, not sorted
    pub fn first_group_id(&self) -> Option<&str> {
        self.items.first().map(|item| item.group_id.as_str())
    }

    /// Distinct groups in first-occurrence order.
    pub fn groups(&self) -> Vec<Group> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .filter(|item| seen.insert(item.group_id.as_str()))
            .map(|item| Group {
                id: item.group_id.clone(),
                title: item.group_label(),
            })
            .collect()
    }

    /// Items of one group, ordered by `step_no`. Ties keep load order.
    pub fn steps_of(&self, group_id: &str) -> Vec<&DrillItem> {
        let mut steps: Vec<&DrillItem> = self
            .items
            .iter()
            .filter(|item| item.group_id == group_id)
            .collect();
        steps.sort_by_key(|item| item.step_no);
        steps
    }

    pub fn has_group(&self, group_id: &str) -> bool {
        self.items.iter().any(|item| item.group_id == group_id)
    }
}
