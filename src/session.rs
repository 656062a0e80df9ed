use serde::Serialize;

use crate::error::{GatewayError, SessionError};
use crate::models::{DrillItem, Group, ProgressState};
use crate::notify::{Notifier, NotifyResult};
use crate::store::QuestionStore;

/// Durable storage for the learner's progress.
pub trait ProgressGateway {
    fn load_progress(&self) -> Result<ProgressState, GatewayError>;
    fn save_progress(&self, state: &ProgressState) -> Result<(), GatewayError>;
}

/// Everything the presentation layer needs to draw the current drill.
#[derive(Debug, Clone, Serialize)]
pub struct DrillView {
    pub item: Option<DrillItem>,
    pub group: Option<Group>,
    /// 1-based; 0 when the current group is not in the store
    pub group_position: usize,
    pub group_count: usize,
    /// 1-based; 0 when the current group has no steps
    pub step_position: usize,
    pub step_count: usize,
    pub total_sessions: u64,
    pub answer_revealed: bool,
}

/// Next group in round-robin order. Unknown or last ids wrap to the first.
pub fn next_group_id(groups: &[Group], current: Option<&str>) -> Option<String> {
    let index = current.and_then(|id| groups.iter().position(|g| g.id == id));
    let next = match index {
        Some(i) if i + 1 < groups.len() => i + 1,
        _ => 0,
    };
    groups.get(next).map(|g| g.id.clone())
}

/// The drill state machine. Owns the loaded questions and the learner's
/// progress, persisting through `G` and emitting cues through `N`.
///
/// Transitions take `&mut self`, so two of them can never interleave against
/// the same state.
pub struct SessionController<G: ProgressGateway, N: Notifier> {
    store: QuestionStore,
    progress: ProgressState,
    gateway: G,
    notifier: N,
}

impl<G: ProgressGateway, N: Notifier> SessionController<G, N> {
    /// Load persisted progress, reconcile it against `store` and enter the
    /// resulting step.
    pub fn new(store: QuestionStore, gateway: G, notifier: N) -> Result<Self, SessionError> {
        let progress = gateway.load_progress()?;
        let mut controller = Self {
            store,
            progress,
            gateway,
            notifier,
        };
        controller.reconcile()?;
        controller.enter_step();
        Ok(controller)
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn groups(&self) -> Vec<Group> {
        self.store.groups()
    }

    pub fn steps_in(&self, group_id: &str) -> usize {
        self.store.steps_of(group_id).len()
    }

    pub fn current_steps(&self) -> Vec<&DrillItem> {
        match self.progress.current_group_id.as_deref() {
            Some(id) => self.store.steps_of(id),
            None => Vec::new(),
        }
    }

    pub fn current_item(&self) -> Option<&DrillItem> {
        self.current_steps()
            .get(self.progress.current_step_index)
            .copied()
    }

    pub fn current_view(&self) -> DrillView {
        let groups = self.store.groups();
        let current_id = self.progress.current_group_id.as_deref();
        let position = groups.iter().position(|g| Some(g.id.as_str()) == current_id);
        let steps = self.current_steps();

        DrillView {
            item: self.current_item().cloned(),
            group: position.map(|i| groups[i].clone()),
            group_position: position.map(|i| i + 1).unwrap_or(0),
            group_count: groups.len(),
            step_position: if steps.is_empty() {
                0
            } else {
                self.progress.current_step_index + 1
            },
            step_count: steps.len(),
            total_sessions: self.progress.total_sessions_completed,
            answer_revealed: self.progress.has_seen_current_answer,
        }
    }

    /// Repair progress that no longer matches the loaded questions, then
    /// persist it. Never fails on bad state, only on storage errors.
    pub fn reconcile(&mut self) -> Result<(), SessionError> {
        if self.progress.current_group_id.is_none() {
            self.progress.current_group_id = self.store.first_group_id().map(String::from);
            self.progress.current_step_index = 0;
        }

        let step_count = self.current_steps().len();
        if step_count == 0 {
            let first = self.store.groups().into_iter().next().map(|g| g.id);
            log::info!(
                "Session {:?} not found in data, resetting to {:?}",
                self.progress.current_group_id,
                first
            );
            self.progress.current_group_id = first;
            self.progress.current_step_index = 0;
            self.progress.has_seen_current_answer = false;
        } else if self.progress.current_step_index >= step_count {
            log::info!(
                "Step {} out of range for session {:?}, restarting it",
                self.progress.current_step_index,
                self.progress.current_group_id
            );
            self.progress.current_step_index = 0;
            self.progress.has_seen_current_answer = false;
        }

        self.save()
    }

    /// Swap in a freshly loaded question set and reconcile against it. The
    /// step is entered again only if the reload changed the current item.
    pub fn reload(&mut self, store: QuestionStore) -> Result<(), SessionError> {
        let before = self.current_item().cloned();
        self.store = store;
        self.reconcile()?;
        if self.current_item() != before.as_ref() {
            self.enter_step();
        }
        Ok(())
    }

    /// Move to the next step, rolling over into the next session when the
    /// current one is finished.
    pub fn advance(&mut self) -> Result<Option<DrillItem>, SessionError> {
        self.notify("advance", |n| n.on_advance());

        self.progress.current_step_index += 1;
        self.progress.has_seen_current_answer = false;

        if self.progress.current_step_index >= self.current_steps().len() {
            return self.complete_session();
        }

        self.save()?;
        Ok(self.enter_step())
    }

    fn complete_session(&mut self) -> Result<Option<DrillItem>, SessionError> {
        self.progress.total_sessions_completed += 1;

        let next = next_group_id(
            &self.store.groups(),
            self.progress.current_group_id.as_deref(),
        );
        log::info!(
            "Completed session {:?} ({} total), moving to {:?}",
            self.progress.current_group_id,
            self.progress.total_sessions_completed,
            next
        );
        self.progress.current_group_id = next;
        self.progress.current_step_index = 0;

        self.save()?;
        Ok(self.enter_step())
    }

    /// Reveal the answer for the current step. Returns `false` when it was
    /// already revealed or there is nothing to reveal.
    pub fn reveal_answer(&mut self) -> bool {
        if self.progress.has_seen_current_answer {
            return false;
        }
        let answer = match self.current_item() {
            Some(item) => item.answer.clone(),
            None => return false,
        };

        self.progress.has_seen_current_answer = true;
        self.notify("answer revealed", |n| n.on_answer_revealed(&answer));
        true
    }

    /// Jump to the start of `group_id`.
    pub fn select_group(&mut self, group_id: &str) -> Result<Option<DrillItem>, SessionError> {
        if !self.store.has_group(group_id) {
            return Err(SessionError::UnknownGroup(group_id.to_string()));
        }

        self.progress.current_group_id = Some(group_id.to_string());
        self.progress.current_step_index = 0;
        self.progress.has_seen_current_answer = false;

        self.save()?;
        Ok(self.enter_step())
    }

    pub fn speak_prompt(&mut self) {
        if let Some(text) = self.current_item().map(|i| i.prompt_primary.clone()) {
            self.notify("speak", |n| n.on_request_speak(&text));
        }
    }

    pub fn speak_answer(&mut self) {
        if let Some(text) = self.current_item().map(|i| i.answer.clone()) {
            self.notify("speak", |n| n.on_request_speak(&text));
        }
    }

    fn enter_step(&mut self) -> Option<DrillItem> {
        let item = self.current_item().cloned();
        match &item {
            Some(current) => self.notify("show item", |n| n.on_show_item(current)),
            None => log::warn!(
                "No drill items for session {:?}",
                self.progress.current_group_id
            ),
        }
        item
    }

    fn save(&self) -> Result<(), SessionError> {
        self.gateway.save_progress(&self.progress)?;
        Ok(())
    }

    fn notify<F>(&mut self, event: &str, f: F)
    where
        F: FnOnce(&mut N) -> NotifyResult,
    {
        if let Err(e) = f(&mut self.notifier) {
            log::warn!("Notifier failed on {}: {}", event, e);
        }
    }
}
