use std::collections::HashMap;

use chrono::Utc;

use mast_models::gate::GateResult;
use mast_models::message::InboxMessage;
use mast_models::task::{TaskStatus, TaskStatusCounts, TeamTask};

/// Per-cycle, in-memory collaboration state: the task list, collected
/// specialist opinions and gate results. Constructed fresh for every cycle
/// and discarded after persistence; never shared across cycles.
pub struct CollaborationBoard {
    tasks: HashMap<String, TeamTask>,
    inbox: Vec<InboxMessage>,
    gate_results: Vec<GateResult>,
}

impl CollaborationBoard {
    pub fn new(tasks: Vec<TeamTask>) -> Self {
        let tasks = tasks
            .into_iter()
            .map(|task| (task.task_id.clone(), task))
            .collect();
        Self {
            tasks,
            inbox: Vec::new(),
            gate_results: Vec::new(),
        }
    }

    /// Tasks in execution order (priority ascending).
    pub fn list_tasks(&self) -> Vec<TeamTask> {
        let mut tasks: Vec<TeamTask> = self.tasks.values().cloned().collect();
        tasks.sort_by_key(|task| task.priority);
        tasks
    }

    pub fn task(&self, task_id: &str) -> Option<&TeamTask> {
        self.tasks.get(task_id)
    }

    /// Last-write-wins status update; existing summary/error are kept when
    /// the caller passes `None`. Returns false for an unknown task id.
    pub fn update_task(
        &mut self,
        task_id: &str,
        status: TaskStatus,
        result_summary: Option<String>,
        error_message: Option<String>,
    ) -> bool {
        match self.tasks.get_mut(task_id) {
            Some(task) => {
                task.status = status;
                if result_summary.is_some() {
                    task.result_summary = result_summary;
                }
                if error_message.is_some() {
                    task.error_message = error_message;
                }
                task.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn push_message(&mut self, message: InboxMessage) {
        self.inbox.push(message);
    }

    /// Defensive copy of the inbox.
    pub fn messages(&self) -> Vec<InboxMessage> {
        self.inbox.clone()
    }

    pub fn push_gate_result(&mut self, result: GateResult) {
        self.gate_results.push(result);
    }

    /// Defensive copy of the gate trail.
    pub fn gate_results(&self) -> Vec<GateResult> {
        self.gate_results.clone()
    }

    pub fn status_counts(&self) -> TaskStatusCounts {
        let mut counts = TaskStatusCounts::default();
        for task in self.tasks.values() {
            counts.record(task.status);
        }
        counts
    }
}
