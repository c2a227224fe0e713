use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStepKind {
    Email,
    Questionnaire,
    Contract,
    Invoice,
    Reminder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: String,
    pub title: String,
    pub kind: WorkflowStepKind,
    #[serde(default)]
    pub delay_days: u32,
}

/// Onboarding workflow: an ordered list of steps run for each new client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub steps: Vec<WorkflowStep>,
}

impl Workflow {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("workflow name", "must not be empty"));
        }
        if self.steps.is_empty() {
            return Err(DomainError::validation("workflow steps", "need at least one step"));
        }
        let mut ids = HashSet::new();
        for step in &self.steps {
            if step.title.trim().is_empty() {
                return Err(DomainError::validation(
                    "workflow step",
                    format!("step {} has an empty title", step.id),
                ));
            }
            if !ids.insert(step.id.as_str()) {
                return Err(DomainError::validation(
                    "workflow step",
                    format!("duplicate step id {}", step.id),
                ));
            }
        }
        Ok(())
    }

    /// Days after onboarding starts at which each step fires.
    pub fn schedule(&self) -> Vec<(&WorkflowStep, u32)> {
        let mut day = 0_u32;
        self.steps
            .iter()
            .map(|step| {
                day = day.saturating_add(step.delay_days);
                (step, day)
            })
            .collect()
    }
}
