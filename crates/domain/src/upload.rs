use std::collections::VecDeque;
use std::path::PathBuf;

use crate::{Dimensions, DomainError, MediaType, PhotoId};

#[derive(Debug, Clone, PartialEq)]
pub struct UploadCandidate {
    pub path: PathBuf,
    pub filename: String,
    pub file_size: u64,
    pub media_type: MediaType,
    pub dimensions: Option<Dimensions>,
}

/// Existing photo the backend considers a match by filename and size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateMatch {
    pub photo_id: PhotoId,
    pub filename: String,
    pub file_size: Option<u64>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateDecision {
    Skip,
    UploadAnyway,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadOutcome {
    pub accepted: Vec<UploadCandidate>,
    pub skipped: Vec<UploadCandidate>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueueStep {
    /// Ask the backend whether this file already exists.
    Check(UploadCandidate),
    /// A duplicate was found; the queue is paused until [`UploadQueue::decide`].
    NeedsDecision {
        candidate: UploadCandidate,
        duplicates: Vec<DuplicateMatch>,
    },
    Finished(UploadOutcome),
}

#[derive(Debug, Clone, PartialEq)]
enum Cursor {
    Idle,
    Checking(UploadCandidate),
    AwaitingDecision {
        candidate: UploadCandidate,
        duplicates: Vec<DuplicateMatch>,
    },
}

/// Sequential duplicate-resolution queue. Each file is checked in order; a
/// duplicate pauses the queue at exactly one decision point.
#[derive(Debug, Clone)]
pub struct UploadQueue {
    pending: VecDeque<UploadCandidate>,
    outcome: UploadOutcome,
    cursor: Cursor,
}

impl UploadQueue {
    pub fn new(files: Vec<UploadCandidate>) -> Self {
        Self {
            pending: files.into(),
            outcome: UploadOutcome::default(),
            cursor: Cursor::Idle,
        }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn advance(&mut self) -> QueueStep {
        match &self.cursor {
            Cursor::Checking(candidate) => return QueueStep::Check(candidate.clone()),
            Cursor::AwaitingDecision {
                candidate,
                duplicates,
            } => {
                return QueueStep::NeedsDecision {
                    candidate: candidate.clone(),
                    duplicates: duplicates.clone(),
                }
            }
            Cursor::Idle => {}
        }

        match self.pending.pop_front() {
            Some(candidate) => {
                self.cursor = Cursor::Checking(candidate.clone());
                QueueStep::Check(candidate)
            }
            None => QueueStep::Finished(std::mem::take(&mut self.outcome)),
        }
    }

    /// Records the duplicate-check result for the file being checked. A failed
    /// check is treated as "no duplicate" so transient errors never block uploads.
    pub fn record_check<E>(
        &mut self,
        result: Result<Vec<DuplicateMatch>, E>,
    ) -> Result<(), DomainError> {
        let candidate = match std::mem::replace(&mut self.cursor, Cursor::Idle) {
            Cursor::Checking(candidate) => candidate,
            other => {
                self.cursor = other;
                return Err(DomainError::QueueOutOfOrder("no duplicate check in progress"));
            }
        };

        match result {
            Ok(duplicates) if !duplicates.is_empty() => {
                self.cursor = Cursor::AwaitingDecision {
                    candidate,
                    duplicates,
                };
            }
            _ => self.outcome.accepted.push(candidate),
        }
        Ok(())
    }

    pub fn decide(&mut self, decision: DuplicateDecision) -> Result<(), DomainError> {
        let candidate = match std::mem::replace(&mut self.cursor, Cursor::Idle) {
            Cursor::AwaitingDecision { candidate, .. } => candidate,
            other => {
                self.cursor = other;
                return Err(DomainError::QueueOutOfOrder("no duplicate decision pending"));
            }
        };

        match decision {
            DuplicateDecision::Skip => self.outcome.skipped.push(candidate),
            DuplicateDecision::UploadAnyway => self.outcome.accepted.push(candidate),
        }
        Ok(())
    }
}
