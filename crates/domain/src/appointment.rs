use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub title: String,
    pub client_email: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub title: String,
    pub client_email: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl NewAppointment {
    /// Checks the slot itself and that it does not overlap any booked slot.
    /// Slots are half-open: one may start exactly when another ends.
    pub fn validate_against(&self, booked: &[Appointment]) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("appointment title", "must not be empty"));
        }
        if !self.client_email.contains('@') {
            return Err(DomainError::validation(
                "client_email",
                format!("{:?} is not an email address", self.client_email),
            ));
        }
        if self.ends_at <= self.starts_at {
            return Err(DomainError::validation(
                "appointment time",
                "must end after it starts",
            ));
        }
        if let Some(clash) = booked
            .iter()
            .find(|existing| self.starts_at < existing.ends_at && existing.starts_at < self.ends_at)
        {
            return Err(DomainError::validation(
                "appointment time",
                format!("overlaps {:?} ({} - {})", clash.title, clash.starts_at, clash.ends_at),
            ));
        }
        Ok(())
    }
}
