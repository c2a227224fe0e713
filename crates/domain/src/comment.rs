use serde::{Deserialize, Serialize};

use crate::{CommentId, DomainError, PhotoId};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Builds a point in normalized image space, clamped to `0.0..=1.0`.
    pub fn normalized(x: f64, y: f64) -> Result<Self, DomainError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(DomainError::InvalidAnnotation(
                "point coordinates must be finite".to_string(),
            ));
        }
        Ok(Self {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        })
    }
}

/// Freehand region drawn over an image.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    points: Vec<Point>,
}

impl Annotation {
    pub const MIN_POINTS: usize = 2;

    pub fn new(points: Vec<Point>) -> Result<Self, DomainError> {
        if points.len() < Self::MIN_POINTS {
            return Err(DomainError::InvalidAnnotation(format!(
                "need at least {} points, got {}",
                Self::MIN_POINTS,
                points.len()
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The backend stores the point list as a JSON string.
    pub fn to_payload(&self) -> Result<String, DomainError> {
        serde_json::to_string(&self.points)
            .map_err(|error| DomainError::InvalidAnnotation(error.to_string()))
    }

    pub fn from_payload(payload: &str) -> Result<Self, DomainError> {
        let points: Vec<Point> = serde_json::from_str(payload)
            .map_err(|error| DomainError::InvalidAnnotation(error.to_string()))?;
        Self::new(points)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: CommentId,
    pub photo_id: PhotoId,
    pub text: String,
    pub author: Option<String>,
    pub created_at: Option<String>,
    pub annotation: Option<Annotation>,
    pub video_timestamp_secs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub photo_id: PhotoId,
    pub text: String,
    pub annotation: Option<Annotation>,
    pub video_timestamp_secs: Option<f64>,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.text.trim().is_empty() && self.annotation.is_none() {
            return Err(DomainError::validation(
                "comment",
                "text must not be empty without an annotation",
            ));
        }
        if let Some(timestamp) = self.video_timestamp_secs {
            if !timestamp.is_finite() || timestamp < 0.0 {
                return Err(DomainError::validation(
                    "video_timestamp",
                    format!("must be a non-negative number, got {timestamp}"),
                ));
            }
        }
        Ok(())
    }
}
