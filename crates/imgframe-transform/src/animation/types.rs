//! Core animation types.
//!
//! - `AnimationId`: generation token handed out by the transform store
//! - `AnimationOutcome`: how an `animate` call ended

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation token identifying one animation run.
///
/// Ids are issued by [`TransformStore::begin_animation`](crate::store::TransformStore::begin_animation)
/// and increase monotonically per store. Only the most recently issued id
/// may commit frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnimationId(pub u64);

impl fmt::Display for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How an animation run ended. Neither variant is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationOutcome {
    /// The target matrix was committed.
    Completed,
    /// A newer animation took over before the target was reached.
    Superseded,
}

impl AnimationOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animation_id_ordering() {
        assert!(AnimationId(1) < AnimationId(2));
        assert_eq!(AnimationId(7).to_string(), "#7");
    }

    #[test]
    fn test_outcome_serde() {
        let json = serde_json::to_string(&AnimationOutcome::Superseded).unwrap();
        assert_eq!(json, "\"superseded\"");
        assert!(AnimationOutcome::Completed.is_completed());
        assert!(!AnimationOutcome::Superseded.is_completed());
    }
}
