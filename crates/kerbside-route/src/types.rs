//! Shared types for route-progress tracking.

use geo::Point;
use serde::{Deserialize, Serialize};

/// Distance thresholds for route tracking, in meters.
///
/// Both default to 10 m, matching the positioning noise of the street-view
/// walker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// A task completes when the observer comes within this distance of
    /// the route's final vertex.
    pub completion_threshold_m: f64,
    /// When advancing to a freshly fetched task, an endpoint within this
    /// distance of the previous task's end counts as a continuous
    /// handover.
    pub continuity_threshold_m: f64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            completion_threshold_m: 10.0,
            continuity_threshold_m: 10.0,
        }
    }
}

/// Where a task is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskPhase {
    /// Polyline set, no position update seen yet.
    Loaded,
    /// At least one position update applied.
    InProgress,
    /// The observer reached the final vertex. Sticky: walking back out of
    /// the completion radius does not reopen the task.
    Completed,
}

/// Result of one position update: the monotonic completion fraction plus
/// the route split at the observer's snapped position, ready for two
/// distinctly styled path overlays.
///
/// Both vertex lists carry the snapped position as their shared boundary
/// point and reflect the *live* snap -- when the observer has walked
/// backward, `completion` stays at its high-water mark while the split
/// follows the current position.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Fraction of the route length traversed, in `[0, 1]`, never
    /// decreasing across updates on the same task.
    pub completion: f64,
    /// Route vertices already passed, ending at the snapped position.
    pub completed_path: Vec<Point<f64>>,
    /// The snapped position followed by the vertices still ahead.
    pub remaining_path: Vec<Point<f64>>,
}

/// How a newly fetched task relates to the one just finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// The new task touches the previous end (possibly after reversal);
    /// the walker keeps going.
    Continuous,
    /// Both endpoints of the new task are far from the previous end; the
    /// walker must be repositioned to the new start.
    JumpToStart,
}

/// A malformed task payload.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// The payload is not the expected GeoJSON shape (a `LineString`
    /// feature).
    #[error("task payload is not a GeoJSON LineString feature: {0}")]
    Payload(#[from] serde_json::Error),

    /// A feature collection with no features.
    #[error("task payload contains no features")]
    MissingFeature,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_are_ten_meters() {
        let config = RouteConfig::default();
        assert!((config.completion_threshold_m - 10.0).abs() < f64::EPSILON);
        assert!((config.continuity_threshold_m - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_feature_display() {
        assert_eq!(
            RouteError::MissingFeature.to_string(),
            "task payload contains no features"
        );
    }
}
