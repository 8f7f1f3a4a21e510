//! Route tasks: GeoJSON street segments with monotonic completion
//! tracking and continuity-preserving handover between tasks.
//!
//! A task wraps one street edge's polyline. Position updates snap the
//! observer onto the nearest segment, accumulate distance along the route,
//! and split the polyline into completed and remaining overlays for the
//! map. The completion fraction is a high-water mark: an observer walking
//! back toward the start never lowers it.

use geo::line_measures::{Distance, Length};
use geo::{Coord, Haversine, LineString, Point};
use serde::Deserialize;

use crate::progress::{SegmentSnap, nearest_segment};
use crate::types::{Continuation, Progress, RouteConfig, RouteError, TaskPhase};

/// Wire shape of a task payload.
///
/// The fetch collaborator sends either a bare GeoJSON feature or a
/// collection; a collection contributes its first feature.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum TaskPayload {
    Feature(TaskFeature),
    FeatureCollection { features: Vec<TaskFeature> },
}

#[derive(Debug, Deserialize)]
struct TaskFeature {
    geometry: TaskGeometry,
    properties: TaskProperties,
}

/// Only `LineString` geometry is meaningful for a street edge; anything
/// else fails deserialization.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum TaskGeometry {
    LineString { coordinates: Vec<[f64; 2]> },
}

#[derive(Debug, Deserialize)]
struct TaskProperties {
    street_edge_id: i64,
    task_start: String,
}

/// One street edge assigned for auditing.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteTask {
    line: LineString<f64>,
    street_edge_id: i64,
    task_start: String,
    config: RouteConfig,
    completion: f64,
    phase: TaskPhase,
    /// Snap of the most recent observer position; a repeated position is
    /// answered from here without rescanning the polyline.
    last_snap: Option<(Point<f64>, SegmentSnap)>,
}

impl RouteTask {
    /// Wrap a street-edge polyline as a fresh task.
    #[must_use]
    pub fn new(
        line: LineString<f64>,
        street_edge_id: i64,
        task_start: impl Into<String>,
        config: RouteConfig,
    ) -> Self {
        let task = Self {
            line,
            street_edge_id,
            task_start: task_start.into(),
            config,
            completion: 0.0,
            phase: TaskPhase::Loaded,
            last_snap: None,
        };
        log::debug!(
            "task {} loaded with {} vertices",
            task.street_edge_id,
            task.line.0.len(),
        );
        task
    }

    /// Parse a task from its GeoJSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Payload`] when the JSON is malformed or the
    /// geometry is not a `LineString`, and [`RouteError::MissingFeature`]
    /// for an empty feature collection.
    pub fn from_geojson(payload: &str, config: RouteConfig) -> Result<Self, RouteError> {
        let feature = match serde_json::from_str::<TaskPayload>(payload)? {
            TaskPayload::Feature(feature) => feature,
            TaskPayload::FeatureCollection { features } => features
                .into_iter()
                .next()
                .ok_or(RouteError::MissingFeature)?,
        };

        let TaskGeometry::LineString { coordinates } = feature.geometry;
        let line = LineString::new(
            coordinates
                .into_iter()
                .map(|[lng, lat]| Coord { x: lng, y: lat })
                .collect(),
        );

        Ok(Self::new(
            line,
            feature.properties.street_edge_id,
            feature.properties.task_start,
            config,
        ))
    }

    /// Street edge identity of this task.
    #[must_use]
    pub const fn street_edge_id(&self) -> i64 {
        self.street_edge_id
    }

    /// Server-issued start timestamp of this task.
    #[must_use]
    pub fn task_start(&self) -> &str {
        &self.task_start
    }

    /// The route polyline, lng/lat vertex order as traversed.
    #[must_use]
    pub const fn line(&self) -> &LineString<f64> {
        &self.line
    }

    /// Where the task is in its life.
    #[must_use]
    pub const fn phase(&self) -> TaskPhase {
        self.phase
    }

    /// The monotonic completion fraction reached so far.
    #[must_use]
    pub const fn completion(&self) -> f64 {
        self.completion
    }

    /// First vertex of the route, where traversal begins.
    #[must_use]
    pub fn start(&self) -> Option<Point<f64>> {
        self.line.0.first().copied().map(Point::from)
    }

    /// Final vertex of the route.
    #[must_use]
    pub fn end(&self) -> Option<Point<f64>> {
        self.line.0.last().copied().map(Point::from)
    }

    /// Whether the observer is within the completion threshold of the
    /// route's final vertex. A degenerate route with no vertices is
    /// trivially at its end.
    #[must_use]
    pub fn is_at_end(&self, lat: f64, lng: f64) -> bool {
        self.end().is_none_or(|end| {
            let distance_m = Haversine.distance(Point::new(lng, lat), end);
            log::debug!(
                "task {}: {distance_m:.1} m to the end",
                self.street_edge_id
            );
            distance_m < self.config.completion_threshold_m
        })
    }

    /// Apply one observer position update.
    ///
    /// Snaps the observer onto the nearest segment, raises the completion
    /// high-water mark, splits the route at the snap for rendering, and
    /// advances the phase (`Loaded` becomes `InProgress`; arriving within
    /// the completion threshold of the final vertex makes the task
    /// `Completed`). A route of zero total length completes immediately
    /// with empty overlays.
    pub fn update_progress(&mut self, lat: f64, lng: f64) -> Progress {
        let observer = Point::new(lng, lat);
        if self.phase == TaskPhase::Loaded {
            self.phase = TaskPhase::InProgress;
        }

        let total_m = Haversine.length(&self.line);
        let snap = self.snap_for(observer);
        let (Some(snap), true) = (snap, total_m > 0.0) else {
            self.completion = 1.0;
            self.phase = TaskPhase::Completed;
            return Progress {
                completion: 1.0,
                completed_path: Vec::new(),
                remaining_path: Vec::new(),
            };
        };

        let coords = &self.line.0;
        let mut traversed_m = 0.0;
        for pair in coords[..=snap.index].windows(2) {
            traversed_m += Haversine.distance(Point::from(pair[0]), Point::from(pair[1]));
        }
        traversed_m += Haversine.distance(Point::from(coords[snap.index]), snap.position);

        let rate = (traversed_m / total_m).clamp(0.0, 1.0);
        if rate > self.completion {
            self.completion = rate;
        }
        log::debug!(
            "task {}: completion {:.3}",
            self.street_edge_id,
            self.completion
        );

        let mut completed_path: Vec<Point<f64>> =
            coords[..=snap.index].iter().copied().map(Point::from).collect();
        completed_path.push(snap.position);
        let mut remaining_path = vec![snap.position];
        remaining_path.extend(coords[snap.index + 1..].iter().copied().map(Point::from));

        if self.phase != TaskPhase::Completed && self.is_at_end(lat, lng) {
            self.phase = TaskPhase::Completed;
            log::debug!("task {} completed", self.street_edge_id);
        }

        Progress {
            completion: self.completion,
            completed_path,
            remaining_path,
        }
    }

    /// Snap the observer onto the route, answering a repeated position
    /// from the cache.
    fn snap_for(&mut self, observer: Point<f64>) -> Option<SegmentSnap> {
        if let Some((cached_observer, snap)) = self.last_snap
            && cached_observer == observer
        {
            return Some(snap);
        }

        let snap = nearest_segment(observer, &self.line.0)?;
        self.last_snap = Some((observer, snap));
        Some(snap)
    }

    /// Flip the traversal direction. Only meaningful before the first
    /// position update; the snap cache is dropped with the old order.
    pub(crate) fn reverse(&mut self) {
        self.line.0.reverse();
        self.last_snap = None;
    }
}

/// The current task plus the ordered history of finished ones.
///
/// Owns the handover policy: a freshly fetched task is oriented so that
/// traversal continues from where the previous task ended, or the caller
/// is told to reposition the walker when the new street does not touch the
/// old one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskSequence {
    config: RouteConfig,
    current: Option<RouteTask>,
    finished: Vec<RouteTask>,
}

impl TaskSequence {
    /// An empty sequence.
    #[must_use]
    pub const fn new(config: RouteConfig) -> Self {
        Self {
            config,
            current: None,
            finished: Vec::new(),
        }
    }

    /// Install a freshly fetched task, retiring the current one.
    ///
    /// When the new task's end lies closer to the previous end than its
    /// start does (and within the continuity threshold), its vertex order
    /// is reversed so the walker keeps moving in one direction. When both
    /// endpoints are beyond the threshold -- or there is no previous task --
    /// the caller must jump the walker to the new start.
    pub fn advance(&mut self, mut next: RouteTask) -> Continuation {
        let continuation = match self.current.take() {
            None => Continuation::JumpToStart,
            Some(previous) => {
                let continuation = previous.end().map_or(Continuation::JumpToStart, |prev_end| {
                    orient(&mut next, prev_end, self.config.continuity_threshold_m)
                });
                self.finished.push(previous);
                continuation
            }
        };

        log::debug!(
            "advancing to task {} ({continuation:?})",
            next.street_edge_id()
        );
        self.current = Some(next);
        continuation
    }

    /// The task being audited, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&RouteTask> {
        self.current.as_ref()
    }

    /// Mutable access to the task being audited.
    pub const fn current_mut(&mut self) -> Option<&mut RouteTask> {
        self.current.as_mut()
    }

    /// Finished tasks, oldest first.
    #[must_use]
    pub fn finished(&self) -> &[RouteTask] {
        &self.finished
    }
}

/// Orient a new task against the previous task's final vertex.
fn orient(next: &mut RouteTask, previous_end: Point<f64>, threshold_m: f64) -> Continuation {
    let (Some(start), Some(end)) = (next.start(), next.end()) else {
        return Continuation::JumpToStart;
    };

    let to_start = Haversine.distance(start, previous_end);
    let to_end = Haversine.distance(end, previous_end);
    if to_start > threshold_m && to_end > threshold_m {
        return Continuation::JumpToStart;
    }
    if to_end < to_start {
        next.reverse();
    }
    Continuation::Continuous
}
