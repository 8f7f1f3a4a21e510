//! Per-label validation lifecycle: a label is presented to a validator,
//! who agrees, disagrees, or is unsure -- exactly once.
//!
//! The session records where the label sat on the validator's screen at the
//! moment of decision. That position is not the raw placement projection:
//! the label's canonical coordinate is first turned into a viewing
//! direction ([`bearing_of`]) and then located under the validator's
//! current orientation with [`pov_to_pixel`], so the label lands where it
//! visually sits for the validator. A label whose bounding circle misses
//! the viewport entirely is recorded with no canvas position -- that is the
//! expected off-screen outcome, not an error.
//!
//! Timestamps come from [`web_time::SystemTime`], which works on both
//! native targets and WASM.

use serde::{Deserialize, Serialize};

use crate::label::Label;
use crate::projection::{bearing_of, pov_to_pixel};
use crate::types::{Bearing, CanvasCoord, PointOfView, PovError, ProjectionConfig, Viewport};

/// Minimum spacing between decisions on the same panorama, in
/// milliseconds.
///
/// Rapid double-clicks produce spurious second decisions while the next
/// label is still loading. The *caller* owns this guard: drop any decision
/// arriving within this window of the previous one on the same panorama
/// before invoking [`ValidationSession::decide`]. The session itself does
/// not time-gate.
pub const DECISION_DEBOUNCE_MS: u64 = 800;

/// A validator's judgment of one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    /// The label is correct.
    Agree,
    /// The label is wrong.
    Disagree,
    /// The validator cannot tell.
    Unsure,
}

impl ValidationOutcome {
    /// Numeric code used by the mission collaborator and the submission
    /// payload.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Agree => 1,
            Self::Disagree => 2,
            Self::Unsure => 3,
        }
    }
}

/// Validation-interface settings resolved once at startup by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Radius of the label's bounding circle on the validation canvas, in
    /// pixels. Touch devices use a larger circle.
    pub label_radius: f64,
}

impl ValidationConfig {
    /// Bounding-circle radius on pointer devices.
    pub const DESKTOP_LABEL_RADIUS: f64 = 10.0;

    /// Bounding-circle radius on touch devices.
    pub const TOUCH_LABEL_RADIUS: f64 = 25.0;

    /// Config for touch devices.
    #[must_use]
    pub const fn touch() -> Self {
        Self {
            label_radius: Self::TOUCH_LABEL_RADIUS,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            label_radius: Self::DESKTOP_LABEL_RADIUS,
        }
    }
}

/// The immutable outcome of one human judgment on one label.
///
/// `canvas` holds the top-left corner of the label's bounding circle at
/// decision time, and is `None` exactly when that circle did not intersect
/// the viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRecord {
    /// Identity of the judged label.
    pub label_id: u64,
    /// When the label was presented, epoch milliseconds.
    pub start_ms: u64,
    /// When the decision was made, epoch milliseconds.
    pub end_ms: u64,
    /// The validator's orientation at decision time.
    pub pov: PointOfView,
    /// Top-left corner of the bounding circle, or `None` if off-screen.
    pub canvas: Option<CanvasCoord>,
    /// The judgment.
    pub outcome: ValidationOutcome,
}

/// Ordered, append-only log of validation records, serialized wholesale
/// for submission by the persistence collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationLog(Vec<ValidationRecord>);

impl ValidationLog {
    /// An empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a record. Records are never removed or reordered.
    pub fn push(&mut self, record: ValidationRecord) {
        self.0.push(record);
    }

    /// All records, in decision order.
    #[must_use]
    pub fn records(&self) -> &[ValidationRecord] {
        &self.0
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The mission-progress collaborator notified after each decision.
///
/// Implemented by the external mission container; this crate only pushes
/// numeric outcome codes into it and asks it to stage the next label while
/// the mission still has labels left.
pub trait Mission {
    /// Count one decision with the given outcome code.
    fn record_outcome(&mut self, code: u8);

    /// Whether every label of the mission has been decided.
    fn is_complete(&self) -> bool;

    /// Stage the next label for presentation.
    fn stage_next_label(&mut self);
}

/// A decision arriving for a label that was already decided.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Each label transitions at most once.
    #[error("label {0} has already been decided")]
    AlreadyDecided(u64),

    /// The validator's point of view was invalid.
    #[error(transparent)]
    Pov(#[from] PovError),
}

/// Lifecycle of one validation decision: presented, then decided at most
/// once.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationSession {
    label_id: u64,
    target: Bearing,
    label_radius: f64,
    start_ms: u64,
    decided: bool,
}

impl ValidationSession {
    /// Present a label to the validator, stamping the start time.
    #[must_use]
    pub fn present(label: &Label, config: &ValidationConfig, projection: &ProjectionConfig) -> Self {
        Self {
            label_id: label.id(),
            target: bearing_of(projection, label.image_coord()),
            label_radius: config.label_radius,
            start_ms: now_millis(),
            decided: false,
        }
    }

    /// Identity of the presented label.
    #[must_use]
    pub const fn label_id(&self) -> u64 {
        self.label_id
    }

    /// When the label was presented, epoch milliseconds.
    #[must_use]
    pub const fn start_ms(&self) -> u64 {
        self.start_ms
    }

    /// Whether a decision has been recorded.
    #[must_use]
    pub const fn is_decided(&self) -> bool {
        self.decided
    }

    /// Record the validator's judgment and notify the mission.
    ///
    /// Locates the label under the validator's current orientation, stamps
    /// the end time, emits the immutable record, and signals `mission` with
    /// the numeric outcome code; if the mission is not yet complete the
    /// next label is staged. The session is terminal afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::AlreadyDecided`] on a second decision and
    /// [`ValidationError::Pov`] when `viewer` is out of range.
    pub fn decide<M: Mission>(
        &mut self,
        outcome: ValidationOutcome,
        viewer: PointOfView,
        viewport: Viewport,
        mission: &mut M,
    ) -> Result<ValidationRecord, ValidationError> {
        if self.decided {
            return Err(ValidationError::AlreadyDecided(self.label_id));
        }

        let center = pov_to_pixel(self.target, viewer, viewport)?;
        let radius = self.label_radius;
        let canvas = center.and_then(|c| {
            let intersects = c.x + radius > 0.0
                && c.x - radius < viewport.width
                && c.y + radius > 0.0
                && c.y - radius < viewport.height;
            // Top-left corner of the bounding circle, recorded as long as
            // any fraction of the circle is still on screen.
            intersects.then(|| CanvasCoord::new(c.x - radius, c.y - radius))
        });

        let record = ValidationRecord {
            label_id: self.label_id,
            start_ms: self.start_ms,
            end_ms: now_millis(),
            pov: viewer,
            canvas,
            outcome,
        };
        self.decided = true;

        log::debug!(
            "label {} decided: {:?} (on screen: {})",
            self.label_id,
            outcome,
            record.canvas.is_some(),
        );

        mission.record_outcome(outcome.code());
        if !mission.is_complete() {
            mission.stage_next_label();
        }

        Ok(record)
    }
}

/// Current wall-clock time as epoch milliseconds.
fn now_millis() -> u64 {
    web_time::SystemTime::now()
        .duration_since(web_time::UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::label::{LabelKind, LabelParams};
    use crate::types::PanoImageCoord;

    /// Mission double counting calls.
    #[derive(Debug, Default)]
    struct RecordingMission {
        codes: Vec<u8>,
        complete: bool,
        staged: usize,
    }

    impl Mission for RecordingMission {
        fn record_outcome(&mut self, code: u8) {
            self.codes.push(code);
        }

        fn is_complete(&self) -> bool {
            self.complete
        }

        fn stage_next_label(&mut self) {
            self.staged += 1;
        }
    }

    fn viewport() -> Viewport {
        Viewport::new(720.0, 480.0)
    }

    fn pov(heading: f64, pitch: f64, zoom: u8) -> PointOfView {
        PointOfView::try_new(heading, pitch, zoom).unwrap()
    }

    /// A label whose canonical coordinate sits straight ahead at heading
    /// 180, zero pitch.
    fn centered_label(config: &ProjectionConfig) -> Label {
        Label::restore(
            LabelParams::new(42, LabelKind::NoCurbRamp),
            PanoImageCoord::new(config.image_width / 2.0, 0.0),
            pov(180.0, 0.0, 1),
            config,
        )
        .unwrap()
    }

    #[test]
    fn outcome_codes() {
        assert_eq!(ValidationOutcome::Agree.code(), 1);
        assert_eq!(ValidationOutcome::Disagree.code(), 2);
        assert_eq!(ValidationOutcome::Unsure.code(), 3);
    }

    #[test]
    fn agree_on_visible_label_records_position_and_times() {
        let projection = ProjectionConfig::default();
        let label = centered_label(&projection);
        let mut session =
            ValidationSession::present(&label, &ValidationConfig::default(), &projection);
        let mut mission = RecordingMission::default();

        let record = session
            .decide(
                ValidationOutcome::Agree,
                pov(180.0, 0.0, 1),
                viewport(),
                &mut mission,
            )
            .unwrap();

        assert_eq!(record.label_id, 42);
        assert_eq!(record.outcome, ValidationOutcome::Agree);
        assert!(record.end_ms >= record.start_ms);
        // Looking straight at the label: circle center (360, 240), corner
        // offset by the desktop radius.
        let canvas = record.canvas.unwrap();
        assert!((canvas.x - 350.0).abs() < 1e-6);
        assert!((canvas.y - 230.0).abs() < 1e-6);
        assert_eq!(mission.codes, vec![1]);
        assert_eq!(mission.staged, 1);
    }

    #[test]
    fn rotated_half_turn_yields_no_canvas_position() {
        let projection = ProjectionConfig::default();
        let label = centered_label(&projection);
        let mut session =
            ValidationSession::present(&label, &ValidationConfig::default(), &projection);
        let mut mission = RecordingMission::default();

        // The label was placed under heading 180; the validator now faces 0.
        let record = session
            .decide(
                ValidationOutcome::Disagree,
                pov(0.0, 0.0, 1),
                viewport(),
                &mut mission,
            )
            .unwrap();

        assert_eq!(record.canvas, None);
        assert_eq!(record.outcome, ValidationOutcome::Disagree);
        assert_eq!(mission.codes, vec![2]);
    }

    #[test]
    fn second_decision_is_rejected() {
        let projection = ProjectionConfig::default();
        let label = centered_label(&projection);
        let mut session =
            ValidationSession::present(&label, &ValidationConfig::default(), &projection);
        let mut mission = RecordingMission::default();

        session
            .decide(
                ValidationOutcome::Unsure,
                pov(180.0, 0.0, 1),
                viewport(),
                &mut mission,
            )
            .unwrap();
        let second = session.decide(
            ValidationOutcome::Agree,
            pov(180.0, 0.0, 1),
            viewport(),
            &mut mission,
        );

        assert_eq!(second, Err(ValidationError::AlreadyDecided(42)));
        assert!(session.is_decided());
        // The mission saw exactly one decision.
        assert_eq!(mission.codes, vec![3]);
    }

    #[test]
    fn complete_mission_stages_no_further_label() {
        let projection = ProjectionConfig::default();
        let label = centered_label(&projection);
        let mut session =
            ValidationSession::present(&label, &ValidationConfig::default(), &projection);
        let mut mission = RecordingMission {
            complete: true,
            ..RecordingMission::default()
        };

        session
            .decide(
                ValidationOutcome::Agree,
                pov(180.0, 0.0, 1),
                viewport(),
                &mut mission,
            )
            .unwrap();

        assert_eq!(mission.staged, 0);
    }

    #[test]
    fn invalid_viewer_pov_is_a_typed_error() {
        let projection = ProjectionConfig::default();
        let label = centered_label(&projection);
        let mut session =
            ValidationSession::present(&label, &ValidationConfig::default(), &projection);
        let mut mission = RecordingMission::default();

        let bad = PointOfView {
            heading: -5.0,
            pitch: 0.0,
            zoom: 1,
        };
        let result = session.decide(ValidationOutcome::Agree, bad, viewport(), &mut mission);
        assert_eq!(
            result,
            Err(ValidationError::Pov(PovError::Heading(-5.0)))
        );
        // A failed decision leaves the session undecided.
        assert!(!session.is_decided());
        assert!(mission.codes.is_empty());
    }

    #[test]
    fn barely_on_screen_circle_is_still_recorded() {
        let projection = ProjectionConfig::default();
        let label = centered_label(&projection);
        let config = ValidationConfig {
            label_radius: 25.0,
        };
        let mut session = ValidationSession::present(&label, &config, &projection);
        let mut mission = RecordingMission::default();

        // Pan until the label center is just past the left viewport edge;
        // part of the 25 px circle still overlaps the viewport.
        let mut heading = 180.0;
        let mut last_visible = None;
        while heading < 280.0 {
            let view = pov(heading, 0.0, 1);
            if let Some(center) =
                crate::projection::pov_to_pixel(session.target, view, viewport()).unwrap()
                && center.x > -20.0
                && center.x < 0.0
            {
                last_visible = Some(view);
                break;
            }
            heading += 0.25;
        }
        let view = last_visible.expect("expected a heading putting the label just off the edge");

        let record = session
            .decide(ValidationOutcome::Agree, view, viewport(), &mut mission)
            .unwrap();
        assert!(record.canvas.is_some(), "fractionally visible circle must be recorded");
    }

    #[test]
    fn log_appends_in_order() {
        let mut log = ValidationLog::new();
        assert!(log.is_empty());

        for (id, outcome) in [
            (1, ValidationOutcome::Agree),
            (2, ValidationOutcome::Unsure),
        ] {
            log.push(ValidationRecord {
                label_id: id,
                start_ms: 100,
                end_ms: 200,
                pov: pov(0.0, 0.0, 1),
                canvas: None,
                outcome,
            });
        }

        assert_eq!(log.len(), 2);
        assert_eq!(log.records()[0].label_id, 1);
        assert_eq!(log.records()[1].outcome, ValidationOutcome::Unsure);
    }

    #[test]
    fn log_serde_round_trip() {
        let mut log = ValidationLog::new();
        log.push(ValidationRecord {
            label_id: 9,
            start_ms: 5,
            end_ms: 17,
            pov: pov(33.0, -4.5, 2),
            canvas: Some(CanvasCoord::new(12.0, 80.0)),
            outcome: ValidationOutcome::Disagree,
        });

        let json = serde_json::to_string(&log).unwrap();
        let back: ValidationLog = serde_json::from_str(&json).unwrap();
        assert_eq!(log, back);
    }
}
