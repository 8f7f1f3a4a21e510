//! A placed accessibility label: stable panorama identity across view
//! changes, plus the mutable render styling the drawing layer consumes.
//!
//! A label's canonical [`PanoImageCoord`] is fixed at placement and never
//! rewritten by re-projection; only the derived canvas position changes as
//! the viewer pans and zooms. The last projection is memoized per
//! point-of-view/viewport pair so a render pass and the hit-test that
//! follows it share one computation.

use serde::{Deserialize, Serialize};

use crate::projection;
use crate::types::{CanvasCoord, PanoImageCoord, PointOfView, PovError, ProjectionConfig, Viewport};

/// Extra slack around the outer circle accepted by [`Label::hit_test`],
/// in pixels. Fixed visual affordance, independent of zoom.
pub const HIT_MARGIN: f64 = 3.0;

/// The kind of sidewalk-accessibility issue a label marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelKind {
    /// A curb ramp connecting sidewalk and street.
    CurbRamp,
    /// A crossing point with no curb ramp.
    NoCurbRamp,
    /// An obstacle blocking the path of travel.
    Obstacle,
    /// Cracked, heaved, or otherwise degraded surface.
    SurfaceProblem,
    /// The sidewalk is hidden from the camera (e.g. by a parked truck).
    Occlusion,
    /// No sidewalk exists where one is expected.
    NoSidewalk,
    /// Anything that fits no other kind.
    Other,
}

impl LabelKind {
    /// Icon asset rendered on top of the label circle.
    #[must_use]
    pub const fn icon_asset(self) -> &'static str {
        match self {
            Self::CurbRamp => "/assets/img/label_tool/Label_CurbRamp.png",
            Self::NoCurbRamp => "/assets/img/label_tool/Label_NoCurbRamp.png",
            Self::Obstacle => "/assets/img/label_tool/Label_Obstacle.png",
            Self::SurfaceProblem => "/assets/img/label_tool/Label_SurfaceProblem.png",
            Self::NoSidewalk => "/assets/img/label_tool/Label_NoSidewalk.png",
            // Occlusion shares the generic icon.
            Self::Occlusion | Self::Other => "/assets/img/label_tool/Label_Other.png",
        }
    }
}

/// Severity of an issue on the labeling interface, `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Severity(u8);

/// A severity outside `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("severity {0} is outside 1..=5")]
pub struct SeverityOutOfRange(pub u8);

impl Severity {
    /// Create a severity, rejecting values outside `1..=5`.
    ///
    /// # Errors
    ///
    /// Returns [`SeverityOutOfRange`] for 0 or anything above 5.
    pub const fn try_new(value: u8) -> Result<Self, SeverityOutOfRange> {
        if matches!(value, 1..=5) {
            Ok(Self(value))
        } else {
            Err(SeverityOutOfRange(value))
        }
    }

    /// The raw value, `1..=5`.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Severity {
    type Error = SeverityOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity.get()
    }
}

/// Whether the drawing layer should paint a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    /// Painted.
    #[default]
    Visible,
    /// Skipped by the drawing layer; the label itself is never deleted.
    Hidden,
}

/// Mutable render styling of one label.
///
/// Colors are CSS color strings because the drawing layer consumes them
/// verbatim; this crate never interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStyle {
    /// Fill of the inner circle.
    pub fill: String,
    /// Stroke of the outer circle.
    pub stroke: String,
    /// Outer circle line width in pixels.
    pub line_width: f64,
    /// Inner circle radius in pixels.
    pub inner_radius: f64,
    /// Outer circle radius in pixels.
    pub outer_radius: f64,
    /// Icon drawn inside the circle, if any.
    pub icon_path: Option<String>,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            fill: "rgba(255,255,255,0.5)".to_owned(),
            stroke: "rgba(255,255,255,1)".to_owned(),
            line_width: 2.0,
            inner_radius: 4.0,
            outer_radius: 5.0,
            icon_path: None,
        }
    }
}

/// Identity and initial attributes for constructing a [`Label`].
#[derive(Debug, Clone, PartialEq)]
pub struct LabelParams {
    /// Database identity.
    pub id: u64,
    /// Issue kind.
    pub kind: LabelKind,
    /// Severity assigned on the labeling interface, if any.
    pub severity: Option<Severity>,
    /// Initial render styling.
    pub style: LabelStyle,
}

impl LabelParams {
    /// Params with default styling and no severity.
    #[must_use]
    pub fn new(id: u64, kind: LabelKind) -> Self {
        Self {
            id,
            kind,
            severity: None,
            style: LabelStyle::default(),
        }
    }
}

/// Memoized result of the last projection.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ProjectionMemo {
    pov: PointOfView,
    viewport: Viewport,
    canvas: CanvasCoord,
}

/// One placed label.
///
/// The canonical image coordinate and the placement point of view are fixed
/// for the life of the label; styling and visibility mutate through the
/// setters below. The fill and stroke present at construction are kept as
/// the "original" values that [`Label::reset_fill`] and
/// [`Label::reset_stroke`] restore -- later setter calls never overwrite
/// them.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    id: u64,
    kind: LabelKind,
    severity: Option<Severity>,
    image_coord: PanoImageCoord,
    original_pov: PointOfView,
    style: LabelStyle,
    original_fill: String,
    original_stroke: String,
    visibility: Visibility,
    memo: Option<ProjectionMemo>,
}

impl Label {
    /// Place a new label at a click position on the canvas.
    ///
    /// The click is converted to the canonical panorama coordinate under
    /// the point of view active at placement, which is then frozen as
    /// `original_pov`.
    ///
    /// # Errors
    ///
    /// Returns [`PovError`] when `pov` is out of range or its zoom level is
    /// not configured.
    pub fn place(
        params: LabelParams,
        canvas: CanvasCoord,
        pov: PointOfView,
        viewport: Viewport,
        config: &ProjectionConfig,
    ) -> Result<Self, PovError> {
        let image_coord = projection::to_image_coordinate(config, canvas, pov, viewport)?;
        Ok(Self::from_parts(params, image_coord, pov))
    }

    /// Rebuild a label loaded from storage.
    ///
    /// `image_coord` is re-wrapped into the configured image width so stale
    /// stored values cannot violate the canonical range.
    ///
    /// # Errors
    ///
    /// Returns [`PovError`] when the stored `original_pov` is out of range.
    pub fn restore(
        params: LabelParams,
        image_coord: PanoImageCoord,
        original_pov: PointOfView,
        config: &ProjectionConfig,
    ) -> Result<Self, PovError> {
        original_pov.validate()?;
        Ok(Self::from_parts(
            params,
            image_coord.wrapped(config.image_width),
            original_pov,
        ))
    }

    fn from_parts(params: LabelParams, image_coord: PanoImageCoord, pov: PointOfView) -> Self {
        let original_fill = params.style.fill.clone();
        let original_stroke = params.style.stroke.clone();
        Self {
            id: params.id,
            kind: params.kind,
            severity: params.severity,
            image_coord,
            original_pov: pov,
            style: params.style,
            original_fill,
            original_stroke,
            visibility: Visibility::Visible,
            memo: None,
        }
    }

    /// Database identity.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Issue kind.
    #[must_use]
    pub const fn kind(&self) -> LabelKind {
        self.kind
    }

    /// Severity, if one has been assigned.
    #[must_use]
    pub const fn severity(&self) -> Option<Severity> {
        self.severity
    }

    pub fn set_severity(&mut self, severity: Severity) {
        self.severity = Some(severity);
    }

    /// The canonical panorama coordinate fixed at placement.
    #[must_use]
    pub const fn image_coord(&self) -> PanoImageCoord {
        self.image_coord
    }

    /// The point of view active when the label was placed.
    #[must_use]
    pub const fn original_pov(&self) -> PointOfView {
        self.original_pov
    }

    /// Current render styling.
    #[must_use]
    pub const fn style(&self) -> &LabelStyle {
        &self.style
    }

    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = visibility;
    }

    pub fn set_fill(&mut self, fill: impl Into<String>) {
        self.style.fill = fill.into();
    }

    pub fn set_stroke(&mut self, stroke: impl Into<String>) {
        self.style.stroke = stroke.into();
    }

    pub fn set_icon_path(&mut self, icon_path: impl Into<String>) {
        self.style.icon_path = Some(icon_path.into());
    }

    /// Restore the fill captured at construction.
    pub fn reset_fill(&mut self) {
        self.style.fill.clone_from(&self.original_fill);
    }

    /// Restore the stroke captured at construction.
    pub fn reset_stroke(&mut self) {
        self.style.stroke.clone_from(&self.original_stroke);
    }

    /// Project the canonical coordinate onto the viewport for the current
    /// point of view.
    ///
    /// The last result is memoized; a repeated call with a value-equal
    /// point of view and viewport returns it without recomputation.
    ///
    /// # Errors
    ///
    /// Returns [`PovError`] when `pov` is out of range or its zoom level is
    /// not configured.
    pub fn project(
        &mut self,
        pov: PointOfView,
        viewport: Viewport,
        config: &ProjectionConfig,
    ) -> Result<CanvasCoord, PovError> {
        if let Some(memo) = self.memo
            && memo.pov == pov
            && memo.viewport == viewport
        {
            return Ok(memo.canvas);
        }

        let canvas = projection::to_canvas(config, self.image_coord, pov, viewport)?;
        self.memo = Some(ProjectionMemo {
            pov,
            viewport,
            canvas,
        });
        Ok(canvas)
    }

    /// Whether a pointer position lands on this label under the current
    /// point of view.
    ///
    /// Accepts anything within the square window of half-side
    /// `outer_radius / 2 + HIT_MARGIN` around the projected center. The
    /// result depends only on the inputs, not on call history.
    ///
    /// # Errors
    ///
    /// Returns [`PovError`] when `pov` is out of range or its zoom level is
    /// not configured.
    pub fn hit_test(
        &mut self,
        pointer: CanvasCoord,
        pov: PointOfView,
        viewport: Viewport,
        config: &ProjectionConfig,
    ) -> Result<bool, PovError> {
        let center = self.project(pov, viewport, config)?;
        let margin = self.style.outer_radius / 2.0 + HIT_MARGIN;
        Ok((pointer.x - center.x).abs() < margin && (pointer.y - center.y).abs() < margin)
    }
}
