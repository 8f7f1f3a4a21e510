//! kerbside-pano: panorama-space geometry for sidewalk labeling (sans-IO).
//!
//! Converts between canonical equirectangular panorama coordinates and
//! viewport pixels under a changing point of view, places and hit-tests
//! accessibility labels, and runs the one-shot validation lifecycle.
//!
//! This crate has **no I/O dependencies** -- every operation is a
//! synchronous, pure computation over in-memory state, driven by discrete
//! UI events (pointer, pan, zoom) on a single thread. Rendering, network
//! submission, and the panorama widget itself are external collaborators:
//! they feed the current [`PointOfView`] and viewport in by value and
//! receive projected coordinates, hit results, and validation records
//! back. Callers must apply events in receipt order; completion and
//! validation state only move forward, so in-order replays are safe.

pub mod label;
pub mod projection;
pub mod types;
pub mod validation;

pub use label::{HIT_MARGIN, Label, LabelKind, LabelParams, LabelStyle, Severity, Visibility};
pub use types::{
    Bearing, CanvasCoord, PanoImageCoord, PointOfView, PovError, ProjectionConfig, Viewport,
};
pub use validation::{
    DECISION_DEBOUNCE_MS, Mission, ValidationConfig, ValidationLog, ValidationOutcome,
    ValidationRecord, ValidationSession,
};
