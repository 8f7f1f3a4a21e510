//! Shared value types for panorama-space geometry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A panorama viewer's orientation: compass heading, pitch, and zoom level.
///
/// Headings grow clockwise from north and live in `[0, 360)`; pitch is the
/// elevation angle in `[-90, 90]` with positive values looking up. Values
/// outside those ranges indicate a caller bug and are rejected with
/// [`PovError`] by every operation that consumes a point of view -- they are
/// never clamped, since clamping would silently misplace labels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointOfView {
    /// Compass heading in degrees, `[0, 360)`.
    pub heading: f64,
    /// Elevation angle in degrees, `[-90, 90]`.
    pub pitch: f64,
    /// Discrete zoom level of the panorama viewer.
    pub zoom: u8,
}

impl PointOfView {
    /// Create a point of view, rejecting out-of-range angles.
    ///
    /// # Errors
    ///
    /// Returns [`PovError::Heading`] or [`PovError::Pitch`] when the
    /// corresponding angle is out of range or non-finite. The zoom level is
    /// only checked against the configured divisor table at projection time.
    pub fn try_new(heading: f64, pitch: f64, zoom: u8) -> Result<Self, PovError> {
        let pov = Self {
            heading,
            pitch,
            zoom,
        };
        pov.validate()?;
        Ok(pov)
    }

    /// Check that heading and pitch are in range.
    ///
    /// # Errors
    ///
    /// Returns [`PovError::Heading`] or [`PovError::Pitch`] on the first
    /// out-of-range angle. NaN fails both range checks.
    pub fn validate(self) -> Result<(), PovError> {
        if !(0.0..360.0).contains(&self.heading) {
            return Err(PovError::Heading(self.heading));
        }
        if !(-90.0..=90.0).contains(&self.pitch) {
            return Err(PovError::Pitch(self.pitch));
        }
        Ok(())
    }

    /// The zoom-free viewing direction of this point of view.
    #[must_use]
    pub const fn bearing(self) -> Bearing {
        Bearing {
            heading: self.heading,
            pitch: self.pitch,
        }
    }
}

/// A viewing direction without a zoom level.
///
/// Used as the target of [`pov_to_pixel`](crate::projection::pov_to_pixel):
/// the direction under which some panorama feature sits at the center of a
/// viewport, independent of how far the viewer has zoomed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bearing {
    /// Compass heading in degrees.
    pub heading: f64,
    /// Elevation angle in degrees.
    pub pitch: f64,
}

impl Bearing {
    /// Create a bearing.
    #[must_use]
    pub const fn new(heading: f64, pitch: f64) -> Self {
        Self { heading, pitch }
    }
}

/// A canonical position on the full equirectangular panorama image.
///
/// Resolution- and zoom-independent: `x` spans `[0, image_width)` with
/// wraparound at the 360° seam, `y` spans roughly
/// `[-image_height/2, image_height/2]` with no wraparound. This is the only
/// coordinate a label persists; canvas positions are always re-derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanoImageCoord {
    /// Horizontal position in full-panorama pixels.
    pub x: f64,
    /// Vertical position in full-panorama pixels, zero at the horizon.
    pub y: f64,
}

impl PanoImageCoord {
    /// Create a panorama image coordinate.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Wrap `x` into `[0, image_width)`, leaving `y` untouched.
    #[must_use]
    pub fn wrapped(self, image_width: f64) -> Self {
        Self {
            x: self.x.rem_euclid(image_width),
            y: self.y,
        }
    }
}

/// An on-screen position in viewport pixels.
///
/// Derived from a [`PanoImageCoord`] and a [`PointOfView`]; recomputed on
/// every view change and never stored as source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasCoord {
    /// Horizontal position in viewport pixels, from the left edge.
    pub x: f64,
    /// Vertical position in viewport pixels, from the top edge.
    pub y: f64,
}

impl CanvasCoord {
    /// Create a canvas coordinate.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Viewport dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Viewport {
    /// Create a viewport.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Projection constants for one panorama deployment.
///
/// The scale factors and the per-zoom-level divisor table depend on the
/// panorama tile resolution served to the viewer, so they are supplied as
/// configuration rather than hardcoded. [`ProjectionConfig::default`]
/// carries the values of the production street-view imagery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Full equirectangular image width in pixels.
    pub image_width: f64,
    /// Full equirectangular image height in pixels.
    pub image_height: f64,
    /// Horizontal canvas-to-image scale factor.
    pub alpha_x: f64,
    /// Vertical canvas-to-image scale factor. Negative: canvas y grows
    /// downward while image y grows upward.
    pub alpha_y: f64,
    /// Per-zoom-level divisor applied to both axes. A zoom level absent
    /// from this table is rejected with [`PovError::Zoom`].
    pub zoom_factors: BTreeMap<u8, f64>,
}

impl ProjectionConfig {
    /// Look up the divisor for a zoom level.
    ///
    /// # Errors
    ///
    /// Returns [`PovError::Zoom`] when the level is not in the table.
    pub fn zoom_factor(&self, zoom: u8) -> Result<f64, PovError> {
        self.zoom_factors
            .get(&zoom)
            .copied()
            .ok_or(PovError::Zoom(zoom))
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            image_width: 13312.0,
            image_height: 6656.0,
            alpha_x: 4.6,
            alpha_y: -4.65,
            zoom_factors: BTreeMap::from([
                (1, 1.0),
                (2, 2.1),
                (3, 4.0),
                (4, 8.0),
                (5, 16.0),
            ]),
        }
    }
}

/// An out-of-range point of view. Always a caller bug; never recovered by
/// clamping.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum PovError {
    /// Heading outside `[0, 360)` or non-finite.
    #[error("heading {0} is outside [0, 360)")]
    Heading(f64),

    /// Pitch outside `[-90, 90]` or non-finite.
    #[error("pitch {0} is outside [-90, 90]")]
    Pitch(f64),

    /// Zoom level with no configured divisor.
    #[error("no zoom factor configured for zoom level {0}")]
    Zoom(u8),
}
