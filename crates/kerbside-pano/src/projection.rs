//! Bidirectional mapping between panorama image coordinates and canvas
//! pixels under a changing point of view.
//!
//! Panorama imagery is equirectangular: heading maps linearly onto the
//! horizontal image axis with wraparound at the 360° seam, pitch maps
//! linearly onto the vertical axis with no wraparound. Both mappings share a
//! per-zoom-level divisor and per-axis scale factors supplied through
//! [`ProjectionConfig`].
//!
//! All functions here are pure; they validate the point of view and return
//! [`PovError`] instead of propagating NaN into label positions.

use crate::types::{
    Bearing, CanvasCoord, PanoImageCoord, PointOfView, PovError, ProjectionConfig, Viewport,
};

/// Project a canonical panorama coordinate onto the viewport.
///
/// The horizontal offset from the image column at the current heading is
/// wrapped to the nearest seam representation (within ± half the image
/// width), so a label just across the 360° seam appears beside the viewer
/// rather than a full revolution away.
///
/// The vertical anchor keeps the fixed `pitch / 90` ratio of the image
/// height; only the shared zoom divisor rescales it. The horizontal and
/// vertical axes are deliberately asymmetric in this respect.
///
/// # Errors
///
/// Returns [`PovError`] when the heading or pitch is out of range, or the
/// zoom level has no configured divisor.
pub fn to_canvas(
    config: &ProjectionConfig,
    image: PanoImageCoord,
    pov: PointOfView,
    viewport: Viewport,
) -> Result<CanvasCoord, PovError> {
    pov.validate()?;
    let zoom_factor = config.zoom_factor(pov.zoom)?;

    let half_width = config.image_width / 2.0;
    let dx = (image.x - config.image_width * pov.heading / 360.0 + half_width)
        .rem_euclid(config.image_width)
        - half_width;
    let dy = image.y - (config.image_height / 2.0) * (pov.pitch / 90.0);

    Ok(CanvasCoord::new(
        viewport.width / 2.0 + dx * zoom_factor / config.alpha_x,
        viewport.height / 2.0 + dy * zoom_factor / config.alpha_y,
    ))
}

/// Convert a viewport position back to a canonical panorama coordinate.
///
/// Exact inverse of [`to_canvas`]; the resulting `x` is wrapped into
/// `[0, image_width)`.
///
/// # Errors
///
/// Returns [`PovError`] when the heading or pitch is out of range, or the
/// zoom level has no configured divisor.
pub fn to_image_coordinate(
    config: &ProjectionConfig,
    canvas: CanvasCoord,
    pov: PointOfView,
    viewport: Viewport,
) -> Result<PanoImageCoord, PovError> {
    pov.validate()?;
    let zoom_factor = config.zoom_factor(pov.zoom)?;

    let x = config.image_width * pov.heading / 360.0
        + config.alpha_x * (canvas.x - viewport.width / 2.0) / zoom_factor;
    let y = (config.image_height / 2.0) * (pov.pitch / 90.0)
        + config.alpha_y * (canvas.y - viewport.height / 2.0) / zoom_factor;

    Ok(PanoImageCoord::new(x, y).wrapped(config.image_width))
}

/// The direction under which a canonical coordinate sits at viewport center.
///
/// Composes with [`pov_to_pixel`] to place a feature for a viewer whose
/// orientation differs from the one it was recorded under.
#[must_use]
pub fn bearing_of(config: &ProjectionConfig, image: PanoImageCoord) -> Bearing {
    Bearing::new(
        360.0 * image.x / config.image_width,
        90.0 * image.y / (config.image_height / 2.0),
    )
}

/// Field of view of the panorama viewer at a zoom level, in degrees.
///
/// Linear for the two widest levels, geometric beyond them; the constants
/// are fitted to the observed viewer rather than derived from tile
/// geometry.
#[must_use]
pub fn fov_degrees(zoom: u8) -> f64 {
    let z = f64::from(zoom);
    if zoom <= 2 {
        z.mul_add(-36.75, 126.5)
    } else {
        195.93 / 1.92_f64.powf(z)
    }
}

/// Locate a target direction on the viewer's canvas.
///
/// Both directions become rays on a sphere scaled to the focal length
/// derived from the zoom-dependent field of view; the target ray is
/// intersected with the viewing plane and expressed in the plane's
/// horizontal/vertical basis. Returns `None` when the target lies on or
/// behind the viewing plane -- a target that projects outside the viewport
/// rectangle still yields `Some`, and callers decide what off-viewport
/// means for them.
///
/// # Errors
///
/// Returns [`PovError`] when the viewer's heading or pitch is out of range.
pub fn pov_to_pixel(
    target: Bearing,
    viewer: PointOfView,
    viewport: Viewport,
) -> Result<Option<CanvasCoord>, PovError> {
    viewer.validate()?;

    let fov = fov_degrees(viewer.zoom).to_radians();
    let focal = 0.5 * viewport.width / (0.5 * fov).tan();

    let (sin_h, cos_h) = target.heading.to_radians().sin_cos();
    let (sin_p, cos_p) = target.pitch.to_radians().sin_cos();
    let (sin_h0, cos_h0) = viewer.heading.to_radians().sin_cos();
    let (sin_p0, cos_p0) = viewer.pitch.to_radians().sin_cos();

    // Target ray and viewing-plane normal, both scaled to the focal plane.
    let x = focal * cos_p * sin_h;
    let y = focal * cos_p * cos_h;
    let z = focal * sin_p;
    let x0 = focal * cos_p0 * sin_h0;
    let y0 = focal * cos_p0 * cos_h0;
    let z0 = focal * sin_p0;

    let n_dot_d = x0 * x + y0 * y + z0 * z;
    if n_dot_d <= 0.0 {
        // More than 90° away from the viewing direction.
        return Ok(None);
    }

    // Intersect the target ray with the viewing plane, then take the offset
    // from the plane's anchor point (the viewport center).
    let t = (x0 * x0 + y0 * y0 + z0 * z0) / n_dot_d;
    let px = t * x - x0;
    let py = t * y - y0;
    let pz = t * z - z0;

    // In-plane basis: u along increasing heading, v along increasing pitch.
    // Pitch is confined to [-90, 90], so cos(p0) >= 0 and u needs no sign
    // correction.
    let du = px * cos_h0 - py * sin_h0;
    let dv = pz.mul_add(cos_p0, px * (-sin_p0 * sin_h0) + py * (-sin_p0 * cos_h0));

    log::trace!(
        "pov_to_pixel: target ({:.2}, {:.2}) under viewer ({:.2}, {:.2}) -> ({:.1}, {:.1})",
        target.heading,
        target.pitch,
        viewer.heading,
        viewer.pitch,
        viewport.width / 2.0 + du,
        viewport.height / 2.0 - dv,
    );

    Ok(Some(CanvasCoord::new(
        viewport.width / 2.0 + du,
        viewport.height / 2.0 - dv,
    )))
}
