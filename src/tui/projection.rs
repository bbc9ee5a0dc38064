//! Pinhole projection of the panel row onto terminal columns
//!
//! Only the horizontal axis is projected: every visible panel becomes a
//! full-height column whose left edge and width follow from its camera-space
//! position. Panels behind the camera are culled.

use crate::geometry::Vec3;
use crate::nav::CameraPose;

/// Horizontal field of view, degrees
pub const FIELD_OF_VIEW: f32 = 70.0;

/// Nearest depth still drawn
const NEAR_PLANE: f32 = 0.25;

/// Narrowest column worth drawing (borders plus one cell)
const MIN_COLUMNS: u16 = 3;

/// A panel as seen from the camera, in normalized screen units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    /// Distance along the view direction
    pub depth: f32,
    /// Center, -1 (left edge of screen) to 1 (right edge)
    pub center: f32,
    /// Width in the same units (2.0 spans the screen)
    pub width: f32,
}

/// Project a panel centered at `position` that is `panel_width` wide
pub fn project(pose: &CameraPose, position: Vec3, panel_width: f32) -> Option<Projected> {
    let offset = position - pose.position;
    let forward = pose.orientation.forward();
    let right = pose.orientation.right();

    let depth = offset.x * forward.x + offset.y * forward.y;
    if depth < NEAR_PLANE {
        return None;
    }
    let lateral = offset.x * right.x + offset.y * right.y;

    let half_extent = depth * (FIELD_OF_VIEW.to_radians() / 2.0).tan();
    let projected = Projected {
        depth,
        center: lateral / half_extent,
        width: panel_width / half_extent,
    };

    // Entirely off-screen
    if projected.center + projected.width / 2.0 < -1.0
        || projected.center - projected.width / 2.0 > 1.0
    {
        return None;
    }
    Some(projected)
}

/// Column span `(x, width)` inside a region `area_width` cells wide
///
/// Clipped to the region; `None` when too narrow to draw.
pub fn columns(projected: &Projected, area_width: u16) -> Option<(u16, u16)> {
    let cells = f32::from(area_width);
    let left = ((projected.center - projected.width / 2.0 + 1.0) / 2.0 * cells).round();
    let right = ((projected.center + projected.width / 2.0 + 1.0) / 2.0 * cells).round();

    let left = left.clamp(0.0, cells) as u16;
    let right = right.clamp(0.0, cells) as u16;
    let width = right.saturating_sub(left);
    (width >= MIN_COLUMNS).then_some((left, width))
}
