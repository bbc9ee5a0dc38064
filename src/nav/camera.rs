//! Camera pose and the exponential smoother that chases the focus target
//!
//! ```text
//!             focus / zoom action
//!        ┌──────────────────────────┐
//!        ▼                          │
//!   ┌───────────┐   move key   ┌─────────┐
//!   │ Following │ ───────────▶ │  Free   │ ◀─┐ move key
//!   └───────────┘  mouse look  └─────────┘ ──┘ mouse look
//!   lerps toward target        ignores target
//! ```
//!
//! Angles are degrees. Heading 0 looks down +y; positive heading turns
//! toward -x. Pitch is positive looking up and never reaches straight up or
//! down.

use crate::geometry::Vec3;
use std::time::Duration;

/// Pitch limit in either direction
pub const MAX_PITCH: f32 = 89.0;

/// Where the camera should end up: its position and the point it looks at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPose {
    pub position: Vec3,
    pub look_at: Vec3,
}

/// Heading and pitch, in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orientation {
    pub heading: f32,
    pub pitch: f32,
}

impl Orientation {
    /// Orientation that looks along `direction`
    pub fn looking_along(direction: Vec3) -> Self {
        Self {
            heading: -direction.x.atan2(direction.y).to_degrees(),
            pitch: direction.z.atan2(direction.horizontal_length()).to_degrees(),
        }
    }

    /// Unit forward vector on the ground plane
    pub fn forward(self) -> Vec3 {
        let h = self.heading.to_radians();
        Vec3::new(-h.sin(), h.cos(), 0.0)
    }

    /// Unit right vector on the ground plane
    pub fn right(self) -> Vec3 {
        let h = self.heading.to_radians();
        Vec3::new(h.cos(), h.sin(), 0.0)
    }
}

/// Current camera position and orientation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub orientation: Orientation,
}

/// Free-fly input for one tick; each axis is -1, 0 or 1
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Movement {
    pub forward: i8,
    pub right: i8,
    pub up: i8,
}

impl Movement {
    pub fn is_still(self) -> bool {
        self.forward == 0 && self.right == 0 && self.up == 0
    }

    /// Unit world-space direction for a camera with `orientation`
    pub fn direction(self, orientation: Orientation) -> Vec3 {
        let v = orientation.forward() * f32::from(self.forward)
            + orientation.right() * f32::from(self.right)
            + Vec3::new(0.0, 0.0, f32::from(self.up));
        v.normalized()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// Chasing the navigation target
    Following,
    /// Moved by hand; the target is ignored until re-attached
    Free,
}

/// Moves the pose a frame-time-scaled fraction of the way to the target
#[derive(Debug, Clone)]
pub struct CameraSmoother {
    pose: CameraPose,
    lerp_speed: f32,
    mode: CameraMode,
}

impl CameraSmoother {
    pub fn new(initial: CameraPose, lerp_speed: f32) -> Self {
        Self {
            pose: initial,
            lerp_speed,
            mode: CameraMode::Following,
        }
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    /// Fraction of the remaining distance covered in `dt`
    pub fn alpha(&self, dt: Duration) -> f32 {
        (dt.as_secs_f32() * self.lerp_speed).clamp(0.0, 1.0)
    }

    /// Advance one tick toward `target`
    ///
    /// Does nothing in free mode or without a target. Position is lerped
    /// first; the desired heading and pitch are then derived from the new
    /// position and lerped by the same fraction, heading along the shorter
    /// arc.
    pub fn step(&mut self, target: Option<&TargetPose>, dt: Duration) -> CameraPose {
        let Some(target) = target else {
            return self.pose;
        };
        if self.mode == CameraMode::Free {
            return self.pose;
        }

        let alpha = self.alpha(dt);
        self.pose.position = self.pose.position.lerp(target.position, alpha);

        let desired = Orientation::looking_along(target.look_at - self.pose.position);
        let current = self.pose.orientation;
        self.pose.orientation = Orientation {
            heading: wrap_degrees(
                current.heading + shortest_arc(current.heading, desired.heading) * alpha,
            ),
            pitch: current.pitch + (desired.pitch - current.pitch) * alpha,
        };
        self.pose
    }

    /// Translate by hand for `dt` at `speed` units per second
    ///
    /// Any movement detaches the camera from the target.
    pub fn fly(&mut self, movement: Movement, speed: f32, dt: Duration) {
        if movement.is_still() {
            return;
        }
        self.mode = CameraMode::Free;
        let direction = movement.direction(self.pose.orientation);
        self.pose.position += direction * (speed * dt.as_secs_f32());
    }

    /// Turn by hand: `dx` degrees to the right, `dy` degrees down
    ///
    /// Pitch stops at [`MAX_PITCH`]. Like flying, looking detaches the
    /// camera from the target.
    pub fn look(&mut self, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        self.mode = CameraMode::Free;
        let o = &mut self.pose.orientation;
        o.heading = wrap_degrees(o.heading - dx);
        o.pitch = (o.pitch - dy).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Resume following the target from wherever the camera is now
    pub fn attach(&mut self) {
        self.mode = CameraMode::Following;
    }
}

/// Map any angle into `[-180, 180)`
pub fn wrap_degrees(angle: f32) -> f32 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Signed smallest rotation from `from` to `to`
pub fn shortest_arc(from: f32, to: f32) -> f32 {
    wrap_degrees(to - from)
}
