//! Named directional intents and their velocity templates.

use serde::{Deserialize, Serialize};

use super::Velocity;

/// A named directional intent on the pan, tilt, and zoom axes.
///
/// Each direction maps to a fixed unit-velocity template; scaling by a
/// caller-supplied magnitude happens in [`Direction::velocity`]. The mapping
/// is a pure function over an exhaustive enum, so adding a direction without
/// a template is a compile error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
    ZoomIn,
    ZoomOut,
}

impl Direction {
    /// All directions, in a stable order. Useful for exhaustive tests and
    /// keyboard-binding tables in callers.
    pub const ALL: [Direction; 6] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
        Direction::ZoomIn,
        Direction::ZoomOut,
    ];

    /// Unit velocity for this direction: exactly one axis at full deflection.
    pub fn unit_velocity(self) -> Velocity {
        match self {
            Direction::Left => Velocity::new(-1.0, 0.0, 0.0),
            Direction::Right => Velocity::new(1.0, 0.0, 0.0),
            Direction::Up => Velocity::new(0.0, 1.0, 0.0),
            Direction::Down => Velocity::new(0.0, -1.0, 0.0),
            Direction::ZoomIn => Velocity::new(0.0, 0.0, 1.0),
            Direction::ZoomOut => Velocity::new(0.0, 0.0, -1.0),
        }
    }

    /// Velocity for this direction scaled by `magnitude` in `[0.0, 1.0]`.
    ///
    /// Out-of-range magnitudes are clamped rather than rejected; a slider at
    /// 1.02 should move the camera, not produce an error.
    pub fn velocity(self, magnitude: f32) -> Velocity {
        self.unit_velocity().scaled(magnitude.clamp(0.0, 1.0))
    }
}
