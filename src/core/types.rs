use glam::{Affine2, Mat2, Vec2};
use serde::{Deserialize, Serialize};

/// Position, rotation (radians, counter-clockwise) and non-uniform scale of an entity.
///
/// Transforms are supplied by the owning entity layer once per tick; a chain of
/// parent transforms collapses into a global one with [`Transform::global`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn from_position_rotation(position: Vec2, rotation: f32) -> Self {
        Self {
            position,
            rotation,
            ..Self::default()
        }
    }

    /// Builds the affine matrix: scale, then rotate, then translate.
    pub fn to_affine(&self) -> Affine2 {
        Affine2::from_scale_angle_translation(self.scale, self.rotation, self.position)
    }

    /// Maps a local point into world space.
    pub fn apply(&self, local: Vec2) -> Vec2 {
        self.position + self.rotate_vector(local * self.scale)
    }

    /// Maps a world point into local space. Zero scale components map to zero.
    pub fn apply_inverse(&self, world: Vec2) -> Vec2 {
        let unrotated = self.inverse_rotate_vector(world - self.position);
        Vec2::new(
            safe_div(unrotated.x, self.scale.x),
            safe_div(unrotated.y, self.scale.y),
        )
    }

    pub fn rotate_vector(&self, v: Vec2) -> Vec2 {
        Mat2::from_angle(self.rotation) * v
    }

    pub fn inverse_rotate_vector(&self, v: Vec2) -> Vec2 {
        Mat2::from_angle(-self.rotation) * v
    }

    /// Applies `child` on top of `self`, returning the composition.
    pub fn combine(&self, child: &Transform) -> Transform {
        Transform {
            position: self.apply(child.position),
            rotation: self.rotation + child.rotation,
            scale: self.scale * child.scale,
        }
    }

    /// Collapses a root-first chain of transforms into one global transform.
    pub fn global(chain: &[Transform]) -> Transform {
        chain
            .iter()
            .fold(Transform::default(), |parent, child| parent.combine(child))
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }
}

fn safe_div(value: f32, divisor: f32) -> f32 {
    if divisor.abs() <= f32::EPSILON {
        0.0
    } else {
        value / divisor
    }
}

/// Linear and angular velocity of a rigid body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub linear: Vec2,
    pub angular: f32,
}

impl Velocity {
    /// Velocity of the material point at offset `r` from the center of mass.
    pub fn at_point(&self, r: Vec2) -> Vec2 {
        self.linear + crate::utils::math::cross_scalar_vec(self.angular, r)
    }
}
