//! Forward and inverse kinematics of the three-arm parallel linkage.
//!
//! Frame: origin at the base center, `z` growing toward the effector. Arm 0
//! reaches along -y; arms 1 and 2 are the same arm rotated by +120° and -120°
//! about z. A joint angle of 0 means the upper arm is horizontal; positive
//! angles lift the elbow above the base plane and draw the effector up.
//!
//! Every solver works in the shifted frame `z0 = z + z_offset`; public
//! functions take and return the unshifted `z`.

mod forward;
mod inverse;

pub use forward::ForwardKinematics;
pub use inverse::{InverseKinematics, NEWTON_INITIAL_RAD, NEWTON_MAX_ITER, NEWTON_TOLERANCE};

/// Attachment angle of each arm about the z axis, in the rotation sense used
/// to bring a point into that arm's frame.
pub(crate) const ARM_ROTATION_DEG: [f64; 3] = [0.0, 120.0, -120.0];

/// Rotate `(x, y)` into the frame of the arm at `rotation_deg`.
#[inline]
pub(crate) fn to_arm_frame(x: f64, y: f64, rotation_deg: f64) -> (f64, f64) {
    let (s, c) = rotation_deg.to_radians().sin_cos();
    (x * c + y * s, y * c - x * s)
}
