//! Angle helpers shared by the solvers and the calibration table.

pub const SQRT_3: f64 = 1.732_050_807_568_877_2;
/// tan(30°)
pub const TAN_30: f64 = 1.0 / SQRT_3;

/// Map an angle in degrees into `(-180, 180]`.
///
/// The angle is first reduced into `[0, 360)`; anything strictly above 180
/// then has 360 subtracted. So `180` stays `180` and `180 + e` becomes
/// `-180 + e`. Non-finite input is returned unchanged.
#[inline]
pub fn unwrap_deg(angle: f64) -> f64 {
    if !angle.is_finite() || (angle > -180.0 && angle <= 180.0) {
        return angle;
    }
    let a = angle.rem_euclid(360.0);
    if a > 180.0 { a - 360.0 } else { a }
}
