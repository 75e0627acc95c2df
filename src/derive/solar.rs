//! Solar geometry for daily time steps (FAO-56 conventions, 365-day year).

use std::f64::consts::PI;

/// Solar constant Gsc [MJ m⁻² min⁻¹].
pub const SOLAR_CONSTANT: f64 = 0.0820;

/// Inverse relative Earth–Sun distance `dr`.
pub fn inverse_relative_distance(day_of_year: u32) -> f64 {
    1.0 + 0.033 * (2.0 * PI * f64::from(day_of_year) / 365.0).cos()
}

/// Solar declination `δ` [rad].
pub fn solar_declination(day_of_year: u32) -> f64 {
    0.409 * (2.0 * PI * f64::from(day_of_year) / 365.0 - 1.39).sin()
}

/// Sunset hour angle `ωs` [rad].
///
/// The `acos` argument is clamped to `[-1, 1]` so that polar day (`π`) and polar
/// night (`0`) stay finite.
pub fn sunset_hour_angle(latitude_rad: f64, declination: f64) -> f64 {
    (-latitude_rad.tan() * declination.tan())
        .clamp(-1.0, 1.0)
        .acos()
}

/// Extraterrestrial radiation `Ra` [MJ m⁻² day⁻¹].
///
/// Follows the agronomy workflow's form, whose second term is `cos(φ)·sin(ωs)`
/// without the `cos(δ)` factor of FAO-56 eq. 21.
pub fn extraterrestrial_radiation(latitude_rad: f64, day_of_year: u32) -> f64 {
    let dr = inverse_relative_distance(day_of_year);
    let declination = solar_declination(day_of_year);
    let ws = sunset_hour_angle(latitude_rad, declination);
    (1440.0 / PI)
        * SOLAR_CONSTANT
        * dr
        * (ws * latitude_rad.sin() * declination.sin() + latitude_rad.cos() * ws.sin())
}

/// Daylight hours `N = 24 ωs / π`.
pub fn day_length(latitude_rad: f64, day_of_year: u32) -> f64 {
    let ws = sunset_hour_angle(latitude_rad, solar_declination(day_of_year));
    24.0 * ws / PI
}

/// Saturation vapour pressure `e°(T)` [kPa] at air temperature `t` [°C].
pub fn saturation_vapor_pressure(t: f64) -> f64 {
    0.6108 * (17.27 * t / (t + 237.3)).exp()
}
