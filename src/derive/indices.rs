//! Agronomic indices computed from one day of canonical weather.

use serde::{Deserialize, Serialize};

/// Fixed constants of the agronomic indices.
///
/// The defaults are the reference values; overriding them is supported but changes
/// comparability with historical summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Daily precipitation strictly above this counts as an extreme day [mm].
    pub extreme_precipitation_mm: f64,
    /// Tmax at or above this counts as an extreme day [°C].
    pub extreme_temperature_c: f64,
    /// Hargreaves radiation adjustment coefficient `kRs`.
    pub krs: f64,
    pub gdu_base_c: f64,
    pub gdu_ceiling_c: f64,
    pub chu_max_base_c: f64,
    pub chu_min_base_c: f64,
    /// Use the published quadratic CHU daytime term instead of the workflow's linear one.
    pub chu_quadratic: bool,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            extreme_precipitation_mm: 25.0,
            extreme_temperature_c: 30.0,
            krs: 0.17,
            gdu_base_c: 10.0,
            gdu_ceiling_c: 30.0,
            chu_max_base_c: 10.0,
            chu_min_base_c: 4.44,
            chu_quadratic: false,
        }
    }
}

/// Hargreaves–Samani reference evapotranspiration [mm/day].
///
/// Returns `None` when `tmax < tmin`; the caller turns that into a validity error.
pub fn hargreaves_et0(ra: f64, tmax: f64, tmin: f64, tmean: f64, krs: f64) -> Option<f64> {
    if tmax < tmin {
        return None;
    }
    Some(0.0135 * krs * (ra / 2.45) * (tmax - tmin).sqrt() * (tmean + 17.8))
}

/// Daytime CHU component `Ymax`.
///
/// The linear form `3.33·ΔT − 0.084·ΔT` is what the historical summaries were built
/// with; `quadratic` switches to `3.33·ΔT − 0.084·ΔT²`.
pub fn chu_max_component(tmax: f64, thresholds: &Thresholds) -> f64 {
    if tmax < thresholds.chu_max_base_c {
        return 0.0;
    }
    let delta = tmax - thresholds.chu_max_base_c;
    let penalty = if thresholds.chu_quadratic {
        delta * delta
    } else {
        delta
    };
    3.33 * delta - 0.084 * penalty
}

/// Night-time CHU component `Ymin`.
pub fn chu_min_component(tmin: f64, thresholds: &Thresholds) -> f64 {
    if tmin < thresholds.chu_min_base_c {
        return 0.0;
    }
    1.8 * (tmin - thresholds.chu_min_base_c)
}

/// Daily crop heat units `(Ymax + Ymin) / 2`.
pub fn crop_heat_units(tmax: f64, tmin: f64, thresholds: &Thresholds) -> f64 {
    (chu_max_component(tmax, thresholds) + chu_min_component(tmin, thresholds)) / 2.0
}

/// Daily growing-degree units with Tmin raised to the base and Tmax capped at the ceiling.
pub fn growing_degree_units(tmax: f64, tmin: f64, thresholds: &Thresholds) -> f64 {
    let tmin = tmin.max(thresholds.gdu_base_c);
    let tmax = tmax.min(thresholds.gdu_ceiling_c);
    (tmin + tmax) / 2.0 - thresholds.gdu_base_c
}

pub fn extreme_precipitation(precipitation: f64, thresholds: &Thresholds) -> u8 {
    u8::from(precipitation > thresholds.extreme_precipitation_mm)
}

pub fn extreme_temperature(tmax: f64, thresholds: &Thresholds) -> u8 {
    u8::from(tmax >= thresholds.extreme_temperature_c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn et0_matches_hargreaves_by_hand() {
        let et0 = hargreaves_et0(43.910_735, 28.0, 16.0, 22.0, 0.17).unwrap();
        assert!((et0 - 5.671_018).abs() < 1e-5, "got {et0}");
    }

    #[test]
    fn et0_undefined_for_inverted_temperatures() {
        assert!(hargreaves_et0(40.0, 10.0, 12.0, 11.0, 0.17).is_none());
        // equal extremes are defined and give zero
        assert_eq!(hargreaves_et0(40.0, 12.0, 12.0, 12.0, 0.17), Some(0.0));
    }

    #[test]
    fn chu_keeps_linear_daytime_term_by_default() {
        let t = Thresholds::default();
        // 3.33*18 - 0.084*18
        assert!((chu_max_component(28.0, &t) - 58.428).abs() < 1e-9);
        assert_eq!(chu_max_component(9.9, &t), 0.0);
        assert!((chu_min_component(16.0, &t) - 20.808).abs() < 1e-9);
        assert_eq!(chu_min_component(4.0, &t), 0.0);
        assert!((crop_heat_units(28.0, 16.0, &t) - 39.618).abs() < 1e-9);
    }

    #[test]
    fn chu_quadratic_variant_is_opt_in() {
        let t = Thresholds {
            chu_quadratic: true,
            ..Thresholds::default()
        };
        // 3.33*18 - 0.084*324
        assert!((chu_max_component(28.0, &t) - 32.724).abs() < 1e-9);
    }

    #[test]
    fn gdu_clamps_floor_and_ceiling() {
        let t = Thresholds::default();
        assert_eq!(growing_degree_units(28.0, 16.0, &t), 12.0);
        assert_eq!(growing_degree_units(35.0, 5.0, &t), 10.0);
        assert_eq!(growing_degree_units(12.0, 8.0, &t), 1.0);
    }

    #[test]
    fn extreme_flags_use_strict_and_inclusive_bounds() {
        let t = Thresholds::default();
        assert_eq!(extreme_precipitation(25.0, &t), 0);
        assert_eq!(extreme_precipitation(25.1, &t), 1);
        assert_eq!(extreme_temperature(29.9, &t), 0);
        assert_eq!(extreme_temperature(30.0, &t), 1);
    }
}
