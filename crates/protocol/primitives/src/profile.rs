//! Mining hardware reference data.

use serde::{Deserialize, Serialize};

/// Rated characteristics of one mining machine model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareProfile {
    /// Stable identifier, e.g. `s21_pro`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Rated hash rate in H/s.
    pub hash_rate: f64,
    /// Rated power draw in watts.
    pub power_watts: f64,
}

impl HardwareProfile {
    /// Creates a new [`HardwareProfile`].
    pub fn new(id: impl Into<String>, name: impl Into<String>, hash_rate: f64, power_watts: f64) -> Self {
        Self { id: id.into(), name: name.into(), hash_rate, power_watts }
    }
}

/// The profiles a fresh store is seeded with.
pub fn default_hardware_profiles() -> Vec<HardwareProfile> {
    const TERA: f64 = 1_000_000_000_000.0;
    vec![
        HardwareProfile::new("s23_hyd", "Antminer S23 Hyd", 580.0 * TERA, 5510.0),
        HardwareProfile::new("s21_pro", "Antminer S21 Pro", 234.0 * TERA, 3510.0),
        HardwareProfile::new("s19j_xp", "Antminer S19j XP", 151.0 * TERA, 3247.0),
    ]
}
