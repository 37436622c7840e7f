use serde::{Deserialize, Serialize};

/// Slider upper bound for the pump run duration. Out-of-range updates are
/// clamped here, never rejected.
pub const PUMP_SECONDS_MAX: u32 = 60;

/// one complete set of sensor readings at a point in time
///
/// recreated on every read of the data file; no identity persists across
/// reads and no history is retained (chart history is simulated separately).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    /// last reading timestamp, as stored in the file (e.g. "14:55:45")
    pub last_reading_time: String,
    pub site_status: SiteStatus,
    /// the four mains voltage readings, in file column order 1..4
    pub voltages: [f64; 4],
    pub door_status: DoorStatus,
    /// generator fuel level (percent)
    pub fuel_level: f64,
    /// auxiliary gauge value (0-1023 ADC range)
    pub gauge_value: f64,
    /// temperature in celsius
    pub temperature: f64,
    /// relative humidity (percent)
    pub humidity: f64,
    /// soil moisture (percent)
    pub soil_moisture: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteStatus {
    Active,
    Inactive,
}

impl SiteStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }

    /// parse a status cell, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorStatus {
    Open,
    Closed,
}

impl DoorStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// how chart values are presented; currently presentation-only
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayMode {
    Normalized,
    Absolute,
}

/// user-set controls for the dashboard session
///
/// owned by the server session and mutated only through POST /api/controls.
/// none of these feed back into the sensor data; changes are forwarded to
/// the ControlBackend seam, which is a logging no-op today.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ControlState {
    pub pump_on: bool,
    pub generator_on: bool,
    pub feature_on: bool,
    /// pump run duration slider, clamped to 0..=PUMP_SECONDS_MAX
    pub pump_seconds: u32,
    pub display_mode: DisplayMode,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            pump_on: false,
            generator_on: false,
            feature_on: false,
            pump_seconds: 0,
            display_mode: DisplayMode::Normalized,
        }
    }
}

/// partial control update, as posted by the page
///
/// fields left out of the request body are left unchanged.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct ControlUpdate {
    pub pump_on: Option<bool>,
    pub generator_on: Option<bool>,
    pub feature_on: Option<bool>,
    pub pump_seconds: Option<u32>,
    pub display_mode: Option<DisplayMode>,
}

impl ControlState {
    /// merge a partial update into the session state
    pub fn apply(&mut self, update: ControlUpdate) {
        if let Some(on) = update.pump_on {
            self.pump_on = on;
        }
        if let Some(on) = update.generator_on {
            self.generator_on = on;
        }
        if let Some(on) = update.feature_on {
            self.feature_on = on;
        }
        if let Some(seconds) = update.pump_seconds {
            self.pump_seconds = seconds.min(PUMP_SECONDS_MAX);
        }
        if let Some(mode) = update.display_mode {
            self.display_mode = mode;
        }
    }
}

// ==============================================================================
// tests
// ==============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!(SiteStatus::parse(" ACTIVE "), Some(SiteStatus::Active));
        assert_eq!(SiteStatus::parse("inactive"), Some(SiteStatus::Inactive));
        assert_eq!(SiteStatus::parse("unknown"), None);
        assert_eq!(DoorStatus::parse("Closed"), Some(DoorStatus::Closed));
        assert_eq!(DoorStatus::parse("open"), Some(DoorStatus::Open));
        assert_eq!(DoorStatus::parse(""), None);
    }

    #[test]
    fn pump_seconds_clamps_to_slider_range() {
        let mut controls = ControlState::default();
        controls.apply(ControlUpdate {
            pump_seconds: Some(61),
            ..Default::default()
        });
        assert_eq!(controls.pump_seconds, PUMP_SECONDS_MAX);

        controls.apply(ControlUpdate {
            pump_seconds: Some(45),
            ..Default::default()
        });
        assert_eq!(controls.pump_seconds, 45);
    }

    #[test]
    fn partial_update_leaves_other_fields_alone() {
        let mut controls = ControlState::default();
        controls.apply(ControlUpdate {
            pump_on: Some(true),
            ..Default::default()
        });
        assert!(controls.pump_on);
        assert!(!controls.generator_on);
        assert_eq!(controls.display_mode, DisplayMode::Normalized);

        controls.apply(ControlUpdate {
            display_mode: Some(DisplayMode::Absolute),
            ..Default::default()
        });
        assert!(controls.pump_on);
        assert_eq!(controls.display_mode, DisplayMode::Absolute);
    }
}
