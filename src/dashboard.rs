//! ==============================================================================
//! dashboard.rs - snapshot to widget model mapping
//! ==============================================================================
//!
//! purpose:
//!     maps a snapshot view plus the session control state into the fixed
//!     widget set of the dashboard: metric cards, the 0-1023 gauge, the
//!     time-series charts, the voltage bars, the status pie, and the
//!     pump/generator indicators. the model is plain serde data; the page
//!     fetches it as json and draws it with chart.js.
//!
//! simulated history:
//!     the system keeps no reading history, so the temperature, humidity,
//!     and fuel charts are populated with a fixed-length window of simulated
//!     points around the current reading, regenerated on every render cycle.
//!     the generator is seeded from the render timestamp, which keeps a
//!     single render reproducible under test.
//!
//! relationships:
//!     - used by: main.rs (GET /api/dashboard)
//!     - consumes: source.rs (SnapshotView), domain.rs (ControlState)
//!     - drawn by: page.rs
//!
//! ==============================================================================

use crate::domain::{ControlState, DisplayMode, SensorSnapshot};
use crate::source::SnapshotView;

use serde::Serialize;

/// gauge axis range (10-bit ADC)
pub const GAUGE_MIN: f64 = 0.0;
pub const GAUGE_MAX: f64 = 1023.0;
/// midpoint reference the gauge delta is measured against
pub const GAUGE_REFERENCE: f64 = 512.0;
/// red threshold marker, fixed regardless of the current value
pub const GAUGE_THRESHOLD: f64 = 900.0;

/// points per simulated time-series window, one per minute
pub const SERIES_POINTS: usize = 60;

/// fixed category order of the voltage bar chart
pub const VOLTAGE_LABELS: [&str; 4] = ["Voltage 1", "Voltage 2", "Voltage 3", "Voltage 4"];

#[derive(Clone, Debug, Serialize)]
pub struct DashboardModel {
    pub generated_at_ms: u64,
    /// page redraw interval, handed to the browser timer
    pub refresh_ms: u64,
    pub data_available: bool,
    /// snapshot is older than the cache ttl
    pub stale: bool,
    /// why no fresh data could be fetched, when known
    pub error: Option<String>,
    pub metrics: Vec<MetricCard>,
    pub gauge: Option<GaugeModel>,
    pub temperature_chart: Option<SeriesModel>,
    pub humidity_chart: Option<SeriesModel>,
    pub voltage_chart: Option<BarModel>,
    pub status_chart: Option<PieModel>,
    pub fuel_chart: Option<SeriesModel>,
    pub switches: SwitchPanel,
    pub feature_banner: Option<String>,
    /// current session controls, echoed so the page can position its widgets
    pub controls: ControlState,
    pub display_mode: DisplayMode,
    pub preview: Vec<SensorSnapshot>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MetricCard {
    pub label: String,
    pub value: String,
    pub delta: Option<MetricDelta>,
}

/// reference value shown next to a metric; inverse flips the coloring
#[derive(Clone, Debug, Serialize)]
pub struct MetricDelta {
    pub reference: String,
    pub inverse: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct GaugeModel {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub reference: f64,
    /// value minus reference
    pub delta: f64,
    pub threshold: f64,
    pub band: GaugeBand,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GaugeBand {
    Normal,
    Elevated,
}

#[derive(Clone, Debug, Serialize)]
pub struct SeriesModel {
    pub label: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct BarModel {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PieModel {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// display-only on/off indicators; no actuation path
#[derive(Clone, Debug, Serialize)]
pub struct SwitchPanel {
    pub pump: &'static str,
    pub generator: &'static str,
}

/// band the gauge value falls into: normal up to and including the
/// reference midpoint, elevated above it
pub fn band_for(value: f64) -> GaugeBand {
    if value <= GAUGE_REFERENCE {
        GaugeBand::Normal
    } else {
        GaugeBand::Elevated
    }
}

/// display string for a toggle
pub fn switch_label(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}

/// build the full widget model for one render cycle
///
/// `view` is the latest snapshot (fresh or retained-stale) or None when no
/// read has ever succeeded; `error` carries the reader failure, if any.
pub fn build_model(
    view: Option<&SnapshotView>,
    error: Option<String>,
    controls: &ControlState,
    refresh_ms: u64,
    now_ms: u64,
) -> DashboardModel {
    let mut rng = TinyRng::new(now_ms);

    let mut model = DashboardModel {
        generated_at_ms: now_ms,
        refresh_ms,
        data_available: view.is_some(),
        stale: view.map(|v| v.stale).unwrap_or(false),
        error,
        metrics: Vec::new(),
        gauge: None,
        temperature_chart: None,
        humidity_chart: None,
        voltage_chart: None,
        status_chart: None,
        fuel_chart: None,
        switches: SwitchPanel {
            pump: switch_label(controls.pump_on),
            generator: switch_label(controls.generator_on),
        },
        feature_banner: controls.feature_on.then(|| "Feature activated!".to_string()),
        controls: *controls,
        display_mode: controls.display_mode,
        preview: Vec::new(),
    };

    let Some(view) = view else {
        return model;
    };
    let snapshot = &view.snapshot;

    model.metrics = build_metrics(snapshot);
    model.gauge = Some(GaugeModel {
        value: snapshot.gauge_value,
        min: GAUGE_MIN,
        max: GAUGE_MAX,
        reference: GAUGE_REFERENCE,
        delta: snapshot.gauge_value - GAUGE_REFERENCE,
        threshold: GAUGE_THRESHOLD,
        band: band_for(snapshot.gauge_value),
    });
    model.temperature_chart = Some(simulated_series(
        "Temperature (°C)",
        snapshot.temperature,
        5.0,
        now_ms,
        &mut rng,
    ));
    model.humidity_chart = Some(simulated_series(
        "Humidity (%)",
        snapshot.humidity,
        10.0,
        now_ms,
        &mut rng,
    ));
    model.voltage_chart = Some(BarModel {
        labels: VOLTAGE_LABELS.iter().map(|l| l.to_string()).collect(),
        values: snapshot.voltages.to_vec(),
    });
    model.status_chart = Some(PieModel {
        labels: vec![snapshot.site_status.label().to_string()],
        values: vec![1.0],
    });
    model.fuel_chart = Some(simulated_fuel_series(snapshot.fuel_level, now_ms, &mut rng));
    model.preview = view.preview.clone();

    model
}

fn build_metrics(snapshot: &SensorSnapshot) -> Vec<MetricCard> {
    vec![
        MetricCard {
            label: "Last Reading Time".to_string(),
            value: snapshot.last_reading_time.clone(),
            delta: None,
        },
        MetricCard {
            label: "Site Status".to_string(),
            value: snapshot.site_status.label().to_string(),
            delta: Some(MetricDelta {
                reference: "Active".to_string(),
                inverse: true,
            }),
        },
        MetricCard {
            label: "Temperature".to_string(),
            value: format!("{} °C", fmt_number(snapshot.temperature)),
            delta: None,
        },
        MetricCard {
            label: "Humidity".to_string(),
            value: format!("{} %", fmt_number(snapshot.humidity)),
            delta: None,
        },
        MetricCard {
            label: "Main Voltage 3".to_string(),
            value: format!("{} V", fmt_number(snapshot.voltages[2])),
            delta: None,
        },
        MetricCard {
            label: "Main Voltage 4".to_string(),
            value: format!("{} V", fmt_number(snapshot.voltages[3])),
            delta: None,
        },
        MetricCard {
            label: "Door Status".to_string(),
            value: snapshot.door_status.label().to_string(),
            delta: Some(MetricDelta {
                reference: "Closed".to_string(),
                inverse: true,
            }),
        },
        MetricCard {
            label: "Generator Fuel Level".to_string(),
            value: format!("{} %", fmt_number(snapshot.fuel_level)),
            delta: None,
        },
    ]
}

/// whole readings print without a decimal point ("28 °C", not "28.0 °C")
fn fmt_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

// ==============================================================================
// simulated series
// ==============================================================================

/// minute-spaced window ending at `now_ms`, normal-ish noise around `mean`
fn simulated_series(
    label: &str,
    mean: f64,
    sigma: f64,
    now_ms: u64,
    rng: &mut TinyRng,
) -> SeriesModel {
    let (labels, values) = series_window(now_ms, |rng| rng.normal(mean, sigma), rng);
    SeriesModel {
        label: label.to_string(),
        labels,
        values,
    }
}

/// fuel trend wanders uniformly within ±5 of the current level
fn simulated_fuel_series(level: f64, now_ms: u64, rng: &mut TinyRng) -> SeriesModel {
    let (labels, values) = series_window(now_ms, |rng| rng.uniform(level - 5.0, level + 5.0), rng);
    SeriesModel {
        label: "Fuel Level (%)".to_string(),
        labels,
        values,
    }
}

fn series_window(
    now_ms: u64,
    mut sample: impl FnMut(&mut TinyRng) -> f64,
    rng: &mut TinyRng,
) -> (Vec<String>, Vec<f64>) {
    let mut labels = Vec::with_capacity(SERIES_POINTS);
    let mut values = Vec::with_capacity(SERIES_POINTS);
    for i in 0..SERIES_POINTS {
        let point_ms = now_ms.saturating_sub((SERIES_POINTS - 1 - i) as u64 * 60_000);
        labels.push(minute_label(point_ms));
        values.push(sample(rng));
    }
    (labels, values)
}

/// HH:MM (utc) for a unix-ms timestamp
fn minute_label(ms: u64) -> String {
    let minutes = (ms / 60_000) % (24 * 60);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// xorshift64* generator for illustrative chart noise.
///
/// not a statistics-grade source; `normal` is an Irwin-Hall sum, which
/// bounds every sample to mean ± 6 sigma.
struct TinyRng(u64);

impl TinyRng {
    fn new(seed: u64) -> Self {
        // xorshift state must be non-zero
        Self(seed | 1)
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// uniform in [0, 1)
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn normal(&mut self, mean: f64, sigma: f64) -> f64 {
        let z: f64 = (0..12).map(|_| self.next_f64()).sum::<f64>() - 6.0;
        mean + sigma * z
    }
}

// ==============================================================================
// tests
// ==============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ControlUpdate, DoorStatus, SiteStatus};

    fn sample_snapshot() -> SensorSnapshot {
        SensorSnapshot {
            last_reading_time: "14:55:45".to_string(),
            site_status: SiteStatus::Active,
            voltages: [230.0, 232.0, 231.0, 229.0],
            door_status: DoorStatus::Closed,
            fuel_level: 75.0,
            gauge_value: 500.0,
            temperature: 28.0,
            humidity: 48.0,
            soil_moisture: 66.0,
        }
    }

    fn sample_view() -> SnapshotView {
        SnapshotView {
            snapshot: sample_snapshot(),
            preview: vec![sample_snapshot()],
            fetched_at_ms: 1_700_000_000_000,
            stale: false,
        }
    }

    fn metric<'a>(model: &'a DashboardModel, label: &str) -> &'a MetricCard {
        model
            .metrics
            .iter()
            .find(|m| m.label == label)
            .unwrap_or_else(|| panic!("missing metric card '{label}'"))
    }

    #[test]
    fn gauge_band_splits_at_the_reference() {
        assert_eq!(band_for(0.0), GaugeBand::Normal);
        assert_eq!(band_for(512.0), GaugeBand::Normal);
        assert_eq!(band_for(512.5), GaugeBand::Elevated);
        assert_eq!(band_for(1023.0), GaugeBand::Elevated);
    }

    #[test]
    fn gauge_threshold_is_fixed_regardless_of_value() {
        for value in [0.0, 100.0, 512.0, 900.0, 1023.0] {
            let mut view = sample_view();
            view.snapshot.gauge_value = value;
            let model = build_model(
                Some(&view),
                None,
                &ControlState::default(),
                60_000,
                1_700_000_000_000,
            );
            let gauge = model.gauge.unwrap();
            assert_eq!(gauge.threshold, 900.0);
            assert_eq!(gauge.delta, value - 512.0);
        }
    }

    #[test]
    fn voltage_chart_has_exactly_four_fixed_categories() {
        let view = sample_view();
        let model = build_model(
            Some(&view),
            None,
            &ControlState::default(),
            60_000,
            1_700_000_000_000,
        );
        let bars = model.voltage_chart.unwrap();
        assert_eq!(
            bars.labels,
            vec!["Voltage 1", "Voltage 2", "Voltage 3", "Voltage 4"]
        );
        assert_eq!(bars.values, vec![230.0, 232.0, 231.0, 229.0]);
    }

    #[test]
    fn switch_labels_are_exactly_on_and_off() {
        assert_eq!(switch_label(true), "ON");
        assert_eq!(switch_label(false), "OFF");

        let mut controls = ControlState::default();
        controls.apply(ControlUpdate {
            pump_on: Some(true),
            ..Default::default()
        });
        let model = build_model(None, None, &controls, 60_000, 0);
        assert_eq!(model.switches.pump, "ON");
        assert_eq!(model.switches.generator, "OFF");
    }

    #[test]
    fn temperature_and_humidity_render_with_units() {
        let view = sample_view();
        let model = build_model(
            Some(&view),
            None,
            &ControlState::default(),
            60_000,
            1_700_000_000_000,
        );
        assert_eq!(metric(&model, "Temperature").value, "28 °C");
        assert_eq!(metric(&model, "Humidity").value, "48 %");
        assert_eq!(metric(&model, "Main Voltage 3").value, "231 V");
        assert_eq!(metric(&model, "Generator Fuel Level").value, "75 %");
    }

    #[test]
    fn status_metrics_carry_inverse_deltas() {
        let view = sample_view();
        let model = build_model(
            Some(&view),
            None,
            &ControlState::default(),
            60_000,
            1_700_000_000_000,
        );
        let site = metric(&model, "Site Status").delta.as_ref().unwrap();
        assert_eq!(site.reference, "Active");
        assert!(site.inverse);
        let door = metric(&model, "Door Status").delta.as_ref().unwrap();
        assert_eq!(door.reference, "Closed");
        assert!(door.inverse);
    }

    #[test]
    fn status_pie_is_a_single_slice() {
        let view = sample_view();
        let model = build_model(
            Some(&view),
            None,
            &ControlState::default(),
            60_000,
            1_700_000_000_000,
        );
        let pie = model.status_chart.unwrap();
        assert_eq!(pie.labels, vec!["Active"]);
        assert_eq!(pie.values, vec![1.0]);
    }

    #[test]
    fn simulated_series_have_sixty_bounded_points() {
        let view = sample_view();
        let model = build_model(
            Some(&view),
            None,
            &ControlState::default(),
            60_000,
            1_700_000_000_000,
        );

        let temp = model.temperature_chart.unwrap();
        assert_eq!(temp.labels.len(), SERIES_POINTS);
        assert_eq!(temp.values.len(), SERIES_POINTS);
        // Irwin-Hall bounds every sample to mean ± 6 sigma
        assert!(temp.values.iter().all(|v| (*v - 28.0).abs() <= 30.0));

        let fuel = model.fuel_chart.unwrap();
        assert_eq!(fuel.values.len(), SERIES_POINTS);
        assert!(fuel.values.iter().all(|v| (70.0..=80.0).contains(v)));
    }

    #[test]
    fn series_are_reproducible_for_a_fixed_render_instant() {
        let view = sample_view();
        let controls = ControlState::default();
        let a = build_model(Some(&view), None, &controls, 60_000, 1_700_000_000_000);
        let b = build_model(Some(&view), None, &controls, 60_000, 1_700_000_000_000);
        let c = build_model(Some(&view), None, &controls, 60_000, 1_700_000_060_000);

        assert_eq!(
            a.temperature_chart.as_ref().unwrap().values,
            b.temperature_chart.as_ref().unwrap().values
        );
        assert_ne!(
            a.temperature_chart.unwrap().values,
            c.temperature_chart.unwrap().values
        );
    }

    #[test]
    fn missing_data_renders_an_explicit_empty_state() {
        let model = build_model(
            None,
            Some("failed to read data/readings.csv".to_string()),
            &ControlState::default(),
            60_000,
            0,
        );
        assert!(!model.data_available);
        assert!(!model.stale);
        assert!(model.metrics.is_empty());
        assert!(model.gauge.is_none());
        assert!(model.temperature_chart.is_none());
        assert!(model.error.is_some());
        // the control indicators still render without data
        assert_eq!(model.switches.pump, "OFF");
    }

    #[test]
    fn stale_view_is_flagged_in_the_model() {
        let mut view = sample_view();
        view.stale = true;
        let model = build_model(
            Some(&view),
            None,
            &ControlState::default(),
            60_000,
            1_700_000_000_000,
        );
        assert!(model.stale);
        assert!(model.data_available);
        assert!(model.gauge.is_some());
    }

    #[test]
    fn feature_flag_surfaces_its_banner() {
        let mut controls = ControlState::default();
        controls.apply(ControlUpdate {
            feature_on: Some(true),
            ..Default::default()
        });
        let model = build_model(None, None, &controls, 60_000, 0);
        assert_eq!(model.feature_banner.as_deref(), Some("Feature activated!"));
    }

    #[test]
    fn fractional_readings_keep_their_decimals() {
        assert_eq!(fmt_number(28.0), "28");
        assert_eq!(fmt_number(28.5), "28.5");
        assert_eq!(fmt_number(0.0), "0");
    }
}
