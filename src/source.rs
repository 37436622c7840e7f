//! ==============================================================================
//! source.rs - csv snapshot reader with ttl cache
//! ==============================================================================
//!
//! purpose:
//!     reads the latest row of the csv sensor feed into a SensorSnapshot,
//!     behind a ttl cache: a read within the ttl window returns the
//!     previously fetched snapshot unchanged, a read after expiry re-reads
//!     the file in full.
//!
//! failure contract:
//!     a missing, unreadable, or malformed file fails with DataUnavailable.
//!     the cached snapshot is retained across failures; last_known() exposes
//!     it with a staleness flag (snapshot older than the ttl) so the caller
//!     can render stale data or an explicit no-data state. the render loop
//!     never crashes on a bad feed.
//!
//! relationships:
//!     - used by: main.rs (background refresh task and dashboard handlers)
//!     - produces: domain.rs types
//!
//! ==============================================================================

use crate::domain::{DoorStatus, SensorSnapshot, SiteStatus};

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// how many leading data rows are kept as the raw preview table
pub const PREVIEW_ROWS: usize = 5;

/// the sensor feed could not produce a snapshot
#[derive(Debug, Error)]
pub enum DataUnavailable {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("missing expected column '{0}'")]
    MissingColumn(&'static str),
    #[error("bad value '{value}' in column '{column}'")]
    BadValue {
        column: &'static str,
        value: String,
    },
    #[error("no data rows in {0}")]
    NoRows(PathBuf),
}

/// a snapshot as handed to the presentation layer
#[derive(Clone, Debug, Serialize)]
pub struct SnapshotView {
    pub snapshot: SensorSnapshot,
    /// head of the file (up to PREVIEW_ROWS rows), for the raw preview table
    pub preview: Vec<SensorSnapshot>,
    /// unix timestamp (ms) when the snapshot was fetched from the file
    pub fetched_at_ms: u64,
    /// snapshot is older than the cache ttl (a refresh failed or was skipped)
    pub stale: bool,
}

struct CachedSnapshot {
    snapshot: SensorSnapshot,
    preview: Vec<SensorSnapshot>,
    fetched_at: Instant,
    fetched_at_ms: u64,
}

impl CachedSnapshot {
    fn view(&self, ttl: Duration) -> SnapshotView {
        SnapshotView {
            snapshot: self.snapshot.clone(),
            preview: self.preview.clone(),
            fetched_at_ms: self.fetched_at_ms,
            stale: self.fetched_at.elapsed() > ttl,
        }
    }
}

/// file-backed snapshot source with a ttl cache
///
/// single-reader by contract; shared behind a mutex by the server.
pub struct SnapshotSource {
    path: PathBuf,
    ttl: Duration,
    cached: Option<CachedSnapshot>,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
            cached: None,
        }
    }

    /// return the cached snapshot while it is fresh, otherwise re-read the
    /// file. on failure the previous cache entry is left untouched.
    pub fn read_latest(&mut self) -> Result<SnapshotView, DataUnavailable> {
        if let Some(cached) = &self.cached {
            if cached.fetched_at.elapsed() <= self.ttl {
                return Ok(cached.view(self.ttl));
            }
        }

        let (snapshot, preview) = load_file(&self.path)?;
        let cached = CachedSnapshot {
            snapshot,
            preview,
            fetched_at: Instant::now(),
            fetched_at_ms: unix_ms(),
        };
        let view = cached.view(self.ttl);
        self.cached = Some(cached);
        Ok(view)
    }

    /// last-known-good snapshot, if any read has ever succeeded.
    /// the view's stale flag reflects the snapshot's age against the ttl.
    pub fn last_known(&self) -> Option<SnapshotView> {
        self.cached.as_ref().map(|c| c.view(self.ttl))
    }
}

fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

// ==============================================================================
// csv parsing
// ==============================================================================
// the feed is a plain comma-separated file with a header row. columns are
// located by header name, so their order in the file is irrelevant. blank
// lines are skipped.

struct Columns {
    timestamp: usize,
    site_status: usize,
    voltages: [usize; 4],
    door_status: usize,
    fuel_level: usize,
    gauge_value: usize,
    temperature: usize,
    humidity: usize,
    soil_moisture: usize,
}

impl Columns {
    fn parse(header: &str) -> Result<Self, DataUnavailable> {
        let names: Vec<String> = header
            .split(',')
            .map(|c| c.trim().to_ascii_lowercase())
            .collect();
        let find = |name: &'static str| {
            names
                .iter()
                .position(|c| c == name)
                .ok_or(DataUnavailable::MissingColumn(name))
        };

        Ok(Self {
            timestamp: find("timestamp")?,
            site_status: find("site_status")?,
            voltages: [
                find("voltage_1")?,
                find("voltage_2")?,
                find("voltage_3")?,
                find("voltage_4")?,
            ],
            door_status: find("door_status")?,
            fuel_level: find("fuel_level")?,
            gauge_value: find("gauge_value")?,
            temperature: find("temperature")?,
            humidity: find("humidity")?,
            soil_moisture: find("soil_moisture")?,
        })
    }

    fn parse_row(&self, line: &str) -> Result<SensorSnapshot, DataUnavailable> {
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();

        let cell = |idx: usize, column: &'static str| {
            cells.get(idx).copied().ok_or(DataUnavailable::BadValue {
                column,
                value: "<missing cell>".to_string(),
            })
        };
        let number = |idx: usize, column: &'static str| {
            let raw = cell(idx, column)?;
            raw.parse::<f64>().map_err(|_| DataUnavailable::BadValue {
                column,
                value: raw.to_string(),
            })
        };

        let site_raw = cell(self.site_status, "site_status")?;
        let site_status =
            SiteStatus::parse(site_raw).ok_or_else(|| DataUnavailable::BadValue {
                column: "site_status",
                value: site_raw.to_string(),
            })?;
        let door_raw = cell(self.door_status, "door_status")?;
        let door_status =
            DoorStatus::parse(door_raw).ok_or_else(|| DataUnavailable::BadValue {
                column: "door_status",
                value: door_raw.to_string(),
            })?;

        Ok(SensorSnapshot {
            last_reading_time: cell(self.timestamp, "timestamp")?.to_string(),
            site_status,
            voltages: [
                number(self.voltages[0], "voltage_1")?,
                number(self.voltages[1], "voltage_2")?,
                number(self.voltages[2], "voltage_3")?,
                number(self.voltages[3], "voltage_4")?,
            ],
            door_status,
            fuel_level: number(self.fuel_level, "fuel_level")?,
            gauge_value: number(self.gauge_value, "gauge_value")?,
            temperature: number(self.temperature, "temperature")?,
            humidity: number(self.humidity, "humidity")?,
            soil_moisture: number(self.soil_moisture, "soil_moisture")?,
        })
    }
}

fn load_file(path: &Path) -> Result<(SensorSnapshot, Vec<SensorSnapshot>), DataUnavailable> {
    let content = std::fs::read_to_string(path).map_err(|e| DataUnavailable::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| DataUnavailable::NoRows(path.to_path_buf()))?;
    let columns = Columns::parse(header)?;

    let rows: Vec<&str> = lines.collect();
    let last = rows
        .last()
        .ok_or_else(|| DataUnavailable::NoRows(path.to_path_buf()))?;

    let snapshot = columns.parse_row(last)?;
    let preview = rows
        .iter()
        .take(PREVIEW_ROWS)
        .map(|row| columns.parse_row(row))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((snapshot, preview))
}

// ==============================================================================
// tests
// ==============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "timestamp,site_status,voltage_1,voltage_2,voltage_3,voltage_4,door_status,fuel_level,gauge_value,temperature,humidity,soil_moisture";
    const ROW: &str = "14:55:45,Active,230,232,231,229,Closed,75,500,28,48,66";

    fn temp_csv(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "sitemon-source-{}-{}.csv",
            std::process::id(),
            name
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn parses_latest_row() {
        let path = temp_csv(
            "latest",
            &format!("{HEADER}\n13:00:00,Inactive,210,211,212,213,Open,50,100,20,40,30\n{ROW}\n"),
        );
        let mut source = SnapshotSource::new(&path, Duration::from_secs(60));

        let view = source.read_latest().unwrap();
        assert_eq!(view.snapshot.last_reading_time, "14:55:45");
        assert_eq!(view.snapshot.site_status, SiteStatus::Active);
        assert_eq!(view.snapshot.voltages, [230.0, 232.0, 231.0, 229.0]);
        assert_eq!(view.snapshot.door_status, DoorStatus::Closed);
        assert_eq!(view.snapshot.fuel_level, 75.0);
        assert_eq!(view.snapshot.gauge_value, 500.0);
        assert_eq!(view.snapshot.temperature, 28.0);
        assert_eq!(view.snapshot.humidity, 48.0);
        assert_eq!(view.snapshot.soil_moisture, 66.0);
        assert_eq!(view.preview.len(), 2);
        assert!(!view.stale);
    }

    #[test]
    fn column_order_does_not_matter() {
        let path = temp_csv(
            "shuffled",
            "humidity,temperature,timestamp,site_status,door_status,fuel_level,gauge_value,soil_moisture,voltage_4,voltage_3,voltage_2,voltage_1\n\
             48,28,14:55:45,Active,Closed,75,500,66,229,231,232,230\n",
        );
        let mut source = SnapshotSource::new(&path, Duration::from_secs(60));

        let snapshot = source.read_latest().unwrap().snapshot;
        assert_eq!(snapshot.temperature, 28.0);
        assert_eq!(snapshot.humidity, 48.0);
        assert_eq!(snapshot.voltages, [230.0, 232.0, 231.0, 229.0]);
    }

    #[test]
    fn reads_within_ttl_return_the_cached_snapshot_unchanged() {
        let path = temp_csv("fresh", &format!("{HEADER}\n{ROW}\n"));
        let mut source = SnapshotSource::new(&path, Duration::from_secs(3600));

        let first = source.read_latest().unwrap();
        // the underlying file changes, but the cache is still fresh
        std::fs::write(
            &path,
            format!("{HEADER}\n15:00:00,Inactive,200,201,202,203,Open,10,900,35,20,10\n"),
        )
        .unwrap();
        let second = source.read_latest().unwrap();

        assert_eq!(first.snapshot, second.snapshot);
        assert_eq!(first.fetched_at_ms, second.fetched_at_ms);
    }

    #[test]
    fn expired_cache_picks_up_a_changed_file() {
        let path = temp_csv("expired", &format!("{HEADER}\n{ROW}\n"));
        let mut source = SnapshotSource::new(&path, Duration::ZERO);

        let first = source.read_latest().unwrap();
        assert_eq!(first.snapshot.temperature, 28.0);

        std::fs::write(
            &path,
            format!("{HEADER}\n15:00:00,Active,230,232,231,229,Closed,75,500,31,48,66\n"),
        )
        .unwrap();
        std::thread::sleep(Duration::from_millis(5));

        let second = source.read_latest().unwrap();
        assert_eq!(second.snapshot.temperature, 31.0);
        assert_eq!(second.snapshot.last_reading_time, "15:00:00");
    }

    #[test]
    fn deleted_file_keeps_last_known_snapshot_marked_stale() {
        let path = temp_csv("deleted", &format!("{HEADER}\n{ROW}\n"));
        let mut source = SnapshotSource::new(&path, Duration::ZERO);

        source.read_latest().unwrap();
        std::fs::remove_file(&path).unwrap();
        std::thread::sleep(Duration::from_millis(5));

        let err = source.read_latest().unwrap_err();
        assert!(matches!(err, DataUnavailable::Io { .. }));

        let retained = source.last_known().expect("cache must be retained");
        assert_eq!(retained.snapshot.temperature, 28.0);
        assert!(retained.stale);
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let path = temp_csv(
            "missing-col",
            "timestamp,site_status,voltage_1,voltage_2,voltage_3,voltage_4,door_status,fuel_level,gauge_value,temperature,soil_moisture\n\
             14:55:45,Active,230,232,231,229,Closed,75,500,28,66\n",
        );
        let mut source = SnapshotSource::new(&path, Duration::from_secs(60));

        let err = source.read_latest().unwrap_err();
        assert!(matches!(err, DataUnavailable::MissingColumn("humidity")));
    }

    #[test]
    fn header_only_file_has_no_rows() {
        let path = temp_csv("header-only", &format!("{HEADER}\n"));
        let mut source = SnapshotSource::new(&path, Duration::from_secs(60));

        let err = source.read_latest().unwrap_err();
        assert!(matches!(err, DataUnavailable::NoRows(_)));
    }

    #[test]
    fn unparseable_cell_is_reported_with_its_value() {
        let path = temp_csv(
            "bad-cell",
            &format!("{HEADER}\n14:55:45,Active,230,232,231,229,Closed,75,500,warm,48,66\n"),
        );
        let mut source = SnapshotSource::new(&path, Duration::from_secs(60));

        match source.read_latest().unwrap_err() {
            DataUnavailable::BadValue { column, value } => {
                assert_eq!(column, "temperature");
                assert_eq!(value, "warm");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn failed_read_before_any_success_has_no_last_known() {
        let path = std::env::temp_dir().join("sitemon-source-never-existed.csv");
        let mut source = SnapshotSource::new(&path, Duration::from_secs(60));

        assert!(source.read_latest().is_err());
        assert!(source.last_known().is_none());
    }
}
