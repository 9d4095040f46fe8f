//! IBTrACS CSV to best-track archive pipeline.
//!
//! Converts the flat per-point CSV export into the grouped JSON archive the
//! validation loader reads. WMO intensity values are preferred, with the
//! USA agency values as a per-point fallback. The second IBTrACS header row
//! carries units and has no parseable ISO_TIME, so it falls out naturally.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};

use tc_core::besttrack::{BestTrackArchiveFile, BestTrackRecord};

/// Conversion statistics.
#[derive(Debug, Clone)]
pub struct ArchiveStats {
    pub total_rows: u32,
    pub parsed: u32,
    pub skipped: u32,
    pub storms: u32,
}

#[derive(Default)]
struct StormBuilder {
    basin: String,
    points: Vec<PointRow>,
}

struct PointRow {
    time: DateTime<Utc>,
    lat: Option<f64>,
    lon: Option<f64>,
    wind: Option<f64>,
    mslp: Option<f64>,
}

struct Columns {
    sid: usize,
    iso_time: usize,
    lat: usize,
    lon: usize,
    basin: Option<usize>,
    wmo_wind: Option<usize>,
    wmo_pres: Option<usize>,
    usa_wind: Option<usize>,
    usa_pres: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Columns> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).with_context(|| format!("CSV is missing required column '{name}'"))
        };
        Ok(Columns {
            sid: require("SID")?,
            iso_time: require("ISO_TIME")?,
            lat: require("LAT")?,
            lon: require("LON")?,
            basin: find("BASIN"),
            wmo_wind: find("WMO_WIND"),
            wmo_pres: find("WMO_PRES"),
            usa_wind: find("USA_WIND"),
            usa_pres: find("USA_PRES"),
        })
    }
}

fn parse_value(field: &str) -> Option<f64> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

fn parse_time(field: &str) -> Option<DateTime<Utc>> {
    let trimmed = field.trim();
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        })
}

fn pick(
    record: &csv::StringRecord,
    preferred: Option<usize>,
    fallback: Option<usize>,
) -> Option<f64> {
    preferred
        .and_then(|i| record.get(i))
        .and_then(parse_value)
        .or_else(|| fallback.and_then(|i| record.get(i)).and_then(parse_value))
}

/// Converts an IBTrACS-style CSV into the JSON archive format.
///
/// Rows are grouped by SID in lexical order and points within a storm are
/// sorted by time, so the loader always sees ascending observations.
pub fn build_archive(csv_path: &Path, output_json: &Path) -> Result<ArchiveStats> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file: {}", csv_path.display()))?;

    let columns = Columns::from_headers(reader.headers()?)?;

    let mut storms: BTreeMap<String, StormBuilder> = BTreeMap::new();
    let mut stats = ArchiveStats {
        total_rows: 0,
        parsed: 0,
        skipped: 0,
        storms: 0,
    };

    for result in reader.records() {
        stats.total_rows += 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                stats.skipped += 1;
                eprintln!("Warning: row {} unreadable: {}", stats.total_rows, e);
                continue;
            }
        };

        let sid = record.get(columns.sid).unwrap_or("").trim().to_string();
        let time_field = record.get(columns.iso_time).unwrap_or("");
        let time = match parse_time(time_field) {
            Some(t) => t,
            None => {
                stats.skipped += 1;
                if !time_field.trim().is_empty() {
                    eprintln!(
                        "Warning: row {} has unparseable ISO_TIME '{}'",
                        stats.total_rows,
                        time_field.trim()
                    );
                }
                continue;
            }
        };
        if sid.is_empty() {
            stats.skipped += 1;
            continue;
        }

        let entry = storms.entry(sid).or_default();
        if entry.basin.is_empty() {
            if let Some(i) = columns.basin {
                entry.basin = record.get(i).unwrap_or("").trim().to_string();
            }
        }
        entry.points.push(PointRow {
            time,
            lat: record.get(columns.lat).and_then(parse_value),
            lon: record.get(columns.lon).and_then(parse_value),
            wind: pick(&record, columns.wmo_wind, columns.usa_wind),
            mslp: pick(&record, columns.wmo_pres, columns.usa_pres),
        });
        stats.parsed += 1;
    }

    let archive = BestTrackArchiveFile {
        storms: storms
            .into_iter()
            .map(|(sid, mut builder)| {
                builder.points.sort_by_key(|p| p.time);
                BestTrackRecord {
                    sid,
                    basin: builder.basin,
                    times: builder.points.iter().map(|p| p.time).collect(),
                    lats: builder.points.iter().map(|p| p.lat).collect(),
                    lons: builder.points.iter().map(|p| p.lon).collect(),
                    wind: builder.points.iter().map(|p| p.wind).collect(),
                    mslp: builder.points.iter().map(|p| p.mslp).collect(),
                }
            })
            .collect(),
    };
    stats.storms = archive.storms.len() as u32;

    if let Some(parent) = output_json.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    let json = serde_json::to_string_pretty(&archive)?;
    fs::write(output_json, json)
        .with_context(|| format!("Failed to write archive: {}", output_json.display()))?;

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use tc_core::load_best_tracks;

    const HEADER: &str =
        "SID,SEASON,BASIN,NAME,ISO_TIME,LAT,LON,WMO_WIND,WMO_PRES,USA_WIND,USA_PRES";
    const UNITS: &str = " , , , , ,degrees_north,degrees_east,kts,mb,kts,mb";

    fn write_csv(rows: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "{UNITS}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    const STORM_A: [&str; 4] = [
        "2024255N12120,2024,WP,HAISHEN,2024-09-11 00:00:00,12.0,120.5,45,,40,998",
        "2024255N12120,2024,WP,HAISHEN,2024-09-11 06:00:00,12.5,121.0,,,50,996",
        "2024255N12120,2024,WP,HAISHEN,2024-09-11 12:00:00,13.0,121.5,60,985,55,986",
        "2024255N12120,2024,WP,HAISHEN,2024-09-11 18:00:00,13.5,122.0,65,980,60,982",
    ];

    const STORM_B: [&str; 2] = [
        "2024260S10060,2024,SI,UNNAMED,2024-09-11 00:00:00,-10.0,60.0,30,,,",
        "2024260S10060,2024,SI,UNNAMED,2024-09-11 06:00:00,-10.5,60.5,35,,,",
    ];

    #[test]
    fn test_build_archive_groups_and_prefers_wmo() -> Result<()> {
        let mut rows: Vec<&str> = STORM_A.to_vec();
        rows.extend(STORM_B);
        let csv = write_csv(&rows);
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("archive.json");

        let stats = build_archive(csv.path(), &out)?;
        assert_eq!(stats.total_rows, 7, "units row plus six data rows");
        assert_eq!(stats.parsed, 6);
        assert_eq!(stats.skipped, 1, "only the units row is skipped");
        assert_eq!(stats.storms, 2);

        let archive: BestTrackArchiveFile = serde_json::from_str(&fs::read_to_string(&out)?)?;
        assert_eq!(archive.storms.len(), 2);
        assert_eq!(archive.storms[0].sid, "2024255N12120");
        assert_eq!(archive.storms[1].sid, "2024260S10060");

        let a = &archive.storms[0];
        assert_eq!(a.basin, "WP");
        assert_eq!(a.times.len(), 4);
        // WMO wind wins where present; the 06:00 point falls back to USA.
        assert_eq!(
            a.wind,
            vec![Some(45.0), Some(50.0), Some(60.0), Some(65.0)]
        );
        assert_eq!(a.mslp[0], Some(998.0));
        assert_eq!(a.lats[0], Some(12.0));
        Ok(())
    }

    #[test]
    fn test_missing_required_column_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "SID,LAT,LON").unwrap();
        writeln!(file, "X,1.0,2.0").unwrap();
        let dir = tempfile::tempdir().unwrap();

        let err = build_archive(file.path(), &dir.path().join("out.json")).unwrap_err();
        assert!(err.to_string().contains("ISO_TIME"), "error: {err}");
    }

    #[test]
    fn test_out_of_order_rows_are_sorted_by_time() -> Result<()> {
        let rows = [STORM_A[2], STORM_A[0], STORM_A[3], STORM_A[1]];
        let csv = write_csv(&rows);
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("archive.json");

        build_archive(csv.path(), &out)?;
        let archive: BestTrackArchiveFile = serde_json::from_str(&fs::read_to_string(&out)?)?;
        let times = &archive.storms[0].times;
        assert!(times.windows(2).all(|w| w[0] < w[1]));
        Ok(())
    }

    #[test]
    fn test_archive_round_trips_through_the_loader() -> Result<()> {
        let mut rows: Vec<&str> = STORM_A.to_vec();
        rows.extend(STORM_B);
        let csv = write_csv(&rows);
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("archive.json");
        build_archive(csv.path(), &out)?;

        let start = Utc.with_ymd_and_hms(2024, 9, 11, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 9, 11, 18, 0, 0).unwrap();
        let tracks = load_best_tracks(&out, start, end, 4)?;

        // Storm B only has two points and is dropped by the loader.
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].sid, "2024255N12120");
        assert_eq!(tracks[0].len(), 4);
        assert_eq!(tracks[0].peak_wind(), Some(65.0));
        Ok(())
    }
}
