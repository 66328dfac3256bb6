use crate::models::{is_valid_coordinate, HospitalRecord, DEFAULT_HOSPITAL_NAME};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Errors that stop normalization of a table
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("no latitude/longitude columns found (lat: {lat_found}, lon: {lon_found}; headers: {headers:?})")]
    MissingCoordinateColumns {
        lat_found: bool,
        lon_found: bool,
        headers: Vec<String>,
    },
}

/// Canonical column names a hospital table is mapped onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Lat,
    Lon,
    Id,
    Name,
    Tel,
    Addr,
    Accepting,
    Waiting,
    CapacityResource,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 9] = [
        CanonicalField::Lat,
        CanonicalField::Lon,
        CanonicalField::Id,
        CanonicalField::Name,
        CanonicalField::Tel,
        CanonicalField::Addr,
        CanonicalField::Accepting,
        CanonicalField::Waiting,
        CanonicalField::CapacityResource,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Lat => "lat",
            CanonicalField::Lon => "lon",
            CanonicalField::Id => "id",
            CanonicalField::Name => "name",
            CanonicalField::Tel => "tel",
            CanonicalField::Addr => "addr",
            CanonicalField::Accepting => "accepting",
            CanonicalField::Waiting => "waiting",
            CanonicalField::CapacityResource => "delivery_beds",
        }
    }

    fn default_aliases(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::Lat => &["lat", "위도", "병원위도", "Latitude", "latitude", "Y", "y"],
            CanonicalField::Lon => &["lon", "경도", "병원경도", "Longitude", "longitude", "X", "x"],
            CanonicalField::Id => &["id", "병원ID", "기관ID", "hpid"],
            CanonicalField::Name => &["name", "병원명", "기관명", "기관명(국문)", "요양기관명"],
            CanonicalField::Tel => &["tel", "전화", "전화번호", "대표전화", "응급전화", "응급실전화"],
            CanonicalField::Addr => &["addr", "주소", "도로명주소", "지번주소"],
            CanonicalField::Accepting => &["accepting", "수용", "수용여부"],
            CanonicalField::Waiting => &["waiting", "대기", "대기인원"],
            CanonicalField::CapacityResource => {
                &["delivery_beds", "capacity_resource", "분만침대", "분만가능침대"]
            }
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority-ordered header aliases per canonical field
///
/// Resolved once per table; downstream code only ever sees canonical fields.
#[derive(Debug, Clone)]
pub struct AliasTable {
    entries: Vec<(CanonicalField, Vec<String>)>,
}

impl Default for AliasTable {
    fn default() -> Self {
        let entries = CanonicalField::ALL
            .iter()
            .map(|field| {
                let aliases = field.default_aliases().iter().map(|a| a.to_string()).collect();
                (*field, aliases)
            })
            .collect();
        Self { entries }
    }
}

impl AliasTable {
    pub fn aliases(&self, field: CanonicalField) -> &[String] {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, aliases)| aliases.as_slice())
            .unwrap_or(&[])
    }

    /// Index of the first alias (in priority order) present in `headers`
    pub fn find(&self, field: CanonicalField, headers: &[String]) -> Option<usize> {
        self.aliases(field)
            .iter()
            .find_map(|alias| headers.iter().position(|h| h == alias))
    }

    /// Bind every canonical field to a column index
    pub fn resolve(&self, headers: &[String]) -> Result<ColumnMap, NormalizeError> {
        let lat = self.find(CanonicalField::Lat, headers);
        let lon = self.find(CanonicalField::Lon, headers);

        let (lat, lon) = match (lat, lon) {
            (Some(lat), Some(lon)) => (lat, lon),
            (lat, lon) => {
                return Err(NormalizeError::MissingCoordinateColumns {
                    lat_found: lat.is_some(),
                    lon_found: lon.is_some(),
                    headers: headers.to_vec(),
                })
            }
        };

        Ok(ColumnMap {
            lat,
            lon,
            id: self.find(CanonicalField::Id, headers),
            name: self.find(CanonicalField::Name, headers),
            tel: self.find(CanonicalField::Tel, headers),
            addr: self.find(CanonicalField::Addr, headers),
            accepting: self.find(CanonicalField::Accepting, headers),
            waiting: self.find(CanonicalField::Waiting, headers),
            capacity_resource: self.find(CanonicalField::CapacityResource, headers),
        })
    }
}

/// Column indices bound to canonical fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub lat: usize,
    pub lon: usize,
    pub id: Option<usize>,
    pub name: Option<usize>,
    pub tel: Option<usize>,
    pub addr: Option<usize>,
    pub accepting: Option<usize>,
    pub waiting: Option<usize>,
    pub capacity_resource: Option<usize>,
}

impl ColumnMap {
    pub fn index_of(&self, field: CanonicalField) -> Option<usize> {
        match field {
            CanonicalField::Lat => Some(self.lat),
            CanonicalField::Lon => Some(self.lon),
            CanonicalField::Id => self.id,
            CanonicalField::Name => self.name,
            CanonicalField::Tel => self.tel,
            CanonicalField::Addr => self.addr,
            CanonicalField::Accepting => self.accepting,
            CanonicalField::Waiting => self.waiting,
            CanonicalField::CapacityResource => self.capacity_resource,
        }
    }
}

/// A header row plus string cells, exactly as read from the source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers = headers.iter().map(|h| clean_header(h)).collect();
        Self { headers, rows }
    }

    /// Cell text, or `None` when the row is shorter than the header
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(column)).map(String::as_str)
    }
}

/// Trim whitespace and any byte-order mark left over from decoding
pub fn clean_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_string()
}

/// Why a row was dropped during normalization
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DropReason {
    InvalidCoordinateValue {
        field: &'static str,
        value: String,
    },
    CoordinateOutOfRange {
        lat: f64,
        lon: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedRow {
    /// 1-based data row number (header excluded)
    pub row: usize,
    pub reason: DropReason,
}

/// Row accounting for one normalization pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub dropped: Vec<DroppedRow>,
}

impl NormalizeReport {
    pub fn rows_dropped(&self) -> usize {
        self.dropped.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub records: Vec<HospitalRecord>,
    pub columns: ColumnMap,
    pub report: NormalizeReport,
}

/// Trim surrounding whitespace and strip thousands separators, then parse as a finite float
///
/// Interior whitespace is not removed, so a cell like `37 .5` is absent.
pub fn coerce_coordinate(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a non-negative count; integral floats such as `2.0` are accepted
pub fn parse_count(raw: &str) -> Option<u32> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(n) = cleaned.parse::<u32>() {
        return Some(n);
    }
    let value = cleaned.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Some(value as u32)
    } else {
        None
    }
}

pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "t" | "1.0" => Some(true),
        "false" | "0" | "no" | "n" | "f" | "0.0" => Some(false),
        _ => None,
    }
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Map a raw table onto `HospitalRecord`s
///
/// Fails only when no latitude or longitude column can be resolved. Rows whose
/// coordinates are missing, unparseable or out of range are dropped and listed
/// in the report, so `rows_in == rows_out + dropped.len()` always holds.
pub fn normalize(table: &RawTable, aliases: &AliasTable) -> Result<NormalizedTable, NormalizeError> {
    let columns = aliases.resolve(&table.headers)?;

    let mut records = Vec::with_capacity(table.rows.len());
    let mut report = NormalizeReport {
        rows_in: table.rows.len(),
        ..NormalizeReport::default()
    };

    for index in 0..table.rows.len() {
        let row_number = index + 1;
        let cell = |column: Option<usize>| column.and_then(|c| table.cell(index, c));

        let lat_raw = cell(Some(columns.lat)).unwrap_or("");
        let lon_raw = cell(Some(columns.lon)).unwrap_or("");

        let lat = match coerce_coordinate(lat_raw) {
            Some(v) => v,
            None => {
                report.dropped.push(DroppedRow {
                    row: row_number,
                    reason: DropReason::InvalidCoordinateValue {
                        field: "lat",
                        value: lat_raw.to_string(),
                    },
                });
                tracing::debug!("Dropping row {}: invalid latitude {:?}", row_number, lat_raw);
                continue;
            }
        };
        let lon = match coerce_coordinate(lon_raw) {
            Some(v) => v,
            None => {
                report.dropped.push(DroppedRow {
                    row: row_number,
                    reason: DropReason::InvalidCoordinateValue {
                        field: "lon",
                        value: lon_raw.to_string(),
                    },
                });
                tracing::debug!("Dropping row {}: invalid longitude {:?}", row_number, lon_raw);
                continue;
            }
        };
        if !is_valid_coordinate(lat, lon) {
            report.dropped.push(DroppedRow {
                row: row_number,
                reason: DropReason::CoordinateOutOfRange { lat, lon },
            });
            tracing::debug!("Dropping row {}: coordinate out of range ({}, {})", row_number, lat, lon);
            continue;
        }

        records.push(HospitalRecord {
            id: non_empty(cell(columns.id)).unwrap_or_else(|| format!("row-{}", row_number)),
            name: non_empty(cell(columns.name)).unwrap_or_else(|| DEFAULT_HOSPITAL_NAME.to_string()),
            lat,
            lon,
            accepting: cell(columns.accepting).and_then(parse_flag).unwrap_or(true),
            waiting: cell(columns.waiting).and_then(parse_count).unwrap_or(0),
            capacity_resource: cell(columns.capacity_resource).and_then(parse_count).unwrap_or(0),
            tel: non_empty(cell(columns.tel)),
            addr: non_empty(cell(columns.addr)),
        });
    }

    report.rows_out = records.len();

    let mut seen = HashSet::new();
    if let Some(duplicate) = records.iter().find(|r| !seen.insert(r.id.as_str())) {
        tracing::warn!("Dataset contains duplicate hospital id {}", duplicate.id);
    }

    if report.rows_dropped() > 0 {
        tracing::info!(
            "Normalized {} of {} rows ({} dropped for invalid coordinates)",
            report.rows_out,
            report.rows_in,
            report.rows_dropped()
        );
    }

    Ok(NormalizedTable {
        records,
        columns,
        report,
    })
}
