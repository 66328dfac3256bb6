use crate::models::{RankedCandidate, UserPosition, VulnerabilityRow};
use serde::{Deserialize, Serialize};

/// Label of the marker placed at the user's position
pub const USER_MARKER_LABEL: &str = "You";

/// One flat row of the ranked table, safe to write as CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub rank: usize,
    pub id: String,
    pub name: String,
    pub distance_km: f64,
    pub score: f64,
    pub waiting: u32,
    pub capacity_resource: u32,
    pub accepting: bool,
    pub tel: String,
    pub addr: String,
    pub lat: f64,
    pub lon: f64,
    pub tel_link: String,
    pub directions_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    User,
    Hospital,
}

/// A point for the map layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub lat: f64,
    pub lon: f64,
    pub label: String,
    pub popup: String,
    pub kind: MarkerKind,
}

/// `tel:` link, empty when there is no number
pub fn tel_link(tel: Option<&str>) -> String {
    match tel.map(str::trim) {
        Some(t) if !t.is_empty() => format!("tel:{}", t),
        _ => String::new(),
    }
}

/// Turn-by-turn directions link for an external map app
pub fn directions_url(lat: f64, lon: f64, name: &str) -> String {
    format!(
        "https://map.naver.com/v5/directions/-/-/{},{},{}",
        lon,
        lat,
        urlencoding::encode(name)
    )
}

/// Project ranked candidates onto table rows, rank starting at 1
pub fn project_table(candidates: &[RankedCandidate]) -> Vec<TableRow> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let r = &c.record;
            TableRow {
                rank: i + 1,
                id: r.id.clone(),
                name: r.name.clone(),
                distance_km: c.distance_km,
                score: c.score,
                waiting: r.waiting,
                capacity_resource: r.capacity_resource,
                accepting: r.accepting,
                tel: r.tel.clone().unwrap_or_default(),
                addr: r.addr.clone().unwrap_or_default(),
                lat: r.lat,
                lon: r.lon,
                tel_link: tel_link(r.tel.as_deref()),
                directions_url: directions_url(r.lat, r.lon, &r.name),
            }
        })
        .collect()
}

/// Project ranked candidates onto map markers; the user marker always comes first
pub fn project_markers(position: &UserPosition, candidates: &[RankedCandidate]) -> Vec<MapMarker> {
    let mut markers = Vec::with_capacity(candidates.len() + 1);

    markers.push(MapMarker {
        lat: position.lat(),
        lon: position.lon(),
        label: USER_MARKER_LABEL.to_string(),
        popup: USER_MARKER_LABEL.to_string(),
        kind: MarkerKind::User,
    });

    markers.extend(candidates.iter().map(|c| {
        let r = &c.record;
        MapMarker {
            lat: r.lat,
            lon: r.lon,
            label: r.name.clone(),
            popup: format!(
                "{}\ndistance: {:.2} km\nwaiting: {}\ndelivery_beds: {}\naccepting: {}",
                r.name, c.distance_km, r.waiting, r.capacity_resource, r.accepting
            ),
            kind: MarkerKind::Hospital,
        }
    }));

    markers
}

/// Row types with a fixed CSV column set, in serialization order
pub trait CsvColumns {
    const COLUMNS: &'static [&'static str];
}

impl CsvColumns for TableRow {
    const COLUMNS: &'static [&'static str] = &[
        "rank",
        "id",
        "name",
        "distanceKm",
        "score",
        "waiting",
        "capacityResource",
        "accepting",
        "tel",
        "addr",
        "lat",
        "lon",
        "telLink",
        "directionsUrl",
    ];
}

impl CsvColumns for VulnerabilityRow {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "accepting",
        "capacityResource",
        "waiting",
        "avgRating",
        "vulnerability",
    ];
}

/// Serialize rows as CSV; the header row is written even when `rows` is empty
pub fn rows_to_csv<T: Serialize + CsvColumns>(rows: &[T]) -> Result<String, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(T::COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HospitalRecord;

    fn create_candidate(id: &str, name: &str, tel: Option<&str>) -> RankedCandidate {
        RankedCandidate {
            record: HospitalRecord {
                id: id.to_string(),
                name: name.to_string(),
                lat: 37.5,
                lon: 127.0,
                accepting: true,
                waiting: 2,
                capacity_resource: 1,
                tel: tel.map(str::to_string),
                addr: None,
            },
            distance_km: 1.23456,
            score: 5.23456,
        }
    }

    #[test]
    fn test_table_ranks_and_links() {
        let candidates = vec![
            create_candidate("H1", "서울 병원", Some(" 02-123-4567 ")),
            create_candidate("H2", "B", None),
        ];

        let rows = project_table(&candidates);

        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[1].rank, 2);
        assert_eq!(rows[0].tel_link, "tel:02-123-4567");
        assert_eq!(rows[1].tel_link, "");
        assert_eq!(
            rows[0].directions_url,
            "https://map.naver.com/v5/directions/-/-/127,37.5,%EC%84%9C%EC%9A%B8%20%EB%B3%91%EC%9B%90"
        );
    }

    #[test]
    fn test_markers_include_user_first() {
        let position = UserPosition::new(37.5665, 126.9780).unwrap();
        let markers = project_markers(&position, &[create_candidate("H1", "A", None)]);

        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].kind, MarkerKind::User);
        assert_eq!(markers[0].label, USER_MARKER_LABEL);
        assert_eq!(markers[1].kind, MarkerKind::Hospital);
        assert!(markers[1].popup.contains("distance: 1.23 km"));
    }

    #[test]
    fn test_empty_input() {
        let position = UserPosition::new(0.0, 0.0).unwrap();
        assert!(project_table(&[]).is_empty());
        assert_eq!(project_markers(&position, &[]).len(), 1);
        assert_eq!(
            rows_to_csv::<TableRow>(&[]).unwrap(),
            format!("{}\n", TableRow::COLUMNS.join(","))
        );
    }

    #[test]
    fn test_csv_export() {
        let rows = project_table(&[create_candidate("H1", "A, B", None)]);
        let csv = rows_to_csv(&rows).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next(),
            Some("rank,id,name,distanceKm,score,waiting,capacityResource,accepting,tel,addr,lat,lon,telLink,directionsUrl")
        );
        assert!(lines.next().unwrap().starts_with("1,H1,\"A, B\","));
    }

    fn serde_header<T: Serialize>(row: &T) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(row).unwrap();
        let bytes = writer.into_inner().unwrap();
        String::from_utf8(bytes).unwrap().lines().next().unwrap().to_string()
    }

    #[test]
    fn test_columns_match_serialized_fields() {
        let rows = project_table(&[create_candidate("H1", "A", None)]);
        assert_eq!(serde_header(&rows[0]), TableRow::COLUMNS.join(","));

        let vulnerability = VulnerabilityRow {
            id: "H1".to_string(),
            name: "A".to_string(),
            accepting: true,
            capacity_resource: 1,
            waiting: 0,
            avg_rating: 4.5,
            vulnerability: 2.5,
        };
        assert_eq!(serde_header(&vulnerability), VulnerabilityRow::COLUMNS.join(","));

        let csv = rows_to_csv(&[vulnerability]).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert_eq!(csv.lines().nth(1), Some("H1,A,true,1,0,4.5,2.5"));
    }
}
