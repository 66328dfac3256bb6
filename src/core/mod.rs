// Core pipeline exports
pub mod distance;
pub mod ingest;
pub mod normalizer;
pub mod projector;
pub mod ranker;
pub mod scoring;

pub use distance::{haversine_distance, distance_from};
pub use ingest::{decode_bytes, load_table, parse_table, IngestError, LoadedTable, TextEncoding, DEFAULT_ENCODINGS};
pub use normalizer::{normalize, AliasTable, CanonicalField, NormalizeError, NormalizeReport, RawTable};
pub use projector::{project_markers, project_table, rows_to_csv, CsvColumns, MapMarker, MarkerKind, TableRow};
pub use ranker::{RankResult, Ranker};
pub use scoring::{calculate_score, calculate_vulnerability, vulnerability_report};
