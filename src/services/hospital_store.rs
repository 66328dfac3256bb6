use crate::core::ingest::{decode_bytes, load_table, parse_table, IngestError, LoadedTable, TextEncoding};
use crate::core::normalizer::{normalize, AliasTable, CanonicalField, ColumnMap, RawTable};
use crate::models::StatusUpdate;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when reading or rewriting the hospital dataset
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
}

/// Seed dataset written when the configured file does not exist yet
pub const SAMPLE_HOSPITALS_CSV: &str = "\
id,name,lat,lon,accepting,waiting,delivery_beds
H001,서울중앙여성병원,37.5665,126.978,True,2,1
H002,강남모성병원,37.4979,127.0276,True,8,0
H003,동대문응급센터,37.5796,127.0094,False,0,0
H004,성북모자병원,37.5891,127.0164,True,1,2
";

/// File-backed hospital dataset
///
/// Every `load` reads the file fresh; nothing is cached between requests.
#[derive(Debug, Clone)]
pub struct HospitalStore {
    path: PathBuf,
    encodings: Vec<TextEncoding>,
    aliases: AliasTable,
    seed_sample: bool,
}

impl HospitalStore {
    pub fn new(path: impl Into<PathBuf>, encodings: Vec<TextEncoding>, seed_sample: bool) -> Self {
        Self {
            path: path.into(),
            encodings,
            aliases: AliasTable::default(),
            seed_sample,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn encodings(&self) -> &[TextEncoding] {
        &self.encodings
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn read_bytes(&self) -> Result<Vec<u8>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound && self.seed_sample => {
                tracing::info!("Dataset {} not found, seeding sample hospitals", self.path.display());
                if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| self.io_error(e))?;
                }
                tokio::fs::write(&self.path, SAMPLE_HOSPITALS_CSV)
                    .await
                    .map_err(|e| self.io_error(e))?;
                Ok(SAMPLE_HOSPITALS_CSV.as_bytes().to_vec())
            }
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Read and normalize the current dataset
    pub async fn load(&self) -> Result<LoadedTable, StoreError> {
        let bytes = self.read_bytes().await?;
        let table = load_table(&bytes, &self.encodings, &self.aliases)?;

        tracing::debug!(
            "Loaded {} hospitals from {} ({})",
            table.records.len(),
            self.path.display(),
            table.encoding
        );

        Ok(table)
    }

    /// Apply an administrative status change
    ///
    /// Returns `Ok(false)` when no row has the given id. Otherwise the whole
    /// file is rewritten as UTF-8 through a temp file and rename; status columns
    /// missing from the file are appended.
    ///
    /// Known race: this is an unlocked read-modify-write. Two concurrent
    /// updates both read the old file and the later rename wins, silently
    /// discarding the other change.
    pub async fn update_status(&self, update: &StatusUpdate) -> Result<bool, StoreError> {
        let bytes = self.read_bytes().await?;
        let decoded = decode_bytes(&bytes, &self.encodings)?;
        let mut table = parse_table(&decoded.text)?;
        let normalized = normalize(&table, &self.aliases).map_err(IngestError::from)?;
        let columns = normalized.columns;

        // Rows dropped for bad coordinates never rank, so they cannot be updated
        let dropped: HashSet<usize> = normalized.report.dropped.iter().map(|d| d.row).collect();

        let Some(row) = find_row(&table, columns.id, &update.id, |i| !dropped.contains(&(i + 1))) else {
            tracing::info!("Status update for unknown hospital {}", update.id);
            return Ok(false);
        };

        if let Some(accepting) = update.accepting {
            let value = if accepting { "True" } else { "False" };
            set_field(&mut table, &columns, CanonicalField::Accepting, row, value);
        }
        if let Some(waiting) = update.waiting {
            set_field(&mut table, &columns, CanonicalField::Waiting, row, &waiting.to_string());
        }
        if let Some(beds) = update.capacity_resource {
            set_field(&mut table, &columns, CanonicalField::CapacityResource, row, &beds.to_string());
        }

        self.write_table(&table).await?;

        tracing::info!(
            "Updated hospital {}: accepting={:?}, waiting={:?}, capacity_resource={:?}",
            update.id,
            update.accepting,
            update.waiting,
            update.capacity_resource
        );

        Ok(true)
    }

    async fn write_table(&self, table: &RawTable) -> Result<(), StoreError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&table.headers)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        let bytes = writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "hospitals.csv".to_string());
        let tmp = self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

        tokio::fs::write(&tmp, &bytes).await.map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| self.io_error(e))?;

        Ok(())
    }
}

/// Index of the first usable row with `id`; rows without an id cell match `row-{n}`
fn find_row(
    table: &RawTable,
    id_column: Option<usize>,
    id: &str,
    usable: impl Fn(usize) -> bool,
) -> Option<usize> {
    (0..table.rows.len()).filter(|&i| usable(i)).find(|&i| {
        let cell = id_column
            .and_then(|c| table.cell(i, c))
            .map(str::trim)
            .filter(|s| !s.is_empty());
        match cell {
            Some(value) => value == id,
            None => format!("row-{}", i + 1) == id,
        }
    })
}

fn set_field(table: &mut RawTable, columns: &ColumnMap, field: CanonicalField, row: usize, value: &str) {
    let column = match columns.index_of(field) {
        Some(column) => column,
        None => {
            table.headers.push(field.as_str().to_string());
            table.headers.len() - 1
        }
    };

    let width = table.headers.len();
    for r in table.rows.iter_mut() {
        if r.len() < width {
            r.resize(width, String::new());
        }
    }

    table.rows[row][column] = value.to_string();
}
