use crate::core::normalizer::{normalize, AliasTable, NormalizeError, NormalizeReport, RawTable};
use crate::models::HospitalRecord;
use encoding_rs::{Encoding, EUC_KR, UTF_8, WINDOWS_1252};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that halt ingestion before any ranking happens
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("could not decode input with any of: {}", format_encodings(.tried))]
    DecodeFailure { tried: Vec<TextEncoding> },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

fn format_encodings(encodings: &[TextEncoding]) -> String {
    encodings
        .iter()
        .map(TextEncoding::label)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Text encodings tried, in order, when reading an uploaded or stored table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "utf-8-sig")]
    Utf8Sig,
    #[serde(rename = "cp949")]
    Cp949,
    #[serde(rename = "euc-kr")]
    EucKr,
    #[serde(rename = "latin1")]
    Latin1,
}

/// Default probe order: UTF-8 first, legacy Korean next, Latin-1 last
pub const DEFAULT_ENCODINGS: [TextEncoding; 5] = [
    TextEncoding::Utf8,
    TextEncoding::Utf8Sig,
    TextEncoding::Cp949,
    TextEncoding::EucKr,
    TextEncoding::Latin1,
];

impl TextEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf8Sig => "utf-8-sig",
            TextEncoding::Cp949 => "cp949",
            TextEncoding::EucKr => "euc-kr",
            TextEncoding::Latin1 => "latin1",
        }
    }

    // encoding_rs implements EUC-KR as the windows-949 superset, so cp949 and
    // euc-kr share a decoder; latin1 follows the WHATWG windows-1252 mapping.
    fn decoder(&self) -> &'static Encoding {
        match self {
            TextEncoding::Utf8 | TextEncoding::Utf8Sig => UTF_8,
            TextEncoding::Cp949 | TextEncoding::EucKr => EUC_KR,
            TextEncoding::Latin1 => WINDOWS_1252,
        }
    }

    /// Decode strictly; `None` on any malformed sequence
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        let bytes = match self {
            TextEncoding::Utf8Sig => bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes),
            _ => bytes,
        };
        self.decoder()
            .decode_without_bom_handling_and_without_replacement(bytes)
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "utf-8-sig" | "utf8-sig" => Ok(TextEncoding::Utf8Sig),
            "cp949" | "windows-949" | "ms949" => Ok(TextEncoding::Cp949),
            "euc-kr" | "euckr" => Ok(TextEncoding::EucKr),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            other => Err(format!("unsupported encoding: {}", other)),
        }
    }
}

/// Decoded text plus the encoding that accepted it
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
}

/// Try each encoding in order; the first that decodes without error wins
pub fn decode_bytes(bytes: &[u8], order: &[TextEncoding]) -> Result<DecodedText, IngestError> {
    for encoding in order {
        if let Some(text) = encoding.decode(bytes) {
            tracing::debug!("Decoded {} bytes as {}", bytes.len(), encoding);
            return Ok(DecodedText {
                text: text.into_owned(),
                encoding: *encoding,
            });
        }
        tracing::trace!("Input is not valid {}", encoding);
    }

    Err(IngestError::DecodeFailure {
        tried: order.to_vec(),
    })
}

/// Read a header row and data rows; short rows are allowed
pub fn parse_table(text: &str) -> Result<RawTable, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable::new(headers, rows))
}

/// Fully ingested dataset, ready for ranking
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTable {
    pub records: Vec<HospitalRecord>,
    pub encoding: TextEncoding,
    pub report: NormalizeReport,
}

/// Decode, parse and normalize a CSV file's bytes
pub fn load_table(
    bytes: &[u8],
    order: &[TextEncoding],
    aliases: &AliasTable,
) -> Result<LoadedTable, IngestError> {
    let decoded = decode_bytes(bytes, order)?;
    let raw = parse_table(&decoded.text)?;
    let normalized = normalize(&raw, aliases)?;

    Ok(LoadedTable {
        records: normalized.records,
        encoding: decoded.encoding,
        report: normalized.report,
    })
}
