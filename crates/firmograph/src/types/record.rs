//! Wire-level record shapes
//!
//! Field names are stable contract surface across the queue hops; renaming
//! any of them is a breaking change for every consumer downstream.

use serde::{Deserialize, Serialize};

/// Employee-count bucket carried on every record.
///
/// Serializes to the fixed label set used across the queue messages, the
/// vector index metadata, and the terminal store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeBucket {
    #[serde(rename = "1-10")]
    Micro,
    #[serde(rename = "11-50")]
    Small,
    #[serde(rename = "51-200")]
    Medium,
    #[serde(rename = "201-500")]
    Large,
    #[serde(rename = "500+")]
    Enterprise,
    #[serde(rename = "NA")]
    Unknown,
}

impl SizeBucket {
    /// The wire label for this bucket.
    pub fn label(&self) -> &'static str {
        match self {
            SizeBucket::Micro => "1-10",
            SizeBucket::Small => "11-50",
            SizeBucket::Medium => "51-200",
            SizeBucket::Large => "201-500",
            SizeBucket::Enterprise => "500+",
            SizeBucket::Unknown => "NA",
        }
    }

    /// Parse a value that is already one of the fixed labels.
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw {
            "1-10" => Some(SizeBucket::Micro),
            "11-50" => Some(SizeBucket::Small),
            "51-200" => Some(SizeBucket::Medium),
            "201-500" => Some(SizeBucket::Large),
            "500+" => Some(SizeBucket::Enterprise),
            "NA" => Some(SizeBucket::Unknown),
            _ => None,
        }
    }

    /// Bucket a raw employee count. Thresholds are inclusive upper bounds.
    pub fn from_count(count: i64) -> Self {
        if count <= 10 {
            SizeBucket::Micro
        } else if count <= 50 {
            SizeBucket::Small
        } else if count <= 200 {
            SizeBucket::Medium
        } else if count <= 500 {
            SizeBucket::Large
        } else {
            SizeBucket::Enterprise
        }
    }
}

impl std::fmt::Display for SizeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A normalized company row, as emitted by the ingestor.
///
/// Invariants: `company_website` is always `https://www.<bare-domain>`,
/// `location` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub company_name: String,
    pub company_website: String,
    pub employee_size: SizeBucket,
    pub location: String,
}

/// Company plus the plain text extracted from its website.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedRecord {
    #[serde(flatten)]
    pub company: CompanyRecord,
    pub scraped_text: String,
}

/// Company plus its reduced, L2-normalized embedding vector.
///
/// The wire field is `embeddings` (plural), inherited from the original
/// message schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedRecord {
    #[serde(flatten)]
    pub company: CompanyRecord,
    #[serde(rename = "embeddings")]
    pub embedding: Vec<f32>,
}

/// Company metadata plus its content-addressed identifier, as handed to the
/// persister after a successful vector upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedRecord {
    pub id: String,
    #[serde(flatten)]
    pub company: CompanyRecord,
}

/// Ingest trigger: a roster object landed in the bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectCreated {
    pub bucket: String,
    pub key: String,
}

impl ObjectCreated {
    /// Object keys arrive URL-encoded in storage notifications; `+` means a
    /// space and percent escapes cover everything else.
    pub fn decoded_key(&self) -> String {
        let mut out = Vec::with_capacity(self.key.len());
        let mut bytes = self.key.bytes();
        while let Some(b) = bytes.next() {
            match b {
                b'+' => out.push(b' '),
                b'%' => {
                    let hi = bytes.next().and_then(hex_val);
                    let lo = bytes.next().and_then(hex_val);
                    match (hi, lo) {
                        (Some(hi), Some(lo)) => out.push(hi << 4 | lo),
                        // Malformed escape: keep the literal bytes.
                        _ => out.push(b'%'),
                    }
                }
                other => out.push(other),
            }
        }
        String::from_utf8_lossy(&out).into_owned()
    }
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
