//! Snapshot encoding for [`DocumentStore::save`](crate::DocumentStore::save) and
//! [`DocumentStore::load`](crate::DocumentStore::load).
//!
//! A four-column table (`id`, `text`, `vector`, `metadata`) stored one row
//! per line, each row a JSON object so text and metadata need no quoting
//! rules of their own. The vector column is a comma-joined list of decimals:
//!
//! ```text
//! {"id":"6f1c…","text":"This is a document about hammers","vector":"0.1,-0.25,0","metadata":{"topic":"tools"}}
//! ```

use crate::metadata::Metadata;
use crate::store::DocumentRecord;
use ragvault_core::{RagError, RagResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Separator between vector elements in the `vector` column.
pub const VECTOR_DELIMITER: char = ',';

#[derive(Serialize, Deserialize)]
struct SnapshotRow {
    id: String,
    text: String,
    vector: String,
    metadata: Metadata,
}

/// Flatten a vector to its delimited text form.
pub fn join_vector(vector: &[f32]) -> String {
    vector
        .iter()
        .map(f32::to_string)
        .collect::<Vec<_>>()
        .join(&VECTOR_DELIMITER.to_string())
}

/// Parse the delimited text form back into a vector.
///
/// Every element must be a finite decimal number.
pub fn parse_vector(field: &str) -> Result<Vec<f32>, String> {
    if field.trim().is_empty() {
        return Err("vector is empty".to_string());
    }
    field
        .split(VECTOR_DELIMITER)
        .map(|part| {
            let part = part.trim();
            match part.parse::<f32>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(format!("vector element '{part}' is not a finite number")),
            }
        })
        .collect()
}

/// Serialize records, in order, to snapshot text.
pub fn encode(records: &[DocumentRecord]) -> RagResult<String> {
    let mut data = String::new();
    for record in records {
        let row = SnapshotRow {
            id: record.id.to_string(),
            text: record.text.clone(),
            vector: join_vector(&record.vector),
            metadata: record.metadata.clone(),
        };
        data.push_str(&serde_json::to_string(&row)?);
        data.push('\n');
    }
    Ok(data)
}

/// Parse and validate snapshot text.
///
/// Every vector must have `dimension` elements, and ids and texts must be
/// unique. The first bad row aborts decoding with
/// [`RagError::StoreCorruption`]; nothing partial is returned.
pub fn decode(data: &str, dimension: usize) -> RagResult<Vec<DocumentRecord>> {
    let mut records = Vec::new();
    let mut ids = HashSet::new();
    let mut texts = HashSet::new();

    for (idx, line) in data.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let row: SnapshotRow = serde_json::from_str(line)
            .map_err(|e| RagError::corrupt(line_no, format!("invalid row: {e}")))?;

        let id = Uuid::parse_str(&row.id)
            .map_err(|e| RagError::corrupt(line_no, format!("invalid id '{}': {e}", row.id)))?;

        let vector = parse_vector(&row.vector).map_err(|reason| RagError::corrupt(line_no, reason))?;
        if vector.len() != dimension {
            return Err(RagError::corrupt(
                line_no,
                format!(
                    "vector has {} elements, store expects {dimension}",
                    vector.len()
                ),
            ));
        }

        if !ids.insert(id) {
            return Err(RagError::corrupt(line_no, format!("duplicate id {id}")));
        }
        if !texts.insert(row.text.clone()) {
            return Err(RagError::corrupt(line_no, "duplicate text"));
        }

        records.push(DocumentRecord {
            id,
            text: row.text,
            vector,
            metadata: row.metadata,
        });
    }

    Ok(records)
}
