use csv::Writer;

use crate::detector::DuplicateSet;
use crate::errors::{DupcheckError, DupcheckResult};

/// Serialise duplicate rows as CSV: header first, then rows in dataset order.
pub fn render(duplicates: &DuplicateSet) -> DupcheckResult<Vec<u8>> {
    let mut wtr = Writer::from_writer(vec![]);

    wtr.write_record(duplicates.columns())?;

    for row in duplicates.rows() {
        wtr.write_record(row.iter().map(|cell| cell.to_string()))?;
    }

    wtr.into_inner()
        .map_err(|e| DupcheckError::Internal(format!("Failed to flush CSV: {}", e)))
}
