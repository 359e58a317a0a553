use indexmap::IndexMap;

use crate::dataset::{Cell, Dataset, Row};

/// Rows of a [`Dataset`] that are identical to at least one other row.
///
/// Every member of each group of equal rows is kept, in the order the rows
/// appear in the source dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateSet {
    columns: Vec<String>,
    rows: Vec<Row>,
    source_rows: Vec<usize>,
    group_count: usize,
}

impl DuplicateSet {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Zero-based position of each duplicate row in the source dataset
    pub fn source_rows(&self) -> &[usize] {
        &self.source_rows
    }

    /// Number of distinct row contents that occur more than once
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Find every row whose full content occurs at least twice.
pub fn detect(dataset: &Dataset) -> DuplicateSet {
    let mut occurrences: IndexMap<&[Cell], usize> = IndexMap::new();
    for row in dataset.rows() {
        *occurrences.entry(row.as_slice()).or_insert(0) += 1;
    }

    let group_count = occurrences.values().filter(|&&count| count >= 2).count();

    let (source_rows, rows) = dataset
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| occurrences.get(row.as_slice()).copied().unwrap_or(0) >= 2)
        .map(|(index, row)| (index, row.clone()))
        .unzip();

    DuplicateSet {
        columns: dataset.columns().to_vec(),
        rows,
        source_rows,
        group_count,
    }
}
