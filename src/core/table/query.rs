//! Query construction for segmented reads
//!
//! Builds the [`TableQuery`] behind the two segment operations of the table
//! client and validates page sizes before anything reaches a backend.

use crate::domain::query::{Comparison, TableQuery, MAX_PAGE_SIZE};
use crate::domain::{Result, StorageError};

/// Checks that a page size is within `1..=MAX_PAGE_SIZE`
pub fn check_page_size(page_size: usize) -> Result<()> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(StorageError::invalid_argument(format!(
            "Page size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
        ))
        .into());
    }
    Ok(())
}

/// Partition equality, conjoined with a row key condition when
/// `row_key_filter` holds a non-blank value
pub fn segment_query(
    partition_key: &str,
    page_size: usize,
    row_key_filter: Option<&str>,
    comparison: Comparison,
) -> Result<TableQuery> {
    check_page_size(page_size)?;

    let query = TableQuery::partition(partition_key).take(page_size);
    Ok(match row_key_filter {
        Some(row_key) if !row_key.trim().is_empty() => query.and_row_key(comparison, row_key),
        _ => query,
    })
}

/// Partition equality and the inclusive row key range `[from, to]`
pub fn range_query(
    partition_key: &str,
    row_key_from: &str,
    row_key_to: &str,
    page_size: usize,
) -> Result<TableQuery> {
    check_page_size(page_size)?;

    Ok(TableQuery::partition(partition_key)
        .and_row_key_between(row_key_from, row_key_to)
        .take(page_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0 => false)]
    #[test_case(1 => true)]
    #[test_case(1000 => true)]
    #[test_case(1001 => false)]
    fn test_check_page_size(page_size: usize) -> bool {
        check_page_size(page_size).is_ok()
    }

    #[test_case(None, "PartitionKey eq 'p'"; "no row filter")]
    #[test_case(Some(""), "PartitionKey eq 'p'"; "empty row filter")]
    #[test_case(Some("   "), "PartitionKey eq 'p'"; "blank row filter")]
    #[test_case(Some("r1"), "PartitionKey eq 'p' and RowKey ge 'r1'"; "row filter")]
    fn test_segment_query_filter(row_key: Option<&str>, expected: &str) {
        let query = segment_query("p", 10, row_key, Comparison::GreaterThanOrEqual).unwrap();
        assert_eq!(query.filter_string(), expected);
    }

    #[test]
    fn test_range_query() {
        let query = range_query("p", "a", "z", 25).unwrap();
        assert_eq!(
            query.filter_string(),
            "PartitionKey eq 'p' and RowKey ge 'a' and RowKey le 'z'"
        );
        assert_eq!(query.page_size(), 25);
        assert!(range_query("p", "a", "z", 0).is_err());
    }
}
