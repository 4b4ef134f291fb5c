//! # Pagination Stage

use crate::error::QueryError;

/// Checks a page request without slicing anything.
pub fn validate(page: i64, page_size: i64) -> Result<(), QueryError> {
    if page_size <= 0 {
        return Err(QueryError::InvalidPageSize(page_size));
    }
    if page <= 0 {
        return Err(QueryError::InvalidPage(page));
    }
    Ok(())
}

/// Returns page `page` (1-indexed) of `records`. Pages past the end are empty.
pub fn paginate<T>(records: &[T], page: i64, page_size: i64) -> Result<&[T], QueryError> {
    validate(page, page_size)?;
    let size = usize::try_from(page_size).unwrap_or(usize::MAX);
    let start = usize::try_from(page - 1)
        .ok()
        .and_then(|p| p.checked_mul(size))
        .unwrap_or(usize::MAX);
    if start >= records.len() {
        return Ok(&[]);
    }
    let end = start.saturating_add(size).min(records.len());
    Ok(&records[start..end])
}

/// Number of pages needed for `total` items.
pub fn page_count(total: usize, page_size: i64) -> usize {
    match usize::try_from(page_size) {
        Ok(size) if size > 0 => total / size + usize::from(total % size != 0),
        _ => 0,
    }
}
