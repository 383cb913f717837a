//! Cursor-based pagination over forward-ordered result sets.
//!
//! Cursors are opaque to clients but are simply the base64 encoding of
//! a decimal absolute offset, which keeps them stable across runs.

use base64::prelude::{Engine, BASE64_STANDARD};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PageError {
    #[error("invalid pagination limit: {0}")]
    InvalidLimit(i64),
    #[error("invalid pagination cursor: {0}")]
    InvalidCursor(String),
}

/// One page of rows plus the totals a client needs to keep paging.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PageResult<T> {
    pub rows: Vec<T>,
    pub total: u64,
    pub offset: u64,
}

impl<T> PageResult<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            rows: self.rows.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
        }
    }
}

pub fn encode_cursor(offset: u64) -> String {
    BASE64_STANDARD.encode(offset.to_string())
}

pub fn decode_cursor(cursor: &str, total: u64) -> Result<u64, PageError> {
    let invalid = || PageError::InvalidCursor(cursor.to_owned());
    let bytes = BASE64_STANDARD.decode(cursor).map_err(|_| invalid())?;
    let text = String::from_utf8(bytes).map_err(|_| invalid())?;
    let offset = text.parse::<u64>().map_err(|_| invalid())?;
    if offset >= total {
        return Err(invalid());
    }
    Ok(offset)
}

/// Computes the `(offset, limit)` window selected by the connection
/// arguments over a result set of `total` rows.
///
/// `after`/`before` are exclusive bounds. `first` limits forward from
/// the start of the window; `last` keeps the trailing rows of whatever
/// window remains, so when both are given `last` prevails inside the
/// `first` window.
pub fn compute_page(
    first: Option<i64>,
    last: Option<i64>,
    after: Option<&str>,
    before: Option<&str>,
    total: u64,
) -> Result<(u64, u64), PageError> {
    if let Some(first) = first {
        if first < 0 {
            return Err(PageError::InvalidLimit(first));
        }
    }
    if let Some(last) = last {
        if last < 0 {
            return Err(PageError::InvalidLimit(last));
        }
    }

    let mut begin: u64 = 0;
    let mut end: u64 = total;
    if let Some(after) = after {
        begin = decode_cursor(after, total)? + 1;
    }
    if let Some(before) = before {
        end = decode_cursor(before, total)?;
    }
    if let Some(first) = first {
        end = end.min(begin.saturating_add(first as u64));
    }
    if let Some(last) = last {
        begin = begin.max(end.saturating_sub(last as u64));
    }

    let limit = end.saturating_sub(begin);
    Ok((begin, limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_range_when_unbounded() {
        assert_eq!(compute_page(None, None, None, None, 30).unwrap(), (0, 30));
        assert_eq!(compute_page(None, None, None, None, 0).unwrap(), (0, 0));
    }

    #[test]
    fn first_limits_forward() {
        assert_eq!(
            compute_page(Some(10), None, None, None, 30).unwrap(),
            (0, 10)
        );
        assert_eq!(
            compute_page(Some(50), None, None, None, 30).unwrap(),
            (0, 30)
        );
    }

    #[test]
    fn last_returns_trailing_rows() {
        assert_eq!(
            compute_page(None, Some(10), None, None, 30).unwrap(),
            (20, 10)
        );
        assert_eq!(
            compute_page(None, Some(50), None, None, 30).unwrap(),
            (0, 30)
        );
    }

    #[test]
    fn last_prevails_within_first_window() {
        // first selects [0, 10); last keeps the trailing 4 of those.
        assert_eq!(
            compute_page(Some(10), Some(4), None, None, 30).unwrap(),
            (6, 4)
        );
    }

    #[test]
    fn after_starts_past_the_cursor() {
        let cursor = encode_cursor(10);
        assert_eq!(
            compute_page(Some(10), None, Some(&cursor), None, 30).unwrap(),
            (11, 10)
        );
    }

    #[test]
    fn before_bounds_the_end() {
        let cursor = encode_cursor(10);
        assert_eq!(
            compute_page(None, Some(10), None, Some(&cursor), 30).unwrap(),
            (0, 10)
        );
        let cursor = encode_cursor(25);
        assert_eq!(
            compute_page(None, Some(10), None, Some(&cursor), 30).unwrap(),
            (15, 10)
        );
    }

    #[test]
    fn negative_limits_are_rejected() {
        assert_eq!(
            compute_page(Some(-1), None, None, None, 30).unwrap_err(),
            PageError::InvalidLimit(-1)
        );
        assert_eq!(
            compute_page(None, Some(-7), None, None, 30).unwrap_err(),
            PageError::InvalidLimit(-7)
        );
    }

    #[test]
    fn out_of_range_cursors_are_rejected() {
        let cursor = encode_cursor(30);
        assert!(matches!(
            compute_page(None, None, Some(&cursor), None, 30),
            Err(PageError::InvalidCursor(_))
        ));
        assert!(matches!(
            compute_page(None, None, Some("not-base64!"), None, 30),
            Err(PageError::InvalidCursor(_))
        ));
    }

    #[test]
    fn cursor_round_trip_is_stable() {
        for offset in [0u64, 1, 7, 1000] {
            let encoded = encode_cursor(offset);
            assert_eq!(decode_cursor(&encoded, offset + 1).unwrap(), offset);
            // Same offset always encodes to the same cursor.
            assert_eq!(encoded, encode_cursor(offset));
        }
    }

    #[test_strategy::proptest]
    fn forward_and_backward_windows_never_overlap(
        #[strategy(1u64..500)] total: u64,
        #[strategy(0u64..500)] pivot: u64,
        #[strategy(0i64..50)] first: i64,
        #[strategy(0i64..50)] last: i64,
    ) {
        // Forward page strictly after the pivot, backward page strictly
        // before it: they must stay on their own side of the pivot.
        let pivot = pivot % total;
        let cursor = encode_cursor(pivot);
        let (fwd_offset, _) =
            compute_page(Some(first), None, Some(&cursor), None, total).unwrap();
        let (bwd_offset, bwd_limit) =
            compute_page(None, Some(last), None, Some(&cursor), total).unwrap();
        assert!(fwd_offset > pivot);
        assert!(bwd_offset + bwd_limit <= pivot);
    }
}
