//! Offset pagination shared by the backends that page a local collection.
//! The offset travels as the decimal text of a [`PageToken`].

use crate::errors::SourceError;
use crate::ids::PageToken;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Read the starting offset out of a request token. No token means 0.
/// Offsets must fit a SQLite integer.
pub fn offset_from(token: Option<&PageToken>) -> Result<usize, SourceError> {
    let Some(t) = token else {
        return Ok(0);
    };
    t.as_str()
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|offset| i64::try_from(*offset).is_ok())
        .ok_or_else(|| SourceError::InvalidToken(t.to_string()))
}

/// Token for the page after `[offset, offset + page_size)`, if any remains.
pub fn next_token(offset: usize, page_size: usize, total: usize) -> Option<PageToken> {
    let next = offset.saturating_add(page_size);
    (next < total).then(|| PageToken::from_raw(next.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_starts_at_zero() {
        assert_eq!(offset_from(None).unwrap(), 0);
    }

    #[test]
    fn numeric_token_is_offset() {
        let t = PageToken::from_raw("20");
        assert_eq!(offset_from(Some(&t)).unwrap(), 20);
    }

    #[test]
    fn non_numeric_token_rejected() {
        for raw in ["abc", "-10", "1.5", ""] {
            let t = PageToken::from_raw(raw);
            assert!(
                matches!(offset_from(Some(&t)), Err(SourceError::InvalidToken(_))),
                "accepted {raw:?}"
            );
        }
    }

    #[test]
    fn offsets_beyond_i64_rejected() {
        let max = PageToken::from_raw(i64::MAX.to_string());
        assert_eq!(offset_from(Some(&max)).unwrap(), i64::MAX as usize);
        for raw in ["9223372036854775808", "18446744073709551615", "99999999999999999999"] {
            let t = PageToken::from_raw(raw);
            assert!(
                matches!(offset_from(Some(&t)), Err(SourceError::InvalidToken(_))),
                "accepted {raw:?}"
            );
        }
    }

    #[test]
    fn next_token_until_exhausted() {
        assert_eq!(next_token(0, 10, 60).unwrap().as_str(), "10");
        assert_eq!(next_token(40, 10, 60).unwrap().as_str(), "50");
        assert!(next_token(50, 10, 60).is_none());
        assert!(next_token(0, 10, 10).is_none());
        assert!(next_token(0, 10, 0).is_none());
    }
}
