//! Input limits shared by the ledger operations.

use crate::error::{EngineError, Result};
use store::PageRequest;
use store::stats::MAX_RATING;

pub const REVIEW_TEXT_MIN: usize = 10;
pub const REVIEW_TEXT_MAX: usize = 2000;
pub const REVIEW_TITLE_MAX: usize = 100;
pub const COMMENT_MAX: usize = 500;

/// A user-supplied rating must be 1-5; 0 is reserved for "unset"
pub fn rating(value: u8) -> Result<u8> {
    if (1..=MAX_RATING).contains(&value) {
        Ok(value)
    } else {
        Err(EngineError::validation(format!(
            "rating must be between 1 and {MAX_RATING}, got {value}"
        )))
    }
}

/// Review body: 10-2000 characters after trimming. Returns the trimmed text.
pub fn review_text(text: &str) -> Result<String> {
    let trimmed = text.trim();
    let len = trimmed.chars().count();
    if len < REVIEW_TEXT_MIN || len > REVIEW_TEXT_MAX {
        return Err(EngineError::validation(format!(
            "review text must be {REVIEW_TEXT_MIN}-{REVIEW_TEXT_MAX} characters, got {len}"
        )));
    }
    Ok(trimmed.to_string())
}

/// Inline review text on a rating action: only an upper bound
pub fn inline_review(text: &str) -> Result<()> {
    let len = text.chars().count();
    if len > REVIEW_TEXT_MAX {
        return Err(EngineError::validation(format!(
            "review must be at most {REVIEW_TEXT_MAX} characters, got {len}"
        )));
    }
    Ok(())
}

/// Optional title, at most 100 characters; blank titles become `None`
pub fn review_title(title: Option<&str>) -> Result<Option<String>> {
    let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let len = title.chars().count();
    if len > REVIEW_TITLE_MAX {
        return Err(EngineError::validation(format!(
            "review title must be at most {REVIEW_TITLE_MAX} characters, got {len}"
        )));
    }
    Ok(Some(title.to_string()))
}

/// Comment text is trimmed before both checks
pub fn comment(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(EngineError::EmptyComment);
    }
    let len = trimmed.chars().count();
    if len > COMMENT_MAX {
        return Err(EngineError::CommentTooLong {
            len,
            max: COMMENT_MAX,
        });
    }
    Ok(trimmed.to_string())
}

/// 1-based page number and a non-zero page size
pub fn page(page: usize, size: usize) -> Result<PageRequest> {
    PageRequest::new(page, size).ok_or_else(|| {
        EngineError::validation(format!(
            "page and page size must both be at least 1, got page {page} size {size}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_rating_bounds() {
        assert!(rating(0).is_err());
        assert_eq!(rating(1).unwrap(), 1);
        assert_eq!(rating(5).unwrap(), 5);
        assert_eq!(rating(6).unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_review_text_length_counts_trimmed_chars() {
        assert!(review_text("too short").is_err());
        assert!(review_text("   padded   ").is_err());
        assert_eq!(review_text("  just long enough ").unwrap(), "just long enough");
        assert!(review_text(&"x".repeat(2000)).is_ok());
        assert!(review_text(&"x".repeat(2001)).is_err());
        // Multi-byte characters count once each
        assert!(review_text(&"é".repeat(10)).is_ok());
    }

    #[test]
    fn test_title() {
        assert_eq!(review_title(None).unwrap(), None);
        assert_eq!(review_title(Some("   ")).unwrap(), None);
        assert_eq!(review_title(Some(" Great ")).unwrap().as_deref(), Some("Great"));
        assert!(review_title(Some(&"t".repeat(101))).is_err());
    }

    #[test]
    fn test_comment_limits() {
        assert!(matches!(comment("   "), Err(EngineError::EmptyComment)));
        assert!(matches!(
            comment(&"c".repeat(501)),
            Err(EngineError::CommentTooLong { len: 501, max: 500 })
        ));
        // Surrounding whitespace does not count toward the limit
        let padded = format!("  {}  ", "c".repeat(500));
        assert_eq!(comment(&padded).unwrap().len(), 500);
    }

    #[test]
    fn test_page() {
        assert!(page(0, 10).is_err());
        assert!(page(1, 0).is_err());
        assert_eq!(page(2, 10).unwrap().offset(), 10);
    }
}
