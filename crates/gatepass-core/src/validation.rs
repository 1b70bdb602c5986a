//! # Validation Module
//!
//! Input rules for token generation and the token id numbering scheme.
//!
//! ## Token Id Numbering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Sequential Token Ids                               │
//! │                                                                         │
//! │  Existing ids:  TOKEN_0001  TOKEN_0002  TOKEN_0007                      │
//! │                                                                         │
//! │  sequence_range starts at max(1, 2, 7) + 1 = 8                          │
//! │                                                                         │
//! │  generate 3 ──► TOKEN_0008  TOKEN_0009  TOKEN_0010                      │
//! │                                                                         │
//! │  Numbering continues from the MAXIMUM, not the count, so a gap left by │
//! │  a partially synced store never produces a colliding id. An empty store │
//! │  (after a full reset) restarts at TOKEN_0001.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use gatepass_core::validation::{format_token_id, parse_generation_count};
//!
//! assert_eq!(parse_generation_count("25").unwrap(), 25);
//! assert!(parse_generation_count("0").is_err());
//! assert_eq!(format_token_id(12), "TOKEN_0012");
//! ```

use std::ops::Range;

use crate::error::ValidationError;
use crate::{TOKEN_ID_PREFIX, TOKEN_ID_WIDTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Generation Input
// =============================================================================

/// Parses the operator-entered token count.
///
/// ## Rules
/// - Must not be empty
/// - Must be a whole number
/// - Must be greater than zero
pub fn parse_generation_count(input: &str) -> ValidationResult<u32> {
    let input = input.trim();

    if input.is_empty() {
        return Err(ValidationError::Required {
            field: "count".to_string(),
        });
    }

    let count: i64 = input.parse().map_err(|_| ValidationError::InvalidFormat {
        field: "count".to_string(),
        reason: format!("'{}' is not a whole number", input),
    })?;

    validate_generation_count(count)
}

/// Checks a numeric token count.
pub fn validate_generation_count(count: i64) -> ValidationResult<u32> {
    if count <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "count".to_string(),
        });
    }

    u32::try_from(count).map_err(|_| ValidationError::InvalidFormat {
        field: "count".to_string(),
        reason: format!("{} is too large", count),
    })
}

/// Picks the display title for a batch, falling back to the event name.
pub fn resolve_title(title: Option<&str>, event_name: &str) -> String {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => event_name.to_string(),
    }
}

// =============================================================================
// Token Ids
// =============================================================================

/// Formats a sequence number as a token id (`7` → `TOKEN_0007`).
pub fn format_token_id(sequence: u64) -> String {
    format!("{}{:0width$}", TOKEN_ID_PREFIX, sequence, width = TOKEN_ID_WIDTH)
}

/// Extracts the sequence number from a token id, if it has the issued format.
pub fn parse_token_sequence(id: &str) -> Option<u64> {
    let digits = id.strip_prefix(TOKEN_ID_PREFIX)?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Returns the sequence numbers for a batch of `count` new tokens.
///
/// The range starts after the highest sequence among `ids`. Ids that do not
/// follow the `TOKEN_<n>` format are ignored. Fails instead of wrapping when
/// the numbering would pass `u64::MAX`.
pub fn sequence_range<'a>(
    ids: impl IntoIterator<Item = &'a str>,
    count: u32,
) -> ValidationResult<Range<u64>> {
    let exhausted = || ValidationError::InvalidFormat {
        field: "token id".to_string(),
        reason: "sequence numbers are exhausted".to_string(),
    };

    let first = match ids.into_iter().filter_map(parse_token_sequence).max() {
        Some(max) => max.checked_add(1).ok_or_else(exhausted)?,
        None => 1,
    };
    let end = first.checked_add(u64::from(count)).ok_or_else(exhausted)?;

    Ok(first..end)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generation_count() {
        assert_eq!(parse_generation_count("3").unwrap(), 3);
        assert_eq!(parse_generation_count("  10 ").unwrap(), 10);

        assert!(matches!(
            parse_generation_count(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            parse_generation_count("0"),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            parse_generation_count("-4"),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            parse_generation_count("ten"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_generation_count("2.5"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_resolve_title() {
        assert_eq!(resolve_title(Some("Gala"), "FRESHERS2025"), "Gala");
        assert_eq!(resolve_title(Some("   "), "FRESHERS2025"), "FRESHERS2025");
        assert_eq!(resolve_title(None, "FRESHERS2025"), "FRESHERS2025");
    }

    #[test]
    fn test_token_id_format() {
        assert_eq!(format_token_id(1), "TOKEN_0001");
        assert_eq!(format_token_id(9999), "TOKEN_9999");
        assert_eq!(format_token_id(12345), "TOKEN_12345");
    }

    #[test]
    fn test_parse_token_sequence() {
        assert_eq!(parse_token_sequence("TOKEN_0042"), Some(42));
        assert_eq!(parse_token_sequence("TOKEN_12345"), Some(12345));
        assert_eq!(parse_token_sequence("TOKEN_"), None);
        assert_eq!(parse_token_sequence("TOKEN_12a"), None);
        assert_eq!(parse_token_sequence("VIP_0001"), None);
    }

    #[test]
    fn test_sequence_range_uses_maximum() {
        assert_eq!(sequence_range([], 2).unwrap(), 1..3);
        assert_eq!(sequence_range(["TOKEN_0001", "TOKEN_0002"], 1).unwrap(), 3..4);
        assert_eq!(sequence_range(["TOKEN_0007", "TOKEN_0002"], 3).unwrap(), 8..11);
        assert_eq!(sequence_range(["custom", "TOKEN_0003"], 1).unwrap(), 4..5);
    }

    #[test]
    fn test_sequence_range_rejects_overflow() {
        assert!(matches!(
            sequence_range(["TOKEN_18446744073709551615"], 1),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            sequence_range(["TOKEN_18446744073709551614"], 2),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert_eq!(
            sequence_range(["TOKEN_18446744073709551613"], 1).unwrap(),
            u64::MAX - 1..u64::MAX
        );
    }
}
