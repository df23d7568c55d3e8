// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fax number normalization to E.164.
//!
//! Recipients store fax numbers in whatever format a human typed. The
//! orchestrator needs one canonical form for submission and for the
//! duplicate guard, and persists the result back onto the recipient
//! record. Numbers that cannot be made canonical are reported as
//! unparseable so the caller can clear the stored value.

/// Normalize a raw fax number to E.164.
///
/// Accepts `+`-prefixed international numbers, `00`-prefixed dial strings,
/// and nationally formatted numbers with a trunk `0`, which are resolved
/// against `default_country` (a bare country calling code like `"49"`).
/// Separator characters (spaces, dashes, dots, slashes, parentheses) are
/// ignored. Returns `None` when no E.164 interpretation exists.
pub fn normalize(raw: &str, default_country: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '/' | '.' | '(' | ')'))
        .collect();

    let (international, digits) = match cleaned.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let e164 = if international {
        digits.to_string()
    } else if let Some(rest) = digits.strip_prefix("00") {
        rest.to_string()
    } else if let Some(rest) = digits.strip_prefix('0') {
        format!("{default_country}{rest}")
    } else {
        // No trunk prefix and no country indicator: ambiguous.
        return None;
    };

    // E.164 allows at most 15 digits; anything under 7 is noise. Country
    // codes never start with 0.
    if e164.len() < 7 || e164.len() > 15 || e164.starts_with('0') {
        return None;
    }

    Some(format!("+{e164}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_canonical_numbers_pass_through() {
        assert_eq!(
            normalize("+49301234567", "49").as_deref(),
            Some("+49301234567")
        );
    }

    #[test]
    fn formatted_international_number_is_canonicalized() {
        assert_eq!(
            normalize("+49 30 1234567", "49").as_deref(),
            Some("+49301234567")
        );
        assert_eq!(
            normalize("+49 (30) 123-45.67", "49").as_deref(),
            Some("+49301234567")
        );
    }

    #[test]
    fn national_number_gets_default_country() {
        assert_eq!(
            normalize("030 1234567", "49").as_deref(),
            Some("+49301234567")
        );
    }

    #[test]
    fn double_zero_prefix_is_international() {
        assert_eq!(
            normalize("0049 30 1234567", "49").as_deref(),
            Some("+49301234567")
        );
    }

    #[test]
    fn garbage_is_unparseable() {
        for raw in ["", "not a number", "+49 30 CALL-ME", "12345", "1234567890123456"] {
            assert_eq!(normalize(raw, "49"), None, "raw {raw:?}");
        }
    }

    #[test]
    fn bare_digits_without_prefix_are_ambiguous() {
        assert_eq!(normalize("301234567", "49"), None);
    }
}
