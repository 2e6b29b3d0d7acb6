// ABOUTME: Small shared helpers for logging-safe token masking
// ABOUTME: Keeps credential material out of log output
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared utility helpers.

/// Mask a sensitive value for logging, keeping only a short suffix visible.
///
/// Values shorter than or equal to `visible_chars` are fully masked so a
/// short secret is never revealed in full.
#[must_use]
pub fn mask_sensitive(value: &str, visible_chars: usize) -> String {
    if value.is_empty() || value.len() <= visible_chars {
        return "***".to_owned();
    }
    let suffix: String = value
        .chars()
        .skip(value.chars().count().saturating_sub(visible_chars))
        .collect();
    format!("...{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_sensitive_long_value() {
        assert_eq!(mask_sensitive("ya29.a0AbCdEfGh", 4), "...EfGh");
    }

    #[test]
    fn test_mask_sensitive_short_value() {
        assert_eq!(mask_sensitive("abc", 4), "***");
        assert_eq!(mask_sensitive("", 4), "***");
    }
}
