//! Serial-number mask evaluation.
//!
//! An equipment type's mask is a fixed-length template where each character
//! selects a class for the character at the same position in a serial number:
//! `N` digit, `A` uppercase letter, `a` lowercase letter, `X` uppercase letter
//! or digit, `Z` one of `-`, `_`, `@`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::error::{AppError, AppResult};

struct MaskClass {
    pattern: Regex,
    message: &'static str,
}

/// Class table, built once. Adding a mask class means adding one entry here.
static MASK_CLASSES: Lazy<HashMap<char, MaskClass>> = Lazy::new(|| {
    let classes = [
        ('N', r"^[0-9]$", "must be a digit (0-9)"),
        ('A', r"^[A-Z]$", "must be an uppercase letter"),
        ('a', r"^[a-z]$", "must be a lowercase letter"),
        ('X', r"^[A-Z0-9]$", "must be an uppercase letter or digit"),
        ('Z', r"^[-_@]$", "must be one of: -, _, @"),
    ];
    classes
        .into_iter()
        .map(|(c, pattern, message)| {
            let pattern = Regex::new(pattern).unwrap();
            (c, MaskClass { pattern, message })
        })
        .collect()
});

/// Validates a serial number against an equipment type's mask.
///
/// Returns the ordered list of validation messages (empty when the serial
/// number conforms). A length mismatch yields a single message and skips the
/// per-character walk. All positional violations are collected; positions are
/// 1-based in messages.
///
/// An unrecognized mask character is a defect in the equipment type record,
/// not a user input error, and fails the call with [`AppError::InvalidMask`].
pub fn evaluate(serial_number: &str, mask: &str) -> AppResult<Vec<String>> {
    let sn_len = serial_number.chars().count();
    let mask_len = mask.chars().count();
    if sn_len != mask_len {
        return Ok(vec![format!(
            "Serial number must be {} characters long, current length: {}",
            mask_len, sn_len
        )]);
    }

    let mut errors = Vec::new();
    for (i, (ch, mask_char)) in serial_number.chars().zip(mask.chars()).enumerate() {
        let class = MASK_CLASSES.get(&mask_char).ok_or_else(|| {
            AppError::InvalidMask(format!(
                "Unknown mask character '{}' at position {}",
                mask_char,
                i + 1
            ))
        })?;

        if !class.pattern.is_match(ch.encode_utf8(&mut [0; 4])) {
            errors.push(format!(
                "Character at position {} {}",
                i + 1,
                class.message
            ));
        }
    }

    Ok(errors)
}
