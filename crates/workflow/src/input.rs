// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::ValidationError;

/// Parse user input into the `euint32` the board stores.
///
/// Accepts optional surrounding whitespace and a leading sign. Anything that is not a plain
/// base-10 integer is rejected, as is any integer outside `[0, u32::MAX]`.
pub fn parse_secret_number(raw: &str) -> Result<u32, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    let digits = trimmed
        .strip_prefix(|c| c == '+' || c == '-')
        .unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::NotAnInteger(trimmed.to_string()));
    }

    // Only overflow can fail here
    let value = trimmed
        .parse::<i128>()
        .map_err(|_| ValidationError::OutOfRange(trimmed.to_string()))?;
    u32::try_from(value).map_err(|_| ValidationError::OutOfRange(trimmed.to_string()))
}
