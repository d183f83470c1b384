//! Human-readable identifiers: company abbreviation plus a zero-padded
//! sequence, at a fixed total width.

use thiserror::Error;

/// Total width of a proposal number.
pub const PROPOSAL_NUMBER_WIDTH: usize = 16;

/// Total width of a branch id.
pub const BRANCH_ID_WIDTH: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Company abbreviation is required")]
    EmptyAbbreviation,

    #[error("Company abbreviation '{0}' must be ASCII alphanumeric")]
    InvalidAbbreviation(String),

    #[error("Sequence must not be negative, got {0}")]
    NegativeSequence(i64),

    #[error("'{abbr}' with sequence {seq} does not fit in {width} characters")]
    Overflow {
        abbr: String,
        seq: i64,
        width: usize,
    },
}

/// Normalize a company abbreviation (trimmed, uppercased).
pub fn normalize_abbreviation(abbr: &str) -> Result<String, IdentifierError> {
    let abbr = abbr.trim();
    if abbr.is_empty() {
        return Err(IdentifierError::EmptyAbbreviation);
    }
    if !abbr.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(IdentifierError::InvalidAbbreviation(abbr.to_string()));
    }
    Ok(abbr.to_ascii_uppercase())
}

/// Proposal number: `ABC` + lead 42 → `ABC0000000000042`.
pub fn proposal_number(abbr: &str, lead_id: i64) -> Result<String, IdentifierError> {
    padded(abbr, lead_id, PROPOSAL_NUMBER_WIDTH)
}

/// Branch id: `ABC` + sequence 7 → `ABC0000007`.
pub fn branch_id(abbr: &str, seq: i64) -> Result<String, IdentifierError> {
    padded(abbr, seq, BRANCH_ID_WIDTH)
}

fn padded(abbr: &str, seq: i64, width: usize) -> Result<String, IdentifierError> {
    let abbr = normalize_abbreviation(abbr)?;
    if seq < 0 {
        return Err(IdentifierError::NegativeSequence(seq));
    }
    let digits = seq.to_string();
    if abbr.len() + digits.len() > width {
        return Err(IdentifierError::Overflow { abbr, seq, width });
    }
    let fill = width - abbr.len();
    Ok(format!("{abbr}{digits:0>fill$}"))
}
