//! Dictionary metadata and packed marker codes.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Errors raised while loading or validating a dictionary.
#[derive(thiserror::Error, Debug)]
pub enum DictionaryError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("marker_size {0} implies more than 64 bits")]
    TooManyBits(usize),
    #[error("marker_size must be > 0")]
    EmptyMarker,
    #[error("dictionary has no codes")]
    NoCodes,
}

/// A fixed ArUco-style dictionary.
///
/// Stored as JSON next to the picker configuration, e.g. an export of the
/// OpenCV `DICT_6X6_250` family:
///
/// ```json
/// { "name": "DICT_6X6_250", "marker_size": 6, "max_correction_bits": 5, "codes": [ ... ] }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    /// Human-readable name (for logging).
    pub name: String,
    /// Marker side length (number of inner bits per side).
    pub marker_size: usize,
    /// Maximum error-correcting Hamming distance supported by the dictionary.
    pub max_correction_bits: u8,
    /// One `u64` per marker id, encoding the inner `marker_size × marker_size` bits.
    ///
    /// Bits are stored in row-major order with **black = 1**.
    pub codes: Vec<u64>,
}

impl Dictionary {
    /// Total number of inner bits per marker.
    #[inline]
    pub fn bit_count(&self) -> usize {
        self.marker_size * self.marker_size
    }

    pub fn validate(&self) -> Result<(), DictionaryError> {
        if self.marker_size == 0 {
            return Err(DictionaryError::EmptyMarker);
        }
        if self.bit_count() > 64 {
            return Err(DictionaryError::TooManyBits(self.marker_size));
        }
        if self.codes.is_empty() {
            return Err(DictionaryError::NoCodes);
        }
        Ok(())
    }

    /// Parse and validate a dictionary from JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self, DictionaryError> {
        let dict: Self = serde_json::from_str(raw)?;
        dict.validate()?;
        Ok(dict)
    }

    /// Load and validate a dictionary from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Write this dictionary as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DictionaryError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
