//! Record leader parsing.
//!
//! Every ISO 2709 record starts with a 24-byte leader. The decoder only needs
//! the two addresses that locate the directory and data area; the mapper
//! reads single bytes such as position 6 (type of record) through
//! [`Leader::byte`].
//!
//! - Positions 0-4: Record length (5 digits)
//! - Position 5: Record status
//! - Position 6: Type of record
//! - Position 7: Bibliographic level
//! - Position 9: Character coding scheme
//! - Positions 12-16: Base address of data (5 digits)

use crate::error::{IngestError, Result};

/// Length of a leader in bytes.
pub const LEADER_LEN: usize = 24;

/// The 24-byte leader of a decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leader {
    /// Record length (5 digits) - positions 0-4
    pub record_length: u32,
    /// Record status - position 5
    pub record_status: char,
    /// Type of record - position 6
    pub record_type: char,
    /// Bibliographic level - position 7
    pub bibliographic_level: char,
    /// Character coding scheme - position 9
    pub character_coding: char,
    /// Base address of data (5 digits) - positions 12-16
    pub data_base_address: u32,
    raw: Vec<u8>,
}

impl Leader {
    /// Parse a leader from the first 24 bytes of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::InvalidLeader`] if fewer than 24 bytes are
    /// given or a numeric position holds non-digits.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < LEADER_LEN {
            return Err(IngestError::InvalidLeader(format!(
                "Leader must be at least {LEADER_LEN} bytes, got {}",
                bytes.len()
            )));
        }

        Ok(Leader {
            record_length: parse_digits(&bytes[0..5])?,
            record_status: bytes[5] as char,
            record_type: bytes[6] as char,
            bibliographic_level: bytes[7] as char,
            character_coding: bytes[9] as char,
            data_base_address: parse_digits(&bytes[12..17])?,
            raw: bytes[..LEADER_LEN].to_vec(),
        })
    }

    /// A leader for records assembled in memory rather than decoded.
    ///
    /// Lengths are zero; the type of record is `record_type`.
    #[must_use]
    pub fn for_type(record_type: char) -> Self {
        let mut raw = b"00000nam a2200000 a 4500".to_vec();
        if record_type.is_ascii() {
            raw[6] = record_type as u8;
        }
        Leader {
            record_length: 0,
            record_status: 'n',
            record_type,
            bibliographic_level: 'm',
            character_coding: 'a',
            data_base_address: 0,
            raw,
        }
    }

    /// The raw byte at `position`, if the position is inside the leader.
    #[must_use]
    pub fn byte(&self, position: usize) -> Option<u8> {
        self.raw.get(position).copied()
    }

    /// Validate that the leader is suitable for binary record reading.
    ///
    /// Checks that `record_length` and `data_base_address` are at least 24
    /// and that the base address falls inside the record.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first violated constraint.
    pub fn validate_for_reading(&self) -> Result<()> {
        if (self.record_length as usize) < LEADER_LEN {
            return Err(IngestError::InvalidLeader(format!(
                "Record length must be at least {LEADER_LEN}, got {}",
                self.record_length
            )));
        }
        if (self.data_base_address as usize) < LEADER_LEN {
            return Err(IngestError::InvalidLeader(format!(
                "Base address of data must be at least {LEADER_LEN}, got {}",
                self.data_base_address
            )));
        }
        if self.data_base_address > self.record_length {
            return Err(IngestError::InvalidLeader(format!(
                "Base address {} lies beyond record length {}",
                self.data_base_address, self.record_length
            )));
        }
        Ok(())
    }
}

/// Parse 5-digit ASCII number from bytes
fn parse_digits(bytes: &[u8]) -> Result<u32> {
    let mut result = 0u32;
    for &byte in bytes {
        if !byte.is_ascii_digit() {
            return Err(IngestError::InvalidLeader(format!(
                "Invalid numeric field: '{}'",
                String::from_utf8_lossy(bytes)
            )));
        }
        result = result * 10 + u32::from(byte - b'0');
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leader_from_bytes() {
        let leader = Leader::from_bytes(b"01234cjm a2200157 a 4500").unwrap();

        assert_eq!(leader.record_length, 1234);
        assert_eq!(leader.record_status, 'c');
        assert_eq!(leader.record_type, 'j');
        assert_eq!(leader.bibliographic_level, 'm');
        assert_eq!(leader.character_coding, 'a');
        assert_eq!(leader.data_base_address, 157);
        assert_eq!(leader.byte(6), Some(b'j'));
        assert_eq!(leader.byte(24), None);
    }

    #[test]
    fn test_leader_too_short() {
        assert!(Leader::from_bytes(b"0123456789012").is_err());
    }

    #[test]
    fn test_leader_non_numeric_length() {
        let err = Leader::from_bytes(b"0x234nam a2200157 a 4500").unwrap_err();
        assert!(err.to_string().contains("Invalid numeric field"));
    }

    #[test]
    fn test_for_type_sets_position_six() {
        let leader = Leader::for_type('g');
        assert_eq!(leader.record_type, 'g');
        assert_eq!(leader.byte(6), Some(b'g'));
    }

    #[test]
    fn test_validate_for_reading_rejects_small_record_length() {
        let leader = Leader::from_bytes(b"00010nam a2200025 i 4500").unwrap();
        let err = leader.validate_for_reading().unwrap_err().to_string();
        assert!(err.contains("Record length must be at least 24"), "got: {err}");
    }

    #[test]
    fn test_validate_for_reading_rejects_small_base_address() {
        let leader = Leader::from_bytes(b"00050nam a2200010 i 4500").unwrap();
        let err = leader.validate_for_reading().unwrap_err().to_string();
        assert!(
            err.contains("Base address of data must be at least 24"),
            "got: {err}"
        );
    }

    #[test]
    fn test_validate_for_reading_rejects_base_past_end() {
        let leader = Leader::from_bytes(b"00050nam a2200090 i 4500").unwrap();
        assert!(leader.validate_for_reading().is_err());
    }
}
