//! CA serial-number tracking.
//!
//! The serial file holds the last serial number issued by a CA as
//! uppercase hex. Signing reads it and increments it; if the file does not
//! exist a random serial is used. The new value is only written back with
//! [`record_serial`] once a certificate has actually been issued.

use crate::error::{DevCertError, Result};
use rand::RngCore;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Length of freshly generated serial numbers, in bytes.
const SERIAL_LEN: usize = 20;

/// Generate a random positive serial number.
pub fn random_serial() -> Vec<u8> {
    let mut bytes = vec![0u8; SERIAL_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes[0] &= 0x7F; // Ensure positive
    if bytes[0] == 0 {
        bytes[0] = 0x01; // Keep the full length after DER minimal encoding
    }
    bytes
}

/// Increment a big-endian unsigned integer by one.
///
/// Grows the value by one byte on overflow and keeps the top bit clear so
/// the DER INTEGER stays positive.
pub fn increment(serial: &[u8]) -> Vec<u8> {
    let mut next = serial.to_vec();

    for byte in next.iter_mut().rev() {
        let (value, overflow) = byte.overflowing_add(1);
        *byte = value;
        if !overflow {
            break;
        }
    }

    if next.iter().all(|b| *b == 0) {
        next.insert(0, 0x01);
    }
    if next[0] & 0x80 != 0 {
        next.insert(0, 0x00);
    }

    next
}

/// Parse the contents of a serial file.
pub fn parse_serial(contents: &str) -> Result<Vec<u8>> {
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        return Err(DevCertError::Parse("Serial file is empty".to_string()));
    }

    let padded = if trimmed.len() % 2 == 1 {
        format!("0{}", trimmed)
    } else {
        trimmed.to_string()
    };

    hex::decode(&padded)
        .map_err(|e| DevCertError::Parse(format!("Invalid serial '{}': {}", trimmed, e)))
}

/// Format a serial for the serial file.
pub fn format_serial(serial: &[u8]) -> String {
    format!("{}\n", hex::encode_upper(serial))
}

/// Determine the next serial for a CA without consuming it.
pub fn next_serial(serial_file: &Path) -> Result<Vec<u8>> {
    match fs::read_to_string(serial_file) {
        Ok(contents) => Ok(increment(&parse_serial(&contents)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %serial_file.display(), "no CA serial file, using a random serial");
            Ok(random_serial())
        }
        Err(e) => Err(DevCertError::Storage(e)),
    }
}

/// Record an issued serial in the serial file, creating it if missing.
pub fn record_serial(serial_file: &Path, serial: &[u8]) -> Result<()> {
    fs::write(serial_file, format_serial(serial))?;
    debug!(path = %serial_file.display(), "updated CA serial file");
    Ok(())
}
