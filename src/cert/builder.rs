//! Certificate builder utilities.
//!
//! Shared helpers for turning user input (subject strings, DNS names,
//! validity periods) into rcgen certificate parameters.

use crate::error::{DevCertError, Result};
use rcgen::string::Ia5String;
use rcgen::{CertificateParams, DistinguishedName, DnType, SanType};
use std::net::IpAddr;
use time::{Duration, OffsetDateTime};

/// Backdating applied to `not_before` to tolerate small clock skew.
const CLOCK_SKEW_MINUTES: i64 = 5;

/// Parse a subject string (e.g., "CN=example.com,O=Example Org") into a DistinguishedName.
///
/// A bare value without any `KEY=` prefix is treated as a common name.
///
/// # Example
///
/// ```
/// use devcert::cert::builder::parse_subject;
///
/// let dn = parse_subject("CN=example.com,O=Example Org").unwrap();
/// ```
pub fn parse_subject(subject: &str) -> Result<DistinguishedName> {
    let mut dn = DistinguishedName::new();

    let trimmed = subject.trim();
    if !trimmed.is_empty() && !trimmed.contains('=') && !trimmed.contains(',') {
        dn.push(DnType::CommonName, trimmed);
        return Ok(dn);
    }

    for part in subject.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some((key, value)) = part.split_once('=') {
            let key = key.trim();
            let value = value.trim();

            if value.is_empty() {
                return Err(DevCertError::Parse(format!("Empty value for {}", key)));
            }

            let dn_type = match key.to_uppercase().as_str() {
                "CN" => DnType::CommonName,
                "C" => DnType::CountryName,
                "O" => DnType::OrganizationName,
                "OU" => DnType::OrganizationalUnitName,
                "ST" => DnType::StateOrProvinceName,
                "L" => DnType::LocalityName,
                _ => return Err(DevCertError::Parse(format!("Unknown DN type: {}", key))),
            };

            dn.push(dn_type, value);
        } else {
            return Err(DevCertError::Parse(format!(
                "Invalid subject format: {}",
                part
            )));
        }
    }

    if dn.iter().next().is_none() {
        return Err(DevCertError::Parse("Subject cannot be empty".to_string()));
    }

    Ok(dn)
}

/// Convert DNS names into SAN entries, preserving order.
pub fn dns_sans(names: &[String]) -> Result<Vec<SanType>> {
    names
        .iter()
        .map(|name| {
            Ia5String::try_from(name.clone())
                .map(SanType::DnsName)
                .map_err(|e| DevCertError::Parse(format!("Invalid DNS name '{}': {}", name, e)))
        })
        .collect()
}

/// Check that a DNS name is usable as a SAN entry.
///
/// Accepts a single leading wildcard label (`*.example.com`). IP literals
/// are rejected; they belong in an IP SAN, not a DNS one.
pub fn validate_dns_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| DevCertError::Parse(format!("Invalid DNS name '{}': {}", name, reason));

    if name.is_empty() {
        return Err(invalid("empty"));
    }
    if name.len() > 253 {
        return Err(invalid("longer than 253 characters"));
    }

    if name.parse::<IpAddr>().is_ok() {
        return Err(invalid("IP addresses are not DNS names"));
    }

    let host = name.strip_prefix("*.").unwrap_or(name);
    if host
        .rsplit('.')
        .next()
        .is_some_and(|tld| !tld.is_empty() && tld.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(invalid("top-level label cannot be all digits"));
    }

    for label in host.split('.') {
        if label.is_empty() || label.len() > 63 {
            return Err(invalid("label must be 1-63 characters"));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(invalid("label cannot start or end with '-'"));
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(invalid("only letters, digits and '-' are allowed"));
        }
    }

    Ok(())
}

/// Set validity period for a certificate, starting now.
pub fn set_validity(params: &mut CertificateParams, days: u32) {
    let now = OffsetDateTime::now_utc();
    params.not_before = now - Duration::minutes(CLOCK_SKEW_MINUTES);
    params.not_after = now + Duration::days(i64::from(days));
}
