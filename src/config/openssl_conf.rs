//! The request configuration document.
//!
//! `server.conf` is an OpenSSL-style `req` configuration carrying the
//! server's common name and its subject-alternative-names. It is written
//! before any key is generated and read back when the CA signs the
//! request, so the SAN list in the final certificate comes from this
//! document.

use crate::cert::builder::validate_dns_name;
use crate::error::{DevCertError, Result};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const REQ_SECTION: &str = "req";
const DEFAULT_DN_SECTION: &str = "req_distinguished_name";
const DEFAULT_EXT_SECTION: &str = "v3_req";
const ALT_NAMES_SECTION: &str = "alt_names";

/// Subject and SAN list of the server certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    /// Common name placed in the request subject.
    pub common_name: String,
    /// DNS subject-alternative-names, in order.
    pub dns_names: Vec<String>,
}

impl RequestConfig {
    /// Create a request config, validating every DNS name.
    pub fn new(common_name: impl Into<String>, dns_names: Vec<String>) -> Result<Self> {
        let config = Self {
            common_name: common_name.into(),
            dns_names,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.common_name.trim().is_empty() {
            return Err(DevCertError::Config(
                "Request common name cannot be empty".to_string(),
            ));
        }
        if self.dns_names.is_empty() {
            return Err(DevCertError::Config(
                "At least one DNS subject-alternative-name is required".to_string(),
            ));
        }
        for name in &self.dns_names {
            validate_dns_name(name)?;
        }
        Ok(())
    }

    /// Render the document in OpenSSL `req` configuration syntax.
    pub fn render(&self) -> String {
        let mut out = String::new();

        // Writing to a String cannot fail
        let _ = writeln!(out, "[{}]", REQ_SECTION);
        let _ = writeln!(out, "prompt = no");
        let _ = writeln!(out, "distinguished_name = {}", DEFAULT_DN_SECTION);
        let _ = writeln!(out, "req_extensions = {}", DEFAULT_EXT_SECTION);
        let _ = writeln!(out);
        let _ = writeln!(out, "[{}]", DEFAULT_DN_SECTION);
        let _ = writeln!(out, "CN = {}", self.common_name);
        let _ = writeln!(out);
        let _ = writeln!(out, "[{}]", DEFAULT_EXT_SECTION);
        let _ = writeln!(out, "subjectAltName = @{}", ALT_NAMES_SECTION);
        let _ = writeln!(out);
        let _ = writeln!(out, "[{}]", ALT_NAMES_SECTION);
        for (index, name) in self.dns_names.iter().enumerate() {
            let _ = writeln!(out, "DNS.{} = {}", index + 1, name);
        }

        out
    }

    /// Parse a document produced by [`RequestConfig::render`] or written by hand.
    ///
    /// Section and key names follow OpenSSL conventions: the `[req]`
    /// section names the DN and extension sections, `subjectAltName` is
    /// either an `@section` reference or an inline `DNS:a,DNS:b` list.
    pub fn parse(text: &str) -> Result<Self> {
        let sections = parse_sections(text)?;

        let req = sections.get(REQ_SECTION);
        let lookup = |key: &str, default: &str| -> String {
            req.and_then(|entries| find(entries, key))
                .unwrap_or(default)
                .to_string()
        };
        let dn_section = lookup("distinguished_name", DEFAULT_DN_SECTION);
        let ext_section = lookup("req_extensions", DEFAULT_EXT_SECTION);

        let common_name = sections
            .get(&dn_section)
            .and_then(|entries| find(entries, "CN").or_else(|| find(entries, "commonName")))
            .ok_or_else(|| {
                DevCertError::Parse(format!("No CN found in section [{}]", dn_section))
            })?
            .to_string();

        let san = sections
            .get(&ext_section)
            .and_then(|entries| find(entries, "subjectAltName"))
            .ok_or_else(|| {
                DevCertError::Parse(format!(
                    "No subjectAltName found in section [{}]",
                    ext_section
                ))
            })?;

        let dns_names = match san.strip_prefix('@') {
            Some(section) => {
                let entries = sections.get(section.trim()).ok_or_else(|| {
                    DevCertError::Parse(format!("Missing section [{}]", section.trim()))
                })?;
                indexed_dns_entries(entries)?
            }
            None => inline_dns_entries(san)?,
        };

        Self::new(common_name, dns_names)
    }

    /// Read and parse a configuration document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }
}

type Entries = Vec<(String, String)>;

fn parse_sections(text: &str) -> Result<HashMap<String, Entries>> {
    let mut sections: HashMap<String, Entries> = HashMap::new();
    let mut current = String::new();

    for (number, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            current = name.trim().to_string();
            sections.entry(current.clone()).or_default();
            continue;
        }

        let (key, value) = line.split_once('=').ok_or_else(|| {
            DevCertError::Parse(format!("Line {}: expected 'key = value'", number + 1))
        })?;

        sections
            .entry(current.clone())
            .or_default()
            .push((key.trim().to_string(), value.trim().to_string()));
    }

    Ok(sections)
}

fn find<'a>(entries: &'a Entries, key: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn indexed_dns_entries(entries: &Entries) -> Result<Vec<String>> {
    let mut indexed = Vec::new();

    for (key, value) in entries {
        let Some(index) = key.strip_prefix("DNS.") else {
            continue;
        };
        let index: u32 = index
            .parse()
            .map_err(|_| DevCertError::Parse(format!("Invalid SAN key: {}", key)))?;
        indexed.push((index, value.clone()));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, name)| name).collect())
}

fn inline_dns_entries(value: &str) -> Result<Vec<String>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| entry.split_once(':'))
        .filter(|(kind, _)| kind.trim() == "DNS")
        .map(|(_, name)| Ok(name.trim().to_string()))
        .collect()
}
