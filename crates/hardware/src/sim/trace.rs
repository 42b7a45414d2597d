//! Memory Access Trace Parser.
//!
//! A trace is plain text with one access per line:
//!
//! ```text
//! # op  address  [core]
//! R     0x1000
//! W     4160     1
//! ```
//!
//! The operation is `R` or `W` (case-insensitive), the address is decimal or
//! `0x`-prefixed hexadecimal, and the optional core id defaults to 0. Text after
//! `#` and blank lines are ignored.

use std::fs;
use std::path::Path;

use crate::common::{Request, RequestType, TraceError};

/// Parses a trace held in memory.
///
/// # Errors
///
/// Returns [`TraceError::Parse`] for the first malformed line.
///
/// # Examples
///
/// ```
/// use pfsim_core::sim::trace::parse_trace;
///
/// let reqs = parse_trace("R 0x40\nW 128 1 # store\n").unwrap();
/// assert_eq!(reqs.len(), 2);
/// assert_eq!(reqs[0].addr, 0x40);
/// assert_eq!(reqs[1].core_id, 1);
/// ```
pub fn parse_trace(text: &str) -> Result<Vec<Request>, TraceError> {
    let mut requests = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let body = raw.split_once('#').map_or(raw, |(before, _)| before).trim();
        if body.is_empty() {
            continue;
        }
        let fail = |reason: &'static str| TraceError::Parse {
            line: idx + 1,
            content: raw.to_string(),
            reason,
        };

        let mut fields = body.split_whitespace();
        let req_type = match fields.next() {
            Some(op) if op.eq_ignore_ascii_case("r") => RequestType::Read,
            Some(op) if op.eq_ignore_ascii_case("w") => RequestType::Write,
            _ => return Err(fail("operation must be R or W")),
        };
        let addr = fields
            .next()
            .and_then(parse_addr)
            .ok_or_else(|| fail("missing or invalid address"))?;
        let core_id = match fields.next() {
            Some(core) => core.parse().map_err(|_| fail("invalid core id"))?,
            None => 0,
        };
        if fields.next().is_some() {
            return Err(fail("unexpected trailing field"));
        }

        requests.push(Request::new(addr, req_type, core_id));
    }
    Ok(requests)
}

/// Reads and parses a trace file.
///
/// # Errors
///
/// Returns [`TraceError::Io`] if the file cannot be read, or
/// [`TraceError::Parse`] for the first malformed line.
pub fn load_trace(path: impl AsRef<Path>) -> Result<Vec<Request>, TraceError> {
    let text = fs::read_to_string(path)?;
    parse_trace(&text)
}

fn parse_addr(field: &str) -> Option<u64> {
    match field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => field.parse().ok(),
    }
}
