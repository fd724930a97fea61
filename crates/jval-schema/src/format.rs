//! # String Formats
//!
//! Checks for the `format` keyword. Only strings are checked; formats not
//! listed here pass, as JSON Schema leaves them to the implementation.

use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, NaiveDate};
use jval_core::JsonPointer;
use url::Url;

use crate::pattern::Pattern;

/// Formats with a check.
pub const KNOWN_FORMATS: &[&str] = &[
    "date-time",
    "date",
    "time",
    "email",
    "hostname",
    "ipv4",
    "ipv6",
    "uri",
    "uri-reference",
    "uuid",
    "regex",
    "json-pointer",
];

/// Whether `value` conforms to `format`. Unknown formats always conform.
pub fn conforms(format: &str, value: &str) -> bool {
    match format {
        "date-time" => DateTime::parse_from_rfc3339(value).is_ok(),
        "date" => is_date(value),
        "time" => is_time(value),
        "email" => is_email(value),
        "hostname" => is_hostname(value),
        "ipv4" => value.parse::<Ipv4Addr>().is_ok(),
        "ipv6" => value.parse::<Ipv6Addr>().is_ok(),
        "uri" => !value.contains(char::is_whitespace) && Url::parse(value).is_ok(),
        "uri-reference" => is_uri_reference(value),
        "uuid" => value.len() == 36 && uuid::Uuid::parse_str(value).is_ok(),
        "regex" => Pattern::new(value).is_ok(),
        "json-pointer" => JsonPointer::parse(value).is_ok(),
        _ => true,
    }
}

fn is_date(value: &str) -> bool {
    value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// RFC 3339 `full-time`: `hh:mm:ss[.frac](Z|±hh:mm)`.
fn is_time(value: &str) -> bool {
    DateTime::parse_from_rfc3339(&format!("1970-01-01T{value}")).is_ok()
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local.len() <= 64
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_graphic() && !"()<>[]:;@\\,\"".contains(c));
    let domain_ok = match domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        Some(literal) => literal.parse::<Ipv4Addr>().is_ok()
            || literal
                .strip_prefix("IPv6:")
                .is_some_and(|v6| v6.parse::<Ipv6Addr>().is_ok()),
        None => is_hostname(domain),
    };
    local_ok && domain_ok
}

fn is_hostname(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 253
        && value.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        })
}

fn is_uri_reference(value: &str) -> bool {
    if value.contains(char::is_whitespace) || value.contains('\\') {
        return false;
    }
    Url::parse("http://reference.invalid/")
        .and_then(|base| base.join(value))
        .is_ok()
}
