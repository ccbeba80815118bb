//! IPv4 CIDR validation and `/32` normalization.

use super::ValidationError;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::LazyLock;

static BARE_IPV4: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+\.[0-9]+$").expect("valid regex"));

static CIDR_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,3}\.){3}[0-9]{1,3}/[0-9]{1,2}$").expect("valid regex")
});

/// Longest prefix an IPv4 network can carry
pub const MAX_PREFIX: u8 = 32;

/// A validated IPv4 CIDR.
///
/// The text is kept exactly as supplied (after `/32` normalization of a bare
/// address), so `010.0.0.1/24` stays `010.0.0.1/24` when displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cidr {
    text: String,
    octets: [u8; 4],
    prefix: u8,
}

impl Cidr {
    /// Validate `input` as a CIDR or a bare IPv4 address.
    ///
    /// A bare dotted quad is upgraded to a host route by appending `/32`
    /// before the shape and range checks run.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let text = if BARE_IPV4.is_match(input) {
            format!("{}/{}", input, MAX_PREFIX)
        } else {
            input.to_string()
        };

        if !CIDR_SHAPE.is_match(&text) {
            return Err(ValidationError::InvalidFormat(input.to_string()));
        }

        // The shape check guarantees exactly one '/' and four dot-separated parts.
        let (address, prefix) = text
            .split_once('/')
            .ok_or_else(|| ValidationError::InvalidFormat(input.to_string()))?;

        let mut octets = [0u8; 4];
        for (slot, part) in octets.iter_mut().zip(address.split('.')) {
            let value: u16 = part
                .parse()
                .map_err(|_| ValidationError::InvalidFormat(input.to_string()))?;
            *slot = u8::try_from(value).map_err(|_| ValidationError::OctetOutOfRange {
                cidr: text.clone(),
                octet: value,
            })?;
        }

        let prefix: u8 = prefix
            .parse()
            .map_err(|_| ValidationError::InvalidFormat(input.to_string()))?;
        if prefix > MAX_PREFIX {
            return Err(ValidationError::PrefixOutOfRange {
                cidr: text.clone(),
                prefix,
            });
        }

        Ok(Self {
            text,
            octets,
            prefix,
        })
    }

    /// The validated text, e.g. `192.168.1.0/24`
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn address(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.octets)
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix
    }

    /// True for a single-address (`/32`) route
    pub fn is_host_route(&self) -> bool {
        self.prefix == MAX_PREFIX
    }
}

impl FromStr for Cidr {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Cidr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}
