//! # Router Configuration
//!
//! Turns raw command-line values into an immutable [`RouterConfig`].
//!
//! Validation happens once, before any external command runs:
//!
//! - the container id must be all digits ([`ContainerId`])
//! - an explicit target must be an IPv4 CIDR; a bare address becomes `/32` ([`Cidr`])
//! - no target means the address is detected from the running container later
//!
//! ```rust
//! use lxc_subnet_router::router::RouterConfig;
//!
//! let config = RouterConfig::validate("102", Some("192.168.1.0/24")).unwrap();
//! assert_eq!(config.container_id().as_str(), "102");
//! assert!(!config.auto_detect());
//!
//! let host = RouterConfig::validate("100", Some("192.168.129.59")).unwrap();
//! assert_eq!(host.target().unwrap().as_str(), "192.168.129.59/32");
//! ```

pub mod cidr;
pub mod container;

pub use cidr::Cidr;
pub use container::ContainerId;

use serde::Serialize;

/// Errors raised while validating user input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Container ID must be numeric, got '{0}'")]
    NonNumericContainerId(String),

    #[error("Invalid subnet format '{0}', expected a.b.c.d/n or a.b.c.d")]
    InvalidFormat(String),

    #[error("Invalid subnet '{cidr}': octet {octet} is outside 0-255")]
    OctetOutOfRange { cidr: String, octet: u16 },

    #[error("Invalid subnet '{cidr}': prefix /{prefix} is outside 0-32")]
    PrefixOutOfRange { cidr: String, prefix: u8 },

    #[error("No subnet to advertise: none was given and none could be detected")]
    UnresolvedTarget,
}

/// Validated settings for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterConfig {
    container_id: ContainerId,
    target: Option<Cidr>,
    auto_detect: bool,
}

impl RouterConfig {
    /// Validate raw values.
    ///
    /// `raw_target` is `None` when no subnet flag was given, which turns on
    /// auto-detection. A flag given with an empty value cannot be resolved.
    pub fn validate(
        raw_container_id: &str,
        raw_target: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let container_id = ContainerId::parse(raw_container_id)?;

        let target = match raw_target {
            None => None,
            Some("") => return Err(ValidationError::UnresolvedTarget),
            Some(raw) => Some(Cidr::parse(raw)?),
        };

        Ok(Self {
            container_id,
            auto_detect: target.is_none(),
            target,
        })
    }

    pub fn container_id(&self) -> &ContainerId {
        &self.container_id
    }

    /// The explicit target, if one was given
    pub fn target(&self) -> Option<&Cidr> {
        self.target.as_ref()
    }

    pub fn auto_detect(&self) -> bool {
        self.auto_detect
    }

    /// Settle on the CIDR to advertise.
    ///
    /// An explicit target always wins. Otherwise the detected address is
    /// validated as a bare IP and becomes a `/32` route.
    pub fn resolve_target(&self, detected: Option<&str>) -> Result<Cidr, ValidationError> {
        if let Some(target) = &self.target {
            return Ok(target.clone());
        }

        match detected.map(str::trim) {
            Some(address) if !address.is_empty() => Cidr::parse(address),
            _ => Err(ValidationError::UnresolvedTarget),
        }
    }
}
