//! Parsing of tool output gathered from inside the container.

use serde::Deserialize;

/// Command listing global-scope IPv4 addresses, one per line
pub const GLOBAL_IPV4_ARGV: [&str; 7] = ["ip", "-4", "-o", "addr", "show", "scope", "global"];

/// First address in `ip -4 -o addr show scope global` output.
///
/// Lines look like
/// `2: eth0    inet 192.168.1.50/24 brd 192.168.1.255 scope global eth0`.
pub fn first_global_ipv4(output: &str) -> Option<&str> {
    output.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        fields.find(|field| *field == "inet")?;
        let address = fields.next()?;
        Some(address.split('/').next().unwrap_or(address))
    })
}

/// The part of `tailscale status --json` the provisioner reads
#[derive(Debug, Deserialize)]
struct TailscaleStatus {
    #[serde(rename = "BackendState")]
    backend_state: String,
}

/// `BackendState` from `tailscale status --json`, e.g. `Running` or `NeedsLogin`
pub fn backend_state(json: &str) -> Result<String, serde_json::Error> {
    serde_json::from_str::<TailscaleStatus>(json).map(|status| status.backend_state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_global_ipv4() {
        let output = "\
2: eth0    inet 192.168.1.50/24 brd 192.168.1.255 scope global dynamic eth0\\       valid_lft 86000sec preferred_lft 86000sec
3: eth1    inet 10.10.0.2/16 brd 10.10.255.255 scope global eth1\\       valid_lft forever preferred_lft forever
";
        assert_eq!(first_global_ipv4(output), Some("192.168.1.50"));
    }

    #[test]
    fn test_first_global_ipv4_skips_noise() {
        let output = "Warning: something odd\n4: eth0    inet 172.16.5.9/12 scope global eth0\n";
        assert_eq!(first_global_ipv4(output), Some("172.16.5.9"));
    }

    #[test]
    fn test_first_global_ipv4_empty() {
        assert_eq!(first_global_ipv4(""), None);
        assert_eq!(first_global_ipv4("1: lo    inet6 ::1/128 scope host\n"), None);
    }

    #[test]
    fn test_backend_state() {
        let json = r#"{
  "Version": "1.76.1",
  "TUN": true,
  "BackendState": "Running",
  "Self": {"HostName": "router"}
}"#;
        assert_eq!(backend_state(json).unwrap(), "Running");
        assert_eq!(
            backend_state(r#"{"BackendState": "NeedsLogin"}"#).unwrap(),
            "NeedsLogin"
        );
        assert!(backend_state("not json").is_err());
    }
}
