//! File contents written by the provisioner.
//!
//! Everything here is pure so the generated text can be checked without a
//! Proxmox host.

use crate::env;
use crate::router::Cidr;
use std::borrow::Cow;

/// Lines granting the container access to `/dev/net/tun`
pub const LXC_TUN_ENTRIES: [&str; 2] = [
    "lxc.cgroup2.devices.allow: c 10:200 rwm",
    "lxc.mount.entry: /dev/net/tun dev/net/tun none bind,create=file",
];

/// Header line identifying generated files
const GENERATED_BY: &str = "Installed by lxc-subnet-router";

/// Attempts the boot script makes before giving up on tailscaled
const BACKEND_POLL_ATTEMPTS: u32 = 60;

const BACKEND_POLL_INTERVAL_SECS: u32 = 2;

/// sysctl drop-in enabling IPv4 and IPv6 forwarding
pub fn sysctl_conf() -> String {
    format!(
        "# {}\nnet.ipv4.ip_forward = 1\nnet.ipv6.conf.all.forwarding = 1\n",
        GENERATED_BY
    )
}

/// Add the tun device entries to an LXC config.
///
/// Returns `None` when every entry is already present. Entries go at the end
/// of the main section, before any `[snapshot]` section, so they apply to the
/// running container rather than to a snapshot.
pub fn patch_lxc_config(existing: &str) -> Option<String> {
    let lines: Vec<&str> = existing.lines().collect();
    let main_len = lines
        .iter()
        .position(|line| line.trim_start().starts_with('['))
        .unwrap_or(lines.len());

    let missing: Vec<&str> = LXC_TUN_ENTRIES
        .iter()
        .copied()
        .filter(|entry| !lines[..main_len].iter().any(|line| line.trim() == *entry))
        .collect();

    if missing.is_empty() {
        return None;
    }

    let mut patched: Vec<&str> = Vec::with_capacity(lines.len() + missing.len() + 1);
    patched.extend_from_slice(&lines[..main_len]);
    patched.extend(missing);
    if main_len < lines.len() {
        patched.push("");
        patched.extend(
            lines[main_len..]
                .iter()
                .skip_while(|line| line.trim().is_empty()),
        );
    }

    let mut out = patched.join("\n");
    out.push('\n');
    Some(out)
}

/// `ethtool` arguments enabling UDP GRO forwarding on `bridge`
pub fn bridge_tuning_args(bridge: &str) -> Vec<String> {
    vec![
        "-K".to_string(),
        bridge.to_string(),
        "rx-udp-gro-forwarding".to_string(),
        "on".to_string(),
        "rx-gro-list".to_string(),
        "off".to_string(),
    ]
}

/// ifupdown hook that re-applies the bridge tuning when `bridge` comes up
pub fn bridge_hook_script(bridge: &str) -> String {
    let ethtool = std::iter::once("ethtool".to_string())
        .chain(bridge_tuning_args(bridge).iter().map(|arg| shell_quote(arg)))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "#!/bin/sh\n\
         # Tailscale UDP throughput tuning. {generated}\n\
         [ \"$IFACE\" = {bridge} ] || exit 0\n\
         {ethtool} || true\n",
        generated = GENERATED_BY,
        bridge = shell_quote(bridge),
        ethtool = ethtool,
    )
}

/// `tailscale up` arguments advertising `cidr`
pub fn advertise_args(cidr: &Cidr) -> Vec<String> {
    vec![
        "up".to_string(),
        format!("--advertise-routes={}", cidr),
        "--accept-routes".to_string(),
        "--advertise-exit-node=false".to_string(),
    ]
}

/// Boot-time script that waits for an authenticated backend, then re-advertises
pub fn startup_script(cidr: &Cidr) -> String {
    let advertise = std::iter::once("tailscale".to_string())
        .chain(advertise_args(cidr).iter().map(|arg| shell_quote(arg)))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "#!/bin/sh\n\
         # Re-advertises Tailscale subnet routes after boot. {generated}\n\
         tries=0\n\
         until tailscale status --json 2>/dev/null | grep -q '\"BackendState\": *\"{running}\"'; do\n\
         \x20   tries=$((tries + 1))\n\
         \x20   if [ \"$tries\" -ge {attempts} ]; then\n\
         \x20       echo \"tailscale backend not running, giving up\" >&2\n\
         \x20       exit 1\n\
         \x20   fi\n\
         \x20   sleep {interval}\n\
         done\n\
         exec {advertise}\n",
        generated = GENERATED_BY,
        running = env::tailscale::RUNNING_STATE,
        attempts = BACKEND_POLL_ATTEMPTS,
        interval = BACKEND_POLL_INTERVAL_SECS,
        advertise = advertise,
    )
}

/// Oneshot systemd unit running the startup script after tailscaled
pub fn service_unit() -> String {
    format!(
        "# {generated}\n\
         [Unit]\n\
         Description=Re-advertise Tailscale subnet routes\n\
         After=network-online.target {tailscaled}.service\n\
         Wants=network-online.target {tailscaled}.service\n\
         \n\
         [Service]\n\
         Type=oneshot\n\
         ExecStart={script}\n\
         RemainAfterExit=yes\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n",
        generated = GENERATED_BY,
        tailscaled = env::container::TAILSCALED_SERVICE,
        script = env::container::STARTUP_SCRIPT_PATH,
    )
}

/// Shell snippet installing Tailscale through the official script
pub fn install_script(install_url: &str) -> String {
    format!(
        "command -v curl >/dev/null 2>&1 || (apt-get update && apt-get install -y curl) && \
         curl -fsSL {} | sh",
        shell_quote(install_url)
    )
}

fn shell_quote(value: &str) -> String {
    shell_escape::unix::escape(Cow::Borrowed(value)).into_owned()
}
