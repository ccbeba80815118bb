//! Integration tests for CLI functionality
//!
//! These tests drive token lists through parsing and validation together, the
//! way the binary does. Unit tests for individual functions are located in the
//! respective module files.

use lxc_subnet_router::cli::{ArgsError, Invocation, parse_args};
use lxc_subnet_router::router::{RouterConfig, ValidationError};

#[derive(Debug)]
enum Outcome {
    Help,
    Args(ArgsError),
    Invalid(ValidationError),
    Config(RouterConfig),
}

fn resolve(tokens: &[&str]) -> Outcome {
    match parse_args(tokens.iter().copied()) {
        Ok(Invocation::Help(_)) => Outcome::Help,
        Ok(Invocation::Run(raw)) => match raw.into_config() {
            Ok(config) => Outcome::Config(config),
            Err(e) => Outcome::Invalid(e),
        },
        Err(e) => Outcome::Args(e),
    }
}

fn config(tokens: &[&str]) -> RouterConfig {
    match resolve(tokens) {
        Outcome::Config(config) => config,
        other => panic!("Expected a config for {:?}, got {:?}", tokens, other),
    }
}

fn invalid(tokens: &[&str]) -> ValidationError {
    match resolve(tokens) {
        Outcome::Invalid(e) => e,
        other => panic!("Expected a validation error for {:?}, got {:?}", tokens, other),
    }
}

#[test]
fn test_container_and_subnet() {
    let config = config(&["-c", "102", "-s", "192.168.1.0/24"]);

    assert_eq!(config.container_id().as_str(), "102");
    assert_eq!(config.target().unwrap().as_str(), "192.168.1.0/24");
    assert!(!config.auto_detect());
}

#[test]
fn test_bare_ip_becomes_host_route() {
    let subnet_config = config(&["--subnet", "192.168.129.59"]);
    assert_eq!(subnet_config.target().unwrap().as_str(), "192.168.129.59/32");

    let ip_config = config(&["--ipaddr", "10.1.2.3"]);
    assert_eq!(ip_config.target().unwrap().as_str(), "10.1.2.3/32");
}

#[test]
fn test_defaults_enable_auto_detect() {
    let config = config(&[]);

    assert_eq!(config.container_id().as_str(), "100");
    assert!(config.target().is_none());
    assert!(config.auto_detect());
}

#[test]
fn test_non_numeric_container() {
    assert!(matches!(
        invalid(&["--container", "abc"]),
        ValidationError::NonNumericContainerId(_)
    ));
    assert!(matches!(
        invalid(&["-c", "-1"]),
        ValidationError::NonNumericContainerId(_)
    ));
}

#[test]
fn test_range_errors() {
    assert!(matches!(
        invalid(&["--subnet", "10.0.0.0/40"]),
        ValidationError::PrefixOutOfRange { .. }
    ));
    assert!(matches!(
        invalid(&["-s", "192.168.1.300/24"]),
        ValidationError::OctetOutOfRange { .. }
    ));
}

#[test]
fn test_format_errors() {
    for target in ["192.168.1", "192.168.1.0/24/extra", "router.lan"] {
        assert!(
            matches!(
                invalid(&["-s", target]),
                ValidationError::InvalidFormat(_)
            ),
            "expected InvalidFormat for {}",
            target
        );
    }
}

#[test]
fn test_empty_subnet_value_is_unresolved() {
    assert_eq!(invalid(&["-s", ""]), ValidationError::UnresolvedTarget);
}

#[test]
fn test_help_short_circuits_everything() {
    for tokens in [
        &["--help"][..],
        &["-c", "abc", "-h"][..],
        &["--unknown", "--help"][..],
        &["-s", "10.0.0.0/40", "--help"][..],
        &["--help", "--container"][..],
    ] {
        assert!(
            matches!(resolve(tokens), Outcome::Help),
            "expected help for {:?}",
            tokens
        );
    }
}

#[test]
fn test_unknown_option_is_fatal() {
    for tokens in [
        &["--verbose"][..],
        &["-c", "102", "-x"][..],
        &["-c", "102", "extra"][..],
        &["--unknown", "-c", "102"][..],
        &["--"][..],
        &["-c", "102", "--"][..],
    ] {
        assert!(
            matches!(resolve(tokens), Outcome::Args(ArgsError::UnknownOption(_))),
            "expected UnknownOption for {:?}",
            tokens
        );
    }
}

#[test]
fn test_missing_value_is_fatal() {
    assert!(matches!(
        resolve(&["-s", "192.168.1.0/24", "--container"]),
        Outcome::Args(ArgsError::MissingOptionValue(_))
    ));
    assert!(matches!(
        resolve(&["--ipaddr"]),
        Outcome::Args(ArgsError::MissingOptionValue(_))
    ));
}

#[test]
fn test_last_flag_wins_across_aliases() {
    let config = config(&["-s", "10.0.0.0/8", "-c", "101", "-i", "172.16.0.1", "-c", "105"]);

    assert_eq!(config.container_id().as_str(), "105");
    assert_eq!(config.target().unwrap().as_str(), "172.16.0.1/32");
}

#[test]
fn test_every_valid_prefix_round_trips() {
    for prefix in 0..=32 {
        let cidr = format!("192.168.0.0/{}", prefix);
        let config = config(&["-s", &cidr]);
        assert_eq!(config.target().unwrap().as_str(), cidr);
    }
}
