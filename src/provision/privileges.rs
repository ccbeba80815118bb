//! Privilege checks.

use super::ProvisionError;
use nix::unistd::{Uid, geteuid};

/// Fail with `NotRoot` unless running with an effective uid of 0
pub fn ensure_root() -> Result<(), ProvisionError> {
    ensure_root_uid(geteuid())
}

fn ensure_root_uid(euid: Uid) -> Result<(), ProvisionError> {
    if euid.is_root() {
        Ok(())
    } else {
        Err(ProvisionError::NotRoot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_uid() {
        assert!(ensure_root_uid(Uid::from_raw(0)).is_ok());
        assert!(matches!(
            ensure_root_uid(Uid::from_raw(1000)),
            Err(ProvisionError::NotRoot)
        ));
    }
}
