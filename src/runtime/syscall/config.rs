//! Capability configuration for the syscall bridge
//!
//! Decides which syscalls a guest may reach. Syscalls that terminate, replace
//! or duplicate the host process are refused unless explicitly allowed.

use super::Syscall;
use crate::runtime::RuntimeError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which syscalls the guest may invoke
///
/// Loadable from JSON:
///
/// ```
/// use sysbridge::runtime::syscall::{Syscall, SyscallConfig};
///
/// let config = SyscallConfig::from_json(r#"{ "allow_process_control": true, "deny": ["kill"] }"#).unwrap();
/// assert!(config.permits(Syscall::Fork));
/// assert!(!config.permits(Syscall::Kill));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyscallConfig {
    /// Permit `exit`, `execve`, `fork` and `vfork`
    pub allow_process_control: bool,
    /// Syscall names that are always refused
    pub deny: BTreeSet<String>,
}

impl SyscallConfig {
    /// Create a new builder for SyscallConfig
    pub fn builder() -> SyscallConfigBuilder {
        SyscallConfigBuilder::new()
    }

    /// A configuration that permits every syscall in the table
    pub fn permissive() -> Self {
        SyscallConfig {
            allow_process_control: true,
            deny: BTreeSet::new(),
        }
    }

    /// Parse a configuration, rejecting unknown syscall names
    pub fn from_json(json: &str) -> Result<Self, RuntimeError> {
        let config: SyscallConfig =
            serde_json::from_str(json).map_err(|e| RuntimeError::InvalidConfig(e.to_string()))?;
        if let Some(unknown) = config.deny.iter().find(|name| Syscall::from_name(name).is_none()) {
            return Err(RuntimeError::InvalidConfig(format!("unknown syscall in deny list: {unknown}")));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, RuntimeError> {
        serde_json::to_string(self).map_err(|e| RuntimeError::InvalidConfig(e.to_string()))
    }

    pub fn permits(&self, syscall: Syscall) -> bool {
        if syscall.is_process_control() && !self.allow_process_control {
            return false;
        }
        !self.deny.contains(syscall.name())
    }

    /// Fail with `CapabilityDenied` unless `syscall` is permitted
    pub fn check(&self, syscall: Syscall) -> Result<(), RuntimeError> {
        if self.permits(syscall) {
            return Ok(());
        }
        log::warn!("{syscall} refused by syscall configuration");
        Err(RuntimeError::CapabilityDenied(syscall.name()))
    }
}

/// Builder for SyscallConfig
#[derive(Debug, Default)]
pub struct SyscallConfigBuilder {
    allow_process_control: bool,
    deny: BTreeSet<String>,
}

impl SyscallConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Permit `exit`, `execve`, `fork` and `vfork`
    pub fn allow_process_control(mut self, allow: bool) -> Self {
        self.allow_process_control = allow;
        self
    }

    /// Always refuse `syscall`
    pub fn deny(mut self, syscall: Syscall) -> Self {
        self.deny.insert(syscall.name().to_string());
        self
    }

    pub fn build(self) -> SyscallConfig {
        SyscallConfig {
            allow_process_control: self.allow_process_control,
            deny: self.deny,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_refuses_process_control() {
        let config = SyscallConfig::default();
        for syscall in Syscall::ALL {
            assert_eq!(config.permits(syscall), !syscall.is_process_control(), "{syscall}");
        }
        assert_eq!(
            config.check(Syscall::Execve),
            Err(RuntimeError::CapabilityDenied("execve"))
        );
        assert!(config.check(Syscall::Getpid).is_ok());
    }

    #[test]
    fn test_permissive_allows_everything() {
        let config = SyscallConfig::permissive();
        assert!(Syscall::ALL.into_iter().all(|s| config.permits(s)));
    }

    #[test]
    fn test_builder() {
        let config = SyscallConfig::builder()
            .allow_process_control(true)
            .deny(Syscall::Kill)
            .deny(Syscall::Fork)
            .build();

        assert!(config.permits(Syscall::Execve));
        assert!(!config.permits(Syscall::Fork));
        assert!(!config.permits(Syscall::Kill));
        assert!(config.permits(Syscall::Socket));
    }

    #[test]
    fn test_json_round_trip() {
        let config = SyscallConfig::builder().deny(Syscall::Listen).build();
        let json = config.to_json().unwrap();
        assert_eq!(SyscallConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_json_defaults() {
        assert_eq!(SyscallConfig::from_json("{}").unwrap(), SyscallConfig::default());
    }

    #[test]
    fn test_json_rejects_unknown_names_and_fields() {
        assert!(matches!(
            SyscallConfig::from_json(r#"{ "deny": ["open"] }"#),
            Err(RuntimeError::InvalidConfig(_))
        ));
        assert!(matches!(
            SyscallConfig::from_json(r#"{ "allow_everything": true }"#),
            Err(RuntimeError::InvalidConfig(_))
        ));
    }
}
