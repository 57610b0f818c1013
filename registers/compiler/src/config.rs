// Licensed under the Apache-2.0 license

//! Configuration for validation limits, CSR address allocation and scope
//! naming.
//!
//! [`CompilerConfig`] carries the limits the downstream generator imposes and
//! the address layout used when emitting register maps. It deserializes from
//! TOML with every key optional.
//!
//! [`NameConfig`] derives a scope from a list name by stripping type
//! suffixes, so that `setup_csr_t` is namespaced as `setup`.

use crate::channel::TransferPolicy;
use serde::{Deserialize, Serialize};

/// Widest field the generator accepts by default.
pub const DEFAULT_MAX_FIELD_WIDTH: u32 = 32;

/// Compiler-wide settings.
///
/// # Example
///
/// ```
/// use manjuu_csr::config::CompilerConfig;
///
/// let config = CompilerConfig::with_defaults()
///     .max_field_width(16)
///     .csr_base_address(0x4000_0000);
/// assert_eq!(config.max_field_width, 16);
/// assert_eq!(config.csr_word_width, 32);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Widest field accepted by the validator.
    pub max_field_width: u32,

    /// Width in bits of one memory-mapped CSR word. Each register map field
    /// gets its own word.
    pub csr_word_width: u32,

    /// Address of the first CSR word.
    pub csr_base_address: u64,

    /// Policy for channels that do not choose one.
    pub default_policy: TransferPolicy,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl CompilerConfig {
    /// 32-bit fields and CSR words at address 0, single-outstanding channels.
    pub fn with_defaults() -> Self {
        Self {
            max_field_width: DEFAULT_MAX_FIELD_WIDTH,
            csr_word_width: 32,
            csr_base_address: 0,
            default_policy: TransferPolicy::SingleOutstanding,
        }
    }

    pub fn max_field_width(mut self, width: u32) -> Self {
        self.max_field_width = width;
        self
    }

    pub fn csr_word_width(mut self, width: u32) -> Self {
        self.csr_word_width = width;
        self
    }

    pub fn csr_base_address(mut self, address: u64) -> Self {
        self.csr_base_address = address;
        self
    }

    pub fn default_policy(mut self, policy: TransferPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    /// Byte stride between consecutive CSR words.
    pub fn csr_stride(&self) -> u64 {
        u64::from(self.csr_word_width.div_ceil(8).max(1))
    }
}

/// Configuration for deriving scopes from list names.
///
/// # Example
///
/// ```
/// use manjuu_csr::config::NameConfig;
///
/// let config = NameConfig::with_defaults();
/// assert_eq!(config.scope_for("setup_csr_t"), "setup");
/// assert_eq!(config.scope_for("ras_req_t"), "ras");
///
/// let config = NameConfig::none().add_suffix("_block");
/// assert_eq!(config.scope_for("rop_block"), "rop");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameConfig {
    /// Suffixes to strip (case-insensitive, checked in order).
    pub strip_suffixes: Vec<String>,
}

impl NameConfig {
    /// Strips `_t`, `_csr`, `_req` and `_resp`.
    pub fn with_defaults() -> Self {
        Self {
            strip_suffixes: vec![
                "_t".to_string(),
                "_csr".to_string(),
                "_req".to_string(),
                "_resp".to_string(),
            ],
        }
    }

    /// Create a NameConfig that performs no transformations.
    pub fn none() -> Self {
        Self::default()
    }

    /// Add a suffix to strip (case-insensitive).
    pub fn add_suffix(mut self, suffix: &str) -> Self {
        self.strip_suffixes.push(suffix.to_string());
        self
    }

    /// Scope for a list called `name`.
    ///
    /// Suffixes are stripped repeatedly until none match, but a name is never
    /// stripped down to nothing.
    pub fn scope_for(&self, name: &str) -> String {
        let mut result = name;
        loop {
            let lower = result.to_ascii_lowercase();
            let matched = self.strip_suffixes.iter().find(|suffix| {
                lower.ends_with(&suffix.to_ascii_lowercase()) && result.len() > suffix.len()
            });
            match matched {
                Some(suffix) => result = &result[..result.len() - suffix.len()],
                None => break,
            }
        }
        result.to_string()
    }
}
