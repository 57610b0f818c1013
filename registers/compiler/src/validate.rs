// Licensed under the Apache-2.0 license

//! The validator.
//!
//! Runs after composition and channel construction and checks, in order:
//!
//! 1. [`Rule::UniqueNames`]: no name appears twice in the artifact.
//! 2. [`Rule::WidthBounds`]: every width is in `1..=max_field_width` and the
//!    LSB-first layout is contiguous.
//! 3. [`Rule::ConstantsResolve`]: every constant referenced by a default
//!    resolves, and every default fits its field.
//! 4. [`Rule::DirectionConsistency`] (channels only): payload and handshake
//!    directions match their side.
//!
//! The first failure is returned as a [`Diagnostic`]. Validation never
//! modifies the artifact.

use crate::channel::{ChannelPair, ChannelSide};
use crate::compose::{MapField, RegisterMap};
use crate::config::CompilerConfig;
use crate::constants::{ConstantTable, Frozen};
use crate::error::CompileError;
use crate::types::{DefaultValue, ScopeChain};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// The check a diagnostic comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    UniqueNames,
    WidthBounds,
    ConstantsResolve,
    DirectionConsistency,
}

impl Rule {
    /// The rule an error belongs to.
    pub fn of(error: &CompileError) -> Rule {
        match error {
            CompileError::InvalidWidth { .. }
            | CompileError::WidthExceedsMaximum { .. }
            | CompileError::LayoutMismatch { .. } => Rule::WidthBounds,
            CompileError::UndefinedConstant { .. }
            | CompileError::DuplicateDefinition { .. }
            | CompileError::InvalidLiteral { .. }
            | CompileError::DefaultOverflow { .. } => Rule::ConstantsResolve,
            CompileError::DirectionMismatch { .. } | CompileError::InvalidDirection { .. } => {
                Rule::DirectionConsistency
            }
            CompileError::InvalidName { .. }
            | CompileError::DuplicateField { .. }
            | CompileError::DuplicateAfterRename { .. }
            | CompileError::NameCollision { .. }
            | CompileError::DuplicateScope { .. }
            | CompileError::HandshakeConflict { .. } => Rule::UniqueNames,
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Rule::UniqueNames => "unique names",
            Rule::WidthBounds => "width bounds",
            Rule::ConstantsResolve => "constants resolve",
            Rule::DirectionConsistency => "direction consistency",
        };
        write!(f, "{s}")
    }
}

/// A rejected artifact: what was wrong, where, and which rule caught it.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{artifact}: {error} (field `{field}` in {origin}, rule: {rule})")]
pub struct Diagnostic {
    /// Register map or channel name.
    pub artifact: String,
    /// Offending field, or `""` when the error is not about one field.
    pub field: String,
    pub origin: ScopeChain,
    pub rule: Rule,
    #[source]
    pub error: CompileError,
}

impl Diagnostic {
    pub fn new(artifact: &str, error: CompileError) -> Self {
        Diagnostic {
            artifact: artifact.to_string(),
            field: error.field().unwrap_or_default().to_string(),
            origin: ScopeChain::new(),
            rule: Rule::of(&error),
            error,
        }
    }

    pub fn with_origin(mut self, origin: &ScopeChain) -> Self {
        self.origin = origin.clone();
        self
    }

    /// Names the field the error was found on, which may differ from the
    /// name inside the error (a mnemonic, for instance).
    pub fn with_field(mut self, field: &str) -> Self {
        self.field = field.to_string();
        self
    }

    fn at(artifact: &str, field: &MapField, error: CompileError) -> Self {
        Self::new(artifact, error)
            .with_field(&field.name)
            .with_origin(&field.origin)
    }
}

/// Checks compiled artifacts against a frozen constant table.
#[derive(Clone, Copy, Debug)]
pub struct Validator<'a> {
    constants: &'a ConstantTable<Frozen>,
    max_field_width: u32,
}

impl<'a> Validator<'a> {
    pub fn new(constants: &'a ConstantTable<Frozen>, config: &CompilerConfig) -> Self {
        Validator {
            constants,
            max_field_width: config.max_field_width,
        }
    }

    pub fn validate_map(&self, map: &RegisterMap) -> Result<(), Diagnostic> {
        let name = map.name();

        let mut owners: HashMap<&str, &MapField> = HashMap::new();
        for field in map.fields() {
            if let Some(first) = owners.insert(&field.name, field) {
                return Err(Diagnostic::at(
                    name,
                    field,
                    CompileError::NameCollision {
                        field: field.name.clone(),
                        first_scope: first.origin.outermost().to_string(),
                        second_scope: field.origin.outermost().to_string(),
                    },
                ));
            }
        }
        let mut scopes = HashSet::new();
        for scope in map.scopes() {
            if !scopes.insert(scope.as_str()) {
                return Err(Diagnostic::new(
                    name,
                    CompileError::DuplicateScope {
                        scope: scope.clone(),
                    },
                ));
            }
        }

        self.check_widths(name, map.fields(), map.total_width())?;
        self.check_defaults(name, map.fields())
    }

    pub fn validate_channel(&self, channel: &ChannelPair) -> Result<(), Diagnostic> {
        let name = channel.name();
        let sides = [channel.request(), channel.response()];

        for side in sides {
            let mut seen = HashSet::new();
            for (i, field) in Self::signals(side).enumerate() {
                if !seen.insert(field.name.as_str()) {
                    let error = if i < side.payload().len() {
                        CompileError::DuplicateField {
                            field: field.name.clone(),
                        }
                    } else {
                        CompileError::HandshakeConflict {
                            channel: name.to_string(),
                            field: field.name.clone(),
                        }
                    };
                    return Err(Diagnostic::at(name, field, error));
                }
            }
        }
        for side in sides {
            self.check_widths(name, side.payload(), side.payload_width())?;
            let handshake = side.handshake();
            for bit in [&handshake.valid, &handshake.ready] {
                if bit.width != 1 {
                    return Err(Diagnostic::at(
                        name,
                        bit,
                        CompileError::InvalidWidth {
                            field: bit.name.clone(),
                            width: i64::from(bit.width),
                        },
                    ));
                }
            }
        }
        for side in sides {
            self.check_defaults(name, side.payload())?;
        }
        for side in sides {
            Self::check_directions(name, side)?;
        }
        Ok(())
    }

    /// Payload followed by the handshake pair.
    fn signals(side: &ChannelSide) -> impl Iterator<Item = &MapField> {
        let handshake = side.handshake();
        side.payload()
            .iter()
            .chain([&handshake.valid, &handshake.ready])
    }

    fn check_widths(&self, name: &str, fields: &[MapField], total: u64) -> Result<(), Diagnostic> {
        let mut expected = 0u64;
        for field in fields {
            if field.width == 0 {
                return Err(Diagnostic::at(
                    name,
                    field,
                    CompileError::InvalidWidth {
                        field: field.name.clone(),
                        width: 0,
                    },
                ));
            }
            if field.width > self.max_field_width {
                return Err(Diagnostic::at(
                    name,
                    field,
                    CompileError::WidthExceedsMaximum {
                        field: field.name.clone(),
                        width: field.width,
                        max: self.max_field_width,
                    },
                ));
            }
            if field.bit_offset != expected {
                return Err(Diagnostic::at(
                    name,
                    field,
                    CompileError::LayoutMismatch {
                        field: field.name.clone(),
                        found: field.bit_offset,
                        expected,
                    },
                ));
            }
            expected += u64::from(field.width);
        }
        if expected != total {
            return Err(Diagnostic::new(
                name,
                CompileError::LayoutMismatch {
                    field: String::new(),
                    found: total,
                    expected,
                },
            ));
        }
        Ok(())
    }

    fn check_defaults(&self, name: &str, fields: &[MapField]) -> Result<(), Diagnostic> {
        for field in fields {
            let value = match &field.default {
                None => continue,
                Some(DefaultValue::Literal(lit)) => *lit,
                Some(DefaultValue::Constant(mnemonic)) => self
                    .constants
                    .resolve(mnemonic)
                    .map_err(|e| Diagnostic::at(name, field, e))?
                    .value,
            };
            if !value.fits(field.width) {
                return Err(Diagnostic::at(
                    name,
                    field,
                    CompileError::DefaultOverflow {
                        field: field.name.clone(),
                        width: field.width,
                        value: value.value,
                    },
                ));
            }
        }
        Ok(())
    }

    fn check_directions(name: &str, side: &ChannelSide) -> Result<(), Diagnostic> {
        let expected = side.side().payload_direction();
        let handshake = side.handshake();
        let checks = side
            .payload()
            .iter()
            .map(move |f| (f, expected))
            .chain([
                (&handshake.valid, expected),
                (&handshake.ready, expected.flip()),
            ]);
        for (field, expected) in checks {
            if field.direction != expected {
                return Err(Diagnostic::at(
                    name,
                    field,
                    CompileError::DirectionMismatch {
                        channel: name.to_string(),
                        side: side.side(),
                        field: field.name.clone(),
                        found: field.direction,
                        expected,
                    },
                ));
            }
        }
        Ok(())
    }
}
