// Licensed under the Apache-2.0 license

//! The constant table.
//!
//! Constants map mnemonics such as `FMT_Y8` to literal encodings. The table
//! goes through two phases, tracked in its type:
//!
//! ```text
//! ConstantTable<Building>  --freeze()-->  ConstantTable<Frozen>
//!   define / define_enum                   resolve / snapshot only
//! ```
//!
//! Only a frozen table can be handed to the validator, so every `define`
//! for a compilation unit happens before any stage reads the table. A frozen
//! table has no interior mutability and can be shared between threads.

use crate::error::{CompileError, CompileResult};
use crate::util::{bits_for_count, check_identifier};
use crate::value::{parse_literal, Integer};
use log::debug;
use serde::Serialize;
use std::collections::HashMap;
use std::marker::PhantomData;

/// Phase marker: the table still accepts definitions.
#[derive(Clone, Copy, Debug, Default)]
pub struct Building;

/// Phase marker: the table is read-only.
#[derive(Clone, Copy, Debug, Default)]
pub struct Frozen;

/// A single constant definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Constant {
    pub mnemonic: String,
    /// The literal as it should be inlined into generated output.
    pub literal: String,
    pub value: Integer,
}

/// Write-once table of named constants.
#[derive(Clone, Debug)]
pub struct ConstantTable<P = Building> {
    /// Definitions in insertion order.
    entries: Vec<Constant>,
    index: HashMap<String, usize>,
    phase: PhantomData<P>,
}

impl Default for ConstantTable<Building> {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantTable<Building> {
    pub fn new() -> Self {
        ConstantTable {
            entries: Vec::new(),
            index: HashMap::new(),
            phase: PhantomData,
        }
    }

    /// Defines `mnemonic` from a literal such as `2'd0`.
    ///
    /// Redefinition fails and keeps the first value.
    pub fn define(&mut self, mnemonic: &str, literal: &str) -> CompileResult<&Constant> {
        let value = parse_literal(literal)?;
        self.insert(mnemonic, value)
    }

    /// Defines `mnemonic` from an already parsed value.
    pub fn define_value(&mut self, mnemonic: &str, value: Integer) -> CompileResult<&Constant> {
        self.insert(mnemonic, value)
    }

    /// Defines `<prefix>_<name>` for each name with codes `0, 1, ...`, all
    /// sized to the smallest width that holds every code.
    ///
    /// Either every member is defined or, on error, none is.
    pub fn define_enum(&mut self, prefix: &str, names: &[&str]) -> CompileResult<Vec<&Constant>> {
        let width = bits_for_count(names.len());
        let mnemonics: Vec<String> = names.iter().map(|n| format!("{prefix}_{n}")).collect();
        for (i, mnemonic) in mnemonics.iter().enumerate() {
            self.check_new(mnemonic)?;
            if let Some(first) = mnemonics[..i].iter().position(|m| m == mnemonic) {
                return Err(CompileError::DuplicateDefinition {
                    mnemonic: mnemonic.clone(),
                    existing: Integer::sized(width, first as u64).to_string(),
                });
            }
        }

        let start = self.entries.len();
        for (code, mnemonic) in mnemonics.into_iter().enumerate() {
            let value = Integer::sized(width, code as u64);
            self.push(mnemonic, value);
        }
        Ok(self.entries[start..].iter().collect())
    }

    /// Ends the building phase.
    pub fn freeze(self) -> ConstantTable<Frozen> {
        debug!("constant table frozen with {} entries", self.entries.len());
        ConstantTable {
            entries: self.entries,
            index: self.index,
            phase: PhantomData,
        }
    }

    fn check_new(&self, mnemonic: &str) -> CompileResult<()> {
        if let Err(reason) = check_identifier(mnemonic) {
            return Err(CompileError::InvalidName {
                name: mnemonic.to_string(),
                reason,
            });
        }
        if let Some(existing) = self.get(mnemonic) {
            return Err(CompileError::DuplicateDefinition {
                mnemonic: mnemonic.to_string(),
                existing: existing.literal.clone(),
            });
        }
        Ok(())
    }

    fn insert(&mut self, mnemonic: &str, value: Integer) -> CompileResult<&Constant> {
        self.check_new(mnemonic)?;
        let idx = self.push(mnemonic.to_string(), value);
        Ok(&self.entries[idx])
    }

    fn push(&mut self, mnemonic: String, value: Integer) -> usize {
        let idx = self.entries.len();
        self.index.insert(mnemonic.clone(), idx);
        self.entries.push(Constant {
            mnemonic,
            literal: value.to_string(),
            value,
        });
        idx
    }
}

impl<P> ConstantTable<P> {
    /// Looks up a mnemonic.
    pub fn resolve(&self, mnemonic: &str) -> CompileResult<&Constant> {
        self.get(mnemonic)
            .ok_or_else(|| CompileError::UndefinedConstant {
                mnemonic: mnemonic.to_string(),
            })
    }

    pub fn get(&self, mnemonic: &str) -> Option<&Constant> {
        self.index.get(mnemonic).map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, mnemonic: &str) -> bool {
        self.index.contains_key(mnemonic)
    }

    /// Definitions in the order they were made.
    pub fn iter(&self) -> impl Iterator<Item = &Constant> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConstantTable<Frozen> {
    /// Mnemonic and literal pairs for the backend to inline, in definition
    /// order.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|c| (c.mnemonic.clone(), c.literal.clone()))
            .collect()
    }
}
