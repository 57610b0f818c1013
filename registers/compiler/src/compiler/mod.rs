// Licensed under the Apache-2.0 license

//! The compilation pipeline.
//!
//! ```text
//! DescriptorList ─prefix─→ NamespacedList ─compose─→ RegisterMap ─┐
//!                                                                 ├─validate─→ EmittedUnit
//! ChannelPairBuilder ─────────────build─────────────→ ChannelPair ┘
//! ```
//!
//! A [`Compiler`] owns the frozen constant table and the configuration for
//! one compilation unit. It holds no mutable state, so maps and channels of
//! independent schema modules can be compiled from several threads at once.

use crate::channel::{ChannelPair, ChannelPairBuilder};
use crate::compose::{compose, RegisterMap};
use crate::config::CompilerConfig;
use crate::constants::{ConstantTable, Frozen};
use crate::namespace::NamespacedList;
use crate::output::EmittedUnit;
use crate::validate::{Diagnostic, Validator};
use log::info;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Compiler {
    constants: Arc<ConstantTable<Frozen>>,
    config: CompilerConfig,
}

impl Compiler {
    pub fn new(constants: ConstantTable<Frozen>, config: CompilerConfig) -> Self {
        Self::shared(Arc::new(constants), config)
    }

    /// Creates a compiler over a table that is already shared.
    pub fn shared(constants: Arc<ConstantTable<Frozen>>, config: CompilerConfig) -> Self {
        Compiler { constants, config }
    }

    pub fn constants(&self) -> &ConstantTable<Frozen> {
        &self.constants
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    fn validator(&self) -> Validator<'_> {
        Validator::new(&self.constants, &self.config)
    }

    /// Composes `parts` into a register map named `name` and validates it.
    pub fn compile_map(
        &self,
        name: &str,
        parts: &[NamespacedList],
    ) -> Result<RegisterMap, Diagnostic> {
        let map = compose(name, parts).map_err(|e| {
            let origin = e
                .field()
                .and_then(|f| {
                    parts
                        .iter()
                        .flat_map(|p| p.fields())
                        .find(|d| d.name() == f)
                })
                .map(|d| d.origin().clone())
                .unwrap_or_default();
            Diagnostic::new(name, e).with_origin(&origin)
        })?;
        self.validator().validate_map(&map)?;
        info!(
            "compiled register map {}: {} fields, {} bits",
            map.name(),
            map.len(),
            map.total_width()
        );
        Ok(map)
    }

    /// Builds the channel pair described by `builder` and validates it.
    ///
    /// Channels without an explicit policy get the configured default.
    pub fn compile_channel(
        &self,
        builder: &ChannelPairBuilder,
    ) -> Result<ChannelPair, Diagnostic> {
        let channel = builder.build_or(self.config.default_policy);
        self.validator().validate_channel(&channel)?;
        info!(
            "compiled channel {}: {} request bits, {} response bits",
            channel.name(),
            channel.request().payload_width(),
            channel.response().payload_width()
        );
        Ok(channel)
    }

    /// Packages compiled artifacts together with the constant snapshot.
    pub fn emit(&self, maps: &[RegisterMap], channels: &[ChannelPair]) -> EmittedUnit {
        EmittedUnit::new(&self.constants, &self.config, maps, channels)
    }
}
