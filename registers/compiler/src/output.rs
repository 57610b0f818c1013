// Licensed under the Apache-2.0 license

//! Emitted artifacts and their renderings.
//!
//! This module contains the data structures handed to the downstream
//! hardware generator ([`EmittedUnit`], [`EmittedRegisterMap`],
//! [`EmittedChannel`]) and the logic to render them as JSON or as a plain-text
//! listing.
//!
//! ## Emission Flow
//!
//! ```text
//! ConstantTable<Frozen> ─┐
//! RegisterMap[]         ─┼─→ EmittedUnit ─┬─→ to_json()
//! ChannelPair[]         ─┘                └─→ render_listing()
//! ```
//!
//! ## Listing Structure
//!
//! ```text
//! // constants
//! FMT_Y8 = 2'd0
//!
//! // register map csr_t: 5 bits, 1 words
//! [1:0]     input  rop_fmt = FMT_Y8 @ 0x4000_0000
//! [4:2]     input  rop_blend @ 0x4000_0004
//!
//! // channel ras (single-outstanding)
//! ras_req_t: 28 bits
//! [27:0]    input  edge0
//!           input  ras_req_valid
//!           output ras_req_ready
//! ```

use crate::channel::{ChannelPair, ChannelSide, TransferPolicy, READY, VALID};
use crate::compose::{MapField, RegisterMap};
use crate::config::CompilerConfig;
use crate::constants::{ConstantTable, Frozen};
use crate::types::{Direction, Side};
use crate::util::hex_const;
use serde::Serialize;
use std::fmt::Write;

//=============================================================================
// Emitted Types
//=============================================================================

/// A constant inlined by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmittedConstant {
    pub mnemonic: String,
    pub literal: String,
}

/// A placed field of a register map or channel payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmittedField {
    pub name: String,
    pub width: u32,
    pub direction: Direction,
    /// Position of the least significant bit.
    pub bit_offset: u64,
    /// Position of the most significant bit.
    pub msb: u64,
    /// Reset value as written in the schema: a literal or a mnemonic.
    pub default: Option<String>,
}

impl EmittedField {
    fn new(field: &MapField) -> Self {
        EmittedField {
            name: field.name.clone(),
            width: field.width,
            direction: field.direction,
            bit_offset: field.bit_offset,
            msb: field.msb(),
            default: field.default.as_ref().map(|d| d.to_string()),
        }
    }
}

/// Memory-mapped word assigned to a register map field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmittedCsr {
    pub name: String,
    pub address: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmittedRegisterMap {
    pub name: String,
    pub total_width: u64,
    /// Words needed to carry the map packed into `csr_word_width` bits.
    pub packed_words: u64,
    pub fields: Vec<EmittedField>,
    pub csrs: Vec<EmittedCsr>,
}

impl EmittedRegisterMap {
    pub fn new(map: &RegisterMap, config: &CompilerConfig) -> Self {
        let stride = config.csr_stride();
        EmittedRegisterMap {
            name: map.name().to_string(),
            total_width: map.total_width(),
            packed_words: map.packed_words(config.csr_word_width),
            fields: map.fields().iter().map(EmittedField::new).collect(),
            csrs: map
                .fields()
                .iter()
                .zip(0u64..)
                .map(|(field, i)| EmittedCsr {
                    name: field.name.clone(),
                    address: config.csr_base_address + i * stride,
                })
                .collect(),
        }
    }

    /// Address of the CSR word carrying `field`.
    pub fn address_of(&self, field: &str) -> Option<u64> {
        self.csrs.iter().find(|c| c.name == field).map(|c| c.address)
    }
}

/// A handshake signal with its wire name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmittedSignal {
    pub name: String,
    pub direction: Direction,
}

/// One side of an emitted channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmittedSide {
    pub type_name: String,
    pub payload_width: u64,
    pub fields: Vec<EmittedField>,
    pub valid: EmittedSignal,
    pub ready: EmittedSignal,
}

impl EmittedSide {
    fn new(channel: &ChannelPair, side: &ChannelSide) -> Self {
        let which = side.side();
        let handshake = side.handshake();
        EmittedSide {
            type_name: channel.type_name(which),
            payload_width: side.payload_width(),
            fields: side.payload().iter().map(EmittedField::new).collect(),
            valid: EmittedSignal {
                name: channel.wire_name(which, VALID),
                direction: handshake.valid.direction,
            },
            ready: EmittedSignal {
                name: channel.wire_name(which, READY),
                direction: handshake.ready.direction,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmittedChannel {
    pub name: String,
    pub policy: TransferPolicy,
    pub request: EmittedSide,
    pub response: EmittedSide,
}

impl EmittedChannel {
    pub fn new(channel: &ChannelPair) -> Self {
        EmittedChannel {
            name: channel.name().to_string(),
            policy: channel.policy(),
            request: EmittedSide::new(channel, channel.side(Side::Request)),
            response: EmittedSide::new(channel, channel.side(Side::Response)),
        }
    }
}

/// Everything a compilation unit hands to the downstream generator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EmittedUnit {
    pub constants: Vec<EmittedConstant>,
    pub register_maps: Vec<EmittedRegisterMap>,
    pub channels: Vec<EmittedChannel>,
}

impl EmittedUnit {
    pub fn new(
        constants: &ConstantTable<Frozen>,
        config: &CompilerConfig,
        maps: &[RegisterMap],
        channels: &[ChannelPair],
    ) -> Self {
        EmittedUnit {
            constants: constants
                .snapshot()
                .into_iter()
                .map(|(mnemonic, literal)| EmittedConstant { mnemonic, literal })
                .collect(),
            register_maps: maps
                .iter()
                .map(|m| EmittedRegisterMap::new(m, config))
                .collect(),
            channels: channels.iter().map(EmittedChannel::new).collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Renders the unit as a plain-text listing.
    pub fn render_listing(&self) -> String {
        let mut out = String::new();
        if !self.constants.is_empty() {
            writeln!(out, "// constants").unwrap();
            for c in &self.constants {
                writeln!(out, "{} = {}", c.mnemonic, c.literal).unwrap();
            }
        }
        for map in &self.register_maps {
            if !out.is_empty() {
                writeln!(out).unwrap();
            }
            writeln!(
                out,
                "// register map {}: {} bits, {} words",
                map.name, map.total_width, map.packed_words
            )
            .unwrap();
            for (field, csr) in map.fields.iter().zip(&map.csrs) {
                write_field(&mut out, field);
                writeln!(out, " @ {}", hex_const(csr.address)).unwrap();
            }
        }
        for channel in &self.channels {
            if !out.is_empty() {
                writeln!(out).unwrap();
            }
            writeln!(out, "// channel {} ({})", channel.name, channel.policy).unwrap();
            for side in [&channel.request, &channel.response] {
                writeln!(out, "{}: {} bits", side.type_name, side.payload_width).unwrap();
                for field in &side.fields {
                    write_field(&mut out, field);
                    writeln!(out).unwrap();
                }
                for signal in [&side.valid, &side.ready] {
                    writeln!(out, "{:10}{:7}{}", "", signal.direction, signal.name).unwrap();
                }
            }
        }
        out
    }
}

/// Writes `[msb:lsb] direction name[ = default]` without a line ending.
fn write_field(out: &mut String, field: &EmittedField) {
    let range = format!("[{}:{}]", field.msb, field.bit_offset);
    write!(out, "{range:10}{:7}{}", field.direction, field.name).unwrap();
    if let Some(default) = &field.default {
        write!(out, " = {default}").unwrap();
    }
}
