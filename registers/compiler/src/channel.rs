// Licensed under the Apache-2.0 license

//! Channel pairs: request/response bus types with valid/ready handshakes.
//!
//! A channel models a point-to-point link between a requester and a
//! responder. Each side carries its payload plus one synthesized handshake
//! pair:
//!
//! ```text
//!              requester                      responder
//! request:     payload (input)   ─────────▶
//!              valid   (input)   ─────────▶
//!              ready   (output)  ◀─────────
//! response:    payload (output)  ◀─────────
//!              valid   (output)  ◀─────────
//!              ready   (input)   ─────────▶
//! ```
//!
//! A transfer happens on a side when `valid` and `ready` are both high in the
//! same cycle.

use crate::compose::MapField;
use crate::error::{CompileError, CompileResult};
use crate::types::{DescriptorList, Direction, FieldDescriptor, Side};
use crate::util::check_identifier;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::num::NonZeroU32;

/// Name of the synthesized valid signal on each side.
pub const VALID: &str = "valid";

/// Name of the synthesized ready signal on each side.
pub const READY: &str = "ready";

/// How many requests may be in flight before a response comes back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TransferPolicy {
    /// The requester waits for the response before issuing the next request.
    #[default]
    SingleOutstanding,
    /// Up to `max_in_flight` requests may be issued before the first
    /// response is accepted.
    Pipelined { max_in_flight: NonZeroU32 },
}

impl TransferPolicy {
    pub fn pipelined(max_in_flight: u32) -> Option<Self> {
        NonZeroU32::new(max_in_flight)
            .map(|max_in_flight| TransferPolicy::Pipelined { max_in_flight })
    }

    pub fn max_in_flight(&self) -> u32 {
        match self {
            TransferPolicy::SingleOutstanding => 1,
            TransferPolicy::Pipelined { max_in_flight } => max_in_flight.get(),
        }
    }
}

impl std::fmt::Display for TransferPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferPolicy::SingleOutstanding => write!(f, "single-outstanding"),
            TransferPolicy::Pipelined { max_in_flight } => {
                write!(f, "pipelined ({max_in_flight} in flight)")
            }
        }
    }
}

/// The synthesized valid/ready pair of one side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Handshake {
    pub valid: MapField,
    pub ready: MapField,
}

/// One half of a channel pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelSide {
    side: Side,
    payload: Vec<MapField>,
    handshake: Handshake,
}

impl ChannelSide {
    fn new(side: Side, fields: &[FieldDescriptor]) -> Self {
        let direction = side.payload_direction();
        let mut offset = 0u64;
        let payload = fields
            .iter()
            .map(|field| {
                let placed = MapField::place(field, direction, offset);
                offset += u64::from(field.width());
                placed
            })
            .collect();
        let handshake_bit = |name: &str, direction: Direction| MapField {
            name: name.to_string(),
            width: 1,
            direction,
            bit_offset: 0,
            default: None,
            origin: Default::default(),
        };
        ChannelSide {
            side,
            payload,
            handshake: Handshake {
                // valid travels with the payload, ready flows back
                valid: handshake_bit(VALID, direction),
                ready: handshake_bit(READY, direction.flip()),
            },
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Payload fields packed LSB-first, without the handshake.
    pub fn payload(&self) -> &[MapField] {
        &self.payload
    }

    pub fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    pub fn payload_width(&self) -> u64 {
        self.payload.iter().map(|f| u64::from(f.width)).sum()
    }
}

/// A request/response channel type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelPair {
    name: String,
    policy: TransferPolicy,
    request: ChannelSide,
    response: ChannelSide,
}

impl ChannelPair {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> TransferPolicy {
        self.policy
    }

    pub fn request(&self) -> &ChannelSide {
        &self.request
    }

    pub fn response(&self) -> &ChannelSide {
        &self.response
    }

    pub fn side(&self, side: Side) -> &ChannelSide {
        match side {
            Side::Request => &self.request,
            Side::Response => &self.response,
        }
    }

    /// Type name of one side, e.g. `ras_req_t`.
    pub fn type_name(&self, side: Side) -> String {
        format!("{}_{}_t", self.name, side.tag())
    }

    /// Wire name of a signal on one side, e.g. `ras_req_valid`.
    pub fn wire_name(&self, side: Side, signal: &str) -> String {
        format!("{}_{}_{signal}", self.name, side.tag())
    }
}

/// Incrementally collects the payload of a channel pair.
///
/// Every method that can fail leaves the builder untouched on error.
#[derive(Clone, Debug)]
pub struct ChannelPairBuilder {
    name: String,
    policy: Option<TransferPolicy>,
    request: Vec<FieldDescriptor>,
    response: Vec<FieldDescriptor>,
}

impl ChannelPairBuilder {
    pub fn new(name: &str) -> CompileResult<Self> {
        if let Err(reason) = check_identifier(name) {
            return Err(CompileError::InvalidName {
                name: name.to_string(),
                reason,
            });
        }
        Ok(ChannelPairBuilder {
            name: name.to_string(),
            policy: None,
            request: Vec::new(),
            response: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&mut self, policy: TransferPolicy) -> &mut Self {
        self.policy = Some(policy);
        self
    }

    /// Adds a request field. A field without a direction becomes an input.
    pub fn request_field(&mut self, field: FieldDescriptor) -> CompileResult<&mut Self> {
        self.add(Side::Request, vec![(field, None)])
    }

    /// Adds a response field. A field without a direction becomes an output.
    pub fn response_field(&mut self, field: FieldDescriptor) -> CompileResult<&mut Self> {
        self.add(Side::Response, vec![(field, None)])
    }

    /// Adds every field of `list` to the request side, or none of them.
    pub fn request_list(&mut self, list: &DescriptorList) -> CompileResult<&mut Self> {
        self.add(Side::Request, Self::resolved(list))
    }

    /// Adds every field of `list` to the response side, or none of them.
    pub fn response_list(&mut self, list: &DescriptorList) -> CompileResult<&mut Self> {
        self.add(Side::Response, Self::resolved(list))
    }

    pub fn request_len(&self) -> usize {
        self.request.len()
    }

    pub fn response_len(&self) -> usize {
        self.response.len()
    }

    /// Builds the pair, single-outstanding unless a policy was set.
    pub fn build(&self) -> ChannelPair {
        self.build_or(TransferPolicy::default())
    }

    /// Builds the pair with `default` as the policy unless one was set.
    pub fn build_or(&self, default: TransferPolicy) -> ChannelPair {
        let pair = ChannelPair {
            name: self.name.clone(),
            policy: self.policy.unwrap_or(default),
            request: ChannelSide::new(Side::Request, &self.request),
            response: ChannelSide::new(Side::Response, &self.response),
        };
        debug!(
            "built channel {}: {} request bits, {} response bits, {}",
            pair.name,
            pair.request.payload_width(),
            pair.response.payload_width(),
            pair.policy
        );
        pair
    }

    fn resolved(list: &DescriptorList) -> Vec<(FieldDescriptor, Option<Direction>)> {
        list.fields()
            .iter()
            .map(|f| (f.clone(), Some(list.direction_of(f))))
            .collect()
    }

    /// Checks every field against `side` before touching the builder.
    fn add(
        &mut self,
        side: Side,
        fields: Vec<(FieldDescriptor, Option<Direction>)>,
    ) -> CompileResult<&mut Self> {
        let expected = side.payload_direction();
        let existing = match side {
            Side::Request => &self.request,
            Side::Response => &self.response,
        };
        let mut names: HashSet<&str> = existing.iter().map(|f| f.name()).collect();

        for (field, inherited) in &fields {
            let found = field.direction().or(*inherited).unwrap_or(expected);
            if found != expected {
                return Err(CompileError::DirectionMismatch {
                    channel: self.name.clone(),
                    side,
                    field: field.name().to_string(),
                    found,
                    expected,
                });
            }
            if field.name() == VALID || field.name() == READY {
                return Err(CompileError::HandshakeConflict {
                    channel: self.name.clone(),
                    field: field.name().to_string(),
                });
            }
            if !names.insert(field.name()) {
                return Err(CompileError::DuplicateField {
                    field: field.name().to_string(),
                });
            }
        }

        let target = match side {
            Side::Request => &mut self.request,
            Side::Response => &mut self.response,
        };
        target.extend(fields.into_iter().map(|(f, _)| f.with_direction(expected)));
        Ok(self)
    }
}
