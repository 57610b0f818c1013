// Licensed under the Apache-2.0 license

//! Core data types: field descriptors and the lists they form.
//!
//! ## Model Overview
//!
//! ```text
//! DescriptorList                 # one register block or bus payload
//! ├── default_direction          # inherited by fields without a direction
//! └── fields: Vec<FieldDescriptor>
//!     ├── name, width
//!     ├── direction (optional)
//!     ├── default (literal or constant reference)
//!     └── origin: ScopeChain     # scopes the field was prefixed through
//! ```
//!
//! Lists never change after construction. The namespacing operator and the
//! composer always build new values.

use crate::error::{CompileError, CompileResult};
use crate::util::check_identifier;
use crate::value::Integer;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

//=============================================================================
// Direction
//=============================================================================

/// Which side of a link drives a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Driven by the requester (software writable).
    Input,
    /// Driven by the responder (hardware driven).
    Output,
}

impl Direction {
    /// The short schema tag, `i` or `o`.
    pub fn tag(self) -> &'static str {
        match self {
            Direction::Input => "i",
            Direction::Output => "o",
        }
    }

    pub fn flip(self) -> Direction {
        match self {
            Direction::Input => Direction::Output,
            Direction::Output => Direction::Input,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Direction::Input => "input",
            Direction::Output => "output",
        })
    }
}

impl std::str::FromStr for Direction {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "i" | "input" => Ok(Direction::Input),
            "o" | "output" => Ok(Direction::Output),
            _ => Err(CompileError::InvalidDirection { tag: s.to_string() }),
        }
    }
}

//=============================================================================
// Side - which half of a channel pair
//=============================================================================

/// The two halves of a channel pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Request,
    Response,
}

impl Side {
    /// Direction every payload field on this side must have.
    pub fn payload_direction(self) -> Direction {
        match self {
            Side::Request => Direction::Input,
            Side::Response => Direction::Output,
        }
    }

    /// Short tag used in type and wire names.
    pub fn tag(self) -> &'static str {
        match self {
            Side::Request => "req",
            Side::Response => "resp",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Request => write!(f, "request"),
            Side::Response => write!(f, "response"),
        }
    }
}

//=============================================================================
// ScopeChain
//=============================================================================

/// The scopes a field was namespaced through, outermost first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ScopeChain(Vec<String>);

impl ScopeChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a chain with `scope` added as the new outermost scope.
    pub fn enclosed_by(&self, scope: &str) -> ScopeChain {
        let mut scopes = Vec::with_capacity(self.0.len() + 1);
        scopes.push(scope.to_string());
        scopes.extend(self.0.iter().cloned());
        ScopeChain(scopes)
    }

    /// The outermost scope, or `""` for a field that was never prefixed.
    pub fn outermost(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or("")
    }

    pub fn scopes(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ScopeChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.0.join("."))
        }
    }
}

//=============================================================================
// DefaultValue
//=============================================================================

/// Reset value of a field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefaultValue {
    Literal(Integer),
    /// Reference to a constant table mnemonic, resolved during validation.
    Constant(String),
}

impl DefaultValue {
    /// Reads a literal if `text` starts like one (a digit or `'`), otherwise
    /// treats it as a mnemonic. A malformed literal is an error.
    pub fn parse(text: &str) -> CompileResult<DefaultValue> {
        let text = text.trim();
        if text.starts_with(|c: char| c.is_ascii_digit() || c == '\'') {
            crate::value::parse_literal(text).map(DefaultValue::Literal)
        } else {
            Ok(DefaultValue::Constant(text.to_string()))
        }
    }
}

impl std::fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefaultValue::Literal(lit) => write!(f, "{lit}"),
            DefaultValue::Constant(name) => write!(f, "{name}"),
        }
    }
}

//=============================================================================
// FieldDescriptor
//=============================================================================

/// A named, width-bounded, directional field of a register block or bus
/// message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    width: u32,
    direction: Option<Direction>,
    default: Option<DefaultValue>,
    origin: ScopeChain,
}

impl FieldDescriptor {
    /// Creates a field whose direction is inherited from its list.
    pub fn new(name: &str, width: u32) -> CompileResult<Self> {
        if let Err(reason) = check_identifier(name) {
            return Err(CompileError::InvalidName {
                name: name.to_string(),
                reason,
            });
        }
        if width == 0 {
            return Err(CompileError::InvalidWidth {
                field: name.to_string(),
                width: 0,
            });
        }
        Ok(FieldDescriptor {
            name: name.to_string(),
            width,
            direction: None,
            default: None,
            origin: ScopeChain::new(),
        })
    }

    /// Creates a field from an untrusted signed width, as found in schema
    /// files.
    pub fn with_signed_width(name: &str, width: i64) -> CompileResult<Self> {
        match u32::try_from(width) {
            Ok(w) => Self::new(name, w),
            Err(_) => Err(CompileError::InvalidWidth {
                field: name.to_string(),
                width,
            }),
        }
    }

    pub fn input(name: &str, width: u32) -> CompileResult<Self> {
        Ok(Self::new(name, width)?.with_direction(Direction::Input))
    }

    pub fn output(name: &str, width: u32) -> CompileResult<Self> {
        Ok(Self::new(name, width)?.with_direction(Direction::Output))
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// The explicit direction, if the field declared one.
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn origin(&self) -> &ScopeChain {
        &self.origin
    }

    /// Copy of this field renamed into `scope`, with its direction fixed.
    pub(crate) fn scoped(&self, scope: &str, direction: Direction) -> CompileResult<Self> {
        let name = format!("{scope}_{}", self.name);
        if let Err(reason) = check_identifier(&name) {
            return Err(CompileError::InvalidName { name, reason });
        }
        Ok(FieldDescriptor {
            name,
            width: self.width,
            direction: Some(direction),
            default: self.default.clone(),
            origin: self.origin.enclosed_by(scope),
        })
    }
}

//=============================================================================
// DescriptorList
//=============================================================================

/// An ordered sequence of fields forming one register block or bus payload.
///
/// Order is significant: it is the bit layout order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorList {
    default_direction: Direction,
    fields: Vec<FieldDescriptor>,
}

impl DescriptorList {
    /// Builds a list, rejecting duplicate field names.
    pub fn new(default_direction: Direction, fields: Vec<FieldDescriptor>) -> CompileResult<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(CompileError::DuplicateField {
                    field: field.name.clone(),
                });
            }
        }
        Ok(DescriptorList {
            default_direction,
            fields,
        })
    }

    /// A list whose fields default to [`Direction::Input`].
    pub fn inputs(fields: Vec<FieldDescriptor>) -> CompileResult<Self> {
        Self::new(Direction::Input, fields)
    }

    /// A list whose fields default to [`Direction::Output`].
    pub fn outputs(fields: Vec<FieldDescriptor>) -> CompileResult<Self> {
        Self::new(Direction::Output, fields)
    }

    /// Bypasses the uniqueness check; only for exercising defensive checks.
    #[cfg(test)]
    pub(crate) fn new_unchecked(
        default_direction: Direction,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        DescriptorList {
            default_direction,
            fields,
        }
    }

    pub fn default_direction(&self) -> Direction {
        self.default_direction
    }

    /// Effective direction of `field` within this list.
    pub fn direction_of(&self, field: &FieldDescriptor) -> Direction {
        field.direction.unwrap_or(self.default_direction)
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Sum of all field widths.
    pub fn total_width(&self) -> u64 {
        self.fields.iter().map(|f| u64::from(f.width)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_rejects_zero_width() {
        assert_eq!(
            FieldDescriptor::new("x0", 0).unwrap_err(),
            CompileError::InvalidWidth {
                field: "x0".into(),
                width: 0
            }
        );
        assert_eq!(
            FieldDescriptor::with_signed_width("x0", -3).unwrap_err(),
            CompileError::InvalidWidth {
                field: "x0".into(),
                width: -3
            }
        );
        assert!(FieldDescriptor::with_signed_width("x0", 13).is_ok());
    }

    #[test]
    fn test_field_rejects_bad_names() {
        for bad in ["", "1x", "x-y", "wire", "a b"] {
            assert!(
                matches!(
                    FieldDescriptor::new(bad, 1),
                    Err(CompileError::InvalidName { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("i".parse::<Direction>().unwrap(), Direction::Input);
        assert_eq!("O".parse::<Direction>().unwrap(), Direction::Output);
        assert_eq!("input".parse::<Direction>().unwrap(), Direction::Input);
        assert_eq!(
            "x".parse::<Direction>().unwrap_err(),
            CompileError::InvalidDirection { tag: "x".into() }
        );
        assert_eq!(Direction::Input.flip(), Direction::Output);
        assert_eq!(Direction::Output.tag(), "o");
    }

    #[test]
    fn test_list_inherits_direction() {
        let list = DescriptorList::outputs(vec![
            FieldDescriptor::new("x", 13).unwrap(),
            FieldDescriptor::input("y", 13).unwrap(),
        ])
        .unwrap();
        assert_eq!(list.direction_of(&list.fields()[0]), Direction::Output);
        assert_eq!(list.direction_of(&list.fields()[1]), Direction::Input);
        assert_eq!(list.total_width(), 26);
        assert_eq!(list.get("y").map(|f| f.width()), Some(13));
    }

    #[test]
    fn test_list_rejects_duplicates() {
        let err = DescriptorList::inputs(vec![
            FieldDescriptor::new("x", 1).unwrap(),
            FieldDescriptor::new("y", 1).unwrap(),
            FieldDescriptor::new("x", 2).unwrap(),
        ])
        .unwrap_err();
        assert_eq!(err, CompileError::DuplicateField { field: "x".into() });
    }

    #[test]
    fn test_default_value_parse() {
        assert_eq!(
            DefaultValue::parse("2'd1").unwrap(),
            DefaultValue::Literal(Integer::sized(2, 1))
        );
        assert_eq!(
            DefaultValue::parse("'h3").unwrap(),
            DefaultValue::Literal(Integer::unsized_value(3))
        );
        assert_eq!(
            DefaultValue::parse(" FMT_Y8 ").unwrap(),
            DefaultValue::Constant("FMT_Y8".into())
        );
    }

    #[test]
    fn test_default_value_bad_literal() {
        for bad in ["2'd4", "8'hZZ", "4'q1", "12abc"] {
            let err = DefaultValue::parse(bad).unwrap_err();
            assert!(
                matches!(err, CompileError::InvalidLiteral { .. }),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_scope_chain() {
        let chain = ScopeChain::new().enclosed_by("rop").enclosed_by("gpu");
        assert_eq!(chain.scopes(), ["gpu".to_string(), "rop".to_string()]);
        assert_eq!(chain.outermost(), "gpu");
        assert_eq!(chain.to_string(), "gpu.rop");
        assert_eq!(ScopeChain::new().to_string(), "<root>");
    }
}
