// Licensed under the Apache-2.0 license

//! The composer: concatenates namespaced lists into one register map.
//!
//! ## Layout convention
//!
//! Fields are packed LSB-first in input order. The first field of the first
//! part occupies bit 0 and every following field starts where the previous
//! one ended:
//!
//! ```text
//! parts:  [rop_fmt(2), rop_blend(3)] + [setup_x0(13)]
//! bits:    1..0         4..2             17..5
//! ```

use crate::error::{CompileError, CompileResult};
use crate::namespace::NamespacedList;
use crate::types::{DefaultValue, Direction, FieldDescriptor, ScopeChain};
use log::debug;
use std::collections::{HashMap, HashSet};

/// A field placed in a register map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapField {
    pub name: String,
    pub width: u32,
    pub direction: Direction,
    /// Position of the least significant bit of the field.
    pub bit_offset: u64,
    pub default: Option<DefaultValue>,
    pub origin: ScopeChain,
}

impl MapField {
    pub(crate) fn place(field: &FieldDescriptor, direction: Direction, bit_offset: u64) -> Self {
        MapField {
            name: field.name().to_string(),
            width: field.width(),
            direction,
            bit_offset,
            default: field.default_value().cloned(),
            origin: field.origin().clone(),
        }
    }

    /// Bit position of the most significant bit of the field.
    pub fn msb(&self) -> u64 {
        self.bit_offset + u64::from(self.width) - 1
    }
}

/// A flat, collision-free register map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterMap {
    name: String,
    scopes: Vec<String>,
    fields: Vec<MapField>,
    total_width: u64,
}

impl RegisterMap {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scopes of the composed parts, in input order.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn fields(&self) -> &[MapField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&MapField> {
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
        self.total_width
    }

    /// Number of `word_width`-bit words needed to carry the map packed.
    pub fn packed_words(&self, word_width: u32) -> u64 {
        self.total_width.div_ceil(u64::from(word_width.max(1)))
    }
}

/// Concatenates `parts` into a register map named `name`.
///
/// Fails with [`CompileError::NameCollision`] on the first field, in list
/// order, whose name was already taken, and with
/// [`CompileError::DuplicateScope`] if two parts share a scope.
pub fn compose(name: &str, parts: &[NamespacedList]) -> CompileResult<RegisterMap> {
    let mut owners: HashMap<&str, &str> = HashMap::new();
    let mut fields = Vec::with_capacity(parts.iter().map(|p| p.fields().len()).sum());
    let mut offset = 0u64;

    for part in parts {
        for field in part.fields() {
            if let Some(first_scope) = owners.insert(field.name(), part.scope()) {
                return Err(CompileError::NameCollision {
                    field: field.name().to_string(),
                    first_scope: first_scope.to_string(),
                    second_scope: part.scope().to_string(),
                });
            }
            let direction = part.list().direction_of(field);
            fields.push(MapField::place(field, direction, offset));
            offset += u64::from(field.width());
        }
    }

    let mut seen = HashSet::new();
    for part in parts {
        if !seen.insert(part.scope()) {
            return Err(CompileError::DuplicateScope {
                scope: part.scope().to_string(),
            });
        }
    }

    debug!(
        "composed {name}: {} parts, {} fields, {offset} bits",
        parts.len(),
        fields.len()
    );

    Ok(RegisterMap {
        name: name.to_string(),
        scopes: parts.iter().map(|p| p.scope().to_string()).collect(),
        fields,
        total_width: offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::prefix;
    use crate::types::DescriptorList;

    fn list(fields: &[(&str, u32)]) -> DescriptorList {
        DescriptorList::inputs(
            fields
                .iter()
                .map(|(n, w)| FieldDescriptor::new(n, *w).unwrap())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_compose_lsb_first() {
        let rop = prefix("rop", &list(&[("fmt", 2), ("blend", 3)])).unwrap();
        let setup = prefix("setup", &list(&[("x0", 13)])).unwrap();
        let map = compose("csr_t", &[rop, setup]).unwrap();

        let layout: Vec<_> = map
            .fields()
            .iter()
            .map(|f| (f.name.as_str(), f.bit_offset, f.msb()))
            .collect();
        assert_eq!(
            layout,
            vec![("rop_fmt", 0, 1), ("rop_blend", 2, 4), ("setup_x0", 5, 17)]
        );
        assert_eq!(map.total_width(), 18);
        assert_eq!(map.scopes(), ["rop".to_string(), "setup".to_string()]);
        assert_eq!(map.packed_words(8), 3);
        assert_eq!(map.packed_words(32), 1);
    }

    #[test]
    fn test_compose_reports_first_collision() {
        let a = prefix("rop", &list(&[("fmt", 2), ("blend", 3), ("mask", 4)])).unwrap();
        let b = prefix("rop", &list(&[("mask", 4), ("blend", 3)])).unwrap();
        assert_eq!(
            compose("csr_t", &[a, b]).unwrap_err(),
            CompileError::NameCollision {
                field: "rop_mask".into(),
                first_scope: "rop".into(),
                second_scope: "rop".into(),
            }
        );
    }

    #[test]
    fn test_compose_rejects_repeated_scope() {
        let a = prefix("rop", &list(&[("fmt", 2)])).unwrap();
        let b = prefix("rop", &list(&[("blend", 3)])).unwrap();
        assert_eq!(
            compose("csr_t", &[a, b]).unwrap_err(),
            CompileError::DuplicateScope {
                scope: "rop".into()
            }
        );
    }

    #[test]
    fn test_compose_detects_cross_scope_collision() {
        // `a` + `b_c` and `a_b` + `c` both produce `a_b_c`
        let a = prefix("a", &list(&[("b_c", 1)])).unwrap();
        let ab = prefix("a_b", &list(&[("c", 1)])).unwrap();
        assert_eq!(
            compose("m", &[a, ab]).unwrap_err(),
            CompileError::NameCollision {
                field: "a_b_c".into(),
                first_scope: "a".into(),
                second_scope: "a_b".into(),
            }
        );
    }

    #[test]
    fn test_compose_empty() {
        let map = compose("empty", &[]).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.total_width(), 0);
        assert_eq!(map.packed_words(32), 0);
    }
}
