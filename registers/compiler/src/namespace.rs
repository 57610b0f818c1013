// Licensed under the Apache-2.0 license

//! The namespacing operator.
//!
//! `prefix("rop", list)` renames every field `rop_<name>` so that blocks
//! authored independently can be composed without name clashes.

use crate::error::{CompileError, CompileResult};
use crate::types::{DescriptorList, FieldDescriptor};
use crate::util::check_identifier;
use log::debug;
use std::collections::HashSet;

/// A descriptor list whose fields have been renamed into a scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespacedList {
    scope: String,
    list: DescriptorList,
}

impl NamespacedList {
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The renamed fields. Every field carries an explicit direction.
    pub fn list(&self) -> &DescriptorList {
        &self.list
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        self.list.fields()
    }

    pub fn total_width(&self) -> u64 {
        self.list.total_width()
    }

    pub fn into_list(self) -> DescriptorList {
        self.list
    }
}

/// Renames every field of `list` to `<scope>_<name>`.
///
/// Order and count are preserved and each field's direction is resolved
/// against the list default, so the result no longer depends on it.
pub fn prefix(scope: &str, list: &DescriptorList) -> CompileResult<NamespacedList> {
    if let Err(reason) = check_identifier(scope) {
        return Err(CompileError::InvalidName {
            name: scope.to_string(),
            reason,
        });
    }

    let mut seen = HashSet::with_capacity(list.len());
    let mut fields = Vec::with_capacity(list.len());
    for field in list.fields() {
        let renamed = field.scoped(scope, list.direction_of(field))?;
        if !seen.insert(renamed.name().to_string()) {
            return Err(CompileError::DuplicateAfterRename {
                scope: scope.to_string(),
                field: renamed.name().to_string(),
            });
        }
        fields.push(renamed);
    }
    debug!("prefix {scope}: {} fields", fields.len());

    Ok(NamespacedList {
        scope: scope.to_string(),
        list: DescriptorList::new(list.default_direction(), fields)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, ScopeChain};

    fn rop() -> DescriptorList {
        DescriptorList::inputs(vec![
            FieldDescriptor::new("fmt", 2).unwrap(),
            FieldDescriptor::new("blend", 3).unwrap(),
            FieldDescriptor::output("busy", 1).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_prefix_renames_in_order() {
        let list = rop();
        let scoped = prefix("rop", &list).unwrap();
        assert_eq!(scoped.scope(), "rop");
        assert_eq!(scoped.fields().len(), list.len());
        for (orig, renamed) in list.fields().iter().zip(scoped.fields()) {
            assert_eq!(renamed.name(), format!("rop_{}", orig.name()));
            assert_eq!(renamed.width(), orig.width());
        }
        assert_eq!(scoped.total_width(), list.total_width());
    }

    #[test]
    fn test_prefix_resolves_directions() {
        let scoped = prefix("rop", &rop()).unwrap();
        let dirs: Vec<_> = scoped.fields().iter().map(|f| f.direction()).collect();
        assert_eq!(
            dirs,
            vec![
                Some(Direction::Input),
                Some(Direction::Input),
                Some(Direction::Output)
            ]
        );
    }

    #[test]
    fn test_prefix_leaves_input_untouched() {
        let list = rop();
        let before = list.clone();
        let _ = prefix("rop", &list).unwrap();
        assert_eq!(list, before);
    }

    #[test]
    fn test_nested_prefix_origin() {
        let inner = prefix("rop", &rop()).unwrap();
        let outer = prefix("gpu", inner.list()).unwrap();
        let field = &outer.fields()[0];
        assert_eq!(field.name(), "gpu_rop_fmt");
        assert_eq!(
            field.origin(),
            &ScopeChain::new().enclosed_by("rop").enclosed_by("gpu")
        );
    }

    #[test]
    fn test_prefix_rejects_bad_scope() {
        assert!(matches!(
            prefix("", &rop()),
            Err(CompileError::InvalidName { .. })
        ));
        assert!(matches!(
            prefix("2d", &rop()),
            Err(CompileError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_prefix_detects_duplicate_after_rename() {
        let list = DescriptorList::new_unchecked(
            Direction::Input,
            vec![
                FieldDescriptor::new("x", 1).unwrap(),
                FieldDescriptor::new("x", 2).unwrap(),
            ],
        );
        assert_eq!(
            prefix("setup", &list).unwrap_err(),
            CompileError::DuplicateAfterRename {
                scope: "setup".into(),
                field: "setup_x".into(),
            }
        );
    }
}
