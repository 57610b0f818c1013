// Licensed under the Apache-2.0 license

//! Compiler core for the Manjuu rasterizer's CSR and bus descriptors.
//!
//! Register blocks and bus messages are described as ordered lists of
//! fields. This crate namespaces those lists, composes them into flat
//! register maps, builds request/response channel types with valid/ready
//! handshakes, and validates everything against a frozen table of named
//! constants before handing it to a downstream generator.
//!
//! ## Usage
//!
//! ```
//! use manjuu_csr::{
//!     prefix, Compiler, CompilerConfig, ConstantTable, DefaultValue, DescriptorList,
//!     FieldDescriptor,
//! };
//!
//! let mut constants = ConstantTable::new();
//! constants.define("FMT_Y8", "2'd0").unwrap();
//! let compiler = Compiler::new(constants.freeze(), CompilerConfig::default());
//!
//! let rop = DescriptorList::inputs(vec![
//!     FieldDescriptor::new("fmt", 2)
//!         .unwrap()
//!         .with_default(DefaultValue::Constant("FMT_Y8".into())),
//!     FieldDescriptor::new("mask", 4).unwrap(),
//! ])
//! .unwrap();
//!
//! let map = compiler
//!     .compile_map("csr_t", &[prefix("rop", &rop).unwrap()])
//!     .unwrap();
//! assert_eq!(map.total_width(), 6);
//! assert_eq!(map.fields()[1].name, "rop_mask");
//!
//! let listing = compiler.emit(&[map], &[]).render_listing();
//! assert!(listing.contains("rop_fmt = FMT_Y8"));
//! ```
//!
//! ## Module Organization
//!
//! - [`types`]: field descriptors, descriptor lists, directions
//! - [`namespace`]: [`prefix`] scoping
//! - [`constants`]: the [`ConstantTable`] and its phases
//! - [`compose`]: register map composition
//! - [`channel`]: request/response channel pairs
//! - [`validate`]: the [`Validator`] and its [`Diagnostic`]s
//! - [`output`]: emitted artifacts, JSON and listing rendering
//! - [`config`]: [`CompilerConfig`] and [`NameConfig`]
//! - [`util`]: identifier checks, bit counting and hex formatting

pub mod channel;
pub mod compose;
pub mod config;
pub mod constants;
pub mod error;
pub mod namespace;
pub mod output;
pub mod types;
pub mod util;
pub mod validate;
pub mod value;

mod compiler;

// Re-export main public API
pub use channel::{ChannelPair, ChannelPairBuilder, TransferPolicy};
pub use compiler::Compiler;
pub use compose::{compose, MapField, RegisterMap};
pub use config::{CompilerConfig, NameConfig};
pub use constants::{Building, Constant, ConstantTable, Frozen};
pub use error::{CompileError, CompileResult};
pub use namespace::{prefix, NamespacedList};
pub use output::EmittedUnit;
pub use types::{DefaultValue, DescriptorList, Direction, FieldDescriptor, ScopeChain, Side};
pub use validate::{Diagnostic, Rule, Validator};
pub use value::{parse_literal, Integer};
