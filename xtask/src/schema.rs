// Licensed under the Apache-2.0 license

//! TOML schema modules.
//!
//! A schema declares constants, enums, descriptor lists, register maps built
//! from those lists and channels whose sides are lists:
//!
//! ```toml
//! [constants]
//! FMT_Y8 = "2'd0"
//!
//! [[enum]]
//! prefix = "BLEND"
//! values = ["NONE", "ALPHA"]
//!
//! [[list]]
//! name = "rop_csr_t"
//! fields = [["i", "fmt", 2, "FMT_Y8"], { name = "mask", width = 4 }]
//!
//! [[map]]
//! name = "csr_t"
//! parts = ["rop_csr_t"]
//! ```
//!
//! Constants are defined in key order, then enums in file order.

use anyhow::{anyhow, bail, Context, Result};
use log::debug;
use manjuu_csr::{
    prefix, ChannelPairBuilder, Compiler, CompilerConfig, ConstantTable, DefaultValue,
    DescriptorList, Direction, EmittedUnit, FieldDescriptor, Integer, NameConfig,
    TransferPolicy,
};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    #[serde(default)]
    pub constants: BTreeMap<String, ConstantEntry>,
    #[serde(default, rename = "enum")]
    pub enums: Vec<EnumDef>,
    #[serde(default, rename = "list")]
    pub lists: Vec<ListDef>,
    #[serde(default, rename = "map")]
    pub maps: Vec<MapDef>,
    #[serde(default, rename = "channel")]
    pub channels: Vec<ChannelDef>,
}

/// A constant written as a Verilog literal or a plain TOML integer.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ConstantEntry {
    Literal(String),
    Number(u64),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumDef {
    pub prefix: String,
    pub values: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListDef {
    pub name: String,
    /// Direction of fields that do not set one. Defaults to input.
    pub direction: Option<String>,
    pub fields: Vec<FieldEntry>,
}

/// One field of a list: `[dir, name, width]`, `[dir, name, width, default]`
/// or a table.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FieldEntry {
    Triplet(String, String, i64),
    Quad(String, String, i64, String),
    Table(FieldTable),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldTable {
    pub name: String,
    pub width: i64,
    pub direction: Option<String>,
    pub default: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapDef {
    pub name: String,
    pub parts: Vec<MapPart>,
}

/// A list to compose, with its scope derived from the list name unless given.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MapPart {
    List(String),
    Scoped { list: String, scope: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelDef {
    pub name: String,
    pub request: String,
    pub response: String,
    pub policy: Option<TransferPolicy>,
}

impl FieldEntry {
    fn descriptor(&self) -> Result<FieldDescriptor> {
        let (direction, name, width, default) = match self {
            FieldEntry::Triplet(dir, name, width) => (Some(dir), name, *width, None),
            FieldEntry::Quad(dir, name, width, default) => {
                (Some(dir), name, *width, Some(default))
            }
            FieldEntry::Table(t) => (t.direction.as_ref(), &t.name, t.width, t.default.as_ref()),
        };
        let mut field = FieldDescriptor::with_signed_width(name, width)?;
        if let Some(dir) = direction {
            field = field.with_direction(dir.parse()?);
        }
        if let Some(default) = default {
            field = field.with_default(DefaultValue::parse(default)?);
        }
        Ok(field)
    }
}

impl ListDef {
    fn descriptor_list(&self) -> Result<DescriptorList> {
        let direction = match &self.direction {
            Some(tag) => tag.parse()?,
            None => Direction::Input,
        };
        let fields = self
            .fields
            .iter()
            .map(FieldEntry::descriptor)
            .collect::<Result<Vec<_>>>()?;
        Ok(DescriptorList::new(direction, fields)?)
    }
}

impl Schema {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read schema {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse schema {}", path.display()))
    }

    /// Compiles every map and channel of the schema into one unit.
    pub fn compile(&self, config: CompilerConfig, names: &NameConfig) -> Result<EmittedUnit> {
        let mut constants = ConstantTable::new();
        for (mnemonic, entry) in &self.constants {
            let defined = match entry {
                ConstantEntry::Literal(literal) => constants.define(mnemonic, literal),
                ConstantEntry::Number(value) => {
                    constants.define_value(mnemonic, Integer::unsized_value(*value))
                }
            };
            defined.with_context(|| format!("constant `{mnemonic}`"))?;
        }
        for def in &self.enums {
            let values: Vec<&str> = def.values.iter().map(String::as_str).collect();
            constants
                .define_enum(&def.prefix, &values)
                .with_context(|| format!("enum `{}`", def.prefix))?;
        }
        let compiler = Compiler::new(constants.freeze(), config);

        let mut lists = HashMap::new();
        for def in &self.lists {
            let list = def
                .descriptor_list()
                .with_context(|| format!("list `{}`", def.name))?;
            if lists.insert(def.name.as_str(), list).is_some() {
                bail!("list `{}` is declared twice", def.name);
            }
        }
        debug!("schema has {} lists", lists.len());
        let find = |name: &str| {
            lists
                .get(name)
                .ok_or_else(|| anyhow!("list `{name}` is not declared"))
        };

        let mut maps = Vec::with_capacity(self.maps.len());
        for def in &self.maps {
            let parts = def
                .parts
                .iter()
                .map(|part| -> Result<_> {
                    let (list, scope) = match part {
                        MapPart::List(list) => (list, names.scope_for(list)),
                        MapPart::Scoped { list, scope } => (list, scope.clone()),
                    };
                    Ok(prefix(&scope, find(list.as_str())?)?)
                })
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("map `{}`", def.name))?;
            maps.push(compiler.compile_map(&def.name, &parts)?);
        }

        let mut channels = Vec::with_capacity(self.channels.len());
        for def in &self.channels {
            let request = find(def.request.as_str())?;
            let response = find(def.response.as_str())?;
            let mut builder = ChannelPairBuilder::new(&def.name)?;
            builder
                .request_list(request)
                .and_then(|b| b.response_list(response))
                .with_context(|| format!("channel `{}`", def.name))?;
            if let Some(policy) = def.policy {
                builder.policy(policy);
            }
            channels.push(compiler.compile_channel(&builder)?);
        }

        Ok(compiler.emit(&maps, &channels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manjuu_csr::{CompileError, Diagnostic};

    const RASTERIZER: &str = include_str!("../../hw/rasterizer.toml");

    #[test]
    fn test_rasterizer_schema() {
        let schema = Schema::parse(RASTERIZER).unwrap();
        let unit = schema
            .compile(CompilerConfig::default(), &NameConfig::with_defaults())
            .unwrap();

        let csr_t = unit
            .register_maps
            .iter()
            .find(|m| m.name == "csr_t")
            .unwrap();
        assert_eq!(csr_t.fields[0].name, "rop_fmt");
        assert!(csr_t.fields.iter().any(|f| f.name == "setup_trigger_ready"));

        let ras = &unit.channels[0];
        assert_eq!(ras.name, "ras");
        assert_eq!(ras.request.payload_width, 4 * 13 + 3 * 28 + 6 * 13);
        assert_eq!(ras.response.payload_width, 26);
        assert!(unit.constants.iter().any(|c| c.mnemonic == "FMT_Y8"));
    }

    #[test]
    fn test_field_forms() {
        let schema = Schema::parse(
            r#"
[constants]
FMT_Y8 = "2'd0"
LIMIT = 100

[[list]]
name = "tmu_csr_t"
direction = "o"
fields = [
    ["i", "addr", 32],
    ["i", "fmt", 2, "FMT_Y8"],
    { name = "level", width = 4, default = "4'd3" },
]

[[map]]
name = "tmu"
parts = ["tmu_csr_t"]
"#,
        )
        .unwrap();
        let unit = schema
            .compile(CompilerConfig::default(), &NameConfig::with_defaults())
            .unwrap();
        let map = &unit.register_maps[0];
        let fields: Vec<_> = map
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.width, f.direction, f.default.as_deref()))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("tmu_addr", 32, Direction::Input, None),
                ("tmu_fmt", 2, Direction::Input, Some("FMT_Y8")),
                ("tmu_level", 4, Direction::Output, Some("4'd3")),
            ]
        );
        assert_eq!(unit.constants[0].mnemonic, "FMT_Y8");
        assert_eq!(unit.constants[1].literal, "100");
    }

    #[test]
    fn test_scoped_part_collision() {
        let schema = Schema::parse(
            r#"
[[list]]
name = "rop_csr_t"
fields = [["i", "fmt", 2], ["i", "mask", 4]]

[[map]]
name = "csr_t"
parts = ["rop_csr_t", { list = "rop_csr_t", scope = "rop" }]
"#,
        )
        .unwrap();
        let err = schema
            .compile(CompilerConfig::default(), &NameConfig::with_defaults())
            .unwrap_err();
        let diag = err.downcast_ref::<Diagnostic>().unwrap();
        assert_eq!(diag.field, "rop_fmt");
        assert!(matches!(diag.error, CompileError::NameCollision { .. }));
    }

    #[test]
    fn test_response_with_input_tags() {
        let schema = Schema::parse(
            r#"
[[list]]
name = "ras_req_t"
fields = [["i", "edge0", 28]]

[[list]]
name = "ras_resp_t"
fields = [["i", "x", 13]]

[[channel]]
name = "ras"
request = "ras_req_t"
response = "ras_resp_t"
"#,
        )
        .unwrap();
        let err = schema
            .compile(CompilerConfig::default(), &NameConfig::with_defaults())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CompileError>(),
            Some(CompileError::DirectionMismatch { .. })
        ));
        assert!(format!("{err:#}").starts_with("channel `ras`"));
    }

    #[test]
    fn test_schema_errors() {
        let compile = |text: &str| {
            Schema::parse(text)?.compile(CompilerConfig::default(), &NameConfig::with_defaults())
        };

        let err = compile("[[list]]\nname = \"a\"\nfields = [[\"x\", \"f\", 1]]").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CompileError>(),
            Some(CompileError::InvalidDirection { .. })
        ));

        let err = compile("[[list]]\nname = \"a\"\nfields = [[\"i\", \"f\", -1]]").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CompileError>(),
            Some(CompileError::InvalidWidth { width: -1, .. })
        ));

        let err =
            compile("[[list]]\nname = \"a\"\nfields = [[\"i\", \"f\", 2, \"2'd4\"]]").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CompileError>(),
            Some(CompileError::InvalidLiteral { .. })
        ));

        let err = compile("[[map]]\nname = \"m\"\nparts = [\"missing_t\"]").unwrap_err();
        assert!(format!("{err:#}").contains("list `missing_t` is not declared"));

        assert!(compile("[[list]]\nname = \"a\"\nfields = []\n[[list]]\nname = \"a\"\nfields = []")
            .is_err());
        assert!(compile("unknown = 1").is_err());
    }
}
