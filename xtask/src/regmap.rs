// Licensed under the Apache-2.0 license

//! Compile a schema module into register maps and channel types.

use crate::schema::Schema;
use anyhow::{Context, Result};
use clap::ValueEnum;
use log::info;
use manjuu_csr::{CompilerConfig, EmittedUnit, NameConfig};
use std::path::Path;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[default]
    Listing,
    Json,
}

/// Loads a compiler configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<CompilerConfig> {
    let Some(path) = path else {
        return Ok(CompilerConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
}

/// Builds the scope naming rules from the command line options.
pub fn name_config(strip_suffixes: &[String], no_default_strip: bool) -> NameConfig {
    let mut name_config = if no_default_strip {
        NameConfig::none()
    } else {
        NameConfig::with_defaults()
    };
    for suffix in strip_suffixes {
        name_config = name_config.add_suffix(suffix);
    }
    name_config
}

fn compile(schema: &Path, config: Option<&Path>, names: &NameConfig) -> Result<EmittedUnit> {
    let config = load_config(config)?;
    Schema::load(schema)?
        .compile(config, names)
        .with_context(|| format!("failed to compile {}", schema.display()))
}

/// Compiles `schema` and writes the result to `output`, or stdout.
pub fn generate(
    schema: &Path,
    config: Option<&Path>,
    names: &NameConfig,
    format: Format,
    output: Option<&Path>,
) -> Result<()> {
    info!("Compiling schema {}", schema.display());
    let unit = compile(schema, config, names)?;
    let rendered = match format {
        Format::Listing => unit.render_listing(),
        Format::Json => unit.to_json()?,
    };

    if let Some(output_path) = output {
        std::fs::write(output_path, &rendered)
            .with_context(|| format!("failed to write {}", output_path.display()))?;
        info!("Output written to: {}", output_path.display());
    } else {
        println!("{rendered}");
    }
    Ok(())
}

/// Compiles `schema` without writing anything.
pub fn check(schema: &Path, config: Option<&Path>, names: &NameConfig) -> Result<()> {
    let unit = compile(schema, config, names)?;
    println!(
        "{}: {} constants, {} register maps, {} channels",
        schema.display(),
        unit.constants.len(),
        unit.register_maps.len(),
        unit.channels.len()
    );
    Ok(())
}
