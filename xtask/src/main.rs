// Licensed under the Apache-2.0 license

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::path::PathBuf;

mod regmap;
mod schema;

#[derive(Parser)]
#[command(name = "xtask", about = "Manjuu CSR and bus descriptor tooling")]
struct Xtask {
    /// Log every compiler stage
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    xtask: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a schema into register maps and channel types
    Regmap {
        /// Schema module (TOML)
        schema: PathBuf,

        /// Compiler configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t)]
        format: regmap::Format,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Additional suffixes to strip when deriving scopes from list names
        #[arg(long = "strip-suffix")]
        strip_suffixes: Vec<String>,

        /// Do not strip the default suffixes (_t, _csr, _req, _resp)
        #[arg(long)]
        no_default_strip: bool,
    },
    /// Compile and validate a schema without writing output
    Check {
        /// Schema module (TOML)
        schema: PathBuf,

        /// Compiler configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Xtask::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new().with_level(level).init()?;

    match cli.xtask {
        Commands::Regmap {
            schema,
            config,
            format,
            output,
            strip_suffixes,
            no_default_strip,
        } => regmap::generate(
            &schema,
            config.as_deref(),
            &regmap::name_config(&strip_suffixes, no_default_strip),
            format,
            output.as_deref(),
        ),
        Commands::Check { schema, config } => regmap::check(
            &schema,
            config.as_deref(),
            &regmap::name_config(&[], false),
        ),
    }
}
