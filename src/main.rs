use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sqltailor::config::{ModuloStyle, TailorConfig};
use sqltailor::tailor::translate_sql;
use tracing_subscriber::EnvFilter;

/// Rewrite portable SQL into MS SQL Server syntax
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// SQL to translate; read from stdin when omitted
    sql: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Override the modulo spelling from the config file
    #[arg(long = "modulo", value_enum)]
    modulo: Option<ModuloArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModuloArg {
    Percent,
    Keyword,
}

impl From<ModuloArg> for ModuloStyle {
    fn from(arg: ModuloArg) -> Self {
        match arg {
            ModuloArg::Percent => ModuloStyle::Percent,
            ModuloArg::Keyword => ModuloStyle::Keyword,
        }
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays pipeable SQL.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => TailorConfig::load_from(path)?,
        None => TailorConfig::load()?,
    };
    if let Some(modulo) = cli.modulo {
        config.modulo = modulo.into();
    }

    let sql = match cli.sql {
        Some(sql) => sql,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("reading SQL from stdin")?;
            buffer
        }
    };

    for statement in translate_sql(&sql, &config)? {
        println!("{}", statement);
    }
    Ok(())
}
