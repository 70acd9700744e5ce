// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

use ghg_engine::schema::Schema;
use ghg_engine::{Calculator, ReferenceTables, Snapshot, SummaryTable, profiles, snapshot, summary};

mod render;

use render::Report;

const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "ghg", version, about = "Industry greenhouse-gas emission calculators")]
struct Cli {
    /// Log more to stderr (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the built-in industry profiles with their categories and rules
    Profiles,
    /// Write the built-in reference tables as JSON
    Catalog {
        /// Path to write the catalog to (default: stdout)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Restore snapshots and print their totals
    Summarize(SummarizeArgs),
    /// Print the JSON schema of the snapshot format
    Schema,
}

#[derive(Parser)]
struct SummarizeArgs {
    /// Reference tables JSON (default: the built-in catalog)
    #[arg(long, value_name = "FILE")]
    reference: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,
    /// Snapshot JSON files
    #[arg(required = true, value_name = "SNAPSHOT")]
    snapshots: Vec<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Csv,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn list_profiles(out: &mut dyn Write) -> Result<()> {
    for profile in profiles::all() {
        let schema = Schema::compile(profile)?;
        writeln!(out, "{} ({})", schema.key, schema.name)?;
        for rule in schema.rules() {
            let label = schema
                .category(&rule.category_key)
                .map(|c| c.label.as_str())
                .unwrap_or_default();
            writeln!(
                out,
                "    {} {:<24} x {:<10.6} {}",
                render::sign_symbol(rule.sign),
                rule.category_key,
                rule.conversion_factor,
                label
            )?;
        }
    }
    Ok(())
}

fn write_catalog(output: Option<&Path>) -> Result<()> {
    let json = ReferenceTables::builtin().to_json();
    match output {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("writing catalog to {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

fn load_tables(path: &Path) -> Result<ReferenceTables> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let tables = ReferenceTables::from_reader(BufReader::new(file))
        .with_context(|| format!("reading reference tables {}", path.display()))?;
    Ok(tables)
}

fn report_for(path: &Path, tables: &ReferenceTables, table: &summary::Shared) -> Result<Report> {
    let json =
        fs::read_to_string(path).with_context(|| format!("opening {}", path.display()))?;
    let snapshot = Snapshot::from_json(&json)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let mut calc = Calculator::restore_builtin(tables, &snapshot)
        .with_context(|| format!("restoring snapshot {}", path.display()))?;

    let source = path.display().to_string();
    summary::connect_as(table, &mut calc, &source);
    Ok(Report::new(source, &calc))
}

fn summarize(args: &SummarizeArgs) -> Result<()> {
    let custom;
    let tables = match &args.reference {
        Some(path) => {
            custom = load_tables(path)?;
            &custom
        }
        None => ReferenceTables::builtin(),
    };

    let table = SummaryTable::shared();
    let reports = args
        .snapshots
        .iter()
        .map(|path| report_for(path, tables, &table))
        .collect::<Result<Vec<_>>>()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        Format::Table => render::table(&mut out, &reports, &table.borrow())?,
        Format::Csv => render::csv(&mut out, &reports)?,
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Profiles => list_profiles(&mut io::stdout().lock()),
        Command::Catalog { output } => write_catalog(output.as_deref()),
        Command::Summarize(args) => summarize(&args),
        Command::Schema => {
            println!("{}", snapshot::generate_schema_json());
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(EXIT_FAILURE);
    }
}
