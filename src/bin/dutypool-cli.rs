#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use dutypool::{
    io,
    schedule::{self, DayKind},
    storage::{CsvPrecountStore, PrecountStore},
    Document,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// Répartition équitable d'astreintes entre groupes
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Générer le planning de la période
    Run {
        /// Document JSON d'entrée
        #[arg(long, default_value = "data.json")]
        input: PathBuf,
        /// Nom de sortie sans extension (défaut : `output_filename` ou `result`)
        #[arg(long)]
        output: Option<String>,
        #[arg(long, value_enum, default_value_t = Target::Csv)]
        to: Target,
        /// Graine du mélange (prioritaire sur `config.seed`)
        #[arg(long)]
        seed: Option<u64>,
        /// Reports du run précédent (`nom,precount`)
        #[arg(long, default_value = "precounts.csv")]
        precounts: PathBuf,
        /// Reports à écrire pour le run suivant
        #[arg(long, default_value = "_precounts.csv")]
        carry_over: PathBuf,
        /// Date de référence YYYY-MM-DD (défaut : aujourd'hui, UTC)
        #[arg(long)]
        reference_date: Option<String>,
    },

    /// Valider le document d'entrée
    Check {
        #[arg(long, default_value = "data.json")]
        input: PathBuf,
        #[arg(long)]
        reference_date: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Target {
    Csv,
    Json,
    Stdout,
}

fn reference_date(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("invalid reference date: {raw}")),
        None => Ok(Utc::now().date_naive()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .try_init();
    }

    match cli.cmd {
        Commands::Run {
            input,
            output,
            to,
            seed,
            precounts,
            carry_over,
            reference_date: raw_reference,
        } => {
            let doc = Document::from_path(&input)?;
            let reference = reference_date(raw_reference.as_deref())?;
            let carried = CsvPrecountStore::open(&precounts).load()?;
            let mut rng = match seed.or(doc.config.seed) {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };

            let run = schedule::run(&doc, &carried, reference, &mut rng)?;
            CsvPrecountStore::open(&carry_over).save(&run.carry_over())?;

            let stem = output
                .or_else(|| doc.config.output_filename.clone())
                .unwrap_or_else(|| "result".to_string());
            match to {
                Target::Csv => {
                    let path = format!("{stem}.csv");
                    io::export_roster_csv(&path, &run)?;
                    println!("Schedule written to {path} (retried: {})", run.attempts - 1);
                }
                Target::Json => {
                    let path = format!("{stem}.json");
                    io::export_roster_json(&path, &run)?;
                    println!("Schedule written to {path} (retried: {})", run.attempts - 1);
                }
                Target::Stdout => print!("{}", io::render_text(&run)),
            }
        }
        Commands::Check {
            input,
            reference_date: raw_reference,
        } => {
            let doc = Document::from_path(&input)?;
            let reference = reference_date(raw_reference.as_deref())?;
            let weekday = schedule::period_dates(&doc, reference, DayKind::Weekday)?;
            let weekend = schedule::period_dates(&doc, reference, DayKind::Weekend)?;
            println!(
                "OK: {} group(s), {} people, gap {} day(s), {} weekday(s), {} weekend day(s)",
                doc.groups.len(),
                doc.people_count(),
                doc.gap_size(),
                weekday.len(),
                weekend.len()
            );
        }
    }

    Ok(())
}
