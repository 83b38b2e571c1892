#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand, ValueEnum};
use medroster::{
    export_blank_csv, export_schedule_csv, load_config, schedule_month, scheduler::SchedError,
    storage::{JsonStorage, Storage},
    Engine, PeriodKind, Post, Schedule, SchedulerInput, SolveOptions,
};
use std::time::Duration;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planification mensuelle des gardes ER/ward
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON de configuration (médecins, fériés, autopsies)
    #[arg(long, global = true, default_value = "roster.json")]
    config: String,

    #[command(subcommand)]
    cmd: Option<Commands>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EngineArg {
    Exact,
    Anneal,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Planifier un mois donné (par défaut : le mois courant)
    Schedule {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long, value_enum, default_value = "exact")]
        engine: EngineArg,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Budget mural total, en secondes
        #[arg(long, default_value_t = 300)]
        time_limit: u64,
        /// Export CSV du planning (optionnel)
        #[arg(long)]
        out_csv: Option<String>,
        /// Sauvegarde JSON du planning (optionnel)
        #[arg(long)]
        out_json: Option<String>,
    },

    /// Générer un gabarit mensuel vierge
    Blank {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long, default_value = "blank_schedule.csv")]
        out: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let today = Local::now().date_naive();
    let cmd = cli.cmd.unwrap_or(Commands::Schedule {
        year: None,
        month: None,
        engine: EngineArg::Exact,
        seed: 42,
        time_limit: 300,
        out_csv: None,
        out_json: None,
    });

    let code = match cmd {
        Commands::Schedule {
            year,
            month,
            engine,
            seed,
            time_limit,
            out_csv,
            out_json,
        } => {
            let year = year.unwrap_or_else(|| today.year());
            let month = month.unwrap_or_else(|| today.month());
            let config = load_config(&cli.config)?;
            let opts = SolveOptions {
                engine: match engine {
                    EngineArg::Exact => Engine::Exact,
                    EngineArg::Anneal => Engine::Annealing,
                },
                seed,
                time_budget: Duration::from_secs(time_limit),
                ..SolveOptions::default()
            };

            let input = config.month_input(year, month)?;
            print_expected(&input);

            match schedule_month(&config, year, month, &opts) {
                Ok(outcome) => {
                    print_schedule(&input, &outcome.schedule);
                    print_summary(&input, &outcome.schedule);
                    println!("soft penalty: {}", outcome.penalty);
                    print!("{}", outcome.report);

                    if let Some(path) = out_csv {
                        export_schedule_csv(&path, &input, &outcome.schedule)?;
                        println!("Schedule exported to {path}");
                    }
                    if let Some(path) = out_json {
                        JsonStorage::open(&path)?.save(&outcome.schedule)?;
                        println!("Schedule saved to {path}");
                    }
                    0
                }
                Err(SchedError::VerifierFailed(report)) => {
                    eprintln!("produced schedule failed verification:\n{report}");
                    2
                }
                Err(err) => return Err(err.into()),
            }
        }
        Commands::Blank { year, month, out } => {
            let year = year.unwrap_or_else(|| today.year());
            let month = month.unwrap_or_else(|| today.month());
            // Fériés facultatifs : un gabarit reste utile sans config.
            let holidays = load_config(&cli.config)
                .map(|c| c.holidays)
                .unwrap_or_default();
            export_blank_csv(&out, year, month, &holidays)
                .with_context(|| format!("generating blank template for {year}-{month}"))?;
            println!("Blank template written to {out}");
            0
        }
    };

    std::process::exit(code);
}

fn print_expected(input: &SchedulerInput) {
    println!("Expected 8-hour shifts per doctor:");
    for (doctor, quota) in &input.quotas {
        println!("Doctor: {doctor}");
        println!("  weekday ER: {}", quota.weekday.er);
        println!("  weekday ward: {}", quota.weekday.ward);
        println!("  weekend ER: {}", quota.weekend.er);
        println!("  weekend ward: {}", quota.weekend.ward);
    }
    println!();
}

fn print_schedule(input: &SchedulerInput, schedule: &Schedule) {
    for &date in &input.days {
        println!("{date}:");
        for a in schedule.entries(date) {
            println!("  {} {}: {}", a.post.label(), a.time.label(), a.doctor);
        }
        println!();
    }
}

fn print_summary(input: &SchedulerInput, schedule: &Schedule) {
    println!("Generated 8-hour shifts per doctor:");
    for doctor in &input.doctors {
        let mut counts = [[0u32; 2]; 2];
        for (date, entries) in schedule.iter() {
            let period = input.period_of(date);
            for a in entries {
                if &a.doctor == doctor {
                    let p = matches!(period, PeriodKind::Weekend) as usize;
                    let q = matches!(a.post, Post::Ward) as usize;
                    counts[p][q] += 1;
                }
            }
        }
        println!("Doctor: {doctor}");
        println!("  weekday ER: {}", counts[0][0]);
        println!("  weekday ward: {}", counts[0][1]);
        println!("  weekend ER: {}", counts[1][0]);
        println!("  weekend ward: {}", counts[1][1]);
    }
    println!();
}
