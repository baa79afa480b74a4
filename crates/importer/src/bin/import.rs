use clap::{Parser, Subcommand};
use importer::{
    AthleteImporter, ImportConfig, NoPersisted, SheetFormat, read_rows,
    template::{TEMPLATE_FILE_NAME, template_workbook},
};
use sqlx::postgres::PgPoolOptions;
use std::path::{Path, PathBuf};
use storage::repository::coach::CoachRepository;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "entrydesk-import")]
#[command(about = "EntryDesk athlete spreadsheet importer", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    verbose: bool,

    /// Print the report as JSON instead of log lines
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a spreadsheet without touching the database
    Validate { file: PathBuf },
    /// Import a spreadsheet on behalf of a coach
    Import {
        file: PathBuf,

        #[arg(long)]
        coach_email: String,

        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
    /// Write the blank entry sheet
    Template {
        #[arg(long, default_value = TEMPLATE_FILE_NAME)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("entrydesk_import={},importer={}", log_level, log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ImportConfig::default();

    match cli.command {
        Commands::Validate { file } => handle_validate(&file, &config, cli.json)?,
        Commands::Import {
            file,
            coach_email,
            database_url,
        } => handle_import(&file, &coach_email, &database_url, &config, cli.json).await?,
        Commands::Template { output } => {
            tokio::fs::write(&output, template_workbook()?).await?;
            tracing::info!("Template written to {}", output.display());
        }
    }

    Ok(())
}

fn handle_validate(
    file: &Path,
    config: &ImportConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Validating spreadsheet: {}", file.display());

    let rows = load_rows(file)?;
    let outcome = importer::BatchImporter::new(config, 0).run(rows, &NoPersisted);

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    for message in outcome.messages() {
        tracing::warn!("  {}", message);
    }
    let summary = outcome.summary();
    tracing::info!(
        "Summary: {} row(s), {} valid, {} skipped, {} unreadable",
        summary.total,
        summary.accepted,
        summary.skipped,
        summary.failed
    );

    Ok(())
}

async fn handle_import(
    file: &Path,
    coach_email: &str,
    database_url: &str,
    config: &ImportConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let rows = load_rows(file)?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    let coach = CoachRepository::new(&pool)
        .find_by_email(&coach_email.trim().to_lowercase())
        .await
        .map_err(|e| format!("Coach '{}' not found: {}", coach_email, e))?;

    tracing::info!("Importing {} row(s) for {} <{}>", rows.len(), coach.name, coach.email);
    let report = AthleteImporter::new(&pool, config)
        .import(coach.id, rows)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for message in report.messages() {
        tracing::warn!("  {}", message);
    }
    for athlete in &report.created {
        tracing::info!("  ✓ #{} {} ({})", athlete.unique_id, athlete.name, athlete.day);
    }
    tracing::info!(
        "Summary: {} imported, {} skipped, {} unreadable",
        report.summary.accepted,
        report.summary.skipped,
        report.summary.failed
    );

    Ok(())
}

fn load_rows(file: &Path) -> Result<Vec<importer::RowInput>, Box<dyn std::error::Error>> {
    let format = SheetFormat::from_path(file)?;
    let bytes = std::fs::read(file)?;
    Ok(read_rows(&bytes, format)?)
}
