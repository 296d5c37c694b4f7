//! Balancete CLI - validate and import trial-balance exports
//!
//! ```bash
//! balancete process balancete.csv                 # Validate, print ledger JSON
//! balancete import balancete.csv --company ACME \
//!     --month 3 --year 2025 --user ana@auditmc.com.br
//! balancete imports --company ACME --year 2025    # List stored imports
//! balancete companies                             # List registered companies
//! balancete serve                                 # Start HTTP server (port 3000)
//! ```
//!
//! Settings come from the environment (see `balancete::config`); a `.env`
//! file in the working directory is loaded first.

use clap::{Parser, Subcommand};
use balancete::{
    pipeline::run_file, Actor, CompanyRegistry, FileCompanyRegistry, FileLedgerStore,
    ImportFilter, ImportRequest, Period, ProcessOutcome, Settings, UploadSession,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "balancete")]
#[command(about = "Validate and import balancete (trial-balance) exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the validation pipeline and output the ledger rows as JSON
    Process {
        /// Input CSV/TXT file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a file and store it for a company and period
    Import {
        /// Input CSV/TXT file
        input: PathBuf,

        /// Company id or name
        #[arg(short, long)]
        company: String,

        /// Reference month (1-12)
        #[arg(short, long)]
        month: u8,

        /// Reference year
        #[arg(short, long)]
        year: u16,

        /// Acting user
        #[arg(short, long)]
        user: String,

        /// Storage directory (overrides BALANCETE_DATA_DIR)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// List stored imports
    Imports {
        #[arg(short, long)]
        company: Option<String>,

        #[arg(short, long)]
        year: Option<u16>,

        #[arg(short, long)]
        month: Option<u8>,

        /// Storage directory (overrides BALANCETE_DATA_DIR)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// List companies from BALANCETE_COMPANIES_FILE
    Companies,

    /// Start HTTP server
    Serve {
        /// Port to listen on (overrides BALANCETE_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Storage directory (overrides BALANCETE_DATA_DIR)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match Settings::from_env() {
        Ok(settings) => match cli.command {
            Commands::Process { input, output } => cmd_process(&settings, &input, output.as_deref()),

            Commands::Import {
                input,
                company,
                month,
                year,
                user,
                data_dir,
            } => cmd_import(
                with_data_dir(settings, data_dir),
                &input,
                &company,
                month,
                year,
                &user,
            ),

            Commands::Imports {
                company,
                year,
                month,
                data_dir,
            } => cmd_imports(
                &with_data_dir(settings, data_dir),
                ImportFilter { company, year, month },
            ),

            Commands::Companies => cmd_companies(&settings),

            Commands::Serve { port, data_dir } => {
                let mut settings = with_data_dir(settings, data_dir);
                if let Some(port) = port {
                    settings.port = port;
                }
                balancete::server::start_server(settings).await
            }
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn with_data_dir(mut settings: Settings, data_dir: Option<PathBuf>) -> Settings {
    if let Some(dir) = data_dir {
        settings.data_dir = dir;
    }
    settings
}

fn cmd_process(
    settings: &Settings,
    input: &Path,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let outcome = ProcessOutcome::from(run_file(input, &settings.loader));
    if !outcome.success {
        return Err(outcome.message.into());
    }

    if let Some(report) = &outcome.report {
        eprintln!("   Encoding: {}", report.encoding);
        eprintln!("   Rows read: {}", report.source_rows);
        if !report.dropped_columns.is_empty() {
            eprintln!("   Dropped columns: {}", report.dropped_columns.join(", "));
        }
        eprintln!("   Empty rows: {}", report.empty_rows_dropped);
        eprintln!("   Total rows removed: {}", report.noise_rows_removed);
    }
    eprintln!("✅ {}", outcome.message);

    let json = serde_json::to_string_pretty(&outcome.table)?;
    write_output(&json, output)?;
    Ok(())
}

fn cmd_import(
    settings: Settings,
    input: &Path,
    company: &str,
    month: u8,
    year: u16,
    user: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let company = match &settings.companies_file {
        Some(path) => FileCompanyRegistry::from_file(path)?.resolve(company)?.name,
        None => company.to_string(),
    };
    let request = ImportRequest {
        company,
        period: Period::new(month, year)?,
        actor: Actor::new(user),
    };

    eprintln!("📄 Importing: {} for {} ({})", input.display(), request.company, request.period);

    let bytes = fs::read(input)?;
    let file_name = input
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("balancete")
        .to_string();

    let mut session = UploadSession::new();
    session.select_file(file_name, bytes)?;

    let outcome = session.process(&settings.loader)?;
    if !outcome.success {
        return Err(outcome.message.into());
    }
    eprintln!("✅ {}", outcome.message);

    let mut store = FileLedgerStore::with_dir(&settings.data_dir);
    let receipt = session.persist(&mut store, &request)?;
    if receipt.replaced {
        eprintln!("   ⚠️  Replaced previous import for {}", request.period);
    }
    eprintln!("💾 {}", receipt.message());
    println!("{}", serde_json::to_string_pretty(&receipt)?);
    Ok(())
}

fn cmd_imports(settings: &Settings, filter: ImportFilter) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileLedgerStore::with_dir(&settings.data_dir);
    let imports = store.list(&filter);

    if imports.is_empty() {
        eprintln!("📋 No imports found in {}", store.data_dir().display());
        return Ok(());
    }

    eprintln!("📋 Imports ({}):\n", imports.len());
    for i in imports {
        println!("  📈 {} - {}", i.company, i.period);
        println!("     Records: {}", i.row_count);
        println!("     Imported by {} at {}", i.imported_by, i.imported_at.format("%d/%m/%Y %H:%M"));
        println!();
    }
    Ok(())
}

fn cmd_companies(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let path = settings
        .companies_file
        .as_ref()
        .ok_or("BALANCETE_COMPANIES_FILE is not set")?;
    let registry = FileCompanyRegistry::from_file(path)?;
    let companies = registry.list_companies();

    if companies.is_empty() {
        eprintln!("🏢 No active companies registered.");
        return Ok(());
    }

    for c in companies {
        match &c.cnpj {
            Some(cnpj) => println!("  🏢 {} ({}) - CNPJ {}", c.name, c.id, cnpj),
            None => println!("  🏢 {} ({})", c.name, c.id),
        }
    }
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
