use clap::{Parser, Subcommand};
use nomina_client::cli;
use nomina_client::error::NominaResult;
use nomina_client::table::SortColumn;
use nomina_client::types::Sexo;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nomina")]
#[command(about = "Validate, preview and import Excel payroll workbooks into the Nomina API.")]
#[command(long_about = "Nomina - payroll workbook client

Uploads an Excel workbook (.xlsx/.xls, max 10MB) to the Nomina API, shows
which sheets are valid, previews the selected sheets and imports them. The
imported employees can then be searched, sorted, paged and exported to CSV.

COMMANDS:
  inspect     - List the sheets of a local workbook (no network)
  validate    - Ask the API which sheets are valid
  preview     - Preview rows of the selected sheets
  import      - Validate, preview and import, then show employees and stats
  employees   - Browse the employee table
  stats       - Per-gender and per-position statistics
  delete      - Delete an employee
  health      - Check the API is reachable

EXAMPLES:
  nomina inspect nomina.xlsx
  nomina import nomina.xlsx --sheets Enero,Febrero
  nomina employees --search gerente --sort sueldo --desc
  nomina employees --export empleados.csv
  nomina stats --top 5

CONFIGURATION:
  --api-url / NOMINA_API_URL    (default http://localhost:8000/api/v1)
  --config / NOMINA_CONFIG      YAML file with client settings")]
#[command(version)]
struct Cli {
    /// Base URL of the Nomina API
    #[arg(long, global = true, env = "NOMINA_API_URL")]
    api_url: Option<String>,

    /// YAML configuration file
    #[arg(short, long, global = true, env = "NOMINA_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sheets of a local workbook without contacting the API
    Inspect {
        /// Path to the workbook
        file: PathBuf,
    },

    /// Validate a workbook and list valid and invalid sheets
    Validate {
        /// Path to the workbook
        file: PathBuf,
    },

    /// Preview rows of the selected sheets (default: all valid sheets)
    Preview {
        /// Path to the workbook
        file: PathBuf,

        /// Comma-separated sheet names
        #[arg(short, long, value_delimiter = ',')]
        sheets: Vec<String>,

        /// Rows shown per sheet
        #[arg(short, long, default_value = "5")]
        rows: usize,
    },

    #[command(long_about = "Run the whole workflow for one workbook.

Validates the workbook, selects every valid sheet (or only --sheets),
previews them, imports them, waits for the import to settle and then shows
the first employee page and the statistics.")]
    /// Validate, preview and import a workbook
    Import {
        /// Path to the workbook
        file: PathBuf,

        /// Comma-separated sheet names
        #[arg(short, long, value_delimiter = ',')]
        sheets: Vec<String>,
    },

    /// Browse the employee table
    Employees {
        /// Case-insensitive search over nombre, cargo and sexo
        #[arg(short, long)]
        search: Option<String>,

        /// Exact sexo filter (Masculino, Femenino, Otro)
        #[arg(long)]
        sexo: Option<Sexo>,

        /// Exact cargo filter
        #[arg(long)]
        cargo: Option<String>,

        /// Sort column (id, nombre, edad, sexo, cargo, sueldo, created_at, updated_at)
        #[arg(long, default_value = "id")]
        sort: SortColumn,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Write the filtered view to a CSV file
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Show per-gender and per-position statistics
    Stats {
        /// Positions shown
        #[arg(short, long, default_value = "10")]
        top: usize,
    },

    /// Delete an employee on the API
    Delete {
        /// Employee id
        id: i64,
    },

    /// Check the API health endpoint
    Health,
}

#[tokio::main]
async fn main() -> NominaResult<()> {
    let cli = Cli::parse();
    cli::init_tracing(cli.verbose);

    if let Commands::Inspect { file } = &cli.command {
        return cli::inspect(file);
    }

    let config = cli::load_config(cli.config.as_deref(), cli.api_url)?;
    let api = nomina_client::HttpApi::new(config.clone())?;

    match cli.command {
        Commands::Inspect { .. } => Ok(()),

        Commands::Validate { file } => cli::validate(&api, &config, file).await,

        Commands::Preview { file, sheets, rows } => {
            cli::preview(&api, &config, file, sheets, rows).await
        }

        Commands::Import { file, sheets } => cli::import(&api, &config, file, sheets).await,

        Commands::Employees {
            search,
            sexo,
            cargo,
            sort,
            desc,
            page,
            export,
        } => {
            let query = cli::EmployeeQuery {
                search,
                sexo,
                cargo,
                sort,
                desc,
                page,
                export,
            };
            cli::employees(&api, &config, query).await
        }

        Commands::Stats { top } => cli::stats(&api, top).await,

        Commands::Delete { id } => cli::delete(&api, &config, id).await,

        Commands::Health => cli::health(&api).await,
    }
}
