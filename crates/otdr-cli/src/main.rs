mod commands;
mod output;
mod progress;

use clap::{Parser, Subcommand};
use otdr_core::config::AppConfig;
use otdr_core::error::OtdrError;
use otdr_core::extraction::Backend;
use otdr_core::model::WavelengthSet;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "otdr",
    version,
    about = "Extract span length and span loss from OTDR PDF reports into an Excel template"
)]
struct Cli {
    /// Config file (default: $OTDR_CONFIG, then ./otdr.toml if present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// PDF text backend: pdftotext or pdf-extract
    #[arg(short, long, global = true, value_name = "NAME")]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract measurements from reports and fill the matching template
    Extract {
        /// PDF files or folders of PDF files, processed in the order given
        #[arg(required = true)]
        pdfs: Vec<PathBuf>,

        /// Wavelengths, e.g. "1310,1550" or "1310nm & 1550nm"
        #[arg(short, long)]
        wavelengths: WavelengthSet,

        /// Where to write the filled workbook (default: Updated_OTDR_Results.xlsx)
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Only print the extracted table, do not fill a template
        #[arg(long)]
        preview: bool,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Reject reports larger than this many MB
        #[arg(long, value_name = "MB")]
        max_file_size: Option<u64>,
    },
    /// Guided mode with prompts and a preview
    Interactive,
    /// Run the HTTP service
    Serve {
        /// Address to bind (overrides config and BIND_ADDR)
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Create and inspect Excel templates
    Templates {
        #[command(subcommand)]
        action: TemplatesAction,
    },
}

#[derive(Subcommand)]
enum TemplatesAction {
    /// Write the standard templates
    Init {
        /// Target directory (default: the configured template directory)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
    /// List configured templates and check that they are usable
    List,
}

fn main() {
    let cli = Cli::parse();
    let multi = progress::init_logger();

    if let Err(e) = run(cli, &multi) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli, multi: &indicatif::MultiProgress) -> Result<(), OtdrError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.extractor = backend;
    }

    match cli.command {
        Commands::Extract {
            pdfs,
            wavelengths,
            out,
            preview,
            output,
            max_file_size,
        } => commands::extract::run(
            &config,
            multi,
            commands::extract::ExtractOptions {
                pdfs,
                wavelengths,
                out,
                preview,
                output_format: output,
                max_file_size_mb: max_file_size,
            },
        ),
        Commands::Interactive => commands::interactive::run(&config, multi),
        Commands::Serve { bind, port } => commands::serve::run(config, bind, port),
        Commands::Templates { action } => match action {
            TemplatesAction::Init { dir, force } => commands::templates::init(&config, dir, force),
            TemplatesAction::List => commands::templates::list(&config),
        },
    }
}
