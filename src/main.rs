//! PDF Form Filler - Entry point
//!
//! Fills PDF forms from JSON records, extracts field geometry, and serves
//! the same operations as MCP tools over stdio.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use pdf_form_filler::{
    config::FillConfig,
    form::{parse_pages, parse_records, FillReport},
    pdf::{extract_form_fields, fill_form, fill_template_pages},
    run_server_with_config,
    source::{resolve_json, resolve_path},
    ServerConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pdf-form-filler")]
#[command(about = "Fill PDF forms with text, images and checkmarks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct JsonInput {
    /// Inline JSON
    #[arg(long, conflicts_with = "json_file")]
    json: Option<String>,

    /// File containing the JSON
    #[arg(long)]
    json_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Draw field values onto a PDF form
    FillForm {
        #[command(flatten)]
        input: JsonInput,

        /// PDF form to fill
        #[arg(long)]
        pdf_file: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fill configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Password for an encrypted PDF
        #[arg(long)]
        password: Option<String>,
    },

    /// Print the form fields of a PDF as JSON
    ExtractFields {
        /// PDF to inspect
        #[arg(long)]
        pdf_file: PathBuf,

        /// Page range (e.g. "1-3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Password for an encrypted PDF
        #[arg(long)]
        password: Option<String>,
    },

    /// Stamp a one-page template once per page entry
    FillPages {
        #[command(flatten)]
        input: JsonInput,

        /// Template PDF
        #[arg(long)]
        template: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Password for an encrypted template
        #[arg(long)]
        password: Option<String>,
    },

    /// Run the MCP server on stdio
    Serve {
        /// Restrict file access to this directory (repeatable)
        #[arg(long = "resource-dir")]
        resource_dirs: Vec<String>,

        /// Fill configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<FillConfig> {
    match path {
        Some(path) => FillConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(FillConfig::default()),
    }
}

fn read_json(input: &JsonInput) -> anyhow::Result<String> {
    Ok(resolve_json(input.json.as_deref(), input.json_file.as_deref())?)
}

fn write_pdf(output: Option<&Path>, data: &[u8]) -> anyhow::Result<()> {
    match output {
        Some(path) => std::fs::write(path, data)
            .with_context(|| format!("writing {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(data)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn print_report(report: &FillReport) -> anyhow::Result<()> {
    eprintln!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_form_filler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::FillForm {
            input,
            pdf_file,
            output,
            config,
            password,
        } => {
            let fill_config = load_config(config.as_deref())?;
            let records = parse_records(&read_json(&input)?)?;
            let pdf = resolve_path(&pdf_file)?;

            let (data, report) = fill_form(&pdf.data, password.as_deref(), &records, &fill_config)?;
            print_report(&report)?;
            write_pdf(output.as_deref(), &data)?;
        }
        Command::ExtractFields {
            pdf_file,
            pages,
            password,
        } => {
            let pdf = resolve_path(&pdf_file)?;
            let fields = extract_form_fields(&pdf.data, password.as_deref(), pages.as_deref())?;
            if fields.is_empty() {
                anyhow::bail!("no form fields found in {}", pdf_file.display());
            }
            println!("{}", serde_json::to_string_pretty(&fields)?);
        }
        Command::FillPages {
            input,
            template,
            output,
            password,
        } => {
            let pages = parse_pages(&read_json(&input)?)?;
            let pdf = resolve_path(&template)?;

            let (data, report) = fill_template_pages(&pdf.data, password.as_deref(), &pages)?;
            print_report(&report)?;
            write_pdf(output.as_deref(), &data)?;
        }
        Command::Serve {
            resource_dirs,
            config,
        } => {
            let fill = load_config(config.as_deref())?;
            tracing::info!(resource_dirs = ?resource_dirs, "Starting PDF Form Filler MCP server");
            run_server_with_config(ServerConfig {
                resource_dirs,
                fill,
                ..ServerConfig::default()
            })
            .await?;
        }
    }

    Ok(())
}
