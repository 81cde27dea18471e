//! MetricMemo — scheduled infrastructure reports from Prometheus and Loki.
//!
//! The binary resolves the time window, binds the template namespace, and
//! either emails the rendered report (`send-email`, typically cron-driven)
//! or serves it locally for template editing (`template-dev-server`).
//!
//! stdout carries command output only; all logs go to stderr.

use clap::{Args, Parser, Subcommand};
use mm_config::Settings;
use mm_query::TimeWindow;
use mm_report::{Renderer, ReportContext};
use std::path::PathBuf;
use thiserror::Error;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod dev_server;
mod mail;

/// Render and deliver infrastructure reports from Prometheus and Loki
#[derive(Parser)]
#[command(name = "metricmemo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Options shared by every command.
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Time window for all queries in the report (e.g. 24h, 7d)
    #[arg(short = 't', long = "time", global = true, default_value = "7d")]
    time: String,

    /// Path to the report template
    #[arg(long, global = true, default_value = "weekly.html.jinja")]
    template_path: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the report and deliver it via SMTP
    SendEmail {
        /// Subject format string; `{{ date }}` expands to the report date
        #[arg(long, default_value = "Weekly Infrastructure Report - {{ date }}")]
        subject_template: String,
    },

    /// Serve the rendered template over HTTP for iterative editing
    TemplateDevServer {
        /// Port for the preview server
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] mm_config::ConfigError),

    #[error(transparent)]
    Query(#[from] mm_query::QueryError),

    #[error(transparent)]
    Report(#[from] mm_report::ReportError),

    #[error(transparent)]
    Mail(#[from] mail::MailError),

    #[error("preview server failed: {0}")]
    DevServer(String),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // A .env next to the crontab entry is the usual deployment shape.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!(error = %err, "report run failed");
        report_error(&err);
        std::process::exit(1);
    }
}

/// Print the error with its full cause chain; adapter failures raised
/// inside template expressions live several sources deep.
fn report_error(err: &dyn std::error::Error) {
    eprintln!("Error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  Caused by: {cause}");
        source = cause.source();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = Settings::from_env()?;
    let window = TimeWindow::resolve_now(&cli.global.time)?;

    match cli.command {
        Commands::SendEmail { subject_template } => {
            // Delivery settings are validated before any query is issued.
            let smtp = settings.require_smtp()?.clone();

            let renderer = Renderer::new(ReportContext::new(&settings, window));
            let subject = renderer.render_subject(&subject_template)?;
            let html = renderer.render_file(&cli.global.template_path)?;

            mail::send(&smtp, &subject, html)?;
            println!("Report sent!");
            Ok(())
        }
        Commands::TemplateDevServer { port } => {
            let renderer = Renderer::new(ReportContext::new(&settings, window));
            dev_server::serve(&renderer, &cli.global.template_path, port)
                .map_err(CliError::DevServer)
        }
    }
}
