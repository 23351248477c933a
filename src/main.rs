use anyhow::Context as _;
use bunkr::auth::SessionFile;
use bunkr::cli::Cli;
use bunkr::commands::{self, Context};
use bunkr::settings::Settings;
use bunkr::theme::ThemePreference;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut ctx = match build_context() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    match commands::run(cli.command, &mut ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !e.is_user_facing() {
                tracing::error!(error = %e, "command failed");
            }
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn build_context() -> anyhow::Result<Context<bunkr::storage::LocalStorage>> {
    let settings = Settings::load().context("failed to load configuration")?;
    let bunkr = bunkr::connect(&settings)
        .with_context(|| format!("failed to open the store at {}", settings.store.url))?;

    Ok(Context {
        bunkr,
        session_file: SessionFile::new(&settings.client.data_dir),
        theme: ThemePreference::new(&settings.client.data_dir),
        settings,
    })
}
