use std::process::ExitCode;

use anyhow::Context;
use book_api_e2e::{
    cli_args::CliArgs,
    client::ApiClient,
    diagnostics::{AllureRecorder, LogRecorder, Recorder},
    runner::SuiteRunner,
    scenario::Scenario,
};
use clap::Parser;

fn init_tracing() -> anyhow::Result<()> {
    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt::Subscriber::builder()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .finish(),
    )
    .context("Failed to set global tracing subscriber")?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv::dotenv().ok();

    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "book_api_e2e=info");
    }

    init_tracing()?;

    let args = CliArgs::parse();

    if args.list {
        for scenario in Scenario::ALL {
            let info = scenario.info();

            println!("{:>2}. {:<28} {}", info.order, info.slug, info.description);
        }

        return Ok(ExitCode::SUCCESS);
    }

    let config = args
        .suite_config()
        .await
        .context("Failed to load configuration")?;

    tracing::info!(base_url = %config.base_url, mode = ?config.fixture_mode, "Starting ...");

    let recorder: Box<dyn Recorder> = match &config.results_dir {
        Some(results_dir) => Box::new(AllureRecorder::new(results_dir, &config.suite_name)),
        None => Box::new(LogRecorder::default()),
    };

    let client = ApiClient::new(&config.base_url);
    let mut runner = SuiteRunner::new(client, config.fixture_mode, recorder);

    let report = runner.run(&config.selected_scenarios()).await;

    println!("{report}");

    if let Some(results_dir) = &config.results_dir {
        tracing::info!(dir = %results_dir.display(), "Allure results written");
    }

    match report.is_success() {
        true => Ok(ExitCode::SUCCESS),
        false => Ok(ExitCode::FAILURE),
    }
}
