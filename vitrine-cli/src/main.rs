use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vitrine_core::{
    run, Config, ConsoleProgress, OperationLog, ReportFormat, PROCESSING_LOG_FILE,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries the report, diagnostics go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vitrine_cli=info,vitrine_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    tracing::debug!(?config, "Loaded configuration");

    let log = config
        .processing_log
        .then(|| OperationLog::new(config.output_root.join(PROCESSING_LOG_FILE)));
    let mut progress = ConsoleProgress::new(log);

    // Not mirrored into the operation log, which must not exist before the
    // catalog answers.
    println!("Starting image organization...");
    let summary = run(&config, &mut progress).await?;

    match config.report_format {
        ReportFormat::Text => print!("{}", summary.render_text()),
        ReportFormat::Json => println!("{}", summary.render_json()?),
    }

    Ok(())
}
