use clap::Parser;
use gcs_poc::utils::{logger, validation::Validate};
use gcs_poc::{
    assemble, resolve, CliArgs, EnvSnapshot, GcsPocError, GcsRepository, ProbeReport, ProbeRunner,
};

fn exit_with(e: &GcsPocError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, exit code {})",
        e,
        e.category(),
        e.exit_code()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

fn print_report(report: &ProbeReport) {
    for (row, line) in report.peeked_lines.iter().enumerate() {
        println!("line : {}", line);
        println!("row : {}", row);
    }

    if let Some(signed) = &report.signed_url {
        println!("Generated GET signed URL:");
        println!("{:?}", signed.url.as_str());
        println!("You can use this URL with any user agent, for example:");
        println!("curl {:?}", signed.url.as_str());
    }
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    logger::init_cli_logger(args.verbose);

    tracing::info!("Starting gcs-poc");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    if let Err(e) = args.validate() {
        exit_with(&e);
    }

    // 環境變數只在啟動時讀取一次
    let env = EnvSnapshot::capture();
    let app_config = resolve(&env).unwrap_or_else(|e| exit_with(&e));
    tracing::info!("Configuration loaded for env `{}`", app_config.app.env);

    let credential = assemble(&app_config).unwrap_or_else(|e| exit_with(&e));
    drop(app_config);

    let repository = GcsRepository::from_credential(credential);
    let runner = ProbeRunner::with_policy(repository, args.policy());

    let report = runner.run(&args.plan()).await;
    print_report(&report);

    if report.is_success() {
        tracing::info!("✅ All {} steps completed", report.completed.len());
        return;
    }

    for (step, e) in &report.failures {
        tracing::error!("💡 {}: {}", step, e.recovery_suggestion());
        eprintln!("[ERROR] {} ({})", e.user_friendly_message(), e);
    }
    std::process::exit(report.exit_code());
}
