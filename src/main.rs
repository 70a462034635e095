use artifact_janitor::{
    CleanupReport, Cli, Command, Janitor, JanitorError, OutputFormatter, OutputMode,
    UserFriendlyError, VerificationReport,
};
use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = Cli::parse();
    setup_logging(cli.verbosity_level());

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let command = match cli.command {
        Some(ref command) => command.clone(),
        None => {
            eprintln!("No command given. Run `janitor --help` for usage.");
            return 1;
        }
    };

    let janitor = match Janitor::from_cli(&cli) {
        Ok(janitor) => janitor,
        Err(e) => {
            print_startup_error(&e);
            return 1;
        }
    };

    let outcome = match command {
        Command::Images { ref listing } => janitor
            .clean_images(listing)
            .await
            .map(|report| cleanup_exit_code(&janitor, &report)),
        Command::Archives { ref listing } => janitor
            .clean_archives(listing)
            .await
            .map(|report| cleanup_exit_code(&janitor, &report)),
        Command::Verify { .. } => janitor
            .verify_site()
            .await
            .map(|report| verification_exit_code(&janitor, &report)),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            janitor.handle_error(&e);
            error_exit_code(&e)
        }
    }
}

fn cleanup_exit_code(janitor: &Janitor, report: &CleanupReport) -> i32 {
    janitor.output_formatter().print_cleanup_report(report);

    match report.deletion {
        Some(ref deletion) if deletion.cancelled => 130,
        _ if report.has_failures() => 2, // Partial cleanup
        _ => 0,
    }
}

fn verification_exit_code(janitor: &Janitor, report: &VerificationReport) -> i32 {
    janitor.output_formatter().print_verification_report(report);

    if report.is_found() {
        0
    } else {
        6
    }
}

fn error_exit_code(error: &JanitorError) -> i32 {
    match error {
        JanitorError::Cancelled => 130, // Interrupted (SIGINT)
        JanitorError::Parse { .. } => 3,
        JanitorError::MalformedRecord { .. } => 4,
        JanitorError::ExternalCall { .. } | JanitorError::Network { .. } => 5,
        _ => 1, // General error
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "janitor.toml".to_string());

    match Janitor::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  janitor --config {} images images.json", config_path);
            println!("\nEdit the file to point [sink] and [verify] at your project.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn print_startup_error(error: &JanitorError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

fn setup_logging(verbosity: u8) {
    let default_directive = match verbosity {
        0 => "artifact_janitor=warn",
        1 => "artifact_janitor=info",
        _ => "artifact_janitor=debug",
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Logs go to stderr so reports on stdout stay machine-readable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
