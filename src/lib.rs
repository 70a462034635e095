pub mod cli;
pub mod config;
pub mod error;
pub mod listing;
pub mod report;
pub mod retention;
pub mod sink;
pub mod ui;
pub mod verify;

// Public API re-exports
pub use cli::{Cli, Command, OutputFormat};
pub use config::{
    CliOverrides, Config, ListingConfig, RetentionConfig, SinkConfig, VerifyConfig,
};
pub use error::{JanitorError, Result, UserFriendlyError};

// Core functionality re-exports
pub use listing::{
    parse_structured_listing, parse_tabular_listing, read_listing, TabularRules, TextEncoding,
};
pub use report::{ArtifactKind, CleanupReport};
pub use retention::{
    plan_retention, select_for_deletion, ArtifactRecord, RetentionPlan, RetentionPolicy,
};
pub use sink::{
    execute_batch, BatchOptions, CommandSink, DeletionReport, DeletionSink, DeletionStatus,
    DryRunSink,
};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};
pub use verify::{
    HttpFetcher, PageFetcher, SiteVerifier, VerificationOutcome, VerificationReport,
};

use std::path::Path;
use tokio::task;
use tracing::info;

/// Main library interface: cleanup runs and site verification.
pub struct Janitor {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
    dry_run: bool,
}

impl Janitor {
    /// Create a new Janitor with the provided configuration
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);
        let shutdown = GracefulShutdown::new()?;

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
            dry_run: false,
        })
    }

    /// Create a Janitor for testing (no signal handler registration, no progress bars)
    pub fn new_for_test(config: Config, output_mode: OutputMode) -> Self {
        Self {
            config,
            output_formatter: OutputFormatter::new(output_mode, 0, true),
            progress_manager: ProgressManager::new(false),
            shutdown: GracefulShutdown::new_for_test(),
            dry_run: false,
        }
    }

    /// Create a Janitor from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Ok(Self::new(config, output_mode, cli_args.verbose, cli_args.quiet)?
            .with_dry_run(cli_args.dry_run))
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn policy(&self) -> RetentionPolicy {
        RetentionPolicy::new(self.config.retention.keep)
    }

    /// Read a JSON image listing and decide which images go.
    pub fn plan_image_cleanup(&self, listing_path: &Path) -> Result<CleanupReport> {
        let source_name = listing_path.display().to_string();
        let text = read_listing(listing_path, self.config.listing.encoding)?;
        let records = parse_structured_listing(&text, &source_name)?;

        let plan = plan_retention(records, self.policy())?;
        info!(
            listing = %source_name,
            total = plan.total(),
            to_delete = plan.to_delete.len(),
            "planned image cleanup"
        );

        Ok(CleanupReport::new(
            ArtifactKind::Images,
            &source_name,
            self.config.retention.keep,
            plan,
        ))
    }

    /// Read a `gcloud storage ls -l` listing and decide which archives go.
    pub fn plan_archive_cleanup(&self, listing_path: &Path) -> Result<CleanupReport> {
        let source_name = listing_path.display().to_string();
        let text = read_listing(listing_path, self.config.listing.encoding)?;
        let parsed = parse_tabular_listing(&text, &TabularRules::new(&self.config.listing));

        let plan = plan_retention(parsed.records, self.policy())?;
        info!(
            listing = %source_name,
            total = plan.total(),
            to_delete = plan.to_delete.len(),
            "planned archive cleanup"
        );

        let mut report = CleanupReport::new(
            ArtifactKind::Archives,
            &source_name,
            self.config.retention.keep,
            plan,
        );
        report.skipped_lines = parsed.skipped_lines;
        Ok(report)
    }

    pub async fn clean_images(&self, listing_path: &Path) -> Result<CleanupReport> {
        self.shutdown.check_shutdown()?;
        self.output_formatter.start_operation("Reading image listing");

        let mut report = self.plan_image_cleanup(listing_path)?;
        let args = self.config.sink.image_args.clone();
        self.run_deletions(&mut report, args).await?;
        Ok(report)
    }

    pub async fn clean_archives(&self, listing_path: &Path) -> Result<CleanupReport> {
        self.shutdown.check_shutdown()?;
        self.output_formatter.start_operation("Reading archive listing");

        let mut report = self.plan_archive_cleanup(listing_path)?;
        let args = self.config.sink.archive_args.clone();
        self.run_deletions(&mut report, args).await?;
        Ok(report)
    }

    /// Drive the deletion sink over the report's batch on the blocking pool.
    async fn run_deletions(&self, report: &mut CleanupReport, args: Vec<String>) -> Result<()> {
        report.dry_run = self.dry_run;
        if !report.needs_cleanup() {
            return Ok(());
        }
        self.shutdown.check_shutdown()?;

        self.output_formatter.start_operation(&format!(
            "Deleting {} {}{}",
            report.to_delete.len(),
            report.kind.noun(),
            if self.dry_run { " (dry run)" } else { "" }
        ));

        let sink: Box<dyn DeletionSink + Send> = if self.dry_run {
            Box::new(DryRunSink)
        } else {
            Box::new(CommandSink::new(self.config.sink.program.clone(), args))
        };
        let options = BatchOptions::new()
            .with_fail_fast(self.config.sink.fail_fast)
            .with_running_flag(self.shutdown.running_flag());

        let pb = self
            .progress_manager
            .create_deletion_progress(report.to_delete.len() as u64);
        let batch = report.to_delete.clone();
        let pb_task = pb.clone();

        let deletion = task::spawn_blocking(move || {
            execute_batch(&sink, &batch, &options, |item| {
                ui::progress::update_deletion_progress(&pb_task, item)
            })
        })
        .await
        .map_err(|e| JanitorError::Config {
            message: format!("Deletion task failed: {}", e),
        })?;

        ui::progress::finish_progress_with_summary(
            &pb,
            &format!("Processed {} {}", deletion.items.len(), report.kind.noun()),
            deletion.duration,
        );

        report.deletion = Some(deletion);
        Ok(())
    }

    /// Verify the configured site over HTTP.
    pub async fn verify_site(&self) -> Result<VerificationReport> {
        let fetcher = HttpFetcher::new(
            &self.config.verify.user_agent,
            self.config.verify_timeout_duration(),
        )?;
        self.verify_site_with(fetcher).await
    }

    /// Verify the configured site through the given fetcher.
    pub async fn verify_site_with<F: PageFetcher>(&self, fetcher: F) -> Result<VerificationReport> {
        self.shutdown.check_shutdown()?;
        self.output_formatter
            .start_operation(&format!("Inspecting {}", self.config.verify.base_url));

        let verifier = SiteVerifier::from_config(&self.config.verify, fetcher)?;
        let spinner = self.progress_manager.create_spinner("Fetching page");

        let result = verifier
            .verify(|chunk| {
                self.shutdown.check_shutdown()?;
                spinner.set_message(format!("Fetching {}", chunk));
                Ok(())
            })
            .await;
        spinner.finish_and_clear();

        let report = result?;
        info!(found = report.is_found(), fetched = report.fetched.len(), "verification finished");
        Ok(report)
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config).map_err(JanitorError::Io)?;
        Ok(())
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &JanitorError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}
