use crate::error::{JanitorError, UserFriendlyError};
use crate::report::CleanupReport;
use crate::sink::DeletionStatus;
use crate::ui::progress::format_duration;
use crate::verify::{VerificationOutcome, VerificationReport};
use console::{style, Emoji, Term};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static BROOM: Emoji = Emoji("🧹 ", "> ");
static SPARKLES: Emoji = Emoji("✨ ", "* ");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", BROOM, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &JanitorError) {
        self.error(&error.user_message());

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    println!();
                    if self.use_colors {
                        println!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        println!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => println!("SUGGESTION: {}", suggestion),
            }
        }
    }

    pub fn print_cleanup_report(&self, report: &CleanupReport) {
        match self.mode {
            OutputMode::Human => self.print_human_cleanup(report),
            OutputMode::Json => self.print_json_report("cleanup_report", report),
            OutputMode::Plain => self.print_plain_cleanup(report),
        }
    }

    pub fn print_verification_report(&self, report: &VerificationReport) {
        match self.mode {
            OutputMode::Human => self.print_human_verification(report),
            OutputMode::Json => self.print_json_report("verification_report", report),
            OutputMode::Plain => self.print_plain_verification(report),
        }
    }

    pub fn print_header(&self, title: &str) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                println!();
                if self.use_colors {
                    println!("{} {}", SPARKLES, style(title).bold().cyan());
                } else {
                    println!("=== {} ===", title);
                }
                println!();
            }
            OutputMode::Json => {}
            OutputMode::Plain => println!("=== {} ===", title),
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => println!("{}", "-".repeat(60)),
            OutputMode::Json => {}
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        #[allow(clippy::type_complexity)]
        let (emoji, color_fn): (Emoji, Box<dyn Fn(&str) -> console::StyledObject<&str>>) =
            match msg_type {
                MessageType::Success => (CHECKMARK, Box::new(|msg| style(msg).green().bold())),
                MessageType::Error => (CROSS, Box::new(|msg| style(msg).red().bold())),
                MessageType::Warning => (WARNING, Box::new(|msg| style(msg).yellow().bold())),
                MessageType::Info => (INFO, Box::new(|msg| style(msg).cyan())),
            };

        if self.use_colors {
            match msg_type {
                MessageType::Error => eprintln!("{}{}", emoji, color_fn(message)),
                _ => println!("{}{}", emoji, color_fn(message)),
            }
        } else {
            let prefix = match msg_type {
                MessageType::Success => "✓",
                MessageType::Error => "✗",
                MessageType::Warning => "!",
                MessageType::Info => "i",
            };

            match msg_type {
                MessageType::Error => eprintln!("{} {}", prefix, message),
                _ => println!("{} {}", prefix, message),
            }
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_report<T: Serialize>(&self, kind: &str, report: &T) {
        let body = serde_json::to_value(report).unwrap_or(serde_json::Value::Null);
        self.print_json_object(&serde_json::json!({
            "type": kind,
            "report": body,
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!("{}", serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string()));
    }

    fn highlight(&self, value: String) -> String {
        if self.use_colors {
            style(value).cyan().bold().to_string()
        } else {
            value
        }
    }

    fn print_human_cleanup(&self, report: &CleanupReport) {
        self.print_header(&format!("Cleanup Report ({})", report.kind.noun()));

        println!("Listing:  {}", report.listing);
        println!("Found:    {}", self.highlight(report.total.to_string()));
        println!("Kept:     {}", self.highlight(report.kept.len().to_string()));
        if report.skipped_lines > 0 {
            println!("Ignored:  {} listing lines", report.skipped_lines);
        }
        println!();

        if !report.needs_cleanup() {
            self.success(&report.headline());
            return;
        }

        self.info(&report.headline());

        match report.deletion {
            Some(ref deletion) => {
                for item in &deletion.items {
                    match item.status {
                        DeletionStatus::Deleted if report.dry_run => {
                            println!("  would delete {}", item.identifier)
                        }
                        DeletionStatus::Deleted => println!("  deleted      {}", item.identifier),
                        DeletionStatus::Failed(ref why) => {
                            println!("  FAILED       {} ({})", item.identifier, why)
                        }
                        DeletionStatus::Skipped(ref why) => {
                            println!("  skipped      {} ({})", item.identifier, why)
                        }
                    }
                }
                println!();
                println!("  Time taken: {}", format_duration(deletion.duration));
                self.print_separator();

                if deletion.failed() > 0 {
                    self.warning(&format!(
                        "{} of {} deletions failed",
                        deletion.failed(),
                        deletion.items.len()
                    ));
                } else if deletion.cancelled {
                    self.warning(&format!("Cancelled: {} deletions skipped", deletion.skipped()));
                } else if report.dry_run {
                    self.success("Dry run completed, nothing was deleted");
                } else {
                    self.success(&format!(
                        "Deleted {} {}",
                        deletion.deleted(),
                        report.kind.noun()
                    ));
                }
            }
            None => {
                for record in &report.to_delete {
                    println!("  pending      {}", record.identifier);
                }
            }
        }
    }

    fn print_plain_cleanup(&self, report: &CleanupReport) {
        println!("REPORT: {} cleanup", report.kind.noun());
        println!("{}", report.headline());
        println!("Found: {}", report.total);
        println!("Kept: {}", report.kept.len());

        if let Some(ref deletion) = report.deletion {
            for item in &deletion.items {
                let status = match item.status {
                    DeletionStatus::Deleted if report.dry_run => "WOULD_DELETE".to_string(),
                    DeletionStatus::Deleted => "DELETED".to_string(),
                    DeletionStatus::Failed(ref why) => format!("FAILED ({})", why),
                    DeletionStatus::Skipped(ref why) => format!("SKIPPED ({})", why),
                };
                println!("{} {}", status, item.identifier);
            }
            println!("Deleted: {}", if report.dry_run { 0 } else { deletion.deleted() });
            println!("Failed: {}", deletion.failed());
            println!("Duration: {:?}", deletion.duration);
        }
    }

    fn print_human_verification(&self, report: &VerificationReport) {
        self.print_header("Site Verification");

        println!("Page:     {}", report.page_url);
        println!("Chunks:   {}", self.highlight(report.chunks.len().to_string()));
        println!("Fetched:  {}", self.highlight(report.fetched.len().to_string()));
        println!("Targets:  {}", report.targets.join(", "));
        println!();

        match report.outcome {
            VerificationOutcome::Found {
                ref chunk,
                ref target,
                ..
            } => self.success(&format!("Found \"{}\" in {}", target, chunk)),
            VerificationOutcome::NotFound => self.error(&format!(
                "None of the targets appear in any of the {} script chunks on {}",
                report.chunks.len(),
                report.page_url
            )),
        }
    }

    fn print_plain_verification(&self, report: &VerificationReport) {
        println!("REPORT: site verification");
        println!("Page: {}", report.page_url);
        println!("Chunks: {}", report.chunks.len());
        println!("Fetched: {}", report.fetched.len());
        match report.outcome {
            VerificationOutcome::Found {
                ref chunk,
                ref target,
                ..
            } => println!("FOUND: {} in {}", target, chunk),
            VerificationOutcome::NotFound => println!("NOT_FOUND"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatter_creation() {
        let formatter = OutputFormatter::new(OutputMode::Plain, 1, false);
        assert_eq!(formatter.mode, OutputMode::Plain);
        assert_eq!(formatter.verbose_level, 1);
        assert!(!formatter.use_colors);
    }

    #[test]
    fn test_quiet_mode() {
        let formatter = OutputFormatter::new(OutputMode::Human, 2, true);
        assert_eq!(formatter.verbose_level, 0);
        assert!(!formatter.should_show_message(0));
    }

    #[test]
    fn test_should_show_message() {
        let formatter = OutputFormatter::new(OutputMode::Human, 1, false);
        assert!(formatter.should_show_message(0));
        assert!(formatter.should_show_message(1));
        assert!(!formatter.should_show_message(2));
    }
}
