use crate::batch::{ConversionResult, ConversionStatus, RunSummary};
use crate::engines::DependencyReport;
use crate::error::{PdfConvError, UserFriendlyError};
use console::{style, Emoji, Term};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static FOLDER: Emoji = Emoji("📁 ", "> ");
static SKIP: Emoji = Emoji("⏭️  ", "- ");
static CHART: Emoji = Emoji("📊 ", "");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let term = Term::stdout();
        let use_colors = match mode {
            OutputMode::Human => term.features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn success(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Success, message),
                OutputMode::Json => self.print_json_message("success", message),
                OutputMode::Plain => println!("SUCCESS: {}", message),
            }
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

    pub fn debug(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("  {}", style(message).dim());
                    } else {
                        println!("  DEBUG: {}", message);
                    }
                }
                OutputMode::Json => self.print_json_message("debug", message),
                OutputMode::Plain => println!("DEBUG: {}", message),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &PdfConvError) {
        self.error(&error.user_message());

        if let Some(suggestion) = error.suggestion() {
            self.print_suggestion(&suggestion);
        }
    }

    fn print_suggestion(&self, suggestion: &str) {
        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    eprintln!("   {}{}", INFO, style(format!("Suggestion: {}", suggestion)).cyan());
                } else {
                    eprintln!("   Suggestion: {}", suggestion);
                }
            }
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "suggestion",
                    "message": suggestion
                }));
            }
            OutputMode::Plain => eprintln!("SUGGESTION: {}", suggestion),
        }
    }

    pub fn print_file_count(&self, count: usize) {
        let message = match count {
            0 => "No PDF files found".to_string(),
            1 => "Found 1 PDF file to convert".to_string(),
            n => format!("Found {} PDF files to convert", n),
        };

        if !self.should_show_message(0) {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}{}", FOLDER, style(message).bold());
                } else {
                    println!("> {}", message);
                }
            }
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "discovered",
                "count": count,
                "message": message
            })),
            OutputMode::Plain => println!("FOUND: {}", count),
        }
    }

    /// Per-file progress line, used when no progress bar is drawn. JSON
    /// consumers get the per-file results instead.
    pub fn print_file_progress(&self, current: usize, total: usize, file_name: &str) {
        if !self.should_show_message(0) || self.mode == OutputMode::Json {
            return;
        }

        let percentage = if total == 0 {
            100.0
        } else {
            current as f64 / total as f64 * 100.0
        };

        match self.mode {
            OutputMode::Human => println!(
                "Processing ({}/{} - {:.0}%): {}",
                current, total, percentage, file_name
            ),
            OutputMode::Plain => println!(
                "PROCESSING: {}/{} ({:.0}%) {}",
                current, total, percentage, file_name
            ),
            OutputMode::Json => {}
        }
    }

    pub fn print_result(&self, result: &ConversionResult) {
        match result.status {
            ConversionStatus::Success => {
                let mut message = format!("Converted: {}", result.file_name);
                if let (Some(tables), Some(strategy)) = (result.tables, result.strategy.as_ref()) {
                    message.push_str(&format!(" ({} table(s) via {})", tables, strategy));
                }
                self.success(&message);
            }
            ConversionStatus::Failed => {
                let reason = result.message.as_deref().unwrap_or("unknown error");
                self.error(&format!("Failed: {}: {}", result.file_name, reason));
                if self.verbose_level >= 1 {
                    if let Some(ref suggestion) = result.suggestion {
                        self.print_suggestion(suggestion);
                    }
                }
            }
            ConversionStatus::Skipped => {
                if !self.should_show_message(0) {
                    return;
                }
                let reason = result.message.as_deref().unwrap_or("skipped");
                match self.mode {
                    OutputMode::Human => {
                        let text = format!("Skipped: {} ({})", result.file_name, reason);
                        if self.use_colors {
                            println!("{}{}", SKIP, style(text).yellow());
                        } else {
                            println!("- {}", text);
                        }
                    }
                    OutputMode::Json => self.print_json_message("skipped", &result.file_name),
                    OutputMode::Plain => {
                        println!("SKIPPED: {} ({})", result.file_name, reason)
                    }
                }
            }
        }
    }

    pub fn print_dependency_report(&self, report: &DependencyReport) {
        for check in &report.checks {
            let line = format!("{}: {}", check.name, check.detail);
            if check.available {
                self.debug(&line);
            } else if check.required {
                self.error(&line);
            } else {
                self.warning(&format!("{} (optional, fallback disabled)", line));
            }
        }
    }

    pub fn print_run_summary(&self, summary: &RunSummary) {
        match self.mode {
            OutputMode::Json => println!("{}", summary.to_json()),
            _ if self.quiet => {}
            OutputMode::Human => self.print_human_summary(summary),
            OutputMode::Plain => self.print_plain_summary(summary),
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
                    println!("{}{}", CHART, style(title).bold().cyan());
                } else {
                    println!("=== {} ===", title);
                }
            }
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "header",
                    "title": title
                }));
            }
            OutputMode::Plain => {
                println!("=== {} ===", title);
            }
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(50)).dim());
                } else {
                    println!("{}", "=".repeat(50));
                }
            }
            OutputMode::Plain => {
                println!("{}", "-".repeat(50));
            }
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

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_human_summary(&self, summary: &RunSummary) {
        println!();
        self.print_separator();
        self.print_header("CONVERSION SUMMARY");
        self.print_separator();

        if summary.total == 0 {
            println!("No files were processed");
            self.print_separator();
            return;
        }

        let highlight = |value: String| {
            if self.use_colors {
                style(value).cyan().bold().to_string()
            } else {
                value
            }
        };

        println!("  Total files:  {}", highlight(summary.total.to_string()));
        println!("  Successful:   {}", highlight(summary.successful.to_string()));
        println!("  Failed:       {}", highlight(summary.failed.to_string()));
        println!("  Skipped:      {}", highlight(summary.skipped.to_string()));
        println!(
            "  Success rate: {}",
            highlight(format!("{:.1}%", summary.success_rate))
        );
        println!(
            "  Time taken:   {}",
            highlight(format_duration(Duration::from_millis(summary.duration_ms)))
        );

        if summary.cancelled {
            println!();
            println!("  Run was cancelled, remaining files were skipped.");
        }

        self.print_separator();
    }

    fn print_plain_summary(&self, summary: &RunSummary) {
        println!("COMPLETED: {} conversion", summary.target.label());
        println!("Total: {}", summary.total);
        println!("Successful: {}", summary.successful);
        println!("Failed: {}", summary.failed);
        println!("Skipped: {}", summary.skipped);
        println!("Success rate: {:.1}%", summary.success_rate);
        if summary.cancelled {
            println!("Cancelled: true");
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

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Prints through the formatter without tearing an active progress bar.
pub struct ProgressAwareOutput<'a> {
    formatter: &'a OutputFormatter,
    progress_manager: Option<&'a crate::ui::ProgressManager>,
}

impl<'a> ProgressAwareOutput<'a> {
    pub fn new(
        formatter: &'a OutputFormatter,
        progress_manager: Option<&'a crate::ui::ProgressManager>,
    ) -> Self {
        Self {
            formatter,
            progress_manager,
        }
    }

    pub fn suspend_and_print<F>(&self, f: F)
    where
        F: FnOnce(&OutputFormatter),
    {
        if let Some(pm) = self.progress_manager {
            pm.suspend(|| f(self.formatter));
        } else {
            f(self.formatter);
        }
    }

    pub fn result(&self, result: &ConversionResult) {
        self.suspend_and_print(|f| f.print_result(result));
    }
}
