use crate::error::CopyFailure;
use crate::models::CopyOutcome;
use serde::Serialize;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const PROCESSING_LOG_FILE: &str = "processing.log";

/// Progress notices emitted while organizing, in row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizeEvent {
    ProductStarted {
        product_id: u64,
        reference: String,
        directory: PathBuf,
    },
    ImageCopied {
        product_id: u64,
        image_id: u64,
        destination: PathBuf,
    },
    ImageFailed {
        product_id: u64,
        image_id: u64,
        message: String,
    },
}

impl OrganizeEvent {
    pub fn failed(failure: &CopyFailure) -> Self {
        OrganizeEvent::ImageFailed {
            product_id: failure.product_id(),
            image_id: failure.image_id(),
            message: failure.to_string(),
        }
    }
}

impl fmt::Display for OrganizeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrganizeEvent::ProductStarted {
                product_id,
                reference,
                ..
            } if reference.is_empty() => write!(f, "Processing product {}", product_id),
            OrganizeEvent::ProductStarted {
                product_id,
                reference,
                ..
            } => write!(f, "Processing product {} ({})", product_id, reference),
            OrganizeEvent::ImageCopied { image_id, .. } => {
                write!(f, "  ✓ image {} copied", image_id)
            }
            OrganizeEvent::ImageFailed { message, .. } => write!(f, "  ✗ {}", message),
        }
    }
}

/// Receives progress notices from the organizer.
pub trait ProgressSink {
    fn record(&mut self, event: &OrganizeEvent);
}

impl ProgressSink for Vec<OrganizeEvent> {
    fn record(&mut self, event: &OrganizeEvent) {
        self.push(event.clone());
    }
}

/// Prints progress to stdout and optionally mirrors it into an [`OperationLog`].
pub struct ConsoleProgress {
    log: Option<OperationLog>,
}

impl ConsoleProgress {
    pub fn new(log: Option<OperationLog>) -> Self {
        Self { log }
    }

    pub fn note(&mut self, message: &str) {
        println!("{}", message);
        if let Some(log) = self.log.as_mut() {
            log.append(message);
        }
    }
}

impl ProgressSink for ConsoleProgress {
    fn record(&mut self, event: &OrganizeEvent) {
        self.note(&event.to_string());
    }
}

/// Append-only, timestamped log of operations. The file is opened on first
/// write so that nothing is created before there is something to record.
///
/// Writes are blocking `std::fs` appends: [`ProgressSink::record`] is synchronous.
pub struct OperationLog {
    path: PathBuf,
    file: Option<File>,
    disabled: bool,
}

impl OperationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
            disabled: false,
        }
    }

    /// Appends one line. IO failures disable the log with a warning.
    pub fn append(&mut self, message: &str) {
        if self.disabled {
            return;
        }
        if let Err(e) = self.try_append(message) {
            tracing::warn!(
                "Operation log {} disabled after write failure: {}",
                self.path.display(),
                e
            );
            self.disabled = true;
            self.file = None;
        }
    }

    fn try_append(&mut self, message: &str) -> io::Result<()> {
        if self.file.is_none() {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.file = Some(file);
        }
        let line = format_log_line(&chrono::Local::now(), message);
        match self.file.as_mut() {
            Some(file) => file.write_all(line.as_bytes()),
            None => Ok(()),
        }
    }
}

fn format_log_line<Tz>(at: &chrono::DateTime<Tz>, message: &str) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: fmt::Display,
{
    format!("[{}] {}\n", at.format("%Y-%m-%d %H:%M:%S"), message.trim())
}

/// Totals and per-row outcomes of one run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub output_root: PathBuf,
    pub rows_processed: usize,
    pub products_seen: usize,
    pub images_copied: usize,
    pub outcomes: Vec<CopyOutcome>,
}

#[derive(Serialize)]
struct SummaryDocument<'a> {
    rows_processed: usize,
    products_seen: usize,
    images_copied: usize,
    error_count: usize,
    errors: Vec<String>,
    output_root: &'a Path,
}

impl RunSummary {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            ..Default::default()
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &CopyFailure> {
        self.outcomes.iter().filter_map(|o| match o {
            CopyOutcome::Failure(f) => Some(f),
            CopyOutcome::Success(_) => None,
        })
    }

    pub fn error_count(&self) -> usize {
        self.failures().count()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.failures().map(|f| f.to_string()).collect()
    }

    pub fn render_text(&self) -> String {
        let rule = "=".repeat(50);
        let mut out = String::new();
        out.push('\n');
        out.push_str(&format!("{}\nPROCESSING SUMMARY\n{}\n", rule, rule));
        out.push_str(&format!("Catalog rows    : {}\n", self.rows_processed));
        out.push_str(&format!("Products        : {}\n", self.products_seen));
        out.push_str(&format!("Images copied   : {}\n", self.images_copied));
        out.push_str(&format!("Errors          : {}\n", self.error_count()));

        let errors = self.error_messages();
        if !errors.is_empty() {
            out.push_str("\nError details:\n");
            for error in errors {
                out.push_str(&format!("- {}\n", error));
            }
        }

        out.push_str(&format!(
            "\nImages organized in: {}\n",
            self.output_root.display()
        ));
        out
    }

    pub fn render_json(&self) -> Result<String, serde_json::Error> {
        let errors = self.error_messages();
        serde_json::to_string_pretty(&SummaryDocument {
            rows_processed: self.rows_processed,
            products_seen: self.products_seen,
            images_copied: self.images_copied,
            error_count: errors.len(),
            errors,
            output_root: &self.output_root,
        })
    }
}
