use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfConvError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("Input not found: {path}")]
    InputNotFound { path: String },

    #[error("Missing required dependencies: {}", missing.join(", "))]
    MissingDependency { missing: Vec<String> },

    #[error("Not a valid PDF file: {path} ({reason})")]
    InvalidPdf { path: String, reason: String },

    #[error("PDF is password protected: {path}")]
    PasswordProtected { path: String },

    #[error("PDF uses features the converter does not support: {path}")]
    UnsupportedPdf { path: String },

    #[error("No tables found using any extraction method")]
    NoTablesFound { path: String, tried: Vec<String> },

    #[error("{engine} failed: {message}")]
    Engine { engine: String, message: String },

    #[error("{engine} is not installed or not on PATH")]
    EngineNotFound { engine: String },

    #[error("Conversion produced an empty output file: {path}")]
    EmptyOutput { path: String },

    #[error("Output validation failed for {path}: {reason}")]
    OutputValidation { path: String, reason: String },

    #[error("Failed to write workbook: {message}")]
    Workbook { message: String },

    #[error("Permission denied: {path}")]
    Permission { path: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for PdfConvError {
    fn user_message(&self) -> String {
        match self {
            PdfConvError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            PdfConvError::InvalidPath { path } => {
                format!("Invalid path: {}", path)
            }
            PdfConvError::InputNotFound { path } => {
                format!("File or directory not found: {}", path)
            }
            PdfConvError::MissingDependency { missing } => {
                format!("Missing required dependencies: {}", missing.join(", "))
            }
            PdfConvError::InvalidPdf { path, reason } => {
                format!("'{}' is not a valid PDF: {}", path, reason)
            }
            PdfConvError::PasswordProtected { path } => {
                format!("'{}' is password protected", path)
            }
            PdfConvError::NoTablesFound { tried, .. } => {
                format!(
                    "No tables found using any extraction method (tried: {})",
                    tried.join(", ")
                )
            }
            PdfConvError::Engine { engine, message } => {
                format!("{} failed: {}", engine, message)
            }
            PdfConvError::EmptyOutput { path } => {
                format!("Conversion produced an empty file: {}", path)
            }
            PdfConvError::Permission { path } => {
                format!("Permission denied accessing: {}", path)
            }
            PdfConvError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            PdfConvError::MissingDependency { missing } => {
                let mut hints = Vec::new();
                for dep in missing {
                    let lower = dep.to_lowercase();
                    if lower.contains("java") {
                        hints.push("install Java 8+ (https://www.java.com/download/) and make sure `java` is on PATH");
                    } else if lower.contains("tabula") {
                        hints.push("download tabula-java and point engines.tabula_jar or TABULA_JAR at the jar");
                    } else if lower.contains("pdf2docx") {
                        hints.push("install the converter with `pip install pdf2docx`");
                    } else if lower.contains("pdftotext") {
                        hints.push("install poppler-utils for the fallback extractor");
                    }
                }
                if hints.is_empty() {
                    None
                } else {
                    Some(format!("To fix: {}.", hints.join("; ")))
                }
            }
            PdfConvError::InvalidPdf { .. } => Some(
                "The file may be corrupted or not actually a PDF. Try opening it in a PDF viewer.".to_string(),
            ),
            PdfConvError::PasswordProtected { .. } => Some(
                "Remove the password protection and run the conversion again.".to_string(),
            ),
            PdfConvError::UnsupportedPdf { .. } => Some(
                "Try re-saving the PDF with a different application before converting.".to_string(),
            ),
            PdfConvError::NoTablesFound { .. } => Some(
                "The PDF may contain scanned images instead of text, or it has no tabular data. Try the docx command for text content.".to_string(),
            ),
            PdfConvError::EngineNotFound { .. } => Some(
                "Install the missing tool or set its path in the [engines] section of the configuration file.".to_string(),
            ),
            PdfConvError::Permission { .. } => Some(
                "Close the output file if it is open in another application and check write permissions.".to_string(),
            ),
            PdfConvError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all values are valid.".to_string(),
            ),
            PdfConvError::InputNotFound { .. } => Some(
                "Check the path, or run without arguments to convert every PDF in the current directory.".to_string(),
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for PdfConvError {
    fn from(error: toml::de::Error) -> Self {
        PdfConvError::Config {
            message: error.to_string(),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for PdfConvError {
    fn from(error: rust_xlsxwriter::XlsxError) -> Self {
        PdfConvError::Workbook {
            message: error.to_string(),
        }
    }
}

impl From<walkdir::Error> for PdfConvError {
    fn from(error: walkdir::Error) -> Self {
        let path = error
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        match error.io_error().map(|e| e.kind()) {
            Some(std::io::ErrorKind::PermissionDenied) => PdfConvError::Permission { path },
            Some(std::io::ErrorKind::NotFound) => PdfConvError::InputNotFound { path },
            _ => PdfConvError::InvalidPath { path },
        }
    }
}

/// Maps an IO failure on `path` to the variant the user can act on.
pub fn io_error_for(path: &std::path::Path, error: std::io::Error) -> PdfConvError {
    match error.kind() {
        std::io::ErrorKind::PermissionDenied => PdfConvError::Permission {
            path: path.display().to_string(),
        },
        std::io::ErrorKind::NotFound => PdfConvError::InputNotFound {
            path: path.display().to_string(),
        },
        _ => PdfConvError::Io(error),
    }
}

pub type Result<T> = std::result::Result<T, PdfConvError>;
