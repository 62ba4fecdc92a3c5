//! Upload policy checks: size, extension allow-list, and filename safety.

use crate::config::FileUploadOptions;
use crate::models::FileMetadata;

/// A single violated upload rule. The `Display` text is what callers see.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("File is required and cannot be empty.")]
    Missing,

    #[error("File is required and cannot be empty. Maximum allowed size is {max_mb} MB.")]
    EmptyFile { max_mb: u64 },

    #[error("File size exceeds maximum allowed size of {max_mb} MB.")]
    FileTooLarge { size: u64, max_mb: u64 },

    #[error("File type '{extension}' is not allowed. Allowed types: {}", .allowed.join(", "))]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid file name.")]
    InvalidFilename,
}

impl ValidationError {
    /// Stable classification, used as a metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::Missing => "missing",
            ValidationError::EmptyFile { .. } => "empty",
            ValidationError::FileTooLarge { .. } => "too_large",
            ValidationError::InvalidExtension { .. } => "invalid_extension",
            ValidationError::InvalidFilename => "invalid_filename",
        }
    }
}

/// Outcome of validating one file. Valid iff no rule was violated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Human-readable messages, in rule order.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Capability to check a candidate file against an upload policy.
pub trait Validate: Send + Sync {
    fn validate(&self, file: Option<&FileMetadata>) -> ValidationResult;
}

/// Validator backed by the configured `FileUploadOptions`.
#[derive(Debug, Clone)]
pub struct FileValidator {
    max_file_size_bytes: u64,
    allowed_extensions: Vec<String>,
}

impl FileValidator {
    pub fn new(max_file_size_bytes: u64, allowed_extensions: Vec<String>) -> Self {
        Self {
            max_file_size_bytes,
            allowed_extensions,
        }
    }

    pub fn from_options(options: &FileUploadOptions) -> Self {
        Self::new(
            options.max_file_size_bytes,
            options.allowed_extensions.clone(),
        )
    }
}

impl Validate for FileValidator {
    fn validate(&self, file: Option<&FileMetadata>) -> ValidationResult {
        let Some(file) = file else {
            return ValidationResult::from_errors(vec![ValidationError::Missing]);
        };

        let mut errors = Vec::new();

        let max_mb = self.max_file_size_bytes / 1024 / 1024;

        if file.length == 0 {
            errors.push(ValidationError::EmptyFile { max_mb });
        }

        if file.length > self.max_file_size_bytes {
            errors.push(ValidationError::FileTooLarge {
                size: file.length,
                max_mb,
            });
        }

        let extension = file_extension(&file.file_name).to_lowercase();
        if !self.allowed_extensions.contains(&extension) {
            errors.push(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        if file.file_name.trim().is_empty() || has_invalid_file_name_chars(&file.file_name) {
            errors.push(ValidationError::InvalidFilename);
        }

        let result = ValidationResult::from_errors(errors);
        tracing::debug!(
            file_name = %file.file_name,
            is_valid = result.is_valid(),
            "File validation result"
        );
        result
    }
}

/// Extension of the final path segment, including the leading dot.
/// Returns an empty string when there is none (`"README"`, `"name."`).
pub fn file_extension(file_name: &str) -> &str {
    let name = file_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name);
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() => &name[idx..],
        _ => "",
    }
}

/// Characters rejected in filenames on any host: control characters and the
/// reserved set `< > : " / \ | ? *`.
pub fn has_invalid_file_name_chars(file_name: &str) -> bool {
    file_name.chars().any(|c| {
        c.is_control() || matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*')
    })
}
