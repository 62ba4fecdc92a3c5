//! Validation modules

pub mod file;

pub use file::{
    file_extension, has_invalid_file_name_chars, FileValidator, Validate, ValidationError,
    ValidationResult,
};
