pub mod document_upload;
pub mod health;
