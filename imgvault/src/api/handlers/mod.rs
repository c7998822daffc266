//! HTTP request handlers.
//!
//! - [`static_files`]: Guard in front of the static file service
//! - [`uploads`]: Intake, verification and storage of signed image uploads

pub mod static_files;
pub mod uploads;
