//! Report building and rendering.
//!
//! `builder` gathers tracker data into report models, `generator` turns
//! those models into HTML or JSON, and `request` resolves the parameters
//! of one incoming request.

pub mod builder;
pub mod generator;
pub mod request;

pub use builder::{build_accepted_report, build_features_report, build_status_report};
pub use generator::{
    generate_features_page, generate_index_page, generate_json_report, generate_status_page,
};
pub use request::{OutputFormat, ReportParams, ReportRequest};
