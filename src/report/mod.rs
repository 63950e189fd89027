//! Report rendering.

pub mod generator;

pub use generator::{
    format_money, format_rate, generate_json_report, generate_markdown_report, ReportInput,
};
