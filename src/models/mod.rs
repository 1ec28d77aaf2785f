pub mod request;
pub mod score_report;
