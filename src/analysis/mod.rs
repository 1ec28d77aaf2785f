pub mod normalizer;
pub mod page_signals;
pub mod prompt;
pub mod scoring;
