pub mod analyze;
pub mod completion;
pub mod fetcher;
pub mod render;
pub mod settings;
