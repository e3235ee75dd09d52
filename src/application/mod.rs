pub mod engine;
pub mod recorder;
pub mod reports;
pub mod spotify;
