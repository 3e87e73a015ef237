pub mod app;
pub mod charts;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod highlight;
pub mod metrics;
pub mod model;
pub mod search;
pub mod storage;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use model::{ApplicationDraft, JobApplication, Status};
