pub mod calculations;
pub mod config;
pub mod controller;
pub mod export;
pub mod format;
pub mod input;
pub mod leads;
pub mod models;
pub mod store;

pub use calculations::{Calculator, CalculatorInput, Outcome};
pub use config::{ConfigError, SiteConfig};
pub use controller::CalculatorController;
pub use input::InputError;
pub use leads::{LeadCapture, LeadSubmitter, SubmissionError};
pub use models::*;
pub use store::{StateStore, StoreError};
