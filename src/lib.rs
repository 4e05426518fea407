pub mod app;
pub mod appointment;
pub mod cli;
pub mod config;
pub mod error;
pub mod storage;
pub mod ui;
pub mod validation;

pub use appointment::{Appointment, AppointmentDraft, AppointmentField};
pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use error::{StoreError, ValidationError};
pub use storage::AppointmentGateway;
