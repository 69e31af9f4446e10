// src/lib.rs

pub mod admin;
pub mod attendance;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod expense;
pub mod leave;
pub mod models;
pub mod navigation;
pub mod notify;
pub mod reports;
pub mod session;
pub mod validation;

pub use client::HrClient;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use error::{ErrorKind, HrError};
pub use session::{Session, SessionStore};

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod attendance_tests;
#[cfg(test)]
mod client_tests;
