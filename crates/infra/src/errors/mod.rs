pub mod conversions;

pub use conversions::{status_error, to_dsr, InfraError};
