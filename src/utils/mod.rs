pub mod error;

pub use error::VerificationError;
