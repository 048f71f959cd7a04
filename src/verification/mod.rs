pub mod idcard;
pub mod license;

pub use idcard::{IdCardVerifier, MIN_STRUCTURAL_MATCHES};
pub use license::{LicenseVerifier, LICENSE_HEADER};
