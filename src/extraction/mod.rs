pub mod categories;
pub mod expiry;
pub mod idcard_name;
pub mod name;

pub use categories::LicenseTypeDetector;
pub use expiry::ExpiryExtractor;
pub use idcard_name::{IdCardNameMatcher, IdCardNameVerification};
pub use name::{LicenseNameMatcher, NameVerification};
