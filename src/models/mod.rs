pub mod data;

pub use data::{
    ExpiryCheck, IdCardVerificationResult, ImageFile, LicenseTypes, LicenseVerificationResult,
    NameMatchDetails, Orientation, OrientationCandidate, OrientationResult,
};
