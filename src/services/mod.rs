//! Service layer: certificate location, key resolution, signing orchestration.

pub mod certificate;
pub mod key_resolver;
pub mod signer;

pub use certificate::{CertIdentity, CertificateLocator, LocatedCertificate};
pub use key_resolver::KeyResolver;
pub use signer::MultibankSigner;
