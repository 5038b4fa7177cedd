//! Certificate locator service.
//!
//! Finds the signing certificate for a thumbprint by scanning a directory
//! tree of `.cer` files (the `DSKEYS` layout the agent uses). Matching is by
//! SHA-1 fingerprint of the DER bytes; parsing for subject and serial happens
//! only on the matched file.

use crate::domain::encoding;
use crate::domain::types::Thumbprint;
use crate::infra::error::{SigningError, SigningResult};
use der::Decode;
use sha1::{Digest, Sha1};
use std::fs;
use std::path::{Path, PathBuf};
use x509_cert::Certificate;

/// File extension of certificate files in the key store tree.
const CERT_EXTENSION: &str = "cer";

/// Directory under the user profile where the agent keeps certificates.
const STORE_DIR_NAME: &str = "DSKEYS";

/// A certificate file matched by fingerprint.
#[derive(Debug, Clone)]
pub struct LocatedCertificate {
    path: PathBuf,
    der: Vec<u8>,
    fingerprint: String,
}

impl LocatedCertificate {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Uppercase SHA-1 fingerprint of the DER bytes.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Parse the DER into an X.509 certificate.
    pub fn parse(&self) -> SigningResult<Certificate> {
        Ok(Certificate::from_der(&self.der)?)
    }

    /// Subject common name, lowercased for alias matching.
    pub fn subject_common_name(&self) -> SigningResult<String> {
        let certificate = self.parse()?;
        let subject = certificate.tbs_certificate.subject.to_string();
        subject
            .split(',')
            .map(|part| part.trim())
            .find_map(|part| {
                let lower = part.to_lowercase();
                lower.strip_prefix("cn=").map(str::to_string)
            })
            .ok_or_else(|| {
                SigningError::CertificateError(format!(
                    "Certificate {} has no common name in subject '{subject}'",
                    self.path.display()
                ))
            })
    }

    /// Serial number as uppercase hex, the form the agent expects.
    pub fn serial_number_hex(&self) -> SigningResult<String> {
        let certificate = self.parse()?;
        Ok(encoding::to_hex_upper(
            certificate.tbs_certificate.serial_number.as_bytes(),
        ))
    }
}

/// The facts about a certificate the signing chain needs downstream:
/// cache keying, agent alias matching, and the timestamp attach call.
#[derive(Debug, Clone)]
pub struct CertIdentity {
    /// Normalized fingerprint of the certificate.
    pub thumbprint: Thumbprint,
    /// Subject common name, lowercased.
    pub common_name: String,
    /// Serial number as uppercase hex.
    pub serial_hex: String,
}

impl LocatedCertificate {
    /// Extract the identity facts, parsing the certificate once.
    pub fn identity(&self) -> SigningResult<CertIdentity> {
        Ok(CertIdentity {
            thumbprint: Thumbprint::new(&self.fingerprint)?,
            common_name: self.subject_common_name()?,
            serial_hex: self.serial_number_hex()?,
        })
    }
}

/// Directory-tree certificate locator.
#[derive(Debug, Clone)]
pub struct CertificateLocator {
    root: PathBuf,
}

impl CertificateLocator {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Locator over the platform default store (`~/DSKEYS`).
    pub fn default_store() -> SigningResult<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            SigningError::ConfigurationError("Cannot determine the home directory".to_string())
        })?;
        Ok(Self::new(home.join(STORE_DIR_NAME)))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the certificate whose fingerprint matches the thumbprint.
    ///
    /// # Errors
    ///
    /// Returns `CertificateNotFound` when no file in the tree matches.
    pub fn locate(&self, thumbprint: &Thumbprint) -> SigningResult<LocatedCertificate> {
        let mut scanned = 0usize;
        for path in collect_certificate_files(&self.root) {
            scanned += 1;
            let der = match read_certificate_der(&path) {
                Ok(der) => der,
                Err(e) => {
                    log::warn!("skipping unreadable certificate {}: {e}", path.display());
                    continue;
                }
            };
            let fingerprint = sha1_fingerprint(&der);
            if thumbprint.matches(&fingerprint) {
                log::info!("matched certificate {} for {thumbprint}", path.display());
                return Ok(LocatedCertificate {
                    path,
                    der,
                    fingerprint,
                });
            }
        }
        Err(SigningError::CertificateNotFound(format!(
            "No certificate with thumbprint {thumbprint} under {} ({scanned} files scanned)",
            self.root.display()
        )))
    }
}

/// Uppercase SHA-1 fingerprint of DER bytes.
#[must_use]
pub fn sha1_fingerprint(der: &[u8]) -> String {
    let digest = Sha1::digest(der);
    encoding::to_hex_upper(&digest)
}

/// Collect `.cer` files under `root`, depth-first with an explicit stack.
/// Unreadable directories are skipped, not fatal.
fn collect_certificate_files(root: &Path) -> Vec<PathBuf> {
    let mut pending = vec![root.to_path_buf()];
    let mut files = Vec::new();

    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("cannot read directory {}: {e}", dir.display());
                continue;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(CERT_EXTENSION))
            {
                files.push(path);
            }
        }
    }
    files
}

/// Read a certificate file as DER, unwrapping PEM armor when present.
fn read_certificate_der(path: &Path) -> SigningResult<Vec<u8>> {
    let raw = fs::read(path)?;
    if raw.starts_with(b"-----BEGIN") {
        let text = String::from_utf8(raw).map_err(|e| {
            SigningError::CertificateError(format!("PEM file is not UTF-8: {e}"))
        })?;
        let body: String = text
            .lines()
            .filter(|line| !line.starts_with("-----"))
            .collect();
        encoding::from_base64(&body)
    } else {
        Ok(raw)
    }
}
