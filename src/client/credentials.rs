//! Client credential handling: RSA key and X.509 certificate material used
//! as the TLS identity for every remote call.
//!
//! Certificates are issued by the assignment server operators out of band:
//! generate a key with [`create_key`], produce a CSR with [`generate_csr`],
//! and submit it through whatever channel the AS accepts. The signed
//! certificate then pairs with the key as a [`Credential`].

use std::fmt::Display;
use std::fs;
use std::path::Path;

use log::debug;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::{X509, X509NameBuilder, X509ReqBuilder};

use crate::client::errors::FahError;

const KEY_BITS: u32 = 4096;

fn credential_error(context: &str, err: impl Display) -> FahError {
    FahError::Credential(format!("{}: {}", context, err))
}

/// Read a PEM-encoded RSA private key from disk.
pub fn read_key(key_file: &Path) -> Result<PKey<Private>, FahError> {
    let pem = fs::read(key_file)
        .map_err(|e| credential_error(&format!("reading key file {}", key_file.display()), e))?;
    PKey::private_key_from_pem(&pem)
        .map_err(|e| credential_error(&format!("parsing key file {}", key_file.display()), e))
}

/// Read a PEM-encoded X.509 certificate from disk.
pub fn read_certificate(certificate_file: &Path) -> Result<X509, FahError> {
    let pem = fs::read(certificate_file).map_err(|e| {
        credential_error(
            &format!("reading certificate file {}", certificate_file.display()),
            e,
        )
    })?;
    X509::from_pem(&pem).map_err(|e| {
        credential_error(
            &format!("parsing certificate file {}", certificate_file.display()),
            e,
        )
    })
}

/// Generate a fresh 4096-bit RSA key pair. No disk or network I/O.
pub fn create_key() -> Result<PKey<Private>, FahError> {
    // openssl uses the standard public exponent 65537.
    let rsa = Rsa::generate(KEY_BITS).map_err(|e| credential_error("generating RSA key", e))?;
    PKey::from_rsa(rsa).map_err(|e| credential_error("wrapping RSA key", e))
}

/// Persist a private key unencrypted in traditional PEM encoding,
/// overwriting `key_file` if it exists.
pub fn write_key(key: &PKey<Private>, key_file: &Path) -> Result<(), FahError> {
    let pem = key
        .rsa()
        .and_then(|rsa| rsa.private_key_to_pem())
        .map_err(|e| credential_error("encoding private key", e))?;
    fs::write(key_file, pem)?;
    debug!("wrote private key to {}", key_file.display());
    Ok(())
}

/// Generate a PEM-encoded certificate signing request over SHA-256 with the
/// given subject common name.
///
/// The caller submits the CSR to the assignment server operators and
/// receives a signed certificate back through an out-of-band process.
pub fn generate_csr(key: &PKey<Private>, common_name: &str) -> Result<String, FahError> {
    let build = || -> Result<Vec<u8>, openssl::error::ErrorStack> {
        let mut name = X509NameBuilder::new()?;
        name.append_entry_by_text("CN", common_name)?;
        let name = name.build();

        let mut request = X509ReqBuilder::new()?;
        request.set_subject_name(&name)?;
        request.set_pubkey(key)?;
        request.sign(key, MessageDigest::sha256())?;

        request.build().to_pem()
    };
    let pem = build().map_err(|e| credential_error("generating CSR", e))?;
    String::from_utf8(pem).map_err(|e| credential_error("encoding CSR", e))
}

/// The client identity: a private key and its signed certificate.
///
/// Loaded once at client construction and never mutated afterwards.
pub struct Credential {
    key: PKey<Private>,
    certificate: X509,
}

impl Credential {
    pub fn new(key: PKey<Private>, certificate: X509) -> Self {
        Credential { key, certificate }
    }

    /// Load the certificate/key pair from PEM files.
    pub fn load(certificate_file: &Path, key_file: &Path) -> Result<Self, FahError> {
        let certificate = read_certificate(certificate_file)?;
        let key = read_key(key_file)?;
        debug!(
            "loaded client credential from {} / {}",
            certificate_file.display(),
            key_file.display()
        );
        Ok(Credential { key, certificate })
    }

    pub fn key(&self) -> &PKey<Private> {
        &self.key
    }

    pub fn certificate(&self) -> &X509 {
        &self.certificate
    }

    /// Convert into the TLS identity presented on every handshake.
    pub(crate) fn identity(&self) -> Result<reqwest::Identity, FahError> {
        let certificate_pem = self
            .certificate
            .to_pem()
            .map_err(|e| credential_error("encoding certificate", e))?;
        let key_pem = self
            .key
            .private_key_to_pem_pkcs8()
            .map_err(|e| credential_error("encoding private key", e))?;
        reqwest::Identity::from_pkcs8_pem(&certificate_pem, &key_pem)
            .map_err(|e| credential_error("building TLS identity", e))
    }
}
