//! Authenticated HTTP transport shared by every client operation.
//!
//! One blocking request per call, presenting the client certificate for
//! mutual TLS. Anything other than HTTP 200 fails the call with
//! [`FahError::Remote`]; retry policy, if any, belongs to the calling
//! service, not this layer.

use std::fs::{self, File};
use std::path::Path;
use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::{Body, Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::credentials::Credential;
use crate::client::errors::FahError;

/// Connection-level knobs. The client imposes no timeouts unless asked to;
/// callers wanting cancellation behavior set them here.
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Accept the server certificate without verification when false. Must
    /// be disabled explicitly; never the default.
    pub insecure: bool,
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

/// Blocking HTTP client bound to one client identity.
///
/// Holds no mutable state; safe to share across threads, with each call
/// blocking its caller until the remote responds or fails.
pub struct Transport {
    client: Client,
}

impl Transport {
    pub fn new(credential: &Credential, options: &TransportOptions) -> Result<Self, FahError> {
        let mut builder = Client::builder()
            .use_native_tls()
            .identity(credential.identity()?)
            .timeout(options.timeout);
        if let Some(connect_timeout) = options.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if options.insecure {
            warn!("server certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }
        Ok(Transport {
            client: builder.build()?,
        })
    }

    fn url(base: &str, endpoint: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), endpoint)
    }

    /// Consume the response, returning its body on 200 and
    /// [`FahError::Remote`] otherwise.
    fn read_success(response: Response) -> Result<String, FahError> {
        let status = response.status();
        let body = response.text()?;
        if status != StatusCode::OK {
            return Err(FahError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn parse<T: DeserializeOwned>(body: &str) -> Result<T, FahError> {
        serde_json::from_str(body).map_err(|e| FahError::Validation {
            message: e.to_string(),
        })
    }

    /// GET `endpoint` and parse the JSON response.
    pub fn get<T: DeserializeOwned>(
        &self,
        base: &str,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, FahError> {
        let url = Self::url(base, endpoint);
        debug!("GET {}", url);
        let response = self.client.get(&url).query(query).send()?;
        Self::parse(&Self::read_success(response)?)
    }

    /// GET `endpoint` and return the raw response body.
    pub fn get_bytes(&self, base: &str, endpoint: &str) -> Result<Vec<u8>, FahError> {
        let url = Self::url(base, endpoint);
        debug!("GET {}", url);
        let response = self.client.get(&url).send()?;
        let status = response.status();
        let bytes = response.bytes()?;
        if status != StatusCode::OK {
            return Err(FahError::Remote {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(bytes.to_vec())
    }

    /// PUT `body` as JSON to `endpoint`.
    pub fn put<B: Serialize>(&self, base: &str, endpoint: &str, body: &B) -> Result<(), FahError> {
        let url = Self::url(base, endpoint);
        debug!("PUT {}", url);
        let response = self.client.put(&url).json(body).send()?;
        Self::read_success(response)?;
        Ok(())
    }

    /// PUT raw bytes as the request body.
    pub fn put_bytes(&self, base: &str, endpoint: &str, bytes: Vec<u8>) -> Result<(), FahError> {
        let url = Self::url(base, endpoint);
        debug!("PUT {} ({} bytes)", url, bytes.len());
        let response = self.client.put(&url).body(bytes).send()?;
        Self::read_success(response)?;
        Ok(())
    }

    /// DELETE `endpoint`.
    pub fn delete(&self, base: &str, endpoint: &str) -> Result<(), FahError> {
        let url = Self::url(base, endpoint);
        debug!("DELETE {}", url);
        let response = self.client.delete(&url).send()?;
        Self::read_success(response)?;
        Ok(())
    }

    /// Stream a local file as the body of a PUT.
    ///
    /// A missing or unreadable source fails with [`FahError::Io`] before any
    /// network traffic. The file is read in chunks, never buffered whole.
    pub fn upload(&self, base: &str, endpoint: &str, src: &Path) -> Result<(), FahError> {
        let file = File::open(src)?;
        let length = file.metadata()?.len();
        let url = Self::url(base, endpoint);
        debug!("PUT {} (upload {}, {} bytes)", url, src.display(), length);
        let response = self
            .client
            .put(&url)
            .body(Body::sized(file, length))
            .send()?;
        Self::read_success(response)?;
        Ok(())
    }

    /// Stream a GET response body to `dest`, creating parent directories as
    /// needed and truncating any existing file.
    pub fn download(&self, base: &str, endpoint: &str, dest: &Path) -> Result<(), FahError> {
        let url = Self::url(base, endpoint);
        debug!("GET {} (download to {})", url, dest.display());
        let mut response = self.client.get(&url).send()?;
        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text()?;
            return Err(FahError::Remote { status, body });
        }
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = File::create(dest)?;
        response.copy_to(&mut file)?;
        Ok(())
    }
}
