//! Template bodies.
//!
//! A template is read once, held as an immutable string for the duration of a
//! call, and identified in logs by its SHA-256 digest.

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use crate::error::Result;

/// Length of the short digest shown in events.
const SHORT_DIGEST_LEN: usize = 12;

/// The full desired-state document submitted to the backend.
#[derive(Clone, PartialEq, Eq)]
pub struct TemplateBody(Arc<str>);

impl TemplateBody {
    /// Wraps template text.
    #[must_use]
    pub fn new(body: impl Into<Arc<str>>) -> Self {
        Self(body.into())
    }

    /// Drains a byte stream into a template.
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the stream fails.
    pub async fn read_from<R>(reader: &mut R) -> Result<Self>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        debug!("Read template body ({} bytes)", bytes.len());
        Ok(Self::new(String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Loads a template from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading template from: {}", path.display());
        let mut file = tokio::fs::File::open(path).await?;
        Self::read_from(&mut file).await
    }

    /// Returns the template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the template size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the template is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Computes the hex SHA-256 digest of the template.
    #[must_use]
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Returns the first characters of the digest.
    #[must_use]
    pub fn short_digest(&self) -> String {
        let mut digest = self.digest();
        digest.truncate(SHORT_DIGEST_LEN);
        digest
    }
}

impl From<&str> for TemplateBody {
    fn from(body: &str) -> Self {
        Self::new(body)
    }
}

impl From<String> for TemplateBody {
    fn from(body: String) -> Self {
        Self::new(body)
    }
}

impl fmt::Debug for TemplateBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateBody")
            .field("len", &self.len())
            .field("sha256", &self.short_digest())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_deterministic() {
        let a = TemplateBody::from("Resources: {}");
        let b = TemplateBody::from(String::from("Resources: {}"));

        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
        assert_eq!(a.short_digest().len(), SHORT_DIGEST_LEN);
        assert_ne!(a.digest(), TemplateBody::from("Resources: []").digest());
    }

    #[tokio::test]
    async fn test_read_from_drains_every_chunk() {
        let mut stream = tokio_test::io::Builder::new()
            .read(b"AWSTemplateFormatVersion: '2010-09-09'\n")
            .read(b"Resources: {}\n")
            .build();

        let body = TemplateBody::read_from(&mut stream).await.expect("read");

        assert_eq!(
            body.as_str(),
            "AWSTemplateFormatVersion: '2010-09-09'\nResources: {}\n"
        );
    }

    #[tokio::test]
    async fn test_read_from_surfaces_stream_errors() {
        let mut stream = tokio_test::io::Builder::new()
            .read(b"partial")
            .read_error(std::io::Error::other("stream reset"))
            .build();

        let result = TemplateBody::read_from(&mut stream).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let result = TemplateBody::load(dir.path().join("missing.yml")).await;
        assert!(result.is_err());
    }
}
