//! Object name parsing and resolution
//!
//! Object names are either absolute (`s3://bucket/key`) or relative keys that
//! are resolved against a run-wide default bucket and key prefix.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::names::{PATH_SEPARATOR, S3_SCHEME};
use crate::errors::{NameError, NameResult};

/// A fully resolved object address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", S3_SCHEME, self.bucket, self.key)
    }
}

/// Split an object name into `(bucket, key)`
///
/// - `s3://bucket/key` gives `("bucket", "key")`; the key may be empty
/// - `s3://bucket` gives `("bucket", "")`
/// - any other non-empty name gives `("", name)`
///
/// # Errors
///
/// Returns [`NameError::Empty`] for an empty name and
/// [`NameError::MissingBucket`] for `s3://` or `s3:///...`.
pub fn split_object_name(name: &str) -> NameResult<(&str, &str)> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }

    let Some(path) = name.strip_prefix(S3_SCHEME) else {
        return Ok(("", name));
    };

    if path.is_empty() || path.starts_with(PATH_SEPARATOR) {
        return Err(NameError::MissingBucket {
            name: name.to_string(),
        });
    }

    Ok(path.split_once(PATH_SEPARATOR).unwrap_or((path, "")))
}

/// Resolves object names against the run-wide default bucket and prefix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolver {
    default_bucket: Option<String>,
    default_prefix: String,
}

impl Resolver {
    /// A resolver with no defaults; only absolute names resolve
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver that maps relative keys to `bucket` under `prefix`
    pub fn with_default(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            default_bucket: Some(bucket.into()),
            default_prefix: prefix.into(),
        }
    }

    /// Build a resolver from a `-p s3://bucket[/prefix]` argument
    ///
    /// # Errors
    ///
    /// The prefix must be an absolute `s3://` URL naming a bucket.
    pub fn from_prefix_url(prefix: Option<&str>) -> NameResult<Self> {
        let Some(url) = prefix.filter(|p| !p.is_empty()) else {
            return Ok(Self::new());
        };

        let (bucket, key_prefix) = split_object_name(url)?;
        if bucket.is_empty() {
            return Err(NameError::MissingBucket {
                name: url.to_string(),
            });
        }
        Ok(Self::with_default(bucket, key_prefix))
    }

    pub fn default_bucket(&self) -> Option<&str> {
        self.default_bucket.as_deref()
    }

    pub fn default_prefix(&self) -> &str {
        &self.default_prefix
    }

    /// Resolve `name` to the object it addresses
    pub fn resolve(&self, name: &str) -> NameResult<ObjectLocation> {
        let (bucket, key) = split_object_name(name)?;
        if key.is_empty() {
            return Err(NameError::MissingKey {
                name: name.to_string(),
            });
        }

        if !bucket.is_empty() {
            return Ok(ObjectLocation::new(bucket, key));
        }

        match &self.default_bucket {
            Some(default_bucket) => Ok(ObjectLocation::new(
                default_bucket.clone(),
                format!("{}{}", self.default_prefix, key),
            )),
            None => Err(NameError::NoDefaultBucket {
                name: name.to_string(),
            }),
        }
    }
}
