// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

use std::error::Error as StdError;
use std::io;

use object_store::client::{HttpError, HttpErrorKind};
use thiserror::Error;

use super::attribute::FileType;

/// Coarse classification of a [`StorageError`].
///
/// Only [`ErrorKind::Transient`] is worth retrying; every other kind is
/// terminal for the call that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    Transient,
    TypeMismatch,
    PartialFailure,
    InvalidInput,
    Other,
}

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Transient error: {0}")]
    Transient(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: FileType, found: FileType },

    #[error("Partial failure in {operation}: {} of {total} failed ({})", .failed.len(), .failed.join("; "))]
    PartialFailure {
        operation: &'static str,
        total: usize,
        failed: Vec<String>,
    },

    #[error("Partial move: '{src}' was copied to '{dst}' but the source could not be removed: {source}")]
    PartialMove {
        src: String,
        dst: String,
        #[source]
        source: Box<StorageError>,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    IoError(io::Error),

    #[error("Object store error: {0}")]
    ObjectStoreError(object_store::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),
}

impl StorageError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::NotFound(_) => ErrorKind::NotFound,
            StorageError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            StorageError::Transient(_) => ErrorKind::Transient,
            StorageError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            StorageError::PartialFailure { .. } | StorageError::PartialMove { .. } => {
                ErrorKind::PartialFailure
            }
            StorageError::ConfigError(_)
            | StorageError::InvalidPath(_)
            | StorageError::InvalidUrl(_)
            | StorageError::UrlParseError(_)
            | StorageError::SerializationError(_) => ErrorKind::InvalidInput,
            StorageError::IoError(e) if is_transient_io(e.kind()) => ErrorKind::Transient,
            StorageError::IoError(_)
            | StorageError::ObjectStoreError(_)
            | StorageError::ImageError(_) => ErrorKind::Other,
        }
    }

    /// Whether a caller may retry the failed call with backoff.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

fn is_transient_io(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::Interrupted
            | io::ErrorKind::TimedOut
    )
}

/// Whether `error`, or anything in its source chain, is a failure to reach
/// the server or a response cut short. Status-coded rejections are not.
fn is_connection_failure(error: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(error) = current {
        if let Some(http) = error.downcast_ref::<HttpError>() {
            if matches!(
                http.kind(),
                HttpErrorKind::Connect | HttpErrorKind::Timeout | HttpErrorKind::Interrupted
            ) {
                return true;
            }
        }
        if let Some(http) = error.downcast_ref::<reqwest::Error>() {
            if http.is_connect() || http.is_timeout() {
                return true;
            }
        }
        if let Some(io_error) = error.downcast_ref::<io::Error>() {
            if is_transient_io(io_error.kind()) {
                return true;
            }
        }
        current = error.source();
    }
    false
}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(error.to_string()),
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(error.to_string()),
            _ => StorageError::IoError(error),
        }
    }
}

impl From<object_store::Error> for StorageError {
    fn from(error: object_store::Error) -> Self {
        match error {
            object_store::Error::NotFound { path, .. } => StorageError::NotFound(path),
            object_store::Error::PermissionDenied { path, source }
            | object_store::Error::Unauthenticated { path, source } => {
                StorageError::PermissionDenied(format!("{}: {}", path, source))
            }
            object_store::Error::InvalidPath { source } => {
                StorageError::InvalidPath(source.to_string())
            }
            object_store::Error::Generic { store, source } if is_connection_failure(&*source) => {
                StorageError::Transient(format!("{}: {}", store, source))
            }
            other => StorageError::ObjectStoreError(other),
        }
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(error: reqwest::Error) -> Self {
        StorageError::Transient(error.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
