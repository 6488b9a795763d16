// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DroverError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Invalid cluster selector: {0}")]
    InvalidSelector(String),

    #[error("Object is missing metadata: {0}")]
    MissingMetadata(String),

    #[error("Serialization failed: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl DroverError {
    fn api_reason(&self) -> Option<(u16, &str)> {
        match self {
            DroverError::KubeError(kube::Error::Api(e)) => Some((e.code, e.reason.as_str())),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.api_reason(), Some((404, _)))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self.api_reason(), Some((409, "AlreadyExists")))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self.api_reason(), Some((409, "Conflict")))
    }
}

pub type Result<T> = std::result::Result<T, DroverError>;
