//! Error type returned by the credential store.

use crate::core::identity::Identity;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("identity {0} is already registered")]
    AlreadyRegistered(Identity),

    #[error("identity {0} is not registered")]
    NotRegistered(Identity),

    #[error("password must not be empty")]
    EmptyPassword,

    #[error("{context}")]
    Storage {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("corrupt credential record {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
}

impl StoreError {
    pub(crate) fn storage(context: impl Into<String>, source: io::Error) -> Self {
        Self::Storage {
            context: context.into(),
            source,
        }
    }

    /// Whether the failure came from the underlying storage (I/O or a corrupt record).
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Corrupt { .. })
    }

    /// Short machine-readable kind, used in the audit trail.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyRegistered(_) => "already_registered",
            Self::NotRegistered(_) => "not_registered",
            Self::EmptyPassword => "empty_password",
            Self::Storage { .. } => "storage",
            Self::Corrupt { .. } => "corrupt",
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
