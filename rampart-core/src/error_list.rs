//! Ordered list of errors attached to a response.
//!
//! Middleware that aborts a request records the reason here so that error
//! renderers and audit logging further out can see exactly what went wrong,
//! while the client only sees the status code.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// Errors collected while handling a single request.
#[derive(Clone, Default)]
pub struct ErrorList {
    errors: Vec<SharedError>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error
    pub fn push<E>(&mut self, error: E)
    where
        E: StdError + Send + Sync + 'static,
    {
        self.errors.push(Arc::new(error));
    }

    /// The most recently recorded error
    pub fn last(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.errors.last().map(|e| e.as_ref())
    }

    /// The most recently recorded error, if it has type `E`
    pub fn last_as<E: StdError + 'static>(&self) -> Option<&E> {
        self.last().and_then(|e| e.downcast_ref::<E>())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(dyn StdError + Send + Sync + 'static)> {
        self.errors.iter().map(|e| e.as_ref())
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Debug for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.errors.iter().map(|e| e.to_string()))
            .finish()
    }
}
