//! Type-safe request extensions.
//!
//! Middleware attaches request-scoped state here keyed by its Rust type, so
//! later middleware, handlers and template helpers read it back without
//! string keys or unchecked casts.
//!
//! # Example
//!
//! ```rust
//! use rampart_core::Extensions;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct RequestId(String);
//!
//! let mut ext = Extensions::new();
//! ext.insert(RequestId("abc".to_string()));
//!
//! assert_eq!(ext.get::<RequestId>(), Some(&RequestId("abc".to_string())));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Type-safe extensions container.
#[derive(Clone, Default)]
pub struct Extensions {
    map: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Extensions {
    /// Create a new empty extensions container.
    #[inline]
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Insert a typed value, replacing any previous value of the same type.
    #[inline]
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.map.insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Get a reference to a typed value.
    #[inline]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|arc| arc.downcast_ref::<T>())
    }

    /// Update a typed value in place, inserting `T::default()` first if absent.
    ///
    /// Values are shared with clones of this container, so the update is
    /// copy-on-write.
    pub fn update<T, F>(&mut self, f: F)
    where
        T: Clone + Default + Send + Sync + 'static,
        F: FnOnce(&mut T),
    {
        let mut value = self.get::<T>().cloned().unwrap_or_default();
        f(&mut value);
        self.insert(value);
    }

    /// Check if a value of this type exists.
    #[inline]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    /// Remove a typed value. Returns true if it existed.
    #[inline]
    pub fn remove<T: Send + Sync + 'static>(&mut self) -> bool {
        self.map.remove(&TypeId::of::<T>()).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl std::fmt::Debug for Extensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extensions")
            .field("count", &self.map.len())
            .finish()
    }
}
