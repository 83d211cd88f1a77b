//! Shared login → author cache used for the duration of one collection.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::OnceCell;

use crate::report::model::Author;

/// Read-mostly cache of resolved authors keyed by login.
///
/// Each login owns one slot. The first caller to reach an empty slot runs the
/// lookup; concurrent callers for the same login wait on that slot instead of
/// issuing their own request. The map lock is never held across an await
/// point.
#[derive(Debug, Default)]
pub struct AuthorCache {
    entries: RwLock<HashMap<String, Arc<OnceCell<Author>>>>,
}

impl AuthorCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the resolved author for `login`, if a lookup has finished.
    #[must_use]
    pub fn get(&self, login: &str) -> Option<Author> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(login)
            .and_then(|slot| slot.get().cloned())
    }

    /// Returns the cached author for `login`, running `resolve` only when no
    /// other task has resolved or is resolving the same login.
    pub async fn get_or_resolve<F, Fut>(&self, login: &str, resolve: F) -> Author
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Author>,
    {
        self.slot(login).get_or_init(resolve).await.clone()
    }

    /// Number of logins seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, login: &str) -> Arc<OnceCell<Author>> {
        if let Some(slot) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(login)
        {
            return Arc::clone(slot);
        }

        Arc::clone(
            self.entries
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(login.to_owned())
                .or_default(),
        )
    }
}
