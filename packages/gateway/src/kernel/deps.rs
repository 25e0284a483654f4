//! Server dependencies (using traits for testability)
//!
//! Central container handed to every resource type and route. All stores and
//! delivery services sit behind trait objects so tests can swap them.

use std::sync::Arc;

use super::{
    BaseClientStore, BaseMailer, BaseSessionStore, BaseUserStore, LogMailer, MemoryStore,
};

#[derive(Clone)]
pub struct ServerDeps {
    pub users: Arc<dyn BaseUserStore>,
    pub clients: Arc<dyn BaseClientStore>,
    pub sessions: Arc<dyn BaseSessionStore>,
    pub mailer: Arc<dyn BaseMailer>,
}

impl ServerDeps {
    /// Wire every store to one backend
    pub fn new<S>(store: Arc<S>, mailer: Arc<dyn BaseMailer>) -> Self
    where
        S: BaseUserStore + BaseClientStore + BaseSessionStore + 'static,
    {
        Self {
            users: store.clone(),
            clients: store.clone(),
            sessions: store,
            mailer,
        }
    }

    /// In-memory store with a logging mailer
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(LogMailer))
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn BaseMailer>) -> Self {
        self.mailer = mailer;
        self
    }
}
