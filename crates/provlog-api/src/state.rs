//! Application state
//!
//! Centralizes access to the store, the archive and the chain components.

use std::sync::Arc;

use provlog_archive::ArchiveBackend;
use provlog_chain::{Appender, ChainVerifier, Reconciler};
use provlog_persist::EventStore;

use crate::config::Config;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<dyn EventStore>,
    archive: Arc<dyn ArchiveBackend>,
    appender: Appender,
    verifier: Arc<ChainVerifier>,
    reconciler: Arc<Reconciler>,
}

impl AppState {
    /// Wire the chain components over a store and an archive.
    pub fn new(
        config: Config,
        store: Arc<dyn EventStore>,
        archive: Arc<dyn ArchiveBackend>,
    ) -> Self {
        let appender = Appender::with_timeouts(
            store.clone(),
            archive.clone(),
            config.store_timeout,
            config.archive_timeout,
        );
        let verifier = Arc::new(ChainVerifier::new(store.clone()));
        let reconciler = Arc::new(Reconciler::new(store.clone(), archive.clone()));

        Self {
            config: Arc::new(config),
            store,
            archive,
            appender,
            verifier,
            reconciler,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn EventStore> {
        self.store.clone()
    }

    pub fn archive(&self) -> Arc<dyn ArchiveBackend> {
        self.archive.clone()
    }

    pub fn appender(&self) -> &Appender {
        &self.appender
    }

    pub fn verifier(&self) -> &ChainVerifier {
        &self.verifier
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }
}
