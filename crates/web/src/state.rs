use std::sync::Arc;
use std::time::Duration;

use importer::ImportConfig;
use storage::Database;

use crate::access::AccessPolicy;
use crate::config::Config;
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionStore,
    pub access: Arc<AccessPolicy>,
    pub import_config: Arc<ImportConfig>,
    pub writes_enabled: bool,
}

impl AppState {
    pub fn new(db: Database, config: &Config) -> Self {
        Self {
            db,
            sessions: SessionStore::with_ttl(Duration::from_secs(
                config.session_ttl_minutes.max(1) * 60,
            )),
            access: Arc::new(AccessPolicy::from_config(config)),
            import_config: Arc::new(ImportConfig::default()),
            writes_enabled: config.writes_enabled,
        }
    }
}
