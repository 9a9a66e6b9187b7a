use crate::config::Config;
use crate::storage::LocalStore;

pub struct AppState {
    pub config: Config,
    pub store: LocalStore,
    pub remote_log: remote_log::RemoteLogClient,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let store = LocalStore::open(&config.data_dir)?;
        seed::ensure_seed_data(&store)?;

        let remote_log = remote_log::RemoteLogClient::new(config.remote_log_url.clone());
        if config.remote_log_url.is_some() {
            tracing::info!("Remote login log enabled");
        } else {
            tracing::info!("Remote login log disabled (no URL configured)");
        }

        Ok(Self {
            config,
            store,
            remote_log,
        })
    }
}

pub mod login_service;
pub mod print_service;
pub mod remote_log;
pub mod seed;
pub mod session_service;
