/// Database file location, overridable for deployments.
pub fn database_path() -> String {
    std::env::var("DATABASE_PATH").unwrap_or_else(|_| "versus_stats.db".to_string())
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub batch_size: usize,
    pub concurrency: usize,
    pub worker_delay_ms: u64,
    pub inflate_zero_play_wins: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            batch_size: 50,
            concurrency: 4,
            worker_delay_ms: 2000,
            inflate_zero_play_wins: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: &'static str,
    pub user_agent: &'static str,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://tgrcode.com/mm2",
            user_agent: "MakerVersusStats/1.0",
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplicaSettings {
    pub refresh_ttl_secs: u64,
    pub region: &'static str,
}

impl Default for ReplicaSettings {
    fn default() -> Self {
        Self {
            refresh_ttl_secs: 300,
            region: "us-east-1",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub sync: SyncSettings,
    pub api: ApiSettings,
    pub replica: ReplicaSettings,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }
}
