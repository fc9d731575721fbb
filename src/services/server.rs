use anyhow::Result;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::api::handlers::{AppState, ReadSide};
use crate::api::routes::create_router;
use crate::cache::{ReplicaCache, ReplicaLocation, S3BlobClient, SystemClock};
use crate::config::settings::{database_path, AppConfig};
use crate::database::StatsRepository;

pub struct ServerService {
    port: u16,
    config: AppConfig,
}

impl ServerService {
    pub fn new(port: u16, config: AppConfig) -> Self {
        Self { port, config }
    }

    pub async fn run(&self) -> Result<()> {
        let reader = self.build_read_side()?;
        let state = Arc::new(AppState {
            reader,
            config: self.config.clone(),
        });

        let app = create_router(state).layer(CorsLayer::permissive());

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Replica-backed reads when the blob storage variables are configured,
    /// the local store otherwise.
    fn build_read_side(&self) -> Result<ReadSide> {
        if let (Ok(bucket), Ok(key)) = (std::env::var("S3_BUCKET_NAME"), std::env::var("S3_DB_KEY"))
        {
            let region = std::env::var("AWS_REGION")
                .unwrap_or_else(|_| self.config.replica.region.to_string());
            info!("Reading from replica s3://{}/{}", bucket, key);

            let location = ReplicaLocation {
                bucket,
                key,
                region,
            };
            let fetcher = S3BlobClient::new(self.config.api.timeout_secs)?;
            let cache = ReplicaCache::new(
                location,
                Duration::from_secs(self.config.replica.refresh_ttl_secs),
                Box::new(fetcher),
                Box::new(SystemClock),
            );
            return Ok(ReadSide::Replica(Mutex::new(cache)));
        }

        let db_path = database_path();
        info!("Reading from local database {}", db_path);
        let repo = StatsRepository::open(&db_path)?;
        Ok(ReadSide::Local(Arc::new(repo)))
    }
}
