use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;

use crate::db::pool::health_check;
use crate::repository::HealthCheckRepository;

pub struct PgHealthCheckRepository {
    pool: PgPool,
}

impl PgHealthCheckRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthCheckRepository for PgHealthCheckRepository {
    async fn ping(&self) -> bool {
        match health_check(&self.pool).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                false
            }
        }
    }
}
