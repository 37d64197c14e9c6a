use std::sync::Arc;

use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::auth::jwt::JwtService;
use crate::config::Config;
use crate::llm_client::LanguageModel;
use crate::mailer::Mailer;
use crate::payments::PaymentGateway;
use crate::storage::ObjectStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// OTPs and the email-change state machine.
    pub redis: RedisClient,
    pub storage: ObjectStore,
    pub llm: Arc<dyn LanguageModel>,
    pub mailer: Arc<dyn Mailer>,
    pub payments: Arc<dyn PaymentGateway>,
    pub jwt: JwtService,
    pub config: Config,
}

#[cfg(test)]
impl AppState {
    /// State for router tests. The pool connects lazily and the external
    /// services are in-memory doubles, so requests rejected before touching
    /// storage can be exercised without any infrastructure.
    pub fn for_tests() -> Self {
        use aws_config::Region;
        use sqlx::postgres::PgPoolOptions;

        use crate::llm_client::testing::ScriptedModel;
        use crate::mailer::testing::RecordingMailer;
        use crate::payments::gateway::testing::FakeGateway;

        let config = Config::for_tests();
        let db = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy(&config.database_url)
            .expect("lazy pool never connects up front");
        let redis = RedisClient::open(config.redis_url.as_str()).expect("valid redis url");
        let s3 = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        let storage = ObjectStore::new(
            aws_sdk_s3::Client::from_conf(s3),
            config.s3_bucket.clone(),
            config.s3_public_base_url.clone(),
        );

        AppState {
            db,
            redis,
            storage,
            llm: Arc::new(ScriptedModel::default()),
            mailer: Arc::new(RecordingMailer::default()),
            payments: Arc::new(FakeGateway::default()),
            jwt: JwtService::new(&config),
            config,
        }
    }
}
