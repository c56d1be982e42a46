//! MongoDB dialer and data source.

use std::sync::Arc;

use async_trait::async_trait;
use bson::{doc, Document};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Database, IndexModel};
use tracing::{debug, info, info_span, Instrument};

use crate::config::MongoConfig;
use crate::connector::{Connector, Dialer};
use crate::documents::USERS;
use crate::error::{StoreError, StoreResult};
use crate::job_repo::MongoJobRepository;
use crate::repos::{DataSource, Repositories};
use crate::user_repo::MongoUserRepository;

/// Open client plus the selected database.
#[derive(Clone)]
pub struct MongoHandle {
    pub client: Client,
    pub database: Database,
}

/// Dials MongoDB, verifies the server answers, and ensures indexes.
pub struct MongoDialer {
    config: MongoConfig,
}

impl MongoDialer {
    pub fn new(config: MongoConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Dialer for MongoDialer {
    type Handle = MongoHandle;

    async fn dial(&self, url: &str) -> StoreResult<MongoHandle> {
        let mut options = ClientOptions::parse(url)
            .await
            .map_err(|e| StoreError::InvalidConnectionString(e.to_string()))?;

        options.app_name = Some(self.config.app_name.clone());
        options.connect_timeout = Some(self.config.connect_timeout);
        options.server_selection_timeout = Some(self.config.server_selection_timeout);

        let database_name = options
            .default_database
            .clone()
            .unwrap_or_else(|| self.config.default_database.clone());

        let client = Client::with_options(options).map_err(StoreError::connection)?;
        let database = client.database(&database_name);

        async {
            database
                .run_command(doc! { "ping": 1 })
                .await
                .map_err(StoreError::connection)?;
            ensure_indexes(&database).await
        }
        .instrument(info_span!("mongo_dial", database = %database_name))
        .await?;

        info!(database = %database_name, "Connected to MongoDB");
        Ok(MongoHandle { client, database })
    }
}

/// Unique email index backing duplicate-registration detection.
async fn ensure_indexes(database: &Database) -> StoreResult<()> {
    let email_index = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();

    database
        .collection::<Document>(USERS)
        .create_index(email_index)
        .await?;
    debug!("Ensured users.email unique index");
    Ok(())
}

/// MongoDB-backed [`DataSource`] holding the process-wide connection.
pub struct MongoDataSource {
    url: String,
    connector: Connector<MongoDialer>,
}

impl MongoDataSource {
    pub fn new(url: impl Into<String>, config: MongoConfig) -> Self {
        Self {
            url: url.into(),
            connector: Connector::new(MongoDialer::new(config)),
        }
    }
}

#[async_trait]
impl DataSource for MongoDataSource {
    async fn connect(&self) -> StoreResult<Repositories> {
        let handle = self.connector.ensure_connected(&self.url).await?;
        Ok(Repositories::new(
            Arc::new(MongoUserRepository::new(&handle.database)),
            Arc::new(MongoJobRepository::new(&handle.database)),
        ))
    }

    async fn is_connected(&self) -> bool {
        self.connector.is_connected().await
    }

    async fn disconnect(&self) {
        if let Some(handle) = self.connector.reset().await {
            handle.client.shutdown().await;
            info!("MongoDB connection closed");
        }
    }
}
