//! MongoDB database wrapper.

use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use tracing::info;

/// Database wrapper for MongoDB operations.
#[derive(Debug, Clone)]
pub struct Database {
    client: Client,
    db: mongodb::Database,
}

impl Database {
    /// Connect to MongoDB with the given URI and database name.
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect(uri: &str, db_name: &str) -> anyhow::Result<Self> {
        let options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(options)?;

        // Ping the database to verify connection
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        info!("Successfully connected to MongoDB");

        let db = client.database(db_name);

        Ok(Self { client, db })
    }

    /// Get a reference to the underlying MongoDB client.
    #[allow(dead_code)]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Get a typed collection from the database.
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    /// Create the indexes the repositories rely on.
    ///
    /// Idempotent; safe to run on every startup. `users.user_id` and
    /// `rag_requests.request_id` are deliberately non-unique: pending
    /// roster entries share the `-1` sentinel id, and test-mode ledger
    /// rows share the sentinel request id.
    pub async fn ensure_indexes(&self) -> anyhow::Result<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.collection::<Document>("users")
            .create_index(IndexModel::builder().keys(doc! { "user_id": 1 }).build())
            .await?;
        self.collection::<Document>("users")
            .create_index(IndexModel::builder().keys(doc! { "username": 1 }).build())
            .await?;

        self.collection::<Document>("user_limits")
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;

        self.collection::<Document>("rag_requests")
            .create_index(IndexModel::builder().keys(doc! { "request_id": 1 }).build())
            .await?;
        self.collection::<Document>("rag_requests")
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1, "created_at": -1 })
                    .build(),
            )
            .await?;

        self.collection::<Document>("text_templates")
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "key": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;

        self.collection::<Document>("activity_log")
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1, "created_at": -1 })
                    .build(),
            )
            .await?;
        self.collection::<Document>("activity_log")
            .create_index(IndexModel::builder().keys(doc! { "created_at": -1 }).build())
            .await?;

        self.collection::<Document>("user_acquisition")
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;

        info!("Database indexes ensured");
        Ok(())
    }
}
