// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Blocks (calendar documents with lock state)
//! - Athletes (player slots)
//! - Activities (synced Strava activities)
//! - Scores (write-once score records)

use crate::calendar;
use crate::db::collections;
use crate::error::AppError;
use crate::models::{Activity, Block, BlockStatus, ConnectionStatus, Player, ScoreRecord};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Seeding ─────────────────────────────────────────────────

    /// Seed block documents from the static calendar, if absent.
    ///
    /// Idempotent: existing documents (including locked ones) are never
    /// recreated or modified.
    pub async fn seed_blocks(&self) -> Result<(), AppError> {
        for def in calendar::definitions() {
            if self.get_block(def.block_id).await?.is_none() {
                let block = Block::from_definition(def);
                let _: () = self
                    .get_client()?
                    .fluent()
                    .update()
                    .in_col(collections::BLOCKS)
                    .document_id(&block.block_id)
                    .object(&block)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                tracing::info!(block_id = def.block_id, "Seeded block");
            }
        }
        Ok(())
    }

    /// Seed player slots (player_1, player_2, ...), if absent.
    pub async fn seed_players(&self, names: &[String]) -> Result<(), AppError> {
        for (i, name) in names.iter().enumerate() {
            let player_id = format!("player_{}", i + 1);
            if self.get_player(&player_id).await?.is_none() {
                let player = Player::new_slot(&player_id, name);
                self.upsert_player(&player).await?;
                tracing::info!(player_id = %player_id, "Seeded player slot");
            }
        }
        Ok(())
    }

    // ─── Block Operations ────────────────────────────────────────

    /// Get a block by ID.
    pub async fn get_block(&self, block_id: &str) -> Result<Option<Block>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::BLOCKS)
            .obj()
            .one(block_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all blocks, ordered by ID.
    pub async fn list_blocks(&self) -> Result<Vec<Block>, AppError> {
        let mut blocks: Vec<Block> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::BLOCKS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        blocks.sort_by(|a, b| a.block_id.cmp(&b.block_id));
        Ok(blocks)
    }

    // ─── Player Operations ───────────────────────────────────────

    /// Get a player slot by ID.
    pub async fn get_player(&self, player_id: &str) -> Result<Option<Player>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ATHLETES)
            .obj()
            .one(player_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all player slots, ordered by ID.
    pub async fn list_players(&self) -> Result<Vec<Player>, AppError> {
        let mut players: Vec<Player> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ATHLETES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        players.sort_by(|a, b| a.player_id.cmp(&b.player_id));
        Ok(players)
    }

    /// List player slots in "connected" status — only these participate
    /// in scoring.
    pub async fn list_connected_players(&self) -> Result<Vec<Player>, AppError> {
        let mut players: Vec<Player> = self.list_players().await?;
        players.retain(|p| p.status == ConnectionStatus::Connected);
        Ok(players)
    }

    /// Create or update a player slot.
    pub async fn upsert_player(&self, player: &Player) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ATHLETES)
            .document_id(&player.player_id)
            .object(player)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Activity Operations ─────────────────────────────────────

    /// Get an activity by Strava ID.
    pub async fn get_activity(&self, activity_id: &str) -> Result<Option<Activity>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACTIVITIES)
            .obj()
            .one(activity_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a synced activity (keyed by its Strava ID).
    pub async fn set_activity(&self, activity: &Activity) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ACTIVITIES)
            .document_id(&activity.activity_id)
            .object(activity)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get all activities assigned to a block.
    pub async fn activities_for_block(&self, block_id: &str) -> Result<Vec<Activity>, AppError> {
        let block_id = block_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| q.for_all([q.field("block_id").eq(block_id.clone())]))
            .order_by([(
                "start_date_utc",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all stored activities for a player, oldest first.
    pub async fn activities_for_player(&self, player_id: &str) -> Result<Vec<Activity>, AppError> {
        let player_id = player_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| q.for_all([q.field("player_id").eq(player_id.clone())]))
            .order_by([(
                "start_date_utc",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Score Operations ────────────────────────────────────────

    /// Get the score record for a block, if scored.
    pub async fn get_score(&self, block_id: &str) -> Result<Option<ScoreRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SCORES)
            .obj()
            .one(block_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all score records, ordered by block ID.
    pub async fn list_scores(&self) -> Result<Vec<ScoreRecord>, AppError> {
        let mut scores: Vec<ScoreRecord> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::SCORES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        scores.sort_by(|a, b| a.block_id.cmp(&b.block_id));
        Ok(scores)
    }

    // ─── Atomic Score Commit ─────────────────────────────────────

    /// Atomically write a score record and flip its block to locked.
    ///
    /// This is the single-writer critical section for a block: the lock
    /// state is re-read inside a Firestore transaction, so two concurrent
    /// scoring calls for the same block cannot both commit. Either both
    /// writes land or neither does — a locked block without a score
    /// record (or vice versa) is impossible.
    pub async fn commit_score(&self, record: &ScoreRecord) -> Result<(), AppError> {
        let block_id = &record.block_id;

        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // 1. Re-read the block within the transaction. The read must carry
        //    the transaction's consistency selector — a plain read would
        //    not be registered for conflict detection, and two racing
        //    callers could both observe the block as open.
        let txn_client = self.get_client()?.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );

        let block: Option<Block> = txn_client
            .fluent()
            .select()
            .by_id_in(collections::BLOCKS)
            .obj()
            .one(block_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read block in transaction: {}", e))
            })?;

        let mut block = block.ok_or_else(|| {
            AppError::Database(format!("Block {} has not been seeded", block_id))
        })?;

        // 2. Compare-and-set: refuse if another caller won the race.
        if let Err(err) = block.ensure_unlocked() {
            let _ = transaction.rollback().await;
            return Err(err);
        }

        block.status = BlockStatus::Locked;
        block.calculated_at = Some(record.calculated_at);

        // 3. Add the write-once score record to the transaction.
        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::SCORES)
            .document_id(block_id)
            .object(record)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add score to transaction: {}", e))
            })?;

        // 4. Add the block lock flip to the transaction.
        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::BLOCKS)
            .document_id(block_id)
            .object(&block)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add block lock to transaction: {}", e))
            })?;

        // 5. Commit atomically.
        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(block_id = %block_id, "Score committed and block locked");

        Ok(())
    }
}
