use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::sync::Mutex;

use crate::{Error, Result, schema};

/// Lazily connected, health-checked handle on the catalog database.
///
/// The lock only guards the slot and the connect itself, so concurrent first callers
/// wait for one connection attempt while established callers ping in parallel. A
/// ping that cannot get a connection in time means the pool is saturated, not dead,
/// and is reported without touching the pool. Any other ping failure swaps in a new
/// pool unless another caller already did.
pub struct CatalogPool {
	cfg: vox_config::Postgres,
	slot: Mutex<Slot>,
}
impl CatalogPool {
	pub fn new(cfg: &vox_config::Postgres) -> Self {
		Self { cfg: cfg.clone(), slot: Mutex::new(Slot::default()) }
	}

	pub async fn acquire(&self) -> Result<PgPool> {
		let current = self.slot.lock().await.current();
		let Some((generation, pool)) = current else {
			return self.reconnect(None).await;
		};

		match sqlx::query("SELECT 1").execute(&pool).await {
			Ok(_) => Ok(pool),
			Err(sqlx::Error::PoolTimedOut) => {
				tracing::warn!(
					max_conns = self.cfg.pool_max_conns,
					"Catalog pool is saturated. Keeping it."
				);

				Err(Error::Unavailable {
					message: "timed out waiting for a catalog connection".to_string(),
				})
			},
			Err(err) => {
				tracing::warn!(error = %err, "Catalog pool failed its health check. Reconnecting.");

				self.reconnect(Some(generation)).await
			},
		}
	}

	/// Closes the pool. A later `acquire` connects again.
	pub async fn close(&self) {
		let pool = self.slot.lock().await.pool.take();

		if let Some(pool) = pool {
			pool.close().await;

			tracing::info!("Catalog pool closed.");
		}
	}

	pub async fn is_connected(&self) -> bool {
		self.slot.lock().await.current().is_some()
	}

	/// Connects a new pool unless the slot already moved past `failed`.
	async fn reconnect(&self, failed: Option<u64>) -> Result<PgPool> {
		let mut slot = self.slot.lock().await;

		if let Some((generation, pool)) = slot.current()
			&& Some(generation) != failed
		{
			return Ok(pool);
		}

		let pool = connect(&self.cfg).await?;

		slot.generation += 1;
		// Requests still holding the old handle finish on it. Its connections close
		// once the last clone is dropped.
		slot.pool = Some(pool.clone());

		tracing::info!(
			generation = slot.generation,
			max_conns = self.cfg.pool_max_conns,
			min_conns = self.cfg.pool_min_conns,
			"Catalog pool connected."
		);

		Ok(pool)
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let pool = self.acquire().await?;

		ensure_schema(&pool).await
	}
}

#[derive(Default)]
struct Slot {
	generation: u64,
	pool: Option<PgPool>,
}
impl Slot {
	fn current(&self) -> Option<(u64, PgPool)> {
		self.pool.as_ref().filter(|pool| !pool.is_closed()).map(|pool| (self.generation, pool.clone()))
	}
}

pub async fn connect(cfg: &vox_config::Postgres) -> Result<PgPool> {
	let pool = PgPoolOptions::new()
		.max_connections(cfg.pool_max_conns)
		.min_connections(cfg.pool_min_conns)
		.acquire_timeout(Duration::from_millis(cfg.acquire_timeout_ms))
		.connect(&cfg.dsn)
		.await?;

	Ok(pool)
}

pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
	let sql = schema::render_schema();
	let lock_id: i64 = 7_120_115;
	// Serializes concurrent bootstraps. The lock is released with the transaction.
	let mut tx = pool.begin().await?;

	sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

	for statement in sql.split(';') {
		let trimmed = statement.trim();

		if trimmed.is_empty() {
			continue;
		}

		sqlx::query(trimmed).execute(&mut *tx).await?;
	}

	tx.commit().await?;

	Ok(())
}
