mod error;

pub use error::{Error, Result};

use std::{env, future::Future, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

use vox_domain::Product;

const ADMIN_DATABASES: [&str; 2] = ["postgres", "template1"];

/// Disposable database created next to the one named by `VOX_PG_DSN`.
pub struct TestDatabase {
	name: String,
	dsn: String,
	admin_options: PgConnectOptions,
	cleaned: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base_options: PgConnectOptions = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::Message(format!("Failed to parse VOX_PG_DSN: {err}.")))?;
		let (admin_options, mut admin_conn) = connect_admin(&base_options).await?;
		let name = format!("vox_test_{}", Uuid::new_v4().simple());
		let create_sql = format!(r#"CREATE DATABASE "{}""#, name);

		admin_conn
			.execute(create_sql.as_str())
			.await
			.map_err(|err| Error::Message(format!("Failed to create test database: {err}.")))?;

		let dsn = base_options.clone().database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, admin_options, cleaned: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub async fn cleanup(mut self) -> Result<()> {
		self.cleanup_inner().await
	}

	async fn cleanup_inner(&mut self) -> Result<()> {
		if self.cleaned {
			return Ok(());
		}

		cleanup_database(&self.name, &self.admin_options).await?;

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let name = self.name.clone();
		let admin_options = self.admin_options.clone();
		let cleanup_thread = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Test database cleanup failed: {err}.");

					return;
				},
			};

			if let Err(err) = runtime.block_on(cleanup_database(&name, &admin_options)) {
				eprintln!("Test database cleanup failed: {err}.");
			}
		});
		let _ = cleanup_thread.join();
	}
}

pub fn env_dsn() -> Option<String> {
	env::var("VOX_PG_DSN").ok()
}

pub async fn with_test_db<F, Fut, T>(base_dsn: &str, f: F) -> Result<T>
where
	F: FnOnce(&TestDatabase) -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let db = TestDatabase::new(base_dsn).await?;
	let result = f(&db).await;
	let mut db = db;

	if let Err(err) = db.cleanup_inner().await {
		eprintln!("Test database cleanup warning: {err}.");

		if result.is_ok() {
			return Err(err);
		}
	}

	result
}

pub fn product(reference: &str, designation: &str, brand: &str, category: &str) -> Product {
	Product {
		reference: reference.to_string(),
		designation: designation.to_string(),
		brand: brand.to_string(),
		category: category.to_string(),
		..Default::default()
	}
}

/// Three glass tubes from three brands.
pub fn glass_tubes() -> Vec<Product> {
	vec![
		Product {
			sub_category_1: "Tubes a essai".to_string(),
			..product("TV-001", "Tube verre borosilicate 10 ml", "CORNING", "Verrerie")
		},
		Product {
			sub_category_1: "Tubes a essai".to_string(),
			..product("TV-002", "Tube verre a bord droit", "DURAN", "Verrerie")
		},
		Product {
			sub_category_1: "Tubes a centrifuger".to_string(),
			..product("TV-003", "Tube verre conique", "KIMBLE", "Verrerie")
		},
	]
}

/// Twelve glass tubes, four from each of three brands, spread over two categories.
pub fn crowded_glass_tubes() -> Vec<Product> {
	let brands = ["CORNING", "DURAN", "KIMBLE"];
	let categories = ["Verrerie", "Consommables"];

	(0..12)
		.map(|idx| Product {
			description: format!("Lot de {} pieces", (idx + 1) * 10),
			sub_category_1: if idx < 6 { "Tubes a essai" } else { "Tubes a centrifuger" }
				.to_string(),
			..product(
				&format!("TV-{:03}", idx + 100),
				&format!("Tube verre modele {}", idx + 1),
				brands[idx % brands.len()],
				categories[idx % categories.len()],
			)
		})
		.collect()
}

/// Products that do not match glass tube queries.
pub fn unrelated_products() -> Vec<Product> {
	vec![
		product("BP-001", "Becher forme basse 250 ml", "DURAN", "Verrerie"),
		product("GN-001", "Gants nitrile poudres", "FISHERBRAND", "Protection"),
		Product {
			description: "Flacon en polypropylene".to_string(),
			..product("FL-001", "Flacon de laboratoire", "NALGENE", "Flaconnage")
		},
	]
}

async fn connect_admin(
	base_options: &PgConnectOptions,
) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last_err = None;

	for database in ADMIN_DATABASES {
		let options = base_options.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => {
				last_err = Some(err);
			},
		}
	}

	Err(Error::Message(format!("Failed to connect to an admin database: {last_err:?}.")))
}

async fn cleanup_database(name: &str, admin_options: &PgConnectOptions) -> Result<()> {
	let conn = PgConnection::connect_with(admin_options).await.map_err(|err| {
		Error::Message(format!("Failed to connect to admin database for cleanup: {err}."))
	})?;
	let drop_sql = format!(r#"DROP DATABASE IF EXISTS "{}""#, name);
	let mut conn = conn;
	let _ = sqlx::query(
		"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.fetch_all(&mut conn)
	.await;

	sqlx::query(drop_sql.as_str())
		.execute(&mut conn)
		.await
		.map_err(|err| Error::Message(format!("Failed to drop test database: {err}.")))?;

	Ok(())
}
