use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use clap::Parser;
use serde_json::Value;

use vox_domain::{Product, facets::FacetKind};
use vox_search::{Args, Command, Output};

fn write_temp_file(payload: String, extension: &str) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let mut path = env::temp_dir();

	path.push(format!("vox_search_test_{nanos}_{}_{ordinal}.{extension}", std::process::id()));

	fs::write(&path, payload).expect("Failed to write test file.");

	path
}

fn json_config(products: &[Product]) -> vox_config::Config {
	let catalog = serde_json::to_string(products).expect("Failed to serialize catalog.");
	let catalog_path = write_temp_file(catalog, "json");
	let payload = format!(
		"[service]\nlog_level = \"warn\"\n\n[catalog]\nbackend = \"json\"\njson_path = \"{}\"\n",
		catalog_path.display()
	);
	let config_path = write_temp_file(payload, "toml");

	vox_config::load(&config_path).expect("Failed to load test config.")
}

fn json_output(output: Output) -> Value {
	match output {
		Output::Json(value) => value,
		Output::Text(text) => panic!("Expected JSON output, got {text:?}."),
	}
}

fn parse(argv: &[&str]) -> Command {
	Args::try_parse_from(argv).expect("Arguments must parse.").command
}

#[test]
fn filter_type_accepts_hyphenated_names() {
	let command = parse(&[
		"vox-search",
		"-c",
		"vox.toml",
		"filter",
		"--response",
		"turn.json",
		"--type",
		"sub-category",
		"--value",
		"Tubes a essai",
	]);

	assert!(matches!(command, Command::Filter { filter_type: FacetKind::SubCategory, .. }));

	let unknown = Args::try_parse_from([
		"vox-search", "-c", "vox.toml", "filter", "-r", "t.json", "-t", "size", "-v", "x",
	]);

	assert!(unknown.is_err());
}

#[tokio::test]
async fn search_then_filter_through_files() {
	let first = json_output(
		vox_search::execute(
			json_config(&vox_testkit::crowded_glass_tubes()),
			parse(&["vox-search", "-c", "vox.toml", "search", "glass", "tubes"]),
		)
		.await
		.expect("Search must succeed."),
	);

	assert_eq!(first["step"], "needs_filter");
	assert_eq!(first["result_count"], 12);

	let response_path = write_temp_file(first.to_string(), "json");
	let response_arg = response_path.display().to_string();
	let second = json_output(
		vox_search::execute(
			json_config(&vox_testkit::crowded_glass_tubes()),
			parse(&[
				"vox-search",
				"-c",
				"vox.toml",
				"filter",
				"-r",
				&response_arg,
				"-t",
				"brand",
				"-v",
				"CORNING",
			]),
		)
		.await
		.expect("Filter must succeed."),
	);

	assert_eq!(second["step"], "final");
	assert_eq!(second["entry"], "apply_filter");
	assert_eq!(second["summaries"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn stats_report_the_json_catalog() {
	let stats = json_output(
		vox_search::execute(
			json_config(&vox_testkit::glass_tubes()),
			parse(&["vox-search", "-c", "vox.toml", "stats"]),
		)
		.await
		.expect("Stats must succeed."),
	);

	assert_eq!(stats["total"], 3);
	assert_eq!(stats["with_brand"], 3);
}

#[tokio::test]
async fn import_requires_postgres() {
	let err = vox_search::execute(
		json_config(&vox_testkit::glass_tubes()),
		parse(&["vox-search", "-c", "vox.toml", "import", "--file", "products.json"]),
	)
	.await
	.expect_err("Import into a JSON catalog must fail.");

	assert!(err.to_string().contains("postgres"), "Unexpected error: {err}");
}

#[tokio::test]
async fn schema_prints_sql() {
	let output = vox_search::execute(
		json_config(&[]),
		parse(&["vox-search", "-c", "vox.toml", "schema"]),
	)
	.await
	.expect("Schema must render.");

	match output {
		Output::Text(sql) => assert!(sql.contains("CREATE TABLE IF NOT EXISTS products")),
		Output::Json(value) => panic!("Expected SQL text, got {value}."),
	}
}
