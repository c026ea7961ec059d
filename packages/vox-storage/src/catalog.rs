//! Catalog queries against the `products` table.

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use vox_config::SearchFuzzy;
use vox_domain::{
	Field, Predicate, Product, SEARCHABLE_FIELDS, ScoredProduct, normalizer::QueryVariant,
};

use crate::{
	Error, Result,
	models::{CatalogStats, ImportReport, ProductRow, ScoredProductRow},
};

pub const IMPORT_BATCH_SIZE: usize = 1_000;

const PRODUCT_COLUMNS: &str = "\
p.reference, p.designation, p.description, p.brand, p.category, p.sub_category_1, \
p.sub_category_2, p.sub_category_3, p.manufacturer_reference";

/// Products matching `predicate`, in catalog order. Unbounded.
pub async fn find_matching(pool: &PgPool, predicate: &Predicate) -> Result<Vec<Product>> {
	let mut builder = QueryBuilder::<Postgres>::new("SELECT ");

	builder.push(PRODUCT_COLUMNS).push(" FROM products p WHERE ");
	push_predicate(&mut builder, predicate);
	builder.push(" ORDER BY p.seq");

	let rows: Vec<ProductRow> = builder.build_query_as().fetch_all(pool).await?;

	Ok(rows.into_iter().map(Product::from).collect())
}

/// Boosted-OR relevance search.
///
/// Each variant is tokenized the same way as the product text (unaccented `simple`
/// configuration). A product scores `weight` for every variant term it contains and
/// half of that when the term only matches within the fuzzy bounds.
///
/// Candidates come from `product_terms` first: exact terms through the primary key,
/// fuzzy terms through a prefix range on the same index. Only candidate rows are
/// tokenized and scored.
pub async fn text_search(
	pool: &PgPool,
	variants: &[QueryVariant],
	fields: &[Field],
	fuzzy: &SearchFuzzy,
) -> Result<Vec<ScoredProduct>> {
	if fields.is_empty() {
		return Err(Error::InvalidArgument("text search needs at least one field.".to_string()));
	}
	if let Some(field) = fields.iter().find(|field| !SEARCHABLE_FIELDS.contains(*field)) {
		return Err(Error::InvalidArgument(format!(
			"{} is not covered by the term index.",
			field.column()
		)));
	}
	if variants.is_empty() {
		return Ok(Vec::new());
	}

	let texts = variants.iter().map(|variant| variant.text.clone()).collect::<Vec<_>>();
	let weights = variants.iter().map(|variant| variant.weight).collect::<Vec<_>>();
	let fuzzy_flags = variants
		.iter()
		.map(|variant| variant.text.chars().count() >= fuzzy.min_variant_chars)
		.collect::<Vec<_>>();
	let document = document_expr(fields);
	let sql = format!(
		"\
WITH variant_terms AS (
	SELECT DISTINCT v.ord, v.weight, v.fuzzy, term COLLATE \"C\" AS term
	FROM unnest($1::text[], $2::real[], $3::bool[]) WITH ORDINALITY AS v(body, weight, fuzzy, ord)
	CROSS JOIN LATERAL unnest(tsvector_to_array(to_tsvector('simple', unaccent(v.body)))) AS term
),
candidates AS (
	SELECT DISTINCT pt.reference
	FROM variant_terms t
	JOIN product_terms pt ON pt.term = t.term
	UNION
	SELECT DISTINCT pt.reference
	FROM variant_terms t
	JOIN product_terms pt
		ON t.fuzzy
		AND pt.term >= left(t.term, $4)
		AND pt.term < left(t.term, $4) || U&'\\+10FFFF'
		AND levenshtein(pt.term, t.term) <= $5
),
document_terms AS (
	SELECT p.reference, lexeme COLLATE \"C\" AS lexeme
	FROM candidates c
	JOIN products p ON p.reference = c.reference
	CROSS JOIN LATERAL unnest(tsvector_to_array(to_tsvector('simple', {document}))) AS lexeme
),
term_hits AS (
	SELECT
		d.reference,
		t.ord,
		t.term,
		t.weight * max(CASE WHEN d.lexeme = t.term THEN 1.0::real ELSE 0.5::real END) AS points
	FROM document_terms d
	JOIN variant_terms t
		ON d.lexeme = t.term
		OR (
			t.fuzzy
			AND left(d.lexeme, $4) = left(t.term, $4)
			AND levenshtein(d.lexeme, t.term) <= $5
		)
	GROUP BY d.reference, t.ord, t.term, t.weight
),
scores AS (
	SELECT reference, sum(points)::real AS score
	FROM term_hits
	GROUP BY reference
)
SELECT {PRODUCT_COLUMNS}, s.score
FROM scores s
JOIN products p ON p.reference = s.reference
ORDER BY s.score DESC, p.seq"
	);
	let rows: Vec<ScoredProductRow> = sqlx::query_as(&sql)
		.bind(texts)
		.bind(weights)
		.bind(fuzzy_flags)
		.bind(fuzzy.prefix_length as i32)
		.bind(fuzzy.max_edits as i32)
		.fetch_all(pool)
		.await
		.map_err(Error::from_text_search)?;

	Ok(rows.into_iter().map(ScoredProduct::from).collect())
}

/// Rebuilds the `product_terms` rows of the given products.
pub async fn index_terms(conn: &mut PgConnection, references: &[String]) -> Result<u64> {
	sqlx::query("DELETE FROM product_terms WHERE reference = ANY($1)")
		.bind(references)
		.execute(&mut *conn)
		.await
		.map_err(Error::from_text_search)?;

	let sql = format!(
		"\
INSERT INTO product_terms (term, reference)
SELECT DISTINCT lexeme, p.reference
FROM products p
CROSS JOIN LATERAL unnest(tsvector_to_array(to_tsvector('simple', {document}))) AS lexeme
WHERE p.reference = ANY($1)
ON CONFLICT DO NOTHING",
		document = document_expr(&SEARCHABLE_FIELDS)
	);
	let inserted = sqlx::query(&sql)
		.bind(references)
		.execute(&mut *conn)
		.await
		.map_err(Error::from_text_search)?;

	Ok(inserted.rows_affected())
}

fn document_expr(fields: &[Field]) -> String {
	let columns =
		fields.iter().map(|field| format!("p.{}", field.column())).collect::<Vec<_>>().join(", ");

	format!("unaccent(concat_ws(' ', {columns}))")
}

pub async fn count_products(pool: &PgPool) -> Result<i64> {
	let count: i64 = sqlx::query_scalar("SELECT count(*) FROM products").fetch_one(pool).await?;

	Ok(count)
}

pub async fn stats(pool: &PgPool) -> Result<CatalogStats> {
	let stats = sqlx::query_as::<_, CatalogStats>(
		"\
SELECT
	count(*) AS total,
	count(*) FILTER (WHERE btrim(brand) <> '') AS with_brand,
	count(*) FILTER (WHERE btrim(designation) <> '') AS with_designation,
	count(*) FILTER (WHERE btrim(reference) <> '') AS with_reference
FROM products",
	)
	.fetch_one(pool)
	.await?;

	Ok(stats)
}

/// Writes `products` in batches, upserting on `reference`.
///
/// Nothing is written when the table already holds products unless `replace` is set,
/// in which case the existing rows are removed in the same transaction.
pub async fn import_products(
	pool: &PgPool,
	products: Vec<Product>,
	replace: bool,
) -> Result<ImportReport> {
	let (accepted, rejected) = prepare_import(products);
	let existing = count_products(pool).await?;

	if existing > 0 && !replace {
		tracing::info!(existing, "Catalog already populated. Skipping import.");

		return Ok(ImportReport { imported: 0, rejected, skipped_existing: true });
	}

	let mut tx = pool.begin().await?;

	if replace {
		sqlx::query("DELETE FROM products").execute(&mut *tx).await?;
	}

	for (batch_idx, batch) in accepted.chunks(IMPORT_BATCH_SIZE).enumerate() {
		let mut builder = QueryBuilder::<Postgres>::new(
			"INSERT INTO products (reference, designation, description, brand, category, \
			 sub_category_1, sub_category_2, sub_category_3, manufacturer_reference) ",
		);

		builder.push_values(batch, |mut row, product| {
			row.push_bind(product.reference.clone())
				.push_bind(product.designation.clone())
				.push_bind(product.description.clone())
				.push_bind(product.brand.clone())
				.push_bind(product.category.clone())
				.push_bind(product.sub_category_1.clone())
				.push_bind(product.sub_category_2.clone())
				.push_bind(product.sub_category_3.clone())
				.push_bind(product.manufacturer_reference.clone());
		});
		builder.push(
			" ON CONFLICT (reference) DO UPDATE SET \
			 designation = EXCLUDED.designation, \
			 description = EXCLUDED.description, \
			 brand = EXCLUDED.brand, \
			 category = EXCLUDED.category, \
			 sub_category_1 = EXCLUDED.sub_category_1, \
			 sub_category_2 = EXCLUDED.sub_category_2, \
			 sub_category_3 = EXCLUDED.sub_category_3, \
			 manufacturer_reference = EXCLUDED.manufacturer_reference, \
			 imported_at = now()",
		);
		builder.build().execute(&mut *tx).await?;

		let references = batch.iter().map(|product| product.reference.clone()).collect::<Vec<_>>();
		let terms = index_terms(&mut *tx, &references).await?;

		tracing::debug!(batch = batch_idx + 1, size = batch.len(), terms, "Imported product batch.");
	}

	tx.commit().await?;

	Ok(ImportReport { imported: accepted.len(), rejected, skipped_existing: false })
}

/// Drops records that carry neither a reference nor a designation, fills in missing
/// references, trims every field and keeps the last record for each reference.
pub fn prepare_import(products: Vec<Product>) -> (Vec<Product>, usize) {
	let mut rejected = 0;
	let mut accepted: Vec<Product> = Vec::with_capacity(products.len());
	let mut positions: HashMap<String, usize> = HashMap::new();

	for product in products {
		if !product.is_identifiable() {
			rejected += 1;

			continue;
		}

		let mut product = trim_product(product);

		if product.reference.is_empty() {
			product.reference = derived_reference(&product.designation);
		}

		match positions.get(&product.reference) {
			Some(&idx) => accepted[idx] = product,
			None => {
				positions.insert(product.reference.clone(), accepted.len());
				accepted.push(product);
			},
		}
	}

	(accepted, rejected)
}

/// Stable stand-in key for records that only carry a designation.
pub fn derived_reference(designation: &str) -> String {
	let slug = vox_domain::fold::fold_lower(designation)
		.split(|ch: char| !ch.is_alphanumeric())
		.filter(|part| !part.is_empty())
		.collect::<Vec<_>>()
		.join("-");

	format!("noref-{slug}")
}

fn trim_product(product: Product) -> Product {
	Product {
		reference: product.reference.trim().to_string(),
		designation: product.designation.trim().to_string(),
		description: product.description.trim().to_string(),
		brand: product.brand.trim().to_string(),
		category: product.category.trim().to_string(),
		sub_category_1: product.sub_category_1.trim().to_string(),
		sub_category_2: product.sub_category_2.trim().to_string(),
		sub_category_3: product.sub_category_3.trim().to_string(),
		manufacturer_reference: product.manufacturer_reference.trim().to_string(),
	}
}

fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
	match predicate {
		Predicate::Contains(field, needle) => {
			builder
				.push("p.")
				.push(field.column())
				.push(" ILIKE ")
				.push_bind(format!("%{}%", escape_like(needle)));
		},
		Predicate::Equals(field, value) => {
			builder
				.push("lower(btrim(p.")
				.push(field.column())
				.push(")) = lower(btrim(")
				.push_bind(value.clone())
				.push("))");
		},
		Predicate::And(parts) => push_group(builder, parts, " AND ", "TRUE"),
		Predicate::Or(parts) => push_group(builder, parts, " OR ", "FALSE"),
	}
}

fn push_group(
	builder: &mut QueryBuilder<'_, Postgres>,
	parts: &[Predicate],
	separator: &str,
	identity: &str,
) {
	if parts.is_empty() {
		builder.push(identity);

		return;
	}

	builder.push("(");

	for (idx, part) in parts.iter().enumerate() {
		if idx > 0 {
			builder.push(separator);
		}

		push_predicate(builder, part);
	}

	builder.push(")");
}

fn escape_like(value: &str) -> String {
	let mut out = String::with_capacity(value.len());

	for ch in value.chars() {
		if matches!(ch, '\\' | '%' | '_') {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}

#[cfg(test)]
mod tests {
	use sqlx::{Postgres, QueryBuilder};

	use vox_config::SearchFuzzy;
	use vox_domain::{Field, Predicate, Product, SEARCHABLE_FIELDS, normalizer::QueryVariant};

	use super::{derived_reference, escape_like, prepare_import, push_predicate, text_search};
	use crate::Error;

	fn render(predicate: &Predicate) -> String {
		let mut builder = QueryBuilder::<Postgres>::new("");

		push_predicate(&mut builder, predicate);

		builder.sql().to_string()
	}

	#[test]
	fn like_metacharacters_are_escaped() {
		assert_eq!(escape_like(r"50%_a\b"), r"50\%\_a\\b");
	}

	#[test]
	fn empty_groups_render_identities() {
		assert_eq!(render(&Predicate::And(Vec::new())), "TRUE");
		assert_eq!(render(&Predicate::Or(Vec::new())), "FALSE");
	}

	#[test]
	fn keyword_predicate_renders_bound_ilike_clauses() {
		let keywords = vec!["verre".to_string()];
		let sql = render(
			&Predicate::all_keywords(&keywords, &SEARCHABLE_FIELDS)
				.and_maybe(Some(Predicate::Contains(Field::Brand, "CORNING".to_string()))),
		);

		assert!(sql.starts_with("((p.designation ILIKE $1 OR p.description ILIKE $2"));
		assert!(sql.ends_with("p.brand ILIKE $8)"));
	}

	#[test]
	fn import_rejects_unidentifiable_and_dedups_references() {
		let products = vec![
			Product { reference: "A".to_string(), designation: "First".to_string(), ..Default::default() },
			Product { brand: "CORNING".to_string(), ..Default::default() },
			Product { reference: " A ".to_string(), designation: "Second".to_string(), ..Default::default() },
			Product { designation: "Tube à essai".to_string(), ..Default::default() },
		];
		let (accepted, rejected) = prepare_import(products);

		assert_eq!(rejected, 1);
		assert_eq!(accepted.len(), 2);
		assert_eq!(accepted[0].designation, "Second");
		assert_eq!(accepted[1].reference, "noref-tube-a-essai");
	}

	#[test]
	fn derived_reference_is_stable() {
		assert_eq!(derived_reference("Bécher 250 ml"), derived_reference("becher  250 ML"));
	}

	#[tokio::test]
	async fn text_search_rejects_fields_outside_the_term_index() {
		let pool = sqlx::PgPool::connect_lazy("postgres://vox@127.0.0.1:1/unused")
			.expect("Lazy pool must build.");
		let variants = [QueryVariant { text: "tube".to_string(), weight: 3.0 }];
		let err = text_search(&pool, &variants, &[Field::Reference], &SearchFuzzy::default())
			.await
			.expect_err("Reference is not indexed.");

		assert!(matches!(err, Error::InvalidArgument(_)), "Unexpected error: {err}");

		let err = text_search(&pool, &variants, &[], &SearchFuzzy::default())
			.await
			.expect_err("Fields are required.");

		assert!(matches!(err, Error::InvalidArgument(_)), "Unexpected error: {err}");
	}
}
