use serde::Serialize;

use vox_domain::{Product, ScoredProduct};

#[derive(Debug, sqlx::FromRow)]
pub struct ProductRow {
	pub reference: String,
	pub designation: String,
	pub description: String,
	pub brand: String,
	pub category: String,
	pub sub_category_1: String,
	pub sub_category_2: String,
	pub sub_category_3: String,
	pub manufacturer_reference: String,
}
impl From<ProductRow> for Product {
	fn from(row: ProductRow) -> Self {
		Self {
			reference: row.reference,
			designation: row.designation,
			description: row.description,
			brand: row.brand,
			category: row.category,
			sub_category_1: row.sub_category_1,
			sub_category_2: row.sub_category_2,
			sub_category_3: row.sub_category_3,
			manufacturer_reference: row.manufacturer_reference,
		}
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct ScoredProductRow {
	#[sqlx(flatten)]
	pub product: ProductRow,
	pub score: f32,
}
impl From<ScoredProductRow> for ScoredProduct {
	fn from(row: ScoredProductRow) -> Self {
		Self { product: row.product.into(), score: Some(row.score) }
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CatalogStats {
	pub total: i64,
	pub with_brand: i64,
	pub with_designation: i64,
	pub with_reference: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
	pub imported: usize,
	/// Records carrying neither a reference nor a designation.
	pub rejected: usize,
	/// Set when the catalog already held products and replacement was not requested.
	pub skipped_existing: bool,
}
