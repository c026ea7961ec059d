use serde::{Deserialize, Serialize};

/// Fields a query keyword may match. `reference` and `manufacturer_reference` are
/// identifiers and are not searched.
pub const SEARCHABLE_FIELDS: [Field; 7] = [
	Field::Designation,
	Field::Description,
	Field::Brand,
	Field::Category,
	Field::SubCategory1,
	Field::SubCategory2,
	Field::SubCategory3,
];

/// One catalog entry. Read-only to search; written only by the import path.
///
/// Deserialization accepts both the snake_case names and the column headers of
/// the source spreadsheet export.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Product {
	#[serde(default, alias = "Reference")]
	pub reference: String,
	#[serde(default, alias = "Designation")]
	pub designation: String,
	#[serde(default, alias = "Description")]
	pub description: String,
	#[serde(default, alias = "Marque")]
	pub brand: String,
	#[serde(default, alias = "Categorie racine", alias = "Categorie")]
	pub category: String,
	#[serde(default, alias = "subCategory1", alias = "Sous-categorie 1")]
	pub sub_category_1: String,
	#[serde(default, alias = "subCategory2", alias = "Sous-categorie 2")]
	pub sub_category_2: String,
	#[serde(default, alias = "subCategory3", alias = "Sous-categorie 3")]
	pub sub_category_3: String,
	#[serde(default, alias = "manufacturerReference", alias = "Reference fabricant")]
	pub manufacturer_reference: String,
}
impl Product {
	pub fn field(&self, field: Field) -> &str {
		match field {
			Field::Reference => &self.reference,
			Field::Designation => &self.designation,
			Field::Description => &self.description,
			Field::Brand => &self.brand,
			Field::Category => &self.category,
			Field::SubCategory1 => &self.sub_category_1,
			Field::SubCategory2 => &self.sub_category_2,
			Field::SubCategory3 => &self.sub_category_3,
			Field::ManufacturerReference => &self.manufacturer_reference,
		}
	}

	/// A product must carry a reference or a designation to be stored.
	pub fn is_identifiable(&self) -> bool {
		!self.reference.trim().is_empty() || !self.designation.trim().is_empty()
	}
}

/// Result of a relevance query: the product and its score when one was computed.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ScoredProduct {
	#[serde(flatten)]
	pub product: Product,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub score: Option<f32>,
}
impl From<Product> for ScoredProduct {
	fn from(product: Product) -> Self {
		Self { product, score: None }
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
	Reference,
	Designation,
	Description,
	Brand,
	Category,
	SubCategory1,
	SubCategory2,
	SubCategory3,
	ManufacturerReference,
}
impl Field {
	/// Column name in the `products` table.
	pub fn column(self) -> &'static str {
		match self {
			Self::Reference => "reference",
			Self::Designation => "designation",
			Self::Description => "description",
			Self::Brand => "brand",
			Self::Category => "category",
			Self::SubCategory1 => "sub_category_1",
			Self::SubCategory2 => "sub_category_2",
			Self::SubCategory3 => "sub_category_3",
			Self::ManufacturerReference => "manufacturer_reference",
		}
	}
}
