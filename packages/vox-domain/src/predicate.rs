use crate::product::{Field, Product};

/// Catalog filter understood by every store.
///
/// `Contains` is a case-insensitive substring match, `Equals` a case-insensitive
/// whole-value match. An empty `And` matches everything and an empty `Or` matches
/// nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
	Contains(Field, String),
	Equals(Field, String),
	And(Vec<Predicate>),
	Or(Vec<Predicate>),
}
impl Predicate {
	/// Every keyword must appear in at least one of `fields`.
	pub fn all_keywords(keywords: &[String], fields: &[Field]) -> Self {
		Self::And(keywords.iter().map(|keyword| Self::any_field(keyword, fields)).collect())
	}

	/// At least one keyword must appear in at least one of `fields`.
	pub fn any_keyword(keywords: &[String], fields: &[Field]) -> Self {
		Self::Or(keywords.iter().map(|keyword| Self::any_field(keyword, fields)).collect())
	}

	pub fn any_field(needle: &str, fields: &[Field]) -> Self {
		Self::Or(fields.iter().map(|field| Self::Contains(*field, needle.to_string())).collect())
	}

	/// Conjoins `self` with `other` when present.
	pub fn and_maybe(self, other: Option<Predicate>) -> Self {
		match other {
			Some(other) => match self {
				Self::And(mut parts) => {
					parts.push(other);

					Self::And(parts)
				},
				this => Self::And(vec![this, other]),
			},
			None => self,
		}
	}

	pub fn matches(&self, product: &Product) -> bool {
		match self {
			Self::Contains(field, needle) => contains_ignore_case(product.field(*field), needle),
			Self::Equals(field, value) =>
				product.field(*field).trim().to_lowercase() == value.trim().to_lowercase(),
			Self::And(parts) => parts.iter().all(|part| part.matches(product)),
			Self::Or(parts) => parts.iter().any(|part| part.matches(product)),
		}
	}
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
	haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
	use crate::{
		SEARCHABLE_FIELDS,
		predicate::Predicate,
		product::{Field, Product},
	};

	fn product(designation: &str, brand: &str) -> Product {
		Product {
			reference: "R".to_string(),
			designation: designation.to_string(),
			brand: brand.to_string(),
			..Default::default()
		}
	}

	#[test]
	fn all_keywords_requires_each_keyword() {
		let keywords = vec!["verre".to_string(), "tube".to_string()];
		let predicate = Predicate::all_keywords(&keywords, &SEARCHABLE_FIELDS);

		assert!(predicate.matches(&product("Tube en VERRE", "DURAN")));
		assert!(!predicate.matches(&product("Tube plastique", "DURAN")));
	}

	#[test]
	fn any_keyword_accepts_one_match() {
		let keywords = vec!["verre".to_string(), "tube".to_string()];
		let predicate = Predicate::any_keyword(&keywords, &SEARCHABLE_FIELDS);

		assert!(predicate.matches(&product("Tube plastique", "DURAN")));
		assert!(!predicate.matches(&product("Becher", "DURAN")));
	}

	#[test]
	fn empty_combinators_follow_identity_rules() {
		let item = product("Tube", "DURAN");

		assert!(Predicate::And(Vec::new()).matches(&item));
		assert!(!Predicate::Or(Vec::new()).matches(&item));
	}

	#[test]
	fn and_maybe_appends_brand_filter() {
		let keywords = vec!["tube".to_string()];
		let predicate = Predicate::all_keywords(&keywords, &SEARCHABLE_FIELDS)
			.and_maybe(Some(Predicate::Contains(Field::Brand, "corning".to_string())));

		assert!(predicate.matches(&product("Tube", "CORNING")));
		assert!(!predicate.matches(&product("Tube", "DURAN")));
	}

	#[test]
	fn equals_ignores_case_and_padding() {
		let predicate = Predicate::Equals(Field::Brand, " corning ".to_string());

		assert!(predicate.matches(&product("Tube", "CORNING")));
		assert!(!predicate.matches(&product("Tube", "CORNING LIFE")));
	}
}
