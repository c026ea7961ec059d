pub mod brand;
pub mod facets;
pub mod fold;
pub mod keywords;
pub mod levenshtein;
pub mod normalizer;
pub mod predicate;
pub mod product;
pub mod sampling;

mod error;

pub use error::{Error, Result};
pub use predicate::Predicate;
pub use product::{Field, Product, SEARCHABLE_FIELDS, ScoredProduct};
