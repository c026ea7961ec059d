use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Strips diacritics: canonical decomposition followed by removal of combining marks.
pub fn fold(input: &str) -> String {
	input.nfd().filter(|ch| !is_combining_mark(*ch)).collect()
}

/// Lower-cased, diacritic-free form used for whole-word comparisons.
pub fn fold_lower(input: &str) -> String {
	fold(input).to_lowercase()
}

#[cfg(test)]
mod tests {
	use super::{fold, fold_lower};

	#[test]
	fn strips_french_accents() {
		assert_eq!(fold("éprouvette graduée"), "eprouvette graduee");
		assert_eq!(fold("Bécher à bec"), "Becher a bec");
	}

	#[test]
	fn leaves_plain_ascii_untouched() {
		assert_eq!(fold("tube verre"), "tube verre");
	}

	#[test]
	fn fold_lower_lowercases() {
		assert_eq!(fold_lower("PIPETTE Graduée"), "pipette graduee");
	}
}
