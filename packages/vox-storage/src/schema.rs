pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../../../sql/00_extensions.sql")),
				"tables/001_products.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_products.sql")),
				"tables/002_product_terms.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_product_terms.sql")),
				_ => {
					out.push_str(line);
					out.push('\n');
				},
			}

			continue;
		}

		out.push_str(line);
		out.push('\n');
	}

	out
}
