use rand::{SeedableRng, rngs::StdRng, seq::index};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleMode {
	/// The first `amount` items in order.
	First,
	/// A uniform sample without replacement. The same seed yields the same sample.
	Random { seed: Option<u64> },
}

/// Picks up to `amount` items from `items`. Never repeats an item.
pub fn pick<T>(items: &[T], amount: usize, mode: SampleMode) -> Vec<&T> {
	let amount = amount.min(items.len());

	match mode {
		SampleMode::First => items.iter().take(amount).collect(),
		SampleMode::Random { seed } => {
			let mut rng = match seed {
				Some(seed) => StdRng::seed_from_u64(seed),
				None => StdRng::from_os_rng(),
			};

			index::sample(&mut rng, items.len(), amount).into_iter().map(|idx| &items[idx]).collect()
		},
	}
}
