use ndarray::prelude::*;
use tally_dist::Reduction;

/// Maps a flattened batch of predictions and targets to the batch's contribution to a statistic.
pub type Contribution = fn(ArrayView1<f64>, ArrayView1<f64>) -> Array1<f64>;

/**
A `Formula` is the pure part of a metric: what a batch contributes to the running statistic, and how the final value is computed from the statistic once it has been reduced across workers.

The variant selects the reduction. A `Sum` formula keeps `components` running sums and a sample count, all combined across workers by addition. A `Gather` formula keeps one value per sample, because statistics like the median cannot be combined without every value. The retained values grow with every sample seen, so memory use is proportional to the size of the evaluation set.
*/
#[derive(Clone, Copy)]
pub enum Formula {
	Sum {
		name: &'static str,
		/// The length of the array `contribution` returns.
		components: usize,
		contribution: Contribution,
		/// Compute the final value from the reduced sums and the reduced count, which is never zero.
		combine: fn(ArrayView1<f64>, u64) -> f64,
	},
	Gather {
		name: &'static str,
		/// Compute one value per sample.
		values: Contribution,
		/// Compute the final value from all retained values of all workers, which are never empty.
		combine: fn(&mut [f64]) -> f64,
	},
}

impl Formula {
	pub fn name(&self) -> &'static str {
		match self {
			Formula::Sum { name, .. } => *name,
			Formula::Gather { name, .. } => *name,
		}
	}

	pub fn reduction(&self) -> Reduction {
		match self {
			Formula::Sum { .. } => Reduction::Sum,
			Formula::Gather { .. } => Reduction::Gather,
		}
	}

	/// Statistics of two formulas can be merged when they have the same name, the same reduction, and the same number of components.
	pub fn is_compatible_with(&self, other: &Formula) -> bool {
		match (self, other) {
			(
				Formula::Sum {
					name, components, ..
				},
				Formula::Sum {
					name: other_name,
					components: other_components,
					..
				},
			) => name == other_name && components == other_components,
			(Formula::Gather { name, .. }, Formula::Gather { name: other_name, .. }) => {
				name == other_name
			}
			_ => false,
		}
	}
}

impl std::fmt::Debug for Formula {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Formula")
			.field("name", &self.name())
			.field("reduction", &self.reduction())
			.finish()
	}
}

#[test]
fn test_is_compatible_with() {
	fn zeros(_: ArrayView1<f64>, _: ArrayView1<f64>) -> Array1<f64> {
		arr1(&[0.0, 0.0])
	}
	fn first(sums: ArrayView1<f64>, _: u64) -> f64 {
		sums[0]
	}
	let mse = crate::regression::mean_squared_error();
	assert!(mse.is_compatible_with(&crate::regression::mean_squared_error()));
	let wide = Formula::Sum {
		name: "MeanSquaredError",
		components: 2,
		contribution: zeros,
		combine: first,
	};
	assert!(!mse.is_compatible_with(&wide));
	let gather = Formula::Gather {
		name: "MeanSquaredError",
		values: zeros,
		combine: crate::regression::median,
	};
	assert!(!mse.is_compatible_with(&gather));
	assert!(!gather.is_compatible_with(&mse));
}
