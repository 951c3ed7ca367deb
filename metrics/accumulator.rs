use super::{Device, Error, Formula, StreamingMetric, Tensor};
use ndarray::prelude::*;
use tally_dist::{ProcessGroup, Reducer};

/// Log a warning when a gather formula retains this many values on one worker.
const RETAINED_VALUES_WARNING_THRESHOLD: u64 = 10_000_000;

/**
An `Accumulator` holds the running sufficient statistic of a [`Formula`](enum.Formula.html) on a device.

Updates only touch this worker's partial statistic. `compute()` reduces a copy of it across the process group, so calling `update()` after `compute()` and computing again never counts another worker's data twice. The computed value is kept until the next `reset()` or `update()`, so computing again in the same epoch does not run another collective.
*/
#[derive(Debug)]
pub struct Accumulator {
	formula: Formula,
	device: Device,
	state: State,
	computed: Option<f64>,
}

#[derive(Debug)]
enum State {
	Sum { sums: Tensor<f64>, count: u64 },
	Gather { chunks: Vec<Tensor<f64>>, count: u64 },
}

impl State {
	fn new(formula: &Formula, device: Device) -> State {
		match formula {
			Formula::Sum { components, .. } => State::Sum {
				sums: Tensor::zeros(&[*components], device),
				count: 0,
			},
			Formula::Gather { .. } => State::Gather {
				chunks: Vec::new(),
				count: 0,
			},
		}
	}

	/// Lay the statistic out as the buffer the reducer works on. A sum statistic is its sums followed by its count.
	fn to_buffer(&self) -> Vec<f64> {
		match self {
			State::Sum { sums, count } => sums
				.view()
				.into_iter()
				.cloned()
				.chain(std::iter::once(*count as f64))
				.collect(),
			State::Gather { chunks, .. } => chunks
				.iter()
				.flat_map(|chunk| chunk.view().into_iter().cloned())
				.collect(),
		}
	}
}

/// The number of examples in a batch of shape `(N,)` or `(N, 1)`.
fn batch_len(shape: &[usize]) -> Option<usize> {
	match shape {
		[n_examples] | [n_examples, 1] => Some(*n_examples),
		_ => None,
	}
}

impl Accumulator {
	pub fn new(formula: Formula, device: Device) -> Accumulator {
		Accumulator {
			state: State::new(&formula, device),
			formula,
			device,
			computed: None,
		}
	}

	pub fn formula(&self) -> &Formula {
		&self.formula
	}

	pub fn device(&self) -> Device {
		self.device
	}

	/// The number of samples this worker has seen since the last reset.
	pub fn count(&self) -> u64 {
		match &self.state {
			State::Sum { count, .. } => *count,
			State::Gather { count, .. } => *count,
		}
	}

	/// The running sums of a sum formula.
	pub fn sums(&self) -> Option<&Tensor<f64>> {
		match &self.state {
			State::Sum { sums, .. } => Some(sums),
			State::Gather { .. } => None,
		}
	}

	/// Whether any part of the statistic is attached to a differentiation graph. This is always false.
	pub fn requires_grad(&self) -> bool {
		match &self.state {
			State::Sum { sums, .. } => sums.requires_grad(),
			State::Gather { chunks, .. } => chunks.iter().any(|chunk| chunk.requires_grad()),
		}
	}
}

impl<'a> StreamingMetric<'a> for Accumulator {
	type Input = (&'a Tensor, &'a Tensor);
	type Output = f64;

	fn reset(&mut self) {
		self.state = State::new(&self.formula, self.device);
		self.computed = None;
	}

	fn update(&mut self, input: Self::Input) -> Result<(), Error> {
		let (prediction, target) = input;
		let n_examples = match (batch_len(prediction.shape()), batch_len(target.shape())) {
			(Some(n_predictions), Some(n_targets)) if n_predictions == n_targets => n_predictions,
			_ => {
				return Err(Error::ShapeMismatch {
					prediction: prediction.shape().to_owned(),
					target: target.shape().to_owned(),
				})
			}
		};
		if n_examples == 0 {
			return Ok(());
		}
		let prediction = prediction.detach();
		let target = target.detach();
		let prediction_values = prediction.flatten().mapv(f64::from);
		let target_values = target.flatten().mapv(f64::from);
		let name = self.formula.name();
		let device = self.device;
		match (&self.formula, &mut self.state) {
			(
				Formula::Sum {
					components,
					contribution,
					..
				},
				State::Sum { sums, count },
			) => {
				let contribution = contribution(prediction_values.view(), target_values.view());
				if contribution.len() != *components {
					return Err(Error::InvalidContribution {
						metric: name,
						expected: *components,
						actual: contribution.len(),
					});
				}
				let contribution =
					Tensor::derived(contribution, &[&prediction, &target]).to(device);
				sums.add_assign(&contribution);
				*count += n_examples as u64;
			}
			(Formula::Gather { values, .. }, State::Gather { chunks, count }) => {
				let values = values(prediction_values.view(), target_values.view());
				if values.len() != n_examples {
					return Err(Error::InvalidContribution {
						metric: name,
						expected: n_examples,
						actual: values.len(),
					});
				}
				chunks.push(Tensor::derived(values, &[&prediction, &target]).to(device));
				let previous_count = *count;
				*count += n_examples as u64;
				if previous_count < RETAINED_VALUES_WARNING_THRESHOLD
					&& *count >= RETAINED_VALUES_WARNING_THRESHOLD
				{
					log::warn!(
						"{} is retaining {} values, memory grows with every example until reset",
						name,
						count,
					);
				}
			}
			_ => unreachable!("the state is always built from the formula"),
		}
		self.computed = None;
		Ok(())
	}

	fn merge(&mut self, other: Self) -> Result<(), Error> {
		if !self.formula.is_compatible_with(&other.formula) {
			return Err(Error::FormulaMismatch {
				left: self.formula.name(),
				right: other.formula.name(),
			});
		}
		let device = self.device;
		match (&mut self.state, other.state) {
			(
				State::Sum { sums, count },
				State::Sum {
					sums: other_sums,
					count: other_count,
				},
			) => {
				sums.add_assign(&other_sums.to(device));
				*count += other_count;
			}
			(
				State::Gather { chunks, count },
				State::Gather {
					chunks: other_chunks,
					count: other_count,
				},
			) => {
				chunks.extend(other_chunks.into_iter().map(|chunk| chunk.to(device)));
				*count += other_count;
			}
			_ => unreachable!("compatible formulas build the same state"),
		}
		self.computed = None;
		Ok(())
	}

	fn compute(&mut self, group: &dyn ProcessGroup) -> Result<f64, Error> {
		if let Some(value) = self.computed {
			log::debug!("{} was already computed this epoch", self.formula.name());
			return Ok(value);
		}
		let buffer = self.state.to_buffer();
		let mut reduced = Reducer::new(group).reduce(self.formula.reduction(), buffer)?;
		let not_computable = Error::NotComputable {
			metric: self.formula.name(),
		};
		let value = match self.formula {
			Formula::Sum { combine, .. } => {
				let count = reduced.pop().unwrap_or(0.0) as u64;
				if count == 0 {
					return Err(not_computable);
				}
				combine(ArrayView1::from(reduced.as_slice()), count)
			}
			Formula::Gather { combine, .. } => {
				if reduced.is_empty() {
					return Err(not_computable);
				}
				combine(&mut reduced)
			}
		};
		self.computed = Some(value);
		Ok(value)
	}
}

#[cfg(test)]
fn scenario() -> (Tensor, Tensor) {
	let target: Vec<f32> = (0..6).map(|i| i as f32).collect();
	let prediction = target.iter().map(|target| target * 0.75).collect();
	(Tensor::from_vec(prediction), Tensor::from_vec(target))
}

#[test]
fn test_scenario() {
	use super::{regression, SingleProcess};
	let (prediction, target) = scenario();
	let mut mse = Accumulator::new(regression::mean_squared_error(), Device::Cpu);
	mse.update((&prediction, &target)).unwrap();
	let value = mse.compute(&SingleProcess).unwrap();
	assert!((value - 55.0 / 96.0).abs() < 1e-12);
	let mut median_absolute_error =
		Accumulator::new(regression::median_absolute_error(), Device::Cpu);
	median_absolute_error
		.update((&prediction, &target))
		.unwrap();
	assert_eq!(median_absolute_error.compute(&SingleProcess).unwrap(), 0.625);
	let mut mae = Accumulator::new(regression::mean_absolute_error(), Device::Cpu);
	mae.update((&prediction, &target)).unwrap();
	assert_eq!(mae.compute(&SingleProcess).unwrap(), 0.625);
}

#[test]
fn test_zero_sample() {
	use super::{regression, SingleProcess};
	let formulas = vec![
		regression::mean_squared_error(),
		regression::root_mean_squared_error(),
		regression::mean_absolute_error(),
		regression::manhattan_distance(),
		regression::median_absolute_error(),
		regression::median_absolute_percentage_error(),
	];
	for formula in formulas {
		let mut accumulator = Accumulator::new(formula, Device::Cpu);
		accumulator.reset();
		let error = accumulator.compute(&SingleProcess).unwrap_err();
		assert_eq!(
			error.to_string(),
			format!(
				"{} must have at least one example before it can be computed",
				formula.name()
			)
		);
		// an empty batch is not an example
		let empty = Tensor::from_vec(Vec::new());
		accumulator.update((&empty, &empty)).unwrap();
		assert!(matches!(
			accumulator.compute(&SingleProcess),
			Err(Error::NotComputable { .. })
		));
	}
}

#[test]
fn test_batch_size_invariance() {
	use super::{regression, SingleProcess};
	use rand::{Rng, SeedableRng};
	let mut rng = rand_xoshiro::Xoshiro256Plus::seed_from_u64(0);
	let prediction: Vec<f32> = (0..100).map(|_| rng.gen_range(0, 10) as f32).collect();
	let target: Vec<f32> = (0..100).map(|_| rng.gen_range(0, 10) as f32).collect();
	for formula in vec![
		regression::mean_squared_error(),
		regression::median_absolute_error(),
	] {
		let mut whole = Accumulator::new(formula, Device::Cpu);
		whole
			.update((
				&Tensor::from_vec(prediction.clone()),
				&Tensor::from_vec(target.clone()),
			))
			.unwrap();
		let mut batched = Accumulator::new(formula, Device::Cpu);
		for (prediction, target) in prediction.chunks(16).zip(target.chunks(16)) {
			batched
				.update((
					&Tensor::from_vec(prediction.to_owned()),
					&Tensor::from_vec(target.to_owned()),
				))
				.unwrap();
		}
		assert_eq!(batched.count(), 100);
		assert_eq!(
			whole.compute(&SingleProcess).unwrap(),
			batched.compute(&SingleProcess).unwrap()
		);
	}
	let expected = prediction
		.iter()
		.zip(target.iter())
		.map(|(prediction, target)| ((target - prediction) as f64).powi(2))
		.sum::<f64>()
		/ 100.0;
	let mut mse = Accumulator::new(regression::mean_squared_error(), Device::Cpu);
	mse.update((&Tensor::from_vec(prediction), &Tensor::from_vec(target)))
		.unwrap();
	assert_eq!(mse.compute(&SingleProcess).unwrap(), expected);
}

#[test]
fn test_column_shape() {
	use super::{regression, SingleProcess};
	let prediction = Tensor::from_array(arr2(&[[2.0f32], [-2.0]]));
	let target = Tensor::from_vec(vec![0.0f32, 0.0]);
	let mut mse = Accumulator::new(regression::mean_squared_error(), Device::Cpu);
	mse.update((&prediction, &target)).unwrap();
	assert_eq!(mse.compute(&SingleProcess).unwrap(), 4.0);
}

#[test]
fn test_shape_mismatch() {
	use super::{regression, SingleProcess};
	let (prediction, target) = scenario();
	let short = Tensor::from_vec(vec![1.0f32, 2.0]);
	let mut mse = Accumulator::new(regression::mean_squared_error(), Device::Cpu);
	mse.update((&prediction, &target)).unwrap();
	let sums = mse.sums().unwrap().flatten();
	let error = mse.update((&prediction, &short)).unwrap_err();
	match error {
		Error::ShapeMismatch { prediction, target } => {
			assert_eq!(prediction, vec![6]);
			assert_eq!(target, vec![2]);
		}
		error => panic!("unexpected error {}", error),
	}
	assert_eq!(mse.count(), 6);
	assert_eq!(mse.sums().unwrap().flatten(), sums);
	// nothing was computed yet, so this reads the statistic itself
	assert!((mse.compute(&SingleProcess).unwrap() - 55.0 / 96.0).abs() < 1e-12);
	let mut median_absolute_error =
		Accumulator::new(regression::median_absolute_error(), Device::Cpu);
	median_absolute_error
		.update((&prediction, &target))
		.unwrap();
	assert!(median_absolute_error
		.update((&short, &prediction))
		.is_err());
	assert_eq!(median_absolute_error.count(), 6);
	assert_eq!(median_absolute_error.compute(&SingleProcess).unwrap(), 0.625);
}

#[test]
fn test_batch_shapes() {
	use super::regression;
	let mut mse = Accumulator::new(regression::mean_squared_error(), Device::Cpu);
	let wide = Tensor::from_array(arr2(&[[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]]));
	let tall = Tensor::from_array(arr2(&[[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0]]));
	assert!(matches!(
		mse.update((&wide, &tall)),
		Err(Error::ShapeMismatch { .. })
	));
	let ones = Tensor::from_array(Array2::<f32>::ones((4, 2)));
	let zeros = Tensor::from_array(Array2::<f32>::zeros((4, 2)));
	assert!(matches!(
		mse.update((&ones, &zeros)),
		Err(Error::ShapeMismatch { .. })
	));
	let scalar = Tensor::from_array(arr0(1.0f32));
	assert!(matches!(
		mse.update((&scalar, &scalar)),
		Err(Error::ShapeMismatch { .. })
	));
	assert_eq!(mse.count(), 0);
	assert_eq!(mse.sums().unwrap().flatten(), arr1(&[0.0]));
	let column = Tensor::from_array(Array2::<f32>::ones((4, 1)));
	let flat = Tensor::from_vec(vec![0.0f32; 4]);
	mse.update((&column, &flat)).unwrap();
	assert_eq!(mse.count(), 4);
}

#[test]
fn test_invalid_contribution() {
	fn two_sums(_: ArrayView1<f64>, _: ArrayView1<f64>) -> Array1<f64> {
		arr1(&[1.0, 1.0])
	}
	fn first(sums: ArrayView1<f64>, _: u64) -> f64 {
		sums[0]
	}
	fn one_value(_: ArrayView1<f64>, _: ArrayView1<f64>) -> Array1<f64> {
		arr1(&[1.0])
	}
	let (prediction, target) = scenario();
	let mut sum = Accumulator::new(
		Formula::Sum {
			name: "Custom",
			components: 1,
			contribution: two_sums,
			combine: first,
		},
		Device::Cpu,
	);
	assert!(matches!(
		sum.update((&prediction, &target)),
		Err(Error::InvalidContribution {
			metric: "Custom",
			expected: 1,
			actual: 2,
		})
	));
	assert_eq!(sum.count(), 0);
	assert_eq!(sum.sums().unwrap().flatten(), arr1(&[0.0]));
	let mut gather = Accumulator::new(
		Formula::Gather {
			name: "Custom",
			values: one_value,
			combine: super::regression::median,
		},
		Device::Cpu,
	);
	assert!(matches!(
		gather.update((&prediction, &target)),
		Err(Error::InvalidContribution {
			metric: "Custom",
			expected: 6,
			actual: 1,
		})
	));
	assert_eq!(gather.count(), 0);
}

#[test]
fn test_accumulator_detached() {
	use super::regression;
	let prediction = Tensor::from_array(arr2(&[[2.0f32], [-2.0]])).with_requires_grad(true);
	let target = Tensor::from_vec(vec![0.0f32, 0.0]);
	for formula in vec![
		regression::mean_squared_error(),
		regression::median_absolute_error(),
	] {
		let mut accumulator = Accumulator::new(formula, Device::Cpu);
		accumulator.update((&prediction, &target)).unwrap();
		assert!(!accumulator.requires_grad());
	}
}

#[test]
fn test_accumulator_device() {
	use super::regression;
	let device = Device::Accelerator(1);
	let mut mse = Accumulator::new(regression::mean_squared_error(), device);
	assert_eq!(mse.sums().unwrap().device(), device);
	let prediction = Tensor::from_array(arr2(&[[2.0f32], [-2.0]]));
	let target = Tensor::from_vec(vec![0.0f32, 0.0]);
	mse.update((&prediction, &target)).unwrap();
	assert_eq!(mse.device(), device);
	assert_eq!(mse.sums().unwrap().device(), device);
	assert_eq!(mse.sums().unwrap().flatten(), arr1(&[8.0]));
}

#[test]
fn test_compute_is_idempotent() {
	use super::{regression, SingleProcess};
	let (prediction, target) = scenario();
	let mut mae = Accumulator::new(regression::mean_absolute_error(), Device::Cpu);
	mae.update((&prediction, &target)).unwrap();
	let first = mae.compute(&SingleProcess).unwrap();
	let second = mae.compute(&SingleProcess).unwrap();
	assert_eq!(first, second);
	assert_eq!(mae.count(), 6);
	mae.update((&prediction, &target)).unwrap();
	assert_eq!(mae.compute(&SingleProcess).unwrap(), first);
	assert_eq!(mae.count(), 12);
	mae.reset();
	assert_eq!(mae.count(), 0);
	assert!(mae.compute(&SingleProcess).is_err());
}

#[test]
fn test_merge() {
	use super::{regression, SingleProcess};
	let (prediction, target) = scenario();
	let prediction = prediction.flatten();
	let target = target.flatten();
	let (left_prediction, right_prediction) = prediction.view().split_at(Axis(0), 2);
	let (left_target, right_target) = target.view().split_at(Axis(0), 2);
	for formula in vec![
		regression::mean_absolute_error(),
		regression::median_absolute_error(),
	] {
		let mut left = Accumulator::new(formula, Device::Cpu);
		left.update((
			&Tensor::from_array(left_prediction.to_owned()),
			&Tensor::from_array(left_target.to_owned()),
		))
		.unwrap();
		let mut right = Accumulator::new(formula, Device::Cpu);
		right
			.update((
				&Tensor::from_array(right_prediction.to_owned()),
				&Tensor::from_array(right_target.to_owned()),
			))
			.unwrap();
		left.merge(right).unwrap();
		assert_eq!(left.count(), 6);
		assert_eq!(left.compute(&SingleProcess).unwrap(), 0.625);
	}
	let mut mse = Accumulator::new(regression::mean_squared_error(), Device::Cpu);
	let median_absolute_error = Accumulator::new(regression::median_absolute_error(), Device::Cpu);
	assert!(matches!(
		mse.merge(median_absolute_error),
		Err(Error::FormulaMismatch {
			left: "MeanSquaredError",
			right: "MedianAbsoluteError",
		})
	));
}

#[test]
fn test_merge_same_name() {
	use super::regression;
	fn squared_errors(prediction: ArrayView1<f64>, target: ArrayView1<f64>) -> Array1<f64> {
		(&target - &prediction).mapv(|error| error * error)
	}
	fn sums_and_maximum(prediction: ArrayView1<f64>, target: ArrayView1<f64>) -> Array1<f64> {
		let errors = squared_errors(prediction, target);
		arr1(&[errors.sum(), errors.fold(0.0, |a, b| a.max(*b))])
	}
	fn first(sums: ArrayView1<f64>, _: u64) -> f64 {
		sums[0]
	}
	let (prediction, target) = scenario();
	let mut sum = Accumulator::new(regression::mean_squared_error(), Device::Cpu);
	sum.update((&prediction, &target)).unwrap();
	let gather = Accumulator::new(
		Formula::Gather {
			name: "MeanSquaredError",
			values: squared_errors,
			combine: regression::median,
		},
		Device::Cpu,
	);
	assert!(matches!(
		sum.merge(gather),
		Err(Error::FormulaMismatch { .. })
	));
	let wide = Accumulator::new(
		Formula::Sum {
			name: "MeanSquaredError",
			components: 2,
			contribution: sums_and_maximum,
			combine: first,
		},
		Device::Cpu,
	);
	assert!(matches!(sum.merge(wide), Err(Error::FormulaMismatch { .. })));
	assert_eq!(sum.count(), 6);
	assert_eq!(sum.sums().unwrap().flatten(), arr1(&[3.4375]));
}

#[cfg(test)]
fn shard(rank: usize, world_size: usize, n_examples: usize) -> (Vec<f32>, Vec<f32>) {
	let shard_size = n_examples / world_size;
	let target: Vec<f32> = (rank * shard_size..(rank + 1) * shard_size)
		.map(|i| i as f32)
		.collect();
	let prediction = target.iter().map(|target| (target * 0.37).sin()).collect();
	(prediction, target)
}

#[test]
fn test_distributed_matches_single_worker() {
	use super::{regression, ChannelGroup, GroupOptions, SingleProcess};
	let world_size = 4;
	let n_examples = 1000;
	for formula in vec![
		regression::mean_squared_error(),
		regression::median_absolute_error(),
	] {
		let mut single = Accumulator::new(formula, Device::Cpu);
		for rank in 0..world_size {
			let (prediction, target) = shard(rank, world_size, n_examples);
			single
				.update((&Tensor::from_vec(prediction), &Tensor::from_vec(target)))
				.unwrap();
		}
		let expected = single.compute(&SingleProcess).unwrap();
		let results = ChannelGroup::run(world_size, &GroupOptions::default(), |group| {
			let (prediction, target) = shard(group.rank(), world_size, n_examples);
			let mut accumulator = Accumulator::new(formula, Device::Cpu);
			accumulator.reset();
			for (prediction, target) in prediction.chunks(10).zip(target.chunks(10)) {
				accumulator.update((
					&Tensor::from_vec(prediction.to_owned()),
					&Tensor::from_vec(target.to_owned()),
				))?;
			}
			assert_eq!(accumulator.count(), 250);
			accumulator.compute(group)
		});
		let values: Vec<f64> = results.into_iter().map(|result| result.unwrap()).collect();
		for value in values.iter() {
			assert_eq!(*value, values[0]);
			assert!((value - expected).abs() <= 1e-6 * expected.abs());
		}
	}
}

#[test]
fn test_distributed_empty_shard() {
	use super::{regression, ChannelGroup, GroupOptions};
	let results = ChannelGroup::run(3, &GroupOptions::default(), |group| {
		let mut accumulator = Accumulator::new(regression::median_absolute_error(), Device::Cpu);
		if group.rank() != 2 {
			let (prediction, target) = scenario();
			accumulator.update((&prediction, &target))?;
		}
		accumulator.compute(group)
	});
	for result in results {
		assert_eq!(result.unwrap(), 0.625);
	}
}

#[test]
fn test_distributed_not_computable() {
	use super::{regression, ChannelGroup, GroupOptions};
	let results = ChannelGroup::run(2, &GroupOptions::default(), |group| {
		let mut mse = Accumulator::new(regression::mean_squared_error(), Device::Cpu);
		mse.reset();
		mse.compute(group)
	});
	for result in results {
		assert!(matches!(
			result,
			Err(Error::NotComputable {
				metric: "MeanSquaredError"
			})
		));
	}
}

#[test]
fn test_distributed_no_double_counting() {
	use super::{regression, ChannelGroup, GroupOptions};
	let results = ChannelGroup::run(2, &GroupOptions::default(), |group| {
		let mut manhattan = Accumulator::new(regression::manhattan_distance(), Device::Cpu);
		let prediction = Tensor::from_vec(vec![1.0f32]);
		let target = Tensor::from_vec(vec![0.0f32]);
		manhattan.update((&prediction, &target))?;
		let first = manhattan.compute(group)?;
		manhattan.update((&prediction, &target))?;
		let second = manhattan.compute(group)?;
		Ok::<_, Error>((first, second))
	});
	for result in results {
		assert_eq!(result.unwrap(), (2.0, 4.0));
	}
}

#[test]
fn test_distributed_failure_keeps_state() {
	use super::{regression, ChannelGroup, GroupOptions, SingleProcess, SyncError};
	let results = ChannelGroup::run(2, &GroupOptions::default(), |group| {
		let mut mse = Accumulator::new(regression::mean_squared_error(), Device::Cpu);
		if group.rank() == 1 {
			return None;
		}
		let (prediction, target) = scenario();
		mse.update((&prediction, &target)).unwrap();
		let error = mse.compute(group).unwrap_err();
		Some((error, mse))
	});
	let mut results = results.into_iter();
	let (error, mut mse) = results.next().unwrap().unwrap();
	assert!(matches!(
		error,
		Error::DistributedSync(SyncError::Disconnected { peer: 1 })
	));
	assert_eq!(mse.count(), 6);
	let value = mse.compute(&SingleProcess).unwrap();
	assert!((value - 55.0 / 96.0).abs() < 1e-12);
}
