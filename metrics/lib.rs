/*!
This crate computes evaluation metrics such as [mean squared error](regression/fn.mean_squared_error.html) and [median absolute error](regression/fn.median_absolute_error.html) online, one batch at a time, and makes them consistent across workers that each evaluate a shard of the data.

An [`Accumulator`](struct.Accumulator.html) keeps the running sufficient statistic for a [`Formula`](enum.Formula.html). A [`Metric`](struct.Metric.html) names an accumulator and maps the evaluation loop's raw step output to a `(prediction, target)` pair. A [`MetricSet`](struct.MetricSet.html) drives several metrics through the same loop and reports their values by name.

The lifecycle is `reset()`, then `update()` once per batch, then `compute()`. `compute()` is the only operation that communicates: it reduces each worker's partial statistic over the [`ProcessGroup`](trait.ProcessGroup.html) it is given, so every rank gets the same value a single worker would have computed over all the data.

# Example

```
use tally_metrics::{regression, Device, Metric, SingleProcess, StreamingMetric, Tensor};

let mut mse = Metric::new("mse", regression::mean_squared_error(), Device::Cpu);
mse.reset();
let target = Tensor::from_vec(vec![0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0]);
let prediction = Tensor::from_vec(vec![0.0f32, 0.75, 1.5, 2.25, 3.0, 3.75]);
mse.update(&(prediction, target)).unwrap();
let value = mse.compute(&SingleProcess).unwrap();
assert!((value - 55.0 / 96.0).abs() < 1e-12);
```
*/

#![allow(clippy::tabs_in_doc_comments)]

mod accumulator;
mod formula;
mod metric;
mod metric_set;
mod options;
pub mod regression;
mod tensor;

pub use self::accumulator::Accumulator;
pub use self::formula::{Contribution, Formula};
pub use self::metric::Metric;
pub use self::metric_set::MetricSet;
pub use self::options::{MetricKind, MetricOptions, Options};
pub use self::tensor::{Device, ParseDeviceError, Tensor};
pub use tally_dist::{
	ChannelGroup, GroupOptions, ProcessGroup, Reducer, Reduction, SingleProcess, SyncError,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("prediction with shape {prediction:?} and target with shape {target:?} are not matching batches of shape (N,) or (N, 1)")]
	ShapeMismatch {
		prediction: Vec<usize>,
		target: Vec<usize>,
	},
	#[error("{metric} must have at least one example before it can be computed")]
	NotComputable { metric: &'static str },
	#[error("distributed synchronization failed: {0}")]
	DistributedSync(#[from] SyncError),
	#[error("{metric} produced {actual} values where {expected} were expected")]
	InvalidContribution {
		metric: &'static str,
		expected: usize,
		actual: usize,
	},
	#[error("cannot merge {left} with {right}")]
	FormulaMismatch {
		left: &'static str,
		right: &'static str,
	},
	#[error("a metric named {0:?} is already attached")]
	DuplicateName(String),
}

/**
The `StreamingMetric` trait defines a common interface to metrics that are computed from input that arrives in chunks, such as mean squared error over the batches of an evaluation loop.

After `reset()`, a value of type `T` implementing the `StreamingMetric` trait can have `update()` called on it with values of the associated type `Input`. Two values of `T` in the same process can be combined by calling `merge()`. When finished aggregating, call `compute()` with the process group to produce the associated type `Output`. Every rank of the group must call `compute()`, because it may run a collective.

# Examples

Here is a basic example implementation of a `Count` metric, which takes batch sizes as input and produces the total number of examples seen by all workers.

```
use tally_metrics::{Error, ProcessGroup, Reducer, Reduction, SingleProcess, StreamingMetric};

struct Count(u64);

impl StreamingMetric<'_> for Count {
	type Input = usize;
	type Output = u64;
	fn reset(&mut self) {
		self.0 = 0
	}
	fn update(&mut self, input: Self::Input) -> Result<(), Error> {
		self.0 += input as u64;
		Ok(())
	}
	fn merge(&mut self, other: Self) -> Result<(), Error> {
		self.0 += other.0;
		Ok(())
	}
	fn compute(&mut self, group: &dyn ProcessGroup) -> Result<Self::Output, Error> {
		let total = Reducer::new(group).reduce(Reduction::Sum, vec![self.0 as f64])?;
		Ok(total[0] as u64)
	}
}

let mut count = Count(0);
count.update(16).unwrap();
count.update(4).unwrap();
assert_eq!(count.compute(&SingleProcess).unwrap(), 20);
```

The seemingly unused generic lifetime `'a` exists here to allow `Input`s to borrow from their enclosing scope.
*/
pub trait StreamingMetric<'a> {
	/// `Input` is the type to aggregate in calls to `update()`.
	type Input;
	/// `Output` is the return type of `compute()`.
	type Output;
	/// Start a new epoch with an empty statistic.
	fn reset(&mut self);
	/// Update this streaming metric with the `Input` `input`. On error, the metric is unchanged.
	fn update(&mut self, input: Self::Input) -> Result<(), Error>;
	/// Merge a metric computed independently in the same process.
	fn merge(&mut self, other: Self) -> Result<(), Error>;
	/// Reduce the statistic across `group` and compute the final value.
	fn compute(&mut self, group: &dyn ProcessGroup) -> Result<Self::Output, Error>;
}
