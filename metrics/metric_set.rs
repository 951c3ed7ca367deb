use super::{Error, Metric, StreamingMetric, Tensor};
use std::collections::BTreeMap;
use tally_dist::ProcessGroup;

/**
A `MetricSet` drives every attached [`Metric`](struct.Metric.html) through one evaluation loop and keeps their values by name.

Metrics are updated and computed in the order they were attached. Every rank must attach the same metrics in the same order so that their collectives line up.
*/
#[derive(Debug)]
pub struct MetricSet<O = (Tensor, Tensor)> {
	metrics: Vec<Metric<O>>,
	results: BTreeMap<String, f64>,
}

impl<O> Default for MetricSet<O> {
	fn default() -> Self {
		Self {
			metrics: Vec::new(),
			results: BTreeMap::new(),
		}
	}
}

impl<O> MetricSet<O> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn attach(&mut self, metric: Metric<O>) -> Result<(), Error> {
		if self
			.metrics
			.iter()
			.any(|attached| attached.name() == metric.name())
		{
			return Err(Error::DuplicateName(metric.name().to_owned()));
		}
		self.metrics.push(metric);
		Ok(())
	}

	pub fn metrics(&self) -> &[Metric<O>] {
		&self.metrics
	}

	/// Reset every metric and forget the previous epoch's results.
	pub fn reset(&mut self) {
		for metric in self.metrics.iter_mut() {
			metric.reset();
		}
		self.results.clear();
	}

	/// Update every metric with one step output. The first error is returned, and metrics attached after the failing one are not updated.
	pub fn update(&mut self, output: &O) -> Result<(), Error> {
		for metric in self.metrics.iter_mut() {
			metric.update(output)?;
		}
		Ok(())
	}

	/// Compute every metric. On success the results replace the previous ones.
	pub fn compute(&mut self, group: &dyn ProcessGroup) -> Result<&BTreeMap<String, f64>, Error> {
		let mut results = BTreeMap::new();
		for metric in self.metrics.iter_mut() {
			let value = metric.compute(group)?;
			results.insert(metric.name().to_owned(), value);
		}
		self.results = results;
		Ok(&self.results)
	}

	/// The values from the last successful `compute()`, keyed by metric name.
	pub fn results(&self) -> &BTreeMap<String, f64> {
		&self.results
	}
}

#[test]
fn test_metric_set() {
	use super::{regression, Device, SingleProcess};
	let mut metrics = MetricSet::new();
	metrics
		.attach(Metric::new(
			"mae",
			regression::mean_absolute_error(),
			Device::Cpu,
		))
		.unwrap();
	metrics
		.attach(Metric::new(
			"median_ae",
			regression::median_absolute_error(),
			Device::Cpu,
		))
		.unwrap();
	metrics
		.attach(Metric::new(
			"manhattan",
			regression::manhattan_distance(),
			Device::Cpu,
		))
		.unwrap();
	assert!(matches!(
		metrics.attach(Metric::new(
			"mae",
			regression::mean_squared_error(),
			Device::Cpu
		)),
		Err(Error::DuplicateName(_))
	));
	metrics.reset();
	let target: Vec<f32> = (0..6).map(|i| i as f32).collect();
	let prediction: Vec<f32> = target.iter().map(|target| target * 0.75).collect();
	for (prediction, target) in prediction.chunks(4).zip(target.chunks(4)) {
		let batch = (
			Tensor::from_vec(prediction.to_owned()),
			Tensor::from_vec(target.to_owned()),
		);
		metrics.update(&batch).unwrap();
	}
	let results = metrics.compute(&SingleProcess).unwrap();
	insta::assert_debug_snapshot!(results, @r###"
	{
	    "mae": 0.625,
	    "manhattan": 3.75,
	    "median_ae": 0.625,
	}
	"###);
	metrics.reset();
	assert!(metrics.results().is_empty());
	assert!(matches!(
		metrics.compute(&SingleProcess),
		Err(Error::NotComputable {
			metric: "MeanAbsoluteError"
		})
	));
}
