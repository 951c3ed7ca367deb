/*!
This module defines the `Options` struct, which is used to configure a [`MetricSet`](../struct.MetricSet.html) from a config file.
*/

use super::{regression, Device, Error, Formula, Metric, MetricSet};
use tally_dist::GroupOptions;

#[derive(Debug, Default, serde::Deserialize)]
pub struct Options {
	pub device: Option<Device>,
	pub metrics: Option<Vec<MetricOptions>>,
	pub group: Option<GroupOptions>,
}

#[derive(Debug, serde::Deserialize)]
pub struct MetricOptions {
	/// The name results are reported under. Defaults to the kind's name.
	pub name: Option<String>,
	pub kind: MetricKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
pub enum MetricKind {
	#[serde(rename = "mse")]
	MeanSquaredError,
	#[serde(rename = "rmse")]
	RootMeanSquaredError,
	#[serde(rename = "mae")]
	MeanAbsoluteError,
	#[serde(rename = "manhattan")]
	ManhattanDistance,
	#[serde(rename = "median_ae")]
	MedianAbsoluteError,
	#[serde(rename = "median_ape")]
	MedianAbsolutePercentageError,
}

impl MetricKind {
	pub fn formula(self) -> Formula {
		match self {
			MetricKind::MeanSquaredError => regression::mean_squared_error(),
			MetricKind::RootMeanSquaredError => regression::root_mean_squared_error(),
			MetricKind::MeanAbsoluteError => regression::mean_absolute_error(),
			MetricKind::ManhattanDistance => regression::manhattan_distance(),
			MetricKind::MedianAbsoluteError => regression::median_absolute_error(),
			MetricKind::MedianAbsolutePercentageError => {
				regression::median_absolute_percentage_error()
			}
		}
	}

	pub fn default_name(self) -> &'static str {
		match self {
			MetricKind::MeanSquaredError => "mse",
			MetricKind::RootMeanSquaredError => "rmse",
			MetricKind::MeanAbsoluteError => "mae",
			MetricKind::ManhattanDistance => "manhattan",
			MetricKind::MedianAbsoluteError => "median_ae",
			MetricKind::MedianAbsolutePercentageError => "median_ape",
		}
	}
}

impl Options {
	/// Build the configured metrics. Without a `metrics` list, the set holds mean squared error and median absolute error.
	pub fn metric_set(&self) -> Result<MetricSet, Error> {
		let device = self.device.unwrap_or_default();
		let mut metric_set = MetricSet::new();
		match &self.metrics {
			Some(metrics) => {
				for metric in metrics {
					let name = metric
						.name
						.clone()
						.unwrap_or_else(|| metric.kind.default_name().to_owned());
					metric_set.attach(Metric::new(name, metric.kind.formula(), device))?;
				}
			}
			None => {
				for kind in [MetricKind::MeanSquaredError, MetricKind::MedianAbsoluteError].iter() {
					metric_set.attach(Metric::new(kind.default_name(), kind.formula(), device))?;
				}
			}
		}
		Ok(metric_set)
	}

	pub fn group_options(&self) -> GroupOptions {
		self.group.clone().unwrap_or_default()
	}
}

#[test]
fn test_options() {
	let options: Options = serde_json::from_str(
		r#"{
			"device": "cuda:0",
			"metrics": [
				{ "kind": "rmse" },
				{ "name": "mdae", "kind": "median_ae" }
			],
			"group": { "timeout_ms": 1000 }
		}"#,
	)
	.unwrap();
	let metric_set = options.metric_set().unwrap();
	let names: Vec<&str> = metric_set
		.metrics()
		.iter()
		.map(|metric| metric.name())
		.collect();
	assert_eq!(names, vec!["rmse", "mdae"]);
	assert!(metric_set
		.metrics()
		.iter()
		.all(|metric| metric.accumulator().device() == Device::Accelerator(0)));
	assert_eq!(
		options.group_options().timeout,
		Some(std::time::Duration::from_secs(1))
	);
}

#[test]
fn test_default_options() {
	let options = Options::default();
	let metric_set = options.metric_set().unwrap();
	let names: Vec<&str> = metric_set
		.metrics()
		.iter()
		.map(|metric| metric.name())
		.collect();
	assert_eq!(names, vec!["mse", "median_ae"]);
	assert_eq!(options.group_options(), GroupOptions::default());
}

#[test]
fn test_duplicate_names() {
	let options: Options = serde_json::from_str(
		r#"{ "metrics": [{ "kind": "mae" }, { "name": "mae", "kind": "mse" }] }"#,
	)
	.unwrap();
	assert!(matches!(
		options.metric_set(),
		Err(Error::DuplicateName(name)) if name == "mae"
	));
}
