/*!
Formulas for regression metrics. Each function returns a [`Formula`](../enum.Formula.html) to construct an [`Accumulator`](../struct.Accumulator.html) or [`Metric`](../struct.Metric.html) with.
*/

use super::Formula;
use itertools::izip;
use ndarray::prelude::*;

/// The mean squared error is the mean of squared differences between the prediction and the target.
pub fn mean_squared_error() -> Formula {
	Formula::Sum {
		name: "MeanSquaredError",
		components: 1,
		contribution: sum_of_squared_errors,
		combine: mean,
	}
}

/// The root mean squared error is the square root of the mean squared error.
pub fn root_mean_squared_error() -> Formula {
	Formula::Sum {
		name: "RootMeanSquaredError",
		components: 1,
		contribution: sum_of_squared_errors,
		combine: |sums, count| mean(sums, count).sqrt(),
	}
}

/// The mean absolute error is the mean of absolute differences between the prediction and the target.
pub fn mean_absolute_error() -> Formula {
	Formula::Sum {
		name: "MeanAbsoluteError",
		components: 1,
		contribution: sum_of_absolute_errors,
		combine: mean,
	}
}

/// The manhattan distance is the sum of absolute differences between the prediction and the target.
pub fn manhattan_distance() -> Formula {
	Formula::Sum {
		name: "ManhattanDistance",
		components: 1,
		contribution: sum_of_absolute_errors,
		combine: |sums, _| sums[0],
	}
}

/**
The median absolute error is the median of absolute differences between the prediction and the target. [Learn more](https://arxiv.org/abs/1809.03006).

Every absolute error is retained until the metric is reset, so memory grows with the number of samples seen.
*/
pub fn median_absolute_error() -> Formula {
	Formula::Gather {
		name: "MedianAbsoluteError",
		values: absolute_errors,
		combine: median,
	}
}

/**
The median absolute percentage error is the median of `100 * |target - prediction| / |target|`. A sample whose target is zero has an infinite error, or NaN if its prediction is zero as well. NaN sorts above infinity, so such samples pull the median up.

Every percentage error is retained until the metric is reset, so memory grows with the number of samples seen.
*/
pub fn median_absolute_percentage_error() -> Formula {
	Formula::Gather {
		name: "MedianAbsolutePercentageError",
		values: absolute_percentage_errors,
		combine: median,
	}
}

/// Compute the median of `values`, sorting them in place. The median of an even number of values is the mean of the two middle values. The median of no values is NaN.
pub fn median(values: &mut [f64]) -> f64 {
	if values.is_empty() {
		return f64::NAN;
	}
	values.sort_unstable_by(|a, b| a.total_cmp(b));
	let middle = values.len() / 2;
	if values.len() % 2 == 0 {
		(values[middle - 1] + values[middle]) / 2.0
	} else {
		values[middle]
	}
}

fn mean(sums: ArrayView1<f64>, count: u64) -> f64 {
	sums[0] / count as f64
}

fn sum_of_squared_errors(prediction: ArrayView1<f64>, target: ArrayView1<f64>) -> Array1<f64> {
	let sum = izip!(prediction, target)
		.map(|(prediction, target)| (target - prediction).powi(2))
		.sum::<f64>();
	arr1(&[sum])
}

fn sum_of_absolute_errors(prediction: ArrayView1<f64>, target: ArrayView1<f64>) -> Array1<f64> {
	let sum = izip!(prediction, target)
		.map(|(prediction, target)| (target - prediction).abs())
		.sum::<f64>();
	arr1(&[sum])
}

fn absolute_errors(prediction: ArrayView1<f64>, target: ArrayView1<f64>) -> Array1<f64> {
	izip!(prediction, target)
		.map(|(prediction, target)| (target - prediction).abs())
		.collect()
}

fn absolute_percentage_errors(prediction: ArrayView1<f64>, target: ArrayView1<f64>) -> Array1<f64> {
	izip!(prediction, target)
		.map(|(prediction, target)| 100.0 * (target - prediction).abs() / target.abs())
		.collect()
}

#[test]
fn test_median() {
	assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
	assert_eq!(median(&mut [0.75, 0.0, 1.25, 0.25, 1.0, 0.5]), 0.625);
	assert_eq!(median(&mut [4.0]), 4.0);
	assert!(median(&mut []).is_nan());
}

#[test]
fn test_contributions() {
	let prediction = arr1(&[1.0, 2.0, 4.0]);
	let target = arr1(&[2.0, 2.0, 2.0]);
	assert_eq!(
		sum_of_squared_errors(prediction.view(), target.view()),
		arr1(&[5.0])
	);
	assert_eq!(
		sum_of_absolute_errors(prediction.view(), target.view()),
		arr1(&[3.0])
	);
	assert_eq!(
		absolute_percentage_errors(prediction.view(), target.view()),
		arr1(&[50.0, 0.0, 100.0])
	);
}

#[test]
fn test_zero_target_percentage_errors() {
	let errors = absolute_percentage_errors(arr1(&[1.0, 0.0]).view(), arr1(&[0.0, 0.0]).view());
	assert_eq!(errors[0], f64::INFINITY);
	assert!(errors[1].is_nan());
	let mut values = [f64::NAN, f64::INFINITY, 1.0];
	assert_eq!(median(&mut values), f64::INFINITY);
	assert!(values[2].is_nan());
}
