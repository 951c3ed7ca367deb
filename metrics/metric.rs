use super::{Accumulator, Device, Error, Formula, StreamingMetric, Tensor};
use tally_dist::ProcessGroup;

/**
A `Metric` is a named [`Accumulator`](struct.Accumulator.html) that consumes the evaluation loop's raw step output `O`.

The output transform maps each step output to the `(prediction, target)` pair the formula consumes. It should be a pure function. This is useful, for example, when the model has several outputs and the metric is computed with respect to one of them. By default `O` is the pair itself.
*/
pub struct Metric<O = (Tensor, Tensor)> {
	name: String,
	accumulator: Accumulator,
	output_transform: Box<dyn Fn(&O) -> (Tensor, Tensor) + Send>,
}

impl Metric {
	pub fn new(name: impl Into<String>, formula: Formula, device: Device) -> Metric {
		Self::with_output_transform(
			name,
			formula,
			device,
			|(prediction, target): &(Tensor, Tensor)| (prediction.clone(), target.clone()),
		)
	}
}

impl<O> Metric<O> {
	pub fn with_output_transform<F>(
		name: impl Into<String>,
		formula: Formula,
		device: Device,
		output_transform: F,
	) -> Metric<O>
	where
		F: Fn(&O) -> (Tensor, Tensor) + Send + 'static,
	{
		Metric {
			name: name.into(),
			accumulator: Accumulator::new(formula, device),
			output_transform: Box::new(output_transform),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn accumulator(&self) -> &Accumulator {
		&self.accumulator
	}
}

impl<'a, O: 'a> StreamingMetric<'a> for Metric<O> {
	type Input = &'a O;
	type Output = f64;

	fn reset(&mut self) {
		self.accumulator.reset();
	}

	fn update(&mut self, output: Self::Input) -> Result<(), Error> {
		let (prediction, target) = (self.output_transform)(output);
		self.accumulator.update((&prediction, &target))
	}

	fn merge(&mut self, other: Self) -> Result<(), Error> {
		self.accumulator.merge(other.accumulator)
	}

	fn compute(&mut self, group: &dyn ProcessGroup) -> Result<f64, Error> {
		let value = self.accumulator.compute(group)?;
		log::debug!("{} = {}", self.name, value);
		Ok(value)
	}
}

impl<O> std::fmt::Debug for Metric<O> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Metric")
			.field("name", &self.name)
			.field("accumulator", &self.accumulator)
			.finish()
	}
}

#[test]
fn test_output_transform() {
	use super::{regression, SingleProcess};

	struct StepOutput {
		logits: Tensor,
		y_pred: Tensor,
		y: Tensor,
	}

	let mut metric = Metric::with_output_transform(
		"median_ae",
		regression::median_absolute_error(),
		Device::Cpu,
		|output: &StepOutput| (output.y_pred.clone(), output.y.clone()),
	);
	let output = StepOutput {
		logits: Tensor::from_vec(vec![100.0, 100.0, 100.0]),
		y_pred: Tensor::from_vec(vec![1.0, 2.0, 6.0]),
		y: Tensor::from_vec(vec![1.0, 1.0, 1.0]),
	};
	assert_eq!(output.logits.len(), 3);
	metric.reset();
	metric.update(&output).unwrap();
	assert_eq!(metric.name(), "median_ae");
	assert_eq!(metric.accumulator().count(), 3);
	assert_eq!(metric.compute(&SingleProcess).unwrap(), 1.0);
}
