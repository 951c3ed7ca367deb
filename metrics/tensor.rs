use ndarray::{prelude::*, ArcArray, IxDyn};
use num_traits::Zero;
use std::ops::AddAssign;
use thiserror::Error;

/// The compute surface a tensor lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Device {
	Cpu,
	Accelerator(usize),
}

impl Default for Device {
	fn default() -> Self {
		Device::Cpu
	}
}

impl std::fmt::Display for Device {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Device::Cpu => write!(f, "cpu"),
			Device::Accelerator(index) => write!(f, "cuda:{}", index),
		}
	}
}

#[derive(Debug, Error)]
#[error("parse device error")]
pub struct ParseDeviceError;

impl std::str::FromStr for Device {
	type Err = ParseDeviceError;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"cpu" => Ok(Device::Cpu),
			"cuda" => Ok(Device::Accelerator(0)),
			s => {
				let index = s.strip_prefix("cuda:").ok_or(ParseDeviceError)?;
				let index = index.parse().map_err(|_| ParseDeviceError)?;
				Ok(Device::Accelerator(index))
			}
		}
	}
}

impl serde::Serialize for Device {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(&self.to_string())
	}
}

impl<'de> serde::Deserialize<'de> for Device {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let value = String::deserialize(deserializer)?;
		value
			.parse()
			.map_err(|_| serde::de::Error::custom(format!("invalid device {:?}", value)))
	}
}

/**
A `Tensor` is the batch carrier metrics consume: an n-dimensional array tagged with the device it lives on and with whether it takes part in an active differentiation graph.

Cloning a tensor shares its data. The result of an operation requires grad if any of its inputs does, which is why metrics [`detach`](#method.detach) their inputs before accumulating.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor<T = f32> {
	data: ArcArray<T, IxDyn>,
	device: Device,
	requires_grad: bool,
}

impl<T> Tensor<T>
where
	T: Clone,
{
	/// Create a tensor on the cpu that does not require grad.
	pub fn from_array<D>(array: Array<T, D>) -> Self
	where
		D: Dimension,
	{
		Self {
			data: array.into_dyn().into_shared(),
			device: Device::Cpu,
			requires_grad: false,
		}
	}

	pub fn from_vec(values: Vec<T>) -> Self {
		Self::from_array(Array1::from(values))
	}

	pub fn zeros(shape: &[usize], device: Device) -> Self
	where
		T: Zero,
	{
		Self {
			data: ArcArray::zeros(IxDyn(shape)),
			device,
			requires_grad: false,
		}
	}

	/// Wrap the result of an operation over `inputs`. It lives on the device of the first input and requires grad if any input does.
	pub fn derived<D, U>(array: Array<T, D>, inputs: &[&Tensor<U>]) -> Self
	where
		D: Dimension,
	{
		Self {
			data: array.into_dyn().into_shared(),
			device: inputs
				.first()
				.map(|input| input.device)
				.unwrap_or_default(),
			requires_grad: inputs.iter().any(|input| input.requires_grad),
		}
	}

	pub fn device(&self) -> Device {
		self.device
	}

	/// Return this tensor on `device`.
	pub fn to(&self, device: Device) -> Self {
		Self {
			device,
			..self.clone()
		}
	}

	pub fn requires_grad(&self) -> bool {
		self.requires_grad
	}

	pub fn with_requires_grad(mut self, requires_grad: bool) -> Self {
		self.requires_grad = requires_grad;
		self
	}

	/// Return a tensor sharing this tensor's data that is not part of any differentiation graph.
	pub fn detach(&self) -> Self {
		Self {
			requires_grad: false,
			..self.clone()
		}
	}

	pub fn shape(&self) -> &[usize] {
		self.data.shape()
	}

	/// The number of elements.
	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn view(&self) -> ArrayViewD<T> {
		self.data.view()
	}

	/// Copy the elements in logical order into a one dimensional array. Both `(N,)` and `(N, 1)` tensors flatten to `N` elements.
	pub fn flatten(&self) -> Array1<T> {
		self.data.iter().cloned().collect()
	}

	/// Add `other` elementwise in place. The result requires grad if either operand does.
	pub fn add_assign(&mut self, other: &Tensor<T>)
	where
		T: AddAssign,
	{
		debug_assert_eq!(self.device, other.device);
		self.data += &other.data;
		self.requires_grad |= other.requires_grad;
	}
}

#[test]
fn test_device_parse() {
	assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
	assert_eq!("cuda".parse::<Device>().unwrap(), Device::Accelerator(0));
	assert_eq!("cuda:3".parse::<Device>().unwrap(), Device::Accelerator(3));
	assert!("tpu".parse::<Device>().is_err());
	assert!("cuda:x".parse::<Device>().is_err());
	assert_eq!(Device::Accelerator(1).to_string(), "cuda:1");
}

#[test]
fn test_flatten_column() {
	let column = Tensor::from_array(arr2(&[[1.0f32], [2.0], [3.0]]));
	assert_eq!(column.shape(), &[3, 1]);
	assert_eq!(column.flatten(), arr1(&[1.0, 2.0, 3.0]));
}

#[test]
fn test_requires_grad_propagates() {
	let input = Tensor::from_vec(vec![1.0f32, 2.0]).with_requires_grad(true);
	let output = Tensor::derived(arr1(&[3.0f64]), &[&input]);
	assert!(output.requires_grad());
	let detached = Tensor::derived(arr1(&[3.0f64]), &[&input.detach()]);
	assert!(!detached.requires_grad());
	let mut sum = Tensor::<f64>::zeros(&[1], Device::Cpu);
	sum.add_assign(&output);
	assert!(sum.requires_grad());
}
