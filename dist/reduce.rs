use super::{ProcessGroup, SyncError};

/**
`Reduction` is how partial statistics from each worker combine into the global statistic.

Sums, counts, and anything else combined by addition use `Sum`. Statistics that can only be combined by keeping every value, such as the values a median is taken over, use `Gather`, which concatenates them in rank order.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reduction {
	Sum,
	Gather,
}

/// A `Reducer` applies a [`Reduction`](enum.Reduction.html) to a buffer of partial statistics over a borrowed process group.
pub struct Reducer<'g> {
	group: &'g dyn ProcessGroup,
}

impl<'g> Reducer<'g> {
	pub fn new(group: &'g dyn ProcessGroup) -> Self {
		Self { group }
	}

	/// Reduce `buffer` across the group. When the group is not distributed, `buffer` is returned as is.
	pub fn reduce(&self, reduction: Reduction, buffer: Vec<f64>) -> Result<Vec<f64>, SyncError> {
		if !self.group.is_distributed() {
			return Ok(buffer);
		}
		log::debug!(
			"rank {} reducing {} values with {:?}",
			self.group.rank(),
			buffer.len(),
			reduction,
		);
		match reduction {
			Reduction::Sum => {
				let mut buffer = buffer;
				self.group.all_reduce_sum(&mut buffer)?;
				Ok(buffer)
			}
			Reduction::Gather => self.group.all_gather(&buffer),
		}
	}
}

#[test]
fn test_reduce_single_process_is_identity() {
	let group = super::SingleProcess;
	let reducer = Reducer::new(&group);
	assert_eq!(
		reducer.reduce(Reduction::Sum, vec![1.5, 2.0]).unwrap(),
		vec![1.5, 2.0]
	);
	assert_eq!(
		reducer.reduce(Reduction::Gather, vec![3.0]).unwrap(),
		vec![3.0]
	);
}
