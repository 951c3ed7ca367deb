use super::{ProcessGroup, SyncError};

/// The group of one. Use it when no distributed context is active.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleProcess;

impl ProcessGroup for SingleProcess {
	fn rank(&self) -> usize {
		0
	}

	fn world_size(&self) -> usize {
		1
	}

	fn all_reduce_sum(&self, _values: &mut [f64]) -> Result<(), SyncError> {
		Ok(())
	}

	fn all_gather(&self, values: &[f64]) -> Result<Vec<f64>, SyncError> {
		Ok(values.to_owned())
	}
}

#[test]
fn test_single_process() {
	let group = SingleProcess;
	assert!(!group.is_distributed());
	let mut values = vec![1.0, 2.0];
	group.all_reduce_sum(&mut values).unwrap();
	assert_eq!(values, vec![1.0, 2.0]);
	assert_eq!(group.all_gather(&values).unwrap(), vec![1.0, 2.0]);
}
