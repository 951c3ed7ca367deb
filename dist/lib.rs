/*!
This crate defines the [`ProcessGroup`](trait.ProcessGroup.html) trait, the seam between metrics and whatever runtime connects a set of cooperating workers, along with the [`Reducer`](struct.Reducer.html) that metrics use to make their partial statistics globally consistent.

Two groups are provided. [`SingleProcess`](struct.SingleProcess.html) is the group of one, where every collective is the identity. [`ChannelGroup`](struct.ChannelGroup.html) connects workers running on threads of the same process with crossbeam channels, which is enough to exercise the full protocol in tests and benchmarks without a multi-process launcher.

# Example

```
use tally_dist::{ChannelGroup, GroupOptions, ProcessGroup, Reducer, Reduction};

let sums = ChannelGroup::run(3, &GroupOptions::default(), |group| {
	let local = vec![group.rank() as f64, 1.0];
	Reducer::new(group).reduce(Reduction::Sum, local)
});
for sum in sums {
	assert_eq!(sum.unwrap(), vec![3.0, 3.0]);
}
```
*/

#![allow(clippy::tabs_in_doc_comments)]

mod channel;
mod options;
mod reduce;
mod single;

pub use self::channel::ChannelGroup;
pub use self::options::GroupOptions;
pub use self::reduce::{Reducer, Reduction};
pub use self::single::SingleProcess;

use std::time::Duration;
use thiserror::Error;

/**
A `ProcessGroup` is a handle to a set of cooperating workers that can run collective operations.

Collectives are barriers: every rank in the group must issue the same sequence of collectives, otherwise the group deadlocks or reports a [`SyncError`](enum.SyncError.html). Implementations must produce identical results on every rank.
*/
pub trait ProcessGroup {
	/// The index of this worker in the group, in `0..world_size()`.
	fn rank(&self) -> usize;
	/// The number of workers in the group.
	fn world_size(&self) -> usize;
	/// Whether more than one worker participates. When this is false, collectives are identities.
	fn is_distributed(&self) -> bool {
		self.world_size() > 1
	}
	/// Replace `values` with the elementwise sum of `values` across all ranks. Every rank must pass a buffer of the same length.
	fn all_reduce_sum(&self, values: &mut [f64]) -> Result<(), SyncError>;
	/// Concatenate `values` from all ranks in rank order. Ranks may pass buffers of different lengths.
	fn all_gather(&self, values: &[f64]) -> Result<Vec<f64>, SyncError>;
}

/// A collective failed. The group should be considered broken.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyncError {
	#[error("rank {peer} is unreachable")]
	Disconnected { peer: usize },
	#[error("timed out after {timeout:?} waiting for rank {peer}")]
	Timeout { peer: usize, timeout: Duration },
	#[error("rank {peer} sent {actual} values to all_reduce_sum but {expected} were expected")]
	LengthMismatch {
		peer: usize,
		expected: usize,
		actual: usize,
	},
	#[error("rank {peer} issued a different collective")]
	CollectiveMismatch { peer: usize },
}
