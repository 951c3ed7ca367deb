use super::{GroupOptions, ProcessGroup, SyncError};
use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::{cell::Cell, time::Duration};

/**
A `ChannelGroup` is one member of a group of workers living on threads of the same process.

Every ordered pair of ranks gets its own crossbeam channel. A collective sends the local payload to every peer and then receives one message from every peer in rank order, so a peer that exits or panics shows up as [`SyncError::Disconnected`](enum.SyncError.html) rather than a hang. Sums are accumulated in rank order, which makes the result bit for bit identical on every rank.
*/
#[derive(Debug)]
pub struct ChannelGroup {
	rank: usize,
	/// `senders[peer]` delivers to `peer`. It is `None` at this rank.
	senders: Vec<Option<Sender<Message>>>,
	/// `receivers[peer]` receives from `peer`. It is `None` at this rank.
	receivers: Vec<Option<Receiver<Message>>>,
	sequence: Cell<u64>,
	timeout: Option<Duration>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Collective {
	AllReduceSum,
	AllGather,
}

#[derive(Debug)]
struct Message {
	sequence: u64,
	collective: Collective,
	payload: Vec<f64>,
}

impl ChannelGroup {
	/// Create the members of a group of `world_size` workers. The member at index `i` has rank `i`.
	pub fn new(world_size: usize, options: &GroupOptions) -> Vec<ChannelGroup> {
		let mut senders: Vec<Vec<Option<Sender<Message>>>> = (0..world_size)
			.map(|_| (0..world_size).map(|_| None).collect())
			.collect();
		let mut receivers: Vec<Vec<Option<Receiver<Message>>>> = (0..world_size)
			.map(|_| (0..world_size).map(|_| None).collect())
			.collect();
		for from in 0..world_size {
			for to in 0..world_size {
				if from != to {
					let (sender, receiver) = unbounded();
					senders[from][to] = Some(sender);
					receivers[to][from] = Some(receiver);
				}
			}
		}
		senders
			.into_iter()
			.zip(receivers)
			.enumerate()
			.map(|(rank, (senders, receivers))| ChannelGroup {
				rank,
				senders,
				receivers,
				sequence: Cell::new(0),
				timeout: options.timeout,
			})
			.collect()
	}

	/// Run `f` once per rank, each on its own thread with its own member of a new group, and return the results in rank order. This blocks until every worker has returned. A panic in any worker is resumed on the calling thread.
	pub fn run<F, T>(world_size: usize, options: &GroupOptions, f: F) -> Vec<T>
	where
		F: Fn(&ChannelGroup) -> T + Sync,
		T: Send,
	{
		let groups = ChannelGroup::new(world_size, options);
		let f = &f;
		let results = crossbeam::scope(|scope| {
			let handles: Vec<_> = groups
				.into_iter()
				.map(|group| scope.spawn(move |_| f(&group)))
				.collect();
			handles
				.into_iter()
				.map(|handle| handle.join())
				.collect::<Vec<_>>()
		});
		let results = match results {
			Ok(results) => results,
			Err(panic) => std::panic::resume_unwind(panic),
		};
		results
			.into_iter()
			.map(|result| match result {
				Ok(result) => result,
				Err(panic) => std::panic::resume_unwind(panic),
			})
			.collect()
	}

	/// Send `payload` to every peer and collect every rank's payload, in rank order.
	fn exchange(
		&self,
		collective: Collective,
		payload: &[f64],
	) -> Result<Vec<Vec<f64>>, SyncError> {
		let sequence = self.sequence.get();
		self.sequence.set(sequence + 1);
		log::debug!(
			"rank {} {:?} #{} with {} values",
			self.rank,
			collective,
			sequence,
			payload.len(),
		);
		for (peer, sender) in self.senders.iter().enumerate() {
			if let Some(sender) = sender {
				let message = Message {
					sequence,
					collective,
					payload: payload.to_owned(),
				};
				sender
					.send(message)
					.map_err(|_| SyncError::Disconnected { peer })?;
			}
		}
		self.receivers
			.iter()
			.enumerate()
			.map(|(peer, receiver)| match receiver {
				None => Ok(payload.to_owned()),
				Some(receiver) => {
					let message = self.receive(peer, receiver)?;
					if message.sequence != sequence || message.collective != collective {
						return Err(SyncError::CollectiveMismatch { peer });
					}
					Ok(message.payload)
				}
			})
			.collect()
	}

	fn receive(&self, peer: usize, receiver: &Receiver<Message>) -> Result<Message, SyncError> {
		match self.timeout {
			None => receiver
				.recv()
				.map_err(|_| SyncError::Disconnected { peer }),
			Some(timeout) => receiver.recv_timeout(timeout).map_err(|error| match error {
				RecvTimeoutError::Timeout => SyncError::Timeout { peer, timeout },
				RecvTimeoutError::Disconnected => SyncError::Disconnected { peer },
			}),
		}
	}
}

impl ProcessGroup for ChannelGroup {
	fn rank(&self) -> usize {
		self.rank
	}

	fn world_size(&self) -> usize {
		self.senders.len()
	}

	fn all_reduce_sum(&self, values: &mut [f64]) -> Result<(), SyncError> {
		let payloads = self.exchange(Collective::AllReduceSum, values)?;
		for (peer, payload) in payloads.iter().enumerate() {
			if payload.len() != values.len() {
				return Err(SyncError::LengthMismatch {
					peer,
					expected: values.len(),
					actual: payload.len(),
				});
			}
		}
		values.iter_mut().for_each(|value| *value = 0.0);
		for payload in payloads {
			for (value, partial) in values.iter_mut().zip(payload) {
				*value += partial;
			}
		}
		Ok(())
	}

	fn all_gather(&self, values: &[f64]) -> Result<Vec<f64>, SyncError> {
		let payloads = self.exchange(Collective::AllGather, values)?;
		Ok(payloads.into_iter().flatten().collect())
	}
}

#[test]
fn test_all_reduce_sum() {
	let results = ChannelGroup::run(4, &GroupOptions::default(), |group| {
		let mut values = vec![group.rank() as f64, 0.5];
		group.all_reduce_sum(&mut values).map(|_| values)
	});
	for result in results {
		assert_eq!(result.unwrap(), vec![6.0, 2.0]);
	}
}

#[test]
fn test_all_gather_uneven() {
	let results = ChannelGroup::run(3, &GroupOptions::default(), |group| {
		let values: Vec<f64> = (0..group.rank()).map(|i| i as f64).collect();
		group.all_gather(&values)
	});
	for result in results {
		assert_eq!(result.unwrap(), vec![0.0, 0.0, 1.0]);
	}
}

#[test]
fn test_repeated_collectives_stay_in_sequence() {
	let results = ChannelGroup::run(3, &GroupOptions::default(), |group| {
		let mut total = 0.0;
		for step in 0..10 {
			let mut values = vec![(group.rank() * step) as f64];
			group.all_reduce_sum(&mut values)?;
			total += values[0];
		}
		Ok::<_, SyncError>(total)
	});
	for result in results {
		// sum over steps of step * (0 + 1 + 2)
		assert_eq!(result.unwrap(), 135.0);
	}
}

#[test]
fn test_exited_peer_is_disconnected() {
	let results = ChannelGroup::run(2, &GroupOptions::default(), |group| {
		if group.rank() == 1 {
			return Ok(Vec::new());
		}
		let mut values = vec![1.0];
		group.all_reduce_sum(&mut values).map(|_| values)
	});
	assert_eq!(results[0], Err(SyncError::Disconnected { peer: 1 }));
}

#[test]
fn test_timeout() {
	let options = GroupOptions {
		timeout: Some(Duration::from_millis(20)),
	};
	let results = ChannelGroup::run(2, &options, |group| {
		if group.rank() == 1 {
			std::thread::sleep(Duration::from_millis(300));
			return Ok(Vec::new());
		}
		group.all_gather(&[1.0])
	});
	assert_eq!(
		results[0],
		Err(SyncError::Timeout {
			peer: 1,
			timeout: Duration::from_millis(20),
		})
	);
}

#[test]
fn test_length_mismatch() {
	let results = ChannelGroup::run(2, &GroupOptions::default(), |group| {
		let mut values = vec![1.0; group.rank() + 1];
		group.all_reduce_sum(&mut values)
	});
	assert_eq!(
		results[0],
		Err(SyncError::LengthMismatch {
			peer: 1,
			expected: 1,
			actual: 2,
		})
	);
}

#[test]
fn test_collective_mismatch() {
	let results = ChannelGroup::run(2, &GroupOptions::default(), |group| {
		if group.rank() == 0 {
			let mut values = vec![1.0];
			group.all_reduce_sum(&mut values).map(|_| values)
		} else {
			group.all_gather(&[1.0])
		}
	});
	assert_eq!(results[0], Err(SyncError::CollectiveMismatch { peer: 1 }));
	assert_eq!(results[1], Err(SyncError::CollectiveMismatch { peer: 0 }));
}
