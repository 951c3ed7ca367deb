use anyhow::{bail, Result};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use std::{collections::BTreeMap, path::PathBuf, time::Instant};
use tally_metrics::{ChannelGroup, Options, ProcessGroup, SingleProcess, Tensor};

#[derive(Parser)]
#[clap(about = "Evaluate metrics over shards on several workers and compare with a single worker")]
struct Args {
	#[clap(long, default_value = "4")]
	workers: usize,
	#[clap(long, default_value = "100000")]
	examples: usize,
	#[clap(long, default_value = "64")]
	batch_size: usize,
	#[clap(long, default_value = "42")]
	seed: u64,
	/// A json file with `Options`.
	#[clap(long)]
	config: Option<PathBuf>,
}

fn main() -> Result<()> {
	let env = env_logger::Env::default().default_filter_or("info");
	env_logger::Builder::from_env(env)
		.format_module_path(false)
		.format_timestamp(None)
		.init();
	let args = Args::parse();
	if args.workers == 0 || args.batch_size == 0 {
		bail!("workers and batch size must be positive");
	}
	let options: Options = match &args.config {
		Some(path) => serde_json::from_reader(std::fs::File::open(path)?)?,
		None => Options::default(),
	};

	// generate the data
	let mut rng = Xoshiro256Plus::seed_from_u64(args.seed);
	let targets: Vec<f32> = (0..args.examples)
		.map(|_| rng.gen_range(-10.0f32, 10.0))
		.collect();
	let predictions: Vec<f32> = targets
		.iter()
		.map(|target| *target + rng.gen_range(-1.0f32, 1.0))
		.collect();

	// evaluate on a single worker
	let start = Instant::now();
	let single = evaluate(&options, &SingleProcess, &predictions, &targets, args.batch_size)?;
	log::info!("single worker: {:?}", start.elapsed());

	// evaluate each shard on its own worker
	let start = Instant::now();
	let shard_size = (args.examples + args.workers - 1) / args.workers;
	let sharded = ChannelGroup::run(args.workers, &options.group_options(), |group| {
		let start = (group.rank() * shard_size).min(args.examples);
		let end = (start + shard_size).min(args.examples);
		evaluate(
			&options,
			group,
			&predictions[start..end],
			&targets[start..end],
			args.batch_size,
		)
	});
	log::info!("{} workers: {:?}", args.workers, start.elapsed());

	for (rank, results) in sharded.into_iter().enumerate() {
		let results = results?;
		for (name, value) in results.iter() {
			let expected = single[name];
			let difference = (value - expected).abs();
			log::info!(
				"rank {} {}: {} (single worker {}, difference {:e})",
				rank,
				name,
				value,
				expected,
				difference,
			);
			if difference > 1e-6 * expected.abs().max(1.0) {
				bail!("rank {} computed {} = {} but expected {}", rank, name, value, expected);
			}
		}
	}
	Ok(())
}

fn evaluate(
	options: &Options,
	group: &dyn ProcessGroup,
	predictions: &[f32],
	targets: &[f32],
	batch_size: usize,
) -> Result<BTreeMap<String, f64>, tally_metrics::Error> {
	let mut metrics = options.metric_set()?;
	metrics.reset();
	for (predictions, targets) in predictions.chunks(batch_size).zip(targets.chunks(batch_size)) {
		let batch = (
			Tensor::from_vec(predictions.to_owned()),
			Tensor::from_vec(targets.to_owned()),
		);
		metrics.update(&batch)?;
	}
	Ok(metrics.compute(group)?.clone())
}
