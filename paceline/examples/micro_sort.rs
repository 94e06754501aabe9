//! Microbenchmark demo: times a 1k-element sort and prints the summary.
//!
//! Records stream to stdout as JSON lines; engine tracing goes to stderr
//! under `RUST_LOG=info`.

use paceline::{ConstantProbe, JsonLinesSink, MicroBench, PaceConfig, TestDefinition};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let pace = PaceConfig::discover().unwrap_or_default();
    let mut config = pace.run_configuration()?;
    config.min_iterations = 30;
    config.min_measurement_ns = 50_000_000;

    let definition = TestDefinition::new("demo", "Sorting", "sort_unstable_1k");
    let data: Vec<u64> = (0..1000).rev().collect();

    let sink = JsonLinesSink::new(std::io::stdout());
    let mut bench = MicroBench::new(ConstantProbe::nominal(), sink);
    let record = bench.run(&definition, &config, || {
        let mut scratch = data.clone();
        scratch.sort_unstable();
        scratch
    })?;

    eprintln!(
        "{}: median {:.0} ns over {} samples (converged: {})",
        record.definition,
        record.statistics.median_ns,
        record.statistics.sample_count,
        record.converged
    );
    Ok(())
}
