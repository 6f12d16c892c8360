use anyhow::{Context, bail};
use log::info;

use rs_markov_core::Chain;
use rs_markov_core::io::open_corpus;

const USAGE: &str = "usage: rs-markov-exemple <corpus> [prefix_length] [max_length] [count]";

/// Parses the positional argument at `position`, or returns `default`.
fn arg_or(args: &[String], position: usize, default: usize, name: &str) -> anyhow::Result<usize> {
    match args.get(position) {
        Some(value) => value.parse().with_context(|| format!("{name} must be a positive integer, got {value:?}")),
        None => Ok(default),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(corpus) = args.first() else {
        bail!(USAGE);
    };

    // Number of tokens forming a state, 2 gives readable results on headlines
    let prefix_length = arg_or(&args, 1, 2, "prefix_length")?;
    // Hard cap on the number of tokens of a generated phrase
    let max_length = arg_or(&args, 2, 20, "max_length")?;
    let count = arg_or(&args, 3, 10, "count")?;

    // The corpus is one phrase per line, tokens separated by a single space
    let mut chain = Chain::new(prefix_length)?;
    let reader = open_corpus(corpus).with_context(|| format!("failed to open {corpus}"))?;
    chain.build(reader)?;
    info!(
        "built chain from {corpus}: {} tokens, {} states, {} starting prefixes",
        chain.tokens().len(),
        chain.state_count(),
        chain.starting_prefixes().len()
    );

    // A CLI has nothing better to do than stop on failure
    for i in 0..count {
        println!("Generated phrase {}: {}", i + 1, chain.must_generate(max_length));
    }

    Ok(())
}
