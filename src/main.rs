use clap::{CommandFactory, Parser};
use std::env;
use std::process;
use tracing_subscriber::EnvFilter;

use card_maker::cli::{self, CliArgs, Settings};
use card_maker::csv_handler;
use card_maker::engine::{self, BatchOptions, CancelToken};
use card_maker::errors::CardError;
use card_maker::models::BatchSummary;
use card_maker::progress::ProgressReporter;
use card_maker::renderer::ConvertRenderer;

fn main() {
    // Running without any argument shows the usage, like --help.
    if env::args_os().len() <= 1 {
        if let Err(e) = CliArgs::command().print_help() {
            eprintln!("Error printing help: {}", e);
            process::exit(1);
        }
        return;
    }

    let args = CliArgs::parse();
    init_tracing(args.log);

    match run(args) {
        Ok(summary) if summary.all_succeeded() => {}
        Ok(_) => process::exit(1),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(enabled: bool) {
    let default_level = if enabled { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: CliArgs) -> Result<BatchSummary, CardError> {
    // 1. Validate the arguments before touching anything.
    let Settings {
        input,
        target,
        render,
        program,
        jobs,
        timeout,
        batch_timeout,
    } = cli::validate(args)?;

    // 2. Load the cards.
    let cards = csv_handler::load_cards(&input)?;

    // 3. Render them, reporting each one as it finishes.
    let renderer = ConvertRenderer::new(program, render, timeout);
    let options = BatchOptions {
        jobs,
        cancel: batch_timeout.map_or_else(CancelToken::new, CancelToken::with_deadline),
    };
    let reporter = ProgressReporter::stdio(cards.len(), target.to_string());
    engine::run_batch(&cards, &renderer, &target, &options, &reporter)
}
