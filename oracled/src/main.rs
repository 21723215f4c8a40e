//! `oracled` entry point: parse arguments, wire the sources, run the
//! pipeline, report, exit with the documented code.

use std::path::Path;

use gumdrop::Options;
use tracing::info;
use tracing_subscriber::prelude::*;

use oracle_rpc::{CancelToken, Client};
use oracle_store::BlockDir;

use oracled::args::Args;
use oracled::config::Config;
use oracled::pipeline::{self, PriceTarget, Source};
use oracled::{render, OracleError};

fn main() {
    color_eyre::install().expect("error-report hooks install once");
    init_tracing();

    let args = Args::parse_args_default_or_exit();

    println!("UTXOracle {}", env!("CARGO_PKG_VERSION"));

    let cancel = CancelToken::new();
    arm_ctrl_c(cancel.clone());

    match run(&args, &cancel) {
        Ok(()) => {}
        Err(error) => {
            if error.is_cancelled() {
                eprintln!("interrupted");
            } else {
                eprintln!("error: {}", error);
            }
            std::process::exit(error.exit_code());
        }
    }
}

fn run(args: &Args, cancel: &CancelToken) -> Result<(), OracleError> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(dir) = &args.blocks_dir {
        config.blocks_dir = Some(dir.clone());
    }

    let target = match (args.recent_blocks, args.target_date()?) {
        (true, Some(_)) => {
            return Err(OracleError::Config(
                "-rb and -d are mutually exclusive".to_string(),
            ))
        }
        (true, None) => PriceTarget::Recent,
        (false, Some(date)) => PriceTarget::Date(date),
        (false, None) => {
            return Err(OracleError::Config(
                "pass -d YYYY/MM/DD for a date, or -rb for the recent blocks".to_string(),
            ))
        }
    };

    let chain = Client::new(&config.rpc_url, &config.rpc_auth())?;
    let blocks = BlockDir::open(config.blocks_dir())?;
    let source = Source { chain, blocks };

    info!(?target, "starting inference");
    println!("finding the target blocks...");
    let inference = pipeline::infer_price(target, &source, cancel)?;

    let result = &inference.result;
    println!(
        "inferred price: ${} (±{:.0}%, {} samples over {} blocks)",
        result.price_usd,
        result.dispersion * 100.0,
        result.samples,
        inference.range.blocks.len(),
    );

    if !args.no_html {
        let path = render::write_chart(Path::new("."), &inference)?;
        println!("chart written to {}", path.display());
    }
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_error::ErrorLayer::default())
        .init();
}

/// Flip the cancellation token on Ctrl-C. The pipeline notices between
/// blocks and RPC calls; a second Ctrl-C kills the process the usual way.
fn arm_ctrl_c(cancel: CancelToken) {
    std::thread::spawn(move || {
        let mut runtime = match tokio::runtime::Builder::new()
            .basic_scheduler()
            .enable_io()
            .build()
        {
            Ok(runtime) => runtime,
            Err(_) => return,
        };
        if runtime.block_on(tokio::signal::ctrl_c()).is_ok() {
            cancel.cancel();
        }
    });
}
