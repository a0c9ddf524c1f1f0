mod cli;
mod commands;
mod formatting;
mod settings;

use std::process::ExitCode;

use cli::Commands;
use commands::{run_add_bundle, run_add_to_cart, run_cart, run_select, run_variants, CartActions};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    run().await
}

/// Logs go to stderr so stdout stays a clean JSON stream.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("SFH_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> ExitCode {
    let args = cli::parse();
    init_logging(args.global.verbose);
    let global = args.global;

    match args.command {
        Commands::Variants => run_variants(&global).await,
        Commands::Select { variant, verify } => run_select(&global, variant, verify).await,
        Commands::AddToCart { variant } => run_add_to_cart(&global, variant).await,
        Commands::AddBundle => run_add_bundle(&global).await,
        Commands::Cart {
            variant,
            quantity,
            remove,
            checkout,
        } => {
            run_cart(
                &global,
                variant,
                CartActions {
                    quantity,
                    remove,
                    checkout,
                },
            )
            .await
        }
    }
}
