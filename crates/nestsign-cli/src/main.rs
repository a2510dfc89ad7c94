//! Command-line interface for nestsign.
//!
//! Signs a built macOS product and everything nested inside it, innermost
//! first. Every input can also come from the environment an Xcode build
//! phase exports, so the tool can run as a script phase without arguments.

use clap::{Parser, ValueEnum};
use nestsign::NestSign;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nestsign")]
#[command(about = "Sign nested macOS bundles innermost first")]
struct Cli {
    /// Code signing identity
    #[arg(long, env = "CODE_SIGN_IDENTITY")]
    identity: Option<String>,

    /// Directory containing the build product
    #[arg(long, env = "BUILT_PRODUCTS_DIR")]
    build_dir: Option<PathBuf>,

    /// File name of the build product (e.g. Example.app)
    #[arg(long, env = "FULL_PRODUCT_NAME")]
    product_name: Option<String>,

    /// Path of the build product, instead of --build-dir and --product-name
    #[arg(long)]
    product: Option<PathBuf>,

    /// Pass --timestamp=none to codesign
    #[arg(long, env = "NESTSIGN_NO_TIMESTAMP")]
    no_timestamp: bool,

    /// codesign executable
    #[arg(long, env = "NESTSIGN_CODESIGN", default_value = "codesign")]
    codesign: PathBuf,

    /// otool executable, used with --inspector otool
    #[arg(long, env = "NESTSIGN_OTOOL", default_value = "otool")]
    otool: PathBuf,

    /// How standalone tools are recognized
    #[arg(long, value_enum, default_value_t = InspectorArg::Otool)]
    inspector: InspectorArg,

    /// Print the signing order without signing
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InspectorArg {
    /// Run `otool -l` on candidate executables
    Otool,
    /// Parse candidate executables in-process
    Macho,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // One line on stdout, in the form build logs pick up as an error.
            println!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> nestsign::Result<()> {
    let dry_run = cli.dry_run;
    let report = configure(cli).run()?;

    if dry_run {
        for target in report.targets() {
            println!("{}\t{}", target.kind(), target.path().display());
        }
    }

    Ok(())
}

fn configure(cli: Cli) -> NestSign {
    let mut nestsign = NestSign::new()
        .timestamp(!cli.no_timestamp)
        .codesign_program(&cli.codesign)
        .dry_run(cli.dry_run);

    nestsign = match cli.inspector {
        InspectorArg::Otool => nestsign.otool_program(&cli.otool),
        InspectorArg::Macho => nestsign.inspect_in_process(),
    };

    if let Some(identity) = cli.identity {
        nestsign = nestsign.identity(identity);
    }
    if let Some(dir) = cli.build_dir {
        nestsign = nestsign.build_dir(dir);
    }
    if let Some(name) = cli.product_name {
        nestsign = nestsign.product_name(name);
    }
    if let Some(product) = cli.product {
        nestsign = nestsign.product_path(product);
    }

    nestsign
}
