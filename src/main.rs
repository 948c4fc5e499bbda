//! sbuf - inspect buffers allocated through a stridebuf runtime
//!
//! Main CLI entry point: allocates buffers in the configured native runtime
//! and prints what the runtime reports about them.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use stridebuf::config::StridebufConfig;
use stridebuf::{Buffer, ElementType, NativeRuntime};

#[derive(Parser)]
#[command(name = "sbuf")]
#[command(version)]
#[command(about = "Allocate and inspect native strided buffers", long_about = None)]
struct Cli {
    /// Config file (default: stridebuf.toml searched upwards from cwd)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Native runtime library name or path (overrides the config)
    #[arg(long, global = true)]
    library: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate a scalar and a 640x480 uint8 buffer and print their shapes
    Demo,

    /// Allocate one buffer and print its full layout
    Info {
        /// Element type, e.g. u8, int16, f32, float32x4
        #[arg(long = "type", default_value = "u8")]
        element_type: ElementType,

        /// Extent of each dimension, innermost first
        #[arg(allow_negative_numbers = true)]
        sizes: Vec<i32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => StridebufConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => StridebufConfig::load_from_cwd().context("Failed to load stridebuf.toml")?,
    };
    if cli.library.is_some() {
        config.runtime.library = cli.library.clone();
    }

    init_logging(&config, cli.verbose);

    let runtime = config
        .runtime
        .build_runtime()
        .context("Failed to set up the native runtime")?;
    log::debug!("using runtime '{}'", runtime.name());

    match cli.command {
        Commands::Demo => run_demo(runtime),
        Commands::Info {
            element_type,
            sizes,
        } => run_info(runtime, element_type, &sizes),
    }
}

fn init_logging(config: &StridebufConfig, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.log.level.as_str()
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

fn run_demo(runtime: Arc<dyn NativeRuntime>) -> Result<()> {
    let b0 = Buffer::with_runtime(Arc::clone(&runtime), ElementType::UINT8, &[])?;
    println!("b0.dimensions = {}", b0.dimensions());

    let b1 = Buffer::with_runtime(runtime, ElementType::UINT8, &[640, 480])?;
    println!("b1.dimensions = {}", b1.dimensions());
    for i in 0..b1.dimensions() {
        println!("b1.extent[{}] = {}", i, b1.extent(i)?);
    }

    Ok(())
}

fn run_info(
    runtime: Arc<dyn NativeRuntime>,
    element_type: ElementType,
    sizes: &[i32],
) -> Result<()> {
    let mut buffer = Buffer::with_runtime(runtime, element_type, sizes)
        .with_context(|| format!("Failed to allocate {} buffer {:?}", element_type, sizes))?;

    println!("type:       {}", buffer.element_type());
    println!("handle:     {}", buffer.raw_handle());
    println!("dimensions: {}", buffer.dimensions());
    for i in 0..buffer.dimensions() {
        println!(
            "  [{}] min={} extent={} stride={}",
            i,
            buffer.min(i)?,
            buffer.extent(i)?,
            buffer.stride(i)?
        );
    }
    println!("width:      {}", buffer.width());
    println!("height:     {}", buffer.height());
    println!("channels:   {}", buffer.channels());
    println!("bytes:      {}", buffer.read_only_data().len());

    buffer.release();
    Ok(())
}
