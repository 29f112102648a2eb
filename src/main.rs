//Enable more cargo lint tests
#![warn(rust_2018_idioms)]
#![warn(clippy::disallowed_types)]

use std::{
    fs::File,
    io::{Seek, SeekFrom},
    process::exit,
    time::Instant,
};

use log::{debug, error, info, warn, LevelFilter};
use simplelog::{ColorChoice, Config as LogConfig, TermLogger, TerminalMode};

use pahuff::tools::cli::{args_init, Command, CompressArgs, DecompressArgs};
use pahuff::{compress_with_dictionary, decompress, mine, Dictionary, Progress, Result};

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() {
    // Available log levels are Error, Warn, Info, Debug, Trace. The cli narrows this down.
    if TermLogger::init(
        LevelFilter::Trace,
        LogConfig::default(),
        TerminalMode::Stdout,
        ColorChoice::Auto,
    )
    .is_err()
    {
        eprintln!("Logger was already initialized");
    }

    let args = args_init();
    let timer = Instant::now();

    //----- Figure how what we need to do and go do it
    let result = match &args.command {
        Command::Compress(c) => run_compress(c),
        Command::Decompress(d) => run_decompress(d),
    };

    match result {
        Ok(()) => info!("Done in {:.2?}.\n", timer.elapsed()),
        Err(e) => {
            error!("{}", e);
            exit(1);
        }
    }
}

/// Compress one file. The stages are run one by one so the code table can be shown between
/// building and encoding.
fn run_compress(args: &CompressArgs) -> Result<()> {
    let config = args.config()?;
    debug!("{:?}", config);

    let mut input = File::open(&args.input)?;
    let size = input.metadata()?.len();
    info!(
        "Compressing {} ({} bytes) into {}",
        args.input.display(),
        size,
        args.output.display()
    );

    let mut progress = Progress::new(size * 2, |pct| debug!("{:5.1}%", pct));

    info!("Stage 1: analyzing input");
    let mut dict = mine(&mut input, &config, &mut progress)?;

    info!("Stage 2: building Huffman trees");
    dict.build();
    if args.show_codes {
        show_codes(&dict);
    }

    info!("Stage 3: encoding");
    input.seek(SeekFrom::Start(0))?;
    let output = File::create(&args.output)?;
    let stats = compress_with_dictionary(&dict, input, output, &mut progress)?;
    progress.finish();

    if stats.skipped_bytes > 0 {
        warn!("{} bytes could not be encoded", stats.skipped_bytes);
    }
    let ratio = if stats.input_bytes == 0 {
        0.0
    } else {
        stats.output_bytes as f64 * 100.0 / stats.input_bytes as f64
    };
    info!(
        "{} contexts, {} patterns. {} -> {} bytes ({:.1}%)",
        stats.contexts, stats.patterns, stats.input_bytes, stats.output_bytes, ratio
    );
    Ok(())
}

fn run_decompress(args: &DecompressArgs) -> Result<()> {
    info!(
        "Decompressing {} into {}",
        args.input.display(),
        args.output.display()
    );
    let input = File::open(&args.input)?;
    let output = File::create(&args.output)?;
    let mut progress = Progress::new(0, |pct| debug!("{:5.1}%", pct));

    let stats = decompress(input, output, &mut progress)?;
    if stats.truncated {
        warn!(
            "{} is incomplete; only {} bytes were restored",
            args.input.display(),
            stats.output_bytes
        );
    }
    Ok(())
}

/// Print the context codes and, under each, the codes of its patterns.
fn show_codes(dict: &Dictionary) {
    for (symbol, code, patterns) in dict.code_table() {
        let freq = dict.context(symbol).map_or(0, |c| c.frequency);
        println!("{:?} [{:#04x}] x{}: {}", symbol as char, symbol, freq, code);
        for (pattern, sub_code) in patterns {
            println!("    {:?}: {}", String::from_utf8_lossy(pattern), sub_code);
        }
    }
}
