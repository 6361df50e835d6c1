//! covstat: statistics over integer coverage tracks
//!
//! Usage: covstat <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use covstat::aggregate::Method;
use covstat::bedgraph::BedGraphStore;
use covstat::commands::{ResampleCommand, StatCommand, Statistic, ViewCommand};
use covstat::config::DEFAULT_HISTOGRAM_MAX;
use covstat::error::{CoverageError, Result};
use covstat::genome::ChromTable;
use covstat::matrix::TrackMatrix;
use covstat::region::{read_region_specs, RegionSpec};
use covstat::track::CoverageTrack;

#[derive(Parser)]
#[command(name = "covstat")]
#[command(version)]
#[command(about = "covstat: region statistics and resampling for coverage tracks", long_about = None)]
struct Cli {
    /// Number of threads to use (default: number of CPUs)
    #[arg(long, short = 't', global = true)]
    threads: Option<usize>,

    /// Positions per parallel chunk when loading raw values
    #[arg(long, global = true)]
    load_chunk_size: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a statistic for each region
    Stat {
        /// Input bedGraph track
        #[arg(short, long)]
        input: PathBuf,

        /// Genome file (chrom<TAB>size)
        #[arg(short = 'g', long)]
        genome: PathBuf,

        /// BED file of regions
        #[arg(short = 'r', long)]
        regions: Option<PathBuf>,

        /// Statistic: mean|avg|sum|median|percentile=N|hist|perc_cov=T1,T2,...
        #[arg(short, long, default_value = "mean")]
        stat: String,

        /// Upper bound (exclusive) for the hist statistic
        #[arg(long, default_value_t = DEFAULT_HISTOGRAM_MAX)]
        max_bin: i32,

        /// Regions (chr, chr:begin-end, chr:begin-)
        region: Vec<String>,
    },

    /// Aggregate fixed-width bins
    Resample {
        /// Input bedGraph track
        #[arg(short, long)]
        input: PathBuf,

        /// Genome file (chrom<TAB>size)
        #[arg(short = 'g', long)]
        genome: PathBuf,

        /// Bin width in bases
        #[arg(short = 'b', long)]
        bin_size: u64,

        /// Per-bin aggregation: mean or median
        #[arg(short, long, default_value = "mean")]
        method: String,

        /// Keep the requested bin size for remote stores
        #[arg(long)]
        no_adjust: bool,

        /// Regions (chr, chr:begin-end, chr:begin-)
        region: Vec<String>,
    },

    /// Print per-position values of several tracks side by side
    View {
        /// Input bedGraph tracks (repeat for each track)
        #[arg(short, long, required = true)]
        input: Vec<PathBuf>,

        /// Genome file (chrom<TAB>size)
        #[arg(short = 'g', long)]
        genome: PathBuf,

        /// Comma-separated track names, one per input
        #[arg(short, long, value_delimiter = ',')]
        names: Option<Vec<String>>,

        /// Print a header line
        #[arg(long)]
        header: bool,

        /// Region (chr, chr:begin-end, chr:begin-)
        region: String,
    },
}

fn main() {
    let cli = Cli::parse();

    init_logger(cli.verbose);

    // Configure thread pool if --threads specified
    if let Some(n) = cli.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
        {
            eprintln!("Error: failed to initialize thread pool: {}", e);
            process::exit(1);
        }
    }

    if let Some(n) = cli.load_chunk_size {
        covstat::config::set_load_chunk_size(n);
    }

    let result = match cli.command {
        Commands::Stat {
            input,
            genome,
            regions,
            stat,
            max_bin,
            region,
        } => run_stat(input, genome, regions, stat, max_bin, region),

        Commands::Resample {
            input,
            genome,
            bin_size,
            method,
            no_adjust,
            region,
        } => run_resample(input, genome, bin_size, method, no_adjust, region),

        Commands::View {
            input,
            genome,
            names,
            header,
            region,
        } => run_view(input, genome, names, header, region),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let mut builder = env_logger::Builder::new();
    builder
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .filter(None, level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn open_track(input: &Path, genome: &ChromTable) -> Result<CoverageTrack<BedGraphStore>> {
    let store = BedGraphStore::from_path(input, genome.clone()).map_err(|e| match e {
        CoverageError::Io(io) => CoverageError::InvalidFormat(format!(
            "Failed to read track {}: {}",
            input.display(),
            io
        )),
        other => other,
    })?;
    Ok(CoverageTrack::new(store))
}

fn load_genome(path: &Path) -> Result<ChromTable> {
    ChromTable::from_file(path)
        .map_err(|e| CoverageError::InvalidFormat(format!("Failed to load genome file: {}", e)))
}

fn parse_specs(regions: Vec<String>) -> Result<Vec<RegionSpec>> {
    regions.iter().map(|r| r.parse()).collect()
}

fn run_stat(
    input: PathBuf,
    genome_path: PathBuf,
    regions_file: Option<PathBuf>,
    stat: String,
    max_bin: i32,
    regions: Vec<String>,
) -> Result<()> {
    let stat: Statistic = stat.parse()?;
    let genome = load_genome(&genome_path)?;
    let track = open_track(&input, &genome)?;

    let mut specs = match regions_file {
        Some(path) => read_region_specs(path)?,
        None => Vec::new(),
    };
    specs.extend(parse_specs(regions)?);

    let cmd = StatCommand::new().with_stat(stat).with_max_bin(max_bin);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    cmd.run(&track, specs, &mut handle)
}

fn run_resample(
    input: PathBuf,
    genome_path: PathBuf,
    bin_size: u64,
    method: String,
    no_adjust: bool,
    regions: Vec<String>,
) -> Result<()> {
    let method: Method = method.parse()?;
    let genome = load_genome(&genome_path)?;
    let track = open_track(&input, &genome)?;

    let cmd = ResampleCommand::new(bin_size)
        .with_method(method)
        .with_adjustment(!no_adjust);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    cmd.run(&track, parse_specs(regions)?, &mut handle)
}

fn run_view(
    inputs: Vec<PathBuf>,
    genome_path: PathBuf,
    names: Option<Vec<String>>,
    header: bool,
    region: String,
) -> Result<()> {
    let genome = load_genome(&genome_path)?;
    let tracks = inputs
        .iter()
        .map(|input| open_track(input, &genome))
        .collect::<Result<Vec<_>>>()?;

    let mut matrix = TrackMatrix::new(tracks);
    if let Some(names) = names {
        matrix = matrix.with_names(names)?;
    }
    let spec: RegionSpec = region.parse()?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    ViewCommand::new()
        .with_header(header)
        .run(&matrix, &spec, &mut handle)
}
