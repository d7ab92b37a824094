//! phystri CLI - collision triangle extraction tool.
//!
//! Usage: phystri <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `phystri --help` for available commands. Set `RUST_LOG=debug` for
//! scanner and extractor progress.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rayon::prelude::*;

use phystri::extract::{extract_physics, ExtractOptions, Extraction, PartPolicy};
use phystri::geometry::{bounding_box, Triangle};
use phystri::io::{self, Format};
use phystri::kv::{JsonKvDecoder, KeyValueDecoder};
use phystri::resource::{BlockType, ResourceFile};

#[derive(Parser)]
#[command(name = "phystri")]
#[command(author, version, about = "Collision triangle extraction CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the block directory of a compiled resource
    Blocks {
        /// Compiled resource file
        resource: PathBuf,
    },

    /// Write the raw bytes of one block to a file
    DumpBlock {
        /// Compiled resource file
        resource: PathBuf,

        /// Output file
        output: PathBuf,

        /// Four-character block type
        #[arg(short, long, default_value = "PHYS")]
        block: BlockType,
    },

    /// Extract collision triangles from a JSON physics tree
    Extract {
        /// Physics tree exported as JSON
        input: PathBuf,

        /// Output triangle file (.tri, .opt or .stl)
        output: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Convert between triangle formats
    Convert {
        /// Input triangle file
        input: PathBuf,

        /// Output triangle file
        output: PathBuf,
    },

    /// Display triangle file information
    Info {
        /// Input triangle file
        input: PathBuf,
    },

    /// Extract every JSON physics tree in a directory
    Batch {
        /// Directory of *.json physics trees
        input_dir: PathBuf,

        /// Directory for output files
        output_dir: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "opt")]
        format: OutputFormat,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Index of the physics part to read
    #[arg(long, default_value = "0")]
    part: usize,

    /// Collision attribute to extract
    #[arg(long, default_value = "0")]
    attribute: i64,

    /// Fail on the first malformed part instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Do not extract hulls
    #[arg(long)]
    no_hulls: bool,

    /// Do not extract meshes
    #[arg(long)]
    no_meshes: bool,
}

impl FilterArgs {
    fn options(&self) -> ExtractOptions {
        let policy = if self.strict {
            PartPolicy::Abort
        } else {
            PartPolicy::Skip
        };
        ExtractOptions::default()
            .with_part_index(self.part)
            .with_collision_attribute(self.attribute)
            .with_policy(policy)
            .with_hulls(!self.no_hulls)
            .with_meshes(!self.no_meshes)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Flat triangle stream
    Tri,
    /// Chunked triangle stream
    Opt,
    /// Binary STL
    Stl,
}

impl From<OutputFormat> for Format {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Tri => Format::Tri,
            OutputFormat::Opt => Format::Opt,
            OutputFormat::Stl => Format::Stl,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Blocks { resource } => {
            cmd_blocks(&resource)?;
        }

        Commands::DumpBlock {
            resource,
            output,
            block,
        } => {
            cmd_dump_block(&resource, &output, block)?;
        }

        Commands::Extract {
            input,
            output,
            filter,
        } => {
            cmd_extract(&input, &output, &filter.options())?;
        }

        Commands::Convert { input, output } => {
            cmd_convert(&input, &output)?;
        }

        Commands::Info { input } => {
            cmd_info(&input)?;
        }

        Commands::Batch {
            input_dir,
            output_dir,
            format,
            sequential,
            filter,
        } => {
            cmd_batch(&input_dir, &output_dir, format.into(), sequential, &filter.options())?;
        }
    }

    Ok(())
}

fn cmd_blocks(resource: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(resource)?;
    let file = ResourceFile::parse(&bytes)?;
    let header = file.header();

    println!("File: {}", resource.display());
    println!("Size: {} bytes (header says {})", bytes.len(), header.file_size);
    println!("Header version: {}, version: {}", header.header_version, header.version);
    println!("Blocks: {}", header.block_count);

    for (i, entry) in file.entries().iter().enumerate() {
        println!(
            "  {:>3}  {}  offset {:>10}  size {:>10}",
            i, entry.block_type, entry.offset, entry.size
        );
    }

    Ok(())
}

fn cmd_dump_block(
    resource: &Path,
    output: &Path,
    block: BlockType,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(resource)?;
    let data = ResourceFile::parse(&bytes)?.block(block)?;

    fs::write(output, data)?;
    println!("Saved: {} ({} bytes of {})", output.display(), data.len(), block);

    Ok(())
}

/// Decode a JSON physics tree and extract its collision chunks.
fn extract_file(input: &Path, options: &ExtractOptions) -> phystri::Result<Extraction> {
    let bytes = fs::read(input)?;
    let tree = JsonKvDecoder.decode(&bytes)?;
    extract_physics(&tree, options)
}

fn cmd_extract(
    input: &Path,
    output: &Path,
    options: &ExtractOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let extraction = extract_file(input, options)?;
    let elapsed = start.elapsed();

    println!(
        "Extracted: {} triangles in {} chunks ({:.2?})",
        extraction.num_triangles(),
        extraction.chunks.len(),
        elapsed
    );
    for skipped in &extraction.skipped {
        println!("Skipped {} {}: {}", skipped.kind, skipped.index, skipped.reason);
    }

    if let Some(warning) = unreadable_warning(&extraction, output) {
        log::warn!("{}", warning);
        println!("Warning: {}", warning);
    }

    io::save(&extraction.chunks, output)?;
    println!("Saved: {}", output.display());

    Ok(())
}

/// A chunked file with no chunks is written but cannot be read back.
fn unreadable_warning(extraction: &Extraction, output: &Path) -> Option<String> {
    let chunked = Format::from_path(output).is_some_and(Format::is_chunked);
    (chunked && extraction.chunks.is_empty())
        .then(|| format!("no collision parts extracted; {} will not load", output.display()))
}

fn cmd_convert(input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let chunks = io::load(input)?;
    println!(
        "Loaded: {} triangles in {} chunks",
        chunks.iter().map(Vec::len).sum::<usize>(),
        chunks.len()
    );

    io::save(&chunks, output)?;
    println!("Saved: {}", output.display());

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let chunks = io::load(input)?;
    let triangles: Vec<&Triangle> = chunks.iter().flatten().collect();

    println!("File: {}", input.display());
    println!("Chunks: {}", chunks.len());
    println!("Triangles: {}", triangles.len());

    if chunks.len() > 1 {
        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        let empty = sizes.iter().filter(|&&n| n == 0).count();
        let largest = sizes.iter().copied().max().unwrap_or(0);
        println!("Chunk sizes: largest {}, {} empty", largest, empty);
    }

    let total_area: f32 = triangles.iter().map(|t| t.area()).sum();
    let degenerate = triangles.iter().filter(|t| t.is_degenerate()).count();
    println!("Surface area: {:.6}", total_area);
    println!("Degenerate triangles: {}", degenerate);

    if let Some((min, max)) = bounding_box(triangles.iter().copied()) {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    Ok(())
}

fn cmd_batch(
    input_dir: &Path,
    output_dir: &Path,
    format: Format,
    sequential: bool,
    options: &ExtractOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut inputs: Vec<PathBuf> = fs::read_dir(input_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e.eq_ignore_ascii_case("json")))
        .collect();
    inputs.sort();

    if inputs.is_empty() {
        return Err(format!("no .json files in {}", input_dir.display()).into());
    }
    fs::create_dir_all(output_dir)?;

    let mode = if sequential { "sequential" } else { "parallel" };
    println!("Processing {} files ({})...", inputs.len(), mode);

    let process = |input: &PathBuf| -> bool {
        let stem = input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let output = output_dir.join(format!("{}.{}", stem, format.extension()));

        let result = extract_file(input, options).and_then(|extraction| {
            let warning = unreadable_warning(&extraction, &output);
            io::save(&extraction.chunks, &output)?;
            Ok((extraction.num_triangles(), warning))
        });

        match result {
            Ok((n, None)) => {
                println!("[SUCC] {} ({} triangles)", stem, n);
                true
            }
            Ok((_, Some(warning))) => {
                log::warn!("{}: {}", stem, warning);
                println!("[WARN] {}: {}", stem, warning);
                true
            }
            Err(e) => {
                println!("[FAIL] {}: {}", stem, e);
                false
            }
        }
    };

    let start = Instant::now();
    let succeeded = if sequential {
        inputs.iter().filter(|&p| process(p)).count()
    } else {
        inputs.par_iter().filter(|&p| process(p)).count()
    };
    let elapsed = start.elapsed();

    println!(
        "Done: {} succeeded, {} failed ({:.2?})",
        succeeded,
        inputs.len() - succeeded,
        elapsed
    );

    if succeeded < inputs.len() {
        return Err(format!("{} of {} files failed", inputs.len() - succeeded, inputs.len()).into());
    }

    Ok(())
}
