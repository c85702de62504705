use clap::{Parser, Subcommand};
use rasterkit::archive::ZipArchiver;
use rasterkit::batch::{self, BatchOperation, BatchOptions, BatchResult, SourceFile};
use rasterkit::config::{self, RasterConfig};
use rasterkit::imaging::{
    EncodedBlob, FaviconSize, FlipAxis, ImageFormat, Quality, RustBackend, TransformRequest,
    operations, supported_input_extensions,
};
use rasterkit::{naming, output};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "rasterkit")]
#[command(about = "Convert, compress and edit raster images")]
#[command(long_about = "\
Convert, compress and edit raster images

Every command reads image files (or directories of them), works entirely in
memory, and writes one output file. Several inputs produce a single ZIP
archive; one input produces the image itself.

Formats are detected from file contents, not extensions. Readable: JPEG,
PNG, WebP, BMP, ICO, GIF, TIFF. Writable: JPEG, PNG, WebP, BMP, ICO, AVIF.

Compression may change the format: a PNG that shrinks as JPEG is written
as .jpg.

Run 'rasterkit gen-config' to generate a documented rasterkit.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./rasterkit.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log decisions (format detection, compression steps) to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Output path shared by every command that writes a file.
#[derive(clap::Args, Clone)]
struct OutputArg {
    /// Output file (default: derived from the input name)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Convert images to another format
    Convert {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Target format: jpeg, png, webp, bmp, ico, avif
        #[arg(long)]
        to: ImageFormat,
        /// Lossy quality, 0.0 to 1.0
        #[arg(long)]
        quality: Option<f32>,
        #[command(flatten)]
        out: OutputArg,
    },
    /// Shrink images, possibly changing PNG to JPEG
    Compress {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Starting quality, 0.0 to 1.0
        #[arg(long)]
        quality: Option<f32>,
        #[command(flatten)]
        out: OutputArg,
    },
    /// Resample to an exact size
    Resize {
        input: PathBuf,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[command(flatten)]
        out: OutputArg,
    },
    /// Rotate clockwise by any angle
    Rotate {
        input: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        degrees: f64,
        #[command(flatten)]
        out: OutputArg,
    },
    /// Mirror horizontally or vertically
    Flip {
        input: PathBuf,
        /// horizontal or vertical
        #[arg(long)]
        axis: FlipAxis,
        #[command(flatten)]
        out: OutputArg,
    },
    /// Convert to grayscale (BT.601 luma)
    Grayscale {
        input: PathBuf,
        #[command(flatten)]
        out: OutputArg,
    },
    /// Scale saturation (0 = gray, 1 = unchanged)
    Saturate {
        input: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        factor: f32,
        #[command(flatten)]
        out: OutputArg,
    },
    /// Rotate hue by degrees
    Hue {
        input: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        shift: f64,
        #[command(flatten)]
        out: OutputArg,
    },
    /// Stack images vertically into one PNG
    Merge {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[command(flatten)]
        out: OutputArg,
    },
    /// Make a square favicon (ICO)
    Favicon {
        input: PathBuf,
        /// Edge length: 16, 32 or 48
        #[arg(long)]
        size: Option<FaviconSize>,
        #[command(flatten)]
        out: OutputArg,
    },
    /// Generate a solid placeholder image with a centered label
    Placeholder {
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[arg(long)]
        text: Option<String>,
        /// Background color (#rgb, #rrggbb, #rrggbbaa)
        #[arg(long)]
        background: Option<String>,
        /// Text color
        #[arg(long)]
        color: Option<String>,
        #[command(flatten)]
        out: OutputArg,
    },
    /// Show format, dimensions and size of images
    Inspect {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print a stock rasterkit.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let cwd = std::env::current_dir()?;
    let config = config::load_config(cli.config.as_deref(), &cwd)?;
    init_thread_pool(&config.processing);
    let backend = RustBackend::new();

    match cli.command {
        Command::Convert {
            inputs,
            to,
            quality,
            out,
        } => {
            let quality = quality.map(Quality::new).unwrap_or(config.convert_quality());
            let files = read_inputs(&inputs)?;
            let operation = BatchOperation::Convert {
                format: to,
                quality: Some(quality),
            };
            let archive_name = naming::converted_archive_name(to);
            run_and_write(&config, &files, &operation, out.output, &archive_name)?;
        }
        Command::Compress {
            inputs,
            quality,
            out,
        } => {
            let quality = quality.map(Quality::new).unwrap_or(config.compress_quality());
            let files = read_inputs(&inputs)?;
            let operation = BatchOperation::Compress { quality };
            run_and_write(&config, &files, &operation, out.output, naming::COMPRESSED_ARCHIVE)?;
        }
        Command::Resize {
            input,
            width,
            height,
            out,
        } => edit(&config, &input, TransformRequest::Resize { width, height }, out)?,
        Command::Rotate {
            input,
            degrees,
            out,
        } => edit(&config, &input, TransformRequest::Rotate { degrees }, out)?,
        Command::Flip { input, axis, out } => {
            edit(&config, &input, TransformRequest::Flip(axis), out)?
        }
        Command::Grayscale { input, out } => {
            edit(&config, &input, TransformRequest::Grayscale, out)?
        }
        Command::Saturate { input, factor, out } => {
            edit(&config, &input, TransformRequest::Saturation { factor }, out)?
        }
        Command::Hue { input, shift, out } => {
            edit(&config, &input, TransformRequest::Hue { degrees: shift }, out)?
        }
        Command::Merge { inputs, out } => {
            let blobs: Vec<EncodedBlob> = read_inputs(&inputs)?
                .into_iter()
                .map(|file| file.blob)
                .collect();
            let merged = operations::merge(&backend, &blobs)?;
            let default = format!("{}.{}", naming::MERGED_STEM, merged.format().extension());
            write_blob(&merged, &out.output.unwrap_or_else(|| PathBuf::from(default)))?;
        }
        Command::Favicon { input, size, out } => {
            let file = read_file(&input)?;
            let size = size.unwrap_or(config.favicon_size());
            let icon = operations::make_favicon(&backend, &file.blob, size)?;
            let default = format!("{}.{}", naming::FAVICON_STEM, icon.format().extension());
            write_blob(&icon, &out.output.unwrap_or_else(|| PathBuf::from(default)))?;
        }
        Command::Placeholder {
            width,
            height,
            text,
            background,
            color,
            out,
        } => {
            let mut spec = config.placeholder.spec(width, height)?;
            if let Some(text) = text {
                spec.text = text;
            }
            if let Some(bg) = background {
                spec.background = config::parse_color("--background", &bg)?;
            }
            if let Some(fg) = color {
                spec.color = config::parse_color("--color", &fg)?;
            }
            let image = operations::placeholder(&backend, &spec)?;
            let default = naming::placeholder_name(width, height);
            write_blob(&image, &out.output.unwrap_or_else(|| PathBuf::from(default)))?;
        }
        Command::Inspect { inputs, json } => inspect(&backend, &inputs, json)?,
        Command::GenConfig => unreachable!("handled before config loading"),
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "rasterkit=debug"
    } else {
        "rasterkit=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Expand directories (recursively, sorted) into supported image files.
fn collect_inputs(paths: &[PathBuf]) -> std::io::Result<Vec<PathBuf>> {
    let extensions = supported_input_extensions();
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::other)?;
            let supported = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.contains(&e.to_ascii_lowercase().as_str()));
            if entry.file_type().is_file() && supported {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

fn read_file(path: &Path) -> std::io::Result<SourceFile> {
    let bytes = std::fs::read(path)?;
    Ok(SourceFile::new(
        path.to_string_lossy(),
        EncodedBlob::from_bytes(bytes),
    ))
}

fn read_inputs(paths: &[PathBuf]) -> Result<Vec<SourceFile>, Box<dyn std::error::Error>> {
    let files = collect_inputs(paths)?;
    if files.is_empty() {
        return Err("no supported image files found in the given inputs".into());
    }
    Ok(files
        .iter()
        .map(|path| read_file(path))
        .collect::<std::io::Result<Vec<_>>>()?)
}

/// Run a batch with a progress printer and write the result.
///
/// A single result lands at its derived name, several at `archive_name`,
/// unless `--output` says otherwise.
fn run_and_write(
    config: &RasterConfig,
    files: &[SourceFile],
    operation: &BatchOperation,
    output_path: Option<PathBuf>,
    archive_name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_batch_event(&event) {
                println!("{}", line);
            }
        }
    });
    let options = BatchOptions {
        events: Some(tx),
        cancel: None,
        edit_quality: config.edit_quality(),
    };
    let result = batch::run_batch(&RustBackend::new(), &ZipArchiver::new(), files, operation, &options);
    drop(options);
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;
    let result = result?;

    let path = output_path.unwrap_or_else(|| match &result {
        BatchResult::Single(item) => PathBuf::from(&item.filename),
        BatchResult::Archive { .. } => PathBuf::from(archive_name),
    });
    std::fs::write(&path, result.blob().bytes())?;
    output::print_batch_result(&result, &path);
    Ok(())
}

fn edit(
    config: &RasterConfig,
    input: &Path,
    request: TransformRequest,
    out: OutputArg,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = read_file(input)?;
    let operation = BatchOperation::Edit(request);
    run_and_write(config, &[file], &operation, out.output, "edited.zip")
}

fn write_blob(blob: &EncodedBlob, path: &Path) -> std::io::Result<()> {
    std::fs::write(path, blob.bytes())?;
    println!("{}", output::format_written(path, blob));
    Ok(())
}

#[derive(Serialize)]
struct InspectRecord<'a> {
    file: String,
    #[serde(flatten)]
    info: &'a operations::ImageInfo,
}

fn inspect(
    backend: &RustBackend,
    inputs: &[PathBuf],
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let files = read_inputs(inputs)?;
    let infos = files
        .iter()
        .map(|file| operations::inspect(backend, &file.blob))
        .collect::<Result<Vec<_>, _>>()?;
    if json {
        let records: Vec<InspectRecord> = files
            .iter()
            .zip(&infos)
            .map(|(file, info)| InspectRecord {
                file: file.name.clone(),
                info,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        for (file, info) in files.iter().zip(&infos) {
            output::print_image_info(&file.name, info);
        }
    }
    Ok(())
}
