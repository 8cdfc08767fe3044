//! Command-line interface implementation

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

use crate::bitmap::BitmapCodec;
use crate::code::CodeIdentity;
use crate::config::{load_config, merge_cli_overrides, CliOverrides, CodecConfig, ColorSpace, ConfigError};
use crate::design::{Design, DesignMeta};
use crate::document::DesignDocument;
use crate::encode::{encode_basic, encode_design, encode_tiled, Encoded, FitMode};
use crate::error::DesignError;
use crate::output::{load_rgba, output_path, save_png, scale_image, OutputError};
use crate::variant::{Parts, Variant};

/// Exit codes
const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_INVALID_ARGS: u8 = 2;

/// Design bitmap codec - decode, encode and tile palette-indexed designs
#[derive(Parser)]
#[command(name = "dcx")]
#[command(about = "Decode, encode and tile 4-bit palette-indexed design bitmaps")]
#[command(version)]
pub struct Cli {
    /// Path to design.toml (default: discovered from the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the maximum number of tiles per upload
    #[arg(long, global = true)]
    pub max_tiles: Option<usize>,

    /// Override the quantizer color space (lab or rgb)
    #[arg(long, global = true, value_parser = parse_color_space)]
    pub color_space: Option<ColorSpace>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the design code for a numeric id
    Code {
        id: u64,
    },

    /// Print the numeric id for a design code
    Id {
        code: String,
    },

    /// List every design variant with its parts
    Variants {
        /// Print as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Render a design document to PNG
    Render {
        /// Input design document (JSON)
        input: PathBuf,

        /// Output file or directory.
        /// If omitted: {input}_{part}.png
        /// If file (one image): output.png
        /// If file (several): output_{part}.png
        /// If directory (ends with /): dir/{part}.png
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Render one packed layer by index
        #[arg(long, conflicts_with_all = ["part", "net", "flatten"])]
        layer: Option<usize>,

        /// Render one part by name
        #[arg(long, conflicts_with_all = ["net", "flatten"])]
        part: Option<String>,

        /// Render every part side by side
        #[arg(long, conflicts_with = "flatten")]
        net: bool,

        /// Stack every packed layer into one tile
        #[arg(long)]
        flatten: bool,

        /// Scale output by integer factor (1-16, default: 1)
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u8).range(1..=16))]
        scale: u8,
    },

    /// Encode images into a design document
    Encode {
        /// Image for a basic design
        input: Option<PathBuf>,

        /// Variant name or type code
        #[arg(long, default_value = "basic")]
        variant: String,

        /// Image for a named part (repeatable), e.g. --part front=front.png
        #[arg(long = "part", value_name = "NAME=PATH")]
        parts: Vec<String>,

        /// Design name
        #[arg(long, default_value = "")]
        name: String,

        /// Island name
        #[arg(long, default_value = "")]
        island: String,

        /// How a basic design image is brought to tile size (pad or scale)
        #[arg(long, default_value = "pad", value_parser = parse_fit_mode)]
        fit: FitMode,

        /// Output document path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Split a large image into tiles and encode each as a basic design
    Tile {
        /// Source image
        input: PathBuf,

        /// Base design name; tiles are named "{name} {position}"
        #[arg(long, default_value = "")]
        name: String,

        /// Island name
        #[arg(long, default_value = "")]
        island: String,

        /// Output directory for the tile documents
        #[arg(short, long, default_value = "tiles/")]
        output: PathBuf,
    },
}

/// Failures surfaced by the CLI
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0} (error code {code})", code = .0.code())]
    Design(#[from] DesignError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error("Invalid design document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    InvalidArgs(String),
}

impl CliError {
    fn exit_status(&self) -> u8 {
        match self {
            CliError::Config(_) | CliError::InvalidArgs(_) => EXIT_INVALID_ARGS,
            _ => EXIT_ERROR,
        }
    }
}

fn parse_color_space(s: &str) -> Result<ColorSpace, String> {
    ColorSpace::from_str(s).ok_or_else(|| format!("unknown color space '{}' (expected lab or rgb)", s))
}

fn parse_fit_mode(s: &str) -> Result<FitMode, String> {
    FitMode::from_str(s).ok_or_else(|| format!("unknown fit mode '{}' (expected pad or scale)", s))
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match dispatch(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            if let CliError::Design(design_error) = &e {
                log::debug!("{}", design_error.context());
            }
            ExitCode::from(e.exit_status())
        }
    }
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    let mut config = load_config(cli.config.as_deref())?;
    let overrides = CliOverrides { max_tiles: cli.max_tiles, color_space: cli.color_space };
    merge_cli_overrides(&mut config, &overrides)?;

    match cli.command {
        Commands::Code { id } => {
            let code = CodeIdentity::new(&config).encode(id)?;
            println!("{}", code);
            Ok(())
        }
        Commands::Id { code } => {
            let id = CodeIdentity::new(&config).decode(code.trim())?;
            println!("{}", id);
            Ok(())
        }
        Commands::Variants { json } => run_variants(json),
        Commands::Render { input, output, layer, part, net, flatten, scale } => {
            let selection = if let Some(index) = layer {
                Selection::Layer(index)
            } else if let Some(name) = part {
                Selection::Part(name)
            } else if net {
                Selection::Net
            } else if flatten {
                Selection::Flatten
            } else {
                Selection::AllParts
            };
            run_render(&input, output.as_deref(), selection, scale, &config)
        }
        Commands::Encode { input, variant, parts, name, island, fit, output } => {
            let meta = DesignMeta { design_name: name, island_name: island, ..Default::default() };
            run_encode(input.as_deref(), &variant, &parts, meta, fit, output.as_deref(), &config)
        }
        Commands::Tile { input, name, island, output } => {
            let meta = DesignMeta { design_name: name, island_name: island, ..Default::default() };
            run_tile(&input, meta, &output, &config)
        }
    }
}

fn run_variants(json: bool) -> Result<(), CliError> {
    if json {
        let list: Vec<serde_json::Value> = Variant::all()
            .iter()
            .map(|v| {
                serde_json::json!({
                    "type_code": v.type_code,
                    "name": v.name,
                    "display_name": v.display_name,
                    "category": v.category,
                    "layers": v.layers,
                    "parts": v.parts.iter().map(|p| serde_json::json!({
                        "name": p.name,
                        "width": p.width,
                        "height": p.height,
                    })).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    for v in Variant::all() {
        let parts: Vec<String> = v.parts.iter().map(|p| format!("{} {}x{}", p.name, p.width, p.height)).collect();
        println!("{:>4}  {:<24} {:<9} {}", v.type_code, v.name, v.category.to_string(), parts.join(", "));
    }
    Ok(())
}

/// Which rasters `render` writes
enum Selection {
    Layer(usize),
    Part(String),
    Net,
    Flatten,
    AllParts,
}

fn read_document(path: &Path) -> Result<DesignDocument, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::InvalidArgs(format!("Cannot open input file '{}': {}", path.display(), e)))?;
    Ok(DesignDocument::from_json(&text)?)
}

fn run_render(
    input: &Path,
    output: Option<&Path>,
    selection: Selection,
    scale: u8,
    config: &CodecConfig,
) -> Result<(), CliError> {
    let doc = read_document(input)?;
    let design = Design::from_document(&doc, config)?;
    let codec = BitmapCodec::new(config);

    let images: Vec<(String, image::RgbaImage)> = match selection {
        Selection::Layer(index) => vec![(index.to_string(), design.render_layer(index, &codec)?)],
        Selection::Part(name) => {
            let image = design.render_part(&name, &codec)?;
            vec![(name, image)]
        }
        Selection::Net => vec![("net".to_string(), design.net_image(&codec)?)],
        Selection::Flatten => vec![("flat".to_string(), design.flatten(config)?)],
        Selection::AllParts => design
            .render_parts(&codec)?
            .into_iter()
            .map(|(name, image)| (name.to_string(), image))
            .collect(),
    };

    // Without -o: {input_stem}_{name}.png next to the input
    let default_output;
    let (output, is_single) = match output {
        Some(path) => (path, images.len() == 1),
        None => {
            let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("design");
            default_output = input.with_file_name(format!("{}.png", stem));
            (default_output.as_path(), false)
        }
    };

    for (name, image) in images {
        let path = output_path(output, &name, is_single);
        save_png(&scale_image(image, scale), &path)?;
        println!("Saved {}", path.display());
    }
    Ok(())
}

/// Parse `NAME=PATH` part arguments.
fn parse_part_args(args: &[String]) -> Result<Vec<(String, PathBuf)>, CliError> {
    args.iter()
        .map(|arg| {
            let (name, path) = arg
                .split_once('=')
                .ok_or_else(|| CliError::InvalidArgs(format!("Expected NAME=PATH, got '{}'", arg)))?;
            Ok((name.to_string(), PathBuf::from(path)))
        })
        .collect()
}

fn report_quantized(encoded: &Encoded) {
    if encoded.was_quantized {
        eprintln!(
            "Warning: colors were reduced to {} to fit the palette",
            encoded.design.palette().len()
        );
    }
}

fn write_document(design: &Design, output: Option<&Path>) -> Result<(), CliError> {
    let json = design.to_document().to_json()?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(path, json)?;
            println!("Saved {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn run_encode(
    input: Option<&Path>,
    variant_key: &str,
    part_args: &[String],
    meta: DesignMeta,
    fit: FitMode,
    output: Option<&Path>,
    config: &CodecConfig,
) -> Result<(), CliError> {
    let variant = Variant::lookup(variant_key)?;

    let encoded = if variant.is_pro() {
        if input.is_some() {
            return Err(CliError::InvalidArgs(format!(
                "{} designs take --part NAME=PATH arguments, not a single image",
                variant.name
            )));
        }
        let mut parts = Parts::new();
        for (name, path) in parse_part_args(part_args)? {
            parts.insert(name, load_rgba(&path)?);
        }
        encode_design(variant, &parts, meta, config)?
    } else {
        let path = input.ok_or_else(|| CliError::InvalidArgs("Missing input image".to_string()))?;
        encode_basic(&load_rgba(path)?, fit, meta, config)?
    };

    report_quantized(&encoded);
    write_document(&encoded.design, output)
}

fn run_tile(input: &Path, meta: DesignMeta, output: &Path, config: &CodecConfig) -> Result<(), CliError> {
    let image = load_rgba(input)?;
    let tiles = encode_tiled(&image, meta, config)?;

    let quantized = tiles.iter().filter(|t| t.encoded.was_quantized).count();
    for tile in &tiles {
        let path = output.join(format!("{}.json", tile.position));
        write_document(&tile.encoded.design, Some(&path))?;
    }
    if quantized > 0 {
        eprintln!("Warning: {} of {} tiles had their colors reduced", quantized, tiles.len());
    }
    Ok(())
}
