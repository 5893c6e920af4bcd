// ============================================================================
// MangaMark CLI — headless batch watermarking via command-line arguments
// ============================================================================
//
// Usage examples:
//   mangamark --input page.png --text "© studio" --output marked.png
//   mangamark -i "pages/*.jpg" --settings preset.json --output-dir marked/
//   mangamark -i cover.png --watermark-image logo.png --position bottom-right
//
// All processing runs synchronously on the current thread; output is always
// PNG.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::io::{load_image_file, save_png_file};
use crate::{log_err, log_info};
use crate::ops::position::PresetPosition;
use crate::ops::watermark;
use crate::settings::{
    ImageWatermarkConfig, TextWatermarkConfig, WatermarkConfig, WatermarkSettings,
};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// MangaMark headless watermarker.
///
/// Apply a text or image watermark to image files without opening a UI.
#[derive(Parser, Debug)]
#[command(
    name = "mangamark",
    about = "MangaMark headless batch watermarker",
    long_about = "Apply a text or image watermark to one or many images.\n\n\
                  Example:\n  \
                  mangamark --input page.png --text \"© studio\" --output marked.png\n  \
                  mangamark -i \"pages/*.jpg\" --settings preset.json --output-dir marked/"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "pages/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Watermark settings JSON file. Missing fields take their defaults.
    #[arg(short, long, value_name = "SETTINGS.json")]
    pub settings: Option<PathBuf>,

    /// Text watermark content. Overrides the settings file's text, or builds
    /// a default text watermark when no settings file is given.
    #[arg(short, long)]
    pub text: Option<String>,

    /// Image file to use as the watermark mark (switches to an image
    /// watermark unless the settings file already configured one).
    #[arg(short = 'w', long, value_name = "IMAGE")]
    pub watermark_image: Option<PathBuf>,

    /// Preset position: top-left, top-center, top-right, middle-left,
    /// center, middle-right, bottom-left, bottom-center, bottom-right.
    #[arg(short, long, value_name = "PRESET")]
    pub position: Option<String>,

    /// Watermark opacity in percent (0–100).
    #[arg(long, value_name = "0-100")]
    pub opacity: Option<f32>,

    /// Rotation in degrees (normalized into [0, 360]).
    #[arg(short, long, value_name = "DEGREES")]
    pub rotation: Option<f32>,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    // Resolve glob patterns / literal paths → concrete PathBufs
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched.");
        return ExitCode::FAILURE;
    }

    // Multiple inputs require --output-dir, not --output
    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: --output names a single file but {} inputs matched; use --output-dir for batches.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    // Assemble watermark settings from the settings file and flag overrides
    let settings = match build_settings(&args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Decode the watermark bitmap once, shared across all inputs
    let image_handle = match &settings.config {
        WatermarkConfig::Image(cfg) if !cfg.image_data.is_empty() => {
            match crate::io::decode_image(&cfg.image_data) {
                Ok(img) => Some(img),
                Err(e) => {
                    eprintln!("error: watermark image: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        WatermarkConfig::Image(_) => {
            eprintln!("error: image watermark configured but no --watermark-image given.");
            return ExitCode::FAILURE;
        }
        WatermarkConfig::Text(_) => None,
    };

    // Create output directory if specified
    if let Some(dir) = &args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "error: creating output directory '{}': {}",
                dir.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;
    log_info!("processing {} input file(s)", total);

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();

        let output_path = match build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
        ) {
            Some(p) => p,
            None => {
                eprintln!(
                    "  error: no usable output path for '{}'.",
                    input_path.display()
                );
                any_failure = true;
                continue;
            }
        };

        match run_one(input_path, &output_path, &settings, image_handle.as_ref()) {
            Ok(()) => {
                log_info!(
                    "{} -> {} ({:.0}ms)",
                    input_path.display(),
                    output_path.display(),
                    file_start.elapsed().as_secs_f64() * 1000.0
                );
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                log_err!("{}: {}", input_path.display(), e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    input: &Path,
    output: &Path,
    settings: &WatermarkSettings,
    image_handle: Option<&image::RgbaImage>,
) -> Result<(), String> {
    let mut canvas = load_image_file(input).map_err(|e| format!("load failed: {}", e))?;
    watermark::render(settings, &mut canvas, image_handle);
    save_png_file(&canvas, output).map_err(|e| format!("save failed: {}", e))?;
    Ok(())
}

/// Merge the settings file (or defaults) with flag overrides.
fn build_settings(args: &CliArgs) -> Result<WatermarkSettings, String> {
    let mut settings = match &args.settings {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("could not read settings '{}': {}", path.display(), e))?;
            WatermarkSettings::from_json(&json)?
        }
        None => WatermarkSettings::default(),
    };

    // --watermark-image switches to an image watermark and injects the payload
    if let Some(path) = &args.watermark_image {
        let bytes = std::fs::read(path)
            .map_err(|e| format!("could not read watermark image '{}': {}", path.display(), e))?;
        match &mut settings.config {
            WatermarkConfig::Image(cfg) => cfg.image_data = bytes,
            _ => {
                settings.config = WatermarkConfig::Image(ImageWatermarkConfig {
                    image_data: bytes,
                    ..Default::default()
                });
            }
        }
    }

    if let Some(text) = &args.text {
        match &mut settings.config {
            WatermarkConfig::Text(cfg) => cfg.text = text.clone(),
            _ if args.watermark_image.is_none() => {
                settings.config = WatermarkConfig::Text(TextWatermarkConfig {
                    text: text.clone(),
                    ..Default::default()
                });
            }
            _ => {
                return Err("--text and --watermark-image are mutually exclusive".to_string());
            }
        }
    }

    if let Some(preset) = &args.position {
        settings.position.preset = parse_preset(preset)?;
    }

    if let Some(opacity) = args.opacity {
        match &mut settings.config {
            WatermarkConfig::Text(cfg) => cfg.opacity = opacity,
            WatermarkConfig::Image(cfg) => cfg.opacity = opacity,
        }
    }

    if let Some(rotation) = args.rotation {
        settings.position.set_rotation(rotation);
    }

    settings.enabled = true;
    Ok(settings)
}

fn parse_preset(name: &str) -> Result<PresetPosition, String> {
    match name.to_lowercase().as_str() {
        "top-left" => Ok(PresetPosition::TopLeft),
        "top-center" => Ok(PresetPosition::TopCenter),
        "top-right" => Ok(PresetPosition::TopRight),
        "middle-left" => Ok(PresetPosition::MiddleLeft),
        "center" => Ok(PresetPosition::Center),
        "middle-right" => Ok(PresetPosition::MiddleRight),
        "bottom-left" => Ok(PresetPosition::BottomLeft),
        "bottom-center" => Ok(PresetPosition::BottomCenter),
        "bottom-right" => Ok(PresetPosition::BottomRight),
        other => Err(format!("unknown preset position '{}'", other)),
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            // Literal path — use directly
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        // Treat as glob pattern
        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: '{}' matched nothing.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: bad glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: same directory as input, same stem, `.png` extension
///    (appends `_marked` to the stem if it would collide with the input)
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.png", stem)));
    }

    // Write next to the input file
    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.png", stem));

    // Avoid silent overwrite of the input
    if candidate == input {
        Some(parent.join(format!("{}_marked.png", stem)))
    } else {
        Some(candidate)
    }
}
