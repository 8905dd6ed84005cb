use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use coating_thickness::{default_output_dir, AnalyzerConfig, FrameReport, ThicknessAnalyzer};

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// Union of profile masks, weighted-linear fusion
    Advanced,
    /// Largest profile mask, banded fusion, 640x480
    Simple,
}

#[derive(Parser)]
#[command(
    name = "coating-thickness",
    about = "Estimate coating thickness from color, gloss, grain and flow heuristics",
    version,
    after_help = "Simple usage: coating-thickness <image>  \
                  (writes diagnostics to <name>_thickness/)\n\n\
                  RUST_LOG overrides the log level chosen by --verbose/--quiet."
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Directory for diagnostic images (default: {name}_thickness)
    #[arg(short, long)]
    output: Option<String>,

    /// TOML configuration file (overrides --preset)
    #[arg(short, long)]
    config: Option<String>,

    /// Built-in configuration preset
    #[arg(short, long, value_enum, default_value = "advanced")]
    preset: Preset,

    /// Print one JSON summary per frame on stdout
    #[arg(long)]
    json: bool,

    /// Do not write diagnostic images
    #[arg(long)]
    no_images: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = match &cli.config {
        Some(path) => match AnalyzerConfig::from_file(Path::new(path)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: Failed to load config {path}: {e}");
                process::exit(1);
            }
        },
        None => match cli.preset {
            Preset::Advanced => AnalyzerConfig::advanced(),
            Preset::Simple => AnalyzerConfig::simple(),
        },
    };

    let analyzer = match ThicknessAnalyzer::new(config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Fatal: {e}");
            process::exit(1);
        }
    };

    let config = analyzer.config();
    tracing::debug!(
        fusion = ?config.fusion,
        mask_selection = ?config.mask_selection,
        reflectance_scope = ?config.reflectance_scope,
        profiles = config.profiles.len(),
        "analyzer ready"
    );

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    let results = if input_path.is_dir() {
        let output_dir = match (&cli.output, cli.no_images) {
            (_, true) => None,
            (Some(o), false) => Some(PathBuf::from(o)),
            (None, false) => Some(input_path.join("thickness")),
        };
        analyzer.analyze_directory(input_path, output_dir.as_deref())
    } else {
        let output_dir = match (&cli.output, cli.no_images) {
            (_, true) => None,
            (Some(o), false) => Some(PathBuf::from(o)),
            (None, false) => Some(default_output_dir(input_path)),
        };
        vec![analyzer.analyze_file(input_path, output_dir.as_deref())]
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &cli);
        if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Analyzed: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(report: &FrameReport, cli: &Cli) {
    let filename = report.path.file_name().map_or_else(
        || report.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if cli.json {
        if let Some(summary) = &report.summary {
            match serde_json::to_string(summary) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("[FAIL] {filename}: {e}"),
            }
        }
    }

    if report.success {
        if !cli.quiet && !cli.json {
            eprintln!("[OK] {filename}: {}", report.message);
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", report.message);
    }

    if cli.verbose {
        if let Some(s) = &report.summary {
            eprintln!(
                "  -> coverage={:.2} reflection={:.2} texture={:.2} viscosity={:.2}",
                s.color_coverage, s.reflection_ratio, s.texture_score, s.viscosity_score
            );
        }
    }
}
