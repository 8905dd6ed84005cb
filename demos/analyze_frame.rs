//! Analyze a single frame with both presets and save the diagnostics.
//!
//! Usage:
//! ```sh
//! cargo run --example analyze_frame -- input.jpg output_dir
//! ```

use std::env;
use std::path::Path;
use std::process;

use coating_thickness::{save_visualizations, AnalyzerConfig, Frame, ThicknessAnalyzer};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input> <output_dir>", args[0]);
        process::exit(1);
    }

    let frame = match Frame::open(Path::new(&args[1])) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    let output = Path::new(&args[2]);

    for (name, config) in [
        ("advanced", AnalyzerConfig::advanced()),
        ("simple", AnalyzerConfig::simple()),
    ] {
        let analyzer = ThicknessAnalyzer::new(config).expect("presets are valid");
        let result = analyzer.analyze(&frame);
        println!(
            "{name}: {:.2}% {}",
            result.percentage,
            result.thickness.map_or(String::new(), |b| format!("({b})"))
        );
        if let Err(e) = save_visualizations(&result, output, name) {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
