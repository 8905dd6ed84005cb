//! Estimate the thickness of a coating visible in a single video frame.
//!
//! The pipeline is deterministic and stateless. One frame goes in, one
//! [`ThicknessResult`] comes out:
//! 1. **Color classification**: HSV profiles select substance pixels
//! 2. **Reflectance**: share of specular highlights above a gloss threshold
//! 3. **Texture**: Canny edge particles per pixel on a saturating curve
//! 4. **Flow**: dispersion of the Sobel gradient field as a viscosity proxy
//! 5. **Fusion**: weighted-linear or banded combination into a 0-100 score
//!
//! # Quick Start
//!
//! ```no_run
//! use coating_thickness::{AnalyzerConfig, Frame, ThicknessAnalyzer};
//!
//! let analyzer = ThicknessAnalyzer::new(AnalyzerConfig::default()).expect("valid config");
//! let frame = Frame::open("frame.jpg".as_ref()).unwrap();
//! let result = analyzer.analyze(&frame);
//! println!("Thickness: {:.2}%", result.percentage);
//! ```
//!
//! # Presets
//!
//! [`AnalyzerConfig::advanced`] unions all profile masks and fuses all four
//! signals linearly. [`AnalyzerConfig::simple`] keeps only the largest profile
//! mask and maps coverage through thickness bands:
//!
//! ```no_run
//! use coating_thickness::{AnalyzerConfig, ThicknessAnalyzer};
//!
//! let analyzer = ThicknessAnalyzer::new(AnalyzerConfig::simple()).expect("valid config");
//! let img = image::open("frame.jpg").unwrap().to_rgb8();
//! let result = analyzer.analyze_image(img).unwrap();
//! if let Some(band) = result.thickness {
//!     println!("{band}: {:.2}%", result.percentage);
//! }
//! ```

#![deny(missing_docs)]

pub mod color;
pub mod config;
mod engine;
pub mod error;
pub mod flow;
pub mod frame;
pub mod fusion;
pub mod mask;
pub mod reflectance;
pub mod segmentation;
pub mod texture;
pub mod visualize;

pub use color::{ColorProfile, ColorRange, HsvBounds};
pub use config::{AnalyzerConfig, FusionPolicy, FusionWeights, MaskSelection, ReflectanceScope};
pub use engine::{
    default_output_dir, is_supported_image, save_visualizations, FrameReport, ThicknessAnalyzer,
    ThicknessResult, ThicknessSummary,
};
pub use error::{Error, Result};
pub use frame::Frame;
pub use fusion::{Signals, ThicknessBand};
pub use mask::Mask;
pub use visualize::Visualizations;
