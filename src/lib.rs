//! Curve To Texture — bake four 1-D curves into a 32x1 RGBA lookup strip.
//! - `curve`: the curve capability plus authored keyframes with easing
//! - `bake`: sample, clamp, quantize and encode to PNG
//! - `asset`: `Assets/` path rules, atomic writes and import settings
//! - `project`: JSON/TOML project files and the dirty-flag baking session

pub mod asset;
pub mod bake;
pub mod curve;
pub mod error;
pub mod logging;
pub mod project;

pub use asset::{AssetImporter, AssetPath, ImportSettings, PathError, SidecarImporter};
pub use bake::{decode_png, encode_png, render, PixelBuffer, HEIGHT, WIDTH};
pub use curve::{Constant, Curve, Easing, Keyframe, Keyframes};
pub use error::BakeError;
pub use project::{
    bake_to_asset, load_project, save_project, BakeProject, BakeReport, BakeSession, Channel,
    CurveSet,
};
