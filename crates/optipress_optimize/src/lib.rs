//! Format-matched image compression through external tools.
//!
//! Each accepted image format maps to a command template for an external
//! compressor (stock: `pngquant` for PNG, `jpegtran` for JPEG). The
//! dispatcher runs the one matching a file's sniffed format and judges the
//! outcome from the written output file; it never inspects image bytes
//! itself, and it never runs a compressor against the wrong format's bytes.

mod dispatch;
mod tool;

pub use dispatch::{OptimizedArtifact, Optimizer};
pub use tool::{INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER, ToolSpec};

pub use optipress_error::{OptimizeError, OptimizeErrorKind};
