//! External compressor command templates.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placeholder replaced by the source file path at dispatch time.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Placeholder replaced by the destination file path at dispatch time.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Command template for one format's external compressor.
///
/// The compressor contract is a fixed argv where `{input}` and `{output}`
/// stand in for concrete paths: the tool reads the input file, writes the
/// output file, and signals failure through its exit status. Nothing else
/// about the tool is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ToolSpec {
    /// Program name or path.
    program: String,
    /// Argument template, possibly containing placeholders.
    args: Vec<String>,
}

impl ToolSpec {
    /// Build a template from a program and its argument list.
    pub fn new(
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The stock PNG compressor: lossy palette quantization via pngquant,
    /// speed 4, full dithering, posterization level 1, metadata stripped.
    pub fn pngquant() -> Self {
        Self::new(
            "pngquant",
            [
                "--speed",
                "4",
                "--strip",
                "--floyd=1",
                "--posterize",
                "1",
                "--force",
                "--output",
                OUTPUT_PLACEHOLDER,
                "--",
                INPUT_PLACEHOLDER,
            ],
        )
    }

    /// The stock JPEG compressor: progressive re-encode via jpegtran,
    /// metadata dropped, arithmetic coding left off.
    pub fn jpegtran() -> Self {
        Self::new(
            "jpegtran",
            [
                "-copy",
                "none",
                "-progressive",
                "-outfile",
                OUTPUT_PLACEHOLDER,
                INPUT_PLACEHOLDER,
            ],
        )
    }

    /// Substitute concrete paths into the argument template.
    pub(crate) fn render(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect()
    }
}
