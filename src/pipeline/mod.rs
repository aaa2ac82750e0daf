//! Preprocessor / postprocessor chains (spec §4.7).

pub mod postprocess;
pub mod preprocess;

pub use postprocess::{run_postprocessors, Postprocessor};
pub use preprocess::{run_preprocessors, NormalizeLineEndings, NormalizeSchemaKeys, Preprocessor, TrimInput};
