//! Heuristics: format detection, segmentation, validation-type regex
//! primitives, and schema-driven planner-step construction (spec §4.5).

pub mod format;
pub mod instructions;
pub mod planner;
pub mod segmentation;
pub mod validation;

pub use format::{detect_format, parse_key_value};
pub use instructions::{normalize_key, parse_field_instructions};
pub use planner::build_search_steps;
pub use segmentation::{segment, Section};
pub use validation::{extract_candidate, infer_validation_type};
