//! The concrete resolver chain, in the order spec §4.6 mandates: JSON-field,
//! section, loose key-value, validation default, lean-LLM fallback.

pub mod json_field;
pub mod lean_fallback;
pub mod loose_kv;
pub mod section;
pub mod validation_default;

pub use json_field::JsonFieldResolver;
pub use lean_fallback::LeanFallbackResolver;
pub use loose_kv::LooseKeyValueResolver;
pub use section::SectionResolver;
pub use validation_default::ValidationDefaultResolver;
