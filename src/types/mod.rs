//! Core data model (spec §3): schema/value tagged variants, requests,
//! plans, detected context, diagnostics, fallback usage, responses, and
//! engine configuration.

pub mod config;
pub mod context;
pub mod diagnostic;
pub mod fallback;
pub mod plan;
pub mod request;
pub mod response;
pub mod schema;
pub mod value;

pub use config::EngineConfig;
pub use context::DetectedSystemContext;
pub use diagnostic::{ParseDiagnostic, Severity, Stage};
pub use fallback::{FallbackAction, LeanFallbackUsage, SkipGate};
pub use plan::{Complexity, DetectedFormat, PlanMetadata, PlanOrigin, SearchPlan, SearchStep};
pub use request::{ParseOptions, ParseRequest, Strategy};
pub use response::{FailureStage, ParseError, ParseResponse, ResponseMetadata, StageBreakdown};
pub use schema::{FieldDescriptor, OutputSchema, ValidationType};
pub use value::Value;
