#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::unused_self)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::assigning_clones)]
#![allow(clippy::borrowed_box)]
#![allow(clippy::float_cmp)]
#![allow(clippy::ref_option)]

//! # Lucid Extract
//!
//! A structured-data extraction engine: a two-stage Architect/Extractor
//! pipeline that turns semi-structured text into schema-conformant JSON,
//! with a plan cache, a system-context detector, a chain-of-responsibility
//! resolver registry, and a budget-gated lean-LLM fallback of last resort.
//!
//! ## Core Concepts
//!
//! - **Architect**: builds a `SearchPlan` (one `SearchStep` per schema
//!   field) from the output schema, free-text instructions, and the
//!   detected system context, heuristically first and optionally refined
//!   by a model-backed rewrite when heuristic confidence is low.
//! - **Extractor**: executes a `SearchPlan` against the input through an
//!   ordered chain of resolvers, sequentially, in parallel, or adaptively,
//!   producing parsed data, diagnostics, and a confidence score.
//! - **Plan cache**: keys a `SearchPlan` by schema + instructions +
//!   plan-affecting options, so repeat shapes of request skip the
//!   architect entirely.
//! - **Session**: binds one schema/instructions/options triple to a single
//!   locked plan across many parses, refreshing it only when confidence
//!   drops and a cooldown has elapsed.
//! - **Telemetry bus**: an in-process pub/sub of pipeline events
//!   (`ParseStart`, `ArchitectFinish`, `PlanCache`, ...) for observability
//!   hooks, independent of the response payload.
//!
//! ## Module Organization
//!
//! ### Primary APIs
//! - [`orchestrator`]: the top-level `parse` pipeline
//! - [`session`]: plan-reuse across repeated parses
//! - [`architect`]: plan construction
//! - [`extractor`]: plan execution
//!
//! ### Support modules
//! - [`types`]: request/response/plan/schema/config types shared across stages
//! - [`extraction`]: the resolver registry and its resolvers
//! - [`heuristics`]: format detection, instruction parsing, segmentation, validation primitives
//! - [`context`]: the system-context detector
//! - [`pipeline`]: pre/postprocessor chains
//! - [`retrieval`]: the plan cache
//! - [`telemetry`]: the event bus
//! - [`retry`]: retry policy used by the architect's heuristic pass
//! - [`task_queue`]: bounded-concurrency async task queue used by the extractor's parallel strategy
//! - [`lean_llm`]: the lean-LLM fallback client contract
//! - [`error`]: the crate's error taxonomy
//! - [`constants`]: named magic numbers for the scoring formulas
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use lucid_extract_core::orchestrator::Orchestrator;
//! use lucid_extract_core::retrieval::cache::InMemoryPlanCache;
//! use lucid_extract_core::telemetry::TelemetryBus;
//! use lucid_extract_core::types::config::EngineConfig;
//! use lucid_extract_core::types::request::ParseRequest;
//! use lucid_extract_core::types::schema::{FieldDescriptor, OutputSchema, ValidationType};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let cache = Arc::new(InMemoryPlanCache::new(Some(256), Duration::from_secs(600)));
//! let telemetry = Arc::new(TelemetryBus::new());
//! let orchestrator = Orchestrator::new(EngineConfig::default(), cache, telemetry);
//!
//! let mut schema = OutputSchema::new();
//! schema.insert("email".to_string(), FieldDescriptor::new(ValidationType::Email));
//!
//! let request = ParseRequest {
//!     input_data: r#"{"Email":"ada@analytical.engine"}"#.to_string(),
//!     output_schema: schema,
//!     instructions: None,
//!     options: Default::default(),
//! };
//!
//! let response = orchestrator.parse(request).await;
//! println!("success={} fields={}", response.success, response.parsed_data.len());
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Most functions return [`Result<T>`] for proper error handling:
//!
//! ```no_run
//! use lucid_extract_core::error::{Error, Result};
//!
//! fn example() -> Result<()> {
//!     // Operations that can fail
//!     // ?
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `proptest-arbitrary`: enable `proptest::Arbitrary` impls for property testing

pub mod architect;
pub mod constants;
pub mod context;
pub mod error;
pub mod extraction;
pub mod extractor;
pub mod heuristics;
pub mod lean_llm;
pub mod orchestrator;
pub mod pipeline;
pub mod retrieval;
pub mod retry;
pub mod session;
pub mod task_queue;
pub mod telemetry;
pub mod types;

pub use architect::Architect;
pub use error::{Error, Result};
pub use extractor::Extractor;
pub use orchestrator::Orchestrator;
pub use session::Session;
pub use types::{
    context::DetectedSystemContext,
    diagnostic::{ParseDiagnostic, Severity, Stage},
    plan::{SearchPlan, SearchStep},
    request::{ParseOptions, ParseRequest, Strategy},
    response::{ParseResponse, ResponseMetadata},
    schema::{FieldDescriptor, OutputSchema, ValidationType},
    value::Value,
};
