//! The lightweight-LLM collaborator contract (spec §6.4).
//!
//! This crate ships no concrete client — only the trait and a
//! `NullLeanLlmClient` test double that always reports "no value
//! provided", per SPEC_FULL §12. A real client (HTTP-backed, local model,
//! etc.) is an external collaborator implementing this trait.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::types::context::DetectedSystemContext;
use crate::types::schema::ValidationType;
use crate::types::Value;

/// A request to resolve one field via the lean-LLM fallback (spec §6.4).
#[derive(Debug, Clone)]
pub struct LeanLlmRequest {
    pub field: String,
    pub description: String,
    pub validation_type: ValidationType,
    pub instruction: String,
    /// The input, possibly truncated by the caller before sending.
    pub input: String,
    pub plan_summary: Option<String>,
    pub detected_context: Option<DetectedSystemContext>,
}

/// The lean-LLM client's response for one field (spec §6.4).
#[derive(Debug, Clone, Default)]
pub struct LeanLlmResponse {
    pub value: Option<Value>,
    pub confidence: Option<f64>,
    pub reason: Option<String>,
    pub tokens_used: Option<u64>,
    pub finish_reason: Option<String>,
    /// Opportunistic extra field values keyed by field name, short-circuited
    /// by the registry on subsequent steps (spec §4.6).
    pub shared_extractions: HashMap<String, Value>,
}

/// The lightweight-LLM collaborator contract. The orchestrator MUST
/// tolerate any failure here as "no value provided" plus a diagnostic
/// (spec §6.4) — callers never propagate a client error past the fallback
/// resolver's boundary.
#[async_trait]
pub trait LeanLlmClient: Send + Sync {
    /// Attempt to extract one field. Implementations may fail by returning
    /// `Err`; the fallback resolver treats that identically to an empty
    /// `LeanLlmResponse`.
    async fn extract_field(
        &self,
        request: LeanLlmRequest,
    ) -> Result<LeanLlmResponse, anyhow::Error>;
}

/// A test double that always reports "no value provided". Useful for
/// exercising the fallback-gating logic without a real provider.
pub struct NullLeanLlmClient;

#[async_trait]
impl LeanLlmClient for NullLeanLlmClient {
    async fn extract_field(
        &self,
        _request: LeanLlmRequest,
    ) -> Result<LeanLlmResponse, anyhow::Error> {
        Ok(LeanLlmResponse::default())
    }
}
