//! `ExtractionContext`: the per-parse shared scratch passed by reference to
//! every resolver (spec §9).

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::heuristics::segmentation::{self, Section};
use crate::types::fallback::LeanFallbackUsage;
use crate::types::plan::DetectedFormat;
use crate::types::{ParseDiagnostic, Value};

/// Typed per-parse scratch state shared by all resolvers for one parse.
/// Single-writer by construction under the sequential strategy; under
/// parallel/adaptive strategies the format/JSON/section/loose-KV caches are
/// first-writer-wins (a `Mutex`-guarded `OnceLock`-style fill), diagnostics
/// are append-only, and fallback counters are compare-and-set via atomics
/// (spec §5).
pub struct ExtractionContext {
    input: String,
    format: DetectedFormat,
    json_payload: Mutex<Option<Option<serde_json::Value>>>,
    sections: Mutex<Option<Vec<Section>>>,
    loose_kv: Mutex<Option<HashMap<String, Vec<String>>>>,
    diagnostics: Mutex<Vec<ParseDiagnostic>>,
    fallback_usage: Mutex<LeanFallbackUsage>,
    shared_extractions: Mutex<HashMap<String, Value>>,
    fallback_invocations: AtomicU64,
    fallback_tokens: AtomicU64,
    resolver_error_seen: AtomicU64,
}

impl ExtractionContext {
    /// Build a fresh context for one parse.
    #[must_use]
    pub fn new(input: String, format: DetectedFormat) -> Self {
        Self {
            input,
            format,
            json_payload: Mutex::new(None),
            sections: Mutex::new(None),
            loose_kv: Mutex::new(None),
            diagnostics: Mutex::new(Vec::new()),
            fallback_usage: Mutex::new(LeanFallbackUsage::default()),
            shared_extractions: Mutex::new(HashMap::new()),
            fallback_invocations: AtomicU64::new(0),
            fallback_tokens: AtomicU64::new(0),
            resolver_error_seen: AtomicU64::new(0),
        }
    }

    /// The full input text.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The detected format, computed once by the orchestrator.
    #[must_use]
    pub fn format(&self) -> DetectedFormat {
        self.format
    }

    /// The input parsed once as JSON, cached (first-writer-wins). `None` if
    /// the format is not JSON or parsing failed.
    pub fn json_payload(&self) -> Option<serde_json::Value> {
        let mut slot = self.json_payload.lock();
        if slot.is_none() {
            let parsed = if self.format == DetectedFormat::Json {
                serde_json::from_str(&self.input).ok()
            } else {
                None
            };
            *slot = Some(parsed);
        }
        slot.as_ref().and_then(Clone::clone)
    }

    /// The input segmented into sections once, cached.
    pub fn sections(&self) -> Vec<Section> {
        let mut slot = self.sections.lock();
        if slot.is_none() {
            *slot = Some(segmentation::segment(&self.input));
        }
        slot.clone().unwrap_or_default()
    }

    /// A normalised `key -> [values]` map built once from `key: value` /
    /// `key = value` style lines (spec §4.6's loose key-value resolver).
    pub fn loose_kv_map(&self) -> HashMap<String, Vec<String>> {
        let mut slot = self.loose_kv.lock();
        if slot.is_none() {
            let mut map: HashMap<String, Vec<String>> = HashMap::new();
            for line in self.input.lines() {
                if let Some((key, value)) = crate::heuristics::format::parse_key_value(line) {
                    map.entry(crate::heuristics::instructions::normalize_key(key))
                        .or_default()
                        .push(value.to_string());
                }
            }
            *slot = Some(map);
        }
        slot.clone().unwrap_or_default()
    }

    /// Append a diagnostic (append-only; safe under concurrent resolvers).
    pub fn push_diagnostic(&self, diagnostic: ParseDiagnostic) {
        self.diagnostics.lock().push(diagnostic);
    }

    /// Drain all diagnostics accumulated so far, in append order.
    pub fn take_diagnostics(&self) -> Vec<ParseDiagnostic> {
        std::mem::take(&mut self.diagnostics.lock())
    }

    /// Record a value the lean-LLM fallback resolver produced
    /// opportunistically for a field other than the one it was asked for
    /// (spec §4.6 `sharedExtractions`), so subsequent steps can short-circuit.
    pub fn offer_shared_extraction(&self, field: &str, value: Value) {
        self.shared_extractions
            .lock()
            .insert(crate::heuristics::instructions::normalize_key(field), value);
    }

    /// Take a previously shared extraction for `field`, if any, removing it
    /// so it is only consumed once.
    pub fn take_shared_extraction(&self, field: &str) -> Option<Value> {
        self.shared_extractions
            .lock()
            .remove(&crate::heuristics::instructions::normalize_key(field))
    }

    /// Atomically attempt to reserve `tokens` against the per-parse lean-LLM
    /// budget. Returns `false` (reserving nothing) if either the invocation
    /// count or token count would exceed the configured limit.
    pub fn try_reserve_fallback_budget(
        &self,
        max_invocations: Option<u64>,
        max_tokens: Option<u64>,
        tokens: u64,
    ) -> bool {
        loop {
            let current_invocations = self.fallback_invocations.load(Ordering::SeqCst);
            if let Some(max) = max_invocations {
                if current_invocations >= max {
                    return false;
                }
            }
            let current_tokens = self.fallback_tokens.load(Ordering::SeqCst);
            if let Some(max) = max_tokens {
                if current_tokens + tokens > max {
                    return false;
                }
            }
            if self
                .fallback_invocations
                .compare_exchange(
                    current_invocations,
                    current_invocations + 1,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                )
                .is_ok()
            {
                self.fallback_tokens.fetch_add(tokens, Ordering::SeqCst);
                return true;
            }
        }
    }

    /// Merge a field's fallback-usage record into the shared aggregate.
    pub fn record_fallback(&self, record: impl FnOnce(&mut LeanFallbackUsage)) {
        record(&mut self.fallback_usage.lock());
    }

    /// Take the accumulated `LeanFallbackUsage` for response assembly.
    #[must_use]
    pub fn fallback_usage(&self) -> LeanFallbackUsage {
        self.fallback_usage.lock().clone()
    }

    /// Mark that some resolver raised an internal error this parse, so the
    /// orchestrator can emit a single "fallback degraded" diagnostic rather
    /// than one per occurrence (spec §7: "diagnostic emitted once per
    /// parse to avoid noise").
    pub fn mark_resolver_error(&self) -> bool {
        self.resolver_error_seen.fetch_or(1, Ordering::SeqCst) == 0
    }
}
