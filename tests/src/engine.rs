//! Rule engines for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use formwork_core::{FieldPath, Segment, Value};
use formwork_rule::{EngineError, EngineRequest, EngineResult, RawViolation, Rule, RuleEngine};
use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};

/// Understands a handful of rule parameters.
///
/// - `required: true` rejects `null`, `""` and `[]`
/// - `min` / `max` bound string length, or array length for `type: "array"`
/// - `each: "required"` on an array rule rejects empty elements, reported at
///   `<path>.<index>`
///
/// Messages come from the rule, then from the catalog (`%s` is the path),
/// then from a built-in default.
#[derive(Debug, Default)]
pub struct SimpleEngine {
    requests: Mutex<Vec<EngineRequest>>,
}

impl SimpleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<EngineRequest> {
        self.requests.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    fn check(request: &EngineRequest, path: &FieldPath, rules: &[Rule]) -> Vec<RawViolation> {
        let null = Value::Null;
        let value = request.values.get(path).unwrap_or(&null);
        let first_only = request.first_fields.applies_to(path);
        let mut out = Vec::new();

        for rule in rules {
            for (at, kind) in Self::failures(path, value, rule) {
                let message = rule
                    .message
                    .clone()
                    .or_else(|| {
                        request
                            .messages
                            .as_ref()
                            .and_then(|m| m.get(kind))
                            .map(|t| t.replace("%s", &at.to_string()))
                    })
                    .unwrap_or_else(|| default_message(kind, &at));
                out.push(RawViolation::new(at, message));
                if first_only {
                    return out;
                }
            }
        }
        out
    }

    fn failures(path: &FieldPath, value: &Value, rule: &Rule) -> Vec<(FieldPath, &'static str)> {
        let mut out = Vec::new();
        if rule.param("required") == Some(&Value::Bool(true)) && is_empty(value) {
            out.push((path.clone(), "required"));
            return out;
        }

        let len = if rule.is_array() {
            value.as_array().map(Vec::len)
        } else {
            value.as_str().map(|s| s.chars().count())
        };
        if let Some(len) = len {
            if rule.param("min").and_then(Value::as_u64).map_or(false, |min| (len as u64) < min) {
                out.push((path.clone(), "min"));
            }
            if rule.param("max").and_then(Value::as_u64).map_or(false, |max| (len as u64) > max) {
                out.push((path.clone(), "max"));
            }
        }

        if rule.is_array() && rule.param("each").and_then(Value::as_str) == Some("required") {
            if let Some(items) = value.as_array() {
                for (index, item) in items.iter().enumerate() {
                    if is_empty(item) {
                        let at = path.child(Segment::key(index.to_string()));
                        out.push((at, "required"));
                    }
                }
            }
        }
        out
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn default_message(kind: &str, path: &FieldPath) -> String {
    match kind {
        "required" => format!("{} is required", path),
        "min" => format!("{} is too short", path),
        "max" => format!("{} is too long", path),
        _ => format!("{} is invalid", path),
    }
}

#[async_trait]
impl RuleEngine for SimpleEngine {
    async fn validate(&self, request: EngineRequest) -> EngineResult<Vec<RawViolation>> {
        let violations = request
            .rules
            .iter()
            .flat_map(|(path, rules)| Self::check(&request, path, rules))
            .collect();
        self.requests.lock().push(request);
        Ok(violations)
    }
}

/// Holds every call until released, then delegates.
///
/// `entered` is notified when a call arrives; [`GatedEngine::release`]
/// lets that many held calls through.
pub struct GatedEngine<E> {
    inner: E,
    gate: Semaphore,
    entered: Notify,
    calls: AtomicUsize,
}

impl<E: RuleEngine> GatedEngine<E> {
    pub fn new(inner: E) -> Arc<Self> {
        Arc::new(Self {
            inner,
            gate: Semaphore::new(0),
            entered: Notify::new(),
            calls: AtomicUsize::new(0),
        })
    }

    /// Wait until a call arrives at the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let `calls` held calls proceed.
    pub fn release(&self, calls: usize) {
        self.gate.add_permits(calls);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

#[async_trait]
impl<E: RuleEngine> RuleEngine for GatedEngine<E> {
    async fn validate(&self, request: EngineRequest) -> EngineResult<Vec<RawViolation>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| EngineError::failed("gate closed"))?;
        permit.forget();
        self.inner.validate(request).await
    }
}

/// Fails every call.
#[derive(Debug, Clone)]
pub struct FailingEngine {
    message: String,
}

impl FailingEngine {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl RuleEngine for FailingEngine {
    async fn validate(&self, _request: EngineRequest) -> EngineResult<Vec<RawViolation>> {
        Err(EngineError::failed(self.message.clone()))
    }
}
