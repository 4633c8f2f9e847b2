//! Bounds checking and deduplication of model-proposed actions.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::actions::ActionKind;
use crate::types::ActionCall;

pub const MAX_AMOUNT: i64 = 100_000_000;
pub const MAX_BATCH_ITEMS: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct ValidationLimits {
    pub max_amount: i64,
    pub max_batch_items: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_amount: MAX_AMOUNT,
            max_batch_items: MAX_BATCH_ITEMS,
        }
    }
}

/// Output of validation: the surviving actions plus what was thrown away.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedBatch {
    pub actions: Vec<ActionCall>,
    /// Line items or single-amount actions dropped for a bad amount.
    pub failed_items: usize,
    /// Extra destructive actions beyond the first.
    pub dropped_destructive: usize,
}

static GROUPED_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}(?:[.,]\d{3})+$").unwrap());

/// Read a money value from a JSON number or a numeric string
/// ("25000", "25.000", "Rp 25.000"). Anything else is `None`.
pub fn parse_amount(value: &Value) -> Option<i64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let lower = s.trim().to_ascii_lowercase();
            let stripped = lower
                .strip_prefix("rp")
                .unwrap_or(&lower)
                .trim_start_matches('.')
                .trim()
                .replace(' ', "");
            if GROUPED_DIGITS.is_match(&stripped) {
                stripped.replace(['.', ','], "").parse::<f64>().ok()?
            } else {
                stripped.parse::<f64>().ok()?
            }
        }
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    Some(n.round() as i64)
}

/// Strict check: accepted only when in `(0, max]`.
pub fn validate_amount(value: &Value, max: i64) -> Option<i64> {
    parse_amount(value).filter(|n| *n > 0 && *n <= max)
}

/// Lenient check for single-amount actions: values above `max` are clamped
/// down, zero/negative/non-numeric values are still rejected.
pub fn clamp_amount(value: &Value, max: i64) -> Option<i64> {
    parse_amount(value).filter(|n| *n > 0).map(|n| n.min(max))
}

/// Validate and clean up a batch of proposed actions.
///
/// Unknown names pass through untouched; the router owns the whitelist.
pub fn validate_actions(calls: Vec<ActionCall>, limits: ValidationLimits) -> ValidatedBatch {
    let mut batch = ValidatedBatch::default();
    let mut bounded = Vec::with_capacity(calls.len());

    for mut call in calls {
        let Some(kind) = ActionKind::from_name(&call.name) else {
            bounded.push(call);
            continue;
        };

        if let Some(field) = kind.batch_field() {
            match bound_line_items(&mut call.arguments, field, limits) {
                LineItems::Kept(failed) => batch.failed_items += failed,
                LineItems::NoneLeft(failed) => {
                    batch.failed_items += failed;
                    debug!(action = %kind, "All line items invalid, dropping action");
                    continue;
                }
            }
        }

        if !clamp_amount_fields(&mut call.arguments, kind, limits.max_amount) {
            batch.failed_items += 1;
            debug!(action = %kind, "Invalid amount, dropping action");
            continue;
        }

        bounded.push(call);
    }

    let mut seen_destructive = false;
    for call in dedup_actions(bounded) {
        let destructive = ActionKind::from_name(&call.name).is_some_and(|k| k.is_destructive());
        if destructive {
            if seen_destructive {
                batch.dropped_destructive += 1;
                info!(action = %call.name, "Dropping extra destructive action in batch");
                continue;
            }
            seen_destructive = true;
        }
        batch.actions.push(call);
    }

    batch
}

enum LineItems {
    Kept(usize),
    NoneLeft(usize),
}

fn bound_line_items(args: &mut Map<String, Value>, field: &str, limits: ValidationLimits) -> LineItems {
    let Some(Value::Array(items)) = args.get_mut(field) else {
        // Missing or malformed list is left for the service to report.
        return LineItems::Kept(0);
    };
    items.truncate(limits.max_batch_items);

    let before = items.len();
    items.retain_mut(|item| {
        let Some(obj) = item.as_object_mut() else {
            return false;
        };
        match obj.get("amount").and_then(|v| validate_amount(v, limits.max_amount)) {
            Some(amount) => {
                obj.insert("amount".to_string(), Value::from(amount));
                true
            }
            None => false,
        }
    });
    let failed = before - items.len();

    if items.is_empty() {
        LineItems::NoneLeft(failed)
    } else {
        LineItems::Kept(failed)
    }
}

/// Returns false when a present amount field is unusable.
fn clamp_amount_fields(args: &mut Map<String, Value>, kind: ActionKind, max: i64) -> bool {
    for field in kind.amount_fields() {
        let Some(value) = args.get(*field) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        match clamp_amount(value, max) {
            Some(amount) => {
                args.insert(field.to_string(), Value::from(amount));
            }
            None => return false,
        }
    }
    true
}

/// Stable serialization with object keys sorted at every level.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let body = keys
                .iter()
                .map(|k| format!("{}:{}", Value::String((*k).clone()), canonical_json(&map[*k])))
                .collect::<Vec<_>>()
                .join(",");
            format!("{{{}}}", body)
        }
        Value::Array(items) => {
            let body = items.iter().map(canonical_json).collect::<Vec<_>>().join(",");
            format!("[{}]", body)
        }
        other => other.to_string(),
    }
}

/// Collapse calls with the same name and identical arguments, keeping the
/// first. Same name with different arguments is kept.
pub fn dedup_actions(calls: Vec<ActionCall>) -> Vec<ActionCall> {
    let mut seen = HashSet::new();
    calls
        .into_iter()
        .filter(|call| {
            let key = format!(
                "{}\u{1f}{}",
                call.name,
                canonical_json(&Value::Object(call.arguments.clone()))
            );
            seen.insert(key)
        })
        .collect()
}
