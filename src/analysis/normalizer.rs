use crate::analysis::scoring::{badge_for, compute_overall};
use crate::error::AnalysisError;
use crate::models::score_report::{BadgeProfile, ScoreReport, ScoreWeights};
use serde_json::{Map, Value};

pub const NEUTRAL_SCORE: u8 = 50;

pub const FALLBACK_INTERPRETATION: &str = "Your online presence shows potential for growth.";

pub const FALLBACK_SUMMARY: &str = "Your online presence demonstrates solid fundamentals. The primary opportunity lies in strengthening the clarity of your positioning and value proposition.";

pub const FALLBACK_ACTIONS: [&str; 3] = [
    "Refine homepage messaging to clearly state who you help and the transformation you create",
    "Add client testimonials with specific results to build credibility",
    "Ensure consistent branding and active presence across your social platforms",
];

/// Accepted keys per text field, first present wins.
const INTERPRETATION_KEYS: &[&str] = &["interpretation", "strategicAudit"];
const SUMMARY_KEYS: &[&str] = &["summary", "designAnalysis"];

/// Normalize a raw completion into a report with the standard badge labels.
pub fn normalize(raw_text: &str, weights: &ScoreWeights) -> Result<ScoreReport, AnalysisError> {
    normalize_with_profile(raw_text, weights, BadgeProfile::default())
}

/// Turn untrusted completion text into a bounded, self-consistent report.
///
/// Only a completion without any parseable JSON object is an error; every
/// missing or invalid field is replaced by its default. `overall` and
/// `badge` are always recomputed from the sub-scores.
pub fn normalize_with_profile(
    raw_text: &str,
    weights: &ScoreWeights,
    profile: BadgeProfile,
) -> Result<ScoreReport, AnalysisError> {
    let fields = extract_json_object(raw_text).ok_or_else(|| AnalysisError::MalformedCompletion {
        raw: raw_text.to_string(),
    })?;

    let clarity = score_field(&fields, "clarity");
    let credibility = score_field(&fields, "credibility");
    let visibility = score_field(&fields, "visibility");

    let overall = compute_overall(clarity, credibility, visibility, weights);
    let badge = badge_for(overall);

    let interpretation = text_field(&fields, INTERPRETATION_KEYS)
        .unwrap_or_else(|| FALLBACK_INTERPRETATION.to_string());
    let summary = text_field(&fields, SUMMARY_KEYS).unwrap_or_else(|| FALLBACK_SUMMARY.to_string());
    let actions = actions_field(&fields);

    Ok(ScoreReport {
        clarity,
        credibility,
        visibility,
        overall,
        badge,
        badge_label: badge.label(profile).to_string(),
        interpretation,
        summary,
        actions,
    })
}

/// Locate the JSON object inside free text.
///
/// The span from the first `{` to the last `}` is tried first, which drops
/// code fences and surrounding prose. If that span does not parse (for
/// example when prose after the object contains a brace), the first
/// balanced object is used instead.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }

    if let Some(map) = parse_object(&text[start..=end]) {
        return Some(map);
    }

    first_balanced_object(&text[start..]).and_then(parse_object)
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// `text` must start with `{`. Braces inside string literals are ignored.
fn first_balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

fn score_field(fields: &Map<String, Value>, key: &str) -> u8 {
    match coerce_score(fields.get(key)) {
        Some(score) => score,
        None => {
            log::debug!("completion field '{key}' missing or invalid, using {NEUTRAL_SCORE}");
            NEUTRAL_SCORE
        }
    }
}

/// Numbers and numeric strings in [0, 100], rounded to the nearest integer.
fn coerce_score(value: Option<&Value>) -> Option<u8> {
    let raw = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if !raw.is_finite() || !(0.0..=100.0).contains(&raw) {
        return None;
    }
    Some(raw.round() as u8)
}

fn text_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    let found = keys.iter().find_map(|key| {
        fields
            .get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
    });

    if found.is_none() {
        log::debug!("completion field '{}' missing, using fallback", keys[0]);
    }
    found.map(str::to_string)
}

fn actions_field(fields: &Map<String, Value>) -> Vec<String> {
    let actions: Vec<String> = fields
        .get("actions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|action| !action.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if actions.is_empty() {
        log::debug!("completion has no usable actions, using fallback list");
        return FALLBACK_ACTIONS.iter().map(|a| a.to_string()).collect();
    }
    actions
}
