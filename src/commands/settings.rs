use crate::commands::completion::CompletionConfig;
use crate::models::request::FetchOptions;
use crate::models::score_report::{BadgeProfile, ScoreWeights};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_SCHEMA_VERSION: i64 = 1;

pub const SETTINGS_PATH_ENV: &str = "AUTHORITY_AUDIT_SETTINGS";
const DEFAULT_SETTINGS_FILE: &str = "authority-audit.json";

const WEIGHT_KEYS: [&str; 3] = ["clarity", "credibility", "visibility"];

#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    pub bind_address: String,
    pub weights: ScoreWeights,
    pub badge_profile: BadgeProfile,
    pub completion: CompletionConfig,
    pub fetch: FetchOptions,
    /// Chromium binary for rendering; discovered on `PATH` when unset
    pub chrome_executable: Option<PathBuf>,
    pub html_preview_chars: usize,
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        effective_settings(&migrate_settings(json!({})))
    }
}

/// Settings file location: `$AUTHORITY_AUDIT_SETTINGS` or `./authority-audit.json`
pub fn settings_path(env_value: Option<String>) -> PathBuf {
    env_value
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
}

pub fn load_effective_settings(path: &Path) -> Result<EffectiveSettings, String> {
    let settings = load_settings_from_disk(path)?;
    Ok(effective_settings(&settings))
}

/// Read the settings file, migrate it, and write it back when anything changed.
/// A file that is not a JSON object is an error and is left untouched.
pub fn load_settings_from_disk(path: &Path) -> Result<Value, String> {
    let original = if path.exists() {
        let raw = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        let parsed = serde_json::from_str::<Value>(&raw)
            .map_err(|e| format!("{} is not valid JSON: {e}", path.display()))?;
        if !parsed.is_object() {
            return Err(format!("{} must contain a JSON object", path.display()));
        }
        parsed
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original || !path.exists() {
        write_settings_file(path, &migrated)?;
    }

    Ok(migrated)
}

/// Interpret an already migrated settings document.
pub fn effective_settings(settings: &Value) -> EffectiveSettings {
    let weights = settings.get("weights");
    let weight = |key: &str, default: f64| {
        weights
            .and_then(|w| w.get(key))
            .and_then(Value::as_f64)
            .unwrap_or(default)
    };
    let defaults = ScoreWeights::default();

    let str_or = |key: &str, default: &str| {
        settings
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };
    let u64_or = |key: &str, default: u64| settings.get(key).and_then(Value::as_u64).unwrap_or(default);

    EffectiveSettings {
        bind_address: str_or("bindAddress", "127.0.0.1:8888"),
        weights: ScoreWeights {
            clarity: weight("clarity", defaults.clarity),
            credibility: weight("credibility", defaults.credibility),
            visibility: weight("visibility", defaults.visibility),
        },
        badge_profile: settings
            .get("badgeProfile")
            .and_then(Value::as_str)
            .and_then(BadgeProfile::parse)
            .unwrap_or_default(),
        completion: CompletionConfig {
            api_base_url: str_or("apiBaseUrl", "https://api.anthropic.com"),
            model: str_or("model", "claude-3-haiku-20240307"),
            api_key: None,
            max_tokens: u64_or("maxTokens", 1500) as u32,
            temperature: settings.get("temperature").and_then(Value::as_f64).unwrap_or(0.7),
            timeout_secs: u64_or("completionTimeoutSecs", 30),
        },
        fetch: FetchOptions {
            render: settings.get("renderPages").and_then(Value::as_bool).unwrap_or(false),
            timeout_ms: u64_or("fetchTimeoutMs", 3000),
        },
        chrome_executable: settings
            .get("chromeExecutable")
            .and_then(Value::as_str)
            .map(PathBuf::from),
        html_preview_chars: u64_or("htmlPreviewChars", 5000) as usize,
    }
}

fn write_settings_file(path: &Path, settings: &Value) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
    }
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;
    fs::write(path, raw).map_err(|e| format!("Failed to write {}: {e}", path.display()))
}

fn migrate_settings(input: Value) -> Value {
    let defaults = default_settings();
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    let version = out
        .get("schema_version")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    if version < 1 {
        migrate_weights_from_percentages(&mut out);
    }

    deep_merge_defaults(&mut out, &defaults);
    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    let weights = ScoreWeights::default();
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "bindAddress": "127.0.0.1:8888",
        "weights": {
            "clarity": weights.clarity,
            "credibility": weights.credibility,
            "visibility": weights.visibility
        },
        "badgeProfile": "standard",
        "apiBaseUrl": "https://api.anthropic.com",
        "model": "claude-3-haiku-20240307",
        "maxTokens": 1500,
        "temperature": 0.7,
        "completionTimeoutSecs": 30,
        "fetchTimeoutMs": 3000,
        "renderPages": false,
        "chromeExecutable": null,
        "htmlPreviewChars": 5000
    })
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

/// Schema 0 files stored weights as percentages (35/35/30).
fn migrate_weights_from_percentages(settings: &mut Value) {
    let Some(weights) = settings.get_mut("weights").and_then(Value::as_object_mut) else {
        return;
    };

    let has_percentage_like_values = weights.values().any(|v| v.as_f64().unwrap_or(0.0) > 1.0);
    if !has_percentage_like_values {
        return;
    }

    for value in weights.values_mut() {
        if let Some(v) = value.as_f64() {
            *value = json!(v / 100.0);
        }
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    clamp_u64(obj, "maxTokens", 256, 8192, 1500);
    clamp_u64(obj, "completionTimeoutSecs", 5, 120, 30);
    clamp_u64(obj, "fetchTimeoutMs", 1000, 30000, 3000);
    clamp_u64(obj, "htmlPreviewChars", 1000, 20000, 5000);
    clamp_f64(obj, "temperature", 0.0, 1.0, 0.7);

    sanitize_enum(obj, "badgeProfile", &["standard", "momentum"], "standard");
    ensure_non_empty_str(obj, "bindAddress", "127.0.0.1:8888");
    ensure_non_empty_str(obj, "apiBaseUrl", "https://api.anthropic.com");
    ensure_non_empty_str(obj, "model", "claude-3-haiku-20240307");
    ensure_bool(obj, "renderPages", false);
    ensure_optional_str(obj, "chromeExecutable");

    sanitize_weights(obj);
}

/// Keep exactly the three axis weights, each in [0, 1], summing to 1.
fn sanitize_weights(obj: &mut Map<String, Value>) {
    let defaults = ScoreWeights::default();
    let default_for = |key: &str| match key {
        "clarity" => defaults.clarity,
        "credibility" => defaults.credibility,
        _ => defaults.visibility,
    };

    let current = obj.get("weights").and_then(Value::as_object);
    let mut values: Vec<(&str, f64)> = WEIGHT_KEYS
        .iter()
        .map(|key| {
            let raw = current
                .and_then(|w| w.get(*key))
                .and_then(Value::as_f64)
                .unwrap_or_else(|| default_for(*key));
            (*key, raw.clamp(0.0, 1.0))
        })
        .collect();

    let sum: f64 = values.iter().map(|(_, v)| v).sum();
    if sum <= f64::EPSILON {
        values = WEIGHT_KEYS.iter().map(|key| (*key, default_for(*key))).collect();
    } else if (sum - 1.0).abs() > 1e-9 {
        for (_, value) in values.iter_mut() {
            *value /= sum;
        }
    }

    let weights: Map<String, Value> = values
        .into_iter()
        .map(|(key, value)| (key.to_string(), json!(value)))
        .collect();
    obj.insert("weights".to_string(), Value::Object(weights));
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn clamp_f64(map: &mut Map<String, Value>, key: &str, min: f64, max: f64, default: f64) {
    let raw = map.get(key).and_then(Value::as_f64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn sanitize_enum(map: &mut Map<String, Value>, key: &str, allowed: &[&str], default: &str) {
    let valid = map
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| allowed.contains(value))
        .unwrap_or(default);
    map.insert(key.to_string(), json!(valid));
}

fn ensure_non_empty_str(map: &mut Map<String, Value>, key: &str, default: &str) {
    let value = map
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string();
    map.insert(key.to_string(), json!(value));
}

fn ensure_optional_str(map: &mut Map<String, Value>, key: &str) {
    let value = map
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| json!(v))
        .unwrap_or(Value::Null);
    map.insert(key.to_string(), value);
}

fn ensure_bool(map: &mut Map<String, Value>, key: &str, default: bool) {
    let value = map.get(key).and_then(Value::as_bool).unwrap_or(default);
    map.insert(key.to_string(), json!(value));
}
