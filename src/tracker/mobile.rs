//! Mobile foreground-app ingestion.
//!
//! An external automation client on the phone pushes the foreground app in
//! loosely structured payloads. This module normalizes the name, filters out
//! a known interfering input method, and latches the last known app. The
//! latch never expires on its own: a stale value wins over no value, so a
//! transient malformed push never blanks the display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;

/// Placeholder used by the simplified ingestion path when no name is given.
pub const UNKNOWN_APP: &str = "未知应用";

/// Identifier substring of the input-method app whose focus flaps are noise.
const INPUT_METHOD_MARKER: &str = "讯飞";

/// App names that really mean "the screen is off".
const SCREEN_OFF_NAMES: &[&str] = &["熄屏显示", "华为桌面"];
const SCREEN_OFF_LABEL: &str = "手机熄屏ing";

const WAITING_MESSAGE: &str = "等待手机推送数据...";

/// Outcome of the most recent ingestion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStatus {
    Waiting,
    Success,
    Error,
}

/// The latched mobile app identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobileApp {
    pub name: String,
    pub package: String,
    pub timestamp: DateTime<Utc>,
}

/// Deliverable view of the mobile state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobileSnapshot {
    pub status: IngestStatus,
    pub message: String,
    /// Zero or one entries: the latched app, if any ingestion ever succeeded.
    pub apps: Vec<MobileApp>,
    pub last_update: Option<DateTime<Utc>>,
}

/// Why an ingestion attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// No candidate app name could be extracted from the payload.
    PayloadMalformed(String),
    /// The extracted name matched an exclusion rule.
    NameRejected(String),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::PayloadMalformed(detail) => write!(f, "数据格式错误: {detail}"),
            IngestError::NameRejected(name) => write!(f, "已过滤应用: {name}"),
        }
    }
}

impl std::error::Error for IngestError {}

#[derive(Debug)]
struct MobileState {
    current: Option<MobileApp>,
    last_update: Option<DateTime<Utc>>,
    status: IngestStatus,
    message: String,
}

impl MobileState {
    fn waiting() -> Self {
        Self {
            current: None,
            last_update: None,
            status: IngestStatus::Waiting,
            message: WAITING_MESSAGE.to_string(),
        }
    }
}

/// Accepts pushed app-identity payloads and maintains the app latch.
///
/// Created once at process start in the `Waiting` state and mutated only by
/// [`ingest`](Self::ingest); identity fields are replaced exclusively by a
/// subsequent successful ingestion.
pub struct MobileAppIngester {
    state: Mutex<MobileState>,
}

impl MobileAppIngester {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MobileState::waiting()),
        }
    }

    /// Ingest one pushed payload. On success the full identity is replaced
    /// atomically; on failure only status and message change.
    pub fn ingest(&self, payload: &Value) -> Result<String, IngestError> {
        let candidate = extract_candidate(payload).and_then(|(raw, package)| {
            let name = normalize_name(&raw)?;
            Ok((name, package))
        });

        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        match candidate {
            Ok((name, package)) => {
                let now = Utc::now();
                let package = package.unwrap_or_else(|| synthesize_package(&name));
                state.message = format!("当前应用: {name}");
                state.current = Some(MobileApp {
                    name,
                    package,
                    timestamp: now,
                });
                state.last_update = Some(now);
                state.status = IngestStatus::Success;
                Ok(state.message.clone())
            }
            Err(err) => {
                state.status = IngestStatus::Error;
                state.message = err.to_string();
                Err(err)
            }
        }
    }

    /// Simplified ingestion: a bare app name, defaulting to the fixed
    /// placeholder when absent or blank.
    pub fn ingest_simple(&self, name: Option<&str>) -> Result<String, IngestError> {
        let name = match name {
            Some(n) if !n.trim().is_empty() => n,
            _ => UNKNOWN_APP,
        };
        let payload = serde_json::json!({
            "name": name,
            "package": synthesize_package(name),
        });
        self.ingest(&payload)
    }

    /// Current view of the latch.
    pub fn snapshot(&self) -> MobileSnapshot {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        MobileSnapshot {
            status: state.status,
            message: state.message.clone(),
            apps: state.current.iter().cloned().collect(),
            last_update: state.last_update,
        }
    }
}

impl Default for MobileAppIngester {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull a `(raw name, optional package)` pair out of a payload.
///
/// Shapes are checked in priority order: app-name key, generic name key,
/// apps list, bare string, bare list.
fn extract_candidate(payload: &Value) -> Result<(String, Option<String>), IngestError> {
    if let Some(object) = payload.as_object() {
        if let Some(value) = object.get("app_name") {
            return pair_from(value, object.get("package_name"));
        }
        if let Some(value) = object.get("name") {
            return pair_from(value, object.get("package"));
        }
        if let Some(first) = object.get("apps").and_then(Value::as_array).and_then(|a| a.first()) {
            return entry_candidate(first);
        }
        return Err(IngestError::PayloadMalformed(
            "对象缺少应用名称字段".to_string(),
        ));
    }

    if payload.is_string() || payload.is_number() {
        return entry_candidate(payload);
    }

    if let Some(first) = payload.as_array().and_then(|a| a.first()) {
        return entry_candidate(first);
    }

    Err(IngestError::PayloadMalformed("无法识别的数据格式".to_string()))
}

/// Candidate from one list entry: an object with name/package, or a scalar.
fn entry_candidate(entry: &Value) -> Result<(String, Option<String>), IngestError> {
    if let Some(object) = entry.as_object() {
        return pair_from(
            object.get("name").unwrap_or(&Value::Null),
            object.get("package"),
        );
    }
    pair_from(entry, None)
}

fn pair_from(
    name: &Value,
    package: Option<&Value>,
) -> Result<(String, Option<String>), IngestError> {
    let name = scalar_name(name)
        .ok_or_else(|| IngestError::PayloadMalformed("应用名称为空".to_string()))?;
    let package = package
        .and_then(Value::as_str)
        .map(|p| p.to_string());
    Ok((name, package))
}

/// A usable name out of a scalar JSON value; blank strings yield `None`.
fn scalar_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Apply the exclusion and substitution rules to a raw candidate name.
fn normalize_name(raw: &str) -> Result<String, IngestError> {
    if raw.contains(INPUT_METHOD_MARKER) {
        return Err(IngestError::NameRejected(raw.to_string()));
    }
    if SCREEN_OFF_NAMES.contains(&raw) {
        return Ok(SCREEN_OFF_LABEL.to_string());
    }
    Ok(raw.to_string())
}

fn synthesize_package(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn starts_waiting_with_empty_identity() {
        let ingester = MobileAppIngester::new();
        let snapshot = ingester.snapshot();
        assert_eq!(snapshot.status, IngestStatus::Waiting);
        assert!(snapshot.apps.is_empty());
        assert!(snapshot.last_update.is_none());
    }

    #[test]
    fn app_name_key_takes_priority() {
        let ingester = MobileAppIngester::new();
        ingester
            .ingest(&json!({"app_name": "微信", "package_name": "com.tencent.mm", "name": "别的"}))
            .unwrap();
        let snapshot = ingester.snapshot();
        assert_eq!(snapshot.apps[0].name, "微信");
        assert_eq!(snapshot.apps[0].package, "com.tencent.mm");
        assert_eq!(snapshot.status, IngestStatus::Success);
    }

    #[test]
    fn name_key_synthesizes_missing_package() {
        let ingester = MobileAppIngester::new();
        ingester.ingest(&json!({"name": "QQ Music"})).unwrap();
        assert_eq!(ingester.snapshot().apps[0].package, "qq_music");
    }

    #[test]
    fn apps_list_takes_first_entry() {
        let ingester = MobileAppIngester::new();
        ingester
            .ingest(&json!({"apps": [{"name": "哔哩哔哩", "package": "tv.danmaku.bili"}, {"name": "后面的"}]}))
            .unwrap();
        assert_eq!(ingester.snapshot().apps[0].name, "哔哩哔哩");
        assert_eq!(ingester.snapshot().apps[0].package, "tv.danmaku.bili");
    }

    #[test]
    fn bare_string_and_list_shapes_are_accepted() {
        let ingester = MobileAppIngester::new();
        ingester.ingest(&json!("Chrome")).unwrap();
        assert_eq!(ingester.snapshot().apps[0].name, "Chrome");

        ingester.ingest(&json!(["Telegram"])).unwrap();
        assert_eq!(ingester.snapshot().apps[0].name, "Telegram");
        assert_eq!(ingester.snapshot().apps[0].package, "telegram");
    }

    #[test]
    fn input_method_pushes_are_rejected_and_keep_identity() {
        let ingester = MobileAppIngester::new();
        ingester.ingest(&json!({"name": "微信"})).unwrap();

        let err = ingester.ingest(&json!({"name": "讯飞输入法"})).unwrap_err();
        assert!(matches!(err, IngestError::NameRejected(_)));

        let snapshot = ingester.snapshot();
        assert_eq!(snapshot.status, IngestStatus::Error);
        // Identity untouched: stale value wins over no value.
        assert_eq!(snapshot.apps[0].name, "微信");
    }

    #[test]
    fn screen_off_names_map_to_fixed_label() {
        let ingester = MobileAppIngester::new();
        ingester.ingest(&json!({"name": "熄屏显示"})).unwrap();
        assert_eq!(ingester.snapshot().apps[0].name, "手机熄屏ing");

        ingester.ingest(&json!({"name": "华为桌面"})).unwrap();
        assert_eq!(ingester.snapshot().apps[0].name, "手机熄屏ing");
    }

    #[test]
    fn latch_reflects_only_the_latest_success() {
        let ingester = MobileAppIngester::new();
        ingester.ingest(&json!({"name": "微信"})).unwrap();
        ingester.ingest(&json!({"name": "支付宝"})).unwrap();

        let snapshot = ingester.snapshot();
        assert_eq!(snapshot.apps.len(), 1);
        assert_eq!(snapshot.apps[0].name, "支付宝");
    }

    #[test]
    fn malformed_payloads_fail_without_blanking() {
        let ingester = MobileAppIngester::new();
        ingester.ingest(&json!({"name": "微信"})).unwrap();

        for payload in [json!({}), json!(null), json!(""), json!([]), json!({"apps": []})] {
            let err = ingester.ingest(&payload).unwrap_err();
            assert!(matches!(err, IngestError::PayloadMalformed(_)), "{payload}");
        }

        let snapshot = ingester.snapshot();
        assert_eq!(snapshot.status, IngestStatus::Error);
        assert_eq!(snapshot.apps[0].name, "微信");
    }

    #[test]
    fn simple_ingestion_defaults_to_placeholder() {
        let ingester = MobileAppIngester::new();
        ingester.ingest_simple(None).unwrap();
        assert_eq!(ingester.snapshot().apps[0].name, UNKNOWN_APP);

        ingester.ingest_simple(Some("Maps")).unwrap();
        assert_eq!(ingester.snapshot().apps[0].name, "Maps");
        assert_eq!(ingester.snapshot().apps[0].package, "maps");
    }
}
