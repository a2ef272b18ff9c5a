//! Threshold store: the persisted breakpoint record and its sanitizer.
//!
//! Input is never rejected. Values are coerced the way a settings form
//! expects: leading integer digits, sign dropped, anything below 1 replaced
//! by the default, and `mobile` pulled below `tablet` when it is not.
//! [`sanitize_input`] is the only place the [`BreakpointPair`] invariant is
//! established; everything read back from storage passes through it too.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{BreakpointPair, Error, Result, DEFAULT_BREAKPOINTS};

/// Name of the persisted configuration record
pub const OPTION_NAME: &str = "breakpoint_override";

/// Unvalidated threshold values, as submitted by a form or found in storage.
///
/// A missing key means "keep the current value".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointInput {
    pub tablet: Option<String>,
    pub mobile: Option<String>,
}

impl BreakpointInput {
    pub fn new(tablet: impl ToString, mobile: impl ToString) -> Self {
        Self {
            tablet: Some(tablet.to_string()),
            mobile: Some(mobile.to_string()),
        }
    }

    pub fn tablet_only(tablet: impl ToString) -> Self {
        Self {
            tablet: Some(tablet.to_string()),
            mobile: None,
        }
    }

    pub fn mobile_only(mobile: impl ToString) -> Self {
        Self {
            tablet: None,
            mobile: Some(mobile.to_string()),
        }
    }

    /// Read the `tablet`/`mobile` keys of a stored record; other keys are ignored
    pub fn from_record(record: &Value) -> Self {
        Self {
            tablet: record.get("tablet").and_then(scalar_to_string),
            mobile: record.get("mobile").and_then(scalar_to_string),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

/// Coerce free-form text to a non-negative integer.
///
/// Leading whitespace and a sign are skipped and the leading run of digits is
/// taken; text without digits yields 0. Values beyond `u32` saturate.
pub fn coerce(raw: &str) -> u32 {
    let s = raw.trim_start();
    let s = s.strip_prefix(&['-', '+'][..]).unwrap_or(s);
    let digits: &str = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(end) => &s[..end],
        None => s,
    };
    if digits.is_empty() {
        return 0;
    }
    digits.parse::<u32>().unwrap_or(u32::MAX)
}

fn clamp_abs(value: i64) -> u32 {
    u32::try_from(value.unsigned_abs()).unwrap_or(u32::MAX)
}

/// Sanitize an integer pair into a valid [`BreakpointPair`]
pub fn sanitize(tablet: i64, mobile: i64) -> BreakpointPair {
    finish(clamp_abs(tablet), clamp_abs(mobile))
}

/// Sanitize raw input, taking missing keys from `current`
pub fn sanitize_input(input: &BreakpointInput, current: BreakpointPair) -> BreakpointPair {
    let tablet = input.tablet.as_deref().map(coerce).unwrap_or(current.tablet);
    let mobile = input.mobile.as_deref().map(coerce).unwrap_or(current.mobile);
    finish(tablet, mobile)
}

fn finish(mut tablet: u32, mut mobile: u32) -> BreakpointPair {
    if tablet < 1 {
        warn!("tablet breakpoint {} below 1, using default {}", tablet, DEFAULT_BREAKPOINTS.tablet);
        tablet = DEFAULT_BREAKPOINTS.tablet;
    }
    if mobile < 1 {
        warn!("mobile breakpoint {} below 1, using default {}", mobile, DEFAULT_BREAKPOINTS.mobile);
        mobile = DEFAULT_BREAKPOINTS.mobile;
    }
    // A 1px tablet range leaves no room for a mobile range
    if tablet < 2 {
        warn!("tablet breakpoint {} leaves no mobile range, raising to 2", tablet);
        tablet = 2;
    }
    if mobile >= tablet {
        warn!("mobile breakpoint {} not below tablet {}, forcing {}", mobile, tablet, tablet - 1);
        mobile = tablet - 1;
    }
    BreakpointPair::new(tablet, mobile)
}

/// Storage for named configuration records
pub trait OptionBackend: Send + Sync {
    fn load(&self, name: &str) -> Result<Option<Value>>;
    fn save(&self, name: &str, value: &Value) -> Result<()>;
    fn delete(&self, name: &str) -> Result<()>;
}

/// In-memory backend that keeps records in a Mutex
#[derive(Default)]
pub struct MemoryBackend {
    records: Mutex<HashMap<String, Value>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptionBackend for MemoryBackend {
    fn load(&self, name: &str) -> Result<Option<Value>> {
        let records = self
            .records
            .lock()
            .map_err(|_| Error::StorageError("option records lock poisoned".into()))?;
        Ok(records.get(name).cloned())
    }

    fn save(&self, name: &str, value: &Value) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| Error::StorageError("option records lock poisoned".into()))?;
        records.insert(name.to_string(), value.clone());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| Error::StorageError("option records lock poisoned".into()))?;
        records.remove(name);
        Ok(())
    }
}

/// TOML file backend: one top-level table per record.
///
/// ```toml
/// [breakpoint_override]
/// tablet = 900
/// mobile = 600
/// ```
pub struct TomlFileBackend {
    path: PathBuf,
}

impl TomlFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> Result<toml::Table> {
        if !self.path.exists() {
            return Ok(toml::Table::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::StorageError(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        toml::from_str::<toml::Table>(&content)
            .map_err(|e| Error::ParseError(format!("failed to parse TOML: {}", e)))
    }

    fn write_table(&self, table: &toml::Table) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string_pretty(table)
            .map_err(|e| Error::StorageError(format!("failed to serialize TOML: {}", e)))?;
        std::fs::write(&self.path, content).map_err(|e| {
            Error::StorageError(format!("failed to write {}: {}", self.path.display(), e))
        })
    }
}

impl OptionBackend for TomlFileBackend {
    fn load(&self, name: &str) -> Result<Option<Value>> {
        let table = self.read_table()?;
        match table.get(name) {
            Some(v) => serde_json::to_value(v)
                .map(Some)
                .map_err(|e| Error::ParseError(format!("record {}: {}", name, e))),
            None => Ok(None),
        }
    }

    fn save(&self, name: &str, value: &Value) -> Result<()> {
        let mut table = self.read_table()?;
        let v = toml::Value::try_from(value)
            .map_err(|e| Error::StorageError(format!("record {}: {}", name, e)))?;
        table.insert(name.to_string(), v);
        self.write_table(&table)
    }

    fn delete(&self, name: &str) -> Result<()> {
        let mut table = self.read_table()?;
        if table.remove(name).is_some() {
            self.write_table(&table)?;
        }
        Ok(())
    }
}

/// Holds the current breakpoint pair behind a persisted record.
///
/// Reads go to the backend every time, so an update made by an administrator
/// is seen by the next page render.
pub struct ThresholdStore {
    backend: Box<dyn OptionBackend>,
    name: String,
}

impl ThresholdStore {
    pub fn new<B: OptionBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Box::new(backend),
            name: OPTION_NAME.to_string(),
        }
    }

    /// Store backed by a [`MemoryBackend`]
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Use a record name other than [`OPTION_NAME`]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current pair; missing keys, a missing record or a storage failure yield defaults
    pub fn get(&self) -> BreakpointPair {
        match self.backend.load(&self.name) {
            Ok(Some(record)) => sanitize_input(&BreakpointInput::from_record(&record), DEFAULT_BREAKPOINTS),
            Ok(None) => DEFAULT_BREAKPOINTS,
            Err(e) => {
                warn!("failed to read {}: {}; using defaults", self.name, e);
                DEFAULT_BREAKPOINTS
            }
        }
    }

    /// Sanitize `candidate` over the current pair and persist the result.
    ///
    /// Keys missing from `candidate` keep their stored value, and the merged
    /// pair is validated as a whole.
    pub fn set(&self, candidate: &BreakpointInput) -> Result<BreakpointPair> {
        let pair = sanitize_input(candidate, self.get());
        self.backend.save(&self.name, &record(pair))?;
        info!("stored breakpoints: {}", pair);
        Ok(pair)
    }

    /// Seed the record with defaults when absent; returns whether it was created
    pub fn activate(&self) -> Result<bool> {
        if self.backend.load(&self.name)?.is_some() {
            return Ok(false);
        }
        self.backend.save(&self.name, &record(DEFAULT_BREAKPOINTS))?;
        Ok(true)
    }

    /// Remove the persisted record
    pub fn uninstall(&self) -> Result<()> {
        self.backend.delete(&self.name)
    }
}

fn record(pair: BreakpointPair) -> Value {
    serde_json::json!({ "tablet": pair.tablet, "mobile": pair.mobile })
}
