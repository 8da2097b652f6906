//! Outcome of a registration batch and its failure log.

use std::fs;
use std::path::Path;

use serde_json::Value;

use replicator_core::FileSpec;

use crate::error::RegistrationError;
use crate::registrar::RegisteredReplica;

/// Per-file outcomes of a registration batch, in input order.
#[derive(Debug, Default)]
pub struct RegistrationReport {
    pub outcomes: Vec<(FileSpec, Result<RegisteredReplica, RegistrationError>)>,
}

impl RegistrationReport {
    pub fn successes(&self) -> impl Iterator<Item = &RegisteredReplica> {
        self.outcomes.iter().filter_map(|(_, outcome)| outcome.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&FileSpec, &RegistrationError)> {
        self.outcomes
            .iter()
            .filter_map(|(spec, outcome)| outcome.as_ref().err().map(|e| (spec, e)))
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// True when every file was registered.
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// The failed entries as given, each with an added `"error"` field.
    pub fn failure_log(&self) -> Vec<Value> {
        self.failures()
            .map(|(spec, error)| {
                let mut entry = serde_json::to_value(spec).unwrap_or_else(
                    |_| serde_json::json!({ "scope": spec.scope, "pfn": spec.pfn }),
                );
                if let Value::Object(map) = &mut entry {
                    map.insert("error".into(), Value::String(error.to_string()));
                }
                entry
            })
            .collect()
    }

    /// Write the failure log to `path` as a JSON array.
    ///
    /// Nothing is written when there are no failures. Returns whether the
    /// file was written.
    pub fn write_failure_log(&self, path: impl AsRef<Path>) -> std::io::Result<bool> {
        let log = self.failure_log();
        if log.is_empty() {
            return Ok(false);
        }

        let path = path.as_ref();
        let json = serde_json::to_vec_pretty(&log)?;
        fs::write(path, json)?;
        tracing::info!(path = %path.display(), failures = log.len(), "failure log written");
        Ok(true)
    }
}
