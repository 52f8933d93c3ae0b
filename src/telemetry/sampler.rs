//! Fault-isolated field access
//!
//! Every value in a snapshot comes from an independent host query that may
//! fail. [`Sampler::sample`] turns a failed query into `None` after logging
//! it, so one bad field never takes the rest of the snapshot down with it.

use crate::host::{FieldGroup, QueryArg, TelemetrySource};
use serde_json::Value;

/// Wraps a [`TelemetrySource`] for one snapshot capture
pub struct Sampler<'a, S: TelemetrySource + ?Sized> {
    source: &'a mut S,
    queries: u64,
    failures: u64,
}

impl<'a, S: TelemetrySource + ?Sized> Sampler<'a, S> {
    pub fn new(source: &'a mut S) -> Self {
        Self {
            source,
            queries: 0,
            failures: 0,
        }
    }

    /// Whether the provider for `group` is present
    pub fn provides(&self, group: FieldGroup) -> bool {
        self.source.provides(group)
    }

    /// Query one field, collapsing any failure to `None`
    pub fn sample(&mut self, group: FieldGroup, name: &str, args: &[QueryArg]) -> Option<Value> {
        self.queries += 1;
        match self.source.query(group, name, args) {
            Ok(value) => Some(value),
            Err(e) => {
                self.failures += 1;
                tracing::debug!("{}.{} unavailable: {}", group, name, e);
                None
            }
        }
    }

    /// Queries issued so far
    pub fn queries(&self) -> u64 {
        self.queries
    }

    /// Queries that failed so far
    pub fn failures(&self) -> u64 {
        self.failures
    }
}

/// One-off fault-isolated query
pub fn sample<S: TelemetrySource + ?Sized>(
    source: &mut S,
    group: FieldGroup,
    name: &str,
    args: &[QueryArg],
) -> Option<Value> {
    Sampler::new(source).sample(group, name, args)
}
