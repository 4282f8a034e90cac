// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-source outcomes of a start or stop pass.

use fwdd_core::{FwddError, Identity, LifecyclePhase};

/// Outcome of one source's start or stop call.
#[derive(Debug)]
pub struct SourceOutcome {
    pub identity: Identity,
    pub result: Result<(), FwddError>,
}

/// Aggregate of every per-source outcome of one lifecycle pass, in the order
/// the sources were visited.
#[derive(Debug)]
pub struct LifecycleReport {
    phase: LifecyclePhase,
    outcomes: Vec<SourceOutcome>,
}

impl LifecycleReport {
    pub fn new(phase: LifecyclePhase) -> Self {
        Self {
            phase,
            outcomes: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, identity: Identity, result: Result<(), FwddError>) {
        self.outcomes.push(SourceOutcome { identity, result });
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn outcomes(&self) -> &[SourceOutcome] {
        &self.outcomes
    }

    /// True when no source failed. An empty report is a success.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Identities whose call succeeded.
    pub fn succeeded(&self) -> Vec<&Identity> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_ok())
            .map(|o| &o.identity)
            .collect()
    }

    /// Identities whose call failed.
    pub fn failed(&self) -> Vec<&Identity> {
        self.failures().map(|(id, _)| id).collect()
    }

    /// Failed identities with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&Identity, &FwddError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.identity, e)))
    }

    /// Outcome for one identity, if it was visited.
    pub fn outcome(&self, identity: &Identity) -> Option<&Result<(), FwddError>> {
        self.outcomes
            .iter()
            .find(|o| &o.identity == identity)
            .map(|o| &o.result)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Collapse into `Ok(())` or a `PartialFailure` naming every failed source.
    pub fn into_result(self) -> Result<(), FwddError> {
        let failed: Vec<Identity> = self
            .outcomes
            .into_iter()
            .filter(|o| o.result.is_err())
            .map(|o| o.identity)
            .collect();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(FwddError::PartialFailure {
                phase: self.phase,
                failed,
            })
        }
    }
}
