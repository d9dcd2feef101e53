use std::collections::BTreeMap;

use crate::domain::scenario::function::{FunctionHandle, FunctionPayload, WaitClause};
use crate::domain::scenario::scenario::Scenario;
use crate::error::{Error, Result};

/// Ordering rules of explicit ids, shared with the flat file loader.
///
/// `explicit_id` must be new, and every dependency must be smaller than it and
/// already declared. Waiting on a later id is refused even for wait-launched.
pub fn check_declaration(is_declared: &dyn Fn(u32) -> bool, explicit_id: u32, wait_launched: &[u32], wait_finished: &[u32]) -> Result<()> {
    if is_declared(explicit_id) {
        return Err(Error::DuplicateId(explicit_id));
    }

    for &dependency in wait_launched.iter().chain(wait_finished) {
        if dependency >= explicit_id || !is_declared(dependency) {
            return Err(Error::ForwardReference { id: explicit_id, dependency });
        }
    }
    Ok(())
}

/// Appends functions whose dependencies are given as raw integer ids.
///
/// Ids come from an external description (e.g. a flat traffic file) and are
/// only meaningful within it. Each declaration may only depend on ids that were
/// declared before it and are smaller than its own id, which rules out self and
/// forward references. A rejected declaration adds nothing to the scenario.
#[derive(Debug, Clone, Default)]
pub struct ExplicitIdComposer {
    declared: BTreeMap<u32, FunctionHandle>,
}

impl ExplicitIdComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks a declaration without adding it.
    pub fn check(&self, explicit_id: u32, wait_launched: &[u32], wait_finished: &[u32]) -> Result<()> {
        check_declaration(&|id| self.declared.contains_key(&id), explicit_id, wait_launched, wait_finished)
    }

    /// Appends `payload` to `scenario`, waiting on the given ids on top of `wait`.
    pub fn declare(
        &mut self,
        scenario: &mut Scenario,
        explicit_id: u32,
        wait_launched: &[u32],
        wait_finished: &[u32],
        wait: WaitClause,
        payload: impl Into<FunctionPayload>,
    ) -> Result<FunctionHandle> {
        self.check(explicit_id, wait_launched, wait_finished)?;

        let wait = wait
            .after_all_launched(wait_launched.iter().filter_map(|id| self.declared.get(id).copied()))
            .after_all_finished(wait_finished.iter().filter_map(|id| self.declared.get(id).copied()));

        let handle = scenario.add_function(payload, wait)?;
        self.declared.insert(explicit_id, handle);
        Ok(handle)
    }

    pub fn handle(&self, explicit_id: u32) -> Option<FunctionHandle> {
        self.declared.get(&explicit_id).copied()
    }

    /// Declared handles in ascending explicit id order.
    pub fn handles(&self) -> impl Iterator<Item = FunctionHandle> + '_ {
        self.declared.values().copied()
    }

    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }
}
