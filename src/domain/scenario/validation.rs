use std::collections::{BTreeMap, BTreeSet};

use crate::domain::scenario::function::{OpenbachFunction, WaitClause};
use crate::domain::scenario::scenario::Scenario;
use crate::domain::utils::id::FunctionId;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Looks for a cycle through wait-finished/wait-launched edges.
///
/// Nested references count as an edge to their host function. `replaced`
/// substitutes the wait clause of one function, so a candidate clause can be
/// checked before it is stored. Returns the functions on the cycle.
pub(crate) fn find_cycle(functions: &[OpenbachFunction], replaced: Option<(FunctionId, &WaitClause)>) -> Option<Vec<FunctionId>> {
    let mut edges: BTreeMap<FunctionId, BTreeSet<FunctionId>> = BTreeMap::new();
    for function in functions {
        let wait = match replaced {
            Some((id, wait)) if id == function.id => wait,
            _ => &function.wait,
        };
        edges.insert(function.id, wait.references().map(|r| r.outer_id()).collect());
    }

    let mut marks: BTreeMap<FunctionId, Mark> = BTreeMap::new();
    for &start in edges.keys() {
        if marks.contains_key(&start) {
            continue;
        }

        // Iterative DFS: the stack holds (node, remaining successors).
        let mut path: Vec<FunctionId> = vec![start];
        let mut stack: Vec<(FunctionId, Vec<FunctionId>)> = vec![(start, successors(&edges, start))];
        marks.insert(start, Mark::InProgress);

        while let Some((node, remaining)) = stack.last_mut() {
            match remaining.pop() {
                Some(next) => match marks.get(&next) {
                    Some(Mark::InProgress) => {
                        let position = path.iter().position(|id| *id == next).unwrap_or(0);
                        return Some(path[position..].to_vec());
                    }
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(next, Mark::InProgress);
                        path.push(next);
                        stack.push((next, successors(&edges, next)));
                    }
                },
                None => {
                    marks.insert(*node, Mark::Done);
                    path.pop();
                    stack.pop();
                }
            }
        }
    }
    None
}

fn successors(edges: &BTreeMap<FunctionId, BTreeSet<FunctionId>>, node: FunctionId) -> Vec<FunctionId> {
    edges.get(&node).map(|targets| targets.iter().rev().copied().collect()).unwrap_or_default()
}

impl Scenario {
    /// Re-checks every invariant on the whole graph, embedded scenarios included.
    ///
    /// The builder already enforces these on each call; serialization runs this
    /// again before anything leaves the process.
    pub fn validate(&self) -> Result<()> {
        self.parameters().check_unique_names()?;

        let mut previous: Option<FunctionId> = None;
        for function in self.functions() {
            if previous.is_some_and(|p| p >= function.id()) {
                return Err(Error::DuplicateId(function.id().value));
            }
            previous = Some(function.id());

            for target in function.wait().references() {
                self.resolve(target)?;
                if target.outer_id() == function.id() {
                    return Err(Error::Cycle { scenario: self.name().to_string(), id: function.id(), through: vec![function.id()] });
                }
            }

            self.check_payload(function.payload())?;
            if let Some(instance) = function.as_start_scenario() {
                instance.scenario.validate()?;
            }
        }

        if let Some(through) = find_cycle(self.functions(), None) {
            let id = through.first().copied().unwrap_or(FunctionId::new(0));
            return Err(Error::Cycle { scenario: self.name().to_string(), id, through });
        }

        Ok(())
    }
}
