//! Observed evidence, and its absorption into the CPDs attached to a `CliqueTree`.

use crate::clique_tree::CliqueTree;
use crate::factor::Factor;
use crate::model::DiscreteBayesNet;
use crate::util::{CtpError, Result};
use crate::variable::{Assignment, Variable};

use indexmap::IndexMap;


/// A set of observations. Each `Variable` is either observed in one state, or explicitly missing.
///
/// A missing `Variable` is treated exactly as if it had never been mentioned.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Evidence {
    values: IndexMap<Variable, Option<usize>>
}

impl Evidence {

    pub fn new() -> Self {
        Evidence { values: IndexMap::new() }
    }

    /// Observe `var` in `state`
    pub fn observe(&mut self, var: &Variable, state: usize) {
        self.values.insert(*var, Some(state));
    }

    /// Mark `var` as missing
    pub fn missing(&mut self, var: &Variable) {
        self.values.insert(*var, None);
    }

    /// Builder style variant of `observe`
    pub fn with(mut self, var: &Variable, state: usize) -> Self {
        self.observe(var, state);
        self
    }

    /// The recorded value of `var`, if any. `Some(None)` means `var` is explicitly missing.
    pub fn get(&self, var: &Variable) -> Option<Option<usize>> {
        self.values.get(var).cloned()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Option<usize>)> {
        self.values.iter()
    }

    /// The evidence observing each of `vars` in its state from `row`. Variables without a state
    /// in `row` are marked missing.
    pub fn from_row(row: &Assignment, vars: &[Variable]) -> Self {
        Evidence {
            values: vars.iter().map(|v| (*v, row.get(v).cloned())).collect()
        }
    }

    /// Check the observations against `network`, returning them as an `Assignment`.
    ///
    /// Missing values are dropped before any other check.
    ///
    /// # Errors
    /// * `CtpError::UnknownVariable` if an observed `Variable` is not part of `network`
    /// * `CtpError::InvalidState` if an observed state is out of range for its `Variable`
    pub fn validate(&self, network: &DiscreteBayesNet) -> Result<Assignment> {
        let mut observed = Assignment::new();

        for (var, state) in self.values.iter() {
            let state = match state {
                Some(s) => *s,
                None => continue
            };

            if ! network.contains(var) {
                return Err(CtpError::UnknownVariable(var.to_string()));
            }

            if ! var.is_value_permitted(state) {
                return Err(CtpError::InvalidState {
                    name: network.name_of(var),
                    state,
                    cardinality: var.cardinality()
                });
            }

            observed.set(var, state);
        }

        Ok(observed)
    }
}

impl<'a> From<&'a Assignment> for Evidence {
    fn from(assignment: &'a Assignment) -> Self {
        Evidence {
            values: assignment.iter().map(|(v, s)| (*v, Some(*s))).collect()
        }
    }
}


/// Absorb `evidence` into the CPDs of `network` and attach them to `tree`.
///
/// Each observed `Variable`'s own CPD and the CPDs of its children are projected onto the observed
/// state. Every resulting table is attached to the family clique of the `Variable` it belongs to.
///
/// # Returns
/// the attached tables, indexed by `CliqueId`
pub(crate) fn absorb(
    network: &DiscreteBayesNet,
    tree: &CliqueTree,
    evidence: &Assignment
) -> Result<Vec<Vec<Factor>>> {
    let mut functions: IndexMap<Variable, Factor> = IndexMap::new();
    for var in network.variables() {
        let cpd = network.cpd(&var).ok_or_else(|| CtpError::UnknownVariable(var.to_string()))?;
        functions.insert(var, cpd.clone());
    }

    for (var, &state) in evidence.iter() {
        if let Some(f) = functions.get_mut(var) {
            *f = f.project(var, state);
        }

        for child in network.children(var)? {
            if let Some(f) = functions.get_mut(&child) {
                *f = f.project(var, state);
            }
        }
    }

    let mut attached = vec![Vec::new(); tree.len()];
    for (var, f) in functions {
        attached[tree.family_clique(&var)?].push(f);
    }

    Ok(attached)
}
