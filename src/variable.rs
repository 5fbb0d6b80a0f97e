//! Definition of the variable module
//!
//! A `Variable` represents a discrete random variable in a Bayesian network. `Variable`s are
//! lightweight handles: they carry a unique identity and the number of states the variable can
//! take, and are freely copied into scopes, assignments and cliques. The human readable name of a
//! `Variable` is owned by the network that contains it.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// A discrete random variable with states `0..cardinality`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    /// Process-unique identity
    id: usize,

    /// The number of states of this `Variable`
    cardinality: usize
}

impl Variable {

    /// Construct a new binary `Variable`
    pub fn binary() -> Self {
        Variable::discrete(2)
    }

    /// Construct a new `Variable` with `cardinality` states.
    ///
    /// # Panics
    /// if `cardinality` is zero
    pub fn discrete(cardinality: usize) -> Self {
        assert!(cardinality > 0, "a Variable must have at least one state");

        Variable {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            cardinality
        }
    }

    /// The unique identity of this `Variable`
    pub fn id(&self) -> usize {
        self.id
    }

    /// The number of states of this `Variable`
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    /// Check whether `state` is one of the permitted states of this `Variable`
    pub fn is_value_permitted(&self, state: usize) -> bool {
        state < self.cardinality
    }
}

impl fmt::Display for Variable {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "X{}", self.id)
    }

}


/// A (possibly partial) assignment of states to `Variable`s
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assignment {
    values: HashMap<Variable, usize>
}

impl Assignment {

    pub fn new() -> Self {
        Assignment { values: HashMap::new() }
    }

    /// Assign `state` to `var`, replacing any previous assignment
    pub fn set(&mut self, var: &Variable, state: usize) {
        self.values.insert(*var, state);
    }

    pub fn get(&self, var: &Variable) -> Option<&usize> {
        self.values.get(var)
    }

    pub fn contains(&self, var: &Variable) -> bool {
        self.values.contains_key(var)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &usize)> {
        self.values.iter()
    }

    /// The states of `scope`, in order, or `None` if any variable is unassigned
    pub fn states_of(&self, scope: &[Variable]) -> Option<Vec<usize>> {
        scope.iter().map(|v| self.values.get(v).cloned()).collect()
    }
}


/// Iterator over every joint assignment to a scope.
///
/// Assignments are produced in row-major order - the last `Variable` of the scope changes
/// fastest - which matches the layout of a `Factor`'s table.
pub struct AllAssignments {
    scope: Vec<Variable>,
    current: Option<Vec<usize>>
}

impl Iterator for AllAssignments {
    type Item = Assignment;

    fn next(&mut self) -> Option<Assignment> {
        let states = self.current.take()?;

        let mut assignment = Assignment::new();
        for (v, &s) in self.scope.iter().zip(states.iter()) {
            assignment.set(v, s);
        }

        // advance the odometer
        let mut next = states;
        let mut i = self.scope.len();
        while i > 0 {
            i -= 1;
            next[i] += 1;
            if next[i] < self.scope[i].cardinality() {
                self.current = Some(next);
                return Some(assignment);
            }
            next[i] = 0;
        }

        Some(assignment)
    }
}

/// Enumerate all assignments to the given scope. The empty scope has exactly one (empty)
/// assignment.
pub fn all_assignments(scope: &[Variable]) -> AllAssignments {
    AllAssignments {
        scope: scope.to_vec(),
        current: Some(vec![0; scope.len()])
    }
}
