//! Definition of the factor module
//!
//! A `Factor` is a potential table: a non-negative function over the joint states of an ordered
//! scope of `Variable`s. Conditional probability tables, clique potentials and the messages
//! passed between cliques are all `Factor`s.

use crate::util::{Result, CtpError};
use crate::variable::{Variable, Assignment};

use ndarray::prelude as nd;
use itertools::Itertools;
use rand::Rng;

/// Alias f64 ndarray::Array as Table
pub type Table = nd::ArrayD<f64>;


/// A table over some scope of variables, as described in Koller & Friedman Section 4.2.
///
/// A `Factor` with an empty scope holds a single scalar. The identity `Factor` is the empty scope
/// holding `1.0`.
#[derive(Clone, Debug)]
pub struct Factor {
    /// The scope of the `Factor`
    scope: Vec<Variable>,

    /// The values of the `Factor` table. Axis `i` is indexed by the states of `scope[i]`.
    table: Table
}


impl Factor {

    /// Get the identity factor
    pub fn identity() -> Self {
        Factor::scalar(1.0)
    }


    /// A `Factor` with empty scope holding `value`
    pub fn scalar(value: f64) -> Self {
        Factor {
            scope: Vec::new(),
            table: Table::from_elem(nd::IxDyn(&[]), value)
        }
    }


    /// Create a new `Factor`
    ///
    /// # Errors
    /// * `CtpError::General` if the table does not have one axis per variable with matching length
    /// * `CtpError::DuplicateVariable` if a variable occurs twice in `scope`
    /// * `CtpError::NonPositiveProbability` if the table holds a negative value
    pub fn new(scope: Vec<Variable>, table: Table) -> Result<Self> {
        if scope.len() != table.ndim() {
            return Err(
                CtpError::General(
                    String::from("Invalid arguments. Cardinality of scope must match number of table dimensions")
                )
            );
        }

        for (v, t) in scope.iter().map(|v| v.cardinality()).zip(table.shape().iter()) {
            if v != *t {
                return Err(
                    CtpError::General(
                        String::from("Invalid arguments. Dimensions do not match")
                    )
                );
            }
        }

        if scope.iter().unique().count() != scope.len() {
            return Err(CtpError::DuplicateVariable);
        }

        // factors may not have negative values
        if table.iter().any(|&v| v < 0.0 || v.is_nan()) {
            return Err(CtpError::NonPositiveProbability);
        }

        Ok(Factor { scope, table })
    }


    /// Create a conditional probability distribution ```P(var | parents)```.
    ///
    /// The resulting scope is ```parents ++ [var]```, so `table` must have the parents' axes first
    /// and `var`'s axis last. Every conditional distribution (each lane along the last axis) must
    /// sum to one.
    pub fn cpd(var: Variable, parents: Vec<Variable>, table: Table) -> Result<Self> {
        let mut scope = parents;
        scope.push(var);

        let factor = Factor::new(scope, table)?;
        if !factor.is_conditional_of(&var) {
            return Err(CtpError::NotACPD);
        }

        Ok(factor)
    }


    /// An indicator `Factor` over `vars` that is `1.0` at `states` and `0.0` everywhere else.
    /// With no variables this is the identity.
    pub fn indicator(vars: &[Variable], states: &[usize]) -> Result<Self> {
        if vars.len() != states.len() {
            return Err(CtpError::IncompleteAssignment);
        }

        for (v, &s) in vars.iter().zip(states.iter()) {
            if !v.is_value_permitted(s) {
                return Err(CtpError::InvalidState {
                    name: v.to_string(),
                    state: s,
                    cardinality: v.cardinality()
                });
            }
        }

        let shape: Vec<usize> = vars.iter().map(|v| v.cardinality()).collect();
        let mut table = Table::zeros(nd::IxDyn(&shape));
        table[nd::IxDyn(states)] = 1.0;

        Factor::new(vars.to_vec(), table)
    }


    /// Check if the `Factor` is the identity `Factor`
    pub fn is_identity(&self) -> bool {
        self.scope.is_empty() && self.table[nd::IxDyn(&[])] == 1.0
    }


    /// Check if the `Factor` is a conditional distribution of `var` given the rest of its scope,
    /// i.e. each lane along `var`'s axis sums to one.
    pub fn is_conditional_of(&self, var: &Variable) -> bool {
        match self.axis_of(var) {
            Some(i) => self.table.lanes(nd::Axis(i))
                                 .into_iter()
                                 .all(|lane| (lane.sum() - 1.0).abs() <= 0.001),
            None => false
        }
    }


    /// Retrieve the scope of the `Factor`.
    pub fn scope(&self) -> &[Variable] {
        &self.scope
    }


    /// Number of variables in the scope
    pub fn dimension(&self) -> usize {
        self.scope.len()
    }


    /// Check whether `var` is part of the scope of this `Factor`
    pub fn contains(&self, var: &Variable) -> bool {
        self.scope.contains(var)
    }


    /// Borrow the underlying table
    pub fn table(&self) -> &Table {
        &self.table
    }


    /// The values of the table in row-major order of the scope
    pub fn cells(&self) -> Vec<f64> {
        self.table.iter().cloned().collect()
    }


    fn axis_of(&self, var: &Variable) -> Option<usize> {
        self.scope.iter().position(|v| v == var)
    }


    /// Retrieve the value for a complete assignment over the scope of this `Factor`
    ///
    /// # Args
    /// assignment: a full assignment to the scope of a `Factor`. The assignment's scope  may be a
    ///             superset  of the `Factor`s scope.
    ///
    /// # Errors
    /// * `CtpError::IncompleteAssignment`, if assignment is not a complete assignment to the
    ///   scope of the `Factor`
    pub fn value(&self, assignment: &Assignment) -> Result<f64> {
        let idx = assignment.states_of(&self.scope).ok_or(CtpError::IncompleteAssignment)?;

        self.table.get(nd::IxDyn(&idx)).cloned().ok_or(
            CtpError::General(String::from("Assignment holds a state outside of the table"))
        )
    }


    /// Product of this `Factor` and another `Factor`.
    ///
    /// Defined in Koller & Friedman Section 4.2.1. Scopes need not intersect; the product of
    /// disjoint factors is their outer product.
    ///
    /// # Returns
    /// A new `Factor` of scope union(self.scope(), other.scope()), ordered as self's scope followed
    /// by the variables only other contains.
    pub fn product(&self, other: &Factor) -> Factor {
        // the identity is the multiplicative identity
        if self.is_identity() {
            return other.clone();
        } else if other.is_identity() {
            return self.clone();
        }

        let scope: Vec<Variable> = self.scope.iter()
                                             .chain(other.scope.iter())
                                             .cloned()
                                             .unique()
                                             .collect();

        let shape: Vec<usize> = scope.iter().map(|v| v.cardinality()).collect();

        // position of each operand axis within the new scope
        let left: Vec<usize> = self.scope.iter().map(|v| position(&scope, v)).collect();
        let right: Vec<usize> = other.scope.iter().map(|v| position(&scope, v)).collect();

        let mut li = vec![0; left.len()];
        let mut ri = vec![0; right.len()];

        let table = Table::from_shape_fn(nd::IxDyn(&shape), |idx| {
            for (k, &p) in left.iter().enumerate() {
                li[k] = idx[p];
            }
            for (k, &p) in right.iter().enumerate() {
                ri[k] = idx[p];
            }

            self.table[nd::IxDyn(&li)] * other.table[nd::IxDyn(&ri)]
        });

        Factor { scope, table }
    }


    /// Fix `var` to `state`, removing it from the scope.
    ///
    /// If `var` is not part of the scope, the `Factor` is returned unchanged.
    ///
    /// # Panics
    /// if `state` is not a permitted state of `var`
    pub fn project(&self, var: &Variable, state: usize) -> Factor {
        match self.axis_of(var) {
            Some(i) => {
                let table = self.table.index_axis(nd::Axis(i), state).to_owned();
                let scope = self.scope.iter().filter(|&v| v != var).cloned().collect();

                Factor { scope, table }
            },
            None => self.clone()
        }
    }


    /// Reduce the `Factor` over the given partial assignment
    ///
    /// Defined in Koller & Friedman 4.2.3
    pub fn reduce(&self, assignment: &Assignment) -> Factor {
        let mut reduced = self.clone();
        for (var, &state) in assignment.iter() {
            reduced = reduced.project(var, state);
        }

        reduced
    }


    /// Sum `var` out of the `Factor`
    ///
    /// Defined in Koller & Friedman 9.3.1. A variable outside of the scope leaves the `Factor`
    /// unchanged.
    pub fn sum_out(&self, var: &Variable) -> Factor {
        match self.axis_of(var) {
            Some(i) => {
                let table = self.table.sum_axis(nd::Axis(i));
                let scope = self.scope.iter().filter(|&v| v != var).cloned().collect();

                Factor { scope, table }
            },
            None => self.clone()
        }
    }


    /// Sum out every variable that is not in `keep`
    pub fn marginalize_to(&self, keep: &[Variable]) -> Factor {
        let drop: Vec<Variable> = self.scope.iter().filter(|v| !keep.contains(v)).cloned().collect();

        drop.iter().fold(self.clone(), |f, v| f.sum_out(v))
    }


    /// Normalize the `Factor` so its values sum to one.
    ///
    /// # Returns
    /// the normalizing constant, i.e. the sum of the values before normalization. A `Factor` whose
    /// values sum to zero is left untouched.
    pub fn normalize(&mut self) -> f64 {
        let z = self.table.sum();
        if z > 0.0 {
            self.table.mapv_inplace(|x| x / z);
        }

        z
    }


    /// Normalize the `Factor` into a conditional distribution of `var` given the remainder of its
    /// scope. Conditional slices with no mass become uniform.
    pub fn normalize_over(&mut self, var: &Variable) -> Result<()> {
        let i = self.axis_of(var).ok_or(CtpError::InvalidScope)?;
        let uniform = 1.0 / var.cardinality() as f64;

        for mut lane in self.table.lanes_mut(nd::Axis(i)) {
            let z = lane.sum();
            if z > 0.0 {
                lane.mapv_inplace(|x| x / z);
            } else {
                lane.fill(uniform);
            }
        }

        Ok(())
    }


    /// Sum of every value in the table
    pub fn sum_up(&self) -> f64 {
        self.table.sum()
    }


    /// Reorder the scope of this `Factor`. `order` must be a permutation of the scope.
    pub fn permute(&self, order: &[Variable]) -> Result<Factor> {
        if order.len() != self.scope.len() {
            return Err(CtpError::InvalidScope);
        }

        let axes: Option<Vec<usize>> = order.iter().map(|v| self.axis_of(v)).collect();
        let axes = axes.ok_or(CtpError::InvalidScope)?;

        let table = self.table.view()
                              .permuted_axes(nd::IxDyn(&axes))
                              .as_standard_layout()
                              .into_owned();

        Factor::new(order.to_vec(), table)
    }


    /// Compare two `Factor`s over the same set of variables, irrespective of scope order
    pub fn approx_eq(&self, other: &Factor, tolerance: f64) -> bool {
        match other.permute(&self.scope) {
            Ok(o) => self.table.iter()
                               .zip(o.table.iter())
                               .all(|(a, b)| (a - b).abs() <= tolerance),
            Err(_) => false
        }
    }


    /// Draw a state of `var` from this conditional distribution.
    ///
    /// # Args
    /// * `var`: the variable to sample
    /// * `given`: an assignment covering at least every other variable in the scope
    /// * `rng`: the source of randomness
    ///
    /// # Errors
    /// * `CtpError::InvalidScope` if `var` is not in the scope
    /// * `CtpError::IncompleteAssignment` if the remaining scope is not fully assigned
    pub fn sample_cpd<R: Rng + ?Sized>(
        &self,
        var: &Variable,
        given: &Assignment,
        rng: &mut R
    ) -> Result<usize> {
        if !self.contains(var) {
            return Err(CtpError::InvalidScope);
        }

        let mut conditional = self.clone();
        for v in self.scope.iter().filter(|&v| v != var) {
            let &state = given.get(v).ok_or(CtpError::IncompleteAssignment)?;
            conditional = conditional.project(v, state);
        }

        let total = conditional.sum_up();
        if total <= 0.0 {
            return Err(CtpError::NotACPD);
        }

        let mut target = rng.gen::<f64>() * total;
        for (state, &p) in conditional.table.iter().enumerate() {
            if target < p {
                return Ok(state);
            }
            target -= p;
        }

        // round off can leave a sliver of mass past the last state
        Ok(var.cardinality() - 1)
    }

}


fn position(scope: &[Variable], var: &Variable) -> usize {
    scope.iter().position(|v| v == var).unwrap_or(0)
}


// Unit tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::all_assignments;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn identity() {
        let f = Factor::identity();

        assert!(f.is_identity());
        assert_eq!(0, f.dimension());
        assert_eq!(1.0, f.sum_up());
        assert!(!Factor::scalar(0.5).is_identity());
    }

    #[test]
    fn table_factor() {
        let vars = vec![ Variable::binary(), Variable::discrete(5), Variable::discrete(3) ];
        let mut table = Table::ones(nd::IxDyn(&[2, 5, 3]));
        table[nd::IxDyn(&[1, 1, 1])] = 5.;

        let f = Factor::new(vars.clone(), table).unwrap();

        assert!(! f.is_identity());
        for (x, y, z) in iproduct!(0..2, 0..5, 0..3) {
            let mut assn = Assignment::new();
            assn.set(&vars[0], x);
            assn.set(&vars[1], y);
            assn.set(&vars[2], z);

            let val = f.value(&assn).unwrap();
            if x == 1 && y == 1 && z == 1 {
                assert_eq!(5., val);
            } else {
                assert_eq!(1., val);
            }
        }
    }

    #[test]
    fn table_factor_errs() {
        // mismatched number of dimensions
        let vars = vec![ Variable::binary(), Variable::binary() ];
        let table = Table::ones(nd::IxDyn(&[2, 2, 2]));
        match Factor::new(vars.clone(), table) {
            Err(CtpError::General(_)) => (),
            _ => panic!("wrong error type")
        };

        // wrong cardinality
        let table = Table::ones(nd::IxDyn(&[2, 3]));
        match Factor::new(vars.clone(), table) {
            Err(CtpError::General(_)) => (),
            _ => panic!("wrong error type")
        };

        // duplicate variable
        let table = Table::ones(nd::IxDyn(&[2, 2]));
        assert_eq!(
            CtpError::DuplicateVariable,
            Factor::new(vec![vars[0], vars[0]], table).unwrap_err()
        );

        // negative entry
        let table = array![[1., -1.], [0., 0.]].into_dyn();
        assert_eq!(
            CtpError::NonPositiveProbability,
            Factor::new(vars.clone(), table).unwrap_err()
        );
    }

    #[test]
    fn cpd() {
        let i = Variable::binary();
        let s = Variable::binary();

        let f = Factor::cpd(s, vec![i], array![[0.95, 0.05], [0.2, 0.8]].into_dyn()).unwrap();
        assert_eq!(&[i, s], f.scope());
        assert!(f.is_conditional_of(&s));
        assert!(!f.is_conditional_of(&i));

        let bad = Factor::cpd(s, vec![i], array![[0.5, 0.05], [0.2, 0.8]].into_dyn());
        assert_eq!(CtpError::NotACPD, bad.unwrap_err());
    }

    #[test]
    fn indicator() {
        let a = Variable::discrete(3);
        let b = Variable::binary();

        let f = Factor::indicator(&[a, b], &[2, 0]).unwrap();
        assert_eq!(1.0, f.sum_up());
        let mut assn = Assignment::new();
        assn.set(&a, 2);
        assn.set(&b, 0);
        assert_eq!(1.0, f.value(&assn).unwrap());

        assert!(Factor::indicator(&[], &[]).unwrap().is_identity());
        assert!(Factor::indicator(&[b], &[2]).is_err());
    }

    #[test]
    /// Example taken from Koller & Friedman Figure 4.3
    fn product() {
        let a = Variable::discrete(3);
        let b = Variable::binary();
        let c = Variable::binary();

        let tbl1 = nd::Array::from_shape_vec(
            (3, 2),
            vec![ 0.5, 0.8, 0.1, 0., 0.3, 0.9 ]
        ).expect("Unexpected error").into_dyn();
        let phi1 = Factor::new(vec![ a, b ], tbl1).expect("Unexpected error");

        let tbl2 = nd::Array::from_shape_vec(
            (2, 2),
            vec![ 0.5, 0.7, 0.1, 0.2 ]
        ).expect("Unexpected error").into_dyn();
        let phi2 = Factor::new(vec![ b, c ], tbl2).expect("Unexpected error");

        let phi = phi1.product(&phi2);
        assert_eq!(&[a, b, c], phi.scope());

        let expected = nd::Array::from_shape_vec(
            (3, 2, 2),
            vec![ 0.25, 0.35, 0.08, 0.16, 0.05, 0.07, 0., 0., 0.15, 0.21, 0.09, 0.18 ]
        ).expect("Unexpected error").into_dyn();

        for (x, y, z) in iproduct!(0..3, 0..2, 0..2) {
            let mut assn = Assignment::new();
            assn.set(&a, x);
            assn.set(&b, y);
            assn.set(&c, z);

            let val = expected[nd::IxDyn(&[x, y, z])];
            assert!((val - phi.value(&assn).unwrap()).abs() < 1e-12);
        }
    }

    #[test]
    fn prod_identity() {
        let a = Variable::discrete(3);
        let b = Variable::binary();

        let tbl1 = array![[ 0.5, 0.8 ], [ 0.1, 0. ], [ 0.3, 0.9 ]].into_dyn();
        let phi1 = Factor::new(vec![ a, b ], tbl1).expect("Unexpected error");

        let phi = phi1.product(&Factor::identity());
        assert!(phi.approx_eq(&phi1, 0.0));

        let phi = Factor::identity().product(&phi1);
        assert!(phi.approx_eq(&phi1, 0.0));
    }

    #[test]
    fn prod_disjoint() {
        let a = Variable::binary();
        let b = Variable::binary();

        let pa = Factor::new(vec![a], array![0.2, 0.8].into_dyn()).unwrap();
        let pb = Factor::new(vec![b], array![0.5, 0.5].into_dyn()).unwrap();

        let joint = pa.product(&pb);
        assert_eq!(&[a, b], joint.scope());
        assert_eq!(vec![0.1, 0.1, 0.4, 0.4], joint.cells());

        let scaled = Factor::scalar(2.0).product(&pa);
        assert_eq!(vec![0.4, 1.6], scaled.cells());
    }

    #[test]
    /// Example take from Koller & Friedman Figure 4.5
    fn project() {
        let a = Variable::discrete(3);
        let b = Variable::binary();
        let c = Variable::binary();

        let table = nd::Array::from_shape_vec(
            (3, 2, 2),
            vec![ 0.25, 0.35, 0.08, 0.16, 0.05, 0.07, 0., 0., 0.15, 0.21, 0.09, 0.18 ]
        ).expect("Unexpected error").into_dyn();

        let phi = Factor::new(vec![a, b, c], table).expect("Unexpected error");

        let reduced = phi.project(&c, 0);
        assert_eq!(&[a, b], reduced.scope());
        assert_eq!(vec![ 0.25, 0.08, 0.05, 0., 0.15, 0.09 ], reduced.cells());

        // projecting a variable outside of the scope is a no-op
        let d = Variable::binary();
        assert!(phi.project(&d, 1).approx_eq(&phi, 0.0));
    }

    #[test]
    fn reduce_full() {
        let a = Variable::binary();
        let b = Variable::binary();

        let table = array![[ 0.1, 0.2 ], [ 0.3, 0.4 ]].into_dyn();
        let phi = Factor::new(vec![a, b], table).expect("Unexpected error");

        let mut assn = Assignment::new();
        assn.set(&a, 1);
        assn.set(&b, 0);

        // a complete assignment leaves a scalar, not the identity
        let reduced = phi.reduce(&assn);
        assert_eq!(0, reduced.dimension());
        assert!((reduced.sum_up() - 0.3).abs() < 1e-12);
    }

    #[test]
    /// Example taken from Koller & Friedman Figure 9.7
    fn sum_out() {
        let a = Variable::discrete(3);
        let b = Variable::binary();
        let c = Variable::binary();

        let table = nd::Array::from_shape_vec(
            (3, 2, 2),
            vec![ 0.25, 0.35, 0.08, 0.16, 0.05, 0.07, 0., 0., 0.15, 0.21, 0.09, 0.18 ]
        ).expect("Unexpected error").into_dyn();

        let phi = Factor::new(vec![a, b, c], table).expect("Unexpected error");

        let marginalized = phi.sum_out(&b);
        assert_eq!(&[a, c], marginalized.scope());

        let expected = array![[0.33, 0.51], [0.05, 0.07], [0.24, 0.39]].into_dyn();
        for assn in all_assignments(&[a, c]) {
            let idx = assn.states_of(&[a, c]).unwrap();
            let val = expected[nd::IxDyn(&idx)];
            assert!((val - marginalized.value(&assn).unwrap()).abs() < 1e-12);
        }

        let only_a = phi.marginalize_to(&[a]);
        assert_eq!(&[a], only_a.scope());
        assert!((only_a.cells()[0] - 0.84).abs() < 1e-12);
    }

    #[test]
    fn normalize() {
        let a = Variable::binary();
        let mut f = Factor::new(vec![a], array![1., 3.].into_dyn()).unwrap();

        assert_eq!(4.0, f.normalize());
        assert_eq!(vec![0.25, 0.75], f.cells());

        let mut zero = Factor::new(vec![a], array![0., 0.].into_dyn()).unwrap();
        assert_eq!(0.0, zero.normalize());
        assert_eq!(vec![0., 0.], zero.cells());
    }

    #[test]
    fn normalize_over() {
        let a = Variable::binary();
        let b = Variable::binary();

        let mut f = Factor::new(vec![a, b], array![[1., 3.], [0., 0.]].into_dyn()).unwrap();
        f.normalize_over(&b).unwrap();

        assert_eq!(vec![0.25, 0.75, 0.5, 0.5], f.cells());
        assert!(f.is_conditional_of(&b));
    }

    #[test]
    fn permute() {
        let a = Variable::binary();
        let b = Variable::discrete(3);

        let f = Factor::new(vec![a, b], array![[1., 2., 3.], [4., 5., 6.]].into_dyn()).unwrap();
        let g = f.permute(&[b, a]).unwrap();

        assert_eq!(&[b, a], g.scope());
        assert_eq!(vec![1., 4., 2., 5., 3., 6.], g.cells());
        assert!(f.approx_eq(&g, 0.0));
        assert!(f.permute(&[a]).is_err());
    }

    #[test]
    fn sample_cpd() {
        let i = Variable::binary();
        let s = Variable::binary();

        let f = Factor::cpd(s, vec![i], array![[1.0, 0.0], [0.0, 1.0]].into_dyn()).unwrap();
        let mut rng = StdRng::seed_from_u64(17);

        let mut given = Assignment::new();
        given.set(&i, 1);
        for _ in 0..20 {
            assert_eq!(1, f.sample_cpd(&s, &given, &mut rng).unwrap());
        }

        assert_eq!(
            CtpError::IncompleteAssignment,
            f.sample_cpd(&s, &Assignment::new(), &mut rng).unwrap_err()
        );
    }
}
