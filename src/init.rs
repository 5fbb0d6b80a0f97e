//! Module containing initialization routines for the parameters of a network.

use crate::factor::{Factor, Table};
use crate::util::{CtpError, Result};
use crate::variable::Variable;

use ndarray::prelude as nd;
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use rand::Rng;

/// Defines possible ways to initialize a `Variable`s CPD.
pub enum Initialization<'a> {
    /// A uniform distribution over all possibilities
    Uniform,

    /// Randomly initialize the weights of the CPD.
    Random,

    /// Initialize the CPD as a Binomial distribution with parameter ```p```.
    /// Note that this `Initialization` is valid only to a `Variable` with no parents.
    Binomial(f64),

    /// Initialize the CPD as a Multinomial distribution with parameters ```p_0, p_1...```.
    /// Note that this `Initialization` is valid only to a `Variable` with no parents.
    Multinomial(&'a [f64]),

    /// User defined CPD
    Table(Factor)
}


impl<'a> Initialization<'a> {

    /// Construct a CPD, initialized based on ```self```, drawing any randomness from the thread
    /// local generator.
    pub fn build_cpd(self, var: Variable, parents: Vec<Variable>) -> Result<Factor> {
        self.build_cpd_using(var, parents, &mut rand::thread_rng())
    }

    /// Construct a CPD, initialized based on ```self```
    ///
    /// # Args
    /// * `var`: the variable the CPD is defined for
    /// * `parents`: the conditioning variables
    /// * `rng`: the source of randomness for `Initialization::Random`
    ///
    /// # Returns
    /// a `Factor` with scope ```parents ++ [var]```. A user defined table is returned as given, as
    /// long as it is a CPD of `var` over exactly that family.
    pub fn build_cpd_using<R: Rng>(
        self,
        var: Variable,
        parents: Vec<Variable>,
        rng: &mut R
    ) -> Result<Factor> {
        ///////////////////////////////////////////////////////////////////////////////
        // Trivial cases

        // if this is a user defined factor, it just needs to be verified and returned
        if let Initialization::Table(f) = self {
            if ! f.is_conditional_of(&var) {
                return Err(CtpError::NotACPD);
            }

            let s = f.scope();
            if parents.iter().all(|v| s.contains(v)) && s.len() == parents.len() + 1 {
                return Ok(f);
            } else {
                return Err(CtpError::InvalidScope);
            }
        }

        ///////////////////////////////////////////////////////////////////////////////
        // Check for errors
        if parents.is_empty() {

            match self {

                // A binomial distribution on a non-binary variable
                Initialization::Binomial(_) if var.cardinality() != 2 => {
                    return Err(CtpError::InvalidInitialization);
                },

                Initialization::Binomial(p) if !(0.0..=1.0).contains(&p) => {
                    return Err(CtpError::InvalidInitialization);
                },

                // A multinomial distribution with an incorrect number of parameters
                Initialization::Multinomial(ps) if ps.len() != var.cardinality() => {
                    return Err(CtpError::InvalidInitialization);
                },

                _ => ()
            }
        } else {
            match self {

                // A binomial/multinomial on a non-unit scope
                Initialization::Binomial(_) | Initialization::Multinomial(_) => {
                    return Err(CtpError::InvalidInitialization);
                },

                _ => ()
            }
        }

        ///////////////////////////////////////////////////////////////////////////////
        // now, build CPD
        let mut shape: Vec<usize> = parents.iter().map(|v| v.cardinality()).collect();
        shape.push(var.cardinality());

        let tbl: Table = match self {
            Initialization::Uniform => {
                // normalizing constant is just the number of states
                let val = 1. / (var.cardinality() as f64);
                Table::from_elem(nd::IxDyn(&shape), val)
            },
            Initialization::Random => {
                let tbl = Table::random_using(nd::IxDyn(&shape), Uniform::new(1.0, 100.0), rng);
                let mut f = Factor::new(parents.iter().cloned().chain(Some(var)).collect(), tbl)?;
                f.normalize_over(&var)?;
                f.table().clone()
            },
            Initialization::Binomial(p) => {
                array![p, (1.0 - p)].into_dyn()
            },
            Initialization::Multinomial(p) => {
                nd::Array::from_iter(p.iter().cloned()).into_dyn()
            },
            Initialization::Table(_) => unreachable!()
        };

        Factor::cpd(var, parents, tbl)
    }
}
