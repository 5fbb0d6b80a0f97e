//! Information measures of a `DiscreteBayesNet`, computed through exact inference.
//!
//! Each distinct complete row of data is set as evidence and propagated; the likelihood returned
//! by the engine is then the probability of that row under the network. This only holds for a
//! full `CliqueTreePropagation`: a focused engine reuses messages computed for other evidence.

use crate::inference::{CliqueTreePropagation, Evidence, Propagation};
use crate::util::{CtpError, Result};
use crate::variable::Assignment;

use itertools::Itertools;


/// Entropy (in nats) of the network of `engine`, estimated over the distinct rows of `data`:
/// ```H = - sum_x P(x) ln P(x)```
///
/// Rows are projected onto the network's variables before duplicates are removed. If `data`
/// holds every joint state of the network, this is the exact entropy of the joint distribution.
///
/// # Errors
/// `CtpError::IncompleteAssignment` if some row does not assign every variable of the network.
/// The engine's evidence is cleared afterwards.
pub fn entropy(engine: &mut CliqueTreePropagation, data: &[Assignment]) -> Result<f64> {
    let vars = engine.network().variables();

    let mut rows = Vec::with_capacity(data.len());
    for row in data {
        rows.push(row.states_of(&vars).ok_or(CtpError::IncompleteAssignment)?);
    }

    let mut entropy = 0.0;
    for states in rows.into_iter().unique() {
        let mut evidence = Evidence::new();
        for (var, state) in vars.iter().zip(states) {
            evidence.observe(var, state);
        }

        engine.set_evidence(&evidence)?;
        let p = engine.propagate()?;

        if p > 0.0 {
            entropy += p * p.ln();
        }
    }

    engine.clear_evidence();

    tracing::debug!(entropy = -entropy, "computed entropy");
    Ok(-entropy)
}


/// Mutual information (in nats) between two groups of variables,
/// ```I(X; Y) = H(X) + H(Y) - H(X, Y)```, where each engine holds the network of the marginal
/// distribution over `X`, `Y`, and `X u Y` respectively.
pub fn mutual_information(
    x: &mut CliqueTreePropagation,
    y: &mut CliqueTreePropagation,
    xy: &mut CliqueTreePropagation,
    data: &[Assignment]
) -> Result<f64> {
    let hx = entropy(x, data)?;
    let hy = entropy(y, data)?;
    let hxy = entropy(xy, data)?;

    Ok(hx + hy - hxy)
}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::factor::Factor;
    use crate::init::Initialization;
    use crate::model::DiscreteBayesNetBuilder;
    use crate::variable::{all_assignments, Variable};

    #[test]
    fn deterministic_network_has_no_entropy() {
        let a = Variable::binary();
        let b = Variable::discrete(3);

        let cpd = Factor::cpd(b, vec![a], array![[0.0, 0.0, 1.0], [1.0, 0.0, 0.0]].into_dyn()).unwrap();
        let net = DiscreteBayesNetBuilder::new()
                      .with_variable(&a, vec![], Initialization::Binomial(0.0))
                      .with_variable(&b, vec![a], Initialization::Table(cpd))
                      .build()
                      .unwrap();

        let data: Vec<Assignment> = all_assignments(&[a, b]).collect();
        let mut engine = CliqueTreePropagation::new(net).unwrap();

        assert!(entropy(&mut engine, &data).unwrap().abs() < 1e-12);
        assert!(engine.evidence().is_empty());
    }

    #[test]
    fn uniform_entropy() {
        let a = Variable::discrete(4);
        let b = Variable::binary();

        let net = DiscreteBayesNetBuilder::new()
                      .with_variable(&a, vec![], Initialization::Uniform)
                      .with_variable(&b, vec![], Initialization::Uniform)
                      .build()
                      .unwrap();

        // duplicated rows are only counted once
        let mut data: Vec<Assignment> = all_assignments(&[a, b]).collect();
        data.extend(all_assignments(&[a, b]));

        let mut engine = CliqueTreePropagation::new(net).unwrap();
        assert!((8f64.ln() - entropy(&mut engine, &data).unwrap()).abs() < 1e-12);

        let mut partial = Assignment::new();
        partial.set(&a, 0);
        assert_eq!(Err(CtpError::IncompleteAssignment), entropy(&mut engine, &[partial]));
    }

    #[test]
    fn chain_entropy_matches_enumeration() {
        let a = Variable::binary();
        let b = Variable::discrete(3);
        let c = Variable::binary();

        let net = DiscreteBayesNetBuilder::new()
                      .with_variable(&a, vec![], Initialization::Binomial(0.3))
                      .with_variable(&b, vec![a], Initialization::Random)
                      .with_variable(&c, vec![b], Initialization::Random)
                      .build()
                      .unwrap();

        let data: Vec<Assignment> = all_assignments(&[a, b, c]).collect();
        let expected: f64 = data.iter()
                                .map(|row| net.probability(row).unwrap())
                                .filter(|p| *p > 0.0)
                                .map(|p| - p * p.ln())
                                .sum();

        // every row is propagated from scratch, whatever evidence came before it
        let mut engine = CliqueTreePropagation::new(net).unwrap();
        assert!((expected - entropy(&mut engine, &data).unwrap()).abs() < 1e-12);
        assert!((expected - entropy(&mut engine, &data).unwrap()).abs() < 1e-12);
    }

    #[test]
    fn mutual_information_of_copies() {
        let a = Variable::binary();
        let b = Variable::binary();

        let copy = Factor::cpd(b, vec![a], array![[1.0, 0.0], [0.0, 1.0]].into_dyn()).unwrap();
        let joint = DiscreteBayesNetBuilder::new()
                        .with_variable(&a, vec![], Initialization::Uniform)
                        .with_variable(&b, vec![a], Initialization::Table(copy))
                        .build()
                        .unwrap();
        let only_a = DiscreteBayesNetBuilder::new()
                         .with_variable(&a, vec![], Initialization::Uniform)
                         .build()
                         .unwrap();
        let only_b = DiscreteBayesNetBuilder::new()
                         .with_variable(&b, vec![], Initialization::Uniform)
                         .build()
                         .unwrap();

        let data: Vec<Assignment> = all_assignments(&[a, b]).collect();

        let mut x = CliqueTreePropagation::new(only_a).unwrap();
        let mut y = CliqueTreePropagation::new(only_b).unwrap();
        let mut xy = CliqueTreePropagation::new(joint).unwrap();

        let mi = mutual_information(&mut x, &mut y, &mut xy, &data).unwrap();
        assert!((2f64.ln() - mi).abs() < 1e-12);
    }
}
