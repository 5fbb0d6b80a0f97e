//! Defines a simple forward sampler for `DiscreteBayesNet`s
//!
//! Implementation of Koller & Friedman Algorithm 12.1 (pp 489)

use crate::model::DiscreteBayesNet;
use crate::util::{CtpError, Result};
use crate::variable::Assignment;
use super::Sampler;

use rand::Rng;
use rand::rngs::ThreadRng;

/// A simple, stateless `Sampler` for Bayesian networks. Only the random number generator
/// changes between samples.
pub struct ForwardSampler<'a, R: Rng = ThreadRng> {

    /// The `DiscreteBayesNet` to sample
    network: &'a DiscreteBayesNet,

    rng: R
}


impl<'a> ForwardSampler<'a, ThreadRng> {

    /// Sample `network` using the thread local generator
    pub fn new(network: &'a DiscreteBayesNet) -> Self {
        ForwardSampler { network, rng: rand::thread_rng() }
    }
}

impl<'a, R: Rng> ForwardSampler<'a, R> {

    /// Sample `network` using `rng`, e.g. a seeded generator for reproducible data
    pub fn with_rng(network: &'a DiscreteBayesNet, rng: R) -> Self {
        ForwardSampler { network, rng }
    }

    fn get_sample(&mut self) -> Result<Assignment> {
        let mut a = Assignment::new();

        for var in self.network.topological_order().iter() {
            let cpd = self.network
                          .cpd(var)
                          .ok_or_else(|| CtpError::UnknownVariable(var.to_string()))?;

            // in topological order every parent is already assigned, satisfying sample_cpd
            let state = cpd.sample_cpd(var, &a, &mut self.rng)?;
            a.set(var, state);
        }

        Ok(a)
    }
}

impl<'a, R: Rng> Sampler for ForwardSampler<'a, R> {

    fn sample(&mut self) -> Result<Assignment> {
        self.get_sample()
    }

}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::factor::Factor;
    use crate::init::Initialization;
    use crate::model::DiscreteBayesNetBuilder;
    use crate::variable::Variable;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn sample() {
        let intelligence = Variable::binary();
        let sat = Variable::binary();

        let sfactor = Factor::cpd(sat, vec![intelligence], array![[0.95, 0.05], [0.2, 0.8]].into_dyn()).unwrap();

        let model = DiscreteBayesNetBuilder::new()
                        .with_named_variable(&intelligence, "I", vec![], Initialization::Multinomial(&[0.7, 0.3]))
                        .with_named_variable(&sat, "S", vec![intelligence], Initialization::Table(sfactor))
                        .build()
                        .unwrap();

        let mut sampler = ForwardSampler::new(&model);

        for _ in 0..100 {
            let a = sampler.sample().unwrap();

            assert_eq!(2, a.len());
            assert!(*a.get(&intelligence).unwrap() <= 1);
            assert!(*a.get(&sat).unwrap() <= 1);
        }
    }

    #[test]
    fn seeded_samples_repeat() {
        let a = Variable::discrete(4);
        let b = Variable::discrete(3);

        let model = DiscreteBayesNetBuilder::new()
                        .with_variable(&a, vec![], Initialization::Uniform)
                        .with_variable(&b, vec![a], Initialization::Uniform)
                        .build()
                        .unwrap();

        let first = ForwardSampler::with_rng(&model, StdRng::seed_from_u64(7)).sample_data(50).unwrap();
        let second = ForwardSampler::with_rng(&model, StdRng::seed_from_u64(7)).sample_data(50).unwrap();

        assert_eq!(first, second);
        assert!(first.iter().all(|row| *row.get(&a).unwrap() < 4 && *row.get(&b).unwrap() < 3));
    }

    #[test]
    fn deterministic_network() {
        let a = Variable::binary();
        let b = Variable::binary();

        let cpd = Factor::cpd(b, vec![a], array![[0.0, 1.0], [1.0, 0.0]].into_dyn()).unwrap();
        let model = DiscreteBayesNetBuilder::new()
                        .with_variable(&a, vec![], Initialization::Binomial(1.0))
                        .with_variable(&b, vec![a], Initialization::Table(cpd))
                        .build()
                        .unwrap();

        let mut sampler = ForwardSampler::with_rng(&model, StdRng::seed_from_u64(0));
        for row in sampler.sample_data(20).unwrap() {
            assert_eq!(Some(&0), row.get(&a));
            assert_eq!(Some(&1), row.get(&b));
        }
    }
}
