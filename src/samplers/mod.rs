//! Defines the `Sampler` trait - an object that can randomly sample complete rows from a
//! `DiscreteBayesNet`.

use crate::util::Result;
use crate::variable::Assignment;

pub mod forward;

pub use self::forward::ForwardSampler;

pub trait Sampler {

    /// Sample a full `Assignment` from the associated network.
    fn sample(&mut self) -> Result<Assignment>;

    /// Draw `n` independent samples
    fn sample_data(&mut self, n: usize) -> Result<Vec<Assignment>> {
        (0..n).map(|_| self.sample()).collect()
    }

}
