//! Defines the discrete Bayesian network over which inference is performed.
//!
//! A `DiscreteBayesNet` represents the factorization of a probability distribution P over a set
//! of discrete `Variable`s into one conditional probability table per `Variable`.

pub mod directed;

pub use self::directed::{DiscreteBayesNet, DiscreteBayesNetBuilder, MoralGraph};
