//! Exact inference on discrete Bayesian networks by clique tree (junction tree) propagation.
//!
//! A `DiscreteBayesNet` is compiled once into a `CliqueTree`. A propagation engine then absorbs
//! evidence into the CPDs attached to the tree's cliques and passes messages between them,
//! after which the likelihood of the evidence and posterior beliefs can be read off the tree.
//! `LocalCliqueTreePropagation` restricts message passing to a focused subtree, reusing the
//! messages of the rest of the tree between propagations.

extern crate bidir_map;
extern crate indexmap;
#[macro_use]
extern crate itertools;
#[macro_use]
extern crate ndarray;
extern crate ndarray_rand;
extern crate rand;

pub mod variable;
pub mod factor;
pub mod init;
pub mod model;
pub mod clique_tree;
pub mod inference;
pub mod samplers;
pub mod information;
pub mod util;

pub use util::{Result, CtpError};
pub use variable::{all_assignments, Assignment, Variable};
pub use factor::{Factor, Table};
pub use init::Initialization;
pub use model::{DiscreteBayesNet, DiscreteBayesNetBuilder};
pub use clique_tree::{CliqueId, CliqueNode, CliqueTree};
pub use inference::{
    CliqueTreePropagation,
    ConditionalInferenceEngine,
    Evidence,
    Focus,
    LocalCliqueTreePropagation,
    Propagation
};
