//! Defines the `Error` type for the cliqueprop library

use std::result;

use thiserror::Error;

pub type Result<T> = result::Result<T, CtpError>;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum CtpError {

    /// Represents an incomplete assignment where a complete assignment was required.
    #[error("Missing assignments to the required Variables")]
    IncompleteAssignment,

    /// Represents an error where a certain constraint on a scope was not satisfied
    #[error("Provided scope did not satisfy constraints")]
    InvalidScope,

    /// Represents an error where there was a parent variable expected, but not found
    #[error("Missing a parent from the model")]
    MissingParent,

    /// Represents a variable that was present multiple times in a situation where it should only
    /// have been present once
    #[error("A variable was encountered twice")]
    DuplicateVariable,

    /// Represents the situation when we expected a CPD but did not receive one
    #[error("Requires a Conditional Probability Distribution")]
    NotACPD,

    /// Represents an attempt to initialize a variable with an incompatible Initialization
    #[error("An invalid initialization was provided")]
    InvalidInitialization,

    /// Represents a situation in which there was a negative probability provided
    #[error("Encountered a negative probability")]
    NonPositiveProbability,

    /// A `Variable` was used with a network that does not contain it
    #[error("The Bayes net does not contain the variable: {0}")]
    UnknownVariable(String),

    /// An observed state outside of the permitted range of its `Variable`
    #[error("the state [{state}] is not valid for the variable: {name} (cardinality {cardinality})")]
    InvalidState {
        name: String,
        state: usize,
        cardinality: usize
    },

    /// A belief was requested before evidence had been propagated
    #[error("Beliefs are not available until evidence has been propagated")]
    NotPropagated,

    /// No clique of the tree contains all of the requested variables
    #[error("No clique covers the requested variables")]
    NoCoveringClique,

    /// A message required by a query was never computed
    #[error("Missing message from clique {0} to clique {1}")]
    MissingMessage(usize, usize),

    /// A focused subtree must cover at least one clique
    #[error("The focused subtree may not be empty")]
    EmptyFocus,

    /// The cliques and edges handed to a `CliqueTree` do not form a junction tree
    #[error("Invalid clique tree: {0}")]
    InvalidCliqueTree(String),

    /// A general error with the given description
    #[error("{0}")]
    General(String),

}
