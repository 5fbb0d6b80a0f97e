//! Shafer-Shenoy message passing over a `CliqueTree`.
//!
//! A message from clique `s` to an adjacent clique `d` is the product of the tables attached to
//! `s` and of the messages `s` received from its other neighbors, with the variables `s` does not
//! share with `d` summed out. Messages are normalized as they are built; the normalizing
//! constants accumulate along the message, both linearly and in log space, so the likelihood of
//! the evidence can be recovered at the pivot without underflowing the log value.

use crate::clique_tree::{CliqueId, CliqueTree};
use crate::factor::Factor;
use crate::util::{CtpError, Result};
use crate::variable::Assignment;

use indexmap::IndexSet;
use std::collections::HashMap;


/// A normalized message along with the normalizing constants accumulated while building it
#[derive(Clone, Debug)]
pub struct Message {
    pub factor: Factor,

    /// Product of every normalizing constant upstream of (and including) this message
    pub normalization: f64,

    /// Sum of the logs of the same constants
    pub log_normalization: f64
}


/// The cliques whose outgoing messages are recomputed on each propagation
#[derive(Clone, Debug, PartialEq)]
pub enum Focus {
    /// The whole tree
    All,

    /// Only the given cliques. Messages leaving other cliques are reused while cached.
    Subtree(IndexSet<CliqueId>)
}

impl Focus {

    pub fn contains(&self, id: CliqueId) -> bool {
        match self {
            Focus::All => true,
            Focus::Subtree(ids) => ids.contains(&id)
        }
    }
}


/// Messages keyed by their (source, destination) edge
#[derive(Clone, Debug, Default)]
pub struct MessageCache {
    messages: HashMap<(CliqueId, CliqueId), Message>
}

impl MessageCache {

    pub fn new() -> Self {
        MessageCache { messages: HashMap::new() }
    }

    pub fn get(&self, source: CliqueId, destination: CliqueId) -> Option<&Message> {
        self.messages.get(&(source, destination))
    }

    pub fn contains(&self, source: CliqueId, destination: CliqueId) -> bool {
        self.messages.contains_key(&(source, destination))
    }

    pub fn insert(&mut self, source: CliqueId, destination: CliqueId, message: Message) {
        self.messages.insert((source, destination), message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Drop every message sent from a clique within `focus`
    pub fn invalidate(&mut self, focus: &Focus) {
        self.messages.retain(|&(source, _), _| ! focus.contains(source));
    }
}


/// One round of collection and distribution of messages
pub(crate) struct MessagePassing<'a> {
    tree: &'a CliqueTree,

    /// Tables attached to each clique, indexed by `CliqueId`
    attached: &'a [Vec<Factor>],

    /// Observed variables are never summed out; they no longer appear in any table
    evidence: &'a Assignment,

    focus: &'a Focus,

    messages: &'a mut MessageCache
}

impl<'a> MessagePassing<'a> {

    pub(crate) fn new(
        tree: &'a CliqueTree,
        attached: &'a [Vec<Factor>],
        evidence: &'a Assignment,
        focus: &'a Focus,
        messages: &'a mut MessageCache
    ) -> Self {
        MessagePassing { tree, attached, evidence, focus, messages }
    }

    /// Collect messages from the whole tree towards `pivot`, then distribute them back out across
    /// the focused cliques.
    pub(crate) fn run(&mut self, pivot: CliqueId) -> Result<()> {
        let tree = self.tree;

        for &n in tree.neighbors(pivot) {
            self.collect(n, pivot)?;
        }

        for &n in tree.neighbors(pivot) {
            self.distribute(pivot, n)?;
        }

        Ok(())
    }

    /// Compute the message `source -> destination`, first collecting into `source` from the rest
    /// of its side of the tree. A cached message from an unfocused clique is reused as is.
    fn collect(&mut self, source: CliqueId, destination: CliqueId) -> Result<()> {
        if self.messages.contains(source, destination) && ! self.focus.contains(source) {
            return Ok(());
        }

        let tree = self.tree;
        for &n in tree.neighbors(source) {
            if n != destination {
                self.collect(n, source)?;
            }
        }

        self.send(source, destination)
    }

    /// Send `source -> destination`, then continue outward. Stops at unfocused cliques.
    fn distribute(&mut self, source: CliqueId, destination: CliqueId) -> Result<()> {
        if ! self.focus.contains(destination) {
            return Ok(());
        }

        self.send(source, destination)?;

        let tree = self.tree;
        for &n in tree.neighbors(destination) {
            if n != source {
                self.distribute(destination, n)?;
            }
        }

        Ok(())
    }

    fn send(&mut self, source: CliqueId, destination: CliqueId) -> Result<()> {
        let tree = self.tree;

        let mut message = Factor::identity();
        let mut normalization = 1.0;
        let mut log_normalization = 0.0;

        for &n in tree.neighbors(source) {
            if n != destination {
                let incoming = self.messages.get(n, source).ok_or(CtpError::MissingMessage(n, source))?;
                message = message.product(&incoming.factor);
                normalization *= incoming.normalization;
                log_normalization += incoming.log_normalization;
            }
        }

        for f in self.attached[source].iter() {
            message = message.product(f);
        }

        for var in tree.difference(source, destination) {
            if ! self.evidence.contains(&var) {
                message = message.sum_out(&var);
            }
        }

        let n = message.normalize();
        if n <= 0.0 {
            tracing::warn!(source, destination, "message has no probability mass");
        }

        normalization *= n;
        log_normalization += n.ln();

        tracing::trace!(source, destination, normalization = n, "sent message");

        self.messages.insert(source, destination, Message { factor: message, normalization, log_normalization });
        Ok(())
    }
}


/// Product of the tables attached to `clique` and every message it has received
pub(crate) fn potential(
    tree: &CliqueTree,
    attached: &[Vec<Factor>],
    messages: &MessageCache,
    clique: CliqueId
) -> Result<(Factor, f64, f64)> {
    let mut potential = Factor::identity();
    let mut normalization = 1.0;
    let mut log_normalization = 0.0;

    for f in attached[clique].iter() {
        potential = potential.product(f);
    }

    for &n in tree.neighbors(clique) {
        let incoming = messages.get(n, clique).ok_or(CtpError::MissingMessage(n, clique))?;
        potential = potential.product(&incoming.factor);
        normalization *= incoming.normalization;
        log_normalization += incoming.log_normalization;
    }

    Ok((potential, normalization, log_normalization))
}


/// The likelihood of the absorbed evidence, computed at `pivot`.
///
/// # Returns
/// ```(likelihood, log likelihood)```
pub(crate) fn likelihood(
    tree: &CliqueTree,
    attached: &[Vec<Factor>],
    messages: &MessageCache,
    pivot: CliqueId
) -> Result<(f64, f64)> {
    let (potential, normalization, log_normalization) = potential(tree, attached, messages, pivot)?;
    let n = potential.sum_up();

    Ok((n * normalization, log_normalization + n.ln()))
}
