//! Bayesian networks assembled from factors.
//!
//! A [`Net`] is an append-only list of nodes, one per factor, added in
//! topological order: every conditioning variable of a new factor must
//! already be conditioned by (be "produced" by) an existing node. These
//! producers become the node's parents.
//!
//! Each node caches an unconditional factor over its own conditioned
//! variables. It is computed once, when the node is added, by multiplying
//! the node's factor with each parent's cached factor and immediately
//! summing the parent's variables back out. Live tables during insertion
//! therefore stay close to the size of the node's own factor. The cache is
//! exact when parents are independent of each other (singly connected
//! networks); queries do not depend on that, since they renormalize.
//!
//! Queries build the full joint table, whose size is the product of every
//! cardinality in the network. That is the intended scope limit of this
//! engine: small, expert-built networks. [`EngineConfig::max_factor_cells`]
//! turns an oversized joint into an error instead of an allocation.

use bn_common::{Error, Result};
use bn_config::EngineConfig;
use bn_math::wide_cell_count;
use tracing::debug;

use crate::factor::Factor;
use crate::variable::Variable;

/// One factor of a network together with its cached marginal.
#[derive(Debug, Clone)]
pub struct Node {
    conditional: Factor,
    parents: Vec<usize>,
    uncond: Factor,
}

impl Node {
    pub fn name(&self) -> &str {
        self.conditional.name()
    }

    /// The factor this node was built from.
    pub fn conditional(&self) -> &Factor {
        &self.conditional
    }

    /// Cached unconditional distribution over this node's conditioned
    /// variables.
    pub fn unconditional(&self) -> &Factor {
        &self.uncond
    }

    /// Indices of parent nodes, in the order their variables were found.
    pub fn parents(&self) -> &[usize] {
        &self.parents
    }

    /// Whether this node's factor conditions `var`.
    pub fn produces(&self, var: &Variable) -> bool {
        self.conditional.cons().contains(var)
    }
}

/// A discrete Bayesian network.
#[derive(Debug, Clone)]
pub struct Net {
    name: String,
    nodes: Vec<Node>,
    config: EngineConfig,
}

impl Net {
    /// Empty network with the default configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    /// Empty network with a validated configuration.
    pub fn with_config(name: impl Into<String>, config: EngineConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self {
            name: name.into(),
            nodes: Vec::new(),
            config,
        })
    }

    /// Network built by adding each factor in turn.
    ///
    /// Fails on the first factor [`Net::add_node`] rejects, so the factors
    /// must already be in topological order.
    pub fn from_factors<I>(name: impl Into<String>, factors: I) -> Result<Self>
    where
        I: IntoIterator<Item = Factor>,
    {
        Self::from_factors_with_config(name, EngineConfig::default(), factors)
    }

    /// [`Net::from_factors`] under a validated configuration.
    pub fn from_factors_with_config<I>(
        name: impl Into<String>,
        config: EngineConfig,
        factors: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = Factor>,
    {
        let mut net = Self::with_config(name, config)?;
        for factor in factors {
            net.add_node(factor)?;
        }
        Ok(net)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node whose factor has the given name.
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name() == name)
    }

    fn producer_index(&self, var: &Variable) -> Option<usize> {
        self.nodes.iter().position(|n| n.produces(var))
    }

    /// Node that conditions `var`.
    pub fn producer(&self, var: &Variable) -> Option<&Node> {
        self.producer_index(var).map(|i| &self.nodes[i])
    }

    /// Every variable in the network, sorted by name.
    pub fn scope(&self) -> Vec<Variable> {
        let mut vars: Vec<Variable> = self
            .nodes
            .iter()
            .flat_map(|n| n.conditional.cons().iter().cloned())
            .collect();
        vars.sort();
        vars
    }

    /// Append a factor as a new node.
    ///
    /// Fails with `Ordering` if a conditioning variable has no producer
    /// yet, with `AlreadyProduced` if a conditioned variable already has
    /// one, and with `Unnormalized` (when `strict_cpd` is set) if the CPD is
    /// not a conditional distribution. The network is unchanged on failure.
    pub fn add_node(&mut self, factor: Factor) -> Result<()> {
        let mut parents = Vec::new();
        let mut missing = Vec::new();
        for var in factor.cond() {
            match self.producer_index(var) {
                Some(i) if !parents.contains(&i) => parents.push(i),
                Some(_) => {}
                None => missing.push(var.name().to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(Error::Ordering {
                factor: factor.name().to_string(),
                missing,
            });
        }
        if let Some((var, producer)) = factor
            .cons()
            .iter()
            .find_map(|v| self.producer(v).map(|n| (v, n)))
        {
            return Err(Error::AlreadyProduced {
                variable: var.name().to_string(),
                producer: producer.name().to_string(),
            });
        }
        if self.config.strict_cpd {
            let deviation = factor.max_deviation();
            if deviation > self.config.tolerance {
                return Err(Error::Unnormalized {
                    factor: factor.name().to_string(),
                    deviation,
                });
            }
        }

        let mut uncond = factor.clone();
        for &p in &parents {
            let parent = &self.nodes[p].uncond;
            uncond = uncond.product(parent)?.marginalize_all(parent.cons())?;
        }

        debug!(
            target: "bn.net.add_node",
            net = %self.name,
            node = %factor.name(),
            parents = parents.len(),
            cached_cells = uncond.cpd().len(),
            "added node"
        );
        self.nodes.push(Node {
            conditional: factor,
            parents,
            uncond,
        });
        Ok(())
    }

    /// Joint distribution over every variable in the network.
    ///
    /// This is the product of all node factors. Its size is the product of
    /// all cardinalities; it fails with `ScopeTooLarge` above
    /// `max_factor_cells` and with `EmptyNetwork` when there are no nodes.
    pub fn joint(&self) -> Result<Factor> {
        let shape: Vec<usize> = self.scope().iter().map(Variable::cardinality).collect();
        let cells = wide_cell_count(&shape);
        if cells > self.config.max_factor_cells as u128 {
            return Err(Error::ScopeTooLarge {
                factor: self.name.clone(),
                cells,
                limit: self.config.max_factor_cells,
            });
        }
        let joint = Factor::product_all(self.nodes.iter().map(Node::conditional))?
            .ok_or_else(|| Error::EmptyNetwork(self.name.clone()))?;
        Ok(joint.with_name(format!("{}:joint", self.name)))
    }

    /// Cached unconditional distribution of a single variable.
    pub fn marginal(&self, var: &Variable) -> Result<Factor> {
        let node = self.producer(var).ok_or_else(|| Error::Scope {
            variable: var.name().to_string(),
            scope: self.name.clone(),
        })?;
        let others: Vec<&Variable> = node.uncond.cons().iter().filter(|v| *v != var).collect();
        node.uncond.marginalize_all(others)
    }

    /// Distribution of `query` given `evidence`: `P(query | evidence)`.
    ///
    /// The result conditions on the evidence variables and conditions the
    /// query variables, one slice per evidence assignment. Query and
    /// evidence must be disjoint subsets of the network's scope, and the
    /// query must not be empty.
    pub fn query(&self, query: &[Variable], evidence: &[Variable]) -> Result<Factor> {
        if query.is_empty() {
            return Err(Error::EmptyQuery);
        }
        if let Some(v) = query.iter().find(|v| evidence.contains(v)) {
            return Err(Error::OverlappingQuery {
                variable: v.name().to_string(),
            });
        }
        let scope = self.scope();
        if let Some(v) = query
            .iter()
            .chain(evidence.iter())
            .find(|v| !scope.contains(v))
        {
            return Err(Error::Scope {
                variable: v.name().to_string(),
                scope: self.name.clone(),
            });
        }
        let mut evidence = evidence.to_vec();
        evidence.sort();
        evidence.dedup();

        let joint = self.joint()?;
        let hidden: Vec<&Variable> = scope
            .iter()
            .filter(|v| !query.contains(v) && !evidence.contains(v))
            .collect();
        let mut result = joint.marginalize_all(hidden.iter().copied())?;
        for var in &evidence {
            result = result.divide(&self.marginal(var)?)?;
        }

        debug!(
            target: "bn.net.query",
            net = %self.name,
            query = query.len(),
            evidence = evidence.len(),
            hidden = hidden.len(),
            "answered query"
        );
        Ok(result)
    }
}
