//! Exact inference over small discrete Bayesian networks.
//!
//! This crate provides:
//! - [`Variable`]: a named random variable over a finite domain, with an
//!   optional observed value and graded equality for classified domains
//! - [`Factor`]: a conditional probability table with product,
//!   marginalization and division
//! - [`Net`]: a network built from factors in topological order, answering
//!   `P(query | evidence)` by full-joint variable elimination
//!
//! Variables are identified by name. Two variables with the same name are
//! the same variable wherever they appear, so names must be unique within a
//! network.
//!
//! Every query builds the full joint table, which grows with the product of
//! all cardinalities. [`EngineConfig::max_factor_cells`] caps it.
//!
//! ```
//! use bn_core::{Factor, Net, Variable};
//!
//! let c = Variable::discrete("C", ["no", "yes"]).unwrap();
//! let t = Variable::discrete("T", ["pos", "neg"]).unwrap();
//! let prior = Factor::unconditional("C", [c.clone()])
//!     .unwrap()
//!     .with_values(&[0.99, 0.01])
//!     .unwrap();
//! let test = Factor::new("T|C", [c.clone()], [t.clone()])
//!     .unwrap()
//!     .with_values(&[0.2, 0.8, 0.9, 0.1])
//!     .unwrap();
//!
//! let net = Net::from_factors("cancer", [prior, test]).unwrap();
//! let posterior = net.query(&[c], &[t]).unwrap();
//! // P(C = no | T = pos)
//! assert!((posterior.value(&[0, 0]).unwrap() - 0.9565).abs() < 1e-3);
//! ```

pub mod factor;
pub mod net;
pub mod variable;

pub use bn_common::{Error, ErrorFamily, Result};
pub use bn_config::EngineConfig;
pub use factor::{Factor, FactorTable};
pub use net::{Net, Node};
pub use variable::{Classifier, Domain, Observation, Variable};
