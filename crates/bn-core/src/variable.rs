//! Named discrete variables.
//!
//! A [`Variable`] is a name plus an ordered, finite domain of terms. The name
//! is the variable's identity: equality, ordering and hashing all use it,
//! and factors align their axes by it. Names must therefore be unique within
//! a network.
//!
//! The domain is fixed at construction as one of three [`Domain`] kinds:
//! explicit labels, labels mapped to real values, or the terms of an
//! external [`Classifier`]. The kind only matters for [`Variable::equals`],
//! which compares an observed value against a probe.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use bn_common::{Error, Result};

/// Fuzzy classification capability backing a variable's terms.
///
/// Implementations live outside this crate (membership functions,
/// partitions, ...). The engine only asks for the term keys and for the
/// membership of a real value in a term.
pub trait Classifier: fmt::Debug + Send + Sync {
    /// Term keys, in axis order.
    fn terms(&self) -> Vec<String>;

    /// Degree in `[0, 1]` to which `value` belongs to `term`, or `None` if
    /// the term is unknown.
    fn membership(&self, value: f64, term: &str) -> Option<f64>;
}

/// An observed value of a variable: a term key or a real number.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Term(String),
    Value(f64),
}

impl From<&str> for Observation {
    fn from(term: &str) -> Self {
        Observation::Term(term.to_string())
    }
}

impl From<String> for Observation {
    fn from(term: String) -> Self {
        Observation::Term(term)
    }
}

impl From<f64> for Observation {
    fn from(value: f64) -> Self {
        Observation::Value(value)
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::Term(term) => write!(f, "{term}"),
            Observation::Value(value) => write!(f, "{value}"),
        }
    }
}

/// The domain of a variable, resolved once at construction.
#[derive(Debug, Clone)]
pub enum Domain {
    /// Ordered discrete labels.
    Explicit(Vec<String>),
    /// Ordered labels, each standing for a real value.
    Mapped(Vec<(String, f64)>),
    /// Terms of an external classifier, cached in axis order.
    Classified {
        terms: Vec<String>,
        classifier: Arc<dyn Classifier>,
    },
}

impl Domain {
    /// Build a classifier-backed domain, reading the term keys once.
    pub fn classified(classifier: Arc<dyn Classifier>) -> Self {
        Domain::Classified {
            terms: classifier.terms(),
            classifier,
        }
    }

    fn term_keys(&self) -> Vec<&str> {
        match self {
            Domain::Explicit(terms) => terms.iter().map(String::as_str).collect(),
            Domain::Mapped(pairs) => pairs.iter().map(|(k, _)| k.as_str()).collect(),
            Domain::Classified { terms, .. } => terms.iter().map(String::as_str).collect(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Domain::Explicit(terms) => terms.len(),
            Domain::Mapped(pairs) => pairs.len(),
            Domain::Classified { terms, .. } => terms.len(),
        }
    }
}

/// A named variable with a finite, ordered domain.
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    domain: Arc<Domain>,
    value: Option<Observation>,
}

impl Variable {
    /// Create a variable over `domain`.
    ///
    /// Fails with `InvalidDomain` if the name is empty, the domain has no
    /// terms, a term key repeats, or a mapped value is not finite.
    pub fn new(name: impl Into<String>, domain: Domain) -> Result<Self> {
        let name = name.into();
        let invalid = |reason: &str| Error::InvalidDomain {
            variable: name.clone(),
            reason: reason.to_string(),
        };
        if name.is_empty() {
            return Err(invalid("name is empty"));
        }
        if domain.len() == 0 {
            return Err(invalid("domain has no terms"));
        }
        let mut keys = domain.term_keys();
        keys.sort_unstable();
        if let Some(pair) = keys.windows(2).find(|w| w[0] == w[1]) {
            return Err(invalid(&format!("term '{}' is repeated", pair[0])));
        }
        if let Domain::Mapped(pairs) = &domain {
            if let Some((key, _)) = pairs.iter().find(|(_, v)| !v.is_finite()) {
                return Err(invalid(&format!("term '{key}' maps to a non-finite value")));
            }
        }
        Ok(Self {
            name,
            domain: Arc::new(domain),
            value: None,
        })
    }

    /// Variable over explicit term labels.
    pub fn discrete<I, T>(name: impl Into<String>, terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: fmt::Display,
    {
        let terms = terms.into_iter().map(|t| t.to_string()).collect();
        Self::new(name, Domain::Explicit(terms))
    }

    /// Variable whose term keys stand for real values.
    pub fn mapped<I, K>(name: impl Into<String>, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let pairs = pairs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::new(name, Domain::Mapped(pairs))
    }

    /// Variable whose terms come from a classifier.
    pub fn classified(name: impl Into<String>, classifier: Arc<dyn Classifier>) -> Result<Self> {
        Self::new(name, Domain::classified(classifier))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Number of terms in the domain.
    pub fn cardinality(&self) -> usize {
        self.domain.len()
    }

    /// Term keys in axis order.
    pub fn terms(&self) -> Vec<&str> {
        self.domain.term_keys()
    }

    /// Axis position of a term key.
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.domain.term_keys().iter().position(|t| *t == term)
    }

    pub fn value(&self) -> Option<&Observation> {
        self.value.as_ref()
    }

    pub fn set_value(&mut self, value: impl Into<Observation>) {
        self.value = Some(value.into());
    }

    pub fn clear_value(&mut self) {
        self.value = None;
    }

    /// Similarity in `[0, 1]` between the current value and `probe`.
    ///
    /// Without a classifier this is exact equality (1.0 or 0.0); mapped
    /// terms are first replaced by their values. With a classifier, a term
    /// compared to a real value yields the value's membership in the term,
    /// and two real values yield the best term they share,
    /// `max_t min(mu_t(a), mu_t(b))`.
    pub fn equals(&self, probe: &Observation) -> Result<f64> {
        let current = self.value.as_ref().ok_or_else(|| Error::NoValue {
            variable: self.name.clone(),
        })?;
        let similarity = match self.domain.as_ref() {
            Domain::Explicit(_) => exact(current, probe),
            Domain::Mapped(pairs) => exact(&resolve(pairs, current), &resolve(pairs, probe)),
            Domain::Classified { terms, classifier } => {
                graded(classifier.as_ref(), terms, current, probe)
            }
        };
        Ok(similarity.clamp(0.0, 1.0))
    }
}

fn exact(a: &Observation, b: &Observation) -> f64 {
    if a == b {
        1.0
    } else {
        0.0
    }
}

fn resolve(pairs: &[(String, f64)], obs: &Observation) -> Observation {
    match obs {
        Observation::Term(term) => pairs
            .iter()
            .find(|(k, _)| k == term)
            .map(|(_, v)| Observation::Value(*v))
            .unwrap_or_else(|| obs.clone()),
        Observation::Value(_) => obs.clone(),
    }
}

fn graded(
    classifier: &dyn Classifier,
    terms: &[String],
    a: &Observation,
    b: &Observation,
) -> f64 {
    match (a, b) {
        (Observation::Term(_), Observation::Term(_)) => exact(a, b),
        (Observation::Term(term), Observation::Value(v))
        | (Observation::Value(v), Observation::Term(term)) => {
            classifier.membership(*v, term).unwrap_or(0.0)
        }
        (Observation::Value(x), Observation::Value(y)) => terms
            .iter()
            .map(|t| {
                let mx = classifier.membership(*x, t).unwrap_or(0.0);
                let my = classifier.membership(*y, t).unwrap_or(0.0);
                mx.min(my)
            })
            .fold(0.0, f64::max),
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variable {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
