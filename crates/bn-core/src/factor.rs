//! Factors: named dense tables over variables.
//!
//! A [`Factor`] maps every assignment of its variables to a nonnegative
//! real. Its variables are split into conditioning variables (`cond`) and
//! conditioned variables (`cons`), each kept sorted by name, and the table
//! axes follow `cond ++ cons`. Sorting by name gives every factor over the
//! same variable set the same axis order, which is what lets independently
//! built factors be combined.
//!
//! Operands of [`Factor::product`] and [`Factor::divide`] generally have
//! different scopes. Each operand is read through its *axis map* (see
//! [`Factor::axis_map`]): for every operand axis, the result axis holding the
//! same variable. Axes an operand lacks are broadcast.
//!
//! Table size is the product of the cardinalities in scope. Nothing here
//! bounds it beyond what one allocation can address; `Net` enforces the
//! configured limit before building a joint.

use std::fmt;
use std::ops::{Div, Mul, Sub};

use bn_common::{Error, Result};
use bn_math::{
    broadcast_strides, cell_count, checked_ratio, chunk_sums, max_chunk_deviation,
    normalize_chunks, offset, row_major_strides, wide_cell_count, Assignments,
};
use ndarray::{ArrayD, Axis, IxDyn};
use serde::Serialize;
use tracing::trace;

use crate::variable::Variable;

/// Most cells a single table can address: its byte size must fit in `isize`.
const MAX_CELLS: usize = isize::MAX as usize / std::mem::size_of::<f64>();

/// A conditional probability table over named variables.
#[derive(Debug, Clone)]
pub struct Factor {
    name: String,
    cond: Vec<Variable>,
    cons: Vec<Variable>,
    cpd: ArrayD<f64>,
}

/// Flat, serializable view of a factor for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorTable {
    pub name: String,
    pub cond: Vec<String>,
    pub cons: Vec<String>,
    pub shape: Vec<usize>,
    /// Row-major values in `cond ++ cons` axis order.
    pub values: Vec<f64>,
}

impl Factor {
    /// Create a factor `P(cons | cond)` holding the uniform distribution.
    ///
    /// Fails with `EmptyScope` when `cons` is empty, with
    /// `DuplicateVariable` when a name appears twice, and with
    /// `ScopeTooLarge` when the table size overflows.
    pub fn new<C, K>(name: impl Into<String>, cond: C, cons: K) -> Result<Self>
    where
        C: IntoIterator<Item = Variable>,
        K: IntoIterator<Item = Variable>,
    {
        let mut factor = Self::uniform_shell(
            name.into(),
            cond.into_iter().collect(),
            cons.into_iter().collect(),
        )?;
        factor.normalize();
        Ok(factor)
    }

    /// Create an unconditional factor `P(cons)` holding the uniform distribution.
    pub fn unconditional<K>(name: impl Into<String>, cons: K) -> Result<Self>
    where
        K: IntoIterator<Item = Variable>,
    {
        Self::new(name, Vec::new(), cons)
    }

    /// Canonicalize the scope and allocate an all-ones table.
    fn uniform_shell(name: String, mut cond: Vec<Variable>, mut cons: Vec<Variable>) -> Result<Self> {
        if cons.is_empty() {
            return Err(Error::EmptyScope { factor: name });
        }
        cond.sort();
        cons.sort();
        let mut names: Vec<&str> = cond.iter().chain(cons.iter()).map(Variable::name).collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(Error::DuplicateVariable {
                variable: pair[0].to_string(),
                factor: name,
            });
        }

        let shape: Vec<usize> = cond
            .iter()
            .chain(cons.iter())
            .map(Variable::cardinality)
            .collect();
        if cell_count(&shape).map_or(true, |cells| cells > MAX_CELLS) {
            return Err(Error::ScopeTooLarge {
                factor: name,
                cells: wide_cell_count(&shape),
                limit: MAX_CELLS,
            });
        }
        let cpd = ArrayD::from_elem(IxDyn(&shape), 1.0);
        Ok(Self {
            name,
            cond,
            cons,
            cpd,
        })
    }

    /// Shell for an operation result, named after its canonical scope.
    fn derived(cond: Vec<Variable>, cons: Vec<Variable>) -> Result<Self> {
        let mut shell = Self::uniform_shell(scope_label(&cond, &cons), cond, cons)?;
        shell.name = scope_label(&shell.cond, &shell.cons);
        Ok(shell)
    }

    /// Replace the table with row-major `values` in `vars()` order.
    fn filled(mut self, values: Vec<f64>) -> Result<Self> {
        let shape = self.shape().to_vec();
        self.cpd = ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|e| Error::InvalidCpd {
            factor: self.name.clone(),
            reason: e.to_string(),
        })?;
        Ok(self)
    }

    /// Builder form of [`Factor::set_cpd`] taking row-major values.
    pub fn with_values(mut self, values: &[f64]) -> Result<Self> {
        let shape = self.shape().to_vec();
        let cpd = ArrayD::from_shape_vec(IxDyn(&shape), values.to_vec()).map_err(|_| {
            Error::InvalidCpd {
                factor: self.name.clone(),
                reason: format!("expected {} values, got {}", self.cpd.len(), values.len()),
            }
        })?;
        self.set_cpd(cpd)?;
        Ok(self)
    }

    /// Rename the factor.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Install a new table.
    ///
    /// The table must have this factor's shape and hold finite nonnegative
    /// values. It is stored as given; call [`Factor::normalize`] to turn raw
    /// counts into a conditional distribution.
    pub fn set_cpd(&mut self, cpd: ArrayD<f64>) -> Result<()> {
        if cpd.shape() != self.shape() {
            return Err(Error::InvalidCpd {
                factor: self.name.clone(),
                reason: format!("expected shape {:?}, got {:?}", self.shape(), cpd.shape()),
            });
        }
        if let Some(bad) = cpd.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(Error::InvalidCpd {
                factor: self.name.clone(),
                reason: format!("entry {bad} is not a finite nonnegative number"),
            });
        }
        self.cpd = cpd;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Conditioning variables, sorted by name.
    pub fn cond(&self) -> &[Variable] {
        &self.cond
    }

    /// Conditioned variables, sorted by name.
    pub fn cons(&self) -> &[Variable] {
        &self.cons
    }

    /// All variables in axis order: `cond ++ cons`.
    pub fn vars(&self) -> impl Iterator<Item = &Variable> {
        self.cond.iter().chain(self.cons.iter())
    }

    /// Variable names in axis order.
    pub fn var_names(&self) -> Vec<&str> {
        self.vars().map(Variable::name).collect()
    }

    /// Cardinalities in axis order.
    pub fn shape(&self) -> &[usize] {
        self.cpd.shape()
    }

    pub fn ndim(&self) -> usize {
        self.cpd.ndim()
    }

    pub fn cpd(&self) -> &ArrayD<f64> {
        &self.cpd
    }

    /// Table entry for a full assignment in axis order.
    pub fn value(&self, assignment: &[usize]) -> Option<f64> {
        self.cpd.get(IxDyn(assignment)).copied()
    }

    /// Whether a variable with this name is in scope.
    pub fn contains(&self, var: &Variable) -> bool {
        self.axis_of(var.name()).is_some()
    }

    /// Axis holding the named variable.
    pub fn axis_of(&self, name: &str) -> Option<usize> {
        self.vars().position(|v| v.name() == name)
    }

    /// Number of cells in one conditioned slice.
    fn slice_width(&self) -> usize {
        self.cons.iter().map(Variable::cardinality).product()
    }

    /// Rescale every conditioned slice to sum to one.
    ///
    /// A slice whose sum is exactly zero is left as it is.
    pub fn normalize(&mut self) {
        let width = self.slice_width();
        let zero_mass = match self.cpd.as_slice_mut() {
            Some(values) => normalize_chunks(values, width),
            None => {
                let mut values: Vec<f64> = self.cpd.iter().copied().collect();
                let zero_mass = normalize_chunks(&mut values, width);
                for (dst, src) in self.cpd.iter_mut().zip(values) {
                    *dst = src;
                }
                zero_mass
            }
        };
        if zero_mass > 0 {
            trace!(
                target: "bn.factor.normalize",
                factor = %self.name,
                zero_mass,
                "left zero-mass slices unnormalized"
            );
        }
    }

    /// Largest distance from one among non-zero conditioned slice sums.
    pub fn max_deviation(&self) -> f64 {
        max_chunk_deviation(&chunk_sums(self.cpd.iter(), self.slice_width()))
    }

    /// Whether every non-zero conditioned slice sums to one within `tol`.
    pub fn is_normalized(&self, tol: f64) -> bool {
        self.max_deviation() <= tol
    }

    /// For each variable of `other`, in its own order, the axis of the
    /// same-named variable in `self`.
    ///
    /// Fails with `Scope` if `other` has a variable `self` lacks.
    pub fn axis_map(&self, other: &Factor) -> Result<Vec<usize>> {
        other
            .vars()
            .map(|v| {
                self.axis_of(v.name()).ok_or_else(|| Error::Scope {
                    variable: v.name().to_string(),
                    scope: self.name.clone(),
                })
            })
            .collect()
    }

    /// Same-named variables must agree on cardinality.
    fn check_compatible(&self, other: &Factor) -> Result<()> {
        for var in self.vars() {
            if let Some(theirs) = other.vars().find(|v| *v == var) {
                if theirs.cardinality() != var.cardinality() {
                    return Err(Error::OperandMismatch {
                        variable: var.name().to_string(),
                        left: var.cardinality(),
                        right: theirs.cardinality(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Evaluate `op` on every assignment of `self`'s shape, reading `lhs`
    /// and `rhs` through their axis maps into `self`.
    fn combine<F>(&self, lhs: &Factor, rhs: &Factor, mut op: F) -> Result<Vec<f64>>
    where
        F: FnMut(f64, f64, &[usize]) -> Result<f64>,
    {
        let ndim = self.ndim();
        let lhs_strides =
            broadcast_strides(&row_major_strides(lhs.shape()), &self.axis_map(lhs)?, ndim);
        let rhs_strides =
            broadcast_strides(&row_major_strides(rhs.shape()), &self.axis_map(rhs)?, ndim);
        let lhs_values: Vec<f64> = lhs.cpd.iter().copied().collect();
        let rhs_values: Vec<f64> = rhs.cpd.iter().copied().collect();

        Assignments::new(self.shape())
            .map(|assignment| {
                let a = lhs_values[offset(&assignment, &lhs_strides)];
                let b = rhs_values[offset(&assignment, &rhs_strides)];
                op(a, b, &assignment)
            })
            .collect()
    }

    /// Sum `var` out of scope.
    ///
    /// Removing a conditioning variable turns `P(X|Y,Z)` into `P(X|Z)`;
    /// removing a conditioned one turns `P(X,W|Z)` into `P(W|Z)`. The
    /// result is not renormalized.
    pub fn marginal(&self, var: &Variable) -> Result<Factor> {
        let axis = self.axis_of(var.name()).ok_or_else(|| Error::Scope {
            variable: var.name().to_string(),
            scope: self.name.clone(),
        })?;
        let cond: Vec<Variable> = self.cond.iter().filter(|v| *v != var).cloned().collect();
        let cons: Vec<Variable> = self.cons.iter().filter(|v| *v != var).cloned().collect();
        let mut out = Self::derived(cond, cons)?;
        out.cpd = self.cpd.sum_axis(Axis(axis));
        trace!(
            target: "bn.factor.marginal",
            factor = %self.name,
            variable = %var,
            cells = out.cpd.len(),
            "marginalized"
        );
        Ok(out)
    }

    /// Sum out each variable in turn.
    pub fn marginalize_all<'a, I>(&self, vars: I) -> Result<Factor>
    where
        I: IntoIterator<Item = &'a Variable>,
    {
        vars.into_iter()
            .try_fold(self.clone(), |acc, var| acc.marginal(var))
    }

    /// Factor product.
    ///
    /// A variable stays a condition only if both operands condition on it;
    /// every other variable of the union is conditioned. Entries are the
    /// products of the operand entries at the matching sub-assignments:
    /// `P(A|B) * P(B) = P(A,B)`, `P(A|C) * P(D|C) = P(A,D|C)`.
    pub fn product(&self, other: &Factor) -> Result<Factor> {
        self.check_compatible(other)?;
        let cond: Vec<Variable> = self
            .cond
            .iter()
            .filter(|v| other.cond.contains(v))
            .cloned()
            .collect();
        let mut union: Vec<Variable> = self.vars().chain(other.vars()).cloned().collect();
        union.sort();
        union.dedup();
        let cons: Vec<Variable> = union.into_iter().filter(|v| !cond.contains(v)).collect();

        let shell = Self::derived(cond, cons)?;
        let values = shell.combine(self, other, |a, b, _| Ok(a * b))?;
        trace!(
            target: "bn.factor.product",
            lhs = %self.name,
            rhs = %other.name,
            cells = values.len(),
            "multiplied"
        );
        shell.filled(values)
    }

    /// Fold step that treats `None` as the multiplicative identity.
    pub fn fold_product(acc: Option<Factor>, next: &Factor) -> Result<Factor> {
        match acc {
            None => Ok(next.clone()),
            Some(acc) => acc.product(next),
        }
    }

    /// Product of every factor, or `None` for an empty input.
    pub fn product_all<'a, I>(factors: I) -> Result<Option<Factor>>
    where
        I: IntoIterator<Item = &'a Factor>,
    {
        factors
            .into_iter()
            .try_fold(None, |acc, f| Self::fold_product(acc, f).map(Some))
    }

    /// Factor division: `P(A,B) / P(B) = P(A|B)`.
    ///
    /// The divisor must be unconditional and its variables must all be
    /// conditioned in `self`; they move to the conditioning side of the
    /// result, which is renormalized. A zero divisor entry yields zero when
    /// the dividend entry is zero too, and fails with `DivisionByZero`
    /// otherwise.
    pub fn divide(&self, other: &Factor) -> Result<Factor> {
        let shape_error = |reason: String| Error::DivisorShape {
            dividend: self.name.clone(),
            divisor: other.name.clone(),
            reason,
        };
        if !other.cond.is_empty() {
            return Err(shape_error("divisor has conditioning variables".into()));
        }
        if let Some(v) = other.cons.iter().find(|v| self.cond.contains(v)) {
            return Err(shape_error(format!("'{v}' is already a condition of the dividend")));
        }
        if let Some(v) = other.cons.iter().find(|v| !self.cons.contains(v)) {
            return Err(shape_error(format!("'{v}' is not in the dividend")));
        }
        self.check_compatible(other)?;

        let cond: Vec<Variable> = self.cond.iter().chain(other.cons.iter()).cloned().collect();
        let cons: Vec<Variable> = self
            .cons
            .iter()
            .filter(|v| !other.cons.contains(v))
            .cloned()
            .collect();
        let shell = Self::derived(cond, cons)?;

        let values = shell.combine(self, other, |num, den, assignment| {
            checked_ratio(num, den).ok_or_else(|| Error::DivisionByZero {
                dividend: self.name.clone(),
                assignment: assignment.to_vec(),
            })
        })?;
        let mut out = shell.filled(values)?;
        out.normalize();
        trace!(
            target: "bn.factor.divide",
            dividend = %self.name,
            divisor = %other.name,
            "divided"
        );
        Ok(out)
    }

    /// Flat copy for reporting.
    pub fn to_table(&self) -> FactorTable {
        FactorTable {
            name: self.name.clone(),
            cond: self.cond.iter().map(|v| v.name().to_string()).collect(),
            cons: self.cons.iter().map(|v| v.name().to_string()).collect(),
            shape: self.shape().to_vec(),
            values: self.cpd.iter().copied().collect(),
        }
    }
}

/// `"A,B|C"` style label for a scope.
fn scope_label(cond: &[Variable], cons: &[Variable]) -> String {
    let join = |vars: &[Variable]| {
        vars.iter()
            .map(Variable::name)
            .collect::<Vec<_>>()
            .join(",")
    };
    if cond.is_empty() {
        join(cons)
    } else {
        format!("{}|{}", join(cons), join(cond))
    }
}

impl<'a> Mul<&'a Factor> for &'a Factor {
    type Output = Result<Factor>;

    fn mul(self, rhs: &'a Factor) -> Result<Factor> {
        self.product(rhs)
    }
}

impl<'a> Sub<&'a Variable> for &'a Factor {
    type Output = Result<Factor>;

    fn sub(self, rhs: &'a Variable) -> Result<Factor> {
        self.marginal(rhs)
    }
}

impl<'a> Sub<&'a [Variable]> for &'a Factor {
    type Output = Result<Factor>;

    fn sub(self, rhs: &'a [Variable]) -> Result<Factor> {
        self.marginalize_all(rhs)
    }
}

impl<'a> Div<&'a Factor> for &'a Factor {
    type Output = Result<Factor>;

    fn div(self, rhs: &'a Factor) -> Result<Factor> {
        self.divide(rhs)
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |vars: &[Variable]| {
            vars.iter()
                .map(Variable::name)
                .collect::<Vec<_>>()
                .join(", ")
        };
        writeln!(f, "{}:", self.name)?;
        writeln!(f, "[{}] | [{}]", names(&self.cons), names(&self.cond))?;
        writeln!(f, "[{}]", self.var_names().join(", "))?;
        writeln!(f, "{:?}", self.shape())?;
        for (assignment, value) in Assignments::new(self.shape()).zip(self.cpd.iter()) {
            writeln!(f, "{assignment:?}    {value}")?;
        }
        writeln!(f, "Sum: {}", self.cpd.sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bn_math::approx_eq;
    use ndarray::array;

    const TOL: f64 = 1e-9;

    struct Cancer {
        c: Variable,
        t: Variable,
        prior: Factor,
        test: Factor,
    }

    fn cancer() -> Cancer {
        let c = Variable::discrete("C", ["no", "yes"]).unwrap();
        let t = Variable::discrete("T", ["pos", "neg"]).unwrap();
        let prior = Factor::unconditional("C", [c.clone()])
            .unwrap()
            .with_values(&[0.99, 0.01])
            .unwrap();
        let mut test = Factor::new("T|C", [c.clone()], [t.clone()]).unwrap();
        test.set_cpd(array![[0.2, 0.8], [0.9, 0.1]].into_dyn())
            .unwrap();
        Cancer { c, t, prior, test }
    }

    #[test]
    fn new_factor_is_uniform_per_condition() {
        let a = Variable::discrete("A", ["low", "high"]).unwrap();
        let b = Variable::discrete("B", ["0", "1", "2"]).unwrap();
        let fa = Factor::unconditional("A", [a.clone()]).unwrap();
        let fb = Factor::new("B|A", [a], [b]).unwrap();

        assert_eq!(fa.shape(), &[2]);
        assert_eq!(fb.shape(), &[2, 3]);
        assert!(approx_eq(fa.value(&[0]).unwrap(), 0.5, TOL));
        assert!(approx_eq(fb.value(&[0, 0]).unwrap(), 1.0 / 3.0, TOL));
        assert!(fb.is_normalized(1e-12));
    }

    #[test]
    fn scope_is_sorted_by_name() {
        let z = Variable::discrete("Z", ["a", "b"]).unwrap();
        let a = Variable::discrete("A", ["a", "b", "c"]).unwrap();
        let m = Variable::discrete("M", ["a"]).unwrap();
        let f = Factor::new("f", [z.clone(), a.clone()], [m.clone()]).unwrap();
        assert_eq!(f.var_names(), vec!["A", "Z", "M"]);
        assert_eq!(f.shape(), &[3, 2, 1]);
    }

    #[test]
    fn empty_cons_is_rejected() {
        let a = Variable::discrete("A", ["x"]).unwrap();
        let err = Factor::new("bad", [a], Vec::new()).unwrap_err();
        assert_eq!(err, Error::EmptyScope { factor: "bad".into() });
    }

    #[test]
    fn duplicate_variables_are_rejected() {
        let a = Variable::discrete("A", ["x", "y"]).unwrap();
        let err = Factor::new("dup", [a.clone()], [a]).unwrap_err();
        assert!(matches!(err, Error::DuplicateVariable { .. }));
    }

    #[test]
    fn unaddressable_scope_is_rejected() {
        let vars: Vec<Variable> = (0..63)
            .map(|i| Variable::discrete(format!("V{i:02}"), [0, 1]).unwrap())
            .collect();
        let err = Factor::unconditional("huge", vars).unwrap_err();
        match err {
            Error::ScopeTooLarge { factor, cells, limit } => {
                assert_eq!(factor, "huge");
                assert_eq!(cells, 1u128 << 63);
                assert_eq!(limit, MAX_CELLS);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn set_cpd_checks_shape_and_values() {
        let Cancer { mut test, .. } = cancer();
        assert!(matches!(
            test.set_cpd(array![0.5, 0.5].into_dyn()),
            Err(Error::InvalidCpd { .. })
        ));
        assert!(test
            .set_cpd(array![[0.2, -0.8], [0.9, 0.1]].into_dyn())
            .is_err());
        assert!(test.clone().with_values(&[1.0, 2.0, 3.0]).is_err());
        // failed installs leave the table alone
        assert!(approx_eq(test.value(&[1, 0]).unwrap(), 0.9, TOL));
    }

    #[test]
    fn normalize_leaves_zero_slices() {
        let Cancer { mut test, .. } = cancer();
        test.set_cpd(array![[2.0, 6.0], [0.0, 0.0]].into_dyn())
            .unwrap();
        test.normalize();
        assert!(approx_eq(test.value(&[0, 0]).unwrap(), 0.25, TOL));
        assert!(approx_eq(test.value(&[0, 1]).unwrap(), 0.75, TOL));
        assert_eq!(test.value(&[1, 0]), Some(0.0));
        assert_eq!(test.value(&[1, 1]), Some(0.0));
        assert!(test.is_normalized(1e-12));
    }

    #[test]
    fn normalize_handles_column_major_tables() {
        let Cancer { mut test, .. } = cancer();
        let cpd = array![[2.0, 0.0], [6.0, 0.0]].reversed_axes().into_dyn();
        assert!(cpd.as_slice().is_none());
        test.set_cpd(cpd).unwrap();
        test.normalize();
        assert!(approx_eq(test.value(&[0, 0]).unwrap(), 0.25, TOL));
        assert!(approx_eq(test.value(&[0, 1]).unwrap(), 0.75, TOL));
        assert_eq!(test.value(&[1, 1]), Some(0.0));
    }

    #[test]
    fn axis_map_matches_by_name() {
        let a = Variable::discrete("A", [0, 1]).unwrap();
        let b = Variable::discrete("B", [0, 1]).unwrap();
        let c = Variable::discrete("C", [0, 1]).unwrap();
        let abc = Factor::unconditional("P(A,B,C)", [a.clone(), b.clone(), c.clone()]).unwrap();
        let ab = Factor::unconditional("P(A,B)", [a.clone(), b.clone()]).unwrap();
        let bc = Factor::unconditional("P(B,C)", [b, c]).unwrap();
        assert_eq!(abc.axis_map(&ab).unwrap(), vec![0, 1]);
        assert_eq!(abc.axis_map(&bc).unwrap(), vec![1, 2]);
        assert!(matches!(ab.axis_map(&bc), Err(Error::Scope { .. })));
    }

    #[test]
    fn marginal_of_condition() {
        let Cancer { c, test, .. } = cancer();
        let m = (&test - &c).unwrap();
        assert_eq!(m.var_names(), vec!["T"]);
        assert!(approx_eq(m.value(&[0]).unwrap(), 1.1, TOL));
        assert!(approx_eq(m.value(&[1]).unwrap(), 0.9, TOL));
    }

    #[test]
    fn marginal_of_conditioned_variable() {
        let Cancer { c, t, prior, test } = cancer();
        let joint = prior.product(&test).unwrap();
        let pt = joint.marginal(&c).unwrap();
        assert!(pt.cond().is_empty());
        assert!(approx_eq(pt.value(&[0]).unwrap(), 0.99 * 0.2 + 0.01 * 0.9, TOL));
        assert!(pt.is_normalized(1e-12));

        // removing the last conditioned variable leaves nothing to describe
        assert!(matches!(
            pt.marginal(&t),
            Err(Error::EmptyScope { .. })
        ));
    }

    #[test]
    fn marginal_of_absent_variable_fails() {
        let Cancer { prior, t, .. } = cancer();
        assert_eq!(
            prior.marginal(&t).unwrap_err(),
            Error::Scope {
                variable: "T".into(),
                scope: "C".into()
            }
        );
    }

    #[test]
    fn marginalize_all_folds_left() {
        let Cancer { c, prior, test, .. } = cancer();
        let joint = prior.product(&test).unwrap();
        let via_list = (&joint - &[c.clone()][..]).unwrap();
        let via_one = joint.marginal(&c).unwrap();
        assert_eq!(via_list.cpd(), via_one.cpd());
        assert_eq!(joint.marginalize_all(Vec::<&Variable>::new()).unwrap().cpd(), joint.cpd());
    }

    #[test]
    fn product_of_prior_and_conditional() {
        let Cancer { prior, test, .. } = cancer();
        let p = (&prior * &test).unwrap();
        assert_eq!(p.var_names(), vec!["C", "T"]);
        assert!(p.cond().is_empty());
        assert!(approx_eq(p.value(&[0, 0]).unwrap(), 0.198, TOL));
        assert!(approx_eq(p.value(&[1, 1]).unwrap(), 0.001, TOL));
        assert!(p.is_normalized(1e-12));
    }

    #[test]
    fn product_keeps_shared_conditions() {
        let c = Variable::discrete("C", ["a", "b"]).unwrap();
        let a = Variable::discrete("A", ["a", "b"]).unwrap();
        let d = Variable::discrete("D", ["a", "b", "c"]).unwrap();
        let pa = Factor::new("A|C", [c.clone()], [a]).unwrap();
        let pd = Factor::new("D|C", [c], [d]).unwrap();
        let p = pa.product(&pd).unwrap();
        assert_eq!(p.name(), "A,D|C");
        assert_eq!(p.var_names(), vec!["C", "A", "D"]);
        assert_eq!(p.shape(), &[2, 2, 3]);
        assert!(p.is_normalized(1e-12));
    }

    #[test]
    fn product_commutes() {
        let Cancer { prior, test, .. } = cancer();
        let ab = prior.product(&test).unwrap();
        let ba = test.product(&prior).unwrap();
        assert_eq!(ab.var_names(), ba.var_names());
        for (x, y) in ab.cpd().iter().zip(ba.cpd().iter()) {
            assert!(approx_eq(*x, *y, TOL));
        }
    }

    #[test]
    fn product_rejects_cardinality_mismatch() {
        let Cancer { prior, .. } = cancer();
        let wide = Variable::discrete("C", ["x", "y", "z"]).unwrap();
        let other = Factor::unconditional("C'", [wide]).unwrap();
        assert_eq!(
            prior.product(&other).unwrap_err(),
            Error::OperandMismatch {
                variable: "C".into(),
                left: 2,
                right: 3
            }
        );
    }

    #[test]
    fn none_is_product_identity() {
        let Cancer { prior, test, .. } = cancer();
        let first = Factor::fold_product(None, &prior).unwrap();
        assert_eq!(first.cpd(), prior.cpd());

        let all = Factor::product_all([&prior, &test]).unwrap().unwrap();
        assert!(approx_eq(all.value(&[0, 0]).unwrap(), 0.198, TOL));
        assert!(Factor::product_all(std::iter::empty::<&Factor>()).unwrap().is_none());
    }

    #[test]
    fn division_recovers_conditional() {
        let Cancer { prior, test, .. } = cancer();
        let joint = prior.product(&test).unwrap();
        let q = (&joint / &prior).unwrap();
        assert_eq!(q.name(), "T|C");
        assert_eq!(q.var_names(), vec!["C", "T"]);
        assert!(approx_eq(q.value(&[0, 0]).unwrap(), 0.2, TOL));
        assert!(approx_eq(q.value(&[0, 1]).unwrap(), 0.8, TOL));
        assert!(approx_eq(q.value(&[1, 0]).unwrap(), 0.9, TOL));
    }

    #[test]
    fn division_requires_unconditional_subset_divisor() {
        let Cancer { c, t, prior, test } = cancer();
        let joint = prior.product(&test).unwrap();

        let err = joint.divide(&test).unwrap_err();
        assert!(matches!(err, Error::DivisorShape { .. }));

        // T|C divided by P(C): C is a condition of the dividend
        assert!(matches!(
            test.divide(&prior),
            Err(Error::DivisorShape { .. })
        ));

        let u = Variable::discrete("U", ["a", "b"]).unwrap();
        let pu = Factor::unconditional("U", [u]).unwrap();
        assert!(matches!(
            joint.divide(&pu),
            Err(Error::DivisorShape { .. })
        ));

        // dividing by the full scope leaves nothing conditioned
        let both = Factor::unconditional("C,T", [c, t]).unwrap();
        assert!(matches!(
            joint.divide(&both),
            Err(Error::EmptyScope { .. })
        ));
    }

    #[test]
    fn zero_over_zero_is_zero() {
        let Cancer { test, c, .. } = cancer();
        let certain = Factor::unconditional("C", [c])
            .unwrap()
            .with_values(&[1.0, 0.0])
            .unwrap();
        let joint = certain.product(&test).unwrap();
        let back = joint.divide(&certain).unwrap();
        assert!(approx_eq(back.value(&[0, 0]).unwrap(), 0.2, TOL));
        assert!(approx_eq(back.value(&[0, 1]).unwrap(), 0.8, TOL));
        assert_eq!(back.value(&[1, 0]), Some(0.0));
        assert_eq!(back.value(&[1, 1]), Some(0.0));
    }

    #[test]
    fn nonzero_over_zero_fails() {
        let Cancer { c, t, .. } = cancer();
        let uniform = Factor::unconditional("C,T", [c.clone(), t]).unwrap();
        let certain = Factor::unconditional("C", [c])
            .unwrap()
            .with_values(&[1.0, 0.0])
            .unwrap();
        let err = uniform.divide(&certain).unwrap_err();
        assert_eq!(
            err,
            Error::DivisionByZero {
                dividend: "C,T".into(),
                assignment: vec![1, 0]
            }
        );
    }

    #[test]
    fn display_lists_every_assignment() {
        let Cancer { test, .. } = cancer();
        let text = test.to_string();
        assert!(text.starts_with("T|C:\n"));
        assert!(text.contains("[T] | [C]"));
        assert!(text.contains("[1, 0]    0.9"));
        assert!(text.lines().last().unwrap().starts_with("Sum: "));
    }

    #[test]
    fn table_serializes() {
        let Cancer { prior, .. } = cancer();
        let json = serde_json::to_value(prior.to_table()).unwrap();
        assert_eq!(json["name"], "C");
        assert_eq!(json["cons"][0], "C");
        assert_eq!(json["values"][1], 0.01);
    }
}
