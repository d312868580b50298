//! Filter operators and their semantics.
//!
//! Every operator maps to one [`OperatorSemantics`] entry: its arity, the
//! value kinds it applies to, its family, how faithfully it can run
//! against a custom field, and the function that turns a target
//! expression plus coerced operands into a predicate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::criteria::{Value, ValueKind};
use crate::sql::expr::{lower, lit_str, Expr, ExprExt};

/// Escape character used in every generated LIKE pattern.
///
/// Backslash is avoided because MySQL treats it as an escape inside
/// string literals as well.
pub const LIKE_ESCAPE: char = '!';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
    Ilike,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    Between,
    Contains,
    StartsWith,
    EndsWith,
    DateRange,
    CustomField,
}

impl Operator {
    pub const ALL: [Operator; 18] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqual,
        Operator::LessThan,
        Operator::LessThanOrEqual,
        Operator::Like,
        Operator::Ilike,
        Operator::In,
        Operator::NotIn,
        Operator::IsNull,
        Operator::IsNotNull,
        Operator::Between,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::DateRange,
        Operator::CustomField,
    ];

    /// Wire name, e.g. `GREATER_THAN_OR_EQUAL`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "EQUALS",
            Operator::NotEquals => "NOT_EQUALS",
            Operator::GreaterThan => "GREATER_THAN",
            Operator::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            Operator::LessThan => "LESS_THAN",
            Operator::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            Operator::Like => "LIKE",
            Operator::Ilike => "ILIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT_IN",
            Operator::IsNull => "IS_NULL",
            Operator::IsNotNull => "IS_NOT_NULL",
            Operator::Between => "BETWEEN",
            Operator::Contains => "CONTAINS",
            Operator::StartsWith => "STARTS_WITH",
            Operator::EndsWith => "ENDS_WITH",
            Operator::DateRange => "DATE_RANGE",
            Operator::CustomField => "CUSTOM_FIELD",
        }
    }

    /// Look up by wire name, ignoring ASCII case.
    pub fn parse(name: &str) -> Option<Operator> {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(name))
    }

    pub fn semantics(&self) -> &'static OperatorSemantics {
        match self {
            Operator::Equals => &EQUALS,
            Operator::NotEquals => &NOT_EQUALS,
            Operator::GreaterThan => &GREATER_THAN,
            Operator::GreaterThanOrEqual => &GREATER_THAN_OR_EQUAL,
            Operator::LessThan => &LESS_THAN,
            Operator::LessThanOrEqual => &LESS_THAN_OR_EQUAL,
            Operator::Like => &LIKE,
            Operator::Ilike => &ILIKE,
            Operator::In => &IN,
            Operator::NotIn => &NOT_IN,
            Operator::IsNull => &IS_NULL,
            Operator::IsNotNull => &IS_NOT_NULL,
            Operator::Between => &BETWEEN,
            Operator::Contains => &CONTAINS,
            Operator::StartsWith => &STARTS_WITH,
            Operator::EndsWith => &ENDS_WITH,
            Operator::DateRange => &DATE_RANGE,
            Operator::CustomField => &CUSTOM_FIELD,
        }
    }

    pub fn arity(&self) -> Arity {
        self.semantics().arity
    }

    pub fn family(&self) -> Family {
        self.semantics().family
    }

    pub fn applicable_types(&self) -> &'static [ValueKind] {
        self.semantics().kinds
    }

    pub fn applies_to(&self, kind: ValueKind) -> bool {
        self.applicable_types().contains(&kind)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many operand values an operator takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    None,
    Single,
    /// A non-empty list.
    Multi,
    /// Exactly two values, low then high.
    Pair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Equality, ordering, membership and null checks.
    Comparison,
    /// Pattern matching on text.
    Text,
    /// Inclusive ranges.
    Range,
    /// Equality on a custom-field key.
    CustomField,
}

/// Whether a predicate on a custom field means what it says.
///
/// Custom-field values are compared as text, so ordering and ranges only
/// approximate their typed meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fidelity {
    #[default]
    Exact,
    BestEffort,
}

impl Fidelity {
    /// The weaker of two fidelities.
    pub fn max_with(self, other: Fidelity) -> Fidelity {
        if self == Fidelity::BestEffort || other == Fidelity::BestEffort {
            Fidelity::BestEffort
        } else {
            Fidelity::Exact
        }
    }
}

/// Coerced operand values, shaped by arity.
#[derive(Debug, Clone, PartialEq)]
pub enum Operands {
    None,
    Single(Value),
    Multi(Vec<Value>),
    Pair(Value, Value),
}

type BuildFn = fn(Expr, &Operands) -> Expr;

pub struct OperatorSemantics {
    pub operator: Operator,
    pub arity: Arity,
    pub kinds: &'static [ValueKind],
    pub family: Family,
    pub custom_field_fidelity: Fidelity,
    build: BuildFn,
}

impl OperatorSemantics {
    /// Build the predicate for `target`.
    ///
    /// Operands must match the arity; a mismatch yields `FALSE` so a bug
    /// upstream can never widen a result set.
    pub fn build(&self, target: Expr, operands: &Operands) -> Expr {
        (self.build)(target, operands)
    }
}

impl fmt::Debug for OperatorSemantics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorSemantics")
            .field("operator", &self.operator)
            .field("arity", &self.arity)
            .field("kinds", &self.kinds)
            .field("family", &self.family)
            .field("custom_field_fidelity", &self.custom_field_fidelity)
            .finish()
    }
}

// =============================================================================
// Semantics table
// =============================================================================

const ALL_KINDS: &[ValueKind] = &[
    ValueKind::String,
    ValueKind::Number,
    ValueKind::Date,
    ValueKind::Enum,
    ValueKind::Boolean,
];
const ORDERED: &[ValueKind] = &[ValueKind::String, ValueKind::Number, ValueKind::Date];
const TEXT: &[ValueKind] = &[ValueKind::String];
const TEMPORAL: &[ValueKind] = &[ValueKind::Date];

macro_rules! semantics {
    ($name:ident, $op:ident, $arity:ident, $kinds:expr, $family:ident, $fidelity:ident, $build:expr) => {
        static $name: OperatorSemantics = OperatorSemantics {
            operator: Operator::$op,
            arity: Arity::$arity,
            kinds: $kinds,
            family: Family::$family,
            custom_field_fidelity: Fidelity::$fidelity,
            build: $build,
        };
    };
}

semantics!(EQUALS, Equals, Single, ALL_KINDS, Comparison, Exact, |t, o| single(t, o, |a, b| a.eq(b)));
semantics!(NOT_EQUALS, NotEquals, Single, ALL_KINDS, Comparison, BestEffort, |t, o| single(t, o, |a, b| a.ne(b)));
semantics!(GREATER_THAN, GreaterThan, Single, ORDERED, Comparison, BestEffort, |t, o| single(t, o, |a, b| a.gt(b)));
semantics!(GREATER_THAN_OR_EQUAL, GreaterThanOrEqual, Single, ORDERED, Comparison, BestEffort, |t, o| single(t, o, |a, b| a.gte(b)));
semantics!(LESS_THAN, LessThan, Single, ORDERED, Comparison, BestEffort, |t, o| single(t, o, |a, b| a.lt(b)));
semantics!(LESS_THAN_OR_EQUAL, LessThanOrEqual, Single, ORDERED, Comparison, BestEffort, |t, o| single(t, o, |a, b| a.lte(b)));
semantics!(LIKE, Like, Single, TEXT, Text, Exact, |t, o| pattern(t, o, false, "%", "%"));
semantics!(ILIKE, Ilike, Single, TEXT, Text, BestEffort, |t, o| pattern(t, o, true, "%", "%"));
semantics!(IN, In, Multi, ALL_KINDS, Comparison, BestEffort, |t, o| list(t, o, false));
semantics!(NOT_IN, NotIn, Multi, ALL_KINDS, Comparison, BestEffort, |t, o| list(t, o, true));
semantics!(IS_NULL, IsNull, None, ALL_KINDS, Comparison, Exact, |t, _| t.is_null());
semantics!(IS_NOT_NULL, IsNotNull, None, ALL_KINDS, Comparison, Exact, |t, _| t.is_not_null());
semantics!(BETWEEN, Between, Pair, ORDERED, Range, BestEffort, range);
semantics!(CONTAINS, Contains, Single, TEXT, Text, BestEffort, |t, o| pattern(t, o, false, "%", "%"));
semantics!(STARTS_WITH, StartsWith, Single, TEXT, Text, BestEffort, |t, o| pattern(t, o, false, "", "%"));
semantics!(ENDS_WITH, EndsWith, Single, TEXT, Text, BestEffort, |t, o| pattern(t, o, false, "%", ""));
semantics!(DATE_RANGE, DateRange, Pair, TEMPORAL, Range, BestEffort, range);
semantics!(CUSTOM_FIELD, CustomField, Single, ALL_KINDS, CustomField, Exact, |t, o| single(t, o, |a, b| a.eq(b)));

// =============================================================================
// Predicate builders
// =============================================================================

fn never() -> Expr {
    Expr::from(false)
}

fn single(target: Expr, operands: &Operands, cmp: fn(Expr, Expr) -> Expr) -> Expr {
    match operands {
        Operands::Single(v) => cmp(target, v.to_literal()),
        _ => never(),
    }
}

fn list(target: Expr, operands: &Operands, negated: bool) -> Expr {
    match operands {
        Operands::Multi(vs) if !vs.is_empty() => {
            let values = vs.iter().map(Value::to_literal).collect();
            if negated {
                target.not_in_list(values)
            } else {
                target.in_list(values)
            }
        }
        _ => never(),
    }
}

fn range(target: Expr, operands: &Operands) -> Expr {
    match operands {
        Operands::Pair(low, high) => target.between(low.to_literal(), high.to_literal()),
        _ => never(),
    }
}

/// `target LIKE prefix || escaped(value) || suffix ESCAPE '!'`.
///
/// The value's own wildcards are escaped; LIKE matches literally too.
/// With `fold_case` both sides are lower-cased.
fn pattern(target: Expr, operands: &Operands, fold_case: bool, prefix: &str, suffix: &str) -> Expr {
    let Operands::Single(v) = operands else {
        return never();
    };
    let text = v.to_text();
    let body = escape_like(&text);
    if fold_case {
        let pat = format!("{}{}{}", prefix, body.to_lowercase(), suffix);
        lower(target).like_escape(lit_str(&pat), LIKE_ESCAPE)
    } else {
        let pat = format!("{}{}{}", prefix, body, suffix);
        target.like_escape(lit_str(&pat), LIKE_ESCAPE)
    }
}

/// Escape LIKE wildcards and the escape character itself.
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == LIKE_ESCAPE || c == '%' || c == '_' {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}
