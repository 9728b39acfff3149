//! The condition language's abstract syntax tree.
//!
//! A deliberately closed set of variants: literals, path access, length,
//! filtered count, comparison, and boolean combinators. There is no variant
//! for a general function call, assignment, or I/O — conditions cannot be
//! extended into a scripting language by construction.

use std::fmt;

/// A comparison or membership operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `in` — element of an array, substring of a string, or key of an object.
    In,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::In => "in",
        };
        f.write_str(symbol)
    }
}

/// A literal value appearing directly in a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// One step of a path expression after the root identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `.field` — key access into an object.
    Key(String),
    /// `[n]` — index access into an array.
    Index(usize),
}

/// A parsed trigger condition.
///
/// Produced once at contract load time and walked (never re-parsed) on every
/// evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value.
    Literal(Literal),

    /// Access into the evaluation context: a root identifier (`tool_output`,
    /// `tool_input`, or a loop variable) followed by key/index segments.
    Path {
        root: String,
        segments: Vec<Segment>,
    },

    /// `len(expr)` — element count of an array, character count of a string,
    /// key count of an object.
    Len(Box<Expr>),

    /// `count(seq, var, pred)` — the number of elements of `seq` for which
    /// `pred` holds with the element bound to `var`. The binding is visible
    /// only inside `pred`.
    Count {
        seq: Box<Expr>,
        var: String,
        pred: Box<Expr>,
    },

    /// `not expr` / `!expr`.
    Not(Box<Expr>),

    /// A single binary comparison. Comparisons do not chain.
    Compare {
        op: CmpOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// `a and b and c` — true iff every operand is true.
    All(Vec<Expr>),

    /// `a or b or c` — true iff any operand is true.
    Any(Vec<Expr>),
}

/// Render a path (root plus segments) the way it appeared in the source,
/// for evaluation error messages.
pub(crate) fn path_display(root: &str, segments: &[Segment]) -> String {
    let mut out = String::from(root);
    for segment in segments {
        match segment {
            Segment::Key(key) => {
                out.push('.');
                out.push_str(key);
            }
            Segment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
    out
}
