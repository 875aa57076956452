//! Arithmetic Expression Evaluator
//!
//! Deterministic ground truth for the rest of the system. An expression string
//! is parsed into an explicit tree (see [`expr`]) and evaluated post-order,
//! producing the value, a human-readable step trace and the number of binary
//! operations performed.
//!
//! Rules:
//!
//! - All values are `f64`, whether or not the literals were integral.
//! - Every binary node contributes one step and increments `operations_count`.
//! - Unary sign nodes contribute a step but are not counted.
//! - Division checks its right operand before dividing; a zero divisor aborts
//!   the entire evaluation with no partial result.
//! - A literal or reduction that is not a finite `f64` aborts the same way.
//! - Expressions are limited to [`parser::MAX_OPERATORS`] operators.
//!
//! # Examples
//!
//! ```
//! use mathcrew_engine::evaluator::evaluate;
//!
//! let result = evaluate("2 + 3 * 4").unwrap();
//! assert_eq!(result.result, 14.0);
//! assert_eq!(result.operations_count, 2);
//! assert_eq!(result.step_texts(), vec!["3 × 4 = 12.0", "2 + 12.0 = 14.0"]);
//! ```

pub mod error;
pub mod expr;
pub mod parser;
pub mod tool;

pub use error::{ErrorCategory, EvalError};
pub use expr::{BinaryOp, Expr, UnaryOp};

use sdk::types::EvaluationPayload;
use serde::{Deserialize, Serialize};

/// One reduction performed during evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationStep {
    pub text: String,
    pub result: f64,
}

/// Outcome of a successful evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Normalized rendering of the parsed expression
    pub expression: String,

    pub result: f64,

    /// Number of binary operator applications
    pub operations_count: usize,

    /// Reductions in post-order (children before parents)
    pub steps: Vec<EvaluationStep>,
}

impl EvaluationResult {
    pub fn step_texts(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.text.as_str()).collect()
    }

    /// Wire payload for tool callers
    pub fn to_payload(&self) -> EvaluationPayload {
        EvaluationPayload {
            expression: self.expression.clone(),
            result: self.result,
            operations_count: self.operations_count,
            steps: self.steps.iter().map(|s| s.text.clone()).collect(),
        }
    }
}

/// Parse and evaluate an arithmetic expression
pub fn evaluate(expression: &str) -> Result<EvaluationResult, EvalError> {
    let tree = parser::parse(expression)?;
    evaluate_tree(&tree)
}

/// Evaluate an already-parsed expression tree
pub fn evaluate_tree(tree: &Expr) -> Result<EvaluationResult, EvalError> {
    let mut steps = Vec::new();
    let mut operations_count = 0;
    let result = reduce(tree, &mut steps, &mut operations_count)?;

    Ok(EvaluationResult {
        expression: tree.to_string(),
        result,
        operations_count,
        steps,
    })
}

/// Render a value the way step traces show it: always with a fractional part
/// for finite integral values (`12.0`, `-3.0`, `0.5`).
pub fn format_value(value: f64) -> String {
    format!("{:?}", value)
}

/// How a child appears inside its parent's step: literals as written,
/// anything already reduced by its value.
fn operand_repr(node: &Expr, value: f64) -> String {
    match node {
        Expr::Literal { text, .. } => text.clone(),
        _ => format_value(value),
    }
}

fn finite(value: f64, source: &str) -> Result<f64, EvalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::Overflow(source.to_string()))
    }
}

fn reduce(node: &Expr, steps: &mut Vec<EvaluationStep>, ops: &mut usize) -> Result<f64, EvalError> {
    match node {
        Expr::Literal { text, value } => finite(*value, text),
        Expr::Unary { op, operand } => {
            let inner = reduce(operand, steps, ops)?;
            let value = match op {
                UnaryOp::Plus => inner,
                UnaryOp::Neg => -inner,
            };
            steps.push(EvaluationStep {
                text: format!("{} = {}", node, format_value(value)),
                result: value,
            });
            Ok(value)
        }
        Expr::Binary { op, left, right } => {
            let lhs = reduce(left, steps, ops)?;
            let rhs = reduce(right, steps, ops)?;
            let value = match op {
                BinaryOp::Add => lhs + rhs,
                BinaryOp::Sub => lhs - rhs,
                BinaryOp::Mul => lhs * rhs,
                BinaryOp::Div => {
                    if rhs == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    lhs / rhs
                }
            };
            let text = format!(
                "{} {} {}",
                operand_repr(left, lhs),
                op.step_symbol(),
                operand_repr(right, rhs)
            );
            let value = finite(value, &text)?;
            *ops += 1;
            steps.push(EvaluationStep {
                text: format!("{} = {}", text, format_value(value)),
                result: value,
            });
            Ok(value)
        }
    }
}
