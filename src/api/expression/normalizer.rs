//! Rewrites implicit boolean leaves into explicit comparisons
//!
//! `item.Hidden` becomes `item.Hidden == true` and `!item.Hidden` becomes
//! `item.Hidden == false`, so the translator only ever sees comparisons
//! under `&&`/`||`.

use super::{BinaryOp, Expr, UnaryOp};
use crate::api::query::FilterValue;

/// Return an equivalent tree with every boolean leaf made explicit
pub fn normalize<F: Clone>(expr: &Expr<F>) -> Expr<F> {
    match expr {
        Expr::Binary { op, left, right } if op.is_logical() => {
            Expr::binary(*op, normalize(&**left), normalize(&**right))
        }
        Expr::Member { .. } | Expr::Call { .. } => compare_with(expr, true),
        Expr::Unary {
            op: UnaryOp::Not,
            operand,
        } if is_leaf(&**operand) => compare_with(&**operand, false),
        other => other.clone(),
    }
}

fn is_leaf<F>(expr: &Expr<F>) -> bool {
    matches!(expr, Expr::Member { .. } | Expr::Call { .. })
}

fn compare_with<F: Clone>(expr: &Expr<F>, value: bool) -> Expr<F> {
    Expr::binary(BinaryOp::Equal, expr.clone(), Expr::Constant(FilterValue::Boolean(value)))
}
