/// Tree helpers shared by the dialect tailors.
///
/// Nothing here depends on traversal state; every function is a plain
/// computation over the node model.
use crate::ast::types::*;
use crate::error::{Result, TailorError};

use super::keywords::Keyword;

/// Effective term of `node`: the innermost node under any transparent wrappers.
pub fn term(node: &Node) -> &Node {
    node.term()
}

/// Owned variant of [`term`].
pub fn into_term(node: Node) -> Node {
    let mut current = node;
    loop {
        match current {
            Node::Expression(expression) if expression.is_wrapper() => {
                let Expression { left, right, .. } = *expression;
                match left.or(right) {
                    Some(inner) => current = inner,
                    None => return Node::Expression(Box::default()),
                }
            }
            other => return other,
        }
    }
}

/// True when any argument of `call` is, after unwrapping, the NULL literal.
pub fn has_null_argument(call: &FunctionCall) -> bool {
    call.arguments
        .iter()
        .any(|item| term(&item.expression).is_null_literal())
}

/// Unqualified, unquoted name equal to `keyword`: `sysdate` but neither
/// `t.sysdate` nor `"sysdate"`.
pub fn is_bare_keyword(object: &DbObject, keyword: Keyword) -> bool {
    !object.has_next()
        && object
            .identifier()
            .map(|ident| ident.quote.is_none() && keyword.matches(&ident.name))
            .unwrap_or(false)
}

pub fn is_rownum(node: &Node) -> bool {
    matches!(term(node), Node::DbObject(object) if is_bare_keyword(object, Keyword::Rownum))
}

/// Literals that can never evaluate to NULL.
pub fn is_non_nullable_literal(node: &Node) -> bool {
    matches!(
        node,
        Node::Literal(Literal::Integer(_) | Literal::String(_) | Literal::Float(_))
    )
}

/// `t1 IS NOT NULL OR t2 IS NOT NULL ...` over every argument term that
/// is not a non-nullable literal, or `None` when there is nothing to guard.
pub fn not_null_guard(arguments: &[ExpressionItem]) -> Option<Node> {
    arguments
        .iter()
        .map(|item| term(&item.expression))
        .filter(|t| !is_non_nullable_literal(t))
        .map(|t| Node::postfix(t.clone(), Operator::IsNotNull))
        .reduce(|guard, check| Node::binary(guard, Operator::Or, check))
}

/// `CASE WHEN guard THEN value ELSE NULL END`
pub fn null_guarded(guard: Node, value: Node) -> Node {
    Node::CaseExpression(Box::new(CaseExpression {
        operand: None,
        alternatives: vec![CaseAlternative {
            when: guard,
            then: value,
        }],
        else_result: Some(Node::wrap(Node::null())),
    }))
}

/// Length argument covering `value` from `start` to its end:
/// `LEN(value)` when start is the literal 1, else `(LEN(value) + 1) - start`.
pub fn make_len_arg(start: &Node, value: &Node, len_name: &str) -> Node {
    let len = Node::call(len_name, vec![value.clone()]);
    let start = term(start);
    if matches!(start, Node::Literal(Literal::Integer(1))) {
        return len;
    }
    Node::binary(
        Node::binary(len, Operator::Plus, Node::integer(1)),
        Operator::Minus,
        start.clone(),
    )
}

/// Inclusive row limit expressed by a ROWNUM comparison.
///
/// Returns `Ok(None)` when `expression` is not a comparison of ROWNUM with a
/// numeric bound. `ROWNUM <= n` and `n >= ROWNUM` give `n`; `ROWNUM < n`
/// and `n > ROWNUM` give `n - 1` (never below zero).
pub fn rownum_limit(expression: &Expression) -> Result<Option<u32>> {
    let Some(operator) = expression.operator else {
        return Ok(None);
    };
    let (row_side, bound_side, exclusive) = match operator {
        Operator::LessOrEqual => (&expression.left, &expression.right, false),
        Operator::Less => (&expression.left, &expression.right, true),
        Operator::GreaterOrEqual => (&expression.right, &expression.left, false),
        Operator::Greater => (&expression.right, &expression.left, true),
        _ => return Ok(None),
    };
    let (row_side, bound_side) = match (row_side, bound_side) {
        (Some(row), Some(bound)) => (row, bound),
        (row, bound) => {
            if row.iter().chain(bound.iter()).any(is_rownum) {
                return Err(TailorError::InvalidReference(
                    "operand of ROWNUM comparison".into(),
                ));
            }
            return Ok(None);
        }
    };
    if !is_rownum(row_side) {
        return Ok(None);
    }
    let value = match term(bound_side) {
        Node::Literal(Literal::Integer(value)) => *value,
        Node::Literal(Literal::Float(value)) => integral(*value)?,
        _ => return Ok(None),
    };
    let limit = if exclusive && value > 0 { value - 1 } else { value };
    if limit < 0 || limit > i64::from(i32::MAX) {
        return Err(TailorError::NumericRange {
            value: limit.to_string(),
        });
    }
    Ok(Some(limit as u32))
}

fn integral(value: f64) -> Result<i64> {
    if !value.is_finite() || value.fract() != 0.0 || value.abs() > i64::from(i32::MAX) as f64 {
        return Err(TailorError::NumericRange {
            value: value.to_string(),
        });
    }
    Ok(value as i64)
}
