/// Dialect tailors.
///
/// A tailor is a [`TracedVisitor`] that rewrites a dialect-neutral tree in
/// place so the compiled SQL is valid for one target engine. Translation is
/// all-or-nothing: the first rule error aborts the statement.
///
/// Pipeline:
///
/// ```text
/// SQL text ──parse──▶ Statement ──translate(tailor)──▶ Statement ──compile──▶ SQL text
/// ```
pub mod keywords;
pub mod sqlserver;
pub mod util;

use tracing::debug;

use crate::ast::ancestry::{Traced, TracedVisitor};
use crate::ast::types::*;
use crate::ast::visitor::walk_statement;
use crate::ast::{compile, parse_sql};
use crate::config::TailorConfig;
use crate::error::{Result, TailorError};

pub use keywords::Keyword;
pub use sqlserver::SqlServerTailor;

/// Shared contract of the dialect rule engines.
pub trait Tailor: TracedVisitor {
    /// Human-readable engine name used in diagnostics.
    fn dialect(&self) -> &'static str;

    /// Operator that modulo constructs are normalized to.
    fn mod_operator(&self) -> Operator;

    /// Call adding `number` units of `unit` to `date`.
    fn dateadd_call(&self, unit: DateTimeUnit, number: Node, date: Node) -> Result<Node>;

    /// Replacement for `EXTRACT(field FROM source)`.
    fn extract_call(&self, field: DateTimeUnit, source: Node) -> Node;

    /// `mod(a, b)` as `a <mod> b`.
    fn mod_call(&self, call: &mut FunctionCall) -> Result<Node> {
        if call.arguments.len() != 2 {
            return Err(TailorError::argument_count(
                Keyword::Mod.sql(),
                format!("expected 2 parameters, found {}", call.arguments.len()),
            ));
        }
        let mut arguments = call.arguments.drain(..).map(|item| item.expression);
        match (arguments.next(), arguments.next()) {
            (Some(left), Some(right)) => Ok(Node::binary(left, self.mod_operator(), right)),
            _ => Err(TailorError::InvalidReference("MOD operand".into())),
        }
    }

    /// Rewrite `date ± INTERVAL n unit` (or `INTERVAL n unit + date`) into
    /// an add-interval call. Returns `Ok(None)` when neither operand is an
    /// interval.
    fn interval_arithmetic(&self, expression: &mut Expression) -> Result<Option<Node>> {
        let is_interval = |side: &Option<Node>| {
            side.as_ref()
                .map(|node| matches!(util::term(node), Node::Interval(_)))
                .unwrap_or(false)
        };
        let (left_interval, right_interval) =
            (is_interval(&expression.left), is_interval(&expression.right));
        if !left_interval && !right_interval {
            return Ok(None);
        }
        let (interval, date, negate) = match (expression.operator, left_interval, right_interval) {
            (Some(Operator::Plus), false, true) => {
                (expression.right.take(), expression.left.take(), false)
            }
            (Some(Operator::Plus), true, false) => {
                (expression.left.take(), expression.right.take(), false)
            }
            (Some(Operator::Minus), false, true) => {
                (expression.right.take(), expression.left.take(), true)
            }
            _ => {
                return Err(TailorError::unsupported(
                    "INTERVAL outside date addition or subtraction",
                    self.dialect(),
                ))
            }
        };
        let (Some(interval), Some(date)) = (interval, date) else {
            return Err(TailorError::InvalidReference("interval arithmetic operand".into()));
        };
        let Node::Interval(interval) = util::into_term(interval) else {
            return Err(TailorError::StructuralMismatch("interval operand changed".into()));
        };
        let Interval { value, unit } = *interval;
        let number = if negate { negated(value)? } else { value };
        self.dateadd_call(unit, number, date).map(Some)
    }
}

fn negated(value: Node) -> Result<Node> {
    Ok(match util::into_term(value) {
        Node::Literal(Literal::Integer(n)) => match n.checked_neg() {
            Some(n) => Node::integer(n),
            None => {
                return Err(TailorError::NumericRange {
                    value: n.to_string(),
                })
            }
        },
        Node::Literal(Literal::Float(f)) => Node::Literal(Literal::Float(-f)),
        other => Node::prefix(Operator::Negate, other),
    })
}

/// Run `tailor` over one statement with parent tracking active.
pub fn translate<T: Tailor + ?Sized>(tailor: &mut T, statement: &mut Statement) -> Result<()> {
    debug!(dialect = tailor.dialect(), "translating statement");
    let mut traced = Traced::new(&mut *tailor);
    walk_statement(&mut traced, statement)?;
    traced.finish()?;
    debug!("statement translated");
    Ok(())
}

/// Parse, tailor and compile every statement in `sql`.
pub fn translate_sql(sql: &str, config: &TailorConfig) -> anyhow::Result<Vec<String>> {
    let mut tailor = config.tailor();
    parse_sql(sql)?
        .into_iter()
        .map(|mut statement| -> anyhow::Result<String> {
            translate(tailor.as_mut(), &mut statement)?;
            Ok(compile(&statement))
        })
        .collect()
}
