/// SQL → neutral tree parser.
///
/// Uses `sqlparser` as the parsing frontend and lowers its AST into our
/// node model. Every expression position that does not already hold an
/// operator expression gets a transparent wrapper, so rules that require an
/// enclosing expression see parsed input the same way as hand-built trees.
/// Operands of binary and unary operators are not wrapped; parentheses in
/// the source always are.
use anyhow::{anyhow, bail, Result};
use chrono::{NaiveDate, NaiveDateTime};
use sqlparser::ast as sp;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser as SqlParser;

use super::types::*;

/// Parse a SQL string into neutral statements.
pub fn parse_sql(sql: &str) -> Result<Vec<Statement>> {
    let dialect = GenericDialect {};
    let statements =
        SqlParser::parse_sql(&dialect, sql).map_err(|e| anyhow!("SQL parse error: {}", e))?;

    statements.into_iter().map(convert_statement).collect()
}

/// Parse a single SQL statement. Returns an error if the input contains
/// more than one statement.
pub fn parse_single(sql: &str) -> Result<Statement> {
    let mut statements = parse_sql(sql)?;
    if statements.len() != 1 {
        return Err(anyhow!("Expected 1 statement, found {}", statements.len()));
    }
    Ok(statements.remove(0))
}

/// Wrap `node` unless it already is an expression.
fn wrapped(node: Node) -> Node {
    match node {
        Node::Expression(_) => node,
        other => Node::wrap(other),
    }
}

fn convert_wrapped(expr: sp::Expr) -> Result<Node> {
    convert_expr(expr).map(wrapped)
}

fn convert_statement(stmt: sp::Statement) -> Result<Statement> {
    match stmt {
        sp::Statement::Query(q) => Ok(Statement::Select(convert_query(*q)?)),
        sp::Statement::Insert(insert) => convert_insert(insert),
        sp::Statement::Update {
            table,
            assignments,
            selection,
            ..
        } => convert_update(table, assignments, selection),
        sp::Statement::Delete(delete) => convert_delete(delete),
        other => bail!("Unsupported statement: {}", other),
    }
}

fn convert_query(query: sp::Query) -> Result<SelectStatement> {
    if query.with.is_some() {
        bail!("WITH clauses are not supported");
    }
    if query.offset.is_some() {
        bail!("OFFSET is not supported");
    }

    let mut body = convert_set_expr(*query.body)?;

    if let Some(limit) = query.limit {
        body.top = Some(convert_limit(limit)?);
    }

    let order_by = query
        .order_by
        .map(|ob| ob.exprs)
        .unwrap_or_default()
        .into_iter()
        .map(convert_order_by)
        .collect::<Result<Vec<_>>>()?;

    Ok(SelectStatement {
        query: body,
        order_by,
    })
}

/// `LIMIT n` becomes the row limit of the query.
fn convert_limit(limit: sp::Expr) -> Result<u32> {
    match limit {
        sp::Expr::Value(sp::Value::Number(n, _)) => n
            .parse::<u32>()
            .map_err(|_| anyhow!("LIMIT {} is out of range", n)),
        other => bail!("LIMIT must be an integer constant, found {}", other),
    }
}

fn convert_set_expr(expr: sp::SetExpr) -> Result<QueryExpression> {
    match expr {
        sp::SetExpr::Select(select) => convert_select(*select),
        sp::SetExpr::Query(query) => {
            let select = convert_query(*query)?;
            if !select.order_by.is_empty() {
                bail!("ORDER BY inside a set operation is not supported");
            }
            Ok(select.query)
        }
        sp::SetExpr::SetOperation {
            op,
            set_quantifier,
            left,
            right,
            ..
        } => {
            let mut left_query = convert_set_expr(*left)?;
            let right_query = convert_set_expr(*right)?;

            let all = matches!(
                set_quantifier,
                sp::SetQuantifier::All | sp::SetQuantifier::AllByName
            );

            let set_op = SetOperation {
                op: match op {
                    sp::SetOperator::Union => SetOperator::Union,
                    sp::SetOperator::Intersect => SetOperator::Intersect,
                    sp::SetOperator::Except => SetOperator::Except,
                },
                all,
                right: right_query,
            };

            append_set_op(&mut left_query, set_op);
            Ok(left_query)
        }
        other => bail!("Unsupported query body: {}", other),
    }
}

/// `a UNION b UNION c` chains onto the innermost right side.
fn append_set_op(query: &mut QueryExpression, set_op: SetOperation) {
    match query.set_op {
        Some(ref mut next) => append_set_op(&mut next.right, set_op),
        None => query.set_op = Some(Box::new(set_op)),
    }
}

fn convert_select(select: sp::Select) -> Result<QueryExpression> {
    let distinct = select.distinct.is_some();

    let columns = select
        .projection
        .into_iter()
        .map(convert_select_item)
        .collect::<Result<Vec<_>>>()?;

    let mut from = Vec::new();
    let mut joins = Vec::new();
    for twj in select.from {
        from.push(convert_table_factor(twj.relation)?);
        for join in twj.joins {
            joins.push(convert_join(join)?);
        }
    }

    let where_clause = select.selection.map(convert_wrapped).transpose()?;

    let group_by = match select.group_by {
        sp::GroupByExpr::Expressions(exprs, _modifiers) if exprs.is_empty() => None,
        sp::GroupByExpr::Expressions(exprs, _modifiers) => Some(GroupByClause {
            items: exprs
                .into_iter()
                .map(|e| convert_wrapped(e).map(ExpressionItem::new))
                .collect::<Result<Vec<_>>>()?,
        }),
        sp::GroupByExpr::All(_) => bail!("GROUP BY ALL is not supported"),
    };

    let having = select.having.map(convert_wrapped).transpose()?;

    Ok(QueryExpression {
        distinct,
        top: None,
        columns,
        from,
        joins,
        where_clause,
        group_by,
        having,
        set_op: None,
    })
}

fn convert_ident(ident: sp::Ident) -> Identifier {
    let quote = match ident.quote_style {
        Some('"') => Some(QuoteStyle::Double),
        Some('[') => Some(QuoteStyle::Bracket),
        Some('`') => Some(QuoteStyle::Backtick),
        _ => None,
    };
    Identifier {
        name: ident.value,
        quote,
    }
}

fn convert_object_name(name: sp::ObjectName) -> Result<DbObject> {
    if name.0.is_empty() {
        bail!("Empty object name");
    }
    Ok(DbObject {
        parts: name.0.into_iter().map(convert_ident).collect(),
    })
}

fn convert_table_factor(tf: sp::TableFactor) -> Result<Table> {
    match tf {
        sp::TableFactor::Table { name, alias, .. } => Ok(Table {
            source: TableSource::Named(convert_object_name(name)?),
            alias: alias.map(|a| convert_ident(a.name)),
        }),
        sp::TableFactor::Derived {
            subquery, alias, ..
        } => Ok(Table {
            source: TableSource::Derived(Box::new(convert_query(*subquery)?)),
            alias: alias.map(|a| convert_ident(a.name)),
        }),
        other => bail!("Unsupported table reference: {}", other),
    }
}

fn convert_join(join: sp::Join) -> Result<Join> {
    let (kind, constraint) = match join.join_operator {
        sp::JoinOperator::Inner(c) => (JoinKind::Inner, Some(c)),
        sp::JoinOperator::LeftOuter(c) => (JoinKind::Left, Some(c)),
        sp::JoinOperator::RightOuter(c) => (JoinKind::Right, Some(c)),
        sp::JoinOperator::FullOuter(c) => (JoinKind::Full, Some(c)),
        sp::JoinOperator::CrossJoin => (JoinKind::Cross, None),
        other => bail!("Unsupported join: {:?}", other),
    };

    let condition = match constraint {
        Some(sp::JoinConstraint::On(expr)) => Some(convert_wrapped(expr)?),
        Some(sp::JoinConstraint::None) | None => None,
        Some(other) => bail!("Unsupported join constraint: {:?}", other),
    };

    Ok(Join {
        kind,
        table: convert_table_factor(join.relation)?,
        condition,
    })
}

fn convert_select_item(item: sp::SelectItem) -> Result<AliasedItem> {
    match item {
        sp::SelectItem::UnnamedExpr(expr) => Ok(AliasedItem {
            item: convert_wrapped(expr)?,
            alias: None,
        }),
        sp::SelectItem::ExprWithAlias { expr, alias } => Ok(AliasedItem {
            item: convert_wrapped(expr)?,
            alias: Some(convert_ident(alias)),
        }),
        sp::SelectItem::Wildcard(_) => Ok(AliasedItem {
            item: Node::TableWildcard(TableWildcard::default()),
            alias: None,
        }),
        sp::SelectItem::QualifiedWildcard(name, _) => Ok(AliasedItem {
            item: Node::TableWildcard(TableWildcard {
                table: Some(convert_object_name(name)?),
            }),
            alias: None,
        }),
    }
}

fn convert_expr(expr: sp::Expr) -> Result<Node> {
    match expr {
        sp::Expr::Identifier(ident) => Ok(Node::DbObject(DbObject::new(convert_ident(ident)))),
        sp::Expr::CompoundIdentifier(parts) => Ok(Node::DbObject(DbObject {
            parts: parts.into_iter().map(convert_ident).collect(),
        })),
        sp::Expr::Value(val) => convert_value(val),
        sp::Expr::BinaryOp { left, op, right } => Ok(Node::binary(
            convert_expr(*left)?,
            convert_binary_op(op)?,
            convert_expr(*right)?,
        )),
        sp::Expr::UnaryOp { op, expr } => convert_unary(op, *expr),
        sp::Expr::Nested(expr) => Ok(Node::wrap(convert_expr(*expr)?)),
        sp::Expr::Function(func) => convert_function(func),
        sp::Expr::Case {
            operand,
            conditions,
            results,
            else_result,
        } => {
            let alternatives = conditions
                .into_iter()
                .zip(results)
                .map(|(c, r)| {
                    Ok(CaseAlternative {
                        when: convert_wrapped(c)?,
                        then: convert_wrapped(r)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Node::CaseExpression(Box::new(CaseExpression {
                operand: operand.map(|o| convert_wrapped(*o)).transpose()?,
                alternatives,
                else_result: else_result.map(|e| convert_wrapped(*e)).transpose()?,
            })))
        }
        sp::Expr::Subquery(q) => Ok(Node::Subquery(Box::new(convert_query(*q)?))),
        sp::Expr::Exists { subquery, negated } => {
            let exists = Node::prefix(
                Operator::Exists,
                Node::Subquery(Box::new(convert_query(*subquery)?)),
            );
            if negated {
                Ok(Node::prefix(Operator::Not, exists))
            } else {
                Ok(exists)
            }
        }
        sp::Expr::InList {
            expr,
            list,
            negated,
        } => {
            let items = list
                .into_iter()
                .map(|e| convert_wrapped(e).map(ExpressionItem::new))
                .collect::<Result<Vec<_>>>()?;
            Ok(Node::binary(
                convert_expr(*expr)?,
                if negated { Operator::NotIn } else { Operator::In },
                Node::PredicateExpression(PredicateExpression { items }),
            ))
        }
        sp::Expr::InSubquery {
            expr,
            subquery,
            negated,
        } => Ok(Node::binary(
            convert_expr(*expr)?,
            if negated { Operator::NotIn } else { Operator::In },
            Node::Subquery(Box::new(convert_query(*subquery)?)),
        )),
        sp::Expr::Between {
            expr,
            negated,
            low,
            high,
        } => Ok(Node::binary(
            convert_expr(*expr)?,
            if negated {
                Operator::NotBetween
            } else {
                Operator::Between
            },
            Node::Range(Box::new(Range {
                low: convert_wrapped(*low)?,
                high: convert_wrapped(*high)?,
            })),
        )),
        sp::Expr::Like {
            negated,
            expr,
            pattern,
            escape_char,
            ..
        } => Ok(Node::binary(
            convert_expr(*expr)?,
            if negated {
                Operator::NotLike
            } else {
                Operator::Like
            },
            Node::PatternExpression(Box::new(PatternExpression {
                pattern: convert_wrapped(*pattern)?,
                escape: escape_char.map(|c| Node::string(c.to_string())),
            })),
        )),
        sp::Expr::IsNull(expr) => Ok(Node::postfix(convert_expr(*expr)?, Operator::IsNull)),
        sp::Expr::IsNotNull(expr) => Ok(Node::postfix(convert_expr(*expr)?, Operator::IsNotNull)),
        sp::Expr::Cast {
            expr, data_type, ..
        } => Ok(Node::TypeCast(Box::new(TypeCast {
            expression: convert_wrapped(*expr)?,
            data_type: data_type.to_string(),
        }))),
        sp::Expr::Extract { field, expr, .. } => {
            Ok(Node::ExtractFunction(Box::new(ExtractFunction {
                field: convert_datetime_field(field)?,
                source: convert_wrapped(*expr)?,
            })))
        }
        sp::Expr::Interval(interval) => {
            let unit = match interval.leading_field {
                Some(field) => convert_datetime_field(field)?,
                None => bail!("INTERVAL without a unit is not supported"),
            };
            Ok(Node::Interval(Box::new(Interval {
                value: convert_interval_value(*interval.value)?,
                unit,
            })))
        }
        sp::Expr::Substring {
            expr,
            substring_from,
            substring_for,
            ..
        } => {
            let mut call = FunctionCall::new("SUBSTRING").with_argument(convert_wrapped(*expr)?);
            if let Some(from) = substring_from {
                call.push_argument(convert_wrapped(*from)?);
            }
            if let Some(length) = substring_for {
                call.push_argument(convert_wrapped(*length)?);
            }
            Ok(Node::FunctionCall(call))
        }
        sp::Expr::TypedString { data_type, value } => {
            convert_typed_string(data_type, value.to_string())
        }
        other => bail!("Unsupported expression: {}", other),
    }
}

fn convert_unary(op: sp::UnaryOperator, expr: sp::Expr) -> Result<Node> {
    match (op, expr) {
        (sp::UnaryOperator::Minus, sp::Expr::Value(sp::Value::Number(n, _))) => {
            convert_value(sp::Value::Number(format!("-{}", n), false))
        }
        (sp::UnaryOperator::Minus, expr) => Ok(Node::prefix(Operator::Negate, convert_expr(expr)?)),
        (sp::UnaryOperator::Plus, expr) => convert_expr(expr),
        (sp::UnaryOperator::Not, expr) => Ok(Node::prefix(Operator::Not, convert_expr(expr)?)),
        (op, _) => bail!("Unsupported unary operator: {:?}", op),
    }
}

fn convert_datetime_field(field: sp::DateTimeField) -> Result<DateTimeUnit> {
    match field {
        sp::DateTimeField::Year => Ok(DateTimeUnit::Year),
        sp::DateTimeField::Month => Ok(DateTimeUnit::Month),
        sp::DateTimeField::Day => Ok(DateTimeUnit::Day),
        sp::DateTimeField::Hour => Ok(DateTimeUnit::Hour),
        sp::DateTimeField::Minute => Ok(DateTimeUnit::Minute),
        sp::DateTimeField::Second => Ok(DateTimeUnit::Second),
        other => bail!("Unsupported date/time field: {}", other),
    }
}

/// `INTERVAL '5' DAY` carries its amount as a string; use the number.
fn convert_interval_value(value: sp::Expr) -> Result<Node> {
    match value {
        sp::Expr::Value(sp::Value::SingleQuotedString(s)) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                Ok(Node::integer(i))
            } else if let Ok(f) = trimmed.parse::<f64>() {
                Ok(Node::Literal(Literal::Float(f)))
            } else {
                bail!("Unsupported INTERVAL amount '{}'", s)
            }
        }
        other => convert_expr(other),
    }
}

fn convert_typed_string(data_type: sp::DataType, value: String) -> Result<Node> {
    let text = value.trim_matches('\'');
    match data_type {
        sp::DataType::Timestamp(..) | sp::DataType::Datetime(..) | sp::DataType::Date => {
            Ok(Node::Literal(Literal::DateTime(parse_datetime(text)?)))
        }
        other => Ok(Node::TypeCast(Box::new(TypeCast {
            expression: Node::wrap(Node::string(text)),
            data_type: other.to_string(),
        }))),
    }
}

fn parse_datetime(text: &str) -> Result<NaiveDateTime> {
    if let Ok(value) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(value);
    }
    if let Ok(value) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Ok(value);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow!("Invalid date/time literal '{}'", text))
}

fn convert_value(val: sp::Value) -> Result<Node> {
    match val {
        sp::Value::Null => Ok(Node::null()),
        sp::Value::Boolean(b) => Ok(Node::integer(i64::from(b))),
        sp::Value::Number(n, _) => {
            if let Ok(i) = n.parse::<i64>() {
                Ok(Node::integer(i))
            } else if let Ok(f) = n.parse::<f64>() {
                Ok(Node::Literal(Literal::Float(f)))
            } else {
                bail!("Invalid number {}", n)
            }
        }
        sp::Value::SingleQuotedString(s) => Ok(Node::string(s)),
        other => bail!("Unsupported literal: {}", other),
    }
}

fn convert_binary_op(op: sp::BinaryOperator) -> Result<Operator> {
    match op {
        sp::BinaryOperator::Eq => Ok(Operator::Equal),
        sp::BinaryOperator::NotEq => Ok(Operator::NotEqual),
        sp::BinaryOperator::Lt => Ok(Operator::Less),
        sp::BinaryOperator::LtEq => Ok(Operator::LessOrEqual),
        sp::BinaryOperator::Gt => Ok(Operator::Greater),
        sp::BinaryOperator::GtEq => Ok(Operator::GreaterOrEqual),
        sp::BinaryOperator::And => Ok(Operator::And),
        sp::BinaryOperator::Or => Ok(Operator::Or),
        sp::BinaryOperator::Plus => Ok(Operator::Plus),
        sp::BinaryOperator::Minus => Ok(Operator::Minus),
        sp::BinaryOperator::Multiply => Ok(Operator::Multiply),
        sp::BinaryOperator::Divide => Ok(Operator::Divide),
        sp::BinaryOperator::Modulo => Ok(Operator::Mod),
        sp::BinaryOperator::StringConcat => Ok(Operator::StrConcat),
        _ => Err(anyhow!("Unsupported binary operator: {:?}", op)),
    }
}

fn convert_function(func: sp::Function) -> Result<Node> {
    if func.over.is_some() {
        bail!("Window functions are not supported");
    }
    let name = func.name.to_string();

    let (arguments, distinct) = match func.args {
        sp::FunctionArguments::List(arg_list) => {
            let distinct = matches!(
                arg_list.duplicate_treatment,
                Some(sp::DuplicateTreatment::Distinct)
            );
            let arguments = arg_list
                .args
                .into_iter()
                .map(convert_function_arg)
                .collect::<Result<Vec<_>>>()?;
            (arguments, distinct)
        }
        sp::FunctionArguments::None => (vec![], false),
        sp::FunctionArguments::Subquery(q) => (
            vec![ExpressionItem::new(Node::wrap(Node::Subquery(Box::new(
                convert_query(*q)?,
            ))))],
            false,
        ),
    };

    if name.eq_ignore_ascii_case("switch") {
        return Ok(Node::SwitchFunction(SwitchFunction { arguments }));
    }

    Ok(Node::FunctionCall(FunctionCall {
        name,
        arguments,
        distinct,
    }))
}

fn convert_function_arg(arg: sp::FunctionArg) -> Result<ExpressionItem> {
    let expr = match arg {
        sp::FunctionArg::Unnamed(e) => e,
        sp::FunctionArg::Named { arg, .. } => arg,
        other => bail!("Unsupported function argument: {}", other),
    };
    let node = match expr {
        sp::FunctionArgExpr::Expr(e) => convert_wrapped(e)?,
        sp::FunctionArgExpr::Wildcard => Node::TableWildcard(TableWildcard::default()),
        sp::FunctionArgExpr::QualifiedWildcard(name) => Node::TableWildcard(TableWildcard {
            table: Some(convert_object_name(name)?),
        }),
    };
    Ok(ExpressionItem::new(node))
}

fn convert_order_by(order: sp::OrderByExpr) -> Result<OrderExpression> {
    Ok(OrderExpression {
        expression: convert_wrapped(order.expr)?,
        ascending: order.asc,
    })
}

fn convert_insert(insert: sp::Insert) -> Result<Statement> {
    let table = Table::named(convert_object_name(insert.table_name)?);

    let columns = insert
        .columns
        .into_iter()
        .map(|c| DbObject::new(convert_ident(c)))
        .collect();

    let source = match insert.source {
        Some(src) => match *src.body {
            sp::SetExpr::Values(values) => {
                let rows = values
                    .rows
                    .into_iter()
                    .map(|row| {
                        row.into_iter()
                            .map(|e| convert_wrapped(e).map(ExpressionItem::new))
                            .collect::<Result<Vec<_>>>()
                    })
                    .collect::<Result<Vec<_>>>()?;
                InsertSource::Values(rows)
            }
            other => InsertSource::Query(Box::new(SelectStatement {
                query: convert_set_expr(other)?,
                order_by: vec![],
            })),
        },
        None => bail!("INSERT without VALUES or query"),
    };

    Ok(Statement::Insert(InsertStatement {
        table,
        columns,
        source,
    }))
}

fn convert_update(
    table: sp::TableWithJoins,
    assignments: Vec<sp::Assignment>,
    selection: Option<sp::Expr>,
) -> Result<Statement> {
    let table = convert_table_factor(table.relation)?;

    let assignments = assignments
        .into_iter()
        .map(|a| {
            let column = match a.target {
                sp::AssignmentTarget::ColumnName(name) => convert_object_name(name)?,
                other => bail!("Unsupported assignment target: {:?}", other),
            };
            Ok(Assignment {
                column,
                value: convert_wrapped(a.value)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let where_clause = selection.map(convert_wrapped).transpose()?;

    Ok(Statement::Update(UpdateStatement {
        table,
        assignments,
        where_clause,
    }))
}

fn convert_delete(delete: sp::Delete) -> Result<Statement> {
    let from_tables = match delete.from {
        sp::FromTable::WithFromKeyword(tables) => tables,
        sp::FromTable::WithoutKeyword(tables) => tables,
    };

    let table = match from_tables.into_iter().next() {
        Some(twj) => convert_table_factor(twj.relation)?,
        None => bail!("DELETE without table reference"),
    };

    let where_clause = delete.selection.map(convert_wrapped).transpose()?;

    Ok(Statement::Delete(DeleteStatement {
        table,
        where_clause,
    }))
}
