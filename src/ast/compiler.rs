/// Neutral tree → SQL compiler.
///
/// Serializes a (usually tailored) statement back into SQL text. Transparent
/// wrappers print their inner term; an operator expression that is the
/// operand of another operator expression is parenthesized. Identifiers keep
/// their quoting style.
use super::types::*;

/// Compile a statement into a SQL string.
pub fn compile(statement: &Statement) -> String {
    match statement {
        Statement::Select(s) => compile_select(s),
        Statement::Insert(i) => compile_insert(i),
        Statement::Update(u) => compile_update(u),
        Statement::Delete(d) => compile_delete(d),
    }
}

fn compile_select(select: &SelectStatement) -> String {
    let mut sql = compile_query(&select.query);
    if !select.order_by.is_empty() {
        let orders: Vec<String> = select.order_by.iter().map(compile_order_by).collect();
        sql.push_str(&format!(" ORDER BY {}", orders.join(", ")));
    }
    sql
}

fn compile_query(query: &QueryExpression) -> String {
    let mut parts = Vec::new();

    // SELECT [DISTINCT] [TOP n]
    let mut select_clause = String::from("SELECT ");
    if query.distinct {
        select_clause.push_str("DISTINCT ");
    }
    if let Some(top) = query.top {
        select_clause.push_str(&format!("TOP {} ", top));
    }
    if query.columns.is_empty() {
        select_clause.push('*');
    } else {
        let items: Vec<String> = query.columns.iter().map(compile_select_item).collect();
        select_clause.push_str(&items.join(", "));
    }
    parts.push(select_clause);

    if !query.from.is_empty() {
        let tables: Vec<String> = query.from.iter().map(compile_table).collect();
        parts.push(format!("FROM {}", tables.join(", ")));
    }

    for join in &query.joins {
        parts.push(compile_join(join));
    }

    if let Some(ref filter) = query.where_clause {
        parts.push(format!("WHERE {}", compile_node(filter)));
    }

    if let Some(ref group_by) = query.group_by {
        parts.push(format!("GROUP BY {}", compile_items(&group_by.items)));
    }

    if let Some(ref having) = query.having {
        parts.push(format!("HAVING {}", compile_node(having)));
    }

    if let Some(ref set_op) = query.set_op {
        let op_str = match set_op.op {
            SetOperator::Union => "UNION",
            SetOperator::Intersect => "INTERSECT",
            SetOperator::Except => "EXCEPT",
        };
        let all_str = if set_op.all { " ALL" } else { "" };
        parts.push(format!("{}{} {}", op_str, all_str, compile_query(&set_op.right)));
    }

    parts.join(" ")
}

fn compile_select_item(item: &AliasedItem) -> String {
    let expr_str = compile_node(&item.item);
    match &item.alias {
        Some(a) => format!("{} AS {}", expr_str, compile_identifier(a)),
        None => expr_str,
    }
}

fn compile_table(table: &Table) -> String {
    let mut s = match &table.source {
        TableSource::Named(name) => compile_db_object(name),
        TableSource::Derived(select) => format!("({})", compile_select(select)),
    };
    if let Some(ref alias) = table.alias {
        s.push_str(&format!(" AS {}", compile_identifier(alias)));
    }
    s
}

fn compile_join(join: &Join) -> String {
    let type_str = match join.kind {
        JoinKind::Inner => "JOIN",
        JoinKind::Left => "LEFT JOIN",
        JoinKind::Right => "RIGHT JOIN",
        JoinKind::Full => "FULL JOIN",
        JoinKind::Cross => "CROSS JOIN",
    };

    let condition_str = match &join.condition {
        Some(condition) => format!(" ON {}", compile_node(condition)),
        None => String::new(),
    };

    format!("{} {}{}", type_str, compile_table(&join.table), condition_str)
}

fn compile_order_by(order: &OrderExpression) -> String {
    let mut s = compile_node(&order.expression);
    match order.ascending {
        Some(true) => s.push_str(" ASC"),
        Some(false) => s.push_str(" DESC"),
        None => {}
    }
    s
}

fn compile_items(items: &[ExpressionItem]) -> String {
    items
        .iter()
        .map(|item| compile_node(&item.expression))
        .collect::<Vec<_>>()
        .join(", ")
}

fn compile_identifier(ident: &Identifier) -> String {
    match ident.quote {
        None => ident.name.clone(),
        Some(QuoteStyle::Double) => format!("\"{}\"", ident.name.replace('"', "\"\"")),
        Some(QuoteStyle::Bracket) => format!("[{}]", ident.name.replace(']', "]]")),
        Some(QuoteStyle::Backtick) => format!("`{}`", ident.name.replace('`', "``")),
    }
}

fn compile_db_object(object: &DbObject) -> String {
    object
        .parts
        .iter()
        .map(compile_identifier)
        .collect::<Vec<_>>()
        .join(".")
}

/// Compile a single expression-position node.
pub fn compile_node(node: &Node) -> String {
    match node {
        Node::Expression(expr) => compile_expression(expr),
        Node::FunctionCall(call) => {
            let distinct_str = if call.distinct { "DISTINCT " } else { "" };
            format!(
                "{}({}{})",
                call.name,
                distinct_str,
                compile_items(&call.arguments)
            )
        }
        Node::DbObject(object) => compile_db_object(object),
        Node::CaseExpression(case) => {
            let mut s = String::from("CASE");
            if let Some(ref operand) = case.operand {
                s.push_str(&format!(" {}", compile_node(operand)));
            }
            for alternative in &case.alternatives {
                s.push_str(&format!(
                    " WHEN {} THEN {}",
                    compile_node(&alternative.when),
                    compile_node(&alternative.then)
                ));
            }
            if let Some(ref else_result) = case.else_result {
                s.push_str(&format!(" ELSE {}", compile_node(else_result)));
            }
            s.push_str(" END");
            s
        }
        Node::ExtractFunction(extract) => format!(
            "EXTRACT({} FROM {})",
            extract.field.as_str(),
            compile_node(&extract.source)
        ),
        Node::Interval(interval) => {
            let value = match interval.value.term() {
                Node::Literal(Literal::Integer(i)) => format!("'{}'", i),
                other => compile_node(other),
            };
            format!("INTERVAL {} {}", value, interval.unit.as_str())
        }
        Node::SwitchFunction(switch) => format!("SWITCH({})", compile_items(&switch.arguments)),
        Node::TypeCast(cast) => format!(
            "CAST({} AS {})",
            compile_node(&cast.expression),
            cast.data_type
        ),
        Node::Range(range) => format!(
            "{} AND {}",
            compile_operand(&range.low),
            compile_operand(&range.high)
        ),
        Node::PatternExpression(pattern) => {
            let mut s = compile_operand(&pattern.pattern);
            if let Some(ref escape) = pattern.escape {
                s.push_str(&format!(" ESCAPE {}", compile_node(escape)));
            }
            s
        }
        Node::PredicateExpression(predicate) => format!("({})", compile_items(&predicate.items)),
        Node::Subquery(select) => format!("({})", compile_select(select)),
        Node::TableWildcard(wildcard) => match &wildcard.table {
            Some(table) => format!("{}.*", compile_db_object(table)),
            None => "*".to_string(),
        },
        Node::DateTimeUnit(unit) => unit.as_str().to_string(),
        Node::Literal(lit) => compile_literal(lit),
    }
}

fn compile_expression(expr: &Expression) -> String {
    let Some(op) = expr.operator else {
        return expr
            .left
            .as_ref()
            .or(expr.right.as_ref())
            .map(compile_node)
            .unwrap_or_default();
    };
    let op_str = compile_operator(op);
    match (&expr.left, &expr.right) {
        (Some(left), Some(right)) => format!(
            "{} {} {}",
            compile_operand(left),
            op_str,
            compile_operand(right)
        ),
        (None, Some(operand)) if op == Operator::Negate => {
            let operand = compile_operand(operand);
            // `--` would start a line comment.
            if operand.starts_with('-') {
                format!("- {}", operand)
            } else {
                format!("-{}", operand)
            }
        }
        (None, Some(operand)) => format!("{} {}", op_str, compile_operand(operand)),
        (Some(operand), None) => format!("{} {}", compile_operand(operand), op_str),
        (None, None) => op_str.to_string(),
    }
}

/// Operands that are themselves operator expressions get parentheses.
fn compile_operand(node: &Node) -> String {
    match node.term() {
        Node::Expression(expr) if !expr.is_wrapper() => format!("({})", compile_expression(expr)),
        term => compile_node(term),
    }
}

fn compile_operator(op: Operator) -> &'static str {
    match op {
        Operator::Plus => "+",
        Operator::Minus | Operator::Negate => "-",
        Operator::Multiply => "*",
        Operator::Divide => "/",
        Operator::Mod => "%",
        Operator::AccessMod => "MOD",
        Operator::StrConcat => "||",
        Operator::Equal => "=",
        Operator::NotEqual => "<>",
        Operator::Less => "<",
        Operator::LessOrEqual => "<=",
        Operator::Greater => ">",
        Operator::GreaterOrEqual => ">=",
        Operator::And => "AND",
        Operator::Or => "OR",
        Operator::Not => "NOT",
        Operator::IsNull => "IS NULL",
        Operator::IsNotNull => "IS NOT NULL",
        Operator::Like => "LIKE",
        Operator::NotLike => "NOT LIKE",
        Operator::In => "IN",
        Operator::NotIn => "NOT IN",
        Operator::Between => "BETWEEN",
        Operator::NotBetween => "NOT BETWEEN",
        Operator::Exists => "EXISTS",
    }
}

fn compile_literal(lit: &Literal) -> String {
    match lit {
        Literal::Null => "NULL".to_string(),
        Literal::Integer(i) => i.to_string(),
        Literal::Float(f) => format!("{}", f),
        Literal::String(s) => format!("'{}'", s.replace('\'', "''")),
        Literal::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S")),
    }
}

fn compile_insert(insert: &InsertStatement) -> String {
    let table = compile_table(&insert.table);
    let columns = if insert.columns.is_empty() {
        String::new()
    } else {
        let names: Vec<String> = insert.columns.iter().map(compile_db_object).collect();
        format!(" ({})", names.join(", "))
    };

    let source = match &insert.source {
        InsertSource::Values(rows) => {
            let row_strs: Vec<String> = rows
                .iter()
                .map(|row| format!("({})", compile_items(row)))
                .collect();
            format!("VALUES {}", row_strs.join(", "))
        }
        InsertSource::Query(q) => compile_select(q),
    };

    format!("INSERT INTO {}{} {}", table, columns, source)
}

fn compile_update(update: &UpdateStatement) -> String {
    let table = compile_table(&update.table);

    let sets: Vec<String> = update
        .assignments
        .iter()
        .map(|a| format!("{} = {}", compile_db_object(&a.column), compile_node(&a.value)))
        .collect();

    let filter = match &update.where_clause {
        Some(f) => format!(" WHERE {}", compile_node(f)),
        None => String::new(),
    };

    format!("UPDATE {} SET {}{}", table, sets.join(", "), filter)
}

fn compile_delete(delete: &DeleteStatement) -> String {
    let filter = match &delete.where_clause {
        Some(f) => format!(" WHERE {}", compile_node(f)),
        None => String::new(),
    };
    format!("DELETE FROM {}{}", compile_table(&delete.table), filter)
}
