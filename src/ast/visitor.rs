/// Mutable traversal of a statement tree.
///
/// The `walk_*` functions visit every reachable node exactly once. Each
/// non-terminal node gets a [`Visitor::before`] call before its children are
/// walked and a [`Visitor::after`] call once all of them are done; terminal
/// kinds (identifiers, operators, literals, date/time units) get a single
/// [`Visitor::visit_leaf`] call. Before walking each child the walker
/// announces which slot of the current node it is about to enter.
///
/// Order is fixed: statement, then clauses in declaration order, expression
/// trees left to right (left operand, operator, right operand), argument
/// lists in list order.
///
/// `after` and `visit_leaf` return an [`Action`]. [`Action::Replace`] makes
/// the walker overwrite the slot that holds the node, after the node's own
/// subtree has been visited. The replacement is not visited again.
use super::types::*;
use crate::error::{Result, TailorError};

/// Outcome of a hook.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Action {
    #[default]
    Keep,
    /// Overwrite the slot currently holding the node.
    Replace(Node),
}

/// Non-terminal node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    SelectStatement,
    InsertStatement,
    UpdateStatement,
    DeleteStatement,
    QueryExpression,
    AliasedItem,
    Table,
    Join,
    OrderExpression,
    GroupByClause,
    Assignment,
    ExpressionItem,
    CaseAlternative,
    Expression,
    FunctionCall,
    DbObject,
    CaseExpression,
    ExtractFunction,
    Interval,
    SwitchFunction,
    TypeCast,
    Range,
    PatternExpression,
    PredicateExpression,
    TableWildcard,
}

/// Position of a child inside its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Left,
    Operator,
    Right,
    /// Positional element of a list (arguments, select list, rows, name parts).
    Item(usize),
    Table(usize),
    Join(usize),
    OrderBy(usize),
    Query,
    Name,
    Alias,
    Where,
    GroupBy,
    Having,
    SetOperation,
    Condition,
    Column,
    Value,
    Operand,
    When,
    Then,
    Else,
    Field,
    Source,
    Low,
    High,
    Pattern,
    Escape,
}

/// Mutable handle on a non-terminal node.
#[derive(Debug)]
pub enum NodeMut<'a> {
    SelectStatement(&'a mut SelectStatement),
    InsertStatement(&'a mut InsertStatement),
    UpdateStatement(&'a mut UpdateStatement),
    DeleteStatement(&'a mut DeleteStatement),
    QueryExpression(&'a mut QueryExpression),
    AliasedItem(&'a mut AliasedItem),
    Table(&'a mut Table),
    Join(&'a mut Join),
    OrderExpression(&'a mut OrderExpression),
    GroupByClause(&'a mut GroupByClause),
    Assignment(&'a mut Assignment),
    ExpressionItem(&'a mut ExpressionItem),
    CaseAlternative(&'a mut CaseAlternative),
    Expression(&'a mut Expression),
    FunctionCall(&'a mut FunctionCall),
    DbObject(&'a mut DbObject),
    CaseExpression(&'a mut CaseExpression),
    ExtractFunction(&'a mut ExtractFunction),
    Interval(&'a mut Interval),
    SwitchFunction(&'a mut SwitchFunction),
    TypeCast(&'a mut TypeCast),
    Range(&'a mut Range),
    PatternExpression(&'a mut PatternExpression),
    PredicateExpression(&'a mut PredicateExpression),
    TableWildcard(&'a mut TableWildcard),
}

/// Mutable handle on a terminal node.
#[derive(Debug)]
pub enum LeafMut<'a> {
    Identifier(&'a mut Identifier),
    Operator(&'a mut Operator),
    Literal(&'a mut Literal),
    DateTimeUnit(&'a mut DateTimeUnit),
}

fn address<T>(node: &T) -> usize {
    node as *const T as usize
}

impl NodeMut<'_> {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeMut::SelectStatement(_) => NodeKind::SelectStatement,
            NodeMut::InsertStatement(_) => NodeKind::InsertStatement,
            NodeMut::UpdateStatement(_) => NodeKind::UpdateStatement,
            NodeMut::DeleteStatement(_) => NodeKind::DeleteStatement,
            NodeMut::QueryExpression(_) => NodeKind::QueryExpression,
            NodeMut::AliasedItem(_) => NodeKind::AliasedItem,
            NodeMut::Table(_) => NodeKind::Table,
            NodeMut::Join(_) => NodeKind::Join,
            NodeMut::OrderExpression(_) => NodeKind::OrderExpression,
            NodeMut::GroupByClause(_) => NodeKind::GroupByClause,
            NodeMut::Assignment(_) => NodeKind::Assignment,
            NodeMut::ExpressionItem(_) => NodeKind::ExpressionItem,
            NodeMut::CaseAlternative(_) => NodeKind::CaseAlternative,
            NodeMut::Expression(_) => NodeKind::Expression,
            NodeMut::FunctionCall(_) => NodeKind::FunctionCall,
            NodeMut::DbObject(_) => NodeKind::DbObject,
            NodeMut::CaseExpression(_) => NodeKind::CaseExpression,
            NodeMut::ExtractFunction(_) => NodeKind::ExtractFunction,
            NodeMut::Interval(_) => NodeKind::Interval,
            NodeMut::SwitchFunction(_) => NodeKind::SwitchFunction,
            NodeMut::TypeCast(_) => NodeKind::TypeCast,
            NodeMut::Range(_) => NodeKind::Range,
            NodeMut::PatternExpression(_) => NodeKind::PatternExpression,
            NodeMut::PredicateExpression(_) => NodeKind::PredicateExpression,
            NodeMut::TableWildcard(_) => NodeKind::TableWildcard,
        }
    }

    /// Memory address of the node, stable while the walker is inside it.
    pub fn addr(&self) -> usize {
        match self {
            NodeMut::SelectStatement(n) => address(&**n),
            NodeMut::InsertStatement(n) => address(&**n),
            NodeMut::UpdateStatement(n) => address(&**n),
            NodeMut::DeleteStatement(n) => address(&**n),
            NodeMut::QueryExpression(n) => address(&**n),
            NodeMut::AliasedItem(n) => address(&**n),
            NodeMut::Table(n) => address(&**n),
            NodeMut::Join(n) => address(&**n),
            NodeMut::OrderExpression(n) => address(&**n),
            NodeMut::GroupByClause(n) => address(&**n),
            NodeMut::Assignment(n) => address(&**n),
            NodeMut::ExpressionItem(n) => address(&**n),
            NodeMut::CaseAlternative(n) => address(&**n),
            NodeMut::Expression(n) => address(&**n),
            NodeMut::FunctionCall(n) => address(&**n),
            NodeMut::DbObject(n) => address(&**n),
            NodeMut::CaseExpression(n) => address(&**n),
            NodeMut::ExtractFunction(n) => address(&**n),
            NodeMut::Interval(n) => address(&**n),
            NodeMut::SwitchFunction(n) => address(&**n),
            NodeMut::TypeCast(n) => address(&**n),
            NodeMut::Range(n) => address(&**n),
            NodeMut::PatternExpression(n) => address(&**n),
            NodeMut::PredicateExpression(n) => address(&**n),
            NodeMut::TableWildcard(n) => address(&**n),
        }
    }
}

/// Hooks invoked by the walker. Every method defaults to a no-op, so a
/// visitor only matches on the node kinds it cares about.
pub trait Visitor {
    fn before(&mut self, _node: NodeMut<'_>) -> Result<()> {
        Ok(())
    }

    fn after(&mut self, _node: NodeMut<'_>) -> Result<Action> {
        Ok(Action::Keep)
    }

    fn visit_leaf(&mut self, _leaf: LeafMut<'_>) -> Result<Action> {
        Ok(Action::Keep)
    }

    /// Called right before the walker descends into `slot` of the node
    /// whose `before` hook ran last without a matching `after`.
    fn enter_slot(&mut self, _slot: Slot) {}
}

/// Only nodes held in a [`Node`] slot can be replaced.
fn keep(action: Action, kind: &str) -> Result<()> {
    match action {
        Action::Keep => Ok(()),
        Action::Replace(_) => Err(TailorError::StructuralMismatch(format!(
            "{} cannot be replaced in this position",
            kind
        ))),
    }
}

pub fn walk_statement<V: Visitor + ?Sized>(v: &mut V, statement: &mut Statement) -> Result<()> {
    match statement {
        Statement::Select(select) => keep(walk_select_statement(v, select)?, "select statement"),
        Statement::Insert(insert) => walk_insert_statement(v, insert),
        Statement::Update(update) => walk_update_statement(v, update),
        Statement::Delete(delete) => walk_delete_statement(v, delete),
    }
}

pub fn walk_select_statement<V: Visitor + ?Sized>(
    v: &mut V,
    node: &mut SelectStatement,
) -> Result<Action> {
    v.before(NodeMut::SelectStatement(&mut *node))?;
    v.enter_slot(Slot::Query);
    walk_query_expression(v, &mut node.query)?;
    for (i, order) in node.order_by.iter_mut().enumerate() {
        v.enter_slot(Slot::OrderBy(i));
        walk_order_expression(v, order)?;
    }
    v.after(NodeMut::SelectStatement(node))
}

fn walk_insert_statement<V: Visitor + ?Sized>(v: &mut V, node: &mut InsertStatement) -> Result<()> {
    v.before(NodeMut::InsertStatement(&mut *node))?;
    v.enter_slot(Slot::Table(0));
    walk_table(v, &mut node.table)?;
    for column in node.columns.iter_mut() {
        v.enter_slot(Slot::Column);
        keep(walk_db_object(v, column)?, "insert column")?;
    }
    match &mut node.source {
        InsertSource::Values(rows) => {
            let mut position = 0;
            for row in rows.iter_mut() {
                for item in row.iter_mut() {
                    v.enter_slot(Slot::Item(position));
                    walk_expression_item(v, item)?;
                    position += 1;
                }
            }
        }
        InsertSource::Query(select) => {
            v.enter_slot(Slot::Query);
            keep(walk_select_statement(v, select)?, "insert query")?;
        }
    }
    keep(v.after(NodeMut::InsertStatement(node))?, "insert statement")
}

fn walk_update_statement<V: Visitor + ?Sized>(v: &mut V, node: &mut UpdateStatement) -> Result<()> {
    v.before(NodeMut::UpdateStatement(&mut *node))?;
    v.enter_slot(Slot::Table(0));
    walk_table(v, &mut node.table)?;
    for (i, assignment) in node.assignments.iter_mut().enumerate() {
        v.enter_slot(Slot::Item(i));
        walk_assignment(v, assignment)?;
    }
    if let Some(filter) = node.where_clause.as_mut() {
        v.enter_slot(Slot::Where);
        walk_node(v, filter)?;
    }
    keep(v.after(NodeMut::UpdateStatement(node))?, "update statement")
}

fn walk_delete_statement<V: Visitor + ?Sized>(v: &mut V, node: &mut DeleteStatement) -> Result<()> {
    v.before(NodeMut::DeleteStatement(&mut *node))?;
    v.enter_slot(Slot::Table(0));
    walk_table(v, &mut node.table)?;
    if let Some(filter) = node.where_clause.as_mut() {
        v.enter_slot(Slot::Where);
        walk_node(v, filter)?;
    }
    keep(v.after(NodeMut::DeleteStatement(node))?, "delete statement")
}

fn walk_query_expression<V: Visitor + ?Sized>(v: &mut V, node: &mut QueryExpression) -> Result<()> {
    v.before(NodeMut::QueryExpression(&mut *node))?;
    for (i, column) in node.columns.iter_mut().enumerate() {
        v.enter_slot(Slot::Item(i));
        walk_aliased_item(v, column)?;
    }
    for (i, table) in node.from.iter_mut().enumerate() {
        v.enter_slot(Slot::Table(i));
        walk_table(v, table)?;
    }
    for (i, join) in node.joins.iter_mut().enumerate() {
        v.enter_slot(Slot::Join(i));
        walk_join(v, join)?;
    }
    if let Some(filter) = node.where_clause.as_mut() {
        v.enter_slot(Slot::Where);
        walk_node(v, filter)?;
    }
    if let Some(group_by) = node.group_by.as_mut() {
        v.enter_slot(Slot::GroupBy);
        walk_group_by(v, group_by)?;
    }
    if let Some(having) = node.having.as_mut() {
        v.enter_slot(Slot::Having);
        walk_node(v, having)?;
    }
    if let Some(set_op) = node.set_op.as_mut() {
        v.enter_slot(Slot::SetOperation);
        walk_query_expression(v, &mut set_op.right)?;
    }
    keep(v.after(NodeMut::QueryExpression(node))?, "query expression")
}

fn walk_aliased_item<V: Visitor + ?Sized>(v: &mut V, node: &mut AliasedItem) -> Result<()> {
    v.before(NodeMut::AliasedItem(&mut *node))?;
    v.enter_slot(Slot::Value);
    walk_node(v, &mut node.item)?;
    if let Some(alias) = node.alias.as_mut() {
        v.enter_slot(Slot::Alias);
        visit_identifier(v, alias)?;
    }
    keep(v.after(NodeMut::AliasedItem(node))?, "select item")
}

fn walk_table<V: Visitor + ?Sized>(v: &mut V, node: &mut Table) -> Result<()> {
    v.before(NodeMut::Table(&mut *node))?;
    match &mut node.source {
        TableSource::Named(name) => {
            v.enter_slot(Slot::Name);
            keep(walk_db_object(v, name)?, "table name")?;
        }
        TableSource::Derived(select) => {
            v.enter_slot(Slot::Query);
            keep(walk_select_statement(v, select)?, "derived table")?;
        }
    }
    if let Some(alias) = node.alias.as_mut() {
        v.enter_slot(Slot::Alias);
        visit_identifier(v, alias)?;
    }
    keep(v.after(NodeMut::Table(node))?, "table")
}

fn walk_join<V: Visitor + ?Sized>(v: &mut V, node: &mut Join) -> Result<()> {
    v.before(NodeMut::Join(&mut *node))?;
    v.enter_slot(Slot::Table(0));
    walk_table(v, &mut node.table)?;
    if let Some(condition) = node.condition.as_mut() {
        v.enter_slot(Slot::Condition);
        walk_node(v, condition)?;
    }
    keep(v.after(NodeMut::Join(node))?, "join")
}

fn walk_order_expression<V: Visitor + ?Sized>(v: &mut V, node: &mut OrderExpression) -> Result<()> {
    v.before(NodeMut::OrderExpression(&mut *node))?;
    v.enter_slot(Slot::Value);
    walk_node(v, &mut node.expression)?;
    keep(v.after(NodeMut::OrderExpression(node))?, "order expression")
}

fn walk_group_by<V: Visitor + ?Sized>(v: &mut V, node: &mut GroupByClause) -> Result<()> {
    v.before(NodeMut::GroupByClause(&mut *node))?;
    walk_items(v, &mut node.items)?;
    keep(v.after(NodeMut::GroupByClause(node))?, "group by clause")
}

fn walk_assignment<V: Visitor + ?Sized>(v: &mut V, node: &mut Assignment) -> Result<()> {
    v.before(NodeMut::Assignment(&mut *node))?;
    v.enter_slot(Slot::Column);
    keep(walk_db_object(v, &mut node.column)?, "assignment target")?;
    v.enter_slot(Slot::Value);
    walk_node(v, &mut node.value)?;
    keep(v.after(NodeMut::Assignment(node))?, "assignment")
}

fn walk_items<V: Visitor + ?Sized>(v: &mut V, items: &mut [ExpressionItem]) -> Result<()> {
    for (i, item) in items.iter_mut().enumerate() {
        v.enter_slot(Slot::Item(i));
        walk_expression_item(v, item)?;
    }
    Ok(())
}

fn walk_expression_item<V: Visitor + ?Sized>(v: &mut V, node: &mut ExpressionItem) -> Result<()> {
    v.before(NodeMut::ExpressionItem(&mut *node))?;
    v.enter_slot(Slot::Value);
    walk_node(v, &mut node.expression)?;
    keep(v.after(NodeMut::ExpressionItem(node))?, "list item")
}

fn walk_case_alternative<V: Visitor + ?Sized>(v: &mut V, node: &mut CaseAlternative) -> Result<()> {
    v.before(NodeMut::CaseAlternative(&mut *node))?;
    v.enter_slot(Slot::When);
    walk_node(v, &mut node.when)?;
    v.enter_slot(Slot::Then);
    walk_node(v, &mut node.then)?;
    keep(v.after(NodeMut::CaseAlternative(node))?, "case alternative")
}

fn visit_identifier<V: Visitor + ?Sized>(v: &mut V, identifier: &mut Identifier) -> Result<()> {
    keep(v.visit_leaf(LeafMut::Identifier(identifier))?, "identifier")
}

/// Walk whatever occupies an expression slot, replacing it when a hook asks to.
pub fn walk_node<V: Visitor + ?Sized>(v: &mut V, node: &mut Node) -> Result<()> {
    let action = match node {
        Node::Expression(expr) => walk_expression(v, expr)?,
        Node::FunctionCall(call) => walk_function_call(v, call)?,
        Node::DbObject(object) => walk_db_object(v, object)?,
        Node::CaseExpression(case) => walk_case_expression(v, case)?,
        Node::ExtractFunction(extract) => walk_extract_function(v, extract)?,
        Node::Interval(interval) => walk_interval(v, interval)?,
        Node::SwitchFunction(switch) => walk_switch_function(v, switch)?,
        Node::TypeCast(cast) => walk_type_cast(v, cast)?,
        Node::Range(range) => walk_range(v, range)?,
        Node::PatternExpression(pattern) => walk_pattern_expression(v, pattern)?,
        Node::PredicateExpression(predicate) => walk_predicate_expression(v, predicate)?,
        Node::Subquery(select) => walk_select_statement(v, select)?,
        Node::TableWildcard(wildcard) => walk_table_wildcard(v, wildcard)?,
        Node::DateTimeUnit(unit) => v.visit_leaf(LeafMut::DateTimeUnit(unit))?,
        Node::Literal(literal) => v.visit_leaf(LeafMut::Literal(literal))?,
    };
    if let Action::Replace(replacement) = action {
        *node = replacement;
    }
    Ok(())
}

fn walk_expression<V: Visitor + ?Sized>(v: &mut V, node: &mut Expression) -> Result<Action> {
    v.before(NodeMut::Expression(&mut *node))?;
    if let Some(left) = node.left.as_mut() {
        v.enter_slot(Slot::Left);
        walk_node(v, left)?;
    }
    if let Some(operator) = node.operator.as_mut() {
        v.enter_slot(Slot::Operator);
        keep(v.visit_leaf(LeafMut::Operator(operator))?, "operator")?;
    }
    if let Some(right) = node.right.as_mut() {
        v.enter_slot(Slot::Right);
        walk_node(v, right)?;
    }
    v.after(NodeMut::Expression(node))
}

fn walk_function_call<V: Visitor + ?Sized>(v: &mut V, node: &mut FunctionCall) -> Result<Action> {
    v.before(NodeMut::FunctionCall(&mut *node))?;
    walk_items(v, &mut node.arguments)?;
    v.after(NodeMut::FunctionCall(node))
}

fn walk_db_object<V: Visitor + ?Sized>(v: &mut V, node: &mut DbObject) -> Result<Action> {
    v.before(NodeMut::DbObject(&mut *node))?;
    for (i, part) in node.parts.iter_mut().enumerate() {
        v.enter_slot(Slot::Item(i));
        visit_identifier(v, part)?;
    }
    v.after(NodeMut::DbObject(node))
}

fn walk_case_expression<V: Visitor + ?Sized>(v: &mut V, node: &mut CaseExpression) -> Result<Action> {
    v.before(NodeMut::CaseExpression(&mut *node))?;
    if let Some(operand) = node.operand.as_mut() {
        v.enter_slot(Slot::Operand);
        walk_node(v, operand)?;
    }
    for (i, alternative) in node.alternatives.iter_mut().enumerate() {
        v.enter_slot(Slot::Item(i));
        walk_case_alternative(v, alternative)?;
    }
    if let Some(else_result) = node.else_result.as_mut() {
        v.enter_slot(Slot::Else);
        walk_node(v, else_result)?;
    }
    v.after(NodeMut::CaseExpression(node))
}

fn walk_extract_function<V: Visitor + ?Sized>(
    v: &mut V,
    node: &mut ExtractFunction,
) -> Result<Action> {
    v.before(NodeMut::ExtractFunction(&mut *node))?;
    v.enter_slot(Slot::Field);
    keep(v.visit_leaf(LeafMut::DateTimeUnit(&mut node.field))?, "extract field")?;
    v.enter_slot(Slot::Source);
    walk_node(v, &mut node.source)?;
    v.after(NodeMut::ExtractFunction(node))
}

fn walk_interval<V: Visitor + ?Sized>(v: &mut V, node: &mut Interval) -> Result<Action> {
    v.before(NodeMut::Interval(&mut *node))?;
    v.enter_slot(Slot::Value);
    walk_node(v, &mut node.value)?;
    v.enter_slot(Slot::Field);
    keep(v.visit_leaf(LeafMut::DateTimeUnit(&mut node.unit))?, "interval unit")?;
    v.after(NodeMut::Interval(node))
}

fn walk_switch_function<V: Visitor + ?Sized>(v: &mut V, node: &mut SwitchFunction) -> Result<Action> {
    v.before(NodeMut::SwitchFunction(&mut *node))?;
    walk_items(v, &mut node.arguments)?;
    v.after(NodeMut::SwitchFunction(node))
}

fn walk_type_cast<V: Visitor + ?Sized>(v: &mut V, node: &mut TypeCast) -> Result<Action> {
    v.before(NodeMut::TypeCast(&mut *node))?;
    v.enter_slot(Slot::Value);
    walk_node(v, &mut node.expression)?;
    v.after(NodeMut::TypeCast(node))
}

fn walk_range<V: Visitor + ?Sized>(v: &mut V, node: &mut Range) -> Result<Action> {
    v.before(NodeMut::Range(&mut *node))?;
    v.enter_slot(Slot::Low);
    walk_node(v, &mut node.low)?;
    v.enter_slot(Slot::High);
    walk_node(v, &mut node.high)?;
    v.after(NodeMut::Range(node))
}

fn walk_pattern_expression<V: Visitor + ?Sized>(
    v: &mut V,
    node: &mut PatternExpression,
) -> Result<Action> {
    v.before(NodeMut::PatternExpression(&mut *node))?;
    v.enter_slot(Slot::Pattern);
    walk_node(v, &mut node.pattern)?;
    if let Some(escape) = node.escape.as_mut() {
        v.enter_slot(Slot::Escape);
        walk_node(v, escape)?;
    }
    v.after(NodeMut::PatternExpression(node))
}

fn walk_predicate_expression<V: Visitor + ?Sized>(
    v: &mut V,
    node: &mut PredicateExpression,
) -> Result<Action> {
    v.before(NodeMut::PredicateExpression(&mut *node))?;
    walk_items(v, &mut node.items)?;
    v.after(NodeMut::PredicateExpression(node))
}

fn walk_table_wildcard<V: Visitor + ?Sized>(v: &mut V, node: &mut TableWildcard) -> Result<Action> {
    v.before(NodeMut::TableWildcard(&mut *node))?;
    if let Some(table) = node.table.as_mut() {
        v.enter_slot(Slot::Name);
        keep(walk_db_object(v, table)?, "wildcard table")?;
    }
    v.after(NodeMut::TableWildcard(node))
}
