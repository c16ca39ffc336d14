/// Dialect-neutral SQL tree for sqltailor.
///
/// This module defines the representation consumed by the traversal, the
/// dialect tailors and the SQL compiler. The tree is designed to be:
/// - Owned (every node lives in exactly one parent slot, no back-pointers)
/// - Cheap to duplicate (`Clone` is a deep copy)
/// - Closed (every node kind is a variant of [`Node`] or a clause struct)
use chrono::NaiveDateTime;

/// Top-level statement representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
}

/// A query with its ORDER BY clause. Also used for subqueries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStatement {
    pub query: QueryExpression,
    pub order_by: Vec<OrderExpression>,
}

/// SELECT body with all standard clauses.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryExpression {
    pub distinct: bool,
    /// Row limit emitted as `TOP n`.
    pub top: Option<u32>,
    pub columns: Vec<AliasedItem>,
    pub from: Vec<Table>,
    pub joins: Vec<Join>,
    pub where_clause: Option<Node>,
    pub group_by: Option<GroupByClause>,
    pub having: Option<Node>,
    /// Set operation (UNION, INTERSECT, EXCEPT) combining this query with another.
    pub set_op: Option<Box<SetOperation>>,
}

/// One item of the SELECT list: `expr [AS alias]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasedItem {
    pub item: Node,
    pub alias: Option<Identifier>,
}

/// Table reference in FROM or JOIN.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub source: TableSource,
    pub alias: Option<Identifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    /// `schema.table`
    Named(DbObject),
    /// `(SELECT ...)`
    Derived(Box<SelectStatement>),
}

/// JOIN clause representation.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: Table,
    pub condition: Option<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

/// Set operations (UNION, INTERSECT, EXCEPT).
#[derive(Debug, Clone, PartialEq)]
pub struct SetOperation {
    pub op: SetOperator,
    pub all: bool,
    pub right: QueryExpression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
}

/// ORDER BY expression.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderExpression {
    pub expression: Node,
    pub ascending: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupByClause {
    pub items: Vec<ExpressionItem>,
}

/// INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: Table,
    pub columns: Vec<DbObject>,
    pub source: InsertSource,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    Values(Vec<Vec<ExpressionItem>>),
    Query(Box<SelectStatement>),
}

/// UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table: Table,
    pub assignments: Vec<Assignment>,
    pub where_clause: Option<Node>,
}

/// `column = value` inside UPDATE ... SET.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: DbObject,
    pub value: Node,
}

/// DELETE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub table: Table,
    pub where_clause: Option<Node>,
}

/// Anything that can stand in an expression slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Expression(Box<Expression>),
    FunctionCall(FunctionCall),
    DbObject(DbObject),
    CaseExpression(Box<CaseExpression>),
    ExtractFunction(Box<ExtractFunction>),
    Interval(Box<Interval>),
    SwitchFunction(SwitchFunction),
    TypeCast(Box<TypeCast>),
    Range(Box<Range>),
    PatternExpression(Box<PatternExpression>),
    PredicateExpression(PredicateExpression),
    Subquery(Box<SelectStatement>),
    TableWildcard(TableWildcard),
    DateTimeUnit(DateTimeUnit),
    Literal(Literal),
}

/// Unary or binary operation, or a transparent grouping wrapper.
///
/// With no operator exactly one side is populated and the node means the
/// same thing as that side. Prefix operators keep their operand in `right`,
/// postfix operators (`IS NULL`) in `left`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expression {
    pub left: Option<Node>,
    pub operator: Option<Operator>,
    pub right: Option<Node>,
}

/// One positional argument slot of a call or list.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionItem {
    pub expression: Node,
}

/// Function call: `name(args)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Vec<ExpressionItem>,
    pub distinct: bool,
}

/// Possibly qualified database name, outermost qualifier first. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct DbObject {
    pub parts: Vec<Identifier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
    pub quote: Option<QuoteStyle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    /// `"name"`
    Double,
    /// `[name]`
    Bracket,
    /// `` `name` ``
    Backtick,
}

/// CASE expression.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaseExpression {
    pub operand: Option<Node>,
    pub alternatives: Vec<CaseAlternative>,
    pub else_result: Option<Node>,
}

/// `WHEN when THEN then`
#[derive(Debug, Clone, PartialEq)]
pub struct CaseAlternative {
    pub when: Node,
    pub then: Node,
}

/// `EXTRACT(field FROM source)`
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractFunction {
    pub field: DateTimeUnit,
    pub source: Node,
}

/// `INTERVAL value unit`
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub value: Node,
    pub unit: DateTimeUnit,
}

/// MS Access style `SWITCH(cond1, value1, ...)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SwitchFunction {
    pub arguments: Vec<ExpressionItem>,
}

/// `CAST(expression AS data_type)`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeCast {
    pub expression: Node,
    pub data_type: String,
}

/// Right-hand side of BETWEEN.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    pub low: Node,
    pub high: Node,
}

/// Right-hand side of LIKE.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternExpression {
    pub pattern: Node,
    pub escape: Option<Node>,
}

/// Parenthesized value list on the right-hand side of IN.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PredicateExpression {
    pub items: Vec<ExpressionItem>,
}

/// `*` or `table.*`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableWildcard {
    pub table: Option<DbObject>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeUnit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Integer(i64),
    Float(f64),
    String(String),
    DateTime(NaiveDateTime),
}

/// Expression operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    // Arithmetic
    Plus,
    Minus,
    Multiply,
    Divide,
    /// `%`
    Mod,
    /// MS Access `MOD` keyword operator.
    AccessMod,
    /// `||`
    StrConcat,
    Negate,
    // Comparison
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    // Logical
    And,
    Or,
    Not,
    // Predicates
    IsNull,
    IsNotNull,
    Like,
    NotLike,
    In,
    NotIn,
    Between,
    NotBetween,
    Exists,
}

impl Operator {
    /// Operators written before their single operand.
    pub fn is_prefix(self) -> bool {
        matches!(self, Operator::Negate | Operator::Not | Operator::Exists)
    }

    /// Operators written after their single operand.
    pub fn is_postfix(self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }
}

impl DateTimeUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            DateTimeUnit::Year => "YEAR",
            DateTimeUnit::Month => "MONTH",
            DateTimeUnit::Day => "DAY",
            DateTimeUnit::Hour => "HOUR",
            DateTimeUnit::Minute => "MINUTE",
            DateTimeUnit::Second => "SECOND",
        }
    }
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quote: None,
        }
    }

    pub fn quoted(name: impl Into<String>, quote: QuoteStyle) -> Self {
        Self {
            name: name.into(),
            quote: Some(quote),
        }
    }

    /// Switch a quoted identifier to `style`. Unquoted identifiers stay unquoted.
    pub fn normalize_quotes(&mut self, style: QuoteStyle) {
        if self.quote.is_some() {
            self.quote = Some(style);
        }
    }
}

impl DbObject {
    pub fn new(identifier: Identifier) -> Self {
        Self {
            parts: vec![identifier],
        }
    }

    /// Build `a.b.c` from unquoted names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: names.into_iter().map(Identifier::new).collect(),
        }
    }

    /// True when the name carries further qualification segments.
    pub fn has_next(&self) -> bool {
        self.parts.len() > 1
    }

    /// First (outermost) segment.
    pub fn identifier(&self) -> Option<&Identifier> {
        self.parts.first()
    }
}

impl FunctionCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            distinct: false,
        }
    }

    /// Append an argument after the current last one.
    pub fn push_argument(&mut self, argument: Node) {
        self.arguments.push(ExpressionItem::new(argument));
    }

    pub fn with_argument(mut self, argument: Node) -> Self {
        self.push_argument(argument);
        self
    }

    /// Argument at 0-based `position`.
    pub fn argument(&self, position: usize) -> Option<&Node> {
        self.arguments.get(position).map(|item| &item.expression)
    }
}

impl ExpressionItem {
    pub fn new(expression: Node) -> Self {
        Self { expression }
    }
}

impl Expression {
    pub fn binary(left: Node, operator: Operator, right: Node) -> Self {
        Self {
            left: Some(left),
            operator: Some(operator),
            right: Some(right),
        }
    }

    pub fn prefix(operator: Operator, operand: Node) -> Self {
        Self {
            left: None,
            operator: Some(operator),
            right: Some(operand),
        }
    }

    pub fn postfix(operand: Node, operator: Operator) -> Self {
        Self {
            left: Some(operand),
            operator: Some(operator),
            right: None,
        }
    }

    /// Transparent grouping wrapper around `inner`.
    pub fn wrap(inner: Node) -> Self {
        Self {
            left: Some(inner),
            operator: None,
            right: None,
        }
    }

    pub fn is_wrapper(&self) -> bool {
        self.operator.is_none()
    }
}

impl Node {
    pub fn binary(left: Node, operator: Operator, right: Node) -> Self {
        Node::Expression(Box::new(Expression::binary(left, operator, right)))
    }

    pub fn prefix(operator: Operator, operand: Node) -> Self {
        Node::Expression(Box::new(Expression::prefix(operator, operand)))
    }

    pub fn postfix(operand: Node, operator: Operator) -> Self {
        Node::Expression(Box::new(Expression::postfix(operand, operator)))
    }

    pub fn wrap(inner: Node) -> Self {
        Node::Expression(Box::new(Expression::wrap(inner)))
    }

    /// Unqualified, unquoted column reference.
    pub fn column(name: impl Into<String>) -> Self {
        Node::DbObject(DbObject::new(Identifier::new(name)))
    }

    pub fn null() -> Self {
        Node::Literal(Literal::Null)
    }

    pub fn integer(value: i64) -> Self {
        Node::Literal(Literal::Integer(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Node::Literal(Literal::String(value.into()))
    }

    pub fn call(name: impl Into<String>, arguments: Vec<Node>) -> Self {
        let mut call = FunctionCall::new(name);
        for argument in arguments {
            call.push_argument(argument);
        }
        Node::FunctionCall(call)
    }

    /// Innermost node under any transparent wrappers.
    pub fn term(&self) -> &Node {
        let mut current = self;
        while let Node::Expression(expression) = current {
            if !expression.is_wrapper() {
                break;
            }
            match expression.left.as_ref().or(expression.right.as_ref()) {
                Some(inner) => current = inner,
                None => break,
            }
        }
        current
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self, Node::Literal(Literal::Null))
    }
}

impl Table {
    pub fn named(name: DbObject) -> Self {
        Self {
            source: TableSource::Named(name),
            alias: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_expression() {
        let q = QueryExpression::default();
        assert!(!q.distinct);
        assert!(q.top.is_none());
        assert!(q.columns.is_empty());
        assert!(q.where_clause.is_none());
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Node::call("len", vec![Node::column("name")]);
        let mut copy = original.clone();
        if let Node::FunctionCall(call) = &mut copy {
            call.name = "LEN".into();
            call.push_argument(Node::integer(1));
        }
        match original {
            Node::FunctionCall(call) => {
                assert_eq!(call.name, "len");
                assert_eq!(call.arguments.len(), 1);
            }
            _ => panic!("Expected function call"),
        }
    }

    #[test]
    fn test_push_argument_keeps_order() {
        let call = FunctionCall::new("f")
            .with_argument(Node::integer(1))
            .with_argument(Node::integer(2))
            .with_argument(Node::integer(3));
        assert_eq!(call.argument(0), Some(&Node::integer(1)));
        assert_eq!(call.argument(2), Some(&Node::integer(3)));
        assert_eq!(call.argument(3), None);
    }

    #[test]
    fn test_normalize_quotes_is_idempotent() {
        let mut ident = Identifier::quoted("Order Lines", QuoteStyle::Double);
        ident.normalize_quotes(QuoteStyle::Bracket);
        assert_eq!(ident.quote, Some(QuoteStyle::Bracket));
        let once = ident.clone();
        ident.normalize_quotes(QuoteStyle::Bracket);
        assert_eq!(ident, once);
    }

    #[test]
    fn test_normalize_quotes_leaves_plain_names() {
        let mut ident = Identifier::new("orders");
        ident.normalize_quotes(QuoteStyle::Bracket);
        assert_eq!(ident.quote, None);
    }

    #[test]
    fn test_db_object_qualification() {
        assert!(!DbObject::from_names(["sysdate"]).has_next());
        let qualified = DbObject::from_names(["dbo", "orders"]);
        assert!(qualified.has_next());
        assert_eq!(qualified.identifier().map(|i| i.name.as_str()), Some("dbo"));
    }

    #[test]
    fn test_operator_arity() {
        assert!(Operator::Not.is_prefix());
        assert!(Operator::IsNotNull.is_postfix());
        assert!(!Operator::Plus.is_prefix());
        assert!(!Operator::Plus.is_postfix());
    }

    #[test]
    fn test_wrapper_shape() {
        let wrapped = Expression::wrap(Node::integer(1));
        assert!(wrapped.is_wrapper());
        assert!(wrapped.right.is_none());
        assert!(!Expression::binary(Node::integer(1), Operator::Plus, Node::integer(2)).is_wrapper());
    }
}
