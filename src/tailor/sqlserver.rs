/// MS SQL Server tailor.
///
/// Rewrites a neutral tree into T-SQL: `GETDATE()` for the current date,
/// `+` for string concatenation, `DATEPART`/`DATEADD` for date arithmetic,
/// a NULL-guarded three-argument `SUBSTRING`, `TOP n` for ROWNUM limits and
/// bracket-quoted identifiers.
use std::mem;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::ast::ancestry::{Ancestry, Frame, TracedVisitor};
use crate::ast::types::*;
use crate::ast::visitor::{Action, LeafMut, NodeKind, NodeMut};
use crate::error::{Result, TailorError};

use super::keywords::Keyword;
use super::util;
use super::Tailor;

const DIALECT: &str = "MS SQL Server";

/// Style used by CONVERT for `yyyy-mm-dd hh:mi:ss`.
const ODBC_CANONICAL: i64 = 120;

#[derive(Debug, Clone)]
pub struct SqlServerTailor {
    mod_operator: Operator,
}

impl Default for SqlServerTailor {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlServerTailor {
    pub fn new() -> Self {
        Self::with_mod_operator(Operator::Mod)
    }

    /// Tailor that normalizes modulo constructs to `mod_operator`.
    pub fn with_mod_operator(mod_operator: Operator) -> Self {
        Self { mod_operator }
    }

    fn rename_function(&self, call: &mut FunctionCall) {
        let renamed = match Keyword::parse(&call.name) {
            Some(Keyword::Now) => Keyword::Getdate,
            Some(Keyword::Mid) => Keyword::Substring,
            Some(Keyword::Locate) => Keyword::Charindex,
            _ => return,
        };
        debug!(rule = "rename", from = %call.name, to = renamed.as_str(), dialect = DIALECT, "rewrite");
        call.name = renamed.sql();
    }

    fn after_function_call(&self, call: &mut FunctionCall, cx: &Ancestry) -> Result<Action> {
        match Keyword::parse(&call.name) {
            Some(Keyword::Substring) => {
                if !is_operand(cx) {
                    return Err(TailorError::unsupported("SUBSTRING outside an expression", DIALECT));
                }
                debug!(rule = "substring", dialect = DIALECT, "rewrite");
                self.make_substring(mem::take(call)).map(Action::Replace)
            }
            Some(Keyword::Mod) => {
                debug!(rule = "mod", dialect = DIALECT, "rewrite");
                self.mod_call(call).map(Action::Replace)
            }
            _ => Ok(Action::Keep),
        }
    }

    /// `SUBSTRING(value, start[, length])` with an explicit length, guarded
    /// so it yields NULL whenever a nullable argument is NULL.
    fn make_substring(&self, mut call: FunctionCall) -> Result<Node> {
        if util::has_null_argument(&call) {
            return Ok(Node::null());
        }
        let function = Keyword::Substring.sql();
        match call.arguments.len() {
            0 => return Err(TailorError::argument_count(function, "no parameters")),
            1 => return Err(TailorError::argument_count(function, "too few parameters")),
            2 | 3 => {}
            _ => return Err(TailorError::argument_count(function, "too many parameters")),
        }
        // Guard covers the original arguments only, not the synthesized length.
        let guard = util::not_null_guard(&call.arguments);
        if call.arguments.len() == 2 {
            let length = util::make_len_arg(
                &call.arguments[1].expression,
                &call.arguments[0].expression,
                &Keyword::Len.sql(),
            );
            call.push_argument(length);
        }
        call.name = function;
        let call = Node::FunctionCall(call);
        Ok(match guard {
            Some(guard) => util::null_guarded(guard, call),
            None => call,
        })
    }

    fn after_db_object(&self, object: &DbObject, cx: &Ancestry) -> Result<Action> {
        if !util::is_bare_keyword(object, Keyword::Sysdate) {
            return Ok(Action::Keep);
        }
        if !is_operand(cx) {
            return Err(TailorError::unsupported("SYSDATE outside an expression", DIALECT));
        }
        debug!(rule = "sysdate", dialect = DIALECT, "rewrite");
        Ok(Action::Replace(Node::call(Keyword::Getdate.sql(), vec![])))
    }

    fn after_expression(&self, expression: &mut Expression, cx: &Ancestry) -> Result<Action> {
        if expression.is_wrapper() {
            let inner = expression.left.as_ref().or(expression.right.as_ref());
            let holds_interval = inner
                .map(|node| matches!(util::term(node), Node::Interval(_)))
                .unwrap_or(false);
            if holds_interval && !is_operand(cx) {
                return Err(TailorError::unsupported(
                    "INTERVAL outside date addition or subtraction",
                    DIALECT,
                ));
            }
            return Ok(Action::Keep);
        }
        match self.interval_arithmetic(expression)? {
            Some(call) => {
                debug!(rule = "interval", dialect = DIALECT, "rewrite");
                Ok(Action::Replace(call))
            }
            None => Ok(Action::Keep),
        }
    }

    fn rewrite_operator(&self, operator: &mut Operator, cx: &Ancestry) -> Result<Action> {
        let replacement = match *operator {
            Operator::AccessMod => self.mod_operator,
            Operator::StrConcat => Operator::Plus,
            _ => return Ok(Action::Keep),
        };
        match cx.parent().map(Frame::kind) {
            Some(NodeKind::Expression) => {}
            other => {
                return Err(TailorError::StructuralMismatch(format!(
                    "operator {:?} held by {:?}",
                    operator, other
                )))
            }
        }
        debug!(rule = "operator", from = ?operator, to = ?replacement, dialect = DIALECT, "rewrite");
        *operator = replacement;
        Ok(Action::Keep)
    }

    fn rewrite_datetime(&self, value: NaiveDateTime, cx: &Ancestry) -> Result<Action> {
        if !is_operand(cx) {
            return Err(TailorError::unsupported(
                "date/time literal outside an expression",
                DIALECT,
            ));
        }
        debug!(rule = "datetime", dialect = DIALECT, "rewrite");
        Ok(Action::Replace(Node::call(
            Keyword::Convert.sql(),
            vec![
                Node::column(Keyword::Datetime.as_str()),
                Node::string(value.format("%Y-%m-%d %H:%M:%S").to_string()),
                Node::integer(ODBC_CANONICAL),
            ],
        )))
    }

    /// Move ROWNUM conjuncts of the WHERE clause into `TOP n`.
    fn limit_rows(&self, query: &mut QueryExpression) -> Result<()> {
        let Some(filter) = query.where_clause.as_ref() else {
            return Ok(());
        };
        let mut conjuncts = Vec::new();
        collect_conjuncts(filter, &mut conjuncts);
        let mut is_limit = Vec::with_capacity(conjuncts.len());
        let mut limit: Option<u32> = None;
        for conjunct in conjuncts {
            let found = match conjunct {
                Node::Expression(expression) => util::rownum_limit(expression)?,
                _ => None,
            };
            is_limit.push(found.is_some());
            limit = match (limit, found) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
        }
        let Some(limit) = limit else {
            return Ok(());
        };

        let mut owned = Vec::new();
        if let Some(filter) = query.where_clause.take() {
            take_conjuncts(filter, &mut owned);
        }
        query.where_clause = owned
            .into_iter()
            .zip(is_limit)
            .filter_map(|(node, is_limit)| (!is_limit).then_some(node))
            .reduce(|left, right| Node::binary(left, Operator::And, right));
        let top = query.top.map_or(limit, |top| top.min(limit));
        debug!(rule = "rownum", top, dialect = DIALECT, "rewrite");
        query.top = Some(top);
        Ok(())
    }
}

fn is_operand(cx: &Ancestry) -> bool {
    cx.parent().map(Frame::is_operand_slot).unwrap_or(false)
}

fn collect_conjuncts<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
    match util::term(node) {
        Node::Expression(expression) if expression.operator == Some(Operator::And) => {
            if let Some(left) = &expression.left {
                collect_conjuncts(left, out);
            }
            if let Some(right) = &expression.right {
                collect_conjuncts(right, out);
            }
        }
        term => out.push(term),
    }
}

fn take_conjuncts(node: Node, out: &mut Vec<Node>) {
    match util::into_term(node) {
        Node::Expression(expression) if expression.operator == Some(Operator::And) => {
            let Expression { left, right, .. } = *expression;
            if let Some(left) = left {
                take_conjuncts(left, out);
            }
            if let Some(right) = right {
                take_conjuncts(right, out);
            }
        }
        term => out.push(term),
    }
}

/// `FROM dual` has no T-SQL equivalent; a SELECT without FROM means the same.
fn drop_dual(query: &mut QueryExpression) {
    let only_dual = query.joins.is_empty()
        && matches!(
            query.from.as_slice(),
            [Table { source: TableSource::Named(name), .. }]
                if util::is_bare_keyword(name, Keyword::Dual)
        );
    if only_dual {
        debug!(rule = "dual", dialect = DIALECT, "rewrite");
        query.from.clear();
    }
}

impl Tailor for SqlServerTailor {
    fn dialect(&self) -> &'static str {
        DIALECT
    }

    fn mod_operator(&self) -> Operator {
        self.mod_operator
    }

    fn dateadd_call(&self, unit: DateTimeUnit, number: Node, date: Node) -> Result<Node> {
        if unit == DateTimeUnit::Month {
            return Err(TailorError::unsupported("DATEADD with MONTH unit", DIALECT));
        }
        Ok(Node::call(
            Keyword::Dateadd.sql(),
            vec![Node::DateTimeUnit(unit), number, date],
        ))
    }

    fn extract_call(&self, field: DateTimeUnit, source: Node) -> Node {
        Node::call(
            Keyword::Datepart.sql(),
            vec![Node::DateTimeUnit(field), source],
        )
    }
}

impl TracedVisitor for SqlServerTailor {
    fn before(&mut self, node: NodeMut<'_>, _cx: &Ancestry) -> Result<()> {
        match node {
            NodeMut::SwitchFunction(_) => Err(TailorError::unsupported("SWITCH", DIALECT)),
            NodeMut::FunctionCall(call) => {
                self.rename_function(call);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn after(&mut self, node: NodeMut<'_>, cx: &Ancestry) -> Result<Action> {
        match node {
            NodeMut::FunctionCall(call) => self.after_function_call(call, cx),
            NodeMut::DbObject(object) => self.after_db_object(object, cx),
            NodeMut::Expression(expression) => self.after_expression(expression, cx),
            NodeMut::ExtractFunction(extract) => {
                debug!(rule = "extract", dialect = DIALECT, "rewrite");
                let source = mem::replace(&mut extract.source, Node::null());
                Ok(Action::Replace(self.extract_call(extract.field, source)))
            }
            NodeMut::Interval(_) if !is_operand(cx) => Err(TailorError::unsupported(
                "INTERVAL outside date addition or subtraction",
                DIALECT,
            )),
            NodeMut::QueryExpression(query) => {
                self.limit_rows(query)?;
                drop_dual(query);
                Ok(Action::Keep)
            }
            _ => Ok(Action::Keep),
        }
    }

    fn visit_leaf(&mut self, leaf: LeafMut<'_>, cx: &Ancestry) -> Result<Action> {
        match leaf {
            LeafMut::Identifier(identifier) => {
                identifier.normalize_quotes(QuoteStyle::Bracket);
                Ok(Action::Keep)
            }
            LeafMut::Operator(operator) => self.rewrite_operator(operator, cx),
            LeafMut::Literal(Literal::DateTime(value)) => self.rewrite_datetime(*value, cx),
            _ => Ok(Action::Keep),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tailor::translate;
    use chrono::NaiveDate;

    fn select(columns: Vec<Node>, filter: Option<Node>) -> Statement {
        Statement::Select(SelectStatement {
            query: QueryExpression {
                columns: columns
                    .into_iter()
                    .map(|item| AliasedItem { item, alias: None })
                    .collect(),
                from: vec![Table::named(DbObject::from_names(["t"]))],
                where_clause: filter,
                ..Default::default()
            },
            order_by: vec![],
        })
    }

    fn run(statement: &mut Statement) -> Result<()> {
        translate(&mut SqlServerTailor::new(), statement)
    }

    fn query(statement: &Statement) -> &QueryExpression {
        match statement {
            Statement::Select(select) => &select.query,
            _ => panic!("Expected select"),
        }
    }

    /// Tailor a single select item and return it.
    fn tailor_item(item: Node) -> Result<Node> {
        let mut statement = select(vec![item], None);
        run(&mut statement)?;
        Ok(query(&statement).columns[0].item.clone())
    }

    fn substring(arguments: Vec<Node>) -> Node {
        Node::wrap(Node::call("substring", arguments))
    }

    #[test]
    fn test_substring_literal_needs_no_guard() {
        let out = tailor_item(substring(vec![Node::string("abc"), Node::integer(1)])).unwrap();
        let expected = Node::wrap(Node::call(
            "SUBSTRING",
            vec![
                Node::string("abc"),
                Node::integer(1),
                Node::call("LEN", vec![Node::string("abc")]),
            ],
        ));
        assert_eq!(out, expected);
    }

    #[test]
    fn test_substring_column_is_guarded() {
        let out = tailor_item(substring(vec![Node::column("col"), Node::integer(1)])).unwrap();
        let call = Node::call(
            "SUBSTRING",
            vec![
                Node::column("col"),
                Node::integer(1),
                Node::call("LEN", vec![Node::column("col")]),
            ],
        );
        let expected = Node::wrap(Node::CaseExpression(Box::new(CaseExpression {
            operand: None,
            alternatives: vec![CaseAlternative {
                when: Node::postfix(Node::column("col"), Operator::IsNotNull),
                then: call,
            }],
            else_result: Some(Node::wrap(Node::null())),
        })));
        assert_eq!(out, expected);
    }

    #[test]
    fn test_substring_explicit_length_keeps_three_arguments() {
        let out = tailor_item(substring(vec![
            Node::string("abc"),
            Node::integer(2),
            Node::integer(1),
        ]))
        .unwrap();
        let expected = Node::wrap(Node::call(
            "SUBSTRING",
            vec![Node::string("abc"), Node::integer(2), Node::integer(1)],
        ));
        assert_eq!(out, expected);
    }

    #[test]
    fn test_substring_computed_length_from_start() {
        let out = tailor_item(substring(vec![Node::string("abc"), Node::integer(2)])).unwrap();
        let Node::Expression(wrapper) = out else {
            panic!("Expected wrapper");
        };
        let Some(Node::FunctionCall(call)) = wrapper.left else {
            panic!("Expected call");
        };
        assert_eq!(call.arguments.len(), 3);
        assert_eq!(
            call.argument(2),
            Some(&Node::binary(
                Node::binary(
                    Node::call("LEN", vec![Node::string("abc")]),
                    Operator::Plus,
                    Node::integer(1)
                ),
                Operator::Minus,
                Node::integer(2),
            ))
        );
    }

    #[test]
    fn test_substring_with_null_is_null() {
        let out = tailor_item(substring(vec![
            Node::column("col"),
            Node::wrap(Node::null()),
            Node::integer(3),
        ]))
        .unwrap();
        assert_eq!(out, Node::wrap(Node::null()));
    }

    #[test]
    fn test_substring_argument_counts() {
        for arguments in [
            vec![],
            vec![Node::string("abc")],
            vec![
                Node::string("abc"),
                Node::integer(1),
                Node::integer(1),
                Node::integer(1),
            ],
        ] {
            let err = tailor_item(substring(arguments)).unwrap_err();
            assert!(matches!(err, TailorError::ArgumentCount { .. }));
        }
    }

    #[test]
    fn test_substring_outside_expression_fails() {
        let err = tailor_item(Node::call("substring", vec![Node::string("a"), Node::integer(1)]))
            .unwrap_err();
        assert!(matches!(err, TailorError::Unsupported { .. }));
    }

    #[test]
    fn test_mid_is_normalized_like_substring() {
        let out = tailor_item(Node::wrap(Node::call(
            "MID",
            vec![Node::string("abc"), Node::integer(1)],
        )))
        .unwrap();
        let Node::Expression(wrapper) = out else {
            panic!("Expected wrapper");
        };
        assert!(matches!(
            wrapper.left,
            Some(Node::FunctionCall(ref call)) if call.name == "SUBSTRING" && call.arguments.len() == 3
        ));
    }

    #[test]
    fn test_now_renamed_to_getdate() {
        let out = tailor_item(Node::wrap(Node::call("Now", vec![]))).unwrap();
        assert_eq!(out, Node::wrap(Node::call("GETDATE", vec![])));
    }

    #[test]
    fn test_locate_renamed_to_charindex() {
        let out = tailor_item(Node::call("locate", vec![Node::string("a"), Node::column("s")]))
            .unwrap();
        assert_eq!(
            out,
            Node::call("CHARINDEX", vec![Node::string("a"), Node::column("s")])
        );
    }

    #[test]
    fn test_sysdate_in_comparison() {
        let filter = Node::binary(Node::column("SYSDATE"), Operator::Less, Node::column("due"));
        let mut statement = select(vec![Node::column("id")], Some(filter));
        run(&mut statement).unwrap();
        assert_eq!(
            query(&statement).where_clause,
            Some(Node::binary(
                Node::call("GETDATE", vec![]),
                Operator::Less,
                Node::column("due"),
            ))
        );
    }

    #[test]
    fn test_bare_sysdate_fails() {
        let err = tailor_item(Node::column("sysdate")).unwrap_err();
        assert!(matches!(err, TailorError::Unsupported { .. }));
    }

    #[test]
    fn test_qualified_sysdate_untouched() {
        let item = Node::wrap(Node::DbObject(DbObject::from_names(["t", "sysdate"])));
        assert_eq!(tailor_item(item.clone()).unwrap(), item);
    }

    #[test]
    fn test_quoted_sysdate_is_a_column() {
        let quoted = Node::DbObject(DbObject::new(Identifier::quoted(
            "sysdate",
            QuoteStyle::Double,
        )));
        let filter = Node::binary(quoted, Operator::Less, Node::column("due"));
        let mut statement = select(vec![Node::column("id")], Some(filter));
        run(&mut statement).unwrap();
        let bracketed = Node::DbObject(DbObject::new(Identifier::quoted(
            "sysdate",
            QuoteStyle::Bracket,
        )));
        assert_eq!(
            query(&statement).where_clause,
            Some(Node::binary(bracketed, Operator::Less, Node::column("due")))
        );
    }

    #[test]
    fn test_quoted_rownum_stays_a_filter() {
        let quoted = Node::DbObject(DbObject::new(Identifier::quoted(
            "rownum",
            QuoteStyle::Double,
        )));
        let filter = Node::binary(quoted, Operator::LessOrEqual, Node::integer(3));
        let mut statement = select(vec![Node::column("a")], Some(filter));
        run(&mut statement).unwrap();
        assert_eq!(query(&statement).top, None);
        assert!(query(&statement).where_clause.is_some());
    }

    #[test]
    fn test_quoted_dual_is_kept() {
        let mut statement = select(vec![Node::integer(1)], None);
        if let Statement::Select(s) = &mut statement {
            s.query.from = vec![Table::named(DbObject::new(Identifier::quoted(
                "dual",
                QuoteStyle::Double,
            )))];
        }
        run(&mut statement).unwrap();
        assert_eq!(query(&statement).from.len(), 1);
    }

    #[test]
    fn test_rownum_becomes_top() {
        let filter = Node::wrap(Node::binary(
            Node::column("ROWNUM"),
            Operator::LessOrEqual,
            Node::integer(10),
        ));
        let mut statement = select(vec![Node::column("id")], Some(filter));
        run(&mut statement).unwrap();
        assert_eq!(query(&statement).top, Some(10));
        assert_eq!(query(&statement).where_clause, None);
    }

    #[test]
    fn test_rownum_conjunct_keeps_other_conditions() {
        let condition = Node::binary(Node::column("a"), Operator::Equal, Node::integer(1));
        let filter = Node::binary(
            Node::binary(Node::column("rownum"), Operator::Less, Node::integer(10)),
            Operator::And,
            condition.clone(),
        );
        let mut statement = select(vec![Node::column("id")], Some(filter));
        run(&mut statement).unwrap();
        assert_eq!(query(&statement).top, Some(9));
        assert_eq!(query(&statement).where_clause, Some(condition));
    }

    #[test]
    fn test_several_rownum_conjuncts_take_minimum() {
        let filter = Node::binary(
            Node::binary(Node::column("rownum"), Operator::LessOrEqual, Node::integer(10)),
            Operator::And,
            Node::binary(Node::integer(4), Operator::GreaterOrEqual, Node::column("rownum")),
        );
        let mut statement = select(vec![Node::column("id")], Some(filter));
        run(&mut statement).unwrap();
        assert_eq!(query(&statement).top, Some(4));
    }

    #[test]
    fn test_rownum_fraction_fails() {
        let filter = Node::binary(
            Node::column("rownum"),
            Operator::LessOrEqual,
            Node::Literal(Literal::Float(1.5)),
        );
        let mut statement = select(vec![Node::column("id")], Some(filter));
        assert!(matches!(
            run(&mut statement),
            Err(TailorError::NumericRange { .. })
        ));
    }

    #[test]
    fn test_rownum_under_or_is_left_alone() {
        let filter = Node::binary(
            Node::binary(Node::column("rownum"), Operator::LessOrEqual, Node::integer(10)),
            Operator::Or,
            Node::binary(Node::column("a"), Operator::Equal, Node::integer(1)),
        );
        let mut statement = select(vec![Node::column("id")], Some(filter.clone()));
        run(&mut statement).unwrap();
        assert_eq!(query(&statement).top, None);
        assert_eq!(query(&statement).where_clause, Some(filter));
    }

    #[test]
    fn test_extract_becomes_datepart() {
        let extract = Node::ExtractFunction(Box::new(ExtractFunction {
            field: DateTimeUnit::Year,
            source: Node::column("d"),
        }));
        let out = tailor_item(Node::wrap(extract)).unwrap();
        assert_eq!(
            out,
            Node::wrap(Node::call(
                "DATEPART",
                vec![Node::DateTimeUnit(DateTimeUnit::Year), Node::column("d")]
            ))
        );
    }

    #[test]
    fn test_switch_fails_anywhere() {
        let switch = || {
            Node::SwitchFunction(SwitchFunction {
                arguments: vec![
                    ExpressionItem::new(Node::column("c")),
                    ExpressionItem::new(Node::integer(1)),
                ],
            })
        };
        let positions = vec![
            switch(),
            Node::wrap(switch()),
            Node::call("coalesce", vec![Node::wrap(switch()), Node::integer(0)]),
        ];
        for item in positions {
            let err = tailor_item(item).unwrap_err();
            assert_eq!(err, TailorError::unsupported("SWITCH", DIALECT));
        }
    }

    #[test]
    fn test_access_mod_and_concat_operators() {
        let item = Node::binary(
            Node::binary(Node::column("a"), Operator::AccessMod, Node::integer(2)),
            Operator::StrConcat,
            Node::string("x"),
        );
        let out = tailor_item(item).unwrap();
        assert_eq!(
            out,
            Node::binary(
                Node::binary(Node::column("a"), Operator::Mod, Node::integer(2)),
                Operator::Plus,
                Node::string("x"),
            )
        );
    }

    #[test]
    fn test_configured_mod_operator() {
        let mut statement = select(
            vec![Node::wrap(Node::call("MOD", vec![Node::column("a"), Node::integer(3)]))],
            None,
        );
        translate(
            &mut SqlServerTailor::with_mod_operator(Operator::AccessMod),
            &mut statement,
        )
        .unwrap();
        assert_eq!(
            query(&statement).columns[0].item,
            Node::wrap(Node::binary(Node::column("a"), Operator::AccessMod, Node::integer(3)))
        );
    }

    #[test]
    fn test_mod_call_argument_count() {
        let err = tailor_item(Node::call("mod", vec![Node::integer(1)])).unwrap_err();
        assert!(matches!(err, TailorError::ArgumentCount { .. }));
    }

    #[test]
    fn test_datetime_literal_becomes_convert() {
        let value = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(14, 5, 0))
            .unwrap();
        let out = tailor_item(Node::wrap(Node::Literal(Literal::DateTime(value)))).unwrap();
        assert_eq!(
            out,
            Node::wrap(Node::call(
                "CONVERT",
                vec![
                    Node::column("datetime"),
                    Node::string("2024-03-09 14:05:00"),
                    Node::integer(120),
                ]
            ))
        );
    }

    #[test]
    fn test_datetime_literal_outside_expression_fails() {
        let value = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let err = tailor_item(Node::Literal(Literal::DateTime(value))).unwrap_err();
        assert!(matches!(err, TailorError::Unsupported { .. }));
    }

    #[test]
    fn test_identifier_quotes_normalized_idempotently() {
        let item = Node::wrap(Node::DbObject(DbObject::new(Identifier::quoted(
            "Order Date",
            QuoteStyle::Double,
        ))));
        let once = tailor_item(item).unwrap();
        assert_eq!(
            once,
            Node::wrap(Node::DbObject(DbObject::new(Identifier::quoted(
                "Order Date",
                QuoteStyle::Bracket,
            ))))
        );
        assert_eq!(tailor_item(once.clone()).unwrap(), once);
    }

    #[test]
    fn test_dual_dropped() {
        let mut statement = Statement::Select(SelectStatement {
            query: QueryExpression {
                columns: vec![AliasedItem {
                    item: Node::wrap(Node::integer(1)),
                    alias: None,
                }],
                from: vec![Table::named(DbObject::from_names(["DUAL"]))],
                ..Default::default()
            },
            order_by: vec![],
        });
        run(&mut statement).unwrap();
        assert!(query(&statement).from.is_empty());
    }

    #[test]
    fn test_dml_statements_translate_with_balanced_stack() {
        let table = || Table::named(DbObject::from_names(["t"]));
        let filter = || Node::binary(Node::column("a"), Operator::Less, Node::column("sysdate"));
        let mut statements = vec![
            Statement::Insert(InsertStatement {
                table: table(),
                columns: vec![DbObject::from_names(["a"])],
                source: InsertSource::Values(vec![vec![ExpressionItem::new(Node::wrap(
                    Node::call("now", vec![]),
                ))]]),
            }),
            Statement::Update(UpdateStatement {
                table: table(),
                assignments: vec![Assignment {
                    column: DbObject::from_names(["a"]),
                    value: Node::wrap(Node::column("sysdate")),
                }],
                where_clause: Some(filter()),
            }),
            Statement::Delete(DeleteStatement {
                table: table(),
                where_clause: Some(filter()),
            }),
        ];
        for statement in statements.iter_mut() {
            run(statement).unwrap();
        }
        match &statements[2] {
            Statement::Delete(delete) => assert_eq!(
                delete.where_clause,
                Some(Node::binary(
                    Node::column("a"),
                    Operator::Less,
                    Node::call("GETDATE", vec![])
                ))
            ),
            _ => panic!("Expected delete"),
        }
    }

    #[test]
    fn test_dateadd_rejects_month() {
        let tailor = SqlServerTailor::new();
        assert!(tailor
            .dateadd_call(DateTimeUnit::Month, Node::integer(1), Node::column("d"))
            .is_err());
        assert_eq!(
            tailor
                .dateadd_call(DateTimeUnit::Day, Node::integer(1), Node::column("d"))
                .unwrap(),
            Node::call(
                "DATEADD",
                vec![
                    Node::DateTimeUnit(DateTimeUnit::Day),
                    Node::integer(1),
                    Node::column("d")
                ]
            )
        );
    }
}
