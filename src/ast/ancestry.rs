/// Parent tracking for visitors.
///
/// [`Traced`] wraps a [`TracedVisitor`] and keeps an explicit stack of the
/// non-terminal nodes the walker is currently inside. Hooks receive the
/// stack as an [`Ancestry`]; while a hook for some node runs, the top frame
/// is that node's parent and records which of the parent's slots holds it.
/// Nodes never store upward pointers.
use tracing::trace;

use super::visitor::{Action, LeafMut, NodeKind, NodeMut, Slot, Visitor};
use crate::error::{Result, TailorError};

/// One node on the ancestry stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    kind: NodeKind,
    addr: usize,
    slot: Option<Slot>,
}

impl Frame {
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Child slot the walker is currently visiting, if it has entered one.
    pub fn slot(&self) -> Option<Slot> {
        self.slot
    }

    /// True when this frame is an operator expression and the child being
    /// visited is its left or right operand.
    pub fn is_operand_slot(&self) -> bool {
        self.kind == NodeKind::Expression && matches!(self.slot, Some(Slot::Left | Slot::Right))
    }
}

#[derive(Debug, Default)]
pub struct Ancestry {
    frames: Vec<Frame>,
}

impl Ancestry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Innermost enclosing node, `None` at the root.
    pub fn parent(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn push(&mut self, kind: NodeKind, addr: usize) {
        trace!(?kind, depth = self.frames.len(), "push");
        self.frames.push(Frame {
            kind,
            addr,
            slot: None,
        });
    }

    /// Pop the top frame, which must be the node identified by `kind`/`addr`.
    fn pop(&mut self, kind: NodeKind, addr: usize) -> Result<()> {
        match self.frames.pop() {
            Some(frame) if frame.kind == kind && frame.addr == addr => {
                trace!(?kind, depth = self.frames.len(), "pop");
                Ok(())
            }
            Some(frame) => Err(TailorError::StructuralMismatch(format!(
                "leaving {:?} but the innermost open node is {:?}",
                kind, frame.kind
            ))),
            None => Err(TailorError::StructuralMismatch(format!(
                "leaving {:?} with no open node",
                kind
            ))),
        }
    }

    fn enter_slot(&mut self, slot: Slot) {
        if let Some(top) = self.frames.last_mut() {
            top.slot = Some(slot);
        }
    }
}

/// Visitor hooks that see the enclosing nodes.
pub trait TracedVisitor {
    fn before(&mut self, _node: NodeMut<'_>, _cx: &Ancestry) -> Result<()> {
        Ok(())
    }

    fn after(&mut self, _node: NodeMut<'_>, _cx: &Ancestry) -> Result<Action> {
        Ok(Action::Keep)
    }

    fn visit_leaf(&mut self, _leaf: LeafMut<'_>, _cx: &Ancestry) -> Result<Action> {
        Ok(Action::Keep)
    }
}

impl<T: TracedVisitor + ?Sized> TracedVisitor for &mut T {
    fn before(&mut self, node: NodeMut<'_>, cx: &Ancestry) -> Result<()> {
        (**self).before(node, cx)
    }

    fn after(&mut self, node: NodeMut<'_>, cx: &Ancestry) -> Result<Action> {
        (**self).after(node, cx)
    }

    fn visit_leaf(&mut self, leaf: LeafMut<'_>, cx: &Ancestry) -> Result<Action> {
        (**self).visit_leaf(leaf, cx)
    }
}

/// Decorator that maintains an [`Ancestry`] around an inner visitor.
#[derive(Debug)]
pub struct Traced<V> {
    inner: V,
    ancestry: Ancestry,
}

impl<V: TracedVisitor> Traced<V> {
    pub fn new(inner: V) -> Self {
        Self {
            inner,
            ancestry: Ancestry::new(),
        }
    }

    pub fn ancestry(&self) -> &Ancestry {
        &self.ancestry
    }

    /// End the traversal. Fails if any node was left open.
    pub fn finish(self) -> Result<V> {
        if let Some(frame) = self.ancestry.parent() {
            return Err(TailorError::StructuralMismatch(format!(
                "{} node(s) still open after traversal, innermost {:?}",
                self.ancestry.depth(),
                frame.kind
            )));
        }
        Ok(self.inner)
    }
}

impl<V: TracedVisitor> Visitor for Traced<V> {
    fn before(&mut self, node: NodeMut<'_>) -> Result<()> {
        let (kind, addr) = (node.kind(), node.addr());
        self.inner.before(node, &self.ancestry)?;
        self.ancestry.push(kind, addr);
        Ok(())
    }

    fn after(&mut self, node: NodeMut<'_>) -> Result<Action> {
        let (kind, addr) = (node.kind(), node.addr());
        self.ancestry.pop(kind, addr)?;
        // Selects nest as subqueries; data-modifying statements only occur at the top.
        if matches!(
            kind,
            NodeKind::InsertStatement | NodeKind::UpdateStatement | NodeKind::DeleteStatement
        ) && !self.ancestry.is_empty()
        {
            return Err(TailorError::StructuralMismatch(format!(
                "{:?} closed with {} enclosing node(s) still open",
                kind,
                self.ancestry.depth()
            )));
        }
        self.inner.after(node, &self.ancestry)
    }

    fn visit_leaf(&mut self, leaf: LeafMut<'_>) -> Result<Action> {
        self.inner.visit_leaf(leaf, &self.ancestry)
    }

    fn enter_slot(&mut self, slot: Slot) {
        self.ancestry.enter_slot(slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::*;
    use crate::ast::visitor::walk_statement;

    /// Records (parent kind, slot) for every literal and the deepest stack seen.
    #[derive(Default)]
    struct ParentProbe {
        literal_parents: Vec<(Option<NodeKind>, Option<Slot>)>,
        max_depth: usize,
    }

    impl TracedVisitor for ParentProbe {
        fn before(&mut self, _node: NodeMut<'_>, cx: &Ancestry) -> Result<()> {
            self.max_depth = self.max_depth.max(cx.depth() + 1);
            Ok(())
        }

        fn visit_leaf(&mut self, leaf: LeafMut<'_>, cx: &Ancestry) -> Result<Action> {
            if let LeafMut::Literal(_) = leaf {
                let parent = cx.parent();
                self.literal_parents
                    .push((parent.map(|f| f.kind()), parent.and_then(|f| f.slot())));
            }
            Ok(Action::Keep)
        }
    }

    fn users() -> Table {
        Table::named(DbObject::from_names(["users"]))
    }

    fn statements() -> Vec<Statement> {
        let filter = Node::binary(Node::column("id"), Operator::Equal, Node::integer(1));
        vec![
            Statement::Select(SelectStatement {
                query: QueryExpression {
                    columns: vec![AliasedItem {
                        item: Node::wrap(Node::column("name")),
                        alias: None,
                    }],
                    from: vec![users()],
                    where_clause: Some(filter.clone()),
                    ..Default::default()
                },
                order_by: vec![],
            }),
            Statement::Insert(InsertStatement {
                table: users(),
                columns: vec![DbObject::from_names(["id"])],
                source: InsertSource::Values(vec![vec![ExpressionItem::new(Node::wrap(
                    Node::integer(1),
                ))]]),
            }),
            Statement::Update(UpdateStatement {
                table: users(),
                assignments: vec![Assignment {
                    column: DbObject::from_names(["name"]),
                    value: Node::wrap(Node::string("x")),
                }],
                where_clause: Some(filter.clone()),
            }),
            Statement::Delete(DeleteStatement {
                table: users(),
                where_clause: Some(filter),
            }),
        ]
    }

    #[test]
    fn test_stack_balanced_for_every_statement_kind() {
        for mut statement in statements() {
            let mut traced = Traced::new(ParentProbe::default());
            walk_statement(&mut traced, &mut statement).unwrap();
            assert!(traced.ancestry().is_empty());
            let probe = traced.finish().unwrap();
            assert!(probe.max_depth >= 2);
        }
    }

    #[test]
    fn test_parent_and_slot_visible_to_hooks() {
        let mut statement = Statement::Delete(DeleteStatement {
            table: users(),
            where_clause: Some(Node::binary(
                Node::integer(1),
                Operator::Less,
                Node::integer(2),
            )),
        });
        let mut traced = Traced::new(ParentProbe::default());
        walk_statement(&mut traced, &mut statement).unwrap();
        let probe = traced.finish().unwrap();
        assert_eq!(
            probe.literal_parents,
            vec![
                (Some(NodeKind::Expression), Some(Slot::Left)),
                (Some(NodeKind::Expression), Some(Slot::Right)),
            ]
        );
    }

    #[test]
    fn test_root_has_no_parent() {
        struct RootCheck(Vec<bool>);
        impl TracedVisitor for RootCheck {
            fn before(&mut self, node: NodeMut<'_>, cx: &Ancestry) -> Result<()> {
                if node.kind() == NodeKind::DeleteStatement {
                    self.0.push(cx.parent().is_none());
                }
                Ok(())
            }
        }
        let mut statement = statements().remove(3);
        let mut traced = Traced::new(RootCheck(vec![]));
        walk_statement(&mut traced, &mut statement).unwrap();
        assert_eq!(traced.finish().unwrap().0, vec![true]);
    }

    #[test]
    fn test_asymmetric_pop_is_structural_mismatch() {
        let mut ancestry = Ancestry::new();
        ancestry.push(NodeKind::Expression, 1);
        let err = ancestry.pop(NodeKind::FunctionCall, 1).unwrap_err();
        assert!(matches!(err, TailorError::StructuralMismatch(_)));

        let err = ancestry.pop(NodeKind::Expression, 1).unwrap_err();
        assert!(matches!(err, TailorError::StructuralMismatch(_)));
    }

    #[test]
    fn test_same_kind_different_node_is_rejected() {
        let mut ancestry = Ancestry::new();
        ancestry.push(NodeKind::Expression, 1);
        assert!(ancestry.pop(NodeKind::Expression, 2).is_err());
    }

    #[test]
    fn test_nested_dml_statement_is_rejected() {
        struct Nothing;
        impl TracedVisitor for Nothing {}

        let mut outer = QueryExpression::default();
        let mut delete = DeleteStatement {
            table: users(),
            where_clause: None,
        };
        let mut traced = Traced::new(Nothing);
        traced.before(NodeMut::QueryExpression(&mut outer)).unwrap();
        traced.before(NodeMut::DeleteStatement(&mut delete)).unwrap();
        let err = traced.after(NodeMut::DeleteStatement(&mut delete)).unwrap_err();
        assert!(matches!(err, TailorError::StructuralMismatch(_)));
    }

    #[test]
    fn test_finish_with_open_frames_fails() {
        struct Nothing;
        impl TracedVisitor for Nothing {}

        let mut query = QueryExpression::default();
        let mut traced = Traced::new(Nothing);
        traced.before(NodeMut::QueryExpression(&mut query)).unwrap();
        assert!(traced.finish().is_err());
    }

    #[test]
    fn test_operand_slot_is_tracked_on_top_frame() {
        let mut ancestry = Ancestry::new();
        ancestry.push(NodeKind::QueryExpression, 1);
        ancestry.push(NodeKind::Expression, 2);
        ancestry.enter_slot(Slot::Right);
        assert_eq!(ancestry.depth(), 2);
        assert_eq!(ancestry.parent().map(|f| f.slot()), Some(Some(Slot::Right)));
        assert!(ancestry.parent().map(|f| f.is_operand_slot()).unwrap_or(false));
    }
}
