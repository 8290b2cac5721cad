//! Per-node metadata frames and the persistent ancestor/scope stack.
//!
//! Every `Walker::walk` call builds one [`Metadata`] frame for the node it visits
//! and hands its children an [`Ancestors`] value extended by that frame. The
//! stack is a shared linked list, so extending it never disturbs the caller's
//! view and two siblings never observe each other's frames.

use std::fmt;
use std::rc::Rc;

use derive_more::{Deref, DerefMut};
use rustc_hash::FxHashMap;

use crate::{
    ast::{Ast, Declaration, NodeId, NodeKind},
    source::Idx,
};

/// Names declared directly in one scope-introducing node.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deref, DerefMut)]
pub struct Scope(pub FxHashMap<String, Idx>);

impl Scope {
    /// Record every variable declarator of `declarations`.
    ///
    /// A name declared twice keeps the position of its last declaration.
    pub fn collect(&mut self, declarations: &[Declaration]) {
        for declaration in declarations {
            match declaration {
                Declaration::Variable(list) => {
                    for declarator in list {
                        self.insert(declarator.name.clone(), declarator.idx);
                    }
                }
                Declaration::Function(_) => {}
            }
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Metadata {
    node: Option<NodeId>,
    scope: Option<Scope>,
}

impl Metadata {
    pub fn new(node: Option<NodeId>) -> Self {
        Self { node, scope: None }
    }

    /// Frame for `node`, with its scope filled in when the kind declares names.
    pub fn for_node(node: NodeId, kind: &NodeKind) -> Self {
        let mut md = Self::new(Some(node));
        if let Some(declarations) = kind.declarations() {
            md.collect_scope(declarations);
        }
        md
    }

    #[inline(always)]
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub fn collect_scope(&mut self, declarations: &[Declaration]) {
        self.scope
            .get_or_insert_with(Scope::default)
            .collect(declarations);
    }

    pub fn lookup(&self, name: &str) -> Option<Idx> {
        self.scope.as_ref()?.get(name).copied()
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node {
            Some(node) => write!(f, "{{node:{node}}}"),
            None => write!(f, "{{node:<root>}}"),
        }
    }
}

struct Link {
    frame: Rc<Metadata>,
    parent: Option<Rc<Link>>,
}

/// Path of frames from the synthetic root to the node being visited.
#[derive(Clone, Default)]
pub struct Ancestors {
    head: Option<Rc<Link>>,
    len: usize,
}

impl Ancestors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stack holding only the synthetic root frame.
    pub fn root() -> Self {
        Self::new().push(Metadata::new(None))
    }

    /// Return a new stack with `frame` on top. `self` is left as it was.
    #[must_use]
    pub fn push(&self, frame: Metadata) -> Self {
        Self {
            head: Some(Rc::new(Link {
                frame: Rc::new(frame),
                parent: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The innermost frame.
    pub fn current(&self) -> Option<Rc<Metadata>> {
        self.head.as_ref().map(|link| link.frame.clone())
    }

    /// The frame just below the innermost one.
    pub fn parent(&self) -> Option<Rc<Metadata>> {
        self.iter().nth(1).cloned()
    }

    /// Frames from innermost to outermost.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.head.as_deref(),
        }
    }

    /// Frames from outermost to innermost.
    pub fn frames(&self) -> Vec<Rc<Metadata>> {
        let mut frames: Vec<_> = self.iter().cloned().collect();
        frames.reverse();
        frames
    }

    /// Nodes on the path, outermost first. The synthetic root is skipped.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.frames().iter().filter_map(|md| md.node()).collect()
    }

    /// Innermost declaration of `name`, searching outward to the root.
    pub fn find_variable(&self, name: &str) -> Option<Idx> {
        self.iter().find_map(|md| md.lookup(name))
    }

    pub fn find_parent_statement(&self, ast: &Ast) -> Option<NodeId> {
        self.iter()
            .filter_map(|md| md.node())
            .find(|&node| ast.kind(node).is_some_and(NodeKind::is_statement))
    }

    /// The `i`-th enclosing statement, counting from zero. A program counts as
    /// a statement here, so the outermost answer is always the program.
    pub fn find_ith_parent_statement(&self, ast: &Ast, i: usize) -> Option<NodeId> {
        self.find_ith_statement_link(ast, i)
            .and_then(|(link, _)| link.frame.node())
    }

    /// Like [`Self::find_ith_parent_statement`], but returns the stack cut off
    /// right above that statement's frame.
    pub fn find_ith_parent_statement_ancestors(&self, ast: &Ast, i: usize) -> Option<Ancestors> {
        self.find_ith_statement_link(ast, i)
            .map(|(link, len)| Ancestors {
                head: Some(link),
                len,
            })
    }

    pub fn find_parent_function(&self, ast: &Ast) -> Option<NodeId> {
        self.iter()
            .filter_map(|md| md.node())
            .find(|&node| matches!(ast.kind(node), Some(NodeKind::FunctionLiteral(_))))
    }

    fn find_ith_statement_link(&self, ast: &Ast, mut i: usize) -> Option<(Rc<Link>, usize)> {
        let mut cursor = self.head.clone();
        let mut len = self.len;
        while let Some(link) = cursor {
            let is_statement = link.frame.node().and_then(|node| ast.kind(node)).is_some_and(
                |kind| kind.is_statement() || matches!(kind, NodeKind::Program(_)),
            );
            if is_statement {
                if i == 0 {
                    return Some((link, len));
                }
                i -= 1;
            }
            cursor = link.parent.clone();
            len -= 1;
        }
        None
    }
}

impl fmt::Debug for Ancestors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.frames()).finish()
    }
}

pub struct Iter<'a> {
    next: Option<&'a Link>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Rc<Metadata>;

    fn next(&mut self) -> Option<Self::Item> {
        let link = self.next?;
        self.next = link.parent.as_deref();
        Some(&link.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Declarator, Function, Program};
    use crate::source::Loc;

    fn var(names: &[(&str, Idx)]) -> Declaration {
        Declaration::Variable(
            names
                .iter()
                .map(|(name, idx)| Declarator::new(*name, *idx))
                .collect(),
        )
    }

    #[test]
    fn push_does_not_touch_the_original() {
        let root = Ancestors::root();
        let a = root.push(Metadata::new(Some(NodeId(0))));
        let b = root.push(Metadata::new(Some(NodeId(1))));

        assert_eq!(root.len(), 1);
        assert_eq!(a.nodes(), vec![NodeId(0)]);
        assert_eq!(b.nodes(), vec![NodeId(1)]);
        assert_eq!(a.parent().and_then(|md| md.node()), None);
    }

    #[test]
    fn last_declaration_wins_in_one_scope() {
        let mut scope = Scope::default();
        scope.collect(&[var(&[("x", 1)]), var(&[("x", 9), ("y", 3)])]);
        assert_eq!(scope.get("x"), Some(&9));
        assert_eq!(scope.get("y"), Some(&3));
    }

    #[test]
    fn find_variable_prefers_innermost() {
        let mut outer = Metadata::new(Some(NodeId(0)));
        outer.collect_scope(&[var(&[("x", 4), ("z", 8)])]);
        let mut inner = Metadata::new(Some(NodeId(1)));
        inner.collect_scope(&[var(&[("x", 30)])]);

        let stack = Ancestors::root()
            .push(outer)
            .push(inner)
            .push(Metadata::new(Some(NodeId(2))));

        assert_eq!(stack.find_variable("x"), Some(30));
        assert_eq!(stack.find_variable("z"), Some(8));
        assert_eq!(stack.find_variable("nope"), None);
    }

    #[test]
    fn statement_helpers_scan_outward() {
        let mut ast = Ast::new(0);
        let loc = Loc::new(0, 0..0);
        let ident = ast.add_node(NodeKind::Identifier("a".into()), loc.clone());
        let stmt = ast.add_node(NodeKind::ExpressionStatement(ident), loc.clone());
        let body = ast.add_node(NodeKind::BlockStatement(vec![stmt]), loc.clone());
        let func = ast.add_node(
            NodeKind::FunctionLiteral(Function {
                name: None,
                params: vec![],
                body,
                declarations: vec![],
            }),
            loc.clone(),
        );
        let program = ast.add_node(
            NodeKind::Program(Program {
                body: vec![],
                declarations: vec![],
                file: None,
            }),
            loc,
        );

        let stack = [program, func, body, stmt, ident]
            .into_iter()
            .fold(Ancestors::root(), |stack, node| {
                stack.push(Metadata::for_node(node, ast.kind(node).unwrap()))
            });

        assert_eq!(stack.find_parent_statement(&ast), Some(stmt));
        assert_eq!(stack.find_parent_function(&ast), Some(func));
        assert_eq!(stack.find_ith_parent_statement(&ast, 0), Some(stmt));
        assert_eq!(stack.find_ith_parent_statement(&ast, 1), Some(body));
        assert_eq!(stack.find_ith_parent_statement(&ast, 2), Some(program));
        assert_eq!(stack.find_ith_parent_statement(&ast, 3), None);

        let cut = stack.find_ith_parent_statement_ancestors(&ast, 1).unwrap();
        assert_eq!(cut.len(), 4);
        assert_eq!(cut.current().and_then(|md| md.node()), Some(body));
    }
}
