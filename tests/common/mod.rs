#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use ecma_walker::{
    Ast, Hook, NodeId, NodeKind, Visitor,
    ast::{Declaration, Declarator, Function, Program},
    source::{Loc, SourceFile},
};
use proptest::prelude::*;

/// Small helper for assembling trees by hand. Every node gets a one-byte span
/// at an offset equal to its id, unless placed explicitly with [`Self::at`].
pub struct TreeBuilder {
    pub ast: Ast,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self { ast: Ast::new(0) }
    }

    pub fn add(&mut self, kind: NodeKind) -> NodeId {
        let offset = self.ast.nodes.len();
        self.ast.add_node(kind, Loc::new(0, offset..offset + 1))
    }

    pub fn at(&mut self, kind: NodeKind, span: core::ops::Range<usize>) -> NodeId {
        self.ast.add_node(kind, Loc::new(0, span))
    }

    pub fn ident(&mut self, name: &str) -> NodeId {
        self.add(NodeKind::Identifier(name.into()))
    }

    pub fn call(&mut self, callee: &str) -> NodeId {
        let callee = self.ident(callee);
        self.add(NodeKind::CallExpression {
            callee,
            arguments: vec![],
        })
    }

    pub fn call_stmt(&mut self, callee: &str) -> NodeId {
        let call = self.call(callee);
        self.add(NodeKind::ExpressionStatement(call))
    }

    pub fn block(&mut self, stmts: Vec<NodeId>) -> NodeId {
        self.add(NodeKind::BlockStatement(stmts))
    }

    pub fn if_stmt(&mut self, test: &str, consequent: NodeId, alternate: Option<NodeId>) -> NodeId {
        let test = self.ident(test);
        self.add(NodeKind::IfStatement {
            test,
            consequent,
            alternate,
        })
    }

    pub fn var_stmt(&mut self, name: &str) -> NodeId {
        let var = self.add(NodeKind::VariableExpression {
            name: name.into(),
            initializer: None,
        });
        self.add(NodeKind::VariableStatement(vec![var]))
    }

    pub fn function(&mut self, body: NodeId, vars: &[(&str, usize)]) -> NodeId {
        self.add(NodeKind::FunctionLiteral(Function {
            name: None,
            params: vec![],
            body,
            declarations: declare(vars),
        }))
    }

    pub fn program(&mut self, body: Vec<NodeId>, vars: &[(&str, usize)]) -> NodeId {
        self.add(NodeKind::Program(Program {
            body,
            declarations: declare(vars),
            file: None,
        }))
    }

    pub fn program_with_source(&mut self, body: Vec<NodeId>, name: &str, text: &str) -> NodeId {
        let len = text.len();
        self.at(
            NodeKind::Program(Program {
                body,
                declarations: vec![],
                file: Some(SourceFile::new(0, name, text)),
            }),
            0..len,
        )
    }
}

fn declare(vars: &[(&str, usize)]) -> Vec<Declaration> {
    if vars.is_empty() {
        return vec![];
    }
    vec![Declaration::Variable(
        vars.iter().map(|(name, idx)| Declarator::new(*name, *idx)).collect(),
    )]
}

/// Installs an on-enter hook that records every entered node.
pub fn record_visits<V: Visitor>(visitor: &mut V) -> Rc<RefCell<Vec<NodeId>>> {
    let visits = Rc::new(RefCell::new(Vec::new()));
    let sink = visits.clone();
    visitor.add_hook(Hook::new().on_enter(move |_, node, _| {
        sink.borrow_mut().push(node);
        Ok(())
    }));
    visits
}

/// True when every control-flow body reachable from `node` is a block.
pub fn bodies_are_blocks(ast: &Ast, node: NodeId) -> bool {
    let Some(kind) = ast.kind(node) else {
        return false;
    };
    let all = |ids: &[NodeId]| ids.iter().all(|id| bodies_are_blocks(ast, *id));
    let body = |id: NodeId| ast.is_block(id) && bodies_are_blocks(ast, id);

    match kind {
        NodeKind::Program(program) => all(&program.body),
        NodeKind::BlockStatement(list) => all(list),
        NodeKind::FunctionStatement(func) => bodies_are_blocks(ast, *func),
        NodeKind::FunctionLiteral(func) => body(func.body),
        NodeKind::IfStatement {
            consequent,
            alternate,
            ..
        } => body(*consequent) && alternate.is_some_and(body),
        NodeKind::WhileStatement { body: b, .. }
        | NodeKind::DoWhileStatement { body: b, .. }
        | NodeKind::ForStatement { body: b, .. }
        | NodeKind::ForInStatement { body: b, .. }
        | NodeKind::WithStatement { body: b, .. }
        | NodeKind::CatchStatement { body: b, .. } => body(*b),
        NodeKind::LabelledStatement { statement, .. } => body(*statement),
        NodeKind::TryStatement { body: b, catch, finally } => {
            body(*b) && catch.is_none_or(|c| bodies_are_blocks(ast, c)) && finally.is_some_and(body)
        }
        NodeKind::SwitchStatement { body: cases, .. } => all(cases),
        NodeKind::CaseStatement { consequent, .. } => {
            consequent.len() == 1 && body(consequent[0])
        }
        _ => true,
    }
}

/// Shape of a randomly generated statement.
#[derive(Debug, Clone)]
pub enum Stmt {
    Call(String),
    Var(String),
    Block(Vec<Stmt>),
    If(Box<Stmt>, Option<Box<Stmt>>),
    While(Box<Stmt>),
    DoWhile(Box<Stmt>),
    For(Box<Stmt>),
    ForIn(Box<Stmt>),
    With(Box<Stmt>),
    Labelled(Box<Stmt>),
    Try(Box<Stmt>, Option<Box<Stmt>>, Option<Box<Stmt>>),
    Switch(Vec<Vec<Stmt>>),
    Function(Box<Stmt>),
}

fn arb_name() -> impl Strategy<Value = String> {
    "[a-e]".prop_map(|s| s.to_string())
}

pub fn arb_stmt() -> impl Strategy<Value = Stmt> {
    let leaf = prop_oneof![arb_name().prop_map(Stmt::Call), arb_name().prop_map(Stmt::Var)];
    leaf.prop_recursive(4, 48, 4, |inner| {
        let boxed = inner.clone().prop_map(Box::new);
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Stmt::Block),
            (boxed.clone(), prop::option::of(boxed.clone())).prop_map(|(c, a)| Stmt::If(c, a)),
            boxed.clone().prop_map(Stmt::While),
            boxed.clone().prop_map(Stmt::DoWhile),
            prop_oneof![boxed.clone().prop_map(Stmt::For), boxed.clone().prop_map(Stmt::ForIn)],
            boxed.clone().prop_map(Stmt::With),
            boxed.clone().prop_map(Stmt::Labelled),
            (boxed.clone(), prop::option::of(boxed.clone()), prop::option::of(boxed.clone()))
                .prop_map(|(b, c, f)| Stmt::Try(b, c, f)),
            prop::collection::vec(prop::collection::vec(inner.clone(), 0..3), 0..3)
                .prop_map(Stmt::Switch),
            boxed.prop_map(Stmt::Function),
        ]
    })
}

pub fn arb_program() -> impl Strategy<Value = Vec<Stmt>> {
    prop::collection::vec(arb_stmt(), 0..5)
}

impl TreeBuilder {
    /// Lowers a generated shape into nodes. Every created node is reachable
    /// from the returned id.
    pub fn build(&mut self, stmt: &Stmt) -> NodeId {
        match stmt {
            Stmt::Call(name) => self.call_stmt(name),
            Stmt::Var(name) => self.var_stmt(name),
            Stmt::Block(list) => {
                let list = list.iter().map(|s| self.build(s)).collect();
                self.block(list)
            }
            Stmt::If(consequent, alternate) => {
                let consequent = self.build(consequent);
                let alternate = alternate.as_ref().map(|a| self.build(a));
                self.if_stmt("t", consequent, alternate)
            }
            Stmt::While(body) => {
                let test = self.ident("t");
                let body = self.build(body);
                self.add(NodeKind::WhileStatement { test, body })
            }
            Stmt::DoWhile(body) => {
                let body = self.build(body);
                let test = self.ident("t");
                self.add(NodeKind::DoWhileStatement { test, body })
            }
            Stmt::For(body) => {
                let test = self.ident("t");
                let body = self.build(body);
                self.add(NodeKind::ForStatement {
                    initializer: None,
                    test: Some(test),
                    update: None,
                    body,
                })
            }
            Stmt::ForIn(body) => {
                let into = self.ident("k");
                let source = self.ident("o");
                let body = self.build(body);
                self.add(NodeKind::ForInStatement { into, source, body })
            }
            Stmt::With(body) => {
                let object = self.ident("o");
                let body = self.build(body);
                self.add(NodeKind::WithStatement { object, body })
            }
            Stmt::Labelled(body) => {
                let label = self.ident("l");
                let statement = self.build(body);
                self.add(NodeKind::LabelledStatement { label, statement })
            }
            Stmt::Try(body, catch, finally) => {
                let body = self.build(body);
                let catch = catch.as_ref().map(|c| {
                    let parameter = self.ident("e");
                    let body = self.build(c);
                    self.add(NodeKind::CatchStatement { parameter, body })
                });
                let finally = finally.as_ref().map(|f| self.build(f));
                self.add(NodeKind::TryStatement { body, catch, finally })
            }
            Stmt::Switch(cases) => {
                let discriminant = self.ident("d");
                let body = cases
                    .iter()
                    .map(|case| {
                        let consequent = case.iter().map(|s| self.build(s)).collect();
                        self.add(NodeKind::CaseStatement {
                            test: None,
                            consequent,
                        })
                    })
                    .collect();
                self.add(NodeKind::SwitchStatement { discriminant, body })
            }
            Stmt::Function(body) => {
                let body = self.build(body);
                let func = self.function(body, &[]);
                self.add(NodeKind::FunctionStatement(func))
            }
        }
    }

    pub fn build_program(&mut self, stmts: &[Stmt]) -> NodeId {
        let body = stmts.iter().map(|s| self.build(s)).collect();
        self.program(body, &[])
    }
}
