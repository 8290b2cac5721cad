//! The traversal driver.
//!
//! A [`Walker`] borrows a tree for the length of a traversal and drives a
//! [`Visitor`] over it: every `walk` call pushes a frame for the node, fires the
//! visitor's hooks and dispatches to the operation for the node's kind. The
//! operations recurse by calling `walk` again on the node's children.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{debug, error, trace, warn};

use crate::{
    ast::{Ast, NodeId, NodeKind},
    error::{Fault, HookError, WalkError},
    metadata::{Ancestors, Metadata},
    passes::Visitor,
    source::{Idx, Position},
};

/// Result of a single dispatch: the visited node's frame, or `None` when the
/// node's kind has no operation.
pub type WalkResult = Result<Option<Rc<Metadata>>, WalkError>;

#[derive(Debug, Clone, Copy, Default)]
pub struct WalkerConfig {
    /// Run `begin` inside a fault boundary that turns errors and panics into
    /// a reported [`Fault`] instead of returning them to the caller.
    pub catch_faults: bool,
}

pub struct Walker<'a> {
    ast: &'a mut Ast,
    config: WalkerConfig,
    current: Option<NodeId>,
    parent: Option<NodeId>,
    program: Option<NodeId>,
    hook_failures: Vec<HookError>,
    faults: Vec<Fault>,
}

impl<'a> Walker<'a> {
    pub fn new(ast: &'a mut Ast) -> Self {
        Self::with_config(ast, WalkerConfig::default())
    }

    pub fn with_config(ast: &'a mut Ast, config: WalkerConfig) -> Self {
        Self {
            ast,
            config,
            current: None,
            parent: None,
            program: None,
            hook_failures: Vec::new(),
            faults: Vec::new(),
        }
    }

    pub fn catch_faults(mut self, enabled: bool) -> Self {
        self.config.catch_faults = enabled;
        self
    }

    pub fn config(&self) -> WalkerConfig {
        self.config
    }

    pub fn ast(&self) -> &Ast {
        self.ast
    }

    pub fn ast_mut(&mut self) -> &mut Ast {
        self.ast
    }

    /// Node most recently entered.
    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    /// Parent of the node most recently entered.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn hook_failures(&self) -> &[HookError] {
        &self.hook_failures
    }

    pub fn faults(&self) -> &[Fault] {
        &self.faults
    }

    /// Line/column of `idx` in the program reached by the latest `begin`.
    /// `None` when that traversal never entered a program node.
    pub fn position(&self, idx: Idx) -> Option<Position> {
        self.ast.program_file(self.program?)?.position(idx)
    }

    /// Run one full traversal from `root`.
    ///
    /// On success the on-finished hooks run with the root's metadata, which is
    /// then returned. With `catch_faults` enabled a failed traversal is
    /// recorded in [`Self::faults`] and `Ok(None)` is returned. Rendering the
    /// recorded faults is left to the caller, see [`Fault::report`].
    pub fn begin<V: Visitor>(&mut self, visitor: &mut V, root: NodeId) -> WalkResult {
        debug!(root = root.0, catch_faults = self.config.catch_faults, "traversal started");
        self.program = None;
        let stack = Ancestors::root();

        let metadata = if self.config.catch_faults {
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| self.walk(visitor, root, &stack)));
            match outcome {
                Ok(Ok(metadata)) => metadata,
                Ok(Err(err)) => {
                    self.record_fault(err.to_string());
                    return Ok(None);
                }
                Err(payload) => {
                    self.record_fault(panic_message(payload.as_ref()));
                    return Ok(None);
                }
            }
        } else {
            self.walk(visitor, root, &stack)?
        };

        let failures = visitor
            .hooks_mut()
            .fire_finished(&*self.ast, root, metadata.as_ref());
        self.note_hook_failures(failures);

        debug!(root = root.0, "traversal finished");
        Ok(metadata)
    }

    /// Visit `node` below the frames in `stack`.
    pub fn walk<V: Visitor>(&mut self, visitor: &mut V, node: NodeId, stack: &Ancestors) -> WalkResult {
        self.current = Some(node);
        self.parent = stack.current().and_then(|md| md.node());

        let Some(kind) = self.ast.kind(node) else {
            return Err(WalkError::MissingNode {
                node,
                parent: self.parent,
            });
        };
        trace!(node = node.0, kind = kind.name(), depth = stack.len() + 1, "visit");
        let stack = stack.push(Metadata::for_node(node, kind));

        let failures = visitor.hooks_mut().fire_enter(&*self.ast, node, &stack);
        self.note_hook_failures(failures);

        let result = self.dispatch(visitor, node, &stack)?;

        let failures = visitor.hooks_mut().fire_leave(&*self.ast, node, &stack);
        self.note_hook_failures(failures);

        Ok(result)
    }

    fn dispatch<V: Visitor>(&mut self, v: &mut V, node: NodeId, stack: &Ancestors) -> WalkResult {
        match self.ast.kind(node) {
            Some(NodeKind::Program(_)) => {
                self.program = Some(node);
                v.visit_program(self, node, stack)
            }
            Some(NodeKind::ArrayLiteral(_)) => v.visit_array(self, node, stack),
            Some(NodeKind::AssignExpression { .. }) => v.visit_assign(self, node, stack),
            Some(NodeKind::BadExpression) => v.visit_bad(self, node, stack),
            Some(NodeKind::BinaryExpression { .. }) => v.visit_binary(self, node, stack),
            Some(NodeKind::BooleanLiteral(_)) => v.visit_boolean(self, node, stack),
            Some(NodeKind::BracketExpression { .. }) => v.visit_bracket(self, node, stack),
            Some(NodeKind::CallExpression { .. }) => v.visit_call(self, node, stack),
            Some(NodeKind::ConditionalExpression { .. }) => v.visit_conditional(self, node, stack),
            Some(NodeKind::DotExpression { .. }) => v.visit_dot(self, node, stack),
            Some(NodeKind::EmptyExpression) => v.visit_empty(self, node, stack),
            Some(NodeKind::FunctionLiteral(_)) => v.visit_function(self, node, stack),
            Some(NodeKind::Identifier(_)) => v.visit_identifier(self, node, stack),
            Some(NodeKind::NewExpression { .. }) => v.visit_new(self, node, stack),
            Some(NodeKind::NullLiteral) => v.visit_null(self, node, stack),
            Some(NodeKind::NumberLiteral { .. }) => v.visit_number(self, node, stack),
            Some(NodeKind::ObjectLiteral(_)) => v.visit_object(self, node, stack),
            Some(NodeKind::RegExpLiteral { .. }) => v.visit_regex(self, node, stack),
            Some(NodeKind::SequenceExpression(_)) => v.visit_sequence(self, node, stack),
            Some(NodeKind::StringLiteral { .. }) => v.visit_string(self, node, stack),
            Some(NodeKind::ThisExpression) => v.visit_this(self, node, stack),
            Some(NodeKind::UnaryExpression { .. }) => v.visit_unary(self, node, stack),
            Some(NodeKind::VariableExpression { .. }) => v.visit_variable(self, node, stack),
            Some(NodeKind::BadStatement) => v.visit_bad_statement(self, node, stack),
            Some(NodeKind::BlockStatement(_)) => v.visit_block(self, node, stack),
            Some(NodeKind::BranchStatement { .. }) => v.visit_branch(self, node, stack),
            Some(NodeKind::CaseStatement { .. }) => v.visit_case(self, node, stack),
            Some(NodeKind::CatchStatement { .. }) => v.visit_catch(self, node, stack),
            Some(NodeKind::DebuggerStatement) => v.visit_debugger(self, node, stack),
            Some(NodeKind::DoWhileStatement { .. }) => v.visit_do_while(self, node, stack),
            Some(NodeKind::EmptyStatement) => v.visit_empty_statement(self, node, stack),
            Some(NodeKind::ExpressionStatement(_)) => v.visit_expression(self, node, stack),
            Some(NodeKind::ForInStatement { .. }) => v.visit_for_in(self, node, stack),
            Some(NodeKind::ForStatement { .. }) => v.visit_for(self, node, stack),
            Some(NodeKind::FunctionStatement(_)) => v.visit_function_statement(self, node, stack),
            Some(NodeKind::IfStatement { .. }) => v.visit_if(self, node, stack),
            Some(NodeKind::LabelledStatement { .. }) => v.visit_labelled(self, node, stack),
            Some(NodeKind::ReturnStatement(_)) => v.visit_return(self, node, stack),
            Some(NodeKind::SwitchStatement { .. }) => v.visit_switch(self, node, stack),
            Some(NodeKind::ThrowStatement(_)) => v.visit_throw(self, node, stack),
            Some(NodeKind::TryStatement { .. }) => v.visit_try(self, node, stack),
            Some(NodeKind::VariableStatement(_)) => v.visit_variable_statement(self, node, stack),
            Some(NodeKind::WhileStatement { .. }) => v.visit_while(self, node, stack),
            Some(NodeKind::WithStatement { .. }) => v.visit_with(self, node, stack),
            Some(NodeKind::Opaque { kind }) => {
                debug!(node = node.0, kind = %kind, "no operation for node kind");
                Ok(None)
            }
            None => Err(WalkError::MissingNode {
                node,
                parent: self.parent,
            }),
        }
    }

    fn note_hook_failures(&mut self, failures: Vec<HookError>) {
        for failure in failures {
            warn!(node = ?failure.node, error = %failure.message, "hook failed");
            self.hook_failures.push(failure);
        }
    }

    fn record_fault(&mut self, message: String) {
        let resolve = |id: Option<NodeId>| {
            id.and_then(|id| self.ast.get_node(id))
                .map(|node| (node.kind.name(), node.loc.clone()))
        };
        let (node_kind, loc) = resolve(self.current).or_else(|| resolve(self.parent)).unzip();
        let position = loc.as_ref().and_then(|loc| self.position(loc.start()));

        let fault = Fault {
            message,
            current: self.current,
            parent: self.parent,
            node_kind,
            loc,
            position,
            backtrace: Backtrace::force_capture().to_string(),
        };
        error!(
            current = ?fault.current,
            parent = ?fault.parent,
            backtrace = %fault.backtrace,
            "traversal aborted: {fault}"
        );
        self.faults.push(fault);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "traversal panicked".to_string()
    }
}
