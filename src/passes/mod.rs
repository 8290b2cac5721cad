use crate::ast::*;
use crate::error::WalkError;
use crate::hooks::{Hook, HookRegistry};
use crate::metadata::Ancestors;
use crate::walker::{WalkResult, Walker};

pub mod block_normalize;

// Helper macro for pulling a node's child ids out of the arena. Fails the
// traversal when the node is missing or of another kind.
macro_rules! fields {
    ($walker:expr, $node:expr, $variant:ident { $($field:ident),+ }) => {
        match $walker.ast().kind($node) {
            Some(NodeKind::$variant { $($field),+, .. }) => ($($field.clone()),+),
            other => return Err(mismatch($node, stringify!($variant), other)),
        }
    };
    ($walker:expr, $node:expr, $variant:ident ( $field:ident )) => {
        match $walker.ast().kind($node) {
            Some(NodeKind::$variant($field)) => $field.clone(),
            other => return Err(mismatch($node, stringify!($variant), other)),
        }
    };
}

// Helper macro for walking an Option<NodeId>
macro_rules! walk_opt {
    ($walker:expr, $visitor:expr, $node_opt:expr, $stack:expr) => {
        if let Some(node) = $node_opt {
            $walker.walk($visitor, node, $stack)?;
        }
    };
}

// Helper macro for walking a Vec<NodeId> in order
macro_rules! walk_vec {
    ($walker:expr, $visitor:expr, $nodes:expr, $stack:expr) => {
        for node in $nodes {
            $walker.walk($visitor, node, $stack)?;
        }
    };
}

pub(crate) use fields;

pub(crate) fn mismatch(node: NodeId, expected: &'static str, found: Option<&NodeKind>) -> WalkError {
    match found {
        Some(kind) => WalkError::UnexpectedKind {
            node,
            expected,
            found: kind.name(),
        },
        None => WalkError::MissingNode { node, parent: None },
    }
}

/// One operation per node kind. Every operation defaults to the matching
/// `walk_*` function, which visits the node's children in source order and
/// returns the node's own frame.
///
/// Override an operation to intercept a kind and call the `walk_*` function
/// from the override to keep the default recursion. Leaving it out prunes the
/// subtree.
pub trait Visitor: Sized {
    // Required hook accessors
    fn hooks(&self) -> &HookRegistry;
    fn hooks_mut(&mut self) -> &mut HookRegistry;

    // Provided hook utilities
    fn add_hook(&mut self, hook: Hook) {
        self.hooks_mut().add(hook);
    }
    fn reset_hooks(&mut self) {
        self.hooks_mut().reset();
    }

    fn visit_program(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_program(self, w, node, stack)
    }

    // Expressions
    fn visit_array(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_array(self, w, node, stack)
    }
    fn visit_assign(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_assign(self, w, node, stack)
    }
    fn visit_bad(&mut self, _w: &mut Walker<'_>, _node: NodeId, stack: &Ancestors) -> WalkResult {
        // Terminal node
        Ok(stack.current())
    }
    fn visit_binary(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_binary(self, w, node, stack)
    }
    fn visit_boolean(&mut self, _w: &mut Walker<'_>, _node: NodeId, stack: &Ancestors) -> WalkResult {
        // Terminal node
        Ok(stack.current())
    }
    fn visit_bracket(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_bracket(self, w, node, stack)
    }
    fn visit_call(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_call(self, w, node, stack)
    }
    fn visit_conditional(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_conditional(self, w, node, stack)
    }
    fn visit_dot(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_dot(self, w, node, stack)
    }
    fn visit_empty(&mut self, _w: &mut Walker<'_>, _node: NodeId, stack: &Ancestors) -> WalkResult {
        // Terminal node
        Ok(stack.current())
    }
    fn visit_function(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_function(self, w, node, stack)
    }
    fn visit_identifier(&mut self, _w: &mut Walker<'_>, _node: NodeId, stack: &Ancestors) -> WalkResult {
        // Terminal node
        Ok(stack.current())
    }
    fn visit_new(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_new(self, w, node, stack)
    }
    fn visit_null(&mut self, _w: &mut Walker<'_>, _node: NodeId, stack: &Ancestors) -> WalkResult {
        // Terminal node
        Ok(stack.current())
    }
    fn visit_number(&mut self, _w: &mut Walker<'_>, _node: NodeId, stack: &Ancestors) -> WalkResult {
        // Terminal node
        Ok(stack.current())
    }
    fn visit_object(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_object(self, w, node, stack)
    }
    fn visit_regex(&mut self, _w: &mut Walker<'_>, _node: NodeId, stack: &Ancestors) -> WalkResult {
        // Terminal node
        Ok(stack.current())
    }
    fn visit_sequence(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_sequence(self, w, node, stack)
    }
    fn visit_string(&mut self, _w: &mut Walker<'_>, _node: NodeId, stack: &Ancestors) -> WalkResult {
        // Terminal node
        Ok(stack.current())
    }
    fn visit_this(&mut self, _w: &mut Walker<'_>, _node: NodeId, stack: &Ancestors) -> WalkResult {
        // Terminal node
        Ok(stack.current())
    }
    fn visit_unary(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_unary(self, w, node, stack)
    }
    fn visit_variable(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_variable(self, w, node, stack)
    }

    // Statements
    fn visit_bad_statement(&mut self, _w: &mut Walker<'_>, _node: NodeId, stack: &Ancestors) -> WalkResult {
        // Terminal node
        Ok(stack.current())
    }
    fn visit_block(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_block(self, w, node, stack)
    }
    fn visit_branch(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_branch(self, w, node, stack)
    }
    fn visit_case(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_case(self, w, node, stack)
    }
    fn visit_catch(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_catch(self, w, node, stack)
    }
    fn visit_debugger(&mut self, _w: &mut Walker<'_>, _node: NodeId, stack: &Ancestors) -> WalkResult {
        // Terminal node
        Ok(stack.current())
    }
    fn visit_do_while(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_do_while(self, w, node, stack)
    }
    fn visit_empty_statement(&mut self, _w: &mut Walker<'_>, _node: NodeId, stack: &Ancestors) -> WalkResult {
        // Terminal node
        Ok(stack.current())
    }
    fn visit_expression(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_expression(self, w, node, stack)
    }
    fn visit_for_in(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_for_in(self, w, node, stack)
    }
    fn visit_for(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_for(self, w, node, stack)
    }
    fn visit_function_statement(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_function_statement(self, w, node, stack)
    }
    fn visit_if(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_if(self, w, node, stack)
    }
    fn visit_labelled(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_labelled(self, w, node, stack)
    }
    fn visit_return(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_return(self, w, node, stack)
    }
    fn visit_switch(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_switch(self, w, node, stack)
    }
    fn visit_throw(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_throw(self, w, node, stack)
    }
    fn visit_try(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_try(self, w, node, stack)
    }
    fn visit_variable_statement(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_variable_statement(self, w, node, stack)
    }
    fn visit_while(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_while(self, w, node, stack)
    }
    fn visit_with(&mut self, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
        walk_with(self, w, node, stack)
    }
}

/// The plain recursive-descent visitor. Carries nothing but its hooks.
#[derive(Default)]
pub struct DefaultVisitor {
    pub hooks: HookRegistry,
}

impl DefaultVisitor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Visitor for DefaultVisitor {
    fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }
    fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }
}

// Default traversal functions (walk_...)

pub fn walk_program<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let body = match w.ast().kind(node) {
        Some(NodeKind::Program(program)) => program.body.clone(),
        other => return Err(mismatch(node, "Program", other)),
    };
    walk_vec!(w, v, body, stack);
    Ok(stack.current())
}

pub fn walk_array<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let elements = fields!(w, node, ArrayLiteral(elements));
    // Holes carry no node
    walk_vec!(w, v, elements.into_iter().flatten(), stack);
    Ok(stack.current())
}

pub fn walk_assign<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let (left, right) = fields!(w, node, AssignExpression { left, right });
    w.walk(v, left, stack)?;
    w.walk(v, right, stack)?;
    Ok(stack.current())
}

pub fn walk_binary<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let (left, right) = fields!(w, node, BinaryExpression { left, right });
    w.walk(v, left, stack)?;
    w.walk(v, right, stack)?;
    Ok(stack.current())
}

pub fn walk_bracket<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let (left, member) = fields!(w, node, BracketExpression { left, member });
    w.walk(v, left, stack)?;
    w.walk(v, member, stack)?;
    Ok(stack.current())
}

pub fn walk_call<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let (callee, arguments) = fields!(w, node, CallExpression { callee, arguments });
    w.walk(v, callee, stack)?;
    walk_vec!(w, v, arguments, stack);
    Ok(stack.current())
}

pub fn walk_conditional<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let (test, consequent, alternate) =
        fields!(w, node, ConditionalExpression { test, consequent, alternate });
    w.walk(v, test, stack)?;
    w.walk(v, consequent, stack)?;
    w.walk(v, alternate, stack)?;
    Ok(stack.current())
}

pub fn walk_dot<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let (left, identifier) = fields!(w, node, DotExpression { left, identifier });
    w.walk(v, left, stack)?;
    w.walk(v, identifier, stack)?;
    Ok(stack.current())
}

pub fn walk_function<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let (name, params, body) = match w.ast().kind(node) {
        Some(NodeKind::FunctionLiteral(func)) => (func.name, func.params.clone(), func.body),
        other => return Err(mismatch(node, "FunctionLiteral", other)),
    };
    walk_opt!(w, v, name, stack);
    walk_vec!(w, v, params, stack);
    w.walk(v, body, stack)?;
    Ok(stack.current())
}

pub fn walk_new<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let (callee, arguments) = fields!(w, node, NewExpression { callee, arguments });
    w.walk(v, callee, stack)?;
    walk_vec!(w, v, arguments, stack);
    Ok(stack.current())
}

pub fn walk_object<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    // Keys are plain strings, only the values are nodes
    let values: Vec<NodeId> = match w.ast().kind(node) {
        Some(NodeKind::ObjectLiteral(properties)) => properties.iter().map(|p| p.value).collect(),
        other => return Err(mismatch(node, "ObjectLiteral", other)),
    };
    walk_vec!(w, v, values, stack);
    Ok(stack.current())
}

pub fn walk_sequence<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let sequence = fields!(w, node, SequenceExpression(sequence));
    walk_vec!(w, v, sequence, stack);
    Ok(stack.current())
}

pub fn walk_unary<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let operand = fields!(w, node, UnaryExpression { operand });
    w.walk(v, operand, stack)?;
    Ok(stack.current())
}

pub fn walk_variable<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let initializer = fields!(w, node, VariableExpression { initializer });
    walk_opt!(w, v, initializer, stack);
    Ok(stack.current())
}

pub fn walk_block<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let list = fields!(w, node, BlockStatement(list));
    walk_vec!(w, v, list, stack);
    Ok(stack.current())
}

pub fn walk_branch<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let label = fields!(w, node, BranchStatement { label });
    walk_opt!(w, v, label, stack);
    Ok(stack.current())
}

pub fn walk_case<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let (test, consequent) = fields!(w, node, CaseStatement { test, consequent });
    walk_opt!(w, v, test, stack);
    walk_vec!(w, v, consequent, stack);
    Ok(stack.current())
}

pub fn walk_catch<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let (parameter, body) = fields!(w, node, CatchStatement { parameter, body });
    w.walk(v, parameter, stack)?;
    w.walk(v, body, stack)?;
    Ok(stack.current())
}

pub fn walk_do_while<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let (body, test) = fields!(w, node, DoWhileStatement { body, test });
    w.walk(v, body, stack)?;
    w.walk(v, test, stack)?;
    Ok(stack.current())
}

pub fn walk_expression<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let expression = fields!(w, node, ExpressionStatement(expression));
    w.walk(v, expression, stack)?;
    Ok(stack.current())
}

pub fn walk_for_in<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let (into, source, body) = fields!(w, node, ForInStatement { into, source, body });
    w.walk(v, into, stack)?;
    w.walk(v, source, stack)?;
    w.walk(v, body, stack)?;
    Ok(stack.current())
}

pub fn walk_for<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let (initializer, test, update, body) =
        fields!(w, node, ForStatement { initializer, test, update, body });
    walk_opt!(w, v, initializer, stack);
    walk_opt!(w, v, test, stack);
    walk_opt!(w, v, update, stack);
    w.walk(v, body, stack)?;
    Ok(stack.current())
}

pub fn walk_function_statement<V: Visitor>(
    v: &mut V,
    w: &mut Walker<'_>,
    node: NodeId,
    stack: &Ancestors,
) -> WalkResult {
    let function = fields!(w, node, FunctionStatement(function));
    w.walk(v, function, stack)?;
    Ok(stack.current())
}

pub fn walk_if<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let (test, consequent, alternate) = fields!(w, node, IfStatement { test, consequent, alternate });
    w.walk(v, test, stack)?;
    w.walk(v, consequent, stack)?;
    walk_opt!(w, v, alternate, stack);
    Ok(stack.current())
}

pub fn walk_labelled<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let (label, statement) = fields!(w, node, LabelledStatement { label, statement });
    w.walk(v, label, stack)?;
    w.walk(v, statement, stack)?;
    Ok(stack.current())
}

pub fn walk_return<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let argument = fields!(w, node, ReturnStatement(argument));
    walk_opt!(w, v, argument, stack);
    Ok(stack.current())
}

pub fn walk_switch<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let (discriminant, body) = fields!(w, node, SwitchStatement { discriminant, body });
    w.walk(v, discriminant, stack)?;
    walk_vec!(w, v, body, stack);
    Ok(stack.current())
}

pub fn walk_throw<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let argument = fields!(w, node, ThrowStatement(argument));
    w.walk(v, argument, stack)?;
    Ok(stack.current())
}

pub fn walk_try<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let (body, catch, finally) = fields!(w, node, TryStatement { body, catch, finally });
    w.walk(v, body, stack)?;
    walk_opt!(w, v, catch, stack);
    walk_opt!(w, v, finally, stack);
    Ok(stack.current())
}

pub fn walk_variable_statement<V: Visitor>(
    v: &mut V,
    w: &mut Walker<'_>,
    node: NodeId,
    stack: &Ancestors,
) -> WalkResult {
    let list = fields!(w, node, VariableStatement(list));
    walk_vec!(w, v, list, stack);
    Ok(stack.current())
}

pub fn walk_while<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let (test, body) = fields!(w, node, WhileStatement { test, body });
    w.walk(v, test, stack)?;
    w.walk(v, body, stack)?;
    Ok(stack.current())
}

pub fn walk_with<V: Visitor>(v: &mut V, w: &mut Walker<'_>, node: NodeId, stack: &Ancestors) -> WalkResult {
    let (object, body) = fields!(w, node, WithStatement { object, body });
    w.walk(v, object, stack)?;
    w.walk(v, body, stack)?;
    Ok(stack.current())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Loc;

    fn loc() -> Loc {
        Loc::new(0, 0..0)
    }

    #[test]
    fn fields_reports_kind_mismatch() {
        let mut ast = Ast::new(0);
        let ident = ast.add_node(NodeKind::Identifier("a".into()), loc());
        let mut walker = Walker::new(&mut ast);
        let mut visitor = DefaultVisitor::new();

        let err = walk_if(&mut visitor, &mut walker, ident, &Ancestors::root()).unwrap_err();
        assert_eq!(
            err,
            WalkError::UnexpectedKind {
                node: ident,
                expected: "IfStatement",
                found: "Identifier",
            }
        );
    }

    #[test]
    fn array_holes_are_skipped() {
        let mut ast = Ast::new(0);
        let a = ast.add_node(NodeKind::Identifier("a".into()), loc());
        let b = ast.add_node(NodeKind::Identifier("b".into()), loc());
        let array = ast.add_node(NodeKind::ArrayLiteral(vec![Some(a), None, Some(b)]), loc());

        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut visitor = DefaultVisitor::new();
        let log = seen.clone();
        visitor.add_hook(Hook::new().on_enter(move |_, node, _| {
            log.borrow_mut().push(node);
            Ok(())
        }));

        Walker::new(&mut ast).begin(&mut visitor, array).unwrap();
        assert_eq!(*seen.borrow(), vec![array, a, b]);
    }

    #[test]
    fn leaf_returns_its_own_frame() {
        let mut ast = Ast::new(0);
        let this = ast.add_node(NodeKind::ThisExpression, loc());
        let md = Walker::new(&mut ast)
            .begin(&mut DefaultVisitor::new(), this)
            .unwrap()
            .unwrap();
        assert_eq!(md.node(), Some(this));
    }
}
