use std::cell::RefCell;
use std::fmt::Write;
use std::rc::Rc;

use colored::Colorize;

use crate::{
    ast::{Ast, BranchToken, NodeId, NodeKind, PropertyKind},
    error::WalkError,
    hooks::Hook,
    passes::Visitor,
    walker::Walker,
};

pub fn pretty_print_ast(ast: &Ast, root: NodeId, ind: usize) {
    print!("{}", render_ast(ast, root, ind));
}

/// Indented outline of the statement tree under `root`.
pub fn render_ast(ast: &Ast, root: NodeId, ind: usize) -> String {
    let mut out = String::new();
    render_stmt(&mut out, ast, root, ind);
    out
}

fn line(out: &mut String, ind: usize, text: impl std::fmt::Display) {
    // Writing into a String cannot fail
    let _ = writeln!(out, "{}{text}", " ".repeat(ind * 4));
}

fn render_body(out: &mut String, ast: &Ast, stmts: &[NodeId], ind: usize) {
    for stmt in stmts {
        render_stmt(out, ast, *stmt, ind);
    }
}

fn render_stmt(out: &mut String, ast: &Ast, root: NodeId, ind: usize) {
    let Some(cnode) = ast.get_node(root) else {
        line(out, ind, "<dangling>".black().on_bright_yellow());
        return;
    };

    match &cnode.kind {
        NodeKind::Program(program) => {
            let name = program.file.as_ref().map_or("<unnamed>", |f| f.name.as_str());
            line(out, ind, format!("{} {} {{", "program".yellow(), name.cyan()));
            render_body(out, ast, &program.body, ind + 1);
            line(out, ind, "}");
        }

        NodeKind::BlockStatement(stmts) => {
            line(out, ind, format!("{} {{", "block".yellow()));
            render_body(out, ast, stmts, ind + 1);
            line(out, ind, "}");
        }

        NodeKind::ExpressionStatement(expr) => line(out, ind, pretty_print_expr(ast, *expr)),

        NodeKind::VariableStatement(list) => {
            let decls = list
                .iter()
                .map(|decl| pretty_print_expr(ast, *decl))
                .collect::<Vec<_>>()
                .join(", ");
            line(out, ind, format!("{} {decls}", "var".yellow()));
        }

        NodeKind::FunctionStatement(func) => line(out, ind, pretty_print_expr(ast, *func)),

        NodeKind::IfStatement {
            test,
            consequent,
            alternate,
        } => {
            line(out, ind, format!("{} {}:", "if".yellow(), pretty_print_expr(ast, *test)));
            render_stmt(out, ast, *consequent, ind + 1);
            if let Some(alternate) = alternate {
                line(out, ind, format!("{}:", "else".yellow()));
                render_stmt(out, ast, *alternate, ind + 1);
            }
        }

        NodeKind::WhileStatement { test, body } => {
            line(out, ind, format!("{} {}:", "while".yellow(), pretty_print_expr(ast, *test)));
            render_stmt(out, ast, *body, ind + 1);
        }

        NodeKind::DoWhileStatement { test, body } => {
            line(out, ind, format!("{}:", "do".yellow()));
            render_stmt(out, ast, *body, ind + 1);
            line(out, ind, format!("{} {}", "while".yellow(), pretty_print_expr(ast, *test)));
        }

        NodeKind::ForStatement {
            initializer,
            test,
            update,
            body,
        } => {
            let part = |id: &Option<NodeId>| id.map(|id| pretty_print_expr(ast, id)).unwrap_or_default();
            line(
                out,
                ind,
                format!(
                    "{} ({}; {}; {}):",
                    "for".yellow(),
                    part(initializer),
                    part(test),
                    part(update)
                ),
            );
            render_stmt(out, ast, *body, ind + 1);
        }

        NodeKind::ForInStatement { into, source, body } => {
            line(
                out,
                ind,
                format!(
                    "{} ({} {} {}):",
                    "for".yellow(),
                    pretty_print_expr(ast, *into),
                    "in".yellow(),
                    pretty_print_expr(ast, *source)
                ),
            );
            render_stmt(out, ast, *body, ind + 1);
        }

        NodeKind::LabelledStatement { label, statement } => {
            line(out, ind, format!("{}:", pretty_print_expr(ast, *label).cyan()));
            render_stmt(out, ast, *statement, ind + 1);
        }

        NodeKind::SwitchStatement { discriminant, body } => {
            line(out, ind, format!("{} {}:", "switch".yellow(), pretty_print_expr(ast, *discriminant)));
            render_body(out, ast, body, ind + 1);
        }

        NodeKind::CaseStatement { test, consequent } => {
            match test {
                Some(test) => line(out, ind, format!("{} {}:", "case".yellow(), pretty_print_expr(ast, *test))),
                None => line(out, ind, format!("{}:", "default".yellow())),
            }
            render_body(out, ast, consequent, ind + 1);
        }

        NodeKind::TryStatement { body, catch, finally } => {
            line(out, ind, format!("{}:", "try".yellow()));
            render_stmt(out, ast, *body, ind + 1);
            if let Some(catch) = catch {
                render_stmt(out, ast, *catch, ind);
            }
            if let Some(finally) = finally {
                line(out, ind, format!("{}:", "finally".yellow()));
                render_stmt(out, ast, *finally, ind + 1);
            }
        }

        NodeKind::CatchStatement { parameter, body } => {
            line(out, ind, format!("{} ({}):", "catch".yellow(), pretty_print_expr(ast, *parameter)));
            render_stmt(out, ast, *body, ind + 1);
        }

        NodeKind::WithStatement { object, body } => {
            line(out, ind, format!("{} {}:", "with".yellow(), pretty_print_expr(ast, *object)));
            render_stmt(out, ast, *body, ind + 1);
        }

        NodeKind::ReturnStatement(value) => match value {
            Some(value) => line(out, ind, format!("{} {}", "return".yellow(), pretty_print_expr(ast, *value))),
            None => line(out, ind, format!("{} {}", "return".yellow(), "void".bright_purple())),
        },

        NodeKind::ThrowStatement(value) => {
            line(out, ind, format!("{} {}", "throw".yellow(), pretty_print_expr(ast, *value)))
        }

        NodeKind::BranchStatement { token, label } => {
            let token = match token {
                BranchToken::Break => "break",
                BranchToken::Continue => "continue",
            };
            match ast.get_ident_name(*label) {
                Some(label) => line(out, ind, format!("{} {}", token.yellow(), label.cyan())),
                None => line(out, ind, token.yellow()),
            }
        }

        NodeKind::DebuggerStatement => line(out, ind, "debugger".yellow()),
        NodeKind::EmptyStatement => line(out, ind, ";".bright_black()),
        NodeKind::BadStatement => line(out, ind, "<bad statement>".red()),

        _ => line(out, ind, pretty_print_expr(ast, root)),
    }
}

fn pretty_print_expr(ast: &Ast, expr: NodeId) -> String {
    let Some(cnode) = ast.get_node(expr) else {
        return format!("{}", "<dangling>".black().on_bright_yellow());
    };
    let list = |ids: &[NodeId]| {
        ids.iter()
            .map(|id| pretty_print_expr(ast, *id))
            .collect::<Vec<_>>()
            .join(", ")
    };

    match &cnode.kind {
        NodeKind::Identifier(name) => name.cyan().to_string(),
        NodeKind::NumberLiteral { literal, .. } => literal.bright_green().to_string(),
        NodeKind::BooleanLiteral(value) => value.to_string().bright_green().to_string(),
        NodeKind::StringLiteral { literal, .. } => literal.bright_green().to_string(),
        NodeKind::RegExpLiteral { pattern, flags } => format!("/{pattern}/{flags}").bright_green().to_string(),
        NodeKind::NullLiteral => "null".bright_green().to_string(),
        NodeKind::ThisExpression => "this".yellow().to_string(),
        NodeKind::EmptyExpression => String::new(),

        NodeKind::BinaryExpression { operator, left, right } => format!(
            "({} {} {})",
            pretty_print_expr(ast, *left),
            operator.to_string().bright_purple(),
            pretty_print_expr(ast, *right)
        ),
        NodeKind::AssignExpression { operator, left, right } => format!(
            "{} {} {}",
            pretty_print_expr(ast, *left),
            operator.to_string().bright_purple(),
            pretty_print_expr(ast, *right)
        ),
        NodeKind::UnaryExpression { operator, operand } => format!(
            "({} {})",
            operator.to_string().bright_purple(),
            pretty_print_expr(ast, *operand)
        ),
        NodeKind::ConditionalExpression {
            test,
            consequent,
            alternate,
        } => format!(
            "({} ? {} : {})",
            pretty_print_expr(ast, *test),
            pretty_print_expr(ast, *consequent),
            pretty_print_expr(ast, *alternate)
        ),

        NodeKind::CallExpression { callee, arguments } => {
            format!("{}({})", pretty_print_expr(ast, *callee), list(arguments))
        }
        NodeKind::NewExpression { callee, arguments } => format!(
            "{} {}({})",
            "new".yellow(),
            pretty_print_expr(ast, *callee),
            list(arguments)
        ),
        NodeKind::DotExpression { left, identifier } => format!(
            "{}.{}",
            pretty_print_expr(ast, *left),
            ast.get_ident_name(Some(*identifier)).unwrap_or("<?>").bright_green()
        ),
        NodeKind::BracketExpression { left, member } => format!(
            "{}[{}]",
            pretty_print_expr(ast, *left),
            pretty_print_expr(ast, *member)
        ),
        NodeKind::SequenceExpression(sequence) => format!("({})", list(sequence)),

        NodeKind::ArrayLiteral(elements) => format!(
            "[{}]",
            elements
                .iter()
                .map(|el| el.map(|el| pretty_print_expr(ast, el)).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(", ")
        ),
        NodeKind::ObjectLiteral(properties) => format!(
            "{{{}}}",
            properties
                .iter()
                .map(|prop| {
                    let prefix = match prop.kind {
                        PropertyKind::Value => "",
                        PropertyKind::Get => "get ",
                        PropertyKind::Set => "set ",
                    };
                    format!("{prefix}{}: {}", prop.key.cyan(), pretty_print_expr(ast, prop.value))
                })
                .collect::<Vec<_>>()
                .join(", ")
        ),

        NodeKind::VariableExpression { name, initializer } => match initializer {
            Some(init) => format!("{} = {}", name.cyan(), pretty_print_expr(ast, *init)),
            None => name.cyan().to_string(),
        },

        NodeKind::FunctionLiteral(func) => format!(
            "{} {}({}) {}",
            "function".yellow(),
            ast.get_ident_name(func.name).unwrap_or("<anonymous>").cyan(),
            list(&func.params),
            // Bodies are statements; keep them on one line here
            render_ast(ast, func.body, 0).trim_end().replace('\n', " ")
        ),

        NodeKind::BadExpression => "<bad expression>".red().to_string(),
        NodeKind::Opaque { kind } => format!("<{kind}>").red().to_string(),
        other => format!("<{}>", other.name()).red().to_string(),
    }
}

/// Kind names of every node `visitor` enters from `root`, in visit order.
///
/// The recording hook is appended to the visitor's hooks for the length of
/// the traversal and removed again afterwards.
pub fn node_kind_trace<V: Visitor>(
    walker: &mut Walker<'_>,
    visitor: &mut V,
    root: NodeId,
) -> Result<Vec<String>, WalkError> {
    let trace = Rc::new(RefCell::new(Vec::new()));
    let sink = trace.clone();
    visitor.add_hook(Hook::new().on_enter(move |ast, node, _| {
        if let Some(kind) = ast.kind(node) {
            sink.borrow_mut().push(kind.name().to_string());
        }
        Ok(())
    }));

    let result = walker.begin(visitor, root);
    visitor.hooks_mut().pop();
    result?;

    Ok(trace.take())
}
