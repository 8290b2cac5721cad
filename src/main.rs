use anyhow::{Result, bail};
use clap::Parser;
use tracing::{debug, info};

use ecma_walker::{
    Ast, BlockNormalizer, Hook, NodeId, NodeKind, Visitor, Walker, WalkerConfig,
    ast::{Declaration, Declarator, Program},
    error::SourceCache,
    source::{Loc, SourceFile},
    utils::{node_kind_trace, pretty_print_ast},
};

const EXAMPLE_SOURCE: &str = "var a = 1;\nif (a) b();\n";

#[derive(Parser, Debug)]
#[command(name = "ecma-walker", about = "Walk and block-normalize a sample program")]
struct Args {
    /// Leave control-flow bodies as they are instead of wrapping them in blocks
    #[arg(long)]
    keep_bodies: bool,

    /// Report traversal faults instead of failing
    #[arg(long)]
    catch_faults: bool,

    /// Replace the `if` test with a dangling node to exercise fault reporting
    #[arg(long)]
    break_tree: bool,

    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if args.no_color {
        colored::control::set_override(false);
    }

    let (mut ast, root) = build_example(args.break_tree);
    println!("Before:");
    pretty_print_ast(&ast, root, 0);

    let mut normalizer = BlockNormalizer::new(!args.keep_bodies);
    normalizer.add_hook(Hook::new().on_enter(|ast, node, stack| {
        let Some(NodeKind::Identifier(name)) = ast.kind(node) else {
            return Ok(());
        };
        match stack.find_variable(name) {
            Some(idx) => {
                let position = stack
                    .nodes()
                    .first()
                    .and_then(|&program| ast.program_file(program))
                    .and_then(|file| file.position(idx));
                match position {
                    Some(position) => info!(name = %name, "resolved to declaration at {position}"),
                    None => info!(name = %name, idx, "resolved to declaration"),
                }
            }
            None => debug!(name = %name, "not declared in any enclosing scope"),
        }
        Ok(())
    }));

    let config = WalkerConfig {
        catch_faults: args.catch_faults,
    };
    let (trace, faults) = {
        let mut walker = Walker::with_config(&mut ast, config);
        let trace = node_kind_trace(&mut walker, &mut normalizer, root)?;
        (trace, walker.faults().to_vec())
    };

    println!("\nTraversal order:\n{}", trace.join(" -> "));
    println!("\nAfter:");
    pretty_print_ast(&ast, root, 0);

    if let Some(file) = ast.program_file(root) {
        let cache = SourceCache::from_file(file);
        for fault in &faults {
            fault.report(&cache);
        }
    }
    if let Some(fault) = faults.first() {
        bail!("traversal faulted: {fault}");
    }
    Ok(())
}

fn build_example(break_tree: bool) -> (Ast, NodeId) {
    let mut ast = Ast::new(0);
    let loc = |span: core::ops::Range<usize>| Loc::new(0, span);

    let one = ast.add_node(
        NodeKind::NumberLiteral {
            literal: "1".into(),
            value: 1.0,
        },
        loc(8..9),
    );
    let var_a = ast.add_node(
        NodeKind::VariableExpression {
            name: "a".into(),
            initializer: Some(one),
        },
        loc(4..9),
    );
    let var_stmt = ast.add_node(NodeKind::VariableStatement(vec![var_a]), loc(0..10));

    let test = if break_tree {
        NodeId::DANGLING
    } else {
        ast.add_node(NodeKind::Identifier("a".into()), loc(15..16))
    };
    let callee = ast.add_node(NodeKind::Identifier("b".into()), loc(18..19));
    let call = ast.add_node(
        NodeKind::CallExpression {
            callee,
            arguments: vec![],
        },
        loc(18..21),
    );
    let consequent = ast.add_node(NodeKind::ExpressionStatement(call), loc(18..22));
    let if_stmt = ast.add_node(
        NodeKind::IfStatement {
            test,
            consequent,
            alternate: None,
        },
        loc(11..22),
    );

    let root = ast.add_node(
        NodeKind::Program(Program {
            body: vec![var_stmt, if_stmt],
            declarations: vec![Declaration::Variable(vec![Declarator::new("a", 4)])],
            file: Some(SourceFile::new(0, "example.js", EXAMPLE_SOURCE)),
        }),
        loc(0..EXAMPLE_SOURCE.len()),
    );
    (ast, root)
}
