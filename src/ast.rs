use crate::source::{Idx, Loc, SourceFile, SourceId};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Placeholder for a child that the parser never filled in.
    pub const DANGLING: NodeId = NodeId(usize::MAX);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

#[derive(Debug)]
pub struct Ast {
    pub nodes: Vec<Node>,
    pub source_id: SourceId,
}

impl Ast {
    pub fn new(source_id: SourceId) -> Self {
        Self {
            nodes: Vec::new(),
            source_id,
        }
    }

    pub fn add_node(&mut self, kind: NodeKind, loc: Loc) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { id, kind, loc });
        id
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get_node(id).map(|node| &node.kind)
    }

    pub fn kind_mut(&mut self, id: NodeId) -> Option<&mut NodeKind> {
        self.get_node_mut(id).map(|node| &mut node.kind)
    }

    pub fn loc(&self, id: NodeId) -> Option<&Loc> {
        self.get_node(id).map(|node| &node.loc)
    }

    #[inline(always)]
    pub fn is_block(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::BlockStatement(_)))
    }

    pub fn get_ident_name(&self, id: Option<NodeId>) -> Option<&str> {
        let id = id?;
        match self.kind(id) {
            Some(NodeKind::Identifier(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    /// The source file attached to a program node, if `id` is one.
    pub fn program_file(&self, id: NodeId) -> Option<&SourceFile> {
        match self.kind(id) {
            Some(NodeKind::Program(program)) => program.file.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Program(Program),

    // Expressions
    ArrayLiteral(Vec<Option<NodeId>>), // `None` for holes, e.g. [a, , b]
    AssignExpression {
        operator: AssignOp,
        left: NodeId,
        right: NodeId,
    },
    BadExpression,
    BinaryExpression {
        operator: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    BooleanLiteral(bool),
    BracketExpression {
        left: NodeId,
        member: NodeId,
    },
    CallExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    ConditionalExpression {
        test: NodeId,
        consequent: NodeId,
        alternate: NodeId,
    },
    DotExpression {
        left: NodeId,
        identifier: NodeId, /* Identifier */
    },
    EmptyExpression,
    FunctionLiteral(Function),
    Identifier(String),
    NewExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    NullLiteral,
    NumberLiteral {
        literal: String,
        value: f64,
    },
    ObjectLiteral(Vec<Property>),
    RegExpLiteral {
        pattern: String,
        flags: String,
    },
    SequenceExpression(Vec<NodeId>),
    StringLiteral {
        literal: String,
        value: String,
    },
    ThisExpression,
    UnaryExpression {
        operator: UnaryOp,
        operand: NodeId,
    },
    VariableExpression {
        name: String,
        initializer: Option<NodeId>,
    },

    // Statements
    BadStatement,
    BlockStatement(Vec<NodeId>),
    BranchStatement {
        token: BranchToken,
        label: Option<NodeId /* Identifier */>,
    },
    CaseStatement {
        test: Option<NodeId>, // `None` for `default:`
        consequent: Vec<NodeId>,
    },
    CatchStatement {
        parameter: NodeId, /* Identifier */
        body: NodeId,
    },
    DebuggerStatement,
    DoWhileStatement {
        test: NodeId,
        body: NodeId,
    },
    EmptyStatement,
    ExpressionStatement(NodeId),
    ForInStatement {
        into: NodeId,
        source: NodeId,
        body: NodeId,
    },
    ForStatement {
        initializer: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    FunctionStatement(NodeId /* FunctionLiteral */),
    IfStatement {
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
    },
    LabelledStatement {
        label: NodeId, /* Identifier */
        statement: NodeId,
    },
    ReturnStatement(Option<NodeId>),
    SwitchStatement {
        discriminant: NodeId,
        body: Vec<NodeId /* CaseStatement */>,
    },
    ThrowStatement(NodeId),
    TryStatement {
        body: NodeId,
        catch: Option<NodeId /* CatchStatement */>,
        finally: Option<NodeId>,
    },
    VariableStatement(Vec<NodeId /* VariableExpression */>),
    WhileStatement {
        test: NodeId,
        body: NodeId,
    },
    WithStatement {
        object: NodeId,
        body: NodeId,
    },

    /// A construct the parser produced but this engine has no operation for.
    Opaque {
        kind: String,
    },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Program(_) => "Program",
            NodeKind::ArrayLiteral(_) => "ArrayLiteral",
            NodeKind::AssignExpression { .. } => "AssignExpression",
            NodeKind::BadExpression => "BadExpression",
            NodeKind::BinaryExpression { .. } => "BinaryExpression",
            NodeKind::BooleanLiteral(_) => "BooleanLiteral",
            NodeKind::BracketExpression { .. } => "BracketExpression",
            NodeKind::CallExpression { .. } => "CallExpression",
            NodeKind::ConditionalExpression { .. } => "ConditionalExpression",
            NodeKind::DotExpression { .. } => "DotExpression",
            NodeKind::EmptyExpression => "EmptyExpression",
            NodeKind::FunctionLiteral(_) => "FunctionLiteral",
            NodeKind::Identifier(_) => "Identifier",
            NodeKind::NewExpression { .. } => "NewExpression",
            NodeKind::NullLiteral => "NullLiteral",
            NodeKind::NumberLiteral { .. } => "NumberLiteral",
            NodeKind::ObjectLiteral(_) => "ObjectLiteral",
            NodeKind::RegExpLiteral { .. } => "RegExpLiteral",
            NodeKind::SequenceExpression(_) => "SequenceExpression",
            NodeKind::StringLiteral { .. } => "StringLiteral",
            NodeKind::ThisExpression => "ThisExpression",
            NodeKind::UnaryExpression { .. } => "UnaryExpression",
            NodeKind::VariableExpression { .. } => "VariableExpression",
            NodeKind::BadStatement => "BadStatement",
            NodeKind::BlockStatement(_) => "BlockStatement",
            NodeKind::BranchStatement { .. } => "BranchStatement",
            NodeKind::CaseStatement { .. } => "CaseStatement",
            NodeKind::CatchStatement { .. } => "CatchStatement",
            NodeKind::DebuggerStatement => "DebuggerStatement",
            NodeKind::DoWhileStatement { .. } => "DoWhileStatement",
            NodeKind::EmptyStatement => "EmptyStatement",
            NodeKind::ExpressionStatement(_) => "ExpressionStatement",
            NodeKind::ForInStatement { .. } => "ForInStatement",
            NodeKind::ForStatement { .. } => "ForStatement",
            NodeKind::FunctionStatement(_) => "FunctionStatement",
            NodeKind::IfStatement { .. } => "IfStatement",
            NodeKind::LabelledStatement { .. } => "LabelledStatement",
            NodeKind::ReturnStatement(_) => "ReturnStatement",
            NodeKind::SwitchStatement { .. } => "SwitchStatement",
            NodeKind::ThrowStatement(_) => "ThrowStatement",
            NodeKind::TryStatement { .. } => "TryStatement",
            NodeKind::VariableStatement(_) => "VariableStatement",
            NodeKind::WhileStatement { .. } => "WhileStatement",
            NodeKind::WithStatement { .. } => "WithStatement",
            NodeKind::Opaque { .. } => "Opaque",
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::BadStatement
                | NodeKind::BlockStatement(_)
                | NodeKind::BranchStatement { .. }
                | NodeKind::CaseStatement { .. }
                | NodeKind::CatchStatement { .. }
                | NodeKind::DebuggerStatement
                | NodeKind::DoWhileStatement { .. }
                | NodeKind::EmptyStatement
                | NodeKind::ExpressionStatement(_)
                | NodeKind::ForInStatement { .. }
                | NodeKind::ForStatement { .. }
                | NodeKind::FunctionStatement(_)
                | NodeKind::IfStatement { .. }
                | NodeKind::LabelledStatement { .. }
                | NodeKind::ReturnStatement(_)
                | NodeKind::SwitchStatement { .. }
                | NodeKind::ThrowStatement(_)
                | NodeKind::TryStatement { .. }
                | NodeKind::VariableStatement(_)
                | NodeKind::WhileStatement { .. }
                | NodeKind::WithStatement { .. }
        )
    }

    /// Declarations owned by a scope-introducing node.
    pub fn declarations(&self) -> Option<&[Declaration]> {
        match self {
            NodeKind::Program(program) => Some(&program.declarations),
            NodeKind::FunctionLiteral(func) => Some(&func.declarations),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Program {
    pub body: Vec<NodeId>,
    pub declarations: Vec<Declaration>,
    pub file: Option<SourceFile>,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: Option<NodeId /* Identifier */>,
    pub params: Vec<NodeId /* Identifier */>,
    pub body: NodeId,
    pub declarations: Vec<Declaration>,
}

/// Hoisted declarations as reported by the parser for a program or function.
#[derive(Debug, Clone)]
pub enum Declaration {
    Variable(Vec<Declarator>),
    Function(NodeId /* FunctionLiteral */),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declarator {
    pub name: String,
    pub idx: Idx,
}

impl Declarator {
    pub fn new(name: impl Into<String>, idx: Idx) -> Self {
        Self {
            name: name.into(),
            idx,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Property {
    pub key: String,
    pub kind: PropertyKind,
    pub value: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Value,
    Get,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchToken {
    Break,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ShlAssign,
    ShrAssign,
    UShrAssign,
    AndAssign,
    OrAssign,
    XorAssign,
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::ModAssign => "%=",
            AssignOp::ShlAssign => "<<=",
            AssignOp::ShrAssign => ">>=",
            AssignOp::UShrAssign => ">>>=",
            AssignOp::AndAssign => "&=",
            AssignOp::OrAssign => "|=",
            AssignOp::XorAssign => "^=",
        };
        f.write_str(op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    // Logical
    And,
    Or,
    // Bitwise
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
    UnsignedShiftRight,
    // Relational keywords
    In,
    InstanceOf,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitwiseAnd => "&",
            BinaryOp::BitwiseOr => "|",
            BinaryOp::BitwiseXor => "^",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::UnsignedShiftRight => ">>>",
            BinaryOp::In => "in",
            BinaryOp::InstanceOf => "instanceof",
        };
        f.write_str(op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,     // -
    Plus,    // +
    Not,     // !
    BitNot,  // ~
    TypeOf,  // typeof
    Void,    // void
    Delete,  // delete
    PreInc,  // ++i
    PreDec,  // --i
    PostInc, // i++
    PostDec, // i--
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Plus => write!(f, "+"),
            UnaryOp::Not => write!(f, "!"),
            UnaryOp::BitNot => write!(f, "~"),
            UnaryOp::TypeOf => write!(f, "typeof"),
            UnaryOp::Void => write!(f, "void"),
            UnaryOp::Delete => write!(f, "delete"),
            UnaryOp::PreInc => write!(f, "++#"),
            UnaryOp::PreDec => write!(f, "--#"),
            UnaryOp::PostInc => write!(f, "#++"),
            UnaryOp::PostDec => write!(f, "#--"),
        }
    }
}
