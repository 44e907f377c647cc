// AST (Abstract Syntax Tree) definitions for the scripting language

/// Source location information for error reporting.
///
/// Lines are 1-based and relative to the text that was parsed, so for a
/// fragment they count from the fragment's first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinOp {
    /// Operator spelling, used in error messages
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
        }
    }
}

/// Comparison operators (chainable: `a < b <= c`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Is,
    IsNot,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
        }
    }
}

/// Short-circuit boolean operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg, // -x
    Pos, // +x
    Not, // not x
}

/// One piece of an f-string: literal text or an embedded expression
#[derive(Debug, Clone)]
pub enum FStringPart {
    Text(String),
    Expr {
        expr: Box<AstNode>,
        /// `!r` conversion
        repr: bool,
        /// Format spec after `:` (e.g. `.2f`), empty when absent
        spec: String,
    },
}

/// Subscript selector: `a[i]` or `a[lo:hi]`
#[derive(Debug, Clone)]
pub enum Subscript {
    Index(Box<AstNode>),
    Slice {
        lower: Option<Box<AstNode>>,
        upper: Option<Box<AstNode>>,
    },
}

/// AST nodes representing statements and expressions
#[derive(Debug, Clone)]
pub enum AstNode {
    // Statements
    ExpressionStatement {
        expr: Box<AstNode>,
        location: SourceLocation,
    },
    /// `a = b = value`; every target receives the value
    Assignment {
        targets: Vec<AstNode>,
        value: Box<AstNode>,
        location: SourceLocation,
    },
    CompoundAssignment {
        target: Box<AstNode>,
        op: BinOp,
        value: Box<AstNode>,
        location: SourceLocation,
    },
    /// `if` with any number of `elif` branches folded into `branches`
    If {
        branches: Vec<(AstNode, Vec<AstNode>)>,
        else_branch: Option<Vec<AstNode>>,
        location: SourceLocation,
    },
    While {
        condition: Box<AstNode>,
        body: Vec<AstNode>,
        location: SourceLocation,
    },
    For {
        target: Box<AstNode>,
        iterable: Box<AstNode>,
        body: Vec<AstNode>,
        location: SourceLocation,
    },
    Break {
        location: SourceLocation,
    },
    Continue {
        location: SourceLocation,
    },
    Pass {
        location: SourceLocation,
    },

    // Expressions
    IntLiteral(i64, SourceLocation),
    FloatLiteral(f64, SourceLocation),
    StringLiteral(String, SourceLocation),
    FString(Vec<FStringPart>, SourceLocation),
    BoolLiteral(bool, SourceLocation),
    NoneLiteral(SourceLocation),
    Variable(String, SourceLocation),
    ListLiteral(Vec<AstNode>, SourceLocation),
    TupleLiteral(Vec<AstNode>, SourceLocation),
    DictLiteral(Vec<(AstNode, AstNode)>, SourceLocation),
    BinaryOp {
        op: BinOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
        location: SourceLocation,
    },
    UnaryOp {
        op: UnOp,
        operand: Box<AstNode>,
        location: SourceLocation,
    },
    BoolOp {
        op: BoolOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
        location: SourceLocation,
    },
    Compare {
        left: Box<AstNode>,
        comparisons: Vec<(CmpOp, AstNode)>,
        location: SourceLocation,
    },
    TernaryOp {
        condition: Box<AstNode>,
        true_expr: Box<AstNode>,
        false_expr: Box<AstNode>,
        location: SourceLocation,
    },
    FunctionCall {
        name: String,
        args: Vec<AstNode>,
        kwargs: Vec<(String, AstNode)>,
        location: SourceLocation,
    },
    MethodCall {
        receiver: Box<AstNode>,
        method: String,
        args: Vec<AstNode>,
        kwargs: Vec<(String, AstNode)>,
        location: SourceLocation,
    },
    Index {
        object: Box<AstNode>,
        subscript: Subscript,
        location: SourceLocation,
    },
}

impl AstNode {
    /// Returns the source location of this node
    pub fn location(&self) -> SourceLocation {
        match self {
            AstNode::ExpressionStatement { location, .. }
            | AstNode::Assignment { location, .. }
            | AstNode::CompoundAssignment { location, .. }
            | AstNode::If { location, .. }
            | AstNode::While { location, .. }
            | AstNode::For { location, .. }
            | AstNode::Break { location }
            | AstNode::Continue { location }
            | AstNode::Pass { location }
            | AstNode::BinaryOp { location, .. }
            | AstNode::UnaryOp { location, .. }
            | AstNode::BoolOp { location, .. }
            | AstNode::Compare { location, .. }
            | AstNode::TernaryOp { location, .. }
            | AstNode::FunctionCall { location, .. }
            | AstNode::MethodCall { location, .. }
            | AstNode::Index { location, .. } => *location,
            AstNode::IntLiteral(_, loc)
            | AstNode::FloatLiteral(_, loc)
            | AstNode::StringLiteral(_, loc)
            | AstNode::FString(_, loc)
            | AstNode::BoolLiteral(_, loc)
            | AstNode::NoneLiteral(loc)
            | AstNode::Variable(_, loc)
            | AstNode::ListLiteral(_, loc)
            | AstNode::TupleLiteral(_, loc)
            | AstNode::DictLiteral(_, loc) => *loc,
        }
    }

    /// Whether this node can appear on the left of `=`
    pub fn is_assignable(&self) -> bool {
        match self {
            AstNode::Variable(..) | AstNode::Index { .. } => true,
            AstNode::TupleLiteral(items, _) | AstNode::ListLiteral(items, _) => {
                !items.is_empty() && items.iter().all(AstNode::is_assignable)
            }
            _ => false,
        }
    }
}

/// A parsed program or fragment: the top-level statement list
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub nodes: Vec<AstNode>,
}

impl Module {
    pub fn new() -> Self {
        Module { nodes: Vec::new() }
    }
}
