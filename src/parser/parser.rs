use crate::interpreter::constants::MAX_NESTING_DEPTH;
use crate::parser::ast::*;
use crate::parser::lexer::{FStringPiece, LexError, Lexer, Token};
use std::mem::discriminant;

/// Parser error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("line {}, column {}: {message}", .location.line, .location.column)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            location: err.location,
        }
    }
}

/// Statement keywords of the wider language that this subset rejects with a
/// dedicated message instead of a generic syntax error.
const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "def", "class", "return", "import", "from", "try", "except", "finally", "with", "lambda",
    "raise", "global", "nonlocal", "del", "assert", "yield", "async", "await",
];

const TOO_DEEP: &str = "expression is too deeply nested";

/// Recursive descent parser for the scripting subset
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    /// Current expression and block nesting, bounded by [`MAX_NESTING_DEPTH`]
    depth: usize,
}

impl Parser {
    /// Parser for a whole program
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
            depth: 0,
        })
    }

    /// Parser for a fragment cut from a program; indentation is relative to
    /// the fragment's first line
    pub fn fragment(source: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::fragment(source).tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
            depth: 0,
        })
    }

    /// Parse the entire token stream as a statement list
    pub fn parse_program(&mut self) -> Result<Module, ParseError> {
        let mut module = Module::new();

        while !self.is_at_end() {
            if self.at(Token::Indent) {
                return Err(self.error_here("unexpected indent"));
            }
            let statements = self.parse_statement()?;
            module.nodes.extend(statements);
        }

        Ok(module)
    }

    /// Parse a statement; simple statements separated by `;` yield several nodes
    fn parse_statement(&mut self) -> Result<Vec<AstNode>, ParseError> {
        match self.peek_token() {
            Token::If(_) => Ok(vec![self.parse_if_statement()?]),
            Token::While(_) => Ok(vec![self.parse_while_statement()?]),
            Token::For(_) => Ok(vec![self.parse_for_statement()?]),
            Token::Elif(_) | Token::Else(_) => Err(self.error_here(&format!(
                "{} without a matching 'if'",
                self.peek_token()
            ))),
            Token::Dedent(_) => Err(self.error_here("unexpected dedent")),
            _ => self.parse_simple_statements(),
        }
    }

    /// simple_stmt (';' simple_stmt)* [';'] NEWLINE
    fn parse_simple_statements(&mut self) -> Result<Vec<AstNode>, ParseError> {
        let mut statements = vec![self.parse_simple_statement()?];

        while self.eat(Token::Semicolon) {
            if self.at(Token::Newline) || self.is_at_end() {
                break;
            }
            statements.push(self.parse_simple_statement()?);
        }

        if !self.eat(Token::Newline) && !self.is_at_end() {
            return Err(self.error_here(&format!(
                "invalid syntax: unexpected {}",
                self.peek_token()
            )));
        }

        Ok(statements)
    }

    fn parse_simple_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        if self.eat(Token::Pass) {
            return Ok(AstNode::Pass { location: loc });
        }
        if self.eat(Token::Break) {
            return Ok(AstNode::Break { location: loc });
        }
        if self.eat(Token::Continue) {
            return Ok(AstNode::Continue { location: loc });
        }

        if let Token::Ident(name, _) = self.peek_token() {
            if UNSUPPORTED_KEYWORDS.contains(&name.as_str()) {
                let next_is_operator = matches!(
                    self.peek_ahead(1),
                    Some(Token::Eq(_)) | Some(Token::Dot(_)) | Some(Token::LParen(_))
                );
                if !next_is_operator {
                    return Err(self.error_here(&format!(
                        "'{}' statements are not supported",
                        name
                    )));
                }
            }
        }

        let expr = self.parse_expression_list()?;

        if self.at(Token::Eq) {
            let mut targets = vec![expr];
            let mut value = None;
            while self.eat(Token::Eq) {
                let next = self.parse_expression_list()?;
                if let Some(previous) = value.replace(next) {
                    targets.push(previous);
                }
            }
            for target in &targets {
                if !target.is_assignable() {
                    return Err(ParseError {
                        message: "cannot assign to expression".to_string(),
                        location: target.location(),
                    });
                }
            }
            let value = value.ok_or_else(|| self.error_here("expected expression after '='"))?;
            return Ok(AstNode::Assignment {
                targets,
                value: Box::new(value),
                location: loc,
            });
        }

        if let Some(op) = self.augmented_operator() {
            self.advance();
            if !matches!(expr, AstNode::Variable(..) | AstNode::Index { .. }) {
                return Err(ParseError {
                    message: "illegal expression for augmented assignment".to_string(),
                    location: expr.location(),
                });
            }
            let value = self.parse_expression_list()?;
            return Ok(AstNode::CompoundAssignment {
                target: Box::new(expr),
                op,
                value: Box::new(value),
                location: loc,
            });
        }

        Ok(AstNode::ExpressionStatement {
            expr: Box::new(expr),
            location: loc,
        })
    }

    fn augmented_operator(&self) -> Option<BinOp> {
        match self.peek_token() {
            Token::PlusEq(_) => Some(BinOp::Add),
            Token::MinusEq(_) => Some(BinOp::Sub),
            Token::StarEq(_) => Some(BinOp::Mul),
            Token::SlashEq(_) => Some(BinOp::Div),
            Token::DoubleSlashEq(_) => Some(BinOp::FloorDiv),
            Token::PercentEq(_) => Some(BinOp::Mod),
            _ => None,
        }
    }

    /// Parse the suite after a `:`, either an indented block or a one-line
    /// list of simple statements
    fn parse_block(&mut self) -> Result<Vec<AstNode>, ParseError> {
        self.nested("too many nested blocks", Self::parse_suite)
    }

    fn parse_suite(&mut self) -> Result<Vec<AstNode>, ParseError> {
        if !self.eat(Token::Newline) {
            if self.is_at_end() {
                return Err(self.error_here("expected an indented block"));
            }
            return self.parse_simple_statements();
        }

        if !self.eat(Token::Indent) {
            return Err(self.error_here("expected an indented block"));
        }

        let mut statements = Vec::new();
        while !self.at(Token::Dedent) && !self.is_at_end() {
            statements.extend(self.parse_statement()?);
        }
        self.eat(Token::Dedent);

        Ok(statements)
    }

    /// Parse if statement with its `elif`/`else` clauses
    fn parse_if_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.advance(); // consume 'if'

        let mut branches = Vec::new();
        let condition = self.parse_expression()?;
        self.expect(Token::Colon, "expected ':' after if condition")?;
        branches.push((condition, self.parse_block()?));

        while self.eat(Token::Elif) {
            let condition = self.parse_expression()?;
            self.expect(Token::Colon, "expected ':' after elif condition")?;
            branches.push((condition, self.parse_block()?));
        }

        let else_branch = if self.eat(Token::Else) {
            self.expect(Token::Colon, "expected ':' after 'else'")?;
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(AstNode::If {
            branches,
            else_branch,
            location: loc,
        })
    }

    /// Parse while statement
    fn parse_while_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.advance(); // consume 'while'

        let condition = Box::new(self.parse_expression()?);
        self.expect(Token::Colon, "expected ':' after while condition")?;
        let body = self.parse_block()?;

        if self.at(Token::Else) {
            return Err(self.error_here("'else' clauses on loops are not supported"));
        }

        Ok(AstNode::While {
            condition,
            body,
            location: loc,
        })
    }

    /// Parse for statement: for target_list in expression_list: suite
    fn parse_for_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.advance(); // consume 'for'

        let target = self.parse_target_list()?;
        self.expect(Token::In, "expected 'in' after for target")?;
        let iterable = Box::new(self.parse_expression_list()?);
        self.expect(Token::Colon, "expected ':' after for iterable")?;
        let body = self.parse_block()?;

        if self.at(Token::Else) {
            return Err(self.error_here("'else' clauses on loops are not supported"));
        }

        Ok(AstNode::For {
            target: Box::new(target),
            iterable,
            body,
            location: loc,
        })
    }

    /// Loop targets are parsed below comparison level so `in` is not consumed
    fn parse_target_list(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        let first = self.parse_postfix()?;
        if !self.at(Token::Comma) {
            if !first.is_assignable() {
                return Err(ParseError {
                    message: "cannot assign to expression".to_string(),
                    location: first.location(),
                });
            }
            return Ok(first);
        }

        let mut items = vec![first];
        while self.eat(Token::Comma) {
            if self.at(Token::In) {
                break;
            }
            items.push(self.parse_postfix()?);
        }
        let target = AstNode::TupleLiteral(items, loc);
        if !target.is_assignable() {
            return Err(ParseError {
                message: "cannot assign to expression".to_string(),
                location: loc,
            });
        }
        Ok(target)
    }

    /// expression (',' expression)* [','], a bare tuple when a comma appears
    pub fn parse_expression_list(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        let first = self.parse_expression()?;
        if !self.at(Token::Comma) {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.eat(Token::Comma) {
            if self.starts_expression() {
                items.push(self.parse_expression()?);
            } else {
                break;
            }
        }
        Ok(AstNode::TupleLiteral(items, loc))
    }

    /// Conditional expression: or_expr ['if' or_expr 'else' expression].
    ///
    /// Every bracketed sub-expression re-enters here, so this is where
    /// nesting is counted.
    pub fn parse_expression(&mut self) -> Result<AstNode, ParseError> {
        self.nested("too many nested parentheses", Self::parse_conditional)
    }

    fn parse_conditional(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        let expr = self.parse_or()?;

        if self.eat(Token::If) {
            let condition = self.parse_or()?;
            self.expect(Token::Else, "expected 'else' in conditional expression")?;
            let false_expr = self.parse_expression()?;
            return Ok(AstNode::TernaryOp {
                condition: Box::new(condition),
                true_expr: Box::new(expr),
                false_expr: Box::new(false_expr),
                location: loc,
            });
        }

        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_and()?;
        while self.at(Token::Or) {
            let loc = self.current_location();
            self.advance();
            let right = self.parse_and()?;
            left = AstNode::BoolOp {
                op: BoolOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                location: loc,
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_not()?;
        while self.at(Token::And) {
            let loc = self.current_location();
            self.advance();
            let right = self.parse_not()?;
            left = AstNode::BoolOp {
                op: BoolOp::And,
                left: Box::new(left),
                right: Box::new(right),
                location: loc,
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<AstNode, ParseError> {
        if self.at(Token::Not) {
            let loc = self.current_location();
            self.advance();
            let operand = self.nested(TOO_DEEP, Self::parse_not)?;
            return Ok(AstNode::UnaryOp {
                op: UnOp::Not,
                operand: Box::new(operand),
                location: loc,
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        let left = self.parse_arith()?;
        let mut comparisons = Vec::new();

        while let Some(op) = self.comparison_operator() {
            let right = self.parse_arith()?;
            comparisons.push((op, right));
        }

        if comparisons.is_empty() {
            Ok(left)
        } else {
            Ok(AstNode::Compare {
                left: Box::new(left),
                comparisons,
                location: loc,
            })
        }
    }

    /// Consume a comparison operator (including two-token `not in` / `is not`)
    fn comparison_operator(&mut self) -> Option<CmpOp> {
        let op = match self.peek_token() {
            Token::EqEq(_) => CmpOp::Eq,
            Token::NotEq(_) => CmpOp::Ne,
            Token::Lt(_) => CmpOp::Lt,
            Token::Le(_) => CmpOp::Le,
            Token::Gt(_) => CmpOp::Gt,
            Token::Ge(_) => CmpOp::Ge,
            Token::In(_) => CmpOp::In,
            Token::Not(_) if matches!(self.peek_ahead(1), Some(Token::In(_))) => {
                self.advance();
                CmpOp::NotIn
            }
            Token::Is(_) => {
                if matches!(self.peek_ahead(1), Some(Token::Not(_))) {
                    self.advance();
                    CmpOp::IsNot
                } else {
                    CmpOp::Is
                }
            }
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn parse_arith(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek_token() {
                Token::Plus(_) => BinOp::Add,
                Token::Minus(_) => BinOp::Sub,
                _ => break,
            };
            let loc = self.current_location();
            self.advance();
            let right = self.parse_term()?;
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location: loc,
            };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<AstNode, ParseError> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek_token() {
                Token::Star(_) => BinOp::Mul,
                Token::Slash(_) => BinOp::Div,
                Token::DoubleSlash(_) => BinOp::FloorDiv,
                Token::Percent(_) => BinOp::Mod,
                _ => break,
            };
            let loc = self.current_location();
            self.advance();
            let right = self.parse_factor()?;
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location: loc,
            };
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        let op = match self.peek_token() {
            Token::Minus(_) => Some(UnOp::Neg),
            Token::Plus(_) => Some(UnOp::Pos),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let operand = self.nested(TOO_DEEP, Self::parse_factor)?;
            return Ok(AstNode::UnaryOp {
                op,
                operand: Box::new(operand),
                location: loc,
            });
        }

        self.parse_power()
    }

    /// `**` binds tighter than unary minus on its left and is right-associative
    fn parse_power(&mut self) -> Result<AstNode, ParseError> {
        let base = self.parse_postfix()?;
        if self.at(Token::DoubleStar) {
            let loc = self.current_location();
            self.advance();
            let exponent = self.nested(TOO_DEEP, Self::parse_factor)?;
            return Ok(AstNode::BinaryOp {
                op: BinOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
                location: loc,
            });
        }
        Ok(base)
    }

    /// Calls, subscripts and method calls
    fn parse_postfix(&mut self) -> Result<AstNode, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            let loc = self.current_location();
            if self.eat(Token::LParen) {
                let AstNode::Variable(name, name_loc) = expr else {
                    return Err(ParseError {
                        message: "only named functions can be called".to_string(),
                        location: loc,
                    });
                };
                let (args, kwargs) = self.parse_arguments()?;
                expr = AstNode::FunctionCall {
                    name,
                    args,
                    kwargs,
                    location: name_loc,
                };
            } else if self.eat(Token::LBracket) {
                let subscript = self.parse_subscript()?;
                self.expect(Token::RBracket, "expected ']'")?;
                expr = AstNode::Index {
                    object: Box::new(expr),
                    subscript,
                    location: loc,
                };
            } else if self.eat(Token::Dot) {
                let method = self.expect_identifier()?;
                if !self.eat(Token::LParen) {
                    return Err(ParseError {
                        message: format!("attribute access ('.{}') is not supported", method),
                        location: loc,
                    });
                }
                let (args, kwargs) = self.parse_arguments()?;
                expr = AstNode::MethodCall {
                    receiver: Box::new(expr),
                    method,
                    args,
                    kwargs,
                    location: loc,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Argument list after '(' up to and including ')'
    #[allow(clippy::type_complexity)]
    fn parse_arguments(&mut self) -> Result<(Vec<AstNode>, Vec<(String, AstNode)>), ParseError> {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();

        while !self.at(Token::RParen) {
            let is_keyword = matches!(self.peek_token(), Token::Ident(..))
                && matches!(self.peek_ahead(1), Some(Token::Eq(_)));

            if is_keyword {
                let name = self.expect_identifier()?;
                self.advance(); // consume '='
                let value = self.parse_expression()?;
                kwargs.push((name, value));
            } else {
                if !kwargs.is_empty() {
                    return Err(self.error_here("positional argument follows keyword argument"));
                }
                args.push(self.parse_expression()?);
            }

            if self.at(Token::For) {
                return Err(self.error_here("generator expressions are not supported"));
            }
            if !self.eat(Token::Comma) {
                break;
            }
        }

        self.expect(Token::RParen, "expected ')' after arguments")?;
        Ok((args, kwargs))
    }

    /// `[i]` or `[lo:hi]` (either bound optional)
    fn parse_subscript(&mut self) -> Result<Subscript, ParseError> {
        let lower = if self.at(Token::Colon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };

        if !self.eat(Token::Colon) {
            return lower
                .map(Subscript::Index)
                .ok_or_else(|| self.error_here("expected subscript"));
        }

        let upper = if self.at(Token::RBracket) || self.at(Token::Colon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };

        if self.at(Token::Colon) {
            return Err(self.error_here("slice steps are not supported"));
        }

        Ok(Subscript::Slice { lower, upper })
    }

    fn parse_primary(&mut self) -> Result<AstNode, ParseError> {
        let token = self.advance();
        let loc = token.location();

        match token {
            Token::IntLiteral(n, _) => Ok(AstNode::IntLiteral(n, loc)),
            Token::FloatLiteral(x, _) => Ok(AstNode::FloatLiteral(x, loc)),
            Token::True(_) => Ok(AstNode::BoolLiteral(true, loc)),
            Token::False(_) => Ok(AstNode::BoolLiteral(false, loc)),
            Token::None(_) => Ok(AstNode::NoneLiteral(loc)),
            Token::Ident(name, _) => Ok(AstNode::Variable(name, loc)),

            Token::StringLiteral(s, _) => {
                // Adjacent literals concatenate
                let mut value = s;
                while let Token::StringLiteral(next, _) = self.peek_token() {
                    value.push_str(next);
                    self.advance();
                }
                if matches!(self.peek_token(), Token::FStringLiteral(..)) {
                    return Err(self.error_here("mixing f-strings and plain strings is not supported"));
                }
                Ok(AstNode::StringLiteral(value, loc))
            }

            Token::FStringLiteral(pieces, _) => self.parse_fstring(pieces, loc),

            Token::LParen(_) => {
                if self.eat(Token::RParen) {
                    return Ok(AstNode::TupleLiteral(Vec::new(), loc));
                }
                let first = self.parse_expression()?;
                if self.eat(Token::RParen) {
                    return Ok(first);
                }
                if self.at(Token::For) {
                    return Err(self.error_here("generator expressions are not supported"));
                }
                let mut items = vec![first];
                while self.eat(Token::Comma) {
                    if self.at(Token::RParen) {
                        break;
                    }
                    items.push(self.parse_expression()?);
                }
                self.expect(Token::RParen, "expected ')'")?;
                Ok(AstNode::TupleLiteral(items, loc))
            }

            Token::LBracket(_) => {
                let mut items = Vec::new();
                while !self.at(Token::RBracket) {
                    items.push(self.parse_expression()?);
                    if self.at(Token::For) {
                        return Err(self.error_here("list comprehensions are not supported"));
                    }
                    if !self.eat(Token::Comma) {
                        break;
                    }
                }
                self.expect(Token::RBracket, "expected ']'")?;
                Ok(AstNode::ListLiteral(items, loc))
            }

            Token::LBrace(_) => {
                let mut entries = Vec::new();
                while !self.at(Token::RBrace) {
                    let key = self.parse_expression()?;
                    if !self.eat(Token::Colon) {
                        return Err(self.error_here("set literals are not supported"));
                    }
                    let value = self.parse_expression()?;
                    if self.at(Token::For) {
                        return Err(self.error_here("dict comprehensions are not supported"));
                    }
                    entries.push((key, value));
                    if !self.eat(Token::Comma) {
                        break;
                    }
                }
                self.expect(Token::RBrace, "expected '}'")?;
                Ok(AstNode::DictLiteral(entries, loc))
            }

            Token::Newline(_) | Token::Eof(_) => Err(ParseError {
                message: "unexpected end of line, expected an expression".to_string(),
                location: loc,
            }),

            other => Err(ParseError {
                message: format!("invalid syntax: unexpected {}", other),
                location: loc,
            }),
        }
    }

    /// Parse the embedded expressions of an f-string
    fn parse_fstring(
        &mut self,
        pieces: Vec<FStringPiece>,
        loc: SourceLocation,
    ) -> Result<AstNode, ParseError> {
        let mut parts = Vec::with_capacity(pieces.len());
        for piece in pieces {
            match piece {
                FStringPiece::Text(text) => parts.push(FStringPart::Text(text)),
                FStringPiece::Expr {
                    source,
                    repr,
                    spec,
                    location,
                } => {
                    let expr = Self::parse_embedded_expression(&source, self.depth).map_err(|e| ParseError {
                        message: format!("f-string: {}", e.message),
                        location,
                    })?;
                    parts.push(FStringPart::Expr {
                        expr: Box::new(expr),
                        repr,
                        spec,
                    });
                }
            }
        }
        Ok(AstNode::FString(parts, loc))
    }

    fn parse_embedded_expression(source: &str, depth: usize) -> Result<AstNode, ParseError> {
        let mut parser = Parser::fragment(source)?;
        parser.depth = depth;
        let expr = parser.parse_expression_list()?;
        parser.eat(Token::Newline);
        if !parser.is_at_end() {
            return Err(parser.error_here(&format!(
                "unexpected {} in expression",
                parser.peek_token()
            )));
        }
        Ok(expr)
    }

    /// Whether the current token can begin an expression (used after a
    /// trailing comma)
    fn starts_expression(&self) -> bool {
        matches!(
            self.peek_token(),
            Token::IntLiteral(..)
                | Token::FloatLiteral(..)
                | Token::StringLiteral(..)
                | Token::FStringLiteral(..)
                | Token::Ident(..)
                | Token::True(_)
                | Token::False(_)
                | Token::None(_)
                | Token::Not(_)
                | Token::Minus(_)
                | Token::Plus(_)
                | Token::LParen(_)
                | Token::LBracket(_)
                | Token::LBrace(_)
        )
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match self.peek_token().clone() {
            Token::Ident(name, _) => {
                self.advance();
                Ok(name)
            }
            other => Err(self.error_here(&format!("expected identifier, found {}", other))),
        }
    }

    /// Whether the current token has the same variant as `kind`
    fn at(&self, kind: fn(SourceLocation) -> Token) -> bool {
        discriminant(self.peek_token()) == discriminant(&kind(SourceLocation::new(0, 0)))
    }

    /// Consume the current token if it has the variant `kind`
    fn eat(&mut self, kind: fn(SourceLocation) -> Token) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(
        &mut self,
        kind: fn(SourceLocation) -> Token,
        message: &str,
    ) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(&format!("{}, found {}", message, self.peek_token())))
        }
    }

    /// Run `parse` one nesting level deeper, refusing input nested past
    /// [`MAX_NESTING_DEPTH`] before it can exhaust the stack
    fn nested<T>(
        &mut self,
        message: &str,
        parse: fn(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error_here(message));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn error_here(&self, message: &str) -> ParseError {
        ParseError {
            message: message.to_string(),
            location: self.current_location(),
        }
    }

    fn peek_token(&self) -> &Token {
        // The stream always ends with Eof and position never moves past it
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek_token().clone();
        if !self.is_at_end() {
            self.position += 1;
        }
        token
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek_token(), Token::Eof(_))
    }

    fn current_location(&self) -> SourceLocation {
        self.peek_token().location()
    }
}

/// Parse a whole program (strict indentation)
pub fn parse_program(source: &str) -> Result<Module, ParseError> {
    Parser::new(source)?.parse_program()
}

/// Parse a fragment whose first line sets the base indentation
pub fn parse_fragment(source: &str) -> Result<Module, ParseError> {
    Parser::fragment(source)?.parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment() {
        let module = parse_program("total = x + y").unwrap();
        assert_eq!(module.nodes.len(), 1);
        match &module.nodes[0] {
            AstNode::Assignment { targets, value, .. } => {
                assert!(matches!(&targets[0], AstNode::Variable(name, _) if name == "total"));
                assert!(matches!(**value, AstNode::BinaryOp { op: BinOp::Add, .. }));
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_chained_and_tuple_assignment() {
        let module = parse_program("a = b = 1\nx, y = y, x").unwrap();
        match &module.nodes[0] {
            AstNode::Assignment { targets, .. } => assert_eq!(targets.len(), 2),
            other => panic!("Expected assignment, got {:?}", other),
        }
        match &module.nodes[1] {
            AstNode::Assignment { targets, value, .. } => {
                assert!(matches!(&targets[0], AstNode::TupleLiteral(items, _) if items.len() == 2));
                assert!(matches!(**value, AstNode::TupleLiteral(..)));
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_augmented_assignment() {
        let module = parse_program("total += i").unwrap();
        assert!(matches!(
            module.nodes[0],
            AstNode::CompoundAssignment { op: BinOp::Add, .. }
        ));
    }

    #[test]
    fn test_if_elif_else() {
        let source = "if x > 1:\n    y = 1\nelif x > 0:\n    y = 2\nelse:\n    y = 3\n";
        let module = parse_program(source).unwrap();
        match &module.nodes[0] {
            AstNode::If {
                branches,
                else_branch,
                ..
            } => {
                assert_eq!(branches.len(), 2);
                assert!(else_branch.is_some());
            }
            other => panic!("Expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_for_with_tuple_target() {
        let module = parse_program("for i, v in enumerate(xs):\n    print(i, v)\n").unwrap();
        match &module.nodes[0] {
            AstNode::For { target, body, .. } => {
                assert!(matches!(**target, AstNode::TupleLiteral(..)));
                assert_eq!(body.len(), 1);
            }
            other => panic!("Expected for, got {:?}", other),
        }
    }

    #[test]
    fn test_one_line_suite() {
        let module = parse_program("if True: x = 1; y = 2").unwrap();
        match &module.nodes[0] {
            AstNode::If { branches, .. } => assert_eq!(branches[0].1.len(), 2),
            other => panic!("Expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_block_opener_without_body_fails() {
        let err = parse_program("if True:").unwrap_err();
        assert!(err.message.contains("indented block"));
    }

    #[test]
    fn test_chained_comparison_and_membership() {
        let module = parse_program("0 < x <= 10 and y not in z").unwrap();
        match &module.nodes[0] {
            AstNode::ExpressionStatement { expr, .. } => match &**expr {
                AstNode::BoolOp { left, right, .. } => {
                    assert!(matches!(&**left, AstNode::Compare { comparisons, .. } if comparisons.len() == 2));
                    assert!(matches!(
                        &**right,
                        AstNode::Compare { comparisons, .. } if comparisons[0].0 == CmpOp::NotIn
                    ));
                }
                other => panic!("Expected bool op, got {:?}", other),
            },
            other => panic!("Expected expression, got {:?}", other),
        }
    }

    fn parenthesized(levels: usize) -> String {
        format!("x = {}1{}", "(".repeat(levels), ")".repeat(levels))
    }

    #[test]
    fn test_nesting_at_the_limit_parses() {
        // The statement's own expression is the first level
        let module = parse_program(&parenthesized(MAX_NESTING_DEPTH - 1)).unwrap();
        assert!(matches!(
            &module.nodes[0],
            AstNode::Assignment { value, .. } if matches!(**value, AstNode::IntLiteral(1, _))
        ));
        let nested_lists = format!("{}{}", "[".repeat(MAX_NESTING_DEPTH - 1), "]".repeat(MAX_NESTING_DEPTH - 1));
        assert!(parse_program(&nested_lists).is_ok());
    }

    #[test]
    fn test_nesting_past_the_limit_is_an_error() {
        let err = parse_program(&parenthesized(MAX_NESTING_DEPTH)).unwrap_err();
        assert_eq!(err.message, "too many nested parentheses");

        let err = parse_program(&parenthesized(500)).unwrap_err();
        assert_eq!(err.message, "too many nested parentheses");

        let err = parse_program(&format!("x = {}1", "-".repeat(500))).unwrap_err();
        assert_eq!(err.message, "expression is too deeply nested");

        let err = parse_program(&format!("x = {}", vec!["2"; 500].join(" ** "))).unwrap_err();
        assert_eq!(err.message, "expression is too deeply nested");

        let mut blocks = String::new();
        for level in 0..=MAX_NESTING_DEPTH {
            blocks.push_str(&format!("{}if True:\n", "    ".repeat(level)));
        }
        blocks.push_str(&format!("{}pass\n", "    ".repeat(MAX_NESTING_DEPTH + 1)));
        let err = parse_program(&blocks).unwrap_err();
        assert!(err.message.starts_with("too many nested"));
    }

    #[test]
    fn test_power_precedence() {
        // -2 ** 2 parses as -(2 ** 2)
        let module = parse_program("-2 ** 2").unwrap();
        match &module.nodes[0] {
            AstNode::ExpressionStatement { expr, .. } => {
                assert!(matches!(&**expr, AstNode::UnaryOp { op: UnOp::Neg, operand, .. }
                    if matches!(**operand, AstNode::BinaryOp { op: BinOp::Pow, .. })));
            }
            other => panic!("Expected expression, got {:?}", other),
        }
    }

    #[test]
    fn test_call_with_keywords_and_methods() {
        let module = parse_program("print(a, b, sep=', ')\nxs.append(3)\nd['k'][0:2]").unwrap();
        assert!(matches!(
            &module.nodes[0],
            AstNode::ExpressionStatement { expr, .. }
                if matches!(&**expr, AstNode::FunctionCall { kwargs, .. } if kwargs.len() == 1)
        ));
        assert!(matches!(
            &module.nodes[1],
            AstNode::ExpressionStatement { expr, .. }
                if matches!(&**expr, AstNode::MethodCall { method, .. } if method == "append")
        ));
        assert!(matches!(
            &module.nodes[2],
            AstNode::ExpressionStatement { expr, .. }
                if matches!(&**expr, AstNode::Index { subscript: Subscript::Slice { .. }, .. })
        ));
    }

    #[test]
    fn test_fstring_expressions_are_parsed() {
        let module = parse_program("f\"{x + 1:.2f} and {name!r}\"").unwrap();
        match &module.nodes[0] {
            AstNode::ExpressionStatement { expr, .. } => match &**expr {
                AstNode::FString(parts, _) => {
                    assert_eq!(parts.len(), 3);
                    assert!(matches!(&parts[0], FStringPart::Expr { spec, .. } if spec == ".2f"));
                    assert!(matches!(&parts[2], FStringPart::Expr { repr: true, .. }));
                }
                other => panic!("Expected f-string, got {:?}", other),
            },
            other => panic!("Expected expression, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_statements() {
        let err = parse_program("def f():\n    pass\n").unwrap_err();
        assert!(err.message.contains("'def' statements are not supported"));
        assert!(parse_program("[x for x in y]").is_err());
    }

    #[test]
    fn test_unexpected_indent_in_program() {
        let err = parse_program("x = 1\n    y = 2\n").unwrap_err();
        assert!(err.message.contains("unexpected indent"));
        assert!(parse_fragment("    y = 2\n").is_ok());
    }

    #[test]
    fn test_orphan_else() {
        assert!(parse_fragment("else:\n    x = 1\n").is_err());
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert!(parse_program("x + 1 = 2").is_err());
    }
}
