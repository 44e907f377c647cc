//! Lexer (tokenizer) for the scripting language
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! Block structure is indentation based, so the lexer also tracks an indent
//! stack and emits [`Token::Indent`], [`Token::Dedent`] and [`Token::Newline`]
//! at logical line boundaries. Newlines inside brackets and after a trailing
//! backslash do not end a logical line.
//!
//! Two indentation modes exist:
//!
//! - **strict** ([`Lexer::new`]): the first statement must start at column 0,
//!   as for a whole program.
//! - **relative** ([`Lexer::fragment`]): the first non-blank line's indentation
//!   becomes the base level. Used for blocks cut out of the middle of a program.

use super::ast::SourceLocation;
use std::fmt;

/// Raw piece of an f-string before its embedded expressions are parsed
#[derive(Debug, Clone, PartialEq)]
pub enum FStringPiece {
    Text(String),
    Expr {
        source: String,
        repr: bool,
        spec: String,
        location: SourceLocation,
    },
}

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so that parse errors can report
/// an accurate line and column without a separate token→location table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    IntLiteral(i64, SourceLocation),
    FloatLiteral(f64, SourceLocation),
    StringLiteral(String, SourceLocation),
    FStringLiteral(Vec<FStringPiece>, SourceLocation),

    // Identifiers
    Ident(String, SourceLocation),

    // Keywords
    If(SourceLocation),
    Elif(SourceLocation),
    Else(SourceLocation),
    While(SourceLocation),
    For(SourceLocation),
    In(SourceLocation),
    Break(SourceLocation),
    Continue(SourceLocation),
    Pass(SourceLocation),
    And(SourceLocation),
    Or(SourceLocation),
    Not(SourceLocation),
    Is(SourceLocation),
    True(SourceLocation),
    False(SourceLocation),
    None(SourceLocation),

    // Arithmetic
    Plus(SourceLocation),        // +
    Minus(SourceLocation),       // -
    Star(SourceLocation),        // *
    DoubleStar(SourceLocation),  // **
    Slash(SourceLocation),       // /
    DoubleSlash(SourceLocation), // //
    Percent(SourceLocation),     // %

    // Comparison
    EqEq(SourceLocation),  // ==
    NotEq(SourceLocation), // !=
    Lt(SourceLocation),    // <
    Le(SourceLocation),    // <=
    Gt(SourceLocation),    // >
    Ge(SourceLocation),    // >=

    // Assignment
    Eq(SourceLocation),            // =
    PlusEq(SourceLocation),        // +=
    MinusEq(SourceLocation),       // -=
    StarEq(SourceLocation),        // *=
    SlashEq(SourceLocation),       // /=
    DoubleSlashEq(SourceLocation), // //=
    PercentEq(SourceLocation),     // %=

    // Punctuation
    LParen(SourceLocation),    // (
    RParen(SourceLocation),    // )
    LBracket(SourceLocation),  // [
    RBracket(SourceLocation),  // ]
    LBrace(SourceLocation),    // {
    RBrace(SourceLocation),    // }
    Comma(SourceLocation),     // ,
    Colon(SourceLocation),     // :
    Dot(SourceLocation),       // .
    Semicolon(SourceLocation), // ;

    // Layout
    Newline(SourceLocation),
    Indent(SourceLocation),
    Dedent(SourceLocation),

    // End of file
    Eof(SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::IntLiteral(_, loc)
            | Token::FloatLiteral(_, loc)
            | Token::StringLiteral(_, loc)
            | Token::FStringLiteral(_, loc)
            | Token::Ident(_, loc)
            | Token::If(loc)
            | Token::Elif(loc)
            | Token::Else(loc)
            | Token::While(loc)
            | Token::For(loc)
            | Token::In(loc)
            | Token::Break(loc)
            | Token::Continue(loc)
            | Token::Pass(loc)
            | Token::And(loc)
            | Token::Or(loc)
            | Token::Not(loc)
            | Token::Is(loc)
            | Token::True(loc)
            | Token::False(loc)
            | Token::None(loc)
            | Token::Plus(loc)
            | Token::Minus(loc)
            | Token::Star(loc)
            | Token::DoubleStar(loc)
            | Token::Slash(loc)
            | Token::DoubleSlash(loc)
            | Token::Percent(loc)
            | Token::EqEq(loc)
            | Token::NotEq(loc)
            | Token::Lt(loc)
            | Token::Le(loc)
            | Token::Gt(loc)
            | Token::Ge(loc)
            | Token::Eq(loc)
            | Token::PlusEq(loc)
            | Token::MinusEq(loc)
            | Token::StarEq(loc)
            | Token::SlashEq(loc)
            | Token::DoubleSlashEq(loc)
            | Token::PercentEq(loc)
            | Token::LParen(loc)
            | Token::RParen(loc)
            | Token::LBracket(loc)
            | Token::RBracket(loc)
            | Token::LBrace(loc)
            | Token::RBrace(loc)
            | Token::Comma(loc)
            | Token::Colon(loc)
            | Token::Dot(loc)
            | Token::Semicolon(loc)
            | Token::Newline(loc)
            | Token::Indent(loc)
            | Token::Dedent(loc)
            | Token::Eof(loc) => *loc,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::IntLiteral(n, _) => write!(f, "int literal {}", n),
            Token::FloatLiteral(x, _) => write!(f, "float literal {}", x),
            Token::StringLiteral(s, _) => write!(f, "string literal {:?}", s),
            Token::FStringLiteral(..) => write!(f, "f-string literal"),
            Token::Ident(s, _) => write!(f, "identifier '{}'", s),
            Token::If(_) => write!(f, "'if'"),
            Token::Elif(_) => write!(f, "'elif'"),
            Token::Else(_) => write!(f, "'else'"),
            Token::While(_) => write!(f, "'while'"),
            Token::For(_) => write!(f, "'for'"),
            Token::In(_) => write!(f, "'in'"),
            Token::Break(_) => write!(f, "'break'"),
            Token::Continue(_) => write!(f, "'continue'"),
            Token::Pass(_) => write!(f, "'pass'"),
            Token::And(_) => write!(f, "'and'"),
            Token::Or(_) => write!(f, "'or'"),
            Token::Not(_) => write!(f, "'not'"),
            Token::Is(_) => write!(f, "'is'"),
            Token::True(_) => write!(f, "'True'"),
            Token::False(_) => write!(f, "'False'"),
            Token::None(_) => write!(f, "'None'"),
            Token::Plus(_) => write!(f, "'+'"),
            Token::Minus(_) => write!(f, "'-'"),
            Token::Star(_) => write!(f, "'*'"),
            Token::DoubleStar(_) => write!(f, "'**'"),
            Token::Slash(_) => write!(f, "'/'"),
            Token::DoubleSlash(_) => write!(f, "'//'"),
            Token::Percent(_) => write!(f, "'%'"),
            Token::EqEq(_) => write!(f, "'=='"),
            Token::NotEq(_) => write!(f, "'!='"),
            Token::Lt(_) => write!(f, "'<'"),
            Token::Le(_) => write!(f, "'<='"),
            Token::Gt(_) => write!(f, "'>'"),
            Token::Ge(_) => write!(f, "'>='"),
            Token::Eq(_) => write!(f, "'='"),
            Token::PlusEq(_) => write!(f, "'+='"),
            Token::MinusEq(_) => write!(f, "'-='"),
            Token::StarEq(_) => write!(f, "'*='"),
            Token::SlashEq(_) => write!(f, "'/='"),
            Token::DoubleSlashEq(_) => write!(f, "'//='"),
            Token::PercentEq(_) => write!(f, "'%='"),
            Token::LParen(_) => write!(f, "'('"),
            Token::RParen(_) => write!(f, "')'"),
            Token::LBracket(_) => write!(f, "'['"),
            Token::RBracket(_) => write!(f, "']'"),
            Token::LBrace(_) => write!(f, "'{{'"),
            Token::RBrace(_) => write!(f, "'}}'"),
            Token::Comma(_) => write!(f, "','"),
            Token::Colon(_) => write!(f, "':'"),
            Token::Dot(_) => write!(f, "'.'"),
            Token::Semicolon(_) => write!(f, "';'"),
            Token::Newline(_) => write!(f, "end of line"),
            Token::Indent(_) => write!(f, "indent"),
            Token::Dedent(_) => write!(f, "dedent"),
            Token::Eof(_) => write!(f, "end of input"),
        }
    }
}

/// Lexer error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("line {}, column {}: {message}", .location.line, .location.column)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

/// Lexer for scripting-language source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    indent_stack: Vec<usize>,
    bracket_depth: usize,
    at_line_start: bool,
    relative_indent: bool,
    seen_logical_line: bool,
}

impl Lexer {
    /// Create a lexer for a whole program (first statement at column 0).
    pub fn new(input: &str) -> Self {
        Self::with_mode(input, false)
    }

    /// Create a lexer for a fragment whose base indentation is taken from its
    /// first non-blank line.
    pub fn fragment(input: &str) -> Self {
        Self::with_mode(input, true)
    }

    fn with_mode(input: &str, relative_indent: bool) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            indent_stack: vec![0],
            bracket_depth: 0,
            at_line_start: true,
            relative_indent,
            seen_logical_line: false,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            if self.at_line_start && self.bracket_depth == 0 {
                if !self.handle_line_start(&mut tokens)? {
                    break;
                }
            }

            self.skip_inline_whitespace_and_comment();

            let Some(ch) = self.peek() else {
                break;
            };

            match ch {
                '\\' if matches!(self.peek_ahead(1), Some('\n') | Some('\r')) => {
                    self.advance();
                    if self.peek() == Some('\r') {
                        self.advance();
                    }
                    if self.peek() == Some('\n') {
                        self.advance();
                    }
                }
                '\r' => {
                    self.advance();
                }
                '\n' => {
                    let loc = self.current_location();
                    self.advance();
                    if self.bracket_depth == 0 {
                        tokens.push(Token::Newline(loc));
                        self.at_line_start = true;
                    }
                }
                _ => tokens.push(self.next_token()?),
            }
        }

        let loc = self.current_location();
        if self.bracket_depth > 0 {
            return Err(LexError {
                message: "unexpected end of input inside brackets".to_string(),
                location: loc,
            });
        }
        if tokens
            .last()
            .is_some_and(|t| !matches!(t, Token::Newline(_) | Token::Dedent(_)))
        {
            tokens.push(Token::Newline(loc));
        }
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            tokens.push(Token::Dedent(loc));
        }
        tokens.push(Token::Eof(loc));

        Ok(tokens)
    }

    /// Measure indentation at the start of a physical line and emit layout
    /// tokens. Blank and comment-only lines are consumed without effect.
    /// Returns `false` once the input is exhausted.
    fn handle_line_start(&mut self, tokens: &mut Vec<Token>) -> Result<bool, LexError> {
        loop {
            let mut width = 0;
            while let Some(c) = self.peek() {
                if c == ' ' || c == '\t' {
                    width += 1;
                    self.advance();
                } else {
                    break;
                }
            }

            match self.peek() {
                None => return Ok(false),
                Some('\n') | Some('\r') | Some('#') => {
                    self.skip_inline_whitespace_and_comment();
                    if self.peek() == Some('\r') {
                        self.advance();
                    }
                    if self.peek() == Some('\n') {
                        self.advance();
                    }
                    continue;
                }
                Some(_) => {
                    self.at_line_start = false;
                    let loc = SourceLocation::new(self.line, 1);

                    if !self.seen_logical_line {
                        self.seen_logical_line = true;
                        if self.relative_indent {
                            self.indent_stack = vec![width];
                            return Ok(true);
                        }
                    }

                    let top = self.indent_stack.last().copied().unwrap_or(0);
                    if width > top {
                        self.indent_stack.push(width);
                        tokens.push(Token::Indent(loc));
                    } else if width < top {
                        while self.indent_stack.last().is_some_and(|&level| level > width) {
                            self.indent_stack.pop();
                            tokens.push(Token::Dedent(loc));
                        }
                        if self.indent_stack.last().copied() != Some(width) {
                            return Err(LexError {
                                message: "unindent does not match any outer indentation level"
                                    .to_string(),
                                location: loc,
                            });
                        }
                    }
                    return Ok(true);
                }
            }
        }
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.advance().ok_or_else(|| LexError {
            message: "unexpected end of input".to_string(),
            location: loc,
        })?;

        match ch {
            '"' | '\'' => self.string_literal(ch, false, loc),

            '0'..='9' => self.number_literal(ch, loc),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.number_literal(ch, loc),

            c if c.is_alphabetic() || c == '_' => {
                if matches!(c, 'f' | 'F' | 'r' | 'R')
                    && matches!(self.peek(), Some('"') | Some('\''))
                {
                    let quote = self.advance().unwrap_or('"');
                    if matches!(c, 'f' | 'F') {
                        return self.fstring_literal(quote, loc);
                    }
                    return self.string_literal(quote, true, loc);
                }
                Ok(self.identifier_or_keyword(c, loc))
            }

            '+' => Ok(self.with_eq(loc, Token::Plus, Token::PlusEq)),
            '-' => Ok(self.with_eq(loc, Token::Minus, Token::MinusEq)),
            '%' => Ok(self.with_eq(loc, Token::Percent, Token::PercentEq)),
            '*' => {
                if self.peek() == Some('*') {
                    self.advance();
                    if self.peek() == Some('=') {
                        return Err(LexError {
                            message: "operator '**=' is not supported".to_string(),
                            location: loc,
                        });
                    }
                    Ok(Token::DoubleStar(loc))
                } else {
                    Ok(self.with_eq(loc, Token::Star, Token::StarEq))
                }
            }
            '/' => {
                if self.peek() == Some('/') {
                    self.advance();
                    Ok(self.with_eq(loc, Token::DoubleSlash, Token::DoubleSlashEq))
                } else {
                    Ok(self.with_eq(loc, Token::Slash, Token::SlashEq))
                }
            }
            '=' => Ok(self.with_eq(loc, Token::Eq, Token::EqEq)),
            '<' => Ok(self.with_eq(loc, Token::Lt, Token::Le)),
            '>' => Ok(self.with_eq(loc, Token::Gt, Token::Ge)),
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::NotEq(loc))
                } else {
                    Err(LexError {
                        message: "unexpected character '!'".to_string(),
                        location: loc,
                    })
                }
            }

            '(' => {
                self.bracket_depth += 1;
                Ok(Token::LParen(loc))
            }
            '[' => {
                self.bracket_depth += 1;
                Ok(Token::LBracket(loc))
            }
            '{' => {
                self.bracket_depth += 1;
                Ok(Token::LBrace(loc))
            }
            ')' => {
                self.close_bracket(loc)?;
                Ok(Token::RParen(loc))
            }
            ']' => {
                self.close_bracket(loc)?;
                Ok(Token::RBracket(loc))
            }
            '}' => {
                self.close_bracket(loc)?;
                Ok(Token::RBrace(loc))
            }
            ',' => Ok(Token::Comma(loc)),
            ':' => Ok(Token::Colon(loc)),
            '.' => Ok(Token::Dot(loc)),
            ';' => Ok(Token::Semicolon(loc)),

            '&' | '|' | '^' | '~' | '@' => Err(LexError {
                message: format!("operator '{}' is not supported", ch),
                location: loc,
            }),

            _ => Err(LexError {
                message: format!("unexpected character '{}'", ch),
                location: loc,
            }),
        }
    }

    /// Produce `with` if the next character is `=`, otherwise `plain`
    fn with_eq(
        &mut self,
        loc: SourceLocation,
        plain: fn(SourceLocation) -> Token,
        with: fn(SourceLocation) -> Token,
    ) -> Token {
        if self.peek() == Some('=') {
            self.advance();
            with(loc)
        } else {
            plain(loc)
        }
    }

    fn close_bracket(&mut self, loc: SourceLocation) -> Result<(), LexError> {
        if self.bracket_depth == 0 {
            return Err(LexError {
                message: "unmatched closing bracket".to_string(),
                location: loc,
            });
        }
        self.bracket_depth -= 1;
        Ok(())
    }

    /// Lex a numeric literal whose first character has been consumed
    fn number_literal(&mut self, first: char, loc: SourceLocation) -> Result<Token, LexError> {
        let mut text = String::new();
        text.push(first);
        let mut is_float = first == '.';

        self.take_digits(&mut text);

        if !is_float && self.peek() == Some('.') && !self.peek_ahead(1).is_some_and(|c| c == '.') {
            is_float = true;
            text.push('.');
            self.advance();
            self.take_digits(&mut text);
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign_offset = usize::from(matches!(self.peek_ahead(1), Some('+') | Some('-')));
            if self.peek_ahead(1 + sign_offset).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                text.push('e');
                self.advance();
                if sign_offset == 1 {
                    if let Some(sign) = self.advance() {
                        text.push(sign);
                    }
                }
                self.take_digits(&mut text);
            }
        }

        if self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            return Err(LexError {
                message: format!("invalid numeric literal '{}{}'", text, self.peek().unwrap_or(' ')),
                location: loc,
            });
        }

        if is_float {
            text.parse::<f64>()
                .map(|x| Token::FloatLiteral(x, loc))
                .map_err(|_| LexError {
                    message: format!("invalid float literal '{}'", text),
                    location: loc,
                })
        } else {
            text.parse::<i64>()
                .map(|n| Token::IntLiteral(n, loc))
                .map_err(|_| LexError {
                    message: format!("integer literal '{}' is too large", text),
                    location: loc,
                })
        }
    }

    fn take_digits(&mut self, text: &mut String) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else if c == '_' && self.peek_ahead(1).is_some_and(|d| d.is_ascii_digit()) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn identifier_or_keyword(&mut self, first: char, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        ident.push(first);

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "if" => Token::If(loc),
            "elif" => Token::Elif(loc),
            "else" => Token::Else(loc),
            "while" => Token::While(loc),
            "for" => Token::For(loc),
            "in" => Token::In(loc),
            "break" => Token::Break(loc),
            "continue" => Token::Continue(loc),
            "pass" => Token::Pass(loc),
            "and" => Token::And(loc),
            "or" => Token::Or(loc),
            "not" => Token::Not(loc),
            "is" => Token::Is(loc),
            "True" => Token::True(loc),
            "False" => Token::False(loc),
            "None" => Token::None(loc),
            _ => Token::Ident(ident, loc),
        }
    }

    /// Read the body of a string literal (opening quote already consumed),
    /// handling triple quotes and escape sequences.
    fn read_string_body(
        &mut self,
        quote: char,
        raw: bool,
        loc: SourceLocation,
    ) -> Result<String, LexError> {
        let triple = self.peek() == Some(quote) && self.peek_ahead(1) == Some(quote);
        if triple {
            self.advance();
            self.advance();
        } else if self.peek() == Some(quote) {
            // Empty string
            self.advance();
            return Ok(String::new());
        }

        let mut value = String::new();
        loop {
            let Some(ch) = self.advance() else {
                return Err(LexError {
                    message: "unterminated string literal".to_string(),
                    location: loc,
                });
            };

            if ch == quote {
                if !triple {
                    return Ok(value);
                }
                if self.peek() == Some(quote) && self.peek_ahead(1) == Some(quote) {
                    self.advance();
                    self.advance();
                    return Ok(value);
                }
                value.push(ch);
                continue;
            }

            if ch == '\n' && !triple {
                return Err(LexError {
                    message: "unterminated string literal".to_string(),
                    location: loc,
                });
            }

            if ch == '\\' && !raw {
                let Some(escaped) = self.advance() else {
                    continue;
                };
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '0' => value.push('\0'),
                    '\\' => value.push('\\'),
                    '\'' => value.push('\''),
                    '"' => value.push('"'),
                    '\n' => {}
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
                continue;
            }

            value.push(ch);
        }
    }

    fn string_literal(
        &mut self,
        quote: char,
        raw: bool,
        loc: SourceLocation,
    ) -> Result<Token, LexError> {
        let value = self.read_string_body(quote, raw, loc)?;
        Ok(Token::StringLiteral(value, loc))
    }

    /// Split an f-string into literal text and `{expr[!r][:spec]}` pieces
    fn fstring_literal(&mut self, quote: char, loc: SourceLocation) -> Result<Token, LexError> {
        let body: Vec<char> = self.read_string_body(quote, false, loc)?.chars().collect();
        let mut pieces = Vec::new();
        let mut text = String::new();
        let mut i = 0;

        while i < body.len() {
            let c = body[i];
            if c == '{' && body.get(i + 1) == Some(&'{') {
                text.push('{');
                i += 2;
                continue;
            }
            if c == '}' {
                if body.get(i + 1) == Some(&'}') {
                    text.push('}');
                    i += 2;
                    continue;
                }
                return Err(LexError {
                    message: "f-string: single '}' is not allowed".to_string(),
                    location: loc,
                });
            }
            if c != '{' {
                text.push(c);
                i += 1;
                continue;
            }

            if !text.is_empty() {
                pieces.push(FStringPiece::Text(std::mem::take(&mut text)));
            }

            // Scan the replacement field, respecting nested brackets and strings
            let mut depth = 0usize;
            let mut in_string: Option<char> = None;
            let mut source = String::new();
            let mut repr = false;
            let mut spec = String::new();
            i += 1;
            loop {
                let Some(&ch) = body.get(i) else {
                    return Err(LexError {
                        message: "f-string: expecting '}'".to_string(),
                        location: loc,
                    });
                };
                if let Some(q) = in_string {
                    if ch == q {
                        in_string = None;
                    }
                    source.push(ch);
                    i += 1;
                    continue;
                }
                match ch {
                    '\'' | '"' => {
                        in_string = Some(ch);
                        source.push(ch);
                    }
                    '(' | '[' | '{' => {
                        depth += 1;
                        source.push(ch);
                    }
                    ')' | ']' => {
                        depth = depth.saturating_sub(1);
                        source.push(ch);
                    }
                    '}' if depth > 0 => {
                        depth -= 1;
                        source.push(ch);
                    }
                    '}' => {
                        i += 1;
                        break;
                    }
                    '!' if depth == 0 && body.get(i + 1) != Some(&'=') => {
                        match body.get(i + 1) {
                            Some('r') => repr = true,
                            Some('s') => {}
                            _ => {
                                return Err(LexError {
                                    message: "f-string: invalid conversion character".to_string(),
                                    location: loc,
                                })
                            }
                        }
                        i += 1;
                    }
                    ':' if depth == 0 => {
                        i += 1;
                        while let Some(&s) = body.get(i) {
                            if s == '}' {
                                break;
                            }
                            spec.push(s);
                            i += 1;
                        }
                        continue;
                    }
                    _ => source.push(ch),
                }
                i += 1;
            }

            if source.trim().is_empty() {
                return Err(LexError {
                    message: "f-string: empty expression not allowed".to_string(),
                    location: loc,
                });
            }
            pieces.push(FStringPiece::Expr {
                source: source.trim().to_string(),
                repr,
                spec,
                location: loc,
            });
        }

        if !text.is_empty() {
            pieces.push(FStringPiece::Text(text));
        }

        Ok(Token::FStringLiteral(pieces, loc))
    }

    /// Skip spaces, tabs and a trailing `#` comment (not the newline itself)
    fn skip_inline_whitespace_and_comment(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' => {
                    self.advance();
                }
                '\n' if self.bracket_depth > 0 => {
                    self.advance();
                }
                '#' => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        Lexer::new(src).tokenize().unwrap()
    }

    #[test]
    fn test_simple_assignment() {
        let tokens = lex("x = 5");

        assert!(matches!(tokens[0], Token::Ident(ref s, _) if s == "x"));
        assert!(matches!(tokens[1], Token::Eq(_)));
        assert!(matches!(tokens[2], Token::IntLiteral(5, _)));
        assert!(matches!(tokens[3], Token::Newline(_)));
        assert!(matches!(tokens[4], Token::Eof(_)));
    }

    #[test]
    fn test_operators() {
        let tokens = lex("a += b // c ** d != e <= f //= 2");

        assert!(matches!(tokens[1], Token::PlusEq(_)));
        assert!(matches!(tokens[3], Token::DoubleSlash(_)));
        assert!(matches!(tokens[5], Token::DoubleStar(_)));
        assert!(matches!(tokens[7], Token::NotEq(_)));
        assert!(matches!(tokens[9], Token::Le(_)));
        assert!(matches!(tokens[11], Token::DoubleSlashEq(_)));
    }

    #[test]
    fn test_indent_and_dedent() {
        let tokens = lex("for i in x:\n    y = i\nz = 1\n");

        let layout: Vec<&str> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::Newline(_) => Some("NL"),
                Token::Indent(_) => Some("IN"),
                Token::Dedent(_) => Some("DE"),
                _ => None,
            })
            .collect();
        assert_eq!(layout, vec!["NL", "IN", "NL", "DE", "NL"]);
    }

    #[test]
    fn test_blank_and_comment_lines_do_not_affect_layout() {
        let tokens = lex("if x:\n\n    # note\n    y = 1\n");
        let indents = tokens.iter().filter(|t| matches!(t, Token::Indent(_))).count();
        let dedents = tokens.iter().filter(|t| matches!(t, Token::Dedent(_))).count();
        assert_eq!(indents, 1);
        assert_eq!(dedents, 1);
    }

    #[test]
    fn test_fragment_uses_first_line_as_base() {
        let tokens = Lexer::fragment("    if x:\n        y = 1\n").tokenize().unwrap();
        assert!(matches!(tokens[0], Token::If(_)));
        let indents = tokens.iter().filter(|t| matches!(t, Token::Indent(_))).count();
        assert_eq!(indents, 1);
    }

    #[test]
    fn test_bad_unindent() {
        let err = Lexer::new("if x:\n    y = 1\n  z = 2\n").tokenize().unwrap_err();
        assert!(err.message.contains("unindent"));
    }

    #[test]
    fn test_newlines_inside_brackets_are_joined() {
        let tokens = lex("xs = [1,\n      2]\n");
        assert!(!tokens[..tokens.len() - 2]
            .iter()
            .any(|t| matches!(t, Token::Newline(_) | Token::Indent(_))));
    }

    #[test]
    fn test_string_literals() {
        let tokens = lex(r#"a = "hello\nworld" + 'it''s'"#);
        match &tokens[2] {
            Token::StringLiteral(s, _) => assert_eq!(s, "hello\nworld"),
            other => panic!("Expected string literal, got {:?}", other),
        }
        assert!(matches!(tokens[4], Token::StringLiteral(ref s, _) if s == "it"));
    }

    #[test]
    fn test_numbers() {
        let tokens = lex("1_000 2.5 .5 1e3 7");
        assert!(matches!(tokens[0], Token::IntLiteral(1000, _)));
        assert!(matches!(tokens[1], Token::FloatLiteral(x, _) if x == 2.5));
        assert!(matches!(tokens[2], Token::FloatLiteral(x, _) if x == 0.5));
        assert!(matches!(tokens[3], Token::FloatLiteral(x, _) if x == 1000.0));
        assert!(matches!(tokens[4], Token::IntLiteral(7, _)));
    }

    #[test]
    fn test_fstring_pieces() {
        let tokens = lex(r#"f"Loop {i}: total = {total!r:>5} {{x}}""#);
        match &tokens[0] {
            Token::FStringLiteral(pieces, _) => {
                assert_eq!(pieces.len(), 5);
                assert_eq!(pieces[0], FStringPiece::Text("Loop ".to_string()));
                assert!(matches!(&pieces[1], FStringPiece::Expr { source, .. } if source == "i"));
                assert!(matches!(
                    &pieces[3],
                    FStringPiece::Expr { source, repr: true, spec, .. }
                        if source == "total" && spec == ">5"
                ));
                assert_eq!(pieces[4], FStringPiece::Text(" {x}".to_string()));
            }
            other => panic!("Expected f-string, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_string() {
        assert!(Lexer::new("x = 'abc").tokenize().is_err());
    }
}
