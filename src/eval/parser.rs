//! Query expression parser.
//!
//! Recursive descent over the token stream from the lexer, producing the
//! closed AST in `ast.rs`. Every failure is a [`QueryError::Syntax`] that
//! carries the byte offset of the offending token.

use super::ast::*;
use super::lexer::{Lexer, Token, TokenKind};
use crate::error::QueryError;

/// Query expression parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a new parser from input string
    pub fn new(input: &str) -> Self {
        let tokens = Lexer::tokenize(input);
        Self { tokens, pos: 0 }
    }

    /// Parse the input as a single expression covering all of it
    pub fn parse(input: &str) -> Result<Expr, QueryError> {
        let mut parser = Self::new(input);
        let expr = parser.parse_expression()?;
        match parser.current() {
            Some(token) if !matches!(token.kind, TokenKind::EOF) => Err(parser.syntax_here(
                format!("unexpected {}", describe(&token.kind)),
            )),
            _ => Ok(expr),
        }
    }

    /// Parse an expression (lambda has the lowest precedence)
    fn parse_expression(&mut self) -> Result<Expr, QueryError> {
        if self.check_keyword("lambda") {
            return self.parse_lambda();
        }
        self.parse_or()
    }

    /// Parse lambda expression: lambda x, y: body
    fn parse_lambda(&mut self) -> Result<Expr, QueryError> {
        let start = self.current_pos();
        self.advance(); // consume 'lambda'

        let mut params = Vec::new();
        loop {
            match self.current_ident() {
                Some(name) if !is_reserved(&name) => {
                    params.push(name);
                    self.advance();
                }
                _ => {
                    return Err(self.syntax_here("expected parameter name after 'lambda'".into()));
                }
            }
            if self.match_token(&TokenKind::Comma) {
                continue;
            }
            break;
        }

        self.expect_token(&TokenKind::Colon, "expected ':' after lambda parameters")?;
        let body = self.parse_expression()?;
        let end = self.previous_pos();

        Ok(Expr::Lambda(Box::new(LambdaExpr {
            params,
            body,
            span: start..end,
        })))
    }

    /// Parse 'or' chains
    fn parse_or(&mut self) -> Result<Expr, QueryError> {
        let start = self.current_pos();
        let mut expr = self.parse_and()?;

        while self.match_keyword("or") {
            let rhs = self.parse_and()?;
            let end = self.previous_pos();
            expr = Expr::Binary(Box::new(BinaryExpr {
                op: BinaryOp::Or,
                lhs: expr,
                rhs,
                span: start..end,
            }));
        }

        Ok(expr)
    }

    /// Parse 'and' chains
    fn parse_and(&mut self) -> Result<Expr, QueryError> {
        let start = self.current_pos();
        let mut expr = self.parse_not()?;

        while self.match_keyword("and") {
            let rhs = self.parse_not()?;
            let end = self.previous_pos();
            expr = Expr::Binary(Box::new(BinaryExpr {
                op: BinaryOp::And,
                lhs: expr,
                rhs,
                span: start..end,
            }));
        }

        Ok(expr)
    }

    /// Parse 'not' prefix
    fn parse_not(&mut self) -> Result<Expr, QueryError> {
        let start = self.current_pos();
        if self.match_keyword("not") {
            let operand = self.parse_not()?;
            let end = self.previous_pos();
            return Ok(Expr::Unary(Box::new(UnaryExpr {
                op: UnaryOp::Not,
                operand,
                span: start..end,
            })));
        }
        self.parse_comparison()
    }

    /// Parse comparison chains (left associative)
    fn parse_comparison(&mut self) -> Result<Expr, QueryError> {
        let start = self.current_pos();
        let mut expr = self.parse_arith()?;

        loop {
            let op = if self.match_token(&TokenKind::EqEq) {
                BinaryOp::Eq
            } else if self.match_token(&TokenKind::NotEq) {
                BinaryOp::Ne
            } else if self.match_token(&TokenKind::LtEq) {
                BinaryOp::Le
            } else if self.match_token(&TokenKind::GtEq) {
                BinaryOp::Ge
            } else if self.match_token(&TokenKind::Lt) {
                BinaryOp::Lt
            } else if self.match_token(&TokenKind::Gt) {
                BinaryOp::Gt
            } else if self.match_keyword("in") {
                BinaryOp::In
            } else {
                break;
            };
            let rhs = self.parse_arith()?;
            let end = self.previous_pos();
            expr = Expr::Binary(Box::new(BinaryExpr {
                op,
                lhs: expr,
                rhs,
                span: start..end,
            }));
        }

        Ok(expr)
    }

    /// Parse additive chains
    fn parse_arith(&mut self) -> Result<Expr, QueryError> {
        let start = self.current_pos();
        let mut expr = self.parse_term()?;

        loop {
            let op = if self.match_token(&TokenKind::Plus) {
                BinaryOp::Add
            } else if self.match_token(&TokenKind::Minus) {
                BinaryOp::Sub
            } else {
                break;
            };
            let rhs = self.parse_term()?;
            let end = self.previous_pos();
            expr = Expr::Binary(Box::new(BinaryExpr {
                op,
                lhs: expr,
                rhs,
                span: start..end,
            }));
        }

        Ok(expr)
    }

    /// Parse multiplicative chains
    fn parse_term(&mut self) -> Result<Expr, QueryError> {
        let start = self.current_pos();
        let mut expr = self.parse_unary()?;

        loop {
            let op = if self.match_token(&TokenKind::Star) {
                BinaryOp::Mul
            } else if self.match_token(&TokenKind::Slash) {
                BinaryOp::Div
            } else if self.match_token(&TokenKind::Percent) {
                BinaryOp::Mod
            } else {
                break;
            };
            let rhs = self.parse_unary()?;
            let end = self.previous_pos();
            expr = Expr::Binary(Box::new(BinaryExpr {
                op,
                lhs: expr,
                rhs,
                span: start..end,
            }));
        }

        Ok(expr)
    }

    /// Parse unary prefix: -x, +x
    fn parse_unary(&mut self) -> Result<Expr, QueryError> {
        let start = self.current_pos();

        if self.match_token(&TokenKind::Minus) {
            let operand = self.parse_unary()?;
            let end = self.previous_pos();
            return Ok(Expr::Unary(Box::new(UnaryExpr {
                op: UnaryOp::Neg,
                operand,
                span: start..end,
            })));
        }

        if self.match_token(&TokenKind::Plus) {
            let operand = self.parse_unary()?;
            let end = self.previous_pos();
            return Ok(Expr::Unary(Box::new(UnaryExpr {
                op: UnaryOp::Pos,
                operand,
                span: start..end,
            })));
        }

        self.parse_postfix()
    }

    /// Parse postfix chains: indexing, slicing, attribute access, calls
    fn parse_postfix(&mut self) -> Result<Expr, QueryError> {
        let start = self.current_pos();
        let mut expr = self.parse_primary()?;

        loop {
            if self.match_token(&TokenKind::LBracket) {
                expr = self.parse_subscript(expr, start)?;
            } else if self.match_token(&TokenKind::Dot) {
                let name = self
                    .current_ident()
                    .ok_or_else(|| self.syntax_here("expected name after '.'".into()))?;
                self.advance();
                let end = self.previous_pos();
                expr = Expr::Attribute(Box::new(AttributeExpr {
                    object: expr,
                    name,
                    span: start..end,
                }));
            } else if self.match_token(&TokenKind::LParen) {
                let args = self.parse_arguments()?;
                self.expect_token(&TokenKind::RParen, "expected ')' after arguments")?;
                let end = self.previous_pos();
                expr = Expr::Call(Box::new(CallExpr {
                    callee: expr,
                    args,
                    span: start..end,
                }));
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse the inside of `obj[...]`: a plain index or a slice
    fn parse_subscript(&mut self, object: Expr, start: usize) -> Result<Expr, QueryError> {
        let mut first = None;
        if !self.check(&TokenKind::Colon) {
            first = Some(self.parse_expression()?);
        }

        if !self.match_token(&TokenKind::Colon) {
            // plain index
            let index = first
                .ok_or_else(|| self.syntax_here("expected index expression inside '[]'".into()))?;
            self.expect_token(&TokenKind::RBracket, "expected ']' after index")?;
            let end = self.previous_pos();
            return Ok(Expr::Index(Box::new(IndexExpr {
                object,
                index,
                span: start..end,
            })));
        }

        // slice: first ':' consumed
        let mut stop = None;
        if !self.check(&TokenKind::Colon) && !self.check(&TokenKind::RBracket) {
            stop = Some(self.parse_expression()?);
        }
        let mut step = None;
        if self.match_token(&TokenKind::Colon)
            && !self.check(&TokenKind::RBracket)
        {
            step = Some(self.parse_expression()?);
        }
        self.expect_token(&TokenKind::RBracket, "expected ']' after slice")?;
        let end = self.previous_pos();
        Ok(Expr::Slice(Box::new(SliceExpr {
            object,
            start: first,
            stop,
            step,
            span: start..end,
        })))
    }

    /// Parse primary expression (literals, identifiers, grouping, collections)
    fn parse_primary(&mut self) -> Result<Expr, QueryError> {
        let Some(token) = self.current().cloned() else {
            return Err(self.syntax_at("unexpected end of input".into(), self.previous_pos()));
        };

        match &token.kind {
            TokenKind::Str(s) => {
                let value = s.clone();
                self.advance();
                Ok(Expr::Str(value))
            }
            TokenKind::UnterminatedStr => {
                Err(self.syntax_at("unterminated string literal".into(), token.span.start))
            }
            TokenKind::Number(n) => {
                let expr = parse_number(n)
                    .ok_or_else(|| self.syntax_at(format!("invalid number: {n}"), token.span.start))?;
                self.advance();
                Ok(expr)
            }
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                match name.as_str() {
                    "true" | "True" => Ok(Expr::Boolean(true)),
                    "false" | "False" => Ok(Expr::Boolean(false)),
                    "null" | "None" => Ok(Expr::Null),
                    _ => Ok(Expr::Ident(IdentExpr {
                        name,
                        span: token.span.clone(),
                    })),
                }
            }
            TokenKind::LParen => self.parse_paren(token.span.start),
            TokenKind::LBracket => self.parse_list(token.span.start),
            TokenKind::LBrace => self.parse_mapping(token.span.start),
            TokenKind::EOF => {
                Err(self.syntax_at("unexpected end of input".into(), token.span.start))
            }
            other => Err(self.syntax_at(
                format!("unexpected {}", describe(other)),
                token.span.start,
            )),
        }
    }

    /// Parse `(...)`: grouping, or a tuple when a comma appears
    fn parse_paren(&mut self, _start: usize) -> Result<Expr, QueryError> {
        self.advance(); // consume '('

        if self.match_token(&TokenKind::RParen) {
            return Ok(Expr::Tuple(Vec::new()));
        }

        let first = self.parse_expression()?;

        if self.match_token(&TokenKind::Comma) {
            let mut elements = vec![first];
            loop {
                if self.check(&TokenKind::RParen) {
                    break;
                }
                elements.push(self.parse_expression()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect_token(&TokenKind::RParen, "expected ')' after tuple elements")?;
            return Ok(Expr::Tuple(elements));
        }

        self.expect_token(&TokenKind::RParen, "expected ')' after expression")?;
        Ok(first)
    }

    /// Parse list literal: [elem1, elem2, ...]
    fn parse_list(&mut self, _start: usize) -> Result<Expr, QueryError> {
        self.advance(); // consume '['

        let mut elements = Vec::new();
        if self.match_token(&TokenKind::RBracket) {
            return Ok(Expr::List(elements));
        }

        loop {
            elements.push(self.parse_expression()?);
            if self.match_token(&TokenKind::Comma) {
                if self.check(&TokenKind::RBracket) {
                    break;
                }
                continue;
            }
            break;
        }

        self.expect_token(&TokenKind::RBracket, "expected ']' after list elements")?;
        Ok(Expr::List(elements))
    }

    /// Parse mapping literal: {key: value, ...}
    fn parse_mapping(&mut self, _start: usize) -> Result<Expr, QueryError> {
        self.advance(); // consume '{'

        let mut entries = Vec::new();
        if self.match_token(&TokenKind::RBrace) {
            return Ok(Expr::Mapping(entries));
        }

        loop {
            let key = self.parse_expression()?;
            self.expect_token(&TokenKind::Colon, "expected ':' after mapping key")?;
            let value = self.parse_expression()?;
            entries.push((key, value));

            if self.match_token(&TokenKind::Comma) {
                if self.check(&TokenKind::RBrace) {
                    break;
                }
                continue;
            }
            break;
        }

        self.expect_token(&TokenKind::RBrace, "expected '}' after mapping entries")?;
        Ok(Expr::Mapping(entries))
    }

    /// Parse call arguments: arg1, arg2, ...
    fn parse_arguments(&mut self) -> Result<Vec<Expr>, QueryError> {
        let mut args = Vec::new();

        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);
            if self.match_token(&TokenKind::Comma) {
                if self.check(&TokenKind::RParen) {
                    break;
                }
                continue;
            }
            break;
        }

        Ok(args)
    }

    // Token manipulation methods

    /// Get current token
    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Current token's identifier name, if it is one
    fn current_ident(&self) -> Option<String> {
        match self.current() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => Some(name.clone()),
            _ => None,
        }
    }

    /// Check if current token matches the given kind
    fn check(&self, kind: &TokenKind) -> bool {
        if let Some(token) = self.current() {
            std::mem::discriminant(&token.kind) == std::mem::discriminant(kind)
        } else {
            false
        }
    }

    /// Check whether the current token is the given keyword identifier
    fn check_keyword(&self, keyword: &str) -> bool {
        matches!(self.current(), Some(Token { kind: TokenKind::Ident(name), .. }) if name == keyword)
    }

    /// Consume the given keyword identifier if present
    fn match_keyword(&mut self, keyword: &str) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Match and consume token if it matches the given kind
    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advance to next token
    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// Expect a specific token kind
    fn expect_token(&mut self, kind: &TokenKind, message: &str) -> Result<(), QueryError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.syntax_here(message.to_string()))
        }
    }

    /// Build a syntax error at the current token
    fn syntax_here(&self, message: String) -> QueryError {
        self.syntax_at(message, self.current_pos())
    }

    fn syntax_at(&self, message: String, position: usize) -> QueryError {
        QueryError::Syntax { message, position }
    }

    /// Get current position
    fn current_pos(&self) -> usize {
        if let Some(token) = self.current() {
            token.span.start
        } else if let Some(last) = self.tokens.last() {
            last.span.end
        } else {
            0
        }
    }

    /// Get previous position
    fn previous_pos(&self) -> usize {
        if self.pos > 0 {
            if let Some(token) = self.tokens.get(self.pos - 1) {
                return token.span.end;
            }
        }
        0
    }
}

/// Convert number source text into an integer or float literal.
fn parse_number(text: &str) -> Option<Expr> {
    if text.contains(['.', 'e', 'E']) {
        text.parse::<f64>().ok().map(Expr::Float)
    } else {
        match text.parse::<i64>() {
            Ok(i) => Some(Expr::Integer(i)),
            // out of i64 range: fall back to float, like a literal 1e30
            Err(_) => text.parse::<f64>().ok().map(Expr::Float),
        }
    }
}

/// Human description of a token kind for error messages.
fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(name) => format!("identifier '{name}'"),
        TokenKind::Number(n) => format!("number '{n}'"),
        TokenKind::Str(_) => "string literal".to_string(),
        TokenKind::UnterminatedStr => "unterminated string literal".to_string(),
        TokenKind::Unknown(ch) => format!("character '{ch}'"),
        TokenKind::EOF => "end of input".to_string(),
        other => format!(
            "'{}'",
            match other {
                TokenKind::LParen => "(",
                TokenKind::RParen => ")",
                TokenKind::LBracket => "[",
                TokenKind::RBracket => "]",
                TokenKind::LBrace => "{",
                TokenKind::RBrace => "}",
                TokenKind::Comma => ",",
                TokenKind::Colon => ":",
                TokenKind::Dot => ".",
                TokenKind::Plus => "+",
                TokenKind::Minus => "-",
                TokenKind::Star => "*",
                TokenKind::Slash => "/",
                TokenKind::Percent => "%",
                TokenKind::EqEq => "==",
                TokenKind::NotEq => "!=",
                TokenKind::Lt => "<",
                TokenKind::LtEq => "<=",
                TokenKind::Gt => ">",
                TokenKind::GtEq => ">=",
                _ => "?",
            }
        ),
    }
}

/// Names that cannot be used as lambda parameters.
fn is_reserved(name: &str) -> bool {
    matches!(
        name,
        "and" | "or" | "not" | "in" | "lambda" | "true" | "false" | "null" | "True" | "False"
            | "None"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literals() {
        assert!(matches!(Parser::parse("42").unwrap(), Expr::Integer(42)));
        assert!(matches!(Parser::parse("3.25").unwrap(), Expr::Float(_)));
        assert!(matches!(
            Parser::parse("'hi'").unwrap(),
            Expr::Str(s) if s == "hi"
        ));
        assert!(matches!(Parser::parse("true").unwrap(), Expr::Boolean(true)));
        assert!(matches!(Parser::parse("False").unwrap(), Expr::Boolean(false)));
        assert!(matches!(Parser::parse("null").unwrap(), Expr::Null));
        assert!(matches!(Parser::parse("None").unwrap(), Expr::Null));
    }

    #[test]
    fn test_parse_root_indexing() {
        let expr = Parser::parse("_['items'][0]").unwrap();
        let Expr::Index(outer) = expr else {
            panic!("expected index expression");
        };
        assert!(matches!(outer.index, Expr::Integer(0)));
        let Expr::Index(inner) = outer.object else {
            panic!("expected nested index expression");
        };
        assert!(matches!(inner.object, Expr::Ident(ref id) if id.name == "_"));
        assert!(matches!(inner.index, Expr::Str(ref s) if s == "items"));
    }

    #[test]
    fn test_parse_slice_forms() {
        assert!(matches!(Parser::parse("_[1:3]").unwrap(), Expr::Slice(_)));
        assert!(matches!(Parser::parse("_[:3]").unwrap(), Expr::Slice(_)));
        assert!(matches!(Parser::parse("_[1:]").unwrap(), Expr::Slice(_)));
        assert!(matches!(Parser::parse("_[::2]").unwrap(), Expr::Slice(_)));
        assert!(matches!(Parser::parse("_[:]").unwrap(), Expr::Slice(_)));
    }

    #[test]
    fn test_parse_call() {
        let expr = Parser::parse("len(_)").unwrap();
        let Expr::Call(call) = expr else {
            panic!("expected call expression");
        };
        assert!(matches!(call.callee, Expr::Ident(ref id) if id.name == "len"));
        assert_eq!(call.args.len(), 1);
    }

    #[test]
    fn test_parse_lambda() {
        let expr = Parser::parse("lambda x: x + 1").unwrap();
        let Expr::Lambda(lambda) = expr else {
            panic!("expected lambda expression");
        };
        assert_eq!(lambda.params, vec!["x".to_string()]);
        assert!(matches!(lambda.body, Expr::Binary(_)));

        let expr = Parser::parse("lambda a, b: a").unwrap();
        let Expr::Lambda(lambda) = expr else {
            panic!("expected lambda expression");
        };
        assert_eq!(lambda.params.len(), 2);
    }

    #[test]
    fn test_parse_collections() {
        assert!(matches!(
            Parser::parse("[1, 2, 3]").unwrap(),
            Expr::List(items) if items.len() == 3
        ));
        assert!(matches!(
            Parser::parse("{'a': 1, 'b': 2}").unwrap(),
            Expr::Mapping(entries) if entries.len() == 2
        ));
        assert!(matches!(
            Parser::parse("(1, 2)").unwrap(),
            Expr::Tuple(items) if items.len() == 2
        ));
        assert!(matches!(Parser::parse("()").unwrap(), Expr::Tuple(items) if items.is_empty()));
        // grouping, not a tuple
        assert!(matches!(Parser::parse("(1)").unwrap(), Expr::Integer(1)));
        // trailing commas
        assert!(matches!(
            Parser::parse("[1, 2,]").unwrap(),
            Expr::List(items) if items.len() == 2
        ));
        assert!(matches!(
            Parser::parse("(1,)").unwrap(),
            Expr::Tuple(items) if items.len() == 1
        ));
    }

    #[test]
    fn test_parse_operators_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let Expr::Binary(add) = Parser::parse("1 + 2 * 3").unwrap() else {
            panic!("expected binary expression");
        };
        assert_eq!(add.op, BinaryOp::Add);
        assert!(matches!(add.rhs, Expr::Binary(ref m) if m.op == BinaryOp::Mul));

        // comparison binds looser than arithmetic
        let Expr::Binary(cmp) = Parser::parse("1 + 1 == 2").unwrap() else {
            panic!("expected binary expression");
        };
        assert_eq!(cmp.op, BinaryOp::Eq);

        // boolean operators loosest
        let Expr::Binary(orx) = Parser::parse("1 == 1 or 2 == 3 and true").unwrap() else {
            panic!("expected binary expression");
        };
        assert_eq!(orx.op, BinaryOp::Or);
    }

    #[test]
    fn test_parse_in_and_not() {
        let Expr::Binary(b) = Parser::parse("'a' in _").unwrap() else {
            panic!("expected binary expression");
        };
        assert_eq!(b.op, BinaryOp::In);

        let Expr::Unary(u) = Parser::parse("not true").unwrap() else {
            panic!("expected unary expression");
        };
        assert_eq!(u.op, UnaryOp::Not);
    }

    #[test]
    fn test_parse_attribute_access() {
        let Expr::Attribute(attr) = Parser::parse("_.items").unwrap() else {
            panic!("expected attribute expression");
        };
        assert_eq!(attr.name, "items");
    }

    #[test]
    fn test_syntax_error_positions() {
        let err = Parser::parse("_['items'").unwrap_err();
        let QueryError::Syntax { position, .. } = err else {
            panic!("expected syntax error");
        };
        assert_eq!(position, 9); // the missing ']' is noticed at end of input

        let err = Parser::parse("1 +").unwrap_err();
        assert!(matches!(err, QueryError::Syntax { .. }));

        let err = Parser::parse("[1, 2").unwrap_err();
        assert!(matches!(err, QueryError::Syntax { .. }));

        let err = Parser::parse("1 @ 2").unwrap_err();
        let QueryError::Syntax { message, position } = err else {
            panic!("expected syntax error");
        };
        assert!(message.contains('@'));
        assert_eq!(position, 2);
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        assert!(matches!(
            Parser::parse("1 2").unwrap_err(),
            QueryError::Syntax { .. }
        ));
    }

    #[test]
    fn test_reserved_lambda_params_rejected() {
        assert!(matches!(
            Parser::parse("lambda in: 1").unwrap_err(),
            QueryError::Syntax { .. }
        ));
    }

    #[test]
    fn test_huge_integer_falls_back_to_float() {
        assert!(matches!(
            Parser::parse("99999999999999999999999999").unwrap(),
            Expr::Float(_)
        ));
    }
}
