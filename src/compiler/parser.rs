//! Recursive-descent parser with operator-precedence climbing for binary
//! expressions. Builds the AST defined in `compiler::ast`.

use std::rc::Rc;

use crate::{
    common::{Source, Span, Value},
    compiler::{
        ast::*,
        error::Syntax,
        token::{Token, TokenKind},
    },
};

pub struct Parser {
    source: Rc<Source>,
    tokens: Vec<Token>,
    current: usize,
    /// When set, `while`/`for` are rejected at parse time (the `-n`/`--no-loop`
    /// CLI flag).
    no_loop: bool,
}

impl Parser {
    pub fn parse(source: Rc<Source>, tokens: Vec<Token>) -> Result<Vec<Stmt>, Syntax> {
        Parser::parse_with_options(source, tokens, false)
    }

    pub fn parse_with_options(source: Rc<Source>, tokens: Vec<Token>, no_loop: bool) -> Result<Vec<Stmt>, Syntax> {
        let mut parser = Parser { source, tokens, current: 0, no_loop };
        let mut statements = vec![];
        while !parser.check(TokenKind::End) {
            statements.push(parser.declaration()?);
        }
        Ok(statements)
    }

    // --- token stream primitives ---

    fn peek(&self) -> &Token { &self.tokens[self.current] }
    fn previous(&self) -> &Token { &self.tokens[self.current - 1] }
    fn check(&self, kind: TokenKind) -> bool { self.peek().kind == kind }
    fn at_end(&self) -> bool { self.check(TokenKind::End) }

    fn advance(&mut self) -> Token {
        if !self.at_end() { self.current += 1; }
        self.previous().clone()
    }

    fn matches(&mut self, kinds: &[TokenKind]) -> bool {
        for &kind in kinds {
            if self.check(kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn error(&self, token: &Token, message: impl Into<String>) -> Syntax {
        let message = message.into();
        Syntax::error(
            Span::new(&self.source, token.line),
            format!("{message} (at '{}')", token.lexeme),
        )
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token, Syntax> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let token = self.peek().clone();
            Err(self.error(&token, message))
        }
    }

    // --- declarations & statements ---

    fn declaration(&mut self) -> Result<Stmt, Syntax> {
        if self.matches(&[TokenKind::Fun]) {
            return self.fun_declaration();
        }
        if self.matches(&[TokenKind::Var]) {
            return self.var_declaration();
        }
        self.statement()
    }

    fn fun_declaration(&mut self) -> Result<Stmt, Syntax> {
        let line = self.previous().line;
        let name_token = self.expect(TokenKind::Identifier, "expected function name")?;
        let function = self.function_body(Some(name_token.lexeme.clone()), line)?;
        Ok(Stmt::Function { name: name_token.lexeme, function, line })
    }

    fn function_body(&mut self, name: Option<String>, line: usize) -> Result<FunctionExpr, Syntax> {
        self.expect(TokenKind::LeftParen, "expected '(' after function name")?;
        let mut params = vec![];
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= 255 {
                    let token = self.peek().clone();
                    return Err(self.error(&token, "cannot have more than 255 parameters"));
                }
                let param = self.expect(TokenKind::Identifier, "expected parameter name")?;
                params.push(param.lexeme);
                if !self.matches(&[TokenKind::Comma]) { break; }
            }
        }
        self.expect(TokenKind::RightParen, "expected ')' after parameters")?;
        self.expect(TokenKind::LeftBrace, "expected '{' before function body")?;
        let body = self.block()?;
        Ok(FunctionExpr { name, params, body, line })
    }

    fn var_declaration(&mut self) -> Result<Stmt, Syntax> {
        let line = self.previous().line;
        let name = self.expect(TokenKind::Identifier, "expected variable name")?.lexeme;
        let initializer = if self.matches(&[TokenKind::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, "expected ';' after variable declaration")?;
        Ok(Stmt::Var { name, initializer, line })
    }

    fn statement(&mut self) -> Result<Stmt, Syntax> {
        if self.matches(&[TokenKind::Print]) { return self.print_statement(); }
        if self.matches(&[TokenKind::LeftBrace]) {
            let line = self.previous().line;
            return Ok(Stmt::Block { statements: self.block()?, line });
        }
        if self.matches(&[TokenKind::If]) { return self.if_statement(); }
        if self.matches(&[TokenKind::While]) { return self.while_statement(); }
        if self.matches(&[TokenKind::For]) { return self.for_statement(); }
        if self.matches(&[TokenKind::Return]) { return self.return_statement(); }
        if self.matches(&[TokenKind::Break]) {
            let line = self.previous().line;
            self.expect(TokenKind::Semicolon, "expected ';' after 'break'")?;
            return Ok(Stmt::Break { line });
        }
        if self.matches(&[TokenKind::Continue]) {
            let line = self.previous().line;
            self.expect(TokenKind::Semicolon, "expected ';' after 'continue'")?;
            return Ok(Stmt::Continue { line });
        }
        self.expression_statement()
    }

    fn block(&mut self) -> Result<Vec<Stmt>, Syntax> {
        let mut statements = vec![];
        while !self.check(TokenKind::RightBrace) && !self.at_end() {
            statements.push(self.declaration()?);
        }
        self.expect(TokenKind::RightBrace, "expected '}' after block")?;
        Ok(statements)
    }

    fn print_statement(&mut self) -> Result<Stmt, Syntax> {
        let line = self.previous().line;
        let expr = self.expression()?;
        self.expect(TokenKind::Semicolon, "expected ';' after value")?;
        Ok(Stmt::Print { expr, line })
    }

    fn expression_statement(&mut self) -> Result<Stmt, Syntax> {
        let line = self.peek().line;
        let expr = self.expression()?;
        self.expect(TokenKind::Semicolon, "expected ';' after expression")?;
        Ok(Stmt::Expression { expr, line })
    }

    fn if_statement(&mut self) -> Result<Stmt, Syntax> {
        let line = self.previous().line;
        self.expect(TokenKind::LeftParen, "expected '(' after 'if'")?;
        let condition = self.expression()?;
        self.expect(TokenKind::RightParen, "expected ')' after condition")?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.matches(&[TokenKind::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If { condition, then_branch, else_branch, line })
    }

    fn reject_if_no_loop(&self, line: usize) -> Result<(), Syntax> {
        if self.no_loop {
            Err(Syntax::error(
                Span::new(&self.source, line),
                "loop constructs are disabled (--no-loop)",
            ))
        } else {
            Ok(())
        }
    }

    fn while_statement(&mut self) -> Result<Stmt, Syntax> {
        let line = self.previous().line;
        self.reject_if_no_loop(line)?;
        self.expect(TokenKind::LeftParen, "expected '(' after 'while'")?;
        let condition = self.expression()?;
        self.expect(TokenKind::RightParen, "expected ')' after condition")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While(WhileStmt { condition, body, increment: None, line }))
    }

    /// Desugars `for (init; cond; incr) body` into
    /// `{ init; while (cond) { body; incr } }`, with the increment tracked
    /// on the `While` node so `continue` still runs it.
    fn for_statement(&mut self) -> Result<Stmt, Syntax> {
        let line = self.previous().line;
        self.reject_if_no_loop(line)?;
        self.expect(TokenKind::LeftParen, "expected '(' after 'for'")?;

        let initializer = if self.matches(&[TokenKind::Semicolon]) {
            None
        } else if self.matches(&[TokenKind::Var]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TokenKind::Semicolon) {
            self.expression()?
        } else {
            Expr::Literal { value: Value::Bool(true), line }
        };
        self.expect(TokenKind::Semicolon, "expected ';' after loop condition")?;

        let increment = if !self.check(TokenKind::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(TokenKind::RightParen, "expected ')' after for clauses")?;

        let body = Box::new(self.statement()?);
        let while_stmt = Stmt::While(WhileStmt { condition, body, increment, line });

        let statements = match initializer {
            Some(init) => vec![init, while_stmt],
            None => vec![while_stmt],
        };
        Ok(Stmt::Block { statements, line })
    }

    fn return_statement(&mut self) -> Result<Stmt, Syntax> {
        let line = self.previous().line;
        let value = if !self.check(TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, "expected ';' after return value")?;
        Ok(Stmt::Return { value, line })
    }

    // --- expressions ---

    fn expression(&mut self) -> Result<Expr, Syntax> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, Syntax> {
        let target = self.ternary()?;

        if self.matches(&[TokenKind::Equal]) {
            let line = self.previous().line;
            let value = self.assignment()?;
            return match target {
                Expr::Variable { name, .. } => Ok(Expr::Assignment { name, value: Box::new(value), line }),
                Expr::Subscript { object, index, .. } => {
                    Ok(Expr::SubscriptAssignment { object, index, value: Box::new(value), line })
                },
                Expr::PropertyAccess { object, name, .. } => Ok(Expr::SubscriptAssignment {
                    object,
                    index: Box::new(Expr::Literal { value: Value::string(name), line }),
                    value: Box::new(value),
                    line,
                }),
                _ => Err(Syntax::error(
                    Span::new(&self.source, line),
                    "invalid assignment target",
                )),
            };
        }

        Ok(target)
    }

    fn ternary(&mut self) -> Result<Expr, Syntax> {
        let condition = self.logic_or()?;
        if self.matches(&[TokenKind::Question]) {
            let line = self.previous().line;
            let then_branch = self.expression()?;
            self.expect(TokenKind::Colon, "expected ':' in ternary expression")?;
            let else_branch = self.expression()?;
            return Ok(Expr::Ternary {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
                line,
            });
        }
        Ok(condition)
    }

    fn logic_or(&mut self) -> Result<Expr, Syntax> {
        let mut left = self.logic_and()?;
        while self.matches(&[TokenKind::Or]) {
            let line = self.previous().line;
            let right = self.logic_and()?;
            left = Expr::Logical { op: LogicalOp::Or, left: Box::new(left), right: Box::new(right), line };
        }
        Ok(left)
    }

    fn logic_and(&mut self) -> Result<Expr, Syntax> {
        let mut left = self.equality()?;
        while self.matches(&[TokenKind::And]) {
            let line = self.previous().line;
            let right = self.equality()?;
            left = Expr::Logical { op: LogicalOp::And, left: Box::new(left), right: Box::new(right), line };
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, Syntax> {
        self.binary_level(&[TokenKind::BangEqual, TokenKind::EqualEqual], Self::comparison)
    }

    fn comparison(&mut self) -> Result<Expr, Syntax> {
        self.binary_level(
            &[TokenKind::Greater, TokenKind::GreaterEqual, TokenKind::Less, TokenKind::LessEqual],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr, Syntax> {
        self.binary_level(&[TokenKind::Minus, TokenKind::Plus], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr, Syntax> {
        self.binary_level(&[TokenKind::Slash, TokenKind::Star, TokenKind::Percent], Self::unary)
    }

    fn binary_level(
        &mut self,
        operators: &[TokenKind],
        mut next: impl FnMut(&mut Self) -> Result<Expr, Syntax>,
    ) -> Result<Expr, Syntax> {
        let mut left = next(self)?;
        while self.matches(operators) {
            let op_token = self.previous().kind;
            let line = self.previous().line;
            let right = next(self)?;
            left = Expr::Binary { op: BinaryOp::from_token(op_token), left: Box::new(left), right: Box::new(right), line };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, Syntax> {
        if self.matches(&[TokenKind::Bang, TokenKind::Minus]) {
            let op_token = self.previous().kind;
            let line = self.previous().line;
            let operand = self.unary()?;
            let op = if op_token == TokenKind::Bang { UnaryOp::Not } else { UnaryOp::Negate };
            return Ok(Expr::Unary { op, operand: Box::new(operand), line });
        }
        self.call()
    }

    fn call(&mut self) -> Result<Expr, Syntax> {
        let mut expr = self.primary()?;
        loop {
            if self.matches(&[TokenKind::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.matches(&[TokenKind::LeftBracket]) {
                let line = self.previous().line;
                let index = self.expression()?;
                self.expect(TokenKind::RightBracket, "expected ']' after index")?;
                expr = Expr::Subscript { object: Box::new(expr), index: Box::new(index), line };
            } else if self.matches(&[TokenKind::Dot]) {
                let line = self.previous().line;
                let name = self.expect(TokenKind::Identifier, "expected property name after '.'")?.lexeme;
                expr = Expr::PropertyAccess { object: Box::new(expr), name, line };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, Syntax> {
        let line = self.previous().line;
        let mut args = vec![];
        if !self.check(TokenKind::RightParen) {
            loop {
                if args.len() >= 255 {
                    let token = self.peek().clone();
                    return Err(self.error(&token, "cannot have more than 255 arguments"));
                }
                args.push(self.expression()?);
                if !self.matches(&[TokenKind::Comma]) { break; }
            }
        }
        self.expect(TokenKind::RightParen, "expected ')' after arguments")?;
        Ok(Expr::Call { callee: Box::new(callee), args, line })
    }

    fn primary(&mut self) -> Result<Expr, Syntax> {
        let line = self.peek().line;

        if self.matches(&[TokenKind::False]) {
            return Ok(Expr::Literal { value: Value::Bool(false), line });
        }
        if self.matches(&[TokenKind::True]) {
            return Ok(Expr::Literal { value: Value::Bool(true), line });
        }
        if self.matches(&[TokenKind::Nil]) {
            return Ok(Expr::Literal { value: Value::Nil, line });
        }
        if self.matches(&[TokenKind::Number, TokenKind::String]) {
            let literal = self.previous().literal.clone();
            return Ok(Expr::Literal { value: literal, line });
        }
        if self.matches(&[TokenKind::Identifier]) {
            return Ok(Expr::Variable { name: self.previous().lexeme.clone(), line });
        }
        if self.matches(&[TokenKind::LeftParen]) {
            let inner = self.expression()?;
            self.expect(TokenKind::RightParen, "expected ')' after expression")?;
            return Ok(Expr::Grouping { inner: Box::new(inner), line });
        }
        if self.matches(&[TokenKind::Fun]) {
            let function = self.function_body(None, line)?;
            return Ok(Expr::FunctionExpr(function));
        }
        if self.matches(&[TokenKind::LeftBracket]) {
            return self.array_literal(line);
        }
        if self.matches(&[TokenKind::LeftBrace]) {
            return self.map_literal(line);
        }

        let token = self.peek().clone();
        Err(self.error(&token, "expected expression"))
    }

    fn array_literal(&mut self, line: usize) -> Result<Expr, Syntax> {
        let mut elements = vec![];
        if !self.check(TokenKind::RightBracket) {
            loop {
                elements.push(self.expression()?);
                if !self.matches(&[TokenKind::Comma]) { break; }
            }
        }
        self.expect(TokenKind::RightBracket, "expected ']' after array elements")?;
        Ok(Expr::ArrayLiteral { elements, line })
    }

    fn map_literal(&mut self, line: usize) -> Result<Expr, Syntax> {
        let mut entries = vec![];
        if !self.check(TokenKind::RightBrace) {
            loop {
                let key = self.expression()?;
                self.expect(TokenKind::Colon, "expected ':' after map key")?;
                let value = self.expression()?;
                entries.push((key, value));
                if !self.matches(&[TokenKind::Comma]) { break; }
            }
        }
        self.expect(TokenKind::RightBrace, "expected '}' after map entries")?;
        Ok(Expr::MapLiteral { entries, line })
    }
}
