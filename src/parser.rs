use std::rc::Rc;

use crate::ast::{Expr, ExprId, Literal, Stmt};
use crate::error::{ErrorReporter, LoxError, Result};
use crate::token::{Token, TokenType};

/// Recursive-descent parser with one token of lookahead.
///
/// `parse` never fails as a whole: a syntax error is recorded in the shared
/// reporter, the parser synchronizes to the next statement boundary, and the
/// offending declaration is dropped. The caller decides, by consulting the
/// reporter, whether the resulting statement list may be executed.
pub struct Parser<'r> {
    tokens: Vec<Token>,
    current: usize,
    reporter: &'r mut ErrorReporter,
}

impl<'r> Parser<'r> {
    /// `tokens` must be EOF-terminated, as produced by the scanner.
    pub fn new(tokens: Vec<Token>, reporter: &'r mut ErrorReporter) -> Self {
        Parser {
            tokens,
            current: 0,
            reporter,
        }
    }

    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        statements
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let result: Result<Stmt> = if self.match_tokens(&[TokenType::FUN]) {
            self.function("function")
        } else if self.match_tokens(&[TokenType::VAR]) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),

            Err(e) => {
                self.reporter.report(e);
                self.synchronize();

                None
            }
        }
    }

    fn function(&mut self, kind: &str) -> Result<Stmt> {
        let name = self.consume(TokenType::IDENTIFIER, format!("Expect {} name.", kind))?;

        self.consume(
            TokenType::LEFT_PAREN,
            format!("Expect '(' after {} name.", kind),
        )?;

        let mut params: Vec<Token> = Vec::new();

        if !self.check(&TokenType::RIGHT_PAREN) {
            loop {
                if params.len() == 255 {
                    let (line, col) = (self.peek().line, self.peek().col);
                    self.reporter.report(LoxError::parse(
                        line,
                        col,
                        "Can't have more than 255 parameters.",
                    ));
                }

                params.push(self.consume(TokenType::IDENTIFIER, "Expect parameter name.")?);

                if !self.match_tokens(&[TokenType::COMMA]) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;
        self.consume(
            TokenType::LEFT_BRACE,
            format!("Expect '{{' before {} body.", kind),
        )?;

        let body: Vec<Stmt> = self.block()?;

        Ok(Stmt::Function {
            name,
            params,
            body: Rc::new(body),
        })
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name = self.consume(TokenType::IDENTIFIER, "Expect variable name.")?;

        let initializer: Option<Expr> = if self.match_tokens(&[TokenType::EQUAL]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after variable declaration.")?;

        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&mut self) -> Result<Stmt> {
        if self.match_tokens(&[TokenType::FOR]) {
            return self.for_statement();
        }

        if self.match_tokens(&[TokenType::IF]) {
            return self.if_statement();
        }

        if self.match_tokens(&[TokenType::PRINT]) {
            return self.print_statement();
        }

        if self.match_tokens(&[TokenType::RETURN]) {
            return self.return_statement();
        }

        if self.match_tokens(&[TokenType::WHILE]) {
            return self.while_statement();
        }

        if self.match_tokens(&[TokenType::LEFT_BRACE]) {
            return Ok(Stmt::Block(self.block()?));
        }

        self.expression_statement()
    }

    /// `for` has no AST node of its own; it desugars into a `while` loop.
    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer: Option<Stmt> = if self.match_tokens(&[TokenType::SEMICOLON]) {
            None
        } else if self.match_tokens(&[TokenType::VAR]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition: Option<Expr> = if !self.check(&TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment: Option<Expr> = if !self.check(&TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let mut body: Stmt = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let condition: Expr = condition.unwrap_or(Expr::Literal(Literal::True));
        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);

        let else_branch: Option<Box<Stmt>> = if self.match_tokens(&[TokenType::ELSE]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;

        let body = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let value: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();

        let value: Option<Expr> = if !self.check(&TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(&TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after block.")?;

        Ok(statements)
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after expression.")?;

        Ok(Stmt::Expression(expr))
    }

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.or()?;

        if self.match_tokens(&[TokenType::EQUAL]) {
            let equals: Token = self.previous().clone();
            let value: Expr = self.assignment()?;

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    id: ExprId::fresh(),
                    name,
                    value: Box::new(value),
                }),

                // Not assignable; keep the right-hand side so parsing can
                // carry on past the bad target.
                _ => {
                    self.reporter.report(LoxError::parse(
                        equals.line,
                        equals.col,
                        "Invalid assignment target.",
                    ));

                    Ok(value)
                }
            };
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.and()?;

        while self.match_tokens(&[TokenType::OR]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.match_tokens(&[TokenType::AND]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.comparison()?;

        while self.match_tokens(&[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.comparison()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.term()?;

        while self.match_tokens(&[
            TokenType::GREATER,
            TokenType::GREATER_EQUAL,
            TokenType::LESS,
            TokenType::LESS_EQUAL,
        ]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.term()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.factor()?;

        while self.match_tokens(&[TokenType::MINUS, TokenType::PLUS]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.factor()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.unary()?;

        while self.match_tokens(&[TokenType::SLASH, TokenType::STAR]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.match_tokens(&[TokenType::BANG, TokenType::MINUS]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        while self.match_tokens(&[TokenType::LEFT_PAREN]) {
            expr = self.finish_call(expr)?;
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(&TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() == 255 {
                    let (line, col) = (self.peek().line, self.peek().col);
                    self.reporter.report(LoxError::parse(
                        line,
                        col,
                        "Can't have more than 255 arguments.",
                    ));
                }

                arguments.push(self.expression()?);

                if !self.match_tokens(&[TokenType::COMMA]) {
                    break;
                }
            }
        }

        let paren: Token = self.consume(TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.match_tokens(&[TokenType::FALSE]) {
            return Ok(Expr::Literal(Literal::False));
        }

        if self.match_tokens(&[TokenType::TRUE]) {
            return Ok(Expr::Literal(Literal::True));
        }

        if self.match_tokens(&[TokenType::NIL]) {
            return Ok(Expr::Literal(Literal::Nil));
        }

        match &self.peek().token_type {
            TokenType::NUMBER(n) => {
                let n: f64 = *n;
                self.advance();

                return Ok(Expr::Literal(Literal::Number(n)));
            }

            TokenType::STRING(s) => {
                let s: String = s.clone();
                self.advance();

                return Ok(Expr::Literal(Literal::Str(s)));
            }

            _ => {}
        }

        if self.match_tokens(&[TokenType::IDENTIFIER]) {
            return Ok(Expr::Variable {
                id: ExprId::fresh(),
                name: self.previous().clone(),
            });
        }

        if self.match_tokens(&[TokenType::LEFT_PAREN]) {
            let expr: Expr = self.expression()?;
            self.consume(TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        let token = self.peek();

        Err(LoxError::parse(token.line, token.col, "Expect expression."))
    }

    fn match_tokens(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();

                return true;
            }
        }

        false
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        &self.peek().token_type == token_type
    }

    fn consume(&mut self, token_type: TokenType, message: impl Into<String>) -> Result<Token> {
        if self.check(&token_type) {
            return Ok(self.advance().clone());
        }

        let token = self.peek();

        Err(LoxError::parse(token.line, token.col, message))
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    /// Discards tokens until the next plausible statement boundary: just
    /// past a `;`, or in front of a keyword that begins a statement.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::SEMICOLON {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FOR
                | TokenType::FUN
                | TokenType::IF
                | TokenType::PRINT
                | TokenType::RETURN
                | TokenType::VAR
                | TokenType::WHILE => return,

                _ => {
                    self.advance();
                }
            }
        }
    }
}
