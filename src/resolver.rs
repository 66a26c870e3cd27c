//! Static resolution pass.
//!
//! A single AST walk that:
//! 1. builds lexical scopes: a stack of `HashMap<String, bool>` tracking
//!    declared (`false`) and fully defined (`true`) names per nested block
//!    or function;
//! 2. enforces static rules: redeclaration in the same scope, reading a
//!    variable in its own initializer, `return` outside any function;
//! 3. records binding distances: every `Variable` and `Assign` occurrence
//!    that lands in some scope is noted in the interpreter's side table with
//!    its depth, so the runtime climbs exactly the right number of
//!    environment frames. Occurrences found in no scope are globals and get
//!    no entry.
//!
//! Errors go through the shared reporter and the walk continues; the driver
//! refuses to execute a program whose reporter is non-empty.

use std::collections::HashMap;
use std::io::Write;

use log::{debug, info};

use crate::ast::{Expr, ExprId, Stmt};
use crate::error::{ErrorReporter, LoxError};
use crate::interpreter::Interpreter;
use crate::token::Token;

/// Are we inside a user function? Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
}

pub struct Resolver<'a, W: Write> {
    interpreter: &'a mut Interpreter<W>,
    reporter: &'a mut ErrorReporter,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
}

impl<'a, W: Write> Resolver<'a, W> {
    pub fn new(interpreter: &'a mut Interpreter<W>, reporter: &'a mut ErrorReporter) -> Self {
        Resolver {
            interpreter,
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
        }
    }

    /// Walk all top-level statements.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // Declared but not yet defined while its initializer runs.
                self.declare(name);

                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                self.define(name);
            }

            Stmt::Function { name, params, body } => {
                // Declare and define eagerly so the function can recurse.
                self.declare(name);
                self.define(name);

                self.resolve_function(params, body);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.reporter.report(LoxError::resolve(
                        keyword.line,
                        keyword.col,
                        "'return' used outside of function",
                    ));
                }

                if let Some(expr) = value {
                    self.resolve_expr(expr);
                }
            }
        }
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                let declared_unfinished = self
                    .scopes
                    .last()
                    .is_some_and(|scope| scope.get(&name.lexeme) == Some(&false));

                if declared_unfinished {
                    self.reporter.report(LoxError::resolve(
                        name.line,
                        name.col,
                        "Can't read local variable in its own initializer",
                    ));
                } else {
                    self.resolve_local(*id, name);
                }
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }
        }
    }

    /// Enter a fresh scope for a function's parameters and body.
    fn resolve_function(&mut self, params: &[Token], body: &[Stmt]) {
        let enclosing: FunctionType = self.current_function;
        self.current_function = FunctionType::Function;

        self.begin_scope();

        for param in params {
            self.declare(param);
            self.define(param);
        }

        for stmt in body {
            self.resolve_stmt(stmt);
        }

        self.end_scope();

        self.current_function = enclosing;
    }

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.reporter.report(LoxError::resolve(
                    name.line,
                    name.col,
                    "Variable already declared in this scope",
                ));
            }

            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    /// Record this occurrence as a local at the depth of the innermost scope
    /// containing the name, or leave it for global lookup when none does.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);

                self.interpreter.resolve(id, depth);

                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
