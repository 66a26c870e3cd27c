use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ast::{Expr, ExprId, Literal, Stmt};
use crate::environment::Environment;
use crate::error::LoxError;
use crate::token::{Token, TokenType};
use crate::value::{LoxFunction, Value};

/// Control transfer out of statement execution: either a runtime error or a
/// `return` unwinding toward the nearest enclosing call. `return` is not an
/// error; it is only ever surfaced as one when no call frame catches it.
#[derive(Debug)]
pub enum Unwind {
    Return(Value),
    Error(LoxError),
}

impl From<LoxError> for Unwind {
    fn from(e: LoxError) -> Self {
        Unwind::Error(e)
    }
}

/// Tree-walking evaluator.
///
/// Output from `print` goes to the owned writer, which defaults to stdout;
/// tests hand in a `Vec<u8>` instead. The globals scope lives for the whole
/// interpreter and is pre-populated with the `clock` built-in.
pub struct Interpreter<W: Write = io::Stdout> {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    writer: W,
}

impl Interpreter<io::Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_writer(writer: W) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock",
                arity: 0,
                func: clock_native,
            },
        );

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            writer,
        }
    }

    /// Reclaims the writer, e.g. to inspect captured output in tests.
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Records the lexical depth of a variable occurrence. Called by the
    /// resolver; occurrences with no entry are globals, looked up by name.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Runs a statement list to completion, or up to the first runtime
    /// error.
    pub fn interpret(&mut self, statements: &[Stmt]) -> crate::error::Result<()> {
        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}

                Err(Unwind::Error(e)) => return Err(e),

                // The resolver rejects `return` outside a function, so an
                // uncaught unwind can only mean the checks were skipped;
                // treat it as the end of the program.
                Err(Unwind::Return(_)) => return Ok(()),
            }
        }

        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<(), Unwind> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                writeln!(self.writer, "{}", value).map_err(LoxError::from)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let enclosing = Rc::clone(&self.environment);
                let scope = Rc::new(RefCell::new(Environment::with_enclosing(enclosing)));

                self.execute_block(statements, scope)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Function { name, params, body } => {
                let function = Value::Function(Rc::new(LoxFunction {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::clone(body),
                    closure: Rc::clone(&self.environment),
                }));

                self.environment.borrow_mut().define(&name.lexeme, function);

                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(Unwind::Return(value))
            }
        }
    }

    /// Runs `statements` inside `scope`, restoring the previous environment
    /// on every exit path, including runtime errors and `return` unwinds.
    fn execute_block(
        &mut self,
        statements: &[Stmt],
        scope: Rc<RefCell<Environment>>,
    ) -> Result<(), Unwind> {
        let previous = std::mem::replace(&mut self.environment, scope);

        let mut result: Result<(), Unwind> = Ok(());

        for stmt in statements {
            result = self.execute(stmt);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, Unwind> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val: Value = self.evaluate(left)?;

                // The parser only builds `or` and `and` here. Either way the
                // operand itself is the result, not a coerced boolean.
                if let TokenType::OR = operator.token_type {
                    if is_truthy(&left_val) {
                        Ok(left_val)
                    } else {
                        self.evaluate(right)
                    }
                } else if !is_truthy(&left_val) {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&depth) => Environment::assign_at(
                        &self.environment,
                        depth,
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,

                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.lexeme, value.clone(), name.line)?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                self.call_value(callee_val, args, paren)
            }
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value, Unwind> {
        match self.locals.get(&id) {
            Some(&depth) => {
                Ok(Environment::get_at(&self.environment, depth, &name.lexeme, name.line)?)
            }

            None => Ok(self.globals.borrow().get(&name.lexeme, name.line)?),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value, Unwind> {
        let value: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime(operator.line, "Operand must be a number.").into()),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&value))),

            _ => Err(LoxError::runtime(operator.line, "Invalid unary operator.").into()),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Value, Unwind> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },

            TokenType::MINUS => {
                let (a, b) = number_operands(operator, left_val, right_val)?;

                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = number_operands(operator, left_val, right_val)?;

                Ok(Value::Number(a * b))
            }

            // Division by zero follows IEEE 754: it yields an infinity or
            // NaN, never an error.
            TokenType::SLASH => {
                let (a, b) = number_operands(operator, left_val, right_val)?;

                Ok(Value::Number(a / b))
            }

            TokenType::GREATER => {
                let (a, b) = number_operands(operator, left_val, right_val)?;

                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(operator, left_val, right_val)?;

                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = number_operands(operator, left_val, right_val)?;

                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(operator, left_val, right_val)?;

                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => Err(LoxError::runtime(operator.line, "Invalid binary operator.").into()),
        }
    }

    fn call_value(
        &mut self,
        callee: Value,
        args: Vec<Value>,
        paren: &Token,
    ) -> Result<Value, Unwind> {
        match callee {
            Value::NativeFunction { arity, func, .. } => {
                if args.len() != arity {
                    return Err(LoxError::runtime(
                        paren.line,
                        format!("Expected {} arguments but got {}.", arity, args.len()),
                    )
                    .into());
                }

                func(&args).map_err(|msg| LoxError::runtime(paren.line, msg).into())
            }

            Value::Function(fun) => {
                if args.len() != fun.arity() {
                    return Err(LoxError::runtime(
                        paren.line,
                        format!(
                            "Expected {} arguments but got {}.",
                            fun.arity(),
                            args.len()
                        ),
                    )
                    .into());
                }

                self.call_function(&fun, args)
            }

            _ => Err(
                LoxError::runtime(paren.line, "Can only call functions and classes.").into(),
            ),
        }
    }

    /// Invokes a user function: parameters bind in a fresh scope enclosed by
    /// the captured closure, and a `return` unwind is caught here. A call
    /// that falls off the end of the body yields `nil`.
    fn call_function(&mut self, fun: &LoxFunction, args: Vec<Value>) -> Result<Value, Unwind> {
        let mut scope = Environment::with_enclosing(Rc::clone(&fun.closure));

        for (param, value) in fun.params.iter().zip(args) {
            scope.define(&param.lexeme, value);
        }

        match self.execute_block(&fun.body, Rc::new(RefCell::new(scope))) {
            Ok(()) => Ok(Value::Nil),

            Err(Unwind::Return(value)) => Ok(value),

            Err(e) => Err(e),
        }
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Nil => Value::Nil,

        Literal::True => Value::Bool(true),

        Literal::False => Value::Bool(false),

        Literal::Number(n) => Value::Number(*n),

        Literal::Str(s) => Value::String(s.clone()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,

        Value::Bool(b) => *b,

        _ => true,
    }
}

fn number_operands(operator: &Token, left: Value, right: Value) -> Result<(f64, f64), Unwind> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((a, b)),

        _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.").into()),
    }
}

fn clock_native(_args: &[Value]) -> Result<Value, String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| e.to_string())?;

    Ok(Value::Number(now.as_secs() as f64))
}
