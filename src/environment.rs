use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::value::Value;

/// One scope in the chain: a name-to-value map plus a handle on the
/// enclosing scope (`None` for the globals). Scopes are shared between the
/// interpreter's current-environment pointer and any closures that captured
/// them, hence `Rc<RefCell<_>>` throughout.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Creates or overwrites a binding in this scope.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Looks a name up here, delegating to the enclosing scope when absent.
    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Overwrites an existing binding here or in an enclosing scope. Unlike
    /// `define`, assignment to a name no scope contains is an error.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Reads `name` from the scope exactly `depth` hops up the chain. No
    /// delegation happens from there; the resolver already picked the scope.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        depth: usize,
        name: &str,
        line: usize,
    ) -> Result<Value> {
        let scope = Self::ancestor(env, depth, name, line)?;
        let value = scope.borrow().values.get(name).cloned();

        value.ok_or_else(|| LoxError::runtime(line, format!("Undefined variable '{}'.", name)))
    }

    /// Writes `name` in the scope exactly `depth` hops up the chain.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        depth: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<()> {
        let scope = Self::ancestor(env, depth, name, line)?;

        scope.borrow_mut().values.insert(name.to_string(), value);

        Ok(())
    }

    fn ancestor(
        env: &Rc<RefCell<Environment>>,
        depth: usize,
        name: &str,
        line: usize,
    ) -> Result<Rc<RefCell<Environment>>> {
        let mut scope: Rc<RefCell<Environment>> = Rc::clone(env);

        for _ in 0..depth {
            let parent = scope.borrow().enclosing.clone();

            scope = parent.ok_or_else(|| {
                LoxError::runtime(line, format!("Undefined variable '{}'.", name))
            })?;
        }

        Ok(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared(env: Environment) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(env))
    }

    #[test]
    fn define_then_get() {
        let mut env = Environment::new();
        env.define("a", Value::Number(1.0));

        assert_eq!(env.get("a", 1).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn get_delegates_to_enclosing() {
        let globals = shared(Environment::new());
        globals.borrow_mut().define("a", Value::String("outer".into()));

        let inner = Environment::with_enclosing(Rc::clone(&globals));

        assert_eq!(inner.get("a", 1).unwrap(), Value::String("outer".into()));
    }

    #[test]
    fn assign_updates_enclosing_scope() {
        let globals = shared(Environment::new());
        globals.borrow_mut().define("a", Value::Number(1.0));

        let mut inner = Environment::with_enclosing(Rc::clone(&globals));
        inner.assign("a", Value::Number(2.0), 1).unwrap();

        assert_eq!(globals.borrow().get("a", 1).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn assign_to_unknown_name_errors() {
        let mut env = Environment::new();

        assert!(env.assign("ghost", Value::Nil, 3).is_err());
    }

    #[test]
    fn get_at_skips_shadowing_scope() {
        let outer = shared(Environment::new());
        outer.borrow_mut().define("a", Value::String("outer".into()));

        let inner = shared(Environment::with_enclosing(Rc::clone(&outer)));
        inner.borrow_mut().define("a", Value::String("inner".into()));

        assert_eq!(
            Environment::get_at(&inner, 0, "a", 1).unwrap(),
            Value::String("inner".into())
        );
        assert_eq!(
            Environment::get_at(&inner, 1, "a", 1).unwrap(),
            Value::String("outer".into())
        );
    }

    #[test]
    fn assign_at_writes_exactly_one_scope() {
        let outer = shared(Environment::new());
        outer.borrow_mut().define("a", Value::Number(1.0));

        let inner = shared(Environment::with_enclosing(Rc::clone(&outer)));
        inner.borrow_mut().define("a", Value::Number(10.0));

        Environment::assign_at(&inner, 1, "a", Value::Number(2.0), 1).unwrap();

        assert_eq!(
            Environment::get_at(&inner, 0, "a", 1).unwrap(),
            Value::Number(10.0)
        );
        assert_eq!(outer.borrow().get("a", 1).unwrap(), Value::Number(2.0));
    }
}
