//! User-defined functions and methods.
//!
//! A `LoxFunction` pairs a declaration with the environment that was active
//! at its definition site.  That captured environment is what makes it a
//! closure: the body sees later mutations of enclosing variables, and keeps
//! the defining scope alive after the enclosing call returns.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::class::LoxInstance;
use crate::environment::Environment;
use crate::interpreter::{IResult, InterpretError, Interpreter};
use crate::stmt::FunctionDecl;
use crate::value::Value;

#[derive(Debug)]
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Rebind this method to `instance`: a fresh environment layering `this`
    /// over the original closure.  The returned function stays bound even if
    /// detached from the instance and invoked independently.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        let mut environment: Environment = Environment::with_enclosing(self.closure.clone());
        environment.define("this", Value::Instance(instance));

        LoxFunction {
            declaration: self.declaration.clone(),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }

    /// Invoke the function: fresh environment parented to the captured
    /// closure, parameters bound there, body executed.  A `return` signal
    /// supplies the result; otherwise the call yields `nil`.  Initializers
    /// always yield `this`, whatever the body returned.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: &[Value]) -> IResult<Value> {
        debug!("Calling function '{}'", self.name());

        let environment: Rc<RefCell<Environment>> =
            Rc::new(RefCell::new(Environment::with_enclosing(self.closure.clone())));

        for (param, argument) in self.declaration.params.iter().zip(arguments.iter()) {
            environment
                .borrow_mut()
                .define(&param.lexeme, argument.clone());
        }

        match interpreter.execute_block(&self.declaration.body, environment) {
            Ok(()) => {
                if self.is_initializer {
                    self.bound_this()
                } else {
                    Ok(Value::Nil)
                }
            }

            Err(InterpretError::ReturnSignal(value)) => {
                if self.is_initializer {
                    self.bound_this()
                } else {
                    Ok(value)
                }
            }

            Err(err) => Err(err),
        }
    }

    /// The `this` binding of a bound initializer's closure.
    fn bound_this(&self) -> IResult<Value> {
        Environment::get_at(&self.closure, 0, "this").map_err(|message| {
            InterpretError::runtime(self.declaration.name.line, message)
        })
    }
}
