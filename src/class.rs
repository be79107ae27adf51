//! Classes and instances.
//!
//! A `LoxClass` is both a type descriptor (name, single superclass, method
//! table) and a constructor: calling it allocates a `LoxInstance` and runs
//! the bound `init` method if one exists.  Method lookup is dynamic: the
//! instance's own class first, then up the superclass chain, first match
//! wins.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::function::LoxFunction;
use crate::token::Token;
use crate::value::Value;

#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    pub superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
        }
    }

    /// Walk this class then its superclass chain for `name`.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    /// Constructor arity: the arity of `init`, or zero without one.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }
}

/// A runtime object: a class reference plus a field map populated lazily on
/// first assignment.  There is no fixed schema.
#[derive(Debug)]
pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class.name
    }

    /// Property read: fields shadow methods of the same name.  A method hit
    /// is rebound to this instance so `this` stays attached to it.
    ///
    /// Takes the `Rc` handle rather than `&self` because binding needs to
    /// store the instance itself into the method's `this` environment.
    pub fn get(instance: &Rc<RefCell<LoxInstance>>, name: &Token) -> Result<Value, String> {
        if let Some(value) = instance.borrow().fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = instance.borrow().class.find_method(&name.lexeme) {
            debug!(
                "Binding method '{}' on {} instance",
                name.lexeme,
                instance.borrow().class_name()
            );

            return Ok(Value::Function(Rc::new(method.bind(instance.clone()))));
        }

        Err(format!("Undefined property '{}'.", name.lexeme))
    }

    /// Property write: creates or overwrites a field on this instance's own
    /// map, never on the class or a superclass.
    pub fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}
