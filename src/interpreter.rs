//! Tree-walking evaluator.
//!
//! Executes a resolved statement sequence against a mutable global
//! environment.  Variable occurrences that the resolver bound to a local
//! scope are fetched by hop count (`Environment::get_at`), everything else
//! falls back to the global map, which is what permits late-bound globals.
//!
//! Non-local `return` travels as [`InterpretError::ReturnSignal`] through the
//! statement `Result` chain and is intercepted only at the function-call
//! boundary; the resolver has already rejected any `return` that could
//! escape past one.  The first runtime error aborts the whole run.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

use log::{debug, info};
use thiserror::Error;

use crate::class::{LoxClass, LoxInstance};
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::expr::{Expr, ExprId};
use crate::function::LoxFunction;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Internal control/error channel for statement execution.  `ReturnSignal`
/// is not an error: it is the explicit non-local-exit variant that unwinds
/// exactly to the nearest function-call boundary.
#[derive(Error, Debug)]
pub enum InterpretError {
    #[error("{message}\n[line {line}]")]
    RuntimeError { message: String, line: usize },

    #[error("return signal with value: {0}")]
    ReturnSignal(Value),
}

impl InterpretError {
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        InterpretError::RuntimeError {
            message: msg.into(),
            line,
        }
    }
}

/// Convenient alias for interpreter results.
pub type IResult<T> = std::result::Result<T, InterpretError>;

pub struct Interpreter {
    /// The one global environment for the whole run.
    globals: Rc<RefCell<Environment>>,

    /// Innermost environment currently executing.
    environment: Rc<RefCell<Environment>>,

    /// Resolver output: binding distance per resolvable expression id.
    /// Absence means global.
    locals: HashMap<ExprId, usize>,

    /// Output sink for `print`; stdout by default, injectable for tests.
    out: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates a new interpreter printing to stdout, with the native
    /// functions (`clock`) predefined in globals.
    pub fn new() -> Self {
        Self::with_output(Box::new(std::io::stdout()))
    }

    /// Creates a new interpreter printing to the given sink.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: Rc<RefCell<Environment>> = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: |_args: &[Value]| {
                    let timestamp: f64 = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .map_err(|e: SystemTimeError| format!("Clock error: {}", e))?
                        .as_secs_f64();
                    Ok(Value::Number(timestamp))
                },
            },
        );

        Self {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            out,
        }
    }

    /// Record a binding distance for a resolvable expression.  Called by the
    /// resolver, once per node.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        debug!("Noting local binding: id={}, depth={}", id, depth);
        self.locals.insert(id, depth);
    }

    /// Interprets a list of statements (a "program").  The first runtime
    /// error aborts the run and is surfaced with its source line.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            self.execute(stmt).map_err(|err| match err {
                InterpretError::RuntimeError { message, line } => {
                    LoxError::runtime(line, message)
                }

                // Unreachable for resolved programs; kept total so a
                // resolver bug cannot panic the host.
                InterpretError::ReturnSignal(value) => {
                    LoxError::runtime(0, format!("stray return of {}", value))
                }
            })?;
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> IResult<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value).map_err(|e| {
                    InterpretError::runtime(expr.line(), format!("Failed to write output: {}", e))
                })?;
                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(())
            }

            Stmt::Block(statements) => {
                let environment: Rc<RefCell<Environment>> = Rc::new(RefCell::new(
                    Environment::with_enclosing(self.environment.clone()),
                ));
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
                Ok(())
            }

            Stmt::Function(declaration) => {
                // Capture the environment active at the declaration site.
                let function = LoxFunction::new(
                    declaration.clone(),
                    self.environment.clone(),
                    false,
                );

                debug!("Defining function '{}'", declaration.name.lexeme);
                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));
                Ok(())
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Return signal with value: {}", value);
                Err(InterpretError::ReturnSignal(value))
            }
        }
    }

    /// Execute `statements` inside `environment`, restoring the previous
    /// environment afterwards even when a return signal or error unwinds.
    /// The block environment itself survives as long as any closure created
    /// inside it holds a reference.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> IResult<()> {
        let previous: Rc<RefCell<Environment>> =
            std::mem::replace(&mut self.environment, environment);

        let mut result: IResult<()> = Ok(());
        for stmt in statements {
            result = self.execute(stmt);
            if result.is_err() {
                break;
            }
        }

        self.environment = previous;
        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> IResult<()> {
        let superclass: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    return Err(InterpretError::runtime(
                        expr.line(),
                        "Superclass must be a class.",
                    ));
                }
            },
            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        // Methods of a subclass close over an extra environment holding
        // `super`, used only while building their bound forms.
        let method_closure: Rc<RefCell<Environment>> = match &superclass {
            Some(class) => {
                let mut environment: Environment =
                    Environment::with_enclosing(self.environment.clone());
                environment.define("super", Value::Class(class.clone()));
                Rc::new(RefCell::new(environment))
            }
            None => self.environment.clone(),
        };

        let mut method_table: HashMap<String, Rc<LoxFunction>> = HashMap::new();
        for declaration in methods {
            let is_initializer: bool = declaration.name.lexeme == "init";
            let method = LoxFunction::new(
                declaration.clone(),
                method_closure.clone(),
                is_initializer,
            );
            method_table.insert(declaration.name.lexeme.clone(), Rc::new(method));
        }

        let class = LoxClass::new(name.lexeme.clone(), superclass, method_table);

        debug!("Defined class '{}'", name.lexeme);
        self.environment
            .borrow_mut()
            .assign(&name.lexeme, Value::Class(Rc::new(class)))
            .map_err(|message| InterpretError::runtime(name.line, message))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(token) => self.evaluate_literal(token),

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

                // Short-circuit: the left operand decides by truthiness and
                // is returned as-is, not coerced to a boolean.
                match operator.token_type {
                    TokenType::OR if left_val.is_truthy() => Ok(left_val),
                    TokenType::AND if !left_val.is_truthy() => Ok(left_val),
                    _ => self.evaluate(right),
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(distance) => Environment::assign_at(
                        &self.environment,
                        *distance,
                        &name.lexeme,
                        value.clone(),
                    ),
                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.lexeme, value.clone()),
                }
                .map_err(|message| InterpretError::runtime(name.line, message))?;

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val: Value = self.evaluate(callee)?;

                let mut arg_values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    arg_values.push(self.evaluate(argument)?);
                }

                self.invoke_callable(callee_val, paren, &arg_values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name)
                    .map_err(|message| InterpretError::runtime(name.line, message)),

                _ => Err(InterpretError::runtime(
                    name.line,
                    "Only instances have properties.",
                )),
            },

            Expr::Set {
                object,
                name,
                value,
            } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value: Value = self.evaluate(value)?;
                    instance.borrow_mut().set(&name.lexeme, value.clone());
                    Ok(value)
                }

                _ => Err(InterpretError::runtime(
                    name.line,
                    "Only instances have fields.",
                )),
            },

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_literal(&self, token: &Token) -> IResult<Value> {
        match &token.token_type {
            TokenType::NUMBER(n) => Ok(Value::Number(*n)),
            TokenType::STRING(s) => Ok(Value::String(s.clone())),
            TokenType::TRUE => Ok(Value::Bool(true)),
            TokenType::FALSE => Ok(Value::Bool(false)),
            TokenType::NIL => Ok(Value::Nil),
            _ => Err(InterpretError::runtime(token.line, "Invalid literal.")),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> IResult<Value> {
        let right_val: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(InterpretError::runtime(
                    operator.line,
                    format!("Operand must be a number, got {}.", other.type_name()),
                )),
            },

            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),

            _ => Err(InterpretError::runtime(
                operator.line,
                "Invalid unary operator.",
            )),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> IResult<Value> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        let numbers = |l: &Value, r: &Value| -> IResult<(f64, f64)> {
            match (l, r) {
                (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
                _ => Err(InterpretError::runtime(
                    operator.line,
                    "Operands must be numbers.",
                )),
            }
        };

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(InterpretError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => {
                let (a, b) = numbers(&left_val, &right_val)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = numbers(&left_val, &right_val)?;
                Ok(Value::Number(a * b))
            }

            TokenType::SLASH => {
                let (a, b) = numbers(&left_val, &right_val)?;
                if b == 0.0 {
                    Err(InterpretError::runtime(operator.line, "Division by zero."))
                } else {
                    Ok(Value::Number(a / b))
                }
            }

            TokenType::GREATER => {
                let (a, b) = numbers(&left_val, &right_val)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = numbers(&left_val, &right_val)?;
                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = numbers(&left_val, &right_val)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = numbers(&left_val, &right_val)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => Err(InterpretError::runtime(
                operator.line,
                "Invalid binary operator.",
            )),
        }
    }

    /// Hop-count-or-global variable lookup.  A recorded distance means a
    /// direct fetch that many parent links up; no distance means the global
    /// map, which may legally gain the name after this expression's lexical
    /// position.
    fn look_up_variable(&self, id: ExprId, name: &Token) -> IResult<Value> {
        let result: std::result::Result<Value, String> = match self.locals.get(&id) {
            Some(distance) => Environment::get_at(&self.environment, *distance, &name.lexeme),
            None => self.globals.borrow().get(&name.lexeme),
        };

        result.map_err(|message| InterpretError::runtime(name.line, message))
    }

    /// `super.method`: the superclass is fetched at the depth the resolver
    /// recorded for the `super` expression (one above the class where it was
    /// written, not above the instance's runtime class), `this` lives one
    /// environment below it, and the found method is bound to `this`.
    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> IResult<Value> {
        let distance: usize = *self.locals.get(&id).ok_or_else(|| {
            InterpretError::runtime(keyword.line, "Unresolved 'super' expression.")
        })?;

        let superclass: Value = Environment::get_at(&self.environment, distance, "super")
            .map_err(|message| InterpretError::runtime(keyword.line, message))?;
        let object: Value = Environment::get_at(&self.environment, distance - 1, "this")
            .map_err(|message| InterpretError::runtime(keyword.line, message))?;

        let (Value::Class(superclass), Value::Instance(instance)) = (superclass, object) else {
            return Err(InterpretError::runtime(
                keyword.line,
                "Unresolved 'super' expression.",
            ));
        };

        let found: Rc<LoxFunction> = superclass.find_method(&method.lexeme).ok_or_else(|| {
            InterpretError::runtime(
                method.line,
                format!("Undefined property '{}'.", method.lexeme),
            )
        })?;

        Ok(Value::Function(Rc::new(found.bind(instance))))
    }

    /// Dispatch over the callable variants: native function, user function,
    /// class-as-constructor.
    fn invoke_callable(
        &mut self,
        callee: Value,
        paren: &Token,
        arguments: &[Value],
    ) -> IResult<Value> {
        match callee {
            Value::NativeFunction { name, arity, func } => {
                self.check_arity(arity, arguments.len(), paren)?;

                debug!("Calling native function '{}'", name);
                func(arguments).map_err(|message| InterpretError::runtime(paren.line, message))
            }

            Value::Function(function) => {
                self.check_arity(function.arity(), arguments.len(), paren)?;
                function.call(self, arguments)
            }

            Value::Class(class) => {
                self.check_arity(class.arity(), arguments.len(), paren)?;

                debug!("Constructing {} instance", class.name);
                let instance: Rc<RefCell<LoxInstance>> =
                    Rc::new(RefCell::new(LoxInstance::new(class.clone())));

                // Run the initializer bound to the new instance; the
                // constructor yields the instance no matter what `init`
                // returns.
                if let Some(initializer) = class.find_method("init") {
                    initializer.bind(instance.clone()).call(self, arguments)?;
                }

                Ok(Value::Instance(instance))
            }

            _ => Err(InterpretError::runtime(
                paren.line,
                "Can only call functions and classes.",
            )),
        }
    }

    fn check_arity(&self, expected: usize, got: usize, paren: &Token) -> IResult<()> {
        if expected != got {
            return Err(InterpretError::runtime(
                paren.line,
                format!("Expected {} arguments but got {}.", expected, got),
            ));
        }
        Ok(())
    }
}
