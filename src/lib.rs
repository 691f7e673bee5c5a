use anyhow::{Result, Context, bail};
use inlinable_string::InlinableString;
use std::fmt;
use tracing::debug;
#[cfg(target_family="wasm")]
use std::cell::RefCell;
#[cfg(target_family="wasm")]
use wasm_bindgen::prelude::*;

#[cfg(target_family="wasm")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

pub mod parse;
pub mod node;
pub mod error;
pub mod env;
mod derivative;
mod util;

pub use parse::parse;
pub use node::{Node, Operator, FunctionKind};
pub use error::{ParseError, EvalError, DiffError};
pub use env::Env;

use util::strip_primes;

// What a single statement produced
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Value(f64),
    // `at` is (x, value of the derivative at x) when x is bound
    Derivative { order: usize, expression: Node, at: Option<(f64, f64)> },
    Binding { name: InlinableString, value: f64 }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Value(v) => write!(f, "Result: {}", v),
            Answer::Derivative { order, expression, at } => {
                match *order {
                    1 => write!(f, "Derivative: {}", expression)?,
                    2 => write!(f, "Second Derivative: {}", expression)?,
                    n => write!(f, "Derivative {}: {}", n, expression)?
                }
                if let Some((x, v)) = at {
                    write!(f, " = {} at x = {}", v, x)?;
                }
                Ok(())
            },
            Answer::Binding { name, value } => write!(f, "{} = {}", name, value)
        }
    }
}

pub struct Session {
    pub env: Env
}

impl Session {
    pub fn init() -> Self {
        Session::with_env(Env::default())
    }

    pub fn with_env(env: Env) -> Self {
        Session { env }
    }

    // Run a single statement (roughly, a line of user input) in the current session
    fn eval_statement(&mut self, stmt: &str) -> Result<Option<Answer>> {
        if stmt == "clear" {
            self.env = self.env.without_binding();
            return Ok(None)
        }
        // = binds the variable. Whatever name is used, there is only the one variable.
        if let Some((name, rhs)) = stmt.split_once('=') {
            let name = name.trim();
            if name.is_empty() || !name.chars().all(char::is_alphabetic) {
                bail!("only the variable can be assigned to, not {:?}", name)
            }
            if FunctionKind::from_name(name).is_some() {
                bail!("{} is a function and cannot be assigned to", name)
            }
            let node = parse(rhs).with_context(|| format!("parsing {}", rhs.trim()))?;
            let value = self.env.evaluate(&node).with_context(|| format!("evaluating {}", node))?;
            self.env = self.env.with_binding(value);
            return Ok(Some(Answer::Binding { name: InlinableString::from(name), value }))
        }
        // Apostrophes around an expression ask for that many derivatives
        let (body, order) = strip_primes(stmt);
        if order > self.env.max_order {
            bail!("at most {} derivatives can be taken at once, got {}", self.env.max_order, order)
        }
        let node = parse(body).with_context(|| format!("parsing {}", body))?;
        debug!(%node, order, "evaluating statement");
        if order == 0 {
            let value = self.env.evaluate(&node).with_context(|| format!("evaluating {}", node))?;
            return Ok(Some(Answer::Value(value)))
        }
        let expression = node.nth_derivative(order).with_context(|| format!("differentiating {}", node))?;
        let at = self.env.binding.map(|x| (x, expression.value_at(x)));
        Ok(Some(Answer::Derivative { order, expression, at }))
    }

    // Evaluate an entire "program" (multiple statements delineated by ; or newlines)
    pub fn eval_program(&mut self, program: &str) -> Result<Option<Answer>> {
        let mut last_value = None;
        for stmt in program.split(|c: char| c == ';' || c == '\n').map(str::trim).filter(|s| !s.is_empty()) {
            last_value = self.eval_statement(stmt)?;
        }
        Ok(last_value)
    }
}

#[cfg(target_family="wasm")]
thread_local! {
    static JS_CONTEXT: RefCell<Option<Session>> = RefCell::new(None);
}

#[cfg(target_family="wasm")]
#[wasm_bindgen]
pub fn init_context() {
    JS_CONTEXT.with(|ctx| *ctx.borrow_mut() = Some(Session::init()));
}
#[cfg(target_family="wasm")]
#[wasm_bindgen]
pub fn run_program(program: &str) -> String {
    JS_CONTEXT.with(|ctx| match ctx.borrow_mut().as_mut() {
        Some(session) => match session.eval_program(program) {
            Ok(Some(result)) => result.to_string(),
            Ok(None) => String::new(),
            Err(e) => format!("Error: {:?}", e)
        },
        None => String::from("Error: context not initialised")
    })
}
#[cfg(target_family="wasm")]
#[wasm_bindgen]
pub fn deinit_context() {
    JS_CONTEXT.with(|ctx| ctx.borrow_mut().take());
}
