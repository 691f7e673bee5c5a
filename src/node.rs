use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use crate::error::EvalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power
}

impl Operator {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Subtract),
            '*' => Some(Operator::Multiply),
            '/' => Some(Operator::Divide),
            '^' => Some(Operator::Power),
            _ => None
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
            Operator::Power => '^'
        }
    }

    // Higher binds tighter. All operators, including ^, are reduced left to right.
    pub fn precedence(self) -> usize {
        match self {
            Operator::Add | Operator::Subtract => 1,
            Operator::Multiply | Operator::Divide => 2,
            Operator::Power => 3
        }
    }

    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Operator::Add => a + b,
            Operator::Subtract => a - b,
            Operator::Multiply => a * b,
            Operator::Divide => a / b,
            Operator::Power => a.powf(b)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Sin,
    Cos,
    Log,
    Exp,
    Sqrt
}

impl FunctionKind {
    pub const ALL: [FunctionKind; 5] = [FunctionKind::Sin, FunctionKind::Cos, FunctionKind::Log, FunctionKind::Exp, FunctionKind::Sqrt];

    // Case-insensitive lookup by name
    pub fn from_name(name: &str) -> Option<Self> {
        FunctionKind::ALL.iter().copied().find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            FunctionKind::Sin => "sin",
            FunctionKind::Cos => "cos",
            FunctionKind::Log => "log",
            FunctionKind::Exp => "exp",
            FunctionKind::Sqrt => "sqrt"
        }
    }

    // log is the natural logarithm
    pub fn apply(self, x: f64) -> f64 {
        match self {
            FunctionKind::Sin => x.sin(),
            FunctionKind::Cos => x.cos(),
            FunctionKind::Log => x.ln(),
            FunctionKind::Exp => x.exp(),
            FunctionKind::Sqrt => x.sqrt()
        }
    }
}

/// An expression in the single free variable `x`.
///
/// Nodes are never mutated once built. Children sit behind `Arc`, so derivative rules that reuse an
/// operand share it instead of copying it; since a node can only be built from children that
/// already exist, the structure is always acyclic.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Number(f64),
    Variable,
    BinaryOp(Operator, Arc<Node>, Arc<Node>),
    UnaryFunction(FunctionKind, Arc<Node>),
    /// `operand^power` with a power that does not depend on `x`.
    Polynomial(Arc<Node>, f64)
}

impl Node {
    pub fn binary(op: Operator, left: impl Into<Arc<Node>>, right: impl Into<Arc<Node>>) -> Self {
        Node::BinaryOp(op, left.into(), right.into())
    }

    pub fn function(kind: FunctionKind, operand: impl Into<Arc<Node>>) -> Self {
        Node::UnaryFunction(kind, operand.into())
    }

    pub fn polynomial(operand: impl Into<Arc<Node>>, power: f64) -> Self {
        Node::Polynomial(operand.into(), power)
    }

    pub fn contains_variable(&self) -> bool {
        match self {
            Node::Number(_) => false,
            Node::Variable => true,
            Node::BinaryOp(_, left, right) => left.contains_variable() || right.contains_variable(),
            Node::UnaryFunction(_, operand) | Node::Polynomial(operand, _) => operand.contains_variable()
        }
    }

    // Shared traversal for both evaluation entry points; `variable` decides what x is worth.
    fn fold<E, F: Fn() -> Result<f64, E>>(&self, variable: &F) -> Result<f64, E> {
        Ok(match self {
            Node::Number(c) => *c,
            Node::Variable => variable()?,
            Node::BinaryOp(op, left, right) => op.apply(left.fold(variable)?, right.fold(variable)?),
            Node::UnaryFunction(kind, operand) => kind.apply(operand.fold(variable)?),
            Node::Polynomial(operand, power) => operand.fold(variable)?.powf(*power)
        })
    }

    /// Evaluates an expression which does not mention `x`.
    pub fn value(&self) -> Result<f64, EvalError> {
        self.fold(&|| Err(EvalError::UnboundVariable))
    }

    /// Evaluates with `x` bound. Division by zero and out-of-domain functions give IEEE infinities or NaN.
    pub fn value_at(&self, x: f64) -> f64 {
        match self.fold(&|| Ok::<_, Infallible>(x)) {
            Ok(v) => v,
            Err(never) => match never {}
        }
    }
}

// Negative literals get brackets so that the rendered text parses back to the same value
fn write_number(f: &mut fmt::Formatter<'_>, c: f64) -> fmt::Result {
    if c.is_sign_negative() {
        write!(f, "({})", c)
    } else {
        write!(f, "{}", c)
    }
}

// Fully parenthesized infix rendering
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Number(c) => write_number(f, *c),
            Node::Variable => write!(f, "x"),
            Node::BinaryOp(op, left, right) => write!(f, "({} {} {})", left, op.symbol(), right),
            Node::UnaryFunction(kind, operand) => write!(f, "{}({})", kind.name(), operand),
            Node::Polynomial(operand, power) => {
                match **operand {
                    Node::Polynomial(_, _) => write!(f, "({})^", operand)?,
                    _ => write!(f, "{}^", operand)?
                }
                write_number(f, *power)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn x() -> Arc<Node> {
        Arc::new(Node::Variable)
    }

    #[test]
    fn evaluates_every_variant() {
        let expr = Node::binary(Operator::Add,
            Node::binary(Operator::Multiply, Node::Number(3.0), Node::binary(Operator::Power, x(), Node::Number(2.0))),
            Node::function(FunctionKind::Sqrt, Node::polynomial(x(), 4.0)));
        // 3*2^2 + sqrt(2^4)
        assert_eq!(expr.value_at(2.0), 16.0);
        assert_eq!(Node::function(FunctionKind::Log, Node::function(FunctionKind::Exp, x())).value_at(0.0), 0.0);
        assert_eq!(Node::binary(Operator::Subtract, Node::Number(1.0), Node::Number(4.0)).value(), Ok(-3.0));
    }

    #[test]
    fn unbound_variable_is_reported() {
        assert_eq!(Node::Variable.value(), Err(EvalError::UnboundVariable));
        let nested = Node::function(FunctionKind::Cos, Node::binary(Operator::Add, Node::Number(1.0), x()));
        assert_eq!(nested.value(), Err(EvalError::UnboundVariable));
        assert!(nested.contains_variable());
        assert!(!Node::Number(2.0).contains_variable());
    }

    #[test]
    fn ieee_edge_cases_propagate() {
        assert_eq!(Node::binary(Operator::Divide, Node::Number(1.0), Node::Number(0.0)).value(), Ok(f64::INFINITY));
        assert!(Node::function(FunctionKind::Log, x()).value_at(-1.0).is_nan());
        assert!(Node::function(FunctionKind::Sqrt, x()).value_at(-4.0).is_nan());
        assert_eq!(Node::function(FunctionKind::Log, x()).value_at(0.0), f64::NEG_INFINITY);
    }

    #[test]
    fn renders_fully_parenthesized() {
        let expr = Node::binary(Operator::Multiply, Node::function(FunctionKind::Cos, x()), Node::Number(1.0));
        assert_eq!(expr.to_string(), "(cos(x) * 1)");
        let expr = Node::binary(Operator::Divide, Node::Number(-1.0), Node::binary(Operator::Power, x(), Node::Number(2.5)));
        assert_eq!(expr.to_string(), "((-1) / (x ^ 2.5))");
        assert_eq!(Node::polynomial(Node::binary(Operator::Add, x(), Node::Number(1.0)), -0.5).to_string(), "(x + 1)^(-0.5)");
        assert_eq!(Node::polynomial(Node::polynomial(x(), 2.0), 3.0).to_string(), "(x^2)^3");
    }

    #[test]
    fn function_names_are_case_insensitive() {
        assert_eq!(FunctionKind::from_name("SIN"), Some(FunctionKind::Sin));
        assert_eq!(FunctionKind::from_name("Sqrt"), Some(FunctionKind::Sqrt));
        assert_eq!(FunctionKind::from_name("tan"), None);
    }
}
