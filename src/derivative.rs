use std::sync::Arc;
use tracing::debug;

use crate::error::DiffError;
use crate::node::{FunctionKind, Node, Operator};

fn mul(left: impl Into<Arc<Node>>, right: impl Into<Arc<Node>>) -> Node {
    Node::binary(Operator::Multiply, left, right)
}

// Chain rule: multiply the outer derivative by the derivative of the inner expression
fn chain(outer: Node, inner: &Node) -> Result<Node, DiffError> {
    Ok(mul(outer, inner.derivative()?))
}

impl Node {
    /// Symbolic derivative with respect to `x`.
    ///
    /// No simplification is done, so `sin(x)` becomes `cos(x) * 1` and repeated derivatives grow.
    /// Operands reused by a rule are shared with `self` rather than copied.
    pub fn derivative(&self) -> Result<Node, DiffError> {
        Ok(match self {
            Node::Number(_) => Node::Number(0.0),
            Node::Variable => Node::Number(1.0),
            Node::BinaryOp(op @ (Operator::Add | Operator::Subtract), left, right) => {
                Node::binary(*op, left.derivative()?, right.derivative()?)
            },
            // product rule
            Node::BinaryOp(Operator::Multiply, left, right) => Node::binary(Operator::Add,
                mul(left.derivative()?, right.clone()),
                mul(left.clone(), right.derivative()?)),
            // quotient rule
            Node::BinaryOp(Operator::Divide, left, right) => Node::binary(Operator::Divide,
                Node::binary(Operator::Subtract,
                    mul(left.derivative()?, right.clone()),
                    mul(left.clone(), right.derivative()?)),
                Node::binary(Operator::Power, right.clone(), Node::Number(2.0))),
            // power rule, only for a literal exponent
            Node::BinaryOp(Operator::Power, base, exponent) => match **exponent {
                Node::Number(p) => chain(mul(Node::Number(p), Node::binary(Operator::Power, base.clone(), Node::Number(p - 1.0))), base)?,
                _ => return Err(DiffError::NonConstantExponent(exponent.to_string()))
            },
            Node::UnaryFunction(kind, operand) => match kind {
                FunctionKind::Sin => chain(Node::function(FunctionKind::Cos, operand.clone()), operand)?,
                FunctionKind::Cos => mul(Node::Number(-1.0), chain(Node::function(FunctionKind::Sin, operand.clone()), operand)?),
                FunctionKind::Log => Node::binary(Operator::Divide, operand.derivative()?, operand.clone()),
                FunctionKind::Exp => chain(Node::function(FunctionKind::Exp, operand.clone()), operand)?,
                // same as operand^0.5
                FunctionKind::Sqrt => chain(mul(Node::Number(0.5), Node::polynomial(operand.clone(), -0.5)), operand)?
            },
            Node::Polynomial(operand, power) => {
                if *power == 0.0 {
                    Node::Number(0.0)
                } else if *power == 1.0 {
                    operand.derivative()?
                } else {
                    chain(mul(Node::Number(*power), Node::polynomial(operand.clone(), power - 1.0)), operand)?
                }
            }
        })
    }

    /// Applies `derivative` `order` times; order 0 returns a copy of `self`.
    pub fn nth_derivative(&self, order: usize) -> Result<Node, DiffError> {
        let mut result = self.clone();
        for current in 1..=order {
            result = result.derivative()?;
            debug!(order = current, "differentiated");
        }
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn x() -> Arc<Node> {
        Arc::new(Node::Variable)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {}, got {}", expected, actual);
    }

    const SAMPLES: [f64; 5] = [-2.0, -0.5, 0.3, 1.0, 2.7];

    #[test]
    fn leaves() {
        assert_eq!(Node::Number(7.0).derivative(), Ok(Node::Number(0.0)));
        assert_eq!(Node::Variable.derivative(), Ok(Node::Number(1.0)));
    }

    #[test]
    fn sum_and_difference_keep_their_operator() {
        let d = Node::binary(Operator::Subtract, x(), Node::Number(3.0)).derivative().unwrap();
        assert_eq!(d, Node::binary(Operator::Subtract, Node::Number(1.0), Node::Number(0.0)));
    }

    #[test]
    fn product_rule_shares_operands() {
        let right = Arc::new(Node::function(FunctionKind::Sin, x()));
        let left = x();
        let product = Node::BinaryOp(Operator::Multiply, left.clone(), right.clone());
        let d = product.derivative().unwrap();
        match &d {
            Node::BinaryOp(Operator::Add, first, second) => {
                match (&**first, &**second) {
                    (Node::BinaryOp(Operator::Multiply, _, r), Node::BinaryOp(Operator::Multiply, l, _)) => {
                        assert!(Arc::ptr_eq(r, &right));
                        assert!(Arc::ptr_eq(l, &left));
                    },
                    other => panic!("unexpected shape {:?}", other)
                }
            },
            other => panic!("unexpected shape {:?}", other)
        }
        for v in SAMPLES.iter() {
            assert_close(d.value_at(*v), v.sin() + v * v.cos());
        }
    }

    #[test]
    fn quotient_rule() {
        let quotient = Node::binary(Operator::Divide, Node::Number(1.0), x());
        let d = quotient.derivative().unwrap();
        assert_eq!(d.to_string(), "(((0 * x) - (1 * 1)) / (x ^ 2))");
        for v in SAMPLES.iter() {
            assert_close(d.value_at(*v), -1.0 / (v * v));
        }
    }

    #[test]
    fn power_rule_needs_a_literal_exponent() {
        let square = Node::binary(Operator::Power, x(), Node::Number(2.0));
        assert_eq!(square.derivative().unwrap().value_at(3.0), 6.0);
        let exponential = Node::binary(Operator::Power, Node::Number(2.0), x());
        assert_eq!(exponential.derivative(), Err(DiffError::NonConstantExponent("x".to_string())));
        // the exponent is checked before anything else is differentiated
        let nested = Node::binary(Operator::Power, x(), Node::binary(Operator::Add, Node::Number(1.0), Node::Number(1.0)));
        assert!(matches!(nested.derivative(), Err(DiffError::NonConstantExponent(_))));
    }

    #[test]
    fn functions_follow_the_chain_rule() {
        let inner = Arc::new(Node::binary(Operator::Multiply, Node::Number(2.0), x()));
        let cases: [(FunctionKind, fn(f64) -> f64); 5] = [
            (FunctionKind::Sin, |v| 2.0 * (2.0 * v).cos()),
            (FunctionKind::Cos, |v| -2.0 * (2.0 * v).sin()),
            (FunctionKind::Log, |v| 1.0 / v),
            (FunctionKind::Exp, |v| 2.0 * (2.0 * v).exp()),
            (FunctionKind::Sqrt, |v| 1.0 / (2.0 * v).sqrt())
        ];
        for (kind, expected) in cases.iter() {
            let d = Node::function(*kind, inner.clone()).derivative().unwrap();
            for v in [0.3, 1.0, 2.7].iter() {
                assert_close(d.value_at(*v), expected(*v));
            }
        }
    }

    #[test]
    fn polynomial_special_powers() {
        assert_eq!(Node::polynomial(x(), 0.0).derivative(), Ok(Node::Number(0.0)));
        assert_eq!(Node::polynomial(x(), 1.0).derivative(), Ok(Node::Number(1.0)));
        let cube = Node::polynomial(x(), 3.0).derivative().unwrap();
        assert_eq!(cube.to_string(), "((3 * x^2) * 1)");
    }

    #[test]
    fn second_derivatives_are_defined() {
        let cases: [(Node, fn(f64) -> f64); 5] = [
            (Node::function(FunctionKind::Sin, x()), |v| -v.sin()),
            (Node::function(FunctionKind::Cos, x()), |v| -v.cos()),
            (Node::function(FunctionKind::Log, x()), |v| -1.0 / (v * v)),
            (Node::function(FunctionKind::Exp, x()), |v| v.exp()),
            (Node::polynomial(x(), 2.5), |v| 3.75 * v.sqrt())
        ];
        for (node, expected) in cases.iter() {
            let d2 = node.nth_derivative(2).unwrap();
            for v in [0.3, 1.0, 2.7].iter() {
                assert_close(d2.value_at(*v), expected(*v));
            }
        }
        assert_eq!(Node::Variable.nth_derivative(0), Ok(Node::Variable));
    }
}
