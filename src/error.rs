use std::fmt;
use inlinable_string::InlinableString;
use itertools::Itertools;

use crate::node::FunctionKind;

// Failures while turning text into a tree. Positions are character offsets into the input.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    InvalidCharacter { character: char, position: usize },
    UnbalancedParentheses { position: usize },
    UnknownFunctionName(InlinableString),
    MalformedExpression(&'static str)
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidCharacter { character, position } => write!(f, "invalid character {:?} (char {})", character, position),
            ParseError::UnbalancedParentheses { position } => write!(f, "no matching parenthesis for the one at char {}", position),
            ParseError::UnknownFunctionName(name) => write!(f, "unknown function {}, expected one of {}", name, FunctionKind::ALL.iter().map(|k| k.name()).join(", ")),
            ParseError::MalformedExpression(reason) => write!(f, "invalid expression: {}", reason)
        }
    }
}
impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    UnboundVariable
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UnboundVariable => write!(f, "input expected: the expression contains x but no value was given for it")
        }
    }
}
impl std::error::Error for EvalError {}

#[derive(Debug, Clone, PartialEq)]
pub enum DiffError {
    // Carries the rendered exponent that could not be differentiated
    NonConstantExponent(String)
}

impl fmt::Display for DiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffError::NonConstantExponent(exponent) => write!(f, "power rule supports only constant exponents, got {}", exponent)
        }
    }
}
impl std::error::Error for DiffError {}
