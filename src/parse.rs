use std::str::FromStr;
use inlinable_string::{InlinableString, StringExt};
use tracing::{debug, trace};

use crate::error::ParseError;
use crate::node::{FunctionKind, Node, Operator};
use crate::util::char_to_string;

#[derive(Debug, PartialEq, Clone)]
pub enum Token { Number(InlinableString), Identifier(InlinableString), Op(Operator), OpenBracket, CloseBracket }

// A token with the character offset it starts at
pub type Lexeme = (usize, Token);

#[derive(Debug)]
enum LexState {
    Number(usize, InlinableString),
    Identifier(usize, InlinableString),
    None
}

fn commit(state: LexState, toks: &mut Vec<Lexeme>) {
    match state {
        LexState::Number(start, s) => toks.push((start, Token::Number(s))),
        LexState::Identifier(start, s) => toks.push((start, Token::Identifier(s))),
        LexState::None => ()
    }
}

// lexer
// converts the input to tokens; whitespace only separates tokens
pub fn lex(input: &str) -> Result<Vec<Lexeme>, ParseError> {
    let mut toks = vec![];
    let mut state = LexState::None;
    for (index, char) in input.chars().enumerate() {
        state = match (char, state) {
            // a second decimal point in one literal is rejected rather than truncated
            ('.', LexState::Number(_, ref n)) if n.contains('.') => {
                return Err(ParseError::InvalidCharacter { character: char, position: index })
            },
            ('0'..='9' | '.', LexState::Number(start, mut n)) => {
                n.push(char);
                LexState::Number(start, n)
            },
            // if digit seen, switch into number state (and commit existing identifier if relevant)
            ('0'..='9' | '.', state) => {
                commit(state, &mut toks);
                LexState::Number(index, char_to_string(char))
            },
            (c, LexState::Identifier(start, mut s)) if c.is_alphabetic() => {
                s.push(c);
                LexState::Identifier(start, s)
            },
            (c, state) if c.is_alphabetic() => {
                commit(state, &mut toks);
                LexState::Identifier(index, char_to_string(c))
            },
            // the root glyph is another spelling of sqrt
            ('\u{221A}', state) => {
                commit(state, &mut toks);
                toks.push((index, Token::Identifier(InlinableString::from("sqrt"))));
                LexState::None
            },
            ('(' | ')' | '+' | '-' | '*' | '/' | '^', state) => {
                commit(state, &mut toks);
                toks.push((index, match char {
                    '(' => Token::OpenBracket,
                    ')' => Token::CloseBracket,
                    c => match Operator::from_char(c) {
                        Some(op) => Token::Op(op),
                        None => return Err(ParseError::InvalidCharacter { character: c, position: index })
                    }
                }));
                LexState::None
            },
            (c, state) if c.is_whitespace() => {
                commit(state, &mut toks);
                LexState::None
            },
            (c, _) => return Err(ParseError::InvalidCharacter { character: c, position: index })
        }
    }
    // commit last thing
    commit(state, &mut toks);
    Ok(toks)
}

// Index of the bracket closing the one at `open`, scanning over nested groups
fn find_matching_close(tokens: &[Lexeme], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, (_, tok)) in tokens.iter().enumerate().skip(open) {
        match tok {
            Token::OpenBracket => depth += 1,
            Token::CloseBracket => {
                depth -= 1;
                if depth == 0 {
                    return Some(i)
                }
            },
            _ => ()
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pending {
    Op(Operator),
    // sign written where an operand was expected
    Negate,
    // position of the bracket in the input, for error reporting
    LeftParenthesis(usize)
}

impl Pending {
    // Binding strength on a doubled scale so the sign can sit between * / and ^
    fn strength(self) -> Option<usize> {
        match self {
            Pending::Op(op) => Some(op.precedence() * 2),
            Pending::Negate => Some(Operator::Power.precedence() * 2 - 1),
            Pending::LeftParenthesis(_) => None
        }
    }
}

// Operator-precedence parser over a token slice: one stack of finished operands, one of pending operators.
struct Parser<'a> {
    tokens: &'a [Lexeme],
    position: usize,
    operands: Vec<Node>,
    operators: Vec<Pending>,
    // true at the start, after an operator, and after an opening bracket
    expect_operand: bool
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Lexeme]) -> Self {
        Parser { tokens, position: 0, operands: vec![], operators: vec![], expect_operand: true }
    }

    fn push_operand(&mut self, node: Node) {
        self.operands.push(node);
        self.expect_operand = false;
    }

    // Pop one operator and its operands, and push the combined node.
    // A missing left operand stands in as 1, which is what lets "*3" or "3*" through.
    // A negated operand becomes "0 - operand", or a negative literal when it is a plain number.
    fn reduce(&mut self) -> Result<(), ParseError> {
        let right = self.operands.pop().ok_or(ParseError::MalformedExpression("operator without operand"))?;
        let op = match self.operators.pop() {
            Some(Pending::Op(op)) => op,
            Some(Pending::Negate) => {
                trace!("reduce sign");
                self.operands.push(match right {
                    Node::Number(c) => Node::Number(-c),
                    other => Node::binary(Operator::Subtract, Node::Number(0.0), other)
                });
                return Ok(())
            },
            _ => return Err(ParseError::MalformedExpression("operand without operator"))
        };
        let left = self.operands.pop().unwrap_or(Node::Number(1.0));
        trace!(op = ?op, "reduce");
        self.operands.push(Node::binary(op, left, right));
        Ok(())
    }

    // Reduce everything that binds at least as tightly, then wait for the right operand.
    // Equal precedence reduces first, so every operator (^ included) is left-associative.
    fn push_operator(&mut self, op: Operator) -> Result<(), ParseError> {
        while let Some(top) = self.operators.last().and_then(|top| top.strength()) {
            if top < op.precedence() * 2 {
                break
            }
            self.reduce()?;
        }
        self.operators.push(Pending::Op(op));
        self.expect_operand = true;
        Ok(())
    }

    fn close_group(&mut self, position: usize) -> Result<(), ParseError> {
        loop {
            match self.operators.last().copied() {
                Some(Pending::LeftParenthesis(_)) => {
                    self.operators.pop();
                    break
                },
                Some(Pending::Op(_) | Pending::Negate) => self.reduce()?,
                None => return Err(ParseError::UnbalancedParentheses { position })
            }
        }
        self.expect_operand = false;
        Ok(())
    }

    // A literal written directly against a name ("3x", "2sin(x)") multiplies it
    fn follows_coefficient(&self, position: usize) -> bool {
        match self.position.checked_sub(2).map(|i| &self.tokens[i]) {
            Some((start, Token::Number(n))) => start + n.chars().count() == position,
            _ => false
        }
    }

    fn identifier(&mut self, position: usize, name: InlinableString) -> Result<(), ParseError> {
        if self.follows_coefficient(position) {
            self.push_operator(Operator::Multiply)?;
        }
        let tokens = self.tokens;
        let kind = FunctionKind::from_name(&name);
        match tokens.get(self.position) {
            Some(&(open_position, Token::OpenBracket)) => {
                let kind = kind.ok_or_else(|| ParseError::UnknownFunctionName(name.clone()))?;
                let close = find_matching_close(tokens, self.position)
                    .ok_or(ParseError::UnbalancedParentheses { position: open_position })?;
                let argument = parse_tokens(&tokens[self.position + 1..close])?;
                self.position = close + 1;
                self.push_operand(Node::function(kind, argument));
            },
            _ => {
                // "sin x" or "sinx" is a call missing its brackets, not the variable
                let lowered = name.to_lowercase();
                if FunctionKind::ALL.iter().any(|k| lowered.starts_with(k.name())) {
                    return Err(ParseError::MalformedExpression("function name without a parenthesised argument"))
                }
                // every other name is the single free variable
                self.push_operand(Node::Variable);
            }
        }
        Ok(())
    }

    fn run(mut self) -> Result<Node, ParseError> {
        while let Some((position, token)) = self.tokens.get(self.position).cloned() {
            self.position += 1;
            match token {
                Token::Number(text) => {
                    let value = f64::from_str(&text).map_err(|_| ParseError::MalformedExpression("invalid number"))?;
                    self.push_operand(Node::Number(value));
                },
                Token::Identifier(name) => self.identifier(position, name)?,
                // sign where an operand is expected: binds tighter than * and / but looser than ^
                Token::Op(Operator::Subtract) if self.expect_operand => self.operators.push(Pending::Negate),
                Token::Op(Operator::Add) if self.expect_operand => (),
                Token::Op(op) => self.push_operator(op)?,
                Token::OpenBracket => {
                    self.operators.push(Pending::LeftParenthesis(position));
                    self.expect_operand = true;
                },
                Token::CloseBracket => self.close_group(position)?
            }
        }
        while let Some(top) = self.operators.last().copied() {
            match top {
                Pending::LeftParenthesis(position) => return Err(ParseError::UnbalancedParentheses { position }),
                Pending::Op(_) | Pending::Negate => self.reduce()?
            }
        }
        match (self.operands.pop(), self.operands.is_empty()) {
            (Some(result), true) => Ok(result),
            _ => Err(ParseError::MalformedExpression("expected exactly one result"))
        }
    }
}

fn parse_tokens(tokens: &[Lexeme]) -> Result<Node, ParseError> {
    Parser::new(tokens).run()
}

pub fn parse(input: &str) -> Result<Node, ParseError> {
    let tokens = lex(input)?;
    let result = parse_tokens(&tokens)?;
    debug!(input, tree = %result, "parsed");
    Ok(result)
}

impl FromStr for Node {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}
