//! Restricted arithmetic evaluator for `calculate:` commands.
//!
//! Accepts decimal literals, `+ - * /`, unary signs and parentheses. Nothing
//! else is ever evaluated.

use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("Invalid characters in expression")]
    InvalidCharacters,

    #[error("No expression provided")]
    Empty,

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unexpected '{found}' at position {pos}")]
    UnexpectedToken { found: char, pos: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("division by zero")]
    DivisionByZero,

    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Parentheses and unary signs a single expression may nest.
pub const MAX_DEPTH: usize = 64;

/// Characters an expression may contain at all.
pub fn is_allowed_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '+' | '-' | '*' | '/' | '(' | ')' | '.' | ' ' | '\t' | '\n' | '\r')
}

/// Evaluate an arithmetic expression.
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    if !expression.chars().all(is_allowed_char) {
        return Err(CalcError::InvalidCharacters);
    }
    if expression.trim().is_empty() {
        return Err(CalcError::Empty);
    }

    let mut parser = Parser {
        chars: expression.char_indices().peekable(),
        depth: 0,
    };
    let value = parser.expr()?;
    parser.skip_whitespace();
    match parser.chars.next() {
        None => Ok(value),
        Some((pos, found)) => Err(CalcError::UnexpectedToken { found, pos }),
    }
}

/// Render a result the way users expect to read it: `4` rather than `4.0`.
pub fn format_value(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

struct Parser<'a> {
    chars: Peekable<CharIndices<'a>>,
    depth: usize,
}

impl Parser<'_> {
    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Consume one opening token and run `inner` one level deeper.
    fn nested<T>(&mut self, inner: impl FnOnce(&mut Self) -> Result<T, CalcError>) -> Result<T, CalcError> {
        if self.depth >= MAX_DEPTH {
            return Err(CalcError::TooDeep(MAX_DEPTH));
        }
        self.chars.next();
        self.depth += 1;
        let result = inner(self);
        self.depth -= 1;
        result
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some('+') => {
                    self.chars.next();
                    value += self.term()?;
                }
                Some('-') => {
                    self.chars.next();
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some('*') => {
                    self.chars.next();
                    value *= self.unary()?;
                }
                Some('/') => {
                    self.chars.next();
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    value /= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some('-') => self.nested(|p| p.unary().map(|v| -v)),
            Some('+') => self.nested(Self::unary),
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some('(') => self.nested(|p| {
                let value = p.expr()?;
                match p.peek() {
                    Some(')') => {
                        p.chars.next();
                        Ok(value)
                    }
                    Some(found) => Err(p.unexpected(found)),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }),
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(found) => Err(self.unexpected(found)),
            None => Err(CalcError::UnexpectedEnd),
        }
    }

    fn number(&mut self) -> Result<f64, CalcError> {
        let mut literal = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_digit() || c == '.' {
                literal.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        literal
            .parse::<f64>()
            .map_err(|_| CalcError::InvalidNumber(literal))
    }

    fn unexpected(&mut self, found: char) -> CalcError {
        let pos = self.chars.peek().map(|&(pos, _)| pos).unwrap_or_default();
        CalcError::UnexpectedToken { found, pos }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_arithmetic() {
        assert_eq!(evaluate("2+2"), Ok(4.0));
        assert_eq!(evaluate("10 - 4"), Ok(6.0));
        assert_eq!(evaluate("3 * 4"), Ok(12.0));
        assert_eq!(evaluate("7 / 2"), Ok(3.5));
    }

    #[test]
    fn test_precedence_and_parentheses() {
        assert_eq!(evaluate("2 + 3 * 4"), Ok(14.0));
        assert_eq!(evaluate("(2 + 3) * 4"), Ok(20.0));
        assert_eq!(evaluate("100 / 10 / 5"), Ok(2.0));
        assert_eq!(evaluate("10 - 4 - 3"), Ok(3.0));
        assert_eq!(evaluate("((1))"), Ok(1.0));
    }

    #[test]
    fn test_unary_signs() {
        assert_eq!(evaluate("-3 + 5"), Ok(2.0));
        assert_eq!(evaluate("-(2 * 3)"), Ok(-6.0));
        assert_eq!(evaluate("4 * -2"), Ok(-8.0));
        assert_eq!(evaluate("+1.5"), Ok(1.5));
    }

    #[test]
    fn test_decimals() {
        assert_eq!(evaluate("0.5 + .25"), Ok(0.75));
        assert_eq!(evaluate("1.2.3"), Err(CalcError::InvalidNumber("1.2.3".to_string())));
    }

    #[test]
    fn test_whitespace_is_ignored() {
        assert_eq!(evaluate(" 1 +\t2\n* 3 "), Ok(7.0));
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(evaluate("2+a"), Err(CalcError::InvalidCharacters));
        assert_eq!(evaluate("__import__('os')"), Err(CalcError::InvalidCharacters));
        assert_eq!(evaluate("2^3"), Err(CalcError::InvalidCharacters));
    }

    #[test]
    fn test_malformed_expressions() {
        assert_eq!(evaluate("2+"), Err(CalcError::UnexpectedEnd));
        assert_eq!(evaluate("(2+3"), Err(CalcError::UnexpectedEnd));
        assert!(matches!(evaluate("2 3"), Err(CalcError::UnexpectedToken { found: '3', .. })));
        assert!(matches!(evaluate("2)"), Err(CalcError::UnexpectedToken { found: ')', .. })));
        assert!(matches!(evaluate("*2"), Err(CalcError::UnexpectedToken { found: '*', .. })));
        // Exponentiation is outside the grammar
        assert!(evaluate("2**3").is_err());
        assert_eq!(evaluate("."), Err(CalcError::InvalidNumber(".".to_string())));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(evaluate("1/0"), Err(CalcError::DivisionByZero));
        assert_eq!(evaluate("5 / (2 - 2)"), Err(CalcError::DivisionByZero));
    }

    #[test]
    fn test_nesting_limit() {
        let deep_parens = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(evaluate(&deep_parens), Err(CalcError::TooDeep(MAX_DEPTH)));
        assert_eq!(evaluate(&"(".repeat(10_000)), Err(CalcError::TooDeep(MAX_DEPTH)));
        assert_eq!(
            evaluate(&format!("{}1", "-".repeat(10_000))),
            Err(CalcError::TooDeep(MAX_DEPTH))
        );

        // Right at the limit still evaluates
        let at_limit = format!("{}1{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert_eq!(evaluate(&at_limit), Ok(1.0));
        assert_eq!(evaluate(&format!("{}1", "-".repeat(MAX_DEPTH))), Ok(1.0));
        // Sibling groups do not accumulate depth
        let wide = vec!["(1)"; 500].join("+");
        assert_eq!(evaluate(&wide), Ok(500.0));
    }

    #[test]
    fn test_empty() {
        assert_eq!(evaluate(""), Err(CalcError::Empty));
        assert_eq!(evaluate("   "), Err(CalcError::Empty));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(4.0), "4");
        assert_eq!(format_value(-6.0), "-6");
        assert_eq!(format_value(3.5), "3.5");
        assert_eq!(format_value(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_value(1e20), "100000000000000000000");
    }
}
