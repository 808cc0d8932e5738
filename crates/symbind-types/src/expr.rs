//! Array-size expression evaluation.
//!
//! Array sizes are kept as written (`1024*3+1`, `ImGuiKey_COUNT`). This
//! evaluator exists only to check such an expression against a numeric size
//! reported by the metadata; its result never replaces the expression text.
//!
//! Supported: integer literals (decimal or hex), identifiers resolved through
//! a caller-supplied lookup, parentheses, unary `-`/`+`, and the binary
//! operators `* /` (tightest), `+ -`, then `^` (bitwise xor). Division must be
//! exact.

use crate::parser::{ParseError, ParseResult};

/// Evaluate `expr`, resolving identifiers through `constants`.
pub fn evaluate<F>(expr: &str, constants: F) -> ParseResult<i64>
where
    F: Fn(&str) -> Option<i64>,
{
    let mut evaluator = Evaluator {
        src: expr,
        pos: 0,
        constants: &constants,
    };
    let value = evaluator.xor()?;
    evaluator.skip_whitespace();
    if evaluator.pos < expr.len() {
        return Err(evaluator.error(format!(
            "unexpected trailing input '{}'",
            &expr[evaluator.pos..]
        )));
    }
    Ok(value)
}

/// Evaluate an expression that must not reference any identifier.
pub fn evaluate_literal(expr: &str) -> ParseResult<i64> {
    evaluate(expr, |_| None)
}

struct Evaluator<'a, F> {
    src: &'a str,
    pos: usize,
    constants: &'a F,
}

impl<'a, F> Evaluator<'a, F>
where
    F: Fn(&str) -> Option<i64>,
{
    fn error(&self, reason: String) -> ParseError {
        ParseError::UnresolvableArithmetic {
            expr: self.src.to_string(),
            reason,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }
    }

    fn eat(&mut self, ch: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn overflow(&self) -> ParseError {
        self.error("arithmetic overflow".to_string())
    }

    fn xor(&mut self) -> ParseResult<i64> {
        let mut value = self.additive()?;
        while self.eat('^') {
            value ^= self.additive()?;
        }
        Ok(value)
    }

    fn additive(&mut self) -> ParseResult<i64> {
        let mut value = self.multiplicative()?;
        loop {
            if self.eat('+') {
                let rhs = self.multiplicative()?;
                value = value.checked_add(rhs).ok_or_else(|| self.overflow())?;
            } else if self.eat('-') {
                let rhs = self.multiplicative()?;
                value = value.checked_sub(rhs).ok_or_else(|| self.overflow())?;
            } else {
                return Ok(value);
            }
        }
    }

    fn multiplicative(&mut self) -> ParseResult<i64> {
        let mut value = self.unary()?;
        loop {
            if self.eat('*') {
                let rhs = self.unary()?;
                value = value.checked_mul(rhs).ok_or_else(|| self.overflow())?;
            } else if self.eat('/') {
                let rhs = self.unary()?;
                if rhs == 0 {
                    return Err(self.error("division by zero".to_string()));
                }
                if value.checked_rem(rhs).ok_or_else(|| self.overflow())? != 0 {
                    return Err(self.error(format!("{} / {} is not exact", value, rhs)));
                }
                value = value.checked_div(rhs).ok_or_else(|| self.overflow())?;
            } else {
                return Ok(value);
            }
        }
    }

    fn unary(&mut self) -> ParseResult<i64> {
        if self.eat('-') {
            let value = self.unary()?;
            return value.checked_neg().ok_or_else(|| self.overflow());
        }
        if self.eat('+') {
            return self.unary();
        }
        self.primary()
    }

    fn primary(&mut self) -> ParseResult<i64> {
        self.skip_whitespace();
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let value = self.xor()?;
                if !self.eat(')') {
                    return Err(self.error("unbalanced parenthesis".to_string()));
                }
                Ok(value)
            }
            Some(ch) if ch.is_ascii_digit() => self.number(),
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => self.identifier(),
            Some(ch) => Err(self.error(format!("unexpected character '{}'", ch))),
            None => Err(self.error("unexpected end of expression".to_string())),
        }
    }

    fn number(&mut self) -> ParseResult<i64> {
        let rest = &self.src[self.pos..];
        let (digits, radix, prefix_len) =
            if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
                (hex, 16, 2)
            } else {
                (rest, 10, 0)
            };
        let len = digits
            .find(|c: char| !c.is_digit(radix))
            .unwrap_or(digits.len());
        let text = &digits[..len];
        let value = i64::from_str_radix(text, radix)
            .map_err(|_| self.error(format!("invalid number '{}'", text)))?;
        self.pos += prefix_len + len;

        // Integer suffixes carry no value.
        while let Some(ch) = self.peek() {
            if matches!(ch, 'u' | 'U' | 'l' | 'L') {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(value)
    }

    fn identifier(&mut self) -> ParseResult<i64> {
        let rest = &self.src[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let name = &rest[..len];
        self.pos += len;
        (self.constants)(name).ok_or_else(|| self.error(format!("unknown constant '{}'", name)))
    }
}
