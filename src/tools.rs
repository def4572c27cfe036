//! Local tools offered to the agent
//!
//! `calculate` evaluates plain arithmetic; `count_characters` counts a
//! character case-insensitively. Both always return a string for the model,
//! failures included.

use crate::agent::Tool;
use serde_json::{Value, json};
use std::fmt;

/// Number produced by the evaluator
///
/// Integer arithmetic stays integral; true division and decimal literals
/// produce floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Int(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }
}

/// Shortest round-trip float text, exponent form outside `[1e-4, 1e16)`
fn format_float(x: f64) -> String {
    let magnitude = x.abs();
    if x != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let scientific = format!("{:e}", x);
        let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.unsigned_abs())
    } else if x.fract() == 0.0 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) => f.write_str(&format_float(*x)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Number),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    Power,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.' || chars[i] == '_') {
                    i += 1;
                }
                if matches!(chars.get(i), Some('e' | 'E')) {
                    let digits_at = match chars.get(i + 1) {
                        Some('+' | '-') => i + 2,
                        _ => i + 1,
                    };
                    if chars.get(digits_at).is_some_and(char::is_ascii_digit) {
                        i = digits_at;
                        while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '_') {
                            i += 1;
                        }
                    }
                }
                let literal: String = chars[start..i].iter().filter(|c| **c != '_').collect();
                let number = if literal.contains(['.', 'e', 'E']) {
                    literal
                        .parse::<f64>()
                        .map(Number::Float)
                        .map_err(|_| format!("invalid number literal '{}'", literal))?
                } else {
                    literal
                        .parse::<i64>()
                        .map(Number::Int)
                        .map_err(|_| format!("integer literal too large '{}'", literal))?
                };
                tokens.push(Token::Num(number));
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Power);
                i += 2;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                tokens.push(Token::DoubleSlash);
                i += 2;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }

    Ok(tokens)
}

fn overflow() -> String {
    "integer overflow".to_string()
}

fn floor_mod_float(a: f64, b: f64) -> f64 {
    a - b * (a / b).floor()
}

fn apply(op: &Token, lhs: Number, rhs: Number) -> Result<Number, String> {
    use Number::{Float, Int};

    if matches!(op, Token::Slash | Token::DoubleSlash | Token::Percent) && rhs.is_zero() {
        return Err("division by zero".to_string());
    }

    let result = match (op, lhs, rhs) {
        (Token::Plus, Int(a), Int(b)) => Int(a.checked_add(b).ok_or_else(overflow)?),
        (Token::Minus, Int(a), Int(b)) => Int(a.checked_sub(b).ok_or_else(overflow)?),
        (Token::Star, Int(a), Int(b)) => Int(a.checked_mul(b).ok_or_else(overflow)?),
        (Token::DoubleSlash, Int(a), Int(b)) => {
            let q = a.checked_div(b).ok_or_else(overflow)?;
            if a % b != 0 && ((a < 0) != (b < 0)) {
                Int(q - 1)
            } else {
                Int(q)
            }
        }
        (Token::Percent, Int(a), Int(b)) => {
            let mut r = a.checked_rem(b).ok_or_else(overflow)?;
            if r != 0 && ((r < 0) != (b < 0)) {
                r += b;
            }
            Int(r)
        }
        (Token::Power, Int(a), Int(b)) if b >= 0 => {
            let exp = u32::try_from(b).map_err(|_| overflow())?;
            Int(a.checked_pow(exp).ok_or_else(overflow)?)
        }
        (Token::Plus, a, b) => Float(a.as_f64() + b.as_f64()),
        (Token::Minus, a, b) => Float(a.as_f64() - b.as_f64()),
        (Token::Star, a, b) => Float(a.as_f64() * b.as_f64()),
        (Token::Slash, a, b) => Float(a.as_f64() / b.as_f64()),
        (Token::DoubleSlash, a, b) => Float((a.as_f64() / b.as_f64()).floor()),
        (Token::Percent, a, b) => Float(floor_mod_float(a.as_f64(), b.as_f64())),
        (Token::Power, a, b) => {
            if a.is_zero() && b.as_f64() < 0.0 {
                return Err("zero cannot be raised to a negative power".to_string());
            }
            Float(a.as_f64().powf(b.as_f64()))
        }
        (other, _, _) => return Err(format!("unexpected operator {:?}", other)),
    };

    match result {
        Float(f) if !f.is_finite() => Err("result out of range".to_string()),
        ok => Ok(ok),
    }
}

/// Deepest nesting of parentheses, signs and exponents accepted
const MAX_NESTING: usize = 256;

/// Recursive-descent evaluator with the usual arithmetic precedence
///
/// `**` binds tighter than unary minus and is right-associative, so
/// `-2 ** 2` is `-4` and `2 ** 3 ** 2` is `512`.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, String>,
    ) -> Result<T, String> {
        if self.depth >= MAX_NESTING {
            return Err("expression nested too deeply".to_string());
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Result<Number, String> {
        let mut value = self.term()?;
        while let Some(op) = self.peek().filter(|t| matches!(t, Token::Plus | Token::Minus)).cloned() {
            self.pos += 1;
            let rhs = self.term()?;
            value = apply(&op, value, rhs)?;
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<Number, String> {
        let mut value = self.unary()?;
        while let Some(op) = self
            .peek()
            .filter(|t| matches!(t, Token::Star | Token::Slash | Token::DoubleSlash | Token::Percent))
            .cloned()
        {
            self.pos += 1;
            let rhs = self.unary()?;
            value = apply(&op, value, rhs)?;
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<Number, String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                match self.nested(Self::unary)? {
                    Number::Int(i) => Ok(Number::Int(i.checked_neg().ok_or_else(overflow)?)),
                    Number::Float(f) => Ok(Number::Float(-f)),
                }
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.nested(Self::unary)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Number, String> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::Power) {
            self.pos += 1;
            let exponent = self.nested(Self::unary)?;
            return apply(&Token::Power, base, exponent);
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Number, String> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.nested(Self::expr)?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err("missing closing parenthesis".to_string()),
                }
            }
            Some(other) => Err(format!("unexpected token {:?}", other)),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

/// Evaluate an arithmetic expression
pub fn evaluate(expression: &str) -> Result<Number, String> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if parser.pos < parser.tokens.len() {
        return Err("invalid syntax".to_string());
    }
    Ok(value)
}

/// Evaluate an expression and phrase the outcome for the model
pub fn calculate(expression: &str) -> String {
    match evaluate(expression) {
        Ok(value) => format!("Result: {}", value),
        Err(reason) => format!("Error evaluating '{}': {}", expression, reason),
    }
}

/// Count occurrences of `character` in `text`, ignoring case
pub fn count_characters(text: &str, character: &str) -> String {
    let count = text
        .to_lowercase()
        .matches(character.to_lowercase().as_str())
        .count();
    format!(
        "The character '{}' appears {} time(s) in '{}'.",
        character, count, text
    )
}

fn string_arg<'a>(args: &'a Value, name: &str) -> Result<&'a str, String> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("Error: missing string argument '{}'", name))
}

/// Tool wrapper for [`calculate`]
pub struct Calculate;

impl Tool for Calculate {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Evaluate a mathematical expression and return the result."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "An arithmetic expression to evaluate (e.g. '2 + 3 * 4')."
                }
            },
            "required": ["expression"],
            "additionalProperties": false
        })
    }

    fn call(&self, args: &Value) -> String {
        match string_arg(args, "expression") {
            Ok(expression) => calculate(expression),
            Err(message) => message,
        }
    }
}

/// Tool wrapper for [`count_characters`]
pub struct CountCharacters;

impl Tool for CountCharacters {
    fn name(&self) -> &str {
        "count_characters"
    }

    fn description(&self) -> &str {
        "Count how many times a specific character appears in a text."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {"type": "string", "description": "The text to search in."},
                "character": {"type": "string", "description": "The single character to count."}
            },
            "required": ["text", "character"],
            "additionalProperties": false
        })
    }

    fn call(&self, args: &Value) -> String {
        match (string_arg(args, "text"), string_arg(args, "character")) {
            (Ok(text), Ok(character)) => count_characters(text, character),
            (Err(message), _) | (_, Err(message)) => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        assert_eq!(calculate("2 + 3 * 4"), "Result: 14");
        assert_eq!(calculate("(2 + 3) * 4"), "Result: 20");
        assert_eq!(calculate("-2 ** 2"), "Result: -4");
        assert_eq!(calculate("2 ** 3 ** 2"), "Result: 512");
    }

    #[test]
    fn test_train_problem() {
        // 80 km head start, 200 km/h closing speed over the remaining 240 km
        assert_eq!(calculate("240 / 200"), "Result: 1.2");
        assert_eq!(calculate("80 + 80 * 1.2"), "Result: 176.0");
        assert_eq!(calculate("320 / 80"), "Result: 4.0");
    }

    #[test]
    fn test_floor_division_and_modulo() {
        assert_eq!(calculate("7 // 2"), "Result: 3");
        assert_eq!(calculate("-7 // 2"), "Result: -4");
        assert_eq!(calculate("-7 % 3"), "Result: 2");
        assert_eq!(calculate("7 % -3"), "Result: -2");
        assert_eq!(calculate("7.5 // 2"), "Result: 3.0");
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            calculate("1 / 0"),
            "Error evaluating '1 / 0': division by zero"
        );
        assert!(calculate("2 +").starts_with("Error evaluating '2 +'"));
        assert!(calculate("(1 + 2").contains("missing closing parenthesis"));
        assert!(calculate("__import__('os')").starts_with("Error evaluating"));
        assert!(calculate("").contains("empty expression"));
        assert!(calculate("2 ** 100").contains("integer overflow"));
    }

    #[test]
    fn test_float_formatting() {
        assert_eq!(calculate("10 ** 17 / 1"), "Result: 1e+17");
        assert_eq!(calculate("1 / 3"), "Result: 0.3333333333333333");
        assert_eq!(calculate("1 / 40000"), "Result: 2.5e-05");
        assert_eq!(calculate("1 / 10000"), "Result: 0.0001");
        assert_eq!(calculate("1.5 * 10.0 ** 20"), "Result: 1.5e+20");
    }

    #[test]
    fn test_exponent_literals() {
        assert_eq!(calculate("1e3"), "Result: 1000.0");
        assert_eq!(calculate("2.5E-3 * 2"), "Result: 0.005");
        assert_eq!(calculate("1e+2 + 1"), "Result: 101.0");
        assert!(calculate("1e").contains("unexpected character 'e'"));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let parens = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert!(calculate(&parens).ends_with("expression nested too deeply"));

        let signs = format!("{}1", "-".repeat(100_000));
        assert!(calculate(&signs).ends_with("expression nested too deeply"));

        let powers = format!("2{}", " ** 1".repeat(100_000));
        assert!(calculate(&powers).ends_with("expression nested too deeply"));

        let shallow = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(calculate(&shallow), "Result: 1");
    }

    #[test]
    fn test_count_characters() {
        assert_eq!(
            count_characters("Strawberry", "r"),
            "The character 'r' appears 3 time(s) in 'Strawberry'."
        );
        assert_eq!(
            count_characters("Mississippi", "S"),
            "The character 'S' appears 4 time(s) in 'Mississippi'."
        );
    }

    #[test]
    fn test_tool_arguments() {
        assert_eq!(Calculate.call(&json!({"expression": "6 * 7"})), "Result: 42");
        assert!(Calculate.call(&json!({})).contains("'expression'"));
        assert!(CountCharacters.call(&json!({"text": "abc"})).contains("'character'"));
    }
}
