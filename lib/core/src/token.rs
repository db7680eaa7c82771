use crate::lattice::TokenType;
use crate::{Error, Result};
use ordered_float::OrderedFloat;
use serde_json::Value;
use std::fmt;

/// One typed attribute value of a record
///
/// Floats are wrapped in `OrderedFloat` so tokens can key occurrence maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Integer(i64),
    Float(OrderedFloat<f64>),
    Categorical(String),
    /// Textual true/false
    Binary(bool),
    /// Digital 0/1
    BinaryDigital(bool),
    Absent,
}

impl Token {
    #[inline]
    #[must_use]
    pub fn float(value: f64) -> Self {
        Token::Float(OrderedFloat(value))
    }

    #[inline]
    #[must_use]
    pub fn categorical(value: impl Into<String>) -> Self {
        Token::Categorical(value.into())
    }

    #[inline]
    pub fn is_absent(&self) -> bool {
        matches!(self, Token::Absent)
    }

    /// Lattice tag of this token; `Absent` maps to `Missing`
    pub fn token_type(&self) -> TokenType {
        match self {
            Token::Integer(_) => TokenType::Integer,
            Token::Float(_) => TokenType::Float,
            Token::Categorical(_) => TokenType::CategoricalString,
            Token::Binary(_) => TokenType::Binary,
            Token::BinaryDigital(_) => TokenType::BinaryDigital,
            Token::Absent => TokenType::Missing,
        }
    }

    /// Numeric value for `Integer` and `Float` tokens
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Token::Integer(i) => Some(*i as f64),
            Token::Float(f) => Some(f.into_inner()),
            _ => None,
        }
    }

    /// Truth value for both binary flavours
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Token::Binary(b) | Token::BinaryDigital(b) => Some(*b),
            _ => None,
        }
    }

    /// Convert an already-typed JSON scalar into a token of the declared column type.
    ///
    /// `null` becomes `Absent`. No text parsing happens here: a JSON string is only
    /// accepted for categorical columns.
    pub fn from_json(value: &Value, declared: TokenType, column: usize) -> Result<Token> {
        let invalid = |reason: String| Error::InvalidValue { column, reason };
        if value.is_null() {
            return Ok(Token::Absent);
        }
        match declared {
            TokenType::Integer => value
                .as_i64()
                .map(Token::Integer)
                .ok_or_else(|| invalid(format!("expected integer, got {}", value))),
            TokenType::Float => value
                .as_f64()
                .map(Token::float)
                .ok_or_else(|| invalid(format!("expected number, got {}", value))),
            TokenType::CategoricalString => match value {
                Value::String(s) => Ok(Token::Categorical(s.clone())),
                Value::Number(n) => Ok(Token::Categorical(n.to_string())),
                Value::Bool(b) => Ok(Token::Categorical(b.to_string())),
                _ => Err(invalid(format!("expected scalar, got {}", value))),
            },
            TokenType::Binary => value
                .as_bool()
                .map(Token::Binary)
                .ok_or_else(|| invalid(format!("expected boolean, got {}", value))),
            TokenType::BinaryDigital => match value.as_u64() {
                Some(0) => Ok(Token::BinaryDigital(false)),
                Some(1) => Ok(Token::BinaryDigital(true)),
                _ => value
                    .as_bool()
                    .map(Token::BinaryDigital)
                    .ok_or_else(|| invalid(format!("expected 0 or 1, got {}", value))),
            },
            TokenType::Unknown | TokenType::Missing => Err(Error::UnsupportedTokenType {
                token_type: declared,
                what: "JSON conversion".to_string(),
            }),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(i) => write!(f, "{}", i),
            Token::Float(x) => write!(f, "{}", x),
            Token::Categorical(s) => write!(f, "{}", s),
            Token::Binary(b) => write!(f, "{}", b),
            Token::BinaryDigital(b) => write!(f, "{}", u8::from(*b)),
            Token::Absent => f.write_str("null"),
        }
    }
}

impl From<i64> for Token {
    fn from(i: i64) -> Self {
        Token::Integer(i)
    }
}

impl From<f64> for Token {
    fn from(x: f64) -> Self {
        Token::float(x)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Token::Categorical(s.to_string())
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Token::Categorical(s)
    }
}

impl<T: Into<Token>> From<Option<T>> for Token {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Token::Absent)
    }
}
