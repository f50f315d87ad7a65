use serde::{Deserialize, Serialize};

/// Classification vocabulary for rendered text fragments. The host
/// consuming the decoder maps these onto its own token taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Mnemonic,
    Register,
    Immediate,
    Address,
    Separator,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn mnemonic(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Mnemonic, text)
    }

    pub fn register(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Register, text)
    }

    pub fn immediate(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Immediate, text)
    }

    pub fn address(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Address, text)
    }

    pub fn separator(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Separator, text)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Text, text)
    }
}
