//! Token identities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Every token the vault can hold or move.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Token {
    /// The pooled liquidity token users stake.
    Lp,
    /// Reward token A.
    Crv,
    /// Reward token B.
    Cvx,
    /// The chain's native coin.
    Native,
    /// Any other fungible token, by symbol.
    Erc20(String),
}

impl Token {
    /// Whether this is one of the two reward tokens.
    pub fn is_reward(&self) -> bool {
        matches!(self, Token::Crv | Token::Cvx)
    }

    /// Whether this is the pooled liquidity token.
    pub fn is_pooled(&self) -> bool {
        matches!(self, Token::Lp)
    }

    /// Whether this token may be allow-listed for conversion.
    ///
    /// Only the native coin and third-party tokens qualify; the pooled token
    /// and the reward tokens never go through the router as deposit input.
    pub fn is_convertible(&self) -> bool {
        matches!(self, Token::Native | Token::Erc20(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Lp => f.write_str("lp"),
            Token::Crv => f.write_str("crv"),
            Token::Cvx => f.write_str("cvx"),
            Token::Native => f.write_str("native"),
            Token::Erc20(symbol) => write!(f, "erc20:{symbol}"),
        }
    }
}

/// Error returned when a token name cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("unknown token: {0}")]
pub struct ParseTokenError(pub String);

impl FromStr for Token {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lp" => Ok(Token::Lp),
            "crv" => Ok(Token::Crv),
            "cvx" => Ok(Token::Cvx),
            "native" => Ok(Token::Native),
            other => match other.strip_prefix("erc20:") {
                Some(symbol) if !symbol.is_empty() => Ok(Token::Erc20(symbol.to_string())),
                _ => Err(ParseTokenError(other.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Token::Lp.is_pooled());
        assert!(Token::Crv.is_reward());
        assert!(Token::Cvx.is_reward());
        assert!(Token::Native.is_convertible());
        assert!(Token::Erc20("WETH".to_string()).is_convertible());
        assert!(!Token::Lp.is_convertible());
        assert!(!Token::Crv.is_convertible());
    }

    #[test]
    fn test_display_parse() {
        for token in [
            Token::Lp,
            Token::Crv,
            Token::Cvx,
            Token::Native,
            Token::Erc20("USDC".to_string()),
        ] {
            let parsed: Token = token.to_string().parse().expect("parse");
            assert_eq!(parsed, token);
        }
    }

    #[test]
    fn test_parse_unknown() {
        assert!("doge".parse::<Token>().is_err());
        assert!("erc20:".parse::<Token>().is_err());
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&Token::Native).expect("serialize");
        assert_eq!(json, "\"native\"");
        let json = serde_json::to_string(&Token::Erc20("WETH".to_string())).expect("serialize");
        assert_eq!(json, r#"{"erc20":"WETH"}"#);
    }
}
