//! Design codes: the human-readable `XXXX-XXXX-XXXX` form of a design id.
//!
//! A code is a 12-digit base-30 number written with the configured alphabet
//! (digits plus consonants that are hard to confuse), most significant digit
//! first, in three hyphen-separated groups of four.
//!
//! ```
//! use design_codec::code::{code_to_id, id_to_code};
//!
//! let id = code_to_id("0000-0000-0010").unwrap();
//! assert_eq!(id, 30);
//! assert_eq!(id_to_code(id).unwrap(), "0000-0000-0010");
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::{CodecConfig, CODE_GROUPS, CODE_GROUP_LEN, CODE_LEN};
use crate::error::DesignError;

/// Numeric design id, always below `30^12`.
pub type DesignId = u64;

/// Validated design code in canonical grouped form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DesignCode(String);

impl DesignCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DesignCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DesignCode {
    type Err = DesignError;

    /// Parse against the default alphabet.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CodeIdentity::standard().validate(s)?;
        Ok(DesignCode(s.to_string()))
    }
}

/// Bijection between design ids and design codes for one alphabet.
#[derive(Debug, Clone)]
pub struct CodeIdentity {
    symbols: Vec<char>,
    pattern: Regex,
    limit: u64,
}

impl CodeIdentity {
    /// Build from the configured alphabet. The alphabet is assumed to have
    /// passed `CodecConfig::validate`.
    pub fn new(config: &CodecConfig) -> Self {
        let symbols: Vec<char> = config.codec.alphabet.chars().collect();
        let class = format!("[{}]{{{}}}", regex::escape(&config.codec.alphabet), CODE_GROUP_LEN);
        let grouped = vec![class; CODE_GROUPS].join("-");
        let pattern = Regex::new(&format!("^{}$", grouped)).expect("escaped alphabet forms a valid pattern");
        let limit = (symbols.len() as u64).pow(CODE_LEN as u32);
        Self { symbols, pattern, limit }
    }

    /// Shared identity for the default alphabet, built on first use.
    pub fn standard() -> &'static CodeIdentity {
        static STANDARD: OnceLock<CodeIdentity> = OnceLock::new();
        STANDARD.get_or_init(|| CodeIdentity::new(&CodecConfig::default()))
    }

    /// Number of representable ids (`30^12` for the standard alphabet)
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// The validation pattern, without anchors
    pub fn pattern(&self) -> &str {
        let full = self.pattern.as_str();
        full.trim_start_matches('^').trim_end_matches('$')
    }

    fn malformed(&self, code: &str) -> DesignError {
        DesignError::MalformedCode {
            code: code.to_string(),
            pattern: self.pattern().to_string(),
        }
    }

    /// Check the grouped shape and alphabet without computing the id.
    pub fn validate(&self, code: &str) -> Result<(), DesignError> {
        if self.pattern.is_match(code) {
            Ok(())
        } else {
            Err(self.malformed(code))
        }
    }

    /// Decode a grouped design code into its id.
    pub fn decode(&self, code: &str) -> Result<DesignId, DesignError> {
        self.validate(code)?;

        let base = self.symbols.len() as u64;
        let mut id: u64 = 0;
        for c in code.chars().filter(|c| *c != '-') {
            let value = self
                .symbols
                .iter()
                .position(|s| *s == c)
                .ok_or_else(|| self.malformed(code))?;
            id = id * base + value as u64;
        }
        Ok(id)
    }

    /// Encode an id as a zero-padded grouped code.
    pub fn encode(&self, id: DesignId) -> Result<DesignCode, DesignError> {
        if id >= self.limit {
            return Err(DesignError::IdOutOfRange { id, limit: self.limit });
        }

        let base = self.symbols.len() as u64;
        let mut digits = [self.symbols[0]; CODE_LEN];
        let mut rest = id;
        for slot in digits.iter_mut().rev() {
            *slot = self.symbols[(rest % base) as usize];
            rest /= base;
        }

        let groups: Vec<String> = digits
            .chunks(CODE_GROUP_LEN)
            .map(|group| group.iter().collect())
            .collect();
        Ok(DesignCode(groups.join("-")))
    }
}

/// Decode a code with the default alphabet.
pub fn code_to_id(code: &str) -> Result<DesignId, DesignError> {
    CodeIdentity::standard().decode(code)
}

/// Encode an id with the default alphabet.
pub fn id_to_code(id: DesignId) -> Result<String, DesignError> {
    CodeIdentity::standard().encode(id).map(|code| code.0)
}
