//! Gameplay modifiers accepted by the scoring endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ValidationError;

/// A mod from the fixed whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModToken {
    HD,
    HR,
    DT,
    FL,
    NF,
    EZ,
    HT,
    SO,
}

impl ModToken {
    pub const ALL: [ModToken; 8] = [
        ModToken::HD,
        ModToken::HR,
        ModToken::DT,
        ModToken::FL,
        ModToken::NF,
        ModToken::EZ,
        ModToken::HT,
        ModToken::SO,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModToken::HD => "HD",
            ModToken::HR => "HR",
            ModToken::DT => "DT",
            ModToken::FL => "FL",
            ModToken::NF => "NF",
            ModToken::EZ => "EZ",
            ModToken::HT => "HT",
            ModToken::SO => "SO",
        }
    }
}

impl fmt::Display for ModToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModToken {
    type Err = ValidationError;

    /// Exact, upper-case match only; normalization happens in [`parse_mods`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModToken::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidMods(s.to_string()))
    }
}

/// Normalize a comma separated mods field into an ordered mod list.
///
/// The field is upper-cased, split on `,`, and empty tokens are dropped. Every
/// remaining token has to be on the whitelist or the whole list is rejected.
/// Repeated mods keep their first position.
pub fn parse_mods(input: &str) -> Result<Vec<ModToken>, ValidationError> {
    let upper = input.to_uppercase();
    let mut mods = Vec::new();

    for token in upper.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let m: ModToken = token.parse()?;
        if !mods.contains(&m) {
            mods.push(m);
        }
    }

    Ok(mods)
}

/// Render mods the way the results view shows them ("HDHR", or "None").
pub fn format_mods(mods: &[ModToken]) -> String {
    if mods.is_empty() {
        return "None".to_string();
    }
    mods.iter().map(ModToken::as_str).collect()
}
