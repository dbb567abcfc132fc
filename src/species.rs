use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::KiraError;

/// Common names accepted in place of a taxid.
pub const SPECIES_MAP: &[(&str, &str)] = &[
    ("human", "9606"),
    ("mouse", "10090"),
    ("rat", "10116"),
    ("fruitfly", "7227"),
    ("nematode", "6239"),
    ("zebrafish", "7955"),
    ("thale-cress", "3702"),
    ("frog", "8364"),
    ("pig", "9823"),
];

const ALL_SPECIES: &str = "all";

/// Normalized species filter. Taxids keep the caller's order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Species {
    #[default]
    All,
    Single(String),
    Multiple(Vec<String>),
}

impl Species {
    pub fn from_taxid(taxid: u64) -> Self {
        Species::Single(taxid.to_string())
    }

    pub fn from_items<I, S>(items: I) -> Result<Self, KiraError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut taxids = Vec::new();
        for item in items {
            let trimmed = item.as_ref().trim();
            if trimmed.is_empty() {
                return Err(KiraError::InvalidSpecies(
                    "empty species entry".to_string(),
                ));
            }
            taxids.push(canonical_taxid(trimmed).to_string());
        }

        match taxids.len() {
            0 => Err(KiraError::InvalidSpecies("no species given".to_string())),
            1 => {
                let taxid = taxids.remove(0);
                if taxid == ALL_SPECIES {
                    Ok(Species::All)
                } else {
                    Ok(Species::Single(taxid))
                }
            }
            _ => {
                if taxids.iter().any(|taxid| taxid == ALL_SPECIES) {
                    return Err(KiraError::InvalidSpecies(format!(
                        "'all' cannot be combined with other species: {}",
                        taxids.join(",")
                    )));
                }
                Ok(Species::Multiple(taxids))
            }
        }
    }

    /// Accepts a JSON integer, string or list of integers/strings.
    pub fn from_value(value: &Value) -> Result<Self, KiraError> {
        match value {
            Value::Number(num) => num
                .as_u64()
                .map(Species::from_taxid)
                .ok_or_else(|| KiraError::InvalidSpecies(num.to_string())),
            Value::String(text) => text.parse(),
            Value::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| match item {
                        Value::String(text) => Ok(text.clone()),
                        Value::Number(num) if num.is_u64() => Ok(num.to_string()),
                        other => Err(KiraError::InvalidSpecies(format!(
                            "unsupported species list entry: {other}"
                        ))),
                    })
                    .collect::<Result<Vec<_>, KiraError>>()?;
                Species::from_items(items)
            }
            other => Err(KiraError::InvalidSpecies(format!(
                "species must be an integer, string or list, got {other}"
            ))),
        }
    }

    /// Value sent verbatim as the provider's `species` parameter.
    pub fn query_param(&self) -> String {
        match self {
            Species::All => ALL_SPECIES.to_string(),
            Species::Single(taxid) => taxid.clone(),
            Species::Multiple(taxids) => taxids.join(","),
        }
    }

    pub fn taxid(&self) -> Option<&str> {
        match self {
            Species::Single(taxid) => Some(taxid),
            _ => None,
        }
    }

    /// True when hits may come from more than one organism.
    pub fn spans_multiple(&self) -> bool {
        !matches!(self, Species::Single(_))
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.query_param())
    }
}

impl FromStr for Species {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Species::from_items(value.split(','))
    }
}

impl<'de> Deserialize<'de> for Species {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Species::from_value(&value).map_err(serde::de::Error::custom)
    }
}

fn canonical_taxid(name: &str) -> &str {
    SPECIES_MAP
        .iter()
        .find(|(common, _)| *common == name)
        .map(|(_, taxid)| *taxid)
        .unwrap_or(name)
}
