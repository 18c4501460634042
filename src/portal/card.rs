use crate::{document::Document, Error, Result};
use regex::Regex;
use std::{fmt, str::FromStr, sync::OnceLock};

/// Validity periods, in months, the portal offers.
pub const VALIDITY_MONTHS: [u8; 8] = [3, 6, 9, 12, 15, 18, 21, 24];

/// Amount ceiling of the card, kept as typed (`42`, `19.90`, `19,90`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount(String);

static AMOUNT_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn amount_pattern() -> Option<&'static Regex> {
    AMOUNT_PATTERN
        .get_or_init(|| Regex::new(r"^[0-9]+([.,][0-9]+)?$").ok())
        .as_ref()
}

/// Digits with an optional `.` or `,` decimal part, strictly positive.
#[must_use]
pub fn valid_amount(amount: &str) -> bool {
    let well_formed = amount_pattern().is_some_and(|re| re.is_match(amount));

    well_formed
        && amount
            .replace(',', ".")
            .parse::<f64>()
            .map_or(false, |value| value > 0.0)
}

impl Amount {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Amount {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if valid_amount(s) {
            Ok(Self(s.to_string()))
        } else {
            Err("amount must be a number greater than 0".to_string())
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How long the issued number stays usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validity(u8);

impl Validity {
    /// # Errors
    /// Returns an error if `months` is not one of [`VALIDITY_MONTHS`].
    pub fn new(months: u8) -> std::result::Result<Self, String> {
        if VALIDITY_MONTHS.contains(&months) {
            Ok(Self(months))
        } else {
            Err(format!(
                "validity must be one of {}",
                VALIDITY_MONTHS
                    .iter()
                    .map(u8::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        }
    }

    #[must_use]
    pub const fn months(self) -> u8 {
        self.0
    }
}

impl Default for Validity {
    fn default() -> Self {
        Self(3)
    }
}

impl FromStr for Validity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let months = s
            .trim()
            .parse::<u8>()
            .map_err(|_| format!("invalid validity: {s}"))?;
        Self::new(months)
    }
}

/// A freshly issued single-use card, fields copied verbatim from the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCard {
    pub number: String,
    pub expiry: String,
    pub cvv: String,
    pub owner: String,
}

impl IssuedCard {
    /// # Errors
    /// Returns [`Error::Issuance`] when the page shows the error panel or lacks a field.
    pub fn parse(body: &str) -> Result<Self> {
        let doc = Document::parse(body);
        doc.check_error().map_err(Error::into_issuance)?;

        let card = || -> Result<Self> {
            Ok(Self {
                number: doc.attr("dd#generated-code-dd span[data-drag-txt]", "data-drag-txt")?,
                expiry: doc.text("dl#content-expiration-date dd")?,
                cvv: doc.text("dl#content-cryptogramme span.restricted-only")?,
                owner: doc.text("dl#content-card-owner span.restricted-only")?,
            })
        };

        card().map_err(Error::into_issuance)
    }
}

impl fmt::Display for IssuedCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Card number : {}", self.number)?;
        writeln!(f, "Expired at  : {}", self.expiry)?;
        writeln!(f, "CVV         : {}", self.cvv)?;
        write!(f, "Owner       : {}", self.owner)
    }
}
