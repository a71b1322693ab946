//! Amazon storefront domains and locale conventions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported Amazon storefronts with their domains and locale conventions.
///
/// The short code (`us`, `uk`, ...) is also the `marketplace` value carried
/// in uploaded review batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    #[default]
    Us,
    Uk,
    De,
    Fr,
    Es,
    It,
    Ca,
    Au,
    Jp,
    In,
    Br,
    Mx,
    Nl,
    Se,
    Pl,
}

impl Marketplace {
    /// Returns the short storefront code, e.g. `us`.
    pub fn code(&self) -> &'static str {
        match self {
            Marketplace::Us => "us",
            Marketplace::Uk => "uk",
            Marketplace::De => "de",
            Marketplace::Fr => "fr",
            Marketplace::Es => "es",
            Marketplace::It => "it",
            Marketplace::Ca => "ca",
            Marketplace::Au => "au",
            Marketplace::Jp => "jp",
            Marketplace::In => "in",
            Marketplace::Br => "br",
            Marketplace::Mx => "mx",
            Marketplace::Nl => "nl",
            Marketplace::Se => "se",
            Marketplace::Pl => "pl",
        }
    }

    /// Returns the Amazon domain for this storefront.
    pub fn domain(&self) -> &'static str {
        match self {
            Marketplace::Us => "amazon.com",
            Marketplace::Uk => "amazon.co.uk",
            Marketplace::De => "amazon.de",
            Marketplace::Fr => "amazon.fr",
            Marketplace::Es => "amazon.es",
            Marketplace::It => "amazon.it",
            Marketplace::Ca => "amazon.ca",
            Marketplace::Au => "amazon.com.au",
            Marketplace::Jp => "amazon.co.jp",
            Marketplace::In => "amazon.in",
            Marketplace::Br => "amazon.com.br",
            Marketplace::Mx => "amazon.com.mx",
            Marketplace::Nl => "amazon.nl",
            Marketplace::Se => "amazon.se",
            Marketplace::Pl => "amazon.pl",
        }
    }

    /// Returns the base URL review-listing paths are appended to.
    pub fn base_url(&self) -> String {
        format!("https://www.{}", self.domain())
    }

    /// Returns the currency code shown next to prices on this storefront.
    pub fn currency(&self) -> &'static str {
        match self {
            Marketplace::Us => "USD",
            Marketplace::Uk => "GBP",
            Marketplace::De
            | Marketplace::Fr
            | Marketplace::Es
            | Marketplace::It
            | Marketplace::Nl => "EUR",
            Marketplace::Ca => "CAD",
            Marketplace::Au => "AUD",
            Marketplace::Jp => "JPY",
            Marketplace::In => "INR",
            Marketplace::Br => "BRL",
            Marketplace::Mx => "MXN",
            Marketplace::Se => "SEK",
            Marketplace::Pl => "PLN",
        }
    }

    /// Returns the Accept-Language header value for this storefront.
    pub fn accept_language(&self) -> &'static str {
        match self {
            Marketplace::Us | Marketplace::Ca | Marketplace::Au => "en-US,en;q=0.9",
            Marketplace::Uk => "en-GB,en;q=0.9",
            Marketplace::De => "de-DE,de;q=0.9,en;q=0.8",
            Marketplace::Fr => "fr-FR,fr;q=0.9,en;q=0.8",
            Marketplace::Es | Marketplace::Mx => "es-ES,es;q=0.9,en;q=0.8",
            Marketplace::It => "it-IT,it;q=0.9,en;q=0.8",
            Marketplace::Jp => "ja-JP,ja;q=0.9,en;q=0.8",
            Marketplace::In => "en-IN,en;q=0.9,hi;q=0.8",
            Marketplace::Br => "pt-BR,pt;q=0.9,en;q=0.8",
            Marketplace::Nl => "nl-NL,nl;q=0.9,en;q=0.8",
            Marketplace::Se => "sv-SE,sv;q=0.9,en;q=0.8",
            Marketplace::Pl => "pl-PL,pl;q=0.9,en;q=0.8",
        }
    }

    /// Returns whether this storefront writes decimals with a comma.
    ///
    /// Average-rating text like `4,3 von 5` needs the comma normalized
    /// before parsing.
    pub fn uses_comma_decimal(&self) -> bool {
        matches!(
            self,
            Marketplace::De
                | Marketplace::Fr
                | Marketplace::Es
                | Marketplace::It
                | Marketplace::Nl
                | Marketplace::Se
                | Marketplace::Pl
                | Marketplace::Br
        )
    }

    /// Returns all supported storefronts.
    pub fn all() -> &'static [Marketplace] {
        &[
            Marketplace::Us,
            Marketplace::Uk,
            Marketplace::De,
            Marketplace::Fr,
            Marketplace::Es,
            Marketplace::It,
            Marketplace::Ca,
            Marketplace::Au,
            Marketplace::Jp,
            Marketplace::In,
            Marketplace::Br,
            Marketplace::Mx,
            Marketplace::Nl,
            Marketplace::Se,
            Marketplace::Pl,
        ]
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Marketplace {
    type Err = MarketplaceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "us" | "usa" | "united states" => Ok(Marketplace::Us),
            "uk" | "gb" | "united kingdom" => Ok(Marketplace::Uk),
            "de" | "germany" => Ok(Marketplace::De),
            "fr" | "france" => Ok(Marketplace::Fr),
            "es" | "spain" => Ok(Marketplace::Es),
            "it" | "italy" => Ok(Marketplace::It),
            "ca" | "canada" => Ok(Marketplace::Ca),
            "au" | "australia" => Ok(Marketplace::Au),
            "jp" | "japan" => Ok(Marketplace::Jp),
            "in" | "india" => Ok(Marketplace::In),
            "br" | "brazil" => Ok(Marketplace::Br),
            "mx" | "mexico" => Ok(Marketplace::Mx),
            "nl" | "netherlands" => Ok(Marketplace::Nl),
            "se" | "sweden" => Ok(Marketplace::Se),
            "pl" | "poland" => Ok(Marketplace::Pl),
            _ => Err(MarketplaceParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarketplaceParseError(String);

impl fmt::Display for MarketplaceParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown marketplace '{}'. Valid marketplaces: us, uk, de, fr, es, it, ca, au, jp, in, br, mx, nl, se, pl",
            self.0
        )
    }
}

impl std::error::Error for MarketplaceParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marketplace_parsing() {
        assert_eq!(Marketplace::from_str("us").unwrap(), Marketplace::Us);
        assert_eq!(Marketplace::from_str("usa").unwrap(), Marketplace::Us);
        assert_eq!(
            Marketplace::from_str("united states").unwrap(),
            Marketplace::Us
        );
        assert_eq!(Marketplace::from_str("gb").unwrap(), Marketplace::Uk);
        assert_eq!(Marketplace::from_str("germany").unwrap(), Marketplace::De);
        assert_eq!(Marketplace::from_str("japan").unwrap(), Marketplace::Jp);
        assert_eq!(Marketplace::from_str("brazil").unwrap(), Marketplace::Br);

        // Case insensitive
        assert_eq!(Marketplace::from_str("US").unwrap(), Marketplace::Us);
        assert_eq!(Marketplace::from_str("GERMANY").unwrap(), Marketplace::De);

        // Invalid
        assert!(Marketplace::from_str("invalid").is_err());
        assert!(Marketplace::from_str("").is_err());
    }

    #[test]
    fn test_code_round_trips_through_from_str() {
        for mp in Marketplace::all() {
            assert_eq!(Marketplace::from_str(mp.code()).unwrap(), *mp);
            assert_eq!(mp.to_string(), mp.code());
        }
    }

    #[test]
    fn test_marketplace_domains() {
        assert_eq!(Marketplace::Us.domain(), "amazon.com");
        assert_eq!(Marketplace::Uk.domain(), "amazon.co.uk");
        assert_eq!(Marketplace::De.domain(), "amazon.de");
        assert_eq!(Marketplace::Au.domain(), "amazon.com.au");
        assert_eq!(Marketplace::Jp.domain(), "amazon.co.jp");
        assert_eq!(Marketplace::Br.domain(), "amazon.com.br");
        assert_eq!(Marketplace::Mx.domain(), "amazon.com.mx");
    }

    #[test]
    fn test_marketplace_base_url() {
        assert_eq!(Marketplace::Us.base_url(), "https://www.amazon.com");
        assert_eq!(Marketplace::Uk.base_url(), "https://www.amazon.co.uk");
        assert_eq!(Marketplace::De.base_url(), "https://www.amazon.de");
    }

    #[test]
    fn test_marketplace_currencies() {
        assert_eq!(Marketplace::Us.currency(), "USD");
        assert_eq!(Marketplace::Uk.currency(), "GBP");
        assert_eq!(Marketplace::De.currency(), "EUR");
        assert_eq!(Marketplace::Fr.currency(), "EUR");
        assert_eq!(Marketplace::Jp.currency(), "JPY");
        assert_eq!(Marketplace::Se.currency(), "SEK");
    }

    #[test]
    fn test_accept_language() {
        assert!(Marketplace::Us.accept_language().contains("en-US"));
        assert!(Marketplace::Uk.accept_language().contains("en-GB"));
        assert!(Marketplace::De.accept_language().contains("de-DE"));
        assert!(Marketplace::Jp.accept_language().contains("ja-JP"));
        assert!(Marketplace::Br.accept_language().contains("pt-BR"));
    }

    #[test]
    fn test_comma_decimal_convention() {
        // Period-decimal storefronts
        assert!(!Marketplace::Us.uses_comma_decimal());
        assert!(!Marketplace::Uk.uses_comma_decimal());
        assert!(!Marketplace::Jp.uses_comma_decimal());
        assert!(!Marketplace::Mx.uses_comma_decimal());

        // Comma-decimal storefronts
        assert!(Marketplace::De.uses_comma_decimal());
        assert!(Marketplace::Fr.uses_comma_decimal());
        assert!(Marketplace::Se.uses_comma_decimal());
        assert!(Marketplace::Br.uses_comma_decimal());
    }

    #[test]
    fn test_marketplace_all() {
        let all = Marketplace::all();
        assert_eq!(all.len(), 15);
        assert!(all.contains(&Marketplace::Us));
        assert!(all.contains(&Marketplace::Pl));
    }

    #[test]
    fn test_marketplace_default() {
        assert_eq!(Marketplace::default(), Marketplace::Us);
    }

    #[test]
    fn test_parse_error_display() {
        let err = Marketplace::from_str("xyz").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("xyz"));
        assert!(msg.contains("Valid marketplaces"));
    }

    #[test]
    fn test_marketplace_serde() {
        let mp = Marketplace::Us;
        let json = serde_json::to_string(&mp).unwrap();
        assert_eq!(json, "\"us\"");

        let parsed: Marketplace = serde_json::from_str("\"uk\"").unwrap();
        assert_eq!(parsed, Marketplace::Uk);
    }
}
