//! Dimension filters for the sales fact table

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the seven categorical axes a forecast can be restricted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Organization,
    Country,
    Region,
    State,
    City,
    ProductLine,
    ProductCategory,
}

impl Dimension {
    /// All dimensions in canonical order
    pub const ALL: [Dimension; 7] = [
        Dimension::Organization,
        Dimension::Country,
        Dimension::Region,
        Dimension::State,
        Dimension::City,
        Dimension::ProductLine,
        Dimension::ProductCategory,
    ];

    /// Fact table column holding this dimension
    pub fn column(self) -> &'static str {
        match self {
            Dimension::Organization => "Sales Organisation",
            Dimension::Country => "Sales Country",
            Dimension::Region => "Sales Region",
            Dimension::State => "Sales State",
            Dimension::City => "Sales City",
            Dimension::ProductLine => "Product Line",
            Dimension::ProductCategory => "Product Category",
        }
    }

    /// Human-readable name used in messages
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Organization => "Sales Organization",
            Dimension::Country => "Country",
            Dimension::Region => "Region",
            Dimension::State => "State",
            Dimension::City => "City",
            Dimension::ProductLine => "Product Line",
            Dimension::ProductCategory => "Product Category",
        }
    }

    /// Short key accepted by `FromStr`
    pub fn key(self) -> &'static str {
        match self {
            Dimension::Organization => "organization",
            Dimension::Country => "country",
            Dimension::Region => "region",
            Dimension::State => "state",
            Dimension::City => "city",
            Dimension::ProductLine => "product_line",
            Dimension::ProductCategory => "product_category",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Dimension {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "organization" | "organisation" | "sales_org" => Ok(Dimension::Organization),
            "country" => Ok(Dimension::Country),
            "region" => Ok(Dimension::Region),
            "state" => Ok(Dimension::State),
            "city" => Ok(Dimension::City),
            "product_line" => Ok(Dimension::ProductLine),
            "product_category" => Ok(Dimension::ProductCategory),
            _ => Err(PipelineError::InvalidParameter(format!(
                "Unknown filter dimension '{}'. Valid dimensions: {}",
                s,
                Dimension::ALL
                    .iter()
                    .map(|d| d.key())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

/// Selected value per dimension; an unset dimension does not restrict rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    values: [Option<String>; 7],
}

impl FilterCriteria {
    /// Criteria with no active filters
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy restricted to `value` on `dimension`.
    ///
    /// Blank values leave the dimension unset.
    pub fn with(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        self.values[dimension.index()] = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    /// Build criteria from `(dimension key, value)` pairs.
    ///
    /// Keys outside the allow-list are rejected.
    pub fn from_pairs<K, V, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        pairs.into_iter().try_fold(Self::new(), |criteria, (key, value)| {
            let dimension = key.as_ref().parse::<Dimension>()?;
            Ok(criteria.with(dimension, value))
        })
    }

    /// The selected value for a dimension, if any
    pub fn get(&self, dimension: Dimension) -> Option<&str> {
        self.values[dimension.index()].as_deref()
    }

    /// Active filters in canonical dimension order
    pub fn active(&self) -> impl Iterator<Item = (Dimension, &str)> + '_ {
        Dimension::ALL
            .into_iter()
            .filter_map(move |d| self.get(d).map(|value| (d, value)))
    }

    /// Copy with one dimension cleared
    pub fn without(mut self, dimension: Dimension) -> Self {
        self.values[dimension.index()] = None;
        self
    }

    /// True when no dimension is restricted
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Owned list of the active filters
    pub fn describe(&self) -> Vec<(Dimension, String)> {
        self.active()
            .map(|(d, value)| (d, value.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_empty_criteria() {
        let criteria = FilterCriteria::new();
        assert!(criteria.is_empty());
        assert_eq!(criteria.active().count(), 0);
    }

    #[test]
    fn test_active_in_canonical_order() {
        let criteria = FilterCriteria::new()
            .with(Dimension::ProductCategory, "Helmets")
            .with(Dimension::Country, "Germany");

        let active: Vec<_> = criteria.active().collect();
        assert_eq!(
            active,
            vec![
                (Dimension::Country, "Germany"),
                (Dimension::ProductCategory, "Helmets")
            ]
        );
    }

    #[test]
    fn test_blank_value_is_unset() {
        let criteria = FilterCriteria::new().with(Dimension::City, "   ");
        assert!(criteria.is_empty());
    }

    #[test]
    fn test_without_clears_dimension() {
        let criteria = FilterCriteria::new()
            .with(Dimension::City, "Berlin")
            .without(Dimension::City);
        assert_eq!(criteria.get(Dimension::City), None);
    }

    #[rstest]
    #[case("country", Dimension::Country)]
    #[case("Sales_Org", Dimension::Organization)]
    #[case("product-line", Dimension::ProductLine)]
    #[case(" PRODUCT_CATEGORY ", Dimension::ProductCategory)]
    fn test_parse_dimension(#[case] input: &str, #[case] expected: Dimension) {
        assert_eq!(input.parse::<Dimension>().unwrap(), expected);
    }

    #[test]
    fn test_from_pairs_rejects_unknown_keys() {
        let result = FilterCriteria::from_pairs([("country", "Germany"), ("discount", "10")]);
        match result {
            Err(PipelineError::InvalidParameter(msg)) => assert!(msg.contains("discount")),
            other => panic!("Expected InvalidParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_from_pairs() {
        let criteria = FilterCriteria::from_pairs([("city", "Hamburg"), ("state", "HH")]).unwrap();
        assert_eq!(criteria.get(Dimension::City), Some("Hamburg"));
        assert_eq!(criteria.get(Dimension::State), Some("HH"));
        assert_eq!(criteria.describe().len(), 2);
    }
}
