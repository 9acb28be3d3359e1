/// Type Inference
///
/// Classifies raw values into the semantic `PropertyType` that drives
/// formatting and aggregation. Classification is structural (the runtime kind
/// of the value plus two string patterns); name-based overrides live in an
/// ordered `TypeRules` table that is applied on top when a whole row is typed.

use crate::value::{PropertyValue, RowItem};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

static LOCAL_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap());
static COUNTRY_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2}$").unwrap());

/// Property name that enables country-code detection.
pub const COUNTRY_CODE_PROPERTY: &str = "countryCode";

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    Text,
    Integer,
    DecimalNumber,
    /// Integer where zero is left blank on display
    PositiveInteger,
    Boolean,
    LocalDate,
    LocalTime,
    LocalDateTime,
    Timestamp,
    CountryCode,
    Percentage,
    Promille,
    Link,
}

impl PropertyType {
    /// Types that get sum/min/max/mean/median summaries.
    pub fn is_aggregable(&self) -> bool {
        matches!(
            self,
            PropertyType::Integer
                | PropertyType::DecimalNumber
                | PropertyType::PositiveInteger
                | PropertyType::Boolean
                | PropertyType::Text
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Text => "text",
            PropertyType::Integer => "integer",
            PropertyType::DecimalNumber => "decimalNumber",
            PropertyType::PositiveInteger => "positiveInteger",
            PropertyType::Boolean => "boolean",
            PropertyType::LocalDate => "localDate",
            PropertyType::LocalTime => "localTime",
            PropertyType::LocalDateTime => "localDateTime",
            PropertyType::Timestamp => "timestamp",
            PropertyType::CountryCode => "countryCode",
            PropertyType::Percentage => "percentage",
            PropertyType::Promille => "promille",
            PropertyType::Link => "link",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Classify a single value.
///
/// # Examples
///
/// ```
/// use tabulardata::{classify, PropertyType, PropertyValue};
///
/// assert_eq!(classify(&"2024-12-31".into(), None), PropertyType::LocalDate);
/// assert_eq!(classify(&123.into(), None), PropertyType::Integer);
/// assert_eq!(classify(&3.14.into(), None), PropertyType::DecimalNumber);
/// assert_eq!(classify(&"DK".into(), Some("countryCode")), PropertyType::CountryCode);
/// assert_eq!(classify(&"DK".into(), None), PropertyType::Text);
/// assert_eq!(classify(&PropertyValue::Absent, None), PropertyType::Text);
/// ```
pub fn classify(value: &PropertyValue, property_name: Option<&str>) -> PropertyType {
    match value {
        PropertyValue::Absent => PropertyType::Text,
        PropertyValue::Boolean(_) => PropertyType::Boolean,
        PropertyValue::Text(s) => {
            if LOCAL_DATE.is_match(s) {
                PropertyType::LocalDate
            } else if property_name == Some(COUNTRY_CODE_PROPERTY) && COUNTRY_CODE.is_match(s) {
                PropertyType::CountryCode
            } else {
                PropertyType::Text
            }
        }
        PropertyValue::Number(n) => {
            if n.is_finite() && n.fract() == 0.0 {
                PropertyType::Integer
            } else {
                PropertyType::DecimalNumber
            }
        }
    }
}

type RulePredicate = Rc<dyn Fn(&str, &PropertyValue) -> bool>;

/// What a `TypeRule` matches on.
#[derive(Clone)]
pub enum RuleMatcher {
    /// Exact property name
    PropertyName(String),
    /// Arbitrary test on name and sampled value
    Predicate(RulePredicate),
}

impl fmt::Debug for RuleMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleMatcher::PropertyName(name) => f.debug_tuple("PropertyName").field(name).finish(),
            RuleMatcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// One override: when the matcher fires, the property gets `property_type`.
#[derive(Debug, Clone)]
pub struct TypeRule {
    pub matcher: RuleMatcher,
    pub property_type: PropertyType,
}

impl TypeRule {
    pub fn named(name: impl Into<String>, property_type: PropertyType) -> Self {
        TypeRule {
            matcher: RuleMatcher::PropertyName(name.into()),
            property_type,
        }
    }

    pub fn predicate<F>(predicate: F, property_type: PropertyType) -> Self
    where
        F: Fn(&str, &PropertyValue) -> bool + 'static,
    {
        TypeRule {
            matcher: RuleMatcher::Predicate(Rc::new(predicate)),
            property_type,
        }
    }

    pub fn matches(&self, property_name: &str, value: &PropertyValue) -> bool {
        match &self.matcher {
            RuleMatcher::PropertyName(name) => name == property_name,
            RuleMatcher::Predicate(predicate) => predicate(property_name, value),
        }
    }
}

/// Ordered override table, evaluated after structural classification.
/// The first matching rule wins.
#[derive(Debug, Clone)]
pub struct TypeRules {
    rules: Vec<TypeRule>,
}

impl Default for TypeRules {
    /// The overrides for the bundled sample data sets.
    fn default() -> Self {
        TypeRules::new(vec![
            TypeRule::named("salary", PropertyType::DecimalNumber),
            TypeRule::named("numberOfChildren", PropertyType::PositiveInteger),
            TypeRule::named("percentage", PropertyType::Percentage),
            TypeRule::named("promille", PropertyType::Promille),
        ])
    }
}

impl TypeRules {
    pub fn new(rules: Vec<TypeRule>) -> Self {
        TypeRules { rules }
    }

    pub fn empty() -> Self {
        TypeRules { rules: Vec::new() }
    }

    pub fn push(&mut self, rule: TypeRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn find(&self, property_name: &str, value: &PropertyValue) -> Option<PropertyType> {
        self.rules
            .iter()
            .find(|rule| rule.matches(property_name, value))
            .map(|rule| rule.property_type)
    }

    /// Structural classification followed by the override table.
    pub fn resolve(&self, property_name: &str, value: &PropertyValue) -> PropertyType {
        let inferred = classify(value, Some(property_name));
        match self.find(property_name, value) {
            Some(overridden) => {
                log::trace!(
                    "Property '{}' overridden: {} => {}",
                    property_name,
                    inferred,
                    overridden
                );
                overridden
            }
            None => inferred,
        }
    }
}

/// Type every property of a row, in the row's key order.
pub fn property_types_for_row(row: &RowItem, rules: &TypeRules) -> Vec<(String, PropertyType)> {
    row.iter()
        .map(|(name, value)| (name.to_string(), rules.resolve(name, value)))
        .collect()
}

/// Upper-case the first character.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-case the first character.
pub fn decapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turn a camelCase property name into a column label.
///
/// ```
/// use tabulardata::prettify_property_name;
///
/// assert_eq!(prettify_property_name("firstName"), "First name");
/// assert_eq!(prettify_property_name("numberOfChildren"), "# children");
/// ```
pub fn prettify_property_name(property_name: &str) -> String {
    let mut tokens: Vec<String> = vec![String::new()];
    for c in property_name.chars() {
        if c.is_ascii_uppercase() {
            tokens.push(c.to_string());
        } else if let Some(last) = tokens.last_mut() {
            last.push(c);
        }
    }

    let mut label = String::with_capacity(property_name.len() + tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        if i == 0 {
            label.push_str(&capitalize(token));
        } else {
            label.push(' ');
            label.push_str(&decapitalize(token));
        }
    }

    label.replacen("Number of", "#", 1)
}
