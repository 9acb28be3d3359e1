/// Table configuration.
///
/// Options are plain serde data so they can come from a JSON file, with
/// individual values overridable from the environment.
///
/// ```
/// use tabulardata::{SchemaSampling, TableOptions};
///
/// let options = TableOptions::from_json(r#"{"rowsPerPage": 25, "schemaSampling": "allRows"}"#).unwrap();
/// assert_eq!(options.rows_per_page, 25);
/// assert_eq!(options.schema_sampling, SchemaSampling::AllRows);
/// assert!(options.sticky_columns.is_empty());
/// ```

use crate::error::{Result, TableError};
use crate::inference::{PropertyType, TypeRule, TypeRules};
use crate::pagination::DEFAULT_ROWS_PER_PAGE;
use crate::schema::SchemaSampling;
use serde::{Deserialize, Serialize};

pub const ROWS_PER_PAGE_VAR: &str = "ROWS_PER_PAGE";
pub const SCHEMA_SAMPLING_VAR: &str = "SCHEMA_SAMPLING";

/// Forces `property_name` to `property_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeOverride {
    pub property_name: String,
    pub property_type: PropertyType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableOptions {
    pub rows_per_page: usize,
    pub schema_sampling: SchemaSampling,
    /// Replaces the built-in name overrides when present
    pub type_overrides: Option<Vec<TypeOverride>>,
    /// Columns pinned to the left edge
    pub sticky_columns: Vec<String>,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            schema_sampling: SchemaSampling::default(),
            type_overrides: None,
            sticky_columns: Vec::new(),
        }
    }
}

impl TableOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        let options: TableOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows_per_page == 0 {
            return Err(TableError::InvalidRowsPerPage(self.rows_per_page));
        }
        Ok(())
    }

    /// Apply `ROWS_PER_PAGE` and `SCHEMA_SAMPLING` from `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ROWS_PER_PAGE_VAR) {
            self.rows_per_page = value.trim().parse().map_err(|_| {
                TableError::InvalidOption(format!("{}={}", ROWS_PER_PAGE_VAR, value))
            })?;
        }
        if let Some(value) = lookup(SCHEMA_SAMPLING_VAR) {
            self.schema_sampling = value.trim().parse()?;
        }
        self.validate()?;
        Ok(self)
    }

    /// The ordered override table for type inference.
    pub fn type_rules(&self) -> TypeRules {
        match &self.type_overrides {
            Some(overrides) => TypeRules::new(
                overrides
                    .iter()
                    .map(|o| TypeRule::named(o.property_name.clone(), o.property_type))
                    .collect(),
            ),
            None => TypeRules::default(),
        }
    }
}
