//! Table allow-list configuration.
//!
//! The converter only carries data for a fixed set of tables, each with its
//! identity primary-key column. The mapping is defined once here and passed
//! into the grouper and sequence-reset emitter instead of being repeated at
//! every use site.

use ahash::AHashSet;

/// One allow-listed table and its identity primary-key column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub pk_column: String,
}

/// Ordered table → primary-key mapping. Output groups and sequence resets
/// follow the order tables appear here.
#[derive(Debug, Clone)]
pub struct TableMapping {
    tables: Vec<TableSpec>,
    names: AHashSet<String>,
}

impl TableMapping {
    pub fn new(specs: Vec<TableSpec>) -> Self {
        let names = specs.iter().map(|s| s.name.clone()).collect();
        Self {
            tables: specs,
            names,
        }
    }

    /// Parse `Name:PkColumn` override entries from the command line.
    pub fn from_overrides(entries: &[String]) -> anyhow::Result<Self> {
        let mut specs = Vec::with_capacity(entries.len());
        for entry in entries {
            let (name, pk) = entry.split_once(':').ok_or_else(|| {
                anyhow::anyhow!("Invalid table mapping '{entry}' (expected Name:PkColumn)")
            })?;
            if name.is_empty() || pk.is_empty() {
                anyhow::bail!("Invalid table mapping '{entry}' (expected Name:PkColumn)");
            }
            specs.push(TableSpec {
                name: name.to_string(),
                pk_column: pk.to_string(),
            });
        }
        Ok(Self::new(specs))
    }

    pub fn contains(&self, table: &str) -> bool {
        self.names.contains(table)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableSpec> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl Default for TableMapping {
    /// The seven tables carried by the TBM export, in output order.
    fn default() -> Self {
        let specs = [
            ("Teams", "TeamID"),
            ("Users", "UserID"),
            ("ChecklistTemplates", "TemplateID"),
            ("TemplateItems", "ItemID"),
            ("DailyReports", "ReportID"),
            ("ReportDetails", "DetailID"),
            ("ReportSignatures", "SignatureID"),
        ]
        .iter()
        .map(|(name, pk)| TableSpec {
            name: name.to_string(),
            pk_column: pk.to_string(),
        })
        .collect();
        Self::new(specs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mapping_order() {
        let mapping = TableMapping::default();
        let names: Vec<&str> = mapping.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Teams",
                "Users",
                "ChecklistTemplates",
                "TemplateItems",
                "DailyReports",
                "ReportDetails",
                "ReportSignatures"
            ]
        );
        assert!(mapping.contains("Teams"));
        assert!(!mapping.contains("__EFMigrationsHistory"));
    }

    #[test]
    fn test_from_overrides() {
        let mapping =
            TableMapping::from_overrides(&["Orders:OrderID".to_string(), "Items:ItemID".to_string()])
                .unwrap();
        assert_eq!(mapping.len(), 2);
        assert!(mapping.contains("Orders"));
        assert!(!mapping.contains("Teams"));
    }

    #[test]
    fn test_from_overrides_rejects_malformed() {
        assert!(TableMapping::from_overrides(&["NoColon".to_string()]).is_err());
        assert!(TableMapping::from_overrides(&[":Pk".to_string()]).is_err());
        assert!(TableMapping::from_overrides(&["Name:".to_string()]).is_err());
    }
}
