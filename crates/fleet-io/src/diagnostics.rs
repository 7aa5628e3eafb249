use serde::Serialize;
use tracing::warn;

/// A non-fatal finding while loading the input tables
#[derive(Debug, Clone, Serialize)]
pub struct LoadIssue {
    pub table: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>, // "BEV_S1_2023"
}

/// Row counts per table
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableStats {
    pub vehicles: usize,
    pub vehicle_fuels: usize,
    pub fuel_entries: usize,
    pub demand_segments: usize,
    pub carbon_limits: usize,
    /// `None` when no budget table was supplied
    pub budgets: Option<usize>,
}

/// Counts and warnings collected by [`crate::load_dataset_with_report`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub stats: TableStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<LoadIssue>,
}

impl LoadReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, table: &str, message: &str) {
        warn!(table, "{}", message);
        self.warnings.push(LoadIssue {
            table: table.to_string(),
            message: message.to_string(),
            entity: None,
        });
    }

    pub fn add_warning_with_entity(&mut self, table: &str, message: &str, entity: &str) {
        warn!(table, entity, "{}", message);
        self.warnings.push(LoadIssue {
            table: table.to_string(),
            message: message.to_string(),
            entity: Some(entity.to_string()),
        });
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_collects_warnings() {
        let mut report = LoadReport::new();
        assert!(!report.has_warnings());
        report.add_warning("fuels", "3 entries carry a cost uncertainty");
        report.add_warning_with_entity("vehicles", "yearly range is zero", "BEV_S1_2023");
        assert_eq!(report.warning_count(), 2);
        assert_eq!(report.warnings[1].entity.as_deref(), Some("BEV_S1_2023"));
    }
}
