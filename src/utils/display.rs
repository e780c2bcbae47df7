use colored::Colorize;
use prettytable::{format, Cell, Row, Table};

use crate::models::area::{Area, Dataset, AVAILABLE};

pub struct DisplayFormatter;

impl DisplayFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format_header(&self, text: &str) -> String {
        format!("\n=== {} ===", text.bright_white().bold())
    }

    pub fn format_area_table(&self, areas: &[&Area]) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);

        table.add_row(Row::new(
            ["ID", "Area", "Occupancy"]
                .iter()
                .map(|h| Cell::new(h).style_spec("b"))
                .collect(),
        ));

        for area in areas {
            table.add_row(Row::new(vec![
                Cell::new(&area.area_id.to_string()),
                Cell::new(&area.area_name),
                Cell::new(&self.format_occupancy(&area.occupancy)),
            ]));
        }

        table.to_string()
    }

    pub fn format_occupancy(&self, occupancy: &str) -> String {
        match occupancy {
            AVAILABLE => occupancy.green().to_string(),
            "occupied" => occupancy.red().to_string(),
            _ => occupancy.yellow().to_string(),
        }
    }

    pub fn format_summary(&self, dataset: &Dataset) -> String {
        let available = dataset.data.iter().filter(|a| a.is_available()).count();
        format!(
            "{} areas, {} available",
            dataset.len(),
            available.to_string().green()
        )
    }

    /// Header, table and summary for the `show` command.
    pub fn format_dataset(&self, dataset: &Dataset, only_available: bool) -> String {
        let areas: Vec<&Area> = dataset
            .data
            .iter()
            .filter(|a| !only_available || a.is_available())
            .collect();

        let mut output = Vec::new();
        output.push(self.format_header("Areas"));
        output.push(self.format_area_table(&areas));
        output.push(self.format_summary(dataset));

        output.join("\n")
    }
}

impl Default for DisplayFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn area(id: i64, name: &str, occupancy: &str) -> Area {
        Area {
            area_id: id,
            area_name: name.to_string(),
            occupancy: occupancy.to_string(),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_format_dataset_filters_available() {
        colored::control::set_override(false);
        let dataset = Dataset::new(vec![
            area(1, "Library", "available"),
            area(2, "Gym", "occupied"),
        ]);
        let formatter = DisplayFormatter::new();

        let all = formatter.format_dataset(&dataset, false);
        assert!(all.contains("Library"));
        assert!(all.contains("Gym"));
        assert!(all.contains("2 areas, 1 available"));

        let available = formatter.format_dataset(&dataset, true);
        assert!(available.contains("Library"));
        assert!(!available.contains("Gym"));
    }
}
