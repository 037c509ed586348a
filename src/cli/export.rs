//! Product export to JSON or CSV.

use std::path::PathBuf;

use serde::Serialize;

use crate::modules::products::ProductSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// File written when no `--output` is given.
    pub fn default_path(self) -> PathBuf {
        match self {
            Self::Json => PathBuf::from("products.json"),
            Self::Csv => PathBuf::from("products.csv"),
        }
    }
}

/// One exported product. Only these three fields leave the system.
#[derive(Debug, Serialize)]
pub struct ExportRow<'a> {
    pub name: &'a str,
    pub price: f64,
    pub category: Option<&'a str>,
}

impl<'a> From<&'a ProductSummary> for ExportRow<'a> {
    fn from(p: &'a ProductSummary) -> Self {
        Self {
            name: &p.name,
            price: p.price,
            category: p.category.as_deref(),
        }
    }
}

/// Renders products in the requested format.
///
/// CSV output always has a `name,price,category` header, even when empty.
pub fn render(products: &[ProductSummary], format: ExportFormat) -> anyhow::Result<String> {
    let rows: Vec<ExportRow<'_>> = products.iter().map(ExportRow::from).collect();

    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(&rows)?),
        ExportFormat::Csv => {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(Vec::new());
            writer.write_record(["name", "price", "category"])?;
            for row in &rows {
                writer.serialize(row)?;
            }
            Ok(String::from_utf8(writer.into_inner()?)?)
        }
    }
}
