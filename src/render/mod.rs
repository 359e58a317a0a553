use handlebars::{handlebars_helper, Handlebars};
use serde_json::{json, Value};

use crate::dataset::{Dataset, Row};
use crate::detector::DuplicateSet;
use crate::errors::{DupcheckError, DupcheckResult};

const INDEX: &str = "index";
const RESULTS: &str = "results";
const TABLE: &str = "table";

pub fn get_handlebars() -> DupcheckResult<Handlebars<'static>> {
    let mut handlebars = Handlebars::new();

    handlebars_helper!(plural: |count: u64, word: str| {
        if count == 1 {
            word.to_string()
        } else {
            format!("{}s", word)
        }
    });
    handlebars.register_helper("plural", Box::new(plural));

    for (name, template) in [
        (INDEX, include_str!("index.hbs")),
        (RESULTS, include_str!("results.hbs")),
        (TABLE, include_str!("table.hbs")),
    ] {
        handlebars
            .register_template_string(name, template)
            .map_err(|e| DupcheckError::Internal(format!("Invalid template {}: {}", name, e)))?;
    }

    Ok(handlebars)
}

/// The two HTML pages of the tool.
pub struct Pages {
    handlebars: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> DupcheckResult<Self> {
        Ok(Self {
            handlebars: get_handlebars()?,
        })
    }

    pub fn index(&self) -> DupcheckResult<String> {
        self.render(INDEX, &json!({}))
    }

    pub fn results(
        &self,
        file_name: &str,
        dataset: &Dataset,
        duplicates: &DuplicateSet,
    ) -> DupcheckResult<String> {
        self.render(
            RESULTS,
            &json!({
                "file_name": file_name,
                "original_count": dataset.len(),
                "duplicate_count": duplicates.len(),
                "group_count": duplicates.group_count(),
                "has_duplicates": !duplicates.is_empty(),
                "original_table": table(dataset.columns(), dataset.rows()),
                "duplicate_table": table(duplicates.columns(), duplicates.rows()),
            }),
        )
    }

    fn render(&self, name: &str, data: &Value) -> DupcheckResult<String> {
        self.handlebars
            .render(name, data)
            .map_err(|e| DupcheckError::Internal(format!("Failed to render {}: {}", name, e)))
    }
}

fn table(columns: &[String], rows: &[Row]) -> Value {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();
    json!({ "columns": columns, "rows": rows })
}
