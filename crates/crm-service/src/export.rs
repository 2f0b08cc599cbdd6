//! CSV rendering of tabular results.

use thiserror::Error;

use crm_types::{cell_to_string, TabularResult};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV output was not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Render `result` as CSV text: a header row, then one line per row in order.
///
/// Null cells are written as empty fields.
pub fn to_csv(result: &TabularResult) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(result.columns())?;
    for row in result.rows() {
        let fields: Vec<String> = result
            .columns()
            .iter()
            .map(|column| cell_to_string(result.cell(row, column)))
            .collect();
        writer.write_record(&fields)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}
