//! Presentation selection: decide whether a result is charted.
//!
//! The decision is a pure function of the intent. Only the top-accounts chart
//! inspects the columns; the stage and amount charts are built for their
//! intents regardless of what the result contains.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crm_types::{cell_to_f64, cell_to_string, Intent, TabularResult};

/// Stage category column.
pub const STAGE_FIELD: &str = "StageName";

/// Aggregate amount alias used by the grouping templates.
pub const TOTAL_AMOUNT_FIELD: &str = "totalAmount";

/// Per-opportunity amount column.
pub const AMOUNT_FIELD: &str = "Amount";

/// Record name column.
pub const NAME_FIELD: &str = "Name";

/// Account name columns, in lookup order. Grouped queries report the
/// relationship field under its bare name.
pub const ACCOUNT_NAME_FIELDS: [&str; 2] = ["Account.Name", "Name"];

/// Bar orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Vertical bars, categories on the x axis
    Bar,
    /// Horizontal bars, categories on the y axis
    HorizontalBar,
}

/// One bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartBar {
    pub label: String,
    pub value: f64,
}

/// A chart ready for rendering. Bars are sorted by descending value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub category_field: String,
    pub value_field: String,
    pub value_label: String,
    pub bars: Vec<ChartBar>,
}

impl ChartSpec {
    fn build(
        kind: ChartKind,
        title: &str,
        value_label: &str,
        result: &TabularResult,
        category_field: &str,
        value_field: &str,
    ) -> Self {
        Self {
            kind,
            title: title.to_string(),
            category_field: category_field.to_string(),
            value_field: value_field.to_string(),
            value_label: value_label.to_string(),
            bars: sum_by_category(result, category_field, value_field),
        }
    }

    /// Largest bar value, or zero for an empty chart.
    pub fn max_value(&self) -> f64 {
        self.bars.iter().map(|b| b.value).fold(0.0, f64::max)
    }

    /// Returns true if there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Sum `value_field` per distinct `category_field`, sorted descending.
///
/// Rows missing the category are skipped. Non-numeric values count as zero.
fn sum_by_category(result: &TabularResult, category_field: &str, value_field: &str) -> Vec<ChartBar> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, f64> = HashMap::new();

    for row in result.rows() {
        let category = result.cell(row, category_field);
        if category.is_null() {
            continue;
        }
        let label = cell_to_string(category);
        let value = cell_to_f64(result.cell(row, value_field)).unwrap_or(0.0);
        match totals.get_mut(&label) {
            Some(total) => *total += value,
            None => {
                order.push(label.clone());
                totals.insert(label, value);
            }
        }
    }

    let mut bars: Vec<ChartBar> = order
        .into_iter()
        .map(|label| {
            let value = totals.get(&label).copied().unwrap_or(0.0);
            ChartBar { label, value }
        })
        .collect();
    // Stable sort keeps first-seen order among ties.
    bars.sort_by(|a, b| b.value.total_cmp(&a.value));
    bars
}

/// Pick a chart for `result` given the intent that produced it.
///
/// `None` means render as a table.
pub fn select_chart(result: &TabularResult, intent: Intent) -> Option<ChartSpec> {
    match intent {
        Intent::OpportunityStageChart => Some(ChartSpec::build(
            ChartKind::Bar,
            "Opportunities by Stage",
            "Total Amount ($)",
            result,
            STAGE_FIELD,
            TOTAL_AMOUNT_FIELD,
        )),
        Intent::OpportunityAmountChart => Some(ChartSpec::build(
            ChartKind::HorizontalBar,
            "Top Opportunities by Amount",
            "Amount ($)",
            result,
            NAME_FIELD,
            AMOUNT_FIELD,
        )),
        Intent::TopAccounts => {
            let account_field = ACCOUNT_NAME_FIELDS
                .iter()
                .find(|field| result.has_column(field))?;
            if !result.has_column(TOTAL_AMOUNT_FIELD) {
                return None;
            }
            Some(ChartSpec::build(
                ChartKind::HorizontalBar,
                "Top Accounts by Total Opportunity Amount",
                "Total Amount ($)",
                result,
                account_field,
                TOTAL_AMOUNT_FIELD,
            ))
        }
        Intent::RecentOpportunities
        | Intent::OpportunityByStage
        | Intent::Contacts
        | Intent::CustomQuery
        | Intent::Unknown => None,
    }
}
