//! Terminal rendering of transcript messages, tables and charts.

use chrono::Local;
use serde_json::{Map, Value};

use crm_service::{ChartSpec, PresentationEvent};
use crm_types::{cell_to_string, ChatMessage, Role, TabularResult};

/// Widest a table cell is allowed to get before it is truncated.
const MAX_CELL_WIDTH: usize = 40;

/// Width of the longest bar.
const BAR_WIDTH: usize = 40;

/// Widest a chart label gets.
const MAX_LABEL_WIDTH: usize = 30;

/// Render one message with its role and local time.
pub fn format_message(message: &ChatMessage) -> String {
    let who = match message.role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    };
    format!(
        "[{}] {}: {}",
        message.timestamp.with_timezone(&Local).format("%H:%M:%S"),
        who,
        message.content
    )
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Render `table` as an aligned text grid.
pub fn format_table(table: &TabularResult) -> String {
    let columns = table.columns();
    let cells: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| truncate(&cell_to_string(table.cell(row, c)).replace('\n', " "), MAX_CELL_WIDTH))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: &[String]| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", v, width = *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(cells.len() + 2);
    out.push(line(columns));
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &cells {
        out.push(line(row));
    }
    out.push(format!("({} rows)", table.len()));
    out.join("\n")
}

/// Render `chart` as horizontal text bars. `None` if there is nothing to draw.
pub fn format_chart(chart: &ChartSpec) -> Option<String> {
    if chart.is_empty() {
        return None;
    }
    let max = chart.max_value();
    let label_width = chart
        .bars
        .iter()
        .map(|b| b.label.chars().count())
        .max()
        .unwrap_or(0)
        .min(MAX_LABEL_WIDTH);

    let mut out = vec![format!("{} [{}]", chart.title, chart.value_label)];
    for bar in &chart.bars {
        let len = if max > 0.0 {
            ((bar.value / max) * BAR_WIDTH as f64).round().max(0.0) as usize
        } else {
            0
        };
        out.push(format!(
            "{:<width$} | {} {:.2}",
            truncate(&bar.label, label_width),
            "█".repeat(len),
            bar.value,
            width = label_width
        ));
    }
    Some(out.join("\n"))
}

/// Flattened rows as JSON objects with keys in column order.
pub fn rows_as_json(table: &TabularResult) -> Value {
    Value::Array(
        table
            .rows()
            .iter()
            .map(|row| {
                let object: Map<String, Value> = table
                    .columns()
                    .iter()
                    .map(|c| (c.clone(), table.cell(row, c).clone()))
                    .collect();
                Value::Object(object)
            })
            .collect(),
    )
}

/// Render a presentation event. Downloads are handled by the caller.
pub fn format_event(event: &PresentationEvent, json: bool) -> Option<String> {
    match event {
        PresentationEvent::Message(message) if message.role == Role::Assistant => {
            Some(format_message(message))
        }
        PresentationEvent::Message(_) => None,
        PresentationEvent::RenderTable { table, .. } | PresentationEvent::RenderChart { table, .. }
            if json =>
        {
            serde_json::to_string_pretty(&rows_as_json(table)).ok()
        }
        PresentationEvent::RenderChart { title, chart, table } => match format_chart(chart) {
            Some(rendered) => Some(rendered),
            None => {
                tracing::warn!(chart = %chart.title, "Nothing to chart, showing table");
                Some(format!("{}\n{}", title, format_table(table)))
            }
        },
        PresentationEvent::RenderTable { title, table } => {
            Some(format!("{}\n{}", title, format_table(table)))
        }
        PresentationEvent::Download { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_service::{ChartBar, ChartKind};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_format_message_uses_local_clock() {
        use chrono::{TimeZone, Utc};

        let mut message = ChatMessage::user("List contacts");
        message.timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 23, 30, 5).unwrap();
        let local = Local.with_ymd_and_hms(2024, 5, 1, 23, 30, 5).unwrap();
        let expected_clock = message.timestamp.with_timezone(&Local).format("%H:%M:%S");

        assert_eq!(
            format_message(&message),
            format!("[{}] You: List contacts", expected_clock)
        );
        // Same instant viewed on the local clock, not the UTC one.
        let mut local_message = ChatMessage::assistant("Hi");
        local_message.timestamp = local.with_timezone(&Utc);
        assert_eq!(format_message(&local_message), "[23:30:05] Assistant: Hi");
    }

    fn table() -> TabularResult {
        TabularResult::from_ordered_rows(vec![
            vec![("Name".into(), json!("Acme")), ("Amount".into(), json!(100))],
            vec![("Name".into(), json!("Globex Corporation")), ("Amount".into(), Value::Null)],
        ])
    }

    #[test]
    fn test_format_table() {
        assert_eq!(
            format_table(&table()),
            "Name               | Amount\n\
             -------------------+-------\n\
             Acme               | 100\n\
             Globex Corporation |\n\
             (2 rows)"
        );
    }

    #[test]
    fn test_format_chart_scales_bars() {
        let chart = ChartSpec {
            kind: ChartKind::HorizontalBar,
            title: "Top".into(),
            category_field: "Name".into(),
            value_field: "Amount".into(),
            value_label: "Amount ($)".into(),
            bars: vec![
                ChartBar { label: "Big".into(), value: 200.0 },
                ChartBar { label: "Small".into(), value: 100.0 },
            ],
        };
        let rendered = format_chart(&chart).unwrap();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines[0], "Top [Amount ($)]");
        assert_eq!(lines[1].matches('█').count(), 40);
        assert_eq!(lines[2].matches('█').count(), 20);
        assert!(lines[2].starts_with("Small |"));
    }

    #[test]
    fn test_empty_chart_falls_back() {
        let chart = ChartSpec {
            kind: ChartKind::Bar,
            title: "Opportunities by Stage".into(),
            category_field: "StageName".into(),
            value_field: "totalAmount".into(),
            value_label: "Total Amount ($)".into(),
            bars: Vec::new(),
        };
        assert!(format_chart(&chart).is_none());
        let event = PresentationEvent::RenderChart {
            title: "Opportunities by Stage Chart".into(),
            chart,
            table: table(),
        };
        let rendered = format_event(&event, false).unwrap();
        assert!(rendered.starts_with("Opportunities by Stage Chart\nName"));
    }

    #[test]
    fn test_rows_as_json_keeps_column_order() {
        let rendered = serde_json::to_string(&rows_as_json(&table())).unwrap();
        assert_eq!(
            rendered,
            r#"[{"Name":"Acme","Amount":100},{"Name":"Globex Corporation","Amount":null}]"#
        );
    }
}
