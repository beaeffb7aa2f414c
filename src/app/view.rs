use unicode_width::UnicodeWidthStr;

use crate::records::{PriceRecord, TRADE_DATE_FORMAT};

/// Display surface a presenter renders search outcomes into.
pub trait StockView: Send + Sync {
    fn set_busy(&self, busy: bool);
    fn show_rows(&self, rows: &[PriceRecord]);
    fn show_status(&self, message: &str);
    fn show_error(&self, message: &str);
}

/// Renders to the terminal.
#[derive(Debug, Default)]
pub struct ConsoleView;

impl StockView for ConsoleView {
    fn set_busy(&self, busy: bool) {
        if busy {
            println!("Loading...");
        }
    }

    fn show_rows(&self, rows: &[PriceRecord]) {
        if rows.is_empty() {
            return;
        }
        for line in render_table(rows) {
            println!("{}", line);
        }
    }

    fn show_status(&self, message: &str) {
        println!("{}", message);
    }

    fn show_error(&self, message: &str) {
        eprintln!("{}", message);
    }
}

/// Lay rows out as a bordered, right-aligned table.
pub fn render_table(rows: &[PriceRecord]) -> Vec<String> {
    let headers = ["Ticker", "Trade Date", "Volume", "Change", "Change %"];

    let body = rows.iter().map(|record| {
        vec![
            record.ticker().to_string(),
            record.trade_date().format(TRADE_DATE_FORMAT).to_string(),
            record.volume().to_string(),
            record.change().to_string(),
            record.change_percent().to_string(),
        ]
    });

    let all_rows: Vec<Vec<String>> =
        std::iter::once(headers.iter().map(|h| h.to_string()).collect())
            .chain(body)
            .collect();

    let mut col_widths = vec![0; headers.len()];
    for row in &all_rows {
        for (i, cell) in row.iter().enumerate() {
            col_widths[i] = col_widths[i].max(cell.width());
        }
    }

    let border = format!(
        "+{}+",
        col_widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );

    let mut lines = Vec::with_capacity(all_rows.len() + 3);
    lines.push(border.clone());
    for (row_idx, row) in all_rows.iter().enumerate() {
        let formatted_row = row
            .iter()
            .zip(&col_widths)
            .map(|(cell, width)| format!(" {}{} ", " ".repeat(width - cell.width()), cell))
            .collect::<Vec<_>>()
            .join("|");
        lines.push(format!("|{}|", formatted_row));

        if row_idx == 0 {
            lines.push(border.clone());
        }
    }
    lines.push(border);
    lines
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Busy(bool),
    Rows(usize),
    Status(String),
    Error(String),
}

/// Captures everything a presenter shows, in order.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingView {
    events: std::sync::Mutex<Vec<ViewEvent>>,
}

#[cfg(test)]
impl RecordingView {
    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: ViewEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[cfg(test)]
impl StockView for RecordingView {
    fn set_busy(&self, busy: bool) {
        self.push(ViewEvent::Busy(busy));
    }

    fn show_rows(&self, rows: &[PriceRecord]) {
        self.push(ViewEvent::Rows(rows.len()));
    }

    fn show_status(&self, message: &str) {
        self.push(ViewEvent::Status(message.to_string()));
    }

    fn show_error(&self, message: &str) {
        self.push(ViewEvent::Error(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MockStockService;

    #[test]
    fn table_aligns_columns() {
        let rows = MockStockService::sample().unwrap().rows_for("MSFT");

        let lines = render_table(&rows);

        assert_eq!(lines.len(), rows.len() + 4);
        assert!(lines[1].contains("Ticker"));
        assert!(lines[3].contains("1/2/2018 12:00:00 AM"));
        let width = lines[0].width();
        assert!(lines.iter().all(|line| line.width() == width));
    }
}
