// src/table/html.rs

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

use super::{Cell, RawTable};

fn nearest_ancestor<'a>(el: &ElementRef<'a>, names: &[&str]) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| names.contains(&a.value().name()))
}

/// Text of `cell` that belongs to `table`; text inside nested tables is
/// left to those tables.
fn cell_text<'a>(cell: &ElementRef<'a>, table: ElementRef<'a>) -> String {
    cell.descendants()
        .filter(|n| {
            n.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|a| a.value().name() == "table")
                == Some(table)
        })
        .filter_map(|n| n.value().as_text())
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `(is_header_cell, text)` per column, `colspan` expanded.
fn row_cells<'a>(row: &ElementRef<'a>, table: ElementRef<'a>) -> Vec<(bool, String)> {
    let mut out = Vec::new();
    for cell in row.children().filter_map(ElementRef::wrap) {
        let name = cell.value().name();
        if name != "td" && name != "th" {
            continue;
        }
        let span = cell
            .value()
            .attr("colspan")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .clamp(1, 64);
        let text = cell_text(&cell, table);
        for _ in 0..span {
            out.push((name == "th", text.clone()));
        }
    }
    out
}

/// Every `<table>` in the document, in document order, as a [`RawTable`].
///
/// The header is the last row of `<thead>` when there is one, otherwise a
/// leading row made only of `<th>` cells. Body rows are the remaining rows
/// with at least one `<td>`. Rows of nested tables belong to the nested table.
pub fn tables_from_html(html: &str) -> Vec<RawTable> {
    let doc = Html::parse_document(html);
    let table_sel = Selector::parse("table").expect("selector should parse");
    let row_sel = Selector::parse("tr").expect("selector should parse");

    let mut tables = Vec::new();
    for table in doc.select(&table_sel) {
        let mut head_rows: Vec<Vec<(bool, String)>> = Vec::new();
        let mut body_rows: Vec<Vec<(bool, String)>> = Vec::new();

        for row in table.select(&row_sel) {
            if nearest_ancestor(&row, &["table"]) != Some(table) {
                continue;
            }
            let cells = row_cells(&row, table);
            if cells.is_empty() {
                continue;
            }
            let in_thead = nearest_ancestor(&row, &["thead", "tbody", "tfoot", "table"])
                .map(|s| s.value().name() == "thead")
                .unwrap_or(false);
            if in_thead {
                head_rows.push(cells);
            } else {
                body_rows.push(cells);
            }
        }

        let headers: Vec<String> = match head_rows.pop() {
            Some(h) => h.into_iter().map(|(_, t)| t).collect(),
            None if body_rows
                .first()
                .map(|r| r.iter().all(|(th, _)| *th))
                .unwrap_or(false) =>
            {
                body_rows.remove(0).into_iter().map(|(_, t)| t).collect()
            }
            None => Vec::new(),
        };

        let rows: Vec<Vec<Cell>> = body_rows
            .into_iter()
            .filter(|r| r.iter().any(|(th, _)| !*th))
            .map(|r| r.into_iter().map(|(_, t)| Cell::text(t)).collect())
            .collect();

        trace!(columns = headers.len(), rows = rows.len(), "extracted html table");
        tables.push(RawTable::new(headers, rows));
    }

    debug!(tables = tables.len(), "parsed html document");
    tables
}
