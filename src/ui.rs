use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};

use crate::columns::{FieldDef, FormattedRow, TextAlign};
use crate::domain::{COLUMN_STATS_TITLE, EMPTY_MESSAGE, MORE_BUTTON_TEXT};
use crate::model::{ExpandedDetail, UIData};

// Two terminal lines per row: column name plus truncated description.
const ROW_HEIGHT: u16 = 2;
const STATUS_HEIGHT: u16 = 1;

pub struct TableUI {
    table_state: TableState,
}

impl TableUI {
    pub fn new() -> Self {
        Self {
            table_state: TableState::default(),
        }
    }

    pub fn draw(&mut self, uidata: &UIData, frame: &mut Frame) {
        let detail = uidata.expanded.as_ref().map(detail_lines);
        let detail_height = detail
            .as_ref()
            .map(|lines| lines.len() as u16 + 2)
            .unwrap_or(0);

        let [table_area, detail_area, status_area] = Layout::vertical([
            Constraint::Min(ROW_HEIGHT + 1),
            Constraint::Length(detail_height),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .areas(frame.area());

        self.draw_table(uidata, frame, table_area);
        if let (Some(lines), Some(expanded)) = (detail, uidata.expanded.as_ref()) {
            let block = Block::bordered().title(expanded.title.clone().bold());
            frame.render_widget(Paragraph::new(lines).block(block), detail_area);
        }
        self.draw_status(uidata, frame, status_area);

        if uidata.show_popup {
            self.draw_popup(uidata, frame);
        }
    }

    fn draw_table(&mut self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let block = Block::bordered().title(uidata.name.clone().bold());

        if uidata.rows.is_empty() {
            let empty = Paragraph::new(EMPTY_MESSAGE)
                .centered()
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(empty, area);
            return;
        }

        let header = Row::new(
            uidata
                .fields
                .iter()
                .map(|f| Cell::from(aligned_line(f.title.to_string(), f.align).bold())),
        );
        let rows = uidata
            .rows
            .iter()
            .map(|row| data_row(row, &uidata.fields).height(ROW_HEIGHT));
        let widths = uidata.fields.iter().map(field_width);

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .column_spacing(1)
            .row_highlight_style(Style::new().reversed());

        self.table_state.select(Some(uidata.selected_row));
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_status(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let position = if uidata.nrows > 0 {
            format!("{}/{}", uidata.selected_row + 1, uidata.nrows)
        } else {
            "0/0".to_string()
        };
        let line = Line::from(vec![
            Span::from(format!(" sort: {} ", uidata.sort_label)).bold(),
            Span::from(format!("| {position} ")),
            Span::from(format!("| {} ", uidata.status_message)).dim(),
            Span::from("| ? for help").dim(),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_popup(&self, uidata: &UIData, frame: &mut Frame) {
        let area = popup_area(frame.area());
        let block = Block::bordered().title(uidata.popup_title.clone().bold());
        let body = Paragraph::new(uidata.popup_message.clone())
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(Clear, area);
        frame.render_widget(body, area);
    }
}

fn aligned_line(content: String, align: TextAlign) -> Line<'static> {
    let alignment = match align {
        TextAlign::Left => Alignment::Left,
        TextAlign::Right => Alignment::Right,
    };
    Line::from(content).alignment(alignment)
}

fn data_row<'a>(row: &'a FormattedRow, fields: &[FieldDef]) -> Row<'a> {
    let cells = fields.iter().map(|field| match field.field {
        "content" => Cell::from(Text::from(vec![
            Line::from(row.content.title.as_str().bold()),
            Line::from(row.content.description.as_str().dim()),
        ])),
        "type" => Cell::from(row.type_info.col_type.as_str().yellow()),
        "usage" => Cell::from(aligned_line(format_usage(row.usage), field.align)),
        "action" => Cell::from(aligned_line(MORE_BUTTON_TEXT.to_string(), field.align).dim()),
        _ => Cell::from(""),
    });
    Row::new(cells)
}

fn field_width(field: &FieldDef) -> Constraint {
    match field.width {
        Some(width) => Constraint::Length(width),
        None => match field.field {
            "content" => Constraint::Min(24),
            "type" => Constraint::Length(18),
            "usage" => Constraint::Length(9),
            _ => Constraint::Min(10),
        },
    }
}

// Usage counts are whole numbers in practice, only fall back to the raw
// float rendering for oddball values. NaN marks a malformed feed value.
fn format_usage(usage: Option<f64>) -> String {
    match usage {
        None => String::new(),
        Some(v) if v.is_finite() && v.fract() == 0.0 => format!("{v:.0}"),
        Some(v) => v.to_string(),
    }
}

fn detail_lines(expanded: &ExpandedDetail) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(section) = &expanded.detail.description {
        let mut header = vec![Span::from(section.title).bold()];
        if section.read_only {
            header.push(Span::from(" (read only)").dim());
        }
        if let Some(edit_text) = &section.edit_text {
            header.push(Span::from(format!("  [{edit_text}]")).underlined());
        }
        if let Some(edit_url) = &section.edit_url {
            header.push(Span::from(format!("  {edit_url}")).dim());
        }
        lines.push(Line::from(header));
        if !section.text.is_empty() {
            let text: String = section.text.chars().take(section.max_length).collect();
            lines.push(Line::from(text));
        }
    }
    if let Some(window) = &expanded.detail.stats_window {
        lines.push(Line::from(vec![
            Span::from(COLUMN_STATS_TITLE).bold(),
            Span::from(" "),
            Span::from(window.clone()),
        ]));
    }
    lines
}

fn popup_area(area: Rect) -> Rect {
    let [area] = Layout::horizontal([Constraint::Percentage(70)])
        .flex(ratatui::layout::Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Percentage(60)])
        .flex(ratatui::layout::Flex::Center)
        .areas(area);
    area
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_renders_whole_numbers_without_decimals() {
        assert_eq!(format_usage(Some(217.0)), "217");
        assert_eq!(format_usage(Some(2.5)), "2.5");
        assert_eq!(format_usage(Some(f64::NAN)), "NaN");
        assert_eq!(format_usage(None), "");
    }
}
