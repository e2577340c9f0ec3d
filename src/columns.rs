use std::cmp::Ordering;

use chrono::DateTime;
use serde::Deserialize;

use crate::domain::EDITABLE_SECTION_TITLE;

// TODO: Move the stat type key into the app config once more stat kinds
// than usage counts show up in the catalog feeds.
pub const USAGE_STAT_TYPE: &str = "column_usage";
pub const SHOW_STATS_THRESHOLD: usize = 1;
pub const ACTIONS_COLUMN_WIDTH: u16 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatRecord {
    pub stat_type: String,
    pub stat_val: String,
    pub start_epoch: i64,
    pub end_epoch: i64,
}

// Catalog feeds are inconsistent about the ordering hint, some emit a
// number and some a string. Keep both and let the sort policy decide.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SortOrder {
    Num(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub col_type: String,
    pub sort_order: SortOrder,
    #[serde(default)]
    pub is_editable: bool,
    #[serde(default)]
    pub stats: Vec<StatRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowContent {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub col_type: String,
    pub name: String,
    pub database: String,
}

/// One display-ready row, derived 1:1 from a [`ColumnRecord`].
///
/// `usage` and `stats` are independent lookups: `usage` comes from the
/// first stat typed [`USAGE_STAT_TYPE`], `stats` is simply the first stat
/// of the record. They can point at different underlying records.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedRow {
    pub content: RowContent,
    pub type_info: TypeInfo,
    pub usage: Option<f64>,
    pub stats: Option<StatRecord>,
    pub name: String,
    pub sort_order: SortOrder,
    pub is_editable: bool,
    pub edit_text: Option<String>,
    pub edit_url: Option<String>,
    /// Original input position, stable across sorting.
    pub position_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SortCriteria {
    pub display_name: String,
    pub key: String,
    pub direction: SortDirection,
}

impl SortCriteria {
    pub fn table_default() -> Self {
        SortCriteria {
            display_name: "Table Default".to_string(),
            key: "sort_order".to_string(),
            direction: SortDirection::Ascending,
        }
    }
}

fn usage_stat(record: &ColumnRecord) -> Option<f64> {
    if record.stats.is_empty() {
        return None;
    }
    record
        .stats
        .iter()
        .find(|s| s.stat_type == USAGE_STAT_TYPE)
        // A malformed value must not abort the transform, degrade to NaN.
        .map(|s| s.stat_val.parse().unwrap_or(f64::NAN))
}

pub fn format_columns(
    columns: &[ColumnRecord],
    database: &str,
    edit_text: Option<&str>,
    edit_url: Option<&str>,
) -> Vec<FormattedRow> {
    // An empty edit link counts as no link at all.
    let edit_text = edit_text.filter(|s| !s.is_empty());
    let edit_url = edit_url.filter(|s| !s.is_empty());
    columns
        .iter()
        .enumerate()
        .map(|(index, record)| FormattedRow {
            content: RowContent {
                title: record.name.clone(),
                description: record.description.clone(),
            },
            type_info: TypeInfo {
                col_type: record.col_type.clone(),
                name: record.name.clone(),
                database: database.to_string(),
            },
            usage: usage_stat(record),
            stats: record.stats.first().cloned(),
            name: record.name.clone(),
            sort_order: record.sort_order.clone(),
            is_editable: record.is_editable,
            edit_text: edit_text.map(str::to_string),
            edit_url: edit_url.map(str::to_string),
            position_index: index,
        })
        .collect()
}

pub fn stats_count(rows: &[FormattedRow]) -> usize {
    rows.iter().filter(|r| r.stats.is_some()).count()
}

enum SortValue<'a> {
    Num(f64),
    Text(&'a str),
}

impl FormattedRow {
    fn sort_value(&self, key: &str) -> Option<SortValue<'_>> {
        match key {
            "sort_order" => Some(match &self.sort_order {
                SortOrder::Num(n) => SortValue::Num(*n as f64),
                SortOrder::Text(s) => SortValue::Text(s),
            }),
            "usage" => self.usage.map(SortValue::Num),
            "name" => Some(SortValue::Text(&self.name)),
            _ => None,
        }
    }
}

// Both comparators must be genuine total orders, sort_by rejects anything
// less. Rows missing the key (and NaN values) get a consistent end of the
// arrangement; their order among each other stays unspecified.
fn numeric_compare(a: &FormattedRow, b: &FormattedRow, key: &str) -> Ordering {
    let as_num = |row: &FormattedRow| match row.sort_value(key) {
        Some(SortValue::Num(n)) => Some(n),
        _ => None,
    };
    // Descending base arrangement, absent values sort after every number.
    // total_cmp keeps NaN from malformed feed values totally ordered too.
    match (as_num(a), as_num(b)) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn string_compare(a: &FormattedRow, b: &FormattedRow, key: &str) -> Ordering {
    fn as_text<'r>(row: &'r FormattedRow, key: &str) -> Option<&'r str> {
        match row.sort_value(key) {
            Some(SortValue::Text(s)) => Some(s),
            _ => None,
        }
    }
    // Descending base arrangement, absent values sort after every text.
    as_text(b, key).cmp(&as_text(a, key))
}

fn is_integer(value: Option<SortValue<'_>>) -> bool {
    matches!(value, Some(SortValue::Num(n)) if n.is_finite() && n.fract() == 0.0)
}

/// Orders rows by `sort_by`.
///
/// The comparator is picked from the first row's value for the sort key:
/// an integer selects numeric comparison, anything else lexicographic.
/// Both base comparators arrange descending; an ascending direction is a
/// reversal of the stably sorted sequence. Reversing is observably
/// different from negating the comparator when ties exist, so it stays a
/// two-step process.
pub fn sort_rows(rows: &mut Vec<FormattedRow>, sort_by: &SortCriteria) {
    let numeric = match rows.first() {
        Some(first) => is_integer(first.sort_value(&sort_by.key)),
        None => true,
    };
    if numeric {
        rows.sort_by(|a, b| numeric_compare(a, b, &sort_by.key));
    } else {
        rows.sort_by(|a, b| string_compare(a, b, &sort_by.key));
    }
    if sort_by.direction == SortDirection::Ascending {
        rows.reverse();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub title: &'static str,
    pub field: &'static str,
    pub width: Option<u16>,
    pub align: TextAlign,
}

/// Builds the ordered field list: Name, Type, [Usage], [Actions].
///
/// The Usage field is gated on the number of rows carrying ANY stat, not
/// specifically a usage stat. A table whose only stat is of another kind
/// still gets the column, rendered empty. Intentional.
pub fn build_field_list(
    usage_sort_enabled: bool,
    notifications_enabled: bool,
    stats_count: usize,
) -> Vec<FieldDef> {
    let mut fields = vec![
        FieldDef {
            title: "Name",
            field: "content",
            width: None,
            align: TextAlign::Left,
        },
        FieldDef {
            title: "Type",
            field: "type",
            width: None,
            align: TextAlign::Left,
        },
    ];
    if usage_sort_enabled && stats_count >= SHOW_STATS_THRESHOLD {
        fields.push(FieldDef {
            title: "Usage",
            field: "usage",
            width: None,
            align: TextAlign::Right,
        });
    }
    if notifications_enabled {
        fields.push(FieldDef {
            title: "",
            field: "action",
            width: Some(ACTIONS_COLUMN_WIDTH),
            align: TextAlign::Right,
        });
    }
    fields
}

#[derive(Debug, Clone, PartialEq)]
pub struct DescriptionSection {
    pub title: &'static str,
    pub read_only: bool,
    pub edit_text: Option<String>,
    pub edit_url: Option<String>,
    pub text: String,
    pub max_length: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedRow {
    pub description: Option<DescriptionSection>,
    pub stats_window: Option<String>,
}

pub fn should_render_description(row: &FormattedRow) -> bool {
    if !row.content.description.is_empty() {
        return true;
    }
    row.edit_text.is_some() || row.edit_url.is_some() || row.is_editable
}

fn month_year(epoch: i64) -> String {
    DateTime::from_timestamp(epoch, 0)
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|| "???".to_string())
}

// Measurement window of a stat, e.g. "Jan 2020 - Mar 2020".
pub fn stats_info_text(stat: &StatRecord) -> String {
    let start = month_year(stat.start_epoch);
    let end = month_year(stat.end_epoch);
    if start == end {
        start
    } else {
        format!("{start} - {end}")
    }
}

/// Detail view of an expanded row. Which stat record backs the window text
/// is unrelated to the usage lookup, see [`FormattedRow::stats`].
pub fn expand_row(row: &FormattedRow, max_description_length: usize) -> ExpandedRow {
    let description = should_render_description(row).then(|| DescriptionSection {
        title: EDITABLE_SECTION_TITLE,
        read_only: !row.is_editable,
        edit_text: row.edit_text.clone(),
        edit_url: row.edit_url.clone(),
        text: row.content.description.clone(),
        max_length: max_description_length,
    });
    let stats_window = row.stats.as_ref().map(stats_info_text);
    ExpandedRow {
        description,
        stats_window,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(stat_type: &str, stat_val: &str) -> StatRecord {
        StatRecord {
            stat_type: stat_type.to_string(),
            stat_val: stat_val.to_string(),
            start_epoch: 1577836800, // Jan 2020
            end_epoch: 1583020800,   // Mar 2020
        }
    }

    fn column(name: &str, sort_order: SortOrder, stats: Vec<StatRecord>) -> ColumnRecord {
        ColumnRecord {
            name: name.to_string(),
            description: String::new(),
            col_type: "varchar(10)".to_string(),
            sort_order,
            is_editable: false,
            stats,
        }
    }

    fn rows(columns: &[ColumnRecord]) -> Vec<FormattedRow> {
        format_columns(columns, "hive", None, None)
    }

    #[test]
    fn formatting_preserves_cardinality_and_position() {
        let columns = vec![
            column("a", SortOrder::Num(2), vec![]),
            column("b", SortOrder::Num(1), vec![]),
            column("c", SortOrder::Num(3), vec![]),
        ];
        let rows = rows(&columns);
        assert_eq!(rows.len(), columns.len());
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.position_index, i);
            assert_eq!(row.name, columns[i].name);
            assert_eq!(row.type_info.database, "hive");
        }
    }

    #[test]
    fn usage_comes_from_the_usage_typed_stat_only() {
        let columns = vec![
            column("no_stats", SortOrder::Num(0), vec![]),
            column("other_stat", SortOrder::Num(1), vec![stat("null_count", "5")]),
            column(
                "usage_second",
                SortOrder::Num(2),
                vec![stat("null_count", "5"), stat(USAGE_STAT_TYPE, "217")],
            ),
        ];
        let rows = rows(&columns);
        assert_eq!(rows[0].usage, None);
        assert_eq!(rows[1].usage, None);
        assert_eq!(rows[2].usage, Some(217.0));
    }

    #[test]
    fn representative_stat_is_the_first_stat_not_the_usage_stat() {
        let columns = vec![column(
            "c",
            SortOrder::Num(0),
            vec![stat("null_count", "5"), stat(USAGE_STAT_TYPE, "217")],
        )];
        let row = &rows(&columns)[0];
        assert_eq!(row.stats.as_ref().unwrap().stat_type, "null_count");
        assert_eq!(row.usage, Some(217.0));
    }

    #[test]
    fn malformed_stat_val_degrades_to_nan() {
        let columns = vec![
            column("bad", SortOrder::Num(0), vec![stat(USAGE_STAT_TYPE, "lots")]),
            column("good", SortOrder::Num(1), vec![stat(USAGE_STAT_TYPE, "3")]),
        ];
        let rows = rows(&columns);
        assert!(rows[0].usage.unwrap().is_nan());
        assert_eq!(rows[1].usage, Some(3.0));
    }

    #[test]
    fn default_sort_orders_string_sort_orders_ascending() {
        let columns = vec![
            column("a", SortOrder::Text("3".to_string()), vec![]),
            column("b", SortOrder::Text("1".to_string()), vec![]),
            column("c", SortOrder::Text("2".to_string()), vec![]),
        ];
        let mut rows = rows(&columns);
        sort_rows(&mut rows, &SortCriteria::table_default());
        let order: Vec<&str> = rows
            .iter()
            .map(|r| match &r.sort_order {
                SortOrder::Text(s) => s.as_str(),
                SortOrder::Num(_) => unreachable!(),
            })
            .collect();
        assert_eq!(order, vec!["1", "2", "3"]);
    }

    #[test]
    fn default_sort_orders_numeric_sort_orders_ascending() {
        let columns = vec![
            column("a", SortOrder::Num(3), vec![]),
            column("b", SortOrder::Num(1), vec![]),
            column("c", SortOrder::Num(2), vec![]),
        ];
        let mut rows = rows(&columns);
        sort_rows(&mut rows, &SortCriteria::table_default());
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn usage_sort_descending_puts_heaviest_first() {
        let columns = vec![
            column("light", SortOrder::Num(0), vec![stat(USAGE_STAT_TYPE, "2")]),
            column("heavy", SortOrder::Num(1), vec![stat(USAGE_STAT_TYPE, "90")]),
        ];
        let mut rows = rows(&columns);
        sort_rows(
            &mut rows,
            &SortCriteria {
                display_name: "Usage Count".to_string(),
                key: "usage".to_string(),
                direction: SortDirection::Descending,
            },
        );
        assert_eq!(rows[0].name, "heavy");
    }

    #[test]
    fn rows_missing_the_sort_key_keep_their_relative_order() {
        let columns = vec![
            column("x", SortOrder::Text("x".to_string()), vec![]),
            column("y", SortOrder::Text("y".to_string()), vec![]),
        ];
        let mut rows = rows(&columns);
        // "usage" is absent on both rows, every comparison is neutral.
        sort_rows(
            &mut rows,
            &SortCriteria {
                display_name: "Usage Count".to_string(),
                key: "usage".to_string(),
                direction: SortDirection::Descending,
            },
        );
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn usage_sort_handles_rows_with_and_without_usage() {
        // A realistic table: a third of the columns never got usage stats.
        // The first row carries one, so the numeric comparator is chosen.
        let columns: Vec<ColumnRecord> = (0..60)
            .map(|i| {
                let stats = if i % 3 == 2 {
                    vec![]
                } else {
                    vec![stat(USAGE_STAT_TYPE, &i.to_string())]
                };
                column(&format!("col_{i}"), SortOrder::Num(i), stats)
            })
            .collect();
        let mut rows = rows(&columns);
        sort_rows(
            &mut rows,
            &SortCriteria {
                display_name: "Usage Count".to_string(),
                key: "usage".to_string(),
                direction: SortDirection::Descending,
            },
        );
        assert_eq!(rows.len(), 60);
        let present: Vec<f64> = rows.iter().filter_map(|r| r.usage).collect();
        assert_eq!(present.len(), 40);
        assert!(present.windows(2).all(|w| w[0] >= w[1]));
        // Columns without a usage value end up behind the ranked ones.
        assert!(rows[40..].iter().all(|r| r.usage.is_none()));
    }

    #[test]
    fn string_sort_handles_rows_with_mixed_key_types() {
        // sort_order flips between text and number; the first row picks the
        // string comparator and the numeric rows count as absent for it.
        let columns: Vec<ColumnRecord> = (0..60)
            .map(|i| {
                let sort_order = if i % 3 == 0 {
                    SortOrder::Num(i)
                } else {
                    SortOrder::Text(format!("{i:02}"))
                };
                column(&format!("col_{i}"), sort_order, vec![])
            })
            .collect();
        // First row must carry a text value to select the string comparator.
        let columns: Vec<ColumnRecord> = columns.into_iter().rev().collect();
        let mut rows = rows(&columns);
        sort_rows(&mut rows, &SortCriteria::table_default());
        assert_eq!(rows.len(), 60);
        let texts: Vec<&str> = rows
            .iter()
            .filter_map(|r| match &r.sort_order {
                SortOrder::Text(s) => Some(s.as_str()),
                SortOrder::Num(_) => None,
            })
            .collect();
        assert_eq!(texts.len(), 40);
        assert!(texts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn sorting_zero_rows_is_a_noop() {
        let mut rows: Vec<FormattedRow> = Vec::new();
        sort_rows(&mut rows, &SortCriteria::table_default());
        assert!(rows.is_empty());
    }

    #[test]
    fn usage_field_absent_without_stats() {
        let fields = build_field_list(true, false, 0);
        let titles: Vec<&str> = fields.iter().map(|f| f.title).collect();
        assert_eq!(titles, vec!["Name", "Type"]);
    }

    #[test]
    fn usage_field_gates_on_any_stat_not_usage_stats() {
        // A single non-usage stat still clears the threshold.
        let columns = vec![column("c", SortOrder::Num(0), vec![stat("null_count", "5")])];
        let rows = rows(&columns);
        assert!(rows.iter().all(|r| r.usage.is_none()));
        let fields = build_field_list(true, false, stats_count(&rows));
        assert!(fields.iter().any(|f| f.title == "Usage"));
    }

    #[test]
    fn usage_field_absent_when_usage_sorting_disabled() {
        let fields = build_field_list(false, false, 5);
        assert!(!fields.iter().any(|f| f.title == "Usage"));
    }

    #[test]
    fn notifications_toggle_appends_exactly_one_actions_field() {
        let without = build_field_list(true, false, 1);
        let with = build_field_list(true, true, 1);
        assert_eq!(with.len(), without.len() + 1);
        assert_eq!(&with[..without.len()], &without[..]);
        let actions = with.last().unwrap();
        assert_eq!(actions.field, "action");
        assert_eq!(actions.width, Some(ACTIONS_COLUMN_WIDTH));
        assert_eq!(actions.align, TextAlign::Right);
    }

    #[test]
    fn field_order_is_name_type_usage_actions() {
        let fields = build_field_list(true, true, 1);
        let keys: Vec<&str> = fields.iter().map(|f| f.field).collect();
        assert_eq!(keys, vec!["content", "type", "usage", "action"]);
    }

    #[test]
    fn bare_row_expands_to_nothing() {
        let row = &rows(&[column("c", SortOrder::Num(0), vec![])])[0];
        let expanded = expand_row(row, 250);
        assert_eq!(expanded.description, None);
        assert_eq!(expanded.stats_window, None);
    }

    #[test]
    fn description_section_renders_for_editable_rows_without_text() {
        let mut record = column("c", SortOrder::Num(0), vec![]);
        record.is_editable = true;
        let row = &rows(&[record])[0];
        let section = expand_row(row, 250).description.unwrap();
        assert!(!section.read_only);
        assert_eq!(section.text, "");
    }

    #[test]
    fn description_section_renders_when_edit_link_is_configured() {
        let columns = vec![column("c", SortOrder::Num(0), vec![])];
        let rows = format_columns(&columns, "hive", Some("Edit"), Some("http://wiki/c"));
        let section = expand_row(&rows[0], 250).description.unwrap();
        assert!(section.read_only);
        assert_eq!(section.edit_text.as_deref(), Some("Edit"));
    }

    #[test]
    fn empty_edit_links_count_as_absent() {
        let columns = vec![column("c", SortOrder::Num(0), vec![])];
        let rows = format_columns(&columns, "hive", Some(""), Some(""));
        assert_eq!(rows[0].edit_text, None);
        assert_eq!(rows[0].edit_url, None);
        assert_eq!(expand_row(&rows[0], 250).description, None);
    }

    #[test]
    fn stats_window_formats_the_measurement_interval() {
        let row = &rows(&[column("c", SortOrder::Num(0), vec![stat("null_count", "5")])])[0];
        let expanded = expand_row(row, 250);
        assert_eq!(expanded.stats_window.as_deref(), Some("Jan 2020 - Mar 2020"));
    }

    #[test]
    fn stats_window_collapses_a_single_month() {
        let mut s = stat("null_count", "5");
        s.end_epoch = s.start_epoch;
        let row = &rows(&[column("c", SortOrder::Num(0), vec![s])])[0];
        assert_eq!(expand_row(row, 250).stats_window.as_deref(), Some("Jan 2020"));
    }

    #[test]
    fn formatting_is_idempotent() {
        let columns = vec![
            column("a", SortOrder::Num(2), vec![stat(USAGE_STAT_TYPE, "7")]),
            column("b", SortOrder::Num(1), vec![]),
        ];
        let first = format_columns(&columns, "hive", Some("Edit"), None);
        let second = format_columns(&columns, "hive", Some("Edit"), None);
        assert_eq!(first, second);
    }

    #[test]
    fn sort_order_deserializes_from_number_or_string() {
        let num: ColumnRecord = serde_json::from_str(
            r#"{"name":"a","col_type":"int","sort_order":3}"#,
        )
        .unwrap();
        let text: ColumnRecord = serde_json::from_str(
            r#"{"name":"b","col_type":"int","sort_order":"3"}"#,
        )
        .unwrap();
        assert_eq!(num.sort_order, SortOrder::Num(3));
        assert_eq!(text.sort_order, SortOrder::Text("3".to_string()));
    }
}
