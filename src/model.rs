use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, trace};

use crate::columns::{
    ColumnRecord, ExpandedRow, FieldDef, FormattedRow, SortCriteria, build_field_list, expand_row,
    format_columns, sort_rows, stats_count,
};
use crate::config::AppConfig;
use crate::domain::{
    CatvError, HELP_TEXT, Message, NO_LINEAGE_MESSAGE, REQUEST_DESCRIPTION_TEXT, read_to_string,
};
use crate::events::{ActionEvent, ActionLog, RequestMetadataType};
use crate::lineage::{TableRef, lineage_graph_link, upstream_downstream_links};

const PAGE_STEP: usize = 10;

// One table worth of catalog metadata, as served by the metadata store.
#[derive(Debug, Clone, Deserialize)]
pub struct TableMetadata {
    pub database: String,
    pub cluster: String,
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub edit_text: Option<String>,
    #[serde(default)]
    pub edit_url: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnRecord>,
    #[serde(default)]
    pub upstream: Vec<String>,
    #[serde(default)]
    pub downstream: Vec<String>,
}

impl TableMetadata {
    pub fn table_ref(&self) -> TableRef {
        TableRef {
            database: self.database.clone(),
            cluster: self.cluster.clone(),
            schema: self.schema.clone(),
            table: self.name.clone(),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Status {
    Ready,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    Table,
    Popup,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedDetail {
    pub position_index: usize,
    pub title: String,
    pub detail: ExpandedRow,
}

// Display-ready snapshot handed to the ui. Rebuilt from scratch on every
// update, the ui never reaches back into the model.
#[derive(Debug, Clone, PartialEq)]
pub struct UIData {
    pub name: String,
    pub fields: Vec<FieldDef>,
    pub rows: Vec<FormattedRow>,
    pub expanded: Option<ExpandedDetail>,
    pub selected_row: usize,
    pub nrows: usize,
    pub sort_label: String,
    pub show_popup: bool,
    pub popup_title: String,
    pub popup_message: String,
    pub status_message: String,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            fields: Vec::new(),
            rows: Vec::new(),
            expanded: None,
            selected_row: 0,
            nrows: 0,
            sort_label: String::new(),
            show_popup: false,
            popup_title: String::new(),
            popup_message: String::new(),
            status_message: String::new(),
        }
    }
}

pub fn row_expand_event(row: &FormattedRow) -> ActionEvent {
    ActionEvent {
        command: "click".to_string(),
        label: format!("{} {}", row.content.title, row.type_info.col_type),
        target_id: format!("column::{}", row.content.title),
        target_type: "column stats".to_string(),
    }
}

pub struct Model {
    app_config: AppConfig,
    pub status: Status,
    modus: Modus,
    table: Option<TableMetadata>,
    sort_idx: usize,
    selected_row: usize,
    // Position index of the expanded column, stable across re-sorting.
    expanded: Option<usize>,
    action_log: ActionLog,
    popup_title: String,
    popup_message: String,
    status_message: String,
    uidata: UIData,
}

impl Model {
    pub fn new(app_config: AppConfig, action_log: ActionLog) -> Self {
        let mut model = Model {
            app_config,
            status: Status::Ready,
            modus: Modus::Table,
            table: None,
            sort_idx: 0,
            selected_row: 0,
            expanded: None,
            action_log,
            popup_title: String::new(),
            popup_message: String::new(),
            status_message: "Started catv!".to_string(),
            uidata: UIData::empty(),
        };
        model.refresh();
        model
    }

    pub fn load_table_file(&mut self, path: &Path) -> Result<(), CatvError> {
        let raw = read_to_string(path)?;
        let table: TableMetadata = serde_json::from_str(&raw)?;
        info!(
            "Loaded {}.{} with {} columns",
            table.schema,
            table.name,
            table.columns.len()
        );
        self.table = Some(table);
        self.sort_idx = 0;
        self.selected_row = 0;
        self.expanded = None;
        self.set_status_message(format!("Loaded {}", path.display()));
        self.refresh();
        Ok(())
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn quit(&mut self) {
        self.status = Status::Quitting;
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    fn current_sort(&self) -> SortCriteria {
        let criterias = self.app_config.table_sort_criterias();
        criterias[self.sort_idx % criterias.len()].clone()
    }

    // Recompute the whole ui snapshot from the current inputs. Keeping this
    // a function of (table, config, cursor state) is what makes re-renders
    // last-write-wins safe.
    fn refresh(&mut self) {
        let Some(table) = &self.table else {
            self.uidata = UIData::empty();
            self.uidata.status_message = self.status_message.clone();
            return;
        };
        let sort_by = self.current_sort();
        let mut rows = format_columns(
            &table.columns,
            &table.database,
            table.edit_text.as_deref(),
            table.edit_url.as_deref(),
        );
        let stats = stats_count(&rows);
        sort_rows(&mut rows, &sort_by);
        let fields = build_field_list(
            self.app_config.usage_sort_enabled(),
            self.app_config.notifications_enabled(),
            stats,
        );

        let nrows = rows.len();
        self.selected_row = self.selected_row.min(nrows.saturating_sub(1));
        let max_desc = self.app_config.max_length("columnDescLength").unwrap_or(250);
        let expanded = self.expanded.and_then(|pos| {
            rows.iter()
                .find(|r| r.position_index == pos)
                .map(|row| ExpandedDetail {
                    position_index: row.position_index,
                    title: row.content.title.clone(),
                    detail: expand_row(row, max_desc),
                })
        });

        self.uidata = UIData {
            name: format!("{}.{}", table.schema, table.name),
            fields,
            rows,
            expanded,
            selected_row: self.selected_row,
            nrows,
            sort_label: sort_by.display_name,
            show_popup: self.modus == Modus::Popup,
            popup_title: self.popup_title.clone(),
            popup_message: self.popup_message.clone(),
            status_message: self.status_message.clone(),
        };
    }

    pub fn update(&mut self, message: Message) -> Result<(), CatvError> {
        trace!("Update: {:?} in {:?}", message, self.modus);
        match self.modus {
            Modus::Table => match message {
                Message::Quit => self.quit(),
                Message::MoveUp => self.move_selection_up(1),
                Message::MoveDown => self.move_selection_down(1),
                Message::MovePageUp => self.move_selection_up(PAGE_STEP),
                Message::MovePageDown => self.move_selection_down(PAGE_STEP),
                Message::MoveBeginning => self.selected_row = 0,
                Message::MoveEnd => self.selected_row = self.uidata.nrows.saturating_sub(1),
                Message::ToggleExpand => self.toggle_expand(),
                Message::CycleSort => self.cycle_sort(),
                Message::RequestDescription => self.request_description(),
                Message::ShowLineage => self.show_lineage(),
                Message::Help => self.show_popup("Help", HELP_TEXT),
                Message::Exit => self.expanded = None,
                Message::Resize(_, _) => {}
            },
            Modus::Popup => match message {
                Message::Quit => self.quit(),
                Message::Exit | Message::ToggleExpand => self.close_popup(),
                Message::Resize(_, _) => {}
                _ => {}
            },
        }
        self.refresh();
        Ok(())
    }

    fn selected(&self) -> Option<&FormattedRow> {
        self.uidata.rows.get(self.selected_row)
    }

    fn move_selection_up(&mut self, size: usize) {
        self.selected_row = self.selected_row.saturating_sub(size);
    }

    fn move_selection_down(&mut self, size: usize) {
        if self.uidata.nrows > 0 {
            self.selected_row = (self.selected_row + size).min(self.uidata.nrows - 1);
        }
    }

    fn toggle_expand(&mut self) {
        let Some((position, event)) = self
            .selected()
            .map(|row| (row.position_index, row_expand_event(row)))
        else {
            return;
        };
        if self.expanded == Some(position) {
            self.expanded = None;
        } else {
            self.expanded = Some(position);
            // Fire-and-forget, the sink never blocks the expansion.
            self.action_log.log(event);
        }
    }

    fn cycle_sort(&mut self) {
        let criterias = self.app_config.table_sort_criterias();
        self.sort_idx = (self.sort_idx + 1) % criterias.len();
        let label = criterias[self.sort_idx].display_name.clone();
        self.set_status_message(format!("Sorting by {label}"));
    }

    fn request_description(&mut self) {
        if !self.app_config.notifications_enabled() {
            self.set_status_message("Notifications are not enabled");
            return;
        }
        let Some(name) = self.selected().map(|r| r.name.clone()) else {
            return;
        };
        self.open_request_description_dialog(RequestMetadataType::ColumnDescription, &name);
    }

    // Only opens the dialog, delivery is the notification backend's job.
    fn open_request_description_dialog(
        &mut self,
        request_type: RequestMetadataType,
        column_name: &str,
    ) {
        debug!("Opening {} dialog for {column_name}", request_type.as_str());
        let message = format!(
            "Send a {} for column \"{column_name}\"?\n\n\
             The owning team is notified through the catalog\n\
             mail client, nothing is sent from this session.",
            request_type.as_str()
        );
        self.show_popup(REQUEST_DESCRIPTION_TEXT, &message);
    }

    fn show_lineage(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        if !self.app_config.table_lineage.is_enabled {
            self.set_status_message("Table lineage is not enabled");
            return;
        }
        let graph = lineage_graph_link(&table.table_ref(), &self.app_config);
        let mut lines = vec![format!("{}: {}", graph.label, graph.href), String::new()];
        let upstream = upstream_downstream_links(&table.upstream, &self.app_config);
        let downstream = upstream_downstream_links(&table.downstream, &self.app_config);
        if upstream.is_empty() && downstream.is_empty() {
            lines.push(NO_LINEAGE_MESSAGE.to_string());
        } else {
            for (title, links) in [("Upstream", &upstream), ("Downstream", &downstream)] {
                if links.is_empty() {
                    continue;
                }
                lines.push(format!("{title}:"));
                for link in links {
                    lines.push(format!("  {}", link.label));
                    lines.push(format!("    -> {}", link.href));
                    lines.push(format!("    img {}", link.image));
                }
            }
        }
        let message = lines.join("\n");
        self.show_popup("Lineage", &message);
    }

    fn show_popup(&mut self, title: &str, message: &str) {
        self.modus = Modus::Popup;
        self.popup_title = title.to_string();
        self.popup_message = message.to_string();
    }

    fn close_popup(&mut self) {
        self.modus = Modus::Table;
        self.popup_title.clear();
        self.popup_message.clear();
    }
}
