use std::io::{Error, ErrorKind};
use std::path::Path;

// Crate wide error type. Loading problems are split out of the raw io error
// so the cli can report them without chasing ErrorKind.
#[derive(Debug)]
pub enum CatvError {
    IoError(Error),
    ParseError(serde_json::Error),
    FileNotFound,
    PermissionDenied,
    LoadingFailed(String),
}

impl From<Error> for CatvError {
    fn from(err: Error) -> Self {
        CatvError::IoError(err)
    }
}

impl From<serde_json::Error> for CatvError {
    fn from(err: serde_json::Error) -> Self {
        CatvError::ParseError(err)
    }
}

pub fn read_to_string(path: &Path) -> Result<String, CatvError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => CatvError::FileNotFound,
        ErrorKind::PermissionDenied => CatvError::PermissionDenied,
        _ => CatvError::IoError(e),
    })
}

// Runtime knobs that are not part of the catalog app config.
#[derive(Debug, Clone)]
pub struct CatvConfig {
    pub event_poll_time: u64,
}

impl Default for CatvConfig {
    fn default() -> Self {
        CatvConfig {
            event_poll_time: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    ToggleExpand,
    CycleSort,
    RequestDescription,
    ShowLineage,
    Help,
    Exit,
    Resize(usize, usize),
}

pub const EMPTY_MESSAGE: &str = "There is no column information available";
pub const MORE_BUTTON_TEXT: &str = "More info";
pub const REQUEST_DESCRIPTION_TEXT: &str = "Request Description";
pub const EDITABLE_SECTION_TITLE: &str = "Description";
pub const COLUMN_STATS_TITLE: &str = "Column Statistics";
pub const NO_LINEAGE_MESSAGE: &str = "No tables in direct lineage";

pub const HELP_TEXT: &str = "catv - data catalog column browser

  Up/k, Down/j     move selection
  PageUp/PageDown  move one page
  g / G            first / last column
  Enter            expand or collapse the selected column
  s                cycle sort criteria
  r                request a description for the selected column
  l                show table lineage
  ?                this help
  Esc              close popup / collapse
  q                quit";
