use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::columns::{SortCriteria, SortDirection};
use crate::domain::{CatvError, read_to_string};
use crate::lineage::TableRef;

// Catalog application config. Every section has a default matching the
// stock deployment, a config file only needs to override what it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mail_client_features: MailClientFeatures,
    pub max_lengths: MaxLengths,
    pub sort_criterias: SortCriteriaOptions,
    pub table_lineage: TableLineage,
    pub frontend_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailClientFeatures {
    pub notifications_enabled: bool,
}

impl Default for MailClientFeatures {
    fn default() -> Self {
        MailClientFeatures {
            notifications_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MaxLengths {
    pub column_desc_length: usize,
    pub table_desc_length: usize,
}

impl Default for MaxLengths {
    fn default() -> Self {
        MaxLengths {
            column_desc_length: 250,
            table_desc_length: 750,
        }
    }
}

// Which optional sort criteria the column list offers. The table default
// ordering is always available.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SortCriteriaOptions {
    pub usage: bool,
    pub name: bool,
}

impl Default for SortCriteriaOptions {
    fn default() -> Self {
        SortCriteriaOptions {
            usage: true,
            name: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TableLineage {
    pub is_enabled: bool,
    pub icon_path: String,
}

impl Default for TableLineage {
    fn default() -> Self {
        TableLineage {
            is_enabled: true,
            icon_path: "PATH_TO_ICON".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            mail_client_features: MailClientFeatures::default(),
            max_lengths: MaxLengths::default(),
            sort_criterias: SortCriteriaOptions::default(),
            table_lineage: TableLineage::default(),
            frontend_base_url: "http://localhost:5000".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, CatvError> {
        let raw = read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&raw)?;
        debug!("Loaded app config from {}", path.display());
        Ok(config)
    }

    pub fn notifications_enabled(&self) -> bool {
        self.mail_client_features.notifications_enabled
    }

    pub fn usage_sort_enabled(&self) -> bool {
        self.sort_criterias.usage
    }

    // Lookup keyed the way the editable widgets ask for it.
    pub fn max_length(&self, key: &str) -> Option<usize> {
        match key {
            "columnDescLength" => Some(self.max_lengths.column_desc_length),
            "tableDescLength" => Some(self.max_lengths.table_desc_length),
            _ => None,
        }
    }

    pub fn table_sort_criterias(&self) -> Vec<SortCriteria> {
        let mut criterias = vec![SortCriteria::table_default()];
        if self.sort_criterias.usage {
            criterias.push(SortCriteria {
                display_name: "Usage Count".to_string(),
                key: "usage".to_string(),
                direction: SortDirection::Descending,
            });
        }
        if self.sort_criterias.name {
            criterias.push(SortCriteria {
                display_name: "Alphabetical".to_string(),
                key: "name".to_string(),
                direction: SortDirection::Ascending,
            });
        }
        criterias
    }

    pub fn table_detail_url(&self, table: &TableRef) -> String {
        format!(
            "{}/table_detail/{}/{}/{}/{}",
            self.frontend_base_url, table.cluster, table.database, table.schema, table.table
        )
    }

    pub fn lineage_image_path(&self, table: &TableRef) -> String {
        format!(
            "/static/images/{}.{}.{}.gv.png",
            table.cluster, table.schema, table.table
        )
    }

    pub fn lineage_graph_url(&self, table: &TableRef) -> String {
        format!(
            "{}/static/images/graph/{}.{}.{}.gv.png",
            self.frontend_base_url, table.cluster, table.schema, table.table
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TableRef {
        TableRef {
            database: "postgres".to_string(),
            cluster: "training_db".to_string(),
            schema: "public".to_string(),
            table: "data_set_examples".to_string(),
        }
    }

    #[test]
    fn defaults_match_the_stock_deployment() {
        let config = AppConfig::default();
        assert!(config.notifications_enabled());
        assert!(config.usage_sort_enabled());
        assert_eq!(config.max_length("columnDescLength"), Some(250));
        assert_eq!(config.max_length("bogus"), None);
    }

    #[test]
    fn sort_criterias_follow_the_enablement_flags() {
        let mut config = AppConfig::default();
        config.sort_criterias.usage = false;
        let keys: Vec<String> = config
            .table_sort_criterias()
            .into_iter()
            .map(|c| c.key)
            .collect();
        assert_eq!(keys, vec!["sort_order", "name"]);
    }

    #[test]
    fn url_generators_fill_in_the_table_parts() {
        let config = AppConfig::default();
        assert_eq!(
            config.table_detail_url(&table()),
            "http://localhost:5000/table_detail/training_db/postgres/public/data_set_examples"
        );
        assert_eq!(
            config.lineage_image_path(&table()),
            "/static/images/training_db.public.data_set_examples.gv.png"
        );
        assert_eq!(
            config.lineage_graph_url(&table()),
            "http://localhost:5000/static/images/graph/training_db.public.data_set_examples.gv.png"
        );
    }

    #[test]
    fn partial_config_files_keep_defaults_elsewhere() {
        let config: AppConfig = serde_json::from_str(
            r#"{"mail_client_features": {"notifications_enabled": false}}"#,
        )
        .unwrap();
        assert!(!config.notifications_enabled());
        assert!(config.usage_sort_enabled());
        assert_eq!(config.frontend_base_url, "http://localhost:5000");
    }
}
