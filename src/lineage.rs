use tracing::warn;

use crate::config::AppConfig;

// Fully qualified table coordinates as the catalog addresses them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub database: String,
    pub cluster: String,
    pub schema: String,
    pub table: String,
}

impl TableRef {
    /// Parses a catalog table uri of the form
    /// `database://cluster.schema/table`, e.g.
    /// `postgres://training_db.public/data_set_examples`.
    pub fn parse(uri: &str) -> Option<Self> {
        let parts: Vec<&str> = uri.split('/').collect();
        if parts.len() < 4 {
            return None;
        }
        let database = parts[0].split(':').next()?;
        let mut cluster_schema = parts[2].split('.');
        let cluster = cluster_schema.next()?;
        let schema = cluster_schema.next()?;
        let table = parts[3];
        if database.is_empty() || cluster.is_empty() || schema.is_empty() || table.is_empty() {
            return None;
        }
        Some(TableRef {
            database: database.to_string(),
            cluster: cluster.to_string(),
            schema: schema.to_string(),
            table: table.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageLink {
    pub label: String,
    pub href: String,
    pub image: String,
}

/// Builds one link per upstream/downstream uri, labelled with the uri
/// itself. Uris that do not parse are skipped, a broken lineage entry must
/// not take down the rest of the list.
pub fn upstream_downstream_links(uris: &[String], config: &AppConfig) -> Vec<LineageLink> {
    uris.iter()
        .filter_map(|uri| match TableRef::parse(uri) {
            Some(table) => Some(LineageLink {
                label: uri.clone(),
                href: config.table_detail_url(&table),
                image: config.lineage_image_path(&table),
            }),
            None => {
                warn!("Skipping unparseable lineage uri {uri:?}");
                None
            }
        })
        .collect()
}

// Header link to the rendered lineage graph of the table itself.
pub fn lineage_graph_link(table: &TableRef, config: &AppConfig) -> LineageLink {
    LineageLink {
        label: "Lineage Graph".to_string(),
        href: config.lineage_graph_url(table),
        image: config.table_lineage.icon_path.clone(),
    }
}
