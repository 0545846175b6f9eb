//! MySQL hierarchy store over the `tags` table

use async_trait::async_trait;
use sqlx::Row;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use tracing::{debug, info};

use super::store::HierarchyStore;
use super::types::{DataSourceError, Node};
use crate::config::DatabaseConfig;

/// Columns selected for every node query.
/// Ids are cast so that signed and unsigned schemas both decode as `i64`.
const NODE_COLUMNS: &str = "CAST(id AS SIGNED) AS id, name, CAST(parent_id AS SIGNED) AS parent_id";

/// Hierarchy store reading `id, name, parent_id` rows from MySQL
///
/// Holds a single-connection pool: lookups are issued one at a time while
/// walking parent chains, so a wider pool would sit idle. Call
/// [`MySqlHierarchyStore::close`] once sampling is done.
pub struct MySqlHierarchyStore {
    pool: MySqlPool,
}

impl MySqlHierarchyStore {
    /// Connect using the `tag_db` section of the configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DataSourceError> {
        let options = connect_options(config)?;

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(config.connect_timeout())
            .connect_with(options)
            .await
            .map_err(DataSourceError::Connect)?;

        info!("Connected to tag database at {}", config.display_target());
        Ok(Self { pool })
    }

    /// Release the connection
    pub async fn close(self) {
        self.pool.close().await;
        debug!("Closed tag database connection");
    }
}

/// Build connect options from either a URL or discrete fields
fn connect_options(config: &DatabaseConfig) -> Result<MySqlConnectOptions, DataSourceError> {
    if let Some(ref url) = config.url {
        return url
            .parse::<MySqlConnectOptions>()
            .map_err(DataSourceError::Connect);
    }

    let mut options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user);
    if let Some(ref password) = config.password {
        options = options.password(password);
    }
    if let Some(ref database) = config.database {
        options = options.database(database);
    }
    Ok(options)
}

fn node_from_row(row: &MySqlRow) -> Result<Node, DataSourceError> {
    let id: i64 = row.try_get("id").map_err(DataSourceError::Query)?;
    let parent_id: Option<i64> = row
        .try_get("parent_id")
        .map_err(|e| DataSourceError::MalformedRow {
            id,
            reason: e.to_string(),
        })?;
    // Names are diagnostic only; an undecodable name is not worth failing the run
    let name: String = row
        .try_get::<Option<String>, _>("name")
        .ok()
        .flatten()
        .unwrap_or_default();

    Ok(Node {
        id,
        name,
        parent_id,
    })
}

#[async_trait]
impl HierarchyStore for MySqlHierarchyStore {
    async fn nodes_of_category(&self, category: &str) -> Result<Vec<Node>, DataSourceError> {
        let query = format!("SELECT {NODE_COLUMNS} FROM tags WHERE type = ?");
        let rows = sqlx::query(&query)
            .bind(category)
            .fetch_all(&self.pool)
            .await
            .map_err(DataSourceError::Query)?;

        debug!("Fetched {} tags of type '{}'", rows.len(), category);
        rows.iter().map(node_from_row).collect()
    }

    async fn parent_of(&self, node: &Node) -> Result<Option<Node>, DataSourceError> {
        let Some(parent_id) = node.parent_id else {
            return Ok(None);
        };

        debug!(
            "Getting parent of {}, which will have id {}",
            node.name, parent_id
        );
        let query = format!("SELECT {NODE_COLUMNS} FROM tags WHERE id = ?");
        let row = sqlx::query(&query)
            .bind(parent_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DataSourceError::Query)?;

        row.as_ref().map(node_from_row).transpose()
    }
}
