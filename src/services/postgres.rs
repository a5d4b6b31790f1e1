use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::time::Duration;

use crate::models::{CatalogItem, PerformanceSample, SelectionFilters};
use crate::services::store::{check_samples, CurveStore, StoreError};

// Five binds per row keeps each insert well under Postgres' 65535 parameter cap
const INSERT_CHUNK_ROWS: usize = 1000;

const ITEM_COLUMNS: &str = r#"
    item_id, name, rated_flow, rated_head, rated_power, rated_efficiency,
    max_flow, max_head, pump_type, material, application,
    max_temperature, max_pressure
"#;

/// PostgreSQL-backed catalog and curve store
///
/// Pumps live in `pumps`; their curves in `pump_performance_points`. Curve
/// replacement runs in a single transaction so concurrent selections see the
/// old curve until the new one commits.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Insert or update a catalog item
    ///
    /// The stored curve is left untouched; callers decide whether the change
    /// needs a regeneration. Items that fail validation never reach the table.
    pub async fn upsert_item(&self, item: &CatalogItem) -> Result<(), StoreError> {
        item.validate().map_err(|e| StoreError::InvalidInput(e.to_string()))?;

        let query = r#"
            INSERT INTO pumps (
                item_id, name, rated_flow, rated_head, rated_power, rated_efficiency,
                max_flow, max_head, pump_type, material, application,
                max_temperature, max_pressure
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (item_id)
            DO UPDATE SET
                name = EXCLUDED.name,
                rated_flow = EXCLUDED.rated_flow,
                rated_head = EXCLUDED.rated_head,
                rated_power = EXCLUDED.rated_power,
                rated_efficiency = EXCLUDED.rated_efficiency,
                max_flow = EXCLUDED.max_flow,
                max_head = EXCLUDED.max_head,
                pump_type = EXCLUDED.pump_type,
                material = EXCLUDED.material,
                application = EXCLUDED.application,
                max_temperature = EXCLUDED.max_temperature,
                max_pressure = EXCLUDED.max_pressure,
                updated_at = NOW()
        "#;

        sqlx::query(query)
            .bind(&item.item_id)
            .bind(&item.name)
            .bind(item.rated_flow)
            .bind(item.rated_head)
            .bind(item.rated_power)
            .bind(item.rated_efficiency)
            .bind(item.max_flow)
            .bind(item.max_head)
            .bind(&item.pump_type)
            .bind(&item.material)
            .bind(&item.application)
            .bind(item.max_temperature)
            .bind(item.max_pressure)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Upserted catalog item {}", item.item_id);

        Ok(())
    }

    /// All catalog item ids, for batch curve regeneration
    pub async fn list_item_ids(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT item_id FROM pumps ORDER BY item_id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get("item_id").map_err(StoreError::from))
            .collect()
    }

    /// When an item's curve was last written, if ever
    pub async fn curve_generated_at(
        &self,
        item_id: &str,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let row = sqlx::query("SELECT curve_generated_at FROM pumps WHERE item_id = $1")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("catalog item {}", item_id)))?;

        Ok(row.try_get("curve_generated_at")?)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn item_from_row(row: &PgRow) -> Result<CatalogItem, sqlx::Error> {
    Ok(CatalogItem {
        item_id: row.try_get("item_id")?,
        name: row.try_get("name")?,
        rated_flow: row.try_get("rated_flow")?,
        rated_head: row.try_get("rated_head")?,
        rated_power: row.try_get("rated_power")?,
        rated_efficiency: row.try_get("rated_efficiency")?,
        max_flow: row.try_get("max_flow")?,
        max_head: row.try_get("max_head")?,
        pump_type: row.try_get("pump_type")?,
        material: row.try_get("material")?,
        application: row.try_get("application")?,
        max_temperature: row.try_get("max_temperature")?,
        max_pressure: row.try_get("max_pressure")?,
    })
}

fn sample_from_row(row: &PgRow) -> Result<PerformanceSample, sqlx::Error> {
    Ok(PerformanceSample {
        item_id: row.try_get("item_id")?,
        flow_rate: row.try_get("flow_rate")?,
        head: row.try_get("head")?,
        power: row.try_get("power")?,
        efficiency: row.try_get("efficiency")?,
    })
}

/// Build the candidate query for a duty point and item filters
fn candidate_query(
    required_flow: f64,
    required_head: f64,
    filters: &SelectionFilters,
    limit: usize,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        r#"
            SELECT pp.item_id, pp.flow_rate, pp.head, pp.power, pp.efficiency
            FROM pump_performance_points pp
            JOIN pumps p ON p.item_id = pp.item_id
            WHERE pp.flow_rate >= "#,
    );
    qb.push_bind(required_flow);
    qb.push(" AND pp.head >= ");
    qb.push_bind(required_head);

    if let Some(pump_type) = &filters.pump_type {
        qb.push(" AND p.pump_type = ");
        qb.push_bind(pump_type.clone());
    }
    if let Some(material) = &filters.material {
        qb.push(" AND p.material = ");
        qb.push_bind(material.clone());
    }
    if let Some(application) = &filters.application {
        qb.push(" AND p.application = ");
        qb.push_bind(application.clone());
    }
    if let Some(temperature) = filters.fluid_temperature {
        qb.push(" AND p.max_temperature >= ");
        qb.push_bind(temperature);
    }
    if let Some(pressure) = filters.working_pressure {
        qb.push(" AND p.max_pressure >= ");
        qb.push_bind(pressure);
    }

    qb.push(" LIMIT ");
    qb.push_bind(limit as i64);
    qb
}

impl CurveStore for PostgresClient {
    async fn get_item(&self, item_id: &str) -> Result<CatalogItem, StoreError> {
        let query = format!("SELECT {} FROM pumps WHERE item_id = $1", ITEM_COLUMNS);

        let row = sqlx::query(&query)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("catalog item {}", item_id)))?;

        Ok(item_from_row(&row)?)
    }

    async fn get_items(&self, item_ids: &[String]) -> Result<Vec<CatalogItem>, StoreError> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {} FROM pumps WHERE item_id = ANY($1)", ITEM_COLUMNS);

        let rows = sqlx::query(&query)
            .bind(item_ids)
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .iter()
            .map(item_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    async fn list_samples_satisfying(
        &self,
        required_flow: f64,
        required_head: f64,
        filters: &SelectionFilters,
        limit: usize,
    ) -> Result<Vec<PerformanceSample>, StoreError> {
        let mut qb = candidate_query(required_flow, required_head, filters, limit);
        let rows = qb.build().fetch_all(&self.pool).await?;

        let samples = rows
            .iter()
            .map(sample_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            "Curve store returned {} samples for flow >= {}, head >= {}",
            samples.len(),
            required_flow,
            required_head
        );

        Ok(samples)
    }

    async fn replace_samples(
        &self,
        item_id: &str,
        samples: Vec<PerformanceSample>,
    ) -> Result<(), StoreError> {
        check_samples(item_id, &samples)?;

        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE pumps SET curve_generated_at = $2 WHERE item_id = $1")
            .bind(item_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            return Err(StoreError::NotFound(format!("catalog item {}", item_id)));
        }

        sqlx::query("DELETE FROM pump_performance_points WHERE item_id = $1")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        for chunk in samples.chunks(INSERT_CHUNK_ROWS) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO pump_performance_points (item_id, flow_rate, head, power, efficiency) ",
            );
            qb.push_values(chunk, |mut b, sample| {
                b.push_bind(sample.item_id.clone())
                    .push_bind(sample.flow_rate)
                    .push_bind(sample.head)
                    .push_bind(sample.power)
                    .push_bind(sample.efficiency);
            });
            qb.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        tracing::info!("Replaced curve for {} ({} samples)", item_id, samples.len());

        Ok(())
    }
}
