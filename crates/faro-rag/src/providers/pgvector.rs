//! Postgres/pgvector client, the shadow search backend
//!
//! Telemetry-only: results are compared against the primary backend and
//! never reach the answer context. The pool is created lazily so an
//! unreachable shadow database costs nothing at startup and fails softly
//! per query.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::config::ShadowConfig;
use crate::error::{Error, Result};

use super::vector_search::{SearchHit, VectorSearchProvider};

/// Similarity search client for a pgvector table
pub struct PgVectorSearcher {
    pool: PgPool,
    query_sql: String,
}

impl PgVectorSearcher {
    /// Create a new pgvector searcher with a lazily-connected pool
    pub fn connect_lazy(config: &ShadowConfig) -> Result<Self> {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| Error::Config("shadow.database_url is not set".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect_lazy(url)
            .map_err(|e| Error::Config(format!("Invalid shadow database URL: {}", e)))?;

        // Table names cannot be bound as parameters; the name comes from
        // trusted configuration.
        let query_sql = format!(
            "SELECT id::text AS id, vector <=> $1::vector AS distance \
             FROM {} ORDER BY vector <=> $1::vector LIMIT $2",
            config.table
        );

        Ok(Self { pool, query_sql })
    }

    /// Render an embedding as a pgvector literal, e.g. `[0.1,0.2,...]`
    fn vector_literal(vector: &[f32]) -> String {
        let mut literal = String::with_capacity(vector.len() * 10 + 2);
        literal.push('[');
        for (i, v) in vector.iter().enumerate() {
            if i > 0 {
                literal.push(',');
            }
            literal.push_str(&v.to_string());
        }
        literal.push(']');
        literal
    }
}

#[async_trait]
impl VectorSearchProvider for PgVectorSearcher {
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        let literal = Self::vector_literal(vector);

        let rows = sqlx::query(&self.query_sql)
            .bind(&literal)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::vector_db(format!("pgvector search failed: {}", e)))?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row
                .try_get("id")
                .map_err(|e| Error::vector_db(format!("pgvector row missing id: {}", e)))?;
            let distance: f64 = row
                .try_get("distance")
                .map_err(|e| Error::vector_db(format!("pgvector row missing distance: {}", e)))?;
            // Cosine distance -> similarity
            hits.push(SearchHit::bare(id, 1.0 - distance as f32));
        }

        Ok(hits)
    }

    async fn health_check(&self) -> Result<bool> {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "pgvector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_literal() {
        assert_eq!(PgVectorSearcher::vector_literal(&[0.5, -1.0]), "[0.5,-1]");
        assert_eq!(PgVectorSearcher::vector_literal(&[]), "[]");
    }
}
