use std::time::Duration;

use anyhow::Context;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use log::{info, warn};
use tokio_postgres::NoTls;

use crate::config::PostgresSettings;

const SCHEMA: &str = include_str!("../../../schema/postgres.sql");

const MAX_CONNECT_ATTEMPTS: u32 = 3;

/// Split SQL into statements on `;`, ignoring semicolons inside `$$ ... $$`
/// blocks (function bodies).
fn split_sql_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut in_dollar_quote = false;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '$' if chars.peek().map(|&(_, next)| next) == Some('$') => {
                chars.next();
                in_dollar_quote = !in_dollar_quote;
            },
            ';' if !in_dollar_quote => {
                statements.push(&sql[start..i]);
                start = i + 1;
            },
            _ => {},
        }
    }
    statements.push(&sql[start..]);

    statements.retain(|stmt| !stmt.trim().is_empty());
    statements
}

/// PostgreSQL client with connection pooling.
///
/// Backs the token registry and the runtime `system_config` row. Uses
/// `deadpool-postgres` for connection management.
#[derive(Clone)]
pub struct PostgresClient {
    pub pool: Pool,
}

impl PostgresClient {
    /// Build the pool and verify a connection can be checked out, retrying
    /// with exponential backoff.
    pub async fn new(settings: PostgresSettings) -> anyhow::Result<Self> {
        info!(
            "[REGISTRY] Connecting to PostgreSQL at {}:{}/{}",
            settings.host, settings.port, settings.database
        );

        let mut pg_config = tokio_postgres::Config::new();
        pg_config
            .host(&settings.host)
            .port(settings.port)
            .user(&settings.user)
            .password(&settings.password)
            .dbname(&settings.database);

        let mgr = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(mgr)
            .max_size(settings.pool_size)
            .build()
            .context("Failed to create PostgreSQL connection pool")?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match pool.get().await {
                Ok(_conn) => {
                    info!("[REGISTRY] Connected to PostgreSQL");
                    return Ok(Self {
                        pool,
                    });
                },
                Err(e) if attempt < MAX_CONNECT_ATTEMPTS => {
                    let delay = Duration::from_millis(100 * 2_u64.pow(attempt));
                    warn!(
                        "[REGISTRY] PostgreSQL connection failed (attempt {}/{}): {}, retrying in {:?}",
                        attempt, MAX_CONNECT_ATTEMPTS, e, delay
                    );
                    tokio::time::sleep(delay).await;
                },
                Err(e) => {
                    return Err(anyhow::anyhow!(
                        "Failed to connect to PostgreSQL at {}:{} after {} attempts: {}",
                        settings.host,
                        settings.port,
                        attempt,
                        e
                    ));
                },
            }
        }
    }

    /// Apply the embedded schema. Every statement is idempotent.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        let client = self.pool.get().await?;

        for stmt in split_sql_statements(SCHEMA) {
            let stmt = stmt.trim();
            client
                .execute(stmt, &[])
                .await
                .with_context(|| format!("Failed to execute migration statement: {}", stmt))?;
        }

        info!("[REGISTRY] PostgreSQL schema applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_respects_dollar_quotes() {
        let sql = "CREATE SCHEMA a; CREATE FUNCTION f() RETURNS void AS $$ BEGIN PERFORM 1; END; $$ LANGUAGE plpgsql; SELECT 1";
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts.len(), 3);
        assert!(stmts[1].contains("PERFORM 1; END;"));
        assert_eq!(stmts[2].trim(), "SELECT 1");
    }

    #[test]
    fn test_split_skips_blank_statements() {
        let stmts = split_sql_statements(";;\n  ;CREATE TABLE t (id INT);\n");
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn test_split_handles_multibyte_text() {
        let stmts = split_sql_statements("COMMENT ON TABLE t IS 'prix €'; SELECT 2;");
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].ends_with("'prix €'"));
    }

    #[test]
    fn test_embedded_schema_creates_registry_tables() {
        let stmts = split_sql_statements(SCHEMA);
        assert!(stmts.iter().any(|s| s.contains("pricing.token_registry (")));
        assert!(stmts.iter().any(|s| s.contains("pricing.system_config (")));
    }
}
