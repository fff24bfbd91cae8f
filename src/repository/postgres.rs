use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;
use tracing::{debug, info};

use super::{Game, NewGame, NewTaxonomy, Repository, TaxonomyEntity, TaxonomyKind};

/// Postgres-backed repository. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

fn link_table(kind: TaxonomyKind) -> String {
    format!("games_{}", kind.table())
}

fn link_column(kind: TaxonomyKind) -> String {
    format!("{}_id", kind.as_str())
}

fn taxonomy_from_row(kind: TaxonomyKind, row: &PgRow) -> Result<TaxonomyEntity> {
    Ok(TaxonomyEntity {
        id: row.try_get("id")?,
        kind,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
    })
}

impl PgRepository {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .context("connect to postgres")?;
        info!(max_connections, "postgres pool ready");
        Ok(Self { pool })
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("apply migrations")?;
        Ok(())
    }

    async fn load_references(&self, game_id: i64, kind: TaxonomyKind) -> Result<Vec<i64>> {
        let sql = format!(
            "SELECT {col} FROM {table} WHERE game_id = $1 ORDER BY {col}",
            col = link_column(kind),
            table = link_table(kind)
        );
        let ids: Vec<i64> = sqlx::query_scalar(&sql)
            .persistent(false)
            .bind(game_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn find_taxonomy(&self, kind: TaxonomyKind, name: &str) -> Result<Vec<TaxonomyEntity>> {
        let sql = format!("SELECT id, name, slug FROM {} WHERE name = $1", kind.table());
        let rows = sqlx::query(&sql)
            .persistent(false)
            .bind(name)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("select {kind} {name:?}"))?;
        rows.iter().map(|r| taxonomy_from_row(kind, r)).collect()
    }

    async fn create_taxonomy(
        &self,
        kind: TaxonomyKind,
        new: NewTaxonomy,
    ) -> Result<TaxonomyEntity> {
        let sql = format!(
            "INSERT INTO {} (name, slug) VALUES ($1, $2)
             ON CONFLICT (name) DO NOTHING
             RETURNING id, name, slug",
            kind.table()
        );
        let inserted = sqlx::query(&sql)
            .persistent(false)
            .bind(&new.name)
            .bind(&new.slug)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("insert {kind} {:?}", new.name))?;
        if let Some(row) = inserted {
            return taxonomy_from_row(kind, &row);
        }
        // Another writer got there first; converge on its row.
        debug!(%kind, name = %new.name, "insert conflicted; reading existing row");
        self.find_taxonomy(kind, &new.name)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("{kind} {:?} vanished after conflict", new.name))
    }

    async fn find_games(&self, name: &str) -> Result<Vec<Game>> {
        let rows = sqlx::query(
            "SELECT id, name, slug, price, release_date, rating, short_description, description
             FROM games WHERE name = $1",
        )
        .persistent(false)
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("select game {name:?}"))?;

        let mut games = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id")?;
            let rating: Option<String> = row.try_get("rating")?;
            let mut fields = NewGame {
                name: row.try_get("name")?,
                slug: row.try_get("slug")?,
                price: row.try_get("price")?,
                release_date: row.try_get::<Option<NaiveDate>, _>("release_date")?,
                rating: rating.and_then(|r| r.parse().ok()),
                short_description: row.try_get("short_description")?,
                description: row.try_get("description")?,
                ..Default::default()
            };
            for kind in TaxonomyKind::ALL {
                *fields.references_mut(kind) = self.load_references(id, kind).await?;
            }
            games.push(Game { id, fields });
        }
        Ok(games)
    }

    async fn create_game(&self, new: NewGame) -> Result<Game> {
        let mut tx = self.pool.begin().await?;
        let id: Option<i64> = sqlx::query_scalar(
            r#"INSERT INTO games
                 (name, slug, price, release_date, rating, short_description, description)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               ON CONFLICT (name) DO NOTHING
               RETURNING id"#,
        )
        .persistent(false)
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.price)
        .bind(new.release_date)
        .bind(new.rating.map(|r| r.as_str()))
        .bind(&new.short_description)
        .bind(&new.description)
        .fetch_optional(&mut *tx)
        .await
        .with_context(|| format!("insert game {:?}", new.name))?;
        let id = id.ok_or_else(|| anyhow!("game {:?} already exists", new.name))?;

        for kind in TaxonomyKind::ALL {
            let refs = new.references(kind);
            if refs.is_empty() {
                continue;
            }
            let sql = format!(
                "INSERT INTO {table} (game_id, {col})
                 SELECT $1, unnest($2::bigint[])
                 ON CONFLICT DO NOTHING",
                table = link_table(kind),
                col = link_column(kind)
            );
            sqlx::query(&sql)
                .persistent(false)
                .bind(id)
                .bind(refs)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("link game {id} to {kind}"))?;
        }
        tx.commit().await?;
        Ok(Game { id, fields: new })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_names_follow_kind() {
        assert_eq!(link_table(TaxonomyKind::Category), "games_categories");
        assert_eq!(link_column(TaxonomyKind::Category), "category_id");
        assert_eq!(link_table(TaxonomyKind::Platform), "games_platforms");
        assert_eq!(link_column(TaxonomyKind::Publisher), "publisher_id");
    }
}
