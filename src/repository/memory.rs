use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::Mutex;

use super::{Game, NewGame, NewTaxonomy, Repository, TaxonomyEntity, TaxonomyKind};

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    taxonomy: Vec<TaxonomyEntity>,
    games: Vec<Game>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process repository used for dry runs and tests.
///
/// Like the remote store it imitates, it does not enforce name uniqueness:
/// two creates for the same name produce two rows. Dedup is the caller's job.
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
    latency: Option<Duration>,
    failing_taxonomy: HashSet<(TaxonomyKind, String)>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before every operation, so concurrent callers interleave
    /// between a lookup and the following create.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every create for `(kind, name)` fail.
    pub fn with_failing_taxonomy(mut self, kind: TaxonomyKind, name: &str) -> Self {
        self.failing_taxonomy.insert((kind, name.to_string()));
        self
    }

    pub async fn taxonomy(&self, kind: TaxonomyKind) -> Vec<TaxonomyEntity> {
        let state = self.state.lock().await;
        state
            .taxonomy
            .iter()
            .filter(|t| t.kind == kind)
            .cloned()
            .collect()
    }

    pub async fn games(&self) -> Vec<Game> {
        self.state.lock().await.games.clone()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_taxonomy(&self, kind: TaxonomyKind, name: &str) -> Result<Vec<TaxonomyEntity>> {
        self.simulate_latency().await;
        let state = self.state.lock().await;
        Ok(state
            .taxonomy
            .iter()
            .filter(|t| t.kind == kind && t.name == name)
            .cloned()
            .collect())
    }

    async fn create_taxonomy(
        &self,
        kind: TaxonomyKind,
        new: NewTaxonomy,
    ) -> Result<TaxonomyEntity> {
        self.simulate_latency().await;
        if self.failing_taxonomy.contains(&(kind, new.name.clone())) {
            bail!("{kind} {:?} rejected by store", new.name);
        }
        let mut state = self.state.lock().await;
        let entity = TaxonomyEntity {
            id: state.next_id(),
            kind,
            name: new.name,
            slug: new.slug,
        };
        state.taxonomy.push(entity.clone());
        Ok(entity)
    }

    async fn find_games(&self, name: &str) -> Result<Vec<Game>> {
        self.simulate_latency().await;
        let state = self.state.lock().await;
        Ok(state
            .games
            .iter()
            .filter(|g| g.fields.name == name)
            .cloned()
            .collect())
    }

    async fn create_game(&self, new: NewGame) -> Result<Game> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;
        let game = Game {
            id: state.next_id(),
            fields: new,
        };
        state.games.push(game.clone());
        Ok(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookups_are_exact_and_scoped_by_kind() {
        let repo = MemoryRepository::new();
        let new = NewTaxonomy {
            name: "Acme".into(),
            slug: "acme".into(),
        };
        repo.create_taxonomy(TaxonomyKind::Developer, new.clone())
            .await
            .unwrap();

        assert_eq!(
            repo.find_taxonomy(TaxonomyKind::Developer, "Acme")
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(repo
            .find_taxonomy(TaxonomyKind::Developer, "acme")
            .await
            .unwrap()
            .is_empty());
        assert!(repo
            .find_taxonomy(TaxonomyKind::Publisher, "Acme")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn injected_failures_only_hit_the_named_entity() {
        let repo = MemoryRepository::new().with_failing_taxonomy(TaxonomyKind::Category, "Bad");
        let bad = NewTaxonomy {
            name: "Bad".into(),
            slug: "bad".into(),
        };
        assert!(repo
            .create_taxonomy(TaxonomyKind::Category, bad.clone())
            .await
            .is_err());
        assert!(repo
            .create_taxonomy(TaxonomyKind::Developer, bad)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn ids_are_unique_across_entities() {
        let repo = MemoryRepository::new();
        let dev = repo
            .create_taxonomy(
                TaxonomyKind::Developer,
                NewTaxonomy {
                    name: "A".into(),
                    slug: "a".into(),
                },
            )
            .await
            .unwrap();
        let game = repo
            .create_game(NewGame {
                name: "G".into(),
                slug: "g".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_ne!(dev.id, game.id);
        assert_eq!(repo.find_games("G").await.unwrap()[0].id, game.id);
    }
}
