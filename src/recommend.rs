//! Personalization seam: an external recommender supplies property ids the
//! user is likely to care about. Failures degrade gracefully to
//! unpersonalized results; the engine never blocks a search on this.

use std::sync::Arc;

use async_trait::async_trait;

#[async_trait]
pub trait Recommender: Send + Sync {
    /// Ranked property ids for a user in a given search context.
    async fn recommended_ids(&self, user_id: &str, context: &str) -> anyhow::Result<Vec<String>>;
    fn name(&self) -> &'static str;
}

pub type DynRecommender = Arc<dyn Recommender>;

/// No-op recommender used when personalization is not wired up.
pub struct NoRecommender;

#[async_trait]
impl Recommender for NoRecommender {
    async fn recommended_ids(&self, _user_id: &str, _context: &str) -> anyhow::Result<Vec<String>> {
        Ok(Vec::new())
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Fixed-list recommender for tests.
pub struct StaticRecommender {
    pub ids: Vec<String>,
}

#[async_trait]
impl Recommender for StaticRecommender {
    async fn recommended_ids(&self, _user_id: &str, _context: &str) -> anyhow::Result<Vec<String>> {
        Ok(self.ids.clone())
    }
    fn name(&self) -> &'static str {
        "static"
    }
}
