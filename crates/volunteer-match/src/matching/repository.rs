use super::domain::{
    Category, MatchFlags, MatchRecord, MatchRow, Opportunity, OpportunityId, OpportunitySkill,
    ProfileId, SkillId,
};

/// Read side of the hosted data backend consumed by the match engine.
pub trait MatchDataSource: Send + Sync {
    fn list_active_opportunities(&self) -> Result<Vec<Opportunity>, RepositoryError>;
    fn list_skill_ids_for_profile(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<SkillId>, RepositoryError>;
    fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;
    fn list_opportunity_skills(
        &self,
        opportunity_id: &OpportunityId,
    ) -> Result<Vec<OpportunitySkill>, RepositoryError>;
}

/// Match collection keyed by `(profile_id, opportunity_id)`.
///
/// `upsert_matches` inserts rows whose conflict key is new and, for existing keys, overwrites
/// the score and reasons only. `viewed` and `dismissed` belong to the UI and must survive.
pub trait MatchStore: Send + Sync {
    fn upsert_matches(&self, rows: Vec<MatchRow>) -> Result<(), RepositoryError>;
    fn list_matches(&self, profile_id: &ProfileId) -> Result<Vec<MatchRecord>, RepositoryError>;
    fn update_flags(
        &self,
        profile_id: &ProfileId,
        opportunity_id: &OpportunityId,
        flags: MatchFlags,
    ) -> Result<(), RepositoryError>;
}

/// Error enumeration for data access failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
