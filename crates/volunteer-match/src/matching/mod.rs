//! Volunteer-to-opportunity matching: the scoring rubric, the run orchestration that persists
//! qualifying matches, and the feed operations the UI drives afterwards.

pub mod dataset;
pub mod domain;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use dataset::{DatasetError, MatchDataset};
pub use domain::{
    Category, CategoryId, MatchFlags, MatchRecord, MatchRow, MatchView, Opportunity,
    OpportunityId, OpportunitySkill, ProfileId, Skill, SkillId, VolunteerProfile,
    VolunteerSkill,
};
pub use repository::{MatchDataSource, MatchStore, RepositoryError};
pub use router::{match_router, MatchRunRequest};
pub use scoring::{MatchFactor, MatchScore, MatchScorer, ScoreComponent, ScoringContext};
pub use service::{
    MatchRunOutcome, MatchRunSummary, MatchRunView, MatchService, MatchServiceError, ReadStage,
};
