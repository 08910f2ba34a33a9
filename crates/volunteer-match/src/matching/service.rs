use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use super::domain::{
    MatchFlags, MatchRecord, MatchRow, OpportunityId, ProfileId, VolunteerProfile,
};
use super::repository::{MatchDataSource, MatchStore, RepositoryError};
use super::scoring::{days_until_start, MatchScore, MatchScorer, ScoringContext};

/// Service composing the data source, the rubric, and the match store.
pub struct MatchService<D, S> {
    source: Arc<D>,
    store: Arc<S>,
    scorer: MatchScorer,
}

impl<D, S> MatchService<D, S>
where
    D: MatchDataSource + 'static,
    S: MatchStore + 'static,
{
    pub fn new(source: Arc<D>, store: Arc<S>) -> Self {
        Self {
            source,
            store,
            scorer: MatchScorer::new(),
        }
    }

    /// Recompute and persist matches for a profile. Never fails; inspect the outcome instead.
    pub fn generate_matches(&self, profile: &VolunteerProfile) -> MatchRunOutcome {
        self.generate_matches_at(profile, Utc::now())
    }

    pub fn generate_matches_at(
        &self,
        profile: &VolunteerProfile,
        now: DateTime<Utc>,
    ) -> MatchRunOutcome {
        match self.try_generate_matches_at(profile, now) {
            Ok(summary) if summary.qualifying == 0 => MatchRunOutcome::NoQualifying(summary),
            Ok(summary) => MatchRunOutcome::Persisted(summary),
            Err(err) => {
                error!(profile_id = %profile.id, error = %err, "match generation failed");
                MatchRunOutcome::Failed {
                    profile_id: profile.id.clone(),
                    error: err,
                }
            }
        }
    }

    /// Same run as [`generate_matches_at`](Self::generate_matches_at) with errors surfaced.
    pub fn try_generate_matches_at(
        &self,
        profile: &VolunteerProfile,
        now: DateTime<Utc>,
    ) -> Result<MatchRunSummary, MatchServiceError> {
        let scores = self.score_active(profile, now)?;
        let evaluated = scores.len();
        let top_score = scores.iter().map(|score| score.total).max();

        let rows: Vec<MatchRow> = scores
            .into_iter()
            .filter(MatchScore::qualifies)
            .map(|score| MatchRow {
                profile_id: profile.id.clone(),
                match_score: score.total,
                match_reasons: score.reasons(),
                opportunity_id: score.opportunity_id,
            })
            .collect();
        let qualifying = rows.len();

        if !rows.is_empty() {
            self.store
                .upsert_matches(rows)
                .map_err(|source| MatchServiceError::Write { source })?;
        }

        info!(
            profile_id = %profile.id,
            evaluated,
            qualifying,
            "match generation complete"
        );

        Ok(MatchRunSummary {
            profile_id: profile.id.clone(),
            evaluated,
            qualifying,
            top_score,
        })
    }

    /// Score every active opportunity without persisting anything, best first.
    pub fn rank(
        &self,
        profile: &VolunteerProfile,
        now: DateTime<Utc>,
    ) -> Result<Vec<MatchScore>, MatchServiceError> {
        let mut scores = self.score_active(profile, now)?;
        scores.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.opportunity_id.cmp(&b.opportunity_id))
        });
        Ok(scores)
    }

    /// Non-dismissed matches for the feed, highest score first.
    pub fn list_matches(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<MatchRecord>, MatchServiceError> {
        let mut records: Vec<MatchRecord> = self
            .store
            .list_matches(profile_id)?
            .into_iter()
            .filter(|record| !record.dismissed)
            .collect();
        records.sort_by_key(|record| (Reverse(record.match_score), record.opportunity_id.clone()));
        Ok(records)
    }

    pub fn mark_viewed(
        &self,
        profile_id: &ProfileId,
        opportunity_id: &OpportunityId,
    ) -> Result<(), MatchServiceError> {
        self.store
            .update_flags(profile_id, opportunity_id, MatchFlags::viewed())?;
        Ok(())
    }

    pub fn dismiss(
        &self,
        profile_id: &ProfileId,
        opportunity_id: &OpportunityId,
    ) -> Result<(), MatchServiceError> {
        self.store
            .update_flags(profile_id, opportunity_id, MatchFlags::dismissed())?;
        Ok(())
    }

    fn score_active(
        &self,
        profile: &VolunteerProfile,
        now: DateTime<Utc>,
    ) -> Result<Vec<MatchScore>, MatchServiceError> {
        let opportunities = self
            .source
            .list_active_opportunities()
            .map_err(ReadStage::Opportunities.wrap())?;
        let skill_ids = self
            .source
            .list_skill_ids_for_profile(&profile.id)
            .map_err(ReadStage::VolunteerSkills.wrap())?;
        let categories = self
            .source
            .list_categories()
            .map_err(ReadStage::Categories.wrap())?;

        let context = ScoringContext::new(skill_ids, categories, now);
        debug!(
            profile_id = %profile.id,
            opportunities = opportunities.len(),
            volunteer_skills = context.volunteer_skill_count(),
            "scoring active opportunities"
        );

        opportunities
            .iter()
            .filter(|opportunity| opportunity.active)
            .map(|opportunity| -> Result<MatchScore, MatchServiceError> {
                let skills = self
                    .source
                    .list_opportunity_skills(&opportunity.id)
                    .map_err(ReadStage::OpportunitySkills(opportunity.id.clone()).wrap())?;
                let score = self.scorer.score(profile, opportunity, &skills, &context);
                debug!(
                    profile_id = %profile.id,
                    opportunity_id = %opportunity.id,
                    total = score.total,
                    days_until_start = days_until_start(opportunity.start_date, context.now()),
                    "scored opportunity"
                );
                Ok(score)
            })
            .collect()
    }
}

/// Counts describing a completed match run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRunSummary {
    pub profile_id: ProfileId,
    pub evaluated: usize,
    pub qualifying: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_score: Option<u16>,
}

/// Observable result of a fail-soft match run.
#[derive(Debug)]
pub enum MatchRunOutcome {
    Persisted(MatchRunSummary),
    NoQualifying(MatchRunSummary),
    Failed {
        profile_id: ProfileId,
        error: MatchServiceError,
    },
}

impl MatchRunOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, MatchRunOutcome::Failed { .. })
    }

    pub fn summary(&self) -> Option<&MatchRunSummary> {
        match self {
            MatchRunOutcome::Persisted(summary) | MatchRunOutcome::NoQualifying(summary) => {
                Some(summary)
            }
            MatchRunOutcome::Failed { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchRunOutcome::Persisted(_) => "persisted",
            MatchRunOutcome::NoQualifying(_) => "no_qualifying",
            MatchRunOutcome::Failed { .. } => "failed",
        }
    }

    pub fn view(&self) -> MatchRunView {
        match self {
            MatchRunOutcome::Persisted(summary) | MatchRunOutcome::NoQualifying(summary) => {
                MatchRunView {
                    profile_id: summary.profile_id.clone(),
                    status: self.label(),
                    evaluated: summary.evaluated,
                    qualifying: summary.qualifying,
                    error: None,
                }
            }
            MatchRunOutcome::Failed { profile_id, error } => MatchRunView {
                profile_id: profile_id.clone(),
                status: self.label(),
                evaluated: 0,
                qualifying: 0,
                error: Some(error.to_string()),
            },
        }
    }
}

/// Sanitized representation of a match run for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRunView {
    pub profile_id: ProfileId,
    pub status: &'static str,
    pub evaluated: usize,
    pub qualifying: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Collaborator query that failed during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStage {
    Opportunities,
    VolunteerSkills,
    Categories,
    OpportunitySkills(OpportunityId),
}

impl ReadStage {
    fn wrap(self) -> impl FnOnce(RepositoryError) -> MatchServiceError {
        move |source| MatchServiceError::Read {
            stage: self,
            source,
        }
    }
}

impl fmt::Display for ReadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadStage::Opportunities => write!(f, "active opportunities"),
            ReadStage::VolunteerSkills => write!(f, "volunteer skills"),
            ReadStage::Categories => write!(f, "categories"),
            ReadStage::OpportunitySkills(id) => write!(f, "skills for opportunity {id}"),
        }
    }
}

/// Error raised by the match service.
#[derive(Debug, thiserror::Error)]
pub enum MatchServiceError {
    #[error("failed to read {stage}: {source}")]
    Read {
        stage: ReadStage,
        #[source]
        source: RepositoryError,
    },
    #[error("failed to upsert matches: {source}")]
    Write {
        #[source]
        source: RepositoryError,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
