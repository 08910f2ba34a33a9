pub mod rubric;
mod rules;

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Category, CategoryId, Opportunity, OpportunityId, OpportunitySkill, SkillId, VolunteerProfile,
};
use rubric::MATCH_THRESHOLD;

pub(crate) use rules::days_until_start;

/// Rubric dimension a score component was awarded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFactor {
    Skills,
    Interests,
    Remote,
    Proximity,
    Availability,
    Recency,
}

/// Discrete contribution to a match score. Components without a reason are silent bonuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: MatchFactor,
    pub points: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Immutable scoring result for a single opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScore {
    pub opportunity_id: OpportunityId,
    pub total: u16,
    pub components: Vec<ScoreComponent>,
}

impl MatchScore {
    fn from_components(opportunity_id: OpportunityId, components: Vec<ScoreComponent>) -> Self {
        let total = components
            .iter()
            .fold(0u16, |acc, component| acc.saturating_add(component.points));
        Self {
            opportunity_id,
            total,
            components,
        }
    }

    /// Human-readable reasons in rubric order.
    pub fn reasons(&self) -> Vec<String> {
        self.components
            .iter()
            .filter_map(|component| component.reason.clone())
            .collect()
    }

    pub fn qualifies(&self) -> bool {
        self.total >= MATCH_THRESHOLD
    }

    pub fn points_for(&self, factor: MatchFactor) -> u16 {
        self.components
            .iter()
            .filter(|component| component.factor == factor)
            .map(|component| component.points)
            .sum()
    }
}

/// Per-run inputs shared by every opportunity evaluation.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    volunteer_skills: HashSet<SkillId>,
    categories: HashMap<CategoryId, Category>,
    now: DateTime<Utc>,
}

impl ScoringContext {
    pub fn new(
        volunteer_skills: impl IntoIterator<Item = SkillId>,
        categories: impl IntoIterator<Item = Category>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            volunteer_skills: volunteer_skills.into_iter().collect(),
            categories: categories
                .into_iter()
                .map(|category| (category.id.clone(), category))
                .collect(),
            now,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn volunteer_skill_count(&self) -> usize {
        self.volunteer_skills.len()
    }
}

/// Stateless scorer applying the fixed rubric to one opportunity at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchScorer;

impl MatchScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(
        &self,
        profile: &VolunteerProfile,
        opportunity: &Opportunity,
        opportunity_skills: &[OpportunitySkill],
        context: &ScoringContext,
    ) -> MatchScore {
        let category = context.categories.get(&opportunity.category_id);

        let components = [
            rules::skill_overlap(&context.volunteer_skills, opportunity_skills),
            rules::interest_overlap(&profile.interests, category),
            rules::location_fit(&profile.location, opportunity),
            rules::availability(profile),
            rules::recency(opportunity.start_date, context.now()),
        ]
        .into_iter()
        .flatten()
        .collect();

        MatchScore::from_components(opportunity.id.clone(), components)
    }
}
