use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::matching::domain::{
    Category, CategoryId, MatchFlags, MatchRecord, MatchRow, Opportunity, OpportunityId,
    OpportunitySkill, ProfileId, SkillId, VolunteerProfile, VolunteerSkill,
};
use crate::matching::repository::{MatchDataSource, MatchStore, RepositoryError};
use crate::matching::scoring::ScoringContext;
use crate::matching::service::MatchService;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn days_out(days: i64) -> DateTime<Utc> {
    now() + Duration::days(days)
}

pub(super) fn blank_profile(id: &str) -> VolunteerProfile {
    VolunteerProfile {
        id: ProfileId::new(id),
        location: String::new(),
        interests: Vec::new(),
        availability: Vec::new(),
    }
}

pub(super) fn austin_profile() -> VolunteerProfile {
    VolunteerProfile {
        id: ProfileId::new("vol-austin"),
        location: "Austin, TX".to_string(),
        interests: vec!["Animal Welfare".to_string()],
        availability: vec!["Weekend Mornings".to_string()],
    }
}

pub(super) fn opportunity(id: &str, category: &str, location: &str) -> Opportunity {
    Opportunity {
        id: OpportunityId::new(id),
        title: format!("Opportunity {id}"),
        organization: "Community Partners".to_string(),
        category_id: CategoryId::new(category),
        location: location.to_string(),
        is_remote: false,
        start_date: days_out(60),
        active: true,
    }
}

pub(super) fn remote_opportunity(id: &str, category: &str) -> Opportunity {
    Opportunity {
        is_remote: true,
        location: "Online".to_string(),
        ..opportunity(id, category, "Online")
    }
}

pub(super) fn category(id: &str, name: &str) -> Category {
    Category {
        id: CategoryId::new(id),
        name: name.to_string(),
    }
}

pub(super) fn skill_rows(opportunity_id: &str, skills: &[(&str, bool)]) -> Vec<OpportunitySkill> {
    skills
        .iter()
        .map(|(skill_id, required)| OpportunitySkill {
            opportunity_id: OpportunityId::new(opportunity_id),
            skill_id: SkillId::new(*skill_id),
            required: *required,
        })
        .collect()
}

pub(super) fn context(skills: &[&str], categories: Vec<Category>) -> ScoringContext {
    ScoringContext::new(
        skills.iter().map(|skill| SkillId::new(*skill)),
        categories,
        now(),
    )
}

pub(super) fn standard_categories() -> Vec<Category> {
    vec![
        category("cat-animals", "Animal Welfare"),
        category("cat-education", "Education & Literacy"),
        category("cat-environment", "Environment"),
    ]
}

#[derive(Default)]
pub(super) struct BackendState {
    pub(super) opportunities: Vec<Opportunity>,
    pub(super) categories: Vec<Category>,
    pub(super) volunteer_skills: Vec<VolunteerSkill>,
    pub(super) opportunity_skills: Vec<OpportunitySkill>,
    pub(super) matches: BTreeMap<(ProfileId, OpportunityId), MatchRecord>,
    pub(super) upsert_calls: usize,
}

/// Data source and match store sharing one in-memory state.
#[derive(Default, Clone)]
pub(super) struct MemoryBackend {
    pub(super) state: Arc<Mutex<BackendState>>,
}

impl MemoryBackend {
    pub(super) fn seeded() -> Self {
        let backend = Self::default();
        {
            let mut state = backend.state.lock().expect("backend mutex poisoned");
            state.categories = standard_categories();
        }
        backend
    }

    pub(super) fn add_opportunity(&self, opportunity: Opportunity, skills: &[(&str, bool)]) {
        let mut state = self.state.lock().expect("backend mutex poisoned");
        state
            .opportunity_skills
            .extend(skill_rows(opportunity.id.as_str(), skills));
        state.opportunities.push(opportunity);
    }

    pub(super) fn grant_skills(&self, profile_id: &str, skills: &[&str]) {
        let mut state = self.state.lock().expect("backend mutex poisoned");
        state
            .volunteer_skills
            .extend(skills.iter().map(|skill| VolunteerSkill {
                profile_id: ProfileId::new(profile_id),
                skill_id: SkillId::new(*skill),
            }));
    }

    pub(super) fn set_remote(&self, opportunity_id: &str, is_remote: bool) {
        let mut state = self.state.lock().expect("backend mutex poisoned");
        for opportunity in state
            .opportunities
            .iter_mut()
            .filter(|opportunity| opportunity.id.as_str() == opportunity_id)
        {
            opportunity.is_remote = is_remote;
        }
    }

    pub(super) fn stored(&self, profile_id: &str, opportunity_id: &str) -> Option<MatchRecord> {
        let state = self.state.lock().expect("backend mutex poisoned");
        state
            .matches
            .get(&(ProfileId::new(profile_id), OpportunityId::new(opportunity_id)))
            .cloned()
    }

    pub(super) fn match_count(&self) -> usize {
        self.state
            .lock()
            .expect("backend mutex poisoned")
            .matches
            .len()
    }

    pub(super) fn upsert_calls(&self) -> usize {
        self.state
            .lock()
            .expect("backend mutex poisoned")
            .upsert_calls
    }
}

impl MatchDataSource for MemoryBackend {
    fn list_active_opportunities(&self) -> Result<Vec<Opportunity>, RepositoryError> {
        let state = self.state.lock().expect("backend mutex poisoned");
        Ok(state
            .opportunities
            .iter()
            .filter(|opportunity| opportunity.active)
            .cloned()
            .collect())
    }

    fn list_skill_ids_for_profile(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<SkillId>, RepositoryError> {
        let state = self.state.lock().expect("backend mutex poisoned");
        Ok(state
            .volunteer_skills
            .iter()
            .filter(|row| &row.profile_id == profile_id)
            .map(|row| row.skill_id.clone())
            .collect())
    }

    fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self
            .state
            .lock()
            .expect("backend mutex poisoned")
            .categories
            .clone())
    }

    fn list_opportunity_skills(
        &self,
        opportunity_id: &OpportunityId,
    ) -> Result<Vec<OpportunitySkill>, RepositoryError> {
        let state = self.state.lock().expect("backend mutex poisoned");
        Ok(state
            .opportunity_skills
            .iter()
            .filter(|row| &row.opportunity_id == opportunity_id)
            .cloned()
            .collect())
    }
}

impl MatchStore for MemoryBackend {
    fn upsert_matches(&self, rows: Vec<MatchRow>) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("backend mutex poisoned");
        state.upsert_calls += 1;
        for row in rows {
            match state.matches.entry(row.conflict_key()) {
                Entry::Occupied(mut existing) => existing.get_mut().apply_row(row, now()),
                Entry::Vacant(slot) => {
                    slot.insert(MatchRecord::from_row(row, now()));
                }
            }
        }
        Ok(())
    }

    fn list_matches(&self, profile_id: &ProfileId) -> Result<Vec<MatchRecord>, RepositoryError> {
        let state = self.state.lock().expect("backend mutex poisoned");
        Ok(state
            .matches
            .values()
            .filter(|record| &record.profile_id == profile_id)
            .cloned()
            .collect())
    }

    fn update_flags(
        &self,
        profile_id: &ProfileId,
        opportunity_id: &OpportunityId,
        flags: MatchFlags,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("backend mutex poisoned");
        let record = state
            .matches
            .get_mut(&(profile_id.clone(), opportunity_id.clone()))
            .ok_or(RepositoryError::NotFound)?;
        record.apply_flags(flags);
        Ok(())
    }
}

/// Data source whose every query fails.
pub(super) struct UnavailableSource;

impl MatchDataSource for UnavailableSource {
    fn list_active_opportunities(&self) -> Result<Vec<Opportunity>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_skill_ids_for_profile(
        &self,
        _profile_id: &ProfileId,
    ) -> Result<Vec<SkillId>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_opportunity_skills(
        &self,
        _opportunity_id: &OpportunityId,
    ) -> Result<Vec<OpportunitySkill>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Delegates to a memory backend but fails skill lookups for one opportunity.
pub(super) struct FlakySkillSource {
    pub(super) inner: MemoryBackend,
    pub(super) failing: OpportunityId,
}

impl MatchDataSource for FlakySkillSource {
    fn list_active_opportunities(&self) -> Result<Vec<Opportunity>, RepositoryError> {
        self.inner.list_active_opportunities()
    }

    fn list_skill_ids_for_profile(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<SkillId>, RepositoryError> {
        self.inner.list_skill_ids_for_profile(profile_id)
    }

    fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        self.inner.list_categories()
    }

    fn list_opportunity_skills(
        &self,
        opportunity_id: &OpportunityId,
    ) -> Result<Vec<OpportunitySkill>, RepositoryError> {
        if opportunity_id == &self.failing {
            return Err(RepositoryError::Unavailable("query timed out".to_string()));
        }
        self.inner.list_opportunity_skills(opportunity_id)
    }
}

/// Match store that rejects writes.
pub(super) struct ReadOnlyStore;

impl MatchStore for ReadOnlyStore {
    fn upsert_matches(&self, _rows: Vec<MatchRow>) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn list_matches(&self, _profile_id: &ProfileId) -> Result<Vec<MatchRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn update_flags(
        &self,
        _profile_id: &ProfileId,
        _opportunity_id: &OpportunityId,
        _flags: MatchFlags,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }
}

pub(super) fn build_service(
    backend: &MemoryBackend,
) -> MatchService<MemoryBackend, MemoryBackend> {
    MatchService::new(Arc::new(backend.clone()), Arc::new(backend.clone()))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
