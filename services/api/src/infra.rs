use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use volunteer_match::error::AppError;
use volunteer_match::matching::{
    Category, MatchDataSource, MatchDataset, MatchFlags, MatchRecord, MatchRow, MatchStore,
    Opportunity, OpportunityId, OpportunitySkill, ProfileId, RepositoryError, SkillId,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Data source over a loaded dataset snapshot plus an in-process match table.
#[derive(Default, Clone)]
pub(crate) struct InMemoryMatchBackend {
    dataset: Arc<MatchDataset>,
    matches: Arc<Mutex<BTreeMap<(ProfileId, OpportunityId), MatchRecord>>>,
}

impl InMemoryMatchBackend {
    pub(crate) fn new(dataset: MatchDataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
            matches: Arc::default(),
        }
    }

    pub(crate) fn dataset(&self) -> &MatchDataset {
        &self.dataset
    }
}

impl MatchDataSource for InMemoryMatchBackend {
    fn list_active_opportunities(&self) -> Result<Vec<Opportunity>, RepositoryError> {
        Ok(self
            .dataset
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
        Ok(self
            .dataset
            .volunteer_skills
            .iter()
            .filter(|row| &row.profile_id == profile_id)
            .map(|row| row.skill_id.clone())
            .collect())
    }

    fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self.dataset.categories.clone())
    }

    fn list_opportunity_skills(
        &self,
        opportunity_id: &OpportunityId,
    ) -> Result<Vec<OpportunitySkill>, RepositoryError> {
        Ok(self
            .dataset
            .opportunity_skills
            .iter()
            .filter(|row| &row.opportunity_id == opportunity_id)
            .cloned()
            .collect())
    }
}

impl MatchStore for InMemoryMatchBackend {
    fn upsert_matches(&self, rows: Vec<MatchRow>) -> Result<(), RepositoryError> {
        let now = Utc::now();
        let mut guard = self.matches.lock().expect("match mutex poisoned");
        for row in rows {
            match guard.entry(row.conflict_key()) {
                Entry::Occupied(mut existing) => existing.get_mut().apply_row(row, now),
                Entry::Vacant(slot) => {
                    slot.insert(MatchRecord::from_row(row, now));
                }
            }
        }
        Ok(())
    }

    fn list_matches(&self, profile_id: &ProfileId) -> Result<Vec<MatchRecord>, RepositoryError> {
        let guard = self.matches.lock().expect("match mutex poisoned");
        Ok(guard
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
        let mut guard = self.matches.lock().expect("match mutex poisoned");
        match guard.get_mut(&(profile_id.clone(), opportunity_id.clone())) {
            Some(record) => {
                record.apply_flags(flags);
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }
}

/// Load the configured snapshot, or fall back to an empty one.
pub(crate) fn load_dataset(path: Option<&Path>) -> Result<MatchDataset, AppError> {
    match path {
        Some(path) => MatchDataset::from_path(path).map_err(AppError::from),
        None => Ok(MatchDataset::default()),
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Evaluation instant for a calendar day: midnight UTC, or now when absent.
pub(crate) fn evaluation_instant(today: Option<NaiveDate>) -> DateTime<Utc> {
    today
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_else(Utc::now)
}
