use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::domain::{
    Category, Opportunity, OpportunityId, OpportunitySkill, ProfileId, Skill, VolunteerProfile,
    VolunteerSkill,
};

/// Snapshot of every collection the match engine reads, as exported from the data backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDataset {
    #[serde(default)]
    pub profiles: Vec<VolunteerProfile>,
    #[serde(default)]
    pub opportunities: Vec<Opportunity>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub volunteer_skills: Vec<VolunteerSkill>,
    #[serde(default)]
    pub opportunity_skills: Vec<OpportunitySkill>,
}

impl MatchDataset {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let dataset: MatchDataset = serde_json::from_reader(reader)?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Reject snapshots whose join rows cannot be attributed. Unknown categories are tolerated
    /// and simply never earn interest points.
    pub fn validate(&self) -> Result<(), DatasetError> {
        let mut opportunity_ids = HashSet::new();
        for opportunity in &self.opportunities {
            if !opportunity_ids.insert(&opportunity.id) {
                return Err(DatasetError::DuplicateOpportunity(opportunity.id.clone()));
            }
        }

        if let Some(orphan) = self
            .opportunity_skills
            .iter()
            .find(|row| !opportunity_ids.contains(&row.opportunity_id))
        {
            return Err(DatasetError::UnknownOpportunity(
                orphan.opportunity_id.clone(),
            ));
        }

        Ok(())
    }

    pub fn profile(&self, id: &ProfileId) -> Option<&VolunteerProfile> {
        self.profiles.iter().find(|profile| &profile.id == id)
    }
}

#[derive(Debug)]
pub enum DatasetError {
    Io(std::io::Error),
    Json(serde_json::Error),
    DuplicateOpportunity(OpportunityId),
    UnknownOpportunity(OpportunityId),
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::Io(err) => write!(f, "failed to read dataset: {}", err),
            DatasetError::Json(err) => write!(f, "invalid dataset JSON: {}", err),
            DatasetError::DuplicateOpportunity(id) => {
                write!(f, "opportunity {} is listed more than once", id)
            }
            DatasetError::UnknownOpportunity(id) => {
                write!(f, "opportunity skill references unknown opportunity {}", id)
            }
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetError::Io(err) => Some(err),
            DatasetError::Json(err) => Some(err),
            DatasetError::DuplicateOpportunity(_) | DatasetError::UnknownOpportunity(_) => None,
        }
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}
