use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier wrapper for volunteer profiles.
    ProfileId
);
string_id!(
    /// Identifier wrapper for listed opportunities.
    OpportunityId
);
string_id!(
    /// Identifier wrapper for opportunity categories.
    CategoryId
);
string_id!(
    /// Identifier wrapper for entries of the global skill catalog.
    SkillId
);

/// Volunteer-owned profile snapshot. Treated as immutable for the duration of a match run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerProfile {
    pub id: ProfileId,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub availability: Vec<String>,
}

/// Listed volunteering engagement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: OpportunityId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub organization: String,
    pub category_id: CategoryId,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub is_remote: bool,
    pub start_date: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
}

/// Join row: a skill claimed by a volunteer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerSkill {
    pub profile_id: ProfileId,
    pub skill_id: SkillId,
}

/// Join row: a skill an opportunity asks for. `required` is stored but does not change scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpportunitySkill {
    pub opportunity_id: OpportunityId,
    pub skill_id: SkillId,
    #[serde(default)]
    pub required: bool,
}

/// Value written by the engine for one qualifying opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRow {
    pub profile_id: ProfileId,
    pub opportunity_id: OpportunityId,
    pub match_score: u16,
    pub match_reasons: Vec<String>,
}

impl MatchRow {
    /// Composite key deciding insert versus overwrite during an upsert.
    pub fn conflict_key(&self) -> (ProfileId, OpportunityId) {
        (self.profile_id.clone(), self.opportunity_id.clone())
    }
}

/// Persisted match including the flags owned by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub profile_id: ProfileId,
    pub opportunity_id: OpportunityId,
    pub match_score: u16,
    pub match_reasons: Vec<String>,
    pub viewed: bool,
    pub dismissed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn from_row(row: MatchRow, now: DateTime<Utc>) -> Self {
        Self {
            profile_id: row.profile_id,
            opportunity_id: row.opportunity_id,
            match_score: row.match_score,
            match_reasons: row.match_reasons,
            viewed: false,
            dismissed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the engine-owned fields, leaving `viewed`, `dismissed`, and `created_at` intact.
    pub fn apply_row(&mut self, row: MatchRow, now: DateTime<Utc>) {
        self.match_score = row.match_score;
        self.match_reasons = row.match_reasons;
        self.updated_at = now;
    }

    pub fn apply_flags(&mut self, flags: MatchFlags) {
        if let Some(viewed) = flags.viewed {
            self.viewed = viewed;
        }
        if let Some(dismissed) = flags.dismissed {
            self.dismissed = dismissed;
        }
    }

    pub fn view(&self) -> MatchView {
        MatchView {
            opportunity_id: self.opportunity_id.clone(),
            match_score: self.match_score,
            match_reasons: self.match_reasons.clone(),
            viewed: self.viewed,
        }
    }
}

/// Partial update of the UI-owned flags on a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismissed: Option<bool>,
}

impl MatchFlags {
    pub fn viewed() -> Self {
        Self {
            viewed: Some(true),
            dismissed: None,
        }
    }

    pub fn dismissed() -> Self {
        Self {
            viewed: None,
            dismissed: Some(true),
        }
    }
}

/// Public representation of a match for feed responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchView {
    pub opportunity_id: OpportunityId,
    pub match_score: u16,
    pub match_reasons: Vec<String>,
    pub viewed: bool,
}
