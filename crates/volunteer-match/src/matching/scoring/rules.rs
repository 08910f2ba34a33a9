use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::super::domain::{Category, Opportunity, OpportunitySkill, SkillId, VolunteerProfile};
use super::rubric::{
    AVAILABILITY_POINTS, AVAILABILITY_REASON, INTEREST_POINTS, INTEREST_REASON, LOCAL_POINTS,
    LOCAL_REASON, MILLIS_PER_DAY, RECENCY_POINTS, RECENCY_WINDOW_DAYS, REMOTE_POINTS,
    REMOTE_REASON, SKILL_POINTS_PER_MATCH, SKILL_SCORE_CAP,
};
use super::{MatchFactor, ScoreComponent};

pub(crate) fn skill_overlap(
    volunteer_skills: &HashSet<SkillId>,
    opportunity_skills: &[OpportunitySkill],
) -> Option<ScoreComponent> {
    let wanted: HashSet<&SkillId> = opportunity_skills
        .iter()
        .map(|skill| &skill.skill_id)
        .collect();
    let matching = volunteer_skills
        .iter()
        .filter(|skill_id| wanted.contains(skill_id))
        .count();

    if matching == 0 {
        return None;
    }

    let points = u16::try_from(matching)
        .unwrap_or(u16::MAX)
        .saturating_mul(SKILL_POINTS_PER_MATCH)
        .min(SKILL_SCORE_CAP);
    let noun = if matching == 1 { "skill" } else { "skills" };

    Some(ScoreComponent {
        factor: MatchFactor::Skills,
        points,
        reason: Some(format!("{matching} matching {noun}")),
    })
}

pub(crate) fn interest_overlap(
    interests: &[String],
    category: Option<&Category>,
) -> Option<ScoreComponent> {
    let category_name = category?.name.to_lowercase();

    let matched = interests.iter().any(|interest| {
        let interest = interest.to_lowercase();
        interest.contains(&category_name) || category_name.contains(&interest)
    });

    matched.then(|| ScoreComponent {
        factor: MatchFactor::Interests,
        points: INTEREST_POINTS,
        reason: Some(INTEREST_REASON.to_string()),
    })
}

pub(crate) fn location_fit(
    volunteer_location: &str,
    opportunity: &Opportunity,
) -> Option<ScoreComponent> {
    if opportunity.is_remote {
        return Some(ScoreComponent {
            factor: MatchFactor::Remote,
            points: REMOTE_POINTS,
            reason: Some(REMOTE_REASON.to_string()),
        });
    }

    if volunteer_location.is_empty() {
        return None;
    }

    let volunteer_location = volunteer_location.to_lowercase();
    let city = volunteer_location.split(',').next().unwrap_or_default();

    opportunity
        .location
        .to_lowercase()
        .contains(city)
        .then(|| ScoreComponent {
            factor: MatchFactor::Proximity,
            points: LOCAL_POINTS,
            reason: Some(LOCAL_REASON.to_string()),
        })
}

/// Presence check only; no schedule overlap is computed.
pub(crate) fn availability(profile: &VolunteerProfile) -> Option<ScoreComponent> {
    (!profile.availability.is_empty()).then(|| ScoreComponent {
        factor: MatchFactor::Availability,
        points: AVAILABILITY_POINTS,
        reason: Some(AVAILABILITY_REASON.to_string()),
    })
}

pub(crate) fn days_until_start(start_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (start_date - now)
        .num_milliseconds()
        .div_euclid(MILLIS_PER_DAY)
}

pub(crate) fn recency(start_date: DateTime<Utc>, now: DateTime<Utc>) -> Option<ScoreComponent> {
    RECENCY_WINDOW_DAYS
        .contains(&days_until_start(start_date, now))
        .then_some(ScoreComponent {
            factor: MatchFactor::Recency,
            points: RECENCY_POINTS,
            reason: None,
        })
}
