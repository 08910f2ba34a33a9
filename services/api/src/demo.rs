use crate::infra::{evaluation_instant, load_dataset, InMemoryMatchBackend};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use volunteer_match::error::AppError;
use volunteer_match::matching::{
    Category, CategoryId, MatchDataset, MatchRunOutcome, MatchScore, MatchService, Opportunity,
    OpportunityId, OpportunitySkill, ProfileId, Skill, SkillId, VolunteerProfile, VolunteerSkill,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON dataset exported from the data backend
    #[arg(long)]
    pub(crate) dataset: PathBuf,
    /// Profile id to score opportunities for
    #[arg(long)]
    pub(crate) profile: String,
    /// Evaluation date (YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Show opportunities below the qualifying threshold as well
    #[arg(long)]
    pub(crate) all: bool,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        dataset,
        profile,
        today,
        all,
    } = args;

    let dataset = load_dataset(Some(dataset.as_path()))?;
    let profile_id = ProfileId(profile);
    let Some(profile) = dataset.profile(&profile_id).cloned() else {
        println!("Profile {} not found in dataset", profile_id);
        return Ok(());
    };

    let now = evaluation_instant(today);
    let backend = Arc::new(InMemoryMatchBackend::new(dataset));
    let service = MatchService::new(backend.clone(), backend.clone());

    let ranked = match service.rank(&profile, now) {
        Ok(ranked) => ranked,
        Err(err) => {
            println!("Scoring unavailable: {}", err);
            return Ok(());
        }
    };

    println!("Ranked opportunities for {} (evaluated {})", profile.id, now);
    render_scores(backend.dataset(), &ranked, all);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let now = evaluation_instant(args.today);
    let dataset = sample_dataset(now);
    let profile = dataset
        .profiles
        .first()
        .cloned()
        .unwrap_or_else(sample_profile);

    println!("Volunteer match demo");
    println!(
        "Profile {}: {} | interests: {} | availability: {}",
        profile.id,
        display_or_dash(&profile.location),
        join_or_dash(&profile.interests),
        join_or_dash(&profile.availability)
    );

    let backend = Arc::new(InMemoryMatchBackend::new(dataset));
    let service = MatchService::new(backend.clone(), backend.clone());

    match service.rank(&profile, now) {
        Ok(ranked) => {
            println!("\nScore breakdown");
            render_scores(backend.dataset(), &ranked, true);
        }
        Err(err) => println!("Scoring unavailable: {}", err),
    }

    let outcome = service.generate_matches_at(&profile, now);
    println!("\nOnboarding run: {}", outcome.label());
    match &outcome {
        MatchRunOutcome::Persisted(summary) | MatchRunOutcome::NoQualifying(summary) => {
            println!(
                "- {} opportunities evaluated, {} persisted",
                summary.evaluated, summary.qualifying
            );
        }
        MatchRunOutcome::Failed { error, .. } => println!("- run failed: {}", error),
    }

    let feed = match service.list_matches(&profile.id) {
        Ok(feed) => feed,
        Err(err) => {
            println!("  Match feed unavailable: {}", err);
            return Ok(());
        }
    };
    println!("\nMatch feed");
    if feed.is_empty() {
        println!("- no matches yet");
    }
    for record in &feed {
        println!(
            "- {} ({}%): {}",
            opportunity_title(backend.dataset(), &record.opportunity_id),
            record.match_score,
            record.match_reasons.join(", ")
        );
    }

    if let Some(first) = feed.first() {
        if service.dismiss(&profile.id, &first.opportunity_id).is_ok() {
            let rerun = service.generate_matches_at(&profile, now);
            let remaining = service
                .list_matches(&profile.id)
                .map(|feed| feed.len())
                .unwrap_or_default();
            println!(
                "\nDismissed {} and re-ran matching ({}): {} match(es) remain visible",
                opportunity_title(backend.dataset(), &first.opportunity_id),
                rerun.label(),
                remaining
            );
        }
    }

    Ok(())
}

fn render_scores(dataset: &MatchDataset, ranked: &[MatchScore], include_all: bool) {
    let mut shown = 0;
    for score in ranked
        .iter()
        .filter(|score| include_all || score.qualifies())
    {
        shown += 1;
        let marker = if score.qualifies() { "match" } else { "below threshold" };
        println!(
            "- {} | score {} | {}",
            opportunity_title(dataset, &score.opportunity_id),
            score.total,
            marker
        );
        for component in &score.components {
            println!(
                "    - {:?}: +{} {}",
                component.factor,
                component.points,
                component.reason.as_deref().unwrap_or("(starts soon)")
            );
        }
    }
    if shown == 0 {
        println!("- no qualifying opportunities");
    }
}

fn opportunity_title(dataset: &MatchDataset, id: &OpportunityId) -> String {
    dataset
        .opportunities
        .iter()
        .find(|opportunity| &opportunity.id == id)
        .map(|opportunity| match opportunity.organization.is_empty() {
            true => opportunity.title.clone(),
            false => format!("{} @ {}", opportunity.title, opportunity.organization),
        })
        .unwrap_or_else(|| id.to_string())
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

fn join_or_dash(values: &[String]) -> String {
    if values.is_empty() {
        "-".to_string()
    } else {
        values.join(", ")
    }
}

fn sample_profile() -> VolunteerProfile {
    VolunteerProfile {
        id: ProfileId::new("demo-volunteer"),
        location: "Austin, TX".to_string(),
        interests: vec!["Animal Welfare".to_string(), "Education".to_string()],
        availability: vec!["Weekend Mornings".to_string()],
    }
}

fn sample_dataset(now: DateTime<Utc>) -> MatchDataset {
    let profile = sample_profile();
    let category = |id: &str, name: &str| Category {
        id: CategoryId::new(id),
        name: name.to_string(),
    };
    let skill = |id: &str, name: &str| Skill {
        id: SkillId::new(id),
        name: name.to_string(),
    };
    let listing = |id: &str, title: &str, org: &str, category: &str, location: &str, days: i64| {
        Opportunity {
            id: OpportunityId::new(id),
            title: title.to_string(),
            organization: org.to_string(),
            category_id: CategoryId::new(category),
            location: location.to_string(),
            is_remote: false,
            start_date: now + Duration::days(days),
            active: true,
        }
    };
    let wants = |opportunity: &str, skill: &str, required: bool| OpportunitySkill {
        opportunity_id: OpportunityId::new(opportunity),
        skill_id: SkillId::new(skill),
        required,
    };

    let mut tutor = listing(
        "opp-tutor",
        "Reading buddy",
        "Literacy Now",
        "cat-education",
        "Online",
        45,
    );
    tutor.is_remote = true;

    MatchDataset {
        volunteer_skills: ["s-animal-care", "s-tutoring"]
            .into_iter()
            .map(|skill| VolunteerSkill {
                profile_id: profile.id.clone(),
                skill_id: SkillId::new(skill),
            })
            .collect(),
        profiles: vec![profile],
        categories: vec![
            category("cat-animals", "Animal Welfare"),
            category("cat-education", "Education & Literacy"),
            category("cat-environment", "Environment"),
        ],
        skills: vec![
            skill("s-animal-care", "Animal care"),
            skill("s-driving", "Driving"),
            skill("s-tutoring", "Tutoring"),
        ],
        opportunities: vec![
            listing(
                "opp-shelter",
                "Dog walker",
                "Austin Animal Center",
                "cat-animals",
                "Austin Animal Shelter",
                10,
            ),
            tutor,
            listing(
                "opp-cleanup",
                "Creek cleanup",
                "Keep Houston Green",
                "cat-environment",
                "Houston Bayou Trail",
                20,
            ),
        ],
        opportunity_skills: vec![
            wants("opp-shelter", "s-animal-care", true),
            wants("opp-shelter", "s-driving", false),
            wants("opp-tutor", "s-tutoring", true),
        ],
    }
}
