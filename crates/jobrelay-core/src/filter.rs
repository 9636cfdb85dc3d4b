//! Keyword-based relevance classifier.
//!
//! Removes obviously off-domain jobs before they reach the dedup store
//! and the ingest service. Matching is plain substring alternation, not
//! word-boundary matching, so the keyword lists are phrased defensively
//! (e.g. "software architect" rather than the bare "software").

use regex::{Regex, RegexBuilder};

use crate::error::AppError;
use crate::job::ScrapedJob;

/// Terms indicating architecture/built-environment roles.
pub const ARCHITECTURE_KEYWORDS: &[&str] = &[
    "architect",
    "architecture",
    "architectural",
    "interior design",
    "interior designer",
    "landscape architect",
    "landscape design",
    "urban design",
    "urban planner",
    "urban planning",
    "bim",
    "revit",
    "autocad",
    "archicad",
    "building design",
    "sustainable design",
    "heritage",
    "conservation architect",
    "masterplan",
    "town planner",
    "town planning",
    "sustainability consultant",
    "planning consultant",
    "building surveyor",
    "quantity surveyor",
    "construction manager",
    "project architect",
    "design architect",
    "residential architect",
    "commercial architect",
    "3d visualiser",
    "3d visualizer",
    "architectural technologist",
    "architectural technician",
    "riba",
    "arb",
    "aia",
];

/// Terms indicating tech/software roles that superficially look like
/// architecture jobs.
pub const EXCLUDE_KEYWORDS: &[&str] = &[
    "software architect",
    "cloud architect",
    "data architect",
    "solutions architect",
    "enterprise architect",
    "network architect",
    "security architect",
    "system architect",
    "systems architect",
    "it architect",
    "information architect",
    "web architect",
    "platform architect",
    "infrastructure architect",
    "technical architect",
    "application architect",
    "devops",
    "kubernetes",
    "terraform",
    "machine learning",
    "deep learning",
    "fullstack",
    "full-stack",
    "frontend developer",
    "backend developer",
];

/// Classifies jobs as in-domain or not.
///
/// A job passes when its title is free of exclusion terms and its title
/// or description contains an inclusion term. Exclusion is checked only
/// against the title: a description that merely mentions an excluded
/// term is not penalized.
pub struct KeywordFilter {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl KeywordFilter {
    /// Filter with the default domain vocabulary.
    pub fn new() -> Result<Self, AppError> {
        Self::with_keywords(ARCHITECTURE_KEYWORDS, EXCLUDE_KEYWORDS)
    }

    /// Filter with caller-supplied vocabularies (testing/tuning).
    pub fn with_keywords(include: &[&str], exclude: &[&str]) -> Result<Self, AppError> {
        Ok(Self {
            include: compile_keywords(include)?,
            exclude: compile_keywords(exclude)?,
        })
    }

    /// Check whether a job belongs to the target domain.
    ///
    /// Exclusion on the title takes precedence over any inclusion match.
    pub fn is_relevant(&self, job: &ScrapedJob) -> bool {
        if let Some(exclude) = &self.exclude
            && exclude.is_match(job.title())
        {
            return false;
        }

        if let Some(include) = &self.include {
            include.is_match(job.title()) || include.is_match(job.description())
        } else {
            false
        }
    }

    /// Keep only relevant jobs, logging the reduction.
    pub fn filter_jobs(&self, jobs: Vec<ScrapedJob>) -> Vec<ScrapedJob> {
        let original = jobs.len();
        let filtered: Vec<ScrapedJob> =
            jobs.into_iter().filter(|j| self.is_relevant(j)).collect();

        tracing::info!(
            kept = filtered.len(),
            removed = original - filtered.len(),
            "Keyword filter applied"
        );

        filtered
    }
}

/// Compile a keyword list into one case-insensitive alternation.
/// An empty list yields `None`, which matches nothing.
fn compile_keywords(keywords: &[&str]) -> Result<Option<Regex>, AppError> {
    if keywords.is_empty() {
        return Ok(None);
    }
    let pattern = keywords
        .iter()
        .map(|kw| regex::escape(kw))
        .collect::<Vec<_>>()
        .join("|");
    let regex = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| AppError::ConfigError(format!("Invalid keyword pattern: {e}")))?;
    Ok(Some(regex))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_job(title: &str, description: &str) -> ScrapedJob {
        ScrapedJob::new(title, description, "Test Co").unwrap()
    }

    #[test]
    fn architecture_titles_pass() {
        let filter = KeywordFilter::new().unwrap();
        assert!(filter.is_relevant(&make_job("Senior Architect", "Residential projects.")));
        assert!(filter.is_relevant(&make_job("Interior Designer", "Hospitality fit-outs.")));
        assert!(filter.is_relevant(&make_job("Landscape Architect", "Public realm work.")));
        assert!(filter.is_relevant(&make_job("BIM Manager", "Model coordination.")));
    }

    #[test]
    fn software_titles_are_excluded() {
        let filter = KeywordFilter::new().unwrap();
        assert!(!filter.is_relevant(&make_job("Software Architect - Python/AWS", "Cloud work.")));
        assert!(!filter.is_relevant(&make_job("Cloud Architect - Azure", "Infra design.")));
        assert!(!filter.is_relevant(&make_job("Data Architect", "Warehousing.")));
        assert!(!filter.is_relevant(&make_job("Technical Architect - Java", "Microservices.")));
    }

    #[test]
    fn exclusion_wins_over_inclusion() {
        // "Enterprise Architect" contains "architect" (include) but also
        // the exclusion phrase; the exclusion must win.
        let filter = KeywordFilter::new().unwrap();
        assert!(!filter.is_relevant(&make_job(
            "Enterprise Architect - Digital Transformation",
            "Generic description."
        )));
    }

    #[test]
    fn description_only_match_passes() {
        let filter = KeywordFilter::new().unwrap();
        assert!(filter.is_relevant(&make_job(
            "Design Lead",
            "Working with architectural technologists on sustainable design projects."
        )));
        assert!(filter.is_relevant(&make_job(
            "Design Technician",
            "Must have experience with Revit and AutoCAD."
        )));
    }

    #[test]
    fn description_mentioning_excluded_term_still_passes() {
        // Exclusion scans the title only; a relevant title survives a
        // description that happens to mention an excluded term.
        let filter = KeywordFilter::new().unwrap();
        assert!(filter.is_relevant(&make_job(
            "Project Architect",
            "You will liaise with the firm's solutions architect on IT matters."
        )));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let filter = KeywordFilter::new().unwrap();
        assert!(filter.is_relevant(&make_job("SENIOR ARCHITECT", "Role.")));
        assert!(!filter.is_relevant(&make_job("SOFTWARE ARCHITECT", "Role.")));
    }

    #[test]
    fn unrelated_jobs_are_rejected() {
        let filter = KeywordFilter::new().unwrap();
        assert!(!filter.is_relevant(&make_job(
            "Marketing Manager",
            "Lead marketing campaigns for SaaS products."
        )));
    }

    #[test]
    fn filter_jobs_keeps_relevant_subset() {
        let filter = KeywordFilter::new().unwrap();
        let jobs = vec![
            make_job("Senior Architect", "Role."),
            make_job("Software Architect - Python", "Role."),
            make_job("Interior Designer", "Role."),
            make_job("Cloud Architect", "Role."),
            make_job("Landscape Architect", "Role."),
        ];
        let kept = filter.filter_jobs(jobs);
        let titles: Vec<&str> = kept.iter().map(|j| j.title()).collect();
        assert_eq!(
            titles,
            vec!["Senior Architect", "Interior Designer", "Landscape Architect"]
        );
    }

    #[test]
    fn custom_vocabulary_is_injectable() {
        let filter = KeywordFilter::with_keywords(&["basket weaving"], &[]).unwrap();
        assert!(filter.is_relevant(&make_job("Basket Weaving Instructor", "Role.")));
        assert!(!filter.is_relevant(&make_job("Senior Architect", "Role.")));
    }

    #[test]
    fn empty_vocabulary_matches_nothing() {
        let filter = KeywordFilter::with_keywords(&[], &[]).unwrap();
        assert!(!filter.is_relevant(&make_job("Senior Architect", "Role.")));
    }
}
