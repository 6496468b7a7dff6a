//! Response Normalizer: reduces the recommendation payloads of every known
//! analysis schema to one [`NormalizedRecommendation`].
//!
//! Lookup order:
//! 1. the recommendation container: `analysis.recommendations`, then
//!    `recommendations`, then the `career_recommendations` variants;
//! 2. the `analysis` object;
//! 3. the payload root.
//!
//! The root comes last so a canonical document normalises to itself.
//! `null` and values of the wrong JSON type count as absent and the search
//! moves on. Nothing but a non-object payload is an error.

pub mod lenient;
pub mod models;
pub mod skills;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

pub use models::{IndustryInsights, NormalizedRecommendation, Resource, Role, SkillGap};
pub use skills::{
    normalize_extracted_skills, normalize_skill_categories, ExtractedSkill, SkillKind,
};

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("expected a JSON object, got {0}")]
    InvalidShape(&'static str),
}

/// Candidate locations of the recommendation container, highest priority first.
const CONTAINER_PATHS: &[&[&str]] = &[
    &["analysis", "recommendations"],
    &["recommendations"],
    &["analysis", "career_recommendations"],
    &["career_recommendations"],
    &["ai_insights", "career_recommendations"],
];

/// Extra homes of `skill_gaps` in the skill-improvement schema.
const SKILL_IMPROVEMENT_PATHS: &[&[&str]] = &[
    &["analysis", "skill_improvements"],
    &["skill_improvements"],
    &["ai_insights", "skill_improvements"],
];

const ROLE_KEYS: &[&str] = &["recommended_roles", "career_matches"];
/// The type-specific key outranks the generic ones.
const RESOURCE_KEYS: &[&str] = &["learning_resources", "youtube_resources", "videos", "resources"];

pub fn normalize_recommendation(payload: &Value) -> Result<NormalizedRecommendation, NormalizeError> {
    let root = payload
        .as_object()
        .ok_or_else(|| NormalizeError::InvalidShape(json_kind(payload)))?;

    let levels = Levels::resolve(root);
    let gap_levels = levels.with_extra(root, SKILL_IMPROVEMENT_PATHS);

    Ok(NormalizedRecommendation {
        recommended_roles: items(levels.first_array(ROLE_KEYS)),
        skill_gaps: items(gap_levels.first_array(&["skill_gaps"])),
        next_steps: levels
            .first_array(&["next_steps"])
            .map(|steps| steps.iter().filter_map(step_text).collect())
            .unwrap_or_default(),
        learning_resources: items(levels.first_array(RESOURCE_KEYS)),
        industry_insights: levels
            .first(&["industry_insights"], |v| v.as_object())
            .and_then(|obj| {
                serde_json::from_value(Value::Object(obj.clone()))
                    .map_err(|e| debug!("dropping malformed industry_insights: {e}"))
                    .ok()
            })
            .unwrap_or_default(),
        confidence_score: levels.first(&["confidence_score"], Value::as_f64),
    })
}

/// Ordered list of objects a field is searched in.
struct Levels<'a> {
    levels: Vec<&'a Map<String, Value>>,
}

impl<'a> Levels<'a> {
    fn resolve(root: &'a Map<String, Value>) -> Self {
        let mut levels = Vec::with_capacity(3);
        if let Some(container) = CONTAINER_PATHS.iter().find_map(|path| object_at(root, path)) {
            levels.push(container);
        }
        if let Some(analysis) = object_at(root, &["analysis"]) {
            levels.push(analysis);
        }
        levels.push(root);
        Levels { levels }
    }

    fn with_extra(&self, root: &'a Map<String, Value>, paths: &[&[&str]]) -> Self {
        let mut levels = self.levels.clone();
        levels.extend(paths.iter().filter_map(|path| object_at(root, path)));
        Levels { levels }
    }

    /// First value, by level then by key, for which `pick` succeeds.
    fn first<T>(&self, keys: &[&str], pick: impl Fn(&'a Value) -> Option<T>) -> Option<T> {
        self.levels.iter().copied().find_map(|level| {
            keys.iter()
                .find_map(|key| level.get(*key).and_then(|v| pick(v)))
        })
    }

    fn first_array(&self, keys: &[&str]) -> Option<&'a Vec<Value>> {
        self.first(keys, Value::as_array)
    }
}

fn object_at<'a>(root: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Map<String, Value>> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(root.get(*first)?, |value, key| value.get(*key))
        .and_then(Value::as_object)
}

/// Parses list elements: strings become title-only records, objects are
/// deserialized leniently, anything else is skipped.
fn items<T>(values: Option<&Vec<Value>>) -> Vec<T>
where
    T: DeserializeOwned + From<String>,
{
    values
        .map(|values| {
            values
                .iter()
                .filter_map(|value| match value {
                    Value::Object(_) => serde_json::from_value(value.clone())
                        .map_err(|e| debug!("dropping malformed item: {e}"))
                        .ok(),
                    other => lenient::scalar_text(other).map(T::from),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn step_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(obj) => ["step", "title", "description"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(lenient::scalar_text)),
        other => lenient::scalar_text(other),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
