//! Skill lists from the resume extraction service.
//!
//! The service has shipped `skills` as plain strings, as `{name, type, level}`
//! objects and as a `{technical: [...], soft: [...]}` map, with an optional
//! `skills_by_category` map alongside.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{json_kind, lenient, NormalizeError};

const SOFT_SKILLS: &[&str] = &[
    "communication",
    "leadership",
    "teamwork",
    "problem solving",
    "project management",
    "agile",
    "time management",
    "collaboration",
    "critical thinking",
    "adaptability",
    "presentation",
    "mentoring",
    "negotiation",
    "creativity",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillKind {
    #[default]
    Technical,
    Soft,
}

impl SkillKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillKind::Technical => "technical",
            SkillKind::Soft => "soft",
        }
    }

    /// Any label mentioning "soft" is soft; everything else is technical.
    pub(crate) fn from_label(label: &str) -> Self {
        if label.to_lowercase().contains("soft") {
            SkillKind::Soft
        } else {
            SkillKind::Technical
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSkill {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: SkillKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl ExtractedSkill {
    pub fn new(name: impl Into<String>, kind: SkillKind) -> Self {
        Self {
            name: name.into(),
            kind,
            level: None,
        }
    }
}

/// Whether a skill name belongs to the soft-skill vocabulary.
pub fn is_soft_skill(name: &str) -> bool {
    let lower = name.to_lowercase();
    SOFT_SKILLS.iter().any(|soft| lower.contains(soft))
}

/// Reduces an extraction payload to a deduplicated skill list.
///
/// Kind inference, first match wins: an explicit `type`, membership in a
/// `skills_by_category` category whose name mentions "soft", the soft-skill
/// vocabulary, then technical.
pub fn normalize_extracted_skills(payload: &Value) -> Result<Vec<ExtractedSkill>, NormalizeError> {
    let root = payload
        .as_object()
        .ok_or_else(|| NormalizeError::InvalidShape(json_kind(payload)))?;

    let categories = normalize_skill_categories(payload)?;
    let soft_by_category: HashSet<String> = categories
        .iter()
        .filter(|(category, _)| SkillKind::from_label(category) == SkillKind::Soft)
        .flat_map(|(_, names)| names.iter().map(|n| n.to_lowercase()))
        .collect();
    let infer = |name: &str| {
        if soft_by_category.contains(&name.to_lowercase()) || is_soft_skill(name) {
            SkillKind::Soft
        } else {
            SkillKind::Technical
        }
    };

    let mut skills = Vec::new();
    match root.get("skills") {
        Some(Value::Array(items)) => {
            for item in items {
                let parsed = match item {
                    Value::Object(obj) => from_object(obj, &infer),
                    other => lenient::scalar_text(other).map(|name| {
                        let kind = infer(name.as_str());
                        ExtractedSkill::new(name, kind)
                    }),
                };
                skills.extend(parsed);
            }
        }
        Some(Value::Object(groups)) => {
            for (group, names) in groups {
                let kind = SkillKind::from_label(group);
                skills.extend(
                    lenient::texts(names)
                        .into_iter()
                        .map(|name| ExtractedSkill::new(name, kind)),
                );
            }
        }
        _ => {}
    }

    if skills.is_empty() {
        let detected = root
            .get("extracted_info")
            .and_then(|info| info.get("detected_skills"))
            .map(lenient::texts)
            .unwrap_or_default();
        skills.extend(detected.into_iter().map(|name| {
            let kind = infer(name.as_str());
            ExtractedSkill::new(name, kind)
        }));
    }

    if skills.is_empty() {
        for names in categories.values() {
            skills.extend(
                names
                    .iter()
                    .map(|name| ExtractedSkill::new(name.clone(), infer(name.as_str()))),
            );
        }
    }

    Ok(dedup(skills))
}

/// `skills_by_category` as an ordered map; non-list categories are dropped.
pub fn normalize_skill_categories(
    payload: &Value,
) -> Result<BTreeMap<String, Vec<String>>, NormalizeError> {
    let root = payload
        .as_object()
        .ok_or_else(|| NormalizeError::InvalidShape(json_kind(payload)))?;

    Ok(root
        .get("skills_by_category")
        .and_then(Value::as_object)
        .map(|categories| {
            categories
                .iter()
                .filter(|(_, names)| names.is_array())
                .map(|(category, names)| (category.clone(), lenient::texts(names)))
                .collect()
        })
        .unwrap_or_default())
}

fn from_object(obj: &Map<String, Value>, infer: &impl Fn(&str) -> SkillKind) -> Option<ExtractedSkill> {
    let name = ["name", "skill"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(lenient::scalar_text))?;
    let kind = obj
        .get("type")
        .and_then(lenient::scalar_text)
        .map(|label| SkillKind::from_label(&label))
        .unwrap_or_else(|| infer(name.as_str()));
    let level = obj.get("level").and_then(lenient::scalar_text);
    Some(ExtractedSkill { name, kind, level })
}

fn dedup(skills: Vec<ExtractedSkill>) -> Vec<ExtractedSkill> {
    let mut seen = HashSet::new();
    skills
        .into_iter()
        .filter(|skill| seen.insert(skill.name.to_lowercase()))
        .collect()
}
