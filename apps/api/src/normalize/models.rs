use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// A career role suggested by the analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default, alias = "role", alias = "name", deserialize_with = "lenient::required_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub match_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub required_skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub missing_skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub growth_potential: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillGap {
    #[serde(default, alias = "name", deserialize_with = "lenient::required_string")]
    pub skill: String,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub importance: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub current_level: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub target_level: Option<String>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub learning_priority: Option<f64>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub resources: Vec<String>,
}

/// A learning resource; YouTube videos are the common case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, alias = "name", deserialize_with = "lenient::required_string")]
    pub title: String,
    #[serde(default, alias = "link", deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, alias = "provider", deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub views: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndustryInsights {
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub trending_industries: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub growth_sectors: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
    /// Keys the canonical model does not name are carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The canonical recommendation shape every payload is reduced to.
///
/// Collections are always present, possibly empty. `confidence_score` is a
/// fraction in `[0, 1]` passed through as received; renderers scale it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizedRecommendation {
    pub recommended_roles: Vec<Role>,
    pub skill_gaps: Vec<SkillGap>,
    pub next_steps: Vec<String>,
    pub learning_resources: Vec<Resource>,
    pub industry_insights: IndustryInsights,
    pub confidence_score: Option<f64>,
}

impl NormalizedRecommendation {
    pub fn is_empty(&self) -> bool {
        self.recommended_roles.is_empty()
            && self.skill_gaps.is_empty()
            && self.next_steps.is_empty()
            && self.learning_resources.is_empty()
    }
}

impl From<String> for Role {
    fn from(title: String) -> Self {
        Role {
            title,
            ..Default::default()
        }
    }
}

impl From<String> for SkillGap {
    fn from(skill: String) -> Self {
        SkillGap {
            skill,
            ..Default::default()
        }
    }
}

impl From<String> for Resource {
    fn from(title: String) -> Self {
        Resource {
            title,
            ..Default::default()
        }
    }
}
