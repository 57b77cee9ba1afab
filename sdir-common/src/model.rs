//! Student record model and query types
//!
//! Field names serialize in the camelCase form the record store uses, so a
//! record round-trips unchanged through the store boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed enumeration of department names.
///
/// Values outside the known set deserialize to `Unknown`, which compares
/// unequal to every known department - filters and ranking treat such
/// records as non-matching rather than erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Department {
    Management,
    BusinessEconomics,
    GlobalDesignManagement,
    Unknown,
}

impl From<String> for Department {
    fn from(s: String) -> Self {
        match s.as_str() {
            "経営学科" => Department::Management,
            "ビジネスエコノミクス学科" => Department::BusinessEconomics,
            "国際デザイン経営学科" => Department::GlobalDesignManagement,
            _ => Department::Unknown,
        }
    }
}

impl From<Department> for String {
    fn from(d: Department) -> Self {
        d.as_str().to_string()
    }
}

impl Department {
    /// All selectable departments (excludes the catch-all)
    pub const ALL: [Department; 3] = [
        Department::Management,
        Department::BusinessEconomics,
        Department::GlobalDesignManagement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Management => "経営学科",
            Department::BusinessEconomics => "ビジネスエコノミクス学科",
            Department::GlobalDesignManagement => "国際デザイン経営学科",
            Department::Unknown => "不明",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed enumeration of course names. Same catch-all rule as [`Department`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Course {
    IntroToManagement,
    IntroToStatistics,
    DataAnalysis,
    GameTheory,
    CrossCulturalCommunication,
    Unknown,
}

impl From<String> for Course {
    fn from(s: String) -> Self {
        match s.as_str() {
            "経営学入門" => Course::IntroToManagement,
            "統計学入門" => Course::IntroToStatistics,
            "データ分析" => Course::DataAnalysis,
            "ゲーム理論概論" => Course::GameTheory,
            "異文化コミュニケーション" => Course::CrossCulturalCommunication,
            _ => Course::Unknown,
        }
    }
}

impl From<Course> for String {
    fn from(c: Course) -> Self {
        c.as_str().to_string()
    }
}

impl Course {
    /// All selectable courses (excludes the catch-all)
    pub const ALL: [Course; 5] = [
        Course::IntroToManagement,
        Course::IntroToStatistics,
        Course::DataAnalysis,
        Course::GameTheory,
        Course::CrossCulturalCommunication,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Course::IntroToManagement => "経営学入門",
            Course::IntroToStatistics => "統計学入門",
            Course::DataAnalysis => "データ分析",
            Course::GameTheory => "ゲーム理論概論",
            Course::CrossCulturalCommunication => "異文化コミュニケーション",
            Course::Unknown => "不明",
        }
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The sole persistent entity: one registered student profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    /// Opaque identifier assigned by the record store on creation.
    /// Absent before creation, immutable thereafter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Non-empty display name
    pub name: String,

    /// Business-meaningful student number, distinct from `id`
    #[serde(default)]
    pub student_id: String,

    pub department: Department,

    pub admission_year: i32,

    #[serde(default)]
    pub courses: Vec<Course>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hobby: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_intro: Option<String>,

    /// Data-URL encoded photo or external image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    /// Weak back-reference to the owning identity (lookup only).
    /// A record with no owner is editable by nobody through the API.
    #[serde(default, rename = "uid", skip_serializing_if = "Option::is_none")]
    pub owner_ref: Option<String>,
}

/// Sort key for the filter-sort engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Ascending by name (50音順)
    Phonetic,
    /// Ascending by admission year (学年順)
    Grade,
    /// Descending by admission year (新着順)
    Newest,
}

/// Optional conjunctive predicates plus a sort key.
///
/// Every omitted field imposes no constraint; a spec with no fields set is
/// the identity filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Case-sensitive substring match against `name`
    #[serde(default)]
    pub name: Option<String>,

    /// Substring match against `student_id`
    #[serde(default)]
    pub student_id: Option<String>,

    /// Exact equality
    #[serde(default)]
    pub department: Option<Department>,

    /// Exact equality
    #[serde(default)]
    pub admission_year: Option<i32>,

    /// Every listed course must be present in the record (AND semantics)
    #[serde(default)]
    pub courses: Vec<Course>,

    #[serde(default)]
    pub sort: Option<SortKey>,
}

/// Free-text query plus optional structured hints for heuristic ranking
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankQuery {
    pub description: String,

    /// Required course keywords (fuzzy-matched against `courses`)
    #[serde(default)]
    pub requirements: Vec<String>,

    /// Skill keywords (fuzzy-matched against `courses`)
    #[serde(default)]
    pub skills: Vec<String>,

    /// Experience-level text, e.g. "3年"
    #[serde(default)]
    pub experience: Option<String>,

    #[serde(default)]
    pub department: Option<Department>,

    #[serde(default)]
    pub admission_year: Option<i32>,
}
