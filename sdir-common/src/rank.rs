//! Heuristic match-ranking engine
//!
//! Scores every candidate record against a free-text query plus optional
//! structured hints by additive rule matching. Each candidate is scored
//! independently; the only cross-record step is the final stable sort.
//!
//! The point weights are tuning constants held as plain fields so a caller
//! can adjust them without touching the rules.

use crate::model::{RankQuery, StudentRecord};
use serde::Serialize;

/// One ranked candidate with its score breakdown
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    pub student: StudentRecord,
    /// Clamped additive score, 0..=max_score
    pub score: i32,
    /// Human-readable justification per satisfied rule, in rule order
    pub reasons: Vec<String>,
    /// Equal to the clamped score on the 0-100 scale
    pub match_percentage: i32,
}

/// Additive rule scorer for candidate matching
#[derive(Debug, Clone)]
pub struct MatchRanker {
    /// Candidate name appears in the description (default 30)
    pub name_weight: i32,
    /// Department hint equality (default 25)
    pub department_weight: i32,
    /// Admission-year hint equality (default 15)
    pub admission_year_weight: i32,
    /// Per requirement keyword fuzzily matching a course (default 10)
    pub requirement_weight: i32,
    /// Per skill keyword fuzzily matching a course (default 8)
    pub skill_weight: i32,
    /// Experience hint naming the current study year (default 10)
    pub experience_weight: i32,
    /// Per description token found in the candidate's profile text (default 5)
    pub keyword_weight: i32,
    /// Score ceiling; match percentage is the clamped score (default 100)
    pub max_score: i32,
}

impl MatchRanker {
    pub fn new() -> Self {
        Self {
            name_weight: 30,
            department_weight: 25,
            admission_year_weight: 15,
            requirement_weight: 10,
            skill_weight: 8,
            experience_weight: 10,
            keyword_weight: 5,
            max_score: 100,
        }
    }

    /// Score and rank a record snapshot against the query.
    ///
    /// `current_year` anchors the study-year heuristic (experience hint vs
    /// `current_year - admission_year`). Candidates with a clamped score of
    /// zero or below are dropped; the rest sort descending by score with
    /// ties keeping input order.
    pub fn rank(
        &self,
        records: &[StudentRecord],
        query: &RankQuery,
        current_year: i32,
    ) -> Vec<RankedResult> {
        let mut results: Vec<RankedResult> = records
            .iter()
            .map(|record| self.score_candidate(record, query, current_year))
            .filter(|result| result.score > 0)
            .collect();

        // Stable sort: equal scores keep store order
        results.sort_by(|a, b| b.score.cmp(&a.score));
        results
    }

    fn score_candidate(
        &self,
        record: &StudentRecord,
        query: &RankQuery,
        current_year: i32,
    ) -> RankedResult {
        let mut score = 0;
        let mut reasons = Vec::new();

        let description = query.description.to_lowercase();

        // Name rule: fuzzy containment between description and name
        let name_lower = record.name.to_lowercase();
        if !description.trim().is_empty() && fuzzy_match(&description, &name_lower) {
            score += self.name_weight;
            reasons.push(format!("名前が一致: {}", record.name));
        }

        if let Some(department) = query.department {
            if record.department == department {
                score += self.department_weight;
                reasons.push(format!("学科が一致: {}", record.department));
            }
        }

        if let Some(year) = query.admission_year {
            if record.admission_year == year {
                score += self.admission_year_weight;
                reasons.push(format!("入学年が一致: {}年", record.admission_year));
            }
        }

        let matching_requirements = fuzzy_course_matches(&query.requirements, record);
        if !matching_requirements.is_empty() {
            score += matching_requirements.len() as i32 * self.requirement_weight;
            reasons.push(format!("コースが一致: {}", matching_requirements.join(", ")));
        }

        let matching_skills = fuzzy_course_matches(&query.skills, record);
        if !matching_skills.is_empty() {
            score += matching_skills.len() as i32 * self.skill_weight;
            reasons.push(format!("スキルが一致: {}", matching_skills.join(", ")));
        }

        if let Some(experience) = &query.experience {
            let years_of_study = current_year - record.admission_year;
            for year in 1..=4 {
                if years_of_study == year && experience.contains(&format!("{year}年")) {
                    score += self.experience_weight;
                    reasons.push(format!("経験年数が一致: {year}年生"));
                    break;
                }
            }
        }

        // Free-text rule: whitespace tokens longer than two characters,
        // matched against the candidate's concatenated profile text
        let profile = profile_text(record);
        let matching_keywords: Vec<&str> = description
            .split_whitespace()
            .filter(|word| word.chars().count() > 2)
            .filter(|word| profile.contains(*word))
            .collect();
        if !matching_keywords.is_empty() {
            score += matching_keywords.len() as i32 * self.keyword_weight;
            reasons.push(format!("キーワードが一致: {}", matching_keywords.join(", ")));
        }

        let clamped = score.min(self.max_score);
        RankedResult {
            student: record.clone(),
            score: clamped,
            reasons,
            match_percentage: clamped,
        }
    }
}

impl Default for MatchRanker {
    fn default() -> Self {
        Self::new()
    }
}

/// Case-insensitive bidirectional substring containment.
/// Inputs are expected to be lowercased already.
fn fuzzy_match(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// Keywords fuzzily matching any of the candidate's courses
fn fuzzy_course_matches<'a>(keywords: &'a [String], record: &StudentRecord) -> Vec<&'a str> {
    keywords
        .iter()
        .filter(|keyword| {
            let keyword = keyword.to_lowercase();
            record
                .courses
                .iter()
                .any(|course| fuzzy_match(&course.as_str().to_lowercase(), &keyword))
        })
        .map(|keyword| keyword.as_str())
        .collect()
}

/// Lowercased concatenation of name, department and courses
fn profile_text(record: &StudentRecord) -> String {
    let courses: Vec<&str> = record.courses.iter().map(|c| c.as_str()).collect();
    format!(
        "{} {} {}",
        record.name,
        record.department,
        courses.join(" ")
    )
    .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Course, Department};

    const YEAR: i32 = 2025;

    fn student(
        name: &str,
        department: Department,
        admission_year: i32,
        courses: Vec<Course>,
    ) -> StudentRecord {
        StudentRecord {
            id: Some(format!("doc-{name}")),
            name: name.to_string(),
            student_id: String::new(),
            department,
            admission_year,
            courses,
            hobby: None,
            self_intro: None,
            avatar_url: None,
            owner_ref: None,
        }
    }

    #[test]
    fn name_and_department_rules_add_up() {
        let records = vec![
            student(
                "田中太郎",
                Department::Management,
                2022,
                vec![Course::IntroToManagement],
            ),
            student("鈴木花子", Department::BusinessEconomics, 2023, vec![]),
        ];
        let query = RankQuery {
            description: "田中".to_string(),
            department: Some(Department::Management),
            ..Default::default()
        };

        let results = MatchRanker::new().rank(&records, &query, YEAR);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].student.name, "田中太郎");
        assert_eq!(results[0].score, 55);
        assert_eq!(results[0].match_percentage, 55);
        assert_eq!(results[0].reasons.len(), 2);
        assert!(results[0].reasons[0].starts_with("名前が一致"));
        assert!(results[0].reasons[1].starts_with("学科が一致"));
    }

    #[test]
    fn zero_score_candidates_are_excluded() {
        let records = vec![student("鈴木花子", Department::Management, 2023, vec![])];
        let query = RankQuery {
            description: "山田".to_string(),
            ..Default::default()
        };
        assert!(MatchRanker::new().rank(&records, &query, YEAR).is_empty());
    }

    #[test]
    fn department_match_scores_exactly_25_more() {
        let records = vec![
            student("一郎", Department::Management, 2022, vec![]),
            student("二郎", Department::BusinessEconomics, 2022, vec![]),
        ];
        let query = RankQuery {
            description: "一郎 二郎".to_string(),
            department: Some(Department::Management),
            admission_year: Some(2022),
            ..Default::default()
        };

        let results = MatchRanker::new().rank(&records, &query, YEAR);
        assert_eq!(results.len(), 2);
        let with_dept = results.iter().find(|r| r.student.name == "一郎").unwrap();
        let without = results.iter().find(|r| r.student.name == "二郎").unwrap();
        assert_eq!(with_dept.score - without.score, 25);
    }

    #[test]
    fn requirement_and_skill_keywords_match_courses_fuzzily() {
        let records = vec![student(
            "佐藤一",
            Department::Management,
            2023,
            vec![Course::DataAnalysis, Course::IntroToStatistics],
        )];
        let query = RankQuery {
            description: String::new(),
            // "データ" is a substring of "データ分析"; "統計学入門の基礎"
            // contains the full course name - both directions count
            requirements: vec!["データ".to_string(), "統計学入門の基礎".to_string()],
            skills: vec!["分析".to_string()],
            ..Default::default()
        };

        let results = MatchRanker::new().rank(&records, &query, YEAR);
        assert_eq!(results.len(), 1);
        // 2 requirements x 10 + 1 skill x 8
        assert_eq!(results[0].score, 28);
        assert_eq!(results[0].reasons.len(), 2);
    }

    #[test]
    fn experience_hint_matches_study_year() {
        let records = vec![
            student("三年生", Department::Management, YEAR - 3, vec![]),
            student("一年生", Department::Management, YEAR - 1, vec![]),
        ];
        let query = RankQuery {
            description: String::new(),
            experience: Some("3年".to_string()),
            department: Some(Department::Management),
            ..Default::default()
        };

        let results = MatchRanker::new().rank(&records, &query, YEAR);
        assert_eq!(results[0].student.name, "三年生");
        assert_eq!(results[0].score, 35);
        assert_eq!(results[1].score, 25);
    }

    #[test]
    fn description_tokens_match_profile_text() {
        let records = vec![student(
            "田中太郎",
            Department::Management,
            2022,
            vec![Course::GameTheory],
        )];
        let query = RankQuery {
            // Two tokens longer than two characters, one matching the
            // department and one matching a course; "の" is too short
            description: "経営学科 の ゲーム理論概論".to_string(),
            ..Default::default()
        };

        let results = MatchRanker::new().rank(&records, &query, YEAR);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 10);
        assert!(results[0].reasons[0].starts_with("キーワードが一致"));
    }

    #[test]
    fn score_is_clamped_to_100() {
        let records = vec![student(
            "田中太郎",
            Department::Management,
            2022,
            Course::ALL.to_vec(),
        )];
        let query = RankQuery {
            description: "田中太郎 経営学科 データ分析 統計学入門".to_string(),
            requirements: Course::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            skills: Course::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            department: Some(Department::Management),
            admission_year: Some(2022),
            experience: Some("3年".to_string()),
            ..Default::default()
        };

        let results = MatchRanker::new().rank(&records, &query, YEAR);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 100);
        assert_eq!(results[0].match_percentage, 100);
    }

    #[test]
    fn results_never_leave_percentage_bounds() {
        let records = vec![
            student("甲", Department::Management, 2021, Course::ALL.to_vec()),
            student("乙", Department::BusinessEconomics, 2024, vec![]),
            student("丙", Department::Unknown, 1999, vec![Course::Unknown]),
        ];
        let query = RankQuery {
            description: "甲 乙 丙 経営 データ分析".to_string(),
            requirements: vec!["データ".to_string()],
            skills: vec!["統計".to_string()],
            department: Some(Department::Management),
            admission_year: Some(2021),
            experience: Some("4年".to_string()),
            ..Default::default()
        };

        for result in MatchRanker::new().rank(&records, &query, YEAR) {
            assert!(result.score > 0);
            assert!((0..=100).contains(&result.match_percentage));
        }
    }

    #[test]
    fn ties_keep_input_order() {
        let records = vec![
            student("後", Department::Management, 2022, vec![]),
            student("先", Department::Management, 2022, vec![]),
        ];
        let query = RankQuery {
            description: String::new(),
            department: Some(Department::Management),
            ..Default::default()
        };

        let results = MatchRanker::new().rank(&records, &query, YEAR);
        assert_eq!(results[0].student.name, "後");
        assert_eq!(results[1].student.name, "先");
    }

    #[test]
    fn empty_description_scores_no_name_or_keyword_points() {
        let records = vec![student("田中太郎", Department::Management, 2022, vec![])];
        let query = RankQuery {
            description: "   ".to_string(),
            admission_year: Some(2022),
            ..Default::default()
        };

        let results = MatchRanker::new().rank(&records, &query, YEAR);
        assert_eq!(results[0].score, 15);
    }
}
