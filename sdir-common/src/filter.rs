//! Filter-sort engine
//!
//! Pure, single-pass filtering and ordering over an already-fetched record
//! snapshot. Predicates combine conjunctively; every omitted field imposes
//! no constraint. Sorting is stable so ties preserve store order.

use crate::model::{FilterSpec, SortKey, StudentRecord};

/// Apply the spec's predicates and sort key to a record snapshot.
///
/// Returns a new sequence; never mutates the input. An empty result is
/// valid and not an error.
pub fn filter_and_sort(records: &[StudentRecord], spec: &FilterSpec) -> Vec<StudentRecord> {
    let mut result: Vec<StudentRecord> = records
        .iter()
        .filter(|r| matches(r, spec))
        .cloned()
        .collect();

    match spec.sort {
        // Vec::sort_by is a stable sort, so equal keys keep store order
        Some(SortKey::Phonetic) => result.sort_by(|a, b| a.name.cmp(&b.name)),
        Some(SortKey::Grade) => result.sort_by(|a, b| a.admission_year.cmp(&b.admission_year)),
        Some(SortKey::Newest) => result.sort_by(|a, b| b.admission_year.cmp(&a.admission_year)),
        None => {}
    }

    result
}

fn matches(record: &StudentRecord, spec: &FilterSpec) -> bool {
    if let Some(name) = &spec.name {
        if !record.name.contains(name.as_str()) {
            return false;
        }
    }
    if let Some(student_id) = &spec.student_id {
        if !record.student_id.contains(student_id.as_str()) {
            return false;
        }
    }
    if let Some(department) = spec.department {
        if record.department != department {
            return false;
        }
    }
    if let Some(year) = spec.admission_year {
        if record.admission_year != year {
            return false;
        }
    }
    // AND semantics: every requested course must be present
    spec.courses
        .iter()
        .all(|course| record.courses.contains(course))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Course, Department};

    fn student(
        name: &str,
        student_id: &str,
        department: Department,
        admission_year: i32,
        courses: Vec<Course>,
    ) -> StudentRecord {
        StudentRecord {
            id: Some(format!("doc-{name}")),
            name: name.to_string(),
            student_id: student_id.to_string(),
            department,
            admission_year,
            courses,
            hobby: None,
            self_intro: None,
            avatar_url: None,
            owner_ref: None,
        }
    }

    fn sample() -> Vec<StudentRecord> {
        vec![
            student(
                "田中太郎",
                "B2201",
                Department::Management,
                2022,
                vec![Course::IntroToManagement],
            ),
            student("鈴木花子", "B2302", Department::Management, 2023, vec![]),
            student(
                "佐藤一",
                "E2103",
                Department::BusinessEconomics,
                2021,
                vec![Course::DataAnalysis, Course::IntroToStatistics],
            ),
        ]
    }

    #[test]
    fn empty_spec_is_identity_filter() {
        let records = sample();
        let result = filter_and_sort(&records, &FilterSpec::default());
        assert_eq!(result, records);
    }

    #[test]
    fn department_filter_returns_both_in_store_order() {
        let records = sample();
        let spec = FilterSpec {
            department: Some(Department::Management),
            ..Default::default()
        };
        let result = filter_and_sort(&records, &spec);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name, "田中太郎");
        assert_eq!(result[1].name, "鈴木花子");
    }

    #[test]
    fn department_and_course_filter_narrows_to_one() {
        let records = sample();
        let spec = FilterSpec {
            department: Some(Department::Management),
            courses: vec![Course::IntroToManagement],
            ..Default::default()
        };
        let result = filter_and_sort(&records, &spec);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "田中太郎");
    }

    #[test]
    fn courses_predicate_requires_all_of() {
        let records = sample();
        let spec = FilterSpec {
            courses: vec![Course::DataAnalysis, Course::IntroToStatistics],
            ..Default::default()
        };
        let result = filter_and_sort(&records, &spec);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "佐藤一");

        // A record holding only one of the requested courses must not match
        let spec = FilterSpec {
            courses: vec![Course::DataAnalysis, Course::IntroToManagement],
            ..Default::default()
        };
        assert!(filter_and_sort(&records, &spec).is_empty());
    }

    #[test]
    fn name_predicate_is_substring() {
        let records = sample();
        let spec = FilterSpec {
            name: Some("田中".to_string()),
            ..Default::default()
        };
        let result = filter_and_sort(&records, &spec);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "田中太郎");
    }

    #[test]
    fn student_id_predicate_is_substring() {
        let records = sample();
        let spec = FilterSpec {
            student_id: Some("23".to_string()),
            ..Default::default()
        };
        let result = filter_and_sort(&records, &spec);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].student_id, "B2302");
    }

    #[test]
    fn every_surviving_record_satisfies_all_predicates() {
        let records = sample();
        let spec = FilterSpec {
            department: Some(Department::Management),
            admission_year: Some(2022),
            ..Default::default()
        };
        let result = filter_and_sort(&records, &spec);
        assert!(!result.is_empty());
        for r in &result {
            assert_eq!(r.department, Department::Management);
            assert_eq!(r.admission_year, 2022);
        }
        // Completeness: records satisfying all predicates all appear
        let expected = records
            .iter()
            .filter(|r| r.department == Department::Management && r.admission_year == 2022)
            .count();
        assert_eq!(result.len(), expected);
    }

    #[test]
    fn grade_and_newest_are_exact_reverses_without_ties() {
        let records = sample();
        let grade = filter_and_sort(
            &records,
            &FilterSpec {
                sort: Some(SortKey::Grade),
                ..Default::default()
            },
        );
        let mut newest = filter_and_sort(
            &records,
            &FilterSpec {
                sort: Some(SortKey::Newest),
                ..Default::default()
            },
        );
        newest.reverse();
        assert_eq!(grade, newest);
        assert_eq!(
            grade.iter().map(|r| r.admission_year).collect::<Vec<_>>(),
            vec![2021, 2022, 2023]
        );
    }

    #[test]
    fn ties_preserve_store_order() {
        let records = vec![
            student("後", "1", Department::Management, 2022, vec![]),
            student("先", "2", Department::Management, 2022, vec![]),
        ];
        let result = filter_and_sort(
            &records,
            &FilterSpec {
                sort: Some(SortKey::Grade),
                ..Default::default()
            },
        );
        assert_eq!(result[0].name, "後");
        assert_eq!(result[1].name, "先");
    }

    #[test]
    fn unknown_department_never_matches_a_set_predicate() {
        let mut records = sample();
        records[0].department = Department::Unknown;
        let spec = FilterSpec {
            department: Some(Department::Management),
            ..Default::default()
        };
        let result = filter_and_sort(&records, &spec);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "鈴木花子");
    }
}
