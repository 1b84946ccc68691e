//! Upstream course payloads and their normalization into domain types.
//!
//! `correctIndex` is the canonical answer field. Older generators emitted
//! `correctOption`, `correctAnswer`, `correct_option` or `correct_answer`;
//! those are only consulted when `correctIndex` is absent, and disagreement
//! between them is recorded as [`AnswerKey::Ambiguous`] instead of picking one.

use serde::Deserialize;
use serde_json::Value;

use crate::model::course::{Course, Section};
use crate::model::ids::{CourseId, QuestionId, SectionId};
use crate::model::question::{AnswerKey, Question, QuestionError, Quiz};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(alias = "question")]
    pub text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_index: Option<Value>,
    #[serde(default)]
    pub correct_option: Option<Value>,
    #[serde(default)]
    pub correct_answer: Option<Value>,
    #[serde(default, rename = "correct_option")]
    pub snake_correct_option: Option<Value>,
    #[serde(default, rename = "correct_answer")]
    pub snake_correct_answer: Option<Value>,
}

impl QuestionRecord {
    /// Resolve the answer field variants into a single key.
    #[must_use]
    pub fn answer_key(&self) -> AnswerKey {
        if let Some(canonical) = &self.correct_index {
            return match as_index(canonical) {
                Some(index) => AnswerKey::Resolved { index },
                None => AnswerKey::Missing,
            };
        }

        let mut candidates: Vec<usize> = [
            &self.correct_option,
            &self.correct_answer,
            &self.snake_correct_option,
            &self.snake_correct_answer,
        ]
        .into_iter()
        .flatten()
        .filter_map(as_index)
        .collect();
        candidates.sort_unstable();
        candidates.dedup();

        match candidates.as_slice() {
            [] => AnswerKey::Missing,
            [index] => AnswerKey::Resolved { index: *index },
            _ => AnswerKey::Ambiguous { candidates },
        }
    }

    /// Convert into a domain question; `position` names questions that carry no id.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the options are empty or the answer is out of range.
    pub fn into_question(self, position: usize) -> Result<Question, QuestionError> {
        let answer = self.answer_key();
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .map_or_else(|| QuestionId::new(format!("q{}", position + 1)), QuestionId::new);
        Question::with_answer_key(id, self.text, self.options, answer)
    }
}

fn as_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "questions")]
    pub quiz: Option<Vec<QuestionRecord>>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub xp_reward: Option<u32>,
}

impl SectionRecord {
    /// # Errors
    ///
    /// Returns the first `QuestionError` found in the section's quiz.
    pub fn into_section(self) -> Result<Section, QuestionError> {
        let mut section = Section::new(SectionId::new(self.id), self.title);
        if let Some(records) = self.quiz {
            let questions = records
                .into_iter()
                .enumerate()
                .map(|(position, record)| record.into_question(position))
                .collect::<Result<Vec<_>, _>>()?;
            section = section.with_quiz(Quiz::new(questions));
        }
        if let Some(xp) = self.xp_reward {
            section = section.with_xp_reward(xp);
        }
        if self.is_completed {
            section.mark_completed();
        }
        Ok(section)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, alias = "course_name")]
    pub title: String,
    #[serde(default)]
    pub sections: Vec<SectionRecord>,
}

impl CourseRecord {
    /// # Errors
    ///
    /// Returns the first `QuestionError` found in any section.
    pub fn into_course(self) -> Result<Course, QuestionError> {
        let sections = self
            .sections
            .into_iter()
            .map(SectionRecord::into_section)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Course::new(CourseId::new(self.id), self.title, sections))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> QuestionRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn canonical_field_wins_over_legacy() {
        let r = record(json!({
            "text": "Q", "options": ["a", "b", "c"],
            "correctIndex": 2, "correctOption": 0
        }));
        assert_eq!(r.answer_key(), AnswerKey::Resolved { index: 2 });
    }

    #[test]
    fn each_legacy_name_is_understood() {
        for field in ["correctOption", "correctAnswer", "correct_option", "correct_answer"] {
            let r = record(json!({ "question": "Q", "options": ["a", "b"], field: 1 }));
            assert_eq!(r.answer_key(), AnswerKey::Resolved { index: 1 }, "{field}");
        }
    }

    #[test]
    fn agreeing_legacy_names_resolve() {
        let r = record(json!({
            "text": "Q", "options": ["a", "b"],
            "correctOption": 1, "correct_answer": "1"
        }));
        assert_eq!(r.answer_key(), AnswerKey::Resolved { index: 1 });
    }

    #[test]
    fn conflicting_legacy_names_are_ambiguous() {
        let r = record(json!({
            "text": "Q", "options": ["a", "b", "c"],
            "correctOption": 0, "correctAnswer": 2
        }));
        assert_eq!(
            r.answer_key(),
            AnswerKey::Ambiguous {
                candidates: vec![0, 2]
            }
        );
    }

    #[test]
    fn non_index_answers_are_missing() {
        let r = record(json!({ "text": "Q", "options": ["T", "F"], "correctAnswer": false }));
        assert_eq!(r.answer_key(), AnswerKey::Missing);
        let r = record(json!({ "text": "Q", "options": ["T", "F"] }));
        assert_eq!(r.answer_key(), AnswerKey::Missing);
    }

    #[test]
    fn course_payload_normalizes_sections_and_questions() {
        let course: CourseRecord = serde_json::from_value(json!({
            "_id": "c1",
            "course_name": "Python",
            "sections": [
                { "_id": "s1", "title": "Intro", "isCompleted": true },
                { "id": "s2", "title": "Loops", "questions": [
                    { "question": "Q1", "options": ["a", "b"], "correctOption": 1 },
                    { "_id": "x", "question": "Q2", "options": ["a", "b"], "correct_answer": 0 }
                ]}
            ]
        }))
        .unwrap();

        let course = course.into_course().unwrap();
        assert_eq!(course.title(), "Python");
        assert_eq!(course.completed_sections(), 1);

        let quiz = course.sections()[1].quiz().unwrap();
        assert_eq!(quiz.len(), 2);
        assert_eq!(quiz.question(0).unwrap().id(), &QuestionId::new("q1"));
        assert_eq!(quiz.question(0).unwrap().correct_index(), Some(1));
        assert_eq!(quiz.question(1).unwrap().id(), &QuestionId::new("x"));
    }

    #[test]
    fn out_of_range_answer_rejects_section() {
        let section: SectionRecord = serde_json::from_value(json!({
            "id": "s1", "title": "Bad",
            "quiz": [{ "text": "Q", "options": ["a"], "correctIndex": 4 }]
        }))
        .unwrap();
        assert!(matches!(
            section.into_section(),
            Err(QuestionError::AnswerOutOfRange { index: 4, .. })
        ));
    }
}
