use crate::levels::{QUIZ_COMPLETION_XP, SECTION_COMPLETION_XP};
use crate::model::ids::{CourseId, SectionId};
use crate::model::question::Quiz;

//
// ─── SECTION ───────────────────────────────────────────────────────────────────
//

/// One unit of a course, optionally gated by a quiz.
///
/// `is_completed` only moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    id: SectionId,
    title: String,
    quiz: Option<Quiz>,
    is_completed: bool,
    xp_reward: Option<u32>,
}

impl Section {
    #[must_use]
    pub fn new(id: SectionId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            quiz: None,
            is_completed: false,
            xp_reward: None,
        }
    }

    #[must_use]
    pub fn with_quiz(mut self, quiz: Quiz) -> Self {
        self.quiz = Some(quiz);
        self
    }

    #[must_use]
    pub fn with_xp_reward(mut self, xp: u32) -> Self {
        self.xp_reward = Some(xp);
        self
    }

    #[must_use]
    pub fn completed(mut self) -> Self {
        self.is_completed = true;
        self
    }

    #[must_use]
    pub fn id(&self) -> &SectionId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// XP awarded for completing this section.
    ///
    /// Falls back to the quiz or reading reward when no explicit value was set.
    #[must_use]
    pub fn xp_reward(&self) -> u32 {
        self.xp_reward.unwrap_or(if self.quiz.is_some() {
            QUIZ_COMPLETION_XP
        } else {
            SECTION_COMPLETION_XP
        })
    }

    pub fn mark_completed(&mut self) {
        self.is_completed = true;
    }

    /// Fold a fresher copy of this section (e.g. from a server response) into self.
    ///
    /// Completion is OR-ed so a stale payload can never un-complete a section.
    pub fn absorb(&mut self, newer: Section) {
        debug_assert_eq!(self.id, newer.id);
        self.title = newer.title;
        if newer.quiz.is_some() {
            self.quiz = newer.quiz;
        }
        if newer.xp_reward.is_some() {
            self.xp_reward = newer.xp_reward;
        }
        self.is_completed = self.is_completed || newer.is_completed;
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// An ordered list of sections. Progress is always derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    id: CourseId,
    title: String,
    sections: Vec<Section>,
}

impl Course {
    #[must_use]
    pub fn new(id: CourseId, title: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            id,
            title: title.into(),
            sections,
        }
    }

    #[must_use]
    pub fn id(&self) -> &CourseId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id() == id)
    }

    #[must_use]
    pub fn completed_sections(&self) -> usize {
        self.sections.iter().filter(|s| s.is_completed()).count()
    }

    /// Percentage (0-100) of completed sections; a course without sections is at 0.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        if self.sections.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.completed_sections() as f64 / self.sections.len() as f64;
        ratio * 100.0
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        !self.sections.is_empty() && self.sections.iter().all(Section::is_completed)
    }

    /// Merge an updated section into the course.
    ///
    /// Returns `false` when the section does not belong to this course.
    pub fn apply_section_update(&mut self, updated: Section) -> bool {
        match self.sections.iter_mut().find(|s| s.id == updated.id) {
            Some(existing) => {
                existing.absorb(updated);
                true
            }
            None => false,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
