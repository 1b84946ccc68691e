mod course;
mod ids;
pub mod ingest;
mod progression;
mod question;
mod xp;

pub use ids::{AttemptId, CourseId, ParseIdError, QuestionId, SectionId};

pub use course::{Course, Section};
pub use ingest::{CourseRecord, QuestionRecord, SectionRecord};
pub use progression::{UserProgression, UserProgressionPartial};
pub use question::{AnswerKey, Question, QuestionError, Quiz};
pub use xp::{PeriodParseError, XpBucket, XpPeriod, XpSnapshot};
