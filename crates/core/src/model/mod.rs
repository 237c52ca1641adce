mod exam;
mod ids;
mod question;

pub use exam::ExamSeed;
pub use ids::{ExamId, OptionId, ParseIdError, QuestionId};
pub use question::{
    Answer, AnswerValue, ChoiceOption, QuestionError, QuestionKind, QuestionRecord, QuestionSeed,
};
