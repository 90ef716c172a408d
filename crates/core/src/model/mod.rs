mod ids;
mod question_map;
mod record;
mod reorder;
mod review;
mod session;
mod settings;
mod store;

pub use ids::{ParseQuestionNumberError, QuestionNumber, QuestionRange};
pub use question_map::QuestionMap;

pub use record::{AnswerKeySheet, RecordError, RecordSettings, TIMESTAMP_FORMAT, TestRecord, TimeUsed};
pub use reorder::{DragGesture, DropTarget};
pub use review::{ReviewError, ReviewRow, ReviewSheet, ScoreCounts, SortBy, Verdict, classify};
pub use session::{
    NAVIGATION_DEBOUNCE_MS, OverallClock, QuestionState, QuestionTimer, SessionEvent,
    SessionOutcome, SessionPhase, SessionProgress, SessionStateError, TestSession,
};
pub use settings::{
    AnswerOptions, DEFAULT_OPTION_COUNT, DEFAULT_QUESTION_COUNT, DisplaySettings,
    MAX_FIRST_QUESTION, MAX_OPTIONS, MAX_QUESTIONS, MAX_TIME_LIMIT_MINUTES, MIN_OPTIONS,
    OPTION_ALPHABET, SettingsError, TestSettings, TestSettingsDraft, TimeLimit,
};
pub use store::{StoreError, TestStore, normalize_name};
