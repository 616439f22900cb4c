//! Shared data types for the transactional store

mod enums;
mod stats;
mod transactional;

// Re-export enum types
pub use enums::{QuestionType, UserRole};

// Re-export stats types
pub use stats::DashboardCounts;

// Re-export transactional row types
pub use transactional::{
    AnswerRow, AuditLogRow, NewAnswer, NewAuditLog, NewQuestion, NewQuestionnaire, NewUser,
    QuestionRow, QuestionnaireRow, QuestionnaireWithQuestions, ResponseRow, SessionAnswerRow,
    SessionRow, UserRow, UserWithAssignment,
};
