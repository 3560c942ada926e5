#![forbid(unsafe_code)]

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    InvalidInput(&'static str),
    CourseNotFound,
    LessonNotFound,
    AssignmentNotFound,
    DuplicateCourse,
    DuplicateLesson,
    DuplicateAssignment,
    TransactionAborted { reason: String },
}

impl StoreError {
    /// Stable machine-readable code for the HTTP boundary.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO",
            Self::Sql(_) => "SQL",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::CourseNotFound => "COURSE_NOT_FOUND",
            Self::LessonNotFound => "LESSON_NOT_FOUND",
            Self::AssignmentNotFound => "ASSIGNMENT_NOT_FOUND",
            Self::DuplicateCourse => "DUPLICATE_COURSE",
            Self::DuplicateLesson => "DUPLICATE_LESSON",
            Self::DuplicateAssignment => "DUPLICATE_ASSIGNMENT",
            Self::TransactionAborted { .. } => "TRANSACTION_ABORTED",
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::CourseNotFound => write!(f, "course not found"),
            Self::LessonNotFound => write!(f, "lesson not found"),
            Self::AssignmentNotFound => write!(f, "assignment not found"),
            Self::DuplicateCourse => write!(f, "course already registered"),
            Self::DuplicateLesson => write!(f, "lesson already registered"),
            Self::DuplicateAssignment => {
                write!(f, "lesson is already assigned to this course")
            }
            Self::TransactionAborted { reason } => {
                write!(f, "reorder aborted, no priorities changed ({reason})")
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}
