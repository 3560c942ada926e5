#![forbid(unsafe_code)]

pub mod ids {
    const MAX_ID_LEN: usize = 128;

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum IdError {
        Empty,
        TooLong,
        InvalidFirstChar,
        InvalidChar { ch: char, index: usize },
    }

    fn validate_id(value: &str) -> Result<(), IdError> {
        if value.is_empty() {
            return Err(IdError::Empty);
        }
        if value.len() > MAX_ID_LEN {
            return Err(IdError::TooLong);
        }
        let mut chars = value.chars();
        let Some(first) = chars.next() else {
            return Err(IdError::Empty);
        };
        if !first.is_ascii_alphanumeric() {
            return Err(IdError::InvalidFirstChar);
        }
        for (index, ch) in value.chars().enumerate() {
            if index == 0 {
                continue;
            }
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-' | ':') {
                continue;
            }
            return Err(IdError::InvalidChar { ch, index });
        }
        Ok(())
    }

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct CourseId(String);

    impl CourseId {
        pub fn try_new(value: impl Into<String>) -> Result<Self, IdError> {
            let value = value.into();
            validate_id(&value)?;
            Ok(Self(value))
        }

        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn into_string(self) -> String {
            self.0
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct LessonId(String);

    impl LessonId {
        pub fn try_new(value: impl Into<String>) -> Result<Self, IdError> {
            let value = value.into();
            validate_id(&value)?;
            Ok(Self(value))
        }

        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn into_string(self) -> String {
            self.0
        }
    }
}

pub mod identity {
    /// Who performed a view: an authenticated user id, an anonymous session
    /// id, or both when the session belongs to a signed-in user. At least one
    /// field is always present.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct ViewerIdentity {
        user_id: Option<String>,
        session_id: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum ViewerIdentityError {
        NoIdentity,
        BlankField(&'static str),
    }

    impl ViewerIdentity {
        pub fn try_new(
            user_id: Option<String>,
            session_id: Option<String>,
        ) -> Result<Self, ViewerIdentityError> {
            if user_id.is_none() && session_id.is_none() {
                return Err(ViewerIdentityError::NoIdentity);
            }
            if user_id.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ViewerIdentityError::BlankField("user_id"));
            }
            if session_id.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ViewerIdentityError::BlankField("session_id"));
            }
            Ok(Self {
                user_id,
                session_id,
            })
        }

        pub fn user(user_id: impl Into<String>) -> Self {
            Self {
                user_id: Some(user_id.into()),
                session_id: None,
            }
        }

        pub fn session(session_id: impl Into<String>) -> Self {
            Self {
                user_id: None,
                session_id: Some(session_id.into()),
            }
        }

        pub fn user_id(&self) -> Option<&str> {
            self.user_id.as_deref()
        }

        pub fn session_id(&self) -> Option<&str> {
            self.session_id.as_deref()
        }
    }
}

pub mod model {
    /// Sort order for assignment listings.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub enum AssignmentSort {
        /// Priority ascending, most recently created first within a priority.
        #[default]
        Priority,
        /// Purely by creation time, most recent first.
        Recent,
    }

    impl AssignmentSort {
        pub fn as_str(self) -> &'static str {
            match self {
                AssignmentSort::Priority => "priority",
                AssignmentSort::Recent => "recent",
            }
        }

        pub fn parse(value: &str) -> Option<Self> {
            match value.trim() {
                "priority" => Some(AssignmentSort::Priority),
                "recent" => Some(AssignmentSort::Recent),
                _ => None,
            }
        }
    }

    /// Sort order for the unassigned-lessons listing. `Priority` is accepted
    /// for symmetry with the assigned listing; unassigned lessons carry no
    /// priority, so it orders by title.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub enum AvailableSort {
        #[default]
        Title,
        Recent,
        Priority,
    }

    impl AvailableSort {
        pub fn as_str(self) -> &'static str {
            match self {
                AvailableSort::Title => "title",
                AvailableSort::Recent => "recent",
                AvailableSort::Priority => "priority",
            }
        }

        pub fn parse(value: &str) -> Option<Self> {
            match value.trim() {
                "title" => Some(AvailableSort::Title),
                "recent" => Some(AvailableSort::Recent),
                "priority" => Some(AvailableSort::Priority),
                _ => None,
            }
        }
    }

    /// Publication status of a catalog entity (course or lesson).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub enum CatalogStatus {
        #[default]
        Active,
        Archived,
    }

    impl CatalogStatus {
        pub fn as_str(self) -> &'static str {
            match self {
                CatalogStatus::Active => "active",
                CatalogStatus::Archived => "archived",
            }
        }

        pub fn parse(value: &str) -> Option<Self> {
            match value.trim() {
                "active" => Some(CatalogStatus::Active),
                "archived" => Some(CatalogStatus::Archived),
                _ => None,
            }
        }
    }
}
