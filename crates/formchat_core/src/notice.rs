/// What kind of user-visible problem a notice reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Fetch or connection failure. Dismissable, never retried automatically.
    Network,
    /// Missing required input before a submit.
    Validation,
    /// Handoff attempted with nothing selected.
    EmptySelection,
    /// Expired or missing token.
    Auth,
    /// Speech recognition unavailable or failed.
    Speech,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn network(text: impl Into<String>) -> Self {
        Self::new(NoticeKind::Network, text)
    }

    pub fn validation(text: impl Into<String>) -> Self {
        Self::new(NoticeKind::Validation, text)
    }

    pub fn auth() -> Self {
        Self::new(NoticeKind::Auth, "Session expired, please login again.")
    }

    pub fn speech(text: impl Into<String>) -> Self {
        Self::new(NoticeKind::Speech, text)
    }
}
