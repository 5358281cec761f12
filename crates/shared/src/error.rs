use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("transition `{label}` was dropped before signaling completion")]
    TransitionAbandoned { label: String },
    #[error("presentable tag `{tag}` is registered more than once")]
    DuplicateTag { tag: String },
}

impl NavigationError {
    pub fn abandoned(label: impl Into<String>) -> Self {
        Self::TransitionAbandoned {
            label: label.into(),
        }
    }
}
