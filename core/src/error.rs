use thiserror::Error;

/// Reasons a component declines to mount.
///
/// None of these reach the page: the composition root logs them and carries
/// on with the remaining components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EffectError {
    #[error("no element matches `{selector}`")]
    MissingElement { selector: String },

    #[error("{capability} is not available in this browser")]
    Unsupported { capability: &'static str },

    #[error("{component} is disabled in configuration")]
    Disabled { component: &'static str },
}

impl EffectError {
    pub(crate) fn missing(selector: impl Into<String>) -> Self {
        Self::MissingElement {
            selector: selector.into(),
        }
    }
}
