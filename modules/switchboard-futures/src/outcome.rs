//! Tagged completion result. Success, or one failure message per failed
//! unit of work.

/// Result of completed work. `Failure` carries every failing child's
/// message, in child order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(Vec<String>),
}

impl Outcome {
    /// Lift an optional error message: None is success.
    pub fn from_error(error: Option<String>) -> Self {
        match error {
            Some(message) => Self::Failure(vec![message]),
            None => Self::Success,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    pub fn failures(&self) -> &[String] {
        match self {
            Self::Success => &[],
            Self::Failure(messages) => messages,
        }
    }

    /// Flattened one-line form: all failure messages comma-joined, or None
    /// on success. A human-readable summary, not a recovery signal; callers
    /// needing per-child identity use [`failures`](Self::failures).
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Success => None,
            Self::Failure(messages) => Some(messages.join(",")),
        }
    }

    /// Join outcomes in order: success iff every input succeeded, otherwise
    /// a failure carrying every input's failure messages.
    pub fn merge(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        let failures: Vec<String> = outcomes
            .into_iter()
            .flat_map(|outcome| match outcome {
                Self::Success => Vec::new(),
                Self::Failure(messages) => messages,
            })
            .collect();
        if failures.is_empty() {
            Self::Success
        } else {
            Self::Failure(failures)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_error_maps_definedness() {
        assert_eq!(Outcome::from_error(None), Outcome::Success);
        assert_eq!(
            Outcome::from_error(Some("boom".to_string())),
            Outcome::Failure(vec!["boom".to_string()])
        );
    }

    #[test]
    fn merge_preserves_order_and_drops_successes() {
        let merged = Outcome::merge([
            Outcome::Success,
            Outcome::Failure(vec!["first".to_string()]),
            Outcome::Success,
            Outcome::Failure(vec!["second".to_string(), "third".to_string()]),
        ]);
        assert_eq!(merged.failures(), ["first", "second", "third"]);
        assert_eq!(merged.message().as_deref(), Some("first,second,third"));
    }

    #[test]
    fn merge_of_successes_is_success() {
        assert!(Outcome::merge([Outcome::Success, Outcome::Success]).is_success());
        assert!(Outcome::merge([]).is_success());
    }
}
