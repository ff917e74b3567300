use serde::{Deserialize, Serialize};

/// How the final HTTP status is chosen when a listener names several errors
/// with different statuses and gives no explicit override.
///
/// The default, [`HighestNumeric`](Self::HighestNumeric), picks the largest
/// status: given `{400, 500}` the response is always `500`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "order", rename_all = "snake_case")]
pub enum StatusPrecedence {
    #[default]
    HighestNumeric,
    /// Status of the first resolved error.
    FirstResolved,
    /// First status in this list that any resolved error has. Statuses not
    /// in the list lose to listed ones; if none are listed, highest wins.
    Ordered(Vec<u16>),
}

impl StatusPrecedence {
    /// Choose one status out of those of the resolved errors, in resolution
    /// order. Returns `None` only for an empty input.
    pub fn select(&self, statuses: &[u16]) -> Option<u16> {
        match self {
            Self::HighestNumeric => statuses.iter().copied().max(),
            Self::FirstResolved => statuses.first().copied(),
            Self::Ordered(order) => order
                .iter()
                .copied()
                .find(|status| statuses.contains(status))
                .or_else(|| statuses.iter().copied().max()),
        }
    }
}
