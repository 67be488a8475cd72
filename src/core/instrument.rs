use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a traded instrument (stock symbol, ticker, ISIN...).
///
/// # Examples
///
/// ```
/// use var_engine::core::instrument::InstrumentId;
///
/// let nabil = InstrumentId::new("NABIL");
/// let nica = InstrumentId::new("NICA");
/// assert_ne!(nabil, nica);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentId(String);

impl InstrumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InstrumentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
