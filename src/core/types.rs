//! Identifier and counter types shared by the scheduler and its rosters

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable handle for a roster unit; kept across deaths and side changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub Uuid);

impl UnitId {
    /// Random v4 id for a freshly spawned unit
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UnitId {
    fn default() -> Self {
        Self::new()
    }
}

/// Short form for logs: `unit-` plus the first eight hex digits
impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.0.simple().to_string();
        write!(f, "unit-{}", &hex[..8])
    }
}

/// Absolute or relative turn count; the first turn is 1
pub type TurnNumber = u32;
