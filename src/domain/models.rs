use serde::Deserialize;

/// Cumulative counters for one player, as reported by the remote service.
///
/// The source treats these as non-decreasing; a reset upstream shows up as a
/// negative delta downstream and is passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CumulativeStats {
    pub rating: i64,
    pub wins_total: i64,
    pub plays_total: i64,
}

/// One player record from a batch stats response.
///
/// `pid` and the three counters are required; identity fields are optional
/// and only overwrite stored metadata when the service actually supplies
/// them.
#[derive(Debug, Clone, Deserialize)]
pub struct VersusStats {
    pub pid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub versus_rating: i64,
    pub versus_won: i64,
    pub versus_plays: i64,
}

impl VersusStats {
    pub fn cumulative(&self) -> CumulativeStats {
        CumulativeStats {
            rating: self.versus_rating,
            wins_total: self.versus_won,
            plays_total: self.versus_plays,
        }
    }
}

/// What today's delta is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaBasis {
    /// No record dated before today exists for this player.
    FirstObservation,
    /// Cumulative totals from the most recent record dated before today.
    DeltaFrom(CumulativeStats),
}
