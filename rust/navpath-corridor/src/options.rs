use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

pub const DEFAULT_PENALTY_SLACK: f64 = 1.4;
pub const DEFAULT_MAX_SIMPLIFY_ITERATIONS: u32 = 1_000;
pub const DEFAULT_FUNNEL_EPS: f64 = 1e-9;
pub const DEFAULT_DESTROYED_CHECK_INTERVAL: u32 = 10;
pub const DEFAULT_NEIGHBOR_WINDOW: usize = 2;

/// How the node sequence is reduced before portals are extracted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Simplification {
    #[default]
    None,
    Iterative,
    RecursiveBinary,
    RecursiveTrinary,
}

impl FromStr for Simplification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "none" | "" => Ok(Simplification::None),
            "iterative" => Ok(Simplification::Iterative),
            "recursive_binary" | "binary" => Ok(Simplification::RecursiveBinary),
            "recursive_trinary" | "trinary" => Ok(Simplification::RecursiveTrinary),
            other => Err(format!("unknown simplification mode {other:?}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorridorOptions {
    pub simplification: Simplification,
    /// Let corridor parts on either side of a region change meet at the
    /// neighboring part's boundary node instead of their own.
    pub merge_part_endpoints: bool,
    /// Average per-node penalty a straight-line shortcut may carry relative to
    /// the nodes it replaces.
    pub penalty_slack: f64,
    pub max_simplify_iterations: u32,
    pub funnel_eps: f64,
    /// Localizer ticks between full scans of the corridor for destroyed nodes.
    pub destroyed_check_interval: u32,
    /// Corridor nodes checked on each side of the current one before the
    /// localizer falls back to a full scan.
    pub neighbor_window: usize,
}

impl Default for CorridorOptions {
    fn default() -> Self {
        Self {
            simplification: Simplification::None,
            merge_part_endpoints: true,
            penalty_slack: DEFAULT_PENALTY_SLACK,
            max_simplify_iterations: DEFAULT_MAX_SIMPLIFY_ITERATIONS,
            funnel_eps: DEFAULT_FUNNEL_EPS,
            destroyed_check_interval: DEFAULT_DESTROYED_CHECK_INTERVAL,
            neighbor_window: DEFAULT_NEIGHBOR_WINDOW,
        }
    }
}

impl CorridorOptions {
    pub fn with_simplification(mut self, simplification: Simplification) -> Self {
        self.simplification = simplification;
        self
    }

    /// Load options from environment variables. Missing/invalid values fall back to defaults.
    ///
    /// Variables:
    /// - NAVPATH_CORRIDOR_SIMPLIFICATION: none | iterative | recursive_binary | recursive_trinary
    /// - NAVPATH_CORRIDOR_MERGE_ENDPOINTS: "1"/"0"
    /// - NAVPATH_CORRIDOR_PENALTY_SLACK: float > 0
    /// - NAVPATH_CORRIDOR_MAX_SIMPLIFY_ITERATIONS: integer > 0
    /// - NAVPATH_CORRIDOR_FUNNEL_EPS: float >= 0
    /// - NAVPATH_CORRIDOR_DESTROYED_CHECK_INTERVAL: integer > 0
    /// - NAVPATH_CORRIDOR_NEIGHBOR_WINDOW: integer
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = lookup("NAVPATH_CORRIDOR_SIMPLIFICATION") {
            match v.parse::<Simplification>() {
                Ok(mode) => cfg.simplification = mode,
                Err(e) => tracing::warn!(error = %e, "ignoring NAVPATH_CORRIDOR_SIMPLIFICATION"),
            }
        }
        if let Some(v) = lookup("NAVPATH_CORRIDOR_MERGE_ENDPOINTS") { cfg.merge_part_endpoints = v.trim() != "0"; }
        if let Some(v) = lookup("NAVPATH_CORRIDOR_PENALTY_SLACK") {
            if let Ok(x) = v.trim().parse::<f64>() { if x > 0.0 { cfg.penalty_slack = x; } }
        }
        if let Some(v) = lookup("NAVPATH_CORRIDOR_MAX_SIMPLIFY_ITERATIONS") {
            if let Ok(n) = v.trim().parse::<u32>() { if n > 0 { cfg.max_simplify_iterations = n; } }
        }
        if let Some(v) = lookup("NAVPATH_CORRIDOR_FUNNEL_EPS") {
            if let Ok(x) = v.trim().parse::<f64>() { if x >= 0.0 { cfg.funnel_eps = x; } }
        }
        if let Some(v) = lookup("NAVPATH_CORRIDOR_DESTROYED_CHECK_INTERVAL") {
            if let Ok(n) = v.trim().parse::<u32>() { if n > 0 { cfg.destroyed_check_interval = n; } }
        }
        if let Some(v) = lookup("NAVPATH_CORRIDOR_NEIGHBOR_WINDOW") {
            if let Ok(n) = v.trim().parse::<usize>() { cfg.neighbor_window = n; }
        }
        cfg
    }
}
