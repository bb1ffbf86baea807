/// Environment variable that overrides [`RenderOpts::instruction_budget`] defaults.
pub const INSTRUCTION_BUDGET_ENV: &str = "FIRTREE_INSTRUCTION_BUDGET";

const DEFAULT_INSTRUCTION_BUDGET: u64 = 1_000_000;
const DEFAULT_MAX_GRAPH_DEPTH: usize = 64;

/// Limits applied while evaluating sampler graphs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderOpts {
    /// Maximum VM instructions per kernel invocation, including nested helper calls.
    pub instruction_budget: u64,
    /// Maximum sampler nesting depth accepted when planning a graph.
    pub max_graph_depth: usize,
}

impl Default for RenderOpts {
    fn default() -> Self {
        let instruction_budget = std::env::var(INSTRUCTION_BUDGET_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(DEFAULT_INSTRUCTION_BUDGET);
        Self {
            instruction_budget,
            max_graph_depth: DEFAULT_MAX_GRAPH_DEPTH,
        }
    }
}

impl RenderOpts {
    /// Replace the per-invocation instruction budget.
    pub fn with_instruction_budget(mut self, budget: u64) -> Self {
        self.instruction_budget = budget;
        self
    }

    /// Replace the maximum graph depth.
    pub fn with_max_graph_depth(mut self, depth: usize) -> Self {
        self.max_graph_depth = depth;
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/opts.rs"]
mod tests;
