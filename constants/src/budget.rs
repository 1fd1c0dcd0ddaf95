/// Smallest point budget a dataset may be configured with.
pub const MIN_POINT_BUDGET: u32 = 10_000;

/// Largest point budget a dataset may be configured with.
pub const MAX_POINT_BUDGET: u32 = 500_000;

/// Budget applied to a freshly loaded dataset. Matches the midpoint the
/// budget slider starts at so the control and the dataset agree.
pub const DEFAULT_POINT_BUDGET: u32 = (MIN_POINT_BUDGET + MAX_POINT_BUDGET) / 2;

/// Increment used by the native panel's -/+ budget buttons.
pub const POINT_BUDGET_STEP: u32 = 10_000;
