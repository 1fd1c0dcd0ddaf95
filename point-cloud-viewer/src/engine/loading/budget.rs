use super::registry::DatasetRegistry;
use crate::engine::assets::catalog::DatasetKey;
use crate::engine::assets::dataset::PointBudget;

/// Clamp `value` into the allowed range and apply it to an installed dataset.
///
/// Returns the budget actually applied, or `None` if nothing is installed
/// under `key` (including while a load is still in flight).
pub fn set_budget(registry: &mut DatasetRegistry, key: &DatasetKey, value: i64) -> Option<PointBudget> {
    let dataset = registry.get_mut(key)?;
    dataset.point_budget = PointBudget::clamped(value);
    Some(dataset.point_budget)
}
