use crate::error::EnrichError;

/// Capability set shared by the enrichment strategies.
///
/// Call order within one engine cycle: any number of `sample` /
/// `compute_correction` pairs, then exactly one `on_cycle_boundary`.
pub trait Enrichment {
    /// Record the newest sensor value.
    fn sample(&mut self, value: f32);

    /// Fuel correction in ms for the current history (negative removes fuel).
    fn compute_correction(&mut self) -> f32;

    /// Advance per-cycle state. Strategies without multi-cycle state ignore it.
    fn on_cycle_boundary(&mut self) {}

    /// Clear history and any accumulated state.
    fn reset(&mut self);

    /// Resize the history window; rejected sizes keep the current history.
    fn set_capacity(&mut self, requested: i64) -> Result<(), EnrichError>;
}
