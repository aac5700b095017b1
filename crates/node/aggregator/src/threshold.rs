/// Threshold for `count` parties: `floor(count / factor) + 1`, clamped to
/// `1..=count`.
///
/// Returns `None` when there are no parties or `factor` is not a positive
/// finite number.
pub fn compute_threshold(count: usize, factor: f64) -> Option<u32> {
    if count == 0 || !factor.is_finite() || factor <= 0.0 {
        return None;
    }
    let raw = ((count as f64 / factor).floor() as u64).saturating_add(1);
    let clamped = raw.clamp(1, count as u64);
    u32::try_from(clamped).ok()
}
