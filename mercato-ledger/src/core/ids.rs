use mercato_common::types::Identified;

/// Next free identifier for a collection: one past the largest in use, or 1
/// for an empty collection. Gaps are never filled.
pub fn next_id<R: Identified>(records: &[R]) -> u32 {
    records
        .iter()
        .map(Identified::id)
        .max()
        .map_or(1, |max| max.saturating_add(1))
}
