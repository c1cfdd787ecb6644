/// Points lost per inconsistency group.
pub const PENALTY_PER_GROUP: usize = 5;

/// Project health percentage: `max(0, 100 - 5 * groups)`.
pub fn score(group_count: usize) -> u8 {
    100usize.saturating_sub(group_count.saturating_mul(PENALTY_PER_GROUP)) as u8
}
