use std::collections::HashMap;

// Shared ranking and placement-bonus rules. Every rank-paying variant
// (survival, mind, quick) funnels through the same table and the same
// tie/last-place forfeit policy.

/// Competition ranking over a higher-is-better metric: ties share a rank, the
/// next occupied rank skips past the tied block. Input order does not matter.
pub fn ranks_by_desc(entries: &[(String, i64)]) -> Vec<(String, usize)> {
    let mut sorted: Vec<(String, i64)> = entries.to_vec();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut ranked = Vec::with_capacity(sorted.len());
    let mut current_rank = 0usize;
    let mut last_value: Option<i64> = None;
    for (position, (id, value)) in sorted.into_iter().enumerate() {
        if last_value != Some(value) {
            current_rank = position + 1;
            last_value = Some(value);
        }
        ranked.push((id, current_rank));
    }
    ranked
}

/// Final ranks from elimination groups. Groups are in elimination order,
/// earliest knocked out first, with the survivor group appended last;
/// `rank = group_count - group_index`, shared by every member of a group.
pub fn ranks_from_groups(groups: &[Vec<String>]) -> Vec<(String, usize)> {
    let group_count = groups.len();
    let mut ranked = Vec::new();
    for (index, group) in groups.iter().enumerate() {
        let rank = group_count - index;
        for id in group {
            ranked.push((id.clone(), rank));
        }
    }
    ranked
}

/// Placement-bonus table keyed by (player count, rank). Ranks the table does
/// not name pay nothing.
pub fn placement_bonus(player_count: usize, rank: usize) -> i64 {
    match (player_count, rank) {
        (2, 1) => 30,
        (3, 1) => 50,
        (4, 1) => 70,
        (4, 2) => 30,
        (5, 1) => 90,
        (5, 2) => 40,
        (6, 1) => 110,
        (6, 2) => 50,
        (6, 3) => 30,
        (7, 1) => 130,
        (7, 2) => 60,
        (7, 3) => 30,
        (8, 1) => 150,
        (8, 2) => 70,
        (8, 3) => 40,
        _ => 0,
    }
}

/// Bonus per participant after applying the forfeit rules: a rank occupied by
/// more than one player pays nobody, and the worst assigned rank pays nothing
/// even when it is a sole occupant. Group-derived ranks can leave gaps, so
/// last place is the maximum rank actually assigned, not the player count.
pub fn bonus_for_ranks(ranked: &[(String, usize)]) -> Vec<(String, i64)> {
    let player_count = ranked.len();
    let last_rank = ranked.iter().map(|(_, rank)| *rank).max().unwrap_or(0);
    let mut occupancy: HashMap<usize, usize> = HashMap::new();
    for (_, rank) in ranked {
        *occupancy.entry(*rank).or_insert(0) += 1;
    }
    ranked
        .iter()
        .map(|(id, rank)| {
            let bonus = if occupancy[rank] > 1 || *rank == last_rank {
                0
            } else {
                placement_bonus(player_count, *rank)
            };
            (id.clone(), bonus)
        })
        .collect()
}

pub fn bonus_for(ranked: &[(String, usize)], connection_id: &str) -> i64 {
    bonus_for_ranks(ranked)
        .into_iter()
        .find(|(id, _)| id == connection_id)
        .map(|(_, bonus)| bonus)
        .unwrap_or(0)
}
