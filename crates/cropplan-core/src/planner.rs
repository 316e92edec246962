//! What-if tree expansion.
//!
//! `expand` applies a chosen upgrade to a private clone of the player,
//! records the cumulative gain against the root totals, then recurses on
//! the clone's freshly recomputed candidate list. Branches are independent
//! clones; the caller's player is never touched. Depth and branching are
//! entirely caller-controlled: without a `max_children` cap every candidate
//! at every node is explored.

use serde::{Deserialize, Serialize};

use cropplan_logic::stats::{add_stat, stat_value, Stat, StatMap};

use crate::apply::apply_to_clone;
use crate::error::EngineResult;
use crate::player::Player;
use crate::upgrades::Upgrade;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandOptions {
    /// Stat dimensions to track through the tree.
    pub stats: Vec<Stat>,
    /// Levels of follow-up candidates below the root upgrade.
    pub max_depth: u8,
    /// Top-K candidates explored per node; `None` explores all of them.
    pub max_children: Option<usize>,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            stats: vec![Stat::FarmingFortune],
            max_depth: 2,
            max_children: None,
        }
    }
}

/// One node of a what-if tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeNode {
    /// The upgrade applied to reach this node.
    pub upgrade: Upgrade,
    /// Cumulative gain relative to the root player, per tracked stat.
    pub gained: StatMap,
    /// Follow-up candidates, in the ranked order they were discovered.
    pub children: Vec<UpgradeNode>,
}

/// Expand a chosen upgrade into a tree of follow-up steps and their
/// cumulative gains. The player passed in is left bit-for-bit unchanged.
pub fn expand(player: &Player, upgrade: &Upgrade, opts: &ExpandOptions) -> EngineResult<UpgradeNode> {
    log::debug!(
        "expanding '{}' to depth {} ({} stats tracked)",
        upgrade.title,
        opts.max_depth,
        opts.stats.len()
    );
    let baseline: StatMap = opts
        .stats
        .iter()
        .map(|stat| (*stat, player.total(*stat)))
        .collect();
    expand_node(player, upgrade, &baseline, opts, opts.max_depth)
}

fn expand_node(
    state: &Player,
    upgrade: &Upgrade,
    baseline: &StatMap,
    opts: &ExpandOptions,
    depth: u8,
) -> EngineResult<UpgradeNode> {
    let next = apply_to_clone(state, upgrade)?;

    let mut gained = StatMap::new();
    for stat in &opts.stats {
        add_stat(
            &mut gained,
            *stat,
            next.total(*stat) - stat_value(baseline, *stat),
        );
    }
    log::trace!("'{}' at depth {depth}: gained {gained:?}", upgrade.title);

    let children = if depth == 0 {
        Vec::new()
    } else {
        let mut candidates = next.upgrades();
        if let Some(cap) = opts.max_children {
            candidates.truncate(cap);
        }
        candidates
            .iter()
            .map(|candidate| expand_node(&next, candidate, baseline, opts, depth - 1))
            .collect::<EngineResult<_>>()?
    };

    Ok(UpgradeNode {
        upgrade: upgrade.clone(),
        gained,
        children,
    })
}
