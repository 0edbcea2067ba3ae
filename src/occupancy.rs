use crate::grid::Cell;
use crate::snake::SnakeAgent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Color category that must match between an agent and a hole for the hole
/// to be passable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorTag {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl ColorTag {
    pub const ALL: [ColorTag; 6] = [
        ColorTag::Red,
        ColorTag::Orange,
        ColorTag::Yellow,
        ColorTag::Green,
        ColorTag::Blue,
        ColorTag::Purple,
    ];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|c| c == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockerKind {
    Wall,
    Hole,
    Item,
}

/// Static level element occupying one cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BlockingEntity {
    pub cell: Cell,
    pub kind: BlockerKind,
    /// Holes carry a color; walls and items do not.
    #[serde(default)]
    pub color: Option<ColorTag>,
}

impl BlockingEntity {
    pub fn wall(cell: Cell) -> Self {
        BlockingEntity { cell, kind: BlockerKind::Wall, color: None }
    }

    pub fn hole(cell: Cell, color: ColorTag) -> Self {
        BlockingEntity { cell, kind: BlockerKind::Hole, color: Some(color) }
    }

    pub fn item(cell: Cell) -> Self {
        BlockingEntity { cell, kind: BlockerKind::Item, color: None }
    }
}

struct Snapshot {
    statics: HashMap<Cell, (BlockerKind, Option<ColorTag>)>,
    /// Cell -> ids of live agents with a body segment there.
    agents: HashMap<Cell, Vec<usize>>,
}

/// Lazily rebuilt view of which cells are currently blocked.
///
/// The snapshot is torn down by `invalidate()` and rebuilt from the static
/// blocker records plus every live agent's committed body cells the next
/// time a consumer needs it.
pub struct OccupancyIndex {
    blockers: Vec<BlockingEntity>,
    snapshot: Option<Snapshot>,
}

impl OccupancyIndex {
    pub fn new(blockers: Vec<BlockingEntity>) -> Self {
        OccupancyIndex { blockers, snapshot: None }
    }

    pub fn blockers(&self) -> &[BlockingEntity] {
        &self.blockers
    }

    /// Mark the snapshot stale after any agent mutates its body.
    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }

    pub fn is_fresh(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Rebuild the snapshot by scanning the static records and every live
    /// agent's current body cells.
    pub fn rebuild(&mut self, agents: &[SnakeAgent]) {
        let mut statics = HashMap::new();
        for blocker in &self.blockers {
            statics.insert(blocker.cell, (blocker.kind, blocker.color));
        }

        let mut occupied: HashMap<Cell, Vec<usize>> = HashMap::new();
        for agent in agents {
            if !agent.is_alive() {
                continue;
            }
            for cell in agent.body() {
                occupied.entry(*cell).or_default().push(agent.id());
            }
        }

        self.snapshot = Some(Snapshot { statics, agents: occupied });
    }

    /// Blocking test for one probing agent: a wall, a hole of a different
    /// color, or a body cell of any *other* agent blocks. The probing
    /// agent's own cells never block its search.
    pub fn is_blocked(&self, cell: Cell, probing_id: usize, probing_color: ColorTag) -> bool {
        match &self.snapshot {
            Some(snapshot) => {
                if let Some((kind, color)) = snapshot.statics.get(&cell) {
                    match kind {
                        BlockerKind::Wall => return true,
                        BlockerKind::Hole => {
                            if *color != Some(probing_color) {
                                return true;
                            }
                        }
                        BlockerKind::Item => {}
                    }
                }
                match snapshot.agents.get(&cell) {
                    Some(ids) => ids.iter().any(|id| *id != probing_id),
                    None => false,
                }
            }
            // Stale snapshot: the static records still answer for walls and
            // holes; agent occupancy is unknown until the next rebuild.
            None => self.static_blocks(cell, probing_color),
        }
    }

    fn static_blocks(&self, cell: Cell, probing_color: ColorTag) -> bool {
        self.blockers.iter().any(|b| {
            b.cell == cell
                && match b.kind {
                    BlockerKind::Wall => true,
                    BlockerKind::Hole => b.color != Some(probing_color),
                    BlockerKind::Item => false,
                }
        })
    }

    /// Static blocker at a cell, if any.
    pub fn static_at(&self, cell: Cell) -> Option<&BlockingEntity> {
        self.blockers.iter().find(|b| b.cell == cell)
    }

    /// A hole matching the given color at the cell itself or one of its
    /// four neighbors. This is the consumption trigger query.
    pub fn matching_hole_near(&self, cell: Cell, color: ColorTag) -> Option<Cell> {
        let probes = [
            cell,
            cell.offset(0, -1),
            cell.offset(1, 0),
            cell.offset(0, 1),
            cell.offset(-1, 0),
        ];
        for probe in probes {
            let hit = self.blockers.iter().any(|b| {
                b.cell == probe && b.kind == BlockerKind::Hole && b.color == Some(color)
            });
            if hit {
                return Some(probe);
            }
        }
        None
    }
}
