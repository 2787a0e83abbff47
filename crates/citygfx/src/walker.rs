use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, TilePos};
use crate::gfx::Picture;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WalkerId(pub u64);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WalkerKind {
    Citizen,
    Worker,
    Immigrant,
    Soldier,
    Animal,
    Charioteer,
}

impl WalkerKind {
    pub const fn name(self) -> &'static str {
        match self {
            WalkerKind::Citizen => "citizen",
            WalkerKind::Worker => "worker",
            WalkerKind::Immigrant => "immigrant",
            WalkerKind::Soldier => "soldier",
            WalkerKind::Animal => "animal",
            WalkerKind::Charioteer => "charioteer",
        }
    }

    pub fn picture(self) -> Picture {
        Picture::new(self.name(), 1).with_offset(Point::new(24, -20))
    }
}

/// Walker categories a layer chooses to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkerFilter {
    All,
    Only(BTreeSet<WalkerKind>),
}

impl WalkerFilter {
    pub fn only(kinds: impl IntoIterator<Item = WalkerKind>) -> Self {
        WalkerFilter::Only(kinds.into_iter().collect())
    }

    pub fn allows(&self, kind: WalkerKind) -> bool {
        match self {
            WalkerFilter::All => true,
            WalkerFilter::Only(kinds) => kinds.contains(&kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Walker {
    id: WalkerId,
    kind: WalkerKind,
    pos: TilePos,
    picture: Picture,
}

impl Walker {
    pub fn id(&self) -> WalkerId {
        self.id
    }

    pub fn kind(&self) -> WalkerKind {
        self.kind
    }

    pub fn pos(&self) -> TilePos {
        self.pos
    }

    pub fn picture(&self) -> &Picture {
        &self.picture
    }
}

#[derive(Debug, Default)]
pub struct WalkerRegistry {
    walkers: Vec<Walker>,
    next_id: u64,
}

impl WalkerRegistry {
    pub(crate) fn spawn(&mut self, kind: WalkerKind, pos: TilePos, picture: Picture) -> WalkerId {
        let id = WalkerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.walkers.push(Walker {
            id,
            kind,
            pos,
            picture,
        });
        id
    }

    pub(crate) fn set_pos(&mut self, id: WalkerId, pos: TilePos) -> bool {
        match self.walkers.iter_mut().find(|walker| walker.id == id) {
            Some(walker) => {
                walker.pos = pos;
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, id: WalkerId) -> bool {
        let before = self.walkers.len();
        self.walkers.retain(|walker| walker.id != id);
        self.walkers.len() != before
    }

    pub fn get(&self, id: WalkerId) -> Option<&Walker> {
        self.walkers.iter().find(|walker| walker.id == id)
    }

    /// Walkers standing on `pos`, in spawn order.
    pub fn on_tile(&self, pos: TilePos) -> impl Iterator<Item = &Walker> {
        self.walkers.iter().filter(move |walker| walker.pos == pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Walker> {
        self.walkers.iter()
    }

    pub fn len(&self) -> usize {
        self.walkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walkers.is_empty()
    }
}
