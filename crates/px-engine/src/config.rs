//! Player construction options.

/// Where the player announces the pixel it is currently sounding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointPublishing {
    None,
    /// Every point, in order, through a bounded channel.
    Channel,
    /// Only the freshest point, through a priority-locked cell.
    #[default]
    Latest,
    Both,
}

impl PointPublishing {
    pub fn channel(self) -> bool {
        matches!(self, Self::Channel | Self::Both)
    }

    pub fn latest(self) -> bool {
        matches!(self, Self::Latest | Self::Both)
    }
}

/// Who runs traversal continuations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Drive {
    /// A dedicated worker thread owned by the player.
    #[default]
    Threaded,
    /// The caller, through [`Player::pump`](crate::Player::pump).
    Manual,
}

#[derive(Clone, Debug)]
pub struct PlayerConfig {
    pub sample_rate: u32,
    pub publishing: PointPublishing,
    /// Backlog of the ordered point channel. Events past it are dropped.
    pub channel_capacity: usize,
    /// Fragments kept queued ahead of the one playing during autoplay.
    pub lookahead: usize,
    pub drive: Drive,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            publishing: PointPublishing::default(),
            channel_capacity: 60,
            lookahead: 2,
            drive: Drive::default(),
        }
    }
}
