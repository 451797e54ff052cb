/// Track state enumeration for object tracking lifecycle.
///
/// Transitions only move forward (`New -> Tracked -> Lost -> Removed`),
/// with one exception: a `Lost` track goes back to `Tracked` when it is
/// re-activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Created from a detection, no motion estimate yet
    #[default]
    New,
    /// Actively tracked object
    Tracked,
    /// Unmatched, kept around until `max_time_lost` runs out
    Lost,
    /// Terminal, never touched again
    Removed,
}

impl TrackState {
    /// Whether the track is still eligible for association.
    pub fn is_alive(self) -> bool {
        matches!(self, TrackState::Tracked | TrackState::Lost)
    }
}
