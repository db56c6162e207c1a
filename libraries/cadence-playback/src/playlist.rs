//! Playlist model
//!
//! Ordered tracks, the caller's playlist identifier, and the current index.
//! The playlist is replaced wholesale; it is never edited track by track.

use crate::error::{PlaybackError, Result};
use crate::types::{TrackDescriptor, NONE};

/// Playlist owned by the coordinator
///
/// Invariant: `current` is `None` or a valid position in `tracks`.
#[derive(Debug, Clone)]
pub struct Playlist {
    tracks: Vec<TrackDescriptor>,
    id: i64,
    current: Option<usize>,
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new()
    }
}

impl Playlist {
    /// Create an empty playlist with no identifier
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            id: NONE,
            current: None,
        }
    }

    /// Swap content, identifier and index in one step
    ///
    /// Leaves the playlist untouched if `start_index` is out of range.
    pub fn replace(
        &mut self,
        tracks: Vec<TrackDescriptor>,
        id: i64,
        start_index: Option<usize>,
    ) -> Result<()> {
        check_bounds(start_index, tracks.len())?;
        self.tracks = tracks;
        self.id = id;
        self.current = start_index;
        Ok(())
    }

    /// Empty the playlist and reset identifier and index to -1
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.id = NONE;
        self.current = None;
    }

    /// Track at `index`
    pub fn track_at(&self, index: usize) -> Result<&TrackDescriptor> {
        self.tracks.get(index).ok_or(PlaybackError::OutOfRange {
            index,
            len: self.tracks.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Move the current index; `None` clears it
    pub fn set_current(&mut self, index: Option<usize>) -> Result<()> {
        check_bounds(index, self.tracks.len())?;
        self.current = index;
        Ok(())
    }

    /// Current index in wire form (-1 when unset)
    pub fn index_value(&self) -> i64 {
        self.current.map_or(NONE, |index| index as i64)
    }
}

fn check_bounds(index: Option<usize>, len: usize) -> Result<()> {
    match index {
        Some(index) if index >= len => Err(PlaybackError::OutOfRange { index, len }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracks(n: usize) -> Vec<TrackDescriptor> {
        (0..n)
            .map(|i| TrackDescriptor::new(format!("Track {}", i), format!("/music/{}.mp3", i)))
            .collect()
    }

    #[test]
    fn new_playlist_is_empty() {
        let playlist = Playlist::new();
        assert!(playlist.is_empty());
        assert_eq!(playlist.id(), NONE);
        assert_eq!(playlist.index_value(), NONE);
        assert_eq!(playlist.current_index(), None);
    }

    #[test]
    fn replace_swaps_everything() {
        let mut playlist = Playlist::new();
        playlist.replace(tracks(3), 7, Some(1)).unwrap();

        assert_eq!(playlist.len(), 3);
        assert_eq!(playlist.id(), 7);
        assert_eq!(playlist.current_index(), Some(1));
        assert_eq!(playlist.track_at(1).unwrap().title, "Track 1");
    }

    #[test]
    fn replace_out_of_range_leaves_playlist_untouched() {
        let mut playlist = Playlist::new();
        playlist.replace(tracks(2), 1, Some(0)).unwrap();

        let result = playlist.replace(tracks(3), 9, Some(3));
        assert!(matches!(
            result,
            Err(PlaybackError::OutOfRange { index: 3, len: 3 })
        ));
        assert_eq!(playlist.len(), 2);
        assert_eq!(playlist.id(), 1);
    }

    #[test]
    fn track_at_bounds() {
        let mut playlist = Playlist::new();
        playlist.replace(tracks(2), 1, None).unwrap();

        assert!(playlist.track_at(1).is_ok());
        assert!(matches!(
            playlist.track_at(2),
            Err(PlaybackError::OutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn set_current_rejects_index_past_end() {
        let mut playlist = Playlist::new();
        playlist.replace(tracks(3), 1, Some(0)).unwrap();

        assert!(playlist.set_current(Some(3)).is_err());
        assert_eq!(playlist.current_index(), Some(0));

        playlist.set_current(None).unwrap();
        assert_eq!(playlist.index_value(), NONE);
    }

    #[test]
    fn clear_resets_identifier_and_index() {
        let mut playlist = Playlist::new();
        playlist.replace(tracks(3), 7, Some(2)).unwrap();
        playlist.clear();

        assert!(playlist.is_empty());
        assert_eq!(playlist.id(), NONE);
        assert_eq!(playlist.current_index(), None);
    }
}
