//! Current slide state as reported to clients.

use crate::error::Result;
use crate::store::SlideStore;
use serde::{Deserialize, Serialize};

/// Snapshot of the slide store.
///
/// `current_slide` is the lexically first slide. The server keeps no
/// presentation cursor, so `slide_index` is always 0 and clients track
/// their own position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideState {
    pub slide_index: usize,
    pub total_slides: usize,
    pub slides: Vec<String>,
    pub current_slide: Option<String>,
}

impl SlideState {
    /// Build a state from slide names, sorting them lexically.
    pub fn from_slides(mut slides: Vec<String>) -> Self {
        slides.sort();
        Self {
            slide_index: 0,
            total_slides: slides.len(),
            current_slide: slides.first().cloned(),
            slides,
        }
    }
}

/// Read the current state of `store`.
pub fn current_state(store: &SlideStore) -> Result<SlideState> {
    Ok(SlideState::from_slides(store.list_slides()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_state() {
        let state = SlideState::from_slides(Vec::new());
        assert_eq!(state.total_slides, 0);
        assert!(state.slides.is_empty());
        assert_eq!(state.current_slide, None);

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "slide_index": 0,
                "total_slides": 0,
                "slides": [],
                "current_slide": null
            })
        );
    }

    #[test]
    fn test_current_is_lexical_first() {
        let state = SlideState::from_slides(vec![
            "slide_001.png".to_string(),
            "a.jpg".to_string(),
            "slide_000.png".to_string(),
        ]);
        assert_eq!(state.slide_index, 0);
        assert_eq!(state.total_slides, 3);
        assert_eq!(state.slides, vec!["a.jpg", "slide_000.png", "slide_001.png"]);
        assert_eq!(state.current_slide.as_deref(), Some("a.jpg"));
    }

    #[test]
    fn test_current_state_reads_store() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SlideStore::open(tmp.path().join("slides")).unwrap();
        std::fs::write(store.root().join("slide_001.png"), b"x").unwrap();
        std::fs::write(store.root().join("slide_000.png"), b"x").unwrap();

        let state = current_state(&store).unwrap();
        assert_eq!(state.current_slide.as_deref(), Some("slide_000.png"));
        assert_eq!(state.total_slides, 2);
    }
}
