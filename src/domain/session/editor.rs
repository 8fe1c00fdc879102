//! Transcript edit-field model

use super::segment::SegmentId;

/// Model of the transcript edit field.
///
/// Tracks which segment the field is bound to, its current text, and the
/// last edit flushed to the server. `dirty()` drives the save control and
/// the flush-before-restart rule: a dirty editor is saved for the bound
/// segment's id before a new segment may be allocated.
#[derive(Debug, Default)]
pub struct TranscriptEditor {
    segment: Option<SegmentId>,
    text: String,
    last_saved: Option<String>,
    touched: bool,
}

impl TranscriptEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the field to a segment and fill it with recognizer output
    pub fn bind(&mut self, segment: SegmentId, text: String) {
        self.segment = Some(segment);
        self.text = text;
        self.last_saved = None;
        self.touched = false;
    }

    /// Replace the text in place with recognizer output (late final result)
    pub fn fill(&mut self, text: String) {
        self.text = text;
        self.touched = false;
    }

    /// The user edited the field
    pub fn edit(&mut self, text: String) {
        self.text = text;
        self.touched = true;
    }

    /// An edit-save for the bound segment was issued
    pub fn mark_saved(&mut self) {
        self.last_saved = Some(self.text.clone());
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn segment(&self) -> Option<&SegmentId> {
        self.segment.as_ref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// True when the field holds a user edit that has not been flushed.
    /// Recognizer fills never count; saving the same text twice never does.
    pub fn dirty(&self) -> bool {
        self.segment.is_some()
            && self.touched
            && !self.text.trim().is_empty()
            && self.last_saved.as_deref() != Some(self.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_editor_is_clean() {
        let editor = TranscriptEditor::new();
        assert!(!editor.dirty());
        assert!(editor.segment().is_none());
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn recognizer_fill_is_not_dirty() {
        let mut editor = TranscriptEditor::new();
        editor.bind(SegmentId::generate(), "recognized text".to_string());
        assert!(!editor.dirty());
    }

    #[test]
    fn user_edit_is_dirty() {
        let mut editor = TranscriptEditor::new();
        editor.bind(SegmentId::generate(), "recognized text".to_string());
        editor.edit("corrected text".to_string());
        assert!(editor.dirty());
    }

    #[test]
    fn save_clears_dirty() {
        let mut editor = TranscriptEditor::new();
        editor.bind(SegmentId::generate(), "a".to_string());
        editor.edit("b".to_string());
        editor.mark_saved();
        assert!(!editor.dirty());
    }

    #[test]
    fn dirty_again_only_when_text_differs_from_last_save() {
        let mut editor = TranscriptEditor::new();
        editor.bind(SegmentId::generate(), "a".to_string());
        editor.edit("b".to_string());
        editor.mark_saved();

        // Editing back to the saved text is not a pending change
        editor.edit("b".to_string());
        assert!(!editor.dirty());

        editor.edit("c".to_string());
        assert!(editor.dirty());
    }

    #[test]
    fn empty_text_is_never_dirty() {
        let mut editor = TranscriptEditor::new();
        editor.bind(SegmentId::generate(), "a".to_string());
        editor.edit("   ".to_string());
        assert!(!editor.dirty());
    }

    #[test]
    fn unbound_editor_is_never_dirty() {
        let mut editor = TranscriptEditor::new();
        editor.edit("text typed before any segment".to_string());
        assert!(!editor.dirty());
    }

    #[test]
    fn late_fill_resets_touch() {
        let mut editor = TranscriptEditor::new();
        editor.bind(SegmentId::generate(), String::new());
        editor.edit("typo".to_string());
        editor.fill("final transcript".to_string());
        assert!(!editor.dirty());
        assert_eq!(editor.text(), "final transcript");
    }
}
