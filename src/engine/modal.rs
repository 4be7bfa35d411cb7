use std::collections::VecDeque;
use std::path::Path;

use crate::world::Event;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "m4v", "ogv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Sniffs the kind from the reference's file extension.
    pub fn of(reference: &str) -> Self {
        let is_video = Path::new(reference)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(ext)));
        if is_video {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaRef<'a> {
    pub reference: &'a str,
    pub kind: MediaKind,
    pub index: usize,
    pub count: usize,
}

/// Narrative popup state. Events that arrive while one is showing wait in
/// a queue and appear, in arrival order, as each one is closed.
#[derive(Debug, Default)]
pub struct EventModal {
    current: Option<Event>,
    media_index: usize,
    pending: VecDeque<Event>,
}

impl EventModal {
    pub fn visible(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&Event> {
        self.current.as_ref()
    }

    #[cfg(test)]
    pub fn media_index(&self) -> usize {
        self.media_index
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn open(&mut self, event: Event) {
        if self.current.is_some() {
            self.pending.push_back(event);
        } else {
            self.show(event);
        }
    }

    pub fn close(&mut self) {
        self.current = None;
        self.media_index = 0;
        if let Some(next) = self.pending.pop_front() {
            self.show(next);
        }
    }

    /// Cycles to the next media item; wraps after the last one.
    pub fn advance_media(&mut self) {
        let count = self.current.as_ref().map_or(0, |e| e.media().len());
        if count > 1 {
            self.media_index = (self.media_index + 1) % count;
        }
    }

    pub fn current_media(&self) -> Option<MediaRef<'_>> {
        let event = self.current.as_ref()?;
        let media = event.media();
        let reference = *media.get(self.media_index)?;
        Some(MediaRef {
            reference,
            kind: MediaKind::of(reference),
            index: self.media_index,
            count: media.len(),
        })
    }

    /// Drops everything, shown and queued.
    pub fn reset(&mut self) {
        self.current = None;
        self.media_index = 0;
        self.pending.clear();
    }

    fn show(&mut self, event: Event) {
        self.current = Some(event);
        self.media_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::EventKind;

    fn gallery(images: &[&str]) -> Event {
        Event {
            kind: EventKind::Image,
            content: None,
            images: images.iter().map(|s| s.to_string()).collect(),
            video: None,
        }
    }

    #[test]
    fn media_cycles_and_wraps() {
        let mut modal = EventModal::default();
        modal.open(gallery(&["a.jpg", "b.jpg", "c.jpg"]));
        assert_eq!(modal.media_index(), 0);

        let mut seen = Vec::new();
        for _ in 0..3 {
            modal.advance_media();
            seen.push(modal.media_index());
        }
        assert_eq!(seen, vec![1, 2, 0]);
    }

    #[test]
    fn single_media_does_not_advance() {
        let mut modal = EventModal::default();
        modal.open(gallery(&["only.png"]));
        modal.advance_media();
        assert_eq!(modal.media_index(), 0);

        modal.close();
        modal.advance_media();
        assert_eq!(modal.media_index(), 0);
    }

    #[test]
    fn close_resets_cursor() {
        let mut modal = EventModal::default();
        modal.open(gallery(&["a.jpg", "b.jpg"]));
        modal.advance_media();
        modal.close();
        assert!(!modal.visible());
        assert_eq!(modal.media_index(), 0);

        modal.open(gallery(&["c.jpg", "d.jpg"]));
        assert_eq!(modal.current_media().unwrap().reference, "c.jpg");
    }

    #[test]
    fn queued_events_show_in_order() {
        let mut modal = EventModal::default();
        modal.open(Event::text("first"));
        modal.open(Event::text("second"));
        assert_eq!(modal.pending(), 1);
        assert_eq!(modal.current().unwrap().content.as_deref(), Some("first"));

        modal.close();
        assert_eq!(modal.current().unwrap().content.as_deref(), Some("second"));
        modal.close();
        assert!(!modal.visible());
    }

    #[test]
    fn video_detected_by_extension() {
        assert_eq!(MediaKind::of("clips/demo.mp4"), MediaKind::Video);
        assert_eq!(MediaKind::of("clips/walk.WEBM"), MediaKind::Video);
        assert_eq!(MediaKind::of("pic/kid.jpg"), MediaKind::Image);
        assert_eq!(MediaKind::of("noext"), MediaKind::Image);

        let mut modal = EventModal::default();
        modal.open(gallery(&["a.jpg", "b.mov"]));
        modal.advance_media();
        let media = modal.current_media().unwrap();
        assert_eq!(media.kind, MediaKind::Video);
        assert_eq!((media.index, media.count), (1, 2));
    }
}
