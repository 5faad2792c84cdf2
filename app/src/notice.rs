//! Short-lived user notices (the toast).
//!
//! A [`NoticeSlot`] holds at most one notice. Showing a notice replaces the
//! previous one and, unless it is blocking, schedules its own dismissal with
//! a `Delay` effect. A dismissal only clears the notice it was scheduled for,
//! so an older timer never removes a newer notice.

use larder_core::delay;
use larder_core::effect::Effect;
use std::time::Duration;

/// Notice text for a form that failed validation.
pub const FORM_INVALID: &str = "Form invalid - Please complete all fields";

/// How a notice is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// A completed action
    Success,
    /// A failed gateway call; auto-dismissed
    Failure,
    /// Must be acknowledged; never auto-dismissed
    Blocking,
}

impl NoticeLevel {
    const fn label(self) -> &'static str {
        match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Failure => "failure",
            NoticeLevel::Blocking => "blocking",
        }
    }
}

/// One visible notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Identifies this notice for dismissal
    pub id: u64,
    /// Presentation
    pub level: NoticeLevel,
    /// Text shown to the user
    pub message: String,
}

/// Holder for the current notice of one screen or panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoticeSlot {
    current: Option<Notice>,
    next_id: u64,
}

impl NoticeSlot {
    /// The notice on display, if any
    #[must_use]
    pub const fn current(&self) -> Option<&Notice> {
        self.current.as_ref()
    }

    /// Text of the notice on display
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.current.as_ref().map(|notice| notice.message.as_str())
    }

    /// Display `message`, replacing any current notice.
    ///
    /// Returns the effect that dismisses it after `ttl`; blocking notices
    /// return `Effect::None` and stay until [`NoticeSlot::dismiss`].
    pub fn show<A, F>(&mut self, level: NoticeLevel, message: impl Into<String>, ttl: Duration, dismiss: F) -> Effect<A>
    where
        F: FnOnce(u64) -> A,
    {
        let message = message.into();
        match level {
            NoticeLevel::Success => tracing::info!(notice = %message, "Notice"),
            NoticeLevel::Failure | NoticeLevel::Blocking => tracing::warn!(notice = %message, "Notice"),
        }
        metrics::counter!("app.notices.shown", "level" => level.label()).increment(1);

        self.next_id += 1;
        let id = self.next_id;
        self.current = Some(Notice { id, level, message });

        if level == NoticeLevel::Blocking {
            Effect::None
        } else {
            delay! {
                duration: ttl,
                action: dismiss(id)
            }
        }
    }

    /// Clear the notice `id`, if it is still the one on display
    pub fn dismiss(&mut self, id: u64) {
        if self.current.as_ref().is_some_and(|notice| notice.id == id) {
            self.current = None;
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn stale_dismissal_keeps_newer_notice() {
        let mut slot = NoticeSlot::default();
        let ttl = Duration::from_millis(100);

        let _ = slot.show(NoticeLevel::Failure, "first", ttl, |id| id);
        let first = slot.current().map(|n| n.id).unwrap_or_default();
        let _ = slot.show(NoticeLevel::Success, "second", ttl, |id| id);

        slot.dismiss(first);
        assert_eq!(slot.message(), Some("second"));
    }

    #[test]
    fn blocking_notice_has_no_timer() {
        let mut slot = NoticeSlot::default();
        let effect = slot.show(NoticeLevel::Blocking, FORM_INVALID, Duration::from_secs(2), |id| id);

        assert!(effect.is_none());
        assert_eq!(slot.message(), Some(FORM_INVALID));
    }

    #[test]
    fn transient_notice_schedules_its_own_dismissal() {
        let mut slot = NoticeSlot::default();
        let effect = slot.show(NoticeLevel::Success, "saved", Duration::from_millis(1500), |id| id);

        match effect {
            Effect::Delay { duration, action } => {
                assert_eq!(duration, Duration::from_millis(1500));
                assert_eq!(Some(*action), slot.current().map(|n| n.id));
            },
            other => panic!("expected delay, got {other:?}"),
        }
    }
}
