//! Per-call session record
//!
//! One `CallSession` exists per active call. It is owned by the relay for that
//! call and mutated only by the two readers; nothing here is shared across
//! calls.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// Counters reported when the call ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    /// Caller audio chunks forwarded to the agent
    pub media_frames_forwarded: u64,
    /// Agent audio chunks forwarded to telephony
    pub agent_chunks_forwarded: u64,
    /// Marks echoed back by telephony and consumed
    pub marks_acknowledged: u64,
    /// Barge-ins that cut an agent item short
    pub barge_ins: u64,
    /// Inbound frames dropped because they could not be decoded
    pub malformed_frames: u64,
}

/// Result of cutting the in-flight agent item short
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interruption {
    pub item_id: String,
    /// How far into the item playback had got, in milliseconds
    pub audio_end_ms: u64,
    /// Marks still unacknowledged at the moment of interruption
    pub unplayed_marks: usize,
}

/// Mutable state of one bridged call
#[derive(Debug, Clone)]
pub struct CallSession {
    call_id: String,
    started_at: DateTime<Utc>,
    stream_sid: Option<String>,
    call_sid: Option<String>,
    latest_media_timestamp: u64,
    last_assistant_item: Option<String>,
    /// Media timestamp when the first chunk of `last_assistant_item` went out
    response_start_timestamp: Option<u64>,
    /// Playback length of what has been forwarded for `last_assistant_item`
    item_audio_ms: u64,
    interrupted_item: Option<String>,
    pending_marks: VecDeque<String>,
    /// Marks discarded by an interruption whose echoes have not come back yet
    stale_marks: usize,
    stats: CallStats,
}

impl CallSession {
    pub fn new(call_id: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            started_at: Utc::now(),
            stream_sid: None,
            call_sid: None,
            latest_media_timestamp: 0,
            last_assistant_item: None,
            response_start_timestamp: None,
            item_audio_ms: 0,
            interrupted_item: None,
            pending_marks: VecDeque::new(),
            stale_marks: 0,
            stats: CallStats::default(),
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Stream sid assigned by telephony; `None` until `start` arrives
    pub fn stream_sid(&self) -> Option<&str> {
        self.stream_sid.as_deref()
    }

    pub fn call_sid(&self) -> Option<&str> {
        self.call_sid.as_deref()
    }

    /// Record the telephony `start` event.
    ///
    /// Any agent item tracked before the stream started can no longer be
    /// matched against playback, so it is forgotten.
    pub fn start_stream(&mut self, stream_sid: impl Into<String>, call_sid: Option<String>) {
        self.stream_sid = Some(stream_sid.into());
        self.call_sid = call_sid;
        self.last_assistant_item = None;
        self.response_start_timestamp = None;
        self.item_audio_ms = 0;
    }

    /// Advance the playback clock. Never moves backwards.
    pub fn record_media_timestamp(&mut self, timestamp: u64) -> u64 {
        self.latest_media_timestamp = self.latest_media_timestamp.max(timestamp);
        self.latest_media_timestamp
    }

    pub fn latest_media_timestamp(&self) -> u64 {
        self.latest_media_timestamp
    }

    pub fn note_media_forwarded(&mut self) {
        self.stats.media_frames_forwarded += 1;
    }

    pub fn note_malformed_frame(&mut self) {
        self.stats.malformed_frames += 1;
    }

    pub fn last_assistant_item(&self) -> Option<&str> {
        self.last_assistant_item.as_deref()
    }

    pub fn response_start_timestamp(&self) -> Option<u64> {
        self.response_start_timestamp
    }

    /// Whether chunks of `item_id` must no longer reach the caller
    pub fn is_interrupted(&self, item_id: Option<&str>) -> bool {
        match (item_id, self.interrupted_item.as_deref()) {
            (Some(item), Some(interrupted)) => item == interrupted,
            _ => false,
        }
    }

    /// Record an agent audio chunk of `audio_ms` that was forwarded to telephony
    pub fn record_agent_chunk(&mut self, item_id: Option<&str>, audio_ms: u64) {
        if let Some(item) = item_id {
            if self.last_assistant_item.as_deref() != Some(item) {
                self.last_assistant_item = Some(item.to_string());
                self.response_start_timestamp = None;
                self.item_audio_ms = 0;
            }
        }
        if self.response_start_timestamp.is_none() {
            self.response_start_timestamp = Some(self.latest_media_timestamp);
        }
        self.item_audio_ms += audio_ms;
        self.stats.agent_chunks_forwarded += 1;
    }

    /// Queue a mark sent to telephony
    pub fn push_mark(&mut self, name: impl Into<String>) {
        self.pending_marks.push_back(name.into());
    }

    /// Consume the oldest pending mark. No-op when none are pending.
    ///
    /// Telephony echoes marks in the order they were sent, including the ones
    /// flushed by an interruption, so those echoes are swallowed first.
    pub fn acknowledge_mark(&mut self) -> Option<String> {
        if self.stale_marks > 0 {
            self.stale_marks -= 1;
            return None;
        }
        let mark = self.pending_marks.pop_front();
        if mark.is_some() {
            self.stats.marks_acknowledged += 1;
        }
        mark
    }

    pub fn pending_marks(&self) -> usize {
        self.pending_marks.len()
    }

    /// Cut the in-flight agent item short.
    ///
    /// Returns `None` if no agent item is tracked. Otherwise clears the item,
    /// the pending marks and the response clock, and remembers the item so
    /// later chunks of it are suppressed. The reported offset is the time
    /// elapsed since the item's first chunk, capped at the audio forwarded.
    pub fn interrupt(&mut self) -> Option<Interruption> {
        let item_id = self.last_assistant_item.take()?;
        let start = self
            .response_start_timestamp
            .take()
            .unwrap_or(self.latest_media_timestamp);
        let elapsed = self.latest_media_timestamp.saturating_sub(start);
        let interruption = Interruption {
            audio_end_ms: elapsed.min(std::mem::take(&mut self.item_audio_ms)),
            unplayed_marks: self.pending_marks.len(),
            item_id: item_id.clone(),
        };

        self.stale_marks += self.pending_marks.len();
        self.pending_marks.clear();
        self.interrupted_item = Some(item_id);
        self.stats.barge_ins += 1;
        Some(interruption)
    }

    pub fn stats(&self) -> CallStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = CallSession::new("call-1");
        assert_eq!(session.call_id(), "call-1");
        assert!(session.stream_sid().is_none());
        assert!(session.last_assistant_item().is_none());
        assert_eq!(session.pending_marks(), 0);
        assert_eq!(session.latest_media_timestamp(), 0);
    }

    #[test]
    fn test_media_timestamp_is_monotonic() {
        let mut session = CallSession::new("call-1");
        assert_eq!(session.record_media_timestamp(100), 100);
        assert_eq!(session.record_media_timestamp(40), 100);
        assert_eq!(session.record_media_timestamp(160), 160);
    }

    #[test]
    fn test_mark_queue_is_fifo_and_never_negative() {
        let mut session = CallSession::new("call-1");
        assert_eq!(session.acknowledge_mark(), None);
        assert_eq!(session.pending_marks(), 0);

        session.push_mark("a");
        session.push_mark("b");
        assert_eq!(session.acknowledge_mark().as_deref(), Some("a"));
        assert_eq!(session.acknowledge_mark().as_deref(), Some("b"));
        assert_eq!(session.acknowledge_mark(), None);
        assert_eq!(session.pending_marks(), 0);
        assert_eq!(session.stats().marks_acknowledged, 2);
    }

    #[test]
    fn test_agent_chunk_starts_response_clock() {
        let mut session = CallSession::new("call-1");
        session.record_media_timestamp(1000);
        session.record_agent_chunk(Some("item1"), 20);
        assert_eq!(session.last_assistant_item(), Some("item1"));
        assert_eq!(session.response_start_timestamp(), Some(1000));

        session.record_media_timestamp(1200);
        session.record_agent_chunk(Some("item1"), 20);
        assert_eq!(session.response_start_timestamp(), Some(1000));

        session.record_agent_chunk(Some("item2"), 20);
        assert_eq!(session.last_assistant_item(), Some("item2"));
        assert_eq!(session.response_start_timestamp(), Some(1200));
        assert_eq!(session.stats().agent_chunks_forwarded, 3);
    }

    #[test]
    fn test_interrupt_reports_played_offset() {
        let mut session = CallSession::new("call-1");
        session.record_media_timestamp(1000);
        session.record_agent_chunk(Some("item1"), 1000);
        session.push_mark("responsePart");
        session.push_mark("responsePart");
        session.record_media_timestamp(1480);

        let interruption = session.interrupt().unwrap();
        assert_eq!(interruption.item_id, "item1");
        assert_eq!(interruption.audio_end_ms, 480);
        assert_eq!(interruption.unplayed_marks, 2);

        assert!(session.last_assistant_item().is_none());
        assert!(session.response_start_timestamp().is_none());
        assert_eq!(session.pending_marks(), 0);
        assert!(session.is_interrupted(Some("item1")));
        assert!(!session.is_interrupted(Some("item2")));
        assert!(!session.is_interrupted(None));
    }

    #[test]
    fn test_interrupt_offset_capped_at_forwarded_audio() {
        let mut session = CallSession::new("call-1");
        session.record_media_timestamp(1000);
        session.record_agent_chunk(Some("item1"), 100);
        session.record_media_timestamp(1480);

        let interruption = session.interrupt().unwrap();
        assert_eq!(interruption.audio_end_ms, 100);
    }

    #[test]
    fn test_echoes_of_flushed_marks_are_ignored() {
        let mut session = CallSession::new("call-1");
        session.record_agent_chunk(Some("item1"), 20);
        session.push_mark("responsePart");
        session.push_mark("responsePart");
        session.interrupt().unwrap();

        session.record_agent_chunk(Some("item2"), 20);
        session.push_mark("responsePart");

        // the two flushed marks come back first
        assert_eq!(session.acknowledge_mark(), None);
        assert_eq!(session.acknowledge_mark(), None);
        assert_eq!(session.pending_marks(), 1);
        assert_eq!(session.stats().marks_acknowledged, 0);

        assert_eq!(session.acknowledge_mark().as_deref(), Some("responsePart"));
        assert_eq!(session.pending_marks(), 0);
        assert_eq!(session.stats().marks_acknowledged, 1);
        assert_eq!(session.acknowledge_mark(), None);
    }

    #[test]
    fn test_interrupt_without_item_is_noop() {
        let mut session = CallSession::new("call-1");
        session.push_mark("responsePart");
        assert!(session.interrupt().is_none());
        assert_eq!(session.pending_marks(), 1);
        assert_eq!(session.stats().barge_ins, 0);
    }

    #[test]
    fn test_start_stream_forgets_prior_item() {
        let mut session = CallSession::new("call-1");
        session.record_agent_chunk(Some("early"), 20);
        session.start_stream("SS1", Some("CA1".into()));
        assert_eq!(session.stream_sid(), Some("SS1"));
        assert_eq!(session.call_sid(), Some("CA1"));
        assert!(session.last_assistant_item().is_none());
    }
}
