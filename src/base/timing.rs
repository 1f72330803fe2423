//! Lifecycle timings for a single transaction.
//!
//! The socket layer and the transaction state machine share one [`Trace`]
//! and stamp events into it as they happen. The projector later renders the
//! collected [`Timings`] as a JSON object.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use time::OffsetDateTime;

/// A point in the life of an HTTP exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimingEvent {
    Start,
    DnsStart,
    DnsEnd,
    ConnectStart,
    ConnectEnd,
    TlsHandshakeStart,
    TlsHandshakeEnd,
    Connection,
    WroteHeaders,
    FirstByte,
    BodyStart,
    BodyEnd,
}

impl TimingEvent {
    /// All events in lifecycle order.
    pub const ALL: [TimingEvent; 12] = [
        TimingEvent::Start,
        TimingEvent::DnsStart,
        TimingEvent::DnsEnd,
        TimingEvent::ConnectStart,
        TimingEvent::ConnectEnd,
        TimingEvent::TlsHandshakeStart,
        TimingEvent::TlsHandshakeEnd,
        TimingEvent::Connection,
        TimingEvent::WroteHeaders,
        TimingEvent::FirstByte,
        TimingEvent::BodyStart,
        TimingEvent::BodyEnd,
    ];

    /// Key used in the timings JSON object.
    pub fn key(&self) -> &'static str {
        match self {
            TimingEvent::Start => "start",
            TimingEvent::DnsStart => "dns_start",
            TimingEvent::DnsEnd => "dns_end",
            TimingEvent::ConnectStart => "connect_start",
            TimingEvent::ConnectEnd => "connect_end",
            TimingEvent::TlsHandshakeStart => "tls_handshake_start",
            TimingEvent::TlsHandshakeEnd => "tls_handshake_end",
            TimingEvent::Connection => "connection",
            TimingEvent::WroteHeaders => "wrote_headers",
            TimingEvent::FirstByte => "first_byte",
            TimingEvent::BodyStart => "body_start",
            TimingEvent::BodyEnd => "body_end",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }

    /// Events that describe one connection attempt, cleared between
    /// redirect hops.
    fn is_per_hop(&self) -> bool {
        !matches!(
            self,
            TimingEvent::Start | TimingEvent::BodyStart | TimingEvent::BodyEnd
        )
    }
}

/// Formats a timestamp as `YYYY-MM-DD HH:MM:SS.sss` in UTC.
pub fn format_timestamp(at: OffsetDateTime) -> String {
    let at = at.to_offset(time::UtcOffset::UTC);
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:03}",
        at.year(),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute(),
        at.second(),
        at.millisecond()
    )
}

/// Fixed set of optional timestamps, one slot per [`TimingEvent`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timings {
    slots: [Option<OffsetDateTime>; 12],
}

impl Timings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, event: TimingEvent) -> Option<OffsetDateTime> {
        self.slots[event.index()]
    }

    /// Records `at` for `event`, replacing any earlier stamp.
    pub fn record(&mut self, event: TimingEvent, at: OffsetDateTime) {
        self.slots[event.index()] = Some(at);
    }

    /// Records `at` only if `event` has not been stamped yet.
    pub fn record_once(&mut self, event: TimingEvent, at: OffsetDateTime) {
        let slot = &mut self.slots[event.index()];
        if slot.is_none() {
            *slot = Some(at);
        }
    }

    /// Forgets the connection-level events of a previous hop.
    pub fn clear_hop(&mut self) {
        for event in TimingEvent::ALL.iter().filter(|e| e.is_per_hop()) {
            self.slots[event.index()] = None;
        }
    }

    /// Present events in lifecycle order.
    pub fn iter(&self) -> impl Iterator<Item = (TimingEvent, OffsetDateTime)> + '_ {
        TimingEvent::ALL
            .iter()
            .filter_map(move |e| self.get(*e).map(|at| (*e, at)))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Renders the JSON object used by the `timings` column.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Serialize for Timings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (event, at) in self.iter() {
            map.serialize_entry(event.key(), &format_timestamp(at))?;
        }
        map.end()
    }
}

#[derive(Debug, Default)]
struct TraceState {
    timings: Timings,
    remote: Option<SocketAddr>,
}

/// Shared handle the transport hooks stamp into.
///
/// Cloning is cheap; all clones observe the same record.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    inner: Arc<Mutex<TraceState>>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut TraceState) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn stamp(&self, event: TimingEvent) {
        let now = OffsetDateTime::now_utc();
        self.with(|s| s.timings.record(event, now));
    }

    pub fn stamp_once(&self, event: TimingEvent) {
        let now = OffsetDateTime::now_utc();
        self.with(|s| s.timings.record_once(event, now));
    }

    /// Resets per-hop timings and the peer address before a redirect.
    pub fn begin_hop(&self) {
        self.with(|s| {
            s.timings.clear_hop();
            s.remote = None;
        });
    }

    pub fn set_remote(&self, addr: SocketAddr) {
        self.with(|s| s.remote = Some(addr));
    }

    pub fn remote(&self) -> Option<SocketAddr> {
        self.with(|s| s.remote)
    }

    pub fn timings(&self) -> Timings {
        self.with(|s| s.timings)
    }
}
