//! Core types: events, time, status reconciliation, display formatting

pub mod event;
pub mod format;
pub mod reconcile;
pub mod status;
pub mod time;
pub mod tracing;

pub use event::{DEFAULT_SUMMARY, Event};
pub use format::{
    AssetSet, DisplayFormatter, DisplayMode, DisplayPayload, Rgb, TextStyle, day_listing,
    event_label, item_label, truncate,
};
pub use reconcile::{Reconciler, reconcile};
pub use status::{AggregateStatus, MeetingType, SourceResult, SourceStatus, StatusKind};
pub use time::{DisplayZone, EventTime, TimeWindow, UnknownZone};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
