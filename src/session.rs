//! Session recording of metric snapshots.
//!
//! The audio thread owns a [`SessionRecorder`] and pushes one [`DataPoint`]
//! per completed frame into a pre-allocated single-producer/single-consumer
//! ring. The observer side ([`SessionLogger`]) drains that ring into the log
//! under a mutex that only observer calls ever take, so the audio thread never
//! blocks or allocates for logging. Once the ring is half full the recorder
//! raises a drain request, which the host shim turns into a background task;
//! observers do not have to be polling for a session to stay complete.
//!
//! State machine: Idle -> Recording (start) -> Idle (stop). Starting again
//! while recording restarts the session.

use ringbuf::{Consumer, Producer, RingBuffer};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::config::{AnalysisConfig, TimeBase};
use crate::export::{format_table, ExportError, ExportSummary, TableSink};
use crate::meters::{MetricSnapshot, PublishedMetrics};

/// One row of the session log.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DataPoint {
    /// Seconds since the recording started.
    pub timestamp: f64,
    pub activation_score: f32,
    pub spectral_centroid: f32,
    pub spectral_harshness: f32,
    pub dynamic_variability: f32,
    pub temporal_unpredictability: f32,
    pub rms_level: f32,
}

impl DataPoint {
    pub fn from_snapshot(timestamp: f64, s: &MetricSnapshot) -> Self {
        Self {
            timestamp,
            activation_score: s.activation_score,
            spectral_centroid: s.spectral_centroid,
            spectral_harshness: s.spectral_harshness,
            dynamic_variability: s.dynamic_variability,
            temporal_unpredictability: s.temporal_unpredictability,
            rms_level: s.rms_level,
        }
    }
}

// Points carry the session they were produced for, so stragglers from a
// stopped or restarted session can be told apart when draining.
#[derive(Clone, Copy)]
struct QueuedPoint {
    session: u32,
    point: DataPoint,
}

struct SessionShared {
    recording: AtomicBool,
    session: AtomicU32,
    time_base: TimeBase,
    epoch: Instant,
    start_nanos: AtomicU64,
    start_sample: AtomicU64,
    dropped: AtomicU64,
    // Raised by the audio thread once the queue backs up, lowered by a drain.
    drain_requested: AtomicBool,
}

impl SessionShared {
    fn clock_nanos(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    fn elapsed_seconds(&self, stream_pos: u64, sample_rate: f32) -> f64 {
        match self.time_base {
            TimeBase::WallClock => {
                let start = self.start_nanos.load(Ordering::Acquire);
                self.clock_nanos().saturating_sub(start) as f64 / 1e9
            }
            TimeBase::Stream => {
                if sample_rate > 0.0 {
                    let start = self.start_sample.load(Ordering::Acquire);
                    stream_pos.saturating_sub(start) as f64 / sample_rate as f64
                } else {
                    0.0
                }
            }
        }
    }
}

/// Audio-thread half of the session log.
pub struct SessionRecorder {
    shared: Arc<SessionShared>,
    queue: Producer<QueuedPoint>,
    watermark: usize,
}

impl SessionRecorder {
    #[inline]
    pub fn is_recording(&self) -> bool {
        self.shared.recording.load(Ordering::Acquire)
    }

    /// Queue a point for the current session. No-op while idle. Never
    /// blocks; a full queue drops the point and counts it.
    pub fn record(&mut self, snapshot: &MetricSnapshot, stream_pos: u64, sample_rate: f32) {
        if !self.is_recording() {
            return;
        }
        let session = self.shared.session.load(Ordering::Acquire);
        let timestamp = self.shared.elapsed_seconds(stream_pos, sample_rate);
        let queued = QueuedPoint {
            session,
            point: DataPoint::from_snapshot(timestamp, snapshot),
        };
        if self.queue.push(queued).is_err() {
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// True once the queue reaches half its capacity, then false until an
    /// observer has drained it again. Lock-free, safe on the audio thread.
    pub fn take_drain_request(&self) -> bool {
        self.queue.len() >= self.watermark
            && !self.shared.drain_requested.swap(true, Ordering::AcqRel)
    }
}

struct LogState {
    inbox: Consumer<QueuedPoint>,
    points: Vec<DataPoint>,
    reported_dropped: u64,
    // Set while idle: anything still arriving belongs to no session.
    frozen: bool,
}

impl LogState {
    fn drain(&mut self, shared: &SessionShared) -> usize {
        let session = shared.session.load(Ordering::Acquire);
        let mut accepted = 0;
        while let Some(queued) = self.inbox.pop() {
            if !self.frozen && queued.session == session {
                self.points.push(queued.point);
                accepted += 1;
            }
        }
        // Lowered only after popping so a request raised mid-drain is not lost.
        shared.drain_requested.store(false, Ordering::Release);

        let dropped = shared.dropped.load(Ordering::Relaxed);
        if dropped > self.reported_dropped {
            log::warn!(
                "session queue full: {} data points dropped",
                dropped - self.reported_dropped
            );
            self.reported_dropped = dropped;
        }
        accepted
    }
}

/// Observer half of the session log: control, inspection and export.
pub struct SessionLogger {
    shared: Arc<SessionShared>,
    metrics: Arc<PublishedMetrics>,
    state: Mutex<LogState>,
}

impl SessionLogger {
    pub fn new(
        config: &AnalysisConfig,
        metrics: Arc<PublishedMetrics>,
    ) -> (Self, SessionRecorder) {
        let (producer, consumer) =
            RingBuffer::<QueuedPoint>::new(config.session_queue_capacity.max(1)).split();

        let shared = Arc::new(SessionShared {
            recording: AtomicBool::new(false),
            session: AtomicU32::new(0),
            time_base: config.time_base,
            epoch: Instant::now(),
            start_nanos: AtomicU64::new(0),
            start_sample: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            drain_requested: AtomicBool::new(false),
        });

        let logger = Self {
            shared: shared.clone(),
            metrics,
            state: Mutex::new(LogState {
                inbox: consumer,
                points: Vec::new(),
                reported_dropped: 0,
                frozen: true,
            }),
        };
        let watermark = (producer.capacity() / 2).max(1);
        let recorder = SessionRecorder {
            shared,
            queue: producer,
            watermark,
        };
        (logger, recorder)
    }

    fn lock_state(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clear the log and begin a new session. Restarts if already recording.
    pub fn start_recording(&self) {
        let mut state = self.lock_state();

        // Discard anything left over from an earlier session.
        state.frozen = true;
        state.drain(&self.shared);
        state.points.clear();

        self.shared
            .start_nanos
            .store(self.shared.clock_nanos(), Ordering::Release);
        self.shared
            .start_sample
            .store(self.metrics.samples_processed(), Ordering::Release);
        self.shared.dropped.store(0, Ordering::Relaxed);
        state.reported_dropped = 0;
        let session = self.shared.session.fetch_add(1, Ordering::AcqRel) + 1;

        state.frozen = false;
        self.shared.recording.store(true, Ordering::Release);
        log::info!("recording started (session {session})");
    }

    /// Stop appending. The log is kept for export. No-op while idle.
    pub fn stop_recording(&self) {
        if !self.shared.recording.swap(false, Ordering::AcqRel) {
            return;
        }
        let mut state = self.lock_state();
        state.drain(&self.shared);
        state.frozen = true;
        log::info!("recording stopped with {} data points", state.points.len());
    }

    pub fn is_recording(&self) -> bool {
        self.shared.recording.load(Ordering::Acquire)
    }

    /// Move queued points into the log, returning how many were accepted.
    pub fn drain(&self) -> usize {
        self.lock_state().drain(&self.shared)
    }

    pub fn data_point_count(&self) -> usize {
        let mut state = self.lock_state();
        state.drain(&self.shared);
        state.points.len()
    }

    /// Seconds since the current recording started, 0 while idle.
    pub fn elapsed_recording_time(&self) -> f64 {
        if !self.is_recording() {
            return 0.0;
        }
        self.shared.elapsed_seconds(
            self.metrics.samples_processed(),
            self.metrics.sample_rate(),
        )
    }

    /// Points the audio thread could not queue because the ring was full.
    pub fn dropped_points(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    pub fn points(&self) -> Vec<DataPoint> {
        let mut state = self.lock_state();
        state.drain(&self.shared);
        state.points.clone()
    }

    /// Discard the log without touching the recording state.
    pub fn clear(&self) {
        let mut state = self.lock_state();
        state.drain(&self.shared);
        state.points.clear();
    }

    /// Serialize everything recorded so far as CSV.
    pub fn export_table(&self) -> Result<String, ExportError> {
        let mut state = self.lock_state();
        state.drain(&self.shared);
        if state.points.is_empty() {
            return Err(ExportError::NoData);
        }
        Ok(format_table(&state.points))
    }

    /// Serialize and hand the table to `sink`. The log lock is released
    /// before any I/O happens.
    pub fn export_to<S: TableSink + ?Sized>(
        &self,
        sink: &mut S,
    ) -> Result<ExportSummary, ExportError> {
        let table = self.export_table()?;
        // Header row is not a data point.
        let rows = table.lines().count().saturating_sub(1);

        let dropped = self.dropped_points();
        if dropped > 0 {
            log::warn!("{dropped} data points were dropped while recording");
        }

        if let Err(e) = sink.deliver(&table) {
            log::error!("export to {} failed: {}", sink.describe(), e);
            return Err(ExportError::Write(e));
        }

        let summary = ExportSummary {
            rows,
            destination: sink.describe(),
        };
        log::info!(
            "exported {} data points to {}",
            summary.rows,
            summary.destination
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{WriterSink, CSV_HEADER};
    use std::io;

    fn stream_config(capacity: usize) -> AnalysisConfig {
        AnalysisConfig {
            time_base: TimeBase::Stream,
            session_queue_capacity: capacity,
            ..AnalysisConfig::default()
        }
    }

    fn snapshot(score: f32) -> MetricSnapshot {
        MetricSnapshot {
            activation_score: score,
            ..MetricSnapshot::default()
        }
    }

    struct BrokenSink;

    impl TableSink for BrokenSink {
        fn deliver(&mut self, _payload: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }

        fn describe(&self) -> String {
            "broken".into()
        }
    }

    #[test]
    fn test_idle_recorder_appends_nothing() {
        let metrics = Arc::new(PublishedMetrics::new());
        let (logger, mut recorder) = SessionLogger::new(&stream_config(16), metrics);
        recorder.record(&snapshot(10.0), 2048, 48000.0);
        assert_eq!(logger.data_point_count(), 0);
        assert!(!logger.is_recording());
    }

    #[test]
    fn test_start_stop_keeps_points_in_order() {
        let metrics = Arc::new(PublishedMetrics::new());
        let (logger, mut recorder) = SessionLogger::new(&stream_config(16), metrics);

        logger.start_recording();
        for i in 1..=4u64 {
            recorder.record(&snapshot(i as f32), i * 1000, 1000.0);
        }
        logger.stop_recording();

        let points = logger.points();
        assert_eq!(points.len(), 4);
        let scores: Vec<f32> = points.iter().map(|p| p.activation_score).collect();
        assert_eq!(scores, vec![1.0, 2.0, 3.0, 4.0]);
        let times: Vec<f64> = points.iter().map(|p| p.timestamp).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_stop_freezes_the_log() {
        let metrics = Arc::new(PublishedMetrics::new());
        let (logger, mut recorder) = SessionLogger::new(&stream_config(16), metrics);
        logger.start_recording();
        recorder.record(&snapshot(1.0), 10, 10.0);
        logger.stop_recording();
        recorder.record(&snapshot(2.0), 20, 10.0);
        assert_eq!(logger.data_point_count(), 1);
    }

    #[test]
    fn test_restart_clears_previous_session() {
        let metrics = Arc::new(PublishedMetrics::new());
        let (logger, mut recorder) = SessionLogger::new(&stream_config(16), metrics);
        logger.start_recording();
        recorder.record(&snapshot(1.0), 10, 10.0);
        recorder.record(&snapshot(1.0), 20, 10.0);
        // Restart without draining; stale points must not leak through.
        logger.start_recording();
        recorder.record(&snapshot(2.0), 30, 10.0);
        assert_eq!(logger.data_point_count(), 1);
        assert_eq!(logger.points()[0].activation_score, 2.0);
    }

    #[test]
    fn test_stop_while_idle_is_noop() {
        let metrics = Arc::new(PublishedMetrics::new());
        let (logger, _recorder) = SessionLogger::new(&stream_config(4), metrics);
        logger.stop_recording();
        assert!(!logger.is_recording());
        assert_eq!(logger.data_point_count(), 0);
    }

    #[test]
    fn test_empty_session_export_fails() {
        let metrics = Arc::new(PublishedMetrics::new());
        let (logger, _recorder) = SessionLogger::new(&stream_config(4), metrics);
        logger.start_recording();
        logger.stop_recording();
        assert!(matches!(logger.export_table(), Err(ExportError::NoData)));

        let mut sink = WriterSink::new(Vec::new(), "buffer");
        assert!(matches!(logger.export_to(&mut sink), Err(ExportError::NoData)));
        assert!(sink.into_inner().is_empty());
    }

    #[test]
    fn test_export_reports_sink_failure() {
        let metrics = Arc::new(PublishedMetrics::new());
        let (logger, mut recorder) = SessionLogger::new(&stream_config(4), metrics);
        logger.start_recording();
        recorder.record(&snapshot(1.0), 10, 10.0);
        assert!(matches!(
            logger.export_to(&mut BrokenSink),
            Err(ExportError::Write(_))
        ));
        // A failed export leaves the log untouched.
        assert_eq!(logger.data_point_count(), 1);
    }

    #[test]
    fn test_export_while_recording_reflects_points_so_far() {
        let metrics = Arc::new(PublishedMetrics::new());
        let (logger, mut recorder) = SessionLogger::new(&stream_config(8), metrics);
        logger.start_recording();
        recorder.record(&snapshot(1.0), 10, 10.0);
        recorder.record(&snapshot(2.0), 20, 10.0);

        let mut sink = WriterSink::new(Vec::new(), "buffer");
        let summary = logger.export_to(&mut sink).unwrap();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.destination, "buffer");

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.starts_with(CSV_HEADER));
        assert!(logger.is_recording());
    }

    #[test]
    fn test_full_queue_drops_and_counts() {
        let metrics = Arc::new(PublishedMetrics::new());
        let (logger, mut recorder) = SessionLogger::new(&stream_config(2), metrics);
        logger.start_recording();
        for i in 0..5u64 {
            recorder.record(&snapshot(1.0), i, 10.0);
        }
        assert_eq!(logger.dropped_points(), 3);
        assert_eq!(logger.data_point_count(), 2);
    }

    #[test]
    fn test_drain_request_fires_once_per_backlog() {
        let metrics = Arc::new(PublishedMetrics::new());
        let (logger, mut recorder) = SessionLogger::new(&stream_config(8), metrics);
        logger.start_recording();

        for i in 0..3u64 {
            recorder.record(&snapshot(1.0), i, 10.0);
        }
        assert!(!recorder.take_drain_request());

        recorder.record(&snapshot(1.0), 3, 10.0);
        assert!(recorder.take_drain_request());
        recorder.record(&snapshot(1.0), 4, 10.0);
        assert!(!recorder.take_drain_request());

        assert_eq!(logger.drain(), 5);
        assert!(!recorder.take_drain_request());
        for i in 5..9u64 {
            recorder.record(&snapshot(1.0), i, 10.0);
        }
        assert!(recorder.take_drain_request());
        assert_eq!(logger.data_point_count(), 9);
        assert_eq!(logger.dropped_points(), 0);
    }

    #[test]
    fn test_honoured_drain_requests_keep_every_point() {
        let metrics = Arc::new(PublishedMetrics::new());
        let (logger, mut recorder) = SessionLogger::new(&stream_config(16), metrics);
        logger.start_recording();
        for i in 0..100u64 {
            recorder.record(&snapshot(1.0), i, 10.0);
            if recorder.take_drain_request() {
                logger.drain();
            }
        }
        logger.stop_recording();
        assert_eq!(logger.data_point_count(), 100);
        assert_eq!(logger.dropped_points(), 0);
    }

    #[test]
    fn test_elapsed_time_follows_stream() {
        let metrics = Arc::new(PublishedMetrics::new());
        metrics.set_sample_rate(1000.0);
        metrics.set_samples_processed(5000);
        let (logger, _recorder) = SessionLogger::new(&stream_config(4), metrics.clone());

        assert_eq!(logger.elapsed_recording_time(), 0.0);
        logger.start_recording();
        metrics.set_samples_processed(7500);
        assert!((logger.elapsed_recording_time() - 2.5).abs() < 1e-9);
        logger.stop_recording();
        assert_eq!(logger.elapsed_recording_time(), 0.0);
    }

    #[test]
    fn test_wall_clock_timestamps_are_non_decreasing() {
        let metrics = Arc::new(PublishedMetrics::new());
        let (logger, mut recorder) =
            SessionLogger::new(&AnalysisConfig::default(), metrics);
        logger.start_recording();
        for _ in 0..16 {
            recorder.record(&snapshot(1.0), 0, 0.0);
        }
        logger.stop_recording();
        let points = logger.points();
        assert_eq!(points.len(), 16);
        assert!(points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(points[0].timestamp >= 0.0);
    }
}
