use std::sync::Mutex;

use crate::{
    bands::BandPartitioner,
    displace::{FieldParams, FieldSynth},
    error::{GlitchError, GlitchResult},
    frame::Frame,
    regions::{RegionCompositor, RegionCounts},
    segment::{SegmentEngine, SegmentParams},
};

/// Active transform selection. Modes are mutually exclusive per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Displace,
    RowSegment,
    VerticalBands,
    Regions,
}

/// One transform stage: one frame in, one same-sized frame out.
///
/// All stages are safe to call from the capture callback thread; any state
/// they share with the tick/control domain is read as an immutable snapshot.
pub trait TransformStage: Send + Sync {
    fn process(&self, frame: &Frame, elapsed_secs: f64) -> GlitchResult<Frame>;
}

impl TransformStage for FieldSynth {
    fn process(&self, frame: &Frame, elapsed_secs: f64) -> GlitchResult<Frame> {
        FieldSynth::process(self, frame, elapsed_secs)
    }
}

impl TransformStage for SegmentEngine {
    fn process(&self, frame: &Frame, _elapsed_secs: f64) -> GlitchResult<Frame> {
        SegmentEngine::process(self, frame)
    }
}

impl TransformStage for BandPartitioner {
    fn process(&self, frame: &Frame, _elapsed_secs: f64) -> GlitchResult<Frame> {
        BandPartitioner::process(self, frame)
    }
}

impl TransformStage for RegionCompositor {
    fn process(&self, frame: &Frame, _elapsed_secs: f64) -> GlitchResult<Frame> {
        RegionCompositor::process(self, frame)
    }
}

/// Delivers raw raster frames at the capture device's native rate.
pub trait FrameSource {
    fn next_frame(&mut self) -> GlitchResult<Frame>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Persistence was refused (permission gate). Not an error for the core.
    Denied,
}

/// Receives displayable frames; optionally persists stills.
pub trait FrameSink {
    fn present(&mut self, frame: &Frame) -> GlitchResult<()>;
    fn save_still(&mut self, frame: &Frame) -> GlitchResult<SaveOutcome>;
}

/// Everything the pipeline needs to come up, loadable from JSON.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub mode: Mode,
    pub seed: u64,
    pub field: FieldParams,
    pub segment: SegmentParams,
    /// Band counts the cycle tick walks through, wrapping.
    pub band_counts: Vec<u32>,
    pub border_opacity: f32,
    pub region_counts: RegionCounts,
    /// How far regions may be placed beyond the frame bounds.
    pub overscan_px: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Displace,
            seed: 0xCA11_BACC,
            field: FieldParams::default(),
            segment: SegmentParams::default(),
            band_counts: vec![3, 5, 8, 12],
            border_opacity: 0.0,
            region_counts: RegionCounts::default(),
            overscan_px: 200.0,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> GlitchResult<()> {
        if self.band_counts.is_empty() {
            return Err(GlitchError::validation(
                "band_counts must name at least one count",
            ));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct BandCycle {
    counts: Vec<u32>,
    idx: usize,
}

/// Owns the four transform stages, routes each incoming frame through the
/// active one, and exposes the frame-rate-independent tick entry points the
/// embedding schedules on its own timers.
pub struct Coordinator {
    mode: Mutex<Mode>,
    displace: FieldSynth,
    segment: SegmentEngine,
    bands: BandPartitioner,
    regions: RegionCompositor,
    cycle: Mutex<BandCycle>,
    last_output: Mutex<Option<Frame>>,
}

impl Coordinator {
    pub fn new(config: PipelineConfig) -> GlitchResult<Self> {
        config.validate()?;
        let bands = BandPartitioner::new(
            config.seed ^ 0xBA2D,
            config.band_counts[0],
            config.border_opacity,
        );
        Ok(Self {
            mode: Mutex::new(config.mode),
            displace: FieldSynth::new(config.field),
            segment: SegmentEngine::new(config.segment),
            bands,
            regions: RegionCompositor::new(
                config.seed ^ 0x2E61,
                config.region_counts,
                config.overscan_px,
            ),
            cycle: Mutex::new(BandCycle {
                counts: config.band_counts,
                idx: 0,
            }),
            last_output: Mutex::new(None),
        })
    }

    pub fn mode(&self) -> Mode {
        *self.lock(&self.mode)
    }

    /// Switch the active transform, resetting the outgoing mode's transient
    /// state so it comes up fresh on reactivation.
    pub fn set_mode(&self, mode: Mode) {
        let mut cur = self.lock(&self.mode);
        if *cur == mode {
            return;
        }
        match *cur {
            Mode::Regions => self.regions.reset(),
            Mode::VerticalBands => {
                let mut cycle = self.lock(&self.cycle);
                cycle.idx = 0;
                self.bands.set_count(cycle.counts[0]);
            }
            Mode::Displace | Mode::RowSegment => {}
        }
        *cur = mode;
    }

    pub fn displace(&self) -> &FieldSynth {
        &self.displace
    }

    pub fn segment(&self) -> &SegmentEngine {
        &self.segment
    }

    pub fn bands(&self) -> &BandPartitioner {
        &self.bands
    }

    pub fn regions(&self) -> &RegionCompositor {
        &self.regions
    }

    /// Advance the band-count cycle one step and retarget the partitioner.
    pub fn band_cycle_tick(&self) {
        let mut cycle = self.lock(&self.cycle);
        cycle.idx = (cycle.idx + 1) % cycle.counts.len();
        let count = cycle.counts[cycle.idx];
        drop(cycle);
        self.bands.set_count(count);
    }

    /// Re-roll region positions and reshuffle draw order.
    pub fn reshuffle_tick(&self) {
        self.regions.tick();
    }

    /// Run one frame through the active transform. Errors mean the frame is
    /// dropped; the previously delivered output stays current.
    pub fn process_frame(&self, frame: &Frame, elapsed_secs: f64) -> GlitchResult<Frame> {
        if frame.is_empty() {
            return Err(GlitchError::frame("zero-extent input frame"));
        }
        let stage: &dyn TransformStage = match self.mode() {
            Mode::Displace => &self.displace,
            Mode::RowSegment => &self.segment,
            Mode::VerticalBands => &self.bands,
            Mode::Regions => &self.regions,
        };
        let out = stage.process(frame, elapsed_secs)?;
        debug_assert_eq!((out.width(), out.height()), (frame.width(), frame.height()));
        *self.lock(&self.last_output) = Some(out.clone());
        Ok(out)
    }

    /// Pull one frame from the source, transform it, deliver it to the sink.
    /// A failed frame is dropped with a warning, never a hard error.
    pub fn pump(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
        elapsed_secs: f64,
    ) -> GlitchResult<()> {
        let frame = source.next_frame()?;
        match self.process_frame(&frame, elapsed_secs) {
            Ok(out) => sink.present(&out),
            Err(err) => {
                tracing::warn!(%err, "frame dropped");
                Ok(())
            }
        }
    }

    /// Hand the most recent output to the sink for persistence. A denied
    /// save and a not-yet-started pipeline are both silent no-ops.
    pub fn capture_still(&self, sink: &mut dyn FrameSink) -> GlitchResult<()> {
        let last = self.lock(&self.last_output);
        let Some(frame) = last.as_ref() else {
            return Ok(());
        };
        match sink.save_still(frame)? {
            SaveOutcome::Saved => Ok(()),
            SaveOutcome::Denied => {
                tracing::debug!("still save denied by sink");
                Ok(())
            }
        }
    }

    fn lock<'a, T>(&self, m: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
        m.lock().unwrap_or_else(|e| e.into_inner())
    }
}
