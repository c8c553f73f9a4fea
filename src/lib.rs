#![forbid(unsafe_code)]

pub mod bands;
pub mod blur_cpu;
pub mod color;
pub mod displace;
pub mod error;
pub mod frame;
pub mod io;
pub mod pipeline;
pub mod regions;
pub mod segment;
pub mod shared;

pub use bands::{BandLayout, BandPartitioner};
pub use displace::{DisplacementField, FieldParams, FieldSynth, warp};
pub use error::{GlitchError, GlitchResult};
pub use frame::{Frame, Rgba8};
pub use io::{PngSink, SyntheticSource};
pub use pipeline::{
    Coordinator, FrameSink, FrameSource, Mode, PipelineConfig, SaveOutcome, TransformStage,
};
pub use regions::{Region, RegionCompositor, RegionCounts, RegionKind, RegionLayout};
pub use segment::{SegmentEngine, SegmentParams};
