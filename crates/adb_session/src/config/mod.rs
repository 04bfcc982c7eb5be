//! Configuration for adb session operations

mod timing;

pub use timing::{
    InputTimingConfig, LifecycleTimingConfig, SnapshotTimingConfig, TimingConfig, TIMING_CONFIG,
};
