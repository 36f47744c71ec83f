mod config;
pub use config::{
    CadenceConfig, ConditioningConfig, FingerConfig, HeartRateConfig, PeakConfig, SensorConfig,
    Spo2Config, VitalsConfig, WaveformConfig,
};

mod error;
pub use error::VitalsError;

mod sample;
pub use sample::Sample;

mod snapshot;
pub use snapshot::{BpmReading, ControllerState, FingerState, HeartRateSource, VitalsSnapshot};
