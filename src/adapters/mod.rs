// Adapters - External system implementations

pub mod exec_capture;
pub mod json_store;
#[cfg(unix)]
pub mod mpv_ipc;
pub mod sim_capture;
pub mod sim_surface;
pub mod toml_config;
pub mod visibility;

// Re-export adapters
pub use exec_capture::ExecCaptureAdapter;
pub use json_store::JsonStoreAdapter;
#[cfg(unix)]
pub use mpv_ipc::MpvIpcSurface;
pub use sim_capture::{CaptureBehavior, SimulatedCapture};
pub use sim_surface::{SimulatedSurface, SurfaceEvent};
pub use toml_config::{AppConfig, TomlConfigAdapter};
pub use visibility::ForegroundSignal;
