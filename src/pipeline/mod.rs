pub mod camera;
pub mod compositor;
pub mod rgba;

// Re-exports for convenience
pub use camera::{CameraDevice, CameraStream, available_cameras, start_camera_stream};
pub use compositor::{CompositorCommand, start_frame_compositor};
