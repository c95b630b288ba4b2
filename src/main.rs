#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::Result;
use crossbeam_channel::{bounded, unbounded};
use gpui::Application;

use riftcam::{
    tracker::TrackerBackend,
    ui::{self, PipelineChannels},
};

fn main() -> Result<()> {
    env_logger::init();

    // Every inter-stage channel is bounded(1): senders try_send and
    // drop, so each stage always works on the newest data.
    let (cam_frame_tx, cam_frame_rx) = bounded(1);
    let (track_frame_tx, track_frame_rx) = bounded(1);
    let (tracked_tx, tracked_rx) = bounded(1);
    let (out_tx, out_rx) = bounded(1);
    let (command_tx, command_rx) = unbounded();

    let channels = PipelineChannels {
        cam_frame_tx,
        cam_frame_rx,
        track_frame_tx,
        track_frame_rx,
        tracked_tx,
        tracked_rx,
        command_tx,
        command_rx,
        out_tx,
        out_rx,
    };

    let backend = TrackerBackend::default();

    Application::new()
        .with_assets(gpui_component_assets::Assets)
        .run(move |app| {
            gpui_component::init(app);

            if let Err(err) = ui::launch_ui(app, channels, backend.clone()) {
                eprintln!("failed to launch ui: {err:?}");
            }
        });

    Ok(())
}
