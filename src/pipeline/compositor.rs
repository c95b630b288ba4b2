use std::{thread, time::Duration, time::Instant};

use crossbeam_channel::{Receiver, Sender};

use crate::{
    effects::{self, Effect},
    interpret::Interpreter,
    types::{CompositedFrame, EffectKind, Frame, TrackedFrame},
};

/// Tracking results older than this are ignored rather than drawn as
/// ghosts of where things used to be.
const TRACKING_STALE_AFTER: Duration = Duration::from_millis(700);

const FPS_SMOOTHING: f32 = 0.9;

/// UI-to-compositor control messages.
#[derive(Clone, Copy, Debug)]
pub enum CompositorCommand {
    SelectEffect(EffectKind),
    ResetEffect,
}

/// Spawns the compositor worker: per camera frame it folds in the
/// newest tracking result, runs the interpreter and the active effect,
/// and offers the composited frame to the UI. Exits when the camera
/// channel disconnects.
pub fn start_frame_compositor(
    initial_effect: EffectKind,
    frame_rx: Receiver<Frame>,
    tracked_rx: Receiver<TrackedFrame>,
    command_rx: Receiver<CompositorCommand>,
    out_tx: Sender<CompositedFrame>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut effect = effects::create(initial_effect);
        let mut interpreter = Interpreter::new();
        let mut latest_tracked: Option<TrackedFrame> = None;
        let mut fps = 0.0f32;
        let mut last_render: Option<Instant> = None;

        while let Some(mut frame) = recv_latest_frame(&frame_rx) {
            while let Ok(command) = command_rx.try_recv() {
                match command {
                    CompositorCommand::SelectEffect(kind) => {
                        if kind != effect.kind() {
                            effect = effects::create(kind);
                            interpreter = Interpreter::new();
                        }
                    }
                    CompositorCommand::ResetEffect => effect.reset(),
                }
            }

            while let Ok(newer) = tracked_rx.try_recv() {
                latest_tracked = Some(newer);
            }

            let tracked = latest_tracked.as_ref().filter(|t| {
                frame.timestamp.duration_since(t.timestamp) <= TRACKING_STALE_AFTER
            });

            let signals = interpreter.update(&frame, tracked);
            effect.render(&mut frame, tracked, &signals);

            let now = Instant::now();
            if let Some(prev) = last_render {
                let dt = now.duration_since(prev).as_secs_f32();
                if dt > 0.0 {
                    let instant_fps = 1.0 / dt;
                    fps = if fps == 0.0 {
                        instant_fps
                    } else {
                        fps * FPS_SMOOTHING + instant_fps * (1.0 - FPS_SMOOTHING)
                    };
                }
            }
            last_render = Some(now);

            let composited = CompositedFrame {
                effect: effect.kind(),
                status: effect.status(),
                fps,
                frame,
            };
            // Drop if the UI is busy; the next frame is already coming.
            let _ = out_tx.try_send(composited);
        }
    })
}

fn recv_latest_frame(frame_rx: &Receiver<Frame>) -> Option<Frame> {
    let mut frame = frame_rx.recv().ok()?;
    while let Ok(newer) = frame_rx.try_recv() {
        frame = newer;
    }
    Some(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{bounded, unbounded};
    use std::time::Instant;

    fn frame() -> Frame {
        Frame {
            rgba: vec![0; 16 * 16 * 4],
            width: 16,
            height: 16,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn compositor_forwards_frames_and_switches_effects() {
        let (frame_tx, frame_rx) = bounded(4);
        let (_tracked_tx, tracked_rx) = bounded::<TrackedFrame>(4);
        let (command_tx, command_rx) = unbounded();
        let (out_tx, out_rx) = bounded(4);

        let handle = start_frame_compositor(
            EffectKind::Skeleton,
            frame_rx,
            tracked_rx,
            command_rx,
            out_tx,
        );

        frame_tx.send(frame()).unwrap();
        let first = out_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first.effect, EffectKind::Skeleton);
        assert_eq!(first.frame.width, 16);

        command_tx
            .send(CompositorCommand::SelectEffect(EffectKind::TimeRift))
            .unwrap();
        frame_tx.send(frame()).unwrap();
        let second = out_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(second.effect, EffectKind::TimeRift);
        assert!(second.status.unwrap().starts_with("charging"));

        drop(frame_tx);
        handle.join().unwrap();
    }

    #[test]
    fn stale_tracking_is_not_applied() {
        let (frame_tx, frame_rx) = bounded(4);
        let (tracked_tx, tracked_rx) = bounded(4);
        let (_command_tx, command_rx) = unbounded::<CompositorCommand>();
        let (out_tx, out_rx) = bounded(4);

        let handle = start_frame_compositor(
            EffectKind::Skeleton,
            frame_rx,
            tracked_rx,
            command_rx,
            out_tx,
        );

        // A tracking result from long before the frame.
        let old = Instant::now() - Duration::from_secs(5);
        tracked_tx
            .send(TrackedFrame::empty(16, 16, old))
            .unwrap();
        frame_tx.send(frame()).unwrap();
        let out = out_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        // Skeleton overlay reports nothing: stale tracking was dropped.
        assert!(out.status.is_none());

        drop(frame_tx);
        handle.join().unwrap();
    }
}
