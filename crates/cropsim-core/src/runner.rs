//! Async playback driver.
//!
//! [`run_playback`] turns a [`TimelineController`] into a running player: a
//! `tokio` interval fires [`TimelineController::tick`] while playing, and
//! [`PlaybackCommand`]s arriving on an `mpsc` channel are applied between
//! ticks. The interval is rebuilt whenever the controller's timer generation
//! changes and dropped when it pauses, so a paused controller never receives
//! a tick and day snapshots arrive in strictly increasing order.

use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::controller::{SceneCollaborator, TimelineController};

/// A request from the UI to the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackCommand {
    /// Start advancing.
    Play,
    /// Stop advancing.
    Pause,
    /// Change the speed multiplier.
    SetSpeed(f64),
    /// Jump to a 0-based day (clamped).
    SetDay(i64),
    /// Step forward one day.
    Next,
    /// Step back one day.
    Prev,
    /// Dispose the controller and stop the driver.
    Dispose,
}

/// Driver behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackOptions {
    /// Return as soon as the last day is shown and playback has stopped.
    pub exit_when_finished: bool,
}

/// Why the driver returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// A [`PlaybackCommand::Dispose`] was received.
    Disposed,
    /// Every command sender was dropped. The controller is disposed.
    ChannelClosed,
    /// The last day was reached with `exit_when_finished` set.
    Finished,
}

/// Run playback until disposed, the channel closes, or (optionally) the
/// timeline finishes.
pub async fn run_playback<S: SceneCollaborator>(
    controller: &mut TimelineController<S>,
    commands: &mut mpsc::Receiver<PlaybackCommand>,
    options: PlaybackOptions,
) -> PlaybackOutcome {
    let mut ticker: Option<(u64, Interval)> = None;

    info!(
        days = controller.timeline().len(),
        playing = controller.is_playing(),
        "Playback driver started"
    );

    loop {
        sync_ticker(controller, &mut ticker);

        if options.exit_when_finished && controller.is_at_end() && !controller.is_playing() {
            info!(day = controller.current_day_index(), "Playback finished");
            return PlaybackOutcome::Finished;
        }

        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    controller.dispose();
                    info!("Command channel closed, playback stopped");
                    return PlaybackOutcome::ChannelClosed;
                };
                if apply_command(controller, command) {
                    info!("Playback disposed");
                    return PlaybackOutcome::Disposed;
                }
            }
            () = next_tick(&mut ticker) => {
                controller.tick();
            }
        }
    }
}

/// Apply one command. Returns `true` when the driver should stop.
fn apply_command<S: SceneCollaborator>(controller: &mut TimelineController<S>, command: PlaybackCommand) -> bool {
    debug!(?command, "Playback command");
    match command {
        PlaybackCommand::Play => controller.play(),
        PlaybackCommand::Pause => controller.pause(),
        PlaybackCommand::SetSpeed(factor) => {
            if let Err(err) = controller.set_speed(factor) {
                warn!(error = %err, "Speed change rejected");
            }
        }
        PlaybackCommand::SetDay(index) => {
            controller.set_day(index);
        }
        PlaybackCommand::Next => {
            controller.next_day();
        }
        PlaybackCommand::Prev => {
            controller.prev_day();
        }
        PlaybackCommand::Dispose => {
            controller.dispose();
            return true;
        }
    }
    false
}

/// Make the local interval match the controller's timer handle.
fn sync_ticker<S: SceneCollaborator>(controller: &TimelineController<S>, ticker: &mut Option<(u64, Interval)>) {
    match controller.timer() {
        None => *ticker = None,
        Some(handle) if ticker.as_ref().is_some_and(|(generation, _)| *generation == handle.generation) => {}
        Some(handle) => {
            // First tick one full interval after (re)start.
            let now = Instant::now();
            let start = now.checked_add(handle.interval).unwrap_or(now);
            let mut interval = interval_at(start, handle.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            *ticker = Some((handle.generation, interval));
        }
    }
}

async fn next_tick(ticker: &mut Option<(u64, Interval)>) {
    match ticker {
        Some((_, interval)) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::controller::tests::controller;

    #[tokio::test(start_paused = true)]
    async fn autoplay_runs_to_the_last_day() {
        let mut c = controller(5);
        let (_tx, mut rx) = mpsc::channel(8);
        c.play();

        let started = Instant::now();
        let outcome = run_playback(
            &mut c,
            &mut rx,
            PlaybackOptions {
                exit_when_finished: true,
            },
        )
        .await;

        assert_eq!(outcome, PlaybackOutcome::Finished);
        assert_eq!(c.scene().days, vec![0, 1, 2, 3, 4]);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn speed_command_shortens_interval() {
        let mut c = controller(5);
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(PlaybackCommand::SetSpeed(4.0)).await.unwrap();
        tx.send(PlaybackCommand::Play).await.unwrap();

        let started = Instant::now();
        let outcome = run_playback(
            &mut c,
            &mut rx,
            PlaybackOptions {
                exit_when_finished: true,
            },
        )
        .await;

        assert_eq!(outcome, PlaybackOutcome::Finished);
        assert!(started.elapsed() < Duration::from_millis(1500));
        assert_eq!(c.current_day_index(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_halts_advancement() {
        let mut c = controller(10);
        let (tx, mut rx) = mpsc::channel(8);
        c.play();

        let sender = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            tx.send(PlaybackCommand::Pause).await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(tx);
        });

        let outcome = run_playback(&mut c, &mut rx, PlaybackOptions::default()).await;
        sender.await.unwrap();

        assert_eq!(outcome, PlaybackOutcome::ChannelClosed);
        assert_eq!(c.current_day_index(), 2);
        assert_eq!(c.scene().days, vec![0, 1, 2]);
        assert!(c.is_disposed());
        assert_eq!(c.scene().released, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_commands_and_dispose() {
        let mut c = controller(10);
        let (tx, mut rx) = mpsc::channel(8);
        for command in [
            PlaybackCommand::SetDay(20),
            PlaybackCommand::Prev,
            PlaybackCommand::Next,
            PlaybackCommand::SetDay(-3),
            PlaybackCommand::SetSpeed(-1.0),
            PlaybackCommand::Dispose,
        ] {
            tx.send(command).await.unwrap();
        }

        let outcome = run_playback(&mut c, &mut rx, PlaybackOptions::default()).await;

        assert_eq!(outcome, PlaybackOutcome::Disposed);
        assert_eq!(c.scene().days, vec![0, 9, 8, 9, 0]);
        assert!((c.speed_factor() - 1.0).abs() < f64::EPSILON);
        assert!(c.is_disposed());
    }
}
