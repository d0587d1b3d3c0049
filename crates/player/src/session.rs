// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Async driver owning a [`PlaybackSessionCoordinator`].
//!
//! The driver task is the single execution context of a session: commands
//! from [`SessionHandle`]s, engine and focus events and the two periodic
//! ticks are all handled one at a time. Shutting down cancels the ticks
//! before the coordinator is released.

use std::{ops::ControlFlow, time::Duration};

use snafu::OptionExt;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    actions::PlayerAction,
    coordinator::{PlaybackSessionCoordinator, SessionView},
    engine::{EngineFactory, SessionEventReceiver},
    err::{Result, SessionClosedSnafu},
    focus::AudioFocusService,
    lifecycle::HostLifecycleEvent,
    media::MediaItem,
    state::{PlaybackStatus, SessionConfig, VideoPlaybackRecord},
};

/// Playback records keyed by item id, sorted by id.
pub type RecordSnapshot = Vec<(String, VideoPlaybackRecord)>;

#[derive(Debug)]
pub enum SessionCommand {
    BuildSession(Vec<MediaItem>),
    Execute(PlayerAction),
    SetPlaybackSpeed {
        speed: f32,
        reply: oneshot::Sender<Result<()>>,
    },
    RecordPosition {
        id:       String,
        position: Duration,
        duration: Duration,
    },
    /// Runs both periodic ticks right away.
    Tick,
    /// Copies the playback records once every earlier command has run.
    Records(oneshot::Sender<RecordSnapshot>),
    Shutdown,
}

/// Cloneable front end of a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    cancel:   CancellationToken,
    view:     watch::Receiver<Option<SessionView>>,
    config:   watch::Receiver<SessionConfig>,
    status:   watch::Receiver<PlaybackStatus>,
}

impl SessionHandle {
    pub fn build_session(&self, items: Vec<MediaItem>) -> Result<()> {
        self.send(SessionCommand::BuildSession(items))
    }

    pub fn execute(&self, action: PlayerAction) -> Result<()> {
        self.send(SessionCommand::Execute(action))
    }

    /// Forwards the action mapped from a host lifecycle transition, if any.
    pub fn on_lifecycle(&self, event: HostLifecycleEvent) -> Result<()> {
        match event.to_action() {
            Some(action) => self.execute(action),
            None => Ok(()),
        }
    }

    pub async fn set_playback_speed(&self, speed: f32) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::SetPlaybackSpeed { speed, reply })?;
        rx.await.ok().context(SessionClosedSnafu)?
    }

    pub fn record_position(
        &self,
        id: impl Into<String>,
        position: Duration,
        duration: Duration,
    ) -> Result<()> {
        self.send(SessionCommand::RecordPosition {
            id: id.into(),
            position,
            duration,
        })
    }

    pub fn tick(&self) -> Result<()> { self.send(SessionCommand::Tick) }

    pub async fn records(&self) -> Result<RecordSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Records(reply))?;
        rx.await.ok().context(SessionClosedSnafu)
    }

    /// Stops the driver. Closing an already closed session is not an error.
    pub fn shutdown(&self) {
        let _ = self.commands.send(SessionCommand::Shutdown);
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool { self.commands.is_closed() || self.cancel.is_cancelled() }

    pub fn view(&self) -> watch::Receiver<Option<SessionView>> { self.view.clone() }

    pub fn session_config(&self) -> watch::Receiver<SessionConfig> { self.config.clone() }

    pub fn status(&self) -> watch::Receiver<PlaybackStatus> { self.status.clone() }

    fn send(&self, command: SessionCommand) -> Result<()> {
        if self.cancel.is_cancelled() {
            return SessionClosedSnafu.fail();
        }
        self.commands.send(command).ok().context(SessionClosedSnafu)
    }
}

/// Spawns the driver task for `coordinator` on the current tokio runtime.
///
/// `events` must be the receiving end of the queue whose sink was handed to
/// the coordinator.
pub fn spawn_session<F, A>(
    coordinator: PlaybackSessionCoordinator<F, A>,
    events: SessionEventReceiver,
) -> (SessionHandle, JoinHandle<()>)
where
    F: EngineFactory + 'static,
    A: AudioFocusService + 'static,
{
    let (commands, commands_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let handle = SessionHandle {
        commands,
        cancel: cancel.clone(),
        view: coordinator.subscribe_view(),
        config: coordinator.subscribe_config(),
        status: coordinator.subscribe_status(),
    };
    let join = tokio::spawn(run(coordinator, events, commands_rx, cancel));
    (handle, join)
}

async fn run<F, A>(
    mut coordinator: PlaybackSessionCoordinator<F, A>,
    mut events: SessionEventReceiver,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    cancel: CancellationToken,
) where
    F: EngineFactory,
    A: AudioFocusService,
{
    let session = coordinator.session_id();
    let mut position_tick = tokio::time::interval(coordinator.config().position_tick());
    position_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut status_tick = tokio::time::interval(coordinator.config().status_tick());
    status_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(%session, "session driver started");

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            command = commands.recv() => {
                let Some(command) = command else { break };
                if apply(&mut coordinator, command).is_break() {
                    break;
                }
            }
            Some(event) = events.recv() => coordinator.handle_event(event),
            _ = position_tick.tick() => coordinator.tick_position(),
            _ = status_tick.tick() => coordinator.refresh_status(),
        }
    }

    cancel.cancel();
    coordinator.release();
    info!(%session, "session driver stopped");
}

fn apply<F, A>(
    coordinator: &mut PlaybackSessionCoordinator<F, A>,
    command: SessionCommand,
) -> ControlFlow<()>
where
    F: EngineFactory,
    A: AudioFocusService,
{
    match command {
        SessionCommand::BuildSession(items) => coordinator.build_session(items),
        SessionCommand::Execute(action) => coordinator.execute_action(action),
        SessionCommand::SetPlaybackSpeed { speed, reply } => {
            if reply.send(coordinator.set_playback_speed(speed)).is_err() {
                debug!(speed, "speed change caller went away");
            }
        }
        SessionCommand::RecordPosition {
            id,
            position,
            duration,
        } => coordinator.record_position(&id, position, duration),
        SessionCommand::Tick => {
            coordinator.tick_position();
            coordinator.refresh_status();
        }
        SessionCommand::Records(reply) => {
            let mut records: RecordSnapshot = coordinator
                .store()
                .iter()
                .map(|(id, record)| (id.to_owned(), *record))
                .collect();
            records.sort_by(|a, b| a.0.cmp(&b.0));
            let _ = reply.send(records);
        }
        SessionCommand::Shutdown => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog,
        config::PlayerConfig,
        engine::EventSink,
        focus::FocusGrant,
        sim::{SimulatedFactory, SimulatedFocusService},
    };

    #[test]
    fn shutdown_command_stops_loop_without_releasing() {
        let (sink, _events) = EventSink::channel();
        let mut coordinator = PlaybackSessionCoordinator::new(
            SimulatedFactory::default(),
            SimulatedFocusService::new(FocusGrant::Granted),
            PlayerConfig::default(),
            sink,
        );

        let flow = apply(
            &mut coordinator,
            SessionCommand::BuildSession(catalog::demo_items()),
        );
        assert!(flow.is_continue());
        assert!(apply(&mut coordinator, SessionCommand::Tick).is_continue());

        // release happens once, after the loop exits
        assert!(apply(&mut coordinator, SessionCommand::Shutdown).is_break());
        assert!(coordinator.is_active());
        assert_eq!(coordinator.focus_service().abandons(), 0);
    }
}
