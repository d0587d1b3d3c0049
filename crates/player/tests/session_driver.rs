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

use std::time::Duration;

use playdeck_common_telemetry::init_default_ut_logging;
use playdeck_player::{
    EventSink, FocusChange, FocusGrant, HostLifecycleEvent, PlaybackSessionCoordinator,
    PlayerAction, PlayerConfig, SessionHandle, catalog,
    err::Error,
    sim::{SimController, SimulatedFactory, SimulatedFocusService},
    spawn_session,
};
use tokio::task::JoinHandle;

struct Running {
    handle:  SessionHandle,
    join:    JoinHandle<()>,
    factory: SimulatedFactory,
    focus:   SimulatedFocusService,
}

fn start() -> Running {
    init_default_ut_logging();
    let factory = SimulatedFactory::default();
    let focus = SimulatedFocusService::new(FocusGrant::Granted);
    let (sink, events) = EventSink::channel();
    let coordinator = PlaybackSessionCoordinator::new(
        factory.clone(),
        focus.clone(),
        PlayerConfig::default(),
        sink,
    );
    let (handle, join) = spawn_session(coordinator, events);
    Running {
        handle,
        join,
        factory,
        focus,
    }
}

async fn built(running: &Running) -> SimController {
    running
        .handle
        .build_session(catalog::demo_items())
        .unwrap();
    running
        .handle
        .view()
        .wait_for(Option::is_some)
        .await
        .unwrap();
    running.factory.last_controller().unwrap()
}

async fn wait_index(handle: &SessionHandle, index: usize) {
    handle
        .view()
        .wait_for(|view| view.as_ref().and_then(|v| v.current_index) == Some(index))
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn position_tick_feeds_resume() {
    let running = start();
    let engine = built(&running).await;

    engine.advance(Duration::from_secs(10));
    // let the 1s position tick run
    tokio::time::sleep(Duration::from_millis(1_100)).await;

    running.handle.execute(PlayerAction::Next).unwrap();
    wait_index(&running.handle, 1).await;
    running.handle.execute(PlayerAction::Previous).unwrap();
    wait_index(&running.handle, 0).await;

    assert_eq!(engine.position(), Duration::from_secs(10));
    let records = running.handle.records().await.unwrap();
    assert_eq!(records.len(), 5);
    let (_, first) = records.iter().find(|(id, _)| id == "Video_1").unwrap();
    assert_eq!(first.current_position, Duration::from_secs(10));
    assert_eq!(first.total_duration, Duration::from_secs(60));
    running.handle.shutdown();
    running.join.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn status_tick_publishes_position() {
    let running = start();
    let engine = built(&running).await;
    engine.advance(Duration::from_secs(75));

    let mut status = running.handle.status();
    let status = tokio::time::timeout(
        Duration::from_secs(2),
        status.wait_for(|s| s.position == Duration::from_secs(15)),
    )
    .await
    .expect("status refreshed")
    .unwrap()
    .clone();

    // 75s into a 60s item continues 15s into the next one
    assert_eq!(status.current_item_id.as_deref(), Some("Video_2"));
    assert_eq!(status.formatted_time(), "00:15 : 01:00");
    running.handle.shutdown();
    running.join.await.unwrap();
}

#[tokio::test]
async fn speed_changes_are_validated() {
    let running = start();
    let engine = built(&running).await;

    running.handle.set_playback_speed(1.75).await.unwrap();
    assert!((engine.speed() - 1.75).abs() < f32::EPSILON);
    assert!(
        (running.handle.session_config().borrow().playback_speed - 1.75).abs() < f32::EPSILON
    );

    let err = running.handle.set_playback_speed(-1.0).await.unwrap_err();
    assert!(matches!(err, Error::InvalidPlaybackSpeed { .. }));
    assert!((engine.speed() - 1.75).abs() < f32::EPSILON);

    running.handle.shutdown();
    running.join.await.unwrap();
}

#[tokio::test]
async fn lifecycle_and_focus_route_through_driver() {
    let running = start();
    let engine = built(&running).await;
    let mut status = running.handle.status();
    status.wait_for(|s| s.is_playing).await.unwrap();

    running
        .handle
        .on_lifecycle(HostLifecycleEvent::Pause {
            in_picture_in_picture: true,
        })
        .unwrap();
    running.handle.tick().unwrap();
    assert!(engine.is_playing());

    running.focus.fire(FocusChange::LostTransient);
    status.wait_for(|s| !s.is_playing).await.unwrap();
    running.focus.fire(FocusChange::Gained);
    status.wait_for(|s| s.is_playing).await.unwrap();

    running
        .handle
        .on_lifecycle(HostLifecycleEvent::Stop)
        .unwrap();
    status.wait_for(|s| !s.is_playing).await.unwrap();
    assert!(!engine.is_playing());

    running.handle.shutdown();
    running.join.await.unwrap();
}

#[tokio::test]
async fn shutdown_releases_and_closes_handle() {
    let running = start();
    let engine = built(&running).await;

    running.handle.shutdown();
    running.join.await.unwrap();

    assert!(engine.is_released());
    assert_eq!(running.focus.abandons(), 1);
    assert!(running.handle.is_closed());
    assert!(matches!(
        running.handle.execute(PlayerAction::Play),
        Err(Error::SessionClosed { .. })
    ));
    assert!(matches!(
        running.handle.set_playback_speed(1.0).await,
        Err(Error::SessionClosed { .. })
    ));
    // closing twice is fine
    running.handle.shutdown();
}
