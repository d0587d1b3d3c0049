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

//! Scripted session against the simulated engine.

use std::time::Duration;

use playdeck_player::{
    EventSink, FocusChange, FocusGrant, HostLifecycleEvent, PlaybackSessionCoordinator,
    PlayerAction, PlayerConfig, SessionHandle, catalog,
    sim::{SimController, SimulatedFactory, SimulatedFocusService},
    spawn_session,
    state::format_time,
};
use snafu::{OptionExt, ResultExt, Whatever};
use tracing::info;

pub async fn run(config: PlayerConfig) -> Result<(), Whatever> {
    let factory = SimulatedFactory::default().with_duration("Video_5", Duration::from_secs(40));
    let focus = SimulatedFocusService::new(FocusGrant::Granted);
    let (sink, events) = EventSink::channel();
    let coordinator = PlaybackSessionCoordinator::new(factory.clone(), focus.clone(), config, sink);
    let (handle, join) = spawn_session(coordinator, events);

    handle
        .build_session(catalog::demo_items())
        .whatever_context("session closed before it was built")?;
    handle
        .view()
        .wait_for(Option::is_some)
        .await
        .whatever_context("session closed before it was built")?;
    let engine = factory
        .last_controller()
        .whatever_context("no engine was created")?;

    script(&handle, &engine, &focus)
        .await
        .whatever_context("session closed during the demo")?;

    // records() is answered after every queued command, so the status read
    // below sees the last tick
    let records = handle
        .records()
        .await
        .whatever_context("session closed before reporting")?;
    let status = handle.status().borrow().clone();
    handle.shutdown();
    join.await.whatever_context("session driver panicked")?;

    println!(
        "now playing {} at {}",
        status.current_item_id.as_deref().unwrap_or("-"),
        status.formatted_time()
    );
    println!("{:<8} {:>8} {:>8} captions", "item", "position", "duration");
    for (id, record) in records {
        println!(
            "{:<8} {:>8} {:>8} {}",
            id,
            format_time(record.current_position),
            format_time(record.total_duration),
            record.captions_available
        );
    }
    Ok(())
}

/// Plays through the first items, exercising navigation, captions, speed
/// and focus handling.
async fn script(
    handle: &SessionHandle,
    engine: &SimController,
    focus: &SimulatedFocusService,
) -> playdeck_player::err::Result<()> {
    advance(handle, engine, Duration::from_secs(25)).await?;
    handle.execute(PlayerAction::Next)?;
    advance(handle, engine, Duration::from_secs(58)).await?;
    handle.execute(PlayerAction::Previous)?;
    handle.execute(PlayerAction::Forward)?;
    advance(handle, engine, Duration::from_secs(3)).await?;

    handle.set_playback_speed(1.5).await?;
    focus.fire(FocusChange::LostTransient);
    focus.fire(FocusChange::Gained);

    for _ in 0..4 {
        handle.execute(PlayerAction::Next)?;
    }
    handle.execute(PlayerAction::Captions)?;
    handle.execute(PlayerAction::Captions)?;
    advance(handle, engine, Duration::from_secs(12)).await?;

    handle.on_lifecycle(HostLifecycleEvent::Pause {
        in_picture_in_picture: false,
    })?;
    handle.tick()?;
    info!("demo script finished");
    Ok(())
}

/// Moves the simulated clock once every queued command has run, then records
/// the position.
async fn advance(
    handle: &SessionHandle,
    engine: &SimController,
    elapsed: Duration,
) -> playdeck_player::err::Result<()> {
    handle.records().await?;
    engine.advance(elapsed);
    handle.tick()
}
