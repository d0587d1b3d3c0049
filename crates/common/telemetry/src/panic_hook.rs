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

//! Panic reporting through `tracing`, plus optional `parking_lot` deadlock
//! detection behind the `deadlock_detection` feature.

#[cfg(feature = "deadlock_detection")]
use std::time::Duration;
use std::{panic, sync::LazyLock};

use backtrace::Backtrace;
use prometheus::{IntCounter, register_int_counter};

/// Number of panics observed since the hook was installed.
///
/// `None` when the counter could not be registered (for example a second
/// registry entry with the same name); panics are still logged.
pub static PANIC_COUNTER: LazyLock<Option<IntCounter>> = LazyLock::new(|| {
    register_int_counter!("playdeck_panic_total", "Total number of panics").ok()
});

/// Replaces the default panic hook with one that logs the panic message,
/// location and backtrace as an `ERROR` event before delegating to the
/// previous hook.
pub fn set_panic_hook() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic| {
        let backtrace = format!("{:?}", Backtrace::new());
        if let Some(location) = panic.location() {
            tracing::error!(
                message = %panic,
                backtrace = %backtrace,
                panic.file = location.file(),
                panic.line = location.line(),
                panic.column = location.column(),
            );
        } else {
            tracing::error!(message = %panic, backtrace = %backtrace);
        }
        if let Some(counter) = PANIC_COUNTER.as_ref() {
            counter.inc();
        }
        default_hook(panic);
    }));

    #[cfg(feature = "deadlock_detection")]
    let _ = std::thread::spawn(move || {
        loop {
            std::thread::sleep(Duration::from_secs(5));
            let deadlocks = parking_lot::deadlock::check_deadlock();
            if deadlocks.is_empty() {
                continue;
            }

            tracing::warn!("{} deadlocks detected", deadlocks.len());
            for (i, threads) in deadlocks.iter().enumerate() {
                tracing::warn!("Deadlock #{}", i);
                for t in threads {
                    tracing::warn!("Thread Id {:#?}", t.thread_id());
                    tracing::warn!("{:#?}", t.backtrace());
                }
            }
        }
    });
}
