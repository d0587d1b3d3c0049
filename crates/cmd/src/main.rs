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

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use playdeck_common_telemetry::{LogFormat, LoggingOptions, init_global_logging, set_panic_hook};
use playdeck_player::{PlayerConfig, catalog};
use snafu::{ResultExt, Whatever};

mod build_info;
mod demo;

#[derive(Debug, Parser)]
#[clap(
name = "playdeck",
about= "playdeck-cmd",
author = build_info::AUTHOR,
version = build_info::FULL_VERSION)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Demo(DemoArgs),
    Items(ItemsArgs),
}

#[derive(Debug, Clone, Args)]
#[command(flatten_help = true)]
#[command(long_about = r"

Plays the demo queue on a simulated engine and prints the playback records.
Examples:

playdeck demo
playdeck demo --config player.json --json-logs

")]
struct DemoArgs {
    /// JSON player config; defaults apply to missing fields
    #[arg(long)]
    config:    Option<PathBuf>,
    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

impl DemoArgs {
    async fn run(&self) -> Result<(), Whatever> {
        let opts = LoggingOptions::builder()
            .log_format(if self.json_logs {
                LogFormat::Json
            } else {
                LogFormat::Text
            })
            .build();
        let _guards = init_global_logging("playdeck", &opts);
        set_panic_hook();

        let config = match &self.config {
            Some(path) => PlayerConfig::from_file(path)
                .with_whatever_context(|_| format!("loading {}", path.display()))?,
            None => PlayerConfig::default(),
        };
        demo::run(config).await
    }
}

#[derive(Debug, Clone, Args)]
#[command(flatten_help = true)]
#[command(long_about = r"

Lists the demo queue.
Examples:

playdeck items

")]
struct ItemsArgs {}

impl ItemsArgs {
    fn run(&self) -> Result<(), Whatever> {
        for item in catalog::demo_items() {
            let subtitle = item
                .subtitle
                .as_ref()
                .map_or_else(|| "-".to_owned(), |s| format!("{} ({})", s.language, s.mime_type));
            println!("{:<8} {:<24} {}", item.id, subtitle, item.source_uri);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Whatever> {
    let cli = Cli::parse();
    match cli.commands {
        Commands::Demo(da) => da.run().await,
        Commands::Items(ia) => ia.run(),
    }
}
