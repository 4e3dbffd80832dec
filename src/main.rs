// Procstat -- per-process telemetry agent for Linux
// Copyright (C) 2026  Procstat authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::Context;
use argh::FromArgs;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::path::PathBuf;

mod application;
mod cfg;
mod clock;
mod metric;
mod payload;
mod pidstat;
mod process;
mod samplers;
mod sighdr;
mod sink;

use application::Application;
use cfg::Settings;
use pidstat::Pidstat;
use process::ProcfsInspector;
use sighdr::ShutdownFlag;
use sink::{HttpSink, LogSink, TelemetrySink};

const APP_NAME: &str = "procstat";

#[derive(FromArgs, Debug)]
/// Report per-process resource metrics to a telemetry endpoint.
struct Opt {
    /// configuration file (default: procstat/config.toml in XDG directories)
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// log debug messages
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// collect and report a single cycle, then exit
    #[argh(switch)]
    once: bool,

    /// log the payload instead of posting it
    #[argh(switch)]
    dry_run: bool,
}

fn run(opt: Opt) -> anyhow::Result<()> {
    let level = if opt.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    let settings = match opt.config {
        Some(ref path) => Settings::load(path),
        None => Settings::discover(APP_NAME),
    }
    .context("configuration error")?;

    let inspector = ProcfsInspector::new()?;
    let external = Pidstat::default();
    let sink: Box<dyn TelemetrySink> = if opt.dry_run {
        Box::new(LogSink)
    } else {
        Box::new(HttpSink::new(
            settings.general().endpoint(),
            settings.general().license(),
        )?)
    };
    let shutdown = ShutdownFlag::install()?;

    let app = Application::new(&settings, &inspector, &external, sink.as_ref());
    app.run(&shutdown, opt.once);
    Ok(())
}

fn main() {
    let opt: Opt = argh::from_env();
    if let Err(err) = run(opt) {
        eprintln!("{APP_NAME}: {err:#}");
        std::process::exit(1);
    }
}
