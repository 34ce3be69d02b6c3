//! CLI entry point: boots one looper instance against the simulated
//! hardware backend, running a restart loop on failure that mirrors
//! `__main__`'s `except`/`restart_program` handling in
//! `examples/original_source/src/core.py` — a fatal error blinks the
//! error pattern and the instance is rebuilt from scratch, rather than
//! the source's `os.execl` process replacement (platform-specific and
//! out of scope here; noted in DESIGN.md).

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use looper_dsp::LooperConfig;
use looper_engine::error::EngineError;
use looper_engine::looper::Looper;
use looper_hw::sim::{SimButton, SimLamp};
use looper_hw::{ButtonId, LampBank, LampId};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "looper", about = "A bar-synchronized hardware audio looper")]
struct Args {
    /// Path to a JSON config file overriding the built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root directory session directories are created under. Overrides
    /// the config file's `recording_root` when given.
    #[arg(long)]
    recording_root: Option<PathBuf>,

    /// Run against the in-memory simulated button/lamp backend. This
    /// is the only backend this workspace ships — real GPIO binding
    /// is left to a separate crate; a real deployment links a
    /// separate crate providing `Button`/`Lamp` impls and calls
    /// `looper_engine::Looper::new`/`run` directly instead of this
    /// binary.
    #[arg(long, default_value_t = true)]
    sim_hardware: bool,
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let args = Args::parse();
    if !args.sim_hardware {
        error!("no real hardware backend is compiled into this binary; pass --sim-hardware");
        std::process::exit(1);
    }

    let mut config = match LooperConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            error!(%error, "failed to load configuration");
            std::process::exit(1);
        }
    };
    if let Some(root) = args.recording_root {
        config.recording_root = root;
    }

    let mut first_boot = true;
    loop {
        let mut lamps = LampBank::new(
            SimLamp::new(LampId::Rec),
            SimLamp::new(LampId::Play),
            SimLamp::new(LampId::Back),
            SimLamp::new(LampId::Forw),
        );

        if first_boot {
            info!("booting looper engine");
            lamps.startup_pattern();
        } else {
            info!("restarting looper engine after a fatal error");
            lamps.restart_pattern();
        }

        match Looper::new(config.clone(), lamps) {
            Ok(mut looper) => {
                first_boot = false;

                let buttons = [
                    SimButton::new(ButtonId::Rec),
                    SimButton::new(ButtonId::Play),
                    SimButton::new(ButtonId::Back),
                    SimButton::new(ButtonId::Forw),
                ];
                looper.run(buttons);
                looper.shutdown();
                info!("looper engine shut down cleanly, rebuilding for restart");
            }
            Err(error) => {
                error!(%error, "failed to start looper engine");
                let include_back = !matches!(error, EngineError::Audio(_));
                blink_error_pattern(include_back);
                first_boot = false;
            }
        }
    }
}

fn blink_error_pattern(include_back: bool) {
    let mut lamps = LampBank::new(
        SimLamp::new(LampId::Rec),
        SimLamp::new(LampId::Play),
        SimLamp::new(LampId::Back),
        SimLamp::new(LampId::Forw),
    );
    lamps.error_pattern(include_back, Duration::from_millis(300), Duration::from_millis(300));
    std::thread::sleep(Duration::from_secs(2));
}
