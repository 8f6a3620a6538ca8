//! The main loop: fetch vision, drain inbound messages, dispatch them to
//! the active controller, tick the robot, pump I/O.
//!
//! Grounded on `original_source/src/SoccerBot.cpp`'s `run()` loop shape
//! (`handleServerMessages` -> fetch frames -> tick -> repeat), with the
//! `tracing_subscriber`/`miette` startup idiom carried over from this
//! workspace's other binaries. Camera acquisition and blob detection are out of scope here;
//! this binary runs the core tick loop against whatever `VisionResults` an
//! external vision stage would otherwise supply — here, an always-empty
//! snapshot, the same "neither camera opened, running in test mode" path
//! `SoccerBot::run` falls back to.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use behavior::{ControllerRegistry, ManualController, TestController};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use odal::Config;
use protocol::{OperatorLink, VisionResults};
use robot::Robot;
use robot_config::RobotConfig;

/// Target tick period in seconds; the control tick runs at
/// ~16-33ms. 30Hz matches the forward-kinematics test scenarios' implied
/// camera framerate.
const TICK_SECONDS: f32 = 1.0 / 30.0;

#[derive(Parser, Debug)]
#[command(about = "Control core main loop for the omni-drive soccer robot")]
struct Cli {
    /// Directory containing `robot.toml` (and, if present, an overlay).
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    /// Optional overlay config directory, merged over the main config
    /// (`odal::Config::load_with_overlay`).
    #[arg(long)]
    overlay_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    miette::set_panic_hook();

    let cli = Cli::parse();

    let config = match &cli.overlay_dir {
        Some(overlay_dir) => RobotConfig::load_with_overlay(&cli.config_dir, overlay_dir),
        None => RobotConfig::load_without_overlay(&cli.config_dir),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(?err, "no usable robot.toml found, running with defaults");
            RobotConfig::default()
        }
    };

    let operator_port = config.network.operator_port;
    let mut robot = Robot::new(config).into_diagnostic()?;
    let operator = OperatorLink::bind(("0.0.0.0", operator_port)).into_diagnostic()?;

    let mut registry = ControllerRegistry::new();
    registry.add("manual", Box::<ManualController>::default());
    registry.add("test", Box::<TestController>::default());
    registry.set_active(&mut robot, "manual");

    let running = Arc::new(AtomicBool::new(true));
    let handler_running = Arc::clone(&running);
    ctrlc::set_handler(move || {
        tracing::info!("shutdown requested");
        handler_running.store(false, Ordering::SeqCst);
    })
    .into_diagnostic()?;

    tracing::info!(port = operator_port, "starting main loop");
    run_loop(&running, &mut robot, &mut registry, &operator);
    tracing::info!("main loop ended");

    Ok(())
}

/// Drives the tick loop until `running` is cleared: drains operator
/// messages, ticks the active controller (which in turn ticks `robot`), and
/// sleeps out whatever's left of the tick budget.
///
/// Vision is out of scope for the core: no camera/blob pipeline
/// runs here, so every tick sees an empty [`VisionResults`] snapshot,
/// matching the "neither camera opened" branch of
/// `original_source/src/SoccerBot.cpp`'s `run()`.
fn run_loop(running: &AtomicBool, robot: &mut Robot, registry: &mut ControllerRegistry, operator: &OperatorLink) {
    let vision = VisionResults::new();

    while running.load(Ordering::SeqCst) {
        let tick_start = Instant::now();

        for (connection, command) in operator.poll_inbound() {
            tracing::debug!(connection, command = command.name(), "dispatching operator command");
            registry.dispatch(robot, &command);
            // Every processed message gets the active controller's current
            // JSON snapshot echoed back, the introspection "response" side
            // of `handleRequest` (`getJSON`).
            operator.reply(connection, &registry.get_json().to_string());
        }

        registry.step(robot, &vision, TICK_SECONDS);
        robot.step(TICK_SECONDS, &vision);

        let elapsed = tick_start.elapsed();
        let budget = Duration::from_secs_f32(TICK_SECONDS);
        if let Some(remaining) = budget.checked_sub(elapsed) {
            std::thread::sleep(remaining);
        }
    }
}
