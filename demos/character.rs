//! Drives a small character through idle, sprint and dash.
//!
//! Run with `RUST_LOG=hsm_sequencer=debug cargo run --example character` to
//! see every transition phase.

use hsm_sequencer::activity::{ActivityExt, CallbackActivity, Delayed};
use hsm_sequencer::builder::MachineBuilder;
use hsm_sequencer::core::{Composite, HookResult, Scope, State, StateId};
use hsm_sequencer::MachineConfig;
use std::time::Duration;

#[derive(Default)]
struct Input {
    sprint: bool,
    dash: bool,
    stamina: f32,
}

struct Enabled;

impl State<Input> for Enabled {
    fn initial_state(&self, scope: &Scope<'_>, _input: &Input) -> Option<StateId> {
        scope.child("Locomotion")
    }

    fn transition(&mut self, scope: &Scope<'_>, input: &Input) -> Option<StateId> {
        let dash = scope.child("Dash")?;
        let locomotion = scope.child("Locomotion")?;
        let target = if input.dash { dash } else { locomotion };
        (scope.active_child() != Some(target)).then_some(target)
    }
}

struct Locomotion;

impl State<Input> for Locomotion {
    fn initial_state(&self, scope: &Scope<'_>, _input: &Input) -> Option<StateId> {
        scope.child("Idle")
    }

    fn transition(&mut self, scope: &Scope<'_>, input: &Input) -> Option<StateId> {
        let wants_sprint = input.sprint && input.stamina > 0.0;
        let target = scope.child(if wants_sprint { "Sprint" } else { "Idle" })?;
        (scope.active_child() != Some(target)).then_some(target)
    }
}

struct Sprint;

impl State<Input> for Sprint {
    fn on_update(&mut self, input: &mut Input, dt: f32) -> HookResult {
        input.stamina = (input.stamina - dt).max(0.0);
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::var("HSM_CONFIG") {
        Ok(json) => MachineConfig::from_json(&json)?,
        Err(_) => MachineConfig::default(),
    };

    let mut builder = MachineBuilder::new("Root", Composite);
    let root = builder.root();
    let enabled = builder.add_child(root, "Enabled", Enabled);
    let locomotion = builder.add_child(enabled, "Locomotion", Locomotion);
    let idle = builder.add_child(locomotion, "Idle", Composite);
    let sprint = builder.add_child(locomotion, "Sprint", Sprint);
    let dash = builder.add_child(enabled, "Dash", Composite);
    builder
        .config(config)
        .add_activity(idle, CallbackActivity::noop("breathing"))
        .add_activity(
            sprint,
            Delayed::new(CallbackActivity::noop("footsteps"))
                .deactivation_delay(Duration::from_millis(60)),
        )
        .add_activity(
            dash,
            CallbackActivity::noop("dash-trail").delayed(Duration::from_millis(30)),
        );
    let mut machine = builder.build()?;

    let mut input = Input {
        stamina: 0.5,
        ..Input::default()
    };
    let frame = Duration::from_millis(16);
    let mut last_path = String::new();
    for tick in 0..90 {
        input.sprint = (10..60).contains(&tick);
        input.dash = (45..55).contains(&tick);

        machine.tick(&mut input, frame.as_secs_f32())?;

        let path = machine.active_path();
        if path != last_path {
            tracing::info!(tick, %path, stamina = input.stamina, "active path changed");
            last_path = path;
        }
        std::thread::sleep(frame);
    }

    for record in machine.history().records() {
        tracing::info!(
            from = %record.from,
            to = %record.to,
            outcome = ?record.outcome,
            duration_ms = record.duration().as_millis() as u64,
            "transition"
        );
    }
    Ok(())
}
