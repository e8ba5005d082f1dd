//! A small herd simulation driven by a controller.
//!
//! Spawns a few creatures, lets them get hungry, feeds them at a fixed
//! time, then rewinds halfway and checks that the replay lands on the same
//! state. Run with `RUST_LOG=debug` to see the scheduler's logging.

use chronon::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

const HEALTH: FieldId = FieldId(0);
const HUNGER: FieldId = FieldId(1);
const CREATURES: i64 = 4;

fn layout() -> Layout {
    let mut layout = Layout::new();
    layout.add_field(HEALTH, "HEALTH");
    layout.add_field(HUNGER, "HUNGER");
    layout
}

fn creature(id: i64) -> Entity {
    Entity::new()
        .setup(layout().field_ids())
        .set_handle(Handle::new(id, 0))
}

/// Spawns every creature at full health, then starts its life cycle.
fn spawn_herd() -> Action {
    Action::from_fn(|_| {
        let mut done = false;
        move |_: &dyn Access| -> Option<ImpactList> {
            if done {
                return None;
            }
            done = true;
            let mut impacts = ImpactList::new();
            for id in 0..CREATURES {
                let c = creature(id);
                impacts.push(c.set_handle(Handle::unused(id)).spawn());
                impacts.push(c.set(HEALTH, 100));
                impacts.push(c.random(HUNGER, 0, 3));
                impacts.push(Impact::QueueAction(live(id)));
            }
            Some(impacts)
        }
    })
}

/// Hunger grows every tick; a starving creature loses health.
fn live(id: i64) -> Action {
    Action::from_fn(move |_| {
        let c = creature(id);
        move |access: &dyn Access| -> Option<ImpactList> {
            let health = c.get(access, HEALTH, 0);
            if health <= 0 {
                return None;
            }
            let mut impacts = ImpactList::new();
            impacts.push(c.add(HUNGER, 1));
            if c.get(access, HUNGER, 0) > 5 {
                impacts.push(c.add(HEALTH, -10));
            }
            Some(impacts)
        }
    })
    .set_tick_duration(1)
}

/// Resets everyone's hunger.
fn feed() -> Action {
    Action::from_fn(|_| {
        let mut done = false;
        move |_: &dyn Access| -> Option<ImpactList> {
            if done {
                return None;
            }
            done = true;
            Some((0..CREATURES).map(|id| creature(id).set(HUNGER, 0)).collect())
        }
    })
}

fn report(exe: &Execution) {
    let state = exe.read().unwrap();
    for id in 0..CREATURES {
        let c = creature(id);
        info!(
            creature = id,
            health = c.get(&*state, HEALTH, -1),
            hunger = c.get(&*state, HUNGER, -1),
            "status"
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("{}", layout().codegen(0, "FIELD_", ";"));

    let seed = 2024;
    let mut exe = Execution::with_config(State::seeded(seed), ExecutionConfig::threaded(4))?;
    let mut ctrl = Controller::new().with_baseline(State::seeded(seed));
    ctrl.queue(Event::new(0, spawn_herd()))?;
    ctrl.queue(Event::new(12, feed()))?;

    ctrl.schedule_and_join(&exe, 20)?;
    report(&exe);
    let hash = state_hash(&*exe.read()?);
    info!(time = ctrl.time(), hash = format_args!("{hash:#018x}"), "before rewind");

    ctrl.rewind(&mut exe, 10)?;
    ctrl.schedule_and_join(&exe, 10)?;
    let replayed = state_hash(&*exe.read()?);
    info!(time = ctrl.time(), hash = format_args!("{replayed:#018x}"), "after replay");

    assert_eq!(hash, replayed);
    info!(metrics = ?exe.metrics(), "done");
    Ok(())
}
