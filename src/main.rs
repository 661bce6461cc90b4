//! Physics Toybox headless runner
//!
//! Builds a world from a preset name or a scenario JSON file, runs it for a
//! number of ticks and prints the final snapshot as JSON.

#[cfg(not(target_arch = "wasm32"))]
mod runner {
    use std::path::Path;

    use anyhow::{Context, Result};
    use clap::Parser;

    use physics_toybox::{Scenario, ScenarioKind, World};

    /// Log telemetry this often
    const REPORT_EVERY: u64 = 60;

    #[derive(Parser, Debug)]
    #[command(name = "physics-toybox", about = "Run a toy physics scenario headless")]
    pub struct Args {
        /// Preset name or path to a scenario JSON file
        #[arg(default_value = "bouncing_balls")]
        scenario: String,
        /// Number of ticks to run
        #[arg(long, default_value_t = 600)]
        ticks: u64,
        /// Override the scenario seed
        #[arg(long)]
        seed: Option<u64>,
        /// Print the scenario JSON instead of running it
        #[arg(long)]
        dump: bool,
    }

    fn load_scenario(name: &str) -> Result<Scenario> {
        if name.ends_with(".json") || Path::new(name).is_file() {
            let json = std::fs::read_to_string(name).with_context(|| format!("cannot read scenario {name}"))?;
            let scenario = Scenario::from_json(&json).with_context(|| format!("invalid scenario {name}"))?;
            log::info!("Loaded scenario from {}", name);
            Ok(scenario)
        } else {
            Scenario::named(name).with_context(|| {
                let names: Vec<&str> = ScenarioKind::ALL.iter().map(|k| k.as_str()).collect();
                format!("available scenarios: {}", names.join(", "))
            })
        }
    }

    pub fn run(args: Args) -> Result<()> {
        let mut scenario = load_scenario(&args.scenario)?;
        if let Some(seed) = args.seed {
            scenario.seed = seed;
        }

        if args.dump {
            println!("{}", scenario.to_json()?);
            return Ok(());
        }

        let mut world = World::new(scenario)?;
        for _ in 0..args.ticks {
            let snapshot = world.step();
            if snapshot.tick % REPORT_EVERY == 0 {
                let t = &snapshot.telemetry;
                match t.stability {
                    Some(stability) => log::info!(
                        "tick {} t={:.3} ke={:.4e} stability={:.2}",
                        snapshot.tick,
                        t.elapsed,
                        t.kinetic_energy,
                        stability
                    ),
                    None => log::info!("tick {} t={:.3} ke={:.4e}", snapshot.tick, t.elapsed, t.kinetic_energy),
                }
            }
        }

        println!("{}", serde_json::to_string_pretty(world.snapshot())?);
        Ok(())
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use clap::Parser;

    env_logger::init();
    log::info!("Physics Toybox (headless) starting...");

    runner::run(runner::Args::parse())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page on the web; there is no CLI
}
