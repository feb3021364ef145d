//! CLI command implementations.

use abd_bench::metrics::BenchmarkMetrics;
use abd_bench::runner::BenchmarkRunner;
use abd_bench::scenarios::{Scenario, ScenarioKind};
use abd_material::{MaterialDatabase, MaterialProperties};
use abd_math::kinematic::{linear_part, translation};
use abd_solver::{SimulationConfig, Simulator, StepReport};
use abd_telemetry::{EventBus, TracingSink};
use abd_types::BodyId;
use serde::Serialize;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Arguments of `abd simulate`.
pub struct SimulateArgs<'a> {
    pub scenario: &'a str,
    pub config: Option<&'a str>,
    pub steps: Option<u32>,
    pub material: Option<&'a str>,
    pub output: Option<&'a str>,
    pub trace_events: bool,
}

/// Final pose of one body in the JSON output.
#[derive(Serialize)]
struct BodyPose {
    name: String,
    translation: [f64; 3],
    /// Row-major linear part.
    linear: [[f64; 3]; 3],
}

#[derive(Serialize)]
struct SimulationOutput<'a> {
    scenario: &'a str,
    config: &'a SimulationConfig,
    steps: &'a [StepReport],
    bodies: Vec<BodyPose>,
}

fn lookup_material(name: Option<&str>) -> Result<Option<MaterialProperties>, String> {
    let Some(name) = name else {
        return Ok(None);
    };
    let db = MaterialDatabase::with_defaults();
    db.get(name).cloned().map(Some).ok_or_else(|| {
        format!(
            "Unknown material: '{name}'. Available: {}",
            db.names().join(", ")
        )
    })
}

fn lookup_scenario(name: &str) -> Result<ScenarioKind, String> {
    ScenarioKind::from_name(name).ok_or_else(|| {
        let available: Vec<&str> = ScenarioKind::all().iter().map(|k| k.name()).collect();
        format!("Unknown scenario: '{name}'. Available: {}", available.join(", "))
    })
}

/// Run a scene and print a per-run summary.
pub fn simulate(args: SimulateArgs<'_>) -> CliResult {
    println!("ABD Simulation");
    println!("──────────────");

    let kind = lookup_scenario(args.scenario)?;
    let mut scenario = Scenario::from_kind(kind);
    if let Some(path) = args.config {
        println!("Config:    {path}");
        scenario = scenario.with_config(SimulationConfig::load(path)?);
    }
    if let Some(props) = lookup_material(args.material)? {
        println!("Material:  {}", props.name);
        scenario = scenario.with_material(&props);
    }
    let steps = args.steps.unwrap_or(scenario.timesteps);

    println!(
        "Scenario:  {} ({} bodies, {} verts, {} tris)",
        kind.name(),
        scenario.bodies.len(),
        scenario.vertex_count(),
        scenario.triangle_count()
    );
    println!("Steps:     {steps} × {}s", scenario.config.timestep);
    println!();

    let mut sim = Simulator::new(scenario.config.clone(), scenario.bodies.clone())?;
    if args.trace_events {
        let mut bus = EventBus::new();
        bus.add_sink(Box::new(TracingSink::default()));
        sim = sim.with_event_bus(bus);
    }
    sim.setup()?;

    let reports = sim.run(steps)?;
    if let Some(bus) = sim.event_bus_mut() {
        bus.finalize();
    }

    let unconverged = reports.iter().filter(|r| !r.converged).count();
    let iterations: u32 = reports.iter().map(|r| r.newton_iterations).sum();
    let wall: f64 = reports.iter().map(|r| r.wall_time).sum();
    let max_contacts = reports.iter().map(|r| r.contact_count).max().unwrap_or(0);
    let max_penetration = reports.iter().map(|r| r.max_penetration).fold(0.0, f64::max);

    println!("  Sim time:        {:.3}s", sim.time());
    println!("  Wall time:       {wall:.3}s");
    println!("  Newton iters:    {iterations} ({unconverged} unconverged steps)");
    println!("  Max contacts:    {max_contacts}");
    println!("  Max penetration: {max_penetration:.4e}");
    println!("  Kinetic energy:  {:.6e}", sim.kinetic_energy()?);
    println!();

    let mut bodies = Vec::with_capacity(sim.body_count());
    for (i, body) in sim.bodies().iter().enumerate() {
        let q = sim.body_pose(BodyId::from(i))?;
        let t = translation(&q);
        let f = linear_part(&q);
        println!("  {:<10} t = ({:.4}, {:.4}, {:.4})", body.name, t.x, t.y, t.z);
        bodies.push(BodyPose {
            name: body.name.clone(),
            translation: t.to_array(),
            linear: [f.row(0).to_array(), f.row(1).to_array(), f.row(2).to_array()],
        });
    }

    if let Some(path) = args.output {
        let output = SimulationOutput {
            scenario: kind.name(),
            config: sim.config(),
            steps: &reports,
            bodies,
        };
        std::fs::write(path, serde_json::to_string_pretty(&output)?)?;
        println!();
        println!("Results written to: {path}");
    }

    Ok(())
}

/// Run benchmark suite.
pub fn benchmark(
    scenario_name: &str,
    material_name: Option<&str>,
    output_path: Option<&str>,
) -> CliResult {
    println!("ABD Benchmark Suite");
    println!("═══════════════════");
    println!();

    let material = lookup_material(material_name)?;
    if let Some(props) = &material {
        println!("Material: {}", props.name);
        println!();
    }

    let kinds: Vec<ScenarioKind> = if scenario_name == "all" {
        ScenarioKind::all().to_vec()
    } else {
        vec![lookup_scenario(scenario_name)?]
    };

    let mut all_metrics = Vec::new();
    for kind in kinds {
        let mut scenario = Scenario::from_kind(kind);
        if let Some(props) = &material {
            scenario = scenario.with_material(props);
        }

        println!(
            "Running: {} ({} bodies, {} verts, {} steps)",
            kind.name(),
            scenario.bodies.len(),
            scenario.vertex_count(),
            scenario.timesteps,
        );

        let metrics =
            BenchmarkRunner::run(&scenario).map_err(|e| format!("Benchmark failed: {e}"))?;

        println!("  Wall time:     {:.3}s", metrics.total_wall_time);
        println!("  Avg step:      {:.3}ms", metrics.avg_step_time * 1000.0);
        println!("  Avg Newton:    {:.2}", metrics.avg_newton_iterations);
        println!("  Final KE:      {:.6e}", metrics.final_kinetic_energy);
        println!("  Max displace:  {:.4}m", metrics.max_displacement);
        println!();

        all_metrics.push(metrics);
    }

    let csv = BenchmarkMetrics::to_csv(&all_metrics);
    if let Some(path) = output_path {
        std::fs::write(path, &csv)?;
        println!("Results written to: {path}");
    } else {
        println!("CSV Output:");
        println!("{csv}");
    }

    Ok(())
}

/// List the material presets.
pub fn materials() -> CliResult {
    let db = MaterialDatabase::with_defaults();
    println!("{:<10} {:>12} {:>12}", "name", "density", "stiffness");
    for name in db.names() {
        if let Some(props) = db.get(name) {
            println!("{:<10} {:>12.1} {:>12.3e}", name, props.density, props.stiffness);
        }
    }
    Ok(())
}

/// Validate a simulation config.
pub fn validate(path: &str) -> CliResult {
    println!("ABD Validator");
    println!("─────────────");
    println!();

    if !path.ends_with(".toml") {
        return Err(format!("Unsupported file type: {path} (expected a .toml config)").into());
    }

    println!("Validating config: {path}");
    let config = SimulationConfig::load(path)?;
    println!("  timestep:          {}", config.timestep);
    println!("  gravity:           {:?}", config.gravity);
    println!("  contact stiffness: {:e}", config.contact_stiffness);
    println!("  contact threshold: {}", config.contact_threshold);
    println!("  linear solver:     {:?}", config.newton.linear_solver);
    println!("Config is valid.");
    Ok(())
}
