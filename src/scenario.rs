//! Scenario bundles
//!
//! A [`Scenario`] is everything a world needs at construction: timestep,
//! bounds, collision and settling rules, force laws in evaluation order,
//! magnets, explicit bodies and seeded body generators. Scenarios load from
//! JSON and the built-in demos are available through [`ScenarioKind`].

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{DIPOLE_COUPLING, DIPOLE_CUTOFF, SIM_DT};
use crate::sim::body::{Angular, AxisLock, Body, BodyId, BodyTag, Dipole, Pivot, Tether};
use crate::sim::collision::{Boundary, CollisionConfig, CollisionPolicy};
use crate::sim::error::ConfigError;
use crate::sim::force::{BodyFilter, ForceLaw, Magnet};
use crate::sim::integrator::SettlingConfig;

/// Body tags used by the built-in scenarios
pub mod tags {
    use crate::sim::body::BodyTag;

    pub const BALL: BodyTag = BodyTag(1);
    pub const SUN: BodyTag = BodyTag(2);
    pub const PLANET: BodyTag = BodyTag(3);
    pub const BOB: BodyTag = BodyTag(4);
    pub const UPPER_BOB: BodyTag = BodyTag(5);
    pub const LOWER_BOB: BodyTag = BodyTag(6);
    pub const FILING: BodyTag = BodyTag(7);
    pub const BLOCK: BodyTag = BodyTag(8);
}

/// Built-in demo scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    BouncingBalls,
    ElasticCollision,
    OrbitingPlanets,
    SpringMass,
    MagneticFilings,
    TowerCollapse,
    Pendulum,
    DoublePendulum,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 8] = [
        ScenarioKind::BouncingBalls,
        ScenarioKind::ElasticCollision,
        ScenarioKind::OrbitingPlanets,
        ScenarioKind::SpringMass,
        ScenarioKind::MagneticFilings,
        ScenarioKind::TowerCollapse,
        ScenarioKind::Pendulum,
        ScenarioKind::DoublePendulum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioKind::BouncingBalls => "bouncing_balls",
            ScenarioKind::ElasticCollision => "elastic_collision",
            ScenarioKind::OrbitingPlanets => "orbiting_planets",
            ScenarioKind::SpringMass => "spring_mass",
            ScenarioKind::MagneticFilings => "magnetic_filings",
            ScenarioKind::TowerCollapse => "tower_collapse",
            ScenarioKind::Pendulum => "pendulum",
            ScenarioKind::DoublePendulum => "double_pendulum",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "bouncing_balls" | "bouncing" => Some(ScenarioKind::BouncingBalls),
            "elastic_collision" | "elastic" => Some(ScenarioKind::ElasticCollision),
            "orbiting_planets" | "orbits" => Some(ScenarioKind::OrbitingPlanets),
            "spring_mass" | "spring" => Some(ScenarioKind::SpringMass),
            "magnetic_filings" | "magnets" => Some(ScenarioKind::MagneticFilings),
            "tower_collapse" | "tower" => Some(ScenarioKind::TowerCollapse),
            "pendulum" => Some(ScenarioKind::Pendulum),
            "double_pendulum" => Some(ScenarioKind::DoublePendulum),
            _ => None,
        }
    }
}

/// Closed interval to sample from; `min == max` is a fixed value
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub const fn fixed(value: f64) -> Self {
        Self { min: value, max: value }
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    fn sample(&self, rng: &mut Pcg32) -> f64 {
        if self.max > self.min {
            rng.random_range(self.min..self.max)
        } else {
            self.min
        }
    }
}

/// Seeded body layouts, expanded at construction and on every reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Generator {
    /// `count` copies of `template` at random positions and velocities
    Scatter {
        count: usize,
        template: Body,
        x: Span,
        y: Span,
        #[serde(default)]
        vx: Span,
        #[serde(default)]
        vy: Span,
        /// Give each dipole a uniformly random orientation
        #[serde(default)]
        random_dipole_angle: bool,
    },
    /// Layers of touching circles standing on `base_y`, with small
    /// position, tilt and restitution imperfections
    Tower {
        center_x: f64,
        /// Center height of the lowest layer
        base_y: f64,
        width: f64,
        height: f64,
        layers: usize,
        radius: f64,
        /// Mass per 100 square units of bounding box
        density: f64,
        restitution: f64,
        #[serde(default)]
        damping: f64,
        /// Cycled per layer
        #[serde(default)]
        colors: Vec<u32>,
        #[serde(default)]
        tag: BodyTag,
    },
}

impl Generator {
    pub fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let fail = |reason| Err(ConfigError::InvalidGenerator { index, reason });
        match self {
            Generator::Scatter { x, y, vx, vy, .. } => {
                if ![x, y, vx, vy].iter().all(|s| s.is_valid()) {
                    return fail("ranges must be finite with min <= max");
                }
            }
            Generator::Tower {
                center_x,
                base_y,
                width,
                height,
                layers,
                radius,
                density,
                restitution,
                damping,
                ..
            } => {
                if !(center_x.is_finite() && base_y.is_finite()) {
                    return fail("tower position must be finite");
                }
                if *layers == 0 {
                    return fail("tower needs at least one layer");
                }
                if !(*radius > 0.0 && radius.is_finite()) {
                    return fail("block radius must be positive");
                }
                if !(*width >= 2.0 * radius && width.is_finite() && *height > 0.0 && height.is_finite()) {
                    return fail("tower must be at least one block wide and have positive height");
                }
                if !(*density > 0.0 && density.is_finite()) {
                    return fail("density must be positive");
                }
                if !(0.0..=1.0).contains(restitution) || !(0.0..=1.0).contains(damping) {
                    return fail("restitution and damping must be between 0.0 and 1.0");
                }
            }
        }
        Ok(())
    }

    fn generate(&self, rng: &mut Pcg32, out: &mut Vec<Body>) {
        match self {
            Generator::Scatter {
                count,
                template,
                x,
                y,
                vx,
                vy,
                random_dipole_angle,
            } => {
                for _ in 0..*count {
                    let mut body = template.clone();
                    body.pos = DVec2::new(x.sample(rng), y.sample(rng));
                    body.vel = DVec2::new(vx.sample(rng), vy.sample(rng));
                    if *random_dipole_angle {
                        if let Some(dipole) = body.dipole.as_mut() {
                            dipole.angle = rng.random_range(0.0..TAU);
                        }
                    }
                    out.push(body);
                }
            }
            Generator::Tower {
                center_x,
                base_y,
                width,
                height,
                layers,
                radius,
                density,
                restitution,
                damping,
                colors,
                tag,
            } => {
                let diameter = 2.0 * radius;
                let per_layer = ((width / diameter).floor() as usize).max(1);
                let spacing = height / *layers as f64;
                let mass = diameter * diameter * density / 100.0;
                let left = center_x - width / 2.0;

                for layer in 0..*layers {
                    let color = if colors.is_empty() {
                        0xFFFFFF
                    } else {
                        colors[layer % colors.len()]
                    };
                    for i in 0..per_layer {
                        let x = left + i as f64 * diameter + radius + rng.random_range(-1.0..1.0);
                        let y = base_y - layer as f64 * spacing + rng.random_range(-0.5..0.5);
                        let tilt = rng.random_range(-0.03..0.03);
                        let e = (restitution * rng.random_range(0.95..1.05)).min(1.0);
                        out.push(
                            Body::new(DVec2::new(x, y), mass, *radius)
                                .with_restitution(e)
                                .with_damping(*damping)
                                .with_angular(Angular::at(tilt))
                                .with_color(color)
                                .with_tag(*tag),
                        );
                    }
                }
            }
        }
    }
}

/// Declarative configuration consumed at world construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Seed for the generators; ticks never draw random numbers
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub bounds: Option<Boundary>,
    #[serde(default)]
    pub collisions: CollisionConfig,
    #[serde(default)]
    pub settling: SettlingConfig,
    /// Evaluated in this order every tick
    #[serde(default)]
    pub laws: Vec<ForceLaw>,
    #[serde(default)]
    pub magnets: Vec<Magnet>,
    /// Explicit bodies; they receive ids 1.. in order, before generated ones
    #[serde(default)]
    pub bodies: Vec<Body>,
    #[serde(default)]
    pub generators: Vec<Generator>,
    /// Number of lowest bodies the stability index is measured over
    #[serde(default)]
    pub stability_base: Option<usize>,
}

fn default_dt() -> f64 {
    SIM_DT
}

impl Default for Scenario {
    fn default() -> Self {
        Self::empty("custom")
    }
}

impl Scenario {
    /// No bodies, no laws, no bounds
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dt: SIM_DT,
            seed: 0,
            bounds: None,
            collisions: CollisionConfig::default(),
            settling: SettlingConfig::default(),
            laws: Vec::new(),
            magnets: Vec::new(),
            bodies: Vec::new(),
            generators: Vec::new(),
            stability_base: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject anything the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(ConfigError::InvalidTimestep(self.dt));
        }
        if let Some(bounds) = &self.bounds {
            bounds.validate()?;
        }
        self.collisions.validate()?;
        if !(self.settling.speed_threshold >= 0.0 && self.settling.speed_threshold.is_finite()) {
            return Err(ConfigError::InvalidSettling("speed threshold must be non-negative"));
        }
        if !(0.0..=1.0).contains(&self.settling.horizontal_decay) {
            return Err(ConfigError::InvalidSettling("horizontal decay must be between 0.0 and 1.0"));
        }
        for (i, law) in self.laws.iter().enumerate() {
            law.validate(i)?;
        }
        for (i, magnet) in self.magnets.iter().enumerate() {
            magnet.validate(i)?;
        }
        for (i, body) in self.bodies.iter().enumerate() {
            body.validate(i)?;
        }
        for (i, generator) in self.generators.iter().enumerate() {
            generator.validate(i)?;
        }
        Ok(())
    }

    /// Explicit bodies followed by every generator's output, seeded from `seed`
    pub fn build_bodies(&self) -> Vec<Body> {
        let mut rng = Pcg32::seed_from_u64(self.seed);
        let mut bodies = self.bodies.clone();
        for generator in &self.generators {
            generator.generate(&mut rng, &mut bodies);
        }
        bodies
    }

    /// Parse and validate a scenario from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let scenario: Scenario = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a built-in scenario by name
    pub fn named(name: &str) -> Result<Self, ConfigError> {
        ScenarioKind::from_str(name)
            .map(Self::preset)
            .ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))
    }

    pub fn preset(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::BouncingBalls => bouncing_balls(),
            ScenarioKind::ElasticCollision => elastic_collision(),
            ScenarioKind::OrbitingPlanets => orbiting_planets(),
            ScenarioKind::SpringMass => spring_mass(),
            ScenarioKind::MagneticFilings => magnetic_filings(),
            ScenarioKind::TowerCollapse => tower_collapse(),
            ScenarioKind::Pendulum => pendulum(),
            ScenarioKind::DoublePendulum => double_pendulum(),
        }
    }
}

/// Balls dropped in an 800x600 window with a floor 20 px above the bottom.
/// Velocities are given in m/s and converted with `pixels_per_meter`.
struct BallDrop {
    count: usize,
    pixels_per_meter: f64,
    drop_height_m: f64,
    vx: Span,
    vy: Span,
    dt: f64,
    policy: CollisionPolicy,
}

const DROP_WIDTH: f64 = 800.0;
const DROP_FLOOR: f64 = 580.0;
const BALL_RADIUS: f64 = 10.0;
const BALL_COLOR: u32 = 0x00008B;
const GRAVITY: f64 = 9.8;

fn ball_drop(name: &str, drop: BallDrop) -> Scenario {
    let ppm = drop.pixels_per_meter;
    let template = Body::new(DVec2::ZERO, 1.0, BALL_RADIUS)
        .with_restitution(0.8)
        .with_color(BALL_COLOR)
        .with_tag(tags::BALL);
    let y = DROP_FLOOR - drop.drop_height_m * ppm;

    Scenario {
        dt: drop.dt,
        bounds: Some(Boundary::new(DVec2::ZERO, DVec2::new(DROP_WIDTH, DROP_FLOOR))),
        collisions: CollisionConfig::with_policy(drop.policy),
        settling: SettlingConfig {
            enabled: true,
            speed_threshold: 0.5 * ppm,
            ..SettlingConfig::default()
        },
        laws: vec![ForceLaw::UniformGravity {
            g: GRAVITY * ppm,
            filter: BodyFilter::All,
        }],
        generators: vec![Generator::Scatter {
            count: drop.count,
            template,
            x: Span::new(50.0, DROP_WIDTH - 50.0),
            y: Span::fixed(y),
            vx: Span::new(drop.vx.min * ppm, drop.vx.max * ppm),
            vy: Span::new(drop.vy.min * ppm, drop.vy.max * ppm),
            random_dipole_angle: false,
        }],
        ..Scenario::empty(name)
    }
}

fn bouncing_balls() -> Scenario {
    ball_drop(
        ScenarioKind::BouncingBalls.as_str(),
        BallDrop {
            count: 15,
            pixels_per_meter: 17.0,
            drop_height_m: 10.0,
            vx: Span::new(-15.0, 15.0),
            vy: Span::new(10.0, 40.0),
            dt: 0.02,
            policy: CollisionPolicy::VelocityExchange,
        },
    )
}

fn elastic_collision() -> Scenario {
    ball_drop(
        ScenarioKind::ElasticCollision.as_str(),
        BallDrop {
            count: 10,
            pixels_per_meter: 50.0,
            drop_height_m: 5.0,
            vx: Span::new(-3.0, 3.0),
            vy: Span::new(1.0, 5.0),
            dt: 0.016,
            policy: CollisionPolicy::Elastic,
        },
    )
}

/// Sun at the origin, planets on the +x axis moving in +y; SI units
fn orbiting_planets() -> Scenario {
    // (distance m, mass kg, speed m/s, display radius, color)
    const PLANETS: [(f64, f64, f64, f64, u32); 8] = [
        (5.79e10, 3.285e23, 47.87e3, 5.0, 0xA9A9A9),
        (1.082e11, 4.867e24, 35.02e3, 7.0, 0xFF8C00),
        (1.496e11, 5.972e24, 29.78e3, 8.0, 0x6495ED),
        (2.279e11, 6.39e23, 24.07e3, 6.0, 0xFF4500),
        (7.785e11, 1.898e27, 13.07e3, 12.0, 0x8B4513),
        (1.429e12, 5.683e26, 9.69e3, 10.0, 0xADD8E6),
        (1.8e12, 8.681e25, 6.81e3, 11.0, 0x40E0D0),
        (2.2e12, 1.024e26, 5.43e3, 9.0, 0x00008B),
    ];

    let mut bodies = vec![
        Body::new(DVec2::ZERO, 1.989e30, 15.0)
            .with_color(0xFFCC00)
            .with_tag(tags::SUN)
            .pinned(),
    ];
    bodies.extend(PLANETS.iter().map(|&(distance, mass, speed, radius, color)| {
        Body::new(DVec2::new(distance, 0.0), mass, radius)
            .with_velocity(DVec2::new(0.0, speed))
            .with_color(color)
            .with_tag(tags::PLANET)
    }));

    Scenario {
        dt: 3600.0,
        laws: vec![ForceLaw::MutualGravity {
            g_const: 6.67430e-11,
            sources: BodyFilter::Tag(tags::SUN),
            filter: BodyFilter::Tag(tags::PLANET),
        }],
        bodies,
        ..Scenario::empty(ScenarioKind::OrbitingPlanets.as_str())
    }
}

/// Vertical bob on a spring, frame units (dt = 1)
fn spring_mass() -> Scenario {
    let anchor = DVec2::new(400.0, 200.0);
    Scenario {
        dt: 1.0,
        laws: vec![
            ForceLaw::Spring {
                anchor,
                k: 0.05,
                rest_length: 0.0,
                filter: BodyFilter::All,
            },
            ForceLaw::UniformGravity {
                g: GRAVITY,
                filter: BodyFilter::All,
            },
        ],
        bodies: vec![
            Body::new(anchor + DVec2::new(0.0, 50.0), 2.0, 20.0)
                .with_damping(0.02)
                .with_axis_lock(AxisLock::Vertical)
                .with_color(0xFF0000),
        ],
        ..Scenario::empty(ScenarioKind::SpringMass.as_str())
    }
}

/// 1000 filings around a bar magnet; a second, reversed magnet starts disabled
fn magnetic_filings() -> Scenario {
    let dt = SIM_DT;
    // Filings keep 70% of their velocity per 60 Hz step
    let damping = 1.0 - 0.7_f64.powf(1.0 / dt);
    let template = Body::new(DVec2::ZERO, 1.0, 2.0)
        .with_restitution(0.1)
        .with_damping(damping)
        .with_angular(Angular::at(0.0))
        .with_dipole(Dipole {
            angle: 0.0,
            strength: 10.0,
            relaxation: 0.1 / dt,
        })
        .with_color(0xB4B4B4)
        .with_tag(tags::FILING);

    Scenario {
        dt,
        collisions: CollisionConfig {
            policy: CollisionPolicy::Elastic,
            pair_restitution: 0.1,
            ..CollisionConfig::default()
        },
        laws: vec![
            ForceLaw::MagneticField {
                force_scale: 0.5,
                filter: BodyFilter::All,
            },
            // Torque of 5 per step
            ForceLaw::AlignTorque {
                gain: 5.0 / dt,
                filter: BodyFilter::All,
            },
            ForceLaw::DipoleDipole {
                cutoff: DIPOLE_CUTOFF,
                coupling: DIPOLE_COUPLING,
                filter: BodyFilter::All,
            },
        ],
        magnets: vec![
            Magnet::new(DVec2::new(500.0, 400.0), 5000.0, 100.0, 30.0, true),
            Magnet::new(DVec2::new(350.0, 400.0), 5000.0, 100.0, 30.0, false).disabled(),
        ],
        generators: vec![Generator::Scatter {
            count: 1000,
            template,
            x: Span::new(100.0, 900.0),
            y: Span::new(100.0, 700.0),
            vx: Span::default(),
            vy: Span::default(),
            random_dipole_angle: true,
        }],
        ..Scenario::empty(ScenarioKind::MagneticFilings.as_str())
    }
}

/// Fifteen layers of circles on a floor at y = 750; wind starts calm
fn tower_collapse() -> Scenario {
    let floor = 750.0;
    let radius = 15.0;
    Scenario {
        dt: SIM_DT,
        bounds: Some(Boundary::new(DVec2::ZERO, DVec2::new(1200.0, floor))),
        collisions: CollisionConfig {
            policy: CollisionPolicy::Elastic,
            pair_restitution: 0.2,
            ..CollisionConfig::default()
        },
        settling: SettlingConfig::enabled(),
        laws: vec![
            ForceLaw::UniformGravity {
                g: 981.0,
                filter: BodyFilter::All,
            },
            ForceLaw::Wind {
                strength: 0.0,
                direction: DVec2::X,
                filter: BodyFilter::All,
            },
        ],
        generators: vec![Generator::Tower {
            center_x: 600.0,
            base_y: floor - radius,
            width: 300.0,
            height: 500.0,
            layers: 15,
            radius,
            density: 5.0,
            restitution: 0.2,
            // Air keeps 90% of velocity per second
            damping: 0.1,
            colors: vec![0xDCAA64, 0xC89650, 0xB4823C],
            tag: tags::BLOCK,
        }],
        stability_base: Some(3),
        ..Scenario::empty(ScenarioKind::TowerCollapse.as_str())
    }
}

/// Single bob with air drag, frame units (dt = 1)
fn pendulum() -> Scenario {
    Scenario {
        dt: 1.0,
        laws: vec![ForceLaw::Pendulum {
            gravity: GRAVITY,
            drag: 0.02,
            filter: BodyFilter::All,
        }],
        bodies: vec![
            Body::new(DVec2::ZERO, 10.0, 15.0)
                .with_angular(Angular::at(FRAC_PI_4))
                .with_tether(Tether {
                    pivot: Pivot::Fixed(DVec2::new(400.0, 100.0)),
                    length: 200.0,
                })
                .with_color(0x000000)
                .with_tag(tags::BOB),
        ],
        ..Scenario::empty(ScenarioKind::Pendulum.as_str())
    }
}

/// Two bobs in series, both starting horizontal
fn double_pendulum() -> Scenario {
    let length = 150.0;
    Scenario {
        dt: 0.05,
        laws: vec![ForceLaw::DoublePendulum {
            gravity: 9.81,
            upper: tags::UPPER_BOB,
            lower: tags::LOWER_BOB,
        }],
        bodies: vec![
            Body::new(DVec2::ZERO, 5.0, 10.0)
                .with_angular(Angular::at(FRAC_PI_2))
                .with_tether(Tether {
                    pivot: Pivot::Fixed(DVec2::new(400.0, 200.0)),
                    length,
                })
                .with_color(0xFF0000)
                .with_tag(tags::UPPER_BOB),
            Body::new(DVec2::ZERO, 10.0, 10.0)
                .with_angular(Angular::at(FRAC_PI_2))
                .with_tether(Tether {
                    pivot: Pivot::Body(BodyId(1)),
                    length,
                })
                .with_color(0x0000FF)
                .with_tag(tags::LOWER_BOB),
        ],
        ..Scenario::empty(ScenarioKind::DoublePendulum.as_str())
    }
}
