//! Built-in example scenes

use clap::ValueEnum;
use isoform_core::prelude::*;
use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scene {
    /// Plain sphere of radius 30
    Sphere,
    /// Sphere of radius 30 with an off-axis hole
    DrilledSphere,
    /// Gyroid infill filling an 80 mm cube
    GyroidBlock,
    /// Extruded plate with two mounting holes and rounded edges
    Bracket,
    /// Revolved, hollow, slightly oval vase
    Vase,
    /// Square bar twisted a quarter turn along its length
    TwistedBar,
}

impl Scene {
    pub fn name(self) -> String {
        self.to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_default()
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Sphere => "sphere of radius 30",
            Self::DrilledSphere => "sphere of radius 30 minus a cylinder of radius 6 at x = -20",
            Self::GyroidBlock => "gyroid lattice clipped to [-40, 40]^3",
            Self::Bracket => "80 x 40 x 10 plate with two holes, filleted",
            Self::Vase => "revolved profile, shelled to 2 mm, squashed in Y",
            Self::TwistedBar => "20 x 20 x 100 bar twisted 90 degrees",
        }
    }

    /// Build the scene's field along with any warnings raised on the way
    pub fn build(self) -> Result<Diagnosed<Field>> {
        match self {
            Self::Sphere => sphere(Vec3::ZERO, 30.0).map(Diagnosed::clean),
            Self::DrilledSphere => {
                let ball = sphere(Vec3::ZERO, 30.0)?;
                let hole = cylinder(
                    Vec3::new(-20.0, 0.0, -20.0),
                    Vec3::new(-20.0, 0.0, 20.0),
                    6.0,
                )?;
                Ok(Diagnosed::clean(difference(ball, hole)))
            }
            Self::GyroidBlock => gyroid(Aabb::cube(40.0), 20.0, 2.0).map(Diagnosed::clean),
            Self::Bracket => bracket().map(Diagnosed::clean),
            Self::Vase => vase(),
            Self::TwistedBar => {
                let bar = box3(Vec3::ZERO, Vec3::new(20.0, 20.0, 100.0))?;
                twist(bar, TAU / 4.0 / 100.0).map(Diagnosed::clean)
            }
        }
    }
}

fn bracket() -> Result<Field> {
    let outline = Sketch::rectangle(Vec2::ZERO, Vec2::new(80.0, 40.0))?;
    let profile = [-25.0, 25.0]
        .into_iter()
        .try_fold(outline, |sketch, x| {
            sketch.push(SketchElement::Circle {
                center: Vec2::new(x, 0.0),
                radius: 5.0,
            })
        })?;
    let plate = extrude(profile, 10.0)?;
    fillet(plate, 2.0)
}

fn vase() -> Result<Diagnosed<Field>> {
    let profile = Sketch::polygon(&[
        Vec2::new(0.0, 0.0),
        Vec2::new(25.0, 0.0),
        Vec2::new(32.0, 35.0),
        Vec2::new(16.0, 80.0),
        Vec2::new(20.0, 100.0),
        Vec2::new(0.0, 100.0),
    ])?;
    let body = shell(revolve(profile)?, 2.0)?;
    scale(body, Vec3::new(1.0, 0.8, 1.0), Vec3::ZERO)
}
