use clap::{Parser, Subcommand};

use riftcam::geometry::{self, SolidProperties};

/// Volume, surface area and diagonal calculator for common solids.
#[derive(Parser, Debug)]
#[command(name = "shapecalc", version, about)]
struct Args {
    #[command(subcommand)]
    shape: Shape,
}

#[derive(Subcommand, Debug)]
enum Shape {
    /// Sphere of a given radius.
    Sphere {
        #[arg(long)]
        radius: f64,
    },
    /// Cube of a given side length.
    Cube {
        #[arg(long)]
        side: f64,
    },
    /// Rectangular box.
    Cuboid {
        #[arg(long)]
        length: f64,
        #[arg(long)]
        width: f64,
        #[arg(long)]
        height: f64,
    },
    /// Right circular cylinder.
    Cylinder {
        #[arg(long)]
        radius: f64,
        #[arg(long)]
        height: f64,
    },
    /// Half sphere, flat side down.
    Hemisphere {
        #[arg(long)]
        radius: f64,
    },
    /// Right circular cone.
    Cone {
        #[arg(long)]
        radius: f64,
        #[arg(long)]
        height: f64,
    },
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let (name, result) = match args.shape {
        Shape::Sphere { radius } => ("Sphere", geometry::sphere(radius)),
        Shape::Cube { side } => ("Cube", geometry::cube(side)),
        Shape::Cuboid {
            length,
            width,
            height,
        } => ("Cuboid", geometry::cuboid(length, width, height)),
        Shape::Cylinder { radius, height } => ("Cylinder", geometry::cylinder(radius, height)),
        Shape::Hemisphere { radius } => ("Hemisphere", geometry::hemisphere(radius)),
        Shape::Cone { radius, height } => ("Cone", geometry::cone(radius, height)),
    };

    match result {
        Ok(properties) => print_properties(name, &properties),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    }
}

fn print_properties(name: &str, p: &SolidProperties) {
    println!("Results for {name}:");
    println!("  Volume:             {:.4}", p.volume);
    if let Some(lateral) = p.lateral_area {
        println!("  Lateral area:       {lateral:.4}");
    }
    println!("  Total surface area: {:.4}", p.total_area);
    if let Some(diagonal) = p.diagonal {
        println!("  Diagonal:           {diagonal:.4}");
    }
    if let Some(slant) = p.slant_height {
        println!("  Slant height:       {slant:.4}");
    }
}
