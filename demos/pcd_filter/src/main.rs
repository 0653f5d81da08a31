use argh::FromArgs;
use std::path::PathBuf;

use kornia_pcl::{AxisAlignedBoundingBox, Pipeline, PipelineConfig, PointCloud};
use rand::Rng;

#[derive(FromArgs)]
/// Crop, downsample and denoise a synthetic point cloud
struct Args {
    /// path to a JSON pipeline configuration
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// number of points on the synthetic surface
    #[argh(option, short = 'n', default = "200000")]
    num_points: usize,

    /// number of uniformly scattered noise points
    #[argh(option, default = "2000")]
    num_noise: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config = match &args.config {
        Some(path) => PipelineConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => PipelineConfig::default(),
    };
    log::info!("pipeline configuration:\n{}", config.to_json()?);

    let pointcloud = synthetic_pointcloud(&config, args.num_points, args.num_noise);

    let mut pipeline = Pipeline::new(pointcloud);
    println!("Number of points before filtering: {}", pipeline.num_points());

    pipeline.crop(config.crop.min, config.crop.max)?;
    println!(
        "Number of points in cloud BEFORE voxel grid filter: {}",
        pipeline.num_points()
    );

    pipeline.voxel_downsample(config.voxel.voxel_size)?;
    println!(
        "Number of points in cloud AFTER voxel grid filter: {}",
        pipeline.num_points()
    );

    pipeline.remove_radius_outliers(config.outlier.min_neighbors, config.outlier.radius)?;
    println!(
        "Number of points after radius outlier removal: {}",
        pipeline.num_points()
    );

    if let Some(bounds) = AxisAlignedBoundingBox::from_pointcloud(pipeline.pointcloud()) {
        log::info!(
            "filtered cloud spans {:?} -> {:?}",
            bounds.min(),
            bounds.max()
        );
    }

    for warning in pipeline.warnings() {
        log::warn!("{warning:?}");
    }

    Ok(())
}

/// A wavy surface spanning the crop region, half of it outside, plus uniform noise.
fn synthetic_pointcloud(config: &PipelineConfig, num_points: usize, num_noise: usize) -> PointCloud {
    let mut rng = rand::rng();
    let [min_x, min_y, min_z] = config.crop.min;
    let [max_x, max_y, max_z] = config.crop.max;
    let (width, height, depth) = (max_x - min_x, max_y - min_y, max_z - min_z);
    let mid_z = min_z + 0.5 * depth;
    // a flat crop along x leaves nothing to wave across
    let wave_scale = if width > 0.0 { std::f64::consts::TAU / width } else { 0.0 };

    let mut points = Vec::with_capacity(num_points + num_noise);
    for _ in 0..num_points {
        let x = min_x - 0.5 * width + rng.random_range(0.0..2.0) * width;
        let y = min_y + rng.random_range(0.0..1.0) * height;
        let z = mid_z + 0.1 * depth * (x * wave_scale).sin();
        points.push([x, y, z]);
    }
    for _ in 0..num_noise {
        points.push([
            min_x + rng.random_range(0.0..1.0) * width,
            min_y + rng.random_range(0.0..1.0) * height,
            min_z + rng.random_range(0.0..1.0) * depth,
        ]);
    }

    PointCloud::from_points(points)
}
