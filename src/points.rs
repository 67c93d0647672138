use glam::Vec2;
use rand::Rng;

use crate::poisson::sample_points;

/// Upper bound on interior samples for a single terrain
pub const POISSON_POINT_LIMIT: usize = 200_000;

/// Build the point cloud the terrain is triangulated from
///
/// Interior Poisson samples are centered on the origin. Around them
/// `extension_steps` rectangular rings are added with growing spacing, so the
/// outer triangles of the region are well formed rather than long slivers
/// along the convex hull.
///
/// # Arguments
/// * `radius` - Minimum distance between interior points
/// * `region` - Width and depth of the sampled area
/// * `extension_steps` - Number of boundary rings
/// * `rng` - Random source for the interior samples
///
/// # Returns
/// * `Vec<Vec2>` - Interior points followed by ring points, ring by ring
pub fn generate_points<R: Rng>(
    radius: f32,
    region: Vec2,
    extension_steps: u32,
    rng: &mut R,
) -> Vec<Vec2> {
    let half_region = region / 2.0;
    let mut points: Vec<Vec2> = sample_points(radius, region, POISSON_POINT_LIMIT, rng)
        .into_iter()
        .map(|p| p - half_region)
        .collect();

    let mut growth = radius;
    for step in 1..=extension_steps {
        let spacing = radius * (step + 1) as f32;
        add_rectangle_points(&mut points, region + Vec2::splat(growth), spacing);
        growth += radius * step as f32 * 4.0;
    }

    points
}

/// Add evenly spaced points along the outline of an origin-centered rectangle
///
/// Horizontal edges include the corners, vertical edges skip them so that
/// no corner is emitted twice.
///
/// # Arguments
/// * `points` - Output list to append to
/// * `size` - Width and depth of the rectangle
/// * `spacing` - Target distance between neighbouring ring points
pub fn add_rectangle_points(points: &mut Vec<Vec2>, size: Vec2, spacing: f32) {
    let steps_x = ((size.x / spacing) as u32).max(1);
    let steps_y = ((size.y / spacing) as u32).max(1);

    let bottom_left = -size / 2.0;
    let top_right = size / 2.0;
    let bottom_right = Vec2::new(top_right.x, bottom_left.y);
    let top_left = Vec2::new(bottom_left.x, top_right.y);

    for i in 0..=steps_x {
        let t = i as f32 / steps_x as f32;
        points.push(bottom_left.lerp(bottom_right, t));
        points.push(top_left.lerp(top_right, t));
    }

    for i in 1..steps_y {
        let t = i as f32 / steps_y as f32;
        points.push(bottom_left.lerp(top_left, t));
        points.push(bottom_right.lerp(top_right, t));
    }
}
