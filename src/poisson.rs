use std::collections::HashMap;

use glam::Vec2;
use rand::Rng;

/// Candidates tried around an active point before it is retired
const SAMPLE_ATTEMPTS: u32 = 30;

/// Generate Poisson disc samples inside a rectangle
///
/// Starts from the center of the region and grows outward, trying
/// candidates in the annulus between `radius` and `2 * radius` around each
/// active point. An acceptance grid with cells of `radius / sqrt(2)` keeps
/// each distance check to a 5x5 cell neighbourhood.
///
/// # Arguments
/// * `radius` - Minimum distance between any two returned points
/// * `region` - Size of the rectangle, points lie in `[0, region.x) x [0, region.y)`
/// * `limit` - Maximum number of points to return
/// * `rng` - Random source, the result is fully determined by its state
///
/// # Returns
/// * `Vec<Vec2>` - Sample points in acceptance order
pub fn sample_points<R: Rng>(radius: f32, region: Vec2, limit: usize, rng: &mut R) -> Vec<Vec2> {
    if !(radius > 0.0 && region.x > 0.0 && region.y > 0.0) || limit == 0 {
        return Vec::new();
    }

    let cell_size = radius / std::f32::consts::SQRT_2;

    // Each occupied cell holds one point, stored as an index into `points`.
    // Cells are keyed sparsely so memory follows the point count, not the region.
    let mut grid: HashMap<Cell, usize> = HashMap::new();
    let mut points: Vec<Vec2> = Vec::new();
    let mut active: Vec<Vec2> = vec![region / 2.0];

    while !active.is_empty() && points.len() < limit {
        let active_index = rng.gen_range(0..active.len());
        let centre = active[active_index];

        let mut accepted = false;
        for _ in 0..SAMPLE_ATTEMPTS {
            let angle = rng.r#gen::<f32>() * std::f32::consts::TAU;
            let distance = rng.gen_range(radius..2.0 * radius);
            let candidate = centre + Vec2::new(angle.cos(), angle.sin()) * distance;

            if is_valid(candidate, radius, region, &points, &grid, cell_size) {
                grid.insert(cell_of(candidate, cell_size), points.len());
                points.push(candidate);
                active.push(candidate);
                accepted = true;
                break;
            }
        }

        if !accepted {
            active.swap_remove(active_index);
        }
    }

    points
}

/// Column and row of an acceptance grid cell
type Cell = (i64, i64);

fn cell_of(p: Vec2, cell_size: f32) -> Cell {
    ((p.x / cell_size).floor() as i64, (p.y / cell_size).floor() as i64)
}

/// Check that a candidate lies in the region and keeps its distance from accepted points
fn is_valid(
    candidate: Vec2,
    radius: f32,
    region: Vec2,
    points: &[Vec2],
    grid: &HashMap<Cell, usize>,
    cell_size: f32,
) -> bool {
    if candidate.x < 0.0 || candidate.y < 0.0 || candidate.x >= region.x || candidate.y >= region.y {
        return false;
    }

    let radius_squared = radius * radius;
    let (cell_x, cell_y) = cell_of(candidate, cell_size);

    for y in cell_y - 2..=cell_y + 2 {
        for x in cell_x - 2..=cell_x + 2 {
            if let Some(&index) = grid.get(&(x, y)) {
                if points[index].distance_squared(candidate) < radius_squared {
                    return false;
                }
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sample(seed: u64, radius: f32, region: Vec2, limit: usize) -> Vec<Vec2> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        sample_points(radius, region, limit, &mut rng)
    }

    #[test]
    fn test_points_maintain_minimum_distance() {
        let radius = 2.0;
        let points = sample(123, radius, Vec2::new(60.0, 40.0), 100_000);

        for (i, a) in points.iter().enumerate() {
            for (j, b) in points.iter().enumerate().skip(i + 1) {
                let distance = a.distance(*b);
                assert!(
                    distance >= radius - 1e-4,
                    "Points {i} and {j} are too close: distance={distance}, min={radius}"
                );
            }
        }
    }

    #[test]
    fn test_points_within_region() {
        let region = Vec2::new(30.0, 50.0);
        let points = sample(99, 1.5, region, 100_000);

        for p in &points {
            assert!(
                p.x >= 0.0 && p.y >= 0.0 && p.x < region.x && p.y < region.y,
                "Point {p} is outside region {region}"
            );
        }
    }

    #[test]
    fn test_region_is_densely_filled() {
        // A 40x40 area at radius 1 holds well over 600 points when saturated
        let points = sample(42, 1.0, Vec2::new(40.0, 40.0), 100_000);
        assert!(points.len() > 600, "Expected a dense fill, got {}", points.len());
    }

    #[test]
    fn test_limit_is_respected() {
        let points = sample(5, 1.0, Vec2::new(100.0, 100.0), 50);
        assert_eq!(points.len(), 50);
    }

    #[test]
    fn test_same_seed_same_points() {
        let a = sample(11, 1.0, Vec2::new(20.0, 20.0), 1000);
        let b = sample(11, 1.0, Vec2::new(20.0, 20.0), 1000);
        assert_eq!(a, b);
    }

    #[test]
    fn test_huge_region_is_bounded_by_limit() {
        // Roughly 2e12 grid cells, only the occupied ones may be stored
        let radius = 0.1;
        let points = sample(8, radius, Vec2::new(1e5, 1e5), 500);
        assert_eq!(points.len(), 500);

        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                assert!(a.distance(*b) >= radius - 1e-3);
            }
        }
    }

    #[test]
    fn test_degenerate_input_is_empty() {
        assert!(sample(1, 0.0, Vec2::new(10.0, 10.0), 10).is_empty());
        assert!(sample(1, 1.0, Vec2::new(0.0, 10.0), 10).is_empty());
    }
}
