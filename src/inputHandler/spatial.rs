// Navigation algorithms for calculating cursor movement
//
// Everything here is a pure function of (layout, elements, current index, direction).

use super::types::{Direction, LayoutMode, ListDirection, Rect};

/// Outcome of a single directional step inside one domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavStep {
    Next(usize),
    /// Edge of the domain in that direction
    Boundary,
    /// Direction has no meaning for the layout; not even a boundary
    Ignored,
}

/// Compute the next index for any layout mode.
///
/// `elements` holds the bounds of every element in navigation order; only the
/// spatial layout looks at them.
pub fn next_index(
    layout: &LayoutMode,
    elements: &[Option<Rect>],
    current_index: usize,
    direction: Direction,
    perpendicular_weight: f64,
) -> NavStep {
    match layout {
        LayoutMode::List { direction: list } => {
            navigate_list(current_index, elements.len(), *list, direction)
        }
        LayoutMode::Grid { columns } => {
            match navigate_grid(current_index, elements.len(), *columns, direction) {
                Some(index) => NavStep::Next(index),
                None => NavStep::Boundary,
            }
        }
        LayoutMode::Spatial => {
            match navigate_spatial(elements, current_index, direction, perpendicular_weight) {
                Some(index) => NavStep::Next(index),
                None => NavStep::Boundary,
            }
        }
    }
}

/// Calculate the best next candidate to navigate to based on direction
pub fn find_nearest_in_direction<K: Clone>(
    current_bounds: &Rect,
    candidates: &[(K, Rect)],
    direction: Direction,
    perpendicular_weight: f64,
) -> Option<K> {
    let (dx, dy) = direction.direction_vector();
    let (current_x, current_y) = current_bounds.center();

    candidates
        .iter()
        .filter(|(_, bounds)| {
            let (target_x, target_y) = bounds.center();
            is_in_direction(current_x, current_y, target_x, target_y, dx, dy)
        })
        .map(|(key, bounds)| {
            let (target_x, target_y) = bounds.center();
            let score = calculate_directional_distance(
                current_x,
                current_y,
                target_x,
                target_y,
                direction,
                perpendicular_weight,
            );
            (key, score)
        })
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(key, _)| key.clone())
}

/// Check if target point is in the direction from current point
fn is_in_direction(
    current_x: f64,
    current_y: f64,
    target_x: f64,
    target_y: f64,
    direction_x: f64,
    direction_y: f64,
) -> bool {
    let to_target_x = target_x - current_x;
    let to_target_y = target_y - current_y;

    // Strictly forward: purely orthogonal or backward targets are excluded
    let dot_product = to_target_x * direction_x + to_target_y * direction_y;
    dot_product > 0.0
}

/// Calculate distance with directional weighting.
/// Off-axis offset costs more than distance along the axis.
fn calculate_directional_distance(
    current_x: f64,
    current_y: f64,
    target_x: f64,
    target_y: f64,
    direction: Direction,
    perpendicular_weight: f64,
) -> f64 {
    let to_target_x = target_x - current_x;
    let to_target_y = target_y - current_y;

    let direct_distance = (to_target_x.powi(2) + to_target_y.powi(2)).sqrt();

    let perpendicular_distance = if direction.is_vertical() {
        to_target_x.abs()
    } else {
        to_target_y.abs()
    };

    direct_distance + perpendicular_distance * perpendicular_weight
}

/// Navigate in spatial layout; elements without bounds are never candidates
pub fn navigate_spatial(
    elements: &[Option<Rect>],
    current_index: usize,
    direction: Direction,
    perpendicular_weight: f64,
) -> Option<usize> {
    let current_bounds = (*elements.get(current_index)?)?;

    let candidates: Vec<(usize, Rect)> = elements
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != current_index)
        .filter_map(|(idx, bounds)| bounds.map(|b| (idx, b)))
        .collect();

    find_nearest_in_direction(&current_bounds, &candidates, direction, perpendicular_weight)
}

/// Navigate in grid layout (row-major, no wrap)
pub fn navigate_grid(
    current_index: usize,
    total_elements: usize,
    columns: usize,
    direction: Direction,
) -> Option<usize> {
    if total_elements == 0 || columns == 0 || current_index >= total_elements {
        return None;
    }

    let current_col = current_index % columns;

    let candidate = match direction {
        Direction::Up => current_index.checked_sub(columns)?,
        Direction::Down => current_index.checked_add(columns)?,
        Direction::Left => {
            if current_col == 0 {
                return None;
            }
            current_index - 1
        }
        Direction::Right => {
            if current_col + 1 >= columns {
                return None;
            }
            current_index + 1
        }
    };

    // Short last rows: anything past the collection is a boundary
    (candidate < total_elements).then_some(candidate)
}

/// Navigate in list layout
pub fn navigate_list(
    current_index: usize,
    total_elements: usize,
    list_direction: ListDirection,
    direction: Direction,
) -> NavStep {
    let forward = match (list_direction, direction) {
        (ListDirection::Vertical, Direction::Up) | (ListDirection::Horizontal, Direction::Left) => {
            false
        }
        (ListDirection::Vertical, Direction::Down)
        | (ListDirection::Horizontal, Direction::Right) => true,
        // Other directions don't navigate in list mode
        _ => return NavStep::Ignored,
    };

    if current_index >= total_elements {
        return NavStep::Boundary;
    }

    if forward {
        if current_index + 1 < total_elements {
            NavStep::Next(current_index + 1)
        } else {
            NavStep::Boundary
        }
    } else if current_index > 0 {
        NavStep::Next(current_index - 1)
    } else {
        NavStep::Boundary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(x: f64, y: f64) -> Option<Rect> {
        Some(Rect::new(x, y, 10.0, 10.0))
    }

    #[test]
    fn test_grid_navigation() {
        // 3x3 grid (9 elements)
        let columns = 3;
        let total = 9;

        // From center (index 4), test all directions
        assert_eq!(navigate_grid(4, total, columns, Direction::Up), Some(1));
        assert_eq!(navigate_grid(4, total, columns, Direction::Down), Some(7));
        assert_eq!(navigate_grid(4, total, columns, Direction::Left), Some(3));
        assert_eq!(navigate_grid(4, total, columns, Direction::Right), Some(5));

        // Top row can't go up
        assert_eq!(navigate_grid(1, total, columns, Direction::Up), None);
        assert_eq!(navigate_grid(0, total, columns, Direction::Left), None);
        // No wrap from the end of a row
        assert_eq!(navigate_grid(2, total, columns, Direction::Right), None);
    }

    #[test]
    fn test_grid_short_last_row() {
        // 7 elements in 3 columns: last row holds only index 6
        assert_eq!(navigate_grid(5, 7, 3, Direction::Down), None);
        assert_eq!(navigate_grid(3, 7, 3, Direction::Down), Some(6));
        assert_eq!(navigate_grid(6, 7, 3, Direction::Right), None);
        assert_eq!(navigate_grid(6, 7, 3, Direction::Up), Some(3));
    }

    #[test]
    fn test_grid_degenerate_inputs() {
        assert_eq!(navigate_grid(0, 0, 3, Direction::Down), None);
        assert_eq!(navigate_grid(0, 4, 0, Direction::Down), None);
        assert_eq!(navigate_grid(9, 4, 2, Direction::Up), None);
    }

    #[test]
    fn test_grid_huge_column_count() {
        // One giant row: Down from anywhere but the start overflows usize
        assert_eq!(navigate_grid(1, 3, usize::MAX, Direction::Down), None);
        assert_eq!(navigate_grid(0, 3, usize::MAX, Direction::Down), None);
        assert_eq!(navigate_grid(1, 3, usize::MAX, Direction::Right), Some(2));
        assert_eq!(navigate_grid(1, 3, usize::MAX, Direction::Up), None);
    }

    #[test]
    fn test_vertical_list_navigation() {
        let total = 5;
        let v = ListDirection::Vertical;

        assert_eq!(navigate_list(2, total, v, Direction::Up), NavStep::Next(1));
        assert_eq!(navigate_list(2, total, v, Direction::Down), NavStep::Next(3));

        // Left/Right are silently ignored in a vertical list
        assert_eq!(navigate_list(2, total, v, Direction::Left), NavStep::Ignored);
        assert_eq!(navigate_list(2, total, v, Direction::Right), NavStep::Ignored);

        assert_eq!(navigate_list(0, total, v, Direction::Up), NavStep::Boundary);
        assert_eq!(navigate_list(4, total, v, Direction::Down), NavStep::Boundary);
    }

    #[test]
    fn test_horizontal_list_navigation() {
        let h = ListDirection::Horizontal;
        assert_eq!(navigate_list(0, 3, h, Direction::Right), NavStep::Next(1));
        assert_eq!(navigate_list(0, 3, h, Direction::Left), NavStep::Boundary);
        assert_eq!(navigate_list(1, 3, h, Direction::Up), NavStep::Ignored);
    }

    #[test]
    fn test_directional_filtering() {
        // Moving right (direction +1, 0)
        assert!(is_in_direction(0.0, 0.0, 5.0, 0.0, 1.0, 0.0)); // Directly right
        assert!(is_in_direction(0.0, 0.0, 5.0, 1.0, 1.0, 0.0)); // Slightly up-right
        assert!(!is_in_direction(0.0, 0.0, -5.0, 0.0, 1.0, 0.0)); // Left (wrong direction)
        assert!(!is_in_direction(0.0, 0.0, 0.0, 5.0, 1.0, 0.0)); // Orthogonal only
    }

    #[test]
    fn test_spatial_prefers_aligned_element() {
        let elements = vec![at(0.0, 0.0), at(100.0, 0.0), at(0.0, 100.0)];
        assert_eq!(navigate_spatial(&elements, 0, Direction::Right, 2.0), Some(1));
        assert_eq!(navigate_spatial(&elements, 0, Direction::Down, 2.0), Some(2));
        assert_eq!(navigate_spatial(&elements, 0, Direction::Left, 2.0), None);
    }

    #[test]
    fn test_spatial_aligned_beats_nearer_diagonal() {
        // Diagonal neighbour is closer in straight-line distance
        let elements = vec![at(0.0, 0.0), at(60.0, 60.0), at(120.0, 5.0)];
        assert_eq!(navigate_spatial(&elements, 0, Direction::Right, 2.0), Some(2));
    }

    #[test]
    fn test_spatial_without_current_bounds_is_boundary() {
        let elements = vec![None, at(100.0, 0.0)];
        assert_eq!(navigate_spatial(&elements, 0, Direction::Right, 2.0), None);
        assert_eq!(
            next_index(&LayoutMode::Spatial, &elements, 0, Direction::Right, 2.0),
            NavStep::Boundary
        );
    }

    fn any_direction() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Up),
            Just(Direction::Down),
            Just(Direction::Left),
            Just(Direction::Right),
        ]
    }

    proptest! {
        #[test]
        fn prop_list_steps_by_one_or_stops(total in 1usize..40, seed in 0usize..40, direction in any_direction()) {
            let current = seed % total;
            match navigate_list(current, total, ListDirection::Vertical, direction) {
                NavStep::Next(next) => {
                    prop_assert!(next < total);
                    prop_assert_eq!(next.abs_diff(current), 1);
                }
                NavStep::Boundary => {
                    prop_assert!(
                        (direction == Direction::Up && current == 0)
                            || (direction == Direction::Down && current == total - 1)
                    );
                }
                NavStep::Ignored => prop_assert!(!direction.is_vertical()),
            }
        }

        #[test]
        fn prop_grid_stays_in_bounds(total in 1usize..40, columns in 1usize..8, seed in 0usize..40, direction in any_direction()) {
            let current = seed % total;
            if let Some(next) = navigate_grid(current, total, columns, direction) {
                prop_assert!(next < total);
                let step = next.abs_diff(current);
                if direction.is_vertical() {
                    prop_assert_eq!(step, columns);
                } else {
                    prop_assert_eq!(step, 1);
                    prop_assert_eq!(next / columns, current / columns);
                }
            }
        }
    }
}
