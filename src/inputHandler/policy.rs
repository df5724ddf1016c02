// Pluggable policy for crossing from one domain into a neighbouring one
//
// Which domain sits next to which is an application layout concern, so the
// navigator only exposes the primitive and the caller supplies the policy.

use serde::Serialize;

use super::spatial::find_nearest_in_direction;
use super::types::{Direction, Rect};
use crate::config::ShellConfig;
use crate::state::window::WindowInstance;

/// What a policy can see when the cursor hits a domain edge
#[derive(Debug, Clone, Default, Serialize)]
pub struct Topology {
    pub left: Option<WindowInstance>,
    pub right: Option<WindowInstance>,
    /// Frames of every non-empty domain that reported bounds
    pub domain_frames: Vec<(String, Rect)>,
}

impl Topology {
    pub fn frame_of(&self, domain_id: &str) -> Option<Rect> {
        self.domain_frames
            .iter()
            .find(|(id, _)| id == domain_id)
            .map(|(_, rect)| *rect)
    }
}

pub trait BoundaryPolicy {
    /// Domain that should receive the cursor, or `None` to stay at the boundary
    fn neighbor(&self, active_domain: &str, direction: Direction, topology: &Topology)
        -> Option<String>;
}

impl<F> BoundaryPolicy for F
where
    F: Fn(&str, Direction, &Topology) -> Option<String>,
{
    fn neighbor(
        &self,
        active_domain: &str,
        direction: Direction,
        topology: &Topology,
    ) -> Option<String> {
        self(active_domain, direction, topology)
    }
}

/// Picks the nearest domain frame in the pressed direction
#[derive(Debug, Clone, Copy)]
pub struct SpatialAdjacency {
    pub perpendicular_weight: f64,
}

impl SpatialAdjacency {
    /// Score domain frames the same way the spatial layout scores elements
    pub fn from_config(config: &ShellConfig) -> Self {
        Self {
            perpendicular_weight: config.perpendicular_weight,
        }
    }
}

impl Default for SpatialAdjacency {
    fn default() -> Self {
        Self::from_config(&ShellConfig::default())
    }
}

impl BoundaryPolicy for SpatialAdjacency {
    fn neighbor(
        &self,
        active_domain: &str,
        direction: Direction,
        topology: &Topology,
    ) -> Option<String> {
        let current = topology.frame_of(active_domain)?;
        let candidates: Vec<(String, Rect)> = topology
            .domain_frames
            .iter()
            .filter(|(id, _)| id != active_domain)
            .cloned()
            .collect();

        let result =
            find_nearest_in_direction(&current, &candidates, direction, self.perpendicular_weight);
        tracing::debug!(
            from = active_domain,
            %direction,
            to = ?result,
            "spatial adjacency lookup"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topology() -> Topology {
        Topology {
            left: None,
            right: None,
            domain_frames: vec![
                ("osbar-nav".to_string(), Rect::new(0.0, 0.0, 1200.0, 40.0)),
                ("window-left".to_string(), Rect::new(0.0, 40.0, 600.0, 760.0)),
                ("window-right".to_string(), Rect::new(600.0, 40.0, 600.0, 760.0)),
            ],
        }
    }

    #[test]
    fn test_spatial_adjacency_finds_neighbour() {
        let policy = SpatialAdjacency::default();
        let topo = topology();
        assert_eq!(
            policy.neighbor("window-left", Direction::Right, &topo),
            Some("window-right".to_string())
        );
        assert_eq!(
            policy.neighbor("window-right", Direction::Left, &topo),
            Some("window-left".to_string())
        );
        assert_eq!(policy.neighbor("window-left", Direction::Left, &topo), None);
    }

    #[test]
    fn test_spatial_adjacency_uses_configured_weight() {
        let topo = Topology {
            left: None,
            right: None,
            domain_frames: vec![
                ("here".to_string(), Rect::new(0.0, 0.0, 0.0, 0.0)),
                ("near-offset".to_string(), Rect::new(100.0, 60.0, 0.0, 0.0)),
                ("far-aligned".to_string(), Rect::new(300.0, 0.0, 0.0, 0.0)),
            ],
        };

        let lenient = SpatialAdjacency::from_config(&ShellConfig::default());
        assert_eq!(lenient.perpendicular_weight, 2.0);
        assert_eq!(
            lenient.neighbor("here", Direction::Right, &topo),
            Some("near-offset".to_string())
        );

        let strict = SpatialAdjacency::from_config(&ShellConfig {
            perpendicular_weight: 5.0,
            ..ShellConfig::default()
        });
        assert_eq!(
            strict.neighbor("here", Direction::Right, &topo),
            Some("far-aligned".to_string())
        );
    }

    #[test]
    fn test_unknown_frame_has_no_neighbour() {
        let policy = SpatialAdjacency::default();
        assert_eq!(policy.neighbor("missing", Direction::Up, &topology()), None);
    }

    #[test]
    fn test_closure_policy() {
        let policy = |active: &str, direction: Direction, topo: &Topology| {
            (active == "window-left" && direction == Direction::Up && topo.left.is_none())
                .then(|| "osbar-nav".to_string())
        };
        assert_eq!(
            policy.neighbor("window-left", Direction::Up, &topology()),
            Some("osbar-nav".to_string())
        );
    }
}
