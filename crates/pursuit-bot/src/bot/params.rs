/// Scoring weights shared by the move scorer, the simulator and the local policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BotParams {
    pub bottleneck_bonus: f32,
    /// Distance charged when a target cannot reach any reference cell.
    pub unreachable_distance: f32,
    pub simulation_weight: f32,
    pub coordination_bonus: f32,
    pub collision_penalty: f32,
    /// Hop limit for coordination path searches.
    pub path_depth: usize,
}

impl Default for BotParams {
    fn default() -> Self {
        Self {
            bottleneck_bonus: 10.0,
            unreachable_distance: 20.0,
            simulation_weight: 0.5,
            coordination_bonus: 2.0,
            collision_penalty: 3.0,
            path_depth: 12,
        }
    }
}
