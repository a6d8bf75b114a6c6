pub mod assess;
pub mod corridor;
pub mod elevation;
pub mod error;
pub mod oas;
pub mod physics;
pub mod procedures;
pub mod spatial;
pub mod spiral;
pub mod surface;

pub use assess::{
    assess_obstacles, split_by_threshold, Obstacle, ObstacleHit, RelativeObstacle, ThresholdSplit,
};
pub use corridor::{
    splay_length, Corridor, CorridorDescriptor, CorridorWidthProfile, Edge, RingVertex, Station,
    StationWidth, WidthSample,
};
pub use elevation::{ElevationProfile, ElevationRule};
pub use error::{PansOpsError, Result};
pub use oas::{
    calculate_oas_ils, solve_plane_intersection, OasCoefficients, OasIlsParams, Plane, PlaneName,
};
pub use physics::{
    drift_angle_deg, isa_deviation, isa_temperature, pilot_reaction_distance, tas_factor,
    true_airspeed, wind_effect_45, wind_effect_90, TurnParameters, TurnPerformance, WindModel,
    MAX_RATE_OF_TURN,
};
pub use procedures::{calculate_isa, CalculationRequest, ElevationUnit, IsaParams};
pub use spatial::{
    azimuth, distance, ft_to_m, m_to_ft, normalize_bearing, project, ring_is_simple,
    ring_winding, Point2, Point3, RouteSegment, Winding, FT_TO_M, NM_TO_M,
};
pub use spiral::{
    build_racetrack, build_wind_spiral, calculate_holding, calculate_wind_spiral, HoldingParams,
    HoldingTemplate, TurnDirection, WindSpiral, WindSpiralParams,
};
pub use surface::{CalculationResult, ProtectionSurface, Shape, Vertex};
