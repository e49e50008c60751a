use bugseed_core::TargetLocation;
use tracing::debug;

/// Keeps only the outermost of nested locations. A location strictly inside
/// another is dropped; locations with identical ranges are all kept.
pub fn remove_subsumed(locations: Vec<TargetLocation>) -> Vec<TargetLocation> {
    let keep: Vec<bool> = locations
        .iter()
        .map(|inner| !locations.iter().any(|outer| outer.strictly_contains(inner)))
        .collect();
    let before = locations.len();
    let kept: Vec<TargetLocation> = locations
        .into_iter()
        .zip(keep)
        .filter_map(|(location, keep)| keep.then_some(location))
        .collect();
    if kept.len() < before {
        debug!("Dropped {} nested locations", before - kept.len());
    }
    kept
}
