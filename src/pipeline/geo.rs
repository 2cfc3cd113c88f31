use crate::types::activity::Sample;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers between two `(lat, lon)` pairs in degrees.
pub fn haversine_distance(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = from;
    let (lat2, lon2) = to;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance between two consecutive samples; zero unless both are geolocated.
pub fn segment_distance(prev: &Sample, curr: &Sample) -> f64 {
    match (prev.position(), curr.position()) {
        (Some(a), Some(b)) => haversine_distance(a, b),
        _ => 0.0,
    }
}

/// Summed segment distance in source order. `None` with fewer than two samples.
pub fn track_distance(samples: &[Sample]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }

    Some(
        samples
            .windows(2)
            .map(|pair| segment_distance(&pair[0], &pair[1]))
            .sum(),
    )
}

/// Sum of positive deltas between consecutive elevation readings. Samples
/// without elevation are skipped; `None` when no sample carries one.
pub fn elevation_gain(samples: &[Sample]) -> Option<f64> {
    let mut elevations = samples.iter().filter_map(|s| s.elevation);
    let mut prev = elevations.next()?;
    let mut gain = 0.0;

    for ele in elevations {
        if ele > prev {
            gain += ele - prev;
        }
        prev = ele;
    }

    Some(gain)
}
