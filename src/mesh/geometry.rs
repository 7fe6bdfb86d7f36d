//! Spherical geometry helpers.

/// Earth radius used by FESOM2, in metres.
pub const EARTH_RADIUS: f64 = 6_367_500.0;

fn unit_vector(lon: f64, lat: f64) -> [f64; 3] {
    let (lon, lat) = (lon.to_radians(), lat.to_radians());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Area of the spherical triangle spanned by three (lon, lat) points, in m².
///
/// Uses the Van Oosterom–Strackee formula for the spherical excess, which is
/// independent of longitude wrapping.
pub fn spherical_triangle_area(p: [(f64, f64); 3], radius: f64) -> f64 {
    let [a, b, c] = p.map(|(lon, lat)| unit_vector(lon, lat));
    let numerator = dot(a, cross(b, c)).abs();
    let denominator = 1.0 + dot(a, b) + dot(b, c) + dot(c, a);
    2.0 * numerator.atan2(denominator) * radius * radius
}
