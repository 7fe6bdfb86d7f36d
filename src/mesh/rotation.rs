//! Rotation between the model's rotated frame and geographic coordinates.
//!
//! FESOM meshes are often stored in a rotated frame so that the model pole
//! sits over land. The rotation is given as three Euler angles
//! (alpha, beta, gamma) in degrees.

/// Euler angles used by standard FESOM setups.
pub const DEFAULT_ABG: [f64; 3] = [50.0, 15.0, -90.0];

type Matrix = [[f64; 3]; 3];

/// Geographic-to-rotated rotation matrix for the given Euler angles.
fn rotation_matrix(abg: [f64; 3]) -> Matrix {
    let [al, be, ga] = abg.map(f64::to_radians);
    let (sa, ca) = al.sin_cos();
    let (sb, cb) = be.sin_cos();
    let (sg, cg) = ga.sin_cos();

    [
        [cg * ca - sg * cb * sa, cg * sa + sg * cb * ca, sg * sb],
        [-sg * ca - cg * cb * sa, -sg * sa + cg * cb * ca, cg * sb],
        [sb * sa, -sb * ca, cb],
    ]
}

fn to_cartesian(lon: f64, lat: f64) -> [f64; 3] {
    let (lon, lat) = (lon.to_radians(), lat.to_radians());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

fn to_lon_lat(v: [f64; 3]) -> (f64, f64) {
    let lat = v[2].clamp(-1.0, 1.0).asin();
    let lon = if v[0].abs() + v[1].abs() == 0.0 {
        0.0
    } else {
        v[1].atan2(v[0])
    };
    (lon.to_degrees(), lat.to_degrees())
}

/// Convert rotated coordinates to geographic ones, in place.
///
/// The rotation matrix is orthogonal, so its inverse is its transpose.
pub fn rotated_to_geographic(abg: [f64; 3], lon: &mut [f64], lat: &mut [f64]) {
    let m = rotation_matrix(abg);
    for (x, y) in lon.iter_mut().zip(lat.iter_mut()) {
        let r = to_cartesian(*x, *y);
        let g = [
            m[0][0] * r[0] + m[1][0] * r[1] + m[2][0] * r[2],
            m[0][1] * r[0] + m[1][1] * r[1] + m[2][1] * r[2],
            m[0][2] * r[0] + m[1][2] * r[1] + m[2][2] * r[2],
        ];
        (*x, *y) = to_lon_lat(g);
    }
}

/// Convert geographic coordinates to the rotated frame, in place.
pub fn geographic_to_rotated(abg: [f64; 3], lon: &mut [f64], lat: &mut [f64]) {
    let m = rotation_matrix(abg);
    for (x, y) in lon.iter_mut().zip(lat.iter_mut()) {
        let g = to_cartesian(*x, *y);
        let r = [
            m[0][0] * g[0] + m[0][1] * g[1] + m[0][2] * g[2],
            m[1][0] * g[0] + m[1][1] * g[1] + m[1][2] * g[2],
            m[2][0] * g[0] + m[2][1] * g[1] + m[2][2] * g[2],
        ];
        (*x, *y) = to_lon_lat(r);
    }
}
