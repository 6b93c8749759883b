//! WGS84 geodesy and placement composition
//!
//! The viewer works in a local East-North-Up frame centered on the scene
//! origin; placements are composed against that frame and expressed in
//! Earth-centered Earth-fixed coordinates for persistence.

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 semi-minor axis (meters).
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);
/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);
/// WGS84 second eccentricity squared.
pub const WGS84_EP2: f64 = (WGS84_A * WGS84_A - WGS84_B * WGS84_B) / (WGS84_B * WGS84_B);

/// Geodetic coordinates in radians and meters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Geodetic {
    pub lat_rad: f64,
    pub lon_rad: f64,
    pub alt_m: f64,
}

impl Geodetic {
    pub fn new(lat_rad: f64, lon_rad: f64, alt_m: f64) -> Self {
        Self {
            lat_rad,
            lon_rad,
            alt_m,
        }
    }

    /// Construct from the degree-valued triple used on the wire
    pub fn from_degrees(lon_deg: f64, lat_deg: f64, height_m: f64) -> Self {
        Self {
            lat_rad: lat_deg.to_radians(),
            lon_rad: lon_deg.to_radians(),
            alt_m: height_m,
        }
    }

    pub fn lon_deg(&self) -> f64 {
        self.lon_rad.to_degrees()
    }

    pub fn lat_deg(&self) -> f64 {
        self.lat_rad.to_degrees()
    }
}

/// Earth-centered Earth-fixed coordinates (meters).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ecef {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Ecef {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Local East-North-Up coordinates (meters).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Enu {
    pub east: f64,
    pub north: f64,
    pub up: f64,
}

impl Enu {
    pub fn new(east: f64, north: f64, up: f64) -> Self {
        Self { east, north, up }
    }
}

pub fn geodetic_to_ecef(geo: Geodetic) -> Ecef {
    let sin_lat = geo.lat_rad.sin();
    let cos_lat = geo.lat_rad.cos();
    let sin_lon = geo.lon_rad.sin();
    let cos_lon = geo.lon_rad.cos();

    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let x = (n + geo.alt_m) * cos_lat * cos_lon;
    let y = (n + geo.alt_m) * cos_lat * sin_lon;
    let z = (n * (1.0 - WGS84_E2) + geo.alt_m) * sin_lat;

    Ecef::new(x, y, z)
}

pub fn ecef_to_geodetic(ecef: Ecef) -> Geodetic {
    let p = (ecef.x * ecef.x + ecef.y * ecef.y).sqrt();
    let lon = ecef.y.atan2(ecef.x);

    let theta = (ecef.z * WGS84_A).atan2(p * WGS84_B);
    let sin_theta = theta.sin();
    let cos_theta = theta.cos();

    let lat = (ecef.z + WGS84_EP2 * WGS84_B * sin_theta * sin_theta * sin_theta)
        .atan2(p - WGS84_E2 * WGS84_A * cos_theta * cos_theta * cos_theta);

    let sin_lat = lat.sin();
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let alt = p / lat.cos() - n;

    Geodetic::new(lat, lon, alt)
}

/// Unit east/north/up directions at `origin`, as ECEF column vectors
pub fn enu_basis(origin: Geodetic) -> [[f64; 3]; 3] {
    let sin_lat = origin.lat_rad.sin();
    let cos_lat = origin.lat_rad.cos();
    let sin_lon = origin.lon_rad.sin();
    let cos_lon = origin.lon_rad.cos();

    [
        [-sin_lon, cos_lon, 0.0],
        [-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat],
        [cos_lat * cos_lon, cos_lat * sin_lon, sin_lat],
    ]
}

pub fn enu_to_ecef(enu: Enu, origin: Geodetic) -> Ecef {
    let origin_ecef = geodetic_to_ecef(origin);
    let [e, n, u] = enu_basis(origin);

    Ecef::new(
        origin_ecef.x + e[0] * enu.east + n[0] * enu.north + u[0] * enu.up,
        origin_ecef.y + e[1] * enu.east + n[1] * enu.north + u[1] * enu.up,
        origin_ecef.z + e[2] * enu.east + n[2] * enu.north + u[2] * enu.up,
    )
}

pub fn ecef_to_enu(point: Ecef, origin: Geodetic) -> Enu {
    let origin_ecef = geodetic_to_ecef(origin);
    let dx = point.x - origin_ecef.x;
    let dy = point.y - origin_ecef.y;
    let dz = point.z - origin_ecef.z;
    let [e, n, u] = enu_basis(origin);

    Enu::new(
        e[0] * dx + e[1] * dy + e[2] * dz,
        n[0] * dx + n[1] * dy + n[2] * dz,
        u[0] * dx + u[1] * dy + u[2] * dz,
    )
}

/// Geodetic coordinate of a point given in the origin's local frame
pub fn geodetic_at(origin: Geodetic, local: Enu) -> Geodetic {
    ecef_to_geodetic(enu_to_ecef(local, origin))
}

/// Rotation matrix for heading/pitch/roll in degrees, ZYX order
/// (heading about up, then pitch, then roll), columns in the local frame
pub fn rotation_from_hpr_degrees(hpr: [f64; 3]) -> [[f64; 3]; 3] {
    let (sh, ch) = hpr[0].to_radians().sin_cos();
    let (sp, cp) = hpr[1].to_radians().sin_cos();
    let (sr, cr) = hpr[2].to_radians().sin_cos();

    // Rz(heading) * Ry(pitch) * Rx(roll), column-major
    [
        [ch * cp, sh * cp, -sp],
        [ch * sp * sr - sh * cr, sh * sp * sr + ch * cr, cp * sr],
        [ch * sp * cr + sh * sr, sh * sp * cr - ch * sr, cp * cr],
    ]
}

fn mat3_mul(a: [[f64; 3]; 3], b: [[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for (col, b_col) in b.iter().enumerate() {
        for row in 0..3 {
            out[col][row] =
                a[0][row] * b_col[0] + a[1][row] * b_col[1] + a[2][row] * b_col[2];
        }
    }
    out
}

/// A composed world placement: translation plus a linear part carrying
/// the local frame, orientation, and non-uniform scale.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Placement {
    pub position: Ecef,
    /// Column-major 3x3 linear part
    pub linear: [[f64; 3]; 3],
}

impl Placement {
    /// Compose a placement: translate to origin + local offset, orient by
    /// heading/pitch/roll (degrees), then apply non-uniform scale.
    pub fn compose(
        origin: Geodetic,
        offset: Enu,
        rotation_deg: [f64; 3],
        scale: [f64; 3],
    ) -> Self {
        let position = enu_to_ecef(offset, origin);
        // Basis vectors are the columns mapping local axes into ECEF
        let frame = enu_basis(origin);
        let rotation = rotation_from_hpr_degrees(rotation_deg);
        let mut linear = mat3_mul(frame, rotation);
        for (col, s) in scale.iter().enumerate() {
            for row in 0..3 {
                linear[col][row] *= s;
            }
        }
        Self { position, linear }
    }

    /// Column-major 4x4 matrix for the rendering engine
    pub fn to_column_major(&self) -> [f64; 16] {
        let l = &self.linear;
        [
            l[0][0], l[0][1], l[0][2], 0.0,
            l[1][0], l[1][1], l[1][2], 0.0,
            l[2][0], l[2][1], l[2][2], 0.0,
            self.position.x, self.position.y, self.position.z, 1.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn geodetic_to_ecef_equator_prime_meridian() {
        let geo = Geodetic::new(0.0, 0.0, 0.0);
        let ecef = geodetic_to_ecef(geo);
        assert_close(ecef.x, WGS84_A, 1e-6);
        assert_close(ecef.y, 0.0, 1e-6);
        assert_close(ecef.z, 0.0, 1e-6);
    }

    #[test]
    fn round_trip_geodetic_ecef() {
        let geo = Geodetic::from_degrees(113.2644, 23.1291, 10_000.0);
        let ecef = geodetic_to_ecef(geo);
        let geo_rt = ecef_to_geodetic(ecef);
        assert_close(geo_rt.lat_rad, geo.lat_rad, 1e-9);
        assert_close(geo_rt.lon_rad, geo.lon_rad, 1e-9);
        assert_close(geo_rt.alt_m, geo.alt_m, 1e-6);
    }

    #[test]
    fn enu_round_trip() {
        let origin = Geodetic::from_degrees(113.2644, 23.1291, 10_000.0);
        let enu = Enu::new(15.0, -8.0, 2.5);
        let ecef = enu_to_ecef(enu, origin);
        let enu_rt = ecef_to_enu(ecef, origin);
        assert_close(enu_rt.east, enu.east, 1e-6);
        assert_close(enu_rt.north, enu.north, 1e-6);
        assert_close(enu_rt.up, enu.up, 1e-6);
    }

    #[test]
    fn enu_basis_is_orthonormal() {
        let [e, n, u] = enu_basis(Geodetic::from_degrees(113.2644, 23.1291, 0.0));
        for axis in [e, n, u] {
            let len = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
            assert_close(len, 1.0, 1e-12);
        }
        let dot_en = e[0] * n[0] + e[1] * n[1] + e[2] * n[2];
        assert_close(dot_en, 0.0, 1e-12);
    }

    #[test]
    fn identity_rotation_matrix() {
        let r = rotation_from_hpr_degrees([0.0, 0.0, 0.0]);
        assert_close(r[0][0], 1.0, 1e-12);
        assert_close(r[1][1], 1.0, 1e-12);
        assert_close(r[2][2], 1.0, 1e-12);
        assert_close(r[0][1], 0.0, 1e-12);
    }

    #[test]
    fn rotation_and_scale_are_observable_in_placement() {
        let origin = Geodetic::from_degrees(113.2644, 23.1291, 10_000.0);
        let offset = Enu::new(10.0, 0.0, 0.0);

        let plain = Placement::compose(origin, offset, [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let turned = Placement::compose(origin, offset, [90.0, 0.0, 0.0], [2.0, 2.0, 2.0]);

        // Same anchor point, different linear part
        assert_close(turned.position.x, plain.position.x, 1e-6);
        assert_close(turned.position.y, plain.position.y, 1e-6);
        assert_close(turned.position.z, plain.position.z, 1e-6);

        let a = plain.to_column_major();
        let b = turned.to_column_major();
        let max_diff = a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0_f64, f64::max);
        assert!(max_diff > 0.5, "rotation/scale silently dropped");
    }

    #[test]
    fn scale_stretches_columns() {
        let origin = Geodetic::from_degrees(0.0, 0.0, 0.0);
        let placement =
            Placement::compose(origin, Enu::new(0.0, 0.0, 0.0), [0.0, 0.0, 0.0], [2.0, 3.0, 4.0]);
        let col_len = |c: [f64; 3]| (c[0] * c[0] + c[1] * c[1] + c[2] * c[2]).sqrt();
        assert_close(col_len(placement.linear[0]), 2.0, 1e-9);
        assert_close(col_len(placement.linear[1]), 3.0, 1e-9);
        assert_close(col_len(placement.linear[2]), 4.0, 1e-9);
    }
}
