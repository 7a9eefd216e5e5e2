//! Cube geometry, spin state and the per-image uniform block.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Vertices in the cube's triangle list.
pub const VERTEX_COUNT: usize = 36;

/// Spin speed change per arrow key press, in degrees per second.
pub const SPIN_STEP: f32 = 15.0;

const DEFAULT_SPIN: f32 = 60.0;
const MAX_SPIN: f32 = 720.0;

/// Uniform block read by the cube's vertex shader.
///
/// The shader indexes `position` and `color` with the vertex index, so the
/// cube needs no vertex buffer.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct CubeUniforms {
    pub mvp: Mat4,
    pub position: [[f32; 4]; VERTEX_COUNT],
    pub color: [[f32; 4]; VERTEX_COUNT],
}

impl CubeUniforms {
    /// Size of the block in bytes.
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn new(mvp: Mat4) -> Self {
        let (position, color) = cube_vertices();
        Self {
            mvp,
            position,
            color,
        }
    }
}

/// Triangle list for the unit cube `[-1, 1]^3`, with one flat color per face.
pub fn cube_vertices() -> ([[f32; 4]; VERTEX_COUNT], [[f32; 4]; VERTEX_COUNT]) {
    // Outward normal axis, and the two in-plane axes ordered so that
    // (u, v, normal) is right handed and triangles wind counter-clockwise.
    const FACES: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];
    const COLORS: [[f32; 4]; 6] = [
        [1.0, 0.0, 0.0, 1.0],
        [0.0, 1.0, 0.0, 1.0],
        [0.0, 0.0, 1.0, 1.0],
        [1.0, 1.0, 0.0, 1.0],
        [1.0, 0.0, 1.0, 1.0],
        [0.0, 1.0, 1.0, 1.0],
    ];
    const CORNERS: [(f32, f32); 6] = [
        (-1.0, -1.0),
        (1.0, -1.0),
        (1.0, 1.0),
        (-1.0, -1.0),
        (1.0, 1.0),
        (-1.0, 1.0),
    ];

    let mut position = [[0.0; 4]; VERTEX_COUNT];
    let mut color = [[0.0; 4]; VERTEX_COUNT];
    for (face, &(normal, u, v)) in FACES.iter().enumerate() {
        for (corner, &(su, sv)) in CORNERS.iter().enumerate() {
            let p = normal + u * su + v * sv;
            let i = face * CORNERS.len() + corner;
            position[i] = [p.x, p.y, p.z, 1.0];
            color[i] = COLORS[face];
        }
    }
    (position, color)
}

/// Rotation of the cube about the vertical axis.
#[derive(Debug, Clone, Copy)]
pub struct Spin {
    /// Current angle in degrees, kept in `[0, 360)`.
    pub angle: f32,
    /// Degrees per second; negative spins the other way.
    pub speed: f32,
}

impl Default for Spin {
    fn default() -> Self {
        Self {
            angle: 0.0,
            speed: DEFAULT_SPIN,
        }
    }
}

impl Spin {
    /// Advance by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.angle = self.speed.mul_add(dt, self.angle).rem_euclid(360.0);
    }

    /// Change the speed by `delta`, clamped to a sane range.
    pub fn adjust(&mut self, delta: f32) {
        self.speed = (self.speed + delta).clamp(-MAX_SPIN, MAX_SPIN);
    }

    /// Model-view-projection for a window with the given aspect ratio.
    pub fn mvp(&self, aspect: f32) -> Mat4 {
        let mut projection = Mat4::perspective_rh(45f32.to_radians(), aspect, 0.1, 100.0);
        // Vulkan clip space has Y pointing down.
        projection.y_axis.y *= -1.0;
        let view = Mat4::look_at_rh(Vec3::new(0.0, 3.0, 5.0), Vec3::ZERO, Vec3::Y);
        let model = Mat4::from_rotation_y(self.angle.to_radians());
        projection * view * model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn vertices_lie_on_the_unit_cube() {
        let (position, color) = cube_vertices();
        for p in &position {
            assert_relative_eq!(p[3], 1.0);
            assert!(p[..3].iter().all(|c| (c.abs() - 1.0).abs() < 1e-6));
        }
        // Six faces, one color each.
        for face in color.chunks(6) {
            assert!(face.iter().all(|c| *c == face[0]));
        }
    }

    #[test]
    fn triangles_wind_outward() {
        let (position, _) = cube_vertices();
        for tri in position.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|p| Vec3::new(p[0], p[1], p[2]));
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn spin_wraps_and_reverses() {
        let mut spin = Spin {
            angle: 350.0,
            speed: 60.0,
        };
        spin.advance(0.5);
        assert_relative_eq!(spin.angle, 20.0, epsilon = 1e-4);

        spin.speed = -60.0;
        spin.advance(0.5);
        assert_relative_eq!(spin.angle, 350.0, epsilon = 1e-4);
    }

    #[test]
    fn paused_frames_do_not_move() {
        let mut spin = Spin::default();
        spin.advance(0.0);
        assert_relative_eq!(spin.angle, 0.0);
    }

    #[test]
    fn speed_is_clamped() {
        let mut spin = Spin::default();
        for _ in 0..1000 {
            spin.adjust(SPIN_STEP);
        }
        assert_relative_eq!(spin.speed, MAX_SPIN);
        for _ in 0..1000 {
            spin.adjust(-SPIN_STEP);
        }
        assert_relative_eq!(spin.speed, -MAX_SPIN);
    }

    #[test]
    fn uniform_block_layout() {
        assert_eq!(CubeUniforms::SIZE, (16 + 2 * 4 * VERTEX_COUNT as u64) * 4);
        let uniforms = CubeUniforms::new(Spin::default().mvp(1.0));
        let bytes: &[u8] = bytemuck::bytes_of(&uniforms);
        assert_eq!(bytes.len() as u64, CubeUniforms::SIZE);
    }
}
