//! Matrix math feeding the transform pipeline.
//!
//! Matrices are row-major and multiply row vectors from the left
//! (`v' = v * M`), so translation lives in the fourth row.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Homogeneous clip-space coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub rows: [[f32; 4]; 4],
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const fn from_rows(rows: [[f32; 4]; 4]) -> Self {
        Self { rows }
    }

    /// `self * rhs`: apply `self` first, then `rhs`.
    pub fn mul(&self, rhs: &Matrix) -> Matrix {
        let mut out = [[0.0f32; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.rows[i][k] * rhs.rows[k][j]).sum();
            }
        }
        Matrix { rows: out }
    }

    /// Transform a position (implicit `w = 1`) into clip space.
    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec4 {
        let m = &self.rows;
        Vec4 {
            x: p.x * m[0][0] + p.y * m[1][0] + p.z * m[2][0] + m[3][0],
            y: p.x * m[0][1] + p.y * m[1][1] + p.z * m[2][1] + m[3][1],
            z: p.x * m[0][2] + p.y * m[1][2] + p.z * m[2][2] + m[3][2],
            w: p.x * m[0][3] + p.y * m[1][3] + p.z * m[2][3] + m[3][3],
        }
    }

    /// Orthographic projection with the origin at the top-left corner
    /// (`L = 0, R = width, T = 0, B = height`).
    pub fn orthographic(width: f32, height: f32, z_near: f32, z_far: f32) -> Matrix {
        let mut m = Matrix::IDENTITY;
        m.rows[0][0] = 2.0 / width;
        m.rows[1][1] = -2.0 / height;
        m.rows[2][2] = -2.0 / (z_far - z_near);

        m.rows[3][0] = -1.0;
        m.rows[3][1] = 1.0;
        m.rows[3][2] = -(z_far + z_near) / (z_far - z_near);
        m
    }

    /// Symmetric perspective projection.
    ///
    /// Near and far are swapped (`near' = far`, `far' = 0.1`): the depth
    /// comparison only offers greater-or-equal, so depth must grow toward the
    /// viewer.
    pub fn perspective(fov: f32, aspect: f32, z_far: f32) -> Matrix {
        let near = z_far;
        let far = 0.1f32;
        let c = cotangent(0.5 * fov);

        let mut m = Matrix::IDENTITY;
        m.rows[0][0] = c / aspect;
        m.rows[1][1] = c;
        m.rows[2][2] = -(far + near) / (far - near);
        m.rows[2][3] = -1.0;
        m.rows[3][2] = -(2.0 * far * near) / (far - near);
        m.rows[3][3] = 0.0;
        m
    }

    pub fn translation(x: f32, y: f32, z: f32) -> Matrix {
        let mut m = Matrix::IDENTITY;
        m.rows[3] = [x, y, z, 1.0];
        m
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn cotangent(x: f32) -> f32 {
    x.cos() / x.sin()
}
