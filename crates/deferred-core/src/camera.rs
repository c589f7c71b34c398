use glam::{Mat4, Quat, Vec3};

/// Starting eye position of the orbit.
pub const EYE_START: Vec3 = Vec3::new(0.0, 50.0, -100.0);

/// Milliseconds per half turn of the orbit (π radians).
pub const HALF_TURN_MS: f64 = 5000.0;

/// Translation applied to the whole mesh so the dragon sits at the origin.
pub const MODEL_OFFSET: Vec3 = Vec3::new(0.0, -45.0, 0.0);

/// Camera matrices as uploaded to the camera uniform buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_projection: [[f32; 4]; 4],     // offset 0
    pub inv_view_projection: [[f32; 4]; 4], // offset 64
}

impl From<ViewMatrices> for CameraUniform {
    fn from(m: ViewMatrices) -> Self {
        Self {
            view_projection: m.view_projection.to_cols_array_2d(),
            inv_view_projection: m.inv_view_projection.to_cols_array_2d(),
        }
    }
}

/// Model and normal matrices as uploaded to the model uniform buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],        // offset 0
    pub normal_model: [[f32; 4]; 4], // offset 64
}

impl ModelUniform {
    pub fn from_translation(offset: Vec3) -> Self {
        let model = Mat4::from_translation(offset);
        let normal_model = model.inverse().transpose();
        Self {
            model: model.to_cols_array_2d(),
            normal_model: normal_model.to_cols_array_2d(),
        }
    }
}

impl Default for ModelUniform {
    fn default() -> Self {
        Self::from_translation(MODEL_OFFSET)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ViewMatrices {
    pub eye: Vec3,
    pub view_projection: Mat4,
    pub inv_view_projection: Mat4,
}

/// Camera circling the origin around the Y axis as time passes.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub eye_start: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub projection: Mat4,
}

impl OrbitCamera {
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            eye_start: EYE_START,
            target: Vec3::ZERO,
            up: Vec3::Y,
            projection: Mat4::perspective_rh(
                (2.0 * std::f32::consts::PI) / 5.0,
                aspect_ratio,
                1.0,
                2000.0,
            ),
        }
    }

    pub fn for_viewport(width: u32, height: u32) -> Self {
        Self::new(width.max(1) as f32 / height.max(1) as f32)
    }

    /// Orbit angle in radians after `elapsed_ms`.
    pub fn angle(elapsed_ms: f64) -> f32 {
        (std::f64::consts::PI * (elapsed_ms / HALF_TURN_MS)) as f32
    }

    pub fn eye_at(&self, elapsed_ms: f64) -> Vec3 {
        rotate_y(self.eye_start, self.target, Self::angle(elapsed_ms))
    }

    /// View-projection and its inverse for the eye position at `elapsed_ms`.
    pub fn view_projection(&self, elapsed_ms: f64) -> ViewMatrices {
        let eye = self.eye_at(elapsed_ms);
        let view = Mat4::look_at_rh(eye, self.target, self.up);
        let view_projection = self.projection * view;
        ViewMatrices {
            eye,
            view_projection,
            inv_view_projection: view_projection.inverse(),
        }
    }
}

/// Rotate `point` around the Y axis through `origin`.
pub fn rotate_y(point: Vec3, origin: Vec3, radians: f32) -> Vec3 {
    Quat::from_rotation_y(radians) * (point - origin) + origin
}

/// Orbit time that only advances while the view is unpaused.
#[derive(Debug, Clone, Default)]
pub struct OrbitClock {
    elapsed_ms: f64,
}

impl OrbitClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, dt_ms: f64, paused: bool) {
        if !paused {
            self.elapsed_ms += dt_ms.max(0.0);
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_close(a: Vec3, b: Vec3, tol: f32) {
        assert!((a - b).abs().max_element() < tol, "{} != {}", a, b);
    }

    #[test]
    fn test_inverse_round_trip_is_identity() {
        let camera = OrbitCamera::new(16.0 / 9.0);
        for t in [0.0, 1.0, 1234.5, 5000.0, 7777.0, 60_000.0, 1.0e6] {
            let m = camera.view_projection(t);
            let product = m.inv_view_projection * m.view_projection;
            assert!(
                product.abs_diff_eq(Mat4::IDENTITY, 1e-4),
                "t = {}: {:?}",
                t,
                product
            );
        }
    }

    #[test]
    fn test_eye_starts_at_fixed_position() {
        let camera = OrbitCamera::new(1.0);
        assert_vec_close(camera.eye_at(0.0), EYE_START, 1e-5);
    }

    #[test]
    fn test_orbit_period() {
        let camera = OrbitCamera::new(1.0);
        for t in [0.0, 321.0, 4200.0] {
            let start = camera.eye_at(t);
            // π per 5000 ms: opposite side after 5000, full turn after 10000.
            let half = camera.eye_at(t + HALF_TURN_MS);
            let full = camera.eye_at(t + 2.0 * HALF_TURN_MS);
            assert_vec_close(full, start, 1e-3);
            assert_vec_close(half, Vec3::new(-start.x, start.y, -start.z), 1e-3);
        }
    }

    #[test]
    fn test_orbit_keeps_height_and_radius() {
        let camera = OrbitCamera::new(1.0);
        let radius = Vec3::new(EYE_START.x, 0.0, EYE_START.z).length();
        for i in 0..32 {
            let eye = camera.eye_at(i as f64 * 613.0);
            assert!((eye.y - EYE_START.y).abs() < 1e-4);
            assert!((Vec3::new(eye.x, 0.0, eye.z).length() - radius).abs() < 1e-3);
        }
    }

    #[test]
    fn test_rotate_y_quarter_turn() {
        let rotated = rotate_y(Vec3::new(0.0, 0.0, -1.0), Vec3::ZERO, std::f32::consts::FRAC_PI_2);
        assert_vec_close(rotated, Vec3::new(-1.0, 0.0, 0.0), 1e-6);
    }

    #[test]
    fn test_origin_projects_to_screen_center() {
        let camera = OrbitCamera::new(4.0 / 3.0);
        let m = camera.view_projection(2500.0);
        let clip = m.view_projection * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn test_model_uniform_normal_matrix() {
        let uniform = ModelUniform::default();
        let model = Mat4::from_cols_array_2d(&uniform.model);
        assert_vec_close(model.transform_point3(Vec3::ZERO), MODEL_OFFSET, 1e-6);
        // A pure translation leaves directions untouched.
        let normal = Mat4::from_cols_array_2d(&uniform.normal_model);
        assert_vec_close(normal.transform_vector3(Vec3::Y), Vec3::Y, 1e-6);
    }

    #[test]
    fn test_orbit_clock_holds_while_paused() {
        let mut clock = OrbitClock::new();
        clock.advance(16.0, false);
        clock.advance(500.0, true);
        clock.advance(-3.0, false);
        clock.advance(4.0, false);
        assert_eq!(clock.elapsed_ms(), 20.0);
    }
}
