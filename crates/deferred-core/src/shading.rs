//! CPU mirror of the per-pixel lighting in `fragmentDeferredRendering.wgsl`.

use glam::Vec3;

use crate::light::LightRecord;

/// Constant term added after all lights.
pub const AMBIENT: f32 = 0.2;

/// Inputs reconstructed from the G-buffer for one pixel.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceSample {
    pub position: Vec3,
    pub normal: Vec3,
    pub albedo: Vec3,
}

/// Contribution of a single light, zero outside its radius.
pub fn light_contribution(surface: &SurfaceSample, light: &LightRecord) -> Vec3 {
    let to_light = light.position() - surface.position;
    let distance = to_light.length();
    if distance > light.radius || distance <= f32::EPSILON {
        return Vec3::ZERO;
    }
    let lambert = surface.normal.dot(to_light / distance).max(0.0);
    let falloff = (1.0 - distance / light.radius).powi(2);
    lambert * falloff * light.color() * surface.albedo
}

/// Shade a pixel with the first `active_count` lights.
pub fn shade(surface: &SurfaceSample, lights: &[LightRecord], active_count: usize) -> Vec3 {
    let active = &lights[..active_count.min(lights.len())];
    active
        .iter()
        .map(|light| light_contribution(surface, light))
        .fold(Vec3::ZERO, |acc, c| acc + c)
        + Vec3::splat(AMBIENT)
}

/// World position from a depth sample and the inverse view-projection,
/// as the lighting shader reconstructs it.
pub fn world_from_screen(uv: glam::Vec2, depth: f32, inv_view_projection: glam::Mat4) -> Vec3 {
    let clip = glam::Vec4::new(uv.x * 2.0 - 1.0, (1.0 - uv.y) * 2.0 - 1.0, depth, 1.0);
    let world = inv_view_projection * clip;
    world.truncate() / world.w
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::OrbitCamera;
    use crate::light::{LightRng, LightSet};

    fn light_at(position: Vec3, color: Vec3) -> LightRecord {
        LightRecord {
            position: position.extend(1.0).to_array(),
            color: color.to_array(),
            radius: 20.0,
        }
    }

    fn floor_sample() -> SurfaceSample {
        SurfaceSample {
            position: Vec3::ZERO,
            normal: Vec3::Y,
            albedo: Vec3::ONE,
        }
    }

    #[test]
    fn test_no_lights_gives_ambient() {
        let c = shade(&floor_sample(), &[], 0);
        assert_eq!(c, Vec3::splat(AMBIENT));
    }

    #[test]
    fn test_light_overhead() {
        let light = light_at(Vec3::new(0.0, 10.0, 0.0), Vec3::ONE);
        let c = light_contribution(&floor_sample(), &light);
        // lambert 1, falloff (1 - 10/20)^2
        assert!((c - Vec3::splat(0.25)).abs().max_element() < 1e-6);
    }

    #[test]
    fn test_light_out_of_radius_or_behind() {
        let far = light_at(Vec3::new(0.0, 25.0, 0.0), Vec3::ONE);
        let below = light_at(Vec3::new(0.0, -5.0, 0.0), Vec3::ONE);
        assert_eq!(light_contribution(&floor_sample(), &far), Vec3::ZERO);
        assert_eq!(light_contribution(&floor_sample(), &below), Vec3::ZERO);
    }

    #[test]
    fn test_inactive_lights_ignored() {
        let mut rng = LightRng::new(11);
        let mut set = LightSet::initialize(
            64,
            Vec3::new(-10.0, 1.0, -10.0),
            Vec3::new(10.0, 10.0, 10.0),
            &mut rng,
        )
        .unwrap();
        set.set_active_count(8).unwrap();

        let surface = floor_sample();
        let expected = shade(&surface, set.active(), 8);

        // Replacing every inactive light leaves the result unchanged.
        let mut records = set.records().to_vec();
        for light in &mut records[8..] {
            *light = light_at(Vec3::new(0.0, 1.0, 0.0), Vec3::splat(2.0));
        }
        assert_eq!(shade(&surface, &records, 8), expected);
        assert_ne!(shade(&surface, &records, 9), expected);
    }

    #[test]
    fn test_world_from_screen_recovers_origin() {
        let camera = OrbitCamera::new(1.0);
        let m = camera.view_projection(1500.0);
        let clip = m.view_projection * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        let uv = glam::Vec2::new((ndc.x + 1.0) * 0.5, 1.0 - (ndc.y + 1.0) * 0.5);
        let p = world_from_screen(uv, ndc.z, m.inv_view_projection);
        assert!(p.length() < 1e-2, "reconstructed {}", p);
    }
}
