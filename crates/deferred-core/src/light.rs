use glam::Vec3;

/// Default number of light slots allocated in the storage buffer.
pub const MAX_LIGHTS: usize = 1024;

/// Invocations per light-update workgroup (matches `@workgroup_size(64)`).
pub const LIGHT_WORKGROUP_SIZE: u32 = 64;

/// Radius assigned to every light at initialization.
pub const LIGHT_RADIUS: f32 = 20.0;

/// One point light as laid out in the storage buffer (8 floats, 32 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightRecord {
    pub position: [f32; 4], // w is always 1.0
    pub color: [f32; 3],
    pub radius: f32,
}

impl LightRecord {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.position[0], self.position[1], self.position[2])
    }

    pub fn color(&self) -> Vec3 {
        Vec3::from_array(self.color)
    }
}

/// Axis-aligned box the lights live in, padded to two vec4s for the uniform.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightExtent {
    pub min: [f32; 4],
    pub max: [f32; 4],
}

impl LightExtent {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.extend(0.0).to_array(),
            max: max.extend(0.0).to_array(),
        }
    }

    pub fn min(&self) -> Vec3 {
        Vec3::new(self.min[0], self.min[1], self.min[2])
    }

    pub fn max(&self) -> Vec3 {
        Vec3::new(self.max[0], self.max[1], self.max[2])
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min()).all() && p.cmple(self.max()).all()
    }
}

/// Active light count uniform, padded to 16 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightConfig {
    pub num_lights: u32,
    pub _pad: [u32; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub enum LightError {
    ZeroCapacity,
    InvertedExtent { min: Vec3, max: Vec3 },
    CountOutOfRange { requested: usize, capacity: usize },
}

impl std::fmt::Display for LightError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroCapacity => write!(f, "Light capacity must be at least 1"),
            Self::InvertedExtent { min, max } => {
                write!(f, "Light extent min {} exceeds max {}", min, max)
            }
            Self::CountOutOfRange { requested, capacity } => write!(
                f,
                "Active light count {} outside [1, {}]",
                requested, capacity
            ),
        }
    }
}

impl std::error::Error for LightError {}

/// Seeded linear congruential generator used to scatter lights reproducibly.
#[derive(Debug, Clone)]
pub struct LightRng {
    state: u32,
}

impl LightRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Uniform sample in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        self.state = self.state.wrapping_mul(1103515245).wrapping_add(12345);
        // Low LCG bits are weak; keep the top 24.
        (self.state >> 8) as f32 / (1u32 << 24) as f32
    }
}

/// Fixed-capacity light array with a separate active-prefix length.
///
/// The backing storage is allocated once and never resized. Only the first
/// `active_count` records take part in lighting and animation; the rest keep
/// their initial values.
#[derive(Debug, Clone)]
pub struct LightSet {
    records: Vec<LightRecord>,
    active_count: usize,
    extent: LightExtent,
}

impl LightSet {
    /// Scatter `capacity` lights inside `[extent_min, extent_max]`.
    ///
    /// All slots start active.
    pub fn initialize(
        capacity: usize,
        extent_min: Vec3,
        extent_max: Vec3,
        rng: &mut LightRng,
    ) -> Result<Self, LightError> {
        if capacity == 0 {
            return Err(LightError::ZeroCapacity);
        }
        if !extent_min.cmple(extent_max).all() {
            return Err(LightError::InvertedExtent {
                min: extent_min,
                max: extent_max,
            });
        }

        let size = extent_max - extent_min;
        let records = (0..capacity)
            .map(|_| {
                let position = Vec3::new(
                    rng.next_f32() * size.x + extent_min.x,
                    rng.next_f32() * size.y + extent_min.y,
                    rng.next_f32() * size.z + extent_min.z,
                );
                let color = [
                    rng.next_f32() * 2.0,
                    rng.next_f32() * 2.0,
                    rng.next_f32() * 2.0,
                ];
                LightRecord {
                    position: position.extend(1.0).to_array(),
                    color,
                    radius: LIGHT_RADIUS,
                }
            })
            .collect();

        tracing::debug!(
            "Initialized {} lights in extent {} .. {}",
            capacity,
            extent_min,
            extent_max
        );

        Ok(Self {
            records,
            active_count: capacity,
            extent: LightExtent::new(extent_min, extent_max),
        })
    }

    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Set how many lights (from index 0) are active.
    pub fn set_active_count(&mut self, n: usize) -> Result<(), LightError> {
        if n == 0 || n > self.capacity() {
            return Err(LightError::CountOutOfRange {
                requested: n,
                capacity: self.capacity(),
            });
        }
        self.active_count = n;
        Ok(())
    }

    pub fn records(&self) -> &[LightRecord] {
        &self.records
    }

    pub fn active(&self) -> &[LightRecord] {
        &self.records[..self.active_count]
    }

    pub fn extent(&self) -> LightExtent {
        self.extent
    }

    pub fn config(&self) -> LightConfig {
        LightConfig {
            num_lights: self.active_count as u32,
            _pad: [0; 3],
        }
    }

    /// Workgroups needed to cover every slot, active or not.
    pub fn workgroup_count(&self) -> u32 {
        workgroup_count(self.capacity())
    }

    /// Advance the active lights by one frame on the CPU.
    ///
    /// Mirrors `lightUpdate.wgsl`: each light falls along -y by
    /// `0.5 + 0.003 * (index % 64)` and wraps to the top of the extent once it
    /// drops below the bottom.
    pub fn step(&mut self) {
        let min_y = self.extent.min[1];
        let max_y = self.extent.max[1];
        for (index, light) in self.records[..self.active_count].iter_mut().enumerate() {
            let y = light.position[1] - fall_speed(index);
            light.position[1] = if y < min_y { max_y } else { y };
        }
    }
}

/// Per-frame fall distance of the light at `index`.
pub fn fall_speed(index: usize) -> f32 {
    0.5 + 0.003 * (index % LIGHT_WORKGROUP_SIZE as usize) as f32
}

/// `ceil(capacity / 64)`.
pub fn workgroup_count(capacity: usize) -> u32 {
    (capacity as u32).div_ceil(LIGHT_WORKGROUP_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_set(capacity: usize) -> LightSet {
        let mut rng = LightRng::new(7);
        LightSet::initialize(
            capacity,
            Vec3::new(-50.0, -30.0, -50.0),
            Vec3::new(50.0, 30.0, 50.0),
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn test_record_layout_matches_shader_stride() {
        assert_eq!(std::mem::size_of::<LightRecord>(), 8 * 4);
        assert_eq!(std::mem::size_of::<LightExtent>(), 32);
        assert_eq!(std::mem::size_of::<LightConfig>(), 16);
    }

    #[test]
    fn test_rng_range() {
        let mut rng = LightRng::new(1);
        for _ in 0..10_000 {
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v), "sample {} out of range", v);
        }
    }

    #[test]
    fn test_initial_positions_inside_extent() {
        let set = demo_set(MAX_LIGHTS);
        let extent = set.extent();
        for (i, light) in set.records().iter().enumerate() {
            assert!(
                extent.contains(light.position()),
                "light {} at {} outside extent",
                i,
                light.position()
            );
            assert_eq!(light.position[3], 1.0);
            assert_eq!(light.radius, LIGHT_RADIUS);
            for c in light.color {
                assert!((0.0..2.0).contains(&c));
            }
        }
    }

    #[test]
    fn test_same_seed_same_lights() {
        assert_eq!(demo_set(64).records(), demo_set(64).records());
    }

    #[test]
    fn test_initialize_rejects_bad_input() {
        let mut rng = LightRng::new(0);
        assert_eq!(
            LightSet::initialize(0, Vec3::ZERO, Vec3::ONE, &mut rng).unwrap_err(),
            LightError::ZeroCapacity
        );
        assert!(matches!(
            LightSet::initialize(4, Vec3::ONE, Vec3::ZERO, &mut rng),
            Err(LightError::InvertedExtent { .. })
        ));
    }

    #[test]
    fn test_active_count_is_prefix() {
        let mut set = demo_set(32);
        assert_eq!(set.active_count(), 32);

        set.set_active_count(5).unwrap();
        assert_eq!(set.active().len(), 5);
        assert_eq!(set.active(), &set.records()[..5]);
        assert_eq!(set.config().num_lights, 5);
        assert_eq!(set.capacity(), 32);

        assert!(set.set_active_count(0).is_err());
        assert!(set.set_active_count(33).is_err());
        assert_eq!(set.active_count(), 5);
    }

    #[test]
    fn test_workgroup_count() {
        assert_eq!(workgroup_count(1), 1);
        assert_eq!(workgroup_count(64), 1);
        assert_eq!(workgroup_count(65), 2);
        assert_eq!(workgroup_count(128), 2);
        assert_eq!(workgroup_count(MAX_LIGHTS), 16);
    }

    #[test]
    fn test_step_moves_only_y_of_active_lights() {
        let mut set = demo_set(128);
        set.set_active_count(100).unwrap();
        let before = set.records().to_vec();

        set.step();

        let extent = set.extent();
        for (i, (old, new)) in before.iter().zip(set.records()).enumerate() {
            assert_eq!(old.position[0], new.position[0]);
            assert_eq!(old.position[2], new.position[2]);
            assert_eq!(old.color, new.color);
            if i < 100 {
                assert_ne!(old.position[1], new.position[1], "light {} did not move", i);
                let fell = (old.position[1] - fall_speed(i) - new.position[1]).abs() < 1e-4;
                let wrapped = new.position[1] == extent.max[1];
                assert!(fell || wrapped);
            } else {
                assert_eq!(old.position[1], new.position[1], "inactive light {} moved", i);
            }
        }
    }

    #[test]
    fn test_step_wraps_to_top() {
        let mut rng = LightRng::new(3);
        let mut set =
            LightSet::initialize(1, Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0), &mut rng)
                .unwrap();
        // Falling 0.5 per frame from at most 1.0 leaves the box within 5 frames.
        let mut wrapped = false;
        for _ in 0..5 {
            set.step();
            if set.records()[0].position[1] == 1.0 {
                wrapped = true;
            }
        }
        assert!(wrapped);
        assert!(set.extent().contains(set.records()[0].position()));
    }
}
