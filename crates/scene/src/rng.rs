use glam::Vec3;
use std::f32::consts::TAU;

/// Seeded splitmix64 generator used for scene population.
///
/// The same seed always yields the same sequence, on every platform.
#[derive(Debug, Clone)]
pub struct SphereRng {
    state: u64,
}

impl SphereRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`, 24 bits of precision.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u32 << 24) as f32
    }

    /// Uniformly distributed point on the unit sphere.
    pub fn unit_sphere(&mut self) -> Vec3 {
        let z = self.next_f32() * 2.0 - 1.0;
        let phi = self.next_f32() * TAU;
        let r = (1.0 - z * z).max(0.0).sqrt();
        Vec3::new(r * phi.cos(), r * phi.sin(), z)
    }

    /// Uniformly distributed point on a sphere of the given radius.
    pub fn spherical(&mut self, radius: f32) -> Vec3 {
        self.unit_sphere() * radius
    }
}
