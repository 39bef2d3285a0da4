//! Particle record layout and codec.
//!
//! Each slot of a system's instance buffer holds one [`ParticleRecord`]:
//! 16 floats, 64 bytes, read directly by the GPU as per-instance attributes.
//! The functions here read and write single slots of a flat `f32` buffer and
//! keep no state of their own.

use bytemuck::{Pod, Zeroable};

use crate::backend::AttributeDesc;

/// Floats per particle record
pub const RECORD_STRIDE: usize = 16;

/// Bytes per particle record
pub const RECORD_BYTES: usize = RECORD_STRIDE * std::mem::size_of::<f32>();

/// Position used for slots that have never been spawned into
pub const DEAD_POSITION: f32 = -9e9;

/// Lifespan marking a dead slot
pub const DEAD_LIFE: f32 = -1.0;

/// Per-instance attributes, offsets in floats from the start of a record
pub const INSTANCE_ATTRIBUTES: [AttributeDesc; 5] = [
    AttributeDesc::new("position", 4, 0),
    AttributeDesc::new("velocity", 4, 4),
    AttributeDesc::new("color", 4, 8),
    AttributeDesc::new("scale", 2, 12),
    AttributeDesc::new("life", 2, 14),
];

/// Floats per vertex (uv only)
pub const VERTEX_STRIDE: usize = 2;

/// Corner uvs of the unit quad every particle is drawn with
pub const QUAD_VERTICES: [f32; 8] = [-1.0, -1.0, -1.0, 1.0, 1.0, 1.0, 1.0, -1.0];

pub const QUAD_INDICES: [u16; 6] = [0, 2, 1, 0, 3, 2];

pub const VERTEX_ATTRIBUTES: [AttributeDesc; 1] = [AttributeDesc::new("uv", 2, 0)];

/// Point particles are one vertex at the instance origin
pub const POINT_VERTICES: [f32; 2] = [0.0, 0.0];

pub const POINT_INDICES: [u16; 1] = [0];

/// GPU instance data, bound to vertex locations 1-5 of the particle shader.
/// 64 bytes (4 rows of vec4).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleRecord {
    pub position: [f32; 4], // xyz = spawn position, w = birth time
    pub velocity: [f32; 4], // xyz = initial velocity, w unused
    pub color: [f32; 4],    // rgba
    pub scale: [f32; 2],    // quad half-extents
    pub life: [f32; 2],     // x = birth time, y = lifespan
}

impl ParticleRecord {
    /// The pattern every slot holds before its first spawn
    pub const DEAD: Self = Self {
        position: [DEAD_POSITION, DEAD_POSITION, DEAD_POSITION, 0.0],
        velocity: [0.0; 4],
        color: [0.0; 4],
        scale: [0.0; 2],
        life: [0.0, DEAD_LIFE],
    };

    /// Build the record a spawn at clock value `now` writes
    pub fn spawned(now: f32, init: &ParticleInit) -> Self {
        let [px, py, pz] = init.position;
        let [vx, vy, vz] = init.velocity;
        Self {
            position: [px, py, pz, now],
            velocity: [vx, vy, vz, 0.0],
            color: init.color,
            scale: init.scale,
            life: [now, init.life],
        }
    }

    pub fn birth(&self) -> f32 {
        self.life[0]
    }

    pub fn lifespan(&self) -> f32 {
        self.life[1]
    }

    /// Never spawned into since construction
    pub fn is_dead(&self) -> bool {
        self.life[1] < 0.0
    }

    /// Seconds since spawn at clock value `now`
    pub fn age(&self, now: f32) -> f32 {
        now - self.life[0]
    }

    /// Same test the vertex shader uses to hide a particle
    pub fn is_expired(&self, now: f32) -> bool {
        self.is_dead() || self.age(now) > self.life[1]
    }
}

impl Default for ParticleRecord {
    fn default() -> Self {
        Self::DEAD
    }
}

/// Initial values for one spawn
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleInit {
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub color: [f32; 4],
    pub scale: [f32; 2],
    /// Lifespan in seconds
    pub life: f32,
}

impl Default for ParticleInit {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            velocity: [0.0; 3],
            color: [1.0, 1.0, 1.0, 0.3],
            scale: [0.3, 0.3],
            life: 1.0,
        }
    }
}

/// Write a freshly spawned particle into `slot`.
///
/// No range checks on the values: NaN or infinite inputs are stored as-is.
///
/// # Panics
/// If `slot` lies outside `buffer`.
pub fn init(buffer: &mut [f32], slot: usize, now: f32, particle: &ParticleInit) {
    write(buffer, slot, &ParticleRecord::spawned(now, particle));
}

/// Write the dead pattern into `slot`.
///
/// # Panics
/// If `slot` lies outside `buffer`.
pub fn reset(buffer: &mut [f32], slot: usize) {
    write(buffer, slot, &ParticleRecord::DEAD);
}

/// Copy the record stored at `slot`.
///
/// # Panics
/// If `slot` lies outside `buffer`.
pub fn read(buffer: &[f32], slot: usize) -> ParticleRecord {
    let i = slot * RECORD_STRIDE;
    bytemuck::cast_slice::<f32, ParticleRecord>(&buffer[i..i + RECORD_STRIDE])[0]
}

fn write(buffer: &mut [f32], slot: usize, record: &ParticleRecord) {
    let i = slot * RECORD_STRIDE;
    buffer[i..i + RECORD_STRIDE].copy_from_slice(bytemuck::cast_slice(std::slice::from_ref(record)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_init() -> ParticleInit {
        ParticleInit {
            position: [1.0, 2.0, 3.0],
            velocity: [4.0, 5.0, 6.0],
            color: [0.1, 0.2, 0.3, 0.4],
            scale: [0.5, 0.6],
            life: 3.0,
        }
    }

    #[test]
    fn record_layout() {
        assert_eq!(std::mem::size_of::<ParticleRecord>(), RECORD_BYTES);
        assert_eq!(RECORD_BYTES, 64);
        assert_eq!(std::mem::align_of::<ParticleRecord>(), 4);
    }

    #[test]
    fn attribute_table_covers_record() {
        let total: u32 = INSTANCE_ATTRIBUTES.iter().map(|a| a.size).sum();
        assert_eq!(total as usize, RECORD_STRIDE);
        let mut expected_offset = 0;
        for attr in &INSTANCE_ATTRIBUTES {
            assert_eq!(attr.offset, expected_offset);
            expected_offset += attr.size;
        }
    }

    #[test]
    fn init_writes_fields_at_slot_offset() {
        let mut buffer = vec![0.0; RECORD_STRIDE * 3];
        init(&mut buffer, 1, 7.5, &sample_init());

        let expected: [f32; RECORD_STRIDE] = [
            1.0, 2.0, 3.0, 7.5, // position + birth
            4.0, 5.0, 6.0, 0.0, // velocity
            0.1, 0.2, 0.3, 0.4, // color
            0.5, 0.6, // scale
            7.5, 3.0, // life
        ];
        assert_eq!(&buffer[RECORD_STRIDE..RECORD_STRIDE * 2], &expected[..]);
        // Neighbours untouched
        assert!(buffer[..RECORD_STRIDE].iter().all(|v| *v == 0.0));
        assert!(buffer[RECORD_STRIDE * 2..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn reset_writes_dead_pattern() {
        let mut buffer = vec![1.0; RECORD_STRIDE * 2];
        reset(&mut buffer, 0);
        let record = read(&buffer, 0);
        assert_eq!(record, ParticleRecord::DEAD);
        assert!(record.is_dead());
        assert!(record.position[..3].iter().all(|p| *p <= DEAD_POSITION));
        assert_eq!(read(&buffer, 1).position, [1.0; 4]);
    }

    #[test]
    fn nan_input_is_stored_verbatim() {
        let mut buffer = vec![0.0; RECORD_STRIDE];
        let particle = ParticleInit {
            velocity: [f32::NAN, f32::INFINITY, 0.0],
            ..sample_init()
        };
        init(&mut buffer, 0, 0.0, &particle);
        let record = read(&buffer, 0);
        assert!(record.velocity[0].is_nan());
        assert_eq!(record.velocity[1], f32::INFINITY);
    }

    #[test]
    fn expiry_follows_age() {
        let record = ParticleRecord::spawned(2.0, &sample_init());
        assert!(!record.is_dead());
        assert!((record.age(4.0) - 2.0).abs() < 1e-6);
        assert!(!record.is_expired(5.0));
        assert!(record.is_expired(5.5));
        assert!(ParticleRecord::DEAD.is_expired(0.0));
    }

    #[test]
    #[should_panic]
    fn out_of_range_slot_panics() {
        let mut buffer = vec![0.0; RECORD_STRIDE * 2];
        reset(&mut buffer, 2);
    }
}
