//! Deterministic layout fingerprinting.
//!
//! Frames carry no layout version, so peers that disagree on registration
//! order silently misread each other. Exchanging this fingerprint out of band
//! (room properties, join handshake) catches the mismatch before any frame is
//! decoded.

use blake3::Hasher;

use crate::{EntityLayout, FlagDef, ParamDef, ParamKind, SerializerDef, SyncConfig};

/// Computes a deterministic 64-bit fingerprint of a layout.
///
/// The layout name is not hashed; two templates with identical wire
/// contracts share a fingerprint.
#[must_use]
pub fn layout_fingerprint(layout: &EntityLayout) -> u64 {
    let mut hasher = Hasher::new();
    write_u32(&mut hasher, layout.serializers.len() as u32);

    for def in &layout.serializers {
        match def {
            SerializerDef::Flags { flags } => {
                write_u8(&mut hasher, 0);
                write_u32(&mut hasher, flags.len() as u32);
                for flag in flags {
                    write_flag(&mut hasher, flag);
                }
            }
            SerializerDef::AnimatorParams { params } => {
                write_u8(&mut hasher, 1);
                write_u32(&mut hasher, params.len() as u32);
                for param in params {
                    write_param(&mut hasher, param);
                }
            }
            SerializerDef::AnimatorState => {
                write_u8(&mut hasher, 2);
            }
        }
    }
    write_sync(&mut hasher, &layout.sync);

    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

fn write_flag(hasher: &mut Hasher, flag: &FlagDef) {
    write_str(hasher, &flag.name);
    write_u8(hasher, u8::from(flag.apply_remote));
}

fn write_param(hasher: &mut Hasher, param: &ParamDef) {
    write_str(hasher, &param.name);
    write_u8(
        hasher,
        match param.kind {
            ParamKind::Trigger => 0,
            ParamKind::Bool => 1,
            ParamKind::Int => 2,
            ParamKind::Float => 3,
        },
    );
    write_u8(hasher, u8::from(param.ignored));
}

fn write_sync(hasher: &mut Hasher, sync: &SyncConfig) {
    write_u64(hasher, sync.flag_resend_ms);
    write_u64(hasher, sync.param_resend_ms);
    write_u64(hasher, sync.state_resync_ms);
    write_u32(hasher, sync.float_epsilon.to_bits());
    write_u32(hasher, sync.float_min.to_bits());
    write_u32(hasher, sync.float_max.to_bits());
}

fn write_str(hasher: &mut Hasher, value: &str) {
    write_u32(hasher, value.len() as u32);
    hasher.update(value.as_bytes());
}

fn write_u8(hasher: &mut Hasher, value: u8) {
    hasher.update(&[value]);
}

fn write_u32(hasher: &mut Hasher, value: u32) {
    hasher.update(&value.to_le_bytes());
}

fn write_u64(hasher: &mut Hasher, value: u64) {
    hasher.update(&value.to_le_bytes());
}
