//! Host-free frame decoding.

use bitstream::{ByteReader, QuantRange};
use schema::{EntityLayout, SerializerDef};
use wire::{FrameReader, Limits};

use crate::error::{CodecError, CodecResult};
use crate::flags::decode_flags;
use crate::params::decode_params;
use crate::record::{DecodedFrame, DecodedRecord, Record};
use crate::state::decode_state;

/// Decodes a whole frame against `layout` without touching any host.
///
/// Fails on the first malformed record; a frame is either fully decoded or
/// rejected.
pub fn decode_frame(
    layout: &EntityLayout,
    bytes: &[u8],
    limits: &Limits,
) -> CodecResult<DecodedFrame> {
    let range = layout.sync.float_range()?;
    let mut reader = FrameReader::new(bytes, limits)?;
    let mut frame = DecodedFrame::default();

    while let Some(index) = reader.next_record()? {
        let def = layout
            .serializers
            .get(index.as_usize())
            .ok_or(CodecError::UnknownSerializer {
                index: index.raw(),
                count: layout.serializers.len(),
            })?;
        let record = decode_record(def, range, reader.payload())?;
        frame.records.push(DecodedRecord { index, record });
    }
    Ok(frame)
}

fn decode_record(
    def: &SerializerDef,
    range: QuantRange,
    reader: &mut ByteReader<'_>,
) -> CodecResult<Record> {
    match def {
        SerializerDef::Flags { .. } => decode_flags(reader),
        SerializerDef::AnimatorParams { params } => decode_params(params, range, reader),
        SerializerDef::AnimatorState => decode_state(reader),
    }
}
