#![no_main]

use codec::{
    decode_frame, Authority, EntityId, EntityReplicator, MemoryHost, ReceiveInfo, SendTimestamp,
};
use libfuzzer_sys::fuzz_target;
use schema::{EntityLayout, FlagDef, ParamDef, ParamKind};

fn layout() -> EntityLayout {
    EntityLayout::builder("fuzz")
        .flags(vec![FlagDef::local_only("dead"), FlagDef::new("facing_left")])
        .animator_params(vec![
            ParamDef::new("jump", ParamKind::Trigger),
            ParamDef::new("on_ground", ParamKind::Bool),
            ParamDef::new("speed", ParamKind::Float),
            ParamDef::new("combo", ParamKind::Int),
            ParamDef::new("debug", ParamKind::Bool).ignored(),
        ])
        .animator_state()
        .build()
        .expect("fuzz layout")
}

fuzz_target!(|data: &[u8]| {
    let layout = layout();
    let limits = wire::Limits::for_testing();
    let _ = decode_frame(&layout, data, &limits);

    let mut host = MemoryHost::from_layout(&layout);
    let Ok(mut replicator) =
        EntityReplicator::with_limits(EntityId::new(1), layout, &host, Authority::Remote, limits)
    else {
        return;
    };

    // Split the input into frames with increasing timestamps.
    let mut idx = 0usize;
    let mut ts = 0u64;
    while idx < data.len() && idx < 4096 {
        let len = (data[idx] as usize % 64).saturating_add(1);
        idx += 1;
        let end = (idx + len).min(data.len());
        ts += u64::from(data[idx - 1] & 0x3);
        let before = host.clone();
        if replicator
            .on_receive(&mut host, &data[idx..end], ReceiveInfo::new(SendTimestamp::new(ts)))
            .is_err()
        {
            assert_eq!(host, before);
        }
        idx = end;
    }
});
