use std::time::Duration;

use codec::{
    decode_frame, Animator, Authority, EntityHost, EntityId, EntityReplicator, MemoryHost,
    ReceiveInfo, SendTimestamp, WireLimits,
};
use proptest::prelude::*;
use schema::{EntityLayout, FlagDef, ParamDef, ParamKind};

fn layout() -> EntityLayout {
    EntityLayout::builder("player")
        .flags(vec![
            FlagDef::local_only("dead"),
            FlagDef::new("facing_left"),
            FlagDef::new("crouching"),
        ])
        .animator_params(vec![
            ParamDef::new("jump", ParamKind::Trigger),
            ParamDef::new("on_ground", ParamKind::Bool),
            ParamDef::new("velocity_x", ParamKind::Float),
            ParamDef::new("combo", ParamKind::Int),
        ])
        .animator_state()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn remote_converges_to_owner(
        facing_left in any::<bool>(),
        crouching in any::<bool>(),
        on_ground in any::<bool>(),
        velocity in -100.0f32..=100.0,
        combo in -100i32..=100,
        state_hash in any::<i32>(),
        time in 0.0f32..=1.0,
    ) {
        let layout = layout();
        let mut owner = MemoryHost::from_layout(&layout);
        owner.set_flag("dead", true);
        owner.set_flag("facing_left", facing_left);
        owner.set_flag("crouching", crouching);
        {
            let animator = owner.memory_animator_mut().unwrap();
            animator.set_bool(1, on_ground);
            animator.set_float(2, velocity);
            animator.set_int(3, combo);
            animator.play(state_hash, time);
        }
        let mut tx = EntityReplicator::new(EntityId::new(1), layout.clone(), &owner, Authority::Owner).unwrap();
        let frame = tx.on_send(&owner, Duration::ZERO).unwrap();

        let mut remote = MemoryHost::from_layout(&layout);
        let mut rx = EntityReplicator::new(EntityId::new(1), layout, &remote, Authority::Remote).unwrap();
        rx.on_receive(&mut remote, &frame, ReceiveInfo::new(SendTimestamp::new(1))).unwrap();

        prop_assert_eq!(remote.flag("dead"), Some(false));
        prop_assert_eq!(remote.flag("facing_left"), Some(facing_left));
        prop_assert_eq!(remote.flag("crouching"), Some(crouching));
        let a = remote.animator().unwrap();
        prop_assert_eq!(a.bool_value(1), on_ground);
        prop_assert!((a.float_value(2) - velocity).abs() <= 200.0 / 65535.0 + 1e-4);
        prop_assert_eq!(a.int_value(3), combo);
        prop_assert_eq!(a.current_state().state_hash, state_hash);
        prop_assert!((a.current_state().normalized_time - time).abs() <= 1.0 / 255.0 + 1e-6);
    }

    #[test]
    fn decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let _ = decode_frame(&layout(), &bytes, &WireLimits::default());
    }

    #[test]
    fn rejected_frames_leave_host_untouched(bytes in proptest::collection::vec(any::<u8>(), 0..32)) {
        let layout = layout();
        let mut remote = MemoryHost::from_layout(&layout);
        let before = remote.clone();
        let mut rx = EntityReplicator::new(EntityId::new(1), layout, &remote, Authority::Remote).unwrap();
        if rx.on_receive(&mut remote, &bytes, ReceiveInfo::new(SendTimestamp::new(1))).is_err() {
            prop_assert_eq!(remote, before);
            prop_assert_eq!(rx.last_applied(), None);
        }
    }
}
