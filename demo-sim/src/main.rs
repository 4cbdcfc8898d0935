use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use codec::{
    Animator, ApplyOutcome, Authority, EntityHost, EntityId, EntityRegistry, MemoryHost,
    OutgoingFrame, ReceiveInfo, WireLimits,
};
use schema::{layout_fingerprint, EntityLayout, FlagDef, ParamDef, ParamKind, SerializerDef};
use serde::Serialize;
use tools::decode_frame_json;

const TICK: Duration = Duration::from_millis(16);

// Animator parameter indices of the player layout.
const ON_GROUND: usize = 0;
const VELOCITY_X: usize = 1;
const VELOCITY_Y: usize = 2;
const JUMP: usize = 3;
const HURT: usize = 4;
const COMBO: usize = 5;
const DEBUG_OVERLAY: usize = 6;

const IDLE_STATE: i32 = 0x1d2f_6a01;
const AIRBORNE_STATE: i32 = 0x5e11_0b72;

#[derive(Parser)]
#[command(
    name = "demo-sim",
    version,
    about = "Deterministic two-peer replication capture generator"
)]
struct Cli {
    /// Number of simulated players.
    #[arg(long, default_value_t = 8)]
    players: u32,
    /// Number of game ticks to simulate (16 ms each).
    #[arg(long, default_value_t = 600)]
    ticks: u32,
    /// Game ticks between network sends.
    #[arg(long, default_value_t = 6)]
    send_every: u32,
    /// RNG seed for deterministic results.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// One-way base latency in milliseconds.
    #[arg(long, default_value_t = 60)]
    latency_ms: u64,
    /// Extra random delay per frame, which reorders frames.
    #[arg(long, default_value_t = 120)]
    jitter_ms: u64,
    /// Percentage of frames the channel drops.
    #[arg(long, default_value_t = 5)]
    drop_percent: u32,
    /// Output directory for captures.
    #[arg(long, default_value = "captures")]
    out_dir: PathBuf,
    /// Fail if p95 frame size exceeds this value.
    #[arg(long)]
    max_p95_frame_bytes: Option<u64>,
    /// Fail if average frame size exceeds this value.
    #[arg(long)]
    max_avg_frame_bytes: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    anyhow::ensure!(cli.send_every > 0, "--send-every must be positive");
    let layout = player_layout()?;
    let limits = WireLimits::default();

    let frames_dir = cli.out_dir.join("frames");
    fs::create_dir_all(&frames_dir)
        .with_context(|| format!("create output dir {}", frames_dir.display()))?;
    write_json(&cli.out_dir.join("layout.json"), &layout)?;

    let mut owner: EntityRegistry<MemoryHost> = EntityRegistry::new(limits.clone());
    let mut remote: EntityRegistry<MemoryHost> = EntityRegistry::new(limits.clone());
    for idx in 0..cli.players {
        let id = EntityId::new(idx + 1);
        owner.spawn(id, layout.clone(), MemoryHost::from_layout(&layout), Authority::Owner)?;
        remote.spawn(id, layout.clone(), MemoryHost::from_layout(&layout), Authority::Remote)?;
    }

    let mut rng = Rng::new(cli.seed);
    let mut channel = Channel::new(cli.latency_ms, cli.jitter_ms, cli.drop_percent);
    let mut summary = Summary::new(&cli, layout_fingerprint(&layout));

    let mut now = Duration::ZERO;
    for tick in 1..=cli.ticks {
        now += TICK;
        for id in owner.ids().collect::<Vec<_>>() {
            if let Some(entity) = owner.get_mut(id) {
                step_player(&mut entity.host, &mut rng);
            }
        }
        owner.tick(now)?;

        if tick % cli.send_every == 0 {
            for frame in owner.collect_outgoing(now)? {
                let path = frames_dir.join(format!(
                    "frame_{tick:06}_e{:03}.bin",
                    frame.entity.raw()
                ));
                fs::write(&path, &frame.bytes)
                    .with_context(|| format!("write {}", path.display()))?;
                decode_frame_json(&frame.bytes, &layout, &limits)
                    .with_context(|| format!("tools decode {}", path.display()))?;
                summary.push_frame(frame.bytes.len() as u64);
                channel.send(frame, now, &mut rng);
            }
        }
        deliver(&mut remote, channel.due(now), &mut summary)?;
    }

    // Quiet period: state stops changing and the channel turns reliable and
    // ordered, so periodic resends must bring every remote back in line.
    let quiet_ms = layout.sync.state_resync_ms
        + layout.sync.flag_resend_ms.max(layout.sync.param_resend_ms)
        + u64::from(cli.send_every) * TICK.as_millis() as u64
        + cli.latency_ms
        + cli.jitter_ms;
    channel.drop_percent = 0;
    channel.jitter_ms = 0;
    let quiet_ticks = u32::try_from(quiet_ms / TICK.as_millis() as u64 + 1).unwrap_or(u32::MAX);
    for tick in 1..=quiet_ticks {
        now += TICK;
        owner.tick(now)?;
        if tick % cli.send_every == 0 {
            for frame in owner.collect_outgoing(now)? {
                channel.send(frame, now, &mut rng);
            }
        }
        deliver(&mut remote, channel.due(now), &mut summary)?;
    }
    now += Duration::from_millis(cli.latency_ms + cli.jitter_ms + 1);
    deliver(&mut remote, channel.due(now), &mut summary)?;

    let mismatches = compare_peers(&owner, &remote, &layout);
    for mismatch in &mismatches {
        tracing::warn!("{mismatch}");
    }
    summary.converged = mismatches.is_empty();
    summary.frames_dropped = channel.dropped;
    summary.finalize();
    write_json(&cli.out_dir.join("summary.json"), &summary)?;
    tracing::info!(
        frames = summary.frames_sent,
        avg_bytes = summary.avg_frame_bytes,
        p95_bytes = summary.p95_frame_bytes,
        stale = summary.frames_stale,
        dropped = summary.frames_dropped,
        "simulation complete"
    );

    anyhow::ensure!(
        summary.converged,
        "remote peers diverged ({} mismatches)",
        mismatches.len()
    );
    summary.assert_budgets(cli.max_p95_frame_bytes, cli.max_avg_frame_bytes)?;
    Ok(())
}

fn player_layout() -> Result<EntityLayout> {
    EntityLayout::builder("player")
        .flags(vec![
            FlagDef::local_only("dead"),
            FlagDef::new("facing_left"),
            FlagDef::new("crouching"),
        ])
        .animator_params(vec![
            ParamDef::new("on_ground", ParamKind::Bool),
            ParamDef::new("velocity_x", ParamKind::Float),
            ParamDef::new("velocity_y", ParamKind::Float),
            ParamDef::new("jump", ParamKind::Trigger),
            ParamDef::new("hurt", ParamKind::Trigger),
            ParamDef::new("combo", ParamKind::Int),
            ParamDef::new("debug_overlay", ParamKind::Bool).ignored(),
        ])
        .animator_state()
        .build()
        .context("build player layout")
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize {}", path.display()))?;
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

fn deliver(
    remote: &mut EntityRegistry<MemoryHost>,
    frames: Vec<OutgoingFrame>,
    summary: &mut Summary,
) -> Result<()> {
    for frame in frames {
        let info = ReceiveInfo::new(frame.timestamp);
        match remote.deliver(frame.entity, &frame.bytes, info) {
            Ok(ApplyOutcome::Applied { .. }) => summary.frames_applied += 1,
            Ok(ApplyOutcome::Stale { .. }) => summary.frames_stale += 1,
            Err(err) => {
                summary.frames_rejected += 1;
                return Err(err).with_context(|| format!("deliver to entity {}", frame.entity));
            }
        }
    }
    Ok(())
}

fn step_player(host: &mut MemoryHost, rng: &mut Rng) {
    let facing_left = {
        let Some(animator) = host.memory_animator_mut() else {
            return;
        };
        // A state transition consumes last tick's triggers.
        animator.reset_trigger(JUMP);
        animator.reset_trigger(HURT);

        let vx = (animator.float_value(VELOCITY_X) + rng.range_f32(-1.5, 1.5)).clamp(-12.0, 12.0);
        animator.set_float(VELOCITY_X, vx);

        let state = animator.current_state();
        if animator.bool_value(ON_GROUND) {
            if rng.one_in(40) {
                animator.set_trigger(JUMP);
                animator.set_bool(ON_GROUND, false);
                animator.set_float(VELOCITY_Y, 9.0);
                animator.play(AIRBORNE_STATE, 0.0);
            } else {
                animator.play(state.state_hash, (state.normalized_time + 1.0 / 30.0) % 1.0);
            }
        } else {
            let vy = animator.float_value(VELOCITY_Y) - 0.6;
            if vy <= -9.0 {
                animator.set_bool(ON_GROUND, true);
                animator.set_float(VELOCITY_Y, 0.0);
                animator.play(IDLE_STATE, 0.0);
            } else {
                animator.set_float(VELOCITY_Y, vy);
            }
        }

        if rng.one_in(200) {
            animator.set_trigger(HURT);
            animator.set_int(COMBO, (animator.int_value(COMBO) + 1) % 50);
        }
        animator.set_bool(DEBUG_OVERLAY, rng.one_in(2));
        vx < 0.0
    };

    host.set_flag("facing_left", facing_left);
    if rng.one_in(90) {
        let crouching = host.flag("crouching").unwrap_or(false);
        host.set_flag("crouching", !crouching);
    }
    if rng.one_in(500) {
        let dead = host.flag("dead").unwrap_or(false);
        host.set_flag("dead", !dead);
    }
}

fn compare_peers(
    owner: &EntityRegistry<MemoryHost>,
    remote: &EntityRegistry<MemoryHost>,
    layout: &EntityLayout,
) -> Vec<String> {
    let mut mismatches = Vec::new();
    let range = layout.sync.float_range().map(|r| r.span()).unwrap_or(0.0);
    let tolerance = range / 65535.0 + 1e-4;

    for id in owner.ids() {
        let (Some(a), Some(b)) = (owner.get(id), remote.get(id)) else {
            mismatches.push(format!("entity {id} missing on remote"));
            continue;
        };
        for def in &layout.serializers {
            match def {
                SerializerDef::Flags { flags } => {
                    for flag in flags.iter().filter(|f| f.apply_remote) {
                        let (x, y) = (a.host.flag(&flag.name), b.host.flag(&flag.name));
                        if x != y {
                            mismatches.push(format!("entity {id} flag {}: {x:?} != {y:?}", flag.name));
                        }
                    }
                }
                SerializerDef::AnimatorParams { params } => {
                    let (Some(x), Some(y)) = (a.host.animator(), b.host.animator()) else {
                        continue;
                    };
                    for (index, param) in params.iter().enumerate() {
                        let same = match param.kind {
                            _ if param.ignored => true,
                            ParamKind::Trigger => true,
                            ParamKind::Bool => x.bool_value(index) == y.bool_value(index),
                            ParamKind::Int => x.int_value(index) == y.int_value(index),
                            ParamKind::Float => {
                                (x.float_value(index) - y.float_value(index)).abs() <= tolerance
                            }
                        };
                        if !same {
                            mismatches.push(format!("entity {id} param {}", param.name));
                        }
                    }
                }
                SerializerDef::AnimatorState => {
                    let (Some(x), Some(y)) = (a.host.animator(), b.host.animator()) else {
                        continue;
                    };
                    if x.current_state().state_hash != y.current_state().state_hash {
                        mismatches.push(format!("entity {id} animator state"));
                    }
                }
            }
        }
    }
    mismatches
}

struct InFlight {
    arrive_at: Duration,
    seq: u64,
    frame: OutgoingFrame,
}

/// Lossy, jittery one-way channel. Jitter reorders frames.
struct Channel {
    latency: Duration,
    jitter_ms: u64,
    drop_percent: u32,
    in_flight: Vec<InFlight>,
    seq: u64,
    dropped: u64,
}

impl Channel {
    fn new(latency_ms: u64, jitter_ms: u64, drop_percent: u32) -> Self {
        Self {
            latency: Duration::from_millis(latency_ms),
            jitter_ms,
            drop_percent,
            in_flight: Vec::new(),
            seq: 0,
            dropped: 0,
        }
    }

    fn send(&mut self, frame: OutgoingFrame, now: Duration, rng: &mut Rng) {
        if rng.next_u32() % 100 < self.drop_percent {
            self.dropped += 1;
            return;
        }
        let jitter = Duration::from_millis(u64::from(rng.next_u32()) % (self.jitter_ms + 1));
        self.seq += 1;
        self.in_flight.push(InFlight {
            arrive_at: now + self.latency + jitter,
            seq: self.seq,
            frame,
        });
    }

    fn due(&mut self, now: Duration) -> Vec<OutgoingFrame> {
        let (mut ready, pending): (Vec<_>, Vec<_>) = self
            .in_flight
            .drain(..)
            .partition(|packet| packet.arrive_at <= now);
        self.in_flight = pending;
        ready.sort_by_key(|packet| (packet.arrive_at, packet.seq));
        ready.into_iter().map(|packet| packet.frame).collect()
    }
}

struct Rng {
    state: u64,
}

impl Rng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    fn one_in(&mut self, n: u32) -> bool {
        self.next_u32() % n.max(1) == 0
    }

    fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        let t = self.next_u32() as f32 / u32::MAX as f32;
        min + t * (max - min)
    }
}

#[derive(Debug, Serialize)]
struct Summary {
    players: u32,
    ticks: u32,
    send_every: u32,
    seed: u64,
    latency_ms: u64,
    jitter_ms: u64,
    drop_percent: u32,
    layout_fingerprint: String,
    frames_sent: u64,
    bytes_sent: u64,
    avg_frame_bytes: u64,
    p95_frame_bytes: u64,
    max_frame_bytes: u64,
    frames_dropped: u64,
    frames_applied: u64,
    frames_stale: u64,
    frames_rejected: u64,
    converged: bool,
    #[serde(skip)]
    frame_sizes: Vec<u64>,
}

impl Summary {
    fn new(cli: &Cli, fingerprint: u64) -> Self {
        Self {
            players: cli.players,
            ticks: cli.ticks,
            send_every: cli.send_every,
            seed: cli.seed,
            latency_ms: cli.latency_ms,
            jitter_ms: cli.jitter_ms,
            drop_percent: cli.drop_percent,
            layout_fingerprint: format!("0x{fingerprint:016x}"),
            frames_sent: 0,
            bytes_sent: 0,
            avg_frame_bytes: 0,
            p95_frame_bytes: 0,
            max_frame_bytes: 0,
            frames_dropped: 0,
            frames_applied: 0,
            frames_stale: 0,
            frames_rejected: 0,
            converged: false,
            frame_sizes: Vec::new(),
        }
    }

    fn push_frame(&mut self, bytes: u64) {
        self.frames_sent += 1;
        self.bytes_sent += bytes;
        self.max_frame_bytes = self.max_frame_bytes.max(bytes);
        self.frame_sizes.push(bytes);
    }

    fn finalize(&mut self) {
        if self.frames_sent > 0 {
            self.avg_frame_bytes = self.bytes_sent / self.frames_sent;
            self.frame_sizes.sort_unstable();
            let idx = ((self.frame_sizes.len() as f64) * 0.95).ceil() as usize;
            let idx = idx.saturating_sub(1).min(self.frame_sizes.len() - 1);
            self.p95_frame_bytes = self.frame_sizes[idx];
        }
    }

    fn assert_budgets(&self, max_p95: Option<u64>, max_avg: Option<u64>) -> Result<()> {
        if let Some(max_p95) = max_p95 {
            if self.p95_frame_bytes > max_p95 {
                anyhow::bail!(
                    "p95 frame bytes {} exceeds budget {}",
                    self.p95_frame_bytes,
                    max_p95
                );
            }
        }
        if let Some(max_avg) = max_avg {
            if self.avg_frame_bytes > max_avg {
                anyhow::bail!(
                    "avg frame bytes {} exceeds budget {}",
                    self.avg_frame_bytes,
                    max_avg
                );
            }
        }
        Ok(())
    }
}
