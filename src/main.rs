//! Hold Still entry point
//!
//! Native builds run a headless attract-mode session driven by the autopilot
//! and log every event. The browser build goes through `platform::web`.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use hold_still::sim::{GameSession, GameState, tick};
    use hold_still::{Autopilot, InputProvider, Mode};

    env_logger::init();

    // Usage: hold-still [seed] [mode]
    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(20_240_601_u64);
    let mode = args
        .next()
        .and_then(|s| s.parse::<Mode>().ok())
        .unwrap_or_default();

    log::info!("Hold Still (native) starting, seed {}, {} mode", seed, mode);

    let mut session = GameSession::new(seed);
    if mode.is_hidden() {
        session.unlock_hidden_mode();
    }
    if let Err(e) = session.select_mode(mode) {
        log::warn!("{}", e);
    }

    let mut pilot = Autopilot::new();
    let frame_ms = 1000.0 / 60.0;
    let mut now = 0.0;
    session.start(now);

    // Two simulated minutes is plenty for a run to end
    while session.state() != GameState::Finish && now < 120_000.0 {
        pilot.observe(&session);
        tick(&mut session, &pilot.snapshot(), now);
        for event in session.drain_events() {
            println!("{:>8.0}ms  {:?}", now, event);
        }
        now += frame_ms;
    }

    let status = session.status();
    println!(
        "\nState {} after {:.1}s: life {}, distance {:.1}, progress {:.1}, timer {}",
        session.state().as_str(),
        now / 1000.0,
        status.life,
        status.distance,
        status.progress,
        status.timer
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::wasm_start, this is just to satisfy the compiler
}
