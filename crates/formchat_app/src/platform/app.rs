use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use engine_logging::{engine_debug, engine_info};
use formchat_core::{update, AppState, AppViewModel, Msg};

use super::config::AppConfig;
use super::effects::EffectRunner;
use super::input::{self, Command};
use super::{persistence, render};

/// Throttles engine polling and rendering.
const TICK: Duration = Duration::from_millis(75);

/// Everything the loop reacts to arrives here, one item at a time.
pub enum Inbox {
    Msg(Msg),
    Line(String),
    InputClosed,
}

pub fn run_app() -> anyhow::Result<()> {
    let config = AppConfig::load(std::env::args_os().nth(1).map(PathBuf::from))?;
    engine_logging::initialize(config.log_target.into(), config.level(), &config.log_file);
    engine_info!(
        "formchat starting api={} socket={} cache={:?}",
        config.api_base_url,
        config.socket_url,
        config.cache_dir
    );

    let (inbox_tx, inbox_rx) = mpsc::channel::<Inbox>();
    let mut runner = EffectRunner::new(&config, inbox_tx.clone())?;
    spawn_stdin_reader(inbox_tx);

    let mut state = AppState::new().with_write_through(config.write_through);
    let mut startup = vec![Msg::SpeechCapabilityDetected(runner.speech_supported())];
    if config.write_through {
        startup.push(Msg::RestoreMessages(persistence::load_messages(runner.cache())));
    }
    startup.push(Msg::ScreenOpened);
    for msg in startup {
        state = dispatch(state, msg, &mut runner);
    }

    println!("{}", input::HELP);
    let mut view = AppViewModel::default();
    loop {
        if state.consume_dirty() {
            view = state.view();
            println!("{}", render::render(&view));
        }

        match inbox_rx.recv_timeout(TICK) {
            Ok(Inbox::Msg(msg)) => state = dispatch(state, msg, &mut runner),
            Ok(Inbox::Line(line)) => match input::parse_line(&line, &view, Utc::now()) {
                Command::Dispatch(msgs) => {
                    for msg in msgs {
                        state = dispatch(state, msg, &mut runner);
                    }
                }
                Command::Help => println!("{}", input::HELP),
                Command::Quit => break,
                Command::Invalid(reason) => {
                    engine_debug!("ignored input {:?}: {}", line, reason);
                    println!("? {reason}");
                }
            },
            Ok(Inbox::InputClosed) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        for msg in runner.poll_engine() {
            state = dispatch(state, msg, &mut runner);
        }
    }

    dispatch(state, Msg::ScreenClosed, &mut runner);
    engine_info!("formchat stopped");
    Ok(())
}

fn dispatch(state: AppState, msg: Msg, runner: &mut EffectRunner) -> AppState {
    let (state, effects) = update(state, msg);
    runner.run(effects);
    state
}

fn spawn_stdin_reader(inbox: mpsc::Sender<Inbox>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if inbox.send(Inbox::Line(line)).is_err() {
                return;
            }
        }
        let _ = inbox.send(Inbox::InputClosed);
    });
}
