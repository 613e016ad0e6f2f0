//! Main rover-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logger and parameters
//!     - Start the background threads:
//!         - Stream mode: one subscription per stream plus the telemetry publisher
//!         - Poll mode: the note poller, which also publishes telemetry
//!     - Main loop:
//!         - Dispatch received messages to the telecommand processor
//!         - Sample the battery voltage and link strength every sample period
//!
//! The main loop is the only writer of the device state. The executive runs until killed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::{debug, error, info};
use std::{
    path::PathBuf,
    sync::mpsc::{sync_channel, RecvTimeoutError},
    time::Instant,
};
use structopt::StructOpt;

// Internal
use rov_lib::{
    act_if::SimActuators,
    data_store::{DeviceState, SharedState},
    note_client::{spawn_poller, NoteClient},
    params::{OpMode, RovExecParams},
    stream_client::{spawn_subscription, StreamClient},
    tc_processor::TcProcessor,
    tm_publisher::{TmPublisher, TmSink},
};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "rov_exec", about = "Rover command and telemetry executive")]
struct Opt {
    /// Parameter file, relative to the params directory unless absolute
    #[structopt(short, long, default_value = "rov_exec.toml", parse(from_os_str))]
    params: PathBuf,

    /// Override the mode from the parameter file (stream or poll)
    #[structopt(short, long, parse(try_from_str = parse_mode))]
    mode: Option<OpMode>,

    /// Log debug messages and below
    #[structopt(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("rov_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    let log_level = if opt.verbose {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    };
    logger_init(log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Rover Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let mut params: RovExecParams = if opt.params.is_absolute() {
        util::params::load_from::<RovExecParams, _>(&opt.params)
    } else {
        util::params::load::<RovExecParams>(&opt.params.to_string_lossy())
    }
    .wrap_err("Could not load the executable parameters")?;

    if let Some(mode) = opt.mode {
        params.mode = mode;
    }

    params.validate().wrap_err("Invalid executable parameters")?;

    info!("Exec parameters loaded");
    info!("    API: {} (mission {})", params.api_base_url, params.mission);
    info!("    Mode: {:?}", params.mode);

    // ---- INITIALISE STATE AND ACTUATORS ----

    let boot = Instant::now();
    let state = SharedState::new(DeviceState::new(&params.boot));
    let act = SimActuators::new(params.sim.clone());

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let (sender, receiver) = sync_channel(params.queue_size);

    let note_client = NoteClient::new(params.api(), params.http_timeout())
        .wrap_err("Failed to initialise the NoteClient")?;

    match params.mode {
        OpMode::Stream => {
            let stream_client = StreamClient::new(
                params.api(),
                params.stream_timeout(),
                params.http_timeout(),
                params.reconnect_backoff(),
                params.stream_buffer_size,
            )
            .wrap_err("Failed to initialise the StreamClient")?;

            for stream_name in params.streams.iter() {
                spawn_subscription(stream_client.clone(), stream_name.clone(), sender.clone())
                    .wrap_err_with(|| format!("Failed to subscribe to {}", stream_name))?;
                info!("Subscribed to {}", stream_name);
            }

            TmPublisher::new(
                TmSink::Stream {
                    client: stream_client,
                    stream_name: params.telemetry_stream.clone(),
                },
                state.clone(),
                boot,
            )
            .spawn(params.telemetry_period())
            .wrap_err("Failed to start the telemetry publisher")?;
        }
        OpMode::Poll => {
            let publisher =
                TmPublisher::new(TmSink::Notes(note_client.clone()), state.clone(), boot);

            spawn_poller(
                note_client.clone(),
                publisher,
                sender.clone(),
                params.poll_period(),
            )
            .wrap_err("Failed to start the note poller")?;
            info!("Polling the note queue every {} s", params.poll_period_s);
        }
    }

    // Only the background threads hold senders, so the queue closes if they all stop
    drop(sender);

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    let mut tc_processor = TcProcessor::new(act, state, Some(note_client));
    let sample_period = params.sample_period();

    tc_processor.sample();
    let mut next_sample = Instant::now() + sample_period;

    info!("Begining main loop\n");

    loop {
        let wait = next_sample.saturating_duration_since(Instant::now());

        match receiver.recv_timeout(wait) {
            Ok(msg) => tc_processor.handle_message(&msg),
            Err(RecvTimeoutError::Timeout) => (),
            Err(RecvTimeoutError::Disconnected) => {
                error!("All message sources have stopped");
                break;
            }
        }

        if Instant::now() >= next_sample {
            tc_processor.sample();
            next_sample = Instant::now() + sample_period;
        }
    }

    // ---- SHUTDOWN ----

    info!("End of execution");

    Err(eyre!("The executive stopped receiving telecommands"))
}

fn parse_mode(s: &str) -> Result<OpMode, String> {
    match s.to_ascii_lowercase().as_str() {
        "stream" => Ok(OpMode::Stream),
        "poll" => Ok(OpMode::Poll),
        _ => Err(format!("Expected \"stream\" or \"poll\", found {:?}", s)),
    }
}
