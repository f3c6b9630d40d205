// Carillon daemon - quarter-hour striker, observers and bus control

use carillon::calendar::{Calendar, ComputedCalendar};
use carillon::config::Settings;
use carillon::connection::ReconnectionStrategy;
use carillon::control::{Bell, ControlHandler, Jukebox, LocalBus, MessageBus, TopicRouter};
use carillon::messaging::{
    NotificationLevel, NotificationSink, create_notification_channel, drain,
};
use carillon::midi::MidiDeviceManager;
use carillon::observers::{Angelus, Festive, Liturgy, NightMuter};
use carillon::striker::{Clock, SystemClock, ThemeLibrary};
use carillon::{Carillon, MemoryOutput, MidirOutput, OutputDevice, Striker, StrikerConfig};
use chrono::TimeDelta;
use std::error::Error;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const NOTIFICATION_RINGBUFFER_CAPACITY: usize = 256;
const MAIN_LOOP_INTERVAL: Duration = Duration::from_millis(250);
const RECONNECT_BASE_DELAY_MS: u64 = 1000;
const RECONNECT_MAX_DELAY_MS: u64 = 30_000;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    port: Option<String>,
    dry_run: bool,
    list_ports: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                args.config = Some(iter.next().ok_or("--config needs a path")?.into());
            }
            "--port" => {
                args.port = Some(iter.next().ok_or("--port needs a name")?);
            }
            "--dry-run" => args.dry_run = true,
            "--list-ports" => args.list_ports = true,
            "--help" | "-h" => {
                return Err(
                    "usage: carillon [--config PATH] [--port NAME] [--dry-run] [--list-ports]"
                        .to_string(),
                );
            }
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }
    Ok(args)
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("carillon=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn open_device(args: &Args, settings: &Settings) -> carillon::Result<Box<dyn OutputDevice>> {
    if args.dry_run {
        info!("Dry run: MIDI output is recorded in memory");
        return Ok(Box::new(MemoryOutput::new()));
    }

    let port = args.port.as_deref().or(settings.midi.port.as_deref());
    if let Some(name) = port {
        if !MidiDeviceManager::new().has_output_port(name) {
            warn!("MIDI port '{}' not present yet, waiting for it", name);
        }
    }
    let strategy = ReconnectionStrategy::with_limits(
        settings.midi.connect_attempts,
        RECONNECT_BASE_DELAY_MS,
        RECONNECT_MAX_DELAY_MS,
    );
    let output = MidirOutput::open_with_retry(port, strategy)?;
    info!("MIDI output '{}' {}", output.port_name(), output.status());
    Ok(Box::new(output))
}

/// Reads `<topic> <payload>` lines from stdin and routes them
fn spawn_stdin_transport(router: Arc<TopicRouter>) -> std::io::Result<()> {
    thread::Builder::new()
        .name("stdin-control".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let (topic, payload) = line.split_once(' ').unwrap_or((line, ""));
                router.dispatch(topic, payload.as_bytes());
            }
        })?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            return Ok(());
        }
    };

    if args.list_ports {
        for device in MidiDeviceManager::new().list_output_ports() {
            let marker = if device.is_default { " (default)" } else { "" };
            println!("{}{}", device.name, marker);
        }
        return Ok(());
    }

    let settings_path = Settings::locate(args.config.as_deref());
    let settings = Settings::load(args.config.as_deref())?;
    info!("Carillon {} starting", env!("CARGO_PKG_VERSION"));

    // Notification channel drained by the main loop
    let (notification_tx, mut notification_rx) =
        create_notification_channel(NOTIFICATION_RINGBUFFER_CAPACITY);
    let notification_tx: NotificationSink = Arc::new(Mutex::new(notification_tx));

    let device = open_device(&args, &settings)?;
    let carillon = Carillon::with_notifications(device, notification_tx.clone());
    if let Err(e) = carillon.set_volume(settings.control.volume) {
        warn!("Initial volume not applied: {}", e);
    }

    let library = ThemeLibrary::new(&settings.striker.basefolder)
        .with_overrides(settings.striker.themes.clone());
    let striker = Striker::new(
        carillon.clone(),
        library,
        StrikerConfig {
            theme: settings.striker.theme.clone(),
            priority: settings.striker.priority,
            lead_time: TimeDelta::seconds(settings.striker.lead_time_secs),
        },
    )
    .with_notifications(notification_tx.clone());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let calendar: Arc<dyn Calendar> = Arc::new(ComputedCalendar::with_clock(clock.clone()));

    // Observers, in tick order
    if let Some(muter) = NightMuter::from_settings(&settings.striker)? {
        muter.register(&striker);
    }
    let liturgy = Arc::new(Liturgy::from_settings(
        &settings.liturgy,
        calendar.clone(),
        settings.striker.theme.clone(),
    )?);
    liturgy.register(&striker);
    if let Some(angelus) = Angelus::from_settings(&settings.angelus)? {
        angelus.register(&striker);
    }
    let festive = Festive::from_settings(&settings.festive, clock.clone())?;
    if !festive.is_empty() {
        festive.register(&striker);
    }
    liturgy.select_theme(&striker);

    // Bus handlers; an external transport delivers through the router
    let bus = Arc::new(LocalBus::new(settings.control.basetopic.clone()));
    let mut router = TopicRouter::new(settings.control.basetopic.clone());
    if settings.control.enabled {
        let mut controller = ControlHandler::new(striker.clone(), bus.clone());
        if let Some(path) = settings_path {
            controller = controller.with_persistence(path, settings.clone());
        }
        router.attach(Arc::new(controller));
    }
    router.attach(Arc::new(Jukebox::from_settings(
        carillon.clone(),
        bus.clone(),
        &settings.jukebox,
    )));
    if settings.bell.enabled {
        router.attach(Arc::new(Bell::from_settings(
            carillon.clone(),
            Some(bus.clone() as Arc<dyn MessageBus>),
            &settings.bell,
        )));
    }
    let router = Arc::new(router);
    info!("Listening on {} topics", router.subscriptions().len());
    spawn_stdin_transport(router)?;

    let _striker_handle = striker.spawn(clock.clone())?;

    let mut today = clock.now().date();
    loop {
        thread::sleep(MAIN_LOOP_INTERVAL);

        for notification in drain(&mut notification_rx) {
            match notification.level {
                NotificationLevel::Error => error!("{}", notification.to_payload()),
                _ => info!("{}", notification.to_payload()),
            }
            bus.publish("status", notification.to_payload().as_bytes());
        }

        let now = clock.now().date();
        if now != today {
            today = now;
            liturgy.select_theme(&striker);
        }
    }
}
