use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::io::AsyncReadExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::display::{ClearToken, DisplayState, KioskDisplay};
use super::listener::{Key, TagListener};
use crate::service::attendance::TagResolver;

/// Drives the kiosk screen: scan in, resolve, show, clear after a delay.
///
/// Every transition is published on a watch channel; renderers subscribe with
/// [`KioskSession::subscribe`].
pub struct KioskSession {
    resolver: Arc<dyn TagResolver>,
    display: Arc<Mutex<KioskDisplay>>,
    screen: Arc<watch::Sender<DisplayState>>,
    clear_timer: Mutex<Option<JoinHandle<()>>>,
    clear_after: Duration,
}

impl KioskSession {
    pub fn new(resolver: Arc<dyn TagResolver>, clear_after: Duration) -> Self {
        let (screen, _) = watch::channel(DisplayState::Idle);
        Self {
            resolver,
            display: Arc::new(Mutex::new(KioskDisplay::new())),
            screen: Arc::new(screen),
            clear_timer: Mutex::new(None),
            clear_after,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.screen.subscribe()
    }

    #[cfg(test)]
    pub fn current(&self) -> DisplayState {
        self.display
            .lock()
            .expect("kiosk display poisoned")
            .state()
            .clone()
    }

    pub async fn on_tag(&self, tag: String) {
        let request = {
            let mut display = self.display.lock().expect("kiosk display poisoned");
            self.cancel_clear_timer();
            let request = display.begin(&tag);
            self.screen.send_replace(display.state().clone());
            request
        };

        let outcome = self.resolver.resolve(&tag).await;

        // the timer is armed while the display lock is held
        let mut display = self.display.lock().expect("kiosk display poisoned");
        let token = match &outcome {
            Ok(toggle) => display.succeed(request, toggle),
            Err(err) => display.fail(request, err.to_string()),
        };
        match token {
            Some(token) => {
                self.screen.send_replace(display.state().clone());
                self.schedule_clear(token);
            }
            None => debug!(rfid_tag = %tag, "Discarding result of superseded scan"),
        }
    }

    /// Manual clear back to the idle screen.
    pub fn clear(&self) {
        let mut kiosk = self.display.lock().expect("kiosk display poisoned");
        let pending = kiosk.has_pending_clear();
        debug!(timer_pending = pending, "Manual kiosk clear");
        self.cancel_clear_timer();
        kiosk.clear();
        self.screen.send_replace(DisplayState::Idle);
    }

    fn cancel_clear_timer(&self) {
        if let Some(handle) = self
            .clear_timer
            .lock()
            .expect("kiosk timer poisoned")
            .take()
        {
            // no-op if it already fired
            handle.abort();
        }
    }

    /// Callers hold the display lock.
    fn schedule_clear(&self, token: ClearToken) {
        let display = self.display.clone();
        let screen = self.screen.clone();
        let delay = self.clear_after;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut display = display.lock().expect("kiosk display poisoned");
            if display.expire(token) {
                screen.send_replace(DisplayState::Idle);
            }
        });

        let previous = self
            .clear_timer
            .lock()
            .expect("kiosk timer poisoned")
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

const ESCAPE: u8 = 0x1b;

/// Feeds the session from raw stdin bytes, as a keyboard-wedge reader on a
/// console would type them, and prints each screen change. Escape clears the screen.
pub async fn run_stdin(session: Arc<KioskSession>, idle_timeout: Option<Duration>) -> std::io::Result<()> {
    let mut screen = session.subscribe();
    tokio::spawn(async move {
        println!("{}", *screen.borrow_and_update());
        while screen.changed().await.is_ok() {
            println!("{}", *screen.borrow_and_update());
        }
    });

    info!("Kiosk listening on stdin");

    let mut listener = TagListener::new(idle_timeout);
    let mut stdin = tokio::io::stdin();
    let mut buf = [0u8; 256];

    loop {
        let n = stdin.read(&mut buf).await?;
        if n == 0 {
            info!("Kiosk input closed");
            return Ok(());
        }
        let now = Instant::now();
        for &byte in &buf[..n] {
            if byte == ESCAPE {
                listener.reset();
                session.clear();
                continue;
            }
            if let Some(tag) = listener.on_key(Key::from_byte(byte), now) {
                let session = session.clone();
                tokio::spawn(async move { session.on_tag(tag).await });
            }
        }
    }
}
