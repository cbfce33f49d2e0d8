use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use rstest::rstest;

use tone_toner::clipboard::{ClipboardError, ClipboardSink};
use tone_toner::config::BackendConfig;
use tone_toner::coordinator;
use tone_toner::orchestrator::{App, UserInput};
use tone_toner::request::{Backend, BackendError, FormInput, HttpBackend, ProcessResponse, RewriteRequest};
use tone_toner::state::{Alert, AppState, Presentation};
use tone_toner::surface::{Surface, SurfaceError, SurfaceEvent};
use tone_toner::variants::OptionSlot;
use tone_toner::view::Control;

const BLOB: &str = "選項1：你好嗎\n選項2：你好\n選項3：安安";

struct StubBackend {
    calls: AtomicUsize,
    gate: Option<Mutex<Receiver<()>>>,
    reply: ProcessResponse,
}

impl StubBackend {
    fn answering(reply: ProcessResponse) -> Arc<Self> {
        Arc::new(Self { calls: AtomicUsize::new(0), gate: None, reply })
    }

    /// Holds every request until the returned sender fires once.
    fn gated(reply: ProcessResponse) -> (Arc<Self>, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let backend = Self { calls: AtomicUsize::new(0), gate: Some(Mutex::new(rx)), reply };
        (Arc::new(backend), tx)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Backend for StubBackend {
    fn process(&self, _request: &RewriteRequest) -> Result<ProcessResponse, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _ = gate.lock().unwrap().recv();
        }
        Ok(self.reply.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Seen {
    presentation: Presentation,
    alert: Option<String>,
}

#[derive(Clone, Default)]
struct Recorder {
    seen: Arc<Mutex<Vec<Seen>>>,
    pending: Arc<Mutex<Vec<SurfaceEvent>>>,
    copied: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    fn push_event(&self, event: SurfaceEvent) {
        self.pending.lock().unwrap().push(event);
    }

    fn copied(&self) -> Vec<String> {
        self.copied.lock().unwrap().clone()
    }
}

struct RecordingSink {
    copied: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl ClipboardSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.fail {
            return Err(ClipboardError::Unavailable("test".to_string()));
        }
        self.copied.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

struct RecordingSurface {
    recorder: Recorder,
    modal: bool,
    sink: RecordingSink,
}

impl Surface for RecordingSurface {
    fn present(&mut self, state: &AppState) -> Result<(), SurfaceError> {
        self.recorder.seen.lock().unwrap().push(Seen {
            presentation: state.presentation(),
            alert: state.alert().map(|a| a.message().to_string()),
        });
        Ok(())
    }

    fn poll_events(&mut self) -> Result<Vec<SurfaceEvent>, SurfaceError> {
        Ok(std::mem::take(&mut *self.recorder.pending.lock().unwrap()))
    }

    fn clipboard(&mut self) -> Option<&mut dyn ClipboardSink> {
        Some(&mut self.sink)
    }

    fn modal_alerts(&self) -> bool {
        self.modal
    }
}

fn app_with(backend: Arc<StubBackend>, modal: bool, platform_clipboard_works: bool) -> (App, Recorder) {
    let recorder = Recorder::default();
    let surface = RecordingSurface {
        recorder: recorder.clone(),
        modal,
        sink: RecordingSink { copied: recorder.copied.clone(), fail: !platform_clipboard_works },
    };
    let fallback = RecordingSink { copied: recorder.copied.clone(), fail: true };
    let app = App::new(backend, Box::new(surface), Box::new(fallback), Duration::from_millis(2000));
    (app, recorder)
}

fn form() -> FormInput {
    FormInput::new("今日天氣好好", "溫暖", "廣東話")
}

fn tick_until_idle(app: &mut App) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while app.state().is_busy() {
        assert!(Instant::now() < deadline, "request never completed");
        app.tick().unwrap();
        thread::sleep(Duration::from_millis(5));
    }
    app.tick().unwrap();
}

#[test]
fn submission_goes_busy_then_reveals() {
    let backend = StubBackend::answering(ProcessResponse::Success { result: BLOB.to_string() });
    let (mut app, recorder) = app_with(backend.clone(), true, true);

    assert!(app.handle_input(UserInput::Submit(form())));
    assert!(app.state().is_busy());
    app.tick().unwrap();
    tick_until_idle(&mut app);

    assert_eq!(backend.calls(), 1);
    let seen = recorder.seen();
    assert_eq!(seen.first().map(|s| s.presentation), Some(Presentation::Busy));
    assert_eq!(seen.last().map(|s| s.presentation), Some(Presentation::Revealed));
    assert_eq!(app.state().revealed_variants().unwrap().get(OptionSlot::Third), "安安");
}

#[rstest]
#[case::paragraph(FormInput::new("", "溫暖", "廣東話"))]
#[case::tone(FormInput::new("段落", "  ", "廣東話"))]
#[case::language(FormInput::new("段落", "溫暖", ""))]
fn missing_field_never_sends(#[case] form: FormInput) {
    let backend = StubBackend::answering(ProcessResponse::Success { result: BLOB.to_string() });
    let (mut app, recorder) = app_with(backend.clone(), false, true);

    app.handle_input(UserInput::Submit(form));
    app.tick().unwrap();

    assert_eq!(backend.calls(), 0);
    assert_eq!(app.state().presentation(), Presentation::Idle);
    // Terminal-style surfaces show the alert once, then it is cleared.
    assert!(recorder.seen().iter().any(|s| s.alert.as_deref() == Some("請填寫所有必要欄位")));
    assert!(app.state().alert().is_none());
}

#[test]
fn second_submit_while_busy_is_refused() {
    let (backend, release) = StubBackend::gated(ProcessResponse::Success { result: BLOB.to_string() });
    let (mut app, _recorder) = app_with(backend.clone(), true, true);

    app.handle_input(UserInput::Submit(form()));
    app.handle_input(UserInput::Submit(form()));
    assert_eq!(app.state().alert(), Some(&Alert::Busy));
    assert!(app.state().is_busy());

    release.send(()).unwrap();
    tick_until_idle(&mut app);
    assert_eq!(backend.calls(), 1);
    assert_eq!(app.state().presentation(), Presentation::Revealed);
}

#[rstest]
#[case::server_message(ProcessResponse::Failure { status: 400, error: Some("無效的語言選項".to_string()) }, "無效的語言選項")]
#[case::no_message(ProcessResponse::Failure { status: 500, error: None }, "處理時發生錯誤")]
fn failure_clears_busy_and_keeps_output_hidden(#[case] reply: ProcessResponse, #[case] message: &str) {
    let backend = StubBackend::answering(reply);
    let (mut app, _recorder) = app_with(backend, true, true);

    app.handle_input(UserInput::Submit(form()));
    tick_until_idle(&mut app);

    assert_eq!(app.state().presentation(), Presentation::Idle);
    assert!(app.state().revealed_variants().is_none());
    assert_eq!(app.state().alert().map(Alert::message), Some(message));
}

#[test]
fn unreachable_backend_is_a_network_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let backend = HttpBackend::new(&BackendConfig {
        base_url: format!("http://127.0.0.1:{port}"),
        timeout_secs: Some(5),
    })
    .unwrap();

    let mut state = AppState::new();
    coordinator::submit(&mut state, &form(), &backend);
    assert!(!state.is_busy());
    assert_eq!(state.alert(), Some(&Alert::Network));
}

#[test]
fn copy_button_uses_platform_clipboard_and_acknowledges() {
    let backend = StubBackend::answering(ProcessResponse::Success { result: BLOB.to_string() });
    let (mut app, recorder) = app_with(backend, true, true);
    app.handle_input(UserInput::Submit(form()));
    tick_until_idle(&mut app);

    recorder.push_event(SurfaceEvent::Control(Control::Copy(OptionSlot::Second)));
    app.tick().unwrap();

    assert_eq!(recorder.copied(), vec!["你好".to_string()]);
    assert_eq!(app.state().copy_feedback().map(|f| f.slot), Some(OptionSlot::Second));
}

#[test]
fn copy_failure_alerts_until_dismissed() {
    let backend = StubBackend::answering(ProcessResponse::Success { result: BLOB.to_string() });
    let (mut app, recorder) = app_with(backend, true, false);
    app.handle_input(UserInput::Submit(form()));
    tick_until_idle(&mut app);

    app.handle_input(UserInput::Copy(OptionSlot::First));
    app.tick().unwrap();
    assert_eq!(app.state().alert(), Some(&Alert::CopyFailed));
    assert!(recorder.copied().is_empty());

    recorder.push_event(SurfaceEvent::Control(Control::DismissAlert));
    app.tick().unwrap();
    assert!(app.state().alert().is_none());
    assert!(app.state().revealed_variants().is_some());
}

#[test]
fn finish_waits_for_the_request_in_flight() {
    let (backend, release) = StubBackend::gated(ProcessResponse::Success { result: BLOB.to_string() });
    let (mut app, _recorder) = app_with(backend, true, true);
    app.handle_input(UserInput::Submit(form()));

    let releaser = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        release.send(()).unwrap();
    });
    app.finish().unwrap();
    releaser.join().unwrap();

    assert_eq!(app.state().presentation(), Presentation::Revealed);
}

#[test]
fn closing_the_surface_stops_the_loop() {
    let backend = StubBackend::answering(ProcessResponse::Success { result: BLOB.to_string() });
    let (mut app, recorder) = app_with(backend, true, true);
    recorder.push_event(SurfaceEvent::CloseRequested);
    assert!(!app.tick().unwrap());
    assert!(!app.handle_input(UserInput::Quit));
}
