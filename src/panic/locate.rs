//! Finding where a panic came from.
//!
//! By the time a panic is recovered the stack has already unwound, so the
//! frames are captured by a panic hook while the panic is still in flight
//! and parked in a per-thread slot until [`take_captured`] picks them up.
//! Each capture is tagged with its panic message; a panic re-raised with
//! `resume_unwind` skips the hook and must not inherit an older capture.

use std::cell::RefCell;
use std::fmt;
use std::sync::Once;

/// Most frames kept per capture.
pub const MAX_FRAMES: usize = 16;

/// Frames skipped at the top of a capture: the unwinder and the capture
/// call itself.
pub const SKIP_FRAMES: usize = 3;

/// Symbol prefixes of the language runtime, the async executors and this
/// module. Frames under them are never reported as a panic's origin.
const RUNTIME_PREFIXES: &[&str] = &[
    "std::",
    "core::",
    "alloc::",
    "backtrace::",
    "rust_panic",
    "rust_begin_unwind",
    "__rust",
    "tokio::",
    "futures_util::",
    "futures_core::",
    "svckit::panic::",
    "svckit::middleware::recover",
];

/// One resolved stack frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    /// Demangled function name without hash, empty when unresolved.
    pub name: String,
    pub file: String,
    pub line: u32,
    /// Program counter.
    pub pc: usize,
}

impl Frame {
    pub fn is_runtime(&self) -> bool {
        is_runtime_symbol(&self.name)
    }
}

/// Where a panic came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Origin {
    /// The innermost application frame.
    Frame(Frame),
    /// No application frame was captured; only the program counter is known.
    Raw { pc: usize },
}

impl fmt::Display for Origin {
    /// `name:line`, `file:line` when the name is unknown, or `pc:<hex>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame(frame) if !frame.name.is_empty() => write!(f, "{}:{}", frame.name, frame.line),
            Self::Frame(frame) if !frame.file.is_empty() => write!(f, "{}:{}", frame.file, frame.line),
            Self::Frame(frame) => write!(f, "pc:{:x}", frame.pc),
            Self::Raw { pc } => write!(f, "pc:{pc:x}"),
        }
    }
}

/// Whether `name` belongs to the runtime rather than the application.
///
/// Trait-impl symbols (`<T as core::ops::FnOnce>::call_once`) are judged by
/// their self type.
pub fn is_runtime_symbol(name: &str) -> bool {
    let name = name.trim_start_matches('<');
    RUNTIME_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Picks the origin of a panic from frames listed innermost first.
///
/// Unresolved frames are skipped. The first frame outside the runtime wins;
/// when there is none, the first program counter is reported raw.
pub fn locate(frames: &[Frame]) -> Origin {
    frames
        .iter()
        .filter(|frame| !frame.name.is_empty())
        .find(|frame| !frame.is_runtime())
        .map(|frame| Origin::Frame(frame.clone()))
        .unwrap_or_else(|| Origin::Raw { pc: frames.first().map_or(0, |f| f.pc) })
}

/// Captures up to [`MAX_FRAMES`] frames of the current stack, innermost
/// first, after skipping [`SKIP_FRAMES`].
pub fn capture_frames() -> Vec<Frame> {
    let mut frames = Vec::with_capacity(MAX_FRAMES);
    let mut skipped = 0;

    backtrace::trace(|raw| {
        if skipped < SKIP_FRAMES {
            skipped += 1;
            return true;
        }

        let mut frame = Frame { pc: raw.ip() as usize, ..Frame::default() };
        backtrace::resolve_frame(raw, |symbol| {
            if frame.name.is_empty() {
                if let Some(name) = symbol.name() {
                    frame.name = format!("{name:#}");
                }
            }
            if frame.file.is_empty() {
                if let Some(file) = symbol.filename() {
                    frame.file = file.display().to_string();
                }
            }
            if frame.line == 0 {
                frame.line = symbol.lineno().unwrap_or(0);
            }
        });

        frames.push(frame);
        frames.len() < MAX_FRAMES
    });

    frames
}

/// Frames recorded by the hook, with the message of the panic they belong to.
struct Captured {
    message: String,
    frames: Vec<Frame>,
}

thread_local! {
    static CAPTURED: RefCell<Option<Captured>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Installs a panic hook that records the panicking stack for
/// [`Diagnostic::identify`](super::Diagnostic::identify).
///
/// The previous hook still runs afterwards. Calling this more than once is
/// harmless.
pub fn install_hook() {
    HOOK.call_once(|| {
        let prev = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let captured = Captured {
                message: super::panic_message(info.payload()),
                frames: capture_frames(),
            };
            let _ = CAPTURED.try_with(|slot| *slot.borrow_mut() = Some(captured));
            prev(info);
        }));
    });
}

/// Takes the frames recorded by the hook for the last panic on this thread,
/// if that panic carried `message`.
///
/// The slot is emptied either way.
pub fn take_captured(message: &str) -> Option<Vec<Frame>> {
    CAPTURED
        .with(|slot| slot.borrow_mut().take())
        .filter(|captured| captured.message == message)
        .map(|captured| captured.frames)
}
