//! Stack capture at the logging call site

use super::event::{StackFrame, StackTrace};

/// Capture the current thread's stack.
///
/// Frames belonging to the capture machinery itself are dropped. The result
/// is ordered oldest call first, as tracking services expect.
pub fn capture() -> StackTrace {
    let backtrace = backtrace::Backtrace::new();
    let mut frames: Vec<StackFrame> = backtrace
        .frames()
        .iter()
        .flat_map(|frame| frame.symbols())
        .map(|symbol| StackFrame {
            function: symbol.name().map(|name| name.to_string()),
            filename: symbol
                .filename()
                .and_then(|path| path.file_name())
                .map(|name| name.to_string_lossy().into_owned()),
            abs_path: symbol.filename().map(|path| path.display().to_string()),
            lineno: symbol.lineno().map(u64::from),
            colno: symbol.colno().map(u64::from),
            ..StackFrame::default()
        })
        .filter(|frame| !is_capture_frame(frame))
        .collect();
    frames.reverse();
    StackTrace { frames }
}

fn is_capture_frame(frame: &StackFrame) -> bool {
    frame.function.as_deref().is_some_and(|f| {
        f.starts_with("backtrace::") || f.contains("tracking::stack::capture")
    })
}
