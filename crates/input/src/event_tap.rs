//! Session-wide key-down hook on a CGEventTap.
//!
//! The tap lives on its own thread with its own CFRunLoop. Returning
//! `Verdict::Swallow` from the handler turns the event into a null event,
//! which the window server drops.
//!
//! The system disables a tap whose callback is too slow, or on secure input.
//! The tap is switched back on as soon as it reports being disabled.

use crate::error::InputError;
use crate::gesture::{KeyEvent, Modifiers, Verdict};
use crate::ports::{HookGuard, KeyHandler, KeyHook};
use core_foundation::base::TCFType;
use core_foundation::mach_port::CFMachPortRef;
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions,
    CGEventTapPlacement, CGEventType, EventField,
};
use std::cell::OnceCell;
use std::rc::Rc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
}

/// Poll interval while waiting for the tap thread to wind down.
const STOP_POLL: Duration = Duration::from_millis(5);

/// Key hook backed by a CGEventTap at the session level.
#[derive(Debug, Default)]
pub struct EventTapHook;

impl EventTapHook {
    pub fn new() -> Self {
        Self
    }
}

/// The tap thread's run loop, handed to the guard so it can stop it.
struct RunLoopHandle(CFRunLoop);

// CFRunLoopStop may be called from any thread.
unsafe impl Send for RunLoopHandle {}

impl KeyHook for EventTapHook {
    fn install(&self, handler: KeyHandler) -> Result<HookGuard, InputError> {
        let (ready_tx, ready_rx) = mpsc::channel::<Result<RunLoopHandle, String>>();

        let thread = thread::Builder::new()
            .name("flowclip-event-tap".into())
            .spawn(move || run_tap(handler, ready_tx))
            .map_err(|e| InputError::HookFailed(e.to_string()))?;

        let run_loop = match ready_rx.recv() {
            Ok(Ok(run_loop)) => run_loop,
            Ok(Err(reason)) => {
                let _ = thread.join();
                return Err(InputError::HookFailed(reason));
            }
            Err(_) => return Err(InputError::HookFailed("event tap thread exited".into())),
        };

        tracing::debug!("event tap installed");
        Ok(HookGuard::new(move || {
            // The run loop may not have started yet, so keep asking
            while !thread.is_finished() {
                run_loop.0.stop();
                thread::sleep(STOP_POLL);
            }
            let _ = thread.join();
            tracing::debug!("event tap removed");
        }))
    }
}

/// Turns a disabled tap back on.
trait TapSwitch {
    fn enable(&self);
}

/// The tap's own mach port, filled in once the tap exists. The callback and
/// the port both live on the tap thread.
struct MachPortSwitch(Rc<OnceCell<CFMachPortRef>>);

impl TapSwitch for MachPortSwitch {
    fn enable(&self) {
        match self.0.get() {
            Some(&port) => unsafe { CGEventTapEnable(port, true) },
            None => tracing::warn!("event tap disabled before it was set up"),
        }
    }
}

/// Route one tap callback. Only key-downs reach the handler.
fn dispatch(
    event_type: CGEventType,
    key: impl FnOnce() -> KeyEvent,
    handler: &KeyHandler,
    switch: &dyn TapSwitch,
) -> Verdict {
    match event_type {
        CGEventType::KeyDown => handler(&key()),
        CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput => {
            tracing::warn!(?event_type, "event tap disabled by the system, re-enabling");
            switch.enable();
            Verdict::PassThrough
        }
        _ => Verdict::PassThrough,
    }
}

fn run_tap(handler: KeyHandler, ready: mpsc::Sender<Result<RunLoopHandle, String>>) {
    let port = Rc::new(OnceCell::new());
    let switch = MachPortSwitch(Rc::clone(&port));

    let tap = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::Default,
        vec![CGEventType::KeyDown],
        move |_proxy, event_type, event| {
            let verdict = dispatch(event_type, || key_event(event), &handler, &switch);
            if verdict == Verdict::Swallow {
                event.set_type(CGEventType::Null);
            }
            // None delivers the (possibly nulled) original event
            None
        },
    );

    let tap = match tap {
        Ok(tap) => tap,
        Err(()) => {
            let _ = ready.send(Err(
                "CGEventTapCreate failed, is accessibility granted?".into()
            ));
            return;
        }
    };

    let _ = port.set(tap.mach_port.as_concrete_TypeRef());

    let source = match tap.mach_port.create_runloop_source(0) {
        Ok(source) => source,
        Err(()) => {
            let _ = ready.send(Err("could not create run loop source".into()));
            return;
        }
    };

    let run_loop = CFRunLoop::get_current();
    unsafe {
        run_loop.add_source(&source, kCFRunLoopCommonModes);
    }
    tap.enable();

    if ready.send(Ok(RunLoopHandle(run_loop))).is_err() {
        return;
    }

    CFRunLoop::run_current();
}

fn key_event(event: &CGEvent) -> KeyEvent {
    let key_code = event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16;
    KeyEvent::new(key_code, modifiers_from_flags(event.get_flags()))
}

fn modifiers_from_flags(flags: CGEventFlags) -> Modifiers {
    Modifiers {
        command: flags.contains(CGEventFlags::CGEventFlagCommand),
        control: flags.contains(CGEventFlags::CGEventFlagControl),
        option: flags.contains(CGEventFlags::CGEventFlagAlternate),
        shift: flags.contains(CGEventFlags::CGEventFlagShift),
    }
}
