//! The tick loop: reads the cell under the pointer, dispatches it, applies
//! the resulting effect, then advances and wraps the pointer.

mod dispatch;
mod ops;

pub use ops::{BinaryOp, Comparison};

use crate::io::{
    Clock, InputSource, LocalClock, OutputSink, Pacer, ScriptedInput, ThreadPacer, WriterOutput,
};
use crate::pointer::Pointer;
use dispatch::{dispatch, Effect, Machine};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use starfish_core::{Codebox, CodeboxError, Stack, StackError, StackFrames, Value};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

/// Nested `C` calls allowed before the VM gives up.
pub const MAX_CALL_DEPTH: usize = 65_536;

/// Debug callback invoked for every [`DebugEvent`].
pub type DebugCallback = Option<Box<dyn FnMut(&DebugEvent<'_>)>>;

/// Events emitted while the VM runs. Borrowed views stay valid only for the
/// duration of the callback.
#[derive(Debug)]
pub enum DebugEvent<'a> {
    /// One instruction executed; `pointer` is already advanced to the next cell.
    Tick {
        tick: u64,
        instruction: char,
        pointer: &'a Pointer,
        codebox: &'a Codebox,
        stacks: &'a StackFrames,
    },
    Halted { ticks: u64 },
    Faulted(&'a Fault),
}

/// Why an instruction could not complete.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FaultKind {
    #[error("stack underflow: needed {needed} value(s), found {available}")]
    StackUnderflow { needed: usize, available: usize },
    #[error("division by zero")]
    DivisionByZero,
    #[error("cell ({row}, {col}) is outside the codebox")]
    OutOfRange { row: i64, col: i64 },
    #[error("invalid instruction")]
    InvalidInstruction,
    #[error("{0} is not a character code")]
    InvalidCharacter(Value),
    #[error("invalid operand {0}")]
    InvalidOperand(Value),
    #[error("return without a matching call")]
    ReturnWithoutCall,
    #[error("call depth exceeded {0}")]
    CallDepthExceeded(usize),
    #[error("input error: {0}")]
    InputFailed(String),
}

impl From<StackError> for FaultKind {
    fn from(err: StackError) -> Self {
        match err {
            StackError::Underflow { needed, available } => {
                FaultKind::StackUnderflow { needed, available }
            }
        }
    }
}

impl From<CodeboxError> for FaultKind {
    fn from(err: CodeboxError) -> Self {
        match err {
            CodeboxError::OutOfRange { row, col, .. } => FaultKind::OutOfRange { row, col },
        }
    }
}

/// A fault together with where it happened.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub kind: FaultKind,
    pub row: i64,
    pub col: i64,
    pub instruction: char,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at row {}, column {} (instruction {:?})",
            self.kind, self.row, self.col, self.instruction
        )
    }
}

#[derive(Debug, Error)]
pub enum VmError {
    #[error("{0}")]
    Fault(Fault),
    #[error("tick limit exceeded: {0}")]
    TickLimitExceeded(u64),
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
    #[error("the VM has faulted and cannot resume")]
    AlreadyFaulted,
}

impl VmError {
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            VmError::Fault(f) => Some(f),
            _ => None,
        }
    }

    pub fn fault_kind(&self) -> Option<&FaultKind> {
        self.fault().map(|f| &f.kind)
    }

    pub fn is_stack_underflow(&self) -> bool {
        matches!(self.fault_kind(), Some(FaultKind::StackUnderflow { .. }))
    }

    pub fn is_division_by_zero(&self) -> bool {
        matches!(self.fault_kind(), Some(FaultKind::DivisionByZero))
    }

    pub fn is_out_of_range(&self) -> bool {
        matches!(self.fault_kind(), Some(FaultKind::OutOfRange { .. }))
    }

    pub fn is_tick_limit_exceeded(&self) -> bool {
        matches!(self, VmError::TickLimitExceeded(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Halted,
    Faulted,
}

/// How a call to [`VM::run`] ended without a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Halted,
    /// The stop signal was raised between ticks.
    Stopped,
}

/// The starfish virtual machine. Owns the codebox, the stacks, and the
/// instruction pointer for the lifetime of a run.
pub struct VM {
    codebox: Codebox,
    stacks: StackFrames,
    calls: Vec<(i64, i64)>,
    pointer: Pointer,
    status: Status,
    fault: Option<Fault>,
    ticks: u64,
    max_ticks: Option<u64>,
    delay: Duration,
    compatibility: bool,
    stop: Option<Arc<AtomicBool>>,
    input: Box<dyn InputSource>,
    output: Box<dyn OutputSink>,
    clock: Box<dyn Clock>,
    pacer: Box<dyn Pacer>,
    rng: Box<dyn RngCore>,
    /// Optional debug callback for per-tick tracing
    pub debug_callback: DebugCallback,
}

impl VM {
    /// A VM with an empty initial stack. Input is empty, output is
    /// discarded, and `x` draws from an entropy-seeded generator until the
    /// caller installs its own collaborators.
    pub fn new(codebox: Codebox) -> Self {
        Self::with_stack(codebox, Stack::new())
    }

    pub fn with_stack(codebox: Codebox, initial: Stack) -> Self {
        debug!(
            width = codebox.width(),
            height = codebox.height(),
            initial = initial.len(),
            "loaded codebox"
        );
        Self {
            codebox,
            stacks: StackFrames::new(initial),
            calls: Vec::new(),
            pointer: Pointer::new(),
            status: Status::Running,
            fault: None,
            ticks: 0,
            max_ticks: None,
            delay: Duration::ZERO,
            compatibility: false,
            stop: None,
            input: Box::new(ScriptedInput::default()),
            output: Box::new(WriterOutput::new(std::io::sink())),
            clock: Box::new(LocalClock),
            pacer: Box::new(ThreadPacer),
            rng: Box::new(StdRng::from_entropy()),
            debug_callback: None,
        }
    }

    pub fn set_input(&mut self, input: impl InputSource + 'static) {
        self.input = Box::new(input);
    }

    pub fn set_output(&mut self, output: impl OutputSink + 'static) {
        self.output = Box::new(output);
    }

    pub fn set_clock(&mut self, clock: impl Clock + 'static) {
        self.clock = Box::new(clock);
    }

    pub fn set_pacer(&mut self, pacer: impl Pacer + 'static) {
        self.pacer = Box::new(pacer);
    }

    pub fn set_rng(&mut self, rng: impl RngCore + 'static) {
        self.rng = Box::new(rng);
    }

    /// Make `x` reproducible.
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = Box::new(StdRng::seed_from_u64(seed));
    }

    /// Pause requested from the pacer between ticks of [`VM::run`].
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Reverse values moved by `[` and `]`, as the fishlanguage.com
    /// interpreter did.
    pub fn set_compatibility(&mut self, enabled: bool) {
        self.compatibility = enabled;
    }

    pub fn set_tick_limit(&mut self, max_ticks: u64) {
        self.max_ticks = Some(max_ticks);
    }

    /// Checked between ticks by [`VM::run`].
    pub fn set_stop_signal(&mut self, stop: Arc<AtomicBool>) {
        self.stop = Some(stop);
    }

    pub fn codebox(&self) -> &Codebox {
        &self.codebox
    }

    pub fn stacks(&self) -> &StackFrames {
        &self.stacks
    }

    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn emit_debug_event(&mut self, event: &DebugEvent<'_>) {
        if let Some(ref mut cb) = self.debug_callback {
            cb(event);
        }
    }

    fn pause(&mut self, duration: Duration) -> Result<(), VmError> {
        self.output.flush().map_err(|e| self.io_failed(e))?;
        self.pacer.pause(duration);
        Ok(())
    }

    /// I/O errors are terminal: the instruction that hit one may already
    /// have changed the stacks, so it must never run again.
    fn io_failed(&mut self, err: std::io::Error) -> VmError {
        debug!(error = %err, ticks = self.ticks, "vm i/o failed");
        self.status = Status::Faulted;
        VmError::Io(err)
    }

    fn fail(&mut self, kind: FaultKind, at: Pointer, instruction: char) -> VmError {
        let fault = Fault {
            kind,
            row: at.row,
            col: at.col,
            instruction,
        };
        debug!(%fault, ticks = self.ticks, "vm faulted");
        self.status = Status::Faulted;
        let _ = self.output.flush();
        if let Some(ref mut cb) = self.debug_callback {
            cb(&DebugEvent::Faulted(&fault));
        }
        self.fault = Some(fault.clone());
        VmError::Fault(fault)
    }

    /// Execute one instruction. A no-op once the VM has halted or faulted.
    pub fn tick(&mut self) -> Result<Status, VmError> {
        if self.status != Status::Running {
            return Ok(self.status);
        }
        if let Some(limit) = self.max_ticks {
            if self.ticks >= limit {
                self.status = Status::Faulted;
                return Err(VmError::TickLimitExceeded(limit));
            }
        }

        let ip = self.pointer;
        let cell = self.codebox.get(ip.row, ip.col);
        let instruction = cell.instruction();
        trace!(row = ip.row, col = ip.col, %instruction, "tick");

        if instruction == 'i' && !ip.in_string_mode() {
            // prompts written before a read must be visible
            self.output.flush().map_err(|e| self.io_failed(e))?;
        }

        let outcome = {
            let mut machine = Machine {
                codebox: &mut self.codebox,
                stacks: &mut self.stacks,
                calls: &mut self.calls,
                rng: &mut *self.rng,
                clock: &*self.clock,
                input: &mut *self.input,
                compatibility: self.compatibility,
            };
            dispatch(&mut machine, cell, ip)
        };
        self.ticks += 1;

        let step = match outcome {
            Ok(step) => step,
            Err(kind) => return Err(self.fail(kind, ip, instruction)),
        };
        self.pointer = step.pointer;

        match step.effect {
            Some(Effect::Halt) => {
                self.status = Status::Halted;
                self.output.flush().map_err(|e| self.io_failed(e))?;
                debug!(ticks = self.ticks, "vm halted");
                let ticks = self.ticks;
                self.emit_debug_event(&DebugEvent::Halted { ticks });
                return Ok(Status::Halted);
            }
            Some(Effect::Output(text)) => {
                if let Err(e) = self.output.write_text(&text) {
                    return Err(self.io_failed(e));
                }
            }
            Some(Effect::Pause(duration)) => self.pause(duration)?,
            None => {}
        }

        let (width, height) = (self.codebox.width(), self.codebox.height());
        self.pointer.advance(width, height);
        if step.skip {
            self.pointer.advance(width, height);
        }

        if let Some(ref mut cb) = self.debug_callback {
            cb(&DebugEvent::Tick {
                tick: self.ticks,
                instruction,
                pointer: &self.pointer,
                codebox: &self.codebox,
                stacks: &self.stacks,
            });
        }
        Ok(Status::Running)
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .map(|s| s.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Tick until the program halts, faults, or the stop signal is raised.
    pub fn run(&mut self) -> Result<RunOutcome, VmError> {
        loop {
            if self.stop_requested() {
                debug!(ticks = self.ticks, "stop requested");
                self.output.flush().map_err(|e| self.io_failed(e))?;
                return Ok(RunOutcome::Stopped);
            }
            match self.tick()? {
                Status::Running => {
                    if !self.delay.is_zero() {
                        self.pause(self.delay)?;
                    }
                }
                Status::Halted => return Ok(RunOutcome::Halted),
                Status::Faulted => {
                    return Err(match &self.fault {
                        Some(f) => VmError::Fault(f.clone()),
                        None => VmError::AlreadyFaulted,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{RecordingPacer, SharedOutput};
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    /// Accepts writes but cannot flush, like a closed pipe.
    struct BrokenPipe;

    impl OutputSink for BrokenPipe {
        fn write_text(&mut self, _text: &str) -> io::Result<()> {
            Ok(())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    fn vm(source: &str) -> VM {
        VM::new(Codebox::parse(source).expect("script should load"))
    }

    #[test]
    fn halt_stops_ticking() {
        let mut vm = vm("1;");
        assert_eq!(vm.tick().unwrap(), Status::Running);
        assert_eq!(vm.tick().unwrap(), Status::Halted);
        assert_eq!(vm.tick().unwrap(), Status::Halted);
        assert_eq!(vm.ticks(), 2);
        assert_eq!(vm.pointer().col, 1);
    }

    #[test]
    fn fault_records_location_and_blocks_further_ticks() {
        let mut vm = vm(" ~;");
        let err = vm.run().unwrap_err();
        assert!(err.is_stack_underflow());
        let fault = err.fault().unwrap();
        assert_eq!((fault.row, fault.col, fault.instruction), (0, 1, '~'));
        assert_eq!(vm.status(), Status::Faulted);
        assert_eq!(vm.tick().unwrap(), Status::Faulted);
        assert_eq!(vm.ticks(), 2);
        assert!(matches!(vm.run(), Err(VmError::Fault(_))));
    }

    #[test]
    fn tick_limit_faults() {
        let mut vm = vm(" ");
        vm.set_tick_limit(10);
        let err = vm.run().unwrap_err();
        assert!(err.is_tick_limit_exceeded());
        assert_eq!(vm.ticks(), 10);
        assert!(matches!(vm.run(), Err(VmError::AlreadyFaulted)));
    }

    #[test]
    fn stop_signal_is_checked_between_ticks() {
        let mut vm = vm("1");
        let stop = Arc::new(AtomicBool::new(false));
        vm.set_stop_signal(Arc::clone(&stop));
        let raise = Arc::clone(&stop);
        vm.debug_callback = Some(Box::new(move |event: &DebugEvent<'_>| {
            if let DebugEvent::Tick { tick: 3, .. } = event {
                raise.store(true, Ordering::SeqCst);
            }
        }));
        assert_eq!(vm.run().unwrap(), RunOutcome::Stopped);
        assert_eq!(vm.ticks(), 3);
        assert_eq!(vm.stacks().active().len(), 3);
        assert_eq!(vm.status(), Status::Running);
    }

    #[test]
    fn delay_is_requested_between_ticks() {
        let mut vm = vm("  ;");
        let pacer = RecordingPacer::new();
        vm.set_pacer(pacer.clone());
        vm.set_delay(Duration::from_millis(5));
        vm.run().unwrap();
        assert_eq!(pacer.pauses(), vec![Duration::from_millis(5); 2]);
    }

    #[test]
    fn tick_events_see_updated_state() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut vm = vm("12p;");
        vm.debug_callback = Some(Box::new(move |event: &DebugEvent<'_>| {
            if let DebugEvent::Tick { pointer, stacks, .. } = event {
                sink.borrow_mut().push((pointer.col, stacks.active().len()));
            }
        }));
        let output = SharedOutput::new();
        vm.set_output(output.clone());
        vm.tick().unwrap();
        vm.tick().unwrap();
        assert_eq!(*seen.borrow(), vec![(1, 1), (2, 2)]);
        assert_eq!(output.contents(), "");
    }

    #[test]
    fn fault_event_is_emitted_once() {
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        let mut vm = vm("50,;");
        vm.debug_callback = Some(Box::new(move |event: &DebugEvent<'_>| {
            if let DebugEvent::Faulted(fault) = event {
                assert_eq!(fault.kind, FaultKind::DivisionByZero);
                *counter.borrow_mut() += 1;
            }
        }));
        assert!(vm.run().unwrap_err().is_division_by_zero());
        let _ = vm.run();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn failed_flush_during_sleep_is_terminal() {
        let codebox = Codebox::parse("S;").unwrap();
        let mut vm = VM::with_stack(codebox, Stack::from_values(vec![Value::Int(1)]));
        vm.set_output(BrokenPipe);
        vm.set_pacer(RecordingPacer::new());

        assert!(matches!(vm.run(), Err(VmError::Io(_))));
        assert_eq!(vm.status(), Status::Faulted);
        assert_eq!(vm.ticks(), 1);

        assert_eq!(vm.tick().unwrap(), Status::Faulted);
        assert!(matches!(vm.run(), Err(VmError::AlreadyFaulted)));
        assert_eq!(vm.ticks(), 1);
        assert!(vm.stacks().active().is_empty());
    }

    #[test]
    fn failed_flush_on_halt_or_delay_is_terminal() {
        let mut halting = vm(";");
        halting.set_output(BrokenPipe);
        assert!(matches!(halting.run(), Err(VmError::Io(_))));
        assert_eq!(halting.status(), Status::Faulted);

        let mut delayed = vm(" ;");
        delayed.set_output(BrokenPipe);
        delayed.set_pacer(RecordingPacer::new());
        delayed.set_delay(Duration::from_millis(1));
        assert!(matches!(delayed.run(), Err(VmError::Io(_))));
        assert_eq!(delayed.status(), Status::Faulted);
        assert_eq!(delayed.ticks(), 1);
    }
}
