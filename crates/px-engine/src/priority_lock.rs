//! Two-class mutual exclusion: one latency-sensitive reader class and
//! any number of normal-priority writers.
//!
//! Admission is decided by a small gate (a mutex-protected state plus a
//! condition variable). The protected value sits in its own mutex, which
//! is never contended because only the admitted holder touches it.
//!
//! Fairness:
//! - normal requests are served first-come, first-served by ticket;
//! - when the lock is released and a high-priority request is waiting,
//!   it is admitted ahead of every waiting normal request;
//! - high-priority admissions are bounded: after `high_burst`
//!   consecutive high grants while a normal request is waiting, the
//!   front normal request goes next.

use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard};

/// Consecutive high-priority grants allowed while normal requests wait.
pub const DEFAULT_HIGH_BURST: u32 = 1;

#[derive(Debug, Default)]
struct Gate {
    held: bool,
    high_waiting: usize,
    /// Next ticket handed to a normal request.
    next_ticket: u64,
    /// Ticket of the normal request at the front of the line.
    serving: u64,
    /// High-priority grants since the last normal grant.
    high_streak: u32,
}

impl Gate {
    fn normal_waiting(&self) -> bool {
        self.next_ticket > self.serving
    }
}

/// A mutex with separate normal and high-priority entry points.
pub struct PriorityLock<T> {
    gate: Mutex<Gate>,
    turn: Condvar,
    high_burst: u32,
    value: Mutex<T>,
}

impl<T> PriorityLock<T> {
    pub fn new(value: T) -> Self {
        Self::with_high_burst(value, DEFAULT_HIGH_BURST)
    }

    /// `high_burst` is clamped to at least 1.
    pub fn with_high_burst(value: T, high_burst: u32) -> Self {
        Self {
            gate: Mutex::new(Gate::default()),
            turn: Condvar::new(),
            high_burst: high_burst.max(1),
            value: Mutex::new(value),
        }
    }

    /// Acquire as a normal-priority request (FIFO among normal requests).
    pub fn lock(&self) -> PriorityGuard<'_, T> {
        let mut gate = self.gate();
        let ticket = gate.next_ticket;
        gate.next_ticket += 1;
        while gate.held
            || gate.serving != ticket
            || (gate.high_waiting > 0 && gate.high_streak < self.high_burst)
        {
            gate = self.wait(gate);
        }
        gate.held = true;
        gate.serving += 1;
        gate.high_streak = 0;
        drop(gate);
        self.guard()
    }

    /// Acquire as a high-priority request.
    pub fn lock_high(&self) -> PriorityGuard<'_, T> {
        let mut gate = self.gate();
        gate.high_waiting += 1;
        while gate.held || (gate.normal_waiting() && gate.high_streak >= self.high_burst) {
            gate = self.wait(gate);
        }
        gate.high_waiting -= 1;
        gate.held = true;
        gate.high_streak = gate.high_streak.saturating_add(1);
        drop(gate);
        self.guard()
    }

    /// Consume the lock and return the value.
    pub fn into_inner(self) -> T {
        self.value.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn guard(&self) -> PriorityGuard<'_, T> {
        PriorityGuard {
            value: Some(self.value.lock().unwrap_or_else(|e| e.into_inner())),
            lock: self,
        }
    }

    fn release(&self) {
        let mut gate = self.gate();
        gate.held = false;
        drop(gate);
        self.turn.notify_all();
    }

    fn gate(&self) -> MutexGuard<'_, Gate> {
        self.gate.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn wait<'a>(&self, gate: MutexGuard<'a, Gate>) -> MutexGuard<'a, Gate> {
        self.turn.wait(gate).unwrap_or_else(|e| e.into_inner())
    }
}

impl<T: Default> Default for PriorityLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Scoped access to a [`PriorityLock`]'s value; releases on drop.
pub struct PriorityGuard<'a, T> {
    value: Option<MutexGuard<'a, T>>,
    lock: &'a PriorityLock<T>,
}

impl<T> Deref for PriorityGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Only `None` inside `drop`.
        match &self.value {
            Some(v) => v,
            None => unreachable!("guard used after release"),
        }
    }
}

impl<T> DerefMut for PriorityGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.value {
            Some(v) => v,
            None => unreachable!("guard used after release"),
        }
    }
}

impl<T> Drop for PriorityGuard<'_, T> {
    fn drop(&mut self) {
        // Give up the value before opening the gate for the next holder.
        self.value.take();
        self.lock.release();
    }
}
