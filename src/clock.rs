//! Time source for response timestamps and elapsed-time measurement

use std::sync::Mutex;
use std::time::{Duration, Instant};
use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync
{   fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time that never runs backwards.
///
/// Anchored once at construction; later readings add the monotonic
/// elapsed time to the anchor.
#[derive(Debug, Clone)]
pub struct SystemClock
{   anchor_wall: DateTime<Utc>
  , anchor_mono: Instant
}

impl SystemClock
{   pub fn new() -> Self
    {   SystemClock
        {   anchor_wall: Utc::now()
          , anchor_mono: Instant::now()
        }
    }
}

impl Default for SystemClock
{   fn default() -> Self
    {   SystemClock::new()
    }
}

impl Clock for SystemClock
{   fn now(&self) -> DateTime<Utc>
    {   let elapsed = chrono::Duration::from_std(
          self.anchor_mono.elapsed()
        ).unwrap_or_else(|_| chrono::Duration::zero());
        self.anchor_wall + elapsed
    }
}

/// Deterministic clock: every reading advances by a fixed step.
#[derive(Debug)]
pub struct SteppingClock
{   current: Mutex<DateTime<Utc>>
  , step: chrono::Duration
}

impl SteppingClock
{   pub fn new(start: DateTime<Utc>, step: Duration) -> Self
    {   SteppingClock
        {   current: Mutex::new(start)
          , step: chrono::Duration::from_std(step)
              .unwrap_or_else(|_| chrono::Duration::zero())
        }
    }
}

impl Clock for SteppingClock
{   fn now(&self) -> DateTime<Utc>
    {   let mut current = match self.current.lock()
        {   Ok(guard) => guard
          , Err(poisoned) => poisoned.into_inner()
        };
        let reading = *current;
        *current = reading + self.step;
        reading
    }
}

/// Milliseconds between two readings, clamped at zero
pub fn elapsed_ms(start: DateTime<Utc>, end: DateTime<Utc>) -> f64
{   let delta = end.signed_duration_since(start);
    match delta.num_microseconds()
    {   Some(us) if us > 0 => us as f64 / 1000.0
      , Some(_) => 0.0
      , None => delta.num_milliseconds().max(0) as f64
    }
}
