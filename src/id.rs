//! Identifier generation for requests and responses

use std::sync::atomic::{AtomicUsize, Ordering};

pub trait IdGenerator: Send + Sync
{   fn next_id(&self) -> String;
}

/// Random v4 UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator
{   fn next_id(&self) -> String
    {   uuid::Uuid::new_v4().to_string()
    }
}

/// `<prefix>-1`, `<prefix>-2`, ... in call order
#[derive(Debug)]
pub struct SequentialIds
{   prefix: String
  , counter: AtomicUsize
}

impl SequentialIds
{   pub fn new(prefix: impl Into<String>) -> Self
    {   SequentialIds
        {   prefix: prefix.into()
          , counter: AtomicUsize::new(0)
        }
    }
}

impl IdGenerator for SequentialIds
{   fn next_id(&self) -> String
    {   let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{}", self.prefix, n)
    }
}
