use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::future;

use super::*;


/// Multiplies every key by 10 and remembers the keys of every call.
pub struct Batcher {
    invoke_cnt: AtomicUsize,
    calls: Mutex<Vec<Vec<i32>>>,
}

impl Batcher {
    pub fn new() -> Batcher {
        Batcher {
            invoke_cnt: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<i32>> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, keys: &[i32]) -> usize {
        self.calls.lock().unwrap().push(keys.to_vec());
        self.invoke_cnt.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl BatchFn<i32, i32> for Batcher {
    type Error = ();

    async fn load(&self, keys: &[i32]) -> Result<Vec<i32>, Self::Error> {
        self.record(keys);
        Ok(keys.iter().map(|v| v * 10).collect())
    }
}

// Result with batch call seq
#[async_trait]
impl BatchFn<i32, (usize, i32)> for Batcher {
    type Error = ();

    async fn load(&self, keys: &[i32]) -> Result<Vec<(usize, i32)>, Self::Error> {
        let seq = self.record(keys);
        Ok(keys.iter().map(|v| (seq + 1, v * 10)).collect())
    }
}

/// Looks letters up in a fixed table; unknown letters are absent.
pub struct LetterBatcher {
    table: HashMap<&'static str, i32>,
    calls: Mutex<Vec<Vec<&'static str>>>,
}

impl LetterBatcher {
    pub fn new(table: &[(&'static str, i32)]) -> LetterBatcher {
        LetterBatcher {
            table: table.iter().copied().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<&'static str>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BatchFn<&'static str, Option<i32>> for LetterBatcher {
    type Error = ();

    async fn load(&self, keys: &[&'static str]) -> Result<Vec<Option<i32>>, Self::Error> {
        self.calls.lock().unwrap().push(keys.to_vec());
        Ok(keys.iter().map(|k| self.table.get(k).copied()).collect())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MyError {
    Unknown,
}

pub struct BadBatcher;

#[async_trait]
impl BatchFn<i32, i32> for BadBatcher {
    type Error = MyError;

    async fn load(&self, _keys: &[i32]) -> Result<Vec<i32>, Self::Error> {
        // fail whole batch
        Err(MyError::Unknown)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValueError {
    NotEven,
}

#[async_trait]
impl BatchFn<i32, Result<i32, ValueError>> for BadBatcher {
    type Error = MyError;

    async fn load(&self, keys: &[i32]) -> Result<Vec<Result<i32, ValueError>>, Self::Error> {
        Ok(keys
            .iter()
            .map(|v| {
                if v % 2 == 0 {
                    Ok(v * 10)
                } else {
                    Err(ValueError::NotEven)
                }
            })
            .collect())
    }
}

#[async_trait]
impl BatchFn<i32, ()> for BadBatcher {
    type Error = ();

    async fn load(&self, _keys: &[i32]) -> Result<Vec<()>, Self::Error> {
        //always return less values compared to request keys
        Ok(vec![])
    }
}

/// Fails its first call, then behaves like [`Batcher`].
pub struct FlakyBatcher {
    invoke_cnt: AtomicUsize,
}

impl FlakyBatcher {
    pub fn new() -> FlakyBatcher {
        FlakyBatcher {
            invoke_cnt: AtomicUsize::new(0),
        }
    }

    pub fn invoke_cnt(&self) -> usize {
        self.invoke_cnt.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BatchFn<i32, i32> for FlakyBatcher {
    type Error = MyError;

    async fn load(&self, keys: &[i32]) -> Result<Vec<i32>, Self::Error> {
        if self.invoke_cnt.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(MyError::Unknown);
        }
        Ok(keys.iter().map(|v| v * 10).collect())
    }
}

/// Never resolves.
pub struct StuckBatcher {
    started: AtomicUsize,
}

impl StuckBatcher {
    pub fn new() -> StuckBatcher {
        StuckBatcher {
            started: AtomicUsize::new(0),
        }
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BatchFn<i32, i32> for StuckBatcher {
    type Error = ();

    async fn load(&self, _keys: &[i32]) -> Result<Vec<i32>, Self::Error> {
        self.started.fetch_add(1, Ordering::SeqCst);
        future::pending().await
    }
}
