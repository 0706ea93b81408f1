// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{
    io,
    sync::{Arc, Mutex},
};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Log output captured by [`with_captured_logs`].
#[derive(Clone, Debug, Default)]
pub(crate) struct CapturedLogs {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    /// Returns the messages logged at `level`, without the level prefix.
    pub(crate) fn messages_at(&self, level: Level) -> Vec<String> {
        let buf = self.buf.lock().unwrap();
        let prefix = level.as_str();
        String::from_utf8_lossy(&buf)
            .lines()
            .filter_map(|line| line.trim_start().strip_prefix(prefix))
            .map(|message| message.trim_start().to_owned())
            .collect()
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogsWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedLogsWriter {
            buf: self.buf.clone(),
        }
    }
}

pub(crate) struct CapturedLogsWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CapturedLogsWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with every event at DEBUG or above captured.
pub(crate) fn with_captured_logs<R>(f: impl FnOnce() -> R) -> (R, CapturedLogs) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .without_time()
        .finish();
    let ret = tracing::subscriber::with_default(subscriber, f);
    (ret, logs)
}
