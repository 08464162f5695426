use bytes::Bytes;

/// The framed connection an endpoint writes flushed frames to. A real
/// destination is a TCP (optionally TLS) socket; tests use an in-memory
/// buffer. Kept synchronous and `Write`-like, matching a single-owner
/// actor driving its own framed connection directly.
pub trait Sink: Send {
    /// Writes one already-framed buffer. An `Err` aborts the endpoint.
    fn write_frame(&mut self, frame: Bytes) -> std::io::Result<()>;
}

/// Accumulates every frame written to it, for tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub frames: Vec<Bytes>,
}

impl Sink for RecordingSink {
    fn write_frame(&mut self, frame: Bytes) -> std::io::Result<()> {
        self.frames.push(frame);
        Ok(())
    }
}

/// A sink that always fails, for exercising the abort-on-flush-error path.
pub struct FailingSink;

impl Sink for FailingSink {
    fn write_frame(&mut self, _frame: Bytes) -> std::io::Result<()> {
        Err(std::io::Error::other("simulated destination failure"))
    }
}
