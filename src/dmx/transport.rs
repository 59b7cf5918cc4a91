use std::io::Write;
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::error::TransportError;

/// The minimal serial capabilities the transmitter needs.
pub(crate) trait Transport: Send {
    fn configure(
        &mut self,
        baud_rate: u32,
        data_bits: DataBits,
        parity: Parity,
        stop_bits: StopBits,
    ) -> Result<(), TransportError>;

    /// Hold the line low for at least `duration`.
    fn send_break(&mut self, duration: Duration) -> Result<(), TransportError>;

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    fn flush(&mut self) -> Result<(), TransportError>;
}

/// A real serial device, e.g. `/dev/ttyUSB0` or `COM3`.
pub(crate) struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    pub(crate) fn open(path: &str) -> Result<Self, TransportError> {
        let port = serialport::new(path, super::BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::Two)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(100))
            .open()?;
        tracing::info!(path, "opened serial port");
        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    fn configure(
        &mut self,
        baud_rate: u32,
        data_bits: DataBits,
        parity: Parity,
        stop_bits: StopBits,
    ) -> Result<(), TransportError> {
        self.port.set_baud_rate(baud_rate)?;
        self.port.set_data_bits(data_bits)?;
        self.port.set_parity(parity)?;
        self.port.set_stop_bits(stop_bits)?;
        Ok(())
    }

    fn send_break(&mut self, duration: Duration) -> Result<(), TransportError> {
        self.port.set_break()?;
        std::thread::sleep(duration);
        self.port.clear_break()?;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.port.write_all(bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.port.flush()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;
    use serialport::{DataBits, Parity, StopBits};

    use super::Transport;
    use crate::error::TransportError;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Op {
        Configure(u32, DataBits, Parity, StopBits),
        Break(Duration),
        Write(Vec<u8>),
        Flush,
    }

    /// Keeps every call in memory. Clones share the same log.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct RecordingTransport {
        ops: Arc<Mutex<Vec<Op>>>,
        failures: Arc<AtomicUsize>,
    }

    impl RecordingTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Make the next `n` writes fail.
        pub(crate) fn fail_next(&self, n: usize) {
            self.failures.store(n, Ordering::SeqCst);
        }

        pub(crate) fn ops(&self) -> Vec<Op> {
            self.ops.lock().clone()
        }

        /// Data payload of every completed packet, in order.
        pub(crate) fn frames(&self) -> Vec<Vec<u8>> {
            self.ops()
                .into_iter()
                .filter_map(|op| match op {
                    Op::Write(bytes) if bytes.len() == crate::dmx::CHANNELS => Some(bytes),
                    _ => None,
                })
                .collect()
        }

        fn record(&self, op: Op) {
            self.ops.lock().push(op);
        }
    }

    impl Transport for RecordingTransport {
        fn configure(
            &mut self,
            baud_rate: u32,
            data_bits: DataBits,
            parity: Parity,
            stop_bits: StopBits,
        ) -> Result<(), TransportError> {
            self.record(Op::Configure(baud_rate, data_bits, parity, stop_bits));
            Ok(())
        }

        fn send_break(&mut self, duration: Duration) -> Result<(), TransportError> {
            self.record(Op::Break(duration));
            Ok(())
        }

        fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
            let failed = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failed {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged").into());
            }
            self.record(Op::Write(bytes.to_vec()));
            Ok(())
        }

        fn flush(&mut self) -> Result<(), TransportError> {
            self.record(Op::Flush);
            Ok(())
        }
    }
}
