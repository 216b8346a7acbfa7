use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use log::{debug, info};
use mtx_core::core::Machine;

/// Serial channel wired to the host (DART channel A).
pub const HOST_CHANNEL: usize = 0;

/// Moves bytes between host streams and a machine's serial port.
pub struct SerialPump<R, W> {
    input: Option<R>,
    pending: Option<u8>, // Read from the host, not yet accepted
    output: W,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

impl<R: Read, W: Write> SerialPump<R, W> {
    pub fn new(input: Option<R>, output: W) -> Self {
        Self {
            input,
            pending: None,
            output,
            bytes_in: 0,
            bytes_out: 0,
        }
    }

    /// Offer the next host byte to the guest and drain whatever it
    /// transmitted.
    pub fn pump(&mut self, machine: &mut dyn Machine) -> io::Result<()> {
        if self.pending.is_none()
            && let Some(input) = self.input.as_mut()
        {
            let mut byte = [0u8; 1];
            if input.read(&mut byte)? == 0 {
                debug!("Serial input exhausted");
                self.input = None;
            } else {
                self.pending = Some(byte[0]);
            }
        }

        if let Some(byte) = self.pending
            && machine.serial_rx(HOST_CHANNEL, byte)
        {
            self.pending = None;
            self.bytes_in += 1;
        }

        while let Some(byte) = machine.serial_tx(HOST_CHANNEL) {
            self.output.write_all(&[byte])?;
            self.bytes_out += 1;
        }
        self.output.flush()
    }
}

/// Run `frames` frames, pumping serial between frames.
pub fn run<R: Read, W: Write>(
    machine: &mut dyn Machine,
    frames: u64,
    pump: &mut SerialPump<R, W>,
) -> Result<()> {
    for frame in 0..frames {
        machine
            .run_frame()
            .with_context(|| format!("machine stopped in frame {frame}"))?;
        pump.pump(machine).context("serial I/O")?;
    }
    info!(
        "Ran {frames} frames ({} T-states), serial {} in / {} out",
        frames * machine.frame_t_states() as u64,
        pump.bytes_in,
        pump.bytes_out
    );
    Ok(())
}
