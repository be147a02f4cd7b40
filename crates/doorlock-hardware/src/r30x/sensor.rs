//! R30x fingerprint sensor driver over a serial port.

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use bytes::{Buf, BytesMut};
use doorlock_core::FingerprintId;
use doorlock_core::constants::FINGERPRINT_BAUD_RATE;
use serialport::SerialPort;
use tracing::{debug, trace};

use super::packet::{Ack, DEFAULT_ADDRESS, Packet};
use crate::{
    HardwareError, Result,
    traits::FingerprintDevice,
    types::{ImageCapture, SearchMatch, SensorCode, SensorCommand, TemplateSlot},
};

/// Per-read timeout on the serial port.
const READ_TIMEOUT: Duration = Duration::from_millis(1000);

/// R30x/ZFM-family sensor on a UART.
pub struct R30xSensor {
    port: Box<dyn SerialPort>,
    address: u32,
    rx: BytesMut,
}

impl R30xSensor {
    /// Open the sensor on `path` (e.g. `/dev/serial0`) at 57600 baud, 8N1.
    ///
    /// # Errors
    ///
    /// Returns an initialization error if the port cannot be opened.
    pub fn open(path: &str) -> Result<Self> {
        let port = serialport::new(path, FINGERPRINT_BAUD_RATE)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| HardwareError::initialization_failed(format!("{}: {}", path, e)))?;
        debug!(port = path, "Opened fingerprint sensor port");

        Ok(Self {
            port,
            address: DEFAULT_ADDRESS,
            rx: BytesMut::with_capacity(64),
        })
    }

    /// Send one command and wait for its acknowledgement.
    fn transact(&mut self, command: SensorCommand) -> Result<Ack> {
        let packet = Packet::command(self.address, &command);
        trace!(%command, "Sending sensor command");
        self.rx.clear();
        self.port.write_all(&packet.encode())?;
        self.port.flush()?;

        let mut chunk = [0u8; 64];
        loop {
            if let Some(reply) = Packet::decode(&mut self.rx)? {
                let ack = reply.into_ack()?;
                trace!(%command, code = %ack.code, "Sensor acknowledged");
                return Ok(ack);
            }

            let read = match self.port.read(&mut chunk) {
                Ok(0) => return Err(HardwareError::disconnected("fingerprint sensor")),
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    return Err(HardwareError::timeout(READ_TIMEOUT.as_millis() as u64));
                }
                Err(e) => return Err(e.into()),
            };
            self.rx.extend_from_slice(&chunk[..read]);
        }
    }

    async fn exchange(&mut self, command: SensorCommand) -> Result<Ack> {
        tokio::task::block_in_place(|| self.transact(command))
    }
}

impl std::fmt::Debug for R30xSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("R30xSensor")
            .field("port", &self.port.name())
            .field("address", &format_args!("0x{:08X}", self.address))
            .finish()
    }
}

impl FingerprintDevice for R30xSensor {
    async fn verify_password(&mut self) -> Result<bool> {
        let ack = self.exchange(SensorCommand::VerifyPassword).await?;
        match ack.code {
            SensorCode::PasswordFail => Ok(false),
            code => code.into_result().map(|_| true),
        }
    }

    async fn capture_image(&mut self) -> Result<ImageCapture> {
        let ack = self.exchange(SensorCommand::CaptureImage).await?;
        ImageCapture::from_code(ack.code)
    }

    async fn image_to_template(&mut self, slot: TemplateSlot) -> Result<()> {
        self.exchange(SensorCommand::ImageToTemplate(slot))
            .await?
            .code
            .into_result()
    }

    async fn create_model(&mut self) -> Result<()> {
        self.exchange(SensorCommand::CreateModel)
            .await?
            .code
            .into_result()
    }

    async fn store_model(&mut self, id: FingerprintId) -> Result<()> {
        self.exchange(SensorCommand::StoreModel(id))
            .await?
            .code
            .into_result()
    }

    async fn fast_search(&mut self) -> Result<Option<SearchMatch>> {
        let mut ack = self.exchange(SensorCommand::FastSearch).await?;
        match ack.code {
            SensorCode::NotFound => Ok(None),
            SensorCode::Ok if ack.data.len() >= 4 => Ok(Some(SearchMatch {
                id: FingerprintId::new(ack.data.get_u16()),
                confidence: ack.data.get_u16(),
            })),
            SensorCode::Ok => Err(HardwareError::invalid_data(
                "Search acknowledgement missing page id",
            )),
            code => code.into_result().map(|_| None),
        }
    }

    async fn empty_library(&mut self) -> Result<()> {
        self.exchange(SensorCommand::EmptyLibrary)
            .await?
            .code
            .into_result()
    }
}
