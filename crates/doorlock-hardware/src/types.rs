//! Common types shared across hardware device implementations.
//!
//! This module defines the values exchanged with the peripherals: keypad
//! inputs, fingerprint sensor confirmation codes and capture results.

use std::fmt;

use doorlock_core::FingerprintId;

use crate::error::{HardwareError, Result};

/// Input from the 4x4 matrix keypad.
///
/// The keypad layout is:
///
/// ```text
/// 1 2 3 A
/// 4 5 6 B
/// 7 8 9 C
/// * 0 # D
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum KeypadInput {
    /// Numeric digit (0-9).
    Digit(u8),

    /// Command letter (A-D).
    Letter(char),

    /// Star key (*).
    Star,

    /// Hash/pound key (#).
    Hash,
}

impl KeypadInput {
    /// Create a digit input.
    ///
    /// # Errors
    ///
    /// Returns an error if the digit is greater than 9.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_hardware::KeypadInput;
    ///
    /// let input = KeypadInput::digit(5).unwrap();
    /// assert_eq!(input.as_char(), '5');
    ///
    /// assert!(KeypadInput::digit(10).is_err());
    /// ```
    pub fn digit(d: u8) -> Result<Self> {
        if d > 9 {
            return Err(HardwareError::invalid_data(format!(
                "Digit must be 0-9, got {}",
                d
            )));
        }
        Ok(Self::Digit(d))
    }

    /// Create a letter input.
    ///
    /// # Errors
    ///
    /// Returns an error if the letter is not one of `A`-`D`.
    pub fn letter(c: char) -> Result<Self> {
        if !('A'..='D').contains(&c) {
            return Err(HardwareError::invalid_data(format!(
                "Letter must be A-D, got {:?}",
                c
            )));
        }
        Ok(Self::Letter(c))
    }

    /// Map a keypad legend character to an input.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_hardware::KeypadInput;
    ///
    /// assert_eq!(KeypadInput::from_char('*').unwrap(), KeypadInput::Star);
    /// assert_eq!(KeypadInput::from_char('C').unwrap(), KeypadInput::Letter('C'));
    /// assert!(KeypadInput::from_char('x').is_err());
    /// ```
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            '0'..='9' => Self::digit(c as u8 - b'0'),
            'A'..='D' => Self::letter(c),
            '*' => Ok(Self::Star),
            '#' => Ok(Self::Hash),
            other => Err(HardwareError::invalid_data(format!(
                "Unknown keypad key {:?}",
                other
            ))),
        }
    }

    /// The legend printed on the key.
    pub fn as_char(&self) -> char {
        match self {
            Self::Digit(d) => (b'0' + d) as char,
            Self::Letter(c) => *c,
            Self::Star => '*',
            Self::Hash => '#',
        }
    }
}

impl fmt::Display for KeypadInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Confirmation code returned by the fingerprint sensor.
///
/// Values follow the ZFM/R30x family command set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorCode {
    Ok,
    PacketReceiveError,
    NoFinger,
    ImageFail,
    ImageMessy,
    FeatureFail,
    NoMatch,
    NotFound,
    EnrollMismatch,
    BadLocation,
    DatabaseReadFail,
    UploadFeatureFail,
    PacketResponseFail,
    UploadFail,
    DeleteFail,
    DatabaseClearFail,
    PasswordFail,
    InvalidImage,
    FlashError,
    InvalidRegister,
    Unknown(u8),
}

impl SensorCode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x00 => Self::Ok,
            0x01 => Self::PacketReceiveError,
            0x02 => Self::NoFinger,
            0x03 => Self::ImageFail,
            0x06 => Self::ImageMessy,
            0x07 => Self::FeatureFail,
            0x08 => Self::NoMatch,
            0x09 => Self::NotFound,
            0x0A => Self::EnrollMismatch,
            0x0B => Self::BadLocation,
            0x0C => Self::DatabaseReadFail,
            0x0D => Self::UploadFeatureFail,
            0x0E => Self::PacketResponseFail,
            0x0F => Self::UploadFail,
            0x10 => Self::DeleteFail,
            0x11 => Self::DatabaseClearFail,
            0x13 => Self::PasswordFail,
            0x15 => Self::InvalidImage,
            0x18 => Self::FlashError,
            0x1A => Self::InvalidRegister,
            other => Self::Unknown(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Self::Ok => 0x00,
            Self::PacketReceiveError => 0x01,
            Self::NoFinger => 0x02,
            Self::ImageFail => 0x03,
            Self::ImageMessy => 0x06,
            Self::FeatureFail => 0x07,
            Self::NoMatch => 0x08,
            Self::NotFound => 0x09,
            Self::EnrollMismatch => 0x0A,
            Self::BadLocation => 0x0B,
            Self::DatabaseReadFail => 0x0C,
            Self::UploadFeatureFail => 0x0D,
            Self::PacketResponseFail => 0x0E,
            Self::UploadFail => 0x0F,
            Self::DeleteFail => 0x10,
            Self::DatabaseClearFail => 0x11,
            Self::PasswordFail => 0x13,
            Self::InvalidImage => 0x15,
            Self::FlashError => 0x18,
            Self::InvalidRegister => 0x1A,
            Self::Unknown(other) => other,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::PacketReceiveError => "packet receive error",
            Self::NoFinger => "no finger on sensor",
            Self::ImageFail => "failed to enroll the finger",
            Self::ImageMessy => "image too disordered",
            Self::FeatureFail => "no feature points found",
            Self::NoMatch => "finger does not match",
            Self::NotFound => "no matching finger found",
            Self::EnrollMismatch => "fingerprints do not match",
            Self::BadLocation => "page id beyond library",
            Self::DatabaseReadFail => "error reading template",
            Self::UploadFeatureFail => "error uploading template",
            Self::PacketResponseFail => "cannot receive data packages",
            Self::UploadFail => "error uploading image",
            Self::DeleteFail => "failed to delete template",
            Self::DatabaseClearFail => "failed to clear library",
            Self::PasswordFail => "wrong password",
            Self::InvalidImage => "no valid primary image",
            Self::FlashError => "error writing flash",
            Self::InvalidRegister => "invalid register number",
            Self::Unknown(_) => "unknown code",
        }
    }

    /// Turn an acknowledgement into a result.
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Ok => Ok(()),
            Self::PacketReceiveError => Err(HardwareError::communication(self.description())),
            code => Err(HardwareError::sensor(code)),
        }
    }
}

impl fmt::Display for SensorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X} ({})", self.to_u8(), self.description())
    }
}

/// Outcome of a single image capture attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCapture {
    /// A finger image is now in the sensor's image buffer.
    Taken,

    /// Nothing on the sensor.
    NoFinger,

    /// A finger was detected but the image could not be captured.
    ImageFail,
}

impl ImageCapture {
    /// Interpret the confirmation code of an image capture command.
    ///
    /// # Errors
    ///
    /// A packet receive error becomes a communication error; any other
    /// unexpected code becomes a sensor error.
    pub fn from_code(code: SensorCode) -> Result<Self> {
        match code {
            SensorCode::Ok => Ok(Self::Taken),
            SensorCode::NoFinger => Ok(Self::NoFinger),
            SensorCode::ImageFail => Ok(Self::ImageFail),
            other => other.into_result().map(|_| Self::Taken),
        }
    }
}

/// One of the sensor's two character buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateSlot {
    One,
    Two,
}

impl TemplateSlot {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    pub(crate) fn index(self) -> usize {
        self.as_u8() as usize - 1
    }
}

impl fmt::Display for TemplateSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Instruction sent to the fingerprint sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorCommand {
    VerifyPassword,
    CaptureImage,
    ImageToTemplate(TemplateSlot),
    CreateModel,
    StoreModel(FingerprintId),
    FastSearch,
    EmptyLibrary,
}

impl SensorCommand {
    /// Instruction code in the R30x command set.
    pub fn instruction(&self) -> u8 {
        match self {
            Self::CaptureImage => 0x01,
            Self::ImageToTemplate(_) => 0x02,
            Self::CreateModel => 0x05,
            Self::StoreModel(_) => 0x06,
            Self::EmptyLibrary => 0x0D,
            Self::VerifyPassword => 0x13,
            Self::FastSearch => 0x1B,
        }
    }
}

impl fmt::Display for SensorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VerifyPassword => write!(f, "VfyPwd"),
            Self::CaptureImage => write!(f, "GenImg"),
            Self::ImageToTemplate(slot) => write!(f, "Img2Tz({})", slot),
            Self::CreateModel => write!(f, "RegModel"),
            Self::StoreModel(id) => write!(f, "Store({})", id),
            Self::FastSearch => write!(f, "HighSpeedSearch"),
            Self::EmptyLibrary => write!(f, "Empty"),
        }
    }
}

/// A library search hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    /// Page id of the matching template.
    pub id: FingerprintId,

    /// Match score reported by the sensor.
    pub confidence: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case('0', KeypadInput::Digit(0))]
    #[case('9', KeypadInput::Digit(9))]
    #[case('A', KeypadInput::Letter('A'))]
    #[case('D', KeypadInput::Letter('D'))]
    #[case('*', KeypadInput::Star)]
    #[case('#', KeypadInput::Hash)]
    fn test_keypad_from_char(#[case] c: char, #[case] expected: KeypadInput) {
        let input = KeypadInput::from_char(c).unwrap();
        assert_eq!(input, expected);
        assert_eq!(input.as_char(), c);
    }

    #[rstest]
    #[case('E')]
    #[case('a')]
    #[case(' ')]
    fn test_keypad_from_char_invalid(#[case] c: char) {
        assert!(KeypadInput::from_char(c).is_err());
    }

    #[test]
    fn test_sensor_code_round_trip_known_values() {
        for value in [0x00, 0x01, 0x02, 0x03, 0x06, 0x07, 0x09, 0x0A, 0x0B, 0x13, 0x18] {
            let code = SensorCode::from_u8(value);
            assert!(!matches!(code, SensorCode::Unknown(_)));
            assert_eq!(code.to_u8(), value);
        }
        assert_eq!(SensorCode::from_u8(0x77), SensorCode::Unknown(0x77));
    }

    #[test]
    fn test_sensor_code_into_result() {
        assert!(SensorCode::Ok.into_result().is_ok());
        assert!(
            SensorCode::PacketReceiveError
                .into_result()
                .unwrap_err()
                .is_communication()
        );
        let err = SensorCode::FlashError.into_result().unwrap_err();
        assert_eq!(err.sensor_code(), Some(SensorCode::FlashError));
    }

    #[rstest]
    #[case(SensorCode::Ok, ImageCapture::Taken)]
    #[case(SensorCode::NoFinger, ImageCapture::NoFinger)]
    #[case(SensorCode::ImageFail, ImageCapture::ImageFail)]
    fn test_image_capture_from_code(#[case] code: SensorCode, #[case] expected: ImageCapture) {
        assert_eq!(ImageCapture::from_code(code).unwrap(), expected);
    }

    #[test]
    fn test_image_capture_comm_error() {
        let err = ImageCapture::from_code(SensorCode::PacketReceiveError).unwrap_err();
        assert!(err.is_communication());
    }
}
