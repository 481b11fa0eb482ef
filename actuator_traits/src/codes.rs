//! Command codes understood by the actuator control board.
//!
//! Each logical command is sent as exactly one `(code, value)` pair.

/// Board command code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandCode {
    SetAccuracy = 0x01,
    SetRetractLimit = 0x02,
    SetExtendLimit = 0x03,
    SetMovementThreshold = 0x04,
    SetStallTime = 0x05,
    SetPwmThreshold = 0x06,
    SetDerivativeThreshold = 0x07,
    SetDerivativeMaximum = 0x08,
    SetDerivativeMinimum = 0x09,
    SetPwmMaximum = 0x0A,
    SetPwmMinimum = 0x0B,
    SetProportionalGain = 0x0C,
    SetDerivativeGain = 0x0D,
    SetAverageRc = 0x0E,
    SetAverageAdc = 0x0F,
    /// Value is ignored (send 0); the reply carries the raw position.
    GetFeedback = 0x10,
    SetPosition = 0x20,
    SetSpeed = 0x21,
    DisableManual = 0x30,
    Reset = 0xFF,
}

impl CommandCode {
    pub const ALL: [CommandCode; 20] = [
        Self::SetAccuracy,
        Self::SetRetractLimit,
        Self::SetExtendLimit,
        Self::SetMovementThreshold,
        Self::SetStallTime,
        Self::SetPwmThreshold,
        Self::SetDerivativeThreshold,
        Self::SetDerivativeMaximum,
        Self::SetDerivativeMinimum,
        Self::SetPwmMaximum,
        Self::SetPwmMinimum,
        Self::SetProportionalGain,
        Self::SetDerivativeGain,
        Self::SetAverageRc,
        Self::SetAverageAdc,
        Self::GetFeedback,
        Self::SetPosition,
        Self::SetSpeed,
        Self::DisableManual,
        Self::Reset,
    ];

    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::SetAccuracy => "set_accuracy",
            Self::SetRetractLimit => "set_retract_limit",
            Self::SetExtendLimit => "set_extend_limit",
            Self::SetMovementThreshold => "set_movement_threshold",
            Self::SetStallTime => "set_stall_time",
            Self::SetPwmThreshold => "set_pwm_threshold",
            Self::SetDerivativeThreshold => "set_derivative_threshold",
            Self::SetDerivativeMaximum => "set_derivative_maximum",
            Self::SetDerivativeMinimum => "set_derivative_minimum",
            Self::SetPwmMaximum => "set_pwm_maximum",
            Self::SetPwmMinimum => "set_pwm_minimum",
            Self::SetProportionalGain => "set_proportional_gain",
            Self::SetDerivativeGain => "set_derivative_gain",
            Self::SetAverageRc => "set_average_rc",
            Self::SetAverageAdc => "set_average_adc",
            Self::GetFeedback => "get_feedback",
            Self::SetPosition => "set_position",
            Self::SetSpeed => "set_speed",
            Self::DisableManual => "disable_manual",
            Self::Reset => "reset",
        }
    }
}
