use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("uart error: {0}")]
    Uart(String),
    #[error("sensor read timeout")]
    Timeout,
    #[error("obd adapter returned no data for pid {pid:#04x}")]
    NoData { pid: u8 },
    #[error("malformed obd response: {0:?}")]
    Malformed(String),
    #[error("simulated {0} fault")]
    Simulated(&'static str),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
