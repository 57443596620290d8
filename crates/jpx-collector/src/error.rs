//! 에러 타입 정의.

use std::fmt;

/// Collector 에러 타입
#[derive(Debug)]
pub enum CollectorError {
    /// 데이터 레이어 에러 (JPX, Yahoo Finance, 아티팩트 저장소)
    Data(jpx_data::DataError),
    /// 데이터 소스 에러 (목록에서 종목코드를 얻지 못한 경우 등)
    DataSource(String),
    /// 설정 에러
    Config(String),
    /// 파일 입출력 에러
    Io(std::io::Error),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(e) => write!(f, "Data error: {}", e),
            Self::DataSource(msg) => write!(f, "Data source error: {}", msg),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {}

impl From<jpx_data::DataError> for CollectorError {
    fn from(err: jpx_data::DataError) -> Self {
        Self::Data(err)
    }
}

impl From<std::io::Error> for CollectorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
