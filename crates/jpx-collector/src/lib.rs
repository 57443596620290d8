//! Standalone batch collector for JPX historical stock data.
//!
//! 이 crate는 JPX 상장 전 종목의 과거 시세를 수집하는 바이너리를 제공합니다:
//! - 상장 기업 목록 동기화 (JPX 고정 URL)
//! - 종목코드 추출 (4자리 검증)
//! - 종목별 과거 시세 일괄 수집 (Yahoo Finance, 일봉)

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use stats::CollectionStats;
