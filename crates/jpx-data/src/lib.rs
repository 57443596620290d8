//! JPX 주식 데이터 수집을 위한 데이터 접근 레이어.
//!
//! 이 crate는 다음을 제공합니다:
//! - JPX 상장 기업 목록 다운로드 및 4자리 종목코드 추출
//! - Yahoo Finance 과거 시세 조회 (재시도 내장)
//! - 종목별 CSV 아티팩트 저장소 (재개/멱등성의 원장)

pub mod error;
pub mod provider;
pub mod storage;

pub use error::{DataError, Result};
pub use provider::history::{DailyBar, HistoryProvider, Period, RetryPolicy, YahooChartClient};
pub use provider::listing::{extract_stock_codes, ListingClient};
pub use storage::artifact::ArtifactStore;
